//! categories commands - Tree display, reparenting, and category CRUD.

use anyhow::{anyhow, Result};

use super::hierarchy_manager;
use crate::cli::Context;
use crate::core::types::{NodeId, Slug};
use crate::ui::output;

/// Print the category tree.
pub async fn categories_tree(ctx: &Context) -> Result<()> {
    let manager = hierarchy_manager(ctx)?;
    manager.refresh().await?;

    let forest = manager.forest();
    if forest.is_empty() {
        output::print("No categories yet.", ctx.verbosity());
    } else {
        output::print(output::format_forest(&forest), ctx.verbosity());
    }
    Ok(())
}

/// List valid reparent targets.
pub async fn categories_options(ctx: &Context, exclude: Option<&str>) -> Result<()> {
    let exclude = exclude.map(NodeId::new).transpose()?;
    let manager = hierarchy_manager(ctx)?;
    manager.refresh().await?;

    let options = manager.parent_options(exclude.as_ref())?;
    if options.is_empty() {
        output::print("No valid parents.", ctx.verbosity());
    } else {
        output::print(output::format_options(&options), ctx.verbosity());
    }
    Ok(())
}

/// Create a category.
pub async fn categories_create(
    ctx: &Context,
    name: &str,
    parent: Option<&str>,
    slug: Option<&str>,
) -> Result<()> {
    let parent = parent.map(NodeId::new).transpose()?;
    let slug = slug.map(Slug::new).transpose()?;
    let manager = hierarchy_manager(ctx)?;
    manager.refresh().await?;

    let created = manager
        .create_category(parent.as_ref(), name, slug, None)
        .await?;
    output::print(
        format!("Created '{}' ({}) with slug '{}'.", created.name, created.id, created.slug),
        ctx.verbosity(),
    );
    Ok(())
}

/// Move a category under a new parent.
pub async fn categories_reparent(
    ctx: &Context,
    node: &str,
    parent: Option<&str>,
    to_root: bool,
) -> Result<()> {
    if parent.is_none() && !to_root {
        return Err(anyhow!("specify --parent <NODE> or --to-root"));
    }

    let node = NodeId::new(node)?;
    let parent = parent.map(NodeId::new).transpose()?;
    let manager = hierarchy_manager(ctx)?;
    manager.refresh().await?;
    manager.reparent(&node, parent.as_ref()).await?;

    match &parent {
        Some(parent) => output::print(format!("Moved {node} under {parent}."), ctx.verbosity()),
        None => output::print(format!("Moved {node} to the root."), ctx.verbosity()),
    }
    Ok(())
}

/// Flip a category's active flag.
pub async fn categories_toggle(ctx: &Context, node: &str) -> Result<()> {
    let node = NodeId::new(node)?;
    let manager = hierarchy_manager(ctx)?;
    manager.refresh().await?;

    let active = manager.toggle_active(&node).await?;
    let state = if active { "active" } else { "inactive" };
    output::print(format!("{node} is now {state}."), ctx.verbosity());
    Ok(())
}

/// Delete a category.
pub async fn categories_delete(ctx: &Context, node: &str) -> Result<()> {
    let node = NodeId::new(node)?;
    let manager = hierarchy_manager(ctx)?;
    manager.refresh().await?;
    manager.delete_category(&node).await?;
    output::print(format!("Deleted {node}."), ctx.verbosity());
    Ok(())
}
