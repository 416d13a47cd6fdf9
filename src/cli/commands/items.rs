//! items commands - List, reorder, and toggle ordered collection items.

use anyhow::Result;

use super::collection_manager;
use crate::cli::Context;
use crate::core::types::ItemId;
use crate::ui::output;

/// List a collection in render order.
pub async fn items_list(ctx: &Context, collection: &str) -> Result<()> {
    let manager = collection_manager(ctx, collection, None)?;
    manager.refresh().await?;

    let sequence = manager.sequence();
    if sequence.is_empty() {
        output::print(format!("Collection '{collection}' is empty."), ctx.verbosity());
    } else {
        output::print(output::format_sequence(&sequence), ctx.verbosity());
    }
    Ok(())
}

/// Move an item to a new index and persist the order.
pub async fn items_move(
    ctx: &Context,
    collection: &str,
    item: &str,
    index: usize,
    strategy: Option<&str>,
) -> Result<()> {
    let item = ItemId::new(item)?;
    let manager = collection_manager(ctx, collection, strategy)?;
    manager.refresh().await?;

    let proposed = manager.move_item(&item, index)?;
    manager.commit(proposed).await?;

    let sequence = manager.sequence();
    output::print(
        format!("Moved {item} to index {} of {}.", 
            sequence.iter().position(|i| i.id == item).unwrap_or(index),
            sequence.len()),
        ctx.verbosity(),
    );
    output::debug(output::format_sequence(&sequence), ctx.verbosity());
    Ok(())
}

/// Flip an item's active flag.
pub async fn items_toggle(ctx: &Context, collection: &str, item: &str) -> Result<()> {
    let item = ItemId::new(item)?;
    let manager = collection_manager(ctx, collection, None)?;
    manager.refresh().await?;

    let active = manager.toggle_active(&item).await?;
    let state = if active { "active" } else { "inactive" };
    output::print(format!("{item} is now {state}."), ctx.verbosity());
    Ok(())
}
