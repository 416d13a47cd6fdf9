//! campaign commands - Set, clear, and inspect campaign windows.

use anyhow::Result;

use super::hierarchy_manager;
use crate::cli::Context;
use crate::core::campaign::CampaignWindow;
use crate::core::types::{NodeId, UtcTimestamp};
use crate::ui::output;

/// Set a category's campaign window.
pub async fn campaign_set(
    ctx: &Context,
    node: &str,
    starts: &str,
    ends: &str,
    countdown: bool,
) -> Result<()> {
    let node = NodeId::new(node)?;
    let window = CampaignWindow {
        starts_at: Some(UtcTimestamp::parse(starts)?),
        ends_at: Some(UtcTimestamp::parse(ends)?),
        show_countdown: countdown,
    };

    let manager = hierarchy_manager(ctx)?;
    manager.refresh().await?;
    manager.set_campaign(&node, Some(window)).await?;
    output::print(
        format!("Campaign on {node}: {starts} to {ends}."),
        ctx.verbosity(),
    );
    Ok(())
}

/// Clear a category's campaign window.
pub async fn campaign_clear(ctx: &Context, node: &str) -> Result<()> {
    let node = NodeId::new(node)?;
    let manager = hierarchy_manager(ctx)?;
    manager.refresh().await?;
    manager.set_campaign(&node, None).await?;
    output::print(format!("Cleared campaign on {node}."), ctx.verbosity());
    Ok(())
}

/// Show a campaign's derived phase.
pub async fn campaign_status(ctx: &Context, node: &str, at: Option<&str>) -> Result<()> {
    let node = NodeId::new(node)?;
    let now = match at {
        Some(at) => UtcTimestamp::parse(at)?,
        None => UtcTimestamp::now(),
    };

    let manager = hierarchy_manager(ctx)?;
    manager.refresh().await?;
    let phase = manager.classify_campaign(&node, now)?;
    output::print(format!("{node}: {phase}"), ctx.verbosity());
    Ok(())
}
