//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Validates command-specific arguments
//! 2. Calls the engine to execute the command
//! 3. Formats and displays output
//!
//! Handlers do NOT mutate collections or the tree directly; every
//! mutation flows through a manager.

mod campaign_cmd;
mod categories;
mod completion;
mod config_cmd;
mod items;

// Re-export command functions for testing and direct invocation
pub use campaign_cmd::{campaign_clear, campaign_set, campaign_status};
pub use categories::{
    categories_create, categories_delete, categories_options, categories_reparent,
    categories_toggle, categories_tree,
};
pub use completion::completion;
pub use config_cmd::{config_get, config_list, config_set};
pub use items::{items_list, items_move, items_toggle};

use std::sync::Arc;

use anyhow::{anyhow, Context as _, Result};

use crate::cli::args::{
    CampaignCommand, CategoriesCommand, Command, ConfigCommand, ItemsCommand,
};
use crate::cli::Context;
use crate::core::config::Config;
use crate::core::types::CollectionId;
use crate::engine::{
    CommitStrategy, HierarchyManager, NullSink, OrderedCollectionManager,
};
use crate::store::{ContentStore, RestStore};

/// Dispatch a command to its handler.
pub async fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Items(ItemsCommand::List { collection }) => items_list(ctx, &collection).await,
        Command::Items(ItemsCommand::Move {
            collection,
            item,
            index,
            strategy,
        }) => items_move(ctx, &collection, &item, index, strategy.as_deref()).await,
        Command::Items(ItemsCommand::Toggle { collection, item }) => {
            items_toggle(ctx, &collection, &item).await
        }

        Command::Categories(CategoriesCommand::Tree) => categories_tree(ctx).await,
        Command::Categories(CategoriesCommand::Options { exclude }) => {
            categories_options(ctx, exclude.as_deref()).await
        }
        Command::Categories(CategoriesCommand::Create { name, parent, slug }) => {
            categories_create(ctx, &name, parent.as_deref(), slug.as_deref()).await
        }
        Command::Categories(CategoriesCommand::Reparent {
            node,
            parent,
            to_root,
        }) => categories_reparent(ctx, &node, parent.as_deref(), to_root).await,
        Command::Categories(CategoriesCommand::Toggle { node }) => {
            categories_toggle(ctx, &node).await
        }
        Command::Categories(CategoriesCommand::Delete { node }) => {
            categories_delete(ctx, &node).await
        }

        Command::Campaign(CampaignCommand::Set {
            node,
            starts,
            ends,
            countdown,
        }) => campaign_set(ctx, &node, &starts, &ends, countdown).await,
        Command::Campaign(CampaignCommand::Clear { node }) => campaign_clear(ctx, &node).await,
        Command::Campaign(CampaignCommand::Status { node, at }) => {
            campaign_status(ctx, &node, at.as_deref()).await
        }

        Command::Config(ConfigCommand::Get { key }) => config_get(ctx, &key),
        Command::Config(ConfigCommand::Set { key, value }) => config_set(ctx, &key, &value),
        Command::Config(ConfigCommand::List) => config_list(ctx),

        Command::Completion { shell } => completion(shell),
    }
}

/// Load configuration, honoring the `--config` override.
pub(crate) fn load_config(ctx: &Context) -> Result<Config> {
    match &ctx.config {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("failed to load config from {}", path.display())),
        None => Config::load().context("failed to load config"),
    }
}

/// Build the REST store from config and flags.
pub(crate) fn build_store(ctx: &Context, config: &Config) -> Result<Arc<dyn ContentStore>> {
    let url = ctx
        .store_url
        .clone()
        .or_else(|| config.store_url())
        .ok_or_else(|| {
            anyhow!(
                "store URL not configured. Set it with 'shelf config set store_url <URL>' \
                 or pass --store-url."
            )
        })?;
    let store = RestStore::new(url, config.token(), config.request_timeout())?;
    Ok(Arc::new(store))
}

/// Build a collection manager for one invocation.
pub(crate) fn collection_manager(
    ctx: &Context,
    collection: &str,
    strategy_override: Option<&str>,
) -> Result<OrderedCollectionManager> {
    let config = load_config(ctx)?;
    let store = build_store(ctx, &config)?;
    let strategy = match strategy_override {
        Some(name) => CommitStrategy::from_name(name).ok_or_else(|| {
            anyhow!(
                "invalid commit strategy '{}', must be one of: {}",
                name,
                CommitStrategy::NAMES.join(", ")
            )
        })?,
        None => config.commit_strategy(),
    };
    Ok(OrderedCollectionManager::new(
        store,
        Arc::new(NullSink),
        CollectionId::new(collection)?,
        strategy,
    ))
}

/// Build a hierarchy manager for one invocation.
pub(crate) fn hierarchy_manager(ctx: &Context) -> Result<HierarchyManager> {
    let config = load_config(ctx)?;
    let store = build_store(ctx, &config)?;
    Ok(HierarchyManager::new(store, Arc::new(NullSink)))
}
