//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--config <path>`: Use an explicit config file
//! - `--store-url <url>`: Override the configured store URL
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Minimal output

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// Shelfwork - ordering and hierarchy engine for storefront content
#[derive(Parser, Debug)]
#[command(name = "shelf")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Use this config file instead of the default location
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the configured store base URL
    #[arg(long, global = true, value_name = "URL")]
    pub store_url: Option<String>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Work with an ordered collection of content items
    #[command(subcommand)]
    Items(ItemsCommand),

    /// Work with the category hierarchy
    #[command(subcommand)]
    Categories(CategoriesCommand),

    /// Work with a category's campaign window
    #[command(subcommand)]
    Campaign(CampaignCommand),

    /// Read or change configuration
    #[command(subcommand)]
    Config(ConfigCommand),

    /// Generate shell completions
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Ordered-collection commands.
#[derive(Subcommand, Debug)]
pub enum ItemsCommand {
    /// List a collection in render order
    List {
        /// Collection id
        collection: String,
    },

    /// Move an item to a new index and persist the order
    Move {
        /// Collection id
        collection: String,
        /// Item id
        item: String,
        /// Target index (clamped into the sequence)
        index: usize,
        /// Commit strategy override ("batch" or "per-item")
        #[arg(long)]
        strategy: Option<String>,
    },

    /// Flip an item's active flag
    Toggle {
        /// Collection id
        collection: String,
        /// Item id
        item: String,
    },
}

/// Category hierarchy commands.
#[derive(Subcommand, Debug)]
pub enum CategoriesCommand {
    /// Print the category tree
    Tree,

    /// List valid reparent targets
    Options {
        /// Node whose subtree is blocked; omit when picking a parent for
        /// a new category
        #[arg(long = "for", value_name = "NODE")]
        exclude: Option<String>,
    },

    /// Create a category
    Create {
        /// Display name
        name: String,
        /// Parent node id (omit for a root category)
        #[arg(long)]
        parent: Option<String>,
        /// Explicit slug (derived from the name when omitted)
        #[arg(long)]
        slug: Option<String>,
    },

    /// Move a category under a new parent
    Reparent {
        /// Node id
        node: String,
        /// New parent node id
        #[arg(long, conflicts_with = "to_root")]
        parent: Option<String>,
        /// Move the node to the root
        #[arg(long)]
        to_root: bool,
    },

    /// Flip a category's active flag
    Toggle {
        /// Node id
        node: String,
    },

    /// Delete a category (must be empty; the store enforces this)
    Delete {
        /// Node id
        node: String,
    },
}

/// Campaign window commands.
#[derive(Subcommand, Debug)]
pub enum CampaignCommand {
    /// Set a category's campaign window
    Set {
        /// Node id
        node: String,
        /// Start instant, RFC3339
        #[arg(long)]
        starts: String,
        /// End instant, RFC3339
        #[arg(long)]
        ends: String,
        /// Render a countdown on the storefront
        #[arg(long)]
        countdown: bool,
    },

    /// Clear a category's campaign window
    Clear {
        /// Node id
        node: String,
    },

    /// Show a campaign's derived phase
    Status {
        /// Node id
        node: String,
        /// Classify at this instant instead of now (RFC3339)
        #[arg(long)]
        at: Option<String>,
    },
}

/// Configuration commands.
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print one config value
    Get {
        /// Config key (e.g. "store_url")
        key: String,
    },

    /// Set one config value
    Set {
        /// Config key
        key: String,
        /// New value
        value: String,
    },

    /// List all config keys and values
    List,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_items_move() {
        let cli = Cli::try_parse_from([
            "shelf", "items", "move", "home.blocks", "blk_3", "0", "--strategy", "per-item",
        ])
        .unwrap();
        match cli.command {
            Command::Items(ItemsCommand::Move {
                collection,
                item,
                index,
                strategy,
            }) => {
                assert_eq!(collection, "home.blocks");
                assert_eq!(item, "blk_3");
                assert_eq!(index, 0);
                assert_eq!(strategy.as_deref(), Some("per-item"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn reparent_parent_conflicts_with_to_root() {
        let result = Cli::try_parse_from([
            "shelf",
            "categories",
            "reparent",
            "cat_2",
            "--parent",
            "cat_1",
            "--to-root",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn global_flags_accepted_after_subcommand() {
        let cli =
            Cli::try_parse_from(["shelf", "categories", "tree", "--quiet", "--debug"]).unwrap();
        assert!(cli.quiet);
        assert!(cli.debug);
    }
}
