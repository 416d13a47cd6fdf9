//! ui::output
//!
//! Output formatting and display.
//!
//! # Design
//!
//! Output is formatted consistently and respects the quiet flag.

use std::fmt::Display;

use crate::core::sequence::OrderedItem;
use crate::core::tree::{CategoryNode, ParentOption};

/// Output verbosity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    /// Quiet mode - minimal output
    Quiet,
    /// Normal mode - standard output
    Normal,
    /// Debug mode - verbose output
    Debug,
}

impl Verbosity {
    /// Create verbosity from flags.
    pub fn from_flags(quiet: bool, debug: bool) -> Self {
        if quiet {
            Verbosity::Quiet
        } else if debug {
            Verbosity::Debug
        } else {
            Verbosity::Normal
        }
    }
}

/// Print a message (respects quiet mode).
pub fn print(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        println!("{}", message);
    }
}

/// Print a debug message (only in debug mode).
pub fn debug(message: impl Display, verbosity: Verbosity) {
    if verbosity == Verbosity::Debug {
        eprintln!("[debug] {}", message);
    }
}

/// Print an error message (always shown).
pub fn error(message: impl Display) {
    eprintln!("error: {}", message);
}

/// Print a warning message (respects quiet mode).
pub fn warn(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        eprintln!("warning: {}", message);
    }
}

/// Format one line per sequence item: position, id, active marker, and
/// the payload's `title` when it carries one.
pub fn format_sequence(items: &[OrderedItem]) -> String {
    items
        .iter()
        .map(|item| {
            let marker = if item.active { " " } else { "x" };
            let title = item
                .payload
                .get("title")
                .and_then(|value| value.as_str())
                .unwrap_or("");
            format!("{:>3} [{}] {} {}", item.position, marker, item.id, title)
                .trim_end()
                .to_string()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format parent options, one `id<TAB>label` line each.
pub fn format_options(options: &[ParentOption]) -> String {
    options
        .iter()
        .map(|option| format!("{}\t{}", option.id, option.label))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format a forest with two-space indentation per depth.
pub fn format_forest(forest: &[CategoryNode]) -> String {
    let mut lines = Vec::new();
    for node in forest {
        format_node(node, 0, &mut lines);
    }
    lines.join("\n")
}

fn format_node(node: &CategoryNode, depth: usize, lines: &mut Vec<String>) {
    let marker = if node.active { " " } else { "x" };
    let campaign = if node.campaign.is_some() { " *" } else { "" };
    lines.push(format!(
        "{}[{}] {} ({}){}",
        "  ".repeat(depth),
        marker,
        node.name,
        node.id,
        campaign
    ));
    for child in &node.children {
        format_node(child, depth + 1, lines);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{ItemId, NodeId, Slug};
    use serde_json::json;

    #[test]
    fn verbosity_from_flags() {
        assert_eq!(Verbosity::from_flags(true, false), Verbosity::Quiet);
        assert_eq!(Verbosity::from_flags(true, true), Verbosity::Quiet);
        assert_eq!(Verbosity::from_flags(false, true), Verbosity::Debug);
        assert_eq!(Verbosity::from_flags(false, false), Verbosity::Normal);
    }

    #[test]
    fn sequence_formatting() {
        let items = vec![
            OrderedItem::new(
                ItemId::new("blk_1").unwrap(),
                0,
                true,
                json!({"title": "Hero"}),
            ),
            OrderedItem::new(ItemId::new("blk_2").unwrap(), 1, false, json!({})),
        ];
        let text = format_sequence(&items);
        assert_eq!(text, "  0 [ ] blk_1 Hero\n  1 [x] blk_2");
    }

    #[test]
    fn forest_formatting() {
        let mut root = CategoryNode::leaf(
            NodeId::new("cat_1").unwrap(),
            "Shoes",
            Slug::new("shoes").unwrap(),
        );
        let mut child = CategoryNode::leaf(
            NodeId::new("cat_2").unwrap(),
            "Boots",
            Slug::new("boots").unwrap(),
        );
        child.active = false;
        root.children.push(child);

        let text = format_forest(&[root]);
        assert_eq!(text, "[ ] Shoes (cat_1)\n  [x] Boots (cat_2)");
    }

    #[test]
    fn options_formatting() {
        let options = vec![ParentOption {
            id: NodeId::new("cat_1").unwrap(),
            label: "— Boots".to_string(),
        }];
        assert_eq!(format_options(&options), "cat_1\t— Boots");
    }
}
