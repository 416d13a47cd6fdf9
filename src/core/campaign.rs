//! core::campaign
//!
//! Time-windowed campaign state for category nodes.
//!
//! # Design
//!
//! A campaign is the optional start/end timestamp pair marking a category
//! as a time-boxed promotion. The engine persists only the window itself;
//! `Scheduled`/`Live`/`Ended` are derived classifications computed from an
//! explicit `now`, never stored. Classification takes `now` as a parameter
//! so it stays deterministic under test.
//!
//! # Validation
//!
//! - If both endpoints are present, `starts_at` must be strictly before
//!   `ends_at`.
//! - Enabling a campaign requires both endpoints
//!   ([`WindowPolicy::RequireBoth`]); clearing one never validates
//!   ([`WindowPolicy::AllowMissing`]).
//!
//! # Example
//!
//! ```
//! use shelfwork::core::campaign::{classify, CampaignPhase, CampaignWindow};
//! use shelfwork::core::types::UtcTimestamp;
//!
//! let window = CampaignWindow {
//!     starts_at: Some(UtcTimestamp::parse("2026-06-01T00:00:00Z").unwrap()),
//!     ends_at: Some(UtcTimestamp::parse("2026-06-15T00:00:00Z").unwrap()),
//!     show_countdown: true,
//! };
//!
//! let before = UtcTimestamp::parse("2026-05-20T00:00:00Z").unwrap();
//! assert_eq!(classify(Some(&window), before), CampaignPhase::Scheduled);
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::types::UtcTimestamp;

/// Errors from campaign window validation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CampaignError {
    /// Both endpoints are present but not well-ordered.
    #[error("campaign window is not well-ordered: {starts_at} >= {ends_at}")]
    InvalidWindow {
        starts_at: UtcTimestamp,
        ends_at: UtcTimestamp,
    },

    /// The policy requires both endpoints and at least one is missing.
    #[error("campaign window requires both start and end timestamps")]
    IncompleteWindow,
}

/// A campaign window on a category node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignWindow {
    /// Promotion start, RFC3339.
    #[serde(default)]
    pub starts_at: Option<UtcTimestamp>,
    /// Promotion end, RFC3339.
    #[serde(default)]
    pub ends_at: Option<UtcTimestamp>,
    /// Whether the storefront renders a countdown for this window.
    /// Has no effect while the window is unset.
    #[serde(default)]
    pub show_countdown: bool,
}

impl CampaignWindow {
    /// A window with both endpoints.
    pub fn between(starts_at: UtcTimestamp, ends_at: UtcTimestamp) -> Self {
        Self {
            starts_at: Some(starts_at),
            ends_at: Some(ends_at),
            show_countdown: false,
        }
    }

    /// Whether both endpoints are present.
    pub fn is_complete(&self) -> bool {
        self.starts_at.is_some() && self.ends_at.is_some()
    }
}

/// How strictly [`validate_window`] treats missing endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowPolicy {
    /// Both endpoints required. Used when creating or enabling a campaign.
    RequireBoth,
    /// Missing endpoints accepted. Used when editing a window in place or
    /// turning the campaign off.
    AllowMissing,
}

/// Validate a campaign window against a policy.
///
/// Detected before any network call; a failed validation leaves the
/// working copy untouched.
///
/// # Errors
///
/// - `CampaignError::InvalidWindow` if both endpoints are present and
///   `starts_at >= ends_at`
/// - `CampaignError::IncompleteWindow` if the policy requires both
///   endpoints and at least one is missing
pub fn validate_window(window: &CampaignWindow, policy: WindowPolicy) -> Result<(), CampaignError> {
    if let (Some(starts_at), Some(ends_at)) = (window.starts_at, window.ends_at) {
        if starts_at >= ends_at {
            return Err(CampaignError::InvalidWindow { starts_at, ends_at });
        }
    } else if policy == WindowPolicy::RequireBoth {
        return Err(CampaignError::IncompleteWindow);
    }
    Ok(())
}

/// Derived, read-only campaign classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CampaignPhase {
    /// No campaign on the node.
    Inactive,
    /// Campaign set, `now` before the start.
    Scheduled,
    /// `now` within the window.
    Live,
    /// `now` past the end.
    Ended,
}

impl std::fmt::Display for CampaignPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CampaignPhase::Inactive => write!(f, "inactive"),
            CampaignPhase::Scheduled => write!(f, "scheduled"),
            CampaignPhase::Live => write!(f, "live"),
            CampaignPhase::Ended => write!(f, "ended"),
        }
    }
}

/// Classify a campaign window at an explicit instant.
///
/// A missing start behaves as already-started and a missing end as
/// never-ending, so a window with neither endpoint is `Live` for as long
/// as the campaign is set.
pub fn classify(window: Option<&CampaignWindow>, now: UtcTimestamp) -> CampaignPhase {
    let Some(window) = window else {
        return CampaignPhase::Inactive;
    };

    if let Some(starts_at) = window.starts_at {
        if now < starts_at {
            return CampaignPhase::Scheduled;
        }
    }
    if let Some(ends_at) = window.ends_at {
        if now > ends_at {
            return CampaignPhase::Ended;
        }
    }
    CampaignPhase::Live
}
