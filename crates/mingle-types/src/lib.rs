//! Shared types and constants for the Mingle platform.
//!
//! This crate provides the cross-cutting type definitions used by the other
//! Mingle crates: the per-event visibility level, the projected identity
//! facade returned to clients, and the anonymous placeholder label.
//!
//! No crate in the workspace depends on anything *except* `mingle-types` for
//! cross-cutting type definitions. This keeps the dependency graph clean and
//! prevents circular dependencies.

use serde::{Deserialize, Serialize};

/// Per-event visibility level controlling who may see the owner's real
/// identity.
///
/// The level is fixed when the event is created and stored as TEXT. Values
/// read back from storage go through [`Visibility::parse`]; anything
/// unrecognized yields `None` and the reveal policy masks the owner for
/// every viewer except the owner themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Visibility {
    /// Anyone may see the owner's real identity.
    Public,
    /// Only viewers who follow the owner may see the real identity.
    Followers,
    /// Only viewers with a mutual follow relationship may see it.
    MutualFollow,
}

impl Visibility {
    /// Returns the stored string form of this level.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Public => "PUBLIC",
            Self::Followers => "FOLLOWERS",
            Self::MutualFollow => "MUTUAL_FOLLOW",
        }
    }

    /// Attempts to convert a stored string to a `Visibility`.
    ///
    /// Returns `None` for unrecognized values.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PUBLIC" => Some(Self::Public),
            "FOLLOWERS" => Some(Self::Followers),
            "MUTUAL_FOLLOW" => Some(Self::MutualFollow),
            _ => None,
        }
    }
}

impl Default for Visibility {
    fn default() -> Self {
        Self::Public
    }
}

/// The display name shown in place of a masked identity.
pub const ANONYMOUS_DISPLAY_NAME: &str = "匿名ユーザー";

/// The identity facade shown to a viewer for one subject user.
///
/// Depending on the reveal decision and the subject's per-event pseudonym,
/// this is either the subject's real profile, the pseudonym with avatar and
/// badge suppressed, or the fixed anonymous placeholder. The subject's `id`
/// is carried in all three forms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayIdentity {
    /// The subject's user id.
    pub id: String,
    /// Display name, pseudonym, or placeholder label.
    pub display_name: String,
    /// Avatar reference; `None` whenever the identity is masked or
    /// pseudonymous.
    pub image_url: Option<String>,
    /// Verified badge; suppressed unless the real profile is shown.
    pub is_verified: bool,
}
