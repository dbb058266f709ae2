//! Follow graph and identity projection for the Mingle platform.
//!
//! This crate is the platform's visibility core. It answers one question:
//! for a given viewer, which identity facade should be shown for a given
//! subject user in a given event?
//!
//! The answer is computed in three layers:
//!
//! 1. [`FollowSets`] — the viewer's follow relationships, loaded once per
//!    request from the `follow_edges` table.
//! 2. [`can_reveal`] — the pure visibility policy: may this viewer see the
//!    subject's real identity under the event's visibility level?
//! 3. [`project`] — the identity projector: combines the reveal decision
//!    with the subject's optional per-event pseudonym into the final
//!    [`DisplayIdentity`](mingle_types::DisplayIdentity).
//!
//! Layers 2 and 3 are total functions with no side effects; all I/O happens
//! up front in layer 1 and in the stores the assembler reads from.

mod follow;
mod policy;
mod project;

use thiserror::Error;

pub use follow::{follow, load_follow_sets, unfollow, FollowSets};
pub use policy::can_reveal;
pub use project::project;

/// Errors that can occur during follow-graph operations.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}
