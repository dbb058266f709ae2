//! Follow-edge store and the per-request follow snapshot.

use std::collections::HashSet;

use rusqlite::{params, Connection};

use crate::GraphError;

/// A viewer's follow relationships, loaded once per request.
///
/// Both directions are captured so that every per-candidate visibility check
/// is a set lookup instead of a query. The direction names are anchored to
/// the stored edge: an edge `(follower_id, following_id)` means
/// `follower_id` follows `following_id`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FollowSets {
    /// Ids the viewer follows (viewer is the edge's follower).
    pub following: HashSet<String>,
    /// Ids that follow the viewer (viewer is the edge's followee).
    pub followers: HashSet<String>,
}

impl FollowSets {
    /// True when the viewer follows `subject_id`, i.e. the viewer appears in
    /// the subject's follower set.
    pub fn follows(&self, subject_id: &str) -> bool {
        self.following.contains(subject_id)
    }

    /// True when `subject_id` follows the viewer back.
    pub fn followed_by(&self, subject_id: &str) -> bool {
        self.followers.contains(subject_id)
    }
}

/// Loads both follow directions for `user_id` in one pass per direction.
pub fn load_follow_sets(conn: &Connection, user_id: &str) -> Result<FollowSets, GraphError> {
    let mut stmt = conn.prepare("SELECT following_id FROM follow_edges WHERE follower_id = ?1")?;
    let following = stmt
        .query_map([user_id], |row| row.get::<_, String>(0))?
        .collect::<Result<HashSet<_>, _>>()?;

    let mut stmt = conn.prepare("SELECT follower_id FROM follow_edges WHERE following_id = ?1")?;
    let followers = stmt
        .query_map([user_id], |row| row.get::<_, String>(0))?
        .collect::<Result<HashSet<_>, _>>()?;

    Ok(FollowSets {
        following,
        followers,
    })
}

/// Records that `follower_id` follows `following_id`. Idempotent.
pub fn follow(conn: &Connection, follower_id: &str, following_id: &str) -> Result<(), GraphError> {
    conn.execute(
        "INSERT OR IGNORE INTO follow_edges (follower_id, following_id) VALUES (?1, ?2)",
        params![follower_id, following_id],
    )?;
    Ok(())
}

/// Removes the follow edge if present. Idempotent.
pub fn unfollow(
    conn: &Connection,
    follower_id: &str,
    following_id: &str,
) -> Result<(), GraphError> {
    conn.execute(
        "DELETE FROM follow_edges WHERE follower_id = ?1 AND following_id = ?2",
        params![follower_id, following_id],
    )?;
    Ok(())
}
