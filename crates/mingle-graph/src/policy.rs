//! The reveal policy: may this viewer see the subject's real identity?

use mingle_types::Visibility;

use crate::follow::FollowSets;

/// Decides whether `viewer_id` may see the real identity of `subject_id`
/// under the given visibility level.
///
/// The subject always sees themselves. Otherwise:
///
/// - `PUBLIC`: everyone.
/// - `FOLLOWERS`: viewers who follow the subject.
/// - `MUTUAL_FOLLOW`: viewers who follow the subject and are followed back.
/// - `None` (a stored level that failed to parse): nobody. The store layer
///   logs the unrecognized value; this function only fails closed.
///
/// Total function, no side effects.
pub fn can_reveal(
    visibility: Option<Visibility>,
    viewer_id: &str,
    subject_id: &str,
    follows: &FollowSets,
) -> bool {
    if viewer_id == subject_id {
        return true;
    }

    match visibility {
        Some(Visibility::Public) => true,
        Some(Visibility::Followers) => follows.follows(subject_id),
        Some(Visibility::MutualFollow) => {
            follows.follows(subject_id) && follows.followed_by(subject_id)
        }
        None => false,
    }
}
