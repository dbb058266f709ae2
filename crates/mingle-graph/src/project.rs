//! The identity projector: reveal decision + pseudonym → display identity.

use mingle_identity::User;
use mingle_types::{DisplayIdentity, ANONYMOUS_DISPLAY_NAME};

/// Builds the identity facade shown to a viewer for `subject`.
///
/// Priority order:
///
/// 1. Masked (`reveal_allowed == false`): the fixed placeholder label, no
///    avatar, no badge. The pseudonym is NOT used as a fallback — masking
///    overrides the subject's own choice.
/// 2. Pseudonymous: a non-empty `anonymous_name` replaces the display name
///    and suppresses avatar and badge, even though the viewer was permitted
///    to see the real identity.
/// 3. Disclosed: the subject's real profile, unchanged.
///
/// A subject with no participation record (no pseudonym to consult) lands on
/// step 1 or 3 depending on the reveal decision. The subject's `id` is kept
/// in all three facades.
pub fn project(
    subject: &User,
    anonymous_name: Option<&str>,
    reveal_allowed: bool,
) -> DisplayIdentity {
    if !reveal_allowed {
        return DisplayIdentity {
            id: subject.id.clone(),
            display_name: ANONYMOUS_DISPLAY_NAME.to_string(),
            image_url: None,
            is_verified: false,
        };
    }

    match anonymous_name.filter(|name| !name.is_empty()) {
        Some(name) => DisplayIdentity {
            id: subject.id.clone(),
            display_name: name.to_string(),
            image_url: None,
            is_verified: false,
        },
        None => DisplayIdentity {
            id: subject.id.clone(),
            display_name: subject.display_name.clone(),
            image_url: subject.image_url.clone(),
            is_verified: subject.is_verified,
        },
    }
}
