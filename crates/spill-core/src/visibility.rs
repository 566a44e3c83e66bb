//! Per-viewer projection of secrets.
//!
//! Every read path goes through [`project`], so unlock and anonymity rules
//! cannot drift between endpoints.

use spill_types::models::{ANONYMOUS_NAME, AuthoredSecret, ProjectedSecret};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Own,
    Unlocked,
    Locked,
}

pub fn visibility(secret: &AuthoredSecret, viewer_id: Uuid, has_access: bool) -> Visibility {
    if secret.secret.author_id == viewer_id {
        Visibility::Own
    } else if has_access {
        Visibility::Unlocked
    } else {
        Visibility::Locked
    }
}

/// Shapes `secret` for `viewer_id`.
///
/// `has_access` is whether an access ledger row exists for (viewer, secret).
/// Locked content is dropped entirely rather than masked; the unlock price and
/// buyer count stay visible so the viewer can decide whether to unlock.
pub fn project(secret: &AuthoredSecret, viewer_id: Uuid, has_access: bool) -> ProjectedSecret {
    let level = visibility(secret, viewer_id, has_access);
    let s = &secret.secret;
    let open = level != Visibility::Locked;
    let anonymized = s.is_anonymous && level != Visibility::Own;

    let (author_id, author_name, author_avatar) = if anonymized {
        (None, ANONYMOUS_NAME.to_string(), None)
    } else {
        (
            Some(s.author_id),
            secret.author.name.clone(),
            secret.author.avatar_url.clone(),
        )
    };

    ProjectedSecret {
        id: s.id,
        room_id: s.room_id,
        question_id: s.question_id,
        author_id,
        author_name,
        author_avatar,
        body: open.then(|| s.body.clone()),
        answer_type: s.answer_type(),
        answer_data: open.then(|| s.answer_data.clone()),
        self_rating: s.self_rating,
        importance: open.then_some(s.importance),
        avg_rating: if open { s.avg_rating } else { None },
        buyers_count: s.buyers_count,
        is_anonymous: s.is_anonymous,
        is_own_secret: level == Visibility::Own,
        is_unlocked: open,
        my_rating: None,
        created_at: s.created_at,
    }
}
