use spill_types::models::{AnswerData, AnswerType, AuthoredSecret, ProjectedSecret};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{Result, SpillError};
use crate::ports::{AnswerDraft, Store, UnlockOutcome};
use crate::validation::{validate_body, validate_scale};
use crate::visibility::project;

/// A buyer's request to unlock `secret_id` by answering the same question.
#[derive(Debug, Clone)]
pub struct UnlockCommand {
    pub secret_id: Uuid,
    pub buyer_id: Uuid,
    pub question_id: Uuid,
    pub body: String,
    pub self_rating: i64,
    pub importance: i64,
}

/// Unlocks a secret for its buyer.
///
/// Checks run in a fixed order so each failure maps to one kind. The buyer's
/// answer, the ledger row and the counter bump are written as one unit by
/// [`crate::ports::AccessLedgerRepository::record_unlock`]; a retry after success
/// fails with `AlreadyUnlocked` instead of counting the buyer twice.
pub fn unlock<S: Store + ?Sized>(store: &S, cmd: UnlockCommand) -> Result<ProjectedSecret> {
    validate_body(&cmd.body, AnswerType::Text)?;
    let self_rating = validate_scale(cmd.self_rating, "selfRating")?;
    let importance = validate_scale(cmd.importance, "importance")?;

    let target = store
        .find_secret(cmd.secret_id)?
        .filter(|s| !s.secret.is_hidden)
        .ok_or(SpillError::NotFound("secret"))?;

    if target.secret.author_id == cmd.buyer_id {
        return Err(SpillError::SelfUnlockForbidden);
    }

    if store.has_unlocked(cmd.buyer_id, cmd.secret_id)? {
        return Err(SpillError::AlreadyUnlocked);
    }

    if self_rating < target.secret.self_rating {
        return Err(SpillError::InsufficientRating {
            required: target.secret.self_rating,
        });
    }

    let room_id = target.secret.room_id;
    if !store.is_member(room_id, cmd.buyer_id)? {
        return Err(SpillError::NotAMember);
    }

    if cmd.question_id != target.secret.question_id {
        return Err(SpillError::InvalidAnswer(
            "your answer must be to the same question as the secret".into(),
        ));
    }

    let draft = AnswerDraft {
        room_id,
        author_id: cmd.buyer_id,
        question_id: cmd.question_id,
        body: cmd.body.trim().to_string(),
        self_rating,
        importance,
        is_anonymous: false,
        answer_data: AnswerData::Text,
    };

    match store.record_unlock(cmd.secret_id, &draft)? {
        UnlockOutcome::Unlocked(secret) => {
            info!(
                "Secret {} unlocked by {} ({} buyers)",
                secret.id, cmd.buyer_id, secret.buyers_count
            );
            let unlocked = AuthoredSecret {
                secret,
                author: target.author,
            };
            Ok(project(&unlocked, cmd.buyer_id, true))
        }
        UnlockOutcome::AlreadyUnlocked => {
            warn!(
                "Concurrent unlock of {} by {} lost the race",
                cmd.secret_id, cmd.buyer_id
            );
            Err(SpillError::AlreadyUnlocked)
        }
        UnlockOutcome::TargetGone => Err(SpillError::NotFound("secret")),
    }
}
