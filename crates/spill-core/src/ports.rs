//! Storage boundary of the engine.
//!
//! Each trait method that writes more than one row is a single atomic unit in
//! the implementation; the services never stitch multi-row writes together.

use std::collections::{HashMap, HashSet};

use anyhow::Result;
use spill_types::models::{AnswerData, AuthoredSecret, Secret};
use uuid::Uuid;

/// A validated answer ready to be written for (room, author, question).
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerDraft {
    pub room_id: Uuid,
    pub author_id: Uuid,
    pub question_id: Uuid,
    pub body: String,
    pub self_rating: u8,
    pub importance: u8,
    pub is_anonymous: bool,
    pub answer_data: AnswerData,
}

#[derive(Debug, Clone)]
pub struct UpsertedAnswer {
    pub secret: Secret,
    /// `false` when an existing answer was edited in place.
    pub created: bool,
}

#[derive(Debug, Clone)]
pub enum UnlockOutcome {
    /// Ledger row written and counter bumped; carries the target as it now stands.
    Unlocked(Secret),
    /// The (buyer, secret) ledger row already existed. Nothing was written.
    AlreadyUnlocked,
    /// The target was hidden or removed between validation and the write.
    TargetGone,
}

pub trait SecretRepository: Send + Sync {
    /// Looks up a secret by id, hidden or not.
    fn find_secret(&self, id: Uuid) -> Result<Option<AuthoredSecret>>;

    /// The author's visible answer to a question, if any.
    fn find_answer(&self, room_id: Uuid, author_id: Uuid, question_id: Uuid)
    -> Result<Option<Secret>>;

    /// Inserts or edits the author's answer, keyed on the
    /// (room, author, question) uniqueness constraint.
    fn upsert_answer(&self, draft: &AnswerDraft) -> Result<UpsertedAnswer>;

    /// Soft-deletes a visible secret. Returns `false` if nothing was visible to hide.
    fn hide_secret(&self, id: Uuid) -> Result<bool>;

    /// Visible secrets of a room, newest first.
    fn list_room_secrets(&self, room_id: Uuid) -> Result<Vec<AuthoredSecret>>;

    /// Visible answers to one question, oldest first.
    fn list_question_secrets(&self, room_id: Uuid, question_id: Uuid)
    -> Result<Vec<AuthoredSecret>>;

    fn question_in_room(&self, room_id: Uuid, question_id: Uuid) -> Result<bool>;
}

pub trait AccessLedgerRepository: Send + Sync {
    fn has_unlocked(&self, buyer_id: Uuid, secret_id: Uuid) -> Result<bool>;

    /// Subset of `secret_ids` the viewer holds a ledger row for.
    fn unlocked_among(&self, viewer_id: Uuid, secret_ids: &[Uuid]) -> Result<HashSet<Uuid>>;

    /// Atomically upserts the buyer's own answer, inserts the (buyer, secret)
    /// ledger row and increments the target's `buyers_count` by one.
    fn record_unlock(&self, secret_id: Uuid, buyer_answer: &AnswerDraft) -> Result<UnlockOutcome>;
}

pub trait RatingLedgerRepository: Send + Sync {
    /// Upserts the rater's rating and recomputes the target's aggregate from the
    /// full ledger in the same transaction. Returns the persisted aggregate, or
    /// `None` if the target is no longer visible.
    fn record_rating(&self, secret_id: Uuid, rater_id: Uuid, rating: u8) -> Result<Option<f64>>;

    /// The viewer's own ratings among `secret_ids`.
    fn ratings_by(&self, rater_id: Uuid, secret_ids: &[Uuid]) -> Result<HashMap<Uuid, u8>>;
}

/// Room membership, owned by the room service.
pub trait MembershipDirectory: Send + Sync {
    fn is_member(&self, room_id: Uuid, user_id: Uuid) -> Result<bool>;
}

/// Everything the services need from storage.
pub trait Store:
    SecretRepository + AccessLedgerRepository + RatingLedgerRepository + MembershipDirectory
{
}

impl<T> Store for T where
    T: SecretRepository + AccessLedgerRepository + RatingLedgerRepository + MembershipDirectory
{
}
