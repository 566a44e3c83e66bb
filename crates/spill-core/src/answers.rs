//! Answer submission and the read paths built on the projector.

use spill_types::models::{AnswerData, AuthoredSecret, ProjectedSecret};
use tracing::info;
use uuid::Uuid;

use crate::error::{Result, SpillError};
use crate::ports::{AnswerDraft, Store};
use crate::validation::{validate_answer_data, validate_body, validate_scale};
use crate::visibility::project;

#[derive(Debug, Clone)]
pub struct SubmitAnswer {
    pub author_id: Uuid,
    pub room_id: Uuid,
    pub question_id: Uuid,
    pub body: String,
    pub self_rating: i64,
    pub importance: i64,
    pub is_anonymous: bool,
    pub answer_data: Option<AnswerData>,
}

#[derive(Debug, Clone)]
pub struct Submitted {
    pub secret: ProjectedSecret,
    pub created: bool,
}

/// Creates the author's answer to a question, or edits it in place if one exists.
pub fn submit_answer<S: Store + ?Sized>(store: &S, cmd: SubmitAnswer) -> Result<Submitted> {
    let answer_data = cmd.answer_data.unwrap_or(AnswerData::Text);
    validate_answer_data(&answer_data)?;
    validate_body(&cmd.body, answer_data.answer_type())?;
    let self_rating = validate_scale(cmd.self_rating, "selfRating")?;
    let importance = validate_scale(cmd.importance, "importance")?;

    if !store.is_member(cmd.room_id, cmd.author_id)? {
        return Err(SpillError::NotAMember);
    }
    if !store.question_in_room(cmd.room_id, cmd.question_id)? {
        return Err(SpillError::NotFound("question"));
    }

    let draft = AnswerDraft {
        room_id: cmd.room_id,
        author_id: cmd.author_id,
        question_id: cmd.question_id,
        body: cmd.body.trim().to_string(),
        self_rating,
        importance,
        is_anonymous: cmd.is_anonymous,
        answer_data,
    };
    let upserted = store.upsert_answer(&draft)?;

    if upserted.created {
        info!(
            "Secret {} created by {} for question {}",
            upserted.secret.id, cmd.author_id, cmd.question_id
        );
    } else {
        info!("Secret {} edited by {}", upserted.secret.id, cmd.author_id);
    }

    let authored = store
        .find_secret(upserted.secret.id)?
        .ok_or(SpillError::NotFound("secret"))?;
    Ok(Submitted {
        secret: project(&authored, cmd.author_id, false),
        created: upserted.created,
    })
}

/// A single visible secret as seen by `viewer_id`, who must belong to its room.
pub fn get_secret<S: Store + ?Sized>(store: &S, secret_id: Uuid, viewer_id: Uuid) -> Result<ProjectedSecret> {
    let secret = store
        .find_secret(secret_id)?
        .filter(|s| !s.secret.is_hidden)
        .ok_or(SpillError::NotFound("secret"))?;

    if !store.is_member(secret.secret.room_id, viewer_id)? {
        return Err(SpillError::NotAMember);
    }

    let mut projected = project_for_viewer(store, vec![secret], viewer_id)?;
    projected.pop().ok_or(SpillError::NotFound("secret"))
}

/// Soft-deletes the author's own secret.
pub fn hide_secret<S: Store + ?Sized>(store: &S, secret_id: Uuid, author_id: Uuid) -> Result<()> {
    let secret = store
        .find_secret(secret_id)?
        .filter(|s| !s.secret.is_hidden)
        .ok_or(SpillError::NotFound("secret"))?;

    if secret.secret.author_id != author_id {
        return Err(SpillError::NotAuthor);
    }
    if !store.hide_secret(secret_id)? {
        return Err(SpillError::NotFound("secret"));
    }

    info!("Secret {} hidden by its author", secret_id);
    Ok(())
}

/// Every visible secret in a room, newest first, projected for `viewer_id`.
pub fn room_secrets<S: Store + ?Sized>(store: &S, room_id: Uuid, viewer_id: Uuid) -> Result<Vec<ProjectedSecret>> {
    if !store.is_member(room_id, viewer_id)? {
        return Err(SpillError::NotAMember);
    }
    let secrets = store.list_room_secrets(room_id)?;
    project_for_viewer(store, secrets, viewer_id)
}

/// Everyone's answers to one question, oldest first.
///
/// Only viewers who have a visible answer of their own to the question may
/// look; having unlocked individual answers does not count.
pub fn question_answers<S: Store + ?Sized>(
    store: &S,
    room_id: Uuid,
    question_id: Uuid,
    viewer_id: Uuid,
) -> Result<Vec<ProjectedSecret>> {
    if !store.is_member(room_id, viewer_id)? {
        return Err(SpillError::NotAMember);
    }
    if store.find_answer(room_id, viewer_id, question_id)?.is_none() {
        return Err(SpillError::MustAnswerFirst);
    }
    let secrets = store.list_question_secrets(room_id, question_id)?;
    project_for_viewer(store, secrets, viewer_id)
}

/// Projects a batch with two ledger lookups instead of one per secret.
fn project_for_viewer<S: Store + ?Sized>(
    store: &S,
    secrets: Vec<AuthoredSecret>,
    viewer_id: Uuid,
) -> Result<Vec<ProjectedSecret>> {
    let ids: Vec<Uuid> = secrets.iter().map(|s| s.secret.id).collect();
    let unlocked = store.unlocked_among(viewer_id, &ids)?;
    let ratings = store.ratings_by(viewer_id, &ids)?;

    Ok(secrets
        .iter()
        .map(|s| {
            let mut projected = project(s, viewer_id, unlocked.contains(&s.secret.id));
            projected.my_rating = ratings.get(&s.secret.id).copied();
            projected
        })
        .collect())
}
