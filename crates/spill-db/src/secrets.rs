use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, TransactionBehavior};
use spill_core::ports::{AnswerDraft, SecretRepository, UpsertedAnswer};
use spill_core::rating::aggregate;
use spill_types::models::{AuthoredSecret, Secret};
use uuid::Uuid;

use crate::Database;
use crate::models::{SECRET_COLUMNS, SecretRow, answer_data_json, now_timestamp};

/// Which fields an existing answer takes from the draft on conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UpsertMode {
    /// Resubmission from the author: everything the author controls.
    Edit,
    /// Answer written as the price of an unlock: a plain-text answer with its
    /// ratings. Anonymity stays as the author set it.
    Unlock,
}

const INSERT_ANSWER: &str = "INSERT INTO secrets (
        id, room_id, author_id, question_id, body, self_rating, importance,
        avg_rating, buyers_count, is_anonymous, is_hidden, answer_type, answer_data,
        created_at, updated_at
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?6, 0, ?8, 0, ?9, ?10, ?11, ?11)
    ON CONFLICT (room_id, author_id, question_id) WHERE is_hidden = 0 DO UPDATE SET";

const EDIT_SET: &str = "
        body = excluded.body,
        self_rating = excluded.self_rating,
        importance = excluded.importance,
        is_anonymous = excluded.is_anonymous,
        answer_type = excluded.answer_type,
        answer_data = excluded.answer_data,
        updated_at = excluded.updated_at
    RETURNING id";

const UNLOCK_SET: &str = "
        body = excluded.body,
        self_rating = excluded.self_rating,
        importance = excluded.importance,
        answer_type = excluded.answer_type,
        answer_data = excluded.answer_data,
        updated_at = excluded.updated_at
    RETURNING id";

impl SecretRepository for Database {
    fn find_secret(&self, id: Uuid) -> Result<Option<AuthoredSecret>> {
        self.with_conn(|conn| {
            query_secret(conn, &id.to_string())?
                .map(SecretRow::into_authored)
                .transpose()
        })
    }

    fn find_answer(
        &self,
        room_id: Uuid,
        author_id: Uuid,
        question_id: Uuid,
    ) -> Result<Option<Secret>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {SECRET_COLUMNS} FROM secrets s LEFT JOIN users u ON s.author_id = u.id
                 WHERE s.room_id = ?1 AND s.author_id = ?2 AND s.question_id = ?3 AND s.is_hidden = 0"
            );
            conn.query_row(
                &sql,
                rusqlite::params![room_id.to_string(), author_id.to_string(), question_id.to_string()],
                SecretRow::from_row,
            )
            .optional()?
            .map(SecretRow::into_secret)
            .transpose()
        })
    }

    fn upsert_answer(&self, draft: &AnswerDraft) -> Result<UpsertedAnswer> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let (id, created) = upsert_answer_in(&tx, draft, UpsertMode::Edit)?;
            let secret = query_secret(&tx, &id)?
                .ok_or_else(|| anyhow::anyhow!("secret {id} vanished after upsert"))?
                .into_secret()?;
            tx.commit()?;
            Ok(UpsertedAnswer { secret, created })
        })
    }

    fn hide_secret(&self, id: Uuid) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE secrets SET is_hidden = 1, updated_at = ?2 WHERE id = ?1 AND is_hidden = 0",
                rusqlite::params![id.to_string(), now_timestamp()],
            )?;
            Ok(changed > 0)
        })
    }

    fn list_room_secrets(&self, room_id: Uuid) -> Result<Vec<AuthoredSecret>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {SECRET_COLUMNS} FROM secrets s LEFT JOIN users u ON s.author_id = u.id
                 WHERE s.room_id = ?1 AND s.is_hidden = 0
                 ORDER BY s.created_at DESC, s.rowid DESC"
            );
            collect_secrets(conn, &sql, rusqlite::params![room_id.to_string()])
        })
    }

    fn list_question_secrets(
        &self,
        room_id: Uuid,
        question_id: Uuid,
    ) -> Result<Vec<AuthoredSecret>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {SECRET_COLUMNS} FROM secrets s LEFT JOIN users u ON s.author_id = u.id
                 WHERE s.room_id = ?1 AND s.question_id = ?2 AND s.is_hidden = 0
                 ORDER BY s.created_at ASC, s.rowid ASC"
            );
            collect_secrets(
                conn,
                &sql,
                rusqlite::params![room_id.to_string(), question_id.to_string()],
            )
        })
    }

    fn question_in_room(&self, room_id: Uuid, question_id: Uuid) -> Result<bool> {
        self.question_exists_in_room(room_id, question_id)
    }
}

pub(crate) fn query_secret(conn: &Connection, id: &str) -> Result<Option<SecretRow>> {
    let sql = format!(
        "SELECT {SECRET_COLUMNS} FROM secrets s LEFT JOIN users u ON s.author_id = u.id WHERE s.id = ?1"
    );
    let row = conn.query_row(&sql, [id], SecretRow::from_row).optional()?;
    Ok(row)
}

fn collect_secrets(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
) -> Result<Vec<AuthoredSecret>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, SecretRow::from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    rows.into_iter().map(SecretRow::into_authored).collect()
}

/// Inserts or updates the draft's answer on the partial unique index and
/// rebuilds its aggregate. Returns the row id and whether it was created.
/// Must run inside the caller's transaction.
pub(crate) fn upsert_answer_in(
    conn: &Connection,
    draft: &AnswerDraft,
    mode: UpsertMode,
) -> Result<(String, bool)> {
    let new_id = Uuid::new_v4().to_string();
    let set = match mode {
        UpsertMode::Edit => EDIT_SET,
        UpsertMode::Unlock => UNLOCK_SET,
    };
    let sql = format!("{INSERT_ANSWER}{set}");

    let id: String = conn.query_row(
        &sql,
        rusqlite::params![
            new_id,
            draft.room_id.to_string(),
            draft.author_id.to_string(),
            draft.question_id.to_string(),
            draft.body,
            draft.self_rating,
            draft.importance,
            draft.is_anonymous,
            draft.answer_data.answer_type().as_str(),
            answer_data_json(&draft.answer_data)?,
            now_timestamp(),
        ],
        |row| row.get(0),
    )?;

    let created = id == new_id;
    // An edit may change self_rating, which takes part in the aggregate.
    refresh_aggregate(conn, &id)?;
    Ok((id, created))
}

/// Recomputes `avg_rating` from the full rating ledger and persists it.
pub(crate) fn refresh_aggregate(conn: &Connection, secret_id: &str) -> Result<f64> {
    let self_rating: u8 = conn.query_row(
        "SELECT self_rating FROM secrets WHERE id = ?1",
        [secret_id],
        |row| row.get(0),
    )?;

    let mut stmt = conn.prepare_cached("SELECT rating FROM secret_ratings WHERE secret_id = ?1")?;
    let ratings = stmt
        .query_map([secret_id], |row| row.get::<_, u8>(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let avg = aggregate(self_rating, &ratings);
    conn.execute(
        "UPDATE secrets SET avg_rating = ?2 WHERE id = ?1",
        rusqlite::params![secret_id, avg],
    )?;
    Ok(avg)
}
