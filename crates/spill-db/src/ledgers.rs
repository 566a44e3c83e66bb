//! Access and rating ledgers.

use std::collections::{HashMap, HashSet};

use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, TransactionBehavior};
use spill_core::ports::{
    AccessLedgerRepository, AnswerDraft, RatingLedgerRepository, UnlockOutcome,
};
use tracing::warn;
use uuid::Uuid;

use crate::Database;
use crate::models::{now_timestamp, parse_id};
use crate::secrets::{UpsertMode, query_secret, refresh_aggregate, upsert_answer_in};

impl AccessLedgerRepository for Database {
    fn has_unlocked(&self, buyer_id: Uuid, secret_id: Uuid) -> Result<bool> {
        self.with_conn(|conn| {
            let found = conn
                .query_row(
                    "SELECT 1 FROM secret_access WHERE buyer_id = ?1 AND secret_id = ?2",
                    rusqlite::params![buyer_id.to_string(), secret_id.to_string()],
                    |_| Ok(()),
                )
                .optional()?;
            Ok(found.is_some())
        })
    }

    fn unlocked_among(&self, viewer_id: Uuid, secret_ids: &[Uuid]) -> Result<HashSet<Uuid>> {
        if secret_ids.is_empty() {
            return Ok(HashSet::new());
        }
        let rows = self.with_conn(|conn| {
            select_for_viewer(
                conn,
                "SELECT secret_id FROM secret_access WHERE buyer_id = ?1 AND secret_id IN",
                viewer_id,
                secret_ids,
                |row| row.get::<_, String>(0),
            )
        })?;

        rows.iter().map(|id| parse_id(id, "secret_id")).collect()
    }

    fn record_unlock(&self, secret_id: Uuid, buyer_answer: &AnswerDraft) -> Result<UnlockOutcome> {
        let sid = secret_id.to_string();
        self.with_conn_mut(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            if !is_visible(&tx, &sid)? {
                return Ok(UnlockOutcome::TargetGone);
            }

            // The unique (buyer_id, secret_id) constraint decides who wins a race.
            let inserted = tx.execute(
                "INSERT INTO secret_access (id, secret_id, buyer_id, created_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT (buyer_id, secret_id) DO NOTHING",
                rusqlite::params![
                    Uuid::new_v4().to_string(),
                    sid,
                    buyer_answer.author_id.to_string(),
                    now_timestamp(),
                ],
            )?;
            if inserted == 0 {
                return Ok(UnlockOutcome::AlreadyUnlocked);
            }

            upsert_answer_in(&tx, buyer_answer, UpsertMode::Unlock)?;

            tx.execute(
                "UPDATE secrets SET buyers_count = buyers_count + 1 WHERE id = ?1",
                [&sid],
            )?;

            let target = query_secret(&tx, &sid)?
                .ok_or_else(|| anyhow::anyhow!("secret {sid} vanished during unlock"))?
                .into_secret()?;
            tx.commit()?;
            Ok(UnlockOutcome::Unlocked(target))
        })
    }
}

impl RatingLedgerRepository for Database {
    fn record_rating(&self, secret_id: Uuid, rater_id: Uuid, rating: u8) -> Result<Option<f64>> {
        let sid = secret_id.to_string();
        self.with_conn_mut(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            if !is_visible(&tx, &sid)? {
                return Ok(None);
            }

            tx.execute(
                "INSERT INTO secret_ratings (id, secret_id, rater_id, rating, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT (rater_id, secret_id) DO UPDATE SET
                     rating = excluded.rating,
                     created_at = excluded.created_at",
                rusqlite::params![
                    Uuid::new_v4().to_string(),
                    sid,
                    rater_id.to_string(),
                    rating,
                    now_timestamp(),
                ],
            )?;

            let avg = refresh_aggregate(&tx, &sid)?;
            tx.commit()?;
            Ok(Some(avg))
        })
    }

    fn ratings_by(&self, rater_id: Uuid, secret_ids: &[Uuid]) -> Result<HashMap<Uuid, u8>> {
        if secret_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let rows = self.with_conn(|conn| {
            select_for_viewer(
                conn,
                "SELECT secret_id, rating FROM secret_ratings WHERE rater_id = ?1 AND secret_id IN",
                rater_id,
                secret_ids,
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, u8>(1)?)),
            )
        })?;

        let mut ratings = HashMap::with_capacity(rows.len());
        for (id, rating) in rows {
            match parse_id(&id, "secret_id") {
                Ok(id) => {
                    ratings.insert(id, rating);
                }
                Err(e) => warn!("Skipping rating row: {:#}", e),
            }
        }
        Ok(ratings)
    }
}

impl Database {
    /// Number of access ledger rows for a secret.
    pub fn count_unlocks(&self, secret_id: Uuid) -> Result<u32> {
        self.with_conn(|conn| {
            let count: u32 = conn.query_row(
                "SELECT COUNT(*) FROM secret_access WHERE secret_id = ?1",
                [secret_id.to_string()],
                |row| row.get(0),
            )?;
            Ok(count)
        })
    }

    /// All ratings recorded for a secret, in no particular order.
    pub fn ratings_for(&self, secret_id: Uuid) -> Result<Vec<u8>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT rating FROM secret_ratings WHERE secret_id = ?1")?;
            let rows = stmt
                .query_map([secret_id.to_string()], |row| row.get(0))?
                .collect::<std::result::Result<Vec<u8>, _>>()?;
            Ok(rows)
        })
    }
}

fn is_visible(conn: &Connection, secret_id: &str) -> Result<bool> {
    let hidden: Option<bool> = conn
        .query_row(
            "SELECT is_hidden FROM secrets WHERE id = ?1",
            [secret_id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(hidden == Some(false))
}

/// Runs `{prefix} (?2, ?3, ...)` with the viewer bound to `?1`.
fn select_for_viewer<T, F>(
    conn: &Connection,
    prefix: &str,
    viewer_id: Uuid,
    secret_ids: &[Uuid],
    map: F,
) -> Result<Vec<T>>
where
    F: FnMut(&rusqlite::Row<'_>) -> rusqlite::Result<T>,
{
    let placeholders: Vec<String> = (2..=secret_ids.len() + 1).map(|i| format!("?{}", i)).collect();
    let sql = format!("{} ({})", prefix, placeholders.join(", "));

    let mut values: Vec<String> = Vec::with_capacity(secret_ids.len() + 1);
    values.push(viewer_id.to_string());
    values.extend(secret_ids.iter().map(Uuid::to_string));

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(rusqlite::params_from_iter(values.iter()), map)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}
