//! Database row types. These map directly to SQLite rows and are kept
//! distinct from the spill-types models.

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use rusqlite::Row;
use spill_types::models::{AnswerData, AnswerType, AuthorProfile, AuthoredSecret, Secret};
use tracing::warn;
use uuid::Uuid;

/// Column list matching [`SecretRow::from_row`]; expects `secrets s LEFT JOIN users u`.
pub const SECRET_COLUMNS: &str = "s.id, s.room_id, s.author_id, s.question_id, s.body, \
     s.self_rating, s.importance, s.avg_rating, s.buyers_count, s.is_anonymous, s.is_hidden, \
     s.answer_type, s.answer_data, s.created_at, s.updated_at, u.name, u.avatar_url";

pub struct SecretRow {
    pub id: String,
    pub room_id: String,
    pub author_id: String,
    pub question_id: String,
    pub body: String,
    pub self_rating: i64,
    pub importance: i64,
    pub avg_rating: Option<f64>,
    pub buyers_count: i64,
    pub is_anonymous: bool,
    pub is_hidden: bool,
    pub answer_type: String,
    pub answer_data: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub author_name: Option<String>,
    pub author_avatar: Option<String>,
}

impl SecretRow {
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            room_id: row.get(1)?,
            author_id: row.get(2)?,
            question_id: row.get(3)?,
            body: row.get(4)?,
            self_rating: row.get(5)?,
            importance: row.get(6)?,
            avg_rating: row.get(7)?,
            buyers_count: row.get(8)?,
            is_anonymous: row.get(9)?,
            is_hidden: row.get(10)?,
            answer_type: row.get(11)?,
            answer_data: row.get(12)?,
            created_at: row.get(13)?,
            updated_at: row.get(14)?,
            author_name: row.get(15)?,
            author_avatar: row.get(16)?,
        })
    }

    pub fn into_authored(self) -> Result<AuthoredSecret> {
        let author = AuthorProfile {
            name: self.author_name.clone().unwrap_or_else(|| "unknown".to_string()),
            avatar_url: self.author_avatar.clone(),
        };
        Ok(AuthoredSecret {
            secret: self.into_secret()?,
            author,
        })
    }

    pub fn into_secret(self) -> Result<Secret> {
        let answer_data = match &self.answer_data {
            Some(json) => serde_json::from_str::<AnswerData>(json)
                .with_context(|| format!("corrupt answer_data on secret '{}'", self.id))?,
            None => AnswerData::Text,
        };
        if AnswerType::parse(&self.answer_type) != Some(answer_data.answer_type()) {
            warn!(
                "Secret '{}' has answer_type '{}' but {:?} data",
                self.id,
                self.answer_type,
                answer_data.answer_type()
            );
        }

        Ok(Secret {
            id: parse_id(&self.id, "secret id")?,
            room_id: parse_id(&self.room_id, "room_id")?,
            author_id: parse_id(&self.author_id, "author_id")?,
            question_id: parse_id(&self.question_id, "question_id")?,
            self_rating: scale(self.self_rating, "self_rating")?,
            importance: scale(self.importance, "importance")?,
            avg_rating: self.avg_rating,
            buyers_count: u32::try_from(self.buyers_count)
                .map_err(|_| anyhow!("corrupt buyers_count {} on '{}'", self.buyers_count, self.id))?,
            is_anonymous: self.is_anonymous,
            is_hidden: self.is_hidden,
            answer_data,
            created_at: parse_timestamp(&self.created_at, &self.id),
            updated_at: parse_timestamp(&self.updated_at, &self.id),
            body: self.body,
        })
    }
}

/// Serialized form of an answer payload; plain text answers store NULL.
pub fn answer_data_json(data: &AnswerData) -> Result<Option<String>> {
    match data {
        AnswerData::Text => Ok(None),
        other => Ok(Some(serde_json::to_string(other)?)),
    }
}

pub fn parse_id(raw: &str, what: &str) -> Result<Uuid> {
    raw.parse::<Uuid>()
        .with_context(|| format!("corrupt {what} '{raw}'"))
}

fn scale(value: i64, what: &str) -> Result<u8> {
    u8::try_from(value).map_err(|_| anyhow!("corrupt {what} {value}"))
}

/// Timestamps are written as RFC 3339 with microseconds so that string order
/// matches time order.
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn parse_timestamp(raw: &str, row_id: &str) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            // SQLite's datetime('now') format, no timezone
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt timestamp '{}' on row '{}': {}", raw, row_id, e);
            DateTime::default()
        })
}
