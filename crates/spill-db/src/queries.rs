//! Users, rooms, questions and membership. These rows are owned by the
//! identity and room services; the helpers here are how they (and tests)
//! write them.

use anyhow::Result;
use rusqlite::OptionalExtension;
use spill_core::ports::MembershipDirectory;
use uuid::Uuid;

use crate::Database;
use crate::models::now_timestamp;

impl Database {
    // -- Users --

    pub fn create_user(
        &self,
        id: Uuid,
        name: &str,
        email: Option<&str>,
        avatar_url: Option<&str>,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO users (id, name, email, avatar_url, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![id.to_string(), name, email, avatar_url, now_timestamp()],
            )?;
            Ok(())
        })
    }

    // -- Rooms --

    /// Creates a room; the owner is enrolled as its first member.
    pub fn create_room(&self, id: Uuid, name: &str, owner_id: Uuid) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let now = now_timestamp();
            tx.execute(
                "INSERT INTO rooms (id, name, owner_id, created_at) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![id.to_string(), name, owner_id.to_string(), now],
            )?;
            tx.execute(
                "INSERT INTO room_members (room_id, user_id, joined_at) VALUES (?1, ?2, ?3)",
                rusqlite::params![id.to_string(), owner_id.to_string(), now],
            )?;
            tx.commit()?;
            Ok(())
        })
    }

    pub fn add_member(&self, room_id: Uuid, user_id: Uuid) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT OR IGNORE INTO room_members (room_id, user_id, joined_at) VALUES (?1, ?2, ?3)",
                rusqlite::params![room_id.to_string(), user_id.to_string(), now_timestamp()],
            )?;
            Ok(())
        })
    }

    // -- Questions --

    pub fn create_question(&self, id: Uuid, room_id: Uuid, text: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO questions (id, room_id, text, created_at) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![id.to_string(), room_id.to_string(), text, now_timestamp()],
            )?;
            Ok(())
        })
    }

    pub fn question_exists_in_room(&self, room_id: Uuid, question_id: Uuid) -> Result<bool> {
        self.with_conn(|conn| {
            let found = conn
                .query_row(
                    "SELECT 1 FROM questions WHERE id = ?1 AND room_id = ?2",
                    rusqlite::params![question_id.to_string(), room_id.to_string()],
                    |_| Ok(()),
                )
                .optional()?;
            Ok(found.is_some())
        })
    }
}

impl MembershipDirectory for Database {
    fn is_member(&self, room_id: Uuid, user_id: Uuid) -> Result<bool> {
        self.with_conn(|conn| {
            let found = conn
                .query_row(
                    "SELECT 1 FROM room_members WHERE room_id = ?1 AND user_id = ?2",
                    rusqlite::params![room_id.to_string(), user_id.to_string()],
                    |_| Ok(()),
                )
                .optional()?;
            Ok(found.is_some())
        })
    }
}
