use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 =
        conn.query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(
            "
            BEGIN;

            -- Written by the identity and room services; read here for
            -- author profiles and membership.
            CREATE TABLE users (
                id          TEXT PRIMARY KEY,
                name        TEXT NOT NULL,
                email       TEXT,
                avatar_url  TEXT,
                created_at  TEXT NOT NULL
            );

            CREATE TABLE rooms (
                id          TEXT PRIMARY KEY,
                name        TEXT NOT NULL,
                owner_id    TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                created_at  TEXT NOT NULL
            );

            CREATE TABLE room_members (
                room_id     TEXT NOT NULL REFERENCES rooms(id) ON DELETE CASCADE,
                user_id     TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                joined_at   TEXT NOT NULL,
                PRIMARY KEY (room_id, user_id)
            );

            CREATE TABLE questions (
                id          TEXT PRIMARY KEY,
                room_id     TEXT NOT NULL REFERENCES rooms(id) ON DELETE CASCADE,
                text        TEXT NOT NULL,
                metadata    TEXT,
                created_at  TEXT NOT NULL
            );

            CREATE TABLE secrets (
                id            TEXT PRIMARY KEY,
                room_id       TEXT NOT NULL REFERENCES rooms(id) ON DELETE CASCADE,
                author_id     TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                question_id   TEXT NOT NULL REFERENCES questions(id) ON DELETE CASCADE,
                body          TEXT NOT NULL,
                self_rating   INTEGER NOT NULL CHECK (self_rating BETWEEN 1 AND 5),
                importance    INTEGER NOT NULL CHECK (importance BETWEEN 1 AND 5),
                avg_rating    REAL,
                buyers_count  INTEGER NOT NULL DEFAULT 0 CHECK (buyers_count >= 0),
                is_anonymous  INTEGER NOT NULL DEFAULT 0,
                is_hidden     INTEGER NOT NULL DEFAULT 0,
                answer_type   TEXT NOT NULL DEFAULT 'text',
                answer_data   TEXT,
                created_at    TEXT NOT NULL,
                updated_at    TEXT NOT NULL
            );

            -- One visible answer per (room, author, question); upsert target.
            CREATE UNIQUE INDEX idx_secrets_answer
                ON secrets(room_id, author_id, question_id) WHERE is_hidden = 0;

            CREATE INDEX idx_secrets_room
                ON secrets(room_id, created_at);

            CREATE INDEX idx_secrets_question
                ON secrets(question_id, created_at);

            CREATE TABLE secret_access (
                id          TEXT PRIMARY KEY,
                secret_id   TEXT NOT NULL REFERENCES secrets(id) ON DELETE CASCADE,
                buyer_id    TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                created_at  TEXT NOT NULL,
                UNIQUE (buyer_id, secret_id)
            );

            CREATE INDEX idx_secret_access_secret
                ON secret_access(secret_id);

            CREATE TABLE secret_ratings (
                id          TEXT PRIMARY KEY,
                secret_id   TEXT NOT NULL REFERENCES secrets(id) ON DELETE CASCADE,
                rater_id    TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                rating      INTEGER NOT NULL CHECK (rating BETWEEN 1 AND 5),
                created_at  TEXT NOT NULL,
                UNIQUE (rater_id, secret_id)
            );

            CREATE INDEX idx_secret_ratings_secret
                ON secret_ratings(secret_id);

            INSERT INTO schema_version (version) VALUES (1);

            COMMIT;
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
