//! Data Access Layer
//!
//! This module contains all the functions for interacting with the SQLite database.
//! It uses `sqlx` connection pooling and embedded migrations, and implements the
//! core storage contracts for learning progress and conversation history.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lingo_core::{
    conversation::ConversationContext,
    store::{
        ChatMessage, ConversationStore, ProgressRecord, ProgressStore, StoredConversation,
        clamp_progress,
    },
};
use sqlx::{
    FromRow, SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use std::str::FromStr;
use tracing::info;

#[derive(FromRow)]
struct ProgressRow {
    user_id: String,
    resource_type: String,
    resource_id: String,
    progress: f64,
    completed: bool,
    last_accessed: DateTime<Utc>,
}

impl From<ProgressRow> for ProgressRecord {
    fn from(row: ProgressRow) -> Self {
        Self {
            user_id: row.user_id,
            resource_type: row.resource_type,
            resource_id: row.resource_id,
            progress: row.progress,
            completed: row.completed,
            last_accessed: row.last_accessed,
        }
    }
}

#[derive(FromRow)]
struct ConversationRow {
    id: i64,
    context_json: String,
}

#[derive(FromRow)]
struct MessageRow {
    role: String,
    content: String,
    audio_ref: Option<String>,
}

impl TryFrom<MessageRow> for ChatMessage {
    type Error = anyhow::Error;

    fn try_from(row: MessageRow) -> Result<Self> {
        Ok(Self {
            role: row.role.parse()?,
            content: row.content,
            audio_ref: row.audio_ref,
        })
    }
}

/// A wrapper around the `SqlitePool` to provide a clear data access interface.
#[derive(Clone)]
pub struct Db {
    pool: SqlitePool,
}

impl Db {
    /// Creates a new `Db` instance.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Opens (creating if needed) the database at `database_url`.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("Invalid DATABASE_URL '{}'", database_url))?
            .create_if_missing(true);

        if let Some(parent) = options.get_filename().parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create database directory {}", parent.display())
                })?;
            }
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;
        info!("Connected to database at {}", database_url);
        Ok(Self::new(pool))
    }

    /// Runs all pending `sqlx` migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl ProgressStore for Db {
    async fn record_progress(
        &self,
        user_id: &str,
        resource_type: &str,
        resource_id: &str,
        progress: f64,
        completed: bool,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO learning_progress
                (user_id, resource_type, resource_id, progress, completed, last_accessed)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT (user_id, resource_type, resource_id) DO UPDATE SET
                progress = MAX(learning_progress.progress, excluded.progress),
                completed = learning_progress.completed OR excluded.completed,
                last_accessed = excluded.last_accessed
            "#,
        )
        .bind(user_id)
        .bind(resource_type)
        .bind(resource_id)
        .bind(clamp_progress(progress))
        .bind(completed)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn progress_for(&self, user_id: &str) -> Result<Vec<ProgressRecord>> {
        let rows: Vec<ProgressRow> = sqlx::query_as(
            r#"
            SELECT user_id, resource_type, resource_id, progress, completed, last_accessed
            FROM learning_progress
            WHERE user_id = ?
            ORDER BY last_accessed DESC, id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(ProgressRecord::from).collect())
    }
}

#[async_trait]
impl ConversationStore for Db {
    async fn save_conversation_state(
        &self,
        user_id: &str,
        language: &str,
        topic: &str,
        context: &ConversationContext,
        messages: &[ChatMessage],
    ) -> Result<()> {
        let context_json = serde_json::to_string(context)?;
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let (conversation_id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO conversations (user_id, language, topic, context_json, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT (user_id, language, topic) DO UPDATE SET
                context_json = excluded.context_json,
                updated_at = excluded.updated_at
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(language)
        .bind(topic)
        .bind(&context_json)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM conversation_messages WHERE conversation_id = ?")
            .bind(conversation_id)
            .execute(&mut *tx)
            .await?;

        for (position, message) in messages.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO conversation_messages
                    (conversation_id, position, role, content, audio_ref, created_at)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(conversation_id)
            .bind(position as i64)
            .bind(message.role.as_str())
            .bind(&message.content)
            .bind(message.audio_ref.as_deref())
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn load_conversation_state(
        &self,
        user_id: &str,
        language: &str,
        topic: &str,
    ) -> Result<Option<StoredConversation>> {
        let conversation: Option<ConversationRow> = sqlx::query_as(
            "SELECT id, context_json FROM conversations WHERE user_id = ? AND language = ? AND topic = ?",
        )
        .bind(user_id)
        .bind(language)
        .bind(topic)
        .fetch_optional(&self.pool)
        .await?;

        let Some(conversation) = conversation else {
            return Ok(None);
        };

        let context: ConversationContext = serde_json::from_str(&conversation.context_json)
            .context("Stored conversation context is corrupt")?;

        let rows: Vec<MessageRow> = sqlx::query_as(
            r#"
            SELECT role, content, audio_ref
            FROM conversation_messages
            WHERE conversation_id = ?
            ORDER BY position ASC, id ASC
            "#,
        )
        .bind(conversation.id)
        .fetch_all(&self.pool)
        .await?;

        let messages = rows
            .into_iter()
            .map(ChatMessage::try_from)
            .collect::<Result<Vec<_>>>()?;

        Ok(Some(StoredConversation { context, messages }))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use lingo_core::conversation::ConversationState;

    pub(crate) async fn memory_db() -> Db {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        let db = Db::new(pool);
        db.run_migrations().await.unwrap();
        db
    }

    #[tokio::test]
    async fn test_record_progress_upserts_one_row_per_key() {
        let db = memory_db().await;

        db.record_progress("u1", "game", "proverb_match/zulu/0", 0.5, false)
            .await
            .unwrap();
        db.record_progress("u1", "game", "proverb_match/zulu/0", 3.0, true)
            .await
            .unwrap();
        db.record_progress("u1", "game", "cultural_quiz/zulu/1", -1.0, false)
            .await
            .unwrap();
        db.record_progress("u2", "game", "proverb_match/zulu/0", 0.2, false)
            .await
            .unwrap();

        let records = db.progress_for("u1").await.unwrap();
        assert_eq!(records.len(), 2);

        let proverb = records
            .iter()
            .find(|r| r.resource_id == "proverb_match/zulu/0")
            .unwrap();
        assert_eq!(proverb.progress, 1.0);
        assert!(proverb.completed);

        let quiz = records
            .iter()
            .find(|r| r.resource_id == "cultural_quiz/zulu/1")
            .unwrap();
        assert_eq!(quiz.progress, 0.0);

        assert!(db.progress_for("nobody").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_record_progress_never_goes_backwards() {
        let db = memory_db().await;

        db.record_progress("u1", "conversation", "zulu/general", 1.0, true)
            .await
            .unwrap();
        db.record_progress("u1", "conversation", "zulu/general", 0.0, false)
            .await
            .unwrap();
        db.record_progress("u1", "game", "proverb_match/zulu/0", 0.4, false)
            .await
            .unwrap();
        db.record_progress("u1", "game", "proverb_match/zulu/0", 0.7, false)
            .await
            .unwrap();

        let records = db.progress_for("u1").await.unwrap();
        let conversation = records
            .iter()
            .find(|r| r.resource_type == "conversation")
            .unwrap();
        assert_eq!(conversation.progress, 1.0);
        assert!(conversation.completed);

        let game = records.iter().find(|r| r.resource_type == "game").unwrap();
        assert_eq!(game.progress, 0.7);
        assert!(!game.completed);
    }

    #[tokio::test]
    async fn test_conversation_round_trip_replaces_messages() {
        let db = memory_db().await;
        let mut context = ConversationContext {
            practice_mode_enabled: true,
            ..ConversationContext::default()
        };
        let first = vec![
            ChatMessage::assistant("Sawubona! (Hello)"),
            ChatMessage::user("Sawubona"),
        ];
        db.save_conversation_state("u1", "zulu", "basics", &context, &first)
            .await
            .unwrap();

        context.state = ConversationState::Conversation;
        let mut second = first.clone();
        second.push(ChatMessage {
            audio_ref: Some("zulu-1".to_string()),
            ..ChatMessage::assistant("Unjani? (How are you?)")
        });
        db.save_conversation_state("u1", "zulu", "basics", &context, &second)
            .await
            .unwrap();

        let stored = db
            .load_conversation_state("u1", "zulu", "basics")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.context, context);
        assert_eq!(stored.messages, second);

        assert!(
            db.load_conversation_state("u1", "zulu", "grammar")
                .await
                .unwrap()
                .is_none()
        );
        assert!(
            db.load_conversation_state("u2", "zulu", "basics")
                .await
                .unwrap()
                .is_none()
        );
    }
}
