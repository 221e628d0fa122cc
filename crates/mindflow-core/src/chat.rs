use mindflow_lesson::SYSTEM_PROMPT;
use mindflow_llm::{LlmProvider, Message, Role};
use mindflow_store::{ChatRecord, SqliteStore};
use serde::Serialize;

use crate::service::{ServiceError, serialize_error};

#[derive(Debug, Serialize)]
pub struct ChatReply {
    pub content: String,
    /// Set when the reply was generated but could not be saved.
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_error"
    )]
    pub error: Option<ServiceError>,
}

/// Tutor conversation backed by persisted per-user history.
pub struct ChatService<P> {
    provider: P,
    store: SqliteStore,
    history_limit: usize,
}

impl<P: LlmProvider> ChatService<P> {
    #[must_use]
    pub fn new(provider: P, store: SqliteStore, history_limit: usize) -> Self {
        Self {
            provider,
            store,
            history_limit,
        }
    }

    /// Store `content`, ask the model with the recent history and store the reply.
    ///
    /// The history sent to the model holds the most recent `history_limit` messages,
    /// the new one included.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Persistence`] if the message or history cannot be
    /// accessed and [`ServiceError::Upstream`] if the model call fails.
    pub async fn send(&self, user_id: &str, content: &str) -> Result<ChatReply, ServiceError> {
        self.store
            .append_message(user_id, Role::User.as_str(), content)
            .await?;
        let history = self.store.recent_messages(user_id, self.history_limit).await?;

        let mut messages = Vec::with_capacity(history.len() + 1);
        messages.push(Message::system(SYSTEM_PROMPT));
        messages.extend(history.into_iter().filter_map(to_message));

        let reply = self.provider.chat(&messages).await?;

        let error = match self
            .store
            .append_message(user_id, Role::Assistant.as_str(), &reply)
            .await
        {
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(user_id, "failed to store assistant reply: {e}");
                Some(ServiceError::Persistence(e))
            }
        };

        Ok(ChatReply {
            content: reply,
            error,
        })
    }

    /// Stored conversation for `user_id`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Persistence`] if the history cannot be read.
    pub async fn history(&self, user_id: &str) -> Result<Vec<Message>, ServiceError> {
        let records = self.store.recent_messages(user_id, self.history_limit).await?;
        Ok(records.into_iter().filter_map(to_message).collect())
    }

    /// Forget the conversation of `user_id`.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Persistence`] if the delete fails.
    pub async fn clear(&self, user_id: &str) -> Result<u64, ServiceError> {
        Ok(self.store.clear_messages(user_id).await?)
    }
}

fn to_message(record: ChatRecord) -> Option<Message> {
    match record.role.parse::<Role>() {
        Ok(role) => Some(Message::new(role, record.content)),
        Err(e) => {
            tracing::warn!(id = record.id, "skipping stored chat message: {e}");
            None
        }
    }
}
