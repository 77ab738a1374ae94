//! `PostgreSQL` conversation state store.

use super::{models::ConversationStateRow, repository::TaskPgPool, schema::conversation_states};
use crate::task::{
    domain::{ConversationKey, ConversationState},
    ports::{ConversationStateError, ConversationStateRepository, ConversationStateResult},
};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;

/// `PostgreSQL`-backed conversation state store.
#[derive(Debug, Clone)]
pub struct PostgresConversationStateRepository {
    pool: TaskPgPool,
}

impl PostgresConversationStateRepository {
    /// Creates a new store from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: TaskPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> ConversationStateResult<T>
    where
        F: FnOnce(&mut PgConnection) -> ConversationStateResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(ConversationStateError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(ConversationStateError::persistence)?
    }
}

#[async_trait]
impl ConversationStateRepository for PostgresConversationStateRepository {
    async fn load(&self, key: ConversationKey) -> ConversationStateResult<Option<ConversationState>> {
        self.run_blocking(move |connection| {
            let row = conversation_states::table
                .filter(conversation_states::conversation_key.eq(key.value()))
                .select(ConversationStateRow::as_select())
                .first::<ConversationStateRow>(connection)
                .optional()
                .map_err(ConversationStateError::persistence)?;

            row.map(|stored| {
                let data = serde_json::from_value(stored.data)
                    .map_err(ConversationStateError::persistence)?;
                Ok(ConversationState::new(stored.mode).with_data(data))
            })
            .transpose()
        })
        .await
    }

    async fn save(
        &self,
        key: ConversationKey,
        state: &ConversationState,
    ) -> ConversationStateResult<()> {
        let row = ConversationStateRow {
            conversation_key: key.value(),
            mode: state.mode().to_owned(),
            data: serde_json::Value::Object(state.data().clone()),
        };

        self.run_blocking(move |connection| {
            diesel::insert_into(conversation_states::table)
                .values(&row)
                .on_conflict(conversation_states::conversation_key)
                .do_update()
                .set(&row)
                .execute(connection)
                .map_err(ConversationStateError::persistence)?;
            Ok(())
        })
        .await
    }

    async fn clear(&self, key: ConversationKey) -> ConversationStateResult<bool> {
        self.run_blocking(move |connection| {
            let removed = diesel::delete(
                conversation_states::table
                    .filter(conversation_states::conversation_key.eq(key.value())),
            )
            .execute(connection)
            .map_err(ConversationStateError::persistence)?;
            Ok(removed > 0)
        })
        .await
    }
}
