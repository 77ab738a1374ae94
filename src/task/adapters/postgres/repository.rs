//! `PostgreSQL` repository implementation for task storage.

use super::{
    models::{TaskRecord, TaskRow},
    schema::{chat_counters, tasks},
};
use crate::task::{
    domain::{
        ChatId, Comment, PersistedTaskData, Rating, StatusFilter, Task, TaskId, TaskNumber,
        TaskStatus,
    },
    ports::{TaskRepository, TaskRepositoryError, TaskRepositoryResult},
};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::debug;

/// `PostgreSQL` connection pool type used by task adapters.
pub type TaskPgPool = Pool<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed task repository.
///
/// Counter increments are single upsert statements. Task writes run in a
/// transaction that locks the row, compares revisions and writes once.
#[derive(Debug, Clone)]
pub struct PostgresTaskRepository {
    pool: TaskPgPool,
}

impl PostgresTaskRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: TaskPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> TaskRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> TaskRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(TaskRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(TaskRepositoryError::persistence)?
    }
}

impl From<DieselError> for TaskRepositoryError {
    fn from(err: DieselError) -> Self {
        Self::persistence(err)
    }
}

#[async_trait]
impl TaskRepository for PostgresTaskRepository {
    async fn next_task_number(&self, chat_id: ChatId) -> TaskRepositoryResult<TaskNumber> {
        self.run_blocking(move |connection| {
            let count = diesel::insert_into(chat_counters::table)
                .values((
                    chat_counters::chat_id.eq(chat_id.value()),
                    chat_counters::count.eq(1_i64),
                ))
                .on_conflict(chat_counters::chat_id)
                .do_update()
                .set(chat_counters::count.eq(chat_counters::count + 1_i64))
                .returning(chat_counters::count)
                .get_result::<i64>(connection)?;

            let value = u64::try_from(count).map_err(TaskRepositoryError::persistence)?;
            TaskNumber::new(value).map_err(TaskRepositoryError::persistence)
        })
        .await
    }

    async fn put(&self, task: &Task) -> TaskRepositoryResult<Task> {
        let task_id = task.id();
        let expected_revision =
            i64::try_from(task.revision()).map_err(TaskRepositoryError::persistence)?;
        let mut record = to_record(task)?;

        self.run_blocking(move |connection| {
            connection.transaction::<_, TaskRepositoryError, _>(|tx| {
                let stored_revision = tasks::table
                    .filter(tasks::id.eq(task_id.into_inner()))
                    .select(tasks::revision)
                    .for_update()
                    .first::<i64>(tx)
                    .optional()?;

                match stored_revision {
                    None if expected_revision == 0 => {
                        record.revision = 1;
                        diesel::insert_into(tasks::table)
                            .values(&record)
                            .execute(tx)
                            .map_err(|err| match err {
                                DieselError::DatabaseError(
                                    DatabaseErrorKind::UniqueViolation,
                                    _,
                                ) => TaskRepositoryError::Conflict(task_id),
                                _ => TaskRepositoryError::persistence(err),
                            })?;
                    }
                    None => return Err(TaskRepositoryError::NotFound(task_id)),
                    Some(current) if current == expected_revision => {
                        record.revision = current.saturating_add(1);
                        diesel::update(tasks::table.filter(tasks::id.eq(task_id.into_inner())))
                            .set(&record)
                            .execute(tx)?;
                    }
                    Some(_) => return Err(TaskRepositoryError::Conflict(task_id)),
                }

                let row = tasks::table
                    .filter(tasks::id.eq(task_id.into_inner()))
                    .select(TaskRow::as_select())
                    .first::<TaskRow>(tx)?;
                row_to_task(row)
            })
        })
        .await
    }

    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>> {
        self.run_blocking(move |connection| {
            let row = tasks::table
                .filter(tasks::id.eq(id.into_inner()))
                .select(TaskRow::as_select())
                .first::<TaskRow>(connection)
                .optional()?;
            row.map(row_to_task).transpose()
        })
        .await
    }

    async fn list(&self, chat_id: ChatId, filter: StatusFilter) -> TaskRepositoryResult<Vec<Task>> {
        self.run_blocking(move |connection| {
            let mut query = tasks::table
                .filter(tasks::chat_id.eq(chat_id.value()))
                .select(TaskRow::as_select())
                .into_boxed();
            if let Some(statuses) = filter.storage_values() {
                query = query.filter(tasks::status.eq_any(statuses));
            }

            let rows = query.load::<TaskRow>(connection)?;
            rows.into_iter().map(row_to_task).collect()
        })
        .await
    }

    async fn delete(&self, id: TaskId) -> TaskRepositoryResult<bool> {
        self.run_blocking(move |connection| {
            let removed = diesel::delete(tasks::table.filter(tasks::id.eq(id.into_inner())))
                .execute(connection)?;
            Ok(removed > 0)
        })
        .await
    }

    async fn delete_unchanged(
        &self,
        id: TaskId,
        expected_revision: u64,
    ) -> TaskRepositoryResult<bool> {
        let expected = i64::try_from(expected_revision).map_err(TaskRepositoryError::persistence)?;

        self.run_blocking(move |connection| {
            connection.transaction::<_, TaskRepositoryError, _>(|tx| {
                let removed = diesel::delete(
                    tasks::table
                        .filter(tasks::id.eq(id.into_inner()))
                        .filter(tasks::revision.eq(expected)),
                )
                .execute(tx)?;
                if removed > 0 {
                    return Ok(true);
                }

                let still_stored = diesel::select(diesel::dsl::exists(
                    tasks::table.filter(tasks::id.eq(id.into_inner())),
                ))
                .get_result::<bool>(tx)?;
                if still_stored {
                    return Err(TaskRepositoryError::Conflict(id));
                }
                Ok(false)
            })
        })
        .await
    }

    async fn append_comment(&self, id: TaskId, comment: &Comment) -> TaskRepositoryResult<bool> {
        let entry = serde_json::to_value(vec![comment]).map_err(TaskRepositoryError::persistence)?;

        self.run_blocking(move |connection| {
            let updated = diesel::sql_query(concat!(
                "UPDATE tasks SET comments = comments || $2, revision = revision + 1 ",
                "WHERE id = $1",
            ))
            .bind::<diesel::sql_types::Uuid, _>(id.into_inner())
            .bind::<diesel::sql_types::Jsonb, _>(entry)
            .execute(connection)?;
            debug!(task_id = %id, appended = updated > 0, "comment append");
            Ok(updated > 0)
        })
        .await
    }
}

fn to_record(task: &Task) -> TaskRepositoryResult<TaskRecord> {
    let comments =
        serde_json::to_value(task.comments()).map_err(TaskRepositoryError::persistence)?;

    Ok(TaskRecord {
        id: task.id().into_inner(),
        chat_id: task.chat_id().value(),
        task_number: i64::try_from(task.task_number().value())
            .map_err(TaskRepositoryError::persistence)?,
        text: task.text().to_owned(),
        created_by: task.created_by().to_owned(),
        status: task.status().as_str().to_owned(),
        assigned_to: task.assigned_to().map(str::to_owned),
        deadline: task.deadline(),
        created_at: task.created_at(),
        in_progress_at: task.in_progress_at(),
        completed_at: task.completed_at(),
        accumulated_time_seconds: i64::try_from(task.accumulated_time_seconds())
            .map_err(TaskRepositoryError::persistence)?,
        rating: task.rating().map(|rating| i16::from(rating.value())),
        comments,
        revision: i64::try_from(task.revision()).map_err(TaskRepositoryError::persistence)?,
    })
}

fn row_to_task(row: TaskRow) -> TaskRepositoryResult<Task> {
    let TaskRow {
        id,
        chat_id,
        task_number: persisted_number,
        text,
        created_by,
        status: persisted_status,
        assigned_to,
        deadline,
        created_at,
        in_progress_at,
        completed_at,
        accumulated_time_seconds,
        rating: persisted_rating,
        comments: persisted_comments,
        revision,
    } = row;

    let task_number = u64::try_from(persisted_number)
        .map_err(TaskRepositoryError::persistence)
        .and_then(|value| TaskNumber::new(value).map_err(TaskRepositoryError::persistence))?;
    let status = TaskStatus::try_from(persisted_status.as_str())
        .map_err(TaskRepositoryError::persistence)?;
    let rating = persisted_rating
        .map(|stars| {
            u8::try_from(stars)
                .map_err(TaskRepositoryError::persistence)
                .and_then(|value| Rating::new(value).map_err(TaskRepositoryError::persistence))
        })
        .transpose()?;
    let comments = serde_json::from_value::<Vec<Comment>>(persisted_comments)
        .map_err(TaskRepositoryError::persistence)?;

    let data = PersistedTaskData {
        id: TaskId::from_uuid(id),
        chat_id: ChatId::new(chat_id),
        task_number,
        text,
        created_by,
        status,
        assigned_to,
        deadline,
        created_at,
        in_progress_at,
        completed_at,
        accumulated_time_seconds: u64::try_from(accumulated_time_seconds)
            .map_err(TaskRepositoryError::persistence)?,
        rating,
        comments,
        revision: u64::try_from(revision).map_err(TaskRepositoryError::persistence)?,
    };
    Ok(Task::from_persisted(data))
}
