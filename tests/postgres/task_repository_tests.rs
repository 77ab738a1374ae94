//! Task repository tests against a live `PostgreSQL` database.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::postgres::helpers::{test_pool, unique_id};
use crate::test_helpers::ManualClock;
use eyre::ensure;
use taskmate::task::{
    adapters::postgres::PostgresTaskRepository,
    domain::{ChatId, Comment, NewTask, ReassignPolicy, StatusFilter, Task, TaskStatus},
    ports::{TaskRepository, TaskRepositoryError},
};
use tokio::task::JoinSet;

async fn stored_task(
    repository: &PostgresTaskRepository,
    chat_id: ChatId,
    clock: &ManualClock,
) -> eyre::Result<Task> {
    let task_number = repository.next_task_number(chat_id).await?;
    let task = Task::new(
        NewTask {
            chat_id,
            task_number,
            text: "Buy milk".to_owned(),
            created_by: "@bob".to_owned(),
            deadline: None,
        },
        clock,
    )?;
    Ok(repository.put(&task).await?)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_counter_increments_are_distinct() -> eyre::Result<()> {
    let Some(pool) = test_pool()? else {
        return Ok(());
    };
    let repository = Arc::new(PostgresTaskRepository::new(pool));
    let chat = ChatId::new(unique_id());

    let mut handles = JoinSet::new();
    for _ in 0..16 {
        let shared = Arc::clone(&repository);
        handles.spawn(async move { shared.next_task_number(chat).await });
    }
    let mut numbers = BTreeSet::new();
    while let Some(joined) = handles.join_next().await {
        numbers.insert(joined??.value());
    }

    ensure!(numbers == (1..=16).collect::<BTreeSet<u64>>());
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn stale_writes_are_rejected() -> eyre::Result<()> {
    let Some(pool) = test_pool()? else {
        return Ok(());
    };
    let repository = PostgresTaskRepository::new(pool);
    let clock = ManualClock::default();
    let stored = stored_task(&repository, ChatId::new(unique_id()), &clock).await?;
    ensure!(stored.revision() == 1);

    let mut winner = stored.clone();
    winner.transition_to(TaskStatus::InProgress, None, ReassignPolicy::Always, &clock)?;
    let written = repository.put(&winner).await?;
    ensure!(written.revision() == 2);

    let mut loser = stored;
    loser.transition_to(TaskStatus::Archived, None, ReassignPolicy::Always, &clock)?;
    let result = repository.put(&loser).await;

    ensure!(matches!(result, Err(TaskRepositoryError::Conflict(id)) if id == loser.id()));
    let reloaded = repository.find_by_id(loser.id()).await?;
    ensure!(reloaded.map(|task| task.status()) == Some(TaskStatus::InProgress));
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn round_trip_preserves_lifecycle_fields() -> eyre::Result<()> {
    let Some(pool) = test_pool()? else {
        return Ok(());
    };
    let repository = PostgresTaskRepository::new(pool);
    let clock = ManualClock::default();
    let chat = ChatId::new(unique_id());
    let mut created = stored_task(&repository, chat, &clock).await?;

    created.transition_to(TaskStatus::InProgress, None, ReassignPolicy::Always, &clock)?;
    let mut started = repository.put(&created).await?;
    clock.advance(90);
    started.transition_to(TaskStatus::Done, None, ReassignPolicy::Always, &clock)?;
    let saved = repository.put(&started).await?;

    let loaded = repository.find_by_id(saved.id()).await?;
    ensure!(loaded.as_ref() == Some(&saved));
    ensure!(saved.accumulated_time_seconds() == 90);

    let open = repository.list(chat, StatusFilter::Open).await?;
    let done = repository.list(chat, StatusFilter::Only(TaskStatus::Done)).await?;
    ensure!(open.is_empty());
    ensure!(done.len() == 1);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_comment_appends_are_kept() -> eyre::Result<()> {
    let Some(pool) = test_pool()? else {
        return Ok(());
    };
    let repository = Arc::new(PostgresTaskRepository::new(pool));
    let clock = ManualClock::default();
    let task = stored_task(&repository, ChatId::new(unique_id()), &clock).await?;

    let mut handles = JoinSet::new();
    for author in ["@erin", "@frank"] {
        let shared = Arc::clone(&repository);
        let comment = Comment::new("me too", author, &clock)?;
        let task_id = task.id();
        handles.spawn(async move { shared.append_comment(task_id, &comment).await });
    }
    while let Some(joined) = handles.join_next().await {
        ensure!(joined??);
    }

    let stored = repository
        .find_by_id(task.id())
        .await?
        .ok_or_else(|| eyre::eyre!("task should exist"))?;
    let mut authors: Vec<&str> = stored.comments().iter().map(Comment::author).collect();
    authors.sort_unstable();
    ensure!(authors == vec!["@erin", "@frank"]);
    ensure!(stored.revision() == 3);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn deleting_twice_reports_absence() -> eyre::Result<()> {
    let Some(pool) = test_pool()? else {
        return Ok(());
    };
    let repository = PostgresTaskRepository::new(pool);
    let clock = ManualClock::default();
    let task = stored_task(&repository, ChatId::new(unique_id()), &clock).await?;

    ensure!(repository.delete(task.id()).await?);
    ensure!(!repository.delete(task.id()).await?);
    let comment = Comment::new("late", "@erin", &clock)?;
    ensure!(!repository.append_comment(task.id(), &comment).await?);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn deleted_task_is_not_written_back() -> eyre::Result<()> {
    let Some(pool) = test_pool()? else {
        return Ok(());
    };
    let repository = PostgresTaskRepository::new(pool);
    let clock = ManualClock::default();
    let mut stale = stored_task(&repository, ChatId::new(unique_id()), &clock).await?;
    ensure!(repository.delete(stale.id()).await?);

    stale.transition_to(TaskStatus::InProgress, None, ReassignPolicy::Always, &clock)?;
    let result = repository.put(&stale).await;

    ensure!(matches!(result, Err(TaskRepositoryError::NotFound(id)) if id == stale.id()));
    ensure!(repository.find_by_id(stale.id()).await?.is_none());
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn delete_unchanged_honours_the_revision() -> eyre::Result<()> {
    let Some(pool) = test_pool()? else {
        return Ok(());
    };
    let repository = PostgresTaskRepository::new(pool);
    let clock = ManualClock::default();
    let task = stored_task(&repository, ChatId::new(unique_id()), &clock).await?;
    let comment = Comment::new("on it", "@erin", &clock)?;
    ensure!(repository.append_comment(task.id(), &comment).await?);

    let stale = repository.delete_unchanged(task.id(), task.revision()).await;
    ensure!(matches!(stale, Err(TaskRepositoryError::Conflict(id)) if id == task.id()));
    ensure!(repository.find_by_id(task.id()).await?.is_some());

    ensure!(repository.delete_unchanged(task.id(), 2).await?);
    ensure!(!repository.delete_unchanged(task.id(), 2).await?);
    Ok(())
}
