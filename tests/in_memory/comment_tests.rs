//! Comment appends racing each other and racing lifecycle updates.

use crate::in_memory::helpers::{Harness, SHOPPING_CHAT, harness};
use eyre::ensure;
use rstest::rstest;
use taskmate::task::{
    domain::{Comment, TaskStatus},
    services::{CreateTaskRequest, TransitionTaskRequest},
};
use tokio::task::JoinSet;

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_comments_are_all_kept(harness: Harness) -> eyre::Result<()> {
    let task = harness
        .service
        .create(CreateTaskRequest::new(SHOPPING_CHAT, "Buy milk", "@bob"))
        .await?;

    let mut handles = JoinSet::new();
    for author in ["@erin", "@frank"] {
        let service = harness.service.clone();
        let task_id = task.id();
        handles.spawn(async move { service.add_comment(task_id, "me too", author).await });
    }
    while let Some(joined) = handles.join_next().await {
        joined??;
    }

    let stored = harness.service.get(task.id()).await?;
    let mut authors: Vec<&str> = stored.comments().iter().map(Comment::author).collect();
    authors.sort_unstable();
    ensure!(authors == vec!["@erin", "@frank"]);
    ensure!(stored.revision() == 3);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn comments_survive_a_concurrent_transition(harness: Harness) -> eyre::Result<()> {
    let task = harness
        .service
        .create(CreateTaskRequest::new(SHOPPING_CHAT, "Buy milk", "@bob"))
        .await?;

    let commenter = {
        let service = harness.service.clone();
        let task_id = task.id();
        tokio::spawn(async move { service.add_comment(task_id, "on it", "@erin").await })
    };
    let taker = {
        let service = harness.service.clone();
        let request = TransitionTaskRequest::new(task.id(), TaskStatus::InProgress);
        tokio::spawn(async move { service.transition(request).await })
    };
    commenter.await??;
    taker.await??;

    let stored = harness.service.get(task.id()).await?;
    ensure!(stored.status() == TaskStatus::InProgress);
    ensure!(stored.comments().len() == 1);
    Ok(())
}
