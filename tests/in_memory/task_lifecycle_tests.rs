//! End-to-end lifecycle tests against the in-memory repository.

use crate::in_memory::helpers::{Harness, SHOPPING_CHAT, alice, harness};
use eyre::ensure;
use mockable::Clock;
use rstest::rstest;
use taskmate::task::{
    domain::{Rating, StatusFilter, TaskStatus},
    ports::TaskRepository,
    services::{CreateTaskRequest, FailureKind, TransitionTaskRequest},
};

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn take_then_complete_books_elapsed_time(harness: Harness) -> eyre::Result<()> {
    let start = harness.clock.utc();
    let task = harness
        .service
        .create(CreateTaskRequest::new(SHOPPING_CHAT, "Buy milk", "@bob"))
        .await?;
    ensure!(task.status() == TaskStatus::New);
    ensure!(task.task_number().value() == 1);
    ensure!(task.accumulated_time_seconds() == 0);

    let taken = harness
        .service
        .transition(
            TransitionTaskRequest::new(task.id(), TaskStatus::InProgress).with_actor(alice()),
        )
        .await?;
    ensure!(taken.assigned_to() == Some("Alice (@alice)"));
    ensure!(taken.in_progress_at() == Some(start));

    harness.clock.advance(3_600);
    let done = harness
        .service
        .transition(TransitionTaskRequest::new(task.id(), TaskStatus::Done).with_actor(alice()))
        .await?;

    ensure!(done.status() == TaskStatus::Done);
    ensure!(done.completed_at() == Some(harness.clock.utc()));
    ensure!(done.accumulated_time_seconds() == 3_600);
    ensure!(done.in_progress_at().is_none());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn reopening_clears_rating_and_keeps_booked_time(harness: Harness) -> eyre::Result<()> {
    let task = harness
        .service
        .create(CreateTaskRequest::new(SHOPPING_CHAT, "Paint fence", "@bob"))
        .await?;
    let take = || TransitionTaskRequest::new(task.id(), TaskStatus::InProgress).with_actor(alice());
    let finish = || TransitionTaskRequest::new(task.id(), TaskStatus::Done);

    harness.service.transition(take()).await?;
    harness.clock.advance(3_600);
    harness.service.transition(finish()).await?;
    let rated = harness.service.rate(task.id(), 5).await?;
    ensure!(rated.rating().map(Rating::value) == Some(5));

    let reopened = harness.service.transition(take()).await?;
    ensure!(reopened.rating().is_none());
    ensure!(reopened.completed_at().is_none());
    ensure!(reopened.in_progress_at() == Some(harness.clock.utc()));
    ensure!(reopened.accumulated_time_seconds() == 3_600);

    harness.clock.advance(1_800);
    let done_again = harness.service.transition(finish()).await?;
    ensure!(done_again.accumulated_time_seconds() == 5_400);
    ensure!(done_again.rating().is_none());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn ratings_are_bounded_and_need_a_done_task(harness: Harness) -> eyre::Result<()> {
    let task = harness
        .service
        .create(CreateTaskRequest::new(SHOPPING_CHAT, "Water plants", "@bob"))
        .await?;

    let out_of_range = harness.service.rate(task.id(), 6).await;
    let wrong_status = harness.service.rate(task.id(), 3).await;

    ensure!(out_of_range.map_err(|err| err.kind()).err() == Some(FailureKind::InvalidInput));
    ensure!(
        wrong_status.map_err(|err| err.kind()).err() == Some(FailureKind::InvalidTransition)
    );
    ensure!(harness.service.get(task.id()).await?.rating().is_none());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn open_filter_and_statistics_reflect_the_chat(harness: Harness) -> eyre::Result<()> {
    let mut ids = Vec::new();
    for text in ["one", "two", "three"] {
        let task = harness
            .service
            .create(CreateTaskRequest::new(SHOPPING_CHAT, text, "@bob"))
            .await?;
        ids.push(task.id());
    }
    let [first, second, third] = ids.as_slice() else {
        eyre::bail!("expected three tasks");
    };
    harness
        .service
        .transition(TransitionTaskRequest::new(*second, TaskStatus::InProgress))
        .await?;
    harness.clock.advance(600);
    harness
        .service
        .transition(TransitionTaskRequest::new(*second, TaskStatus::Done))
        .await?;
    harness
        .service
        .transition(TransitionTaskRequest::new(*third, TaskStatus::Archived))
        .await?;

    let open = harness.service.list(SHOPPING_CHAT, StatusFilter::Open).await?;
    let open_ids: Vec<_> = open.iter().map(|task| task.id()).collect();
    ensure!(open_ids == vec![*first]);

    let stats = harness.service.statistics(SHOPPING_CHAT).await?;
    ensure!(stats.total() == 3);
    ensure!(stats.count(TaskStatus::Done) == 1);
    ensure!(stats.count(TaskStatus::Archived) == 1);
    ensure!(stats.tracked_seconds() == 600);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn deleted_tasks_do_not_release_their_number(harness: Harness) -> eyre::Result<()> {
    let first = harness
        .service
        .create(CreateTaskRequest::new(SHOPPING_CHAT, "first", "@bob"))
        .await?;
    ensure!(harness.service.delete(first.id()).await?);

    let second = harness
        .service
        .create(CreateTaskRequest::new(SHOPPING_CHAT, "second", "@bob"))
        .await?;

    ensure!(second.task_number().value() == 2);
    ensure!(harness.repository.find_by_id(first.id()).await?.is_none());
    Ok(())
}
