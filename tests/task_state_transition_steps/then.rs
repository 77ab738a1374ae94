//! Then steps for task state transition BDD scenarios.

use super::world::{TaskTransitionWorld, run_async};
use rstest_bdd_macros::then;
use taskmate::task::{
    domain::{TaskDomainError, TaskStatus},
    services::TaskLifecycleError,
};

#[then(r#"the task status is "{status}""#)]
fn task_status_is(world: &TaskTransitionWorld, status: String) -> Result<(), eyre::Report> {
    let expected = TaskStatus::try_from(status.as_str())
        .map_err(|err| eyre::eyre!("invalid expected status in scenario: {err}"))?;
    let stored = run_async(world.service.get(world.task()?.id()))?;

    eyre::ensure!(
        stored.status() == expected,
        "expected status {}, found {}",
        expected.as_str(),
        stored.status().as_str()
    );
    Ok(())
}

#[then(r#"the task is assigned to "{assignee}""#)]
fn task_is_assigned_to(world: &TaskTransitionWorld, assignee: String) -> Result<(), eyre::Report> {
    let task = world.task()?;
    eyre::ensure!(
        task.assigned_to() == Some(assignee.as_str()),
        "expected assignee {assignee}, found {:?}",
        task.assigned_to()
    );
    Ok(())
}

#[then("the task has {seconds:u64} seconds of tracked time")]
fn task_has_tracked_time(world: &TaskTransitionWorld, seconds: u64) -> Result<(), eyre::Report> {
    let tracked = world.task()?.accumulated_time_seconds();
    eyre::ensure!(
        tracked == seconds,
        "expected {seconds}s tracked, found {tracked}s"
    );
    Ok(())
}

#[then("the task has no rating")]
fn task_has_no_rating(world: &TaskTransitionWorld) -> Result<(), eyre::Report> {
    let rating = world.task()?.rating();
    eyre::ensure!(rating.is_none(), "expected no rating, found {rating:?}");
    Ok(())
}

#[then("the transition fails with an invalid transition error")]
fn transition_fails_with_invalid_transition(
    world: &TaskTransitionWorld,
) -> Result<(), eyre::Report> {
    let result = world
        .last_transition_result
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing transition result"))?;

    eyre::ensure!(
        matches!(
            result,
            Err(TaskLifecycleError::Domain(
                TaskDomainError::InvalidStateTransition { .. }
            ))
        ),
        "expected InvalidStateTransition error, got {result:?}"
    );
    Ok(())
}

#[then("the transition fails with an invalid status error")]
fn transition_fails_with_invalid_status(world: &TaskTransitionWorld) -> Result<(), eyre::Report> {
    let result = world
        .last_transition_result
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing transition result"))?;

    eyre::ensure!(
        matches!(result, Err(TaskLifecycleError::InvalidState(_))),
        "expected InvalidState error, got {result:?}"
    );
    Ok(())
}
