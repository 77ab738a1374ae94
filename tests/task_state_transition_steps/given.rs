//! Given steps for task state transition BDD scenarios.

use super::world::{TaskTransitionWorld, run_async};
use eyre::WrapErr;
use rstest_bdd_macros::given;
use taskmate::task::{domain::ChatId, services::CreateTaskRequest};

#[given(r#"a new task "{text}" in chat {chat:i64}"#)]
fn new_task(world: &mut TaskTransitionWorld, text: String, chat: i64) -> Result<(), eyre::Report> {
    let created = run_async(world.service.create(CreateTaskRequest::new(
        ChatId::new(chat),
        text,
        "@bob",
    )))
    .wrap_err("create task for transition scenario")?;
    world.task = Some(created);
    Ok(())
}

#[given(r#"the task has been moved to "{status}""#)]
fn task_has_been_moved(world: &mut TaskTransitionWorld, status: String) -> Result<(), eyre::Report> {
    let task_id = world.task()?.id();
    let moved = run_async(world.service.transition_named(task_id, &status, None))
        .wrap_err("transition task in scenario setup")?;
    world.task = Some(moved);
    Ok(())
}

#[given("the task is rated {stars:u8}")]
fn task_is_rated(world: &mut TaskTransitionWorld, stars: u8) -> Result<(), eyre::Report> {
    let task_id = world.task()?.id();
    let rated = run_async(world.service.rate(task_id, stars)).wrap_err("rate task")?;
    world.task = Some(rated);
    Ok(())
}
