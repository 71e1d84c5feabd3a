//! When steps for board move BDD scenarios.

use super::world::{BoardMoveWorld, run_async};
use planboard::board::services::PersistMode;
use rstest_bdd_macros::when;

#[when(r#"task "{title}" is dragged to "{column}" at position {index:usize}"#)]
fn drag_task(
    world: &mut BoardMoveWorld,
    title: String,
    column: String,
    index: usize,
) -> Result<(), eyre::Report> {
    let intent = world.intent(&title, &column, index)?;
    let result = run_async(world.coordinator()?.apply_move(intent, PersistMode::Persist));
    world.last_result = Some(result);
    Ok(())
}

#[when(r#"the link "{url}" is supplied for "{title}""#)]
fn supply_link(world: &mut BoardMoveWorld, url: String, title: String) -> Result<(), eyre::Report> {
    let task_id = world.stored_task(&title)?.id();
    let result = run_async(world.coordinator()?.resume_move_with_pr_url(task_id, &url));
    world.last_result = Some(result);
    Ok(())
}

#[when(r#"the held move for "{title}" is cancelled"#)]
fn cancel_move(world: &mut BoardMoveWorld, title: String) -> Result<(), eyre::Report> {
    let task_id = world.stored_task(&title)?.id();
    let result = world.coordinator()?.cancel_pending_move(task_id);
    world.last_result = Some(result);
    Ok(())
}
