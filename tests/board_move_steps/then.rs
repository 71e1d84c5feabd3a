//! Then steps for board move BDD scenarios.

use super::world::{BoardMoveWorld, run_async, title_list};
use eyre::WrapErr;
use planboard::board::{
    domain::{MissingInput, Task},
    ports::TaskStore,
    services::{MoveError, MoveOutcome},
};
use rstest_bdd_macros::then;

fn last_result(world: &BoardMoveWorld) -> Result<&Result<MoveOutcome, MoveError>, eyre::Report> {
    world
        .last_result
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing move result"))
}

#[then("the move is committed")]
fn move_is_committed(world: &BoardMoveWorld) -> Result<(), eyre::Report> {
    let result = last_result(world)?;
    if !matches!(result, Ok(MoveOutcome::Committed(_))) {
        return Err(eyre::eyre!("expected a committed move, got {result:?}"));
    }
    Ok(())
}

#[then("the move waits for a pull request link")]
fn move_waits_for_link(world: &BoardMoveWorld) -> Result<(), eyre::Report> {
    let result = last_result(world)?;
    if !matches!(
        result,
        Ok(MoveOutcome::AwaitingInput {
            missing: MissingInput::PrUrl,
            ..
        })
    ) {
        return Err(eyre::eyre!("expected a held move, got {result:?}"));
    }
    Ok(())
}

#[then("the move fails with an invalid link error")]
fn move_fails_with_invalid_link(world: &BoardMoveWorld) -> Result<(), eyre::Report> {
    let result = last_result(world)?;
    if !matches!(result, Err(MoveError::InvalidPrUrl { .. })) {
        return Err(eyre::eyre!("expected InvalidPrUrl error, got {result:?}"));
    }
    Ok(())
}

#[then("the move is rolled back")]
fn move_is_rolled_back(world: &BoardMoveWorld) -> Result<(), eyre::Report> {
    let result = last_result(world)?;
    if !matches!(result, Ok(MoveOutcome::RolledBack)) {
        return Err(eyre::eyre!("expected a rolled back move, got {result:?}"));
    }
    Ok(())
}

#[then(r#"the board shows "{titles}" in "{column}""#)]
fn board_shows(
    world: &mut BoardMoveWorld,
    titles: String,
    column: String,
) -> Result<(), eyre::Report> {
    let column_id = world.column(&column)?.id();
    let shown: Vec<String> = world
        .coordinator()?
        .column_tasks(column_id)
        .iter()
        .map(|task| task.title().to_owned())
        .collect();
    let expected = title_list(&titles);
    if shown != expected {
        return Err(eyre::eyre!("board shows {shown:?} in {column}, expected {expected:?}"));
    }
    Ok(())
}

#[then(r#"the store lists "{titles}" in "{column}""#)]
fn store_lists(world: &BoardMoveWorld, titles: String, column: String) -> Result<(), eyre::Report> {
    let column_id = world.column(&column)?.id();
    let stored = run_async(world.store.list_by_column(column_id)).wrap_err("list stored column")?;
    let listed: Vec<String> = stored.iter().map(|task| task.title().to_owned()).collect();
    let expected = title_list(&titles);
    if listed != expected {
        return Err(eyre::eyre!("store lists {listed:?} in {column}, expected {expected:?}"));
    }
    let orders: Vec<u32> = stored.iter().map(Task::order).collect();
    if !orders.iter().copied().eq(0..u32::try_from(orders.len()).wrap_err("column length")?) {
        return Err(eyre::eyre!("stored ranks in {column} are not contiguous: {orders:?}"));
    }
    Ok(())
}
