//! Given steps for board move BDD scenarios.

use super::world::{BoardMoveWorld, run_async, title_list};
use eyre::WrapErr;
use mockable::DefaultClock;
use planboard::board::{
    domain::{Column, Task},
    ports::TaskStore,
    services::PersistMode,
};
use rstest_bdd_macros::given;

#[given(r#"a board with the columns "{names}""#)]
fn board_with_columns(world: &mut BoardMoveWorld, names: String) -> Result<(), eyre::Report> {
    for (position, name) in title_list(&names).into_iter().enumerate() {
        let order = u32::try_from(position).wrap_err("column position")?;
        let column = Column::new(world.board_id, name.as_str(), order, &DefaultClock)
            .wrap_err("create scenario column")?;
        world.columns.insert(name, column);
    }
    Ok(())
}

#[given(r#"the "{name}" column requires a pull request"#)]
fn column_requires_pull_request(
    world: &mut BoardMoveWorld,
    name: String,
) -> Result<(), eyre::Report> {
    let column = world
        .columns
        .remove(&name)
        .ok_or_else(|| eyre::eyre!("unknown column {name} in scenario"))?;
    world.columns.insert(name, column.requiring_pr());
    Ok(())
}

#[given(r#"the "{name}" column holds "{titles}""#)]
fn column_holds(
    world: &mut BoardMoveWorld,
    name: String,
    titles: String,
) -> Result<(), eyre::Report> {
    let column_id = world.column(&name)?.id();
    for (position, title) in title_list(&titles).into_iter().enumerate() {
        let order = u32::try_from(position).wrap_err("task position")?;
        let task = Task::new(world.board_id, column_id, order, title, &DefaultClock)
            .wrap_err("create scenario task")?;
        run_async(world.store.insert(&task)).wrap_err("store scenario task")?;
    }
    Ok(())
}

#[given(r#"task "{title}" is dragged to "{column}" at position {index:usize}"#)]
fn task_was_dragged(
    world: &mut BoardMoveWorld,
    title: String,
    column: String,
    index: usize,
) -> Result<(), eyre::Report> {
    let intent = world.intent(&title, &column, index)?;
    let outcome = run_async(world.coordinator()?.apply_move(intent, PersistMode::Persist))
        .wrap_err("apply scenario setup move")?;
    world.last_result = Some(Ok(outcome));
    Ok(())
}
