use crate::commands::common::{parse_local_id, print_notices, App};
use crate::error::CliError;

pub async fn run_delete(id: &str, app: &App) -> Result<(), CliError> {
    let local_id = parse_local_id(id)?;
    let engine = app.engine();
    let mut notices = engine.notices();

    let result = engine.delete(local_id).await;
    print_notices(&mut notices);
    result?;

    println!("{local_id}");
    Ok(())
}
