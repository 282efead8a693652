use bookshelf_core::services::CatalogResult;
use bookshelf_core::CatalogEntry;

use crate::commands::common::{parse_local_id, print_notices, App};
use crate::error::CliError;

pub async fn run_purchase(id: &str, app: &App) -> Result<(), CliError> {
    let local_id = parse_local_id(id)?;
    let engine = app.engine();
    let mut notices = engine.notices();

    let result = engine.purchase(local_id).await;
    print_notices(&mut notices);
    let book = result?;

    // The server already owns the book; a cache miss only needs a refresh
    let cached = app.catalog().record_purchase(&book).await;
    if let Err(error) = &cached {
        tracing::warn!("Purchased book was not cached locally: {}", error);
    }

    let (line, hint) = purchase_output(&book, &cached);
    if let Some(hint) = hint {
        eprintln!("{hint}");
    }
    println!("{line}");
    Ok(())
}

/// Line printed for a purchased book, plus a hint when the local library
/// copy could not be updated.
pub fn purchase_output(book: &CatalogEntry, cached: &CatalogResult<i64>) -> (String, Option<String>) {
    let line = match book.remote_id {
        Some(id) => id.to_string(),
        None => book.book.title.as_deref().unwrap_or("purchased").to_string(),
    };
    let hint = cached.as_ref().err().map(|_| {
        "Purchased, but the local library was not updated; run `bookshelf books --refresh`"
            .to_string()
    });
    (line, hint)
}
