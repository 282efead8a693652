use bookshelf_core::search::CatalogOrder;

use crate::commands::common::{book_to_list_item, format_book_lines, App, BookListItem};
use crate::error::CliError;

pub async fn run_books(
    refresh: bool,
    query: Option<&str>,
    order: CatalogOrder,
    as_json: bool,
    app: &App,
) -> Result<(), CliError> {
    let catalog = app.catalog();
    if refresh {
        match catalog.refresh().await {
            Ok(count) => eprintln!("Refreshed {count} books"),
            Err(error) => eprintln!("Refresh failed, showing cached books: {error}"),
        }
    }

    let books = catalog.list(query.unwrap_or_default(), order).await?;

    if as_json {
        let json_items = books
            .iter()
            .map(book_to_list_item)
            .collect::<Vec<BookListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
        return Ok(());
    }

    if books.is_empty() {
        println!("No books cached. Try `bookshelf books --refresh`.");
        return Ok(());
    }

    for line in format_book_lines(&books) {
        println!("{line}");
    }
    Ok(())
}
