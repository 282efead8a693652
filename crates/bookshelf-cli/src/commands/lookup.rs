use bookshelf_core::models::BookDetails;

use crate::commands::common::{parse_isbn, App};
use crate::error::CliError;

pub async fn run_lookup(isbn: &str, as_json: bool, app: &App) -> Result<(), CliError> {
    let isbn = parse_isbn(isbn)?;
    let details = app
        .catalog()
        .lookup_isbn(&isbn)
        .await?
        .ok_or_else(|| CliError::IsbnNotFound(isbn.clone()))?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&details)?);
    } else {
        for line in format_book_details(&details) {
            println!("{line}");
        }
    }
    Ok(())
}

pub fn format_book_details(book: &BookDetails) -> Vec<String> {
    let pages = book.pages.map(|pages| pages.to_string());
    [
        ("Title", book.title.as_deref()),
        ("Author", book.author.as_deref()),
        ("ISBN", book.isbn.as_deref()),
        ("Publisher", book.publisher.as_deref()),
        ("Edition", book.edition.as_deref()),
        ("Year", book.publication_year.as_deref()),
        ("Language", book.language.as_deref()),
        ("Pages", pages.as_deref()),
        ("Cover", book.cover_url.as_deref()),
        ("Synopsis", book.synopsis.as_deref()),
    ]
    .into_iter()
    .filter_map(|(label, value)| value.map(|value| format!("{label:<10} {value}")))
    .collect()
}
