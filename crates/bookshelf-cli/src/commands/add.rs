use bookshelf_core::models::{BookDetails, WishlistEntry, WishlistItem};

use crate::commands::common::{parse_isbn, print_notices, App};
use crate::error::CliError;

pub struct AddArgs {
    pub title: Option<String>,
    pub author: Option<String>,
    pub isbn: Option<String>,
    pub notes: Option<String>,
    pub price: Option<f64>,
    pub lookup: bool,
}

pub async fn run_add(args: AddArgs, app: &App) -> Result<(), CliError> {
    let mut item = wishlist_item_from_args(&args)?;

    if args.lookup && item.book.isbn.is_some() {
        match app.catalog().enrich(item.book.clone()).await {
            Ok(book) => item.book = book,
            Err(error) => eprintln!("Lookup failed, adding without server details: {error}"),
        }
    }

    let engine = app.engine();
    let mut notices = engine.notices();
    let local_id = if item.book.isbn.is_some() {
        engine.add_from_book(item).await.map(|added| added.local_id)
    } else {
        engine.add_or_update(WishlistEntry::new(item)).await
    };
    print_notices(&mut notices);

    println!("{}", local_id?);
    Ok(())
}

/// Build the wishlist item from the command line, validating the ISBN.
pub fn wishlist_item_from_args(args: &AddArgs) -> Result<WishlistItem, CliError> {
    let isbn = args.isbn.as_deref().map(parse_isbn).transpose()?;
    let title = non_blank(args.title.as_deref());
    if title.is_none() && isbn.is_none() {
        return Err(CliError::EmptyItem);
    }

    Ok(WishlistItem {
        book: BookDetails {
            title,
            author: non_blank(args.author.as_deref()),
            isbn,
            ..BookDetails::default()
        },
        notes: non_blank(args.notes.as_deref()),
        desired_price: args.price,
    })
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
