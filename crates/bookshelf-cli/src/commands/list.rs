use bookshelf_core::db::WishlistStore;
use bookshelf_core::search::{filter_wishlist, WishlistOrder};

use crate::commands::common::{format_wishlist_lines, wishlist_to_list_item, App, WishlistListItem};
use crate::error::CliError;

pub fn run_list(
    query: Option<&str>,
    order: WishlistOrder,
    as_json: bool,
    app: &App,
) -> Result<(), CliError> {
    let rows = app.db.wishlist_store().observe_all().borrow().clone();
    let entries = filter_wishlist(&rows, query.unwrap_or_default(), order);

    if as_json {
        let json_items = entries
            .iter()
            .map(wishlist_to_list_item)
            .collect::<Vec<WishlistListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("Wishlist is empty.");
        return Ok(());
    }

    for line in format_wishlist_lines(&entries) {
        println!("{line}");
    }
    Ok(())
}
