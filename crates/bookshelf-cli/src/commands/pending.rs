use bookshelf_core::db::WishlistStore;

use crate::commands::common::{
    format_sync_timestamp, format_wishlist_lines, wishlist_to_list_item, App, WishlistListItem,
};
use crate::error::CliError;

pub async fn run_pending(as_json: bool, app: &App) -> Result<(), CliError> {
    let store = app.db.wishlist_store();
    let (deletions, changes): (Vec<_>, Vec<_>) = store
        .get_pending_sync()
        .await?
        .into_iter()
        .partition(|row| row.deleted);

    if as_json {
        let json_items = changes
            .iter()
            .chain(&deletions)
            .map(wishlist_to_list_item)
            .collect::<Vec<WishlistListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
        return Ok(());
    }

    match store.load_sync_settings().await?.last_sync_at {
        Some(at) => println!("Last sync: {}", format_sync_timestamp(at)),
        None => println!("Last sync: never"),
    }

    if changes.is_empty() && deletions.is_empty() {
        println!("Nothing pending.");
        return Ok(());
    }

    if !changes.is_empty() {
        println!("Unsynced changes:");
        for line in format_wishlist_lines(&changes) {
            println!("{line}");
        }
    }
    if !deletions.is_empty() {
        println!("Pending deletions:");
        for line in format_wishlist_lines(&deletions) {
            println!("{line}");
        }
    }
    Ok(())
}
