use std::path::PathBuf;
use std::sync::Arc;

use bookshelf_core::models::{validate_isbn, CatalogEntry, LocalId, WishlistEntry};
use bookshelf_core::remote::HttpRemote;
use bookshelf_core::{CatalogService, ClientConfig, DatabaseService, Notice, SyncEngine};
use chrono::Utc;
use serde::Serialize;
use tokio::sync::broadcast;

use crate::error::CliError;

/// Everything a command needs: the local cache and a client for the server.
pub struct App {
    pub config: ClientConfig,
    pub db: DatabaseService,
    remote: Arc<HttpRemote>,
}

impl App {
    pub async fn open(config: ClientConfig) -> Result<Self, CliError> {
        let db_path = match config.db_path.clone() {
            Some(path) => path,
            None => default_db_path()?,
        };
        let db = DatabaseService::open_path(db_path).await?;
        let remote = Arc::new(HttpRemote::new(
            config.api_base_url.clone(),
            config.request_timeout,
        )?);
        tracing::debug!("Using backend at {}", remote.base_url());

        Ok(Self { config, db, remote })
    }

    pub fn engine(&self) -> SyncEngine {
        SyncEngine::new(
            self.db.wishlist_store(),
            self.db.catalog_store(),
            self.remote.clone(),
        )
    }

    pub fn catalog(&self) -> CatalogService {
        CatalogService::new(self.db.catalog_store(), self.remote.clone())
    }
}

pub fn load_config(
    api_url: Option<&str>,
    cli_db_path: Option<PathBuf>,
) -> Result<ClientConfig, CliError> {
    Ok(ClientConfig::from_env()?.with_overrides(api_url, cli_db_path)?)
}

pub fn default_db_path() -> Result<PathBuf, CliError> {
    dirs::data_dir()
        .map(|dir| dir.join("bookshelf").join("bookshelf.db"))
        .ok_or(CliError::NoDataDir)
}

#[derive(Debug, Serialize)]
pub struct WishlistListItem {
    pub id: i64,
    pub remote_id: Option<i64>,
    pub title: Option<String>,
    pub author: Option<String>,
    pub isbn: Option<String>,
    pub notes: Option<String>,
    pub desired_price: Option<f64>,
    pub pending_sync: bool,
    pub deleted: bool,
    pub created_at: i64,
    pub updated_at: i64,
    pub relative_time: String,
}

#[derive(Debug, Serialize)]
pub struct BookListItem {
    pub id: Option<i64>,
    pub title: Option<String>,
    pub author: Option<String>,
    pub isbn: Option<String>,
    pub location: Option<String>,
    pub read: bool,
    pub rating: Option<i32>,
}

pub fn wishlist_to_list_item(entry: &WishlistEntry) -> WishlistListItem {
    let now_ms = Utc::now().timestamp_millis();
    let book = &entry.item.book;
    WishlistListItem {
        id: entry.local_id.map_or(0, LocalId::get),
        remote_id: entry.remote_id,
        title: book.title.clone(),
        author: book.author.clone(),
        isbn: book.isbn.clone(),
        notes: entry.item.notes.clone(),
        desired_price: entry.item.desired_price,
        pending_sync: entry.pending_sync,
        deleted: entry.deleted,
        created_at: entry.created_at,
        updated_at: entry.updated_at,
        relative_time: format_relative_time(entry.updated_at, now_ms),
    }
}

pub fn book_to_list_item(entry: &CatalogEntry) -> BookListItem {
    BookListItem {
        id: entry.remote_id,
        title: entry.book.title.clone(),
        author: entry.book.author.clone(),
        isbn: entry.book.isbn.clone(),
        location: entry.location.clone(),
        read: entry.read,
        rating: entry.rating,
    }
}

pub fn format_wishlist_lines(entries: &[WishlistEntry]) -> Vec<String> {
    let now_ms = Utc::now().timestamp_millis();
    entries
        .iter()
        .map(|entry| {
            let id = entry.local_id.map_or(0, LocalId::get);
            let title = truncate(&entry.display_title(), 40);
            let author = truncate(entry.item.book.author.as_deref().unwrap_or("-"), 24);
            let status = if entry.pending_sync { "pending" } else { "synced" };
            let relative_time = format_relative_time(entry.updated_at, now_ms);

            format!("{id:>5}  {title:<40}  {author:<24}  {status:<7}  {relative_time}")
        })
        .collect()
}

pub fn format_book_lines(entries: &[CatalogEntry]) -> Vec<String> {
    entries
        .iter()
        .map(|entry| {
            let title = truncate(entry.book.title.as_deref().unwrap_or("untitled"), 40);
            let author = truncate(entry.book.author.as_deref().unwrap_or("-"), 24);
            let isbn = entry.normalized_isbn().unwrap_or_default();
            let read = if entry.read { "read" } else { "" };

            format!("{title:<40}  {author:<24}  {isbn:<13}  {read}")
        })
        .collect()
}

pub fn truncate(text: &str, max_chars: usize) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed.chars().count() <= max_chars {
        collapsed
    } else {
        let take_len = max_chars.saturating_sub(3);
        let mut truncated = collapsed.chars().take(take_len).collect::<String>();
        truncated.push_str("...");
        truncated
    }
}

pub fn format_sync_timestamp(timestamp_ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(timestamp_ms).map_or_else(
        || timestamp_ms.to_string(),
        |date_time| date_time.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    )
}

pub fn format_relative_time(timestamp_ms: i64, now_ms: i64) -> String {
    let diff = now_ms.saturating_sub(timestamp_ms);
    let minute = 60_000;
    let hour = 60 * minute;
    let day = 24 * hour;
    let week = 7 * day;
    let month = 30 * day;
    let year = 365 * day;

    if diff < minute {
        "just now".to_string()
    } else if diff < hour {
        format!("{}m ago", diff / minute)
    } else if diff < day {
        format!("{}h ago", diff / hour)
    } else if diff < week {
        format!("{}d ago", diff / day)
    } else if diff < month {
        format!("{}w ago", diff / week)
    } else if diff < year {
        format!("{}mo ago", diff / month)
    } else {
        format!("{}y ago", diff / year)
    }
}

pub fn parse_local_id(id: &str) -> Result<LocalId, CliError> {
    id.parse::<LocalId>()
        .ok()
        .filter(|local_id| local_id.get() > 0)
        .ok_or_else(|| CliError::InvalidLocalId(id.trim().to_string()))
}

pub fn parse_isbn(isbn: &str) -> Result<String, CliError> {
    validate_isbn(isbn).map_err(|source| CliError::InvalidIsbn {
        input: isbn.trim().to_string(),
        source,
    })
}

/// Print notices the engine emitted since `notices` was subscribed.
pub fn print_notices(notices: &mut broadcast::Receiver<Notice>) {
    while let Ok(notice) = notices.try_recv() {
        eprintln!("{notice}");
    }
}
