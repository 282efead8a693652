pub mod add;
pub mod books;
pub mod common;
pub mod completions;
pub mod delete;
pub mod list;
pub mod lookup;
pub mod pending;
pub mod purchase;
pub mod sync;
