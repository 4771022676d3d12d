//! Utility modules for shelfmirror

pub mod text;
pub mod urls;

pub use text::{strip_html, truncate};
pub use urls::{ensure_json_url, split_instance, to_absolute_url, unwrap_first_link};
