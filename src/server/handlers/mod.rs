//! HTTP request handlers for the web server.

mod api;
mod content;
mod search;

pub use api::health;
pub use content::serve_content;
pub use search::{compare, search};
