//! Handbook - a terminal documentation portal
//!
//! Handbook reads a bundle of Markdown guides described by a `handbook.json`
//! manifest and presents them with a section sidebar, full-text search, a
//! table of contents and a documentation assistant powered by Claude.

pub mod app;
pub mod assistant;
pub mod config;
pub mod docs;
pub mod syntax;
pub mod theme;
pub mod ui;

pub use app::App;
pub use config::Config;
pub use theme::Theme;
