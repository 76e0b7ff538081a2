//! Documentation engine
//!
//! Everything between the raw Markdown text of a guide and the lines that the
//! terminal paints: the section registry and its lazy loaders, the resolved
//! content cache, search, heading navigation, and the block/inline parsers.

pub mod blocks;
pub mod error;
pub mod inline;
pub mod manifest;
pub mod navigate;
pub mod outline;
pub mod registry;
pub mod search;
pub mod slug;
pub mod store;

pub use blocks::{Block, ListItem, parse_blocks};
pub use error::DocsError;
pub use inline::{apply_highlight, format_inline, format_with_highlight};
pub use navigate::{LinkTarget, find_heading_anchor};
pub use outline::{HeadingEntry, extract_headings};
pub use registry::{LoadedSection, Registry, Section, SectionLoader, SectionSource, SubItem};
pub use search::search;
pub use slug::slugify;
pub use store::{ContentStore, LoadOutcome};
