//! Table of contents extraction

use serde::{Deserialize, Serialize};

use super::blocks::Block;

/// A heading shown in the table of contents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadingEntry {
    /// Anchor id, identical to the heading block's id
    pub id: String,
    pub text: String,
    /// 2 or 3
    pub level: u8,
}

/// Collect the level 2 and 3 headings of a parsed document, in order
pub fn extract_headings(blocks: &[Block]) -> Vec<HeadingEntry> {
    blocks
        .iter()
        .filter_map(|block| match block {
            Block::Heading { level: level @ (2 | 3), text, id } => {
                Some(HeadingEntry { id: id.clone(), text: text.clone(), level: *level })
            }
            _ => None,
        })
        .collect()
}

/// Index of the last entry whose anchor line is at or above `line`.
///
/// `line_of` maps an entry to its rendered line, if it was rendered.
pub fn active_heading(
    entries: &[HeadingEntry],
    line: usize,
    line_of: impl Fn(&HeadingEntry) -> Option<usize>,
) -> Option<usize> {
    entries
        .iter()
        .enumerate()
        .filter_map(|(i, entry)| line_of(entry).map(|l| (i, l)))
        .take_while(|(_, l)| *l <= line)
        .last()
        .map(|(i, _)| i)
}
