//! Unified-diff parsing and line correlation between file versions

pub mod correlate;
pub mod parse;

pub use correlate::same_line;
pub use parse::{parse, ParseError};

/// One contiguous changed region in a unified diff.
///
/// `old_lines`/`new_lines` may be 0: a zero-length hunk is a pure
/// insertion or deletion anchored at the corresponding position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hunk {
    pub old_pos: u32,
    pub old_lines: u32,
    pub new_pos: u32,
    pub new_lines: u32,
}

/// One file's entry in a patch. An empty `old_name` means the file was
/// added; an empty `new_name` means it was deleted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffFile {
    pub old_name: String,
    pub new_name: String,
    pub hunks: Vec<Hunk>,
}

/// A parsed diff: files in the order they appear in the text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Patch {
    pub files: Vec<DiffFile>,
}

impl Patch {
    /// All hunks across every file, in file order.
    pub fn all_hunks(&self) -> Vec<Hunk> {
        self.files.iter().flat_map(|f| f.hunks.clone()).collect()
    }
}
