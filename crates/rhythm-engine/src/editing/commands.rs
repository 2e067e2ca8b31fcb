use std::ops::Range;

use xi_rope::delta::Builder;
use xi_rope::{Delta, Rope, RopeInfo};

use crate::editing::Document;

/// Commands that can be applied to the document
///
/// Offsets are byte offsets. Out-of-range offsets are clamped to the buffer
/// and pulled back onto a char boundary before compilation.
#[derive(Debug, Clone, PartialEq)]
pub enum Cmd {
    InsertText { at: usize, text: String },
    DeleteRange { range: Range<usize> },
    ReplaceRange { range: Range<usize>, text: String },
}

impl Cmd {
    /// Replace the whole buffer
    pub fn replace_all(doc: &Document, text: impl Into<String>) -> Self {
        Cmd::ReplaceRange {
            range: 0..doc.len(),
            text: text.into(),
        }
    }
}

/// Clamp command offsets to the document and to char boundaries
pub(crate) fn normalize_command(doc: &Document, cmd: Cmd) -> Cmd {
    let fix_range = |range: Range<usize>| {
        let start = doc.snap_to_boundary(range.start);
        let end = doc.snap_to_boundary(range.end).max(start);
        start..end
    };

    match cmd {
        Cmd::InsertText { at, text } => Cmd::InsertText {
            at: doc.snap_to_boundary(at),
            text,
        },
        Cmd::DeleteRange { range } => Cmd::DeleteRange {
            range: fix_range(range),
        },
        Cmd::ReplaceRange { range, text } => Cmd::ReplaceRange {
            range: fix_range(range),
            text,
        },
    }
}

/// Compile a command into a delta
pub(crate) fn compile_command(doc: &Document, cmd: &Cmd) -> Delta<RopeInfo> {
    let mut builder = Builder::new(doc.len());
    match cmd {
        Cmd::InsertText { at, text } => {
            let insert_rope = Rope::from(text.as_str());
            builder.replace(*at..*at, insert_rope);
        }
        Cmd::DeleteRange { range } => {
            builder.delete(range.clone());
        }
        Cmd::ReplaceRange { range, text } => {
            let replace_rope = Rope::from(text.as_str());
            builder.replace(range.clone(), replace_rope);
        }
    }
    builder.build()
}

/// Transform the cursor based on the command being applied
pub(crate) fn transform_cursor_for_command(cursor: usize, cmd: &Cmd) -> usize {
    match cmd {
        Cmd::InsertText { at, text } => {
            // Insertion at or before the cursor pushes it right
            if *at <= cursor {
                cursor + text.len()
            } else {
                cursor
            }
        }
        Cmd::DeleteRange { range } => {
            if range.end <= cursor {
                // Deletion is completely before the cursor - shift left
                cursor - range.len()
            } else if range.start >= cursor {
                cursor
            } else {
                // Cursor was inside the deleted text
                range.start
            }
        }
        Cmd::ReplaceRange { range, text } => {
            if range.is_empty() {
                // A pure insertion behaves like InsertText
                if range.start <= cursor {
                    cursor + text.len()
                } else {
                    cursor
                }
            } else if range.end <= cursor {
                // Replacement is before the cursor - shift by net change
                cursor - range.len() + text.len()
            } else if range.start >= cursor {
                cursor
            } else {
                // Cursor was inside the replaced text: land after the new text
                range.start + text.len()
            }
        }
    }
}
