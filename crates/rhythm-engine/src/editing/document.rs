use std::borrow::Cow;
use std::ops::Range;

use xi_rope::{Delta, Rope, RopeInfo};

use crate::editing::{Anchor, AnchorId, Cmd, Patch};

/// Core document structure
///
/// Document is the mutable text buffer the user writes into. It maintains:
///
/// ## 1. Single Source of Truth (xi-rope buffer)
/// - **Lossless storage**: Entire document in one `xi_rope::Rope` buffer
/// - **Efficient edits**: xi-rope provides O(log n) insert/delete operations
///
/// ## 2. Cursor
/// - A single byte offset, always clamped to `[0, len]` and kept on a char boundary
/// - Moved by commands as described on [`Cmd`]
///
/// ## 3. Version
/// - Incremented on every applied command, never decremented
///
/// ## 4. Anchors
/// - Tracked byte ranges that follow the text they cover through later edits
///
/// ```rust
/// # use rhythm_engine::editing::{Document, Cmd};
/// let mut doc = Document::from_bytes(b"Hello").unwrap();
/// doc.set_cursor(5);
///
/// let patch = doc.apply(Cmd::InsertText { at: 5, text: " World".to_string() });
///
/// assert_eq!(doc.text(), "Hello World");
/// assert_eq!(patch.new_cursor, 11);
/// assert_eq!(patch.version, 1);
/// ```
#[derive(Clone)]
pub struct Document {
    /// xi-rope buffer containing entire document as UTF-8 bytes
    pub(crate) buffer: Rope,
    /// Cursor position as a byte offset in buffer
    pub(crate) cursor: usize,
    /// Version counter incremented on each edit (enables change detection)
    pub(crate) version: u64,
    /// Ranges that follow the text through edits
    pub(crate) anchors: Vec<Anchor>,
    /// Source of fresh anchor ids
    pub(crate) next_anchor: u64,
}

impl Document {
    /// Create a new document from raw bytes
    pub fn from_bytes(bytes: &[u8]) -> anyhow::Result<Self> {
        let text = std::str::from_utf8(bytes)?;
        Ok(Self::from_text(text))
    }

    /// Create a new document from text, with the cursor at the end
    pub fn from_text(text: &str) -> Self {
        let buffer = Rope::from(text);
        let len = buffer.len();

        Self {
            buffer,
            cursor: len,
            version: 0,
            anchors: Vec::new(),
            next_anchor: 0,
        }
    }

    /// Apply command to document
    ///
    /// ## Edit Pipeline Steps
    ///
    /// 1. **Command Compilation**: Convert `Cmd` to xi-rope `Delta`
    /// 2. **Buffer Application**: Apply Delta to the rope
    /// 3. **Anchor Transformation**: Move anchor ranges through the Delta
    /// 4. **Cursor Update**: Move the cursor as the command dictates
    /// 5. **Version Increment**: Update document version for change detection
    pub fn apply(&mut self, cmd: Cmd) -> Patch {
        let cmd = crate::editing::commands::normalize_command(self, cmd);
        let delta = self.compile_command(&cmd);

        // Track changed ranges for the patch
        let mut changed = Vec::new();
        let mut cursor = 0;
        for op in delta.els.iter() {
            match op {
                xi_rope::delta::DeltaElement::Copy(from, to) => {
                    cursor += to - from;
                }
                xi_rope::delta::DeltaElement::Insert(inserted) => {
                    let start = cursor;
                    let end = cursor + inserted.len();
                    changed.push(start..end);
                    cursor = end;
                }
            }
        }

        self.buffer = delta.apply(&self.buffer);
        self.transform_anchors(&delta);

        let new_cursor = crate::editing::commands::transform_cursor_for_command(self.cursor, &cmd);
        self.cursor = self.snap_to_boundary(new_cursor);

        self.version += 1;

        Patch {
            changed,
            new_cursor: self.cursor,
            version: self.version,
        }
    }

    /// Get the cursor position
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Set the cursor position, clamped to the buffer and to a char boundary
    pub fn set_cursor(&mut self, cursor: usize) {
        self.cursor = self.snap_to_boundary(cursor);
    }

    /// Get the current version
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Get the current text content
    pub fn text(&self) -> String {
        self.buffer.to_string()
    }

    /// Get the buffer length in bytes
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Slice the buffer, clamping the range to the document
    pub fn slice(&self, range: Range<usize>) -> Cow<'_, str> {
        let doc_len = self.buffer.len();

        // Clamp range to document bounds and char boundaries to prevent xi-rope panic
        let start = self.snap_to_boundary(range.start.min(doc_len));
        let end = self.snap_to_boundary(range.end.min(doc_len)).max(start);

        self.buffer.slice_to_cow(start..end)
    }

    /// Get reference to anchors for testing
    pub fn anchors(&self) -> &[Anchor] {
        &self.anchors
    }

    /// Start tracking a range; the returned id follows that text through edits
    pub fn track(&mut self, range: Range<usize>) -> AnchorId {
        crate::editing::anchors::track(self, range)
    }

    /// Current range of a tracked anchor
    pub fn anchor_range(&self, id: AnchorId) -> Option<Range<usize>> {
        self.anchors
            .iter()
            .find(|anchor| anchor.id == id)
            .map(|anchor| anchor.range.clone())
    }

    /// Stop tracking an anchor
    pub fn release(&mut self, id: AnchorId) {
        self.anchors.retain(|anchor| anchor.id != id);
    }

    pub(crate) fn compile_command(&self, cmd: &Cmd) -> Delta<RopeInfo> {
        crate::editing::commands::compile_command(self, cmd)
    }

    pub(crate) fn transform_anchors(&mut self, delta: &Delta<RopeInfo>) {
        crate::editing::anchors::transform_anchors(self, delta)
    }

    /// Clamp to the buffer, then walk back to the nearest char boundary
    pub(crate) fn snap_to_boundary(&self, offset: usize) -> usize {
        let len = self.buffer.len();
        if offset >= len {
            return len;
        }
        if offset == 0 {
            return 0;
        }
        self.buffer
            .at_or_prev_codepoint_boundary(offset)
            .unwrap_or(0)
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("text", &self.buffer.to_string())
            .field("cursor", &self.cursor)
            .field("version", &self.version)
            .field("anchors", &self.anchors)
            .finish()
    }
}
