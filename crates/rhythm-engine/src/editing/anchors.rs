use std::ops::Range;

use xi_rope::delta::Transformer;
use xi_rope::{Delta, RopeInfo};

use crate::editing::Document;

/// A text range that follows its content through edits
#[derive(Clone, Debug, PartialEq)]
pub struct Anchor {
    pub id: AnchorId,
    pub range: Range<usize>, // byte range in the rope
}

/// Unique identifier for an anchor
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct AnchorId(pub u64);

/// Register a new anchor over `range` (clamped to the document)
pub(crate) fn track(doc: &mut Document, range: Range<usize>) -> AnchorId {
    let id = AnchorId(doc.next_anchor);
    doc.next_anchor += 1;

    let start = doc.snap_to_boundary(range.start);
    let end = doc.snap_to_boundary(range.end).max(start);
    doc.anchors.push(Anchor {
        id,
        range: start..end,
    });
    id
}

/// Transform anchors through a delta operation
///
/// Unlike block anchors, a collapsed anchor is kept: whoever tracks it decides
/// what an empty range means (usually "the text I cared about is gone").
pub(crate) fn transform_anchors(doc: &mut Document, delta: &Delta<RopeInfo>) {
    let mut transformer = Transformer::new(delta);
    let doc_len = doc.len();

    for anchor in &mut doc.anchors {
        // For the start: use after=true so insertions at the exact start move the anchor forward
        // For the end: use after=false so insertions at the exact end don't expand the anchor
        let new_start = transformer.transform(anchor.range.start, true);
        let new_end = transformer.transform(anchor.range.end, false);

        let clamped_start = new_start.min(doc_len);
        let clamped_end = new_end.min(doc_len).max(clamped_start);
        anchor.range = clamped_start..clamped_end;
    }
}
