/*!
 * # Editing Core Module
 *
 * The document buffer that every other part of the engine reads from and
 * splices into.
 *
 * ## Architecture Overview
 *
 * ### 1. Single Source of Truth: xi-rope Buffer
 * - The entire document is stored in a single **`xi_rope::Rope`** buffer
 * - All offsets exposed by this module are **byte offsets** into that buffer
 *
 * ### 2. Command-Based Editing
 * - All edits are represented as **Commands** (`Cmd` enum) that compile to **Deltas**
 * - Every applied command bumps the document **version**, so callers holding a
 *   version number can tell cheaply whether anything changed since they looked
 *
 * ### 3. Anchors
 * - **Anchors** track a byte range through later edits
 * - Anchor ranges are transformed through each Delta using xi-rope's `Transformer`
 * - The feedback coordinator anchors the paragraph it sent for analysis, so an
 *   AI rewrite lands where that paragraph is *now*, not where it used to be
 *
 * ## Usage Pattern
 *
 * ```rust
 * use rhythm_engine::editing::*;
 *
 * let mut doc = Document::from_bytes(b"Hello\n\nWorld").unwrap();
 * let anchor = doc.track(7..12);
 *
 * doc.apply(Cmd::InsertText { at: 0, text: "Oh. ".to_string() });
 *
 * assert_eq!(doc.anchor_range(anchor), Some(11..16));
 * assert_eq!(doc.slice(11..16), "World");
 * ```
 */

pub mod anchors;
pub mod commands;
pub mod document;
pub mod patch;

pub use anchors::{Anchor, AnchorId};
pub use commands::Cmd;
pub use document::Document;
pub use patch::Patch;
