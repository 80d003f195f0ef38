//! Source location tracking for AST nodes and diagnostics.
//!
//! The core never reads raw source text (see crate docs), so a `Span` is
//! nothing more than an opaque byte range carried along from whatever parser
//! produced the AST, for a downstream renderer to pair with source text.

use serde::{Deserialize, Serialize};

/// A span of source code, represented as a byte range `[start, end)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    pub const fn new(start: u32, end: u32) -> Self {
        Span { start, end }
    }

    pub const fn at(pos: u32) -> Self {
        Span {
            start: pos,
            end: pos,
        }
    }
}
