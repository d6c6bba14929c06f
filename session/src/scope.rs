//! Layered key lookup.
//!
//! A repeated block renders the same vertex once per item, with a few keys
//! (the item, its index) overridden per repetition. Each repetition pushes a
//! frame; lookup walks frames innermost first and falls through to the
//! vertex's own properties.

use pagegraph_core::{Props, Value, Vertex};

/// A stack of plain key-value frames.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScopeChain {
    frames: Vec<Props>,
}

impl ScopeChain {
    /// Create a chain with no frames.
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a new innermost frame.
    pub fn push(&mut self, frame: Props) {
        self.frames.push(frame);
    }

    /// Pop the innermost frame.
    pub fn pop(&mut self) -> Option<Props> {
        self.frames.pop()
    }

    /// Set a key in the innermost frame, opening one if the chain is empty.
    pub fn define(&mut self, key: impl Into<String>, value: Value) {
        if self.frames.is_empty() {
            self.frames.push(Props::new());
        }
        if let Some(frame) = self.frames.last_mut() {
            frame.insert(key.into(), value);
        }
    }

    /// Look a key up, searching from innermost to outermost frame.
    pub fn lookup(&self, key: &str) -> Option<&Value> {
        self.frames.iter().rev().find_map(|frame| frame.get(key))
    }

    /// Look a key up in the frames, then in the vertex's properties.
    pub fn resolve_prop<'a>(&'a self, vertex: &'a Vertex, key: &str) -> Option<&'a Value> {
        self.lookup(key).or_else(|| vertex.get_prop(key))
    }

    /// Number of frames.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }
}
