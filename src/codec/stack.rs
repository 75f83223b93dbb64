//! Depth-checked frame stack

use crate::error::{Error, Result};

/// Fixed-capacity stack of frames.
///
/// Storage is reserved up front so pushing never reallocates; a push past
/// the limit is [`Error::DepthExceeded`].
#[derive(Debug)]
pub struct RecursionStack<F> {
    frames: Vec<F>,
    limit: usize,
}

impl<F> RecursionStack<F> {
    /// Create an empty stack holding at most `limit` frames.
    #[must_use]
    pub fn new(limit: usize) -> Self {
        Self {
            frames: Vec::with_capacity(limit),
            limit,
        }
    }

    /// Push a frame.
    pub fn push(&mut self, frame: F) -> Result<()> {
        if self.frames.len() >= self.limit {
            return Err(Error::DepthExceeded { limit: self.limit });
        }
        self.frames.push(frame);
        Ok(())
    }

    /// Pop the top frame.
    pub fn pop(&mut self) -> Option<F> {
        self.frames.pop()
    }

    /// Top frame
    #[must_use]
    pub fn top(&self) -> Option<&F> {
        self.frames.last()
    }

    /// Mutable top frame
    pub fn top_mut(&mut self) -> Option<&mut F> {
        self.frames.last_mut()
    }

    /// Number of frames on the stack
    #[must_use]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Whether no frames are open
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Configured capacity
    #[must_use]
    pub const fn limit(&self) -> usize {
        self.limit
    }

    /// Drop all frames, keeping the reserved storage.
    pub fn clear(&mut self) {
        self.frames.clear();
    }
}
