// Bounded undo/redo history.
//
// The top of the undo stack is always the current state; undo needs at least
// one older state beneath it. Pushing a new state clears the redo stack. Up
// to `limit` states are kept beneath the current one, so the last `limit`
// edits can always be undone; older entries are evicted.

use std::collections::VecDeque;

/// Default number of undoable steps.
pub const MAX_UNDO_STATES: usize = 50;

/// Buffer contents plus cursor and selection at capture time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub data: Vec<u8>,
    /// Cursor as a nibble index.
    pub cursor: usize,
    /// Selection bounds as nibble indices.
    pub selection: Option<(usize, usize)>,
}

impl Snapshot {
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct History {
    undo: VecDeque<Snapshot>,
    redo: Vec<Snapshot>,
    limit: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(MAX_UNDO_STATES)
    }
}

impl History {
    pub fn new(limit: usize) -> Self {
        Self {
            undo: VecDeque::new(),
            redo: Vec::new(),
            limit: limit.max(1),
        }
    }

    /// Drop everything and seed with `initial`.
    pub fn reset(&mut self, initial: Snapshot) {
        self.undo.clear();
        self.redo.clear();
        self.undo.push_back(initial);
    }

    /// Record a committed edit.
    ///
    /// Returns false (and leaves both stacks alone) when the buffer is
    /// byte-identical to the current top.
    pub fn push(&mut self, snapshot: Snapshot) -> bool {
        if self.undo.back().is_some_and(|top| top.data == snapshot.data) {
            return false;
        }
        self.redo.clear();
        self.undo.push_back(snapshot);
        while self.undo.len() > self.limit + 1 {
            self.undo.pop_front();
        }
        true
    }

    /// Step back. Returns the state to restore.
    pub fn undo(&mut self) -> Option<&Snapshot> {
        if self.undo.len() < 2 {
            return None;
        }
        let current = self.undo.pop_back()?;
        self.redo.push(current);
        self.undo.back()
    }

    /// Step forward again. Returns the state to restore.
    pub fn redo(&mut self) -> Option<&Snapshot> {
        let next = self.redo.pop()?;
        self.undo.push_back(next);
        self.undo.back()
    }

    pub fn can_undo(&self) -> bool {
        self.undo.len() > 1
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// Number of states on the undo stack, current one included. At most
    /// `limit + 1`.
    pub fn len(&self) -> usize {
        self.undo.len()
    }

    pub fn is_empty(&self) -> bool {
        self.undo.is_empty()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
