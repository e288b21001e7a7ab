//! # Parse Cursor & Packrat Memoization
//!
//! A [`Cursor`] is an immutable window `[start, end)` over a shared character
//! buffer. Consuming input never mutates a cursor; [`Cursor::splice`] returns a
//! new one over the same buffer. All cursors derived from one parse share a
//! single [`MemoTable`], keyed by the window and a [`ConsumerId`], which lets
//! recursive and shared sub-grammars run in polynomial time.
//!
//! ## Memoization protocol
//!
//! 1. [`Cursor::recall`] before matching: a stored failure is re-raised, a
//!    stored node is handed back for re-application.
//! 2. [`Cursor::remember`] / [`Cursor::remember_failure`] after matching.
//! 3. A second store for the same key that disagrees with the first is an
//!    [`ParseError::Inconsistent`] error, never a recoverable failure.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::error::ParseError;
use crate::node::Node;

/// Identity of a memoizing consumer.
///
/// Two structurally identical consumers built separately get distinct ids and
/// memoize independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConsumerId(u32);

impl ConsumerId {
    pub fn fresh() -> Self {
        static NEXT_ID: AtomicU32 = AtomicU32::new(1);
        Self(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ConsumerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Window start, window end and consumer.
type MemoKey = (usize, usize, ConsumerId);

#[derive(Debug, Clone)]
pub enum MemoEntry {
    Matched(Rc<Node>),
    Failed(ParseError),
}

/// Packrat memo table of one parse.
#[derive(Debug, Default)]
pub struct MemoTable {
    entries: HashMap<MemoKey, MemoEntry>,
    hits: usize,
}

impl MemoTable {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: HashMap::with_capacity(capacity),
            hits: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of lookups answered from the table.
    pub fn hits(&self) -> usize {
        self.hits
    }
}

#[derive(Clone)]
pub struct Cursor {
    buffer: Rc<[char]>,
    start: usize,
    end: usize,
    memo: Rc<RefCell<MemoTable>>,
}

impl Cursor {
    /// A cursor over the whole of `text` with a fresh memo table.
    pub fn new(text: &str) -> Self {
        Self::with_capacity(text, 0)
    }

    pub fn with_capacity(text: &str, memo_capacity: usize) -> Self {
        let buffer: Rc<[char]> = text.chars().collect();
        let end = buffer.len();
        Self {
            buffer,
            start: 0,
            end,
            memo: Rc::new(RefCell::new(MemoTable::with_capacity(memo_capacity))),
        }
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    /// Number of characters left in the window.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Character at `index` relative to the window start.
    pub fn char_at(&self, index: usize) -> Option<char> {
        if index >= self.len() {
            return None;
        }
        Some(self.buffer[self.start + index])
    }

    /// A cursor starting at the absolute offset `start`, keeping the window end.
    pub fn splice(&self, start: usize) -> Cursor {
        self.splice_range(start, self.end)
    }

    /// A cursor over the absolute window `[start, end)`.
    ///
    /// Memo entries are kept per window, so a narrowed window never replays
    /// a result computed with more input in view.
    pub fn splice_range(&self, start: usize, end: usize) -> Cursor {
        debug_assert!(start <= end && end <= self.buffer.len());
        Cursor {
            buffer: Rc::clone(&self.buffer),
            start,
            end,
            memo: Rc::clone(&self.memo),
        }
    }

    /// The first `len` characters of the window.
    pub fn text(&self, len: usize) -> String {
        self.slice(self.start, self.start + len)
    }

    /// Characters at the absolute offsets `[from, to)`.
    pub fn slice(&self, from: usize, to: usize) -> String {
        self.buffer[from..to].iter().collect()
    }

    /// Up to `max` characters of the remaining window.
    pub fn preview(&self, max: usize) -> String {
        self.text(self.len().min(max))
    }

    fn key(&self, id: ConsumerId) -> MemoKey {
        (self.start, self.end, id)
    }

    pub fn recall(&self, id: ConsumerId) -> Result<Option<Rc<Node>>, ParseError> {
        let mut memo = self.memo.borrow_mut();
        let entry = memo.entries.get(&self.key(id)).cloned();
        match entry {
            Some(MemoEntry::Matched(node)) => {
                memo.hits += 1;
                tracing::trace!(target: "jamon::memo", position = self.start, consumer = %id, "memo hit");
                Ok(Some(node))
            }
            Some(MemoEntry::Failed(error)) => {
                memo.hits += 1;
                tracing::trace!(target: "jamon::memo", position = self.start, consumer = %id, "memo hit (failure)");
                Err(error)
            }
            None => Ok(None),
        }
    }

    /// Stores the node `id` produced at this offset, returning the stored node.
    pub fn remember(&self, id: ConsumerId, node: Rc<Node>) -> Result<Rc<Node>, ParseError> {
        let mut memo = self.memo.borrow_mut();
        let key = self.key(id);
        match memo.entries.get(&key) {
            Some(MemoEntry::Matched(old)) if **old == *node => Ok(Rc::clone(old)),
            Some(_) => Err(ParseError::inconsistent(
                format!("consumer {} yielded different results on different rounds", id),
                self.start,
            )),
            None => {
                tracing::trace!(target: "jamon::memo", position = self.start, consumer = %id, "memo store");
                memo.entries.insert(key, MemoEntry::Matched(Rc::clone(&node)));
                Ok(node)
            }
        }
    }

    /// Stores a recoverable failure of `id` at this offset.
    pub fn remember_failure(&self, id: ConsumerId, error: &ParseError) -> Result<(), ParseError> {
        let mut memo = self.memo.borrow_mut();
        let key = self.key(id);
        if let Some(MemoEntry::Matched(_)) = memo.entries.get(&key) {
            return Err(ParseError::inconsistent(
                format!("consumer {} yielded different results on different rounds", id),
                self.start,
            ));
        }
        memo.entries.insert(key, MemoEntry::Failed(error.clone()));
        Ok(())
    }

    pub fn memo_len(&self) -> usize {
        self.memo.borrow().len()
    }

    pub fn memo_hits(&self) -> usize {
        self.memo.borrow().hits()
    }
}

impl fmt::Debug for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cursor")
            .field("start", &self.start)
            .field("end", &self.end)
            .field("preview", &self.preview(16))
            .finish()
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.preview(16))
    }
}
