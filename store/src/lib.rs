//! Versioned in-memory document collections.
//!
//! Each [`Collection`] stores clones of plain-data documents keyed by a
//! string id, stamps every stored document with a revision [`Version`], and
//! exposes one write discipline: read a snapshot, mutate the clone, commit
//! conditionally on the version still matching. [`Collection::update`] wraps
//! that loop with bounded retry so callers write transactions as closures.
//!
//! There is no atomicity across documents or collections. Multi-document
//! flows must be ordered so that every partial state is recoverable by
//! re-running the step that was interrupted.

pub mod collection;

pub use collection::{Collection, MAX_TXN_ATTEMPTS};

use std::fmt;

/// A value that can live in a [`Collection`].
///
/// Documents are cloned in and out of the store on every read and write, so
/// they stay plain data. The id is the collection key and must not change
/// over the document's lifetime.
pub trait Document: Clone + Send + Sync + 'static {
    fn id(&self) -> &str;
}

// ---------------------------------------------------------------------------
// Versions
// ---------------------------------------------------------------------------

/// Per-document revision counter. A write lands only when the writer proves
/// it read the revision currently stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version(u64);

impl Version {
    pub const FIRST: Version = Version(1);

    pub fn next(self) -> Version {
        Version(self.0 + 1)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Change feed
// ---------------------------------------------------------------------------

/// Broadcast after every successful mutation. Delivery is best effort: a
/// slow subscriber can lag and drop events, so consumers treat the feed as
/// an invalidation signal and re-read the collection for truth.
#[derive(Debug, Clone)]
pub enum Event<T> {
    Created(T),
    Updated(T),
    Deleted(String),
}

// ---------------------------------------------------------------------------
// Transactions
// ---------------------------------------------------------------------------

/// Outcome requested by an [`Collection::update`] closure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Txn {
    /// Write the mutated snapshot back, bumping the version.
    Commit,
    /// Leave the stored document untouched. The no-op arm for idempotent
    /// replays.
    Skip,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertError {
    DuplicateId(String),
}

impl fmt::Display for InsertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InsertError::DuplicateId(id) => write!(f, "duplicate document id: {id}"),
        }
    }
}

impl std::error::Error for InsertError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitError {
    /// The document was deleted between read and commit.
    NotFound,
    /// Another writer committed first.
    VersionConflict,
}

impl fmt::Display for CommitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommitError::NotFound => write!(f, "document does not exist"),
            CommitError::VersionConflict => write!(f, "stored version changed since read"),
        }
    }
}

impl std::error::Error for CommitError {}

/// Why an [`Collection::update`] transaction did not commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxnError<E> {
    /// No document under the requested id.
    NotFound,
    /// Every attempt lost the version race.
    Contention { attempts: u32 },
    /// The closure rejected the transaction. Nothing was written.
    Aborted(E),
}

impl<E: fmt::Display> fmt::Display for TxnError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TxnError::NotFound => write!(f, "document does not exist"),
            TxnError::Contention { attempts } => {
                write!(f, "transaction gave up after {attempts} contended attempts")
            }
            TxnError::Aborted(e) => write!(f, "{e}"),
        }
    }
}

impl<E: fmt::Debug + fmt::Display> std::error::Error for TxnError<E> {}
