use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{RwLock, broadcast};

use crate::{CommitError, Document, Event, InsertError, Txn, TxnError, Version};

/// How many times [`Collection::update`] replays its closure before giving
/// up with [`TxnError::Contention`].
pub const MAX_TXN_ATTEMPTS: u32 = 5;

const EVENT_CAPACITY: usize = 512;

#[derive(Debug)]
struct Versioned<T> {
    doc: T,
    version: Version,
}

/// One keyed document collection with optimistic concurrency.
///
/// Handles are cheap to clone and share the same underlying map. Reads hand
/// out clones; the store never leaks references to its interior.
pub struct Collection<T: Document> {
    docs: Arc<RwLock<HashMap<String, Versioned<T>>>>,
    events: broadcast::Sender<Event<T>>,
}

impl<T: Document> Clone for Collection<T> {
    fn clone(&self) -> Self {
        Self {
            docs: Arc::clone(&self.docs),
            events: self.events.clone(),
        }
    }
}

impl<T: Document> Default for Collection<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Document> Collection<T> {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            docs: Arc::new(RwLock::new(HashMap::new())),
            events,
        }
    }

    /// Store a brand-new document under its id.
    pub async fn insert(&self, doc: T) -> Result<Version, InsertError> {
        let mut docs = self.docs.write().await;
        if docs.contains_key(doc.id()) {
            return Err(InsertError::DuplicateId(doc.id().to_owned()));
        }
        docs.insert(
            doc.id().to_owned(),
            Versioned {
                doc: doc.clone(),
                version: Version::FIRST,
            },
        );
        drop(docs);
        let _ = self.events.send(Event::Created(doc));
        Ok(Version::FIRST)
    }

    /// Store the document unless the id is already taken, reporting whether
    /// this call created it. The dedupe primitive for derived documents
    /// that several racing writers may try to materialize.
    pub async fn insert_if_absent(&self, doc: T) -> bool {
        let mut docs = self.docs.write().await;
        if docs.contains_key(doc.id()) {
            return false;
        }
        docs.insert(
            doc.id().to_owned(),
            Versioned {
                doc: doc.clone(),
                version: Version::FIRST,
            },
        );
        drop(docs);
        let _ = self.events.send(Event::Created(doc));
        true
    }

    pub async fn get(&self, id: &str) -> Option<T> {
        self.docs.read().await.get(id).map(|v| v.doc.clone())
    }

    /// Snapshot plus the version to hand back to [`Collection::try_commit`].
    pub async fn get_versioned(&self, id: &str) -> Option<(T, Version)> {
        self.docs
            .read()
            .await
            .get(id)
            .map(|v| (v.doc.clone(), v.version))
    }

    /// Conditional write: lands only if the stored version still equals
    /// `expected`.
    pub async fn try_commit(&self, expected: Version, doc: T) -> Result<Version, CommitError> {
        let mut docs = self.docs.write().await;
        let entry = docs.get_mut(doc.id()).ok_or(CommitError::NotFound)?;
        if entry.version != expected {
            return Err(CommitError::VersionConflict);
        }
        entry.version = entry.version.next();
        entry.doc = doc.clone();
        let version = entry.version;
        drop(docs);
        let _ = self.events.send(Event::Updated(doc));
        Ok(version)
    }

    /// Optimistic read-modify-write with bounded retry.
    ///
    /// The closure runs against a snapshot clone and decides the outcome:
    /// [`Txn::Commit`] writes the clone back conditionally, [`Txn::Skip`]
    /// leaves the store untouched, and an `Err` aborts without writing. A
    /// lost version race replays the closure against a fresh snapshot, up
    /// to [`MAX_TXN_ATTEMPTS`] times. Returns the document as the closure
    /// last saw it.
    pub async fn update<E, F>(&self, id: &str, mut apply: F) -> Result<T, TxnError<E>>
    where
        F: FnMut(&mut T) -> Result<Txn, E>,
    {
        for _ in 0..MAX_TXN_ATTEMPTS {
            let Some((mut doc, version)) = self.get_versioned(id).await else {
                return Err(TxnError::NotFound);
            };
            match apply(&mut doc) {
                Ok(Txn::Commit) => match self.try_commit(version, doc.clone()).await {
                    Ok(_) => return Ok(doc),
                    Err(CommitError::VersionConflict) => continue,
                    Err(CommitError::NotFound) => return Err(TxnError::NotFound),
                },
                Ok(Txn::Skip) => return Ok(doc),
                Err(e) => return Err(TxnError::Aborted(e)),
            }
        }
        Err(TxnError::Contention {
            attempts: MAX_TXN_ATTEMPTS,
        })
    }

    pub async fn delete(&self, id: &str) -> bool {
        let removed = self.docs.write().await.remove(id).is_some();
        if removed {
            let _ = self.events.send(Event::Deleted(id.to_owned()));
        }
        removed
    }

    /// Delete only while the stored document still satisfies the predicate,
    /// returning what was removed. None when the id is unknown or the
    /// predicate said no.
    pub async fn delete_if(&self, id: &str, pred: impl FnOnce(&T) -> bool) -> Option<T> {
        let mut docs = self.docs.write().await;
        let entry = docs.get(id)?;
        if !pred(&entry.doc) {
            return None;
        }
        let removed = docs.remove(id)?;
        drop(docs);
        let _ = self.events.send(Event::Deleted(id.to_owned()));
        Some(removed.doc)
    }

    /// Clone of every document, in no particular order.
    pub async fn all(&self) -> Vec<T> {
        self.docs.read().await.values().map(|v| v.doc.clone()).collect()
    }

    /// Clones of the documents matching the predicate, in no particular
    /// order.
    pub async fn filter(&self, pred: impl Fn(&T) -> bool) -> Vec<T> {
        self.docs
            .read()
            .await
            .values()
            .filter(|v| pred(&v.doc))
            .map(|v| v.doc.clone())
            .collect()
    }

    /// Some document matching the predicate, if any. Arbitrary choice when
    /// several match.
    pub async fn find(&self, pred: impl Fn(&T) -> bool) -> Option<T> {
        self.docs
            .read()
            .await
            .values()
            .find(|v| pred(&v.doc))
            .map(|v| v.doc.clone())
    }

    pub async fn len(&self) -> usize {
        self.docs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.docs.read().await.is_empty()
    }

    /// Subscribe to the change feed. Events sent before this call are not
    /// replayed.
    pub fn watch(&self) -> broadcast::Receiver<Event<T>> {
        self.events.subscribe()
    }
}
