use std::fmt;

use docstore::TxnError;

pub type Result<T> = std::result::Result<T, Error>;

/// Caller-visible failure taxonomy. The variant is the contract; message
/// text is for humans and logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The referenced entity does not exist.
    NotFound(String),
    /// The entity exists but its current state forbids the operation.
    Conflict(String),
    /// The caller is not the party this operation is reserved for.
    Unauthorized(String),
    /// The input itself is malformed or out of range.
    Validation(String),
}

impl Error {
    /// Collapse a store transaction failure into the caller taxonomy.
    /// Exhausted retries surface as [`Error::Conflict`]: the entity exists,
    /// the writes just kept losing the version race.
    pub(crate) fn from_txn(kind: &str, id: &str, err: TxnError<Error>) -> Error {
        match err {
            TxnError::NotFound => Error::NotFound(format!("{kind} {id}")),
            TxnError::Contention { attempts } => {
                Error::Conflict(format!("{kind} {id}: write contended {attempts} times, retry"))
            }
            TxnError::Aborted(e) => e,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::NotFound(msg) => write!(f, "not found: {msg}"),
            Error::Conflict(msg) => write!(f, "conflict: {msg}"),
            Error::Unauthorized(msg) => write!(f, "unauthorized: {msg}"),
            Error::Validation(msg) => write!(f, "invalid request: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn txn_failures_map_onto_the_taxonomy() {
        let e = Error::from_txn("challenge", "c1", TxnError::NotFound);
        assert_eq!(e, Error::NotFound("challenge c1".into()));

        let e = Error::from_txn("challenge", "c1", TxnError::Contention { attempts: 5 });
        assert!(matches!(e, Error::Conflict(_)));

        let inner = Error::Unauthorized("not your match".into());
        let e = Error::from_txn("match", "m1", TxnError::Aborted(inner.clone()));
        assert_eq!(e, inner);
    }
}
