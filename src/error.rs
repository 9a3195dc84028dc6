use thiserror::Error;

/// Errors surfaced by the B-tree engine. The core never prints; every
/// variant carries enough context for a caller (the CLI shell, or a
/// test) to render a useful message.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Underlying filesystem failure, surfaced as-is. `path` is
    /// `None` when the error arrives via the blanket `?`-powered
    /// `#[from]` conversion and no call site had a path to attach.
    #[error("I/O error on '{}': {source}", path.as_deref().unwrap_or("<unknown>"))]
    Io {
        path: Option<String>,
        #[from]
        #[source]
        source: std::io::Error,
    },

    /// The first 8 bytes of an opened file did not match the magic tag.
    #[error("bad magic in '{path}': expected {expected:?}, found {found:?}")]
    BadMagic {
        path: String,
        expected: [u8; 8],
        found: [u8; 8],
    },

    /// A block failed to decode: short read, or the encoded block_id
    /// did not match the id that was requested.
    #[error("corrupt block {block_id}: {reason}")]
    CorruptBlock { block_id: u64, reason: String },

    /// Insert of a key that already exists.
    #[error("key {0} already exists")]
    DuplicateKey(u64),

    /// Search for a key that is not present in the tree.
    #[error("key {0} not found")]
    NotFound(u64),

    /// A bulk-load field was negative or not a bare unsigned decimal.
    #[error("invalid argument in field '{field}': {reason}")]
    InvalidArgument { field: String, reason: String },
}

impl EngineError {
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        EngineError::Io {
            path: Some(path.into()),
            source,
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_message_includes_path_and_source() {
        let source = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err = EngineError::io("index.db", source);
        let message = err.to_string();
        assert!(message.contains("index.db"));
        assert!(message.contains("no such file"));
    }

    #[test]
    fn duplicate_key_message_names_the_key() {
        let err = EngineError::DuplicateKey(42);
        assert_eq!(err.to_string(), "key 42 already exists");
    }

    #[test]
    fn not_found_message_names_the_key() {
        let err = EngineError::NotFound(7);
        assert_eq!(err.to_string(), "key 7 not found");
    }

    #[test]
    fn bad_magic_message_shows_both_tags() {
        let err = EngineError::BadMagic {
            path: "index.db".to_string(),
            expected: *b"4337PRJ3",
            found: *b"GARBAGE!",
        };
        let message = err.to_string();
        assert!(message.contains("index.db"));
    }

    #[test]
    fn io_error_converts_via_from_with_no_path() {
        let source = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: EngineError = source.into();
        assert!(matches!(err, EngineError::Io { path: None, .. }));
        assert!(err.to_string().contains("<unknown>"));
    }
}
