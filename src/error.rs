/// Repository-wide structured errors for replication runs, useful to
/// represent programmatically instead of ad-hoc formatted strings.
#[derive(Debug, Clone)]
pub enum ReplicateError {
    // configuration / input validation
    UnsupportedSite(String, String),
    MissingOption(String),
    ConflictingOptions(String),
    BadListLine(usize, String),
    InvalidSourceLocation(String),
    // per-file outcomes recorded by the aggregator
    CopyFailed(String, String),
    ChecksumMismatch { target: String, source_digest: String, dest_digest: String },
    // side steps that are logged but never abort the run
    DeleteFailed(String, String),
    CacheRefreshFailed(String, String),
    // external tool adapter
    ToolIo(String, String),
}

impl std::fmt::Display for ReplicateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use ReplicateError::*;
        match self {
            UnsupportedSite(site, detail) => {
                write!(f, "unsupported site '{}': {}", site, detail)
            }
            MissingOption(what) => write!(f, "missing required option: {}", what),
            ConflictingOptions(what) => write!(f, "conflicting options: {}", what),
            BadListLine(no, line) => {
                write!(f, "wrong data file: line {} has an unexpected shape: '{}'", no, line)
            }
            InvalidSourceLocation(path) => {
                write!(f, "source path '{}' is not under a permitted local root", path)
            }
            CopyFailed(target, detail) => write!(f, "copy of {} failed: {}", target, detail),
            ChecksumMismatch { target, source_digest, dest_digest } => write!(
                f,
                "checksum mismatch for {}: source {} != destination {}",
                target, source_digest, dest_digest
            ),
            DeleteFailed(target, detail) => write!(f, "delete of {} failed: {}", target, detail),
            CacheRefreshFailed(dir, detail) => {
                write!(f, "cache refresh for {} failed: {}", dir, detail)
            }
            ToolIo(cmd, detail) => write!(f, "external tool '{}' failed: {}", cmd, detail),
        }
    }
}

impl std::error::Error for ReplicateError {}

impl ReplicateError {
    /// Whether this error aborts the whole run before any task is dispatched.
    /// Per-file and side-step errors are isolated to their file/directory and
    /// only surface in the aggregate counters and the failure artifact.
    pub fn is_fatal(&self) -> bool {
        use ReplicateError::*;
        match self {
            UnsupportedSite(_, _)
            | MissingOption(_)
            | ConflictingOptions(_)
            | BadListLine(_, _)
            | InvalidSourceLocation(_) => true,
            CopyFailed(_, _)
            | ChecksumMismatch { .. }
            | DeleteFailed(_, _)
            | CacheRefreshFailed(_, _)
            | ToolIo(_, _) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fatality_classification() {
        assert!(ReplicateError::InvalidSourceLocation("/tmp/x".into()).is_fatal());
        assert!(ReplicateError::BadListLine(3, "a b c".into()).is_fatal());
        assert!(!ReplicateError::CopyFailed("/store/a".into(), "exit 1".into()).is_fatal());
        assert!(!ReplicateError::CacheRefreshFailed("/store/d".into(), "timeout".into()).is_fatal());
    }
}
