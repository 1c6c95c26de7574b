use crate::tool::RemoteTool;

/// Outcome of the pre-dispatch consistency check for one candidate file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckDecision {
    /// Source object is missing: never scheduled, never counted as a failure.
    Exclude,
    /// Destination already holds a consistent copy.
    Skip,
    /// Needs a transfer. `stale_dest` marks an existing destination object of
    /// the wrong size that should be removed before the copy.
    Transfer { stale_dest: bool },
}

/// Decides Skip / Transfer per candidate by comparing destination presence
/// and size against the source (catalog-provided size takes precedence over
/// a source stat). Pure decision function: no side effects beyond verbose
/// logging, idempotent for unchanged remote state.
pub struct ConsistencyChecker<'a> {
    tool: &'a dyn RemoteTool,
    force: bool,
    verbose: bool,
}

impl<'a> ConsistencyChecker<'a> {
    pub fn new(tool: &'a dyn RemoteTool, force: bool, verbose: bool) -> Self {
        Self { tool, force, verbose }
    }

    pub fn decide(&self, lfn: &str, source: &str, dest: &str, expected_size: i64) -> CheckDecision {
        let Some(source_size) = self.stat(source) else {
            tracing::warn!("missing source file {}", lfn);
            return CheckDecision::Exclude;
        };

        // The -1 sentinel is a per-file force; the flag is the global one.
        // Either bypasses the destination comparison, not the source check.
        if self.force || expected_size < 0 {
            if self.verbose {
                tracing::info!("force: add {} to list", lfn);
            }
            return CheckDecision::Transfer { stale_dest: self.stat(dest).is_some() };
        }

        match self.stat(dest) {
            None => CheckDecision::Transfer { stale_dest: false },
            Some(dest_size) => {
                let want = if expected_size >= 0 { expected_size as u64 } else { source_size };
                if dest_size == want {
                    if self.verbose {
                        tracing::info!("file already exists, skip {}", lfn);
                    }
                    CheckDecision::Skip
                } else {
                    if self.verbose {
                        tracing::info!(
                            "wrong size of {} (destination {} != {})",
                            lfn,
                            dest_size,
                            want
                        );
                    }
                    CheckDecision::Transfer { stale_dest: true }
                }
            }
        }
    }

    // A stat error is treated as "object absent": the conservative reading
    // for the source (warn + exclude) and for the destination (transfer).
    fn stat(&self, target: &str) -> Option<u64> {
        match self.tool.stat_size(target) {
            Ok(size) => size,
            Err(e) => {
                tracing::warn!("stat of {} failed: {}", target, e);
                None
            }
        }
    }
}
