use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use indicatif::ProgressBar;

use xrdsync::ReplicateError;
use xrdsync::replicate::workers::{PoolCtx, ProgressState, run_pool};
use xrdsync::replicate::{LogicalFile, RunStages, TransferTask};
use xrdsync::tool::{DryRunTool, RemoteTool};

/// Counts every call so the test can prove which operations reached the
/// real adapter through the dry-run wrapper.
#[derive(Default)]
struct CountingTool {
    copies: AtomicU64,
    removes: AtomicU64,
    refreshes: AtomicU64,
    stats: AtomicU64,
}

impl RemoteTool for CountingTool {
    fn copy(&self, _s: &str, _d: &str) -> Result<(), ReplicateError> {
        self.copies.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
    fn checksum(&self, _t: &str) -> Result<String, ReplicateError> {
        Ok("deadbeef".to_string())
    }
    fn remove(&self, _t: &str) -> Result<(), ReplicateError> {
        self.removes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
    fn refresh_cache(&self, _d: &str) -> Result<(), ReplicateError> {
        self.refreshes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
    fn stat_size(&self, _t: &str) -> Result<Option<u64>, ReplicateError> {
        self.stats.fetch_add(1, Ordering::SeqCst);
        Ok(Some(42))
    }
    fn list_dir(&self, _u: &str) -> Result<Vec<String>, ReplicateError> {
        Ok(vec!["/store/a.root".to_string()])
    }
}

fn make_task(lfn: &str, stale_dest: bool) -> TransferTask {
    TransferTask {
        file: LogicalFile::new(lfn.to_string(), -1),
        source: format!("root://src.example.org:1094/{}", lfn),
        dest: format!("root://dst.example.org:1094/{}", lfn),
        stale_dest,
        refresh_dir: None,
    }
}

#[test]
fn dry_run_never_mutates_but_still_counts() {
    let inner = Arc::new(CountingTool::default());
    // The wrapper owns a second handle to the same counters via Arc.
    struct Shared(Arc<CountingTool>);
    impl RemoteTool for Shared {
        fn copy(&self, s: &str, d: &str) -> Result<(), ReplicateError> {
            self.0.copy(s, d)
        }
        fn checksum(&self, t: &str) -> Result<String, ReplicateError> {
            self.0.checksum(t)
        }
        fn remove(&self, t: &str) -> Result<(), ReplicateError> {
            self.0.remove(t)
        }
        fn refresh_cache(&self, d: &str) -> Result<(), ReplicateError> {
            self.0.refresh_cache(d)
        }
        fn stat_size(&self, t: &str) -> Result<Option<u64>, ReplicateError> {
            self.0.stat_size(t)
        }
        fn list_dir(&self, u: &str) -> Result<Vec<String>, ReplicateError> {
            self.0.list_dir(u)
        }
    }

    let tool: Arc<dyn RemoteTool> = Arc::new(DryRunTool::new(Box::new(Shared(inner.clone()))));
    assert!(tool.simulated());

    let tasks = vec![
        make_task("/store/a.root", true),
        make_task("/store/b.root", false),
        make_task("/store/c.root", true),
    ];
    let progress = Arc::new(ProgressState::new(tasks.len() as u64));
    run_pool(
        PoolCtx {
            workers: 2,
            tool: tool.clone(),
            stages: RunStages {
                remove_stale_dest: true,
                verify_checksum: true,
                delete_source: true,
            },
            progress: progress.clone(),
            total_pb: ProgressBar::hidden(),
        },
        tasks,
    );

    // Real counters over simulated actions.
    let snap = progress.snapshot();
    assert_eq!((snap.total, snap.succeeded, snap.failed), (3, 3, 0));
    assert!(progress.is_complete());

    // No mutating call reached the inner adapter.
    assert_eq!(inner.copies.load(Ordering::SeqCst), 0);
    assert_eq!(inner.removes.load(Ordering::SeqCst), 0);
    assert_eq!(inner.refreshes.load(Ordering::SeqCst), 0);
}

#[test]
fn dry_run_reads_pass_through() {
    let tool = DryRunTool::new(Box::new(CountingTool::default()));
    assert_eq!(tool.stat_size("root://h:1094//store/a").unwrap(), Some(42));
    assert_eq!(tool.list_dir("root://h:1094//store").unwrap(), vec!["/store/a.root".to_string()]);
}
