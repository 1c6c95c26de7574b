use std::sync::{Arc, Mutex};

use crossbeam_channel::bounded;
use indicatif::ProgressBar;

use crate::ReplicateError;
use crate::replicate::{RunStages, TransferTask};
use crate::tool::RemoteTool;

// Hard ceiling on worker threads regardless of -p.
const MAX_WORKERS: usize = 16;

/// Aggregate counters plus the failed-identifier list, shared by every
/// worker. One mutex guards the whole update group so an outcome's counter
/// bump and its list append are a single atomic step.
pub struct ProgressState {
    total: u64,
    inner: Mutex<Aggregates>,
}

#[derive(Default)]
struct Aggregates {
    succeeded: u64,
    failed: u64,
    failed_lfns: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub total: u64,
    pub succeeded: u64,
    pub failed: u64,
}

impl ProgressState {
    pub fn new(total: u64) -> Self {
        Self { total, inner: Mutex::new(Aggregates::default()) }
    }

    pub fn record_success(&self) -> ProgressSnapshot {
        let mut agg = self.inner.lock().expect("progress lock poisoned");
        agg.succeeded += 1;
        debug_assert!(agg.succeeded + agg.failed <= self.total);
        ProgressSnapshot { total: self.total, succeeded: agg.succeeded, failed: agg.failed }
    }

    pub fn record_failure(&self, lfn: &str) -> ProgressSnapshot {
        let mut agg = self.inner.lock().expect("progress lock poisoned");
        agg.failed += 1;
        agg.failed_lfns.push(lfn.to_string());
        debug_assert!(agg.succeeded + agg.failed <= self.total);
        ProgressSnapshot { total: self.total, succeeded: agg.succeeded, failed: agg.failed }
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        let agg = self.inner.lock().expect("progress lock poisoned");
        ProgressSnapshot { total: self.total, succeeded: agg.succeeded, failed: agg.failed }
    }

    pub fn failed_lfns(&self) -> Vec<String> {
        self.inner.lock().expect("progress lock poisoned").failed_lfns.clone()
    }

    /// True once every dispatched task has reached a terminal state.
    pub fn is_complete(&self) -> bool {
        let snap = self.snapshot();
        snap.succeeded + snap.failed == snap.total
    }
}

/// Shared context for one pool run.
pub struct PoolCtx {
    pub workers: usize,
    pub tool: Arc<dyn RemoteTool>,
    pub stages: RunStages,
    pub progress: Arc<ProgressState>,
    pub total_pb: ProgressBar,
}

/// Fan the tasks out over a bounded pool of worker threads and block until
/// every task has produced an outcome. Workers are spawned before the
/// producer feeds the bounded channel, so a full queue only applies
/// backpressure instead of deadlocking.
pub fn run_pool(ctx: PoolCtx, tasks: Vec<TransferTask>) {
    let PoolCtx { workers, tool, stages, progress, total_pb } = ctx;
    if tasks.is_empty() {
        return;
    }
    let workers = workers.clamp(1, MAX_WORKERS).min(tasks.len());
    let cap = std::cmp::max(4, workers * 4);
    let (tx, rx) = bounded::<TransferTask>(cap);

    let mut handles = Vec::with_capacity(workers);
    for worker_id in 0..workers {
        let rx = rx.clone();
        let tool = tool.clone();
        let progress = progress.clone();
        let total_pb = total_pb.clone();
        let handle = std::thread::spawn(move || {
            while let Ok(task) = rx.recv() {
                tracing::debug!("worker_id={} picked up {}", worker_id, task.file.lfn);
                execute_task(tool.as_ref(), stages, &progress, &total_pb, task);
            }
        });
        handles.push(handle);
    }
    drop(rx);

    for task in tasks {
        // Blocking send applies backpressure on the producer.
        let _ = tx.send(task);
    }
    drop(tx);

    // Join barrier: aggregates must not be read before the pool drains.
    for handle in handles {
        let _ = handle.join();
    }
}

// One task, one terminal outcome. The copy (and the checksum passes of the
// verify stage) block this worker; there is no timeout and no in-run retry.
fn execute_task(
    tool: &dyn RemoteTool,
    stages: RunStages,
    progress: &ProgressState,
    total_pb: &ProgressBar,
    task: TransferTask,
) {
    total_pb.println(format!("Source: {}", task.source));
    total_pb.println(format!("Destination: {}", task.dest));

    if stages.remove_stale_dest && task.stale_dest {
        if let Err(e) = tool.remove(&task.dest) {
            // The copy overwrites anyway; a failed pre-remove is diagnostic.
            tracing::warn!("pre-remove of stale destination failed: {}", e);
        }
    }

    let snap = match transfer_one(tool, stages, &task) {
        Ok(()) => progress.record_success(),
        Err(e) => {
            total_pb.println(format!("{} is failed: {}", task.file.lfn, e));
            progress.record_failure(&task.file.lfn)
        }
    };
    total_pb.println(format!(
        "Total: {} / Success: {} / Fail: {}",
        snap.total, snap.succeeded, snap.failed
    ));
    total_pb.inc(1);
}

fn transfer_one(
    tool: &dyn RemoteTool,
    stages: RunStages,
    task: &TransferTask,
) -> Result<(), ReplicateError> {
    tool.copy(&task.source, &task.dest)?;

    if stages.verify_checksum {
        // The digest is authoritative over the copy tool's exit status; a
        // checksum tool error leaves the copy unverified and counts as a
        // failure too.
        let source_digest = tool.checksum(&task.source)?;
        let dest_digest = tool.checksum(&task.dest)?;
        if source_digest != dest_digest {
            return Err(ReplicateError::ChecksumMismatch {
                target: task.file.lfn.clone(),
                source_digest,
                dest_digest,
            });
        }
        if stages.delete_source {
            // Only a verified copy may delete its source; failures here do
            // not roll back the completed transfer.
            if let Err(e) = tool.remove(&task.source) {
                tracing::warn!("delete after verified copy failed: {}", e);
            }
        }
    }
    Ok(())
}
