// replicate module: batch replication orchestration over an external
// copy tool. The download and migration variants share one parameterized
// pipeline: candidates -> resolver -> consistency check -> worker pool ->
// aggregation -> failure artifact.
pub mod check;
pub mod enumeration;
pub mod resolve;
pub mod workers;

use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::ReplicateError;
use crate::config::Config;
use crate::parse;
use crate::site::SiteEndpoint;
use crate::tool::{DryRunTool, RemoteTool, XrdCommandTool};
use crate::util;

use self::check::{CheckDecision, ConsistencyChecker};
use self::resolve::MigrationResolver;
use self::workers::{PoolCtx, ProgressState, run_pool};

/// One candidate data object, immutable once read from the input source.
/// `expected_size` of -1 means unknown, which doubles as the per-file force
/// sentinel.
#[derive(Debug, Clone)]
pub struct LogicalFile {
    pub lfn: String,
    pub expected_size: i64,
    pub checksum: Option<String>,
}

impl LogicalFile {
    pub fn new(lfn: String, expected_size: i64) -> Self {
        Self { lfn, expected_size, checksum: None }
    }
}

/// Unit of work for the pool: resolved URI pair plus the optional stage
/// inputs. Created by the resolver, consumed by exactly one worker, never
/// mutated after creation.
#[derive(Debug, Clone)]
pub struct TransferTask {
    pub file: LogicalFile,
    pub source: String,
    pub dest: String,
    pub stale_dest: bool,
    pub refresh_dir: Option<String>,
}

/// Optional pipeline stages. Each former script variant's unique behavior
/// is a toggle here rather than a separate code path.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunStages {
    pub remove_stale_dest: bool,
    pub verify_checksum: bool,
    pub delete_source: bool,
}

/// Arguments for `handle_download`, grouped to avoid long parameter lists.
#[derive(Clone)]
pub struct DownloadArgs {
    pub source: String,
    pub dest: String,
    pub listfile: Option<PathBuf>,
    pub dirname: Option<String>,
    pub parallel: Option<usize>,
    pub force: bool,
    pub verbose: bool,
    pub dry_run: bool,
}

/// Arguments for `handle_migrate`.
#[derive(Clone)]
pub struct MigrateArgs {
    pub source_dir: Option<PathBuf>,
    pub listfile: Option<PathBuf>,
    pub dest_site: Option<String>,
    pub dest_url: Option<String>,
    pub remote_user: Option<String>,
    pub prepend: Option<String>,
    pub parallel: Option<usize>,
    pub delete: bool,
    pub verbose: bool,
    pub dry_run: bool,
}

fn build_tool(config: &Config, dry_run: bool) -> Arc<dyn RemoteTool> {
    if dry_run {
        return Arc::new(DryRunTool::new(Box::new(XrdCommandTool::from_config(config))));
    }
    Arc::new(XrdCommandTool::from_config(config))
}

/// Read an LFN list file: `<lfn>` or `<lfn> <size>` per line, blank lines
/// skipped, anything else fatal.
pub fn read_list_file(path: &Path) -> Result<Vec<LogicalFile>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read list file {}", path.display()))?;
    let mut files = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        if let Some((lfn, size)) = parse::parse_list_line(idx + 1, line)? {
            files.push(LogicalFile::new(lfn, size));
        }
    }
    Ok(files)
}

// Migration lists name local paths, one per line. Entries that are not
// regular files are warned about and dropped, matching the behavior of
// enumeration mode.
fn read_migration_list(path: &Path) -> Result<Vec<PathBuf>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read list file {}", path.display()))?;
    let mut sources = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        let cols: Vec<&str> = line.split_whitespace().collect();
        match cols.len() {
            0 => {}
            1 => {
                let p = PathBuf::from(cols[0]);
                if p.is_file() {
                    sources.push(p);
                } else {
                    tracing::warn!("list entry is not a regular file, dropped: {}", cols[0]);
                }
            }
            _ => {
                return Err(
                    ReplicateError::BadListLine(idx + 1, line.trim().to_string()).into()
                );
            }
        }
    }
    Ok(sources)
}

/// Site-to-site mirrored download. Success is determined purely by the copy
/// tool's exit status; no checksum verification, no source deletion.
pub fn handle_download(config: &Config, args: DownloadArgs) -> Result<()> {
    let DownloadArgs { source, dest, listfile, dirname, parallel, force, verbose, dry_run } =
        args;
    match (&listfile, &dirname) {
        (None, None) => {
            return Err(ReplicateError::MissingOption(
                "one of --listfile or --dirname".to_string(),
            )
            .into());
        }
        (Some(_), Some(_)) => {
            return Err(ReplicateError::ConflictingOptions(
                "only one of --listfile or --dirname may be set".to_string(),
            )
            .into());
        }
        _ => {}
    }

    let tool = build_tool(config, dry_run);
    let src_site = SiteEndpoint::load(&config.siteconf_dir, &source)?;
    let dest_site = SiteEndpoint::load(&config.siteconf_dir, &dest)?;
    let src_prefix = src_site.xrootd_prefix()?.to_string();
    let dest_prefix = dest_site.xrootd_prefix()?.to_string();
    tracing::info!("replicating {} -> {}", src_site.name, dest_site.name);

    let files = match listfile {
        Some(path) => read_list_file(&path)?,
        None => {
            let dir = parse::normalize_lfn(&dirname.unwrap_or_default());
            let listing = tool.list_dir(&format!("{}{}", src_prefix, dir))?;
            listing
                .into_iter()
                .map(|entry| LogicalFile::new(parse::normalize_lfn(&entry), -1))
                .collect()
        }
    };
    println!("Total target files : {}", files.len());

    let checker = ConsistencyChecker::new(tool.as_ref(), force, verbose);
    let mut tasks = Vec::new();
    for file in files {
        let source_url = format!("{}{}", src_prefix, file.lfn);
        let dest_url = format!("{}{}", dest_prefix, file.lfn);
        match checker.decide(&file.lfn, &source_url, &dest_url, file.expected_size) {
            CheckDecision::Exclude | CheckDecision::Skip => {}
            CheckDecision::Transfer { stale_dest } => tasks.push(TransferTask {
                file,
                source: source_url,
                dest: dest_url,
                stale_dest,
                refresh_dir: None,
            }),
        }
    }

    let stages = RunStages { remove_stale_dest: true, ..RunStages::default() };
    let workers = parallel.unwrap_or(config.default_parallel);
    run_and_report(tool, tasks, stages, workers)?;
    Ok(())
}

/// Filesystem-to-remote migration. Every copy is checksum-verified before a
/// success is recorded; `--delete` removes a verified source. Affected
/// destination directories get a cache-refresh hint afterwards.
pub fn handle_migrate(config: &Config, args: MigrateArgs) -> Result<()> {
    let MigrateArgs {
        source_dir,
        listfile,
        dest_site,
        dest_url,
        remote_user,
        prepend,
        parallel,
        delete,
        verbose,
        dry_run,
    } = args;
    match (&source_dir, &listfile) {
        (None, None) => {
            return Err(ReplicateError::MissingOption(
                "a source directory or --listfile".to_string(),
            )
            .into());
        }
        (Some(_), Some(_)) => {
            return Err(ReplicateError::ConflictingOptions(
                "only one of a source directory or --listfile may be set".to_string(),
            )
            .into());
        }
        _ => {}
    }

    let tool = build_tool(config, dry_run);
    let dest_root = match dest_url {
        Some(url) => url.trim_end_matches('/').to_string(),
        None => {
            let site_name = dest_site.ok_or_else(|| {
                ReplicateError::MissingOption("--dest or --dest-url".to_string())
            })?;
            let user = remote_user.ok_or_else(|| {
                ReplicateError::MissingOption("--cernid (required with --dest)".to_string())
            })?;
            let site = SiteEndpoint::load(&config.siteconf_dir, &site_name)?;
            format!("{}/store/user/{}", site.xrootd_prefix()?, user)
        }
    };

    let local_user = resolve::local_username()?;
    let resolver = MigrationResolver::new(
        local_user,
        config.local_roots.clone(),
        &dest_root,
        prepend.as_deref(),
    );

    let sources = match (source_dir, listfile) {
        (Some(dir), None) => enumeration::enumerate_source_tree(&dir),
        (None, Some(path)) => read_migration_list(&path)?,
        _ => unreachable!("validated above"),
    };
    println!("Number of files is {}", sources.len());

    let checker = ConsistencyChecker::new(tool.as_ref(), false, verbose);
    let mut tasks = Vec::new();
    for src in sources {
        // A path outside the permitted roots is a systemic misconfiguration
        // and aborts the run before any task is dispatched.
        let resolved = resolver.resolve(&src)?;
        let file = LogicalFile::new(resolved.source.clone(), -1);
        match checker.decide(&file.lfn, &resolved.source, &resolved.dest, file.expected_size) {
            CheckDecision::Exclude | CheckDecision::Skip => {}
            CheckDecision::Transfer { stale_dest } => tasks.push(TransferTask {
                file,
                source: resolved.source,
                dest: resolved.dest,
                stale_dest,
                refresh_dir: Some(resolved.refresh_dir),
            }),
        }
    }

    let refresh_index: Vec<(String, Option<String>)> =
        tasks.iter().map(|t| (t.file.lfn.clone(), t.refresh_dir.clone())).collect();

    let stages =
        RunStages { remove_stale_dest: false, verify_checksum: true, delete_source: delete };
    let workers = parallel.unwrap_or(config.default_parallel);
    let progress = run_and_report(tool.clone(), tasks, stages, workers)?;

    // Refresh the remote directory caches that gained content, so later
    // listings see the migrated files. Failures are logged, never fatal.
    let failed: HashSet<String> = progress.failed_lfns().into_iter().collect();
    let dirs: BTreeSet<String> = refresh_index
        .into_iter()
        .filter(|(lfn, _)| !failed.contains(lfn))
        .filter_map(|(_, dir)| dir)
        .collect();
    for dir in dirs {
        if let Err(e) = tool.refresh_cache(&dir) {
            tracing::warn!("{}", e);
        }
    }
    Ok(())
}

// Shared tail of both pipelines: run the pool to completion, persist the
// failure artifact and print the summary.
fn run_and_report(
    tool: Arc<dyn RemoteTool>,
    tasks: Vec<TransferTask>,
    stages: RunStages,
    workers: usize,
) -> Result<Arc<ProgressState>> {
    let total = tasks.len() as u64;
    let progress = Arc::new(ProgressState::new(total));
    let total_pb = util::init_total_progress(total)?;
    let start = std::time::Instant::now();

    run_pool(
        PoolCtx {
            workers,
            tool: tool.clone(),
            stages,
            progress: progress.clone(),
            total_pb: total_pb.clone(),
        },
        tasks,
    );
    total_pb.finish_and_clear();
    debug_assert!(progress.is_complete());

    // The artifact is overwritten every run (an empty run truncates it);
    // resubmitting it is the only retry mechanism.
    let failed = progress.failed_lfns();
    let artifact = util::write_failed_list(Path::new("."), &failed)
        .with_context(|| format!("cannot write {}", util::FAILED_LIST_FILE))?;
    if !failed.is_empty() {
        println!("Failed list written to: {}", artifact.display());
    }
    util::print_summary(&progress.snapshot(), start.elapsed(), tool.simulated());
    Ok(progress)
}
