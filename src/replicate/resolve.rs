use std::path::{Path, PathBuf};

use crate::ReplicateError;

/// Resolved URI pair for one migration candidate, plus the destination
/// directory used later as a cache-refresh target.
#[derive(Debug, Clone)]
pub struct ResolvedPaths {
    pub source: String,
    pub dest: String,
    pub refresh_dir: String,
}

/// Maps local filesystem paths to destination URIs for the migration
/// workflow. The source must live under one of the permitted local roots;
/// the destination keeps the sub-structure beneath the user's personal
/// directory segment, rebased onto `dest_root` (plus an optional prepend).
pub struct MigrationResolver {
    local_user: String,
    permitted_roots: Vec<PathBuf>,
    dest_root: String,
    prepend: Option<String>,
}

impl MigrationResolver {
    pub fn new(
        local_user: String,
        permitted_roots: Vec<PathBuf>,
        dest_root: &str,
        prepend: Option<&str>,
    ) -> Self {
        Self {
            local_user,
            permitted_roots,
            dest_root: dest_root.trim_end_matches('/').to_string(),
            prepend: prepend.map(|p| p.trim_matches('/').to_string()),
        }
    }

    /// Resolve one source file. `InvalidSourceLocation` here is fatal for
    /// the whole run: a path outside every permitted root means the caller
    /// pointed the tool at the wrong tree.
    pub fn resolve(&self, source: &Path) -> Result<ResolvedPaths, ReplicateError> {
        let root = self
            .permitted_roots
            .iter()
            .find(|r| source.starts_with(r))
            .ok_or_else(|| {
                ReplicateError::InvalidSourceLocation(source.display().to_string())
            })?;

        let file_name = source
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| ReplicateError::InvalidSourceLocation(source.display().to_string()))?;

        let parent = source.parent().unwrap_or(Path::new("/"));
        let sub = self.subpath_after_user(parent, root);

        let mut dir = self.dest_root.clone();
        if let Some(p) = &self.prepend {
            dir.push('/');
            dir.push_str(p);
        }
        dir.push_str(&sub);

        let dest = format!("{}/{}", dir, file_name);
        Ok(ResolvedPaths {
            source: source.display().to_string(),
            dest,
            refresh_dir: dir,
        })
    }

    // Keep the directory components after the last one matching the local
    // username; when no such component exists, fall back to the path
    // relative to the permitted root.
    fn subpath_after_user(&self, dir: &Path, root: &Path) -> String {
        let comps: Vec<&str> =
            dir.iter().filter_map(|c| c.to_str()).filter(|c| *c != "/").collect();
        let tail: Vec<&str> = match comps.iter().rposition(|c| *c == self.local_user) {
            Some(pos) => comps[pos + 1..].to_vec(),
            None => dir
                .strip_prefix(root)
                .ok()
                .map(|rel| rel.iter().filter_map(|c| c.to_str()).collect())
                .unwrap_or_default(),
        };
        let mut sub = String::new();
        for c in tail {
            sub.push('/');
            sub.push_str(c);
        }
        sub
    }
}

/// Local account name, used to locate the personal-directory segment.
pub fn local_username() -> Result<String, ReplicateError> {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .map_err(|_| ReplicateError::MissingOption("USER environment variable".to_string()))
}
