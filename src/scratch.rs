use std::{
    path::{Path, PathBuf},
    sync::atomic::{AtomicU64, Ordering},
};

use anyhow::Context as _;

use crate::error::DailiesResult;

/// Shared per-day scratch directory for slate frames, concat manifests and
/// generated graph scripts.
///
/// The directory is created once per calendar day if absent and is never
/// cleaned up automatically; review tooling expects yesterday's intermediates
/// to still be inspectable. Filenames handed out by [`ScratchDir::unique_path`]
/// carry a request-scoped token so concurrent invocations cannot collide on
/// the same slate or manifest name.
#[derive(Clone, Debug)]
pub struct ScratchDir {
    root: PathBuf,
}

static TOKEN_COUNTER: AtomicU64 = AtomicU64::new(0);

impl ScratchDir {
    /// Ensures today's scratch directory exists under the system temp dir.
    pub fn ensure() -> DailiesResult<Self> {
        Self::ensure_under(&std::env::temp_dir())
    }

    /// Ensures today's scratch directory exists under `base`.
    pub fn ensure_under(base: &Path) -> DailiesResult<Self> {
        let day = chrono::Local::now().format("%Y-%m-%d");
        let root = base.join(format!("dailies-{day}"));
        if !root.exists() {
            std::fs::create_dir_all(&root).with_context(|| {
                format!("failed to create scratch directory '{}'", root.display())
            })?;
            tracing::info!("created scratch directory {}", root.display());
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// A scratch path of the form `<root>/<stem>_<pid>-<seq>.<ext>`.
    pub fn unique_path(&self, stem: &str, extension: &str) -> PathBuf {
        let seq = TOKEN_COUNTER.fetch_add(1, Ordering::Relaxed);
        let pid = std::process::id();
        self.root.join(format!("{stem}_{pid}-{seq}.{extension}"))
    }
}
