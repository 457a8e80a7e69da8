//! Concurrent mirror download.
//!
//! Every item of the work list is fetched into the mirror root at its site
//! path. Items already on disk are skipped without a request, so an
//! interrupted download can simply be re-run.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Semaphore;
use tracing::{debug, info, instrument, warn};

use cdkdocset_shared::{DocsetError, Result, write_atomic};

use crate::client::Fetcher;

/// Summary of a download run.
#[derive(Debug, Clone, Default)]
pub struct DownloadReport {
    /// Items fetched and written.
    pub fetched: usize,
    /// Items already present in the mirror.
    pub skipped: usize,
    /// Items that failed, with the error message.
    pub failed: Vec<(String, String)>,
    pub duration: Duration,
}

impl DownloadReport {
    /// Turn a report with failures into a [`DocsetError::Network`].
    pub fn into_result(self) -> Result<Self> {
        match self.failed.first() {
            None => Ok(self),
            Some((path, error)) => Err(DocsetError::Network(format!(
                "{} of {} downloads failed (first: {path}: {error})",
                self.failed.len(),
                self.fetched + self.skipped + self.failed.len(),
            ))),
        }
    }
}

/// Location of site `path` inside the mirror at `root`.
///
/// Paths that would leave the mirror (`..` segments) are rejected.
pub fn mirror_path(root: &Path, path: &str) -> Result<PathBuf> {
    let relative = path.trim_start_matches('/');
    if relative.is_empty() || relative.split('/').any(|s| s == "..") {
        return Err(DocsetError::validation(format!("refusing to mirror {path}")));
    }
    Ok(root.join(relative))
}

/// Download every item of `paths` into `root`.
///
/// At most `concurrency` requests are in flight. Failures do not stop the
/// run; they are collected in the report. `on_done` is called once per item
/// with the item path, the number of items finished so far and the total.
#[instrument(skip_all, fields(root = %root.display(), items = paths.len(), concurrency = concurrency))]
pub async fn download_all(
    fetcher: &Fetcher,
    paths: &[String],
    root: &Path,
    concurrency: usize,
    on_done: &(dyn Fn(&str, usize, usize) + Sync),
) -> DownloadReport {
    let start = Instant::now();
    let total = paths.len();
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut report = DownloadReport::default();
    let mut done = 0;
    let mut handles = Vec::new();

    for path in paths {
        let target = match mirror_path(root, path) {
            Ok(target) => target,
            Err(e) => {
                warn!(%path, error = %e, "bad work item");
                report.failed.push((path.clone(), e.to_string()));
                done += 1;
                on_done(path, done, total);
                continue;
            }
        };

        if target.exists() {
            debug!(%path, "already mirrored");
            report.skipped += 1;
            done += 1;
            on_done(path, done, total);
            continue;
        }

        let fetcher = fetcher.clone();
        let sem = semaphore.clone();
        let item = path.clone();
        handles.push((
            path.clone(),
            tokio::spawn(async move {
                let _permit = sem
                    .acquire_owned()
                    .await
                    .map_err(|e| DocsetError::Network(format!("download pool closed: {e}")))?;
                let bytes = fetcher.get_bytes(&item).await?;
                write_atomic(&target, &bytes)?;
                Ok::<usize, DocsetError>(bytes.len())
            }),
        ));
    }

    for (path, handle) in handles {
        match handle.await {
            Ok(Ok(size)) => {
                debug!(%path, size, "mirrored");
                report.fetched += 1;
            }
            Ok(Err(e)) => {
                warn!(%path, error = %e, "download failed");
                report.failed.push((path.clone(), e.to_string()));
            }
            Err(e) => {
                warn!(%path, error = %e, "download task panicked");
                report.failed.push((path.clone(), e.to_string()));
            }
        }
        done += 1;
        on_done(&path, done, total);
    }

    report.duration = start.elapsed();
    info!(
        fetched = report.fetched,
        skipped = report.skipped,
        failed = report.failed.len(),
        duration_ms = report.duration.as_millis(),
        "download completed"
    );
    report
}
