//! Rendering a source mirror into docset documents.
//!
//! Pages are rendered on a bounded pool of blocking tasks. A page whose
//! target already exists is skipped and yields no entry, which makes a re-run
//! after a partial failure cheap.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use scraper::Html;
use tokio::sync::Semaphore;
use tracing::{debug, info, instrument, warn};

use cdkdocset_render::{RenderOptions, check_version, transform};
use cdkdocset_shared::{DocsetError, Entry, Result, write_atomic};

/// Files found in a source mirror, as `/`-separated paths relative to its root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MirrorScan {
    /// `*.html` files, sorted.
    pub pages: Vec<String>,
    /// Everything else, sorted.
    pub assets: Vec<String>,
}

/// Walk `root` recursively and split its files into pages and assets.
///
/// Dotfiles are ignored; they are leftovers of interrupted atomic writes.
pub fn scan_mirror(root: &Path) -> Result<MirrorScan> {
    let mut scan = MirrorScan::default();
    walk(root, "", &mut scan)?;
    scan.pages.sort();
    scan.assets.sort();
    debug!(pages = scan.pages.len(), assets = scan.assets.len(), "mirror scanned");
    Ok(scan)
}

fn walk(dir: &Path, prefix: &str, scan: &mut MirrorScan) -> Result<()> {
    let entries = std::fs::read_dir(dir).map_err(|e| DocsetError::io(dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| DocsetError::io(dir, e))?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') {
            continue;
        }

        let path = entry.path();
        let relative = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{prefix}/{name}")
        };

        if path.is_dir() {
            walk(&path, &relative, scan)?;
        } else if name.ends_with(".html") {
            scan.pages.push(relative);
        } else {
            scan.assets.push(relative);
        }
    }
    Ok(())
}

/// Copy `assets` byte-for-byte from `mirror` into `documents`, skipping
/// those already present. Returns the number copied.
pub fn copy_assets(mirror: &Path, documents: &Path, assets: &[String]) -> Result<usize> {
    let mut copied = 0;
    for asset in assets {
        let target = documents.join(asset);
        if target.exists() {
            continue;
        }
        let source = mirror.join(asset);
        let bytes = std::fs::read(&source).map_err(|e| DocsetError::io(&source, e))?;
        write_atomic(&target, &bytes)?;
        copied += 1;
    }
    debug!(copied, total = assets.len(), "assets copied");
    Ok(copied)
}

/// Render one page from `source` to `target`.
///
/// Returns `None` if `target` already exists. Fails if the page shows a
/// version other than `expected` or its template drifted.
pub fn render_page(
    source: &Path,
    target: &Path,
    relative_path: &str,
    expected: &str,
    options: &RenderOptions,
) -> Result<Option<Entry>> {
    if target.exists() {
        debug!(page = relative_path, "already rendered");
        return Ok(None);
    }

    let body = std::fs::read_to_string(source).map_err(|e| DocsetError::io(source, e))?;
    let html = Html::parse_document(&body);
    check_version(&html, &options.versions_path, expected)?;

    let page = transform(html, relative_path, options)?;
    write_atomic(target, page.html.as_bytes())?;
    Ok(Some(page.entry()))
}

/// Outcome of rendering a work list.
#[derive(Debug, Default)]
pub struct RenderReport {
    /// Entries of the pages rendered by this run, in work-list order.
    pub entries: Vec<Entry>,
    pub skipped: usize,
    /// Pages that failed, in work-list order.
    pub failed: Vec<(String, DocsetError)>,
    pub duration: Duration,
}

impl RenderReport {
    pub fn rendered(&self) -> usize {
        self.entries.len()
    }
}

/// Render every page of `pages` from `mirror` into `documents`.
///
/// At most `concurrency` pages are rendered at once. Every page is attempted;
/// failures are collected in the report. `on_done` is called once per page
/// with the page path, the number finished so far and the total.
#[instrument(skip_all, fields(pages = pages.len(), expected = %expected, concurrency = concurrency))]
pub async fn render_all(
    mirror: &Path,
    documents: &Path,
    pages: &[String],
    expected: &str,
    options: &RenderOptions,
    concurrency: usize,
    on_done: &(dyn Fn(&str, usize, usize) + Sync),
) -> RenderReport {
    let start = Instant::now();
    let total = pages.len();
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let options = Arc::new(options.clone());
    let expected: Arc<str> = Arc::from(expected);
    let mut handles = Vec::with_capacity(total);

    for page in pages {
        let source: PathBuf = mirror.join(page);
        let target: PathBuf = documents.join(page);
        let sem = semaphore.clone();
        let options = options.clone();
        let expected = expected.clone();
        let relative_path = page.clone();

        handles.push((
            page.clone(),
            tokio::spawn(async move {
                let _permit = sem
                    .acquire_owned()
                    .await
                    .map_err(|e| DocsetError::validation(format!("render pool closed: {e}")))?;
                tokio::task::spawn_blocking(move || {
                    render_page(&source, &target, &relative_path, &expected, &options)
                })
                .await
                .map_err(|e| DocsetError::validation(format!("render task failed: {e}")))?
            }),
        ));
    }

    let mut report = RenderReport::default();
    for (done, (page, handle)) in handles.into_iter().enumerate() {
        let outcome = match handle.await {
            Ok(outcome) => outcome,
            Err(e) => Err(DocsetError::validation(format!("render task panicked: {e}"))),
        };
        match outcome {
            Ok(Some(entry)) => report.entries.push(entry),
            Ok(None) => report.skipped += 1,
            Err(e) => {
                warn!(%page, error = %e, "page failed");
                report.failed.push((page.clone(), e));
            }
        }
        on_done(&page, done + 1, total);
    }

    report.duration = start.elapsed();
    info!(
        rendered = report.rendered(),
        skipped = report.skipped,
        failed = report.failed.len(),
        duration_ms = report.duration.as_millis(),
        "pages rendered"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{BUCKET, MODULE, fixture, options, temp_dir};
    use cdkdocset_shared::EntryType;

    fn ignore(_: &str, _: usize, _: usize) {}

    fn write(root: &Path, relative: &str, contents: &str) {
        let path = root.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
    }

    #[test]
    fn scan_splits_pages_and_assets() {
        let root = temp_dir("scan");
        write(&root, "cdk/api/v2/docs/b.html", "");
        write(&root, "cdk/api/v2/docs/a.html", "");
        write(&root, "cdk/api/v2/css/main.css", "");
        write(&root, "cdk/api/v2/docs/.a.html.0192.tmp", "");

        let scan = scan_mirror(&root).unwrap();
        assert_eq!(scan.pages, vec!["cdk/api/v2/docs/a.html", "cdk/api/v2/docs/b.html"]);
        assert_eq!(scan.assets, vec!["cdk/api/v2/css/main.css"]);

        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn assets_are_copied_once() {
        let mirror = temp_dir("assets-src");
        let documents = temp_dir("assets-dst");
        write(&mirror, "cdk/api/v2/img/go32.png", "png");
        let assets = vec!["cdk/api/v2/img/go32.png".to_string()];

        assert_eq!(copy_assets(&mirror, &documents, &assets).unwrap(), 1);
        assert_eq!(std::fs::read_to_string(documents.join(&assets[0])).unwrap(), "png");
        assert_eq!(copy_assets(&mirror, &documents, &assets).unwrap(), 0);

        let _ = std::fs::remove_dir_all(&mirror);
        let _ = std::fs::remove_dir_all(&documents);
    }

    #[test]
    fn render_page_writes_and_returns_entry() {
        let mirror = temp_dir("page-src");
        let documents = temp_dir("page-dst");
        write(&mirror, BUCKET, &fixture("bucket.html"));

        let entry = render_page(&mirror.join(BUCKET), &documents.join(BUCKET), BUCKET, "2.160.0", &options())
            .unwrap()
            .unwrap();
        assert_eq!(entry, Entry::new("s3 Bucket", EntryType::Constructor, BUCKET));

        let written = std::fs::read_to_string(documents.join(BUCKET)).unwrap();
        assert!(written.contains("dashAnchor"));

        let again = render_page(&mirror.join(BUCKET), &documents.join(BUCKET), BUCKET, "2.160.0", &options()).unwrap();
        assert_eq!(again, None);

        let _ = std::fs::remove_dir_all(&mirror);
        let _ = std::fs::remove_dir_all(&documents);
    }

    #[test]
    fn render_page_checks_version_before_writing() {
        let mirror = temp_dir("page-version");
        let documents = temp_dir("page-version-dst");
        write(&mirror, BUCKET, &fixture("bucket.html"));

        let err = render_page(&mirror.join(BUCKET), &documents.join(BUCKET), BUCKET, "2.1.0", &options())
            .unwrap_err();
        assert!(matches!(err, DocsetError::VersionMismatch { .. }));
        assert!(!documents.join(BUCKET).exists());

        let _ = std::fs::remove_dir_all(&mirror);
        let _ = std::fs::remove_dir_all(&documents);
    }

    #[tokio::test]
    async fn render_all_collects_failures_in_order() {
        let mirror = temp_dir("pool-src");
        let documents = temp_dir("pool-dst");
        write(&mirror, BUCKET, &fixture("bucket.html"));
        write(&mirror, MODULE, &fixture("module.html").replace("docs-prevnext", "pager"));
        let pages = vec![MODULE.to_string(), BUCKET.to_string()];

        let report = render_all(&mirror, &documents, &pages, "2.160.0", &options(), 2, &ignore).await;
        assert_eq!(report.rendered(), 1);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, MODULE);
        assert!(matches!(report.failed[0].1, DocsetError::MissingElement { .. }));
        assert!(!documents.join(MODULE).exists());

        let _ = std::fs::remove_dir_all(&mirror);
        let _ = std::fs::remove_dir_all(&documents);
    }

    #[tokio::test]
    async fn second_run_yields_no_entries() {
        let mirror = temp_dir("pool-rerun");
        let documents = temp_dir("pool-rerun-dst");
        write(&mirror, BUCKET, &fixture("bucket.html"));
        write(&mirror, MODULE, &fixture("module.html"));
        let pages = scan_mirror(&mirror).unwrap().pages;

        let first = render_all(&mirror, &documents, &pages, "2.160.0", &options(), 4, &ignore).await;
        assert_eq!(first.rendered(), 2);
        let before = std::fs::read_to_string(documents.join(BUCKET)).unwrap();

        let second = render_all(&mirror, &documents, &pages, "2.160.0", &options(), 4, &ignore).await;
        assert!(second.entries.is_empty());
        assert_eq!(second.skipped, 2);
        assert_eq!(std::fs::read_to_string(documents.join(BUCKET)).unwrap(), before);

        let _ = std::fs::remove_dir_all(&mirror);
        let _ = std::fs::remove_dir_all(&documents);
    }
}
