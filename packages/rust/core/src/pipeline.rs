//! End-to-end pipelines: download (site → mirror), build (mirror → docset)
//! and sync (both).

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::Utc;
use scraper::Html;
use tracing::{info, instrument, warn};

use cdkdocset_crawler::{DownloadReport, Fetcher, download_all, list_toc, mirror_path, online_version};
use cdkdocset_render::{RenderOptions, page_version};
use cdkdocset_shared::{DocsetConfig, DocsetError, DocsetMeta, Result, SiteConfig, write_atomic};
use cdkdocset_storage::IndexStore;

use crate::archive::write_tgz;
use crate::build::{copy_assets, render_all, scan_mirror};
use crate::layout::{DocsetLayout, validate_docset};

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called when one work item (download or page) is finished.
    fn item_done(&self, path: &str, current: usize, total: usize);
    /// Called when the pipeline completes.
    fn done(&self, summary: &str);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn item_done(&self, _path: &str, _current: usize, _total: usize) {}
    fn done(&self, _summary: &str) {}
}

// ---------------------------------------------------------------------------
// Download
// ---------------------------------------------------------------------------

/// Configuration for [`download`].
#[derive(Debug, Clone)]
pub struct DownloadConfig {
    pub site: SiteConfig,
    /// Root of the source mirror.
    pub mirror_dir: PathBuf,
    /// Version the site must be publishing. `None` accepts whatever is online.
    pub expected_version: Option<String>,
    pub concurrency: usize,
}

/// Result of [`download`].
#[derive(Debug)]
pub struct DownloadResult {
    /// Version that was mirrored.
    pub version: String,
    pub report: DownloadReport,
}

/// Mirror the table of contents, every page it lists and the static assets.
///
/// Fails on a version mismatch before anything is fetched, and after all
/// items were attempted if any of them failed.
#[instrument(skip_all, fields(mirror = %config.mirror_dir.display()))]
pub async fn download(
    fetcher: &Fetcher,
    config: &DownloadConfig,
    progress: &dyn ProgressReporter,
) -> Result<DownloadResult> {
    progress.phase("Checking online version");
    let version = match &config.expected_version {
        Some(version) => version.clone(),
        None => online_version(fetcher, &config.site).await?,
    };

    progress.phase("Listing table of contents");
    let items = list_toc(fetcher, &config.site, &version).await?;

    progress.phase("Downloading");
    let on_done = |path: &str, current: usize, total: usize| progress.item_done(path, current, total);
    let report = download_all(fetcher, &items, &config.mirror_dir, config.concurrency, &on_done)
        .await
        .into_result()?;

    progress.done(&format!(
        "Mirrored {version}: {} fetched, {} already present",
        report.fetched, report.skipped
    ));
    Ok(DownloadResult { version, report })
}

/// Version published online right now.
pub async fn current_version(fetcher: &Fetcher, site: &SiteConfig) -> Result<String> {
    online_version(fetcher, site).await
}

// ---------------------------------------------------------------------------
// Build
// ---------------------------------------------------------------------------

/// Configuration for [`build`].
#[derive(Debug, Clone)]
pub struct BuildConfig {
    pub site: SiteConfig,
    pub docset: DocsetConfig,
    /// Root of the source mirror.
    pub mirror_dir: PathBuf,
    /// Directory receiving `<name>.docset` and `meta.json`.
    pub output_dir: PathBuf,
    /// Version every page must show. `None` takes it from the mirrored
    /// table-of-contents page.
    pub expected_version: Option<String>,
    pub concurrency: usize,
}

/// Result of [`build`].
#[derive(Debug)]
pub struct BuildResult {
    pub docset_path: PathBuf,
    pub version: String,
    /// Pages rendered by this run.
    pub rendered: usize,
    /// Pages already present in the docset.
    pub skipped: usize,
    pub assets_copied: usize,
    /// Index rows added by this run.
    pub entries_added: usize,
    /// Index rows after the run.
    pub index_entries: usize,
    pub elapsed: Duration,
}

/// Render the mirror into a docset bundle and merge its index.
///
/// Entries of every page rendered successfully are stored before the first
/// page failure (by work-list order) is returned, so a re-run never loses
/// them.
#[instrument(skip_all, fields(mirror = %config.mirror_dir.display(), output = %config.output_dir.display()))]
pub async fn build(config: &BuildConfig, progress: &dyn ProgressReporter) -> Result<BuildResult> {
    let start = Instant::now();

    if !config.mirror_dir.is_dir() {
        return Err(DocsetError::validation(format!(
            "source mirror {} does not exist",
            config.mirror_dir.display()
        )));
    }

    progress.phase("Checking mirror version");
    let version = resolve_version(
        &config.mirror_dir,
        &config.site,
        config.expected_version.as_deref(),
    )?;
    let options = RenderOptions::from_site(&config.site)?;

    progress.phase("Preparing docset");
    let layout = DocsetLayout::new(&config.output_dir, &config.docset.name);
    layout.create_dirs()?;
    layout.write_info_plist(&config.docset, config.site.toc_path.trim_start_matches('/'))?;
    let store = IndexStore::open(&layout.index_path()).await?;

    progress.phase("Copying assets");
    let scan = scan_mirror(&config.mirror_dir)?;
    let documents = layout.documents();
    let assets_copied = copy_assets(&config.mirror_dir, &documents, &scan.assets)?;

    progress.phase("Rendering pages");
    let on_done = |path: &str, current: usize, total: usize| progress.item_done(path, current, total);
    let report = render_all(
        &config.mirror_dir,
        &documents,
        &scan.pages,
        &version,
        &options,
        config.concurrency,
        &on_done,
    )
    .await;

    progress.phase("Updating index");
    let entries_added = store.upsert_entries(&report.entries).await?;

    let failed = report.failed.len();
    if let Some((page, error)) = report.failed.into_iter().next() {
        warn!(%page, failed, entries_added, "build stopped by page failure");
        return Err(error);
    }

    let index_entries = store.count_entries().await?;
    layout.write_meta(&DocsetMeta {
        name: config.docset.name.clone(),
        version: version.clone(),
        built_at: Utc::now(),
        entries: index_entries,
    })?;

    let result = BuildResult {
        docset_path: layout.root().to_path_buf(),
        version,
        rendered: report.entries.len(),
        skipped: report.skipped,
        assets_copied,
        entries_added,
        index_entries,
        elapsed: start.elapsed(),
    };

    info!(
        version = %result.version,
        rendered = result.rendered,
        skipped = result.skipped,
        entries = result.index_entries,
        elapsed_ms = result.elapsed.as_millis(),
        "build completed"
    );
    progress.done(&format!(
        "Built {} ({}): {} pages rendered, {} index entries",
        config.docset.name, result.version, result.rendered, result.index_entries
    ));
    Ok(result)
}

/// Version shown on the mirrored table-of-contents page, if it was mirrored.
pub fn mirror_version(mirror_dir: &Path, site: &SiteConfig) -> Result<Option<String>> {
    let toc = mirror_path(mirror_dir, &site.toc_path)?;
    if !toc.exists() {
        return Ok(None);
    }
    let body = std::fs::read_to_string(&toc).map_err(|e| DocsetError::io(&toc, e))?;
    let doc = Html::parse_document(&body);
    page_version(&doc, &site.versions_path)
        .map(Some)
        .ok_or_else(|| DocsetError::parse(format!("{} has no version marker", toc.display())))
}

/// The version to build: `expected` when given, checked against the mirror's
/// table of contents, otherwise whatever the mirror holds.
fn resolve_version(mirror_dir: &Path, site: &SiteConfig, expected: Option<&str>) -> Result<String> {
    match (expected, mirror_version(mirror_dir, site)?) {
        (Some(expected), Some(actual)) if actual != expected => {
            Err(DocsetError::version_mismatch(expected, actual))
        }
        (Some(expected), _) => Ok(expected.to_string()),
        (None, Some(actual)) => Ok(actual),
        (None, None) => Err(DocsetError::validation(format!(
            "no version given and {} is not mirrored",
            site.toc_path
        ))),
    }
}

// ---------------------------------------------------------------------------
// Sync
// ---------------------------------------------------------------------------

/// Result of [`sync`].
#[derive(Debug)]
pub struct SyncResult {
    pub download: DownloadResult,
    pub build: BuildResult,
}

/// Download into the mirror, then build the docset from it.
#[instrument(skip_all, fields(mirror = %config.mirror_dir.display()))]
pub async fn sync(
    fetcher: &Fetcher,
    config: &BuildConfig,
    progress: &dyn ProgressReporter,
) -> Result<SyncResult> {
    let download = download(
        fetcher,
        &DownloadConfig {
            site: config.site.clone(),
            mirror_dir: config.mirror_dir.clone(),
            expected_version: config.expected_version.clone(),
            concurrency: config.concurrency,
        },
        progress,
    )
    .await?;

    let build = build(
        &BuildConfig {
            expected_version: Some(download.version.clone()),
            ..config.clone()
        },
        progress,
    )
    .await?;

    Ok(SyncResult { download, build })
}

// ---------------------------------------------------------------------------
// Package
// ---------------------------------------------------------------------------

/// Icon used when none is configured: the site favicon, relative to `Documents/`.
pub const DEFAULT_ICON: &str = "cdk/api/v2/img/favicon-32x32.png";

/// Configuration for [`package`].
#[derive(Debug, Clone)]
pub struct PackageConfig {
    pub docset: DocsetConfig,
    /// Directory holding `<name>.docset`; receives `<name>.tgz`.
    pub output_dir: PathBuf,
}

/// Result of [`package`].
#[derive(Debug)]
pub struct PackageResult {
    pub archive_path: PathBuf,
    /// Files and directories in the archive.
    pub members: usize,
    /// Index rows of the packaged docset.
    pub index_entries: usize,
    /// Archive size in bytes.
    pub size: u64,
}

/// Put the icon into a built docset and archive it as `<name>.tgz`.
///
/// The bundle must pass [`validate_docset`] first. The archive is replaced
/// atomically, so a failed run leaves any previous archive in place.
#[instrument(skip_all, fields(output = %config.output_dir.display(), name = %config.docset.name))]
pub async fn package(config: &PackageConfig, progress: &dyn ProgressReporter) -> Result<PackageResult> {
    let layout = DocsetLayout::new(&config.output_dir, &config.docset.name);

    progress.phase("Validating docset");
    let index_entries = validate_docset(layout.root()).await?;

    progress.phase("Adding icon");
    let icon = config
        .docset
        .icon
        .clone()
        .unwrap_or_else(|| layout.documents().join(DEFAULT_ICON));
    if !icon.is_file() {
        return Err(DocsetError::validation(format!(
            "icon {} not found",
            icon.display()
        )));
    }
    let bytes = std::fs::read(&icon).map_err(|e| DocsetError::io(&icon, e))?;
    write_atomic(&layout.icon_path(), &bytes)?;

    progress.phase("Writing archive");
    let archive_path = layout.archive_path();
    let members = {
        let bundle = layout.root().to_path_buf();
        let archive = archive_path.clone();
        tokio::task::spawn_blocking(move || write_tgz(&bundle, &archive))
            .await
            .map_err(|e| DocsetError::validation(format!("archive task failed: {e}")))??
    };
    let size = std::fs::metadata(&archive_path)
        .map_err(|e| DocsetError::io(&archive_path, e))?
        .len();

    info!(members, index_entries, size, "docset packaged");
    progress.done(&format!(
        "Packaged {} ({members} files, {index_entries} index entries)",
        archive_path.display()
    ));
    Ok(PackageResult {
        archive_path,
        members,
        index_entries,
        size,
    })
}
