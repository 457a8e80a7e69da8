//! Docset bundle layout on disk.
//!
//! ```text
//! <output_dir>/
//! ├── meta.json
//! ├── <Name>.tgz              (written by packaging)
//! └── <Name>.docset/
//!     ├── icon.png            (written by packaging)
//!     └── Contents/
//!         ├── Info.plist
//!         └── Resources/
//!             ├── docSet.dsidx
//!             └── Documents/
//!                 └── cdk/api/v2/...
//! ```

use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};

use cdkdocset_shared::{DocsetConfig, DocsetError, DocsetMeta, Result, write_atomic};
use cdkdocset_storage::IndexStore;

/// Paths inside one docset bundle.
#[derive(Debug, Clone)]
pub struct DocsetLayout {
    root: PathBuf,
}

impl DocsetLayout {
    /// Layout of `<output_dir>/<name>.docset`.
    pub fn new(output_dir: &Path, name: &str) -> Self {
        Self {
            root: output_dir.join(format!("{name}.docset")),
        }
    }

    /// Layout of an existing bundle directory.
    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn info_plist(&self) -> PathBuf {
        self.root.join("Contents").join("Info.plist")
    }

    pub fn resources(&self) -> PathBuf {
        self.root.join("Contents").join("Resources")
    }

    /// The lookup index (`docSet.dsidx`).
    pub fn index_path(&self) -> PathBuf {
        self.resources().join("docSet.dsidx")
    }

    /// Root of the mirrored, cleaned pages.
    pub fn documents(&self) -> PathBuf {
        self.resources().join("Documents")
    }

    /// Bundle icon shown by the browser.
    pub fn icon_path(&self) -> PathBuf {
        self.root.join("icon.png")
    }

    /// `<Name>.tgz`, a sibling of the bundle directory.
    pub fn archive_path(&self) -> PathBuf {
        self.root.with_extension("tgz")
    }

    /// `meta.json`, a sibling of the bundle directory.
    pub fn meta_path(&self) -> PathBuf {
        self.root.with_file_name("meta.json")
    }

    /// Create the bundle directory structure.
    pub fn create_dirs(&self) -> Result<()> {
        let documents = self.documents();
        std::fs::create_dir_all(&documents).map_err(|e| DocsetError::io(&documents, e))?;
        debug!(path = %self.root.display(), "directory structure created");
        Ok(())
    }

    /// Write `Info.plist` unless it already exists. Returns whether it was written.
    ///
    /// `index_page` is the page the browser opens first, relative to `Documents/`.
    pub fn write_info_plist(&self, docset: &DocsetConfig, index_page: &str) -> Result<bool> {
        let path = self.info_plist();
        if path.exists() {
            debug!(path = %path.display(), "Info.plist already present");
            return Ok(false);
        }

        write_atomic(&path, info_plist(docset, index_page).as_bytes())?;
        debug!(path = %path.display(), "wrote Info.plist");
        Ok(true)
    }

    /// Write `meta.json` (pretty-printed).
    pub fn write_meta(&self, meta: &DocsetMeta) -> Result<()> {
        let path = self.meta_path();
        let json = serde_json::to_string_pretty(meta)
            .map_err(|e| DocsetError::validation(format!("JSON serialization failed: {e}")))?;
        write_atomic(&path, json.as_bytes())?;
        debug!(path = %path.display(), "wrote meta.json");
        Ok(())
    }
}

fn info_plist(docset: &DocsetConfig, index_page: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<dict>
	<key>CFBundleIdentifier</key>
	<string>{}</string>
	<key>CFBundleName</key>
	<string>{}</string>
	<key>DocSetPlatformFamily</key>
	<string>{}</string>
	<key>isDashDocset</key>
	<true/>
	<key>DashDocSetFamily</key>
	<string>dashtoc</string>
	<key>dashIndexFilePath</key>
	<string>{}</string>
</dict>
</plist>
"#,
        xml_escape(&docset.bundle_id),
        xml_escape(&docset.name),
        xml_escape(&docset.platform_family),
        xml_escape(index_page),
    )
}

fn xml_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

/// Verify that a docset bundle is well-formed. Returns the number of index rows.
#[instrument(skip_all, fields(path = %path.display()))]
pub async fn validate_docset(path: &Path) -> Result<usize> {
    let layout = DocsetLayout::at(path);

    for (required, label) in [
        (layout.info_plist(), "Contents/Info.plist"),
        (layout.index_path(), "Contents/Resources/docSet.dsidx"),
        (layout.documents(), "Contents/Resources/Documents"),
    ] {
        if !required.exists() {
            return Err(DocsetError::validation(format!(
                "{} is missing {label}",
                path.display()
            )));
        }
    }

    let store = IndexStore::open_readonly(&layout.index_path()).await?;
    let entries = store.count_entries().await?;
    if entries == 0 {
        return Err(DocsetError::validation(format!(
            "{} has an empty index",
            path.display()
        )));
    }

    info!(entries, "docset is valid");
    Ok(entries)
}
