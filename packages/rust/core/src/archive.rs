//! Packaging a docset bundle as a gzipped tarball.
//!
//! Members are named `<Name>.docset/...`, so the archive unpacks to the bundle
//! directory itself. Entries are added in sorted order with normalized
//! headers, which keeps the archive identical across runs over the same tree.

use std::fs::File;
use std::path::Path;

use flate2::Compression;
use flate2::write::GzEncoder;
use tar::{Builder, HeaderMode};
use tracing::{debug, instrument};

use cdkdocset_shared::{DocsetError, Result, write_atomic_with};

/// Write `bundle` to `archive` as a `.tgz`. Returns the number of members.
///
/// Dotfiles are left out; they are leftovers of interrupted atomic writes.
#[instrument(skip_all, fields(bundle = %bundle.display(), archive = %archive.display()))]
pub fn write_tgz(bundle: &Path, archive: &Path) -> Result<usize> {
    let top = bundle
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| DocsetError::validation(format!("{} has no name", bundle.display())))?;

    let mut members = 0;
    write_atomic_with(archive, |temp| {
        let file = File::create(temp).map_err(|e| DocsetError::io(temp, e))?;
        let mut builder = Builder::new(GzEncoder::new(file, Compression::default()));
        builder.mode(HeaderMode::Deterministic);

        builder
            .append_dir(&top, bundle)
            .map_err(|e| DocsetError::io(bundle, e))?;
        members = 1 + append_tree(&mut builder, bundle, &top)?;

        let encoder = builder.into_inner().map_err(|e| DocsetError::io(temp, e))?;
        encoder.finish().map_err(|e| DocsetError::io(temp, e))?;
        Ok(())
    })?;

    debug!(members, "archive written");
    Ok(members)
}

fn append_tree(builder: &mut Builder<GzEncoder<File>>, dir: &Path, prefix: &str) -> Result<usize> {
    let mut entries = std::fs::read_dir(dir)
        .map_err(|e| DocsetError::io(dir, e))?
        .collect::<std::io::Result<Vec<_>>>()
        .map_err(|e| DocsetError::io(dir, e))?;
    entries.sort_by_key(|e| e.file_name());

    let mut added = 0;
    for entry in entries {
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') {
            continue;
        }
        let path = entry.path();
        let member = format!("{prefix}/{name}");

        if path.is_dir() {
            builder
                .append_dir(&member, &path)
                .map_err(|e| DocsetError::io(&path, e))?;
            added += 1 + append_tree(builder, &path, &member)?;
        } else {
            builder
                .append_path_with_name(&path, &member)
                .map_err(|e| DocsetError::io(&path, e))?;
            added += 1;
        }
    }
    Ok(added)
}
