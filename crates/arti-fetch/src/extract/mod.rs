//! Safe tar.gz extraction.
//!
//! Entry paths are validated before anything touches the filesystem:
//! parent-directory components and absolute paths are rejected so a
//! hostile archive cannot write outside the destination. Links and
//! special entries are skipped; source archives carry only files and
//! directories.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use flate2::read::GzDecoder;
use tar::{Archive, EntryType};

use arti_core::{ArtiError, ArtiResult};

/// Unpack the gzipped tarball at `archive` into `dest_dir`.
pub fn extract_archive(archive: &Path, dest_dir: &Path) -> ArtiResult<()> {
    let fail = |message: String| ArtiError::Extraction {
        archive: archive.display().to_string(),
        message,
    };

    let file = fs::File::open(archive).map_err(|e| fail(format!("cannot open archive: {e}")))?;
    let mut tar = Archive::new(GzDecoder::new(file));

    fs::create_dir_all(dest_dir).map_err(|e| fail(e.to_string()))?;

    for entry in tar.entries().map_err(|e| fail(e.to_string()))? {
        let mut entry = entry.map_err(|e| fail(e.to_string()))?;
        let entry_path = entry.path().map_err(|e| fail(e.to_string()))?.into_owned();
        let target = resolve_entry_path(&entry_path, dest_dir).map_err(&fail)?;

        match entry.header().entry_type() {
            EntryType::Directory => {
                fs::create_dir_all(&target).map_err(|e| fail(e.to_string()))?;
            }
            EntryType::Regular => {
                if let Some(parent) = target.parent() {
                    fs::create_dir_all(parent).map_err(|e| fail(e.to_string()))?;
                }
                let mut out = fs::File::create(&target).map_err(|e| fail(e.to_string()))?;
                io::copy(&mut entry, &mut out).map_err(|e| fail(e.to_string()))?;

                #[cfg(unix)]
                {
                    use std::os::unix::fs::PermissionsExt;
                    if let Ok(mode) = entry.header().mode() {
                        let _ = fs::set_permissions(&target, fs::Permissions::from_mode(mode));
                    }
                }
            }
            _ => continue,
        }
    }

    Ok(())
}

/// Rebuild an entry path under `dest_dir`, rejecting components that
/// would land outside it.
fn resolve_entry_path(entry_path: &Path, dest_dir: &Path) -> Result<PathBuf, String> {
    let mut resolved = dest_dir.to_path_buf();
    for component in entry_path.components() {
        match component {
            Component::Normal(name) => resolved.push(name),
            Component::CurDir => {}
            Component::ParentDir => {
                return Err(format!(
                    "entry '{}' escapes the destination directory",
                    entry_path.display()
                ));
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(format!(
                    "entry '{}' uses an absolute path",
                    entry_path.display()
                ));
            }
        }
    }
    Ok(resolved)
}
