//! Remote ZIP archive helper
//!
//! Election results are published as ZIP archives. The archive is fetched
//! with a blocking HTTP request into a temporary directory and its files are
//! extracted flat into the raw-data directory. Archives are fetched on every
//! load unless reuse of an extracted file is requested. Failed downloads are
//! not retried.

use crate::error::{Result, RuntimeError};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Download `url`, extract it into `raw_dir` and return `raw_dir/file_name`.
///
/// The archive is fetched on every call unless `reuse_existing` is set and
/// the file was already extracted.
pub fn fetch_archive_file(url: &str, raw_dir: &Path, file_name: &str, reuse_existing: bool) -> Result<PathBuf> {
    let target = raw_dir.join(file_name);
    if reuse_existing && target.is_file() {
        info!("Reusing extracted file {}", target.display());
        return Ok(target);
    }

    let temp_dir = tempfile::tempdir()?;
    let archive_path = temp_dir.path().join("archive.zip");
    download(url, &archive_path)?;
    extract_archive(&archive_path, raw_dir)?;

    if !target.is_file() {
        return Err(RuntimeError::Io(io::Error::new(
            io::ErrorKind::NotFound,
            format!("{} is not part of the archive at {}", file_name, url),
        )));
    }
    debug!("Using extracted file {}", target.display());
    Ok(target)
}

/// Fetch `url` into `path`
pub fn download(url: &str, path: &Path) -> Result<()> {
    info!("Downloading {}", url);
    let to_error = |source| RuntimeError::Download {
        url: url.to_string(),
        source,
    };

    let bytes = reqwest::blocking::get(url)
        .and_then(|response| response.error_for_status())
        .and_then(|response| response.bytes())
        .map_err(to_error)?;

    fs::write(path, &bytes)?;
    debug!("Saved {} bytes to {}", bytes.len(), path.display());
    Ok(())
}

/// Extract every file of the archive directly into `dest`, dropping the
/// directory structure. Returns the written paths in archive order.
pub fn extract_archive(archive_path: &Path, dest: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dest)?;
    let mut archive = zip::ZipArchive::new(File::open(archive_path)?)?;

    let mut extracted = Vec::new();
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        if entry.is_dir() {
            continue;
        }

        let Some(file_name) = entry
            .enclosed_name()
            .and_then(|p| p.file_name().map(|n| n.to_os_string()))
        else {
            warn!("Skipping archive entry with unsafe path: {}", entry.name());
            continue;
        };

        let out_path = dest.join(file_name);
        let mut out = File::create(&out_path)?;
        io::copy(&mut entry, &mut out)?;
        extracted.push(out_path);
    }

    info!(
        "Extracted {} file(s) from {} into {}",
        extracted.len(),
        archive_path.display(),
        dest.display()
    );
    Ok(extracted)
}
