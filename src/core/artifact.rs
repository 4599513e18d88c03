//! Artifact download and archive extraction.

use std::collections::BTreeSet;
use std::fs;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Download a binary archive. Any non-2xx response or transport failure
/// is a download error; the body is never interpreted here.
pub fn download(
    client: &reqwest::blocking::Client,
    url: &str,
    headers: &[(String, String)],
) -> Result<Vec<u8>> {
    let mut request = client.get(url);
    for (name, value) in headers {
        request = request.header(name.as_str(), value.as_str());
    }

    let response = request
        .send()
        .map_err(|e| Error::artifact_download_failed(url, None, Some(e.to_string())))?;

    let status = response.status();
    if !status.is_success() {
        return Err(Error::artifact_download_failed(
            url,
            Some(status.as_u16()),
            None,
        ));
    }

    let bytes = response
        .bytes()
        .map_err(|e| Error::artifact_download_failed(url, None, Some(e.to_string())))?;

    log_status!("fetch", "Downloaded {} bytes from {}", bytes.len(), url);
    Ok(bytes.to_vec())
}

/// Extract a zip archive into `dest_dir`, overwriting existing files.
///
/// Re-extracting the same archive into the same directory yields the same
/// file set. Entries whose names escape `dest_dir` are skipped. Returns
/// the extracted paths relative to `dest_dir`.
pub fn extract(archive_bytes: &[u8], dest_dir: &Path) -> Result<BTreeSet<PathBuf>> {
    let mut archive = zip::ZipArchive::new(Cursor::new(archive_bytes))
        .map_err(|e| Error::artifact_corrupt_archive(e.to_string()))?;

    fs::create_dir_all(dest_dir)
        .map_err(|e| Error::artifact_filesystem(dest_dir.display().to_string(), e.to_string()))?;

    let mut extracted = BTreeSet::new();

    for index in 0..archive.len() {
        let mut entry = archive
            .by_index(index)
            .map_err(|e| Error::artifact_corrupt_archive(e.to_string()))?;

        let relative = match entry.enclosed_name() {
            Some(name) => name.to_path_buf(),
            None => {
                log_status!("fetch", "Skipping unsafe archive entry: {}", entry.name());
                continue;
            }
        };

        let target = dest_dir.join(&relative);

        if entry.is_dir() {
            fs::create_dir_all(&target).map_err(|e| {
                Error::artifact_filesystem(target.display().to_string(), e.to_string())
            })?;
            continue;
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                Error::artifact_filesystem(parent.display().to_string(), e.to_string())
            })?;
        }

        let mut contents = Vec::with_capacity(entry.size() as usize);
        entry
            .read_to_end(&mut contents)
            .map_err(|e| Error::artifact_corrupt_archive(e.to_string()))?;

        fs::write(&target, &contents)
            .map_err(|e| Error::artifact_filesystem(target.display().to_string(), e.to_string()))?;

        extracted.insert(relative);
    }

    log_status!(
        "fetch",
        "Extracted {} files into {}",
        extracted.len(),
        dest_dir.display()
    );

    Ok(extracted)
}
