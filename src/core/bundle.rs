//! Diagnostic bundling: collect result files into a single archive.
//!
//! `BundleFinalizer` is the pipeline's guaranteed final step. Whichever way
//! the pipeline exits, the bundle gets written, so partial logs survive
//! failed runs.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{Error, Result};

/// One file captured for the bundle.
#[derive(Debug, Clone)]
pub struct BundleEntry {
    pub name: String,
    pub contents: Vec<u8>,
}

/// Snapshot of every matching result file at bundling time.
#[derive(Debug, Clone, Default)]
pub struct ArtifactBundle {
    pub entries: Vec<BundleEntry>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleSummary {
    pub path: String,
    pub entries: Vec<String>,
}

/// Compile a result-file suffix into a filename pattern. A plain suffix
/// like `.log` becomes `*.log`; anything already containing glob
/// metacharacters is used as-is.
fn suffix_pattern(suffix: &str) -> Result<glob::Pattern> {
    const GLOB_META: &[char] = &['*', '?', '['];

    let source = if suffix.contains(GLOB_META) {
        suffix.to_string()
    } else {
        format!("*{}", suffix)
    };

    glob::Pattern::new(&source).map_err(|e| {
        Error::validation_invalid_argument(
            "suffix",
            format!("Invalid result-file pattern '{}': {}", suffix, e),
            Some(suffix.to_string()),
        )
    })
}

/// Scan the top level of `working_dir` for files whose names end in one of
/// `suffixes` and capture their contents. Entry order is sorted by name so
/// repeated scans of the same directory produce the same bundle.
pub fn scan(working_dir: &Path, suffixes: &[String]) -> Result<ArtifactBundle> {
    let patterns = suffixes
        .iter()
        .map(|s| suffix_pattern(s))
        .collect::<Result<Vec<_>>>()?;

    let read_dir = fs::read_dir(working_dir)
        .map_err(|e| Error::bundle_write_failed(working_dir.display().to_string(), e.to_string()))?;

    let mut names: Vec<String> = Vec::new();
    for dir_entry in read_dir {
        let dir_entry = dir_entry.map_err(|e| {
            Error::bundle_write_failed(working_dir.display().to_string(), e.to_string())
        })?;
        if !dir_entry.path().is_file() {
            continue;
        }
        let name = dir_entry.file_name().to_string_lossy().to_string();
        if patterns.iter().any(|pattern| pattern.matches(&name)) {
            names.push(name);
        }
    }
    names.sort();

    let mut entries = Vec::with_capacity(names.len());
    for name in names {
        let path = working_dir.join(&name);
        let contents = fs::read(&path)
            .map_err(|e| Error::bundle_write_failed(path.display().to_string(), e.to_string()))?;
        entries.push(BundleEntry { name, contents });
    }

    Ok(ArtifactBundle { entries })
}

/// Write a bundle as a zip archive at `path`.
pub fn write(bundle: &ArtifactBundle, path: &Path) -> Result<()> {
    let file = fs::File::create(path)
        .map_err(|e| Error::bundle_write_failed(path.display().to_string(), e.to_string()))?;

    let mut writer = zip::ZipWriter::new(file);
    let options = zip::write::FileOptions::default();

    for entry in &bundle.entries {
        writer
            .start_file(entry.name.as_str(), options)
            .map_err(|e| Error::bundle_write_failed(path.display().to_string(), e.to_string()))?;
        writer
            .write_all(&entry.contents)
            .map_err(|e| Error::bundle_write_failed(path.display().to_string(), e.to_string()))?;
    }

    writer
        .finish()
        .map_err(|e| Error::bundle_write_failed(path.display().to_string(), e.to_string()))?;

    Ok(())
}

/// Guard that bundles the working directory exactly once per pipeline run.
///
/// The pipeline calls `finish()` on its normal exit paths to capture the
/// summary; if the guard is instead dropped while still armed (early
/// return, panic), `Drop` performs the same bundling and logs any failure
/// rather than letting it mask whatever is already propagating.
pub struct BundleFinalizer {
    working_dir: PathBuf,
    suffixes: Vec<String>,
    output_name: String,
    armed: bool,
}

impl BundleFinalizer {
    pub fn new(working_dir: &Path, suffixes: &[String], output_name: &str) -> Self {
        Self {
            working_dir: working_dir.to_path_buf(),
            suffixes: suffixes.to_vec(),
            output_name: output_name.to_string(),
            armed: true,
        }
    }

    fn output_path(&self) -> PathBuf {
        self.working_dir.join(&self.output_name)
    }

    fn bundle_once(&mut self) -> Result<BundleSummary> {
        self.armed = false;

        let bundle = scan(&self.working_dir, &self.suffixes)?;
        let path = self.output_path();
        write(&bundle, &path)?;

        log_status!(
            "bundle",
            "Wrote {} files to {}",
            bundle.entries.len(),
            path.display()
        );

        Ok(BundleSummary {
            path: path.display().to_string(),
            entries: bundle.entries.into_iter().map(|e| e.name).collect(),
        })
    }

    /// Bundle now and disarm the guard.
    pub fn finish(mut self) -> Result<BundleSummary> {
        self.bundle_once()
    }
}

impl Drop for BundleFinalizer {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if let Err(err) = self.bundle_once() {
            log_status!("bundle", "Bundling failed during cleanup: {}", err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn suffixes() -> Vec<String> {
        vec![".log".to_string(), ".xml".to_string()]
    }

    fn read_zip_names(path: &Path) -> Vec<String> {
        let file = fs::File::open(path).unwrap();
        let archive = zip::ZipArchive::new(file).unwrap();
        archive.file_names().map(|n| n.to_string()).collect()
    }

    #[test]
    fn scan_matches_only_configured_suffixes() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("editor.log"), b"log").unwrap();
        fs::write(dir.path().join("results.xml"), b"xml").unwrap();
        fs::write(dir.path().join("build.zip"), b"zip").unwrap();
        fs::create_dir(dir.path().join("nested.log")).unwrap();

        let bundle = scan(dir.path(), &suffixes()).unwrap();

        let names: Vec<&str> = bundle.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["editor.log", "results.xml"]);
    }

    #[test]
    fn scan_accepts_explicit_glob_patterns() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("results-ios.xml"), b"a").unwrap();
        fs::write(dir.path().join("results-android.xml"), b"b").unwrap();
        fs::write(dir.path().join("summary.xml"), b"c").unwrap();

        let bundle = scan(dir.path(), &vec!["results-*.xml".to_string()]).unwrap();

        let names: Vec<&str> = bundle.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["results-android.xml", "results-ios.xml"]);
    }

    #[test]
    fn invalid_pattern_is_rejected() {
        let dir = TempDir::new().unwrap();
        assert!(scan(dir.path(), &vec!["[".to_string()]).is_err());
    }

    #[test]
    fn scan_is_a_snapshot_of_contents() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("editor.log"), b"before").unwrap();

        let bundle = scan(dir.path(), &suffixes()).unwrap();
        fs::write(dir.path().join("editor.log"), b"after").unwrap();

        assert_eq!(bundle.entries[0].contents, b"before");
    }

    #[test]
    fn write_then_reopen_lists_entries() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.log"), b"a").unwrap();
        fs::write(dir.path().join("b.xml"), b"b").unwrap();

        let bundle = scan(dir.path(), &suffixes()).unwrap();
        let out = dir.path().join("artifacts.zip");
        write(&bundle, &out).unwrap();

        let mut names = read_zip_names(&out);
        names.sort();
        assert_eq!(names, vec!["a.log", "b.xml"]);
    }

    #[test]
    fn finish_returns_summary_and_writes_archive() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("editor.log"), b"log").unwrap();

        let finalizer = BundleFinalizer::new(dir.path(), &suffixes(), "artifacts.zip");
        let summary = finalizer.finish().unwrap();

        assert_eq!(summary.entries, vec!["editor.log"]);
        assert!(dir.path().join("artifacts.zip").exists());
    }

    #[test]
    fn drop_while_armed_still_writes_archive() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("editor.log"), b"log").unwrap();

        {
            let _finalizer = BundleFinalizer::new(dir.path(), &suffixes(), "artifacts.zip");
            // Dropped without finish(), as when a stage error propagates.
        }

        assert_eq!(read_zip_names(&dir.path().join("artifacts.zip")), vec![
            "editor.log"
        ]);
    }

    #[test]
    fn finished_guard_does_not_bundle_twice() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("editor.log"), b"log").unwrap();

        // Suffixes that would match the output archive itself: a second
        // bundling pass at drop time would capture artifacts.zip.
        let greedy = vec![".log".to_string(), ".zip".to_string()];
        let finalizer = BundleFinalizer::new(dir.path(), &greedy, "artifacts.zip");
        finalizer.finish().unwrap();

        let names = read_zip_names(&dir.path().join("artifacts.zip"));
        assert_eq!(names, vec!["editor.log"]);
    }

    #[test]
    fn empty_match_set_still_writes_an_archive() {
        let dir = TempDir::new().unwrap();

        let finalizer = BundleFinalizer::new(dir.path(), &suffixes(), "artifacts.zip");
        let summary = finalizer.finish().unwrap();

        assert!(summary.entries.is_empty());
        assert!(dir.path().join("artifacts.zip").exists());
    }
}
