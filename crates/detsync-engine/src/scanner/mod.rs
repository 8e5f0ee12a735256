//! File repository scanner. Walks a directory tree, loads every detector
//! file, and stamps each record with its identity, ownership tags and
//! modification time.
//!
//! The scan is all-or-nothing: the first unreadable or invalid file aborts
//! it.

use std::collections::BTreeMap;
use std::path::{Component, Path};

use chrono::{DateTime, Utc};
use detsync_core::constants::DEFAULT_EXTENSIONS;
use detsync_core::errors::ScanError;
use detsync_core::types::{is_ownership_tag, ownership_tags, provenance_tag};
use detsync_core::Detector;
use walkdir::WalkDir;

use crate::loader;

/// What to pick up and how to tag it.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Recognized file extensions, without the dot.
    pub extensions: Vec<String>,
    /// Scope of the run; adds a `scope:<scope>` tag to every record.
    pub scope: Option<String>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            scope: None,
        }
    }
}

/// Loads detectors from a directory tree.
#[derive(Debug, Clone)]
pub struct FileScanner {
    options: ScanOptions,
    tags: Vec<String>,
}

impl FileScanner {
    pub fn new(options: ScanOptions) -> Self {
        let tags = ownership_tags(options.scope.as_deref());
        Self { options, tags }
    }

    /// Default file filter: a recognized extension and not a dotfile.
    pub fn is_detector_file(&self, file_name: &str) -> bool {
        !file_name.starts_with('.')
            && self
                .options
                .extensions
                .iter()
                .any(|ext| file_name.ends_with(&format!(".{ext}")))
    }

    /// Scan `base_path` with the default file filter.
    pub fn scan(&self, base_path: &Path) -> Result<BTreeMap<String, Detector>, ScanError> {
        self.scan_with(base_path, |name| self.is_detector_file(name))
    }

    /// Scan `base_path`, loading every file whose name satisfies `predicate`.
    /// Non UTF-8 names are matched in their lossy form; a matching file whose
    /// path is not UTF-8 fails the scan.
    ///
    /// Returns the detectors keyed by identity, the `/`-separated path
    /// relative to `base_path`.
    pub fn scan_with<P>(
        &self,
        base_path: &Path,
        predicate: P,
    ) -> Result<BTreeMap<String, Detector>, ScanError>
    where
        P: Fn(&str) -> bool,
    {
        let metadata = std::fs::metadata(base_path).map_err(|source| ScanError::Io {
            path: base_path.to_path_buf(),
            source,
        })?;
        if !metadata.is_dir() {
            return Err(ScanError::NotADirectory {
                path: base_path.to_path_buf(),
            });
        }
        tracing::info!(base = %base_path.display(), "loading detectors");

        let mut detectors = BTreeMap::new();
        let walker = WalkDir::new(base_path)
            .min_depth(1)
            .follow_links(false)
            .sort_by_file_name();

        for entry in walker {
            let entry = entry.map_err(|e| ScanError::Io {
                path: e
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| base_path.to_path_buf()),
                source: e.into(),
            })?;

            let is_file = entry.file_type().is_file()
                || (entry.path_is_symlink() && entry.path().is_file());
            if !is_file {
                continue;
            }
            if !predicate(&entry.file_name().to_string_lossy()) {
                continue;
            }
            let identity =
                identity_for(base_path, entry.path()).ok_or_else(|| ScanError::NonUtf8Path {
                    path: entry.path().to_path_buf(),
                })?;

            let detector = self.load_file(entry.path(), &identity)?;
            detectors.insert(identity, detector);
        }

        tracing::info!(
            count = detectors.len(),
            base = %base_path.display(),
            "loaded detector(s)"
        );
        Ok(detectors)
    }

    fn load_file(&self, path: &Path, identity: &str) -> Result<Detector, ScanError> {
        let io_err = |source| ScanError::Io {
            path: path.to_path_buf(),
            source,
        };
        let contents = std::fs::read_to_string(path).map_err(io_err)?;
        let modified = std::fs::metadata(path)
            .and_then(|m| m.modified())
            .map_err(io_err)?;

        let mut detector = loader::load(identity, &contents)?;
        let declared = detector.tags.len();
        detector.tags.retain(|tag| !is_ownership_tag(tag));
        if detector.tags.len() < declared {
            tracing::warn!(
                identity,
                dropped = declared - detector.tags.len(),
                "ignoring ownership tags declared in the file"
            );
        }
        detector.last_updated = DateTime::<Utc>::from(modified).timestamp_millis();
        for tag in &self.tags {
            detector.add_tag(tag.as_str());
        }
        detector.add_tag(provenance_tag(identity));
        Ok(detector)
    }
}

/// The `/`-separated path of `path` relative to `base`, or `None` if it is
/// not under `base` or is not valid UTF-8.
pub fn identity_for(base: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(base).ok()?;
    let parts = relative
        .components()
        .map(|c| match c {
            Component::Normal(part) => part.to_str(),
            _ => None,
        })
        .collect::<Option<Vec<&str>>>()?;
    if parts.is_empty() {
        return None;
    }
    Some(parts.join("/"))
}
