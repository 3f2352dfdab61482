//! Packaging of a function source directory into a content-addressed zip archive.
//!
//! The archive is built so that its bytes depend only on the relative paths and contents of the
//! packaged files: entries are visited in sorted order, timestamps are pinned to the zip epoch
//! and permissions are fixed. The MD5 of those bytes is the artifact's identity and becomes the
//! storage key, so unchanged sources always map to the same object.

use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, error, info};
use walkdir::{DirEntry, WalkDir};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

/// Directory names never shipped with a function: local virtualenvs and bytecode caches.
pub const DEFAULT_EXCLUDES: [&str; 2] = [".venv", "__pycache__"];

/// What to archive and where to put the result.
#[derive(Debug, Clone)]
pub struct ArchiveSpec {
    pub source_dir: PathBuf,
    pub output_path: PathBuf,
    /// Names matched against every path component below `source_dir`.
    pub excludes: BTreeSet<String>,
}

impl ArchiveSpec {
    pub fn new(source_dir: impl Into<PathBuf>, output_path: impl Into<PathBuf>) -> Self {
        Self {
            source_dir: source_dir.into(),
            output_path: output_path.into(),
            excludes: DEFAULT_EXCLUDES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// One function's packaged code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceArtifact {
    pub source_dir: PathBuf,
    pub excludes: BTreeSet<String>,
    pub output_path: PathBuf,
    /// Hex MD5 of the archive bytes. Used verbatim as the storage object key.
    pub content_hash: String,
    /// Hex SHA-256 of the archive bytes, reported alongside the storage key.
    pub output_sha256: String,
    pub output_size: u64,
    pub file_count: usize,
}

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("source directory {0} does not exist")]
    MissingSourceDir(PathBuf),
    #[error("failed to walk source directory: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("{path} is not inside the source directory")]
    OutsideSource { path: PathBuf },
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

fn is_excluded(entry: &DirEntry, excludes: &BTreeSet<String>) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| excludes.contains(name))
}

/// Zip entry name for `path`: relative to `root`, always `/`-separated.
fn entry_name(root: &Path, path: &Path) -> Result<String, ArchiveError> {
    let rel = path
        .strip_prefix(root)
        .map_err(|_| ArchiveError::OutsideSource {
            path: path.to_path_buf(),
        })?;
    let segments: Vec<String> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Ok(segments.join("/"))
}

/// Builds the archive in memory. Returns the zip bytes and the number of files packed.
pub fn pack(spec: &ArchiveSpec) -> Result<(Vec<u8>, usize), ArchiveError> {
    if !spec.source_dir.is_dir() {
        error!(path = %spec.source_dir.display(), "Function source directory does not exist");
        return Err(ArchiveError::MissingSourceDir(spec.source_dir.clone()));
    }

    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(DateTime::default())
        .unix_permissions(0o644);

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let mut file_count = 0usize;

    // Symlinks are packed as their targets; entry names keep the link's own path.
    let walker = WalkDir::new(&spec.source_dir)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            let skip = is_excluded(entry, &spec.excludes);
            if skip {
                debug!(path = %entry.path().display(), "Skipping excluded path");
            }
            !skip
        });

    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let name = entry_name(&spec.source_dir, path)?;
        let content = fs::read(path).map_err(|source| {
            error!(error = ?source, path = %path.display(), "Failed to read file while archiving");
            ArchiveError::Io {
                path: path.to_path_buf(),
                source,
            }
        })?;
        writer.start_file(name.as_str(), options)?;
        writer.write_all(&content).map_err(|source| ArchiveError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(entry = %name, size = content.len(), "Packed file");
        file_count += 1;
    }

    let bytes = writer.finish()?.into_inner();
    Ok((bytes, file_count))
}

/// Hex MD5 of `bytes`.
pub fn content_hash(bytes: &[u8]) -> String {
    format!("{:x}", md5::compute(bytes))
}

/// Archives `spec.source_dir`, writes the zip to `spec.output_path` and hashes it.
pub fn package_source(spec: &ArchiveSpec) -> Result<SourceArtifact, ArchiveError> {
    info!(
        source_dir = %spec.source_dir.display(),
        output_path = %spec.output_path.display(),
        "Packaging function source"
    );
    let (bytes, file_count) = pack(spec)?;

    if let Some(parent) = spec.output_path.parent() {
        fs::create_dir_all(parent).map_err(|source| ArchiveError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    fs::write(&spec.output_path, &bytes).map_err(|source| {
        error!(error = ?source, path = %spec.output_path.display(), "Failed to write archive");
        ArchiveError::Io {
            path: spec.output_path.clone(),
            source,
        }
    })?;

    let output_sha256 = {
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        format!("{:x}", hasher.finalize())
    };
    let artifact = SourceArtifact {
        source_dir: spec.source_dir.clone(),
        excludes: spec.excludes.clone(),
        output_path: spec.output_path.clone(),
        content_hash: content_hash(&bytes),
        output_sha256,
        output_size: bytes.len() as u64,
        file_count,
    };

    info!(
        content_hash = %artifact.content_hash,
        files = artifact.file_count,
        size = artifact.output_size,
        "Packaged function source"
    );
    Ok(artifact)
}
