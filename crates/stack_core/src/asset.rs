use common::error::DiagnosticMessage;
use log::debug;
use sha2::{Digest, Sha256};
use std::fs;
use std::io::{self, Seek, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;
use walkdir::WalkDir;
use zip::result::ZipError;
use zip::write::FileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

pub const ASSETS_DIR: &str = "assets";

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("asset source missing: {context}")]
    MissingSource { context: DiagnosticMessage },
    #[error("asset source is empty: {context}")]
    EmptySource { context: DiagnosticMessage },
    #[error("unsupported file name in asset source: {context}")]
    InvalidPath { context: DiagnosticMessage },
    #[error("asset source changed since it was hashed: {context}")]
    SourceChanged { context: DiagnosticMessage },
    #[error("failed to walk asset source: {context}")]
    Walk {
        context: DiagnosticMessage,
        #[source]
        source: walkdir::Error,
    },
    #[error("asset I/O error: {context}")]
    Io {
        context: DiagnosticMessage,
        #[source]
        source: io::Error,
    },
    #[error("failed to write archive: {context}")]
    Zip {
        context: DiagnosticMessage,
        #[source]
        source: ZipError,
    },
}

impl AssetError {
    #[track_caller]
    pub fn missing_source(path: &Path) -> Self {
        Self::MissingSource {
            context: DiagnosticMessage::new(format!("'{}' is not a directory", path.display())),
        }
    }

    #[track_caller]
    pub fn empty_source(path: &Path) -> Self {
        Self::EmptySource {
            context: DiagnosticMessage::new(format!("'{}' contains no files", path.display())),
        }
    }

    #[track_caller]
    pub fn invalid_path(path: &Path) -> Self {
        Self::InvalidPath {
            context: DiagnosticMessage::new(format!(
                "'{}' is not valid UTF-8; archive entry names must be",
                path.display()
            )),
        }
    }

    #[track_caller]
    pub fn source_changed(dir: &Path, expected: &str, found: &str) -> Self {
        Self::SourceChanged {
            context: DiagnosticMessage::for_subject(
                dir.display().to_string(),
                format!("hashed as {expected} but packaged as {found}; rebuild the stack"),
            ),
        }
    }
}

impl From<io::Error> for AssetError {
    #[track_caller]
    fn from(err: io::Error) -> Self {
        Self::Io {
            context: DiagnosticMessage::new(err.to_string()),
            source: err,
        }
    }
}

impl From<walkdir::Error> for AssetError {
    #[track_caller]
    fn from(err: walkdir::Error) -> Self {
        Self::Walk {
            context: DiagnosticMessage::new(err.to_string()),
            source: err,
        }
    }
}

impl From<ZipError> for AssetError {
    #[track_caller]
    fn from(err: ZipError) -> Self {
        Self::Zip {
            context: DiagnosticMessage::new(err.to_string()),
            source: err,
        }
    }
}

/// A function source directory, identified by the hash of its content.
///
/// The hash covers every file's relative path and bytes, so renaming a file
/// or changing a single byte yields a new hash and therefore a new object
/// name, which is what makes the engine redeploy the function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionAsset {
    pub id: String,
    pub source_dir: PathBuf,
    pub hash: String,
    /// Relative `/`-separated paths, sorted.
    pub files: Vec<String>,
}

impl FunctionAsset {
    pub fn from_dir(id: impl Into<String>, source_dir: impl AsRef<Path>) -> Result<Self, AssetError> {
        let source_dir = source_dir.as_ref();
        let files = list_files(source_dir)?;
        let hash = hash_files(source_dir, &files)?;
        let id = id.into();
        debug!("asset {id} from {} hashed to {hash}", source_dir.display());
        Ok(Self {
            id,
            source_dir: source_dir.to_path_buf(),
            hash,
            files,
        })
    }

    /// Bucket object name, `<hash>.zip`.
    pub fn object_name(&self) -> String {
        format!("{}.zip", self.hash)
    }

    /// Archive location relative to the synth output directory.
    pub fn relative_archive_path(&self) -> String {
        format!("{ASSETS_DIR}/{}/{}", self.id, self.object_name())
    }

    pub fn archive_dir(&self, out_dir: &Path) -> PathBuf {
        out_dir.join(ASSETS_DIR).join(&self.id)
    }

    pub fn archive_path(&self, out_dir: &Path) -> PathBuf {
        self.archive_dir(out_dir).join(self.object_name())
    }

    /// Write the archive under `out_dir` unless it already exists. Returns
    /// whether a new archive was written.
    ///
    /// The archive is staged in a temporary file and only renamed to
    /// `<hash>.zip` once complete and once the packaged bytes hash to
    /// [`FunctionAsset::hash`], so an existing archive always matches its name.
    pub fn package(&self, out_dir: &Path) -> Result<bool, AssetError> {
        let archive = self.archive_path(out_dir);
        if archive.exists() {
            debug!("archive {} already present", archive.display());
            return Ok(false);
        }
        let dir = self.archive_dir(out_dir);
        fs::create_dir_all(&dir)?;

        // Same directory as the target, so the rename cannot cross filesystems.
        let staged = NamedTempFile::new_in(&dir)?;
        let packaged = package_zip(&self.source_dir, &self.files, staged.as_file())?;
        if packaged != self.hash {
            return Err(AssetError::source_changed(&self.source_dir, &self.hash, &packaged));
        }
        staged.persist(&archive).map_err(|e| AssetError::from(e.error))?;
        debug!("wrote {} ({} entries)", archive.display(), self.files.len());
        Ok(true)
    }
}

/// Hex SHA-256 digest of a directory tree.
pub fn hash_directory(dir: &Path) -> Result<String, AssetError> {
    let files = list_files(dir)?;
    hash_files(dir, &files)
}

fn list_files(dir: &Path) -> Result<Vec<String>, AssetError> {
    if !dir.is_dir() {
        return Err(AssetError::missing_source(dir));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir).follow_links(true) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = entry
            .path()
            .strip_prefix(dir)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        let components = rel
            .components()
            .map(|c| c.as_os_str().to_str())
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| AssetError::invalid_path(entry.path()))?;
        files.push(components.join("/"));
    }
    // Sort on the normalised path so the order does not depend on the
    // platform's separator.
    files.sort();

    if files.is_empty() {
        return Err(AssetError::empty_source(dir));
    }
    Ok(files)
}

fn hash_entry(hasher: &mut Sha256, rel: &str, contents: &[u8]) {
    hasher.update(rel.as_bytes());
    hasher.update([0u8]);
    hasher.update((contents.len() as u64).to_le_bytes());
    hasher.update(contents);
}

fn hash_files(dir: &Path, files: &[String]) -> Result<String, AssetError> {
    let mut hasher = Sha256::new();
    for rel in files {
        let contents = fs::read(dir.join(rel))?;
        hash_entry(&mut hasher, rel, &contents);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

/// Deflated archive of `files` (relative to `dir`), in the given order and
/// with fixed timestamps so identical input gives identical bytes. Returns
/// the content hash of exactly what was archived.
pub fn package_zip<W: Write + Seek>(
    dir: &Path,
    files: &[String],
    writer: W,
) -> Result<String, AssetError> {
    let mut zip = ZipWriter::new(writer);
    let options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(DateTime::default())
        .unix_permissions(0o644);

    let mut hasher = Sha256::new();
    for rel in files {
        let contents = fs::read(dir.join(rel))?;
        hash_entry(&mut hasher, rel, &contents);
        zip.start_file(rel.as_str(), options)?;
        zip.write_all(&contents)?;
    }
    zip.finish()?;
    Ok(format!("{:x}", hasher.finalize()))
}
