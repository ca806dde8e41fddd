use std::ffi::OsStr;
use std::io;
use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, info, warn};

use crate::model::{ContextDocument, assemble_context};

/// A single file that could not be turned into a `ContextDocument`.
/// Never fatal: the loader records it and moves on.
#[derive(Debug, thiserror::Error)]
pub enum ContextLoadError {
    #[error("failed to list context directory `{}`: {source}", path.display())]
    ListDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to read context file `{}`: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("context file `{}` is not valid UTF-8 text", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: std::string::FromUtf8Error,
    },
}

/// Outcome of one directory scan: everything that loaded plus everything
/// that was skipped.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub documents: Vec<ContextDocument>,
    pub failures: Vec<ContextLoadError>,
}

impl LoadReport {
    pub fn context(&self) -> String {
        assemble_context(&self.documents)
    }
}

/// Scan `directory` (non-recursive) for files ending in `.{extension}` and
/// read each one as UTF-8 text.
///
/// Files come back in directory-listing order, which is filesystem dependent.
/// A missing directory yields an empty report.
pub async fn load_documents(directory: &Path, extension: &str) -> LoadReport {
    let mut report = LoadReport::default();

    let mut entries = match fs::read_dir(directory).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            warn!(directory = %directory.display(), "context directory not found; continuing with empty context");
            return report;
        }
        Err(e) => {
            let err = ContextLoadError::ListDirectory {
                path: directory.to_path_buf(),
                source: e,
            };
            warn!(error = %err, "context directory unreadable; continuing with empty context");
            report.failures.push(err);
            return report;
        }
    };

    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(e) => {
                let err = ContextLoadError::ListDirectory {
                    path: directory.to_path_buf(),
                    source: e,
                };
                warn!(error = %err, "context directory listing interrupted");
                report.failures.push(err);
                break;
            }
        };

        let path = entry.path();
        if !has_extension(&path, extension) {
            debug!(path = %path.display(), "skipping non-context file");
            continue;
        }

        match entry.file_type().await {
            Ok(kind) if kind.is_dir() => continue,
            Ok(_) => {}
            Err(e) => {
                let err = ContextLoadError::Read { path, source: e };
                warn!(error = %err, "skipping context file");
                report.failures.push(err);
                continue;
            }
        }

        match read_document(path).await {
            Ok(document) => {
                debug!(path = %document.path.display(), bytes = document.content.len(), "loaded context file");
                report.documents.push(document);
            }
            Err(err) => {
                warn!(error = %err, "skipping context file");
                report.failures.push(err);
            }
        }
    }

    info!(
        directory = %directory.display(),
        loaded = report.documents.len(),
        skipped = report.failures.len(),
        "context directory scanned"
    );

    report
}

/// Convenience wrapper returning only the assembled context string.
pub async fn load_context(directory: &Path, extension: &str) -> String {
    load_documents(directory, extension).await.context()
}

async fn read_document(path: PathBuf) -> Result<ContextDocument, ContextLoadError> {
    let bytes = match fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(source) => return Err(ContextLoadError::Read { path, source }),
    };

    match String::from_utf8(bytes) {
        Ok(content) => Ok(ContextDocument { path, content }),
        Err(source) => Err(ContextLoadError::Decode { path, source }),
    }
}

fn has_extension(path: &Path, extension: &str) -> bool {
    let wanted = extension.trim_start_matches('.');
    path.extension()
        .and_then(OsStr::to_str)
        .is_some_and(|ext| ext.eq_ignore_ascii_case(wanted))
}
