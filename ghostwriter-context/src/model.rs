use std::path::{Path, PathBuf};

/// One reference file read at startup. Immutable once loaded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContextDocument {
    pub path: PathBuf,
    pub content: String,
}

impl ContextDocument {
    pub fn new(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }

    /// Source identifier shown to the model: the bare file name.
    pub fn label(&self) -> String {
        label_for(&self.path)
    }

    fn entry(&self) -> String {
        format!("{}: {}", self.label(), self.content.trim_end())
    }
}

fn label_for(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Join documents as `"<label>: <content>"` entries, one per line, in the
/// order given.
pub fn assemble_context(documents: &[ContextDocument]) -> String {
    documents
        .iter()
        .map(ContextDocument::entry)
        .collect::<Vec<_>>()
        .join("\n")
}
