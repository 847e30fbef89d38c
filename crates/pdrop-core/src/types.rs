use serde::{Deserialize, Serialize};

/// Marker wrapped around a file name to hide it behind a spoiler
pub const SPOILER_MARK: &str = "||";

/// A user-facing file: name, MIME type, and raw content.
///
/// Values are never mutated in place; renaming produces a new `File`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct File {
    pub name: String,
    pub mime_type: String,
    pub content: Vec<u8>,
}

impl File {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            content,
        }
    }

    /// A copy of this file under a different name.
    pub fn renamed(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mime_type: self.mime_type.clone(),
            content: self.content.clone(),
        }
    }

    /// True if the name is wrapped as `||name||`.
    pub fn has_spoiler(&self) -> bool {
        self.name.len() >= 2 * SPOILER_MARK.len()
            && self.name.starts_with(SPOILER_MARK)
            && self.name.ends_with(SPOILER_MARK)
    }

    /// Add or remove the spoiler wrapper, returning the renamed file.
    pub fn toggle_spoiler(&self) -> Self {
        if self.has_spoiler() {
            let inner = &self.name[SPOILER_MARK.len()..self.name.len() - SPOILER_MARK.len()];
            self.renamed(inner)
        } else {
            self.renamed(format!("{SPOILER_MARK}{}{SPOILER_MARK}", self.name))
        }
    }
}

impl std::fmt::Debug for File {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("File")
            .field("name", &self.name)
            .field("mime_type", &self.mime_type)
            .field("len", &self.content.len())
            .finish()
    }
}
