use std::path::PathBuf;

use tekst_core::Filetype;

use crate::DocumentId;

/// Highlighting and symbol indexing collaborator. Called from the file
/// operations and the batch highlight coordinator.
pub trait Highlighter {
    /// The document's filetype tag changed
    fn set_filetype(&mut self, doc: DocumentId, filetype: &Filetype);

    /// Run one highlight pass over the whole document
    fn request_highlight(&mut self, doc: DocumentId);

    /// Refresh the symbol index of the document
    fn update_symbol_index(&mut self, doc: DocumentId);

    /// Shared typename keyword list for a filetype, None when the filetype
    /// has no keyword support
    fn keywords_for(&mut self, filetype: &Filetype) -> Option<String>;
}

/// Blocking user interaction. Every call returns synchronously, a UI layer
/// adapts these to whatever its own event model needs.
pub trait UiPrompt {
    fn notify(&mut self, message: &str);
    fn confirm(&mut self, question: &str) -> bool;
    fn prompt_save_as(&mut self) -> Option<PathBuf>;
}
