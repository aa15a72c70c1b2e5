mod buffer;
mod collab;
mod colourise;
mod document;
mod documents;
mod fileio;
mod options;
mod search;
mod staleness;
mod undo;

#[cfg(test)]
pub(crate) mod testing;

pub use buffer::{Buffer, BufferFactory, BufferHandle};
pub use collab::{Highlighter, UiPrompt};
pub use document::{Document, DocumentId, SavedEncoding};
pub use documents::{DocsError, Documents};
pub use fileio::{LoadError, OpenOptions, SaveError};
pub use options::FileOptions;
pub use search::{RectSelection, WrapPolicy};
pub use staleness::DiskStatus;
pub use undo::AttributeAction;

pub use tekst_core::{BufferRange, EndOfLine, Filetype, PatternError, Range, SearchFlags};
