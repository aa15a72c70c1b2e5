use std::{
    borrow::Cow,
    path::{Path, PathBuf},
    time::SystemTime,
};

use tekst_core::{EndOfLine, Filetype};

use crate::{
    buffer::{Buffer, BufferHandle},
    undo::AttributeAction,
};

/// Stable slot index of a document. Reused only after the slot is released.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentId(pub(crate) usize);

impl DocumentId {
    pub fn as_usize(&self) -> usize {
        self.0
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Encoding state as of the last successful load or save. The baseline
/// against which encoding and BOM changes count as unsaved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedEncoding {
    pub encoding: &'static str,
    pub has_bom: bool,
}

/// One open file or untitled buffer
pub struct Document {
    pub(crate) id: DocumentId,
    pub(crate) display_path: Option<PathBuf>,
    /// Resolved, symlink free form of the path. Set only once the file
    /// exists on disk.
    pub(crate) real_path: Option<PathBuf>,
    pub(crate) encoding: &'static str,
    pub(crate) has_bom: bool,
    pub(crate) saved_encoding: SavedEncoding,
    pub(crate) filetype: Option<Filetype>,
    pub(crate) eol: EndOfLine,
    pub(crate) readonly: bool,
    pub(crate) mtime: Option<SystemTime>,
    pub(crate) last_check: SystemTime,
    pub(crate) changed: bool,
    pub(crate) scroll_hint: Option<f32>,
    pub(crate) undo_actions: Vec<AttributeAction>,
    pub(crate) redo_actions: Vec<AttributeAction>,
    pub(crate) buffer_handle: Option<BufferHandle>,
    pub(crate) buffer: Option<Box<dyn Buffer>>,
}

impl Document {
    pub(crate) fn new(id: DocumentId) -> Document {
        Document {
            id,
            display_path: None,
            real_path: None,
            encoding: "UTF-8",
            has_bom: false,
            saved_encoding: SavedEncoding {
                encoding: "UTF-8",
                has_bom: false,
            },
            filetype: None,
            eol: EndOfLine::default(),
            readonly: false,
            mtime: None,
            last_check: SystemTime::now(),
            changed: false,
            scroll_hint: None,
            undo_actions: Vec::new(),
            redo_actions: Vec::new(),
            buffer_handle: None,
            buffer: None,
        }
    }

    /// A document without a buffer is a free slot waiting for reuse
    pub fn is_valid(&self) -> bool {
        self.buffer.is_some()
    }

    pub fn id(&self) -> DocumentId {
        self.id
    }

    pub fn display_path(&self) -> Option<&Path> {
        self.display_path.as_deref()
    }

    pub fn real_path(&self) -> Option<&Path> {
        self.real_path.as_deref()
    }

    pub fn encoding(&self) -> &'static str {
        self.encoding
    }

    pub fn has_bom(&self) -> bool {
        self.has_bom
    }

    pub fn saved_encoding(&self) -> &SavedEncoding {
        &self.saved_encoding
    }

    pub fn filetype(&self) -> Option<&Filetype> {
        self.filetype.as_ref()
    }

    pub fn eol(&self) -> EndOfLine {
        self.eol
    }

    pub fn readonly(&self) -> bool {
        self.readonly
    }

    pub fn set_readonly(&mut self, readonly: bool) {
        self.readonly = readonly;
    }

    pub fn is_changed(&self) -> bool {
        self.changed
    }

    pub fn buffer(&self) -> Option<&dyn Buffer> {
        self.buffer.as_deref()
    }

    pub fn buffer_mut(&mut self) -> Option<&mut (dyn Buffer + 'static)> {
        self.buffer.as_deref_mut()
    }

    pub fn buffer_handle(&self) -> Option<BufferHandle> {
        self.buffer_handle
    }

    /// Viewport position to restore after a load, consumed by the view
    pub fn take_scroll_hint(&mut self) -> Option<f32> {
        self.scroll_hint.take()
    }

    pub fn display_name(&self) -> Cow<'_, str> {
        self.display_path
            .as_ref()
            .map(|p| p.to_string_lossy())
            .unwrap_or(Cow::from("untitled"))
    }

    pub(crate) fn set_changed(&mut self, changed: bool) {
        self.changed = changed;
    }

    /// Dirty means buffer modifications or an encoding/BOM attribute that
    /// differs from the last save
    pub(crate) fn update_changed_state(&mut self) {
        let modified = self
            .buffer
            .as_ref()
            .map(|buf| buf.is_modified())
            .unwrap_or(false);

        self.changed = modified
            || self.has_bom != self.saved_encoding.has_bom
            || self.encoding != self.saved_encoding.encoding;
    }

    /// Keep a record of the unchanged document state encoding
    pub(crate) fn store_saved_encoding(&mut self) {
        self.saved_encoding = SavedEncoding {
            encoding: self.encoding,
            has_bom: self.has_bom,
        };
    }

    /// Set a new save charset, recording the old one for undo
    pub fn change_encoding(&mut self, encoding: &'static str) {
        if self.encoding == encoding {
            return;
        }
        self.push_undo(AttributeAction::EncodingChange(self.encoding));
        self.encoding = encoding;
    }

    /// Toggle whether a BOM is written on save, recording the old flag
    pub fn change_bom(&mut self, has_bom: bool) {
        if self.has_bom == has_bom {
            return;
        }
        self.push_undo(AttributeAction::BomChange(self.has_bom));
        self.has_bom = has_bom;
    }
}
