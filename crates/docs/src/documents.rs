use std::{
    fs,
    path::Path,
    time::SystemTime,
};

use thiserror::Error;

use tekst_core::Filetype;

use crate::{
    buffer::{BufferFactory, BufferHandle},
    collab::{Highlighter, UiPrompt},
    colourise::Colourise,
    document::{Document, DocumentId, SavedEncoding},
    options::FileOptions,
};

#[derive(Debug, Error)]
pub enum DocsError {
    /// The record is unsaved and the user declined to discard it
    #[error("Document has unsaved changes")]
    Busy,

    #[error("Highlight batching is already active")]
    DelayReentered,

    #[error("No such document")]
    Invalid,
}

/// The document list. A growable arena of records indexed by their slot,
/// released slots are tombstones reused lowest first so the small integer
/// identities other subsystems hold stay stable.
pub struct Documents {
    pub(crate) docs: Vec<Document>,
    pub(crate) options: FileOptions,
    pub(crate) colourise: Colourise,
    next_handle: u64,
}

impl Documents {
    pub fn new(options: FileOptions) -> Documents {
        Documents {
            docs: Vec::new(),
            options,
            colourise: Colourise::default(),
            next_handle: 1,
        }
    }

    pub fn options(&self) -> &FileOptions {
        &self.options
    }

    pub fn get(&self, id: DocumentId) -> Option<&Document> {
        self.docs.get(id.0).filter(|doc| doc.is_valid())
    }

    pub fn get_mut(&mut self, id: DocumentId) -> Option<&mut Document> {
        self.docs.get_mut(id.0).filter(|doc| doc.is_valid())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Document> {
        self.docs.iter().filter(|doc| doc.is_valid())
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Find the document whose resolved on disk path is `realname`
    pub fn find_by_real_path(&self, realname: &Path) -> Option<DocumentId> {
        self.iter()
            .find(|doc| {
                doc.real_path
                    .as_deref()
                    .map(|p| same_path(p, realname))
                    .unwrap_or(false)
            })
            .map(|doc| doc.id)
    }

    /// Find a document by path. The stored display paths are matched
    /// verbatim first so named but never saved documents are found too, then
    /// variant spellings are matched through the resolved real path.
    pub fn find_by_path(&self, path: &Path) -> Option<DocumentId> {
        let exact = self.iter().find(|doc| {
            doc.display_path
                .as_deref()
                .map(|p| same_path(p, path))
                .unwrap_or(false)
        });
        if let Some(doc) = exact {
            return Some(doc.id);
        }

        let realname = fs::canonicalize(path).ok()?;
        self.find_by_real_path(&realname)
    }

    pub fn find_by_buffer(&self, handle: BufferHandle) -> Option<DocumentId> {
        self.iter()
            .find(|doc| doc.buffer_handle == Some(handle))
            .map(|doc| doc.id)
    }

    pub fn any_unsaved(&self) -> Option<DocumentId> {
        self.iter().find(|doc| doc.changed).map(|doc| doc.id)
    }

    /// Lowest free slot, growing the list only when there is none
    fn new_slot(&mut self) -> usize {
        for (i, doc) in self.docs.iter().enumerate() {
            if !doc.is_valid() {
                return i;
            }
        }

        self.docs.push(Document::new(DocumentId(self.docs.len())));
        self.docs.len() - 1
    }

    pub(crate) fn create(
        &mut self,
        display_path: Option<&Path>,
        factory: &mut dyn BufferFactory,
    ) -> DocumentId {
        // A sole open document that is nameless and untouched gets replaced
        // instead of piling up blank tabs
        if self.len() == 1 {
            let replaceable = self
                .iter()
                .next()
                .filter(|doc| doc.display_path.is_none() && !doc.changed)
                .map(|doc| doc.id);
            if let Some(id) = replaceable {
                log::debug!("replacing the empty untitled document");
                self.release_slot(id);
            }
        }

        let slot = self.new_slot();
        let handle = BufferHandle(self.next_handle);
        self.next_handle += 1;

        let doc = &mut self.docs[slot];
        *doc = Document::new(DocumentId(slot));
        doc.display_path = display_path.map(|p| p.to_path_buf());
        doc.buffer_handle = Some(handle);
        doc.buffer = Some(factory.create_buffer());

        DocumentId(slot)
    }

    /// Tear a record down. Owned strings and the attribute log go first, the
    /// buffer last so a concurrent lookup never sees a half cleared record
    /// as valid.
    fn release_slot(&mut self, id: DocumentId) {
        let doc = &mut self.docs[id.0];
        doc.undo_actions.clear();
        doc.redo_actions.clear();
        doc.display_path = None;
        doc.real_path = None;
        doc.filetype = None;
        doc.encoding = "UTF-8";
        doc.saved_encoding = SavedEncoding {
            encoding: "UTF-8",
            has_bom: false,
        };
        doc.has_bom = false;
        doc.readonly = false;
        doc.changed = false;
        doc.mtime = None;
        doc.scroll_hint = None;
        doc.buffer_handle = None;
        doc.buffer = None;
    }

    /// Close a document. Discarding unsaved changes must be confirmed
    /// through the prompt capability, otherwise the call reports busy.
    pub fn release(&mut self, id: DocumentId, ui: &mut dyn UiPrompt) -> Result<(), DocsError> {
        let doc = self.get(id).ok_or(DocsError::Invalid)?;
        if doc.changed {
            let question = format!(
                "The document \"{}\" has unsaved changes. Discard them?",
                doc.display_name()
            );
            if !ui.confirm(&question) {
                return Err(DocsError::Busy);
            }
        }

        log::info!("File {} closed", self.docs[id.0].display_name());
        self.release_slot(id);
        Ok(())
    }

    /// Ask about every unsaved document up front, then close them all.
    /// Stops without closing anything when a discard is refused.
    pub fn close_all(&mut self, ui: &mut dyn UiPrompt) -> Result<(), DocsError> {
        let ids: Vec<DocumentId> = self.iter().map(|doc| doc.id).collect();

        for &id in &ids {
            let doc = &self.docs[id.0];
            if doc.changed {
                let question = format!(
                    "The document \"{}\" has unsaved changes. Discard them?",
                    doc.display_name()
                );
                if !ui.confirm(&question) {
                    return Err(DocsError::Busy);
                }
            }
        }

        // everything is accounted for, the changes can go
        for &id in &ids {
            self.docs[id.0].changed = false;
            self.release_slot(id);
        }
        Ok(())
    }

    /// Create a new document with optional initial content
    pub fn new_file(
        &mut self,
        path: Option<&Path>,
        filetype: Option<Filetype>,
        text: Option<&str>,
        factory: &mut dyn BufferFactory,
        hl: &mut dyn Highlighter,
    ) -> DocumentId {
        let id = self.create(path, factory);

        let default_encoding =
            tekst_encoding::canonical_name(&self.options.default_encoding).unwrap_or("UTF-8");

        let doc = &mut self.docs[id.0];
        if let Some(buf) = doc.buffer.as_deref_mut() {
            buf.set_text(text.unwrap_or(""));
            buf.mark_saved();
        }
        doc.encoding = default_encoding;
        doc.store_saved_encoding();
        doc.mtime = Some(SystemTime::now());
        doc.set_changed(false);

        let ft = filetype
            .or_else(|| path.and_then(|p| Filetype::determine(p, &self.options.filetype_patterns)));
        self.set_filetype(id, ft, hl);

        log::info!("New file \"{}\" opened", self.docs[id.0].display_name());
        id
    }

    /// Copy content and file properties into a new document
    pub fn clone_document(
        &mut self,
        src: DocumentId,
        path: Option<&Path>,
        factory: &mut dyn BufferFactory,
        hl: &mut dyn Highlighter,
    ) -> Result<DocumentId, DocsError> {
        let (text, filetype, encoding, has_bom, readonly) = {
            let doc = self.get(src).ok_or(DocsError::Invalid)?;
            (
                doc.buffer().map(|b| b.text()).unwrap_or_default(),
                doc.filetype.clone(),
                doc.encoding,
                doc.has_bom,
                doc.readonly,
            )
        };

        let id = self.new_file(path, filetype, Some(&text), factory, hl);
        let doc = &mut self.docs[id.0];
        doc.encoding = encoding;
        doc.has_bom = has_bom;
        doc.readonly = readonly;
        doc.store_saved_encoding();
        doc.update_changed_state();
        Ok(id)
    }

    /// Set the filetype tag controlling highlighting and symbol indexing,
    /// and synchronize the highlight collaborator.
    pub fn set_filetype(
        &mut self,
        id: DocumentId,
        filetype: Option<Filetype>,
        hl: &mut dyn Highlighter,
    ) {
        let Some(filetype) = filetype else {
            return;
        };

        let ft_changed = {
            let Some(doc) = self.get_mut(id) else {
                return;
            };
            log::debug!(
                "{} : {} ({})",
                doc.display_name(),
                filetype.as_str(),
                doc.encoding
            );
            let changed = doc.filetype.as_ref() != Some(&filetype);
            if changed {
                doc.filetype = Some(filetype.clone());
            }
            changed
        };

        if ft_changed {
            hl.set_filetype(id, &filetype);
        }
        hl.update_symbol_index(id);

        if self.colourise.is_delayed() {
            // one pass for the whole batch happens at commit
            return;
        }

        let keyword_user = hl.keywords_for(&filetype).is_some();
        let keywords_changed = keyword_user && self.refresh_keywords(hl);
        if keywords_changed {
            self.highlight_keyword_users(hl);
        } else if ft_changed {
            hl.request_highlight(id);
        }
    }
}

/// Filenames are case insensitive on Windows
fn same_path(a: &Path, b: &Path) -> bool {
    if cfg!(windows) {
        a.as_os_str().eq_ignore_ascii_case(b.as_os_str())
    } else {
        a == b
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::testing::{RecHighlighter, StubFactory, StubUi};
    use std::path::PathBuf;

    fn documents() -> Documents {
        Documents::new(FileOptions::default())
    }

    #[test]
    fn blank_tab_is_replaced() {
        let mut docs = documents();
        let mut factory = StubFactory;
        let mut hl = RecHighlighter::default();

        let blank = docs.new_file(None, None, None, &mut factory, &mut hl);
        assert_eq!(docs.len(), 1);

        let named = docs.new_file(
            Some(&PathBuf::from("a.rs")),
            None,
            None,
            &mut factory,
            &mut hl,
        );
        assert_eq!(docs.len(), 1);
        assert_eq!(blank, named);
        assert_eq!(docs.get(named).unwrap().display_name(), "a.rs");
    }

    #[test]
    fn changed_blank_tab_is_kept() {
        let mut docs = documents();
        let mut factory = StubFactory;
        let mut hl = RecHighlighter::default();

        let blank = docs.new_file(None, None, None, &mut factory, &mut hl);
        docs.get_mut(blank).unwrap().set_changed(true);

        docs.new_file(
            Some(&PathBuf::from("a.rs")),
            None,
            None,
            &mut factory,
            &mut hl,
        );
        assert_eq!(docs.len(), 2);
    }

    #[test]
    fn slots_are_reused_lowest_first() {
        let mut docs = documents();
        let mut factory = StubFactory;
        let mut hl = RecHighlighter::default();
        let mut ui = StubUi::default();

        let a = docs.new_file(Some(&PathBuf::from("a.rs")), None, None, &mut factory, &mut hl);
        let b = docs.new_file(Some(&PathBuf::from("b.rs")), None, None, &mut factory, &mut hl);
        let c = docs.new_file(Some(&PathBuf::from("c.rs")), None, None, &mut factory, &mut hl);
        assert_eq!((a.as_usize(), b.as_usize(), c.as_usize()), (0, 1, 2));

        docs.release(b, &mut ui).unwrap();
        assert_eq!(docs.len(), 2);

        let d = docs.new_file(Some(&PathBuf::from("d.rs")), None, None, &mut factory, &mut hl);
        assert_eq!(d.as_usize(), 1);
        assert_eq!(docs.get(d).unwrap().display_name(), "d.rs");
    }

    #[test]
    fn release_busy_without_confirmation() {
        let mut docs = documents();
        let mut factory = StubFactory;
        let mut hl = RecHighlighter::default();

        let id = docs.new_file(Some(&PathBuf::from("a.rs")), None, None, &mut factory, &mut hl);
        docs.get_mut(id).unwrap().set_changed(true);

        let mut ui = StubUi::default();
        assert!(matches!(docs.release(id, &mut ui), Err(DocsError::Busy)));
        assert!(docs.get(id).is_some());

        ui.confirm_response = true;
        docs.release(id, &mut ui).unwrap();
        assert!(docs.get(id).is_none());
    }

    #[test]
    fn released_slot_is_a_tombstone() {
        let mut docs = documents();
        let mut factory = StubFactory;
        let mut hl = RecHighlighter::default();
        let mut ui = StubUi::default();

        let a = docs.new_file(Some(&PathBuf::from("a.rs")), None, None, &mut factory, &mut hl);
        let handle = docs.get(a).unwrap().buffer_handle().unwrap();
        docs.release(a, &mut ui).unwrap();

        assert!(docs.get(a).is_none());
        assert!(docs.find_by_buffer(handle).is_none());
        assert!(docs.find_by_path(&PathBuf::from("a.rs")).is_none());
    }

    #[test]
    fn find_by_buffer_handle() {
        let mut docs = documents();
        let mut factory = StubFactory;
        let mut hl = RecHighlighter::default();

        let a = docs.new_file(Some(&PathBuf::from("a.rs")), None, None, &mut factory, &mut hl);
        let b = docs.new_file(Some(&PathBuf::from("b.rs")), None, None, &mut factory, &mut hl);

        let handle = docs.get(b).unwrap().buffer_handle().unwrap();
        assert_eq!(docs.find_by_buffer(handle), Some(b));
        assert_ne!(docs.get(a).unwrap().buffer_handle(), Some(handle));
    }

    #[test]
    fn close_all_stops_on_refusal() {
        let mut docs = documents();
        let mut factory = StubFactory;
        let mut hl = RecHighlighter::default();

        let a = docs.new_file(Some(&PathBuf::from("a.rs")), None, None, &mut factory, &mut hl);
        docs.new_file(Some(&PathBuf::from("b.rs")), None, None, &mut factory, &mut hl);
        docs.get_mut(a).unwrap().set_changed(true);

        let mut ui = StubUi::default();
        assert!(matches!(docs.close_all(&mut ui), Err(DocsError::Busy)));
        assert_eq!(docs.len(), 2);

        ui.confirm_response = true;
        docs.close_all(&mut ui).unwrap();
        assert!(docs.is_empty());
    }

    #[test]
    fn clone_copies_properties() {
        let mut docs = documents();
        let mut factory = StubFactory;
        let mut hl = RecHighlighter::default();

        let src = docs.new_file(
            Some(&PathBuf::from("a.rs")),
            None,
            Some("content"),
            &mut factory,
            &mut hl,
        );
        {
            let doc = docs.get_mut(src).unwrap();
            doc.encoding = "windows-1252";
            doc.has_bom = true;
            doc.readonly = true;
        }

        let copy = docs
            .clone_document(src, Some(&PathBuf::from("b.rs")), &mut factory, &mut hl)
            .unwrap();
        let doc = docs.get(copy).unwrap();
        assert_eq!(doc.buffer().unwrap().text(), "content");
        assert_eq!(doc.encoding(), "windows-1252");
        assert!(doc.has_bom());
        assert!(doc.readonly());
        assert!(!doc.is_changed());
    }
}
