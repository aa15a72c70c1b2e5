use std::path::PathBuf;

use rustc_hash::FxHashMap;

use tekst_core::{BufferRange, Filetype};

use crate::{Buffer, BufferFactory, DocumentId, Highlighter, UiPrompt};

/// A plain string backed buffer with grouped undo, standing in for the
/// editing widget.
#[derive(Default)]
pub(crate) struct StringBuffer {
    text: String,
    modified: bool,
    undo: Vec<Vec<Edit>>,
    redo: Vec<Vec<Edit>>,
    txn: Option<Vec<Edit>>,
    pub(crate) cursor: usize,
}

#[derive(Debug, Clone)]
struct Edit {
    at: usize,
    old: String,
    new: String,
}

impl StringBuffer {
    pub fn with_text(text: &str) -> StringBuffer {
        StringBuffer {
            text: text.to_string(),
            ..StringBuffer::default()
        }
    }

    fn record(&mut self, edit: Edit) {
        match self.txn.as_mut() {
            Some(group) => group.push(edit),
            None => self.undo.push(vec![edit]),
        }
        self.redo.clear();
    }
}

impl Buffer for StringBuffer {
    fn text(&self) -> String {
        self.text.clone()
    }

    fn len(&self) -> usize {
        self.text.len()
    }

    fn set_text(&mut self, text: &str) {
        self.text = text.to_string();
        self.undo.clear();
        self.redo.clear();
        self.txn = None;
        self.modified = true;
    }

    fn is_modified(&self) -> bool {
        self.modified
    }

    fn mark_saved(&mut self) {
        self.modified = false;
    }

    fn undo(&mut self) -> bool {
        let Some(group) = self.undo.pop() else {
            return false;
        };
        for edit in group.iter().rev() {
            let end = edit.at + edit.new.len();
            self.text.replace_range(edit.at..end, &edit.old);
        }
        self.redo.push(group);
        self.modified = true;
        true
    }

    fn redo(&mut self) -> bool {
        let Some(group) = self.redo.pop() else {
            return false;
        };
        for edit in group.iter() {
            let end = edit.at + edit.old.len();
            self.text.replace_range(edit.at..end, &edit.new);
        }
        self.undo.push(group);
        self.modified = true;
        true
    }

    fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    fn replace_range(&mut self, range: BufferRange, text: &str) -> usize {
        let old = self.text[range.start..range.end].to_string();
        self.text.replace_range(range.start..range.end, text);
        self.record(Edit {
            at: range.start,
            old,
            new: text.to_string(),
        });
        self.modified = true;
        text.len()
    }

    fn begin_undo_action(&mut self) {
        self.txn = Some(Vec::new());
    }

    fn end_undo_action(&mut self) {
        if let Some(group) = self.txn.take() {
            if !group.is_empty() {
                self.undo.push(group);
            }
        }
    }

    fn goto_pos(&mut self, pos: usize) {
        self.cursor = pos;
    }
}

/// Records every prompt and answers with a canned response
#[derive(Default)]
pub(crate) struct StubUi {
    pub confirm_response: bool,
    pub confirms: Vec<String>,
    pub messages: Vec<String>,
    pub save_as: Option<PathBuf>,
}

impl UiPrompt for StubUi {
    fn notify(&mut self, message: &str) {
        self.messages.push(message.to_string());
    }

    fn confirm(&mut self, question: &str) -> bool {
        self.confirms.push(question.to_string());
        self.confirm_response
    }

    fn prompt_save_as(&mut self) -> Option<PathBuf> {
        self.save_as.clone()
    }
}

/// Records highlight traffic, keyword lists come from a plain map
#[derive(Default)]
pub(crate) struct RecHighlighter {
    pub filetypes: Vec<(DocumentId, String)>,
    pub highlights: Vec<DocumentId>,
    pub symbol_updates: Vec<DocumentId>,
    pub keywords: FxHashMap<String, String>,
}

impl Highlighter for RecHighlighter {
    fn set_filetype(&mut self, doc: DocumentId, filetype: &Filetype) {
        self.filetypes.push((doc, filetype.as_str().to_string()));
    }

    fn request_highlight(&mut self, doc: DocumentId) {
        self.highlights.push(doc);
    }

    fn update_symbol_index(&mut self, doc: DocumentId) {
        self.symbol_updates.push(doc);
    }

    fn keywords_for(&mut self, filetype: &Filetype) -> Option<String> {
        self.keywords.get(filetype.as_str()).cloned()
    }
}

pub(crate) struct StubFactory;

impl BufferFactory for StubFactory {
    fn create_buffer(&mut self) -> Box<dyn Buffer> {
        Box::new(StringBuffer::default())
    }
}
