use crate::document::Document;

/// A logged, undoable change to a document attribute the buffer itself
/// cannot track. `BufferEdit` is a placeholder forwarding to the buffer's
/// native undo so one logical stack fronts both mechanisms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeAction {
    BufferEdit,
    /// Previous BOM flag
    BomChange(bool),
    /// Previous on disk charset
    EncodingChange(&'static str),
}

impl Document {
    /// Record an undoable action and mark the document unsaved. Pending redo
    /// actions are kept, only the buffer's own undo breaking edits
    /// invalidate them.
    pub fn push_undo(&mut self, action: AttributeAction) {
        self.undo_actions.push(action);
        self.set_changed(true);
    }

    fn push_redo(&mut self, action: AttributeAction) {
        self.redo_actions.push(action);
        self.set_changed(true);
    }

    pub fn undo(&mut self) {
        match self.undo_actions.pop() {
            None => {
                // Nothing pending here, the buffer undo is authoritative
                log::debug!("undo fallback to buffer for {}", self.display_name());
                if let Some(buf) = self.buffer.as_deref_mut() {
                    buf.undo();
                }
            }
            Some(AttributeAction::BufferEdit) => {
                self.push_redo(AttributeAction::BufferEdit);
                if let Some(buf) = self.buffer.as_deref_mut() {
                    buf.undo();
                }
            }
            Some(AttributeAction::BomChange(old)) => {
                self.push_redo(AttributeAction::BomChange(self.has_bom));
                self.has_bom = old;
            }
            Some(AttributeAction::EncodingChange(old)) => {
                self.push_redo(AttributeAction::EncodingChange(self.encoding));
                self.encoding = old;
            }
        }

        self.update_changed_state();
    }

    pub fn redo(&mut self) {
        match self.redo_actions.pop() {
            None => {
                log::debug!("redo fallback to buffer for {}", self.display_name());
                if let Some(buf) = self.buffer.as_deref_mut() {
                    buf.redo();
                }
            }
            Some(AttributeAction::BufferEdit) => {
                self.push_undo(AttributeAction::BufferEdit);
                if let Some(buf) = self.buffer.as_deref_mut() {
                    buf.redo();
                }
            }
            Some(AttributeAction::BomChange(old)) => {
                self.push_undo(AttributeAction::BomChange(self.has_bom));
                self.has_bom = old;
            }
            Some(AttributeAction::EncodingChange(old)) => {
                self.push_undo(AttributeAction::EncodingChange(self.encoding));
                self.encoding = old;
            }
        }

        self.update_changed_state();
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_actions.is_empty()
            || self
                .buffer
                .as_ref()
                .map(|buf| buf.can_undo())
                .unwrap_or(false)
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_actions.is_empty()
            || self
                .buffer
                .as_ref()
                .map(|buf| buf.can_redo())
                .unwrap_or(false)
    }

    /// Drain both stacks. Reloading and closing invalidate the attribute
    /// history.
    pub fn clear_undo_history(&mut self) {
        self.undo_actions.clear();
        self.redo_actions.clear();
        self.update_changed_state();
    }
}
