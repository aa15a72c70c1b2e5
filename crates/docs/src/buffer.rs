use tekst_core::BufferRange;

/// Contract to the external text buffer widget. Documents are driven only
/// through this interface, widget internals never leak into the core.
pub trait Buffer {
    /// Materialize the whole canonical text
    fn text(&self) -> String;

    fn len(&self) -> usize;

    /// Replace the entire content. Resets the native undo history.
    fn set_text(&mut self, text: &str);

    /// Whether the content differs from the last savepoint
    fn is_modified(&self) -> bool;

    /// Mark the current content as the saved state
    fn mark_saved(&mut self);

    fn undo(&mut self) -> bool;
    fn redo(&mut self) -> bool;
    fn can_undo(&self) -> bool;
    fn can_redo(&self) -> bool;

    /// Replace `range` with `text`, returns the length of the inserted text
    fn replace_range(&mut self, range: BufferRange, text: &str) -> usize;

    /// Group the following edits into a single native undo step
    fn begin_undo_action(&mut self);
    fn end_undo_action(&mut self);

    /// Move the cursor, used to restore positions after a load
    fn goto_pos(&mut self, pos: usize);
}

/// Identity of an attached buffer, minted by the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferHandle(pub(crate) u64);

/// Creates the buffer widgets documents attach to
pub trait BufferFactory {
    fn create_buffer(&mut self) -> Box<dyn Buffer>;
}
