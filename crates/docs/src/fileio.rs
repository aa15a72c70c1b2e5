use std::{
    fs, io,
    path::{Path, PathBuf},
    time::SystemTime,
};

use thiserror::Error;

use tekst_core::{EndOfLine, Filetype};
use tekst_encoding::{EncodingError, FileLoadResult};

use crate::{
    buffer::{Buffer, BufferFactory},
    collab::{Highlighter, UiPrompt},
    document::{Document, DocumentId},
    documents::Documents,
    staleness::DiskStatus,
    undo::AttributeAction,
};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("File not found")]
    NotFound,

    #[error("Could not open file: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Encoding(#[from] EncodingError),

    #[error("No such document")]
    InvalidDocument,
}

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("Document has no file name")]
    NoPath,

    #[error(transparent)]
    Encoding(#[from] EncodingError),

    #[error("Error saving file: {0}")]
    Io(#[from] io::Error),

    #[error("Wrote {written} of {expected} bytes, the file on disk may be corrupt")]
    ShortWrite { written: u64, expected: u64 },

    #[error("No such document")]
    InvalidDocument,
}

#[derive(Debug, Default, Clone)]
pub struct OpenOptions {
    pub readonly: bool,
    /// Charset to use instead of auto detection. The "None" sentinel opens
    /// the file without any conversion.
    pub forced_encoding: Option<String>,
    /// Filetype override, detected from the path when absent
    pub filetype: Option<Filetype>,
    /// One shot cursor position override, the command line surface consumes
    /// its --line/--column arguments into this
    pub position: Option<usize>,
}

impl Documents {
    /// Open a file, or re-focus it when it is already open. The already open
    /// fast path forces a staleness check and offers reload/resave through
    /// the prompt capability.
    pub fn open(
        &mut self,
        path: &Path,
        opts: &OpenOptions,
        factory: &mut dyn BufferFactory,
        hl: &mut dyn Highlighter,
        ui: &mut dyn UiPrompt,
    ) -> Result<DocumentId, LoadError> {
        if let Some(id) = self.find_by_path(path) {
            match self.check_disk_status(id, true) {
                DiskStatus::Changed => {
                    let question = format!(
                        "The file {} on disk is more recent than the current buffer. Reload it?",
                        path.display()
                    );
                    if ui.confirm(&question) {
                        self.reload(id, None, hl)?;
                    }
                }
                DiskStatus::Missing => {
                    let question =
                        format!("File {} was not found on disk! Try to resave it?", path.display());
                    if ui.confirm(&question) {
                        if let Some(new_path) = ui.prompt_save_as() {
                            if let Err(err) = self.save_as(id, &new_path, hl) {
                                ui.notify(&format!("Error saving file ({err})"));
                            }
                        }
                    }
                }
                DiskStatus::Unchanged => {}
            }

            if let Some(doc) = self.get_mut(id) {
                set_position(doc, opts.position);
            }
            return Ok(id);
        }

        let forced = opts
            .forced_encoding
            .as_deref()
            .or(self.options.default_open_encoding.as_deref());
        let (filedata, mtime, fs_readonly) = load_text_file(path, forced)?;

        if filedata.truncated {
            ui.notify(&format!(
                "The file \"{}\" could not be opened properly and has been truncated. \
                 It was set to read-only.",
                path.display()
            ));
        }

        let id = self.create(Some(path), factory);
        let real_path = fs::canonicalize(path).ok();

        let doc = &mut self.docs[id.as_usize()];
        if let Some(buf) = doc.buffer.as_deref_mut() {
            buf.set_text(&filedata.text);
            buf.mark_saved();
        }
        doc.eol = filedata.eol;
        doc.mtime = mtime;
        doc.encoding = filedata.encoding;
        doc.has_bom = filedata.has_bom;
        doc.store_saved_encoding();
        doc.readonly = opts.readonly || filedata.truncated || fs_readonly;
        doc.real_path = real_path;
        set_position(doc, opts.position);
        doc.set_changed(false);

        let ft = opts
            .filetype
            .clone()
            .or_else(|| Filetype::determine(path, &self.options.filetype_patterns));
        self.set_filetype(id, ft, hl);

        log::info!(
            "File {} opened ({})",
            path.display(),
            self.docs[id.as_usize()].encoding
        );
        Ok(id)
    }

    /// Open several files with a single highlight pass for the whole batch
    pub fn open_files(
        &mut self,
        paths: &[PathBuf],
        opts: &OpenOptions,
        factory: &mut dyn BufferFactory,
        hl: &mut dyn Highlighter,
        ui: &mut dyn UiPrompt,
    ) -> Vec<DocumentId> {
        let batching = self.delay_colourise().is_ok();

        let mut opened = Vec::new();
        for path in paths {
            match self.open(path, opts, factory, hl, ui) {
                Ok(id) => opened.push(id),
                Err(err) => {
                    log::error!("Could not open file {}: {err}", path.display());
                    ui.notify(&format!("Could not open file {} ({err})", path.display()));
                }
            }
        }

        if batching {
            self.commit_colourise(hl);
        }
        opened
    }

    /// Replace a document's content from disk, keeping its slot identity.
    /// The attribute undo history does not survive, and the filetype is
    /// re-applied so a highlight pass always runs over the fresh content.
    pub fn reload(
        &mut self,
        id: DocumentId,
        forced_encoding: Option<&str>,
        hl: &mut dyn Highlighter,
    ) -> Result<(), LoadError> {
        let path = {
            let doc = self.get(id).ok_or(LoadError::InvalidDocument)?;
            doc.display_path.clone().ok_or(LoadError::NotFound)?
        };

        let (filedata, mtime, _) = load_text_file(&path, forced_encoding)?;

        let ft = {
            let doc = &mut self.docs[id.as_usize()];
            doc.clear_undo_history();

            if let Some(buf) = doc.buffer.as_deref_mut() {
                buf.set_text(&filedata.text);
                buf.mark_saved();
            }
            doc.eol = filedata.eol;
            doc.mtime = mtime;
            doc.encoding = filedata.encoding;
            doc.has_bom = filedata.has_bom;
            doc.store_saved_encoding();
            doc.readonly = doc.readonly || filedata.truncated;
            doc.scroll_hint = Some(0.5);
            doc.set_changed(false);

            // unset so the tag is applied freshly, the content may have
            // changed even when the tag did not
            doc.filetype.take()
        };
        self.set_filetype(id, ft, hl);

        log::info!("File {} reloaded", path.display());
        Ok(())
    }

    /// Write a document back to its file. Without `force` the call is a
    /// no-op for unmodified or read only documents.
    pub fn save(
        &mut self,
        id: DocumentId,
        force: bool,
        hl: &mut dyn Highlighter,
    ) -> Result<bool, SaveError> {
        {
            let doc = self.get(id).ok_or(SaveError::InvalidDocument)?;
            if !force && (!doc.changed || doc.readonly) {
                return Ok(false);
            }
            if doc.display_path.is_none() {
                return Err(SaveError::NoPath);
            }
        }

        self.apply_save_transforms(id);

        let doc = &mut self.docs[id.as_usize()];
        let path = doc.display_path.clone().ok_or(SaveError::NoPath)?;
        let text = doc.buffer.as_ref().map(|buf| buf.text()).unwrap_or_default();
        let data = tekst_encoding::encode(&text, doc.encoding, doc.has_bom)?;

        write_data_to_disk(&path, &data)?;

        // the file exists on disk now
        doc.real_path = fs::canonicalize(&path).ok();
        doc.store_saved_encoding();
        if let Some(buf) = doc.buffer.as_deref_mut() {
            buf.mark_saved();
        }
        // stat for the timestamp, wall clock and filesystem stamps disagree
        // on coarse grained filesystems
        doc.mtime = fs::metadata(&path).ok().and_then(|meta| meta.modified().ok());
        doc.last_check = SystemTime::now();
        doc.update_changed_state();

        let ft = doc.filetype.clone();
        self.set_filetype(id, ft, hl);

        log::info!("File {} saved", path.display());
        Ok(true)
    }

    /// Save under a new name, detecting the filetype when none was ever set
    pub fn save_as(
        &mut self,
        id: DocumentId,
        new_path: &Path,
        hl: &mut dyn Highlighter,
    ) -> Result<(), SaveError> {
        {
            let doc = self.get_mut(id).ok_or(SaveError::InvalidDocument)?;
            doc.display_path = Some(new_path.to_path_buf());
        }

        if self.docs[id.as_usize()].filetype.is_none() {
            let ft = Filetype::determine(new_path, &self.options.filetype_patterns);
            self.set_filetype(id, ft, hl);
        }

        self.save(id, true, hl).map(|_| ())
    }

    /// The optional text transforms run before every write, in a fixed
    /// order, as one undoable buffer transaction
    fn apply_save_transforms(&mut self, id: DocumentId) {
        let replace_tabs = self.options.replace_tabs;
        let strip = self.options.strip_trailing_spaces;
        let final_newline = self.options.final_new_line;
        let tab_width = self.options.tab_width;

        let doc = &mut self.docs[id.as_usize()];
        let is_make = doc.filetype.as_ref().map(Filetype::is_make).unwrap_or(false);
        let eol = doc.eol;
        let Some(buf) = doc.buffer.as_deref_mut() else {
            return;
        };

        buf.begin_undo_action();
        let mut edited = false;
        if replace_tabs && !is_make {
            edited |= replace_tabs_with_spaces(buf, tab_width);
        }
        if strip {
            edited |= strip_trailing_spaces(buf);
        }
        if final_newline {
            edited |= ensure_final_newline(buf, eol);
        }
        buf.end_undo_action();

        if edited {
            doc.push_undo(AttributeAction::BufferEdit);
        }
    }
}

fn load_text_file(
    path: &Path,
    forced: Option<&str>,
) -> Result<(FileLoadResult, Option<SystemTime>, bool), LoadError> {
    let meta = fs::metadata(path).map_err(|err| match err.kind() {
        io::ErrorKind::NotFound => LoadError::NotFound,
        _ => LoadError::Io(err),
    })?;
    let mtime = meta.modified().ok();
    let fs_readonly = meta.permissions().readonly();

    let bytes = fs::read(path)?;
    let filedata = tekst_encoding::decode(&bytes, forced)?;

    Ok((filedata, mtime, fs_readonly))
}

/// Write through a sibling temporary file and move it over the target so a
/// failed write never leaves a half written file behind. A size mismatch
/// after the move is still surfaced as the hard short write failure.
fn write_data_to_disk(path: &Path, data: &[u8]) -> Result<(), SaveError> {
    use std::io::Write;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(data)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|err| SaveError::Io(err.error))?;

    let written = fs::metadata(path)?.len();
    let expected = data.len() as u64;
    if written != expected {
        return Err(SaveError::ShortWrite { written, expected });
    }
    Ok(())
}

/// One shot cursor override from the command line surface
fn set_position(doc: &mut Document, pos: Option<usize>) {
    let Some(pos) = pos else {
        return;
    };
    if let Some(buf) = doc.buffer.as_deref_mut() {
        buf.goto_pos(pos);
    }
    doc.scroll_hint = Some(0.5);
}

fn replace_tabs_with_spaces(buf: &mut dyn Buffer, tab_width: u8) -> bool {
    let text = buf.text();
    let spaces = " ".repeat(tab_width.max(1) as usize);
    let tabs: Vec<usize> = text
        .bytes()
        .enumerate()
        .filter(|(_, b)| *b == b'\t')
        .map(|(i, _)| i)
        .collect();

    // back to front keeps the earlier offsets valid
    for &pos in tabs.iter().rev() {
        buf.replace_range((pos..pos + 1).into(), &spaces);
    }
    !tabs.is_empty()
}

fn strip_trailing_spaces(buf: &mut dyn Buffer) -> bool {
    let text = buf.text();
    let bytes = text.as_bytes();
    let mut ranges: Vec<(usize, usize)> = Vec::new();

    let mut i = 0;
    let mut line_start = 0;
    loop {
        if i >= bytes.len() || bytes[i] == b'\n' || bytes[i] == b'\r' {
            let mut j = i;
            while j > line_start && matches!(bytes[j - 1], b' ' | b'\t') {
                j -= 1;
            }
            if j < i {
                ranges.push((j, i));
            }
            if i >= bytes.len() {
                break;
            }
            if bytes[i] == b'\r' && bytes.get(i + 1) == Some(&b'\n') {
                i += 2;
            } else {
                i += 1;
            }
            line_start = i;
        } else {
            i += 1;
        }
    }

    for &(start, end) in ranges.iter().rev() {
        buf.replace_range((start..end).into(), "");
    }
    !ranges.is_empty()
}

fn ensure_final_newline(buf: &mut dyn Buffer, eol: EndOfLine) -> bool {
    let text = buf.text();
    if text.is_empty() || text.ends_with('\n') || text.ends_with('\r') {
        return false;
    }

    let len = text.len();
    buf.replace_range((len..len).into(), eol.as_str());
    true
}
