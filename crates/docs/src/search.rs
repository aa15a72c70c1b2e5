use tekst_core::{BufferRange, PatternError, SearchFlags, Searcher};

use crate::{
    buffer::Buffer,
    collab::UiPrompt,
    document::Document,
    undo::AttributeAction,
};

/// What to do when a search exhausts the remaining document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WrapPolicy {
    /// Continue from the opposite boundary without asking
    Auto,
    /// Ask through the prompt capability
    Ask,
    Never,
}

/// A multi line column mode selection, described by the per line sub ranges
/// the rectangle carves out of the text. Geometry comes from the view, the
/// positions here are absolute.
#[derive(Debug, Clone)]
pub struct RectSelection {
    /// Position where the original selection starts
    pub anchor: usize,
    /// Top to bottom, None for lines the rectangle misses entirely
    pub spans: Vec<Option<BufferRange>>,
}

impl Document {
    /// Find the next match from `from`, retrying once from the opposite
    /// boundary according to the wrap policy when the rest of the document
    /// has no match.
    pub fn find_next(
        &self,
        pattern: &str,
        flags: SearchFlags,
        from: usize,
        wrap: WrapPolicy,
        ui: &mut dyn UiPrompt,
    ) -> Result<Option<BufferRange>, PatternError> {
        if pattern.is_empty() {
            return Ok(None);
        }
        let Some(buf) = self.buffer() else {
            return Ok(None);
        };

        let text = buf.text();
        let searcher = Searcher::new(pattern, flags)?;

        if let Some(mat) = searcher.find(&text, from) {
            return Ok(Some(mat));
        }

        // the whole document was already covered, give up right away
        let covered = if searcher.is_backwards() {
            from >= text.len()
        } else {
            from == 0
        };
        if covered {
            ui.notify(&format!("\"{pattern}\" was not found."));
            return Ok(None);
        }

        let do_wrap = match wrap {
            WrapPolicy::Auto => true,
            WrapPolicy::Ask => ui.confirm("Wrap search and find again?"),
            WrapPolicy::Never => false,
        };
        if !do_wrap {
            return Ok(None);
        }

        let boundary = if searcher.is_backwards() { text.len() } else { 0 };
        let mat = searcher.find(&text, boundary);
        if mat.is_none() {
            ui.notify(&format!("\"{pattern}\" was not found."));
        }
        Ok(mat)
    }

    /// Replace every match within `[start, end)`, adjusting the range end as
    /// the text shrinks or grows. All replacements form one undo
    /// transaction. Returns the count and the new end of the range, None
    /// when nothing was replaced.
    pub fn replace_range(
        &mut self,
        pattern: &str,
        replacement: &str,
        flags: SearchFlags,
        start: usize,
        end: usize,
    ) -> Result<(usize, Option<usize>), PatternError> {
        if self.readonly {
            return Ok((0, None));
        }
        let searcher = Searcher::new(pattern, flags & !SearchFlags::BACKWARDS)?;
        let Some(buf) = self.buffer.as_deref_mut() else {
            return Ok((0, None));
        };

        buf.begin_undo_action();
        let (count, new_end) = replace_in_span(buf, &searcher, replacement, start, end);
        buf.end_undo_action();

        if count > 0 {
            self.push_undo(AttributeAction::BufferEdit);
        }
        Ok((count, new_end))
    }

    /// Replace every match in the whole document
    pub fn replace_all(
        &mut self,
        pattern: &str,
        replacement: &str,
        flags: SearchFlags,
        ui: &mut dyn UiPrompt,
    ) -> Result<usize, PatternError> {
        if pattern.is_empty() {
            return Ok(0);
        }

        let len = self.buffer().map(|buf| buf.len()).unwrap_or(0);
        let (count, _) = self.replace_range(pattern, replacement, flags, 0, len)?;
        show_replace_summary(self, count, pattern, replacement, ui);
        Ok(count)
    }

    /// Replace the selection when it matches the pattern exactly, otherwise
    /// just seek to the next match. Returns the replaced span so the caller
    /// can re-select it.
    pub fn replace_selection_or_next(
        &mut self,
        pattern: &str,
        replacement: &str,
        flags: SearchFlags,
        selection: &BufferRange,
        wrap: WrapPolicy,
        ui: &mut dyn UiPrompt,
    ) -> Result<Option<BufferRange>, PatternError> {
        if pattern.is_empty() || self.readonly {
            return Ok(None);
        }

        if selection.is_empty() {
            // nothing selected, only seek
            self.find_next(pattern, flags, selection.start, wrap, ui)?;
            return Ok(None);
        }

        let backwards =
            flags.contains(SearchFlags::BACKWARDS) && !flags.contains(SearchFlags::REGEX);
        let from = if backwards { selection.end } else { selection.start };

        let Some(mat) = self.find_next(pattern, flags, from, wrap, ui)? else {
            return Ok(None);
        };
        // the selection itself has to be the match
        if mat.start != selection.start {
            return Ok(None);
        }

        let Some(buf) = self.buffer.as_deref_mut() else {
            return Ok(None);
        };
        let replace_len = buf.replace_range(mat.clone(), replacement);
        self.push_undo(AttributeAction::BufferEdit);

        Ok(Some((mat.start..mat.start + replace_len).into()))
    }

    /// Replace independently within each line's sub range of a rectangular
    /// selection and rebuild a rectangle from the original anchor to the
    /// widest end column. A rectangle that would wrap past the end of its
    /// last line is dropped instead of rebuilt.
    pub fn replace_in_rect_selection(
        &mut self,
        pattern: &str,
        replacement: &str,
        flags: SearchFlags,
        sel: &RectSelection,
        ui: &mut dyn UiPrompt,
    ) -> Result<Option<BufferRange>, PatternError> {
        if pattern.is_empty() || self.readonly {
            return Ok(None);
        }
        let searcher = Searcher::new(pattern, flags & !SearchFlags::BACKWARDS)?;
        let Some(buf) = self.buffer.as_deref_mut() else {
            return Ok(None);
        };

        buf.begin_undo_action();

        let mut count = 0;
        let mut max_column = 0;
        let mut delta = 0isize;
        let mut replaced = false;
        let mut last_end = None;

        for span in &sel.spans {
            let Some(range) = span else {
                continue;
            };
            let start = (range.start as isize + delta) as usize;
            let end = (range.end as isize + delta) as usize;

            let (line_count, new_end) = replace_in_span(buf, &searcher, replacement, start, end);
            count += line_count;

            let line_end = new_end.unwrap_or(end);
            last_end = Some(line_end);

            if let Some(new_end) = new_end {
                replaced = true;
                let text = buf.text();
                // greatest end column seen over all the lines
                max_column = max_column.max(new_end - line_start(&text, new_end));
                delta += new_end as isize - end as isize;
            }
        }

        buf.end_undo_action();

        if count > 0 {
            self.push_undo(AttributeAction::BufferEdit);
        }
        show_replace_summary(self, count, pattern, replacement, ui);

        if !replaced {
            return Ok(None);
        }

        let buf = match self.buffer() {
            Some(buf) => buf,
            None => return Ok(None),
        };
        let text = buf.text();
        let last = last_end.unwrap_or(sel.anchor);
        let last_line_start = line_start(&text, last);

        // The rebuilt rectangle would wrap to the next line when the widest
        // column sticks out past the last line. Such a selection has nothing
        // to do with the original one, skip it.
        if line_content_len(&text, last_line_start) < max_column {
            return Ok(None);
        }

        Ok(Some((sel.anchor..last_line_start + max_column).into()))
    }
}

/// The replace loop shared by the range and rectangle entry points. `end`
/// always denotes the end of the as yet unprocessed original range.
fn replace_in_span(
    buf: &mut dyn Buffer,
    searcher: &Searcher,
    replacement: &str,
    mut start: usize,
    mut end: usize,
) -> (usize, Option<usize>) {
    let mut count = 0;

    loop {
        let text = buf.text();
        let mat = match searcher.find_at(&text, start) {
            Some(mat) if mat.start <= end => mat,
            _ => break, // no more matches in range
        };

        let find_len = mat.len();
        if find_len == 0 && replacement.is_empty() {
            break; // nothing to do
        }
        if mat.start + find_len > end {
            break; // found text is partly out of range
        }

        let mut move_past_eol = 0;
        if find_len == 0 {
            // a zero width match just before a line ending steps over it
            if matches!(text.as_bytes().get(mat.end), Some(b'\r') | Some(b'\n')) {
                move_past_eol = 1;
            }
        }

        let replace_len = buf.replace_range(mat.clone(), replacement);
        count += 1;

        if mat.start == end {
            break; // prevent a hang when replacing regex '$'
        }

        // continue after the replaced text
        start = mat.start + replace_len + move_past_eol;
        if find_len == 0 {
            // step one further so a zero width pattern cannot re-match
            // inside the text it just inserted
            let text = buf.text();
            start = position_after(&text, start);
        }
        end = end - find_len + replace_len;
    }

    if count > 0 {
        (count, Some(end))
    } else {
        (count, None)
    }
}

fn position_after(text: &str, pos: usize) -> usize {
    if pos >= text.len() {
        return pos + 1;
    }
    match text[pos..].chars().next() {
        Some(ch) => pos + ch.len_utf8(),
        None => pos + 1,
    }
}

fn line_start(text: &str, pos: usize) -> usize {
    text[..pos.min(text.len())]
        .rfind('\n')
        .map(|i| i + 1)
        .unwrap_or(0)
}

fn line_content_len(text: &str, line_start: usize) -> usize {
    let rest = &text[line_start.min(text.len())..];
    rest.find(['\n', '\r']).unwrap_or(rest.len())
}

fn show_replace_summary(
    doc: &Document,
    count: usize,
    pattern: &str,
    replacement: &str,
    ui: &mut dyn UiPrompt,
) {
    if count == 0 {
        ui.notify(&format!("No matches found for \"{pattern}\"."));
    } else {
        ui.notify(&format!(
            "{}: replaced {} occurrences of \"{}\" with \"{}\".",
            doc.display_name(),
            count,
            pattern,
            replacement
        ));
    }
}
