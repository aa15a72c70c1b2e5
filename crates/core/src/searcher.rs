use bitflags::bitflags;
use thiserror::Error;

use crate::BufferRange;

bitflags! {
    /// How a pattern is matched against document text.
    pub struct SearchFlags: u8 {
        const MATCH_CASE = 1 << 0;
        const REGEX      = 1 << 1;
        const BACKWARDS  = 1 << 2;
    }
}

#[derive(Debug, Error)]
pub enum PatternError {
    #[error("Invalid search pattern: {0}")]
    Invalid(#[from] regex::Error),
}

/// A compiled search pattern. Literal patterns are escaped and run through
/// the same matcher so case folding works for both kinds.
#[derive(Debug)]
pub struct Searcher {
    rx: regex::Regex,
    backwards: bool,
}

impl Searcher {
    pub fn new(pattern: &str, flags: SearchFlags) -> Result<Searcher, PatternError> {
        let is_regex = flags.contains(SearchFlags::REGEX);
        // Backwards searching is not supported for regex patterns, fall back
        // to a forward search
        let backwards = flags.contains(SearchFlags::BACKWARDS) && !is_regex;

        let pattern = if is_regex {
            pattern.to_string()
        } else {
            regex::escape(pattern)
        };
        let rx = regex::RegexBuilder::new(&pattern)
            .case_insensitive(!flags.contains(SearchFlags::MATCH_CASE))
            .multi_line(true)
            .build()?;

        Ok(Searcher { rx, backwards })
    }

    pub fn is_backwards(&self) -> bool {
        self.backwards
    }

    /// First match starting at or after `from`
    pub fn find_at(&self, text: &str, from: usize) -> Option<BufferRange> {
        if from > text.len() {
            return None;
        }

        let mat = self.rx.find_at(text, from)?;
        Some((mat.start()..mat.end()).into())
    }

    /// Last match ending at or before `to`
    pub fn find_before(&self, text: &str, to: usize) -> Option<BufferRange> {
        let to = to.min(text.len());
        self.rx
            .find_iter(text)
            .take_while(|m| m.end() <= to)
            .last()
            .map(|m| (m.start()..m.end()).into())
    }

    /// Find the next match from `pos` in the searcher's direction
    pub fn find(&self, text: &str, pos: usize) -> Option<BufferRange> {
        if self.backwards {
            self.find_before(text, pos)
        } else {
            self.find_at(text, pos)
        }
    }
}
