use rustc_hash::{FxHashMap, FxHashSet};

use tekst_core::Filetype;

use crate::{
    collab::Highlighter,
    document::DocumentId,
    documents::{DocsError, Documents},
};

/// State for deferring highlight passes across a batch of opens, plus the
/// cache of shared per filetype keyword lists used to detect when existing
/// documents need a fresh pass.
#[derive(Default)]
pub(crate) struct Colourise {
    batch: Option<FxHashSet<usize>>,
    keywords: FxHashMap<String, String>,
}

impl Colourise {
    pub fn is_delayed(&self) -> bool {
        self.batch.is_some()
    }
}

impl Documents {
    /// Suppress highlight passes until `commit_colourise`. Documents opened
    /// in between are highlighted once, together. Calling this again before
    /// the matching commit is a usage error.
    pub fn delay_colourise(&mut self) -> Result<(), DocsError> {
        if self.colourise.batch.is_some() {
            log::error!("delay_colourise while a batch is already active");
            return Err(DocsError::DelayReentered);
        }

        let existing = self
            .docs
            .iter()
            .enumerate()
            .filter(|(_, doc)| doc.is_valid())
            .map(|(i, _)| i)
            .collect();
        self.colourise.batch = Some(existing);
        Ok(())
    }

    /// Highlight the documents opened during the batch, plus every existing
    /// document whose shared keyword list changed, each exactly once.
    pub fn commit_colourise(&mut self, hl: &mut dyn Highlighter) {
        let Some(before) = self.colourise.batch.take() else {
            log::error!("commit_colourise without an active batch");
            return;
        };

        let recolour = self.refresh_keywords(hl);

        let mut targets = Vec::new();
        for (i, doc) in self.docs.iter().enumerate() {
            if !doc.is_valid() {
                continue;
            }
            let is_new = !before.contains(&i);
            let keyword_user = doc
                .filetype
                .as_ref()
                .and_then(|ft| hl.keywords_for(ft))
                .is_some();
            if is_new || (recolour && keyword_user) {
                targets.push(DocumentId(i));
            }
        }

        for id in targets {
            hl.request_highlight(id);
        }
    }

    /// Refresh the cached keyword list of every filetype in use. Returns
    /// whether any list changed.
    pub(crate) fn refresh_keywords(&mut self, hl: &mut dyn Highlighter) -> bool {
        let filetypes: Vec<Filetype> = {
            let mut seen = Vec::new();
            for doc in self.docs.iter().filter(|d| d.is_valid()) {
                if let Some(ft) = &doc.filetype {
                    if !seen.contains(ft) {
                        seen.push(ft.clone());
                    }
                }
            }
            seen
        };

        let mut changed = false;
        for ft in filetypes {
            let Some(list) = hl.keywords_for(&ft) else {
                continue;
            };
            if self.colourise.keywords.get(ft.as_str()) != Some(&list) {
                self.colourise.keywords.insert(ft.as_str().to_string(), list);
                changed = true;
            }
        }
        changed
    }

    /// One highlight pass for every document whose filetype draws from the
    /// shared keyword lists
    pub(crate) fn highlight_keyword_users(&mut self, hl: &mut dyn Highlighter) {
        let ids: Vec<DocumentId> = self
            .docs
            .iter()
            .filter(|doc| doc.is_valid())
            .filter(|doc| {
                doc.filetype
                    .as_ref()
                    .and_then(|ft| hl.keywords_for(ft))
                    .is_some()
            })
            .map(|doc| doc.id)
            .collect();

        for id in ids {
            hl.request_highlight(id);
        }
    }
}
