use std::{
    fs,
    time::{Duration, SystemTime},
};

use crate::{document::DocumentId, documents::Documents};

/// Outcome of a disk staleness poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiskStatus {
    Unchanged,
    /// The file on disk is newer than the in memory timestamp, the caller
    /// decides whether to reload
    Changed,
    /// The file vanished from disk, the caller must offer a resave
    Missing,
}

impl Documents {
    /// Poll the on disk state of a document. Polls are rate limited by the
    /// configured interval unless `force` is set. Documents that were never
    /// saved to disk are never stale.
    pub fn check_disk_status(&mut self, id: DocumentId, force: bool) -> DiskStatus {
        let timeout = self.options.disk_check_timeout;
        if timeout == 0 {
            return DiskStatus::Unchanged;
        }

        let Some(doc) = self.get_mut(id) else {
            return DiskStatus::Unchanged;
        };
        if doc.real_path.is_none() {
            return DiskStatus::Unchanged;
        }

        let now = SystemTime::now();
        if !force {
            let elapsed = now
                .duration_since(doc.last_check)
                .unwrap_or(Duration::ZERO);
            if elapsed < Duration::from_secs(timeout) {
                return DiskStatus::Unchanged;
            }
        }
        doc.last_check = now;

        let Some(path) = doc.display_path.clone() else {
            return DiskStatus::Unchanged;
        };

        let disk_mtime = match fs::metadata(&path) {
            Ok(meta) => meta.modified().ok(),
            Err(err) => {
                // Vanished. The unsaved marker makes sure the content can
                // still be written back somewhere.
                log::warn!("File {} missing from disk: {err}", path.display());
                doc.set_changed(true);
                return DiskStatus::Missing;
            }
        };
        let Some(disk_mtime) = disk_mtime else {
            return DiskStatus::Unchanged;
        };

        let in_future = |t: &SystemTime| *t > now;
        if doc.mtime.as_ref().map(in_future).unwrap_or(false) || in_future(&disk_mtime) {
            log::warn!("Strange: something is wrong with the time stamps");
            return DiskStatus::Unchanged;
        }

        if doc.mtime.map(|t| t < disk_mtime).unwrap_or(false) {
            // Remember the new stamp either way so the same change is not
            // reported over and over
            doc.mtime = Some(disk_mtime);
            return DiskStatus::Changed;
        }

        DiskStatus::Unchanged
    }
}
