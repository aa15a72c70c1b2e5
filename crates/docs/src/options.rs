use rustc_hash::FxHashMap;
use serde::Deserialize;

/// File handling preferences
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FileOptions {
    /// Seconds between disk modification polls, 0 disables checking
    pub disk_check_timeout: u64,

    /// Convert tabs to spaces when saving
    pub replace_tabs: bool,

    /// Remove trailing spaces and tabs when saving
    pub strip_trailing_spaces: bool,

    /// Make sure saved files end in a newline
    pub final_new_line: bool,

    /// Charset for newly created files
    pub default_encoding: String,

    /// When set, open files with this charset instead of auto detection
    pub default_open_encoding: Option<String>,

    /// Spaces per tab for the save time tab conversion
    pub tab_width: u8,

    /// Filetype name to path glob patterns
    pub filetype_patterns: FxHashMap<String, Vec<String>>,
}

impl Default for FileOptions {
    fn default() -> Self {
        let mut filetype_patterns = FxHashMap::default();
        filetype_patterns.insert(
            "make".to_string(),
            vec![
                "Makefile*".into(),
                "makefile*".into(),
                "GNUmakefile".into(),
                "*.mk".into(),
            ],
        );

        FileOptions {
            disk_check_timeout: 30,
            replace_tabs: false,
            strip_trailing_spaces: false,
            final_new_line: true,
            default_encoding: "UTF-8".into(),
            default_open_encoding: None,
            tab_width: 8,
            filetype_patterns,
        }
    }
}
