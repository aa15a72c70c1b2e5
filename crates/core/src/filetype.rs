use std::path::Path;

use globset::Glob;
use rustc_hash::FxHashMap;

/// Capability tag controlling highlighting and symbol indexing for a
/// document. Determined from configured glob patterns, falling back to the
/// file extension.
#[derive(Debug, Hash, PartialEq, Eq, Ord, PartialOrd, Clone)]
pub struct Filetype {
    name: String,
}

impl Filetype {
    pub fn new(name: &str) -> Filetype {
        Filetype { name: name.into() }
    }

    pub fn determine(path: &Path, patterns: &FxHashMap<String, Vec<String>>) -> Option<Filetype> {
        for (ft, pats) in patterns {
            for pat in pats {
                let Ok(glob) = Glob::new(pat) else {
                    continue;
                };

                if glob.compile_matcher().is_match(path) {
                    return Some(Filetype {
                        name: ft.to_string(),
                    });
                }
            }
        }

        let ext = path.extension()?;
        let ftype = ext.to_string_lossy();
        Some(Filetype { name: ftype.into() })
    }

    pub fn as_str(&self) -> &str {
        &self.name
    }

    /// Makefiles are indented with hard tabs, save time tab conversion must
    /// leave them alone.
    pub fn is_make(&self) -> bool {
        matches!(self.name.as_str(), "make" | "makefile")
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::path::PathBuf;

    fn patterns() -> FxHashMap<String, Vec<String>> {
        let mut map = FxHashMap::default();
        map.insert(
            "make".to_string(),
            vec!["Makefile*".to_string(), "*.mk".to_string()],
        );
        map
    }

    #[test]
    fn determine_from_pattern() {
        let ft = Filetype::determine(&PathBuf::from("Makefile"), &patterns()).unwrap();
        assert_eq!(ft.as_str(), "make");
        assert!(ft.is_make());
    }

    #[test]
    fn determine_from_extension() {
        let ft = Filetype::determine(&PathBuf::from("main.rs"), &patterns()).unwrap();
        assert_eq!(ft.as_str(), "rs");
        assert!(!ft.is_make());
    }

    #[test]
    fn determine_unknown() {
        assert!(Filetype::determine(&PathBuf::from("README"), &patterns()).is_none());
    }
}
