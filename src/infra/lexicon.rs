//! Auto-style lexicon loading.
//!
//! One file per language, `<language>_auto_style_lexicon.txt`, one word per
//! line. Words outside the lexicon are swapped for `UNK` ids before a request
//! goes to the model.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::core::Language;

pub fn lexicon_path(dir: &Path, language: Language) -> PathBuf {
    dir.join(format!("{}_auto_style_lexicon.txt", language.name()))
}

/// Read one lexicon. Blank lines are skipped and surrounding whitespace
/// trimmed.
pub fn load_lexicon<P: AsRef<Path>>(path: P) -> Result<HashSet<String>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read lexicon {}", path.display()))?;

    Ok(content
        .lines()
        .map(str::trim)
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect())
}

/// Every lexicon present in `dir`. Languages without a file are left out and
/// pass through the engine without unknown-word gating.
pub fn load_lexicons(dir: &Path) -> Result<HashMap<Language, HashSet<String>>> {
    let mut lexicons = HashMap::new();
    for language in Language::ALL {
        let path = lexicon_path(dir, language);
        if !path.exists() {
            tracing::debug!(%language, path = %path.display(), "no lexicon");
            continue;
        }
        let words = load_lexicon(&path)?;
        tracing::debug!(%language, words = words.len(), "loaded lexicon");
        lexicons.insert(language, words);
    }
    Ok(lexicons)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_lexicon_trims_and_skips_blanks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("words.txt");
        std::fs::write(&path, "get\n  user \n\nname\r\n").unwrap();

        let words = load_lexicon(&path).unwrap();
        assert_eq!(words.len(), 3);
        assert!(words.contains("user"));
        assert!(words.contains("name"));
    }

    #[test]
    fn test_missing_lexicon_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_lexicon(dir.path().join("nope.txt")).unwrap_err();
        assert!(err.to_string().contains("Failed to read lexicon"));
    }

    #[test]
    fn test_load_lexicons_only_finds_present_languages() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(lexicon_path(dir.path(), Language::Python), "def\n").unwrap();

        let lexicons = load_lexicons(dir.path()).unwrap();
        assert_eq!(lexicons.len(), 1);
        assert!(lexicons[&Language::Python].contains("def"));
    }
}
