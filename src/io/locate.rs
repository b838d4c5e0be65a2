use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::error::{PrepError, Result};

/// A file name pattern: `*.trs` matches by suffix, anything else by exact name.
/// Matching is case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionPattern(String);

impl ExtensionPattern {
    pub fn new(pattern: &str) -> Self {
        Self(pattern.to_string())
    }

    pub fn matches(&self, path: &Path) -> bool {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };
        match self.0.strip_prefix('*') {
            Some(suffix) => name.ends_with(suffix),
            None => name == self.0,
        }
    }
}

/// Every regular file under `dir`, recursively, sorted by path
pub fn list_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|e| PrepError::Walk {
            path: dir.to_path_buf(),
            source: e,
        })?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    debug!("Found {} files under {:?}", files.len(), dir);
    Ok(files)
}

/// Paths whose file name matches any of `patterns`.
///
/// Input order is kept and duplicates dropped, but callers should sort if they
/// need a particular order. No match is an empty result.
pub fn find_files_by_extension<I, P>(paths: I, patterns: &[&str]) -> Vec<PathBuf>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let patterns: Vec<ExtensionPattern> = patterns.iter().map(|p| ExtensionPattern::new(p)).collect();
    let mut seen = HashSet::new();

    paths
        .into_iter()
        .map(|p| p.as_ref().to_path_buf())
        .filter(|p| patterns.iter().any(|pattern| pattern.matches(p)))
        .filter(|p| seen.insert(p.clone()))
        .collect()
}

/// First path matching a group of patterns, trying groups in priority order.
///
/// Within a group the first path (in input order) matching any of its
/// patterns wins. Fails with [`PrepError::NotFound`] when no group matches.
pub fn find_first_file_by_extension<P: AsRef<Path>>(
    paths: &[P],
    groups: &[&[&str]],
) -> Result<PathBuf> {
    for group in groups {
        if let Some(found) = find_files_by_extension(paths, group).into_iter().next() {
            debug!("Matched {:?} with {:?}", found, group);
            return Ok(found);
        }
    }

    Err(PrepError::NotFound {
        patterns: groups
            .iter()
            .flat_map(|g| g.iter().map(|p| p.to_string()))
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths(names: &[&str]) -> Vec<PathBuf> {
        names.iter().map(|n| PathBuf::from("corpus").join(n)).collect()
    }

    fn names(found: &[PathBuf]) -> HashSet<String> {
        found
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_find_files_by_extension() {
        let files = paths(&["a.trs", "b.eaf", "c.py"]);
        let found = find_files_by_extension(&files, &["*.trs", "*.eaf"]);

        assert_eq!(found.len(), 2);
        assert_eq!(
            names(&found),
            ["a.trs", "b.eaf"]
                .iter()
                .map(|s| s.to_string())
                .collect::<HashSet<_>>()
        );
    }

    #[test]
    fn test_find_files_no_match_is_empty() {
        let files = paths(&["a.trs", "b.eaf"]);
        assert!(find_files_by_extension(&files, &["*.xlsx"]).is_empty());
    }

    #[test]
    fn test_find_files_is_case_sensitive_and_deduplicated() {
        let files = paths(&["a.TRS", "b.trs", "b.trs", "trs"]);
        let found = find_files_by_extension(&files, &["*.trs"]);
        assert_eq!(found, paths(&["b.trs"]));
    }

    #[test]
    fn test_exact_name_pattern() {
        let files = paths(&["ctm", "final.ctm.bak"]);
        assert_eq!(find_files_by_extension(&files, &["ctm"]), paths(&["ctm"]));
    }

    #[test]
    fn test_find_first_within_group_uses_input_order() {
        let files = paths(&["charm.xlsx", "howdy.txt", "python.xlsx", "test.py", "test.txt"]);

        let txt = find_first_file_by_extension(&files, &[&["*.txt"]]).unwrap();
        assert!(txt.ends_with("howdy.txt"));

        let either = find_first_file_by_extension(&files, &[&["*.py", "*.xlsx"]]).unwrap();
        assert!(either.ends_with("charm.xlsx"));
    }

    #[test]
    fn test_find_first_groups_in_priority_order() {
        let files = paths(&["charm.xlsx", "test.py"]);
        let found = find_first_file_by_extension(&files, &[&["*.py"], &["*.xlsx"]]).unwrap();
        assert!(found.ends_with("test.py"));

        let fallback = find_first_file_by_extension(&files, &[&["*.rtf"], &["*.xlsx"]]).unwrap();
        assert!(fallback.ends_with("charm.xlsx"));
    }

    #[test]
    fn test_find_first_not_found() {
        let files = paths(&["a.trs"]);
        let err = find_first_file_by_extension(&files, &[&["*.ctm"], &["ctm"]]).unwrap_err();
        match err {
            PrepError::NotFound { patterns } => assert_eq!(patterns, vec!["*.ctm", "ctm"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_list_files_recursive() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("b.trs"), "").unwrap();
        std::fs::write(dir.path().join("nested").join("a.eaf"), "").unwrap();

        let files = list_files(dir.path()).unwrap();
        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|f| f.is_file()));
    }
}
