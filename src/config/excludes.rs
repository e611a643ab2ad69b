//! Exclude pattern handling
//!
//! Exclude globs are matched against the URL-decoded suffix of a URL
//! relative to the crawl base (e.g. `sub/disk.iso`), not against local
//! filesystem paths. `*` is not separator-aware, so `*.iso` excludes ISO
//! files at any depth.

use std::fs;
use std::path::Path;

use glob::Pattern;

use crate::ConfigError;

/// A compiled, ordered set of exclude glob patterns
#[derive(Debug, Clone, Default)]
pub struct ExcludeSet {
    patterns: Vec<Pattern>,
}

impl ExcludeSet {
    /// Compiles a list of glob patterns
    ///
    /// Fails on the first pattern that does not compile, naming it.
    pub fn compile(patterns: &[String]) -> Result<Self, ConfigError> {
        let mut compiled = Vec::with_capacity(patterns.len());

        for pattern in patterns {
            let compiled_pattern =
                Pattern::new(pattern).map_err(|e| ConfigError::InvalidPattern {
                    pattern: pattern.clone(),
                    source: e,
                })?;
            compiled.push(compiled_pattern);
        }

        Ok(Self { patterns: compiled })
    }

    /// Reads raw patterns from an exclude file
    ///
    /// One pattern per line; surrounding whitespace is trimmed and blank
    /// lines are skipped. Compilation happens later, together with the
    /// patterns given directly on the command line.
    pub fn load_file(path: &Path) -> Result<Vec<String>, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ExcludeFile {
            path: path.to_path_buf(),
            source: e,
        })?;

        Ok(content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect())
    }

    /// Returns the text of the first pattern matching `suffix`, if any
    pub fn matched(&self, suffix: &str) -> Option<&str> {
        self.patterns
            .iter()
            .find(|p| p.matches(suffix))
            .map(|p| p.as_str())
    }

    /// Returns true if any pattern matches `suffix`
    pub fn is_match(&self, suffix: &str) -> bool {
        self.matched(suffix).is_some()
    }

    /// Returns the number of compiled patterns
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Returns true if the set holds no patterns
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}
