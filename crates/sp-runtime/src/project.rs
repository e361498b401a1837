use std::collections::BTreeMap;

use crate::position::same_file;
use crate::story::FileResolver;

/// The files of a loaded story project, keyed by the name the compiler sees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectSource {
    pub main_file: String,
    pub files: BTreeMap<String, String>,
}

impl ProjectSource {
    pub fn new(main_file: impl Into<String>, files: BTreeMap<String, String>) -> Self {
        Self {
            main_file: main_file.into(),
            files,
        }
    }

    pub fn single(main_file: impl Into<String>, source: impl Into<String>) -> Self {
        let main_file = main_file.into();
        let mut files = BTreeMap::new();
        files.insert(main_file.clone(), source.into());
        Self { main_file, files }
    }

    pub fn with_file(mut self, name: impl Into<String>, source: impl Into<String>) -> Self {
        self.files.insert(name.into(), source.into());
        self
    }

    /// Same leniency as cursor matching: exact name, then final component.
    pub fn contains_file(&self, path: &str) -> bool {
        self.files.contains_key(path) || self.files.keys().any(|name| same_file(name, path))
    }
}

impl FileResolver for ProjectSource {
    fn resolve(&self, path: &str) -> Option<String> {
        if let Some(source) = self.files.get(path) {
            return Some(source.clone());
        }
        self.files
            .iter()
            .find(|(name, _)| same_file(name, path))
            .map(|(_, source)| source.clone())
    }
}
