use std::collections::HashMap;
use std::path::Path;

use crate::config::ClassifierConfig;
use crate::model::Category;

/// Maps lower-cased extensions to categories. Built once from configuration;
/// `classify` is pure.
#[derive(Debug, Clone)]
pub struct Classifier {
    by_extension: HashMap<String, Category>,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(&ClassifierConfig::default())
    }
}

impl Classifier {
    pub fn new(config: &ClassifierConfig) -> Self {
        let mut by_extension = HashMap::new();
        for category in [Category::Image, Category::Video, Category::Document] {
            for extension in config.extensions_for(category) {
                by_extension.entry(extension.clone()).or_insert(category);
            }
        }
        Self { by_extension }
    }

    /// The caller lower-cases; anything unknown is `Other`.
    pub fn classify(&self, extension: &str) -> Category {
        self.by_extension
            .get(extension)
            .copied()
            .unwrap_or(Category::Other)
    }

    pub fn classify_path(&self, path: &Path) -> Category {
        self.classify(&extension_of(path))
    }
}

/// Lower-cased extension with its leading `.`, or an empty string.
///
/// Leading dots belong to the stem, so `.bashrc` and `...txt` have no
/// extension. `archive.tar.gz` has `.gz` and `notes.` has `.`.
pub fn extension_of(path: &Path) -> String {
    let Some(name) = path.file_name() else {
        return String::new();
    };
    let name = name.to_string_lossy();
    let stem = name.trim_start_matches('.');
    stem.rfind('.')
        .map(|index| stem[index..].to_lowercase())
        .unwrap_or_default()
}
