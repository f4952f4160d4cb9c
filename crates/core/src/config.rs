use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use crate::model::Category;

pub const DEFAULT_CHUNK_CAPACITY: usize = 100;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClassifierConfig {
    #[serde(default = "default_image_extensions")]
    pub image_extensions: Vec<String>,
    #[serde(default = "default_video_extensions")]
    pub video_extensions: Vec<String>,
    #[serde(default = "default_document_extensions")]
    pub document_extensions: Vec<String>,
}

fn default_image_extensions() -> Vec<String> {
    to_strings(&[".jpg", ".jpeg", ".png", ".gif", ".bmp", ".webp"])
}

fn default_video_extensions() -> Vec<String> {
    to_strings(&[".mp4", ".avi", ".mov", ".mkv", ".wmv"])
}

fn default_document_extensions() -> Vec<String> {
    to_strings(&[".pdf", ".docx", ".txt", ".xlsx", ".pptx"])
}

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            image_extensions: default_image_extensions(),
            video_extensions: default_video_extensions(),
            document_extensions: default_document_extensions(),
        }
    }
}

impl ClassifierConfig {
    pub fn extensions_for(&self, category: Category) -> &[String] {
        match category {
            Category::Image => &self.image_extensions,
            Category::Video => &self.video_extensions,
            Category::Document => &self.document_extensions,
            Category::Other => &[],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SorterConfig {
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default = "default_chunk_capacity")]
    pub chunk_capacity: usize,
}

fn default_chunk_capacity() -> usize {
    DEFAULT_CHUNK_CAPACITY
}

impl Default for SorterConfig {
    fn default() -> Self {
        Self {
            classifier: ClassifierConfig::default(),
            chunk_capacity: DEFAULT_CHUNK_CAPACITY,
        }
    }
}

impl SorterConfig {
    /// Normalizes extension spellings and rejects configurations the classifier
    /// cannot represent.
    pub fn validate(mut self) -> Result<Self> {
        if self.chunk_capacity == 0 {
            return Err(anyhow!("chunk_capacity must be greater than zero"));
        }

        let mut owners: HashMap<String, Category> = HashMap::new();
        for category in [Category::Image, Category::Video, Category::Document] {
            let list = match category {
                Category::Image => &mut self.classifier.image_extensions,
                Category::Video => &mut self.classifier.video_extensions,
                _ => &mut self.classifier.document_extensions,
            };

            let mut normalized = Vec::with_capacity(list.len());
            for raw in list.iter() {
                let extension = normalize_extension(raw)
                    .ok_or_else(|| anyhow!("empty extension in {} set", category.as_str()))?;
                match owners.get(&extension) {
                    Some(owner) if *owner == category => continue,
                    Some(owner) => {
                        return Err(anyhow!(
                            "extension '{extension}' is listed for both {} and {}",
                            owner.as_str(),
                            category.as_str()
                        ));
                    }
                    None => {
                        owners.insert(extension.clone(), category);
                        normalized.push(extension);
                    }
                }
            }
            *list = normalized;
        }

        Ok(self)
    }
}

pub fn normalize_extension(raw: &str) -> Option<String> {
    let trimmed = raw.trim().trim_start_matches('.');
    if trimmed.is_empty() {
        return None;
    }
    Some(format!(".{}", trimmed.to_lowercase()))
}

pub fn load_config(path: &Path) -> Result<SorterConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let config: SorterConfig = serde_json::from_str(&text)
        .with_context(|| format!("failed to parse config {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("invalid config {}", path.display()))
}
