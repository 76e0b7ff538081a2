//! On-disk documentation bundles
//!
//! A docs directory holds a `handbook.json` manifest plus the Markdown files
//! it names. Sections backed by files become lazy: nothing is read until the
//! section is first opened or the background preload reaches it.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::error::DocsError;
use super::registry::{LoadedSection, Registry, Section, SubItem};

/// Manifest file name inside a docs directory
pub const MANIFEST_FILE: &str = "handbook.json";

/// Top-level manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    /// Product name shown in the header
    pub product: String,
    #[serde(default)]
    pub version: Option<String>,
    pub sections: Vec<ManifestSection>,
}

/// One guide in the manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestSection {
    pub key: String,
    pub title: String,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Inline Markdown
    #[serde(default)]
    pub content: Option<String>,
    /// Markdown file relative to the manifest
    #[serde(default)]
    pub file: Option<PathBuf>,
    #[serde(default)]
    pub sub_items: Vec<ManifestSubItem>,
}

/// A child page of a manifest section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestSubItem {
    pub key: String,
    pub title: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Manifest {
    /// Parse manifest JSON
    pub fn parse(json: &str) -> Result<Self, DocsError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read `handbook.json` from a docs directory
    pub fn load(dir: &Path) -> Result<Self, DocsError> {
        let path = dir.join(MANIFEST_FILE);
        let json = std::fs::read_to_string(&path).map_err(|e| DocsError::io(&path, e))?;
        Self::parse(&json)
    }

    /// Build the registry. File paths are resolved against `base_dir`.
    pub fn into_registry(self, base_dir: &Path) -> Result<Registry, DocsError> {
        let sections = self
            .sections
            .into_iter()
            .map(|section| build_section(section, base_dir))
            .collect::<Result<Vec<_>, _>>()?;
        Registry::new(sections)
    }
}

/// Load a docs directory straight into a registry
pub fn load_registry(dir: &Path) -> Result<(Manifest, Registry), DocsError> {
    let manifest = Manifest::load(dir)?;
    let registry = manifest.clone().into_registry(dir)?;
    tracing::info!(
        product = %manifest.product,
        sections = registry.len(),
        "Loaded documentation manifest from {}",
        dir.display()
    );
    Ok((manifest, registry))
}

fn build_section(section: ManifestSection, base_dir: &Path) -> Result<Section, DocsError> {
    let sub_items: Vec<SubItem> = section
        .sub_items
        .iter()
        .map(|item| {
            SubItem::new(&item.key, &item.title)
                .with_tags(item.tags.iter().cloned())
                .with_content(item.content.clone().unwrap_or_default())
        })
        .collect();

    let has_files =
        section.file.is_some() || section.sub_items.iter().any(|item| item.file.is_some());

    let built = if has_files {
        let loader = FileLoader {
            key: section.key.clone(),
            file: section.file.map(|file| base_dir.join(file)),
            inline: section.content,
            sub_files: section
                .sub_items
                .iter()
                .filter_map(|item| {
                    item.file.as_ref().map(|file| (item.key.clone(), base_dir.join(file)))
                })
                .collect(),
        };
        Section::lazy(&section.key, &section.title, move || loader.clone().load())
    } else {
        match section.content {
            Some(content) if !content.is_empty() => {
                Section::eager(&section.key, &section.title, content)
            }
            _ if !sub_items.is_empty() => Section::group(&section.key, &section.title),
            _ => return Err(DocsError::EmptySection(section.key)),
        }
    };

    Ok(built.with_tags(section.tags).with_sub_items(sub_items))
}

/// Reads a section's files when its content is first needed
#[derive(Debug, Clone)]
struct FileLoader {
    key: String,
    file: Option<PathBuf>,
    inline: Option<String>,
    sub_files: Vec<(String, PathBuf)>,
}

impl FileLoader {
    async fn load(self) -> Result<LoadedSection, DocsError> {
        let content = match &self.file {
            Some(path) => read(path).await?,
            None => self.inline.unwrap_or_default(),
        };

        let mut sub_items = HashMap::with_capacity(self.sub_files.len());
        for (key, path) in self.sub_files {
            sub_items.insert(key, read(&path).await?);
        }

        tracing::debug!(section = %self.key, bytes = content.len(), "Read section files");
        Ok(LoadedSection { content, sub_items })
    }
}

async fn read(path: &Path) -> Result<String, DocsError> {
    tokio::fs::read_to_string(path).await.map_err(|e| DocsError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docs::registry::SectionSource;
    use crate::docs::store::{ContentStore, LoadOutcome};

    const MANIFEST: &str = r###"{
        "product": "BookHere",
        "version": "v3.0.1",
        "sections": [
            { "key": "intro", "title": "Intro", "content": "# Hi" },
            { "key": "install", "title": "Installation", "tags": ["setup"], "file": "install.md" },
            {
                "key": "submission",
                "title": "App Submission",
                "sub_items": [
                    { "key": "play_store", "title": "Google Play", "file": "play.md" },
                    { "key": "app_store", "title": "App Store", "content": "## Apple" }
                ]
            },
            {
                "key": "faq",
                "title": "FAQ",
                "sub_items": [{ "key": "faq_login", "title": "Login", "content": "Reset it." }]
            }
        ]
    }"###;

    #[test]
    fn classifies_sources() {
        let registry = Manifest::parse(MANIFEST).unwrap().into_registry(Path::new(".")).unwrap();

        assert!(matches!(registry.section("intro").unwrap().source, SectionSource::Eager(_)));
        assert!(registry.section("install").unwrap().is_lazy());
        // A file on any sub-item makes the parent lazy
        assert!(registry.section("submission").unwrap().is_lazy());
        assert!(matches!(registry.section("faq").unwrap().source, SectionSource::Group));
        assert_eq!(registry.section("install").unwrap().tags, vec!["setup"]);
    }

    #[test]
    fn rejects_empty_section() {
        let json = r#"{ "product": "P", "sections": [{ "key": "a", "title": "A" }] }"#;
        let err = Manifest::parse(json).unwrap().into_registry(Path::new(".")).unwrap_err();
        assert!(matches!(err, DocsError::EmptySection(k) if k == "a"));
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(matches!(Manifest::parse("{"), Err(DocsError::Manifest(_))));
    }

    #[tokio::test]
    async fn lazy_sections_read_their_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(MANIFEST_FILE), MANIFEST).unwrap();
        std::fs::write(dir.path().join("install.md"), "# Install\nRun it.").unwrap();
        std::fs::write(dir.path().join("play.md"), "## Play Console").unwrap();

        let (manifest, registry) = load_registry(dir.path()).unwrap();
        assert_eq!(manifest.product, "BookHere");

        let store = ContentStore::new(registry);
        assert_eq!(store.ensure_loaded("install").await, LoadOutcome::Loaded);
        assert_eq!(store.active_content("install"), "# Install\nRun it.");

        assert_eq!(store.ensure_loaded("submission").await, LoadOutcome::Loaded);
        assert_eq!(store.active_content("submission"), "");
        assert_eq!(store.active_content("play_store"), "## Play Console");
        assert_eq!(store.active_content("app_store"), "## Apple");
    }

    #[tokio::test]
    async fn missing_file_fails_the_load() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(MANIFEST_FILE), MANIFEST).unwrap();

        let (_, registry) = load_registry(dir.path()).unwrap();
        let store = ContentStore::new(registry);
        let outcome = store.ensure_loaded("install").await;
        assert!(
            matches!(outcome, LoadOutcome::Failed(ref reason) if reason.contains("install.md"))
        );
    }

    #[test]
    fn missing_manifest_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(Manifest::load(dir.path()), Err(DocsError::Io { .. })));
    }
}
