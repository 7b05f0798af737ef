//! Write step: pages, section `meta.json`, assets and the main `meta.json`.

use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info, warn};

use crate::config::OutputConfig;
use crate::contract::{Asset, DocPage};

#[derive(Debug, thiserror::Error)]
pub enum ContentTreeError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{path} is not a JSON object")]
    NotAnObject { path: PathBuf },

    #[error("`pages` in {path} is not an array")]
    PagesNotAnArray { path: PathBuf },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStatus {
    Written,
    Unchanged,
}

#[derive(Debug, Clone)]
pub struct PageReport {
    pub filename: String,
    pub original_path: String,
    pub content_hash: String,
    pub status: WriteStatus,
}

#[derive(Debug, Clone)]
pub struct AssetReport {
    pub path: PathBuf,
    pub size: usize,
    pub status: WriteStatus,
}

/// The parts of the site this tool writes into.
#[derive(Debug, Clone)]
pub struct ContentTree {
    docs_root: PathBuf,
    section: String,
    assets_dir: PathBuf,
    display_name: String,
}

pub fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Write `bytes` unless the file already holds exactly them.
fn write_if_changed(path: &Path, bytes: &[u8]) -> Result<WriteStatus, ContentTreeError> {
    if let Ok(existing) = fs::read(path) {
        if existing == bytes {
            debug!(path = %path.display(), "Unchanged, not rewriting");
            return Ok(WriteStatus::Unchanged);
        }
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| ContentTreeError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    fs::write(path, bytes).map_err(|source| ContentTreeError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(WriteStatus::Written)
}

/// Relative path made only of normal components.
fn is_safe_relative(path: &str) -> bool {
    !path.is_empty()
        && Path::new(path)
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
}

impl ContentTree {
    pub fn new(output: &OutputConfig, display_name: &str) -> Self {
        Self {
            docs_root: output.docs_root.clone(),
            section: output.section.clone(),
            assets_dir: output.assets_dir.clone(),
            display_name: display_name.to_string(),
        }
    }

    pub fn section_dir(&self) -> PathBuf {
        self.docs_root.join(&self.section)
    }

    pub fn assets_dir(&self) -> &Path {
        &self.assets_dir
    }

    pub fn ensure_output_directories(&self) -> Result<(), ContentTreeError> {
        for dir in [self.section_dir(), self.assets_dir.clone()] {
            fs::create_dir_all(&dir).map_err(|source| ContentTreeError::Io {
                path: dir.clone(),
                source,
            })?;
        }
        Ok(())
    }

    /// Write pages and the section `meta.json`.
    ///
    /// A later page with the same file name replaces an earlier one but keeps
    /// the earlier position.
    pub fn write_documentation_files(
        &self,
        pages: &[DocPage],
    ) -> Result<Vec<PageReport>, ContentTreeError> {
        let mut ordered: Vec<&DocPage> = Vec::new();
        let mut positions: HashMap<&str, usize> = HashMap::new();
        for page in pages {
            if !is_safe_relative(&page.filename) {
                warn!(filename = %page.filename, "Skipping page with unsafe file name");
                continue;
            }
            match positions.get(page.filename.as_str()) {
                Some(&i) => {
                    warn!(
                        filename = %page.filename,
                        replaced = %ordered[i].original_path,
                        by = %page.original_path,
                        "Duplicate page file name, later page wins"
                    );
                    ordered[i] = page;
                }
                None => {
                    positions.insert(page.filename.as_str(), ordered.len());
                    ordered.push(page);
                }
            }
        }

        info!(count = ordered.len(), "Writing documentation files");
        let section_dir = self.section_dir();
        let mut reports = Vec::with_capacity(ordered.len());
        for page in &ordered {
            let path = section_dir.join(&page.filename);
            let status = write_if_changed(&path, page.content.as_bytes())?;
            info!(filename = %page.filename, ?status, "Generated page");
            reports.push(PageReport {
                filename: page.filename.clone(),
                original_path: page.original_path.clone(),
                content_hash: content_hash(page.content.as_bytes()),
                status,
            });
        }

        let mut entries: Vec<&str> = Vec::new();
        for page in &ordered {
            let entry = page.meta_entry();
            if !entries.contains(&entry) {
                entries.push(entry);
            }
        }
        let meta = serde_json::json!({
            "title": "Developer Documentation",
            "description": format!(
                "Technical documentation automatically generated from the main {} repository",
                self.display_name
            ),
            "pages": entries,
        });
        let meta_path = section_dir.join("meta.json");
        let rendered = serde_json::to_string_pretty(&meta).map_err(|source| ContentTreeError::Json {
            path: meta_path.clone(),
            source,
        })?;
        write_if_changed(&meta_path, rendered.as_bytes())?;
        info!(pages = entries.len(), "Generated meta.json");

        Ok(reports)
    }

    /// Write assets to `<assets_dir>/<directory>/<filename>`.
    pub fn write_asset_files(&self, assets: &[Asset]) -> Result<Vec<AssetReport>, ContentTreeError> {
        info!(count = assets.len(), "Writing asset files");
        let mut reports = Vec::with_capacity(assets.len());
        for asset in assets {
            if !is_safe_relative(&asset.directory) || !is_safe_relative(&asset.filename) {
                warn!(directory = %asset.directory, filename = %asset.filename, "Skipping asset with unsafe path");
                continue;
            }
            let path = self.assets_dir.join(&asset.directory).join(&asset.filename);
            let status = write_if_changed(&path, &asset.content)?;
            info!(directory = %asset.directory, filename = %asset.filename, ?status, "Generated asset");
            reports.push(AssetReport {
                path,
                size: asset.content.len(),
                status,
            });
        }
        Ok(reports)
    }

    /// Add the section to the main `meta.json` page list. Returns whether the file changed.
    pub fn update_main_meta(&self) -> Result<bool, ContentTreeError> {
        let path = self.docs_root.join("meta.json");
        info!(path = %path.display(), "Updating main documentation meta");

        let raw = fs::read_to_string(&path).map_err(|source| ContentTreeError::Io {
            path: path.clone(),
            source,
        })?;
        let mut meta: serde_json::Value =
            serde_json::from_str(&raw).map_err(|source| ContentTreeError::Json {
                path: path.clone(),
                source,
            })?;
        let object = meta
            .as_object_mut()
            .ok_or_else(|| ContentTreeError::NotAnObject { path: path.clone() })?;

        let pages = object
            .entry("pages")
            .or_insert_with(|| serde_json::Value::Array(Vec::new()));
        let Some(pages) = pages.as_array_mut() else {
            return Err(ContentTreeError::PagesNotAnArray { path });
        };
        if pages.iter().any(|p| p.as_str() == Some(self.section.as_str())) {
            debug!(section = %self.section, "Section already listed in main meta");
            return Ok(false);
        }
        pages.push(serde_json::Value::String(self.section.clone()));

        let rendered = serde_json::to_string_pretty(&meta).map_err(|source| ContentTreeError::Json {
            path: path.clone(),
            source,
        })?;
        write_if_changed(&path, rendered.as_bytes())?;
        info!(section = %self.section, "Added section to main meta.json");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_parent_and_absolute_paths() {
        assert!(is_safe_relative("api/classes/Client.mdx"));
        assert!(!is_safe_relative("../escape.mdx"));
        assert!(!is_safe_relative("/etc/passwd"));
        assert!(!is_safe_relative(""));
    }

    #[test]
    fn content_hash_is_hex_sha256() {
        assert_eq!(
            content_hash(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
