//! # contract: seams of the fetch pipeline
//!
//! This module defines the trait the pipeline uses to read a remote repository
//! ([`RepoContents`]) together with the plain data types that cross it.
//!
//! - The production implementation talks to the GitHub contents API, see [`crate::github`].
//! - The trait is annotated for `mockall` so tests can script exactly which files exist.
//! - "Absent" is not an error: a missing file is `Ok(None)` and a missing directory is an empty listing.

use async_trait::async_trait;

#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;

/// Errors raised while talking to the remote repository.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status} for {path}")]
    Status { status: u16, path: String },

    #[error("invalid base64 content for {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: base64::DecodeError,
    },

    #[error("invalid JSON response: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

/// A file fetched from the remote repository, content already decoded.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteFile {
    pub path: String,
    pub sha: String,
    pub content: Vec<u8>,
}

impl RemoteFile {
    /// Content as UTF-8, invalid sequences replaced.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.content).into_owned()
    }

    /// Last path segment.
    pub fn file_name(&self) -> &str {
        file_name(&self.path)
    }

    /// File name without a `.md` or `.mdx` extension.
    pub fn stem(&self) -> &str {
        page_stem(&self.path)
    }
}

/// What a directory entry points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Dir,
    Symlink,
    Submodule,
}

/// One entry of a remote directory listing.
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
pub struct DirEntry {
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
}

impl DirEntry {
    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }
}

/// A page ready to be written below the section directory.
#[derive(Debug, Clone, PartialEq)]
pub struct DocPage {
    /// Path relative to the section directory, always ending in `.mdx`.
    pub filename: String,
    pub content: String,
    /// Where the page came from: a repository path, a generator output path or `generated`.
    pub original_path: String,
}

impl DocPage {
    /// Name under which the page is listed in the section `meta.json`.
    pub fn meta_entry(&self) -> &str {
        let first = self.filename.split('/').next().unwrap_or(&self.filename);
        first.strip_suffix(".mdx").unwrap_or(first)
    }
}

/// A binary asset mirrored into the site's public directory.
#[derive(Debug, Clone, PartialEq)]
pub struct Asset {
    pub filename: String,
    /// Repository directory the asset was listed from; reused below the assets dir.
    pub directory: String,
    pub content: Vec<u8>,
    pub original_path: String,
}

/// Read access to a hosted source repository.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait RepoContents: Send + Sync {
    /// Fetch a single file. `Ok(None)` when the path does not exist or is not a file.
    async fn fetch_file(&self, path: &str) -> Result<Option<RemoteFile>, FetchError>;

    /// List a directory. Empty when the path does not exist or is not a directory.
    async fn list_directory(&self, path: &str) -> Result<Vec<DirEntry>, FetchError>;
}

pub(crate) fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// File name without its `.md` or `.mdx` extension.
pub(crate) fn page_stem(path: &str) -> &str {
    let name = file_name(path);
    name.strip_suffix(".mdx")
        .or_else(|| name.strip_suffix(".md"))
        .unwrap_or(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_stem_strips_markdown_extensions_only() {
        assert_eq!(page_stem("docs/README.md"), "README");
        assert_eq!(page_stem("docs/guide.mdx"), "guide");
        assert_eq!(page_stem("notes.txt"), "notes.txt");
        assert_eq!(page_stem("API.md"), "API");
    }

    #[test]
    fn remote_file_name_and_stem() {
        let file = RemoteFile {
            path: "docs/guides/setup.mdx".to_string(),
            sha: String::new(),
            content: Vec::new(),
        };
        assert_eq!(file.file_name(), "setup.mdx");
        assert_eq!(file.stem(), "setup");
    }

    #[test]
    fn meta_entry_uses_first_segment_without_extension() {
        let page = |filename: &str| DocPage {
            filename: filename.to_string(),
            content: String::new(),
            original_path: String::new(),
        };
        assert_eq!(page("README.mdx").meta_entry(), "README");
        assert_eq!(page("api/classes/Client.mdx").meta_entry(), "api");
    }

    #[test]
    fn dir_entry_deserializes_github_listing_item() {
        let json = r#"{"name":"setup.md","path":"docs/setup.md","type":"file","sha":"abc","size":12}"#;
        let entry: DirEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.name, "setup.md");
        assert_eq!(entry.path, "docs/setup.md");
        assert!(entry.is_file());
    }
}
