//! Fetch step: pull pages, assets and the architecture overview from the remote repository.
//!
//! Every extractor follows the same contract: a failure to fetch or process an
//! individual file is logged with `warn!` and that file is skipped. Extractors
//! never fail as a whole.

use futures::future::join_all;
use regex::Regex;
use std::sync::OnceLock;
use tracing::{debug, info, warn};

use crate::config::{RepositoryConfig, SourcesConfig};
use crate::contract::{page_stem, Asset, DirEntry, DocPage, RemoteFile, RepoContents};
use crate::frontmatter::{self, FrontmatterError};
use crate::rewrite::{strip_markdown_extensions, AssetLinkRewriter};

/// Add front matter defaults and rewrite asset and page links.
pub fn process_markdown(
    content: &str,
    original_path: &str,
    rewriter: &AssetLinkRewriter,
) -> Result<String, FrontmatterError> {
    let document = frontmatter::parse(content)?.with_defaults(
        page_stem(original_path),
        &format!("Developer documentation from {original_path}"),
    );
    let body = strip_markdown_extensions(&rewriter.rewrite(&document.body));
    frontmatter::Document { body, ..document }.stringify()
}

/// `<stem>.mdx` for `.md` files; `.mdx` names are kept as is.
pub fn mdx_filename(name: &str) -> String {
    if name.ends_with(".mdx") {
        name.to_string()
    } else {
        format!("{}.mdx", page_stem(name))
    }
}

fn is_markdown(name: &str) -> bool {
    name.ends_with(".md") || name.ends_with(".mdx")
}

fn is_image(name: &str) -> bool {
    static IMAGE: OnceLock<Regex> = OnceLock::new();
    IMAGE
        .get_or_init(|| Regex::new(r"(?i)\.(jpg|jpeg|png|gif|webp|svg)$").expect("static image pattern"))
        .is_match(name)
}

async fn fetch_or_warn<C>(contents: &C, path: &str) -> Option<RemoteFile>
where
    C: RepoContents + ?Sized,
{
    match contents.fetch_file(path).await {
        Ok(Some(file)) => Some(file),
        Ok(None) => {
            debug!(path, "File not present in repository");
            None
        }
        Err(e) => {
            warn!(path, error = %e, "Could not fetch file");
            None
        }
    }
}

async fn list_or_warn<C>(contents: &C, path: &str) -> Vec<DirEntry>
where
    C: RepoContents + ?Sized,
{
    match contents.list_directory(path).await {
        Ok(entries) => entries,
        Err(e) => {
            warn!(path, error = %e, "Could not fetch directory");
            Vec::new()
        }
    }
}

fn to_page(file: &RemoteFile, filename: String, rewriter: &AssetLinkRewriter) -> Option<DocPage> {
    match process_markdown(&file.text(), &file.path, rewriter) {
        Ok(content) => Some(DocPage {
            filename,
            content,
            original_path: file.path.clone(),
        }),
        Err(e) => {
            warn!(path = %file.path, error = %e, "Skipping page with unusable front matter");
            None
        }
    }
}

/// Top-level documentation files such as `README.md` and `docs/API.md`.
pub async fn extract_api_docs<C>(
    contents: &C,
    sources: &SourcesConfig,
    rewriter: &AssetLinkRewriter,
) -> Vec<DocPage>
where
    C: RepoContents + ?Sized,
{
    info!(candidates = sources.api_files.len(), "Fetching API documentation");

    let fetched = join_all(sources.api_files.iter().map(|p| fetch_or_warn(contents, p))).await;
    let pages: Vec<DocPage> = fetched
        .into_iter()
        .flatten()
        .filter_map(|file| {
            let filename = format!("{}.mdx", file.stem());
            to_page(&file, filename, rewriter)
        })
        .collect();

    info!(count = pages.len(), "Fetched API documentation");
    pages
}

/// Markdown files directly inside the configured documentation directories.
pub async fn extract_code_docs<C>(
    contents: &C,
    sources: &SourcesConfig,
    rewriter: &AssetLinkRewriter,
) -> Vec<DocPage>
where
    C: RepoContents + ?Sized,
{
    info!(directories = ?sources.doc_directories, "Fetching code documentation");

    let mut pages = Vec::new();
    for dir in &sources.doc_directories {
        let entries: Vec<DirEntry> = list_or_warn(contents, dir)
            .await
            .into_iter()
            .filter(|e| e.is_file() && is_markdown(&e.name))
            .collect();
        debug!(directory = %dir, count = entries.len(), "Markdown files listed");

        let fetched = join_all(entries.iter().map(|e| fetch_or_warn(contents, &e.path))).await;
        for file in fetched.into_iter().flatten() {
            pages.extend(to_page(&file, mdx_filename(file.file_name()), rewriter));
        }
    }

    info!(count = pages.len(), "Fetched code documentation");
    pages
}

/// Images inside the configured asset directories.
pub async fn extract_assets<C>(contents: &C, sources: &SourcesConfig) -> Vec<Asset>
where
    C: RepoContents + ?Sized,
{
    info!(directories = ?sources.asset_directories, "Fetching assets");

    let mut assets = Vec::new();
    for dir in &sources.asset_directories {
        let images: Vec<DirEntry> = list_or_warn(contents, dir)
            .await
            .into_iter()
            .filter(|e| e.is_file() && is_image(&e.name))
            .collect();

        let fetched = join_all(images.iter().map(|e| fetch_or_warn(contents, &e.path))).await;
        for file in fetched.into_iter().flatten() {
            assets.push(Asset {
                filename: file.file_name().to_string(),
                directory: dir.trim_matches('/').to_string(),
                content: file.content,
                original_path: file.path,
            });
        }
    }

    info!(count = assets.len(), "Fetched assets");
    assets
}

/// Render the "Architecture Overview" page from the repository's package manifest.
pub async fn generate_architecture_doc<C>(
    contents: &C,
    repo: &RepositoryConfig,
    sources: &SourcesConfig,
) -> DocPage
where
    C: RepoContents + ?Sized,
{
    info!("Generating architecture documentation");

    let manifest = if sources.package_manifest.is_empty() {
        None
    } else {
        match fetch_or_warn(contents, &sources.package_manifest).await {
            Some(file) => match serde_json::from_slice::<serde_json::Value>(&file.content) {
                Ok(value) => Some(value),
                Err(e) => {
                    warn!(path = %file.path, error = %e, "Package manifest is not valid JSON");
                    None
                }
            },
            None => None,
        }
    };

    DocPage {
        filename: "architecture.mdx".to_string(),
        content: render_architecture(repo, manifest.as_ref()),
        original_path: "generated".to_string(),
    }
}

pub(crate) fn render_architecture(repo: &RepositoryConfig, manifest: Option<&serde_json::Value>) -> String {
    let name = &repo.display_name;
    let mut content = format!(
        "---\n\
         title: Architecture Overview\n\
         description: Technical overview of {name} architecture\n\
         ---\n\
         \n\
         # Architecture Overview\n\
         \n\
         This documentation is automatically generated from the main {name} repository.\n\
         \n\
         ## Project Structure\n\
         \n\
         {name} is built with modern web technologies designed for offline-first translation work.\n\
         \n"
    );

    if let Some(manifest) = manifest {
        content.push_str("## Dependencies\n\n### Main Dependencies\n");
        content.push_str(&dependency_list(manifest.get("dependencies")));
        content.push_str("\n\n### Development Dependencies\n");
        content.push_str(&dependency_list(manifest.get("devDependencies")));
        content.push_str("\n\n");
    }

    content.push_str(&format!(
        "## Getting Started\n\
         \n\
         For detailed setup instructions, see the main repository at [{slug}]({url}).\n\
         \n\
         *This documentation is automatically updated from the main repository.*\n",
        slug = repo.slug(),
        url = repo.web_url(),
    ));
    content
}

fn dependency_list(section: Option<&serde_json::Value>) -> String {
    let Some(map) = section.and_then(|v| v.as_object()) else {
        return String::new();
    };
    map.iter()
        .map(|(name, version)| match version.as_str() {
            Some(v) => format!("- **{name}**: {v}"),
            None => format!("- **{name}**: {version}"),
        })
        .collect::<Vec<_>>()
        .join("\n")
}
