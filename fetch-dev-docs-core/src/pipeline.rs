//! High-level pipeline: orchestrates fetch → (clone + generate) → normalize → write.
//!
//! # Major Types
//! - [`Collected`]: everything gathered from the source repository, not yet written
//! - [`FetchReport`]: what was written (or left unchanged) in the content tree
//!
//! # Responsibilities
//! - Runs the independent fetches concurrently: API docs, code docs, the
//!   architecture overview, assets and, when configured, the generator
//! - Writes pages, the section index, assets and the main index
//! - Log-and-continue for individual files; only content tree write failures abort
//!
//! # Navigation
//! - Entrypoints: [`run`], or [`collect`] followed by [`write`] for dry runs

use std::path::PathBuf;
use tracing::{error, info, warn};

use crate::config::FetchConfig;
use crate::content_tree::{AssetReport, ContentTree, ContentTreeError, PageReport, WriteStatus};
use crate::contract::{Asset, DocPage, RepoContents};
use crate::extract;
use crate::rewrite::AssetLinkRewriter;
use crate::workspace;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("could not prepare output directories: {0}")]
    OutputDirectories(#[source] ContentTreeError),

    #[error("could not write content tree: {0}")]
    Write(#[from] ContentTreeError),
}

/// Pages in write order: API docs, code docs, architecture overview, generated pages.
#[derive(Debug, Clone, Default)]
pub struct Collected {
    pub pages: Vec<DocPage>,
    pub assets: Vec<Asset>,
}

#[derive(Debug, Clone, Default)]
pub struct FetchReport {
    pub section_dir: PathBuf,
    pub assets_dir: PathBuf,
    pub pages: Vec<PageReport>,
    pub assets: Vec<AssetReport>,
    pub main_meta_updated: bool,
}

impl FetchReport {
    pub fn pages_written(&self) -> usize {
        self.pages
            .iter()
            .filter(|p| p.status == WriteStatus::Written)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty() && self.assets.is_empty()
    }
}

async fn generated_pages(config: &FetchConfig, rewriter: &AssetLinkRewriter) -> Vec<DocPage> {
    let Some(generator) = config.generator.clone() else {
        return Vec::new();
    };
    let repo = config.repository.clone();
    let work_dir = config.work_dir();
    let rewriter = rewriter.clone();

    match tokio::task::spawn_blocking(move || {
        workspace::generate_pages(&repo, &generator, &work_dir, &rewriter)
    })
    .await
    {
        Ok(pages) => pages,
        Err(e) => {
            warn!(error = %e, "Generator task did not complete");
            Vec::new()
        }
    }
}

/// Gather pages and assets from the source repository.
pub async fn collect<C>(config: &FetchConfig, contents: &C) -> Collected
where
    C: RepoContents + ?Sized,
{
    info!(repo = %config.repository.slug(), "Fetching developer documentation");
    let rewriter = AssetLinkRewriter::new(&config.sources.asset_directories);

    let (api_docs, code_docs, architecture, assets, generated) = tokio::join!(
        extract::extract_api_docs(contents, &config.sources, &rewriter),
        extract::extract_code_docs(contents, &config.sources, &rewriter),
        extract::generate_architecture_doc(contents, &config.repository, &config.sources),
        extract::extract_assets(contents, &config.sources),
        generated_pages(config, &rewriter),
    );

    let mut pages = api_docs;
    pages.extend(code_docs);
    pages.push(architecture);
    pages.extend(generated);

    info!(pages = pages.len(), assets = assets.len(), "Collected developer documentation");
    Collected { pages, assets }
}

/// Write collected content into the site. Nothing is written when there are no pages.
pub fn write(config: &FetchConfig, collected: &Collected) -> Result<FetchReport, PipelineError> {
    let tree = ContentTree::new(&config.output, &config.repository.display_name);
    let mut report = FetchReport {
        section_dir: tree.section_dir(),
        assets_dir: tree.assets_dir().to_path_buf(),
        ..FetchReport::default()
    };

    if collected.pages.is_empty() {
        warn!("No documentation found to generate");
        return Ok(report);
    }

    tree.ensure_output_directories().map_err(|e| {
        error!(error = %e, "Could not create output directories");
        PipelineError::OutputDirectories(e)
    })?;

    report.pages = tree.write_documentation_files(&collected.pages)?;
    report.assets = tree.write_asset_files(&collected.assets)?;
    report.main_meta_updated = match tree.update_main_meta() {
        Ok(updated) => updated,
        Err(e) => {
            error!(error = %e, "Could not update main meta.json");
            false
        }
    };

    info!(
        pages = report.pages.len(),
        pages_written = report.pages_written(),
        assets = report.assets.len(),
        section_dir = %report.section_dir.display(),
        "Developer documentation generated"
    );
    Ok(report)
}

/// Collect then write.
pub async fn run<C>(config: &FetchConfig, contents: &C) -> Result<FetchReport, PipelineError>
where
    C: RepoContents + ?Sized,
{
    let collected = collect(config, contents).await;
    write(config, &collected)
}
