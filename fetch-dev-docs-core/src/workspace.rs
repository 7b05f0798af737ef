//! Clone + generate step: run a source documentation generator against a local clone.
//!
//! The clone lives in a unique directory below the configured work dir and is
//! removed once generated pages have been collected, whether or not the
//! generator succeeded.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;
use tracing::{debug, error, info, warn};

use crate::config::{CommandSpec, GeneratorConfig, RepositoryConfig};
use crate::contract::DocPage;
use crate::extract::process_markdown;
use crate::rewrite::AssetLinkRewriter;

#[derive(Debug, thiserror::Error)]
pub enum WorkspaceError {
    #[error("failed to launch {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {status}")]
    ExitStatus { program: String, status: String },

    #[error("generator output directory {0} does not exist")]
    MissingOutput(PathBuf),

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> WorkspaceError + '_ {
    move |source| WorkspaceError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// A temporary local clone of the source repository. The directory is removed
/// on [`LocalClone::cleanup`] or when the value is dropped.
#[derive(Debug)]
pub struct LocalClone {
    dir: TempDir,
}

impl LocalClone {
    /// Clone `clone_url` into a fresh `fetch-dev-docs-*` directory below `work_dir`.
    ///
    /// Without a reference the clone is shallow. With one, the full history is
    /// fetched so that branches, tags and commit SHAs can all be checked out.
    pub fn create(
        clone_url: &str,
        reference: Option<&str>,
        work_dir: &Path,
    ) -> Result<Self, WorkspaceError> {
        fs::create_dir_all(work_dir).map_err(io_error(work_dir))?;
        let dir = tempfile::Builder::new()
            .prefix("fetch-dev-docs-")
            .tempdir_in(work_dir)
            .map_err(io_error(work_dir))?;

        let mut clone = Command::new("git");
        clone.arg("clone").arg("--quiet");
        if reference.is_none() {
            clone.arg("--depth").arg("1");
        }
        clone.arg(clone_url).arg(dir.path());
        run_command(&mut clone, "git clone")?;
        info!(repo_url = clone_url, path = %dir.path().display(), "Cloned repository");

        if let Some(reference) = reference {
            let mut checkout = Command::new("git");
            checkout
                .arg("-C")
                .arg(dir.path())
                .arg("checkout")
                .arg("--quiet")
                .arg(reference);
            run_command(&mut checkout, "git checkout")?;
            info!(reference, path = %dir.path().display(), "Checked out git reference");
        }

        Ok(LocalClone { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Remove the clone directory.
    pub fn cleanup(self) -> Result<(), WorkspaceError> {
        let path = self.dir.path().to_path_buf();
        self.dir.close().map_err(io_error(&path))?;
        debug!(path = %path.display(), "Removed temporary clone");
        Ok(())
    }
}

fn run_command(command: &mut Command, label: &str) -> Result<(), WorkspaceError> {
    debug!(command = ?command, "Running {label}");
    let status = command.status().map_err(|source| {
        error!(error = ?source, "Failed to launch {label}");
        WorkspaceError::Spawn {
            program: label.to_string(),
            source,
        }
    })?;
    if status.success() {
        Ok(())
    } else {
        error!(status = %status, "{label} exited with non-zero code");
        Err(WorkspaceError::ExitStatus {
            program: label.to_string(),
            status: status.to_string(),
        })
    }
}

/// Run each generator step inside the clone, stopping at the first failure.
pub fn run_generator(clone: &LocalClone, generator: &GeneratorConfig) -> Result<(), WorkspaceError> {
    for CommandSpec { program, args } in &generator.steps {
        info!(program = %program, ?args, "Running generator step");
        let mut command = Command::new(program);
        command.args(args).current_dir(clone.path());
        run_command(&mut command, program)?;
    }
    Ok(())
}

/// Turn every markdown file below the generator output into a page under `target_subdir`.
pub fn collect_generated(
    clone: &LocalClone,
    generator: &GeneratorConfig,
    rewriter: &AssetLinkRewriter,
) -> Result<Vec<DocPage>, WorkspaceError> {
    let root = clone.path().join(&generator.output_dir);
    if !root.is_dir() {
        return Err(WorkspaceError::MissingOutput(root));
    }

    let mut files = Vec::new();
    visit_markdown(&root, &mut files)?;
    files.sort();

    let target = generator.target_subdir.trim_matches('/');
    let mut pages = Vec::with_capacity(files.len());
    for file in files {
        let rel = relative_slash_path(&file, &root);
        let content = fs::read_to_string(&file).map_err(io_error(&file))?;
        match process_markdown(&content, &rel, rewriter) {
            Ok(content) => {
                let stem = rel
                    .strip_suffix(".mdx")
                    .or_else(|| rel.strip_suffix(".md"))
                    .unwrap_or(&rel);
                let filename = if target.is_empty() {
                    format!("{stem}.mdx")
                } else {
                    format!("{target}/{stem}.mdx")
                };
                debug!(filename = %filename, "Collected generated page");
                pages.push(DocPage {
                    filename,
                    content,
                    original_path: rel,
                });
            }
            Err(e) => warn!(path = %rel, error = %e, "Skipping generated page with unusable front matter"),
        }
    }
    info!(count = pages.len(), root = %root.display(), "Collected generated pages");
    Ok(pages)
}

fn visit_markdown(dir: &Path, results: &mut Vec<PathBuf>) -> Result<(), WorkspaceError> {
    for entry in fs::read_dir(dir).map_err(io_error(dir))? {
        let path = entry.map_err(io_error(dir))?.path();
        if path.is_dir() {
            visit_markdown(&path, results)?;
        } else if path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e == "md" || e == "mdx")
            .unwrap_or(false)
        {
            results.push(path);
        }
    }
    Ok(())
}

fn relative_slash_path(path: &Path, root: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Clone, generate, collect and clean up. Any failure is logged and yields no pages.
pub fn generate_pages(
    repo: &RepositoryConfig,
    generator: &GeneratorConfig,
    work_dir: &Path,
    rewriter: &AssetLinkRewriter,
) -> Vec<DocPage> {
    let clone_url = repo.clone_url();
    info!(repo_url = %clone_url, work_dir = %work_dir.display(), "Generating source documentation");

    let clone = match LocalClone::create(&clone_url, repo.reference.as_deref(), work_dir) {
        Ok(clone) => clone,
        Err(e) => {
            warn!(error = %e, "Could not clone repository, skipping generated documentation");
            return Vec::new();
        }
    };

    let pages = run_generator(&clone, generator).and_then(|()| collect_generated(&clone, generator, rewriter));

    if let Err(e) = clone.cleanup() {
        warn!(error = %e, "Could not remove temporary clone");
    }

    match pages {
        Ok(pages) => pages,
        Err(e) => {
            warn!(error = %e, "Documentation generator failed, skipping generated documentation");
            Vec::new()
        }
    }
}
