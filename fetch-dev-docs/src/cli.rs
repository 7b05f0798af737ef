///
/// This module implements the CLI interface for fetch-dev-docs: command parsing,
/// flag overrides on top of the loaded config, and the user-visible summary.
///
/// All pipeline logic (fetching, normalizing, writing) lives in [`fetch-dev-docs-core`].
/// This module is strictly CLI glue.
///
/// ## How To Use
/// - From the site repository: `fetch-dev-docs fetch` mirrors into `content/docs/developers`.
/// - For programmatic/integration use: call [`run`] with a constructed [`Cli`].
///
/// [`fetch-dev-docs-core`]: ../../fetch-dev-docs-core/
use crate::load_config::{default_config, load_config};
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use fetch_dev_docs_core::config::FetchConfig;
use fetch_dev_docs_core::content_tree::WriteStatus;
use fetch_dev_docs_core::github::GitHubContents;
use fetch_dev_docs_core::pipeline::{self, Collected, FetchReport};
use std::path::PathBuf;

/// CLI for fetch-dev-docs: mirror developer documentation into the docs site.
#[derive(Parser)]
#[clap(
    name = "fetch-dev-docs",
    version,
    about = "Mirror developer documentation from the application repository into the docs site content tree"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch, normalize and write developer documentation
    Fetch(FetchArgs),
}

#[derive(Args, Default)]
pub struct FetchArgs {
    /// Path to a YAML config file; built-in defaults are used without one
    #[clap(long)]
    pub config: Option<PathBuf>,

    /// Source repository as owner/name
    #[clap(long)]
    pub repo: Option<String>,

    /// Branch, tag or commit to read instead of the default branch
    #[clap(long = "ref")]
    pub reference: Option<String>,

    /// Content tree root holding the main meta.json
    #[clap(long)]
    pub docs_root: Option<PathBuf>,

    /// Section directory below the content tree root
    #[clap(long)]
    pub section: Option<String>,

    /// Public assets directory
    #[clap(long)]
    pub assets_dir: Option<PathBuf>,

    /// Skip the clone + generator step even if configured
    #[clap(long)]
    pub no_generate: bool,

    /// Fetch and normalize, but print the plan instead of writing files
    #[clap(long)]
    pub dry_run: bool,
}

impl FetchArgs {
    fn apply(&self, config: &mut FetchConfig) -> Result<()> {
        if let Some(repo) = &self.repo {
            let (owner, name) = repo
                .split_once('/')
                .filter(|(o, n)| !o.is_empty() && !n.is_empty() && !n.contains('/'))
                .with_context(|| format!("--repo must be owner/name, got {repo:?}"))?;
            config.repository.owner = owner.to_string();
            config.repository.name = name.to_string();
        }
        if let Some(reference) = &self.reference {
            config.repository.reference = Some(reference.clone());
        }
        if let Some(docs_root) = &self.docs_root {
            config.output.docs_root = docs_root.clone();
        }
        if let Some(section) = &self.section {
            config.output.section = section.clone();
        }
        if let Some(assets_dir) = &self.assets_dir {
            config.output.assets_dir = assets_dir.clone();
        }
        if self.no_generate {
            config.generator = None;
        }
        Ok(())
    }
}

fn print_plan(collected: &Collected, config: &FetchConfig) {
    println!(
        "Dry run: {} pages for {}",
        collected.pages.len(),
        config.output.section_dir().display()
    );
    for page in &collected.pages {
        println!("  page  {} <- {}", page.filename, page.original_path);
    }
    for asset in &collected.assets {
        println!(
            "  asset {}/{} <- {}",
            asset.directory, asset.filename, asset.original_path
        );
    }
}

fn print_report(report: &FetchReport) {
    if report.pages.is_empty() {
        println!("No documentation found to generate");
        return;
    }
    for page in &report.pages {
        let marker = match page.status {
            WriteStatus::Written => "generated",
            WriteStatus::Unchanged => "unchanged",
        };
        println!("  {marker}: {}", page.filename);
    }
    println!(
        "Generated {} documentation files in {} ({} changed)",
        report.pages.len(),
        report.section_dir.display(),
        report.pages_written()
    );
    println!(
        "Generated {} asset files in {}",
        report.assets.len(),
        report.assets_dir.display()
    );
    if report.main_meta_updated {
        println!("Added section to main meta.json");
    }
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    // Emit a top-level 'trace_initialised' event at the very start
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Fetch(args) => {
            let mut config = match &args.config {
                Some(path) => load_config(path)?,
                None => default_config(),
            };
            args.apply(&mut config)?;
            config.trace_loaded();

            let contents = GitHubContents::from_config(&config.repository, config.token.as_deref())
                .context("Failed to construct GitHub client")?;

            println!(
                "Fetching developer documentation from {}...",
                config.repository.slug()
            );

            if args.dry_run {
                let collected = pipeline::collect(&config, &contents).await;
                tracing::info!(command = "fetch", dry_run = true, "Collected without writing");
                print_plan(&collected, &config);
                return Ok(());
            }

            match pipeline::run(&config, &contents).await {
                Ok(report) => {
                    tracing::info!(command = "fetch", pages = report.pages.len(), "Fetch complete");
                    print_report(&report);
                    Ok(())
                }
                Err(e) => {
                    tracing::error!(command = "fetch", error = %e, "Fetch failed");
                    Err(anyhow::Error::new(e).context("Error generating documentation"))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_config() {
        let args = FetchArgs {
            repo: Some("someone/app".to_string()),
            reference: Some("v2".to_string()),
            section: Some("dev".to_string()),
            no_generate: true,
            ..FetchArgs::default()
        };
        let mut config = FetchConfig::default();
        config.generator = serde_yaml::from_str("steps: []\noutput_dir: gen\n").unwrap();

        args.apply(&mut config).unwrap();

        assert_eq!(config.repository.slug(), "someone/app");
        assert_eq!(config.repository.reference.as_deref(), Some("v2"));
        assert_eq!(config.output.section_dir(), PathBuf::from("content/docs/dev"));
        assert!(config.generator.is_none());
    }

    #[test]
    fn malformed_repo_flag_is_rejected() {
        for bad in ["langquest", "/langquest", "owner/", "a/b/c"] {
            let args = FetchArgs {
                repo: Some(bad.to_string()),
                ..FetchArgs::default()
            };
            assert!(args.apply(&mut FetchConfig::default()).is_err(), "{bad} should fail");
        }
    }

    #[test]
    fn parses_fetch_flags() {
        let cli = Cli::try_parse_from([
            "fetch-dev-docs",
            "fetch",
            "--ref",
            "main",
            "--docs-root",
            "site/content/docs",
            "--dry-run",
        ])
        .unwrap();
        let Commands::Fetch(args) = cli.command;
        assert_eq!(args.reference.as_deref(), Some("main"));
        assert_eq!(args.docs_root, Some(PathBuf::from("site/content/docs")));
        assert!(args.dry_run);
        assert!(!args.no_generate);
    }
}
