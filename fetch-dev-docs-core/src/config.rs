use serde::Deserialize;
use std::path::PathBuf;
use tracing::{debug, info};

/// Everything one fetch run needs. All sections have defaults so a config
/// file only has to mention what differs.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub repository: RepositoryConfig,
    pub output: OutputConfig,
    pub sources: SourcesConfig,
    pub generator: Option<GeneratorConfig>,
    /// Parent directory for temporary clones. Falls back to the system temp dir.
    pub work_dir: Option<PathBuf>,
    /// Bearer token for the hosted API. Injected from the environment, never read from a file.
    #[serde(skip)]
    pub token: Option<String>,
}

impl FetchConfig {
    pub fn trace_loaded(&self) {
        info!(
            owner = %self.repository.owner,
            repo = %self.repository.name,
            reference = self.repository.reference.as_deref().unwrap_or("default branch"),
            section_dir = %self.output.section_dir().display(),
            assets_dir = %self.output.assets_dir.display(),
            generator = self.generator.is_some(),
            "Loaded FetchConfig"
        );
        debug!(sources = ?self.sources, "FetchConfig sources (full debug)");
    }

    pub fn work_dir(&self) -> PathBuf {
        self.work_dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RepositoryConfig {
    pub owner: String,
    pub name: String,
    /// Human-readable product name used in generated pages.
    pub display_name: String,
    /// Branch, tag or commit to read. `None` means the default branch.
    pub reference: Option<String>,
    pub api_base_url: String,
    /// Overrides the clone URL derived from owner and name.
    pub clone_url: Option<String>,
}

impl RepositoryConfig {
    pub fn slug(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }

    pub fn web_url(&self) -> String {
        format!("https://github.com/{}/{}", self.owner, self.name)
    }

    pub fn clone_url(&self) -> String {
        self.clone_url
            .clone()
            .unwrap_or_else(|| format!("{}.git", self.web_url()))
    }
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            owner: "genesis-ai-dev".to_string(),
            name: "langquest".to_string(),
            display_name: "LangQuest".to_string(),
            reference: None,
            api_base_url: "https://api.github.com".to_string(),
            clone_url: None,
        }
    }
}

/// Where results land in the site.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Root of the content tree; holds the main `meta.json`.
    pub docs_root: PathBuf,
    /// Subdirectory of `docs_root` owned by this tool.
    pub section: String,
    /// Public assets directory of the site.
    pub assets_dir: PathBuf,
}

impl OutputConfig {
    pub fn section_dir(&self) -> PathBuf {
        self.docs_root.join(&self.section)
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            docs_root: PathBuf::from("content/docs"),
            section: "developers".to_string(),
            assets_dir: PathBuf::from("public"),
        }
    }
}

/// Remote paths that are mirrored.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    pub api_files: Vec<String>,
    pub doc_directories: Vec<String>,
    pub asset_directories: Vec<String>,
    /// Manifest used for the architecture overview. Empty disables that page.
    pub package_manifest: String,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            api_files: owned(&[
                "README.md",
                "docs/README.md",
                "docs/API.md",
                "docs/api.md",
                "API.md",
                "api.md",
            ]),
            doc_directories: owned(&["docs", "documentation", "dev-docs"]),
            asset_directories: owned(&["readme_images", "assets", "docs/images", "images"]),
            package_manifest: "package.json".to_string(),
        }
    }
}

/// A source documentation generator run against a local clone.
#[derive(Debug, Clone, Deserialize)]
pub struct GeneratorConfig {
    /// Commands run in order inside the clone, e.g. install then generate.
    pub steps: Vec<CommandSpec>,
    /// Directory, relative to the clone, the generator writes markdown into.
    pub output_dir: PathBuf,
    /// Subdirectory of the section that receives generated pages.
    #[serde(default = "default_target_subdir")]
    pub target_subdir: String,
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn default_target_subdir() -> String {
    "api".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommandSpec {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_yaml_keeps_defaults_for_missing_sections() {
        let yaml = r#"
repository:
  owner: someone
  name: app
output:
  section: dev
"#;
        let config: FetchConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.repository.slug(), "someone/app");
        assert_eq!(config.repository.display_name, "LangQuest");
        assert_eq!(config.output.section_dir(), PathBuf::from("content/docs/dev"));
        assert_eq!(config.sources.api_files.len(), 6);
        assert!(config.generator.is_none());
    }

    #[test]
    fn clone_url_defaults_to_github() {
        let repo = RepositoryConfig::default();
        assert_eq!(repo.clone_url(), "https://github.com/genesis-ai-dev/langquest.git");
    }

    #[test]
    fn generator_target_subdir_defaults_to_api() {
        let yaml = r#"
steps:
  - program: npx
    args: [typedoc]
output_dir: docs-gen
"#;
        let generator: GeneratorConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(generator.target_subdir, "api");
        assert_eq!(generator.steps[0].args, vec!["typedoc".to_string()]);
    }
}
