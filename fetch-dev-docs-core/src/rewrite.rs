//! Path rewriting for mirrored markdown.
//!
//! Assets are published at the site root (`/<directory>/<file>`), so relative
//! image references into an asset directory become site-absolute. Relative
//! markdown links lose their extension and keep their directory part, so only
//! links between pages written to the same directory resolve after mirroring.

use regex::{Captures, Regex};
use std::sync::OnceLock;

/// Rewrites image references that point into the mirrored asset directories.
#[derive(Debug, Clone)]
pub struct AssetLinkRewriter {
    markdown_image: Option<Regex>,
    html_image: Option<Regex>,
}

impl AssetLinkRewriter {
    pub fn new<S: AsRef<str>>(asset_dirs: &[S]) -> Self {
        let dirs: Vec<String> = asset_dirs
            .iter()
            .map(|d| d.as_ref().trim_matches('/'))
            .filter(|d| !d.is_empty())
            .map(regex::escape)
            .collect();
        if dirs.is_empty() {
            return Self {
                markdown_image: None,
                html_image: None,
            };
        }
        let alternation = dirs.join("|");

        let markdown_image = Regex::new(&format!(
            r"!\[([^\]]*)\]\((?:\./)?((?:{alternation})/[^)\s]+)(\s+[^)]*)?\)"
        ))
        .ok();
        let html_image = Regex::new(&format!(
            r#"(<img\b[^>]*?\bsrc=["'])(?:\./)?((?:{alternation})/[^"']+)(["'])"#
        ))
        .ok();

        Self {
            markdown_image,
            html_image,
        }
    }

    pub fn rewrite(&self, body: &str) -> String {
        let mut out = body.to_string();
        if let Some(re) = &self.markdown_image {
            out = re
                .replace_all(&out, |caps: &Captures| {
                    format!(
                        "![{}](/{}{})",
                        &caps[1],
                        &caps[2],
                        caps.get(3).map(|m| m.as_str()).unwrap_or("")
                    )
                })
                .into_owned();
        }
        if let Some(re) = &self.html_image {
            out = re
                .replace_all(&out, |caps: &Captures| {
                    format!("{}/{}{}", &caps[1], &caps[2], &caps[3])
                })
                .into_owned();
        }
        out
    }
}

/// Drop `.md`/`.mdx` from relative markdown links, keeping any `#anchor`.
///
/// The directory part of the target is left untouched.
pub fn strip_markdown_extensions(body: &str) -> String {
    static LINK: OnceLock<Regex> = OnceLock::new();
    let re = LINK.get_or_init(|| {
        Regex::new(r"(\[[^\]]*\]\()([^)\s:#]+?)\.mdx?((?:#[^)\s]*)?(?:\s+[^)]*)?\))")
            .expect("static link pattern")
    });
    re.replace_all(body, |caps: &Captures| {
        let target = &caps[2];
        if target.starts_with("//") {
            return caps[0].to_string();
        }
        format!("{}{}{}", &caps[1], target, &caps[3])
    })
    .into_owned()
}
