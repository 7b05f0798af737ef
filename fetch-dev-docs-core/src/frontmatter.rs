//! Front matter parsing and rendering.

use serde_yaml::{Mapping, Value};

/// A markdown document split into its front matter mapping and body.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub data: Mapping,
    pub body: String,
}

#[derive(Debug, thiserror::Error)]
pub enum FrontmatterError {
    #[error("Unclosed front matter block - missing closing ---")]
    Unclosed,

    #[error("Invalid YAML in front matter: {0}")]
    InvalidYaml(#[from] serde_yaml::Error),

    #[error("Front matter is not a mapping")]
    NotAMapping,
}

const DELIMITER: &str = "---";

/// Split `source` into front matter and body.
///
/// The block must open on the very first line. The body starts after the
/// closing delimiter line.
pub fn parse(source: &str) -> Result<Document, FrontmatterError> {
    let source = source.strip_prefix('\u{feff}').unwrap_or(source);

    let Some(after_open) = source.strip_prefix(DELIMITER) else {
        return Ok(Document {
            data: Mapping::new(),
            body: source.to_string(),
        });
    };
    // `----` or `---title` is not a delimiter line.
    let Some(after_open) = strip_line_break(after_open.trim_start_matches([' ', '\t'])) else {
        return Ok(Document {
            data: Mapping::new(),
            body: source.to_string(),
        });
    };

    let (yaml, rest) = split_at_closing(after_open).ok_or(FrontmatterError::Unclosed)?;

    let data = if yaml.trim().is_empty() {
        Mapping::new()
    } else {
        match serde_yaml::from_str::<Value>(yaml)? {
            Value::Mapping(map) => map,
            Value::Null => Mapping::new(),
            _ => return Err(FrontmatterError::NotAMapping),
        }
    };

    Ok(Document {
        data,
        body: strip_line_break(rest).unwrap_or(rest).to_string(),
    })
}

fn strip_line_break(s: &str) -> Option<&str> {
    s.strip_prefix("\r\n").or_else(|| s.strip_prefix('\n'))
}

/// Returns the YAML text and whatever follows the closing delimiter on its line.
fn split_at_closing(s: &str) -> Option<(&str, &str)> {
    if let Some(rest) = s.strip_prefix(DELIMITER) {
        if rest.is_empty() || rest.starts_with('\n') || rest.starts_with("\r\n") {
            return Some(("", rest));
        }
    }
    let mut offset = 0;
    for line in s.split_inclusive('\n') {
        let content = line.trim_end_matches(['\n', '\r']);
        if offset > 0 && content.trim_end() == DELIMITER {
            let rest = &s[offset + content.len()..];
            return Some((&s[..offset], rest));
        }
        offset += line.len();
    }
    None
}

impl Document {
    /// Ensure `title` and `description` are set, keeping every other key.
    ///
    /// Existing values win unless they are missing, null or an empty string.
    /// The result lists `title` and `description` first.
    pub fn with_defaults(mut self, title: &str, description: &str) -> Self {
        let title = take_non_empty(&mut self.data, "title").unwrap_or_else(|| title.into());
        let description =
            take_non_empty(&mut self.data, "description").unwrap_or_else(|| description.into());

        let mut data = Mapping::new();
        data.insert("title".into(), title);
        data.insert("description".into(), description);
        for (key, value) in std::mem::take(&mut self.data) {
            data.insert(key, value);
        }
        self.data = data;
        self
    }

    pub fn title(&self) -> Option<&str> {
        self.data.get("title").and_then(Value::as_str)
    }

    pub fn description(&self) -> Option<&str> {
        self.data.get("description").and_then(Value::as_str)
    }

    /// Render as `---\n<yaml>\n---\n<body>`, body terminated by a newline.
    pub fn stringify(&self) -> Result<String, FrontmatterError> {
        let mut out = String::new();
        if !self.data.is_empty() {
            let yaml = serde_yaml::to_string(&self.data)?;
            out.push_str(DELIMITER);
            out.push('\n');
            out.push_str(yaml.trim_end());
            out.push('\n');
            out.push_str(DELIMITER);
            out.push('\n');
        }
        out.push_str(&self.body);
        if !self.body.ends_with('\n') {
            out.push('\n');
        }
        Ok(out)
    }
}

fn take_non_empty(map: &mut Mapping, key: &str) -> Option<Value> {
    match map.shift_remove(key)? {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        value => Some(value),
    }
}
