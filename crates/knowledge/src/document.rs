//! Textbook document parsing: front matter, markup stripping, chapter paths.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::path::{Component, Path};

/// Title used when a document declares none.
pub const DEFAULT_TITLE: &str = "No Title";

static FRONT_MATTER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)\A---[ \t]*\r?\n(.*?)\r?\n---[ \t]*(?:\r?\n|\z)")
        .expect("Invalid front matter regex")
});

static IMAGE_MARKUP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"!\[.*?\]\(.*?\)").expect("Invalid image regex"));

static LINK_MARKUP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[.*?\]\(.*?\)").expect("Invalid link regex"));

static ORDER_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{2}-").expect("Invalid order prefix regex"));

#[derive(Debug, Default, Deserialize)]
struct FrontMatter {
    #[serde(default)]
    id: Option<serde_yaml::Value>,
    #[serde(default)]
    title: Option<serde_yaml::Value>,
}

/// A parsed document ready for chunking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub doc_id: String,
    pub title: String,
    pub chapter_path: String,

    /// Text with front matter and image/link markup removed
    pub body: String,
}

impl Document {
    /// Parse the raw contents of `path`, a file below `root`.
    pub fn parse(root: &Path, path: &Path, raw: &str) -> Self {
        let (front, rest) = split_front_matter(raw);

        let doc_id = front
            .id
            .as_ref()
            .and_then(scalar_to_string)
            .unwrap_or_else(|| file_stem(path));
        let title = front
            .title
            .as_ref()
            .and_then(scalar_to_string)
            .unwrap_or_else(|| DEFAULT_TITLE.to_string());

        Self {
            doc_id,
            title,
            chapter_path: chapter_path(root, path),
            body: strip_markup(rest),
        }
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn scalar_to_string(value: &serde_yaml::Value) -> Option<String> {
    let text = match value {
        serde_yaml::Value::String(s) => s.trim().to_string(),
        serde_yaml::Value::Number(n) => n.to_string(),
        serde_yaml::Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

/// Split leading `---` front matter from the body.
///
/// Front matter that is not valid YAML is still removed; `id:` and `title:`
/// lines are then read individually.
fn split_front_matter(raw: &str) -> (FrontMatter, &str) {
    let Some(caps) = FRONT_MATTER.captures(raw) else {
        return (FrontMatter::default(), raw);
    };

    let block = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
    let rest = caps.get(0).map(|m| &raw[m.end()..]).unwrap_or(raw);

    let front = serde_yaml::from_str::<FrontMatter>(block).unwrap_or_else(|e| {
        tracing::debug!("Front matter is not valid YAML ({}), scanning lines", e);
        scan_front_matter(block)
    });

    (front, rest)
}

fn scan_front_matter(block: &str) -> FrontMatter {
    let mut front = FrontMatter::default();
    for line in block.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim().trim_matches(|c| c == '"' || c == '\'');
        let value = Some(serde_yaml::Value::String(value.to_string()));
        match key.trim() {
            "id" => front.id = value,
            "title" => front.title = value,
            _ => {}
        }
    }
    front
}

/// Remove image and link markup, including the link text.
pub fn strip_markup(text: &str) -> String {
    let without_images = IMAGE_MARKUP.replace_all(text, "");
    LINK_MARKUP.replace_all(&without_images, "").into_owned()
}

/// Path of `path` relative to `root`, without extension, `/`-separated,
/// with a leading two-digit ordering prefix (`01-`) removed.
pub fn chapter_path(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    let without_ext = relative.with_extension("");

    let joined = without_ext
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/");

    ORDER_PREFIX.replace(&joined, "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_front_matter_extracted() {
        let raw = "---\nid: inverse-kinematics\ntitle: Inverse Kinematics\nsidebar_position: 2\n---\n# IK\n\nIK solves joint angles.";
        let doc = Document::parse(
            Path::new("/docs"),
            Path::new("/docs/03-kinematics/ik.md"),
            raw,
        );

        assert_eq!(doc.doc_id, "inverse-kinematics");
        assert_eq!(doc.title, "Inverse Kinematics");
        assert_eq!(doc.chapter_path, "kinematics/ik");
        assert_eq!(doc.body, "# IK\n\nIK solves joint angles.");
    }

    #[test]
    fn test_defaults_without_front_matter() {
        let doc = Document::parse(Path::new("/docs"), Path::new("/docs/intro.mdx"), "Hello.");
        assert_eq!(doc.doc_id, "intro");
        assert_eq!(doc.title, DEFAULT_TITLE);
        assert_eq!(doc.body, "Hello.");
    }

    #[test]
    fn test_invalid_yaml_front_matter_is_scanned() {
        let raw = "---\ntitle: Sensors: An Overview\nid: sensors\n---\nBody.";
        let doc = Document::parse(Path::new("/d"), Path::new("/d/s.md"), raw);
        assert_eq!(doc.title, "Sensors: An Overview");
        assert_eq!(doc.doc_id, "sensors");
        assert_eq!(doc.body, "Body.");
    }

    #[test]
    fn test_numeric_id() {
        let raw = "---\nid: 42\n---\nBody.";
        let doc = Document::parse(Path::new("/d"), Path::new("/d/s.md"), raw);
        assert_eq!(doc.doc_id, "42");
    }

    #[test]
    fn test_strip_markup() {
        let text = "See ![robot arm](img/arm.png) and [the docs](https://ros.org) now.";
        assert_eq!(strip_markup(text), "See  and  now.");
    }

    #[test]
    fn test_chapter_path_prefix_stripped_once() {
        let root = PathBuf::from("/docs");
        assert_eq!(
            chapter_path(&root, &root.join("01-intro/02-setup.md")),
            "intro/02-setup"
        );
        assert_eq!(chapter_path(&root, &root.join("glossary.md")), "glossary");
    }
}
