use fetch_dev_docs_core::config::OutputConfig;
use fetch_dev_docs_core::content_tree::{ContentTree, ContentTreeError, WriteStatus};
use fetch_dev_docs_core::contract::{Asset, DocPage};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn tree_in(root: &Path) -> ContentTree {
    let output = OutputConfig {
        docs_root: root.join("content/docs"),
        section: "developers".to_string(),
        assets_dir: root.join("public"),
    };
    ContentTree::new(&output, "LangQuest")
}

fn page(filename: &str, content: &str, original_path: &str) -> DocPage {
    DocPage {
        filename: filename.to_string(),
        content: content.to_string(),
        original_path: original_path.to_string(),
    }
}

#[test]
fn writes_pages_and_section_meta() {
    let tmp = tempdir().unwrap();
    let tree = tree_in(tmp.path());
    tree.ensure_output_directories().unwrap();

    let reports = tree
        .write_documentation_files(&[
            page("README.mdx", "readme", "README.md"),
            page("architecture.mdx", "arch", "generated"),
            page("api/classes/Client.mdx", "client", "classes/Client.md"),
            page("api/index.mdx", "index", "index.md"),
        ])
        .unwrap();

    assert_eq!(reports.len(), 4);
    assert!(reports.iter().all(|r| r.status == WriteStatus::Written));
    let section = tmp.path().join("content/docs/developers");
    assert_eq!(fs::read_to_string(section.join("README.mdx")).unwrap(), "readme");
    assert_eq!(
        fs::read_to_string(section.join("api/classes/Client.mdx")).unwrap(),
        "client"
    );

    let meta: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(section.join("meta.json")).unwrap()).unwrap();
    assert_eq!(meta["title"], "Developer Documentation");
    assert_eq!(
        meta["description"],
        "Technical documentation automatically generated from the main LangQuest repository"
    );
    assert_eq!(meta["pages"], serde_json::json!(["README", "architecture", "api"]));
}

#[test]
fn duplicate_file_names_keep_first_position_and_last_content() {
    let tmp = tempdir().unwrap();
    let tree = tree_in(tmp.path());
    tree.ensure_output_directories().unwrap();

    let reports = tree
        .write_documentation_files(&[
            page("README.mdx", "root readme", "README.md"),
            page("API.mdx", "api", "docs/API.md"),
            page("README.mdx", "docs readme", "docs/README.md"),
        ])
        .unwrap();

    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0].filename, "README.mdx");
    assert_eq!(reports[0].original_path, "docs/README.md");
    let section = tmp.path().join("content/docs/developers");
    assert_eq!(
        fs::read_to_string(section.join("README.mdx")).unwrap(),
        "docs readme"
    );
    let meta: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(section.join("meta.json")).unwrap()).unwrap();
    assert_eq!(meta["pages"], serde_json::json!(["README", "API"]));
}

#[test]
fn unchanged_pages_are_not_rewritten() {
    let tmp = tempdir().unwrap();
    let tree = tree_in(tmp.path());
    tree.ensure_output_directories().unwrap();
    let pages = [page("setup.mdx", "same", "docs/setup.md")];

    let first = tree.write_documentation_files(&pages).unwrap();
    let second = tree.write_documentation_files(&pages).unwrap();

    assert_eq!(first[0].status, WriteStatus::Written);
    assert_eq!(second[0].status, WriteStatus::Unchanged);
    assert_eq!(first[0].content_hash, second[0].content_hash);
}

#[test]
fn unsafe_page_names_are_skipped() {
    let tmp = tempdir().unwrap();
    let tree = tree_in(tmp.path());
    tree.ensure_output_directories().unwrap();

    let reports = tree
        .write_documentation_files(&[page("../escape.mdx", "x", "evil.md"), page("ok.mdx", "y", "ok.md")])
        .unwrap();

    assert_eq!(reports.len(), 1);
    assert!(!tmp.path().join("content/docs/escape.mdx").exists());
}

#[test]
fn writes_assets_below_their_directory() {
    let tmp = tempdir().unwrap();
    let tree = tree_in(tmp.path());
    tree.ensure_output_directories().unwrap();

    let reports = tree
        .write_asset_files(&[
            Asset {
                filename: "home.png".to_string(),
                directory: "readme_images".to_string(),
                content: vec![1, 2, 3],
                original_path: "readme_images/home.png".to_string(),
            },
            Asset {
                filename: "flow.svg".to_string(),
                directory: "docs/images".to_string(),
                content: b"<svg/>".to_vec(),
                original_path: "docs/images/flow.svg".to_string(),
            },
        ])
        .unwrap();

    assert_eq!(reports.len(), 2);
    assert_eq!(
        fs::read(tmp.path().join("public/readme_images/home.png")).unwrap(),
        vec![1, 2, 3]
    );
    assert_eq!(
        fs::read(tmp.path().join("public/docs/images/flow.svg")).unwrap(),
        b"<svg/>".to_vec()
    );
}

#[test]
fn main_meta_gains_section_once_and_keeps_other_keys() {
    let tmp = tempdir().unwrap();
    let tree = tree_in(tmp.path());
    tree.ensure_output_directories().unwrap();
    let main_meta = tmp.path().join("content/docs/meta.json");
    fs::write(
        &main_meta,
        r#"{"title":"Docs","root":true,"pages":["index","getting-started"]}"#,
    )
    .unwrap();

    assert!(tree.update_main_meta().unwrap());
    assert!(!tree.update_main_meta().unwrap());

    let raw = fs::read_to_string(&main_meta).unwrap();
    let meta: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(
        meta["pages"],
        serde_json::json!(["index", "getting-started", "developers"])
    );
    assert_eq!(meta["root"], true);
    assert!(raw.find("\"title\"").unwrap() < raw.find("\"root\"").unwrap());
}

#[test]
fn main_meta_without_pages_gets_a_list() {
    let tmp = tempdir().unwrap();
    let tree = tree_in(tmp.path());
    tree.ensure_output_directories().unwrap();
    let main_meta = tmp.path().join("content/docs/meta.json");
    fs::write(&main_meta, r#"{"title":"Docs"}"#).unwrap();

    assert!(tree.update_main_meta().unwrap());
    let meta: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&main_meta).unwrap()).unwrap();
    assert_eq!(meta["pages"], serde_json::json!(["developers"]));
}

#[test]
fn missing_main_meta_is_an_error() {
    let tmp = tempdir().unwrap();
    let tree = tree_in(tmp.path());
    tree.ensure_output_directories().unwrap();

    assert!(matches!(
        tree.update_main_meta(),
        Err(ContentTreeError::Io { .. })
    ));
}

#[test]
fn main_meta_with_non_array_pages_is_an_error() {
    let tmp = tempdir().unwrap();
    let tree = tree_in(tmp.path());
    tree.ensure_output_directories().unwrap();
    let main_meta = tmp.path().join("content/docs/meta.json");
    fs::write(&main_meta, r#"{"pages":"x"}"#).unwrap();

    assert!(matches!(
        tree.update_main_meta(),
        Err(ContentTreeError::PagesNotAnArray { .. })
    ));
    assert_eq!(fs::read_to_string(&main_meta).unwrap(), r#"{"pages":"x"}"#);
}
