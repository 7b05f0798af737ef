#![allow(dead_code)]

use fetch_dev_docs_core::contract::{
    DirEntry, EntryKind, FetchError, MockRepoContents, RemoteFile,
};
use std::collections::HashMap;

/// In-memory repository served through `MockRepoContents`.
#[derive(Default)]
pub struct FakeRepo {
    files: HashMap<String, Vec<u8>>,
    failing: Vec<String>,
}

impl FakeRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file(mut self, path: &str, content: impl Into<Vec<u8>>) -> Self {
        self.files.insert(path.to_string(), content.into());
        self
    }

    /// Paths whose fetch or listing fails with a server error.
    pub fn failing(mut self, path: &str) -> Self {
        self.failing.push(path.to_string());
        self
    }

    fn listing(files: &HashMap<String, Vec<u8>>, dir: &str) -> Vec<DirEntry> {
        let prefix = format!("{dir}/");
        let mut entries: Vec<DirEntry> = Vec::new();
        let mut paths: Vec<&String> = files.keys().filter(|p| p.starts_with(&prefix)).collect();
        paths.sort();
        for path in paths {
            let rest = &path[prefix.len()..];
            match rest.split_once('/') {
                Some((sub, _)) => {
                    let sub_path = format!("{dir}/{sub}");
                    if !entries.iter().any(|e| e.path == sub_path) {
                        entries.push(DirEntry {
                            name: sub.to_string(),
                            path: sub_path,
                            kind: EntryKind::Dir,
                        });
                    }
                }
                None => entries.push(DirEntry {
                    name: rest.to_string(),
                    path: path.clone(),
                    kind: EntryKind::File,
                }),
            }
        }
        entries
    }

    pub fn into_mock(self) -> MockRepoContents {
        let mut mock = MockRepoContents::new();

        let files = self.files.clone();
        let failing = self.failing.clone();
        mock.expect_fetch_file().returning(move |path: &str| {
            if failing.iter().any(|f| f == path) {
                return Err(FetchError::Status {
                    status: 500,
                    path: path.to_string(),
                });
            }
            Ok(files.get(path).map(|content| RemoteFile {
                path: path.to_string(),
                sha: format!("sha-{path}"),
                content: content.clone(),
            }))
        });

        let files = self.files;
        let failing = self.failing;
        mock.expect_list_directory().returning(move |dir: &str| {
            if failing.iter().any(|f| f == dir) {
                return Err(FetchError::Status {
                    status: 500,
                    path: dir.to_string(),
                });
            }
            Ok(FakeRepo::listing(&files, dir))
        });

        mock
    }
}
