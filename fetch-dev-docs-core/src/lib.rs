#![doc = "fetch-dev-docs-core: core pipeline for mirroring developer documentation into a docs site."]

//! This crate contains the fetch → normalize → write pipeline and its data models.
//! The CLI crate only parses arguments, loads configuration and calls [`pipeline::run`].
//!
//! # Usage
//! Build a [`config::FetchConfig`], construct a [`github::GitHubContents`] (or any
//! other [`contract::RepoContents`]) and hand both to [`pipeline::run`].

pub mod config;
pub mod content_tree;
pub mod contract;
pub mod extract;
pub mod frontmatter;
pub mod github;
pub mod pipeline;
pub mod rewrite;
pub mod workspace;
