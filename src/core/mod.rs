//! Core modules: document model, parsing, policy, rule engine, batch
//! validation, reporting, catalog export and the install manifest.

pub mod atomic;
pub mod catalog;
pub mod document;
pub mod error;
pub mod frontmatter;
pub mod manifest;
pub mod metadata;
pub mod output;
pub mod parser;
pub mod policy;
pub mod repo;
pub mod report;
pub mod rules;
pub mod time;
pub mod validate;
