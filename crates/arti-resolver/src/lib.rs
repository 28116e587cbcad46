//! # arti-resolver
//!
//! Host-facing resolution surface: the `Resolver` capability set the
//! package manager's orchestrator drives, its artifactory-backed
//! implementation, the persisted package-metadata record, and the
//! standalone ref/tag/version query functions.

pub mod meta;
pub mod queries;
pub mod resolver;

// Re-export main types
pub use meta::PackageMeta;
pub use queries::{list_branches, list_refs, list_tags, list_versions};
pub use resolver::{ArtifactoryResolver, Resolver};
