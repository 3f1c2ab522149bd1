//! In-memory storage for Gavel: base documents, rule mounts, and indices.
//!
//! This crate provides:
//! - [`DataStore`] - JSON-shaped base document plus named virtual documents
//! - [`Document`] - what a lookup returns: data or a rule set
//! - [`PathSeg`] - path segments for storage lookup
//! - [`Index`] - lazily built inverted maps over non-ground references

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod index;
pub mod store;

pub use index::Index;
pub use store::{format_path, ref_to_path, terms_to_path, DataStore, Document, PathSeg, RuleSet};
