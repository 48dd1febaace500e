//! URL handling module for Sumi-Press
//!
//! This module provides URL normalization, origin extraction, traversal scope
//! selection and artifact naming.

mod naming;
mod normalize;
mod origin;
mod scope;

// Re-export main functions
pub use naming::{derive_page_name, NameRegistry};
pub use normalize::{normalize_parsed, normalize_url};
pub use origin::Origin;
pub use scope::{ancestor_chain, seed_frontier, EntryKind, FrontierEntry, ScopeMode, Seed};
