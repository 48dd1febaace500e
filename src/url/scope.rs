//! Traversal scope selection
//!
//! Computes the initial frontier of a job from its seed URL and scope mode.

use crate::url::normalize::normalize_parsed;
use crate::url::Origin;
use crate::UrlError;
use std::fmt;
use std::str::FromStr;
use url::Url;

/// Which URLs relative to the seed a job may export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeMode {
    /// Only the seed page
    Only,
    /// The seed plus same-origin pages discovered through links
    Children,
    /// The ancestor chain of the seed path, root first, then the seed
    Parents,
    /// The ancestor chain, then the seed and its discovered descendants
    Both,
}

impl ScopeMode {
    /// Returns true if pages reached from the seed are followed for links
    pub fn expands_descendants(&self) -> bool {
        matches!(self, Self::Children | Self::Both)
    }

    /// Returns true if the seed's ancestor paths are part of the frontier
    pub fn includes_ancestors(&self) -> bool {
        matches!(self, Self::Parents | Self::Both)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Only => "only",
            Self::Children => "children",
            Self::Parents => "parents",
            Self::Both => "both",
        }
    }
}

impl fmt::Display for ScopeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScopeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "only" => Ok(Self::Only),
            "children" => Ok(Self::Children),
            "parents" => Ok(Self::Parents),
            "both" => Ok(Self::Both),
            other => Err(format!(
                "unknown scope '{}', expected one of: only, children, parents, both",
                other
            )),
        }
    }
}

/// How an entry relates to the seed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    /// A path ancestor of the seed; never expanded
    Ancestor,
    /// The seed itself
    Seed,
    /// Reached from the seed through links
    Descendant,
}

/// A URL awaiting export together with its traversal depth
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontierEntry {
    pub url: Url,
    pub depth: u32,
    pub kind: EntryKind,
}

impl FrontierEntry {
    pub fn new(url: Url, depth: u32, kind: EntryKind) -> Self {
        Self { url, depth, kind }
    }
}

/// A validated seed: normalized URL plus its origin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seed {
    pub url: Url,
    pub origin: Origin,
}

impl Seed {
    /// Parses and validates a seed URL
    ///
    /// Only absolute `http`/`https` URLs with a host are accepted.
    pub fn parse(seed: &str) -> Result<Self, UrlError> {
        let parsed = Url::parse(seed.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;
        let url = normalize_parsed(parsed)?;
        let origin = Origin::of(&url)?;
        Ok(Self { url, origin })
    }
}

/// Returns the ancestor URLs of `url`, root first, excluding `url` itself
///
/// For `/a/b/c` this is `/`, `/a`, `/a/b`. Query and fragment are dropped
/// from ancestors.
pub fn ancestor_chain(url: &Url) -> Vec<Url> {
    let segments: Vec<&str> = url.path().split('/').filter(|s| !s.is_empty()).collect();

    (0..segments.len())
        .map(|n| {
            let mut ancestor = url.clone();
            ancestor.set_query(None);
            ancestor.set_fragment(None);
            if n == 0 {
                ancestor.set_path("/");
            } else {
                ancestor.set_path(&format!("/{}", segments[..n].join("/")));
            }
            ancestor
        })
        .collect()
}

/// Computes the initial frontier for a seed and scope mode
///
/// - `only` / `children`: the seed at depth 0
/// - `parents` / `both`: every ancestor at depth = ancestor index (root = 0),
///   followed by the seed at depth = number of ancestors
///
/// # Examples
///
/// ```
/// use sumi_press::url::{seed_frontier, ScopeMode, Seed};
///
/// let seed = Seed::parse("http://x.test/a/b/c").unwrap();
/// let frontier = seed_frontier(&seed, ScopeMode::Parents);
/// let urls: Vec<_> = frontier.iter().map(|e| (e.url.as_str(), e.depth)).collect();
/// assert_eq!(
///     urls,
///     vec![
///         ("http://x.test/", 0),
///         ("http://x.test/a", 1),
///         ("http://x.test/a/b", 2),
///         ("http://x.test/a/b/c", 3),
///     ]
/// );
/// ```
pub fn seed_frontier(seed: &Seed, scope: ScopeMode) -> Vec<FrontierEntry> {
    if !scope.includes_ancestors() {
        return vec![FrontierEntry::new(seed.url.clone(), 0, EntryKind::Seed)];
    }

    let mut entries: Vec<FrontierEntry> = ancestor_chain(&seed.url)
        .into_iter()
        .filter(|ancestor| *ancestor != seed.url)
        .enumerate()
        .map(|(index, url)| FrontierEntry::new(url, index as u32, EntryKind::Ancestor))
        .collect();

    let seed_depth = entries.len() as u32;
    entries.push(FrontierEntry::new(
        seed.url.clone(),
        seed_depth,
        EntryKind::Seed,
    ));
    entries
}
