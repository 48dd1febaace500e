use crate::url::Origin;
use std::collections::{HashMap, HashSet};
use url::Url;

/// Derives a filesystem-safe artifact base name from a page URL
///
/// The origin is stripped, leading and trailing `/` are trimmed, the
/// remaining `/` become `_`, and any character outside `[A-Za-z0-9_-]`
/// becomes `_`. An empty result is `index`.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use sumi_press::url::{derive_page_name, Origin};
///
/// let url = Url::parse("https://example.com/docs/getting-started/").unwrap();
/// let origin = Origin::of(&url).unwrap();
/// assert_eq!(derive_page_name(&url, &origin), "docs_getting-started");
///
/// let root = Url::parse("https://example.com/").unwrap();
/// assert_eq!(derive_page_name(&root, &origin), "index");
/// ```
pub fn derive_page_name(url: &Url, origin: &Origin) -> String {
    let full = url.as_str();
    let origin_str = origin.to_string();

    let remainder = match full.strip_prefix(origin_str.as_str()) {
        Some(rest) if origin.contains(url) => rest,
        // Foreign URLs keep their whole serialization minus the scheme
        _ => full.split_once("://").map(|(_, rest)| rest).unwrap_or(full),
    };

    let name: String = remainder
        .trim_matches('/')
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if name.is_empty() {
        "index".to_string()
    } else {
        name
    }
}

/// Hands out artifact base names that are unique within one job
///
/// The first claim of a name returns it unchanged; later claims of the
/// same name get `-2`, `-3`, ... appended, skipping names already taken.
#[derive(Debug, Default)]
pub struct NameRegistry {
    used: HashSet<String>,
    next_suffix: HashMap<String, u32>,
}

impl NameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn claim(&mut self, base: &str) -> String {
        if self.used.insert(base.to_string()) {
            return base.to_string();
        }

        let suffix = self.next_suffix.entry(base.to_string()).or_insert(1);
        loop {
            *suffix += 1;
            let candidate = format!("{}-{}", base, suffix);
            if self.used.insert(candidate.clone()) {
                return candidate;
            }
        }
    }

    /// Number of distinct names handed out
    pub fn len(&self) -> usize {
        self.used.len()
    }

    pub fn is_empty(&self) -> bool {
        self.used.is_empty()
    }
}
