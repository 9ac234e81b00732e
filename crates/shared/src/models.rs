//! Data model for the emote pipeline.
//!
//! A shard holds the results of crawling one query key; the catalog is the
//! union of all shards. Both serialize as a bare JSON object mapping an
//! emote code to the list of emote ids observed under it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Base URL for emote images on the CDN
pub const CDN_BASE_URL: &str = "https://cdn.betterttv.net/emote";

/// Image scale offered by the CDN
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageScale {
    X1,
    X2,
    X3,
}

impl ImageScale {
    pub fn as_str(&self) -> &str {
        match self {
            ImageScale::X1 => "1x",
            ImageScale::X2 => "2x",
            ImageScale::X3 => "3x",
        }
    }
}

/// Build the CDN image URL for an emote id at the given scale
pub fn emote_image_url(id: &str, scale: ImageScale) -> String {
    format!("{}/{}/{}", CDN_BASE_URL, id, scale.as_str())
}

/// Results of crawling a single query key: code -> ids, in arrival order.
///
/// Append-only while the key is being crawled, immutable once persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Shard {
    pub entries: BTreeMap<String, Vec<String>>,
}

impl Shard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an id to the entry for `code`, creating the entry if absent
    pub fn push(&mut self, code: &str, id: String) {
        self.entries.entry(code.to_string()).or_default().push(id);
    }

    /// Number of distinct codes in the shard
    pub fn code_count(&self) -> usize {
        self.entries.len()
    }

    /// Total number of id entries across all codes
    pub fn id_count(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One ranked match from a catalog search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchMatch {
    pub code: String,
    pub ids: Vec<String>,
}

/// The merged code -> ids mapping across all shards.
///
/// Ids for the same code from different shards are concatenated, never
/// deduplicated: the search is fuzzy, so the same emote legitimately
/// surfaces under overlapping keys, and every association is preserved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    pub entries: BTreeMap<String, Vec<String>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a shard into the catalog, concatenating per-code id lists
    pub fn absorb(&mut self, shard: Shard) {
        for (code, ids) in shard.entries {
            self.entries.entry(code).or_default().extend(ids);
        }
    }

    /// Number of distinct codes
    pub fn code_count(&self) -> usize {
        self.entries.len()
    }

    /// Total number of id entries across all codes
    pub fn id_count(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    /// Find codes containing `query` (case-insensitive), ranked by
    /// descending id count with ties broken by code
    pub fn search(&self, query: &str) -> Vec<SearchMatch> {
        let needle = query.to_lowercase();

        let mut matches: Vec<SearchMatch> = self
            .entries
            .iter()
            .filter(|(code, _)| code.to_lowercase().contains(&needle))
            .map(|(code, ids)| SearchMatch {
                code: code.clone(),
                ids: ids.clone(),
            })
            .collect();

        matches.sort_by(|a, b| {
            b.ids
                .len()
                .cmp(&a.ids.len())
                .then_with(|| a.code.cmp(&b.code))
        });

        matches
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shard(pairs: &[(&str, &[&str])]) -> Shard {
        let mut s = Shard::new();
        for (code, ids) in pairs {
            for id in *ids {
                s.push(code, id.to_string());
            }
        }
        s
    }

    #[test]
    fn test_shard_push_preserves_arrival_order() {
        let mut s = Shard::new();
        s.push("Kappa", "2".to_string());
        s.push("Kappa", "1".to_string());

        assert_eq!(s.entries["Kappa"], vec!["2", "1"]);
        assert_eq!(s.code_count(), 1);
        assert_eq!(s.id_count(), 2);
    }

    #[test]
    fn test_absorb_concatenates_without_dedup() {
        let mut catalog = Catalog::new();
        catalog.absorb(shard(&[("x", &["1", "2"])]));
        catalog.absorb(shard(&[("x", &["3"])]));

        assert_eq!(catalog.entries["x"], vec!["1", "2", "3"]);

        // Duplicate ids across shards are kept as-is
        catalog.absorb(shard(&[("x", &["1"])]));
        assert_eq!(catalog.entries["x"], vec!["1", "2", "3", "1"]);
    }

    #[test]
    fn test_search_ranking() {
        let mut catalog = Catalog::new();
        catalog.absorb(shard(&[
            ("foo", &["1"]),
            ("foobar", &["1", "2"]),
            ("bar", &["1"]),
        ]));

        let matches = catalog.search("foo");
        let codes: Vec<&str> = matches.iter().map(|m| m.code.as_str()).collect();
        assert_eq!(codes, vec!["foobar", "foo"]);
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let mut catalog = Catalog::new();
        catalog.absorb(shard(&[("KappaPride", &["1"])]));

        assert_eq!(catalog.search("kappa").len(), 1);
        assert_eq!(catalog.search("PRIDE").len(), 1);
        assert!(catalog.search("monka").is_empty());
    }

    #[test]
    fn test_serialized_shape_is_bare_mapping() {
        let s = shard(&[("Kappa", &["56e9f494fff3cc5c35e5287e"])]);
        let json = serde_json::to_string(&s).unwrap();
        assert_eq!(json, r#"{"Kappa":["56e9f494fff3cc5c35e5287e"]}"#);

        let back: Shard = serde_json::from_str(&json).unwrap();
        assert_eq!(back, s);
    }

    #[test]
    fn test_emote_image_url() {
        assert_eq!(
            emote_image_url("5590b223b344e2c42a9e28e3", ImageScale::X1),
            "https://cdn.betterttv.net/emote/5590b223b344e2c42a9e28e3/1x"
        );
        assert_eq!(ImageScale::X3.as_str(), "3x");
    }
}
