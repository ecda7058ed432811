//! In-memory catalog engine.
//!
//! Stores the attribute map of every indexed object and answers
//! [`CatalogQuery`]s by matching lowercased words (Unicode word boundaries)
//! against attribute values.
//!
//! Reindexing an object that is not in the catalog does nothing; only
//! `index` adds entries. Unindexing an absent object is also a no-op.

use std::collections::{BTreeMap, BTreeSet};

use ahash::AHashMap;
use log::debug;
use parking_lot::RwLock;
use unicode_segmentation::UnicodeSegmentation;

use crate::content::ContentObject;
use crate::engine::{CatalogQuery, IndexEngine, SearchHit, SearchResults, TermClause};
use crate::error::Result;
use crate::operation::TargetId;

type Entry = BTreeMap<String, String>;

#[derive(Debug, Default)]
struct CatalogState {
    entries: AHashMap<TargetId, Entry>,
    counter: u64,
}

/// Thread-safe in-memory catalog.
///
/// # Example
///
/// ```
/// use index_queue::content::ContentObject;
/// use index_queue::engine::memory::MemoryCatalog;
/// use index_queue::engine::{CatalogQuery, IndexEngine};
///
/// let catalog = MemoryCatalog::new();
/// let doc = ContentObject::new("/site/doc").with_attribute("title", "Hello World");
/// catalog.index(&doc).unwrap();
///
/// let results = catalog.search(&CatalogQuery::new().term("title", "hello")).unwrap();
/// assert_eq!(results.total_hits, 1);
/// ```
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    state: RwLock<CatalogState>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// The indexed attribute values of a target.
    pub fn entry(&self, target: &TargetId) -> Option<Entry> {
        self.state.read().entries.get(target).cloned()
    }

    pub fn contains(&self, target: &TargetId) -> bool {
        self.state.read().entries.contains_key(target)
    }

    pub fn len(&self) -> usize {
        self.state.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().entries.is_empty()
    }

    /// Every entry, ordered by target.
    pub fn snapshot(&self) -> BTreeMap<TargetId, Entry> {
        self.state
            .read()
            .entries
            .iter()
            .map(|(target, entry)| (target.clone(), entry.clone()))
            .collect()
    }
}

impl IndexEngine for MemoryCatalog {
    fn index(&self, object: &ContentObject) -> Result<()> {
        let mut state = self.state.write();
        state
            .entries
            .insert(object.id.clone(), object.attributes.clone());
        state.counter += 1;
        Ok(())
    }

    fn unindex(&self, target: &TargetId) -> Result<()> {
        let mut state = self.state.write();
        if state.entries.remove(target).is_some() {
            state.counter += 1;
        } else {
            debug!("unindex of {target}: not in catalog");
        }
        Ok(())
    }

    fn reindex(&self, object: &ContentObject, attributes: Option<&BTreeSet<String>>) -> Result<()> {
        let mut state = self.state.write();
        let Some(entry) = state.entries.get_mut(&object.id) else {
            debug!("reindex of {}: not in catalog", object.id);
            return Ok(());
        };

        match attributes {
            None => *entry = object.attributes.clone(),
            Some(names) => {
                for name in names {
                    match object.attributes.get(name) {
                        Some(value) => {
                            entry.insert(name.clone(), value.clone());
                        }
                        None => {
                            entry.remove(name);
                        }
                    }
                }
            }
        }
        state.counter += 1;
        Ok(())
    }

    fn search(&self, query: &CatalogQuery) -> Result<SearchResults> {
        let clauses: Vec<(Option<&str>, Vec<String>)> = query
            .clauses
            .iter()
            .map(|TermClause { attribute, text }| (attribute.as_deref(), words(text)))
            .collect();

        let state = self.state.read();
        let mut hits: Vec<SearchHit> = state
            .entries
            .iter()
            .filter(|(_, entry)| {
                clauses
                    .iter()
                    .all(|(attribute, terms)| matches_clause(entry, *attribute, terms))
            })
            .map(|(target, entry)| SearchHit {
                target: target.clone(),
                attributes: entry.clone(),
            })
            .collect();
        drop(state);

        hits.sort_by(|a, b| a.target.cmp(&b.target));
        let total_hits = hits.len();
        if let Some(limit) = query.limit {
            hits.truncate(limit);
        }

        Ok(SearchResults { hits, total_hits })
    }

    fn counter(&self) -> u64 {
        self.state.read().counter
    }
}

fn words(text: &str) -> Vec<String> {
    text.unicode_words().map(str::to_lowercase).collect()
}

fn matches_clause(entry: &Entry, attribute: Option<&str>, terms: &[String]) -> bool {
    let value_matches = |value: &String| {
        let value_words = words(value);
        terms.iter().all(|term| value_words.contains(term))
    };

    match attribute {
        Some(name) => entry.get(name).is_some_and(value_matches),
        None => entry.values().any(value_matches),
    }
}
