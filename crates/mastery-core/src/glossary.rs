//! User-curated term/definition pairs, insertion-ordered.

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use indexmap::map::Entry;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlossaryItem {
    pub id: Uuid,
    pub term: String,
    pub definition: String,
    pub created_at: DateTime<Utc>,
}

impl GlossaryItem {
    fn new(term: &str, definition: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            term: term.to_string(),
            definition: definition.to_string(),
            created_at: Utc::now(),
        }
    }
}

/// Terms are unique case-insensitively; the original casing of the first
/// `add` wins and is preserved on the item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Glossary {
    items: IndexMap<String, GlossaryItem>,
}

impl Glossary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, term: &str, definition: &str) -> Result<&GlossaryItem> {
        let term = term.trim();
        if term.is_empty() {
            return Err(Error::EmptyTerm);
        }
        match self.items.entry(term.to_lowercase()) {
            Entry::Occupied(_) => Err(Error::DuplicateTerm {
                term: term.to_string(),
            }),
            Entry::Vacant(slot) => Ok(slot.insert(GlossaryItem::new(term, definition))),
        }
    }

    pub fn remove(&mut self, term: &str) -> Result<GlossaryItem> {
        let term = term.trim();
        self.items
            .shift_remove(&term.to_lowercase())
            .ok_or_else(|| Error::UnknownTerm {
                term: term.to_string(),
            })
    }

    pub fn get(&self, term: &str) -> Option<&GlossaryItem> {
        self.items.get(&term.trim().to_lowercase())
    }

    pub fn iter(&self) -> impl Iterator<Item = &GlossaryItem> {
        self.items.values()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
