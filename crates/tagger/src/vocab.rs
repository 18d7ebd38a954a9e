use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;

use csv::ReaderBuilder;
use serde::{Deserialize, Serialize};

use crate::prelude::*;

/// A term of the controlled vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct VocabularyEntry {
    /// The name of the property (facet) the term belongs to.
    pub(crate) property: String,

    /// The canonical term.
    pub(crate) term: String,

    /// The URL of the concept on the vocabulary server.
    pub(crate) url: String,

    /// The URL of a broader concept, e.g. the broader processing
    /// level of `L3C` or the programme of a platform.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) broader: Option<String>,
}

/// Maps non-compliant terms to canonical terms of a property.
#[derive(Debug, Default)]
pub(crate) struct AliasMap {
    inner: BTreeMap<String, BTreeMap<String, String>>,
}

impl AliasMap {
    fn insert(&mut self, property: &str, key: String, canonical: &str) {
        self.inner
            .entry(property.to_string())
            .or_default()
            .insert(key, canonical.to_string());
    }

    fn get(&self, property: &str, key: &str) -> Option<&str> {
        self.inner
            .get(property)
            .and_then(|aliases| aliases.get(key))
            .map(String::as_str)
    }

    pub(crate) fn len(&self) -> usize {
        self.inner.values().map(BTreeMap::len).sum()
    }
}

/// The vocabulary table and its alias table.
///
/// The vocabulary is built once at startup and is not modified while
/// datasets are processed.
#[derive(Debug, Default)]
pub(crate) struct Vocabulary {
    terms: BTreeMap<String, BTreeMap<String, Vec<VocabularyEntry>>>,
    aliases: AliasMap,
    case_ignore: bool,
}

impl Vocabulary {
    pub(crate) fn new(case_ignore: bool) -> Self {
        Self {
            case_ignore,
            ..Default::default()
        }
    }

    /// Loads the vocabulary table and the aliases given in the config.
    pub(crate) fn from_config(config: &Config) -> TaggerResult<Self> {
        let Some(path) = config.vocab_path() else {
            bail!("no vocabulary table configured (vocab.path)");
        };

        let file = File::open(&path).map_err(|e| {
            TaggerError::other(format!(
                "unable to open vocabulary '{}': {e}",
                path.display()
            ))
        })?;

        let mut vocab = Self::from_reader(file, config.vocab.case_ignore)?;
        for (property, aliases) in config.aliases.iter() {
            for (raw, canonical) in aliases.iter() {
                vocab.insert_alias(property, raw, canonical);
            }
        }

        Ok(vocab)
    }

    /// Reads vocabulary entries in CSV format.
    pub(crate) fn from_reader<R: Read>(
        reader: R,
        case_ignore: bool,
    ) -> TaggerResult<Self> {
        let mut vocab = Self::new(case_ignore);
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        for result in reader.deserialize() {
            let entry: VocabularyEntry = result?;
            if entry.property.is_empty()
                || entry.term.is_empty()
                || entry.url.is_empty()
            {
                log::warn!("skip incomplete vocabulary entry {entry:?}");
                continue;
            }

            vocab.insert(entry);
        }

        Ok(vocab)
    }

    #[inline]
    fn key(&self, term: &str) -> String {
        let term = term.trim();
        if self.case_ignore {
            term.to_ascii_lowercase()
        } else {
            term.to_string()
        }
    }

    /// Adds an entry to the table. Entries which only repeat an
    /// existing (property, term, url) triple are dropped.
    pub(crate) fn insert(&mut self, entry: VocabularyEntry) {
        let key = self.key(&entry.term);
        let entries = self
            .terms
            .entry(entry.property.clone())
            .or_default()
            .entry(key)
            .or_default();

        if !entries.iter().any(|e| e.url == entry.url) {
            entries.push(entry);
        }
    }

    pub(crate) fn insert_alias(
        &mut self,
        property: &str,
        raw: &str,
        canonical: &str,
    ) {
        let key = self.key(raw);
        self.aliases.insert(property, key, canonical);
    }

    /// Returns all entries of `property` matching `term`.
    pub(crate) fn lookup(
        &self,
        property: &str,
        term: &str,
    ) -> &[VocabularyEntry] {
        self.terms
            .get(property)
            .and_then(|terms| terms.get(&self.key(term)))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Returns the entry of `property` with the given URL.
    pub(crate) fn entry_by_url(
        &self,
        property: &str,
        url: &str,
    ) -> Option<&VocabularyEntry> {
        self.terms
            .get(property)?
            .values()
            .flatten()
            .find(|entry| entry.url == url)
    }

    /// Returns the canonical term for a non-compliant term.
    pub(crate) fn alias(&self, property: &str, raw: &str) -> Option<&str> {
        self.aliases.get(property, &self.key(raw))
    }

    /// Returns the number of terms in the table.
    pub(crate) fn len(&self) -> usize {
        self.terms
            .values()
            .flat_map(BTreeMap::values)
            .map(Vec::len)
            .sum()
    }

    pub(crate) fn aliases(&self) -> &AliasMap {
        &self.aliases
    }
}
