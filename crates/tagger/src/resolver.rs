use std::collections::BTreeSet;

use crate::facet;
use crate::vocab::{Vocabulary, VocabularyEntry};

/// A raw term resolved to an entry of the vocabulary. The property of
/// the entry may differ from the resolved property, e.g. a platform
/// term which names a whole platform programme.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct CanonicalTerm {
    pub(crate) property: String,
    pub(crate) term: String,
    pub(crate) url: String,
    pub(crate) broader: Option<String>,
}

impl From<&VocabularyEntry> for CanonicalTerm {
    fn from(entry: &VocabularyEntry) -> Self {
        Self {
            property: entry.property.clone(),
            term: entry.term.clone(),
            url: entry.url.clone(),
            broader: entry.broader.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub(crate) enum ResolutionError {
    #[error("missing DRS facet '{property}'")]
    Missing { property: String },

    #[error("invalid value '{value}' for attribute '{property}'")]
    Unmapped { property: String, value: String },

    #[error(
        "value '{value}' for attribute '{property}' maps to \
        conflicting urls ({})", urls.join(", ")
    )]
    Ambiguous {
        property: String,
        value: String,
        urls: Vec<String>,
    },

    #[error(
        "attribute '{property}' takes a single value, got {}",
        values.join(", ")
    )]
    Conflict {
        property: String,
        values: Vec<String>,
    },
}

/// All terms of one facet of a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ResolvedFacet {
    pub(crate) property: String,

    /// The label used in a DRS identifier.
    pub(crate) label: String,

    /// The resolved terms; empty for facets outside the vocabulary.
    pub(crate) terms: Vec<CanonicalTerm>,
}

impl ResolvedFacet {
    /// Creates a facet whose value is taken as is.
    pub(crate) fn free<S: ToString>(property: &str, value: S) -> Self {
        Self {
            property: property.to_string(),
            label: value.to_string(),
            terms: vec![],
        }
    }
}

/// Resolves raw terms against the vocabulary.
#[derive(Debug)]
pub(crate) struct TermResolver<'a> {
    vocab: &'a Vocabulary,
    use_aliases: bool,
}

impl<'a> TermResolver<'a> {
    pub(crate) fn new(vocab: &'a Vocabulary, use_aliases: bool) -> Self {
        Self { vocab, use_aliases }
    }

    /// Resolves a single raw value of a property.
    ///
    /// A value found in the vocabulary is returned as is. Otherwise the
    /// alias table is consulted, but only if alias mapping is enabled.
    /// Platform values which aren't a platform may name a platform
    /// programme or a platform group.
    pub(crate) fn resolve(
        &self,
        property: &str,
        raw: &str,
    ) -> Result<CanonicalTerm, ResolutionError> {
        let raw = raw.trim();
        let mut entries = self.vocab.lookup(property, raw);

        if entries.is_empty() && self.use_aliases {
            if let Some(canonical) = self.vocab.alias(property, raw) {
                entries = self.vocab.lookup(property, canonical);
            }
        }

        if entries.is_empty() && property == facet::PLATFORM {
            entries = [facet::PLATFORM_PROGRAMME, facet::PLATFORM_GROUP]
                .into_iter()
                .map(|container| self.vocab.lookup(container, raw))
                .find(|entries| !entries.is_empty())
                .unwrap_or_default();
        }

        match entries {
            [] => Err(ResolutionError::Unmapped {
                property: property.into(),
                value: raw.into(),
            }),
            [entry] => Ok(entry.into()),
            entries => Err(ResolutionError::Ambiguous {
                property: property.into(),
                value: raw.into(),
                urls: entries.iter().map(|e| e.url.clone()).collect(),
            }),
        }
    }

    /// Resolves all values of a facet.
    ///
    /// Distinct terms of a multi-valued facet (e.g. `sensor`) are
    /// labeled with the facet's multi-label, whereas distinct terms of
    /// any other facet are a conflict. A single platform programme or
    /// group covers several platforms and gets the multi-label, too.
    pub(crate) fn resolve_facet<S: AsRef<str>>(
        &self,
        property: &str,
        values: &[S],
    ) -> Result<ResolvedFacet, Vec<ResolutionError>> {
        if values.is_empty() {
            return Err(vec![ResolutionError::Missing {
                property: property.into(),
            }]);
        }

        let mut terms = BTreeSet::new();
        let mut errors = vec![];

        for value in values {
            match self.resolve(property, value.as_ref()) {
                Ok(term) => {
                    terms.insert(term);
                }
                Err(e) => errors.push(e),
            }
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        let terms: Vec<CanonicalTerm> = terms.into_iter().collect();
        let distinct: BTreeSet<&str> =
            terms.iter().map(|t| t.term.as_str()).collect();

        let is_container = terms.iter().any(|t| t.property != property);
        let label = if distinct.len() == 1 && !is_container {
            terms[0].term.clone()
        } else if let Some(label) = facet::multi_label(property) {
            label.to_string()
        } else {
            return Err(vec![ResolutionError::Conflict {
                property: property.into(),
                values: distinct.into_iter().map(String::from).collect(),
            }]);
        };

        Ok(ResolvedFacet {
            property: property.into(),
            label,
            terms,
        })
    }

    /// Returns the broader concepts of a term together with their facet,
    /// e.g. the programme and the group of a platform.
    pub(crate) fn broader(&self, term: &CanonicalTerm) -> Vec<(&'static str, String)> {
        let mut concepts = vec![];
        let mut property = term.property.as_str();
        let mut url = term.broader.clone();

        while let (Some(next), Some(facet)) = (url, facet::broader_facet(property)) {
            url = self
                .vocab
                .entry_by_url(facet, &next)
                .and_then(|entry| entry.broader.clone());
            concepts.push((facet, next));
            property = facet;
        }

        concepts
    }
}
