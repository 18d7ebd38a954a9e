use std::collections::BTreeMap;

use crate::config::DrsConfig;
use crate::facet;
use crate::resolver::ResolvedFacet;
use crate::walker::FileRecord;

/// Resolved facets of a file, keyed by facet name.
pub(crate) type ResolvedFields = BTreeMap<String, ResolvedFacet>;

/// Assembles Dataset Reference Syntax (DRS) identifiers.
#[derive(Debug, Clone)]
pub(crate) struct DrsBuilder {
    project: String,
    facets: Vec<String>,
}

impl DrsBuilder {
    pub(crate) fn new<P, I, S>(project: P, facets: I) -> Self
    where
        P: ToString,
        I: IntoIterator<Item = S>,
        S: ToString,
    {
        Self {
            project: project.to_string(),
            facets: facets.into_iter().map(|s| s.to_string()).collect(),
        }
    }

    pub(crate) fn from_config(config: &DrsConfig) -> Self {
        Self::new(&config.project, &config.facets)
    }

    /// The facets of an identifier, in order.
    #[inline]
    pub(crate) fn facets(&self) -> &[String] {
        &self.facets
    }

    /// Builds the DRS identifier of a file.
    ///
    /// Returns `None` if any facet is missing; a partial identifier is
    /// never returned.
    pub(crate) fn build(&self, fields: &ResolvedFields) -> Option<String> {
        let mut parts = Vec::with_capacity(self.facets.len() + 1);
        if !self.project.is_empty() {
            parts.push(self.project.clone());
        }

        for name in self.facets.iter() {
            let label = fields.get(name).map(|f| f.label.trim())?;
            if label.is_empty() {
                return None;
            }

            parts.push(sanitize(name, label));
        }

        Some(parts.join("."))
    }
}

fn sanitize(facet: &str, label: &str) -> String {
    let label = label.replace(['.', ' ', '/'], "-");
    if facet == facet::FREQUENCY {
        return label.replace("month", "mon").replace("year", "yr");
    }

    label
}

/// Files sharing the same DRS identifier.
#[derive(Debug)]
pub(crate) struct DrsGroup<'a> {
    pub(crate) drs: &'a str,
    pub(crate) files: Vec<&'a FileRecord>,
}

/// Groups files by their DRS identifier. Files without an identifier
/// are skipped. Groups are ordered by identifier, files by path.
pub(crate) fn group_by_drs<'a, I>(records: I) -> Vec<DrsGroup<'a>>
where
    I: IntoIterator<Item = &'a FileRecord>,
{
    let mut groups: BTreeMap<&str, Vec<&FileRecord>> = BTreeMap::new();
    for record in records {
        if let Some(ref drs) = record.drs {
            groups.entry(drs.as_str()).or_default().push(record);
        }
    }

    groups
        .into_iter()
        .map(|(drs, mut files)| {
            files.sort_by(|a, b| a.path.cmp(&b.path));
            files.dedup_by(|a, b| a.path == b.path);
            DrsGroup { drs, files }
        })
        .collect()
}
