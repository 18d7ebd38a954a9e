use std::collections::BTreeMap;
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;

use crate::facet::{self, DATA_TYPE, ECV, PROCESSING_LEVEL, PRODUCT_STRING};

/// Raw metadata values of a file, grouped by facet.
pub(crate) type Fields = BTreeMap<String, Vec<String>>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub(crate) enum ExtractError {
    #[error("invalid filename format '{0}'")]
    InvalidFileName(String),

    #[error("unable to read metadata of '{path}': {reason}")]
    Unreadable { path: String, reason: String },
}

/// Extracts the metadata fields of a data file.
pub(crate) trait MetadataExtractor {
    fn extract(&self, path: &Path) -> Result<Fields, ExtractError>;
}

/// Reads facets from CCI file names.
///
/// The values of a file name are `-` delimited and come in two forms:
///
/// ```text
/// <date>[<time>]-ESACCI-<level>_<ecv>-<data type>-<product string>
///     [-<additional segregator>][-v<GDS version>]-fv<file version>.nc
///
/// ESACCI-<ecv>-<level>-<data type>-<product string>
///     [-<additional segregator>]-<date>[<time>]-fv<file version>.nc
/// ```
///
/// The file version is reported as product version.
#[derive(Debug, Default)]
pub(crate) struct FileNameExtractor;

impl FileNameExtractor {
    const ESACCI: &'static str = "ESACCI";
}

impl MetadataExtractor for FileNameExtractor {
    fn extract(&self, path: &Path) -> Result<Fields, ExtractError> {
        let name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default();
        let invalid = || ExtractError::InvalidFileName(name.to_string());

        let stem = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .ok_or_else(invalid)?;

        let segments: Vec<&str> = stem.split('-').collect();
        if segments.len() < 5 {
            return Err(invalid());
        }

        let (level, ecv) = if segments[1] == Self::ESACCI {
            segments[2].split_once('_').ok_or_else(invalid)?
        } else if segments[0] == Self::ESACCI {
            (segments[2], segments[1])
        } else {
            return Err(invalid());
        };

        let mut fields = Fields::new();
        for (facet, value) in [
            (PROCESSING_LEVEL, level),
            (ECV, ecv),
            (DATA_TYPE, segments[3]),
            (PRODUCT_STRING, segments[4]),
        ] {
            if value.is_empty() {
                return Err(invalid());
            }

            fields.insert(facet.into(), vec![value.into()]);
        }

        if let Some(version) = segments[5..]
            .iter()
            .rev()
            .find_map(|s| s.strip_prefix("fv"))
            .filter(|v| !v.is_empty())
        {
            fields.insert(facet::PRODUCT_VERSION.into(), vec![version.into()]);
        }

        Ok(fields)
    }
}

fn multi_platform_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(.*-)<(.*)>.*$").unwrap())
}

/// Splits a global attribute into its terms.
///
/// Terms are separated by `;` or `,`; `N/A` terms are dropped. Platform
/// values like `ERS-<1,2>` are expanded to `ERS-1` and `ERS-2`.
pub(crate) fn split_attribute(facet: &str, value: &str) -> Vec<String> {
    let mut terms: Vec<String> = vec![];

    if facet == facet::PLATFORM && value.contains('<') {
        for segment in value.split(", ") {
            match multi_platform_re().captures(segment.trim()) {
                Some(caps) => {
                    let prefix = &caps[1];
                    terms.extend(
                        caps[2].split(',').map(|s| format!("{prefix}{}", s.trim())),
                    );
                }
                None => terms.push(segment.to_string()),
            }
        }
    } else {
        terms.extend(value.split([';', ',']).map(String::from));
    }

    terms
        .into_iter()
        .map(|term| term.trim().to_string())
        .filter(|term| !term.is_empty() && term != "N/A")
        .collect()
}
