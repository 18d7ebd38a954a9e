//! Names of the facets (properties) the tagger knows about.

pub(crate) const BROADER_PROCESSING_LEVEL: &str = "broader_processing_level";
pub(crate) const DATA_TYPE: &str = "data_type";
pub(crate) const ECV: &str = "ecv";
pub(crate) const FREQUENCY: &str = "time_coverage_resolution";
pub(crate) const INSTITUTION: &str = "institution";
pub(crate) const PLATFORM: &str = "platform";
pub(crate) const PLATFORM_GROUP: &str = "platform_group";
pub(crate) const PLATFORM_PROGRAMME: &str = "platform_programme";
pub(crate) const PROCESSING_LEVEL: &str = "processing_level";
pub(crate) const PRODUCT_STRING: &str = "product_string";
pub(crate) const PRODUCT_VERSION: &str = "product_version";
pub(crate) const SENSOR: &str = "sensor";

/// Global attributes which are read from the data files.
pub(crate) const GLOBAL_ATTRS: [&str; 4] =
    [FREQUENCY, INSTITUTION, PLATFORM, SENSOR];

/// Facets which must not carry more than one term per file.
pub(crate) const SINGLE_VALUE: [&str; 5] = [
    BROADER_PROCESSING_LEVEL,
    DATA_TYPE,
    ECV,
    PROCESSING_LEVEL,
    PRODUCT_STRING,
];

/// Default order of the facets in a DRS identifier.
pub(crate) const DRS_ORDER: [&str; 8] = [
    ECV,
    FREQUENCY,
    PROCESSING_LEVEL,
    DATA_TYPE,
    SENSOR,
    PLATFORM,
    PRODUCT_STRING,
    PRODUCT_VERSION,
];

/// Returns the label used in a DRS identifier for a facet that holds
/// more than one distinct term.
pub(crate) fn multi_label(facet: &str) -> Option<&'static str> {
    match facet {
        FREQUENCY => Some("multi-frequency"),
        INSTITUTION => Some("multi-institution"),
        PLATFORM => Some("multi-platform"),
        SENSOR => Some("multi-sensor"),
        _ => None,
    }
}

/// Facets whose URLs are reported as MOLES tags.
pub(crate) const MOLES: [&str; 11] = [
    BROADER_PROCESSING_LEVEL,
    DATA_TYPE,
    ECV,
    FREQUENCY,
    INSTITUTION,
    PLATFORM,
    PLATFORM_GROUP,
    PLATFORM_PROGRAMME,
    PROCESSING_LEVEL,
    PRODUCT_STRING,
    SENSOR,
];

/// Whether the URLs of the facet are reported as MOLES tags.
pub(crate) fn is_moles_facet(facet: &str) -> bool {
    MOLES.contains(&facet)
}

/// Returns the facet of the broader concept of a term, e.g. the
/// programme a platform belongs to.
pub(crate) fn broader_facet(facet: &str) -> Option<&'static str> {
    match facet {
        PROCESSING_LEVEL => Some(BROADER_PROCESSING_LEVEL),
        PLATFORM => Some(PLATFORM_PROGRAMME),
        PLATFORM_PROGRAMME => Some(PLATFORM_GROUP),
        _ => None,
    }
}
