pub(crate) type TaggerResult<T> = Result<T, TaggerError>;

macro_rules! bail {
    ($($arg:tt)*) => {{
        return Err(TaggerError::Other(format!($($arg)*)));
    }};
}

pub(crate) use bail;

#[derive(Debug, thiserror::Error)]
pub(crate) enum TaggerError {
    #[error(transparent)]
    IO(#[from] std::io::Error),

    #[error(transparent)]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Pattern(#[from] glob::PatternError),

    #[error("unable to write report '{path}': {source}")]
    ReportWrite {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    Other(String),
}

impl TaggerError {
    #[inline]
    pub(crate) fn other<T: ToString>(s: T) -> Self {
        Self::Other(s.to_string())
    }
}
