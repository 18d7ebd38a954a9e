pub(crate) type TagcheckResult<T> = Result<T, TagcheckError>;

macro_rules! bail {
    ($($arg:tt)*) => {{
        return Err(TagcheckError::Other(format!($($arg)*)));
    }};
}

pub(crate) use bail;

#[derive(Debug, thiserror::Error)]
pub(crate) enum TagcheckError {
    #[error(transparent)]
    IO(#[from] std::io::Error),

    #[error(transparent)]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),

    #[error(transparent)]
    Template(#[from] handlebars::TemplateError),

    #[error(transparent)]
    Render(#[from] handlebars::RenderError),

    #[error("{0}")]
    Other(String),
}
