pub(crate) use crate::config::Config;
pub(crate) use crate::error::{bail, TagcheckError, TagcheckResult};
pub(crate) use crate::search::SearchIndex;
