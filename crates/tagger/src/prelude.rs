pub(crate) use crate::config::Config;
pub(crate) use crate::error::{bail, TaggerError, TaggerResult};
pub(crate) use crate::progress::ProgressBarBuilder;
