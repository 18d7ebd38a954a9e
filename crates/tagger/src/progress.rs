use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

pub(crate) struct ProgressBarBuilder {
    template: &'static str,
    quiet: bool,
    len: Option<u64>,
}

impl ProgressBarBuilder {
    pub(crate) fn new(template: &'static str, quiet: bool) -> Self {
        Self {
            template,
            quiet,
            len: None,
        }
    }

    pub(crate) fn len(mut self, len: u64) -> Self {
        self.len = Some(len);
        self
    }

    pub(crate) fn build(self) -> ProgressBar {
        if self.quiet {
            return ProgressBar::hidden();
        }

        let pbar = match self.len {
            Some(len) => ProgressBar::new(len),
            None => ProgressBar::new_spinner(),
        };

        pbar.set_draw_target(ProgressDrawTarget::stderr_with_hz(4));
        if let Ok(style) = ProgressStyle::with_template(self.template) {
            pbar.set_style(style);
        }

        pbar
    }
}
