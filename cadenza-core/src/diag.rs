use std::ops::Range;

use ariadne::{Config, Label, Report, ReportKind, Source};

use crate::Error;

impl Error {
    fn label(&self) -> String {
        match self {
            Error::UnknownVariable { name, .. } => format!("`{name}` is not bound here"),
            Error::TypeMismatch { actual, .. } => format!("this has type `{actual}`"),
            Error::NotAFunction { actual, .. } => {
                format!("this has type `{actual}` and cannot take another argument")
            }
            Error::NullaryLambda { .. } => "no parameters".to_string(),
        }
    }

    pub fn report(&self) -> Report<'static, Range<usize>> {
        let (start, end) = self.span();
        Report::build(ReportKind::Error, start..end)
            .with_config(Config::default().with_color(false))
            .with_message(self.to_string())
            .with_label(Label::new(start..end).with_message(self.label()))
            .finish()
    }

    /// Renders the report against the text the failing term was parsed from.
    pub fn render(&self, src: &str) -> std::io::Result<String> {
        let mut buffer = Vec::new();
        self.report().write(Source::from(src), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}
