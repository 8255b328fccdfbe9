//! Settings for one run.
use std::{fmt, path::Path, sync::Arc};

use serde::Deserialize;
use snafu::ResultExt;

use crate::{parser::Annotation, report::GroupHeader, BoxError, ParseConfigSnafu, Result};

/// Turns an annotation into the line that represents it in the report.
pub type CommentHook = Arc<dyn Fn(&Annotation) -> Result<String, BoxError> + Send + Sync>;

/// Turns a file group's header into the line that introduces it in the report.
pub type HeaderHook = Arc<dyn Fn(&GroupHeader<'_>) -> Result<String, BoxError> + Send + Sync>;

/// Resolved settings for one pipeline run.
///
/// Every field has a default, so a partial JSON document is enough:
///
/// ```rust
/// use todo_report_lib::Config;
///
/// let config = Config::from_json(r#"{ "fileName": "NOTES.md", "padding": 1 }"#).unwrap();
/// assert_eq!(config.file_name, "NOTES.md");
/// assert_eq!(config.padding, 1);
/// assert_eq!(config.new_line, "\n");
/// assert!(!config.verbose);
/// ```
#[derive(Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// Name of the emitted report, relative to the first file's base.
    pub file_name: String,
    /// Empty lines between a group's header and its entries, and between groups.
    pub padding: usize,
    /// Joins the lines of the report.
    pub new_line: String,
    /// Surface every annotation to the observer as it is found.
    pub verbose: bool,
    #[serde(skip)]
    pub transform_comment: Option<CommentHook>,
    #[serde(skip)]
    pub transform_header: Option<HeaderHook>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            file_name: "TODO.md".into(),
            padding: 2,
            new_line: "\n".into(),
            verbose: false,
            transform_comment: None,
            transform_header: None,
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("file_name", &self.file_name)
            .field("padding", &self.padding)
            .field("new_line", &self.new_line)
            .field("verbose", &self.verbose)
            .field("transform_comment", &self.transform_comment.is_some())
            .field("transform_header", &self.transform_header.is_some())
            .finish()
    }
}

impl Config {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context(ParseConfigSnafu)
    }

    pub async fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = tokio::fs::read_to_string(path).await?;
        Self::from_json(&json)
    }

    pub fn with_transform_comment(
        mut self,
        hook: impl Fn(&Annotation) -> Result<String, BoxError> + Send + Sync + 'static,
    ) -> Self {
        self.transform_comment = Some(Arc::new(hook));
        self
    }

    pub fn with_transform_header(
        mut self,
        hook: impl Fn(&GroupHeader<'_>) -> Result<String, BoxError> + Send + Sync + 'static,
    ) -> Self {
        self.transform_header = Some(Arc::new(hook));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.file_name, "TODO.md");
        assert_eq!(config.padding, 2);
        assert_eq!(config.new_line, "\n");
        assert!(!config.verbose);
        assert!(config.transform_comment.is_none());
        assert!(config.transform_header.is_none());
    }

    #[test]
    fn json_overrides_defaults() {
        let config = Config::from_json(r#"{ "newLine": "\r\n", "verbose": true }"#).unwrap();
        assert_eq!(config.new_line, "\r\n");
        assert!(config.verbose);
        assert_eq!(config.file_name, "TODO.md");
    }

    #[test]
    fn bad_json_is_an_error() {
        let err = Config::from_json(r#"{ "padding": "lots" }"#).unwrap_err();
        assert!(matches!(err, crate::Error::ParseConfig { .. }));
    }
}
