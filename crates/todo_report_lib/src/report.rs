//! # Rendering the report document.
//!
//! Annotations are grouped by file, in the order each file first appears.
//! With the default configuration two annotations in two files render as:
//!
//! ```text
//! # TODOs
//!
//!
//! ### a.js
//!
//!
//! - TODO (line 3): fix parser
//!
//!
//! ### b.py
//!
//!
//! - FIXME (line 10): handle edge case
//! ```
use std::collections::HashMap;

use snafu::ResultExt;

use crate::{config::Config, parser::Annotation, Result, TransformSnafu};

/// The first line of every report.
pub const TITLE: &str = "# TODOs";

/// What a header hook gets to see about a file group.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GroupHeader<'a> {
    pub file_path: &'a str,
    /// How many annotations the group holds.
    pub count: usize,
}

/// All annotations from one file, in discovery order.
#[derive(Debug, PartialEq)]
pub struct FileGroup<'a> {
    pub file_path: &'a str,
    pub annotations: Vec<&'a Annotation>,
}

/// Group annotations by file path, ordering groups by first appearance.
pub fn group_by_file(annotations: &[Annotation]) -> Vec<FileGroup<'_>> {
    let mut groups: Vec<FileGroup<'_>> = vec![];
    let mut index: HashMap<&str, usize> = HashMap::new();
    for annotation in annotations.iter() {
        let path = annotation.file_path.as_str();
        let n = *index.entry(path).or_insert_with(|| {
            groups.push(FileGroup {
                file_path: path,
                annotations: vec![],
            });
            groups.len() - 1
        });
        groups[n].annotations.push(annotation);
    }
    groups
}

/// The header line used when no header hook is configured.
pub fn default_header(header: &GroupHeader<'_>) -> String {
    format!("### {}", header.file_path)
}

/// The entry line used when no comment hook is configured.
///
/// ```rust
/// use todo_report_lib::{report::default_comment, Annotation, Kind};
///
/// let annotation = Annotation {
///     kind: Kind::Fixme,
///     text: "handle edge case".into(),
///     file_path: "b.py".into(),
///     line: 10,
/// };
/// assert_eq!(default_comment(&annotation), "- FIXME (line 10): handle edge case");
/// ```
pub fn default_comment(annotation: &Annotation) -> String {
    if annotation.text.is_empty() {
        format!("- {} (line {})", annotation.kind, annotation.line)
    } else {
        format!(
            "- {} (line {}): {}",
            annotation.kind, annotation.line, annotation.text
        )
    }
}

fn header_line(config: &Config, header: &GroupHeader<'_>) -> Result<String> {
    match config.transform_header.as_ref() {
        Some(hook) => hook(header).context(TransformSnafu {
            target: "transformHeader",
        }),
        None => Ok(default_header(header)),
    }
}

fn comment_line(config: &Config, annotation: &Annotation) -> Result<String> {
    match config.transform_comment.as_ref() {
        Some(hook) => hook(annotation).context(TransformSnafu {
            target: "transformComment",
        }),
        None => Ok(default_comment(annotation)),
    }
}

/// Render the whole report. This is a pure function of its inputs; a failing
/// hook aborts the render and no partial document is returned.
pub fn render(annotations: &[Annotation], config: &Config) -> Result<String> {
    let pad = || std::iter::repeat(String::new()).take(config.padding);

    let mut lines = vec![TITLE.to_owned()];
    for group in group_by_file(annotations).into_iter() {
        let header = GroupHeader {
            file_path: group.file_path,
            count: group.annotations.len(),
        };
        lines.extend(pad());
        lines.push(header_line(config, &header)?);
        lines.extend(pad());
        for annotation in group.annotations.into_iter() {
            lines.push(comment_line(config, annotation)?);
        }
    }

    let mut doc = lines.join(&config.new_line);
    doc.push_str(&config.new_line);
    Ok(doc)
}
