//! Accumulating annotations across a batch of files.
use crate::parser::Annotation;

/// Holds every annotation found so far, in submission order.
#[derive(Clone, Debug, Default)]
pub struct Aggregator {
    annotations: Vec<Annotation>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one file's annotations after everything already collected.
    pub fn append(&mut self, annotations: Vec<Annotation>) {
        self.annotations.extend(annotations);
    }

    pub fn all(&self) -> &[Annotation] {
        &self.annotations
    }

    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }

    /// The number of distinct files that contributed at least one annotation.
    pub fn file_count(&self) -> usize {
        let mut seen = std::collections::HashSet::new();
        self.annotations
            .iter()
            .filter(|a| seen.insert(a.file_path.as_str()))
            .count()
    }
}
