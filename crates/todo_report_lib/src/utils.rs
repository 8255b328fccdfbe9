//! Filesystem helpers for hosts that drive the pipeline from disk.
use std::path::Path;

use crate::{
    pipeline::{Artifact, Content, SourceFile},
    Error,
};

/// Read a file from disk into a [`SourceFile`]. Directories become
/// placeholders.
pub async fn read_source_file(
    base: impl AsRef<Path>,
    path: impl AsRef<Path>,
) -> Result<SourceFile, Error> {
    let (base, path) = (base.as_ref(), path.as_ref());
    let meta = tokio::fs::metadata(path).await?;
    let content = if meta.is_dir() {
        Content::Placeholder
    } else {
        log::trace!("Reading {path:?}");
        Content::Buffered(tokio::fs::read(path).await?)
    };
    Ok(SourceFile::new(base, path, content))
}

/// Write the report beneath its base directory.
pub async fn write_artifact(artifact: &Artifact) -> Result<(), Error> {
    let path = artifact.path();
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    log::debug!("Writing {path:?}");
    tokio::fs::write(&path, artifact.contents.as_bytes()).await?;
    Ok(())
}
