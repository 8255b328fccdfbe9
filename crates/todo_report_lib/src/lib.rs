//! Extract `TODO` and `FIXME` comments from source files and compile them into
//! one report.
//!
//! Files flow through a [`pipeline::Pipeline`]: each file's extension picks a
//! [`parser::langs::Grammar`], the grammar drives the comment extractor in
//! [`parser::source`], every file's annotations are appended to an
//! [`aggregate::Aggregator`] and, once the batch ends, [`report::render`]
//! turns them into a single document.
use snafu::prelude::*;
use std::sync::LazyLock;

pub mod aggregate;
pub mod config;
pub mod parser;
pub mod pipeline;
pub mod report;
pub mod utils;

pub use config::Config;
pub use parser::{Annotation, Kind};
pub use pipeline::{Artifact, Content, Pipeline, SourceFile, State};

static CHAN: LazyLock<(
    async_channel::Sender<Message>,
    async_channel::Receiver<Message>,
)> = LazyLock::new(async_channel::unbounded);

/// The error type returned by transform hooks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("File: {path} - Extension {extension} is not supported"))]
    UnsupportedExtension { path: String, extension: String },

    #[snafu(display("Streaming not supported: {path}"))]
    StreamingNotSupported { path: String },

    #[snafu(display("The {target} hook failed: {source}"))]
    Transform {
        target: &'static str,
        source: BoxError,
    },

    #[snafu(display("Could not parse the configuration: {source}"))]
    ParseConfig { source: serde_json::Error },

    #[snafu(display("IO error: {source}"))]
    Io { source: std::io::Error },

    #[snafu(display("The run is already {state:?}"))]
    RunClosed { state: State },
}

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Self::Io { source }
    }
}

pub(crate) type Result<T, E = Error> = core::result::Result<T, E>;

/// An external progress message sent from the reporter.
pub enum Message {
    Error(Error),

    Starting {
        files: usize,
    },
    SkippedPlaceholder {
        path: String,
    },
    FoundAnnotation(Annotation),
    Rendered {
        files: usize,
        annotations: usize,
    },
    NoReport,

    Goodbye,
}

impl Message {
    /// Send a status message to the outside world.
    pub fn send(self) {
        // UNWRAP: safe because this channel is unbounded.
        CHAN.0.try_send(self).unwrap();
    }

    /// Get a clone of the status message receiver.
    pub fn receiver() -> async_channel::Receiver<Message> {
        CHAN.1.clone()
    }
}
