//! # Driving a batch of files to a single report.
use std::path::PathBuf;

use snafu::{ensure, OptionExt};

use crate::{
    aggregate::Aggregator,
    config::Config,
    parser::{
        langs::{extension_of, GrammarRegistry},
        source, Annotation,
    },
    report, Message, Result, RunClosedSnafu, StreamingNotSupportedSnafu,
    UnsupportedExtensionSnafu,
};

/// What a submitted file holds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Content {
    /// The complete bytes of the file.
    Buffered(Vec<u8>),
    /// Content that is still arriving and cannot be scanned yet.
    Streamed,
    /// An entry with no content at all, eg. a directory.
    Placeholder,
}

/// One file handed to the pipeline.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceFile {
    /// The directory the file's relative path is measured from.
    pub base: PathBuf,
    pub path: PathBuf,
    pub content: Content,
}

impl SourceFile {
    pub fn new(base: impl Into<PathBuf>, path: impl Into<PathBuf>, content: Content) -> Self {
        SourceFile {
            base: base.into(),
            path: path.into(),
            content,
        }
    }

    /// A buffered file from its text.
    pub fn from_text(
        base: impl Into<PathBuf>,
        path: impl Into<PathBuf>,
        text: impl Into<String>,
    ) -> Self {
        Self::new(base, path, Content::Buffered(text.into().into_bytes()))
    }

    /// The path relative to `base`, or the path as given when it does not live
    /// beneath `base`.
    ///
    /// ```rust
    /// use todo_report_lib::{Content, SourceFile};
    ///
    /// let file = SourceFile::new("/work", "/work/src/a.js", Content::Placeholder);
    /// assert_eq!(file.relative(), "src/a.js");
    ///
    /// let file = SourceFile::new("/work", "lib/b.py", Content::Placeholder);
    /// assert_eq!(file.relative(), "lib/b.py");
    /// ```
    pub fn relative(&self) -> String {
        let path = self.path.strip_prefix(&self.base).unwrap_or(&self.path);
        path.display().to_string()
    }
}

/// The one document a successful run produces.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Artifact {
    pub base: PathBuf,
    pub relative_path: PathBuf,
    pub contents: String,
}

impl Artifact {
    /// Where the artifact belongs.
    pub fn path(&self) -> PathBuf {
        self.base.join(&self.relative_path)
    }
}

/// Lifecycle of a run.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum State {
    Idle,
    Collecting,
    Finalizing,
    Done,
    Errored,
}

/// Hears about a run's progress. Only [`Observer::observe`] is required; the
/// other events are ignored unless overridden.
pub trait Observer {
    /// Receives every annotation as it is found, when the run is verbose.
    fn observe(&mut self, annotation: &Annotation);

    /// A placeholder entry was passed over.
    fn skipped(&mut self, _path: &str) {}

    /// The report was rendered from `annotations` found in `files` files.
    fn rendered(&mut self, _files: usize, _annotations: usize) {}

    /// The run finished without anything to report.
    fn no_report(&mut self) {}
}

impl<F: FnMut(&Annotation)> Observer for F {
    fn observe(&mut self, annotation: &Annotation) {
        self(annotation)
    }
}

/// Forwards every event to the message channel.
#[derive(Clone, Copy, Debug, Default)]
pub struct MessageObserver;

impl Observer for MessageObserver {
    fn observe(&mut self, annotation: &Annotation) {
        Message::FoundAnnotation(annotation.clone()).send();
    }

    fn skipped(&mut self, path: &str) {
        Message::SkippedPlaceholder {
            path: path.to_owned(),
        }
        .send();
    }

    fn rendered(&mut self, files: usize, annotations: usize) {
        Message::Rendered { files, annotations }.send();
    }

    fn no_report(&mut self) {
        Message::NoReport.send();
    }
}

/// Ignores everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoObserver;

impl Observer for NoObserver {
    fn observe(&mut self, _: &Annotation) {}
}

/// One run over a batch of files.
///
/// ```rust
/// use todo_report_lib::{Config, Pipeline, SourceFile};
///
/// let mut run = Pipeline::new(Config::default());
/// run.submit(SourceFile::from_text("/work", "/work/a.js", "// TODO: fix parser\n"))
///     .unwrap();
/// let artifact = run.finish().unwrap().unwrap();
/// assert_eq!(artifact.path(), std::path::Path::new("/work/TODO.md"));
/// assert!(artifact.contents.contains("- TODO (line 1): fix parser"));
/// ```
pub struct Pipeline<O = NoObserver> {
    config: Config,
    registry: &'static GrammarRegistry,
    observer: O,
    state: State,
    first_base: Option<PathBuf>,
    aggregator: Aggregator,
}

impl Pipeline<NoObserver> {
    pub fn new(config: Config) -> Self {
        Self::with_observer(config, NoObserver)
    }
}

impl<O: Observer> Pipeline<O> {
    pub fn with_observer(config: Config, observer: O) -> Self {
        Pipeline {
            config,
            registry: GrammarRegistry::global(),
            observer,
            state: State::Idle,
            first_base: None,
            aggregator: Aggregator::new(),
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn annotations(&self) -> &[Annotation] {
        self.aggregator.all()
    }

    fn ensure_open(&self) -> Result<()> {
        ensure!(
            matches!(self.state, State::Idle | State::Collecting),
            RunClosedSnafu { state: self.state }
        );
        Ok(())
    }

    /// Process one file. An error here is fatal: the run moves to
    /// [`State::Errored`] and will never produce an artifact.
    pub fn submit(&mut self, file: SourceFile) -> Result<()> {
        self.ensure_open()?;
        self.state = State::Collecting;
        let result = self.accept(file);
        if result.is_err() {
            self.state = State::Errored;
        }
        result
    }

    fn accept(&mut self, file: SourceFile) -> Result<()> {
        let bytes = match &file.content {
            Content::Placeholder => {
                log::trace!("skipping placeholder {:?}", file.path);
                self.observer.skipped(&file.path.display().to_string());
                return Ok(());
            }
            Content::Streamed => {
                return StreamingNotSupportedSnafu {
                    path: file.path.display().to_string(),
                }
                .fail();
            }
            Content::Buffered(bytes) => bytes,
        };

        let ext = extension_of(&file.path);
        let grammar = self
            .registry
            .resolve(&ext)
            .context(UnsupportedExtensionSnafu {
                path: file.path.display().to_string(),
                extension: ext.clone(),
            })?;
        if self.first_base.is_none() {
            self.first_base = Some(file.base.clone());
        }
        log::trace!("{:?} resolved to {grammar:?}", file.path);

        let contents = String::from_utf8_lossy(bytes);
        let file_path = file.relative();
        let annotations = source::extract(&file_path, &contents, grammar);
        log::debug!("found {} annotations in {file_path}", annotations.len());

        if self.config.verbose {
            for annotation in annotations.iter() {
                self.observer.observe(annotation);
            }
        }
        self.aggregator.append(annotations);
        Ok(())
    }

    /// Signal the end of the batch. Returns the report, or `None` when no file
    /// was accepted or no annotation was found.
    pub fn finish(&mut self) -> Result<Option<Artifact>> {
        self.ensure_open()?;
        self.state = State::Finalizing;

        let base = match self.first_base.as_ref() {
            Some(base) if !self.aggregator.is_empty() => base.clone(),
            _ => {
                self.state = State::Done;
                self.observer.no_report();
                return Ok(None);
            }
        };

        let contents = match report::render(self.aggregator.all(), &self.config) {
            Ok(contents) => contents,
            Err(e) => {
                self.state = State::Errored;
                return Err(e);
            }
        };
        self.observer
            .rendered(self.aggregator.file_count(), self.aggregator.len());
        self.state = State::Done;
        Ok(Some(Artifact {
            base,
            relative_path: PathBuf::from(&self.config.file_name),
            contents,
        }))
    }
}

/// Run a whole batch.
pub fn run<O: Observer>(
    config: Config,
    files: impl IntoIterator<Item = SourceFile>,
    observer: O,
) -> Result<Option<Artifact>> {
    let mut pipeline = Pipeline::with_observer(config, observer);
    for file in files.into_iter() {
        pipeline.submit(file)?;
    }
    pipeline.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{parser::Kind, Error};

    fn two_files() -> Vec<SourceFile> {
        vec![
            SourceFile::from_text("/p", "/p/a.js", "\n\n// TODO: fix parser\n"),
            SourceFile::from_text(
                "/p",
                "/p/b.py",
                "\n".repeat(9) + "# FIXME: handle edge case\n",
            ),
        ]
    }

    #[test]
    fn two_files_two_groups() {
        let artifact = run(Config::default(), two_files(), NoObserver)
            .unwrap()
            .unwrap();
        assert_eq!(artifact.path(), PathBuf::from("/p/TODO.md"));
        let doc = artifact.contents;
        let a = doc.find("### a.js").unwrap();
        let b = doc.find("### b.py").unwrap();
        assert!(a < b);
        assert!(doc.contains("- TODO (line 3): fix parser"));
        assert!(doc.contains("- FIXME (line 10): handle edge case"));
    }

    #[test]
    fn verbose_observes_each_annotation_before_the_artifact() {
        let mut seen = vec![];
        let config = Config {
            verbose: true,
            ..Config::default()
        };
        let mut pipeline = Pipeline::with_observer(config, |a: &Annotation| {
            seen.push((a.kind, a.file_path.clone(), a.line))
        });
        for file in two_files() {
            pipeline.submit(file).unwrap();
        }
        let artifact = pipeline.finish().unwrap();
        assert!(artifact.is_some());
        drop(pipeline);
        assert_eq!(
            seen,
            vec![
                (Kind::Todo, "a.js".to_string(), 3),
                (Kind::Fixme, "b.py".to_string(), 10)
            ]
        );
    }

    #[test]
    fn quiet_runs_observe_nothing() {
        let mut count = 0;
        let result = run(Config::default(), two_files(), |_: &Annotation| count += 1);
        assert!(result.unwrap().is_some());
        assert_eq!(count, 0);
    }

    #[test]
    fn no_annotations_no_artifact() {
        let files = vec![
            SourceFile::from_text("/p", "/p/a.js", "let a = 1;\n"),
            SourceFile::from_text("/p", "/p/b.py", "# just a comment\n"),
        ];
        let mut pipeline = Pipeline::new(Config::default());
        for file in files {
            pipeline.submit(file).unwrap();
        }
        assert_eq!(pipeline.finish().unwrap(), None);
        assert_eq!(pipeline.state(), State::Done);
    }

    #[test]
    fn empty_batch_no_artifact() {
        let mut pipeline = Pipeline::new(Config::default());
        assert_eq!(pipeline.state(), State::Idle);
        assert_eq!(pipeline.finish().unwrap(), None);
        assert_eq!(pipeline.state(), State::Done);
    }

    #[test]
    fn unsupported_extension_aborts() {
        let mut files = two_files();
        files.insert(1, SourceFile::from_text("/p", "/p/notes.xyz", "TODO: x"));
        let err = run(Config::default(), files, NoObserver).unwrap_err();
        match err {
            Error::UnsupportedExtension { path, extension } => {
                assert_eq!(path, "/p/notes.xyz");
                assert_eq!(extension, ".xyz");
            }
            e => panic!("unexpected error {e}"),
        }
    }

    #[test]
    fn errored_runs_stay_errored() {
        let mut pipeline = Pipeline::new(Config::default());
        pipeline.submit(two_files().remove(0)).unwrap();
        let err = pipeline
            .submit(SourceFile::new("/p", "/p/c.js", Content::Streamed))
            .unwrap_err();
        assert!(matches!(err, Error::StreamingNotSupported { .. }));
        assert_eq!(pipeline.state(), State::Errored);

        assert!(matches!(
            pipeline.submit(two_files().remove(1)),
            Err(Error::RunClosed {
                state: State::Errored
            })
        ));
        assert!(matches!(
            pipeline.finish(),
            Err(Error::RunClosed {
                state: State::Errored
            })
        ));
    }

    #[derive(Debug, Default, PartialEq)]
    struct Recorder {
        events: Vec<String>,
    }

    impl Observer for Recorder {
        fn observe(&mut self, annotation: &Annotation) {
            self.events.push(format!("found {}", annotation.line));
        }

        fn skipped(&mut self, path: &str) {
            self.events.push(format!("skipped {path}"));
        }

        fn rendered(&mut self, files: usize, annotations: usize) {
            self.events.push(format!("rendered {files} {annotations}"));
        }

        fn no_report(&mut self) {
            self.events.push("no report".into());
        }
    }

    #[test]
    fn lifecycle_events_go_to_the_observer() {
        let mut files = two_files();
        files.insert(0, SourceFile::new("/p", "/p/dir", Content::Placeholder));
        let mut pipeline = Pipeline::with_observer(Config::default(), Recorder::default());
        for file in files {
            pipeline.submit(file).unwrap();
        }
        assert!(pipeline.finish().unwrap().is_some());
        assert_eq!(
            pipeline.observer.events,
            vec!["skipped /p/dir".to_string(), "rendered 2 2".to_string()]
        );

        let mut pipeline = Pipeline::with_observer(Config::default(), Recorder::default());
        assert_eq!(pipeline.finish().unwrap(), None);
        assert_eq!(pipeline.observer.events, vec!["no report".to_string()]);
    }

    #[test]
    fn library_runs_leave_the_channel_alone() {
        let recv = Message::receiver();
        let files = vec![
            SourceFile::new("/p", "/p/dir", Content::Placeholder),
            SourceFile::from_text("/p", "/p/q.js", "// TODO: quiet\n"),
        ];
        assert!(run(Config::default(), files, NoObserver).unwrap().is_some());
        assert!(Pipeline::new(Config::default()).finish().unwrap().is_none());
        assert!(recv.try_recv().is_err());
    }

    #[test]
    fn placeholders_are_skipped() {
        let files = vec![
            SourceFile::new("/elsewhere", "/elsewhere/dir", Content::Placeholder),
            SourceFile::new("/p", "/p/dir.xyz", Content::Placeholder),
            two_files().remove(0),
        ];
        let artifact = run(Config::default(), files, NoObserver)
            .unwrap()
            .unwrap();
        assert_eq!(artifact.base, PathBuf::from("/p"));
    }

    #[test]
    fn missing_extension_is_javascript() {
        let files = vec![SourceFile::from_text("/p", "/p/bin/cli", "// FIXME: args\n")];
        let artifact = run(Config::default(), files, NoObserver)
            .unwrap()
            .unwrap();
        assert!(artifact.contents.contains("### bin/cli"));
    }

    #[test]
    fn failing_hook_errors_the_run() {
        let config = Config::default().with_transform_header(|_| Err("boom".into()));
        let mut pipeline = Pipeline::new(config);
        pipeline.submit(two_files().remove(0)).unwrap();
        assert!(matches!(pipeline.finish(), Err(Error::Transform { .. })));
        assert_eq!(pipeline.state(), State::Errored);
    }

    #[test]
    fn file_name_is_configurable() {
        let config = Config {
            file_name: "NOTES.md".into(),
            ..Config::default()
        };
        let artifact = run(config, two_files(), NoObserver).unwrap().unwrap();
        assert_eq!(artifact.relative_path, PathBuf::from("NOTES.md"));
    }
}
