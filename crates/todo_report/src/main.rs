use std::path::PathBuf;

use clap::Parser;
use console::Style;
use futures::FutureExt;
use indicatif::{ProgressBar, ProgressStyle};
use todo_report_lib::{
    pipeline::{MessageObserver, Pipeline},
    utils, Config, Message,
};

#[derive(clap::Parser, Debug)]
#[command(
    version,
    about,
    author,
    help_template(
        "\
{before-help}{name} {version} by {author-with-newline}
{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}"
    )
)]
struct Cli {
    /// Files to scan, in the order they should appear in the report.
    files: Vec<PathBuf>,

    #[clap(short, long)]
    /// Directory the report is written to and file paths are shown relative to.
    /// Defaults to the current directory.
    base: Option<PathBuf>,

    #[clap(short, long)]
    /// A JSON file with `fileName`, `padding`, `newLine` and `verbose` settings.
    config: Option<PathBuf>,

    #[clap(short, long)]
    /// Name of the report file.
    file_name: Option<String>,

    #[clap(short, long)]
    /// Empty lines between a file's header, its entries and the next file.
    padding: Option<usize>,

    #[clap(short, long)]
    /// Print every annotation as it is found.
    verbose: bool,

    #[clap(long)]
    /// Print the report to stdout instead of writing it.
    stdout: bool,
}

impl Cli {
    async fn config(&self) -> Result<Config, todo_report_lib::Error> {
        let mut config = match self.config.as_ref() {
            Some(path) => Config::from_json_file(path).await?,
            None => Config::default(),
        };
        if let Some(file_name) = self.file_name.as_ref() {
            config.file_name = file_name.clone();
        }
        if let Some(padding) = self.padding {
            config.padding = padding;
        }
        config.verbose |= self.verbose;
        Ok(config)
    }
}

async fn run(cli: Cli, base: PathBuf) -> Result<(), todo_report_lib::Error> {
    let config = cli.config().await?;
    Message::Starting {
        files: cli.files.len(),
    }
    .send();

    let mut pipeline = Pipeline::with_observer(config, MessageObserver);
    for path in cli.files.iter() {
        let path = if path.is_absolute() {
            path.clone()
        } else {
            base.join(path)
        };
        let file = utils::read_source_file(&base, &path).await?;
        pipeline.submit(file)?;
    }

    if let Some(artifact) = pipeline.finish()? {
        if cli.stdout {
            print!("{}", artifact.contents);
        } else {
            utils::write_artifact(&artifact).await?;
            log::info!("wrote {:?}", artifact.path());
        }
    }
    Ok(())
}

struct Printer {
    red: Style,
    yellow: Style,
    green: Style,
    dim: Style,
    scanning_progress: ProgressBar,
    failed: bool,
}

impl Default for Printer {
    fn default() -> Self {
        let spinner_style = ProgressStyle::with_template("{spinner} {wide_msg}")
            .unwrap()
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ");
        let scanning_progress = ProgressBar::new_spinner();
        scanning_progress.set_style(spinner_style);

        Self {
            red: Style::new().red(),
            yellow: Style::new().yellow(),
            green: Style::new().green(),
            dim: Style::new().dim(),
            scanning_progress,
            failed: false,
        }
    }
}

impl Printer {
    fn print(&mut self, msg: Message) {
        use Message::*;

        match msg {
            Error(err) => {
                self.failed = true;
                self.scanning_progress.finish_and_clear();
                let e = self.red.apply_to(err.to_string());
                eprintln!("{e}");
            }

            Starting { files } => {
                self.scanning_progress
                    .set_message(format!("Scanning {files} files"));
            }
            SkippedPlaceholder { path } => {
                eprintln!("  {}", self.dim.apply_to(format!("skipped {path}")));
            }
            FoundAnnotation(annotation) => {
                self.scanning_progress.inc(1);
                self.scanning_progress.println(format!(
                    "  {} {}:{} {}",
                    self.yellow.apply_to(annotation.kind),
                    annotation.file_path,
                    annotation.line,
                    self.dim.apply_to(annotation.text),
                ));
            }
            Rendered { files, annotations } => {
                self.scanning_progress.finish_and_clear();
                eprintln!("Found {annotations} annotations in {files} files");
            }
            NoReport => {
                self.scanning_progress.finish_and_clear();
                eprintln!("No annotations found, no report written");
            }

            Goodbye => {
                eprintln!("🏁 {}", self.green.apply_to("All done!"));
            }
        }
    }

    async fn message_loop(&mut self, handle: tokio::task::JoinHandle<()>) {
        let recv = Message::receiver();
        loop {
            let mut timeout =
                std::pin::pin!(tokio::time::sleep(std::time::Duration::from_secs(1)).fuse());
            let mut get_msg = std::pin::pin!(recv.recv().fuse());
            futures::select! {
                msg = get_msg => if let Ok(msg) = msg {
                    self.print(msg);
                },
                _ = timeout => {}
            }
            if handle.is_finished() {
                break;
            }
        }
        while let Ok(msg) = recv.try_recv() {
            self.print(msg);
        }
    }
}

#[tokio::main]
async fn main() {
    env_logger::builder().init();

    let cli = Cli::parse();
    let base = match cli.base.clone() {
        Some(base) => base,
        None => std::env::current_dir().expect("could not get current dir"),
    };

    let mut printer = Printer::default();
    let handle = tokio::task::spawn(async move {
        match run(cli, base).await {
            Ok(()) => Message::Goodbye.send(),
            Err(e) => Message::Error(e).send(),
        }
    });

    // While the pipeline is working, print the messages to the terminal
    printer.message_loop(handle).await;
    if printer.failed {
        std::process::exit(1);
    }
}
