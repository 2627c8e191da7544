use crate::options::Args;
use anyhow::{bail, Context};
use clap::Parser;
use idrec::reconcile::Selection;
use idrec::Config;
use std::path::Path;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod options {
    use std::path::PathBuf;

    #[derive(Debug, clap::Parser)]
    #[command(
        name = "idrec",
        about = "A tool to reconcile accounts of external systems with the people who should have them"
    )]
    pub enum Args {
        /// Reconcile the newest exports of all selected systems and write the results into a new output directory.
        Run {
            /// A RON file overriding the built-in configuration.
            #[clap(long, short = 'c')]
            config: Option<PathBuf>,
            /// The directory with one subdirectory of exports per source.
            #[clap(long, short = 'i')]
            input: Option<PathBuf>,
            /// The directory to write results and logs into.
            #[clap(long, short = 'o')]
            output: Option<PathBuf>,
            /// The ids of the systems to check, or 'all'.
            #[clap(long, short = 's', default_value = "all")]
            source: Vec<String>,
            /// Whose accounts are considered valid.
            #[clap(long, short = 'p', value_enum, default_value_t = Personnel::All)]
            personnel: Personnel,
        },
        /// Print the accounts of one export that should be removed, as CSV.
        Stale {
            #[clap(long, short = 'c')]
            config: Option<PathBuf>,
            /// The id of the system the export is from.
            #[clap(long, short = 's')]
            source: String,
            /// The CSV export of the directory service.
            #[clap(long, short = 'd')]
            directory: PathBuf,
            #[clap(long, short = 'p', value_enum, default_value_t = Personnel::All)]
            personnel: Personnel,
            /// The CSV export of the system.
            export: PathBuf,
        },
        /// Print the comparison key of each name, one per line.
        Normalize { name: Vec<String> },
    }

    #[derive(Debug, Clone, Copy, clap::ValueEnum)]
    pub enum Personnel {
        Employees,
        Contractors,
        All,
    }
}

fn main() -> anyhow::Result<()> {
    let args = options::Args::parse();
    match args {
        Args::Run {
            config,
            input,
            output,
            source,
            personnel,
        } => {
            let mut config = load_config(config.as_deref())?;
            if let Some(input) = input {
                config.input_root = input;
            }
            if let Some(output) = output {
                config.output_root = output;
            }
            init_tracing(Some(&config.output_root.join("log")))?;

            let sources = if source.iter().any(|s| s == "all") {
                Vec::new()
            } else {
                for id in &source {
                    if config.source(id).is_none() {
                        bail!("Unknown source '{id}'");
                    }
                }
                source
            };
            let options = idrec::reconcile::Options {
                sources,
                selection: selection(personnel),
                ..Default::default()
            };
            let now = options.now;
            let run = idrec::run(&config, options);
            for outcome in &run.outcomes {
                tracing::info!(
                    source = %outcome.source.title,
                    duplicates_with_valid_set = outcome.result.duplicates_with_valid_set,
                    internal_duplicates = outcome.result.internal_duplicates,
                    users_to_remove = outcome.result.users_to_remove.len(),
                    "source summary"
                );
            }
            tracing::info!(missing_in_roster = run.missing_in_roster.len(), "roster summary");
            let dir = idrec::report::write(&run, &config.output_root, now)?;
            println!("{}", dir.display());
        }
        Args::Stale {
            config,
            source,
            directory,
            personnel,
            export,
        } => {
            init_tracing(None)?;
            let config = load_config(config.as_deref())?;
            let spec = config
                .source(&source)
                .with_context(|| format!("Unknown source '{source}'"))?;
            let personnel_data =
                idrec::directory::load(open(&directory)?, &config.directory_options())?;
            let external = idrec::source::ingest(open(&export)?, spec, config.source_options())?;
            let outcome =
                idrec::reconcile(spec, &external, &personnel_data, selection(personnel));
            outcome
                .result
                .users_to_remove
                .write_csv(std::io::BufWriter::new(std::io::stdout()))?;
        }
        Args::Normalize { name } => {
            for name in name {
                println!("{}", idrec::normalize_name(name.as_str()));
            }
        }
    };
    Ok(())
}

fn selection(personnel: options::Personnel) -> Selection {
    match personnel {
        options::Personnel::Employees => Selection::Employees,
        options::Personnel::Contractors => Selection::Contractors,
        options::Personnel::All => Selection::All,
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    Ok(match path {
        Some(path) => Config::from_path(path)?,
        None => Config::default(),
    })
}

fn open(path: &Path) -> anyhow::Result<std::fs::File> {
    std::fs::File::open(path)
        .with_context(|| format!("Could not read from CSV file at '{}'", path.display()))
}

/// Log to stderr, and additionally into `log.txt` inside of `log_dir` if given.
///
/// The filter is read from `IDREC_LOG` and defaults to `idrec=info`.
fn init_tracing(log_dir: Option<&Path>) -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_from_env("IDREC_LOG").unwrap_or_else(|_| EnvFilter::new("idrec=info"));
    let file_layer = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Could not create log directory '{}'", dir.display()))?;
            let path = dir.join("log.txt");
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("Could not open log file '{}'", path.display()))?;
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_writer(std::sync::Mutex::new(file)),
            )
        }
        None => None,
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(file_layer)
        .with(filter)
        .init();
    Ok(())
}
