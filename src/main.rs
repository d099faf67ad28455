use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use questionnaire_scorer::{score::Statistic, Config, LogSink, Processor};
use std::path::{Path, PathBuf};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(
    name = "questionnaire-scorer",
    version,
    about = "Aggregate questionnaire response logs into per-category scores"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score every subject log under SOURCE and write results into DEST
    Process {
        /// Folder with subject logs, or with one sub-folder per batch
        #[arg(short, long)]
        source: PathBuf,

        /// Folder the results files are written to
        #[arg(short, long)]
        dest: PathBuf,

        #[command(flatten)]
        overrides: Overrides,
    },

    /// Check the configuration and custom definitions without reading any log
    Validate {
        #[command(flatten)]
        overrides: Overrides,
    },

    /// Print the effective configuration as YAML
    ShowConfig {
        #[command(flatten)]
        overrides: Overrides,
    },
}

#[derive(Args)]
struct Overrides {
    /// YAML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Compare answers without regard to case
    #[arg(long)]
    case_insensitive: bool,

    #[arg(long)]
    response_key: Option<String>,

    #[arg(long)]
    id_key: Option<String>,

    #[arg(long)]
    category_key: Option<String>,

    #[arg(long)]
    answer_key: Option<String>,

    #[arg(long)]
    score_key: Option<String>,

    /// Output field delimiter, e.g. "," or "\t"
    #[arg(long)]
    delimiter: Option<String>,

    /// Statistic to report per category (sum, mean); repeat for several
    #[arg(long = "statistic", value_parser = parse_statistic)]
    statistics: Vec<Statistic>,
}

impl Overrides {
    fn resolve(&self) -> Result<Config> {
        let mut config = Config::load_or_default(self.config.as_deref())?;
        if self.case_insensitive {
            config.case_insensitive = true;
        }
        let keys = &mut config.columns;
        for (slot, value) in [
            (&mut keys.response, &self.response_key),
            (&mut keys.id, &self.id_key),
            (&mut keys.category, &self.category_key),
            (&mut keys.answer, &self.answer_key),
            (&mut keys.score, &self.score_key),
        ] {
            if let Some(v) = value {
                *slot = v.clone();
            }
        }
        if let Some(d) = &self.delimiter {
            config.result_delimiter = parse_delimiter(d)?;
        }
        if !self.statistics.is_empty() {
            config.statistics = self.statistics.clone();
        }
        Ok(config)
    }
}

fn parse_delimiter(raw: &str) -> Result<char> {
    let unescaped = match raw {
        "\\t" | "tab" => "\t",
        other => other,
    };
    let mut chars = unescaped.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => anyhow::bail!("delimiter must be a single character, got {:?}", raw),
    }
}

fn parse_statistic(raw: &str) -> Result<Statistic> {
    Statistic::from_str(raw).with_context(|| format!("unknown statistic {:?}, expected sum or mean", raw))
}

fn main() {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(env).init();

    if let Err(e) = run(Cli::parse()) {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Process {
            source,
            dest,
            overrides,
        } => process(&source, &dest, overrides.resolve()?),
        Commands::Validate { overrides } => {
            let processor = Processor::new(overrides.resolve()?).context("invalid configuration")?;
            match &processor.config().custom {
                Some(_) => info!("configuration and custom definitions are valid"),
                None => info!("configuration is valid"),
            }
            Ok(())
        }
        Commands::ShowConfig { overrides } => {
            print!("{}", overrides.resolve()?.to_yaml()?);
            Ok(())
        }
    }
}

fn process(source: &Path, dest: &Path, config: Config) -> Result<()> {
    let processor = Processor::new(config).context("invalid configuration")?;
    info!(source = %source.display(), dest = %dest.display(), "starting analysis");

    let summary = processor
        .run(source, dest, &mut LogSink)
        .with_context(|| format!("processing {}", source.display()))?;

    for out in &summary.outputs {
        info!("saved file: {}", out.display());
    }
    info!(
        files = summary.files_processed,
        "total process done, output saved to {}",
        dest.display()
    );
    Ok(())
}
