mod render;

use anyhow::Context;
use clap::Parser;
use dualfit::{ExperimentConfig, ExperimentRunner};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "dualfit")]
#[command(about = "Compare a linear SVM and a linear regression on a labelled table")]
struct Args {
    /// Headerless delimited dataset; overrides `dataset_path` from the config
    dataset: Option<PathBuf>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Fraction of rows held out for testing
    #[arg(long)]
    test_ratio: Option<f64>,

    /// Seed of the train/test split
    #[arg(long)]
    split_seed: Option<u64>,

    /// Number of cross-validation folds
    #[arg(long)]
    cv_folds: Option<usize>,

    /// Shuffle rows before assigning cross-validation folds
    #[arg(long)]
    cv_shuffle: bool,

    /// Print the report as JSON instead of text
    #[arg(long)]
    json: bool,
}

impl Args {
    fn into_config(self) -> anyhow::Result<ExperimentConfig> {
        let mut config = match &self.config {
            Some(path) => ExperimentConfig::from_file(path)
                .with_context(|| format!("reading config {}", path.display()))?,
            None => ExperimentConfig::default(),
        };
        if let Some(dataset) = self.dataset {
            config.dataset_path = dataset;
        }
        if let Some(ratio) = self.test_ratio {
            config.test_ratio = ratio;
        }
        if let Some(seed) = self.split_seed {
            config.split_seed = seed;
        }
        if let Some(folds) = self.cv_folds {
            config.cv_folds = folds;
        }
        if self.cv_shuffle {
            config.cv_shuffle = true;
        }
        config.validate()?;
        Ok(config)
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dualfit=info".into()),
        )
        .init();

    let args = Args::parse();
    let json = args.json;
    let config = args.into_config()?;

    let mut runner = ExperimentRunner::new(config);
    let report = runner.run().context("experiment failed")?;
    info!(state = %runner.state(), "experiment finished");

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render::render_report(&report)?);
    }
    Ok(())
}
