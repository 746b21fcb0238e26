mod config;

use anyhow::Context;
use clap::Parser;
use rand::SeedableRng;
use rand::rngs::StdRng;

use adforge_core::creative::CreativeEngine;
use adforge_core::pipeline::{Pipeline, PipelineStages, RunTrace};
use adforge_core::planner::KeywordClassifier;
use adforge_core::sources::{FixtureDataSource, HeuristicEvaluator, PrecomputedInsightSource};

use config::AdforgeConfig;

const DEFAULT_TASK: &str = "Generate a marketing performance summary";

#[derive(Parser)]
#[command(
    name = "adforge",
    version,
    about = "Insight-driven marketing creative pipeline"
)]
struct Cli {
    /// Task description; words are joined with spaces
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    task: Vec<String>,
}

impl Cli {
    fn task(&self) -> String {
        if self.task.is_empty() {
            DEFAULT_TASK.to_owned()
        } else {
            self.task.join(" ")
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = AdforgeConfig::resolve()?;
    let mut pipeline = build_pipeline(config)?;

    let trace = pipeline.run(&cli.task()).await;
    print_trace(&trace)?;
    Ok(())
}

fn build_pipeline(config: AdforgeConfig) -> anyhow::Result<Pipeline> {
    let classifier = match &config.creative_keywords {
        Some(keywords) => KeywordClassifier::new(keywords),
        None => KeywordClassifier::default(),
    };
    let data = match config.fixture_path {
        Some(path) => FixtureDataSource::from_path(path),
        None => FixtureDataSource::embedded(),
    };
    tracing::debug!(fixture = ?data.path(), "data source ready");
    let engine = CreativeEngine::new(config.creative).context("invalid creative templates")?;
    tracing::debug!(
        formats = ?engine.config().formats(),
        max_variants = engine.config().max_variants(),
        "creative engine ready"
    );

    let rng = match config.seed {
        Some(seed) => {
            tracing::debug!(seed, "using fixed seed");
            StdRng::seed_from_u64(seed)
        }
        None => StdRng::from_os_rng(),
    };

    let stages = PipelineStages {
        classifier: Box::new(classifier),
        data: Box::new(data),
        insights: Box::new(PrecomputedInsightSource),
        creative: Box::new(engine),
        evaluator: Box::new(HeuristicEvaluator),
    };
    Ok(Pipeline::new(stages, rng))
}

fn print_trace(trace: &RunTrace) -> anyhow::Result<()> {
    println!("=== FINAL RESULT ===");
    for (name, value) in trace.sections().context("failed to render run trace")? {
        let rendered =
            serde_json::to_string_pretty(&value).context("failed to render result section")?;
        println!("{name}:\n{rendered}\n");
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod test_util {
    use std::sync::{Mutex, MutexGuard};

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    /// Serialize tests that mutate process environment variables.
    pub fn lock_env() -> MutexGuard<'static, ()> {
        ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner())
    }
}
