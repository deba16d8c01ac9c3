use anyhow::{Context, bail};
use log::info;
use sobel_vision::{EdgeConfig, ParallelEdgePipeline};
use std::env;
use std::path::PathBuf;
use std::time::Instant;

const DEFAULT_OUTPUT: &str = "edge_detected_image.png";
const WORKERS_VAR: &str = "SOBEL_WORKERS";

fn config_from_env() -> anyhow::Result<EdgeConfig> {
    match env::var(WORKERS_VAR) {
        Ok(raw) => {
            let workers = raw
                .trim()
                .parse::<usize>()
                .with_context(|| format!("{WORKERS_VAR} must be a whole number, got {raw:?}"))?;
            Ok(EdgeConfig::with_workers(workers))
        }
        Err(env::VarError::NotPresent) => Ok(EdgeConfig::default()),
        Err(err) => Err(err).context(format!("could not read {WORKERS_VAR}")),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    // --- 1. Argument Parsing & Setup ---
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        bail!("Usage: sobel_vision <input_image_path> [output_image_path]");
    }
    let input = PathBuf::from(&args[1]);
    let output = PathBuf::from(args.get(2).map_or(DEFAULT_OUTPUT, String::as_str));

    let config = config_from_env()?;
    info!(
        "running {:?} detection with {} workers",
        config.operator, config.workers
    );
    let pipeline = ParallelEdgePipeline::new(config).context("failed to start the worker pool")?;

    // --- 2. Detection ---
    let started = Instant::now();
    let edge_map = pipeline
        .detect_file(&input, &output)
        .await
        .with_context(|| format!("edge detection failed for {}", input.display()))?;
    let elapsed = started.elapsed();

    info!("stage timings: {:?}", edge_map.timings);
    println!("Edge map written to {}", output.display());
    println!("Time taken: {:.6} seconds", elapsed.as_secs_f64());
    Ok(())
}
