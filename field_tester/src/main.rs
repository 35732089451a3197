use agriscan_vision::core_modules::utils::image_helper::image_helper;
use agriscan_vision::core_modules::vegetation_index;
use agriscan_vision::{AnalysisPipeline, AnalysisQueue, ImageUpload, PipelineConfig, QueueConfig};
use anyhow::Context;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Runs the AgriScan analysis pipeline over image files and prints the reports as JSON.
#[derive(Debug, Parser)]
#[command(name = "field_tester", version)]
struct Args {
    /// Images to analyse.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Base seed; image N uses seed + N. Defaults to a time-based seed.
    #[arg(long)]
    seed: Option<u64>,

    /// JSON file overriding pipeline settings, e.g. `{"scorer": {"moderate_threshold": 0.25}}`.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the reports here instead of stdout.
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Directory for per-image vegetation-index heatmaps (PNG).
    #[arg(long)]
    heatmap_dir: Option<PathBuf>,

    /// Worker count for the analysis queue.
    #[arg(long)]
    workers: Option<usize>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // --- 1. Argument Parsing & Setup ---
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => PipelineConfig::default(),
    };
    let base_seed = args.seed.unwrap_or_else(time_seed);
    tracing::info!(base_seed, inputs = args.inputs.len(), "starting analysis");

    // --- 2. Pipeline Initialization ---
    let pipeline = Arc::new(AnalysisPipeline::new(config)?);
    let mut queue_config = QueueConfig::default();
    if let Some(workers) = args.workers {
        queue_config.workers = workers;
    }
    queue_config.max_tracked_jobs = queue_config.max_tracked_jobs.max(args.inputs.len());
    let queue = AnalysisQueue::new(pipeline.clone(), queue_config);

    // --- 3. Load Uploads ---
    let mut uploads = Vec::with_capacity(args.inputs.len());
    for path in &args.inputs {
        uploads.push(load_upload(path)?);
    }

    // --- 4. Heatmaps (optional) ---
    if let Some(dir) = &args.heatmap_dir {
        std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
        for (path, upload) in args.inputs.iter().zip(&uploads) {
            write_heatmap(&pipeline, dir, path, upload)?;
        }
    }

    // --- 5. Analysis ---
    let pending = uploads
        .into_iter()
        .enumerate()
        .map(|(i, upload)| queue.analyze(upload, base_seed.wrapping_add(i as u64)));
    let results = futures::future::join_all(pending).await;

    let mut reports = Vec::with_capacity(results.len());
    for (path, result) in args.inputs.iter().zip(results) {
        let report = result.with_context(|| format!("analysing {}", path.display()))?;
        reports.push(report);
    }
    queue.shutdown().await;

    // --- 6. Output ---
    let json = if reports.len() == 1 {
        serde_json::to_string_pretty(&reports[0])?
    } else {
        serde_json::to_string_pretty(&reports)?
    };
    match &args.output {
        Some(path) => {
            std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
            tracing::info!(path = %path.display(), "reports written");
        }
        None => println!("{json}"),
    }

    Ok(())
}

fn load_config(path: &Path) -> anyhow::Result<PipelineConfig> {
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let config: PipelineConfig = serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;
    config.validate().with_context(|| format!("invalid settings in {}", path.display()))?;
    Ok(config)
}

fn load_upload(path: &Path) -> anyhow::Result<ImageUpload> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let content_type = image_helper::mime_for_path(path).unwrap_or("application/octet-stream");
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(ImageUpload::new(filename, content_type, bytes))
}

/// Renders the per-pixel index of one upload to `<dir>/<stem>_vari.png`.
fn write_heatmap(pipeline: &AnalysisPipeline, dir: &Path, path: &Path, upload: &ImageUpload) -> anyhow::Result<()> {
    let image = image_helper::decode(&upload.bytes, &upload.content_type)
        .with_context(|| format!("decoding {}", path.display()))?;
    let values = vegetation_index::index_map(&image, pipeline.scorer().config().epsilon);
    let stem = path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_else(|| "image".into());
    let out = dir.join(format!("{stem}_vari.png"));
    image_helper::save_index_heatmap(&out, image.width(), image.height(), &values)
        .with_context(|| format!("writing {}", out.display()))?;
    tracing::info!(path = %out.display(), "heatmap written");
    Ok(())
}

fn time_seed() -> u64 {
    let now = chrono::Utc::now();
    now.timestamp_nanos_opt().unwrap_or_else(|| now.timestamp_micros()) as u64
}
