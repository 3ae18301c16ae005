//! simnet CLI: similarity matrix in, network plots and label table out.

use anyhow::{bail, Context, Result};
use clap::Parser;
use simnet::{Delimiter, Objective, OutputPaths, PipelineConfig, SimilarityMatrix};
use std::fs::File;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "simnet")]
#[command(about = "Co-occurrence network from a similarity matrix, clustered three ways")]
#[command(version)]
struct Args {
    /// Square similarity matrix, one row per line, no header
    #[arg(short, long)]
    matrix: PathBuf,

    /// Field delimiter; whitespace when omitted (use "\t" for tabs)
    #[arg(short, long)]
    delim: Option<String>,

    /// Node names, one per line, in row order
    #[arg(long)]
    names: Option<PathBuf>,

    /// JSON pipeline config; flags below override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Edge threshold
    #[arg(short, long)]
    threshold: Option<f64>,

    /// Dendrogram cut height
    #[arg(long)]
    cut_height: Option<f64>,

    /// k-means cluster count
    #[arg(short, long)]
    k: Option<usize>,

    /// k-means restarts
    #[arg(long)]
    n_init: Option<usize>,

    /// Community resolution
    #[arg(short, long)]
    resolution: Option<f64>,

    /// Community objective: modularity or cpm
    #[arg(long, value_parser = parse_objective)]
    objective: Option<Objective>,

    /// Leiden passes; 0 repeats until the partition is stable
    #[arg(long)]
    iterations: Option<usize>,

    /// Seed for every randomized stage
    #[arg(short, long)]
    seed: Option<u64>,

    /// Output directory
    #[arg(short, long, default_value = ".")]
    out_dir: PathBuf,

    /// Also write the k-means elbow curve for K = 1..=MAX_K
    #[arg(long, value_name = "MAX_K")]
    elbow: Option<usize>,
}

fn parse_objective(s: &str) -> std::result::Result<Objective, String> {
    match s.to_ascii_lowercase().as_str() {
        "modularity" => Ok(Objective::Modularity),
        "cpm" => Ok(Objective::Cpm),
        other => Err(format!("unknown objective '{other}' (expected modularity or cpm)")),
    }
}

fn parse_delimiter(s: Option<&str>) -> Result<Delimiter> {
    match s {
        None => Ok(Delimiter::Whitespace),
        Some("\\t") | Some("\t") | Some("tab") => Ok(Delimiter::Byte(b'\t')),
        Some(d) if d.len() == 1 => Ok(Delimiter::Byte(d.as_bytes()[0])),
        Some(d) => bail!("delimiter must be a single byte, got '{d}'"),
    }
}

impl Args {
    /// Config file (or defaults) with the command-line flags applied on top.
    fn config(&self) -> Result<PipelineConfig> {
        let config = match &self.config {
            Some(path) => PipelineConfig::from_json_path(path)
                .with_context(|| format!("reading config {}", path.display()))?,
            None => PipelineConfig::default(),
        };
        Ok(self.apply_overrides(config))
    }

    fn apply_overrides(&self, mut config: PipelineConfig) -> PipelineConfig {
        if let Some(v) = self.threshold {
            config.threshold = v;
        }
        if let Some(v) = self.cut_height {
            config.cut_height = v;
        }
        if let Some(v) = self.k {
            config.k = v;
        }
        if let Some(v) = self.n_init {
            config.n_init = v;
        }
        if let Some(v) = self.resolution {
            config.resolution = v;
        }
        if let Some(v) = self.objective {
            config.objective = v;
        }
        if let Some(v) = self.iterations {
            config.n_iterations = v;
        }
        if let Some(v) = self.seed {
            config.seed = v;
        }
        if self.elbow.is_some() {
            config.elbow_max_k = self.elbow;
        }
        config
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = args.config()?;
    log::debug!("config: {config:?}");

    let delimiter = parse_delimiter(args.delim.as_deref())?;
    let mut matrix = SimilarityMatrix::from_path(&args.matrix, delimiter)
        .with_context(|| format!("loading matrix {}", args.matrix.display()))?;
    if let Some(path) = &args.names {
        let file = File::open(path).with_context(|| format!("opening names {}", path.display()))?;
        let names = SimilarityMatrix::read_names(file)
            .with_context(|| format!("reading names {}", path.display()))?;
        matrix = matrix
            .with_names(names)
            .with_context(|| format!("applying names from {}", path.display()))?;
    }

    let output = simnet::run(&matrix, &config).context("running pipeline")?;
    let paths = OutputPaths::in_dir(&args.out_dir);
    simnet::write_outputs(&output, &config, &paths)
        .with_context(|| format!("writing outputs to {}", args.out_dir.display()))?;

    println!(
        "{} nodes, {} edges ({} isolated), modularity {:.4}",
        output.stats.nodes, output.stats.edges, output.stats.isolated, output.modularity
    );
    Ok(())
}
