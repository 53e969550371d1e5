use anyhow::Context;
use clap::Parser;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;
use bagscan::{Bag, BagDistance, DistanceValue, Index, IndexConfig, Metric, PointMetric, RangeBoundary};

/// Core-distance report for a set of bags
#[derive(Parser, Debug)]
#[command(name = "bagscan")]
#[command(about = "Neighborhood queries over bags of feature vectors", long_about = None)]
struct Args {
    /// JSON file holding an array of bags (`{"id": ..., "instances": [[...], ...]}`)
    input: PathBuf,

    /// Bag metric: point, emd or mahalanobis
    #[arg(short, long, default_value = "emd")]
    metric: String,

    /// Ground distance between instances
    #[arg(long, default_value = "euclidean")]
    point: String,

    /// Neighborhood radius
    #[arg(short, long)]
    epsilon: f64,

    /// Neighbors required for a core point
    #[arg(long, default_value_t = 5)]
    min_points: usize,

    /// Exclude neighbors at exactly epsilon
    #[arg(long)]
    exclusive: bool,

    /// Query worker threads (defaults to the global pool)
    #[arg(long)]
    threads: Option<usize>,

    /// Evaluate all pair distances up front
    #[arg(long)]
    warm: bool,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting bagscan v{}", env!("CARGO_PKG_VERSION"));

    let file = File::open(&args.input)
        .with_context(|| format!("failed to open {}", args.input.display()))?;
    let bags: Vec<Bag> = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("failed to parse bags from {}", args.input.display()))?;
    info!("Loaded {} bags from {:?}", bags.len(), args.input);

    let point: PointMetric = args.point.parse()?;
    let metric = Metric::from_name(&args.metric, point)?;
    let config = IndexConfig {
        boundary: if args.exclusive {
            RangeBoundary::Exclusive
        } else {
            RangeBoundary::Inclusive
        },
        num_threads: args.threads,
    };
    info!("Metric: {} ({:?} ground distance)", metric.name(), point);

    let mut index = Index::build_with(bags, bagscan::CachedDistance::new(metric), config)?;

    if args.warm {
        let pairs = index.warm_cache()?;
        info!("Evaluated {} bag pairs", pairs);
    }

    let keys: Vec<String> = index.keys().map(str::to_string).collect();
    let mut core_points = 0usize;
    println!("key\tcore_distance\tneighbors");
    for key in &keys {
        let result = index.update_core_distance(key, args.min_points, args.epsilon)?;
        let core = match result.core_distance {
            DistanceValue::Value(d) => {
                core_points += 1;
                format!("{:.6}", d)
            }
            DistanceValue::Undefined => "undefined".to_string(),
        };
        println!("{}\t{}\t{}", key, core, result.epsilon_neighborhood.len());
    }

    let stats = index.distance().cache_stats();
    info!(
        "{} of {} points are core points; cache holds {} distances ({} hits, {} misses)",
        core_points,
        keys.len(),
        stats.entries,
        stats.hits,
        stats.misses
    );

    Ok(())
}
