//! Stand Growth - headless driver
//!
//! Loads a stand definition, builds the initial stand and runs the growth
//! engine for a number of timesteps, printing one summary line (or JSON
//! record) per step.

use std::path::PathBuf;

use clap::Parser;
use serde::Serialize;

use stand_growth::core::error::GrowthResult;
use stand_growth::core::types::{SpeciesId, TreeType};
use stand_growth::growth::{GrowthContext, TimestepReport};
use stand_growth::rules::load_stand_file;
use stand_growth::stand::Stand;

/// Run a forest stand growth simulation
#[derive(Parser, Debug)]
#[command(name = "stand-growth")]
#[command(about = "Grow a simulated forest stand with plugin-dispatched growth")]
struct Args {
    /// Stand definition file (TOML)
    #[arg(long)]
    stand: PathBuf,

    /// Number of timesteps (overrides the file's [run] section)
    #[arg(long)]
    timesteps: Option<u32>,

    /// Random seed for the initial stand (overrides the file)
    #[arg(long)]
    seed: Option<u64>,

    /// Output format: text or json
    #[arg(long, default_value = "text")]
    format: String,
}

/// One JSON record per timestep
#[derive(Serialize)]
struct StepSummary {
    #[serde(flatten)]
    report: TimestepReport,
    promoted: usize,
    live_trees: usize,
    basal_area_per_ha: f64,
    mean_height: f64,
}

fn main() -> GrowthResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("stand_growth=info")),
        )
        .init();

    let args = Args::parse();
    let json = match args.format.as_str() {
        "json" => true,
        "text" => false,
        other => {
            tracing::warn!("Unknown format '{}', using text", other);
            false
        }
    };

    let file = load_stand_file(&args.stand)?;
    let timesteps = args.timesteps.unwrap_or(file.run.timesteps);
    let seed = args.seed.unwrap_or(file.run.seed);

    let mut stand = file.build_stand(seed)?;
    let light = file.light();
    if let Some(light) = &light {
        let num_species = stand.num_species();
        light.register(&mut stand, num_species);
    }

    let mut ctx = GrowthContext::setup(file.growth_config(), file.build_plugins()?, &mut stand)?;

    if !json {
        println!("\n=== STAND GROWTH ===");
        println!("Stand file: {}", args.stand.display());
        println!("Species: {}  Trees: {}  Seed: {}", stand.num_species(), stand.tree_count(), seed);
        println!();
    }

    for _ in 0..timesteps {
        if let Some(light) = &light {
            light.apply(&mut stand);
        }
        let report = ctx.run_timestep(&mut stand)?;
        let promoted = stand.advance_life_stages();
        let summary = summarize(&stand, report, promoted);

        if json {
            println!("{}", serde_json::to_string(&summary)?);
        } else {
            print_summary(&summary);
        }
    }

    if !json {
        print_stage_counts(&stand, |idx| file.species_name(idx).map(str::to_string));
    }

    Ok(())
}

fn summarize(stand: &Stand, report: TimestepReport, promoted: usize) -> StepSummary {
    let live: Vec<_> = stand.trees().filter(|t| t.is_alive()).collect();
    let area_ha = stand.plot_size * stand.plot_size / 10_000.0;
    let basal_area: f64 = live
        .iter()
        .filter(|t| matches!(t.tree_type(), TreeType::Adult))
        .map(|t| t.basal_area())
        .sum();
    let mean_height = if live.is_empty() {
        0.0
    } else {
        live.iter().map(|t| t.height()).sum::<f64>() / live.len() as f64
    };

    StepSummary {
        report,
        promoted,
        live_trees: live.len(),
        basal_area_per_ha: basal_area / area_ha,
        mean_height,
    }
}

fn print_summary(summary: &StepSummary) {
    let r = &summary.report;
    println!(
        "Step {:>3}: grew {:>4}/{:<4} skipped {:>4}  +{:.3} cm  +{:.3} m  clamped {}  promoted {}  BA {:.2} m²/ha  mean h {:.2} m",
        r.timestep,
        r.trees_grown,
        r.trees_visited,
        r.trees_skipped,
        r.diameter_growth,
        r.height_growth,
        r.heights_clamped,
        summary.promoted,
        summary.basal_area_per_ha,
        summary.mean_height,
    );
}

fn print_stage_counts(
    stand: &Stand,
    species_name: impl Fn(SpeciesId) -> Option<String>,
) {
    println!();
    println!("Final stand:");
    for species in 0..stand.num_species() {
        let id = SpeciesId(species as u16);
        let counts: Vec<String> = TreeType::ALL
            .into_iter()
            .filter_map(|tree_type| {
                let n = stand
                    .trees()
                    .filter(|t| t.species() == id && t.tree_type() == tree_type)
                    .count();
                (n > 0).then(|| format!("{} {}", n, tree_type))
            })
            .collect();
        let name = species_name(id).unwrap_or_else(|| id.to_string());
        println!("  {:<8} {}", name, counts.join(", "));
    }
}
