use std::{
    error::Error,
    path::{Path, PathBuf},
};

use clap::Parser;
use env_logger::Env;
use ff_components::{ClockGenerator, FfComponents, InstalledComponents, SpacecraftReferences};
use ff_result::ResultManager;
use log::info;
use nalgebra::Vector3;

mod formation;
mod scenario;

use formation::Formation;
use scenario::Scenario;

/// Runs a chief/deputy formation and logs the deputy's components
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Scenario TOML file
    #[arg(short, long)]
    scenario: PathBuf,

    /// Overrides the scenario's step count
    #[arg(long)]
    steps: Option<u64>,

    /// Result CSV file
    #[arg(short, long, default_value = "results/ff_components.csv")]
    output: PathBuf,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let scenario = Scenario::load(&args.scenario)?;
    let steps = args.steps.unwrap_or(scenario.steps);
    let force = run(&scenario, steps, &args.output)?;
    println!("{:.6e} {:.6e} {:.6e}", force.x, force.y, force.z);
    Ok(())
}

/// Steps the formation, logging every tick, and returns the deputy's final
/// body-frame force.
fn run(scenario: &Scenario, steps: u64, output: &Path) -> Result<Vector3<f64>, Box<dyn Error>> {
    let formation = Formation::new(scenario);
    let references = SpacecraftReferences {
        dynamics: &formation,
        structure: &formation,
        local_environment: &formation,
        global_environment: &formation,
        simulation_configuration: &formation,
        relative_information: &formation,
    };

    let mut clock = ClockGenerator::new();
    let mut components = FfComponents::new(references, &mut clock, formation.deputy_sat_id())?;
    let mut results = ResultManager::create(output)?;
    components.register_logging(&mut results)?;

    info!("running {steps} steps of {} s", scenario.step_time_s);
    for _ in 0..steps {
        components.tick(clock.timer_count());
        components.write_results(&mut results)?;
        results.write_row()?;
        formation.step(&components.generate_force_body_frame());
        clock.tick();
    }
    results.flush()?;

    let analyzer = components.relative_orbit_analyzer();
    info!(
        "final relative position (RTN) {:?} m, distance {:.3} m",
        analyzer.true_position_rtn_m().as_slice(),
        analyzer.true_distance_m()
    );
    Ok(components.generate_force_body_frame())
}
