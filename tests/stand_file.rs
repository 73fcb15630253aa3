//! Stand definition files driven end to end
//!
//! Loads the bundled sample stand, wires light and growth the way the
//! driver does, and runs several timesteps.

use std::path::PathBuf;

use stand_growth::core::{GrowthError, SpeciesId, SpeciesTypeCombo, TreeType};
use stand_growth::growth::{GrowthContext, TimestepReport};
use stand_growth::rules::{load_stand_file, parse_stand, StandFile};
use stand_growth::stand::{Stand, TreePopulation};

fn sample_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data/stands/mixed_hardwood.toml")
}

fn run(file: &StandFile, seed: u64, steps: u32) -> (Stand, Vec<TimestepReport>) {
    let mut stand = file.build_stand(seed).unwrap();
    let light = file.light().unwrap();
    let num_species = stand.num_species();
    light.register(&mut stand, num_species);

    let mut ctx = GrowthContext::setup(file.growth_config(), file.build_plugins().unwrap(), &mut stand).unwrap();
    let mut reports = Vec::new();
    for _ in 0..steps {
        light.apply(&mut stand);
        reports.push(ctx.run_timestep(&mut stand).unwrap());
        stand.advance_life_stages();
    }
    (stand, reports)
}

#[test]
fn test_sample_stand_grows() {
    let file = load_stand_file(&sample_path()).unwrap();
    assert_eq!(file.species.len(), 2);
    assert_eq!(file.growth.len(), 6);

    let (stand, reports) = run(&file, file.run.seed, 5);
    assert_eq!(stand.tree_count(), 300);
    for report in &reports {
        assert_eq!(report.trees_visited, 300);
        assert!(report.trees_grown > 0);
        assert!(report.diameter_growth > 0.0);
        println!(
            "Step {}: grew {} skipped {} (+{:.2} cm)",
            report.timestep, report.trees_grown, report.trees_skipped, report.diameter_growth
        );
    }

    // Every growing tree got a growth rate
    let acru_adult = SpeciesTypeCombo::new(SpeciesId(0), TreeType::Adult);
    let growth = stand.field_code("Growth", acru_adult).unwrap();
    for tree in stand.trees().filter(|t| t.combo() == acru_adult) {
        assert!(tree.field(growth).unwrap() > 0.0);
    }
}

#[test]
fn test_heights_stay_below_species_ceiling() {
    let file = load_stand_file(&sample_path()).unwrap();
    let (stand, _) = run(&file, file.run.seed, 15);
    for tree in stand.trees() {
        let max = file.species[tree.species().index()].allometry.max_height;
        assert!(tree.height() < max, "{} is {} m tall", tree.id(), tree.height());
    }
}

#[test]
fn test_same_seed_same_stand() {
    let file = load_stand_file(&sample_path()).unwrap();
    let (a, _) = run(&file, 99, 3);
    let (b, _) = run(&file, 99, 3);
    let sizes = |stand: &Stand| stand.trees().map(|t| (t.dbh(), t.height())).collect::<Vec<_>>();
    assert_eq!(sizes(&a), sizes(&b));
}

#[test]
fn test_missing_light_fails_setup() {
    let file = load_stand_file(&sample_path()).unwrap();
    let mut stand = file.build_stand(1).unwrap();
    let result = GrowthContext::setup(file.growth_config(), file.build_plugins().unwrap(), &mut stand);
    assert!(matches!(result, Err(GrowthError::MissingField { ref field, .. }) if field == "Light"));
}

#[test]
fn test_conflicting_stand_file_is_rejected() {
    let content = r#"
        [[species]]
        name = "PIST"
        max_height = 30.0

        [[growth]]
        kind = "constant_radial"
        name = "a"
        combos = [{ species = "PIST", type = "adult" }]
        params = { radial_mm_per_year = 1.0 }

        [[growth]]
        kind = "constant_radial"
        name = "b"
        combos = [{ species = "PIST", type = "adult" }]
        params = { radial_mm_per_year = 2.0 }
    "#;
    let file = parse_stand(content).unwrap();
    let mut stand = file.build_stand(1).unwrap();
    let result = GrowthContext::setup(file.growth_config(), file.build_plugins().unwrap(), &mut stand);
    assert!(matches!(
        result,
        Err(GrowthError::Conflict { ref existing, ref incoming, .. }) if existing == "a" && incoming == "b"
    ));
}

#[test]
fn test_missing_file_is_an_io_error() {
    let result = load_stand_file(&PathBuf::from("no/such/stand.toml"));
    assert!(matches!(result, Err(GrowthError::Io(_))));
}
