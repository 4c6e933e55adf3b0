//! End-to-end scenario runs against files on disk.

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;

use upl_engine::analytics::{grade_histograms, tonnage_grade_curve, ExtractionOutcome};
use upl_engine::block::BlockIndex;
use upl_engine::config::AppConfig;
use upl_engine::mine_plan::PeriodFilter;
use upl_engine::optimizer::UplOutcome;
use upl_engine::pipeline::{run_scenario, ScenarioInputs};
use upl_engine::pit_graph::PrecedenceMode;
use upl_engine::report::{ExtractionStatus, PitStatus};
use upl_engine::{logging, UplError};

const TWO_BLOCKS: &str = "0,0,0,10,2,0\n0,0,1,10,0,0\n";

const PLAN: &str = "XIndex,YIndex,ZIndex,Period,Tonnage\n\
                    0,0,0,1,10\n\
                    0,0,1,2,10\n";

fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path
}

fn inputs(dir: &TempDir, blocks: &str) -> ScenarioInputs {
    ScenarioInputs {
        blocks: write(dir, "deposit.csv", blocks),
        ..Default::default()
    }
}

#[test]
fn two_block_scenario_takes_the_column() {
    logging::init_test();
    let dir = tempfile::tempdir().unwrap();
    let run = run_scenario(&inputs(&dir, TWO_BLOCKS), &AppConfig::default()).unwrap();

    assert_eq!(run.model.name, "deposit");
    let top = run.model.get(&BlockIndex::new(0, 0, 0)).unwrap();
    assert!((top.grade1 - 0.2).abs() < 1e-12);
    assert!((top.economic_value - 169_925.0).abs() < 1e-6);
    let below = run.model.get(&BlockIndex::new(0, 0, -1)).unwrap();
    assert_eq!(below.economic_value, -25.0);

    let pit = run.outcome.pit().unwrap();
    assert_eq!(
        pit.blocks,
        vec![BlockIndex::new(0, 0, -1), BlockIndex::new(0, 0, 0)]
    );

    let report = run.report(&AppConfig::default()).unwrap();
    assert_eq!(report.pit.status, PitStatus::Profitable);
    assert_eq!(report.pit.value, 169_900.0);
    assert_eq!(report.pit.tonnage, 20.0);
    assert_eq!(report.deposit_value, 169_900.0);
    assert!(report.extraction.is_none());
}

#[test]
fn missing_period_is_signalled_not_raised() {
    logging::init_test();
    let dir = tempfile::tempdir().unwrap();
    let mut scenario = inputs(&dir, TWO_BLOCKS);
    scenario.mine_plan = Some(write(&dir, "plan.csv", PLAN));
    scenario.period = Some(PeriodFilter::At(3));

    let run = run_scenario(&scenario, &AppConfig::default()).unwrap();
    let extraction = run.extraction.as_ref().unwrap();
    assert!(!extraction.is_period_found());
    assert_eq!(extraction.tonnage(), 0.0);

    let report = run.report(&AppConfig::default()).unwrap();
    let extraction = report.extraction.unwrap();
    assert_eq!(extraction.status, ExtractionStatus::PeriodNotFound);
    assert_eq!(extraction.period, 3);
    assert_eq!(extraction.tonnage, 0.0);
}

#[test]
fn periods_are_accounted_singly_or_cumulatively() {
    let dir = tempfile::tempdir().unwrap();
    let mut scenario = inputs(&dir, TWO_BLOCKS);
    scenario.mine_plan = Some(write(&dir, "plan.csv", PLAN));

    scenario.period = Some(PeriodFilter::At(2));
    let single = run_scenario(&scenario, &AppConfig::default()).unwrap();
    assert!(matches!(
        single.extraction,
        Some(ExtractionOutcome::Extracted { tonnage, matched_blocks: 1, .. }) if tonnage == 10.0
    ));

    scenario.period = Some(PeriodFilter::UpTo(2));
    let cumulative = run_scenario(&scenario, &AppConfig::default()).unwrap();
    assert_eq!(cumulative.extraction.unwrap().tonnage(), 20.0);
    assert_eq!(cumulative.plan.unwrap().len(), 2);
}

#[test]
fn rock_type_rules_label_the_model() {
    let dir = tempfile::tempdir().unwrap();
    let mut scenario = inputs(&dir, "0,0,0,10,2,0\n3,0,1,10,0,0\n0,0,1,10,0,0\n");
    scenario.rock_type_rules = Some(write(
        &dir,
        "rules.txt",
        "# oxide cap\nz == 1 : x < 2 => oxide\n",
    ));

    let config = AppConfig::from_toml_str("[rock_types]\nbaseline = \"fresh\"\n").unwrap();
    let run = run_scenario(&scenario, &config).unwrap();

    let label = |x, z| {
        run.model
            .get(&BlockIndex::new(x, 0, z))
            .and_then(|b| b.rock_type.clone())
            .unwrap()
    };
    assert_eq!(label(0, -1).as_str(), "oxide");
    assert_eq!(label(3, -1).as_str(), "fresh");
    assert_eq!(label(0, 0).as_str(), "fresh");
}

#[test]
fn worthless_deposit_reports_no_profitable_blocks() {
    let dir = tempfile::tempdir().unwrap();
    let run = run_scenario(
        &inputs(&dir, "0,0,0,10,0,0\n1,0,0,5,0,0.5\n0,0,1,10,0,0\n"),
        &AppConfig::default(),
    )
    .unwrap();

    assert!(matches!(run.outcome, UplOutcome::NoProfitableBlocks { .. }));
    let report = run.report(&AppConfig::default()).unwrap();
    assert_eq!(report.pit.status, PitStatus::NoProfitableBlocks);
    assert_eq!(report.pit.value, 0.0);
    assert!(report.pit.blocks.is_empty());
    assert!(report.to_json().unwrap().contains("no_profitable_blocks"));
}

#[test]
fn config_file_switches_pricing_and_precedence() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = write(
        &dir,
        "upl.toml",
        "[pricing]\nmetal_price = 2000000.0\n\n[solver]\nprecedence = \"overlying\"\n",
    );
    let config = AppConfig::from_file(&config_path).unwrap();
    assert_eq!(config.solver.precedence, PrecedenceMode::Overlying);

    let run = run_scenario(&inputs(&dir, TWO_BLOCKS), &config).unwrap();
    let pit = run.outcome.pit().unwrap();
    assert_eq!(pit.blocks, vec![BlockIndex::new(0, 0, 0)]);
    assert!((pit.total_value - (0.2 * 2e6 * 0.85 - 75.0)).abs() < 1e-6);
}

#[test]
fn malformed_block_file_fails_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let err = run_scenario(&inputs(&dir, "0,0,0,10,2\n"), &AppConfig::default()).unwrap_err();
    assert!(matches!(err, UplError::InvalidInput(_)));

    let err = run_scenario(&inputs(&dir, "0,0,0,0,2,0\n"), &AppConfig::default()).unwrap_err();
    assert!(matches!(err, UplError::InvalidInput(_)));
}

#[test]
fn curve_tonnage_never_rises_with_cutoff() {
    let dir = tempfile::tempdir().unwrap();
    let mut rows = String::new();
    for i in 0..50i64 {
        let tonnage = 5 + i % 7;
        let metal = (i * 37 % 11) as f64 * 0.3;
        rows.push_str(&format!("{},{},{},{},{},0\n", i % 5, i / 5 % 5, i / 25, tonnage, metal));
    }
    let run = run_scenario(&inputs(&dir, &rows), &AppConfig::default()).unwrap();

    let curve = tonnage_grade_curve(run.model.iter(), 0.01).unwrap();
    assert!(!curve.points.is_empty());
    assert_eq!(curve.points[0].tonnage, run.model.total_tonnage());
    for pair in curve.points.windows(2) {
        assert!(pair[1].cutoff > pair[0].cutoff);
        assert!(pair[1].tonnage <= pair[0].tonnage);
    }

    let pit = run.outcome.pit().unwrap();
    let pit_curve = tonnage_grade_curve(pit.blocks_in(&run.model), 0.01).unwrap();
    assert_eq!(pit_curve.points[0].tonnage, pit.total_tonnage);
    for pair in pit_curve.points.windows(2) {
        assert!(pair[1].tonnage <= pair[0].tonnage);
    }

    let histograms = grade_histograms(pit.blocks_in(&run.model), 10).unwrap();
    assert_eq!(histograms.grade1.total(), pit.len());
}
