//! End-to-end runs against a synthetic data directory.
//!
//! The CSV files are rendered from known parameter vectors, so a seed equal
//! to the generating vector scores zero and the loaders can be checked
//! without hardware captures.

use approx::assert_relative_eq;
use std::path::Path;
use tempfile::TempDir;
use wavemix::{render_table, score, CombinationCode, ParameterVector, PerturbationPolicy, COUNTER_VALUES};
use wavemix_fit::{
    ChipId, FitReport, FitRunner, ParameterOverrides, ReportFormat, RunnerConfig, SeedCatalog,
    SeedEntry,
};

/// Generating vectors for columns A and B.
fn truths(code: CombinationCode) -> [ParameterVector; 2] {
    let a = SeedCatalog::builtin()
        .seed(chip('E'), code)
        .map(|e| e.params())
        .unwrap_or_else(|| ParameterVector::default_for(code));
    let b = ParameterVector::default_for(code);
    [a, b]
}

fn chip(letter: char) -> ChipId {
    ChipId::new(letter).unwrap()
}

fn write_data_dir(dir: &Path) {
    for code in CombinationCode::ALL {
        let [a, b] = truths(code).map(|p| render_table(code, &p));
        let mut text = String::new();
        for j in 0..COUNTER_VALUES {
            text.push_str(&format!("{},{}\n", a[j], b[j]));
        }
        std::fs::write(wavemix_fit::reference::data_path(dir, code), text).unwrap();
    }
}

/// Catalog with column A seeded at its generating vector.
fn exact_catalog() -> SeedCatalog {
    let mut catalog = SeedCatalog::default();
    for code in CombinationCode::ALL {
        catalog.insert(chip('A'), code, SeedEntry::from_params(&truths(code)[0], Some(0)));
    }
    catalog
}

fn config(dir: &Path) -> RunnerConfig {
    RunnerConfig {
        data_dir: dir.to_path_buf(),
        rng_seed: Some(5),
        max_iterations: Some(200),
        echo: false,
        format: ReportFormat::Snippet,
        ..RunnerConfig::default()
    }
}

#[test]
fn exact_seed_scores_zero_for_every_code() {
    let dir = TempDir::new().unwrap();
    write_data_dir(dir.path());
    let runner = FitRunner::with_catalog(config(dir.path()), exact_catalog());

    for code in CombinationCode::ALL {
        let outcome = runner
            .score(code, chip('A'), &ParameterOverrides::default(), false)
            .unwrap();
        assert_eq!(outcome.score, 0, "code {code}");
        assert!(outcome.trace.is_none());
    }
}

#[test]
fn column_b_is_a_different_chip() {
    let dir = TempDir::new().unwrap();
    write_data_dir(dir.path());
    let runner = FitRunner::with_catalog(config(dir.path()), exact_catalog());
    let code = CombinationCode::SawtoothPulse;

    // Chip B has no catalog entry, so it is scored from the defaults it was
    // rendered with.
    let outcome = runner.score(code, chip('B'), &ParameterOverrides::default(), true).unwrap();
    assert_eq!(outcome.params, ParameterVector::default_for(code));
    assert_eq!(outcome.score, 0);
    let rows = outcome.trace.unwrap();
    assert_eq!(rows.len(), COUNTER_VALUES);
    assert!(rows.iter().all(|r| r.simulated == r.reference));
}

#[test]
fn overrides_change_the_score() {
    let dir = TempDir::new().unwrap();
    write_data_dir(dir.path());
    let runner = FitRunner::with_catalog(config(dir.path()), exact_catalog());
    let code = CombinationCode::TriangleSawtoothPulse;

    let overrides = ParameterOverrides {
        bias: Some(0.0),
        ..ParameterOverrides::default()
    };
    let outcome = runner.score(code, chip('A'), &overrides, false).unwrap();
    assert_eq!(outcome.params.bias, 0.0);
    let table = runner.load_reference(code, chip('A')).unwrap();
    assert_eq!(outcome.score, score(code, &outcome.params, &table));
    assert!(outcome.score > 0);
}

#[test]
fn bounded_fit_reports_consistent_results() {
    let dir = TempDir::new().unwrap();
    write_data_dir(dir.path());

    for (policy, jobs) in [(PerturbationPolicy::Discrete, 1), (PerturbationPolicy::Joint, 3)] {
        let runner = FitRunner::with_catalog(
            RunnerConfig {
                policy,
                jobs,
                ..config(dir.path())
            },
            SeedCatalog::default(),
        );
        let code = CombinationCode::TriangleSawtooth;
        let report = runner.fit(code, chip('A')).unwrap();

        assert_eq!(report.iterations, 200);
        assert_eq!(report.policy, policy);
        assert_eq!(report.jobs, jobs);
        assert!(report.best_score <= report.initial_score);
        let table = runner.load_reference(code, chip('A')).unwrap();
        assert_eq!(report.best_score, score(code, &report.best, &table));
        if let Some(last) = report.improvements.last() {
            assert_eq!(last.score, report.best_score);
        }
    }
}

#[test]
fn seeded_sequential_fits_repeat_exactly() {
    let dir = TempDir::new().unwrap();
    write_data_dir(dir.path());
    let runner = FitRunner::with_catalog(config(dir.path()), SeedCatalog::default());
    let code = CombinationCode::TrianglePulse;

    let first = runner.fit(code, chip('A')).unwrap();
    let second = runner.fit(code, chip('A')).unwrap();
    assert_eq!(first.best, second.best);
    assert_eq!(first.improvements, second.improvements);
}

#[test]
fn report_json_and_rendered_csv_round_trip() {
    let dir = TempDir::new().unwrap();
    write_data_dir(dir.path());
    let runner = FitRunner::with_catalog(config(dir.path()), exact_catalog());
    let code = CombinationCode::SawtoothPulse;

    let report = runner.fit(code, chip('A')).unwrap();
    let path = dir.path().join("reports/a6.json");
    report.save_json(&path).unwrap();
    let loaded = FitReport::load_json(&path).unwrap();
    assert_eq!(loaded.best_score, 0);
    assert_relative_eq!(loaded.best.bias, report.best.bias);

    let out = dir.path().join("rendered/WAVE6.CSV");
    let rendered = runner.render(code, chip('A'), &ParameterOverrides::default(), &out).unwrap();
    let reloaded = wavemix_fit::reference::load_table(out.parent().unwrap(), code, chip('A')).unwrap();
    assert_eq!(reloaded, rendered);
    assert_eq!(reloaded, runner.load_reference(code, chip('A')).unwrap());
}

#[test]
fn catalog_file_drives_seed_selection() {
    let dir = TempDir::new().unwrap();
    write_data_dir(dir.path());
    let seeds = dir.path().join("seeds.yaml");
    exact_catalog().save(&seeds).unwrap();

    let runner = FitRunner::new(RunnerConfig {
        seeds_path: Some(seeds),
        ..config(dir.path())
    })
    .unwrap();
    let code = CombinationCode::TriangleSawtoothPulse;
    assert_eq!(runner.seed_for(chip('A'), code), truths(code)[0]);
    let report = runner.fit(code, chip('A')).unwrap();
    assert_eq!(report.initial_score, 0);
    assert_eq!(report.best_score, 0);
}
