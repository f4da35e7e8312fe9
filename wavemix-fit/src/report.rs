//! Improvement stream formatting and fit reports.
//!
//! The search emits every accepted candidate. [`ImprovementLog`] records them
//! and, when echoing, prints each one in the selected [`ReportFormat`]:
//!
//! - `text`: coloured terminal output
//! - `snippet`: `// current score N` followed by one `name = value` line per
//!   parameter, ready to paste into a seed table
//! - `yaml`: a single seed-catalog entry
//!
//! At the end of a fit, [`FitReport`] gathers the run into a JSON document.

use crate::config::{SeedCatalog, SeedEntry};
use crate::reference::ChipId;
use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::Write as _;
use std::path::Path;
use std::str::FromStr;
use wavemix::{
    CombinationCode, Improvement, ImprovementSink, ParameterVector, PerturbationPolicy, TraceRow,
};

/// How each improvement is printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportFormat {
    #[default]
    Text,
    Snippet,
    Yaml,
}

impl FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(ReportFormat::Text),
            "snippet" => Ok(ReportFormat::Snippet),
            "yaml" => Ok(ReportFormat::Yaml),
            other => Err(format!(
                "Unknown report format '{other}' (expected text, snippet or yaml)"
            )),
        }
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ReportFormat::Text => "text",
            ReportFormat::Snippet => "snippet",
            ReportFormat::Yaml => "yaml",
        })
    }
}

impl ReportFormat {
    /// Lines announcing the seed's exact score.
    pub fn render_initial(self, score: u32, params: &ParameterVector) -> String {
        match self {
            ReportFormat::Text => {
                format!("{} initial score {}\n{}", "▶".blue(), score.to_string().bold(), text_params(params))
            }
            ReportFormat::Snippet => format!("// initial score {score}\n{}", snippet_params(params)),
            ReportFormat::Yaml => format!("# initial score {score}"),
        }
    }

    /// Lines for one accepted candidate.
    pub fn render_improvement(self, code: CombinationCode, improvement: &Improvement) -> String {
        let Improvement {
            iteration,
            score,
            params,
        } = improvement;
        match self {
            ReportFormat::Text => format!(
                "{} current score {} {}\n{}",
                "✓".green(),
                score.to_string().bold(),
                format!("(iteration {iteration})").dimmed(),
                text_params(params)
            ),
            ReportFormat::Snippet => format!("// current score {score}\n{}", snippet_params(params)),
            ReportFormat::Yaml => yaml_entry(code, params, *score),
        }
    }
}

fn text_params(params: &ParameterVector) -> String {
    let mut out = String::new();
    for (name, value) in params.entries() {
        let _ = writeln!(out, "    {} {value:?}", format!("{name:<15}").dimmed());
    }
    out
}

fn snippet_params(params: &ParameterVector) -> String {
    let mut out = String::new();
    for (name, value) in params.entries() {
        let _ = writeln!(out, "{name} = {value:?}");
    }
    out
}

fn yaml_entry(code: CombinationCode, params: &ParameterVector, score: u32) -> String {
    let mut fields = String::new();
    for (name, value) in params.entries() {
        let _ = write!(fields, "{name}: {value:?}, ");
    }
    format!("{}: {{ {fields}score: {score} }}", code.bits())
}

/// Records the search trail, optionally printing it as it arrives.
#[derive(Debug, Clone)]
pub struct ImprovementLog {
    code: CombinationCode,
    format: ReportFormat,
    echo: bool,
    initial: Option<u32>,
    improvements: Vec<Improvement>,
}

impl ImprovementLog {
    pub fn new(code: CombinationCode, format: ReportFormat, echo: bool) -> Self {
        Self {
            code,
            format,
            echo,
            initial: None,
            improvements: Vec::new(),
        }
    }

    pub fn initial_score(&self) -> Option<u32> {
        self.initial
    }

    pub fn improvements(&self) -> &[Improvement] {
        &self.improvements
    }

    pub fn into_improvements(self) -> Vec<Improvement> {
        self.improvements
    }
}

impl ImprovementSink for ImprovementLog {
    fn initial(&mut self, score: u32, params: &ParameterVector) {
        self.initial = Some(score);
        if self.echo {
            println!("{}", self.format.render_initial(score, params));
        }
    }

    fn improved(&mut self, improvement: &Improvement) {
        self.improvements.push(*improvement);
        if self.echo {
            println!("{}", self.format.render_improvement(self.code, improvement));
        }
    }
}

/// Outcome of one fit, saved as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitReport {
    pub timestamp: String,
    pub chip: ChipId,
    pub code: CombinationCode,
    pub policy: PerturbationPolicy,
    /// RNG seed; absent when seeded from entropy.
    pub rng_seed: Option<u64>,
    pub jobs: usize,
    pub iterations: u64,
    pub initial_score: u32,
    pub best_score: u32,
    pub best: ParameterVector,
    pub improvements: Vec<Improvement>,
}

impl FitReport {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        chip: ChipId,
        code: CombinationCode,
        policy: PerturbationPolicy,
        rng_seed: Option<u64>,
        jobs: usize,
        iterations: u64,
        initial_score: u32,
        best: ParameterVector,
        best_score: u32,
        improvements: Vec<Improvement>,
    ) -> Self {
        Self {
            timestamp: unix_timestamp(),
            chip,
            code,
            policy,
            rng_seed,
            jobs,
            iterations,
            initial_score,
            best_score,
            best,
            improvements,
        }
    }

    /// Save report to JSON file.
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<(), std::io::Error> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }

    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, std::io::Error> {
        let text = std::fs::read_to_string(path)?;
        serde_json::from_str(&text).map_err(std::io::Error::other)
    }

    /// The best vector as a catalog entry.
    pub fn seed_entry(&self) -> SeedEntry {
        SeedEntry::from_params(&self.best, Some(self.best_score))
    }

    /// Print human-readable summary to terminal.
    pub fn print_summary(&self) {
        println!("\n{}", "═".repeat(60).bold());
        println!("{}", " WAVEMIX FIT REPORT ".bold().on_blue());
        println!("{}", "═".repeat(60).bold());
        println!("Timestamp:  {}", self.timestamp.dimmed());
        println!(
            "Chip {}, combination {}, policy {}, {} job(s)",
            self.chip.to_string().bold(),
            self.code,
            self.policy,
            self.jobs
        );
        if let Some(seed) = self.rng_seed {
            println!("RNG seed:   {}", seed.to_string().dimmed());
        }
        println!("{}", "─".repeat(60));

        let gained = self.initial_score.saturating_sub(self.best_score);
        let status = if gained > 0 {
            format!("improved by {gained}").green()
        } else {
            "no improvement".yellow()
        };
        println!(
            "Score: {} → {} ({}) after {} iterations, {} accepted",
            self.initial_score,
            self.best_score.to_string().bold(),
            status,
            self.iterations,
            self.improvements.len()
        );
        print!("{}", text_params(&self.best));
        println!("{}\n", "═".repeat(60).bold());
    }
}

/// Seconds since the Unix epoch.
fn unix_timestamp() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let duration = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    duration.as_secs().to_string()
}

/// Seed catalog as a table, one row per (chip, code).
pub fn catalog_table(catalog: &SeedCatalog) -> String {
    use tabled::{Table, Tabled};

    #[derive(Tabled)]
    struct SeedRow {
        chip: String,
        model: String,
        code: String,
        bias: String,
        #[tabled(rename = "pulse")]
        pulse_strength: String,
        #[tabled(rename = "top bit")]
        top_bit: String,
        distance: String,
        stmix: String,
        score: String,
    }

    let mut rows = vec![];
    for (chip, seeds) in &catalog.chips {
        for (code, entry) in &seeds.seeds {
            rows.push(SeedRow {
                chip: chip.to_string(),
                model: seeds.description.clone(),
                code: code.to_string(),
                bias: format!("{:?}", entry.bias),
                pulse_strength: format!("{:?}", entry.pulse_strength),
                top_bit: format!("{:?}", entry.top_bit),
                distance: format!("{:?}", entry.distance),
                stmix: format!("{:?}", entry.stmix),
                score: entry
                    .score
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "-".to_string()),
            });
        }
    }
    Table::new(rows).to_string()
}

/// One line per counter value: counter, measured, simulated, analog
/// estimate, and the mismatching bits.
pub fn trace_lines(rows: &[TraceRow]) -> String {
    let mut out = String::with_capacity(rows.len() * 40);
    for row in rows {
        let _ = write!(
            out,
            "{:4} {:3} {:3} {:9.3}",
            row.counter, row.reference, row.simulated, row.analog
        );
        if row.simulated != row.reference {
            let _ = write!(out, "  ^{:08b}", row.simulated ^ row.reference);
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn params() -> ParameterVector {
        ParameterVector::new(0.9321273, 0.0, 0.0, 0.8860587, 0.5655726)
    }

    fn improvement() -> Improvement {
        Improvement {
            iteration: 12,
            score: 278,
            params: params(),
        }
    }

    #[test]
    fn format_parses() {
        assert_eq!("snippet".parse::<ReportFormat>(), Ok(ReportFormat::Snippet));
        assert_eq!("YAML".parse::<ReportFormat>(), Ok(ReportFormat::Yaml));
        assert!("csv".parse::<ReportFormat>().is_err());
    }

    #[test]
    fn snippet_lists_each_parameter() {
        let text = ReportFormat::Snippet.render_improvement(CombinationCode::TriangleSawtooth, &improvement());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "// current score 278");
        assert_eq!(lines[1], "bias = 0.9321273");
        assert_eq!(lines[2], "pulse_strength = 0.0");
        assert_eq!(lines[5], "stmix = 0.5655726");
        assert_eq!(lines.len(), 6);
    }

    #[test]
    fn yaml_entry_parses_as_catalog_seed() {
        let text = ReportFormat::Yaml.render_improvement(CombinationCode::TriangleSawtooth, &improvement());
        let parsed: std::collections::BTreeMap<CombinationCode, SeedEntry> =
            serde_yaml::from_str(&text).unwrap();
        let entry = parsed[&CombinationCode::TriangleSawtooth];
        assert_eq!(entry.params(), params());
        assert_eq!(entry.score, Some(278));
    }

    #[test]
    fn log_records_in_order() {
        let mut log = ImprovementLog::new(CombinationCode::TriangleSawtooth, ReportFormat::Text, false);
        log.initial(300, &params());
        log.improved(&improvement());
        log.improved(&Improvement {
            iteration: 40,
            score: 270,
            params: params(),
        });
        assert_eq!(log.initial_score(), Some(300));
        let scores: Vec<u32> = log.improvements().iter().map(|i| i.score).collect();
        assert_eq!(scores, vec![278, 270]);
    }

    #[test]
    fn report_round_trips_through_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out/fit.json");
        let report = FitReport::new(
            ChipId::new('D').unwrap(),
            CombinationCode::TriangleSawtooth,
            PerturbationPolicy::Joint,
            Some(9),
            2,
            1000,
            300,
            params(),
            278,
            vec![improvement()],
        );
        report.save_json(&path).unwrap();
        let loaded = FitReport::load_json(&path).unwrap();
        assert_eq!(loaded, report);
        assert_eq!(loaded.seed_entry().score, Some(278));

        let json = std::fs::read_to_string(&path).unwrap();
        assert!(json.contains("\"policy\": \"joint\""), "got {json}");
        assert!(json.contains("\"code\": 3"), "got {json}");
    }

    #[test]
    fn catalog_table_has_a_row_per_seed() {
        let table = catalog_table(&SeedCatalog::builtin());
        assert!(table.contains("top bit"));
        assert!(table.contains("0.8869214"));
        assert_eq!(table.matches("8580").count(), 8);
    }

    #[test]
    fn trace_lines_mark_mismatches() {
        let rows = [
            TraceRow {
                counter: 1,
                reference: 3,
                simulated: 3,
                analog: 0.25,
            },
            TraceRow {
                counter: 2,
                reference: 0b0000_0001,
                simulated: 0b1000_0001,
                analog: 8.0,
            },
        ];
        let text = trace_lines(&rows);
        let lines: Vec<&str> = text.lines().collect();
        assert!(!lines[0].contains('^'));
        assert!(lines[1].ends_with("^10000000"), "got {}", lines[1]);
    }
}
