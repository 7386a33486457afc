// SPDX-License-Identifier: GPL-3.0-or-later

//! `profilarr` - run custom format tests and score releases from a bundle.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use profilarr_application::{
    explain_decision, HarnessReport, ScoringEngine, TestHarness,
};
use profilarr_config::{load as load_config, TelemetryConfig};
use profilarr_domain::{ConsumerApp, ReleaseDescriptor};
use profilarr_infrastructure::load_bundle;
use serde_json::json;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "profilarr")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Custom format testing and release scoring", long_about = None)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, global = true, env = "PROFILARR_CONFIG")]
    config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the stored test cases of every format in a bundle
    Test {
        /// Bundle file (JSON)
        #[arg(short, long)]
        bundle: PathBuf,

        /// Only run the format with this name
        #[arg(short, long)]
        format: Option<String>,
    },

    /// Score a release under a profile and decide whether to grab it
    Score {
        /// Bundle file (JSON)
        #[arg(short, long)]
        bundle: PathBuf,

        /// Profile name
        #[arg(short, long)]
        profile: String,

        /// Release descriptor file (JSON)
        #[arg(short, long)]
        release: PathBuf,

        /// Score of the release already on disk, if any
        #[arg(long, allow_negative_numbers = true)]
        existing_score: Option<i32>,

        /// Existing release already satisfies the quality cutoff
        #[arg(long)]
        cutoff_met: bool,
    },
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    init_tracing(&config.telemetry);

    match cli.command {
        Commands::Test { bundle, format } => {
            run_tests(&config, &bundle, format.as_deref(), cli.json)
        }
        Commands::Score {
            bundle,
            profile,
            release,
            existing_score,
            cutoff_met,
        } => {
            let request = ScoreRequest {
                bundle: &bundle,
                profile: &profile,
                release: &release,
                existing_score,
                cutoff_met,
            };
            run_score(&config, &request, cli.json)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn init_tracing(telemetry: &TelemetryConfig) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(telemetry.log_level.as_str()));
    let registry = tracing_subscriber::registry().with(env_filter);

    if telemetry.json {
        registry
            .with(fmt::layer().json().with_target(true).with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_level(true).with_writer(std::io::stderr))
            .init();
    }
}

fn run_tests(
    config: &profilarr_config::AppConfig,
    bundle_path: &Path,
    only: Option<&str>,
    as_json: bool,
) -> Result<ExitCode> {
    let bundle = load_bundle(bundle_path)?;
    let registry = bundle.registry(&config.patterns);
    let harness = TestHarness::new(&registry);

    let formats: Vec<_> = match only {
        Some(name) => vec![bundle
            .format(name)
            .ok_or_else(|| anyhow!("format '{name}' not found in bundle"))?],
        None => bundle.formats.iter().collect(),
    };

    let mut reports = Vec::with_capacity(formats.len());
    for format in formats {
        reports.push(harness.run_stored(format)?);
    }

    if as_json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        for report in &reports {
            print_report(report);
        }
    }

    let failed: usize = reports.iter().map(HarnessReport::failed).sum();
    info!(target: "cli", formats = reports.len(), failed, "test run finished");

    Ok(if failed == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn print_report(report: &HarnessReport) {
    println!(
        "{}: {}/{} passed",
        report.format,
        report.passed(),
        report.results.len()
    );
    for result in &report.results {
        let status = if result.passed { "ok" } else { "FAIL" };
        let highlight = result
            .span
            .map(|span| format!(" [{}..{}]", span.start, span.end))
            .unwrap_or_default();
        println!(
            "  #{} {status} expected={} actual={} {}{highlight}",
            result.id, result.expected, result.actual, result.input
        );
    }
    for diagnostic in &report.diagnostics {
        println!("  warning: {diagnostic}");
    }
}

struct ScoreRequest<'a> {
    bundle: &'a Path,
    profile: &'a str,
    release: &'a Path,
    existing_score: Option<i32>,
    cutoff_met: bool,
}

fn run_score(
    config: &profilarr_config::AppConfig,
    request: &ScoreRequest<'_>,
    as_json: bool,
) -> Result<()> {
    let bundle = load_bundle(request.bundle)?;
    let profile = bundle
        .profile(request.profile)
        .ok_or_else(|| anyhow!("profile '{}' not found in bundle", request.profile))?;
    let release = read_release(request.release)?;

    let registry = bundle.registry(&config.patterns);
    let engine = ScoringEngine::new(&registry);
    let score = engine.score(&release, &bundle.formats, profile, profile.app);
    let reason = explain_decision(score.total, request.existing_score, request.cutoff_met, profile);

    let applied: Vec<&str> = score
        .applied
        .iter()
        .filter_map(|id| bundle.formats.iter().find(|f| f.id == *id))
        .map(|f| f.name.as_str())
        .collect();

    if as_json {
        let output = json!({
            "total": score.total,
            "tag_bonus": score.tag_bonus,
            "applied": applied,
            "decision": reason.decision(),
            "reason": reason,
            "diagnostics": score.diagnostics,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("release: {}", release.title);
        println!("profile: {} ({})", profile.name, app_label(profile.app));
        println!("score:   {} (tags {:+})", score.total, score.tag_bonus);
        println!("formats: {}", applied.join(", "));
        println!("decision: {} ({:?})", reason.decision(), reason);
        for diagnostic in &score.diagnostics {
            println!("warning: {diagnostic}");
        }
    }

    Ok(())
}

fn read_release(path: &Path) -> Result<ReleaseDescriptor> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read release {}", path.display()))?;
    serde_json::from_str(&json).with_context(|| format!("malformed release {}", path.display()))
}

fn app_label(app: ConsumerApp) -> &'static str {
    match app {
        ConsumerApp::Radarr => "Radarr",
        ConsumerApp::Sonarr => "Sonarr",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::io::Write;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_score_command() {
        let cli = Cli::try_parse_from([
            "profilarr",
            "score",
            "--bundle",
            "bundle.json",
            "--profile",
            "UHD",
            "--release",
            "release.json",
            "--existing-score",
            "-20",
            "--cutoff-met",
        ])
        .expect("valid arguments");

        match cli.command {
            Commands::Score {
                profile,
                existing_score,
                cutoff_met,
                ..
            } => {
                assert_eq!(profile, "UHD");
                assert_eq!(existing_score, Some(-20));
                assert!(cutoff_met);
            }
            Commands::Test { .. } => panic!("expected score command"),
        }
    }

    #[test]
    fn reads_release_descriptor() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"title":"Movie.2020.2160p.HDR","resolution":"2160p","source":"bluray","year":2020}}"#
        )
        .unwrap();

        let release = read_release(file.path()).unwrap();
        assert_eq!(release.year, Some(2020));
        assert_eq!(release.resolution, Some(profilarr_domain::Resolution::R2160p));
        assert!(release.languages.is_empty());

        assert!(read_release(Path::new("/definitely/not/here.json")).is_err());
    }
}
