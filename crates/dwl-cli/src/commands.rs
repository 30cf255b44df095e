use std::sync::Arc;

use anyhow::Context;
use colored::Colorize;
use serde::Serialize;

use dwl_retrieve::{DataSourceConfig, RetrieveOutcome, RetrieveRequest, RetrieveSession, Strategy};
use dwl_store::{InMemoryMetadataStore, MetadataStore, StudySnapshot};
use dwl_transport::{AuthHeaderProvider, NoAuth, StaticAuthHeaders};
use dwl_types::StudyUid;

use crate::cli::*;

/// Dispatch a parsed command line.
pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Fetch(args) => cmd_fetch(args, cli.format).await,
        Command::Config(args) => cmd_config(args, cli.format),
    }
}

#[derive(Serialize)]
struct FetchReport {
    study: String,
    strategy: &'static str,
    loaded: bool,
    series: Vec<SeriesLine>,
    failed: Vec<FailureLine>,
}

#[derive(Serialize)]
struct SeriesLine {
    series: String,
    modality: Option<String>,
    series_number: Option<i64>,
    description: Option<String>,
    instances: usize,
    /// Set when the series' retrieval failed; its summary is still cached.
    failed: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    image_ids: Vec<String>,
}

#[derive(Serialize)]
struct FailureLine {
    series: String,
    reason: String,
}

fn build_request(args: &FetchArgs) -> RetrieveRequest {
    let mut request = RetrieveRequest::new(args.study.as_str())
        .made_locally(args.made_locally)
        .allow_credentialed_requests(args.token.is_some());
    if args.lazy {
        request = request.with_strategy(Strategy::Lazy);
    } else if args.eager {
        request = request.with_strategy(Strategy::Eager);
    }
    if let Some(modality) = args.modality.clone() {
        request = request.with_filter(move |s| s.modality.as_deref() == Some(modality.as_str()));
    }
    if let Some(limit) = args.max_concurrent_series {
        request = request.with_max_concurrent_series(limit);
    }
    request
}

async fn cmd_fetch(args: FetchArgs, format: OutputFormat) -> anyhow::Result<()> {
    let config = match &args.config {
        Some(path) => DataSourceConfig::load(path).with_context(|| format!("loading {}", path.display()))?,
        None => DataSourceConfig::default(),
    };
    let auth: Arc<dyn AuthHeaderProvider> = match &args.token {
        Some(token) => Arc::new(StaticAuthHeaders::bearer(token)),
        None => Arc::new(NoAuth),
    };
    let store = Arc::new(InMemoryMetadataStore::new());
    let session = RetrieveSession::from_config(config, auth, store.clone())?;
    let request = build_request(&args);

    let (strategy, failed) = match session.retrieve(&request).await? {
        RetrieveOutcome::Eager(_) => ("eager", Vec::new()),
        RetrieveOutcome::Lazy(retrieval) => {
            let report = retrieval.completion().await?;
            let failed = report
                .failed
                .iter()
                .map(|f| FailureLine {
                    series: f.series.to_string(),
                    reason: f.reason.to_string(),
                })
                .collect();
            ("lazy", failed)
        }
    };

    let study = StudyUid::new(args.study.as_str());
    let report = FetchReport {
        study: study.to_string(),
        strategy,
        loaded: store.is_loaded(&study),
        series: store
            .study(&study)
            .map(|snapshot| series_lines(&snapshot, args.instances, &failed))
            .unwrap_or_default(),
        failed,
    };

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => print_report(&report),
    }
    Ok(())
}

fn series_lines(snapshot: &StudySnapshot, with_instances: bool, failed: &[FailureLine]) -> Vec<SeriesLine> {
    snapshot
        .series
        .iter()
        .map(|s| SeriesLine {
            series: s.summary.series.to_string(),
            modality: s.summary.modality.clone(),
            series_number: s.summary.series_number,
            description: s.summary.description.clone(),
            instances: s.instance_count(),
            failed: failed.iter().any(|f| f.series == s.summary.series.as_str()),
            image_ids: if with_instances {
                s.instances
                    .iter()
                    .flat_map(|i| i.image_ids.iter().map(ToString::to_string))
                    .collect()
            } else {
                Vec::new()
            },
        })
        .collect()
}

fn print_report(report: &FetchReport) {
    let state = if report.loaded { "loaded".green().bold() } else { "not loaded".red().bold() };
    println!("Study {} ({}, {})", report.study.yellow().bold(), report.strategy.cyan(), state);
    for line in &report.series {
        let number = line.series_number.map(|n| format!("#{n}")).unwrap_or_else(|| "-".into());
        let mark = if line.failed { "✗".red().bold() } else { "✓".green() };
        println!(
            "  {} {:>4} {:<4} {:>5} instances  {}",
            mark,
            number.dimmed(),
            line.modality.as_deref().unwrap_or("??").bold(),
            line.instances,
            line.description.as_deref().unwrap_or(""),
        );
        println!("      {}", line.series.dimmed());
        for id in &line.image_ids {
            println!("      {}", id.blue());
        }
    }
    if !report.failed.is_empty() {
        println!("{}", "Failed series:".red().bold());
    }
    for failure in &report.failed {
        println!("  {}: {}", failure.series.yellow(), failure.reason);
    }
}

fn cmd_config(args: ConfigArgs, format: OutputFormat) -> anyhow::Result<()> {
    if let Some(path) = &args.check {
        let config = DataSourceConfig::load(path).with_context(|| format!("checking {}", path.display()))?;
        match format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&config)?),
            OutputFormat::Text => println!("{} {} is valid ({})", "✓".green().bold(), path.display(), config.name.bold()),
        }
        return Ok(());
    }
    if args.print_default {
        let config = DataSourceConfig::default();
        match format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&config)?),
            OutputFormat::Text => print!("{}", config.to_toml_string()?),
        }
        return Ok(());
    }
    println!("Nothing to do. Use {} or {}.", "--print-default".bold(), "--check <file>".bold());
    Ok(())
}
