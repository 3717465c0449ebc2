use crate::commands::{authenticated_serializd, tmdb_api_key};
use crate::output::{Output, OutputFormat};
use color_eyre::eyre::eyre;
use color_eyre::Result;
use comfy_table::Table;
use history_import_config::{read_exclusion_file, read_override_file, Config, CredentialStore, PathManager};
use history_import_core::{ImportOptions, ImportOrchestrator, ImportOrder};
use history_import_models::{ImportOutcome, ImportReport, SourceKind};
use history_import_remote::TmdbClient;
use history_import_sources::netflix;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

pub struct ImportArgs {
    pub source: SourceKind,
    pub path: PathBuf,
    pub dry_run: bool,
    pub profile: Option<String>,
    pub exclude: Vec<String>,
    pub exclude_file: Option<PathBuf>,
    pub order: Option<ImportOrder>,
    pub tag: Option<String>,
    pub dedup_window: Option<i64>,
    pub id_map: Option<PathBuf>,
    pub write_delay_ms: Option<u64>,
}

pub async fn run_import(args: ImportArgs, output: &Output) -> Result<()> {
    let paths = PathManager::new().map_err(|e| eyre!("{:#}", e))?;
    let config = Config::load(&paths.config_file()).map_err(|e| eyre!("{:#}", e))?;
    let mut creds = CredentialStore::new(paths.credentials_file());
    creds.load().map_err(|e| eyre!("{:#}", e))?;

    let tmdb = TmdbClient::new(tmdb_api_key(&config, &creds)?);
    let serializd = authenticated_serializd(&config, &mut creds).await?;

    let options = build_options(&args, &config)?;

    output.info(format!("Source: {}", args.source));
    output.info(format!("Tag: {}", options.run_tag()));
    if options.dry_run {
        output.warn("Dry-run mode: nothing will be written");
    }

    // Steady spinner while the rate-limited run grinds along; the
    // per-event detail goes to the log, not the terminal.
    let spinner = if output.format() == OutputFormat::Human && !output.is_quiet() {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner} {msg}").unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.set_message("Importing...");
        spinner.enable_steady_tick(Duration::from_millis(120));
        Some(spinner)
    } else {
        None
    };

    let orchestrator = ImportOrchestrator::new(Arc::new(tmdb), Arc::new(serializd), options);
    let report = orchestrator.run().await;

    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }
    let report = report?;

    render_report(&report, output);
    Ok(())
}

fn build_options(args: &ImportArgs, config: &Config) -> Result<ImportOptions> {
    let mut excluded: HashSet<String> = args.exclude.iter().map(|s| s.trim().to_string()).collect();
    for path in args
        .exclude_file
        .iter()
        .chain(config.import.excluded_shows_file.iter())
    {
        excluded.extend(read_exclusion_file(path).map_err(|e| eyre!("{:#}", e))?);
    }

    // Built-in Netflix fixups first, then the config map, then the
    // per-run map; later entries win.
    let mut overrides: HashMap<String, u32> = match args.source {
        SourceKind::Netflix => netflix::builtin_id_overrides(),
        _ => HashMap::new(),
    };
    if let Some(path) = &config.import.overrides_file {
        overrides.extend(read_override_file(path).map_err(|e| eyre!("{:#}", e))?);
    }
    if let Some(path) = &args.id_map {
        overrides.extend(read_override_file(path).map_err(|e| eyre!("{:#}", e))?);
    }

    let order = match args.order {
        Some(order) => order,
        None => config
            .import
            .order
            .parse()
            .map_err(|e: String| eyre!("invalid [import] order in config file: {}", e))?,
    };

    Ok(
        ImportOptions::new(args.source, args.path.clone())
            .with_dry_run(args.dry_run)
            .with_profile(args.profile.clone())
            .with_excluded_shows(excluded)
            .with_dedup_window_days(args.dedup_window.unwrap_or(config.import.dedup_window_days))
            .with_order(order)
            .with_tag(args.tag.clone())
            .with_id_overrides(overrides)
            .with_write_delay(Duration::from_millis(
                args.write_delay_ms.unwrap_or(config.import.write_delay_ms),
            )),
    )
}

fn render_report(report: &ImportReport, output: &Output) {
    if output.format() != OutputFormat::Human {
        match serde_json::to_value(report) {
            Ok(value) => output.json(&value),
            Err(e) => output.error(format!("Failed to serialize report: {}", e)),
        }
        return;
    }

    let summary = report.summary();
    let mut table = Table::new();
    table.set_header(vec!["Outcome", "Count"]);
    let rows: [(&str, usize); 8] = [
        ("Created", summary.created),
        ("Merged alongside", summary.merged),
        ("Skipped (duplicate)", summary.skipped_duplicate),
        ("Skipped (excluded)", summary.skipped_excluded),
        ("Skipped (profile)", summary.skipped_profile),
        ("Skipped (unresolved)", summary.skipped_unresolved),
        ("Skipped (no date)", summary.skipped_no_date),
        ("Failed", summary.failed),
    ];
    for (label, count) in rows {
        table.add_row(vec![label.to_string(), count.to_string()]);
    }

    output.println(format!("\nImport summary ({} events):", summary.total));
    output.println(table.to_string());
    if report.dry_run {
        output.warn("Dry run: no entries were written");
    }

    for failure in report.failures() {
        if let ImportOutcome::Failed { reason } = &failure.outcome {
            output.error(format!(
                "{} S{:02}E{:02}: {}",
                failure.show_title, failure.season, failure.episode, reason
            ));
        }
    }
}
