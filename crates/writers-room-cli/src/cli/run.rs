//! `wroom run`: execute a production.
//!
//! Loads configuration, the character catalog and the scene files, wires the
//! broker and text-generation provider, then hands everything to the
//! `ProductionRunner`. Ctrl+C cuts the current scene (its transcript is still
//! saved) and skips the rest.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use tokio::sync::broadcast::error::RecvError;

use writers_room_core::channel::{BoxBroker, InMemoryBroker};
use writers_room_core::director::SceneSettings;
use writers_room_core::event::EventBus;
use writers_room_core::production::{ProductionRunner, ScenePlan};
use writers_room_infra::broker::RedisBroker;
use writers_room_infra::config::load_room_config;
use writers_room_infra::filesystem::{
    LocalTranscriptStore, discover_scenes, load_catalog, load_scene,
};
use writers_room_infra::llm::{create_provider, resolve_api_key};
use writers_room_types::config::{BrokerKind, RoomConfig};
use writers_room_types::event::SceneEvent;
use writers_room_types::production::{ProductionResult, SceneStatus};

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Scene files, run in the order given. Defaults to every YAML file in
    /// `--scenes-dir`, sorted by name.
    pub scenes: Vec<PathBuf>,

    /// Directory scanned for scenes when none are given.
    #[arg(long, default_value = "scenes", value_name = "DIR")]
    pub scenes_dir: PathBuf,

    /// Directory of character profile YAML files.
    #[arg(long, default_value = "characters", value_name = "DIR")]
    pub characters: PathBuf,

    /// Line ceiling per scene.
    #[arg(long)]
    pub max_lines: Option<usize>,

    /// Dialog channel name.
    #[arg(long)]
    pub channel: Option<String>,

    /// Where transcripts are written.
    #[arg(long, value_name = "DIR")]
    pub transcript_dir: Option<PathBuf>,

    /// Broker backend: memory or redis.
    #[arg(long)]
    pub broker: Option<BrokerKind>,

    #[arg(long, value_name = "URL")]
    pub redis_url: Option<String>,

    /// Model name passed to the provider.
    #[arg(long)]
    pub model: Option<String>,

    /// Seed for the interjection draws, for repeatable runs.
    #[arg(long)]
    pub seed: Option<u64>,
}

/// Fold command-line overrides into the file configuration, then validate
/// the merged result.
fn apply_overrides(mut config: RoomConfig, args: &RunArgs) -> Result<RoomConfig> {
    if let Some(max_lines) = args.max_lines {
        config.max_lines = max_lines;
    }
    if let Some(channel) = &args.channel {
        config.channel = channel.clone();
    }
    if let Some(dir) = &args.transcript_dir {
        config.transcript_dir = dir.clone();
    }
    if let Some(broker) = args.broker {
        config.broker = broker;
    }
    if let Some(url) = &args.redis_url {
        config.redis_url = url.clone();
    }
    if let Some(model) = &args.model {
        config.provider.model = model.clone();
    }
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("invalid configuration: {e}"))?;
    Ok(config)
}

/// Load every scene source into a plan. Load failures become failed
/// entries instead of aborting the run.
async fn load_plans(args: &RunArgs) -> Result<Vec<ScenePlan>> {
    let paths = if args.scenes.is_empty() {
        discover_scenes(&args.scenes_dir).await?
    } else {
        args.scenes.clone()
    };

    let mut plans = Vec::with_capacity(paths.len());
    for path in paths {
        match load_scene(&path).await {
            Ok(scene) => plans.push(ScenePlan::Ready(scene)),
            Err(e) => plans.push(ScenePlan::Invalid {
                source: path.display().to_string(),
                error: e.to_string(),
            }),
        }
    }
    Ok(plans)
}

async fn build_broker(config: &RoomConfig) -> Result<BoxBroker> {
    Ok(match config.broker {
        BrokerKind::Memory => BoxBroker::new(InMemoryBroker::new()),
        BrokerKind::Redis => {
            let broker = RedisBroker::connect(&config.redis_url)
                .await
                .with_context(|| format!("cannot reach redis at {}", config.redis_url))?;
            BoxBroker::new(broker)
        }
    })
}

pub async fn run(config_dir: &Path, args: RunArgs, json: bool, quiet: bool) -> Result<()> {
    let config = apply_overrides(load_room_config(config_dir).await, &args)?;

    let catalog = load_catalog(&args.characters)
        .await
        .context("failed to load characters")?;
    let plans = load_plans(&args).await?;
    tracing::info!(
        characters = catalog.len(),
        scenes = plans.len(),
        broker = %config.broker,
        "Production loaded"
    );

    let api_key = resolve_api_key(&config.provider)?;
    let provider = create_provider(&config.provider, api_key)?;
    let broker = build_broker(&config).await?;

    let mut settings = SceneSettings::from(&config);
    settings.seed = args.seed;

    let runner = Arc::new(ProductionRunner::new(
        catalog,
        broker,
        provider,
        LocalTranscriptStore::new(),
        settings,
    ));

    let progress = (!json && !quiet).then(|| tokio::spawn(print_progress(runner.events().clone())));

    let interrupt = {
        let runner = Arc::clone(&runner);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("\n  {} Cutting scene...", style("✂").yellow());
                runner.interrupt().await;
            }
        })
    };

    let results = runner.run(plans).await;
    interrupt.abort();
    if let Some(progress) = progress {
        progress.abort();
    }
    let results = results?;

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else if !quiet {
        print_summary(&results);
    }

    Ok(())
}

/// Stream scene events to the terminal as they happen.
async fn print_progress(events: EventBus) {
    let mut rx = events.subscribe();
    loop {
        match rx.recv().await {
            Ok(event) => {
                if let Some(line) = progress_line(&event) {
                    println!("{line}");
                }
            }
            Err(RecvError::Lagged(skipped)) => {
                tracing::debug!(skipped, "progress output lagged");
            }
            Err(RecvError::Closed) => break,
        }
    }
}

fn progress_line(event: &SceneEvent) -> Option<String> {
    match event {
        SceneEvent::SceneStarted {
            scene,
            cast,
            max_lines,
        } => Some(format!(
            "\n  {} {}  {}\n",
            style("🎬").bold(),
            style(scene).cyan().bold(),
            style(format!("{} · up to {max_lines} lines", cast.join(", "))).dim()
        )),
        SceneEvent::LineRecorded {
            speaker, content, ..
        } => Some(format!("  {} {content}", style(format!("{speaker}:")).bold())),
        SceneEvent::GenerationFailed {
            character, error, ..
        } => Some(format!(
            "  {} {character} lost a turn: {error}",
            style("!").yellow()
        )),
        SceneEvent::SceneStopped {
            outcome,
            total_lines,
            ..
        } => Some(format!(
            "\n  {}",
            style(format!("-- {outcome} after {total_lines} lines --")).dim()
        )),
    }
}

fn status_cell(status: SceneStatus) -> Cell {
    match status {
        SceneStatus::Completed => Cell::new("completed").fg(Color::Green),
        SceneStatus::Cut => Cell::new("cut").fg(Color::Yellow),
        SceneStatus::Failed => Cell::new("failed").fg(Color::Red),
    }
}

fn summary_table(results: &[ProductionResult]) -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Scene").fg(Color::White),
        Cell::new("Status").fg(Color::White),
        Cell::new("Lines").fg(Color::White),
        Cell::new("Transcript").fg(Color::White),
        Cell::new("Error").fg(Color::White),
    ]);

    for result in results {
        let transcript = result
            .transcript_path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "-".to_string());
        table.add_row(vec![
            Cell::new(&result.scene).fg(Color::Cyan),
            status_cell(result.status),
            Cell::new(result.statistics.total_lines),
            Cell::new(transcript).fg(Color::DarkGrey),
            Cell::new(result.error.as_deref().unwrap_or("")).fg(Color::Red),
        ]);
    }
    table
}

fn print_summary(results: &[ProductionResult]) {
    let failed = results
        .iter()
        .filter(|r| r.status == SceneStatus::Failed)
        .count();

    println!();
    println!("{}", summary_table(results));
    println!();
    if failed == 0 {
        println!(
            "  {} {} scene(s) recorded",
            style("✓").green().bold(),
            results.len()
        );
    } else {
        println!(
            "  {} {failed} of {} scene(s) failed",
            style("✗").red().bold(),
            results.len()
        );
    }
    println!();
}
