//! `wroom report`: line counts from saved transcripts.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use serde::Serialize;

use writers_room_core::director::report::parse_statistics;
use writers_room_types::production::SceneStatistics;

#[derive(Debug, Serialize)]
struct TranscriptReport {
    transcript: PathBuf,
    statistics: SceneStatistics,
}

async fn read_report(path: &Path) -> Result<TranscriptReport> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read transcript {}", path.display()))?;
    Ok(TranscriptReport {
        transcript: path.to_path_buf(),
        statistics: parse_statistics(&text),
    })
}

pub async fn report(paths: &[PathBuf], json: bool) -> Result<()> {
    let mut reports = Vec::with_capacity(paths.len());
    for path in paths {
        reports.push(read_report(path).await?);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
        return Ok(());
    }

    for report in &reports {
        println!();
        println!(
            "  {} {}  {}",
            style("📜").bold(),
            style(report.transcript.display()).cyan(),
            style(format!("{} lines", report.statistics.total_lines)).dim()
        );
        if report.statistics.total_lines == 0 {
            println!("  {}", style("No attributed lines.").dim());
            continue;
        }
        println!("{}", statistics_table(&report.statistics));
    }
    println!();

    Ok(())
}

/// Character/line-count table, busiest speaker first.
pub fn statistics_table(stats: &SceneStatistics) -> Table {
    let mut rows: Vec<(&String, &usize)> = stats.lines_by_character.iter().collect();
    rows.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Character").fg(Color::White),
        Cell::new("Lines").fg(Color::White),
        Cell::new("Share").fg(Color::White),
    ]);

    for (name, count) in rows {
        let share = *count as f64 * 100.0 / stats.total_lines.max(1) as f64;
        table.add_row(vec![
            Cell::new(name).fg(Color::Cyan),
            Cell::new(count),
            Cell::new(format!("{share:.0}%")).fg(Color::DarkGrey),
        ]);
    }
    table
}
