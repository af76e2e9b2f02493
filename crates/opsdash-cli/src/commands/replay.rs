use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result};
use opsdash_cli::cli::OutputFormat;
use opsdash_core::{DashboardConfig, DashboardService, PredictionOutcome, SliderEvent};
use tracing::{info, warn};

use super::render::print_cards;

#[derive(Debug, Default)]
struct OutcomeTally {
    merged: usize,
    stale: usize,
    failed: usize,
    cancelled: usize,
}

impl OutcomeTally {
    fn record(&mut self, outcome: &PredictionOutcome) {
        match outcome {
            PredictionOutcome::Merged => self.merged += 1,
            PredictionOutcome::Stale => self.stale += 1,
            PredictionOutcome::Failed(_) => self.failed += 1,
            PredictionOutcome::Cancelled => self.cancelled += 1,
        }
    }
}

fn open_events(path: &Path) -> Result<Box<dyn BufRead>> {
    if path.as_os_str() == "-" {
        return Ok(Box::new(BufReader::new(io::stdin())));
    }
    let file =
        File::open(path).with_context(|| format!("opening event file {}", path.display()))?;
    Ok(Box::new(BufReader::new(file)))
}

/// Read every line up front, numbered from 1.
fn read_events(path: &Path) -> Result<Vec<(usize, String)>> {
    open_events(path)?
        .lines()
        .enumerate()
        .map(|(idx, line)| {
            let line_no = idx + 1;
            line.map(|line| (line_no, line))
                .with_context(|| format!("reading line {line_no}"))
        })
        .collect()
}

/// Mount a dashboard, feed it every slider event, and print the cards.
///
/// Lines that fail to parse or validate are reported and skipped. All
/// prediction requests are allowed to settle before the final print.
pub fn handle(
    config: DashboardConfig,
    events: &Path,
    endpoint: Option<&str>,
    every: bool,
    format: OutputFormat,
) -> Result<()> {
    let lines = read_events(events)?;
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(play(config, lines, endpoint, every, format))
}

async fn play(
    mut config: DashboardConfig,
    lines: Vec<(usize, String)>,
    endpoint: Option<&str>,
    every: bool,
    format: OutputFormat,
) -> Result<()> {
    if let Some(endpoint) = endpoint {
        config.prediction.enabled = true;
        config.prediction.endpoint = Some(endpoint.to_string());
    }

    let service = DashboardService::with_config(config)?;
    let mut pending = Vec::new();
    pending.extend(service.mount()?.prediction);

    let mut applied = 0usize;
    let mut skipped = 0usize;

    for (line_no, line) in lines {
        let event = match SliderEvent::parse_line(&line) {
            Ok(Some(event)) => event,
            Ok(None) => continue,
            Err(e) => {
                warn!(line = line_no, error = %e, "skipping unreadable event");
                skipped += 1;
                continue;
            }
        };

        match service.handle_slider(&event) {
            Ok(receipt) => {
                applied += 1;
                pending.extend(receipt.prediction);
                if every {
                    if format == OutputFormat::Plain {
                        println!("# {line_no}: {}={}", event.name, event.value);
                    }
                    print_cards(&service.snapshot(), &service.cards(), format, false)?;
                }
            }
            Err(e) => {
                warn!(line = line_no, error = %e, "skipping rejected event");
                skipped += 1;
            }
        }
    }

    let mut tally = OutcomeTally::default();
    for handle in pending {
        let seq = handle.seq;
        match handle.wait().await {
            Ok(outcome) => tally.record(&outcome),
            Err(e) => warn!(seq, error = %e, "prediction result lost"),
        }
    }

    info!(
        applied,
        skipped,
        merged = tally.merged,
        stale = tally.stale,
        failed = tally.failed,
        cancelled = tally.cancelled,
        "replay finished"
    );

    if every && format == OutputFormat::Plain {
        println!("# final");
    }
    print_cards(&service.snapshot(), &service.cards(), format, !every)
}
