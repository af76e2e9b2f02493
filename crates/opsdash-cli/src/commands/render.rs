use std::io::{self, Write};

use anyhow::Result;
use opsdash_cli::cli::OutputFormat;
use opsdash_core::{Cards, ChartSeries, DashboardSnapshot};
use serde_json::json;
use tabwriter::TabWriter;

/// Print the cards for a snapshot as a table or one JSON document.
pub fn print_cards(
    snapshot: &DashboardSnapshot,
    cards: &Cards,
    format: OutputFormat,
    pretty: bool,
) -> Result<()> {
    match format {
        OutputFormat::Plain => print_table(snapshot, cards),
        OutputFormat::Json => print_json(snapshot, cards, pretty),
    }
}

fn print_table(snapshot: &DashboardSnapshot, cards: &Cards) -> Result<()> {
    let mut writer = TabWriter::new(io::stdout());
    writeln!(writer, "CARD\tVALUE")?;
    for (title, value) in cards.rows() {
        writeln!(writer, "{title}\t{value}")?;
    }
    let chart = snapshot.chart;
    let [energy_name, efficiency_name] = ChartSeries::NAMES;
    writeln!(writer, "Chart: {energy_name}\t{:.2}", chart.energy_usage())?;
    writeln!(writer, "Chart: {efficiency_name}\t{:.2}", chart.efficiency())?;
    writer.flush()?;
    Ok(())
}

fn print_json(snapshot: &DashboardSnapshot, cards: &Cards, pretty: bool) -> Result<()> {
    let doc = json!({
        "seq": snapshot.seq,
        "variant": snapshot.variant,
        "input": snapshot.input,
        "derived": snapshot.derived,
        "chart": snapshot.chart,
        "totals": snapshot.totals,
        "cards": cards,
    });
    let text = if pretty {
        serde_json::to_string_pretty(&doc)
    } else {
        serde_json::to_string(&doc)
    }
    .map_err(|err| anyhow::anyhow!("serializing dashboard to JSON: {err}"))?;
    println!("{text}");
    Ok(())
}
