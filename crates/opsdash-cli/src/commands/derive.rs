use anyhow::Result;
use opsdash_cli::cli::OutputFormat;
use opsdash_core::{DashboardConfig, DashboardService, FormulaVariant, InputField};
use tracing::info;

use super::render::print_cards;

/// Derive metrics for one input vector and print the cards.
///
/// Goes through the dashboard update path so the configured range policy
/// applies; predictions are never sent.
pub fn handle(
    mut config: DashboardConfig,
    users: f64,
    load: f64,
    efficiency: Option<f64>,
    variant: Option<FormulaVariant>,
    format: OutputFormat,
) -> Result<()> {
    if let Some(variant) = variant {
        config.core.variant = variant;
    }
    config.prediction.enabled = false;

    let service = DashboardService::with_config(config)?;
    service.update(InputField::Users, users)?;
    service.update(InputField::Load, load)?;
    if let Some(efficiency) = efficiency {
        service.update(InputField::Efficiency, efficiency)?;
    }

    let snapshot = service.snapshot();
    info!(
        variant = %snapshot.variant,
        energy_usage = snapshot.derived.energy_usage,
        temperature = snapshot.derived.temperature,
        efficiency = snapshot.derived.efficiency,
        "derived"
    );

    print_cards(&snapshot, &service.cards(), format, true)
}
