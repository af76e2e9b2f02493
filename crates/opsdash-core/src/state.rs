//! Dashboard state management.
//!
//! The [`DashboardState`] owns the input vector, the latest derived vector, the
//! chart buffer and the display totals. [`DashboardState::update`] and
//! [`DashboardState::merge_override`] are the only ways to change them.
//!
//! Every update re-derives from the full input vector and bumps a sequence
//! number. Prediction responses carry the sequence of the update that issued
//! them, which lets stale responses be recognized.

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::config::{DashboardConfig, RangePolicy};
use crate::display::{DisplayTotals, DisplayValue};
use crate::error::{Result, ValidationError};
use crate::events::{DashboardEvent, Seq};
use crate::input::InputField;
use crate::metrics::{derive, DerivedVector, FormulaVariant, InputVector};
use crate::prediction::{PredictionPayload, PredictionResult};

/// Chart buffer: `[energy_usage, efficiency]`, rewritten on every derivation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChartSeries([f64; 2]);

impl ChartSeries {
    /// Series names in slot order.
    pub const NAMES: [&'static str; 2] = ["Energy Usage", "Efficiency"];

    fn from_derived(derived: &DerivedVector) -> Self {
        Self([derived.energy_usage, derived.efficiency])
    }

    /// Energy usage slot.
    pub fn energy_usage(&self) -> f64 {
        self.0[0]
    }

    /// Efficiency slot.
    pub fn efficiency(&self) -> f64 {
        self.0[1]
    }
}

/// What an update produced.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateOutcome {
    /// Sequence number assigned to this update.
    pub seq: Seq,
    /// Freshly derived metrics.
    pub derived: DerivedVector,
    /// Payload for the prediction service.
    pub payload: PredictionPayload,
}

/// Result of merging a prediction response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The response was applied; `fields` totals were written.
    Applied { fields: usize },
    /// The response belonged to an older update and was dropped.
    Stale,
}

/// Read-only copy of the dashboard for views.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSnapshot {
    pub seq: Seq,
    pub variant: FormulaVariant,
    pub input: InputVector,
    pub derived: DerivedVector,
    pub chart: ChartSeries,
    pub totals: DisplayTotals,
}

/// Single source of truth for the dashboard.
pub struct DashboardState {
    input: InputVector,
    derived: DerivedVector,
    chart: ChartSeries,
    totals: DisplayTotals,

    variant: FormulaVariant,
    range_policy: RangePolicy,
    discard_stale: bool,

    /// Sequence of the latest update.
    seq: Seq,

    /// Event broadcaster for state changes.
    events_tx: broadcast::Sender<DashboardEvent>,
}

impl DashboardState {
    /// Create state with the default input vector already derived.
    pub fn new(config: &DashboardConfig) -> Self {
        let (events_tx, _) = broadcast::channel(config.core.event_capacity.max(1));
        let variant = config.core.variant;
        let input = InputVector::default();
        let derived = derive(&input, variant);

        Self {
            input,
            derived,
            chart: ChartSeries::from_derived(&derived),
            totals: DisplayTotals::from_placeholders(&config.display.placeholders),
            variant,
            range_policy: config.core.range_policy,
            discard_stale: config.prediction.discard_stale,
            seq: 0,
            events_tx,
        }
    }

    /// Current input vector.
    pub fn input(&self) -> &InputVector {
        &self.input
    }

    /// Latest derived vector.
    pub fn derived(&self) -> &DerivedVector {
        &self.derived
    }

    /// Current chart buffer.
    pub fn chart(&self) -> ChartSeries {
        self.chart
    }

    /// Current display totals.
    pub fn totals(&self) -> &DisplayTotals {
        &self.totals
    }

    /// Sequence number of the latest update.
    pub fn seq(&self) -> Seq {
        self.seq
    }

    /// Formula variant in use.
    pub fn variant(&self) -> FormulaVariant {
        self.variant
    }

    /// Copy the state for rendering.
    pub fn snapshot(&self) -> DashboardSnapshot {
        DashboardSnapshot {
            seq: self.seq,
            variant: self.variant,
            input: self.input,
            derived: self.derived,
            chart: self.chart,
            totals: self.totals.clone(),
        }
    }

    /// Merge one field into the input vector and re-derive.
    ///
    /// Rejected values leave the state untouched.
    pub fn update(&mut self, field: InputField, value: f64) -> Result<UpdateOutcome> {
        let value = self.validate(field, value)?;

        let mut input = self.input;
        match field {
            InputField::Users => input.users = value.round() as u32,
            InputField::Load => input.load = value,
            InputField::Efficiency => input.efficiency_override = value,
        }

        let derived = derive(&input, self.variant);
        self.input = input;
        self.derived = derived;
        self.chart = ChartSeries::from_derived(&derived);
        self.seq += 1;

        debug!(
            seq = self.seq,
            %field,
            value,
            energy_usage = derived.energy_usage,
            temperature = derived.temperature,
            efficiency = derived.efficiency,
            "metrics derived"
        );

        let _ = self
            .events_tx
            .send(DashboardEvent::InputChanged { field, value });
        let _ = self.events_tx.send(DashboardEvent::MetricsDerived {
            seq: self.seq,
            derived,
        });

        Ok(UpdateOutcome {
            seq: self.seq,
            derived,
            payload: PredictionPayload::new(&input, &derived),
        })
    }

    /// Merge a prediction response into the display totals.
    ///
    /// A response without `totalUsers` shows the live user count instead.
    /// Never touches the input or derived vectors.
    pub fn merge_override(&mut self, seq: Seq, result: &PredictionResult) -> MergeOutcome {
        if self.discard_stale && seq < self.seq {
            warn!(seq, latest = self.seq, "discarding stale prediction");
            let _ = self
                .events_tx
                .send(DashboardEvent::PredictionDiscarded { seq });
            return MergeOutcome::Stale;
        }

        let fields = self.totals.merge(result);
        if result.total_users.is_none() {
            self.totals.total_users = DisplayValue::Number(f64::from(self.input.users));
        }
        info!(seq, fields, "prediction merged");
        let _ = self.events_tx.send(DashboardEvent::PredictionMerged { seq });
        MergeOutcome::Applied { fields }
    }

    /// Subscribe to dashboard events.
    pub fn subscribe(&self) -> broadcast::Receiver<DashboardEvent> {
        self.events_tx.subscribe()
    }

    /// Broadcast an event on behalf of a collaborator.
    pub fn notify(&self, event: DashboardEvent) {
        let _ = self.events_tx.send(event);
    }

    fn validate(&self, field: InputField, value: f64) -> Result<f64> {
        if !value.is_finite() {
            return Err(ValidationError::NotFinite { field, value }.into());
        }

        let (min, max) = field.domain();
        if (min..=max).contains(&value) {
            return Ok(value);
        }

        match self.range_policy {
            RangePolicy::Clamp => {
                let clamped = value.clamp(min, max);
                debug!(%field, value, clamped, "clamped out-of-range input");
                Ok(clamped)
            }
            RangePolicy::Reject => Err(ValidationError::OutOfRange {
                field,
                value,
                min,
                max,
            }
            .into()),
        }
    }
}

impl Default for DashboardState {
    fn default() -> Self {
        Self::new(&DashboardConfig::default())
    }
}
