//! Event types for reactive view updates.

use crate::input::InputField;
use crate::metrics::DerivedVector;

/// Sequence number tagging each update and the prediction request it issues.
pub type Seq = u64;

/// Events emitted by the dashboard when state changes.
#[derive(Debug, Clone, PartialEq)]
pub enum DashboardEvent {
    /// The dashboard performed its initial derivation.
    Mounted,

    /// A single input field was merged into the input vector.
    InputChanged { field: InputField, value: f64 },

    /// Metrics were re-derived and the chart buffer rewritten.
    MetricsDerived { seq: Seq, derived: DerivedVector },

    /// A prediction request was sent.
    PredictionStarted { seq: Seq },

    /// A prediction response was merged into the display totals.
    PredictionMerged { seq: Seq },

    /// A prediction response arrived after a newer update and was dropped.
    PredictionDiscarded { seq: Seq },

    /// A prediction request failed; nothing was changed.
    PredictionFailed { seq: Seq, error: String },

    /// A prediction request was aborted by a newer one.
    PredictionCancelled { seq: Seq },
}

impl DashboardEvent {
    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            DashboardEvent::Mounted => "Mounted",
            DashboardEvent::InputChanged { .. } => "InputChanged",
            DashboardEvent::MetricsDerived { .. } => "MetricsDerived",
            DashboardEvent::PredictionStarted { .. } => "PredictionStarted",
            DashboardEvent::PredictionMerged { .. } => "PredictionMerged",
            DashboardEvent::PredictionDiscarded { .. } => "PredictionDiscarded",
            DashboardEvent::PredictionFailed { .. } => "PredictionFailed",
            DashboardEvent::PredictionCancelled { .. } => "PredictionCancelled",
        }
    }
}
