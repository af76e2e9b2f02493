//! Metrics derivation.
//!
//! [`derive`] maps an [`InputVector`] to a [`DerivedVector`]. It is total and
//! deterministic: the same input always produces the same output, and nothing
//! from earlier derivations leaks into the result.
//!
//! The formulas are illustrative heuristics rather than a physical model:
//!
//! ```text
//! energy_usage = users * 0.5 + load * 0.3
//! temperature  = 25 + load * 0.1 + users * 0.2
//! efficiency   = clamp(baseline - energy_usage * 0.1, 0, 100)
//! ```
//!
//! Energy usage and temperature are deliberately left unbounded above.

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Ambient temperature the heat model starts from (°C).
pub const AMBIENT_TEMPERATURE: f64 = 25.0;

/// Fixed efficiency baseline (percent).
pub const BASELINE_EFFICIENCY: f64 = 100.0;

const ENERGY_PER_USER: f64 = 0.5;
const ENERGY_PER_LOAD: f64 = 0.3;
const HEAT_PER_LOAD: f64 = 0.1;
const HEAT_PER_USER: f64 = 0.2;
const EFFICIENCY_PENALTY: f64 = 0.1;
const LOAD_PER_LOST_USER: f64 = 100.0;

/// Operator-controllable inputs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InputVector {
    /// Active users, 0..=100.
    pub users: u32,
    /// Load, 0..=1000.
    pub load: f64,
    /// Operator-set efficiency baseline, 0..=100.
    pub efficiency_override: f64,
}

impl Default for InputVector {
    fn default() -> Self {
        Self {
            users: 0,
            load: 0.0,
            efficiency_override: BASELINE_EFFICIENCY,
        }
    }
}

/// Metrics computed from an [`InputVector`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DerivedVector {
    /// Energy usage in kWh.
    pub energy_usage: f64,
    /// Temperature in °C.
    pub temperature: f64,
    /// Efficiency in percent, always within 0..=100.
    pub efficiency: f64,
    /// Users left after load-induced attrition ([`FormulaVariant::Feedback`] only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adjusted_users: Option<u32>,
}

/// Which efficiency baseline the deriver uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FormulaVariant {
    /// Baseline is the constant 100.
    #[default]
    Fixed,
    /// Baseline is the operator's `efficiency_override`.
    OperatorBaseline,
    /// Baseline 100, and `adjusted_users` is reported.
    Feedback,
}

impl FormulaVariant {
    /// Name used in config files.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Fixed => "fixed",
            Self::OperatorBaseline => "operator_baseline",
            Self::Feedback => "feedback",
        }
    }

    fn baseline(&self, input: &InputVector) -> f64 {
        match self {
            Self::Fixed | Self::Feedback => BASELINE_EFFICIENCY,
            Self::OperatorBaseline => input.efficiency_override,
        }
    }
}

impl std::str::FromStr for FormulaVariant {
    type Err = Error;

    /// Parse a variant name as written in config files and on the command line.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "fixed" => Ok(Self::Fixed),
            "operator_baseline" | "operator" | "override" => Ok(Self::OperatorBaseline),
            "feedback" => Ok(Self::Feedback),
            _ => Err(Error::Config(format!(
                "unknown formula variant: {s}. Supported: fixed, operator_baseline, feedback"
            ))),
        }
    }
}

impl std::fmt::Display for FormulaVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Derive metrics from the input vector.
pub fn derive(input: &InputVector, variant: FormulaVariant) -> DerivedVector {
    let users = f64::from(input.users);

    let energy_usage = users * ENERGY_PER_USER + input.load * ENERGY_PER_LOAD;
    let temperature = AMBIENT_TEMPERATURE + input.load * HEAT_PER_LOAD + users * HEAT_PER_USER;
    let efficiency =
        (variant.baseline(input) - energy_usage * EFFICIENCY_PENALTY).clamp(0.0, BASELINE_EFFICIENCY);

    let adjusted_users = match variant {
        FormulaVariant::Feedback => Some(adjusted_users(input)),
        _ => None,
    };

    DerivedVector {
        energy_usage,
        temperature,
        efficiency,
        adjusted_users,
    }
}

/// One user is lost per full 100 units of load.
fn adjusted_users(input: &InputVector) -> u32 {
    let lost = (input.load / LOAD_PER_LOST_USER).floor().max(0.0) as u32;
    input.users.saturating_sub(lost)
}
