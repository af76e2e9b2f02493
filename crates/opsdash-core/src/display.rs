//! Display-only card values.
//!
//! [`DisplayTotals`] is the surface prediction responses are merged into. It is
//! separate from the input and derived vectors: a prediction can change what
//! the total cards show but never the computed metrics.

use serde::{Deserialize, Serialize};

use crate::config::{DisplayConfig, PlaceholderTotals};
use crate::prediction::PredictionResult;
use crate::state::DashboardSnapshot;

/// A loosely typed card value: the prediction service may send either form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DisplayValue {
    Number(f64),
    Text(String),
}

impl DisplayValue {
    /// Accept strings and numbers, ignore anything else.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::String(s) => Some(Self::Text(s.clone())),
            serde_json::Value::Number(n) => n.as_f64().map(Self::Number),
            _ => None,
        }
    }
}

impl std::fmt::Display for DisplayValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DisplayValue::Text(s) => f.write_str(s),
            DisplayValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                write!(f, "{}", *n as i64)
            }
            DisplayValue::Number(n) => write!(f, "{n}"),
        }
    }
}

/// Card totals written only by prediction merges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayTotals {
    pub total_views: DisplayValue,
    pub total_profit: DisplayValue,
    pub total_product: DisplayValue,
    pub total_users: DisplayValue,
}

impl DisplayTotals {
    /// Start from placeholder values.
    pub fn from_placeholders(p: &PlaceholderTotals) -> Self {
        Self {
            total_views: p.total_views.clone(),
            total_profit: p.total_profit.clone(),
            total_product: p.total_product.clone(),
            total_users: p.total_users.clone(),
        }
    }

    /// Overwrite each total the result carries; keep the rest.
    ///
    /// Returns the number of fields written.
    pub fn merge(&mut self, result: &PredictionResult) -> usize {
        let mut written = 0;
        for (slot, incoming) in [
            (&mut self.total_views, &result.total_views),
            (&mut self.total_profit, &result.total_profit),
            (&mut self.total_product, &result.total_product),
            (&mut self.total_users, &result.total_users),
        ] {
            if let Some(value) = incoming {
                *slot = value.clone();
                written += 1;
            }
        }
        written
    }
}

impl Default for DisplayTotals {
    fn default() -> Self {
        Self::from_placeholders(&PlaceholderTotals::default())
    }
}

/// Formatted card strings for a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cards {
    pub temperature: String,
    pub energy_usage: String,
    pub efficiency: String,
    pub users: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adjusted_users: Option<String>,
    pub total_views: String,
    pub total_profit: String,
    pub total_product: String,
    pub total_users: String,
}

impl Cards {
    /// Format every card value.
    pub fn from_snapshot(snapshot: &DashboardSnapshot, config: &DisplayConfig) -> Self {
        let dp = config.decimal_places;
        let derived = &snapshot.derived;
        let totals = &snapshot.totals;
        Self {
            temperature: format!("{:.dp$} °C", derived.temperature),
            energy_usage: format!("{:.dp$} kWh", derived.energy_usage),
            efficiency: format!("{:.dp$} %", derived.efficiency),
            users: snapshot.input.users.to_string(),
            adjusted_users: derived.adjusted_users.map(|u| u.to_string()),
            total_views: totals.total_views.to_string(),
            total_profit: totals.total_profit.to_string(),
            total_product: totals.total_product.to_string(),
            total_users: totals.total_users.to_string(),
        }
    }

    /// `(title, value)` rows in display order.
    pub fn rows(&self) -> Vec<(&'static str, &str)> {
        let mut rows = vec![
            ("Temperature", self.temperature.as_str()),
            ("Energy Usage", self.energy_usage.as_str()),
            ("Efficiency", self.efficiency.as_str()),
            ("Users", self.users.as_str()),
        ];
        if let Some(adjusted) = &self.adjusted_users {
            rows.push(("Adjusted Users", adjusted.as_str()));
        }
        rows.extend([
            ("Total Views", self.total_views.as_str()),
            ("Total Profit", self.total_profit.as_str()),
            ("Total Product", self.total_product.as_str()),
            ("Total Users", self.total_users.as_str()),
        ]);
        rows
    }
}
