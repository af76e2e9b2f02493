//! Slider input handling.
//!
//! Views report raw `(name, value)` pairs; [`SliderInputChannel`] turns each
//! one into exactly one synchronous dashboard update. There is no batching or
//! debouncing, so every intermediate drag position is recomputed.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result, ValidationError};
use crate::service::{DashboardService, UpdateReceipt};

/// The recognized input vector keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputField {
    /// Active user count.
    Users,
    /// System load.
    Load,
    /// Operator-set efficiency baseline.
    Efficiency,
}

impl InputField {
    /// All fields, in payload order.
    pub const ALL: [InputField; 3] = [InputField::Users, InputField::Load, InputField::Efficiency];

    /// Parse a control name.
    pub fn from_name(name: &str) -> Result<Self> {
        match name.trim() {
            "users" => Ok(Self::Users),
            "load" => Ok(Self::Load),
            "efficiency" | "efficiencyOverride" | "efficiency_override" => Ok(Self::Efficiency),
            other => Err(Error::UnknownField(other.to_string())),
        }
    }

    /// Control name as the views send it.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::Load => "load",
            Self::Efficiency => "efficiency",
        }
    }

    /// Inclusive domain of the field.
    pub fn domain(&self) -> (f64, f64) {
        match self {
            Self::Users => (0.0, 100.0),
            Self::Load => (0.0, 1000.0),
            Self::Efficiency => (0.0, 100.0),
        }
    }
}

impl std::fmt::Display for InputField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A raw change notification from a slider control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SliderEvent {
    /// Control name.
    pub name: String,
    /// Control value as a numeric string.
    pub value: String,
}

#[derive(Deserialize)]
struct JsonSliderEvent {
    name: String,
    value: serde_json::Value,
}

impl SliderEvent {
    /// Create an event from a control name and value.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Resolve the control name and parse the value.
    ///
    /// Only the syntax is checked here; range and finiteness are enforced by
    /// the dashboard state.
    pub fn parse(&self) -> Result<(InputField, f64)> {
        let field = InputField::from_name(&self.name)?;
        let value = self
            .value
            .trim()
            .parse::<f64>()
            .map_err(|_| ValidationError::NotNumeric {
                field,
                raw: self.value.clone(),
            })?;
        Ok((field, value))
    }

    /// Read one event from a line of text.
    ///
    /// Accepts `name=value` or `{"name": "...", "value": ...}`. Blank lines
    /// and `#` comments yield `None`.
    pub fn parse_line(line: &str) -> Result<Option<Self>> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }

        if line.starts_with('{') {
            let raw: JsonSliderEvent = serde_json::from_str(line)?;
            let value = match raw.value {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            };
            return Ok(Some(Self::new(raw.name, value)));
        }

        let (name, value) = line.split_once('=').ok_or_else(|| {
            Error::Serialization(format!("expected `name=value`, got {line:?}"))
        })?;
        Ok(Some(Self::new(name.trim(), value.trim())))
    }
}

/// Adapts slider events into dashboard updates.
pub struct SliderInputChannel<'a> {
    service: &'a DashboardService,
}

impl<'a> SliderInputChannel<'a> {
    /// Create a channel feeding the given dashboard.
    pub fn new(service: &'a DashboardService) -> Self {
        Self { service }
    }

    /// Apply one event as one update.
    pub fn dispatch(&self, event: &SliderEvent) -> Result<UpdateReceipt> {
        let (field, value) = event.parse()?;
        self.service.update(field, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_names() {
        for field in InputField::ALL {
            assert_eq!(InputField::from_name(field.name()).unwrap(), field);
        }
        assert_eq!(
            InputField::from_name("efficiencyOverride").unwrap(),
            InputField::Efficiency
        );
        assert!(matches!(
            InputField::from_name("temperature"),
            Err(Error::UnknownField(name)) if name == "temperature"
        ));
    }

    #[test]
    fn test_parse_numeric_string() {
        let event = SliderEvent::new("load", " 420.5 ");
        assert_eq!(event.parse().unwrap(), (InputField::Load, 420.5));
    }

    #[test]
    fn test_parse_rejects_non_numeric() {
        let event = SliderEvent::new("users", "lots");
        match event.parse() {
            Err(Error::Validation(ValidationError::NotNumeric { field, raw })) => {
                assert_eq!(field, InputField::Users);
                assert_eq!(raw, "lots");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_parse_line_formats() {
        assert_eq!(
            SliderEvent::parse_line("users=12").unwrap(),
            Some(SliderEvent::new("users", "12"))
        );
        assert_eq!(
            SliderEvent::parse_line(r#"{"name": "load", "value": 300}"#).unwrap(),
            Some(SliderEvent::new("load", "300"))
        );
        assert_eq!(
            SliderEvent::parse_line(r#"{"name": "load", "value": "7.5"}"#).unwrap(),
            Some(SliderEvent::new("load", "7.5"))
        );
        assert_eq!(SliderEvent::parse_line("   ").unwrap(), None);
        assert_eq!(SliderEvent::parse_line("# warmup").unwrap(), None);
        assert!(SliderEvent::parse_line("users 12").is_err());
    }
}
