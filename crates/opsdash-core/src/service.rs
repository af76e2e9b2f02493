//! Main dashboard entry point.
//!
//! The [`DashboardService`] ties the state owner, the slider channel and the
//! prediction bridge together, so views only ever talk to one object.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::info;

use crate::config::DashboardConfig;
use crate::display::Cards;
use crate::error::Result;
use crate::events::{DashboardEvent, Seq};
use crate::input::{InputField, SliderEvent, SliderInputChannel};
use crate::metrics::DerivedVector;
use crate::prediction::{HttpPredictionClient, PredictionBridge, PredictionClient};
use crate::requests::{PredictionHandle, RequestTracker};
use crate::state::{DashboardSnapshot, DashboardState};

/// What a view gets back from an update.
pub struct UpdateReceipt {
    /// Sequence number of the update.
    pub seq: Seq,
    /// Metrics derived by the update.
    pub derived: DerivedVector,
    /// The prediction request issued for it, if any.
    pub prediction: Option<PredictionHandle>,
}

/// Main service coordinating the dashboard.
///
/// It owns and coordinates:
/// - [`DashboardState`]: inputs, derived metrics, chart buffer, display totals
/// - [`PredictionBridge`]: optional remote overrides
/// - [`RequestTracker`]: in-flight prediction requests
/// - [`DashboardConfig`]: application configuration
///
/// # Example
///
/// ```ignore
/// let service = DashboardService::with_config(DashboardConfig::default())?;
/// service.mount()?;
///
/// let receipt = service.update(InputField::Load, 420.0)?;
/// println!("{:.2} kWh", receipt.derived.energy_usage);
/// ```
pub struct DashboardService {
    /// Shared dashboard state.
    state: Arc<RwLock<DashboardState>>,

    /// In-flight prediction requests.
    requests: Arc<RequestTracker>,

    /// Remote prediction bridge.
    bridge: PredictionBridge,

    /// Application configuration.
    config: DashboardConfig,
}

impl DashboardService {
    /// Create a new service with default configuration.
    ///
    /// Loads configuration from `~/.opsdash/config.toml` if it exists,
    /// otherwise uses defaults.
    pub fn new() -> Result<Self> {
        let config = DashboardConfig::load()?;
        Self::with_config(config)
    }

    /// Create a new service with the provided configuration.
    ///
    /// An HTTP client is used when the config enables predictions.
    pub fn with_config(config: DashboardConfig) -> Result<Self> {
        let client = HttpPredictionClient::from_config(&config.prediction)
            .map(|c| Arc::new(c) as Arc<dyn PredictionClient>);
        Self::with_client(config, client)
    }

    /// Create a new service with an explicit prediction client.
    pub fn with_client(
        config: DashboardConfig,
        client: Option<Arc<dyn PredictionClient>>,
    ) -> Result<Self> {
        config.validate()?;

        let state = Arc::new(RwLock::new(DashboardState::new(&config)));
        let requests = RequestTracker::shared();
        let bridge = PredictionBridge::new(
            Arc::clone(&state),
            Arc::clone(&requests),
            client,
            &config.prediction,
        );

        Ok(Self {
            state,
            requests,
            bridge,
            config,
        })
    }

    /// Get the state (read-only access).
    pub fn state(&self) -> &Arc<RwLock<DashboardState>> {
        &self.state
    }

    /// Get the configuration.
    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    /// Initial derivation, as the dashboard does when it first renders.
    pub fn mount(&self) -> Result<UpdateReceipt> {
        let receipt = self.update(InputField::Users, 0.0)?;
        self.state.read().notify(DashboardEvent::Mounted);
        info!(
            variant = %self.config.core.variant,
            predictions = self.bridge.is_enabled(),
            "dashboard mounted"
        );
        Ok(receipt)
    }

    /// Set one input field, re-derive, and kick off a prediction.
    ///
    /// Returns as soon as the metrics are derived; the prediction runs in the
    /// background.
    pub fn update(&self, field: InputField, value: f64) -> Result<UpdateReceipt> {
        let outcome = self.state.write().update(field, value)?;
        let prediction = self.bridge.fetch(outcome.seq, outcome.payload);
        Ok(UpdateReceipt {
            seq: outcome.seq,
            derived: outcome.derived,
            prediction,
        })
    }

    /// Apply a raw slider event.
    pub fn handle_slider(&self, event: &SliderEvent) -> Result<UpdateReceipt> {
        self.slider_channel().dispatch(event)
    }

    /// Channel adapting slider events into updates.
    pub fn slider_channel(&self) -> SliderInputChannel<'_> {
        SliderInputChannel::new(self)
    }

    /// Copy the current state.
    pub fn snapshot(&self) -> DashboardSnapshot {
        self.state.read().snapshot()
    }

    /// Formatted card values for the current state.
    pub fn cards(&self) -> Cards {
        Cards::from_snapshot(&self.snapshot(), &self.config.display)
    }

    /// Subscribe to dashboard events.
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<DashboardEvent> {
        self.state.read().subscribe()
    }

    /// Number of prediction requests still in flight.
    pub fn in_flight_predictions(&self) -> usize {
        self.requests.active_count()
    }
}

/// Builder for configuring a [`DashboardService`].
pub struct DashboardServiceBuilder {
    config: Option<DashboardConfig>,
    client: Option<Arc<dyn PredictionClient>>,
}

impl DashboardServiceBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            config: None,
            client: None,
        }
    }

    /// Use a specific configuration.
    pub fn config(mut self, config: DashboardConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Use a custom prediction client instead of HTTP.
    pub fn client(mut self, client: Arc<dyn PredictionClient>) -> Self {
        self.client = Some(client);
        self
    }

    /// Build the service.
    pub fn build(self) -> Result<DashboardService> {
        let config = match self.config {
            Some(cfg) => cfg,
            None => DashboardConfig::load()?,
        };

        match self.client {
            Some(client) => DashboardService::with_client(config, Some(client)),
            None => DashboardService::with_config(config),
        }
    }
}

impl Default for DashboardServiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::FormulaVariant;

    #[test]
    fn test_service_creation() {
        let service = DashboardService::with_config(DashboardConfig::default()).unwrap();
        assert_eq!(service.snapshot().seq, 0);
        assert_eq!(service.in_flight_predictions(), 0);
    }

    #[test]
    fn test_mount_derives_defaults() {
        let service = DashboardService::with_config(DashboardConfig::default()).unwrap();
        let receipt = service.mount().unwrap();

        assert_eq!(receipt.seq, 1);
        assert!(receipt.prediction.is_none());
        assert_eq!(receipt.derived.temperature, 25.0);
        assert_eq!(service.cards().efficiency, "100.00 %");
    }

    #[test]
    fn test_builder() {
        let mut config = DashboardConfig::default();
        config.core.variant = FormulaVariant::Feedback;

        let service = DashboardServiceBuilder::new().config(config).build().unwrap();
        service.update(InputField::Users, 8.0).unwrap();
        service.update(InputField::Load, 250.0).unwrap();

        assert_eq!(service.snapshot().derived.adjusted_users, Some(6));
    }

    #[test]
    fn test_builder_rejects_invalid_config() {
        let mut config = DashboardConfig::default();
        config.prediction.enabled = true;

        assert!(DashboardServiceBuilder::new().config(config).build().is_err());
    }

    #[test]
    fn test_handle_slider() {
        let service = DashboardService::with_config(DashboardConfig::default()).unwrap();
        service
            .handle_slider(&SliderEvent::new("load", "1000"))
            .unwrap();
        service
            .handle_slider(&SliderEvent::new("users", "100"))
            .unwrap();

        let snap = service.snapshot();
        assert!((snap.derived.energy_usage - 350.0).abs() < 1e-9);
        assert!(service
            .handle_slider(&SliderEvent::new("load", "NaN"))
            .is_err());
        assert_eq!(service.snapshot(), snap);
    }
}
