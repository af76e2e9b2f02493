//! Remote prediction bridge.
//!
//! After each update the [`PredictionBridge`] sends the merged input and
//! derived values to a scoring endpoint. The response only ever overrides
//! display totals. Failures are logged and swallowed, so the dashboard stays
//! interactive when the service is unreachable.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::PredictionConfig;
use crate::display::DisplayValue;
use crate::error::{Error, Result};
use crate::events::{DashboardEvent, Seq};
use crate::metrics::{DerivedVector, InputVector};
use crate::requests::{PredictionHandle, PredictionOutcome, RequestTracker};
use crate::state::{DashboardState, MergeOutcome};

/// Request body: `{"input": [users, load, efficiency, energyUsage, temperature]}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionPayload {
    pub input: Vec<f64>,
}

impl PredictionPayload {
    /// Flatten the vectors in the fixed key order.
    pub fn new(input: &InputVector, derived: &DerivedVector) -> Self {
        Self {
            input: vec![
                f64::from(input.users),
                input.load,
                input.efficiency_override,
                derived.energy_usage,
                derived.temperature,
            ],
        }
    }
}

/// Totals returned by the prediction service. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PredictionResult {
    pub total_views: Option<DisplayValue>,
    pub total_profit: Option<DisplayValue>,
    pub total_product: Option<DisplayValue>,
    pub total_users: Option<DisplayValue>,
}

impl PredictionResult {
    /// Pick the known keys out of a response body.
    ///
    /// Anything that is not a string or number counts as absent, and a body
    /// that is not an object yields an empty result.
    pub fn from_json(body: &serde_json::Value) -> Self {
        let Some(obj) = body.as_object() else {
            return Self::default();
        };
        let field = |key: &str| obj.get(key).and_then(DisplayValue::from_json);
        Self {
            total_views: field("totalViews"),
            total_profit: field("totalProfit"),
            total_product: field("totalProduct"),
            total_users: field("totalUsers"),
        }
    }

    /// True if no field is present.
    pub fn is_empty(&self) -> bool {
        self.total_views.is_none()
            && self.total_profit.is_none()
            && self.total_product.is_none()
            && self.total_users.is_none()
    }
}

/// Something that can score a payload. Called on the blocking pool.
pub trait PredictionClient: Send + Sync {
    /// Score one payload.
    fn predict(&self, payload: &PredictionPayload) -> Result<PredictionResult>;

    /// Where requests go, for logs.
    fn endpoint(&self) -> &str;
}

/// JSON-over-HTTP prediction client.
pub struct HttpPredictionClient {
    endpoint: String,
    agent: ureq::Agent,
}

impl HttpPredictionClient {
    /// Create a client posting to `endpoint`.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self {
            endpoint: endpoint.into(),
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
        }
    }

    /// Build a client from config, if predictions are enabled.
    pub fn from_config(config: &PredictionConfig) -> Option<Self> {
        config
            .active_endpoint()
            .map(|endpoint| Self::new(endpoint, Duration::from_millis(config.timeout_ms)))
    }
}

impl PredictionClient for HttpPredictionClient {
    fn predict(&self, payload: &PredictionPayload) -> Result<PredictionResult> {
        let response = self
            .agent
            .post(&self.endpoint)
            .send_json(payload)
            .map_err(|e| match e {
                ureq::Error::Status(code, _) => {
                    Error::Prediction(format!("{} answered HTTP {code}", self.endpoint))
                }
                other => Error::Transport {
                    endpoint: self.endpoint.clone(),
                    source: anyhow::Error::new(other),
                },
            })?;

        let body: serde_json::Value = response
            .into_json()
            .map_err(|e| Error::Prediction(format!("malformed response body: {e}")))?;

        Ok(PredictionResult::from_json(&body))
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// Issues prediction requests and merges their responses.
pub struct PredictionBridge {
    state: Arc<RwLock<DashboardState>>,
    requests: Arc<RequestTracker>,
    client: Option<Arc<dyn PredictionClient>>,
    cancel_superseded: bool,
}

impl PredictionBridge {
    /// Create a bridge. Without a client every fetch is a no-op.
    pub fn new(
        state: Arc<RwLock<DashboardState>>,
        requests: Arc<RequestTracker>,
        client: Option<Arc<dyn PredictionClient>>,
        config: &PredictionConfig,
    ) -> Self {
        Self {
            state,
            requests,
            client,
            cancel_superseded: config.cancel_superseded,
        }
    }

    /// Whether requests are sent at all.
    pub fn is_enabled(&self) -> bool {
        self.client.is_some()
    }

    /// Send a request for update `seq` without waiting for it.
    ///
    /// Returns `None` when no client is configured or no tokio runtime is
    /// running.
    pub fn fetch(&self, seq: Seq, payload: PredictionPayload) -> Option<PredictionHandle> {
        let client = Arc::clone(self.client.as_ref()?);

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                warn!(seq, "no async runtime; skipping prediction request");
                return None;
            }
        };

        if self.cancel_superseded {
            for old in self.requests.cancel_older(seq) {
                debug!(seq = old, superseded_by = seq, "prediction cancelled");
                self.state
                    .read()
                    .notify(DashboardEvent::PredictionCancelled { seq: old });
            }
        }

        let handle = self.requests.register(seq);
        self.state
            .read()
            .notify(DashboardEvent::PredictionStarted { seq });
        debug!(seq, endpoint = client.endpoint(), "prediction requested");

        let state = Arc::clone(&self.state);
        let requests = Arc::clone(&self.requests);

        let task = runtime.spawn(async move {
            let result = tokio::task::spawn_blocking(move || client.predict(&payload))
                .await
                .map_err(|e| Error::Prediction(e.to_string()))
                .and_then(|r| r);

            let Some(pending) = requests.take(seq) else {
                return;
            };

            let outcome = match result {
                Ok(prediction) => {
                    let merged = state.write().merge_override(seq, &prediction);
                    match merged {
                        MergeOutcome::Applied { .. } => PredictionOutcome::Merged,
                        MergeOutcome::Stale => PredictionOutcome::Stale,
                    }
                }
                Err(e) => {
                    let error = e.to_string();
                    warn!(seq, %error, "prediction failed; keeping previous values");
                    state.read().notify(DashboardEvent::PredictionFailed {
                        seq,
                        error: error.clone(),
                    });
                    PredictionOutcome::Failed(error)
                }
            };

            debug!(seq, elapsed_ms = pending.elapsed_ms(), ?outcome, "prediction settled");
            pending.resolve(outcome);
        });

        self.requests.attach(seq, task.abort_handle());
        Some(handle)
    }
}
