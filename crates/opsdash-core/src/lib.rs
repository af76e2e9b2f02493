//! # opsdash core
//!
//! Reactive metrics engine behind the opsdash operations dashboard.
//!
//! An operator moves sliders (users, load, efficiency baseline); every move
//! re-derives energy usage, temperature and efficiency from scratch and
//! rewrites the chart buffer. An optional remote prediction service may then
//! override the display-only card totals.
//!
//! ## Architecture
//!
//! ```text
//! slider event ──► SliderInputChannel ──► DashboardState::update ──► derive()
//!                                               │
//!                                               ├──► events ──► views (cards, chart)
//!                                               │
//!                                               └──► PredictionBridge ──► merge_override
//! ```
//!
//! ## Core Components
//!
//! - [`derive`]: pure input → metrics function
//! - [`DashboardState`]: single owner of inputs, metrics and display totals
//! - [`SliderInputChannel`]: one slider event, one update
//! - [`PredictionBridge`]: async remote overrides with stale-response guard
//! - [`DashboardService`]: main entry point combining all of the above
//! - [`DashboardConfig`]: configuration
//!
//! ## Usage
//!
//! ```ignore
//! use opsdash_core::{DashboardService, InputField};
//!
//! let service = DashboardService::new()?;
//! service.mount()?;
//!
//! let receipt = service.update(InputField::Load, 640.0)?;
//! if let Some(prediction) = receipt.prediction {
//!     prediction.wait().await?;
//! }
//! println!("{}", service.cards().energy_usage);
//! ```

pub mod config;
pub mod display;
pub mod error;
pub mod events;
pub mod input;
pub mod metrics;
pub mod prediction;
pub mod requests;
pub mod service;
pub mod state;

// Re-exports for convenience
pub use config::{CoreConfig, DashboardConfig, DisplayConfig, PredictionConfig, RangePolicy};
pub use display::{Cards, DisplayTotals, DisplayValue};
pub use error::{Error, Result, ValidationError};
pub use events::{DashboardEvent, Seq};
pub use input::{InputField, SliderEvent, SliderInputChannel};
pub use metrics::{derive, DerivedVector, FormulaVariant, InputVector};
pub use prediction::{
    HttpPredictionClient, PredictionBridge, PredictionClient, PredictionPayload,
    PredictionResult,
};
pub use requests::{PredictionHandle, PredictionOutcome, RequestTracker};
pub use service::{DashboardService, DashboardServiceBuilder, UpdateReceipt};
pub use state::{ChartSeries, DashboardSnapshot, DashboardState, MergeOutcome};
