use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use opsdash_core::{
    derive, DashboardConfig, DashboardEvent, DashboardService, DisplayValue, Error,
    FormulaVariant, InputField, InputVector, PredictionClient, PredictionOutcome,
    PredictionPayload, PredictionResult, Result,
};

/// Echoes the user count back as `totalUsers` after a per-user delay.
struct EchoClient {
    slow_users: Option<(u32, Duration)>,
    fail_users: Option<u32>,
    views_only: bool,
    calls: AtomicUsize,
}

impl EchoClient {
    fn new() -> Self {
        Self {
            slow_users: None,
            fail_users: None,
            views_only: false,
            calls: AtomicUsize::new(0),
        }
    }

    fn views_only(mut self) -> Self {
        self.views_only = true;
        self
    }

    fn slow_for(mut self, users: u32, delay: Duration) -> Self {
        self.slow_users = Some((users, delay));
        self
    }

    fn failing_for(mut self, users: u32) -> Self {
        self.fail_users = Some(users);
        self
    }
}

impl PredictionClient for EchoClient {
    fn predict(&self, payload: &PredictionPayload) -> Result<PredictionResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let users = payload.input[0] as u32;

        if let Some((slow, delay)) = self.slow_users {
            if slow == users {
                std::thread::sleep(delay);
            }
        }
        if self.fail_users == Some(users) {
            return Err(Error::Prediction("scoring backend unavailable".to_string()));
        }

        if self.views_only {
            return Ok(PredictionResult {
                total_views: Some(DisplayValue::Text(format!("{users} views"))),
                ..Default::default()
            });
        }

        Ok(PredictionResult {
            total_users: Some(DisplayValue::Number(f64::from(users))),
            total_views: Some(DisplayValue::Text(format!("{users} views"))),
            ..Default::default()
        })
    }

    fn endpoint(&self) -> &str {
        "echo"
    }
}

fn service(client: EchoClient, discard_stale: bool, cancel_superseded: bool) -> DashboardService {
    let mut config = DashboardConfig::default();
    config.prediction.discard_stale = discard_stale;
    config.prediction.cancel_superseded = cancel_superseded;
    DashboardService::with_client(config, Some(Arc::new(client))).unwrap()
}

#[tokio::test]
async fn merged_prediction_overrides_totals_only() {
    let service = service(EchoClient::new(), true, true);
    let receipt = service.update(InputField::Users, 42.0).unwrap();
    let before = service.snapshot();

    let outcome = receipt.prediction.unwrap().wait().await.unwrap();
    assert_eq!(outcome, PredictionOutcome::Merged);

    let after = service.snapshot();
    assert_eq!(after.input, before.input);
    assert_eq!(after.derived, before.derived);
    assert_eq!(after.totals.total_users, DisplayValue::Number(42.0));
    assert_eq!(
        after.totals.total_views,
        DisplayValue::Text("42 views".to_string())
    );
    // Absent in the response, so the placeholder stays.
    assert_eq!(
        after.totals.total_profit,
        DisplayValue::Text("$45.2K".to_string())
    );
}

#[tokio::test]
async fn missing_total_users_falls_back_to_live_users() {
    let service = service(EchoClient::new().views_only(), true, true);
    let receipt = service.update(InputField::Users, 60.0).unwrap();

    let outcome = receipt.prediction.unwrap().wait().await.unwrap();
    assert_eq!(outcome, PredictionOutcome::Merged);

    let snap = service.snapshot();
    assert_eq!(snap.totals.total_users, DisplayValue::Number(60.0));
    assert_eq!(snap.totals.total_views, DisplayValue::Text("60 views".to_string()));
    assert_eq!(service.cards().total_users, "60");
}

#[tokio::test]
async fn failure_leaves_everything_unchanged() {
    let service = service(EchoClient::new().failing_for(50), true, true);

    let first = service.update(InputField::Users, 10.0).unwrap();
    assert_eq!(
        first.prediction.unwrap().wait().await.unwrap(),
        PredictionOutcome::Merged
    );

    let second = service.update(InputField::Users, 50.0).unwrap();
    let before = service.snapshot();
    let outcome = second.prediction.unwrap().wait().await.unwrap();
    assert!(matches!(outcome, PredictionOutcome::Failed(ref e) if e.contains("unavailable")));

    let after = service.snapshot();
    assert_eq!(after, before);
    assert_eq!(after.totals.total_users, DisplayValue::Number(10.0));
    assert_eq!(after.input.users, 50);
}

#[tokio::test]
async fn update_does_not_wait_for_prediction() {
    let service = service(
        EchoClient::new().slow_for(7, Duration::from_millis(500)),
        true,
        true,
    );

    let started = Instant::now();
    let receipt = service.update(InputField::Users, 7.0).unwrap();
    assert!(started.elapsed() < Duration::from_millis(250));
    assert_eq!(service.in_flight_predictions(), 1);

    let expected = derive(
        &InputVector {
            users: 7,
            ..Default::default()
        },
        FormulaVariant::Fixed,
    );
    assert_eq!(receipt.derived, expected);

    receipt.prediction.unwrap().wait().await.unwrap();
    assert_eq!(service.in_flight_predictions(), 0);
}

#[tokio::test]
async fn stale_response_is_discarded() {
    let service = service(
        EchoClient::new().slow_for(10, Duration::from_millis(300)),
        true,
        false,
    );

    let slow = service.update(InputField::Users, 10.0).unwrap();
    let fresh = service.update(InputField::Users, 20.0).unwrap();

    assert_eq!(
        fresh.prediction.unwrap().wait().await.unwrap(),
        PredictionOutcome::Merged
    );
    assert_eq!(
        slow.prediction.unwrap().wait().await.unwrap(),
        PredictionOutcome::Stale
    );
    assert_eq!(
        service.snapshot().totals.total_users,
        DisplayValue::Number(20.0)
    );
}

#[tokio::test]
async fn without_guard_last_write_wins() {
    let service = service(
        EchoClient::new().slow_for(10, Duration::from_millis(300)),
        false,
        false,
    );

    let slow = service.update(InputField::Users, 10.0).unwrap();
    let fresh = service.update(InputField::Users, 20.0).unwrap();

    fresh.prediction.unwrap().wait().await.unwrap();
    assert_eq!(
        slow.prediction.unwrap().wait().await.unwrap(),
        PredictionOutcome::Merged
    );

    let snap = service.snapshot();
    // The older response overwrote the newer one.
    assert_eq!(snap.totals.total_users, DisplayValue::Number(10.0));
    // Metrics still follow the latest input.
    assert_eq!(snap.input.users, 20);
}

#[tokio::test]
async fn superseded_request_is_cancelled() {
    let service = service(
        EchoClient::new().slow_for(10, Duration::from_millis(300)),
        true,
        true,
    );
    let mut events = service.subscribe();

    let slow = service.update(InputField::Users, 10.0).unwrap();
    let fresh = service.update(InputField::Users, 20.0).unwrap();

    assert_eq!(
        slow.prediction.unwrap().wait().await.unwrap(),
        PredictionOutcome::Cancelled
    );
    assert_eq!(
        fresh.prediction.unwrap().wait().await.unwrap(),
        PredictionOutcome::Merged
    );
    assert_eq!(service.in_flight_predictions(), 0);

    let mut cancelled = Vec::new();
    while let Ok(event) = events.try_recv() {
        if let DashboardEvent::PredictionCancelled { seq } = event {
            cancelled.push(seq);
        }
    }
    assert_eq!(cancelled, vec![1]);
}

#[tokio::test]
async fn rapid_updates_keep_only_final_input() {
    let service = service(EchoClient::new(), true, true);

    let mut receipts = Vec::new();
    for (field, value) in [
        (InputField::Users, 15.0),
        (InputField::Load, 800.0),
        (InputField::Users, 60.0),
        (InputField::Load, 240.0),
        (InputField::Users, 33.0),
    ] {
        receipts.push(service.update(field, value).unwrap());
    }

    let last = receipts.pop().unwrap();
    assert_eq!(
        last.prediction.unwrap().wait().await.unwrap(),
        PredictionOutcome::Merged
    );
    for receipt in receipts {
        let outcome = receipt.prediction.unwrap().wait().await.unwrap();
        assert!(matches!(
            outcome,
            PredictionOutcome::Merged | PredictionOutcome::Cancelled | PredictionOutcome::Stale
        ));
    }

    let snap = service.snapshot();
    let expected = derive(
        &InputVector {
            users: 33,
            load: 240.0,
            ..Default::default()
        },
        FormulaVariant::Fixed,
    );
    assert_eq!(snap.derived, expected);
    assert_eq!(snap.chart.energy_usage(), expected.energy_usage);
    assert_eq!(snap.chart.efficiency(), expected.efficiency);
    assert_eq!(snap.totals.total_users, DisplayValue::Number(33.0));
}

#[tokio::test]
async fn prediction_events_are_broadcast() {
    let service = service(EchoClient::new(), true, true);
    let mut events = service.subscribe();

    let receipt = service.update(InputField::Load, 100.0).unwrap();
    receipt.prediction.unwrap().wait().await.unwrap();

    let names: Vec<&str> = std::iter::from_fn(|| events.try_recv().ok())
        .map(|e| e.name())
        .collect();
    assert_eq!(
        names,
        vec![
            "InputChanged",
            "MetricsDerived",
            "PredictionStarted",
            "PredictionMerged"
        ]
    );
}

#[test]
fn no_runtime_still_derives() {
    let service = service(EchoClient::new(), true, true);
    let receipt = service.update(InputField::Load, 1000.0).unwrap();

    assert!(receipt.prediction.is_none());
    assert!((receipt.derived.temperature - 125.0).abs() < 1e-9);
}
