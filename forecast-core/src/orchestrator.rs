//! Location-to-fetch orchestration.
//!
//! One cycle is: settle permission, resolve a coordinate (device or
//! fallback), issue one forecast request, parse it, and publish the result.
//! The orchestrator is the only writer of the forecast snapshot; presenters
//! subscribe and read.

use std::sync::Arc;

use tokio::sync::watch;

use crate::{
    error::ForecastError,
    location::{FALLBACK_COORDINATE, LocationService, PermissionGate, PermissionStatus},
    model::{Coordinate, ForecastSnapshot},
    parser::parse_forecast,
    provider::ForecastProvider,
};

const NO_FIX_MESSAGE: &str = "Could not get location. Using default location.";

/// Transient user-visible messages (a toast, a status line, stderr).
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Transport,
    Malformed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchState {
    Idle,
    AwaitingPermission,
    ResolvingLocation,
    Fetching,
    Rendered,
    Failed(FailureKind),
}

pub struct Orchestrator {
    permission: Box<dyn PermissionGate>,
    location: Box<dyn LocationService>,
    provider: Box<dyn ForecastProvider>,
    notifier: Arc<dyn Notifier>,
    fallback: Coordinate,
    state: FetchState,
    // Answer to our own prompt; the user is asked at most once per session.
    prompt_answer: Option<PermissionStatus>,
    snapshot: watch::Sender<Arc<ForecastSnapshot>>,
}

impl Orchestrator {
    pub fn new(
        permission: Box<dyn PermissionGate>,
        location: Box<dyn LocationService>,
        provider: Box<dyn ForecastProvider>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let (snapshot, _) = watch::channel(Arc::new(ForecastSnapshot::default()));
        Self {
            permission,
            location,
            provider,
            notifier,
            fallback: FALLBACK_COORDINATE,
            state: FetchState::Idle,
            prompt_answer: None,
            snapshot,
        }
    }

    pub fn with_fallback(mut self, fallback: Coordinate) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn state(&self) -> FetchState {
        self.state
    }

    pub fn fallback(&self) -> Coordinate {
        self.fallback
    }

    /// The snapshot presenters should currently show.
    pub fn snapshot(&self) -> Arc<ForecastSnapshot> {
        self.snapshot.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<ForecastSnapshot>> {
        self.snapshot.subscribe()
    }

    /// Run one full cycle. Failures have already been surfaced through the
    /// notifier when this returns `Err`.
    pub async fn run(&mut self) -> Result<Arc<ForecastSnapshot>, ForecastError> {
        let at = self.resolve_coordinate().await;
        self.fetch(at).await
    }

    /// Settle permission and pick the coordinate for this cycle. Never fails:
    /// every dead end falls back to the default coordinate.
    pub async fn resolve_coordinate(&mut self) -> Coordinate {
        let status = match self.permission.check().await {
            PermissionStatus::Undetermined => self.ask_once().await,
            status => status,
        };

        self.transition(FetchState::ResolvingLocation);

        if status != PermissionStatus::Granted {
            self.surface(&ForecastError::PermissionDenied);
            return self.fallback;
        }

        match self.location.last_known().await {
            Ok(Some(at)) => {
                tracing::debug!(coordinate = %at, "Using device location");
                at
            }
            Ok(None) => {
                tracing::warn!(fallback = %self.fallback, "No last known location");
                self.notifier.notify(NO_FIX_MESSAGE);
                self.fallback
            }
            Err(err) => {
                self.surface(&err);
                self.fallback
            }
        }
    }

    async fn ask_once(&mut self) -> PermissionStatus {
        if let Some(answer) = self.prompt_answer {
            return answer;
        }

        self.transition(FetchState::AwaitingPermission);
        let answer = match self.permission.request().await {
            PermissionStatus::Granted => PermissionStatus::Granted,
            _ => PermissionStatus::Denied,
        };
        self.prompt_answer = Some(answer);
        answer
    }

    /// Issue exactly one forecast request for `at` and publish the result.
    ///
    /// On any failure the published snapshot is left as it was.
    pub async fn fetch(&mut self, at: Coordinate) -> Result<Arc<ForecastSnapshot>, ForecastError> {
        self.transition(FetchState::Fetching);

        let parsed = match self.provider.fetch_forecast(at).await {
            Ok(body) => parse_forecast(&body),
            Err(err) => Err(err),
        };

        match parsed {
            Ok(snapshot) => {
                let snapshot = Arc::new(snapshot);
                self.snapshot.send_replace(snapshot.clone());
                self.transition(FetchState::Rendered);
                tracing::info!(
                    coordinate = %at,
                    hourly = snapshot.hourly.len(),
                    daily = snapshot.daily.len(),
                    "Forecast rendered"
                );
                Ok(snapshot)
            }
            Err(err) => {
                let kind = if err.is_transport() {
                    FailureKind::Transport
                } else {
                    FailureKind::Malformed
                };
                self.transition(FetchState::Failed(kind));
                self.surface(&err);
                Err(err)
            }
        }
    }

    fn transition(&mut self, next: FetchState) {
        tracing::debug!(from = ?self.state, to = ?next, "Orchestrator state change");
        self.state = next;
    }

    fn surface(&self, err: &ForecastError) {
        tracing::warn!(error = %err, "{}", err.user_message());
        self.notifier.notify(err.user_message());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::{FixedPermission, StaticLocation};
    use async_trait::async_trait;
    use std::sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    };

    #[derive(Default)]
    struct Toasts(Mutex<Vec<String>>);

    impl Notifier for Toasts {
        fn notify(&self, message: &str) {
            if let Ok(mut v) = self.0.lock() {
                v.push(message.to_string());
            }
        }
    }

    impl Toasts {
        fn all(&self) -> Vec<String> {
            self.0.lock().map(|v| v.clone()).unwrap_or_default()
        }
    }

    #[derive(Debug)]
    struct CannedProvider {
        body: Result<String, String>,
        calls: Arc<Mutex<Vec<Coordinate>>>,
    }

    #[async_trait]
    impl ForecastProvider for CannedProvider {
        async fn fetch_forecast(&self, at: Coordinate) -> Result<String, ForecastError> {
            if let Ok(mut calls) = self.calls.lock() {
                calls.push(at);
            }
            self.body.clone().map_err(ForecastError::TransportFailure)
        }
    }

    /// Counts prompts and answers with a fixed status.
    struct CountingGate {
        check: PermissionStatus,
        answer: PermissionStatus,
        prompts: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl PermissionGate for CountingGate {
        async fn check(&self) -> PermissionStatus {
            self.check
        }

        async fn request(&self) -> PermissionStatus {
            self.prompts.fetch_add(1, Ordering::SeqCst);
            self.answer
        }
    }

    struct BrokenLocation;

    #[async_trait]
    impl LocationService for BrokenLocation {
        async fn last_known(&self) -> Result<Option<Coordinate>, ForecastError> {
            Err(ForecastError::LocationUnavailable("provider offline".into()))
        }
    }

    const ONE_ENTRY: &str = r#"{
        "city": { "name": "Oslo" },
        "list": [{
            "dt_txt": "2024-01-01 00:00:00",
            "main": { "temp": -3.5 },
            "weather": [{ "description": "snow", "icon": "13n" }]
        }]
    }"#;

    fn canned(body: Result<&str, &str>) -> (CannedProvider, Arc<Mutex<Vec<Coordinate>>>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let provider = CannedProvider {
            body: body.map(str::to_string).map_err(str::to_string),
            calls: calls.clone(),
        };
        (provider, calls)
    }

    fn calls_of(calls: &Arc<Mutex<Vec<Coordinate>>>) -> Vec<Coordinate> {
        calls.lock().map(|v| v.clone()).unwrap_or_default()
    }

    #[tokio::test]
    async fn granted_with_fix_uses_device_location() {
        let oslo = Coordinate::new(59.91, 10.75);
        let (provider, calls) = canned(Ok(ONE_ENTRY));
        let toasts = Arc::new(Toasts::default());
        let mut orch = Orchestrator::new(
            Box::new(FixedPermission(PermissionStatus::Granted)),
            Box::new(StaticLocation(Some(oslo))),
            Box::new(provider),
            toasts.clone(),
        );

        let snap = orch.run().await.expect("cycle succeeds");

        assert_eq!(calls_of(&calls), vec![oslo]);
        assert_eq!(orch.state(), FetchState::Rendered);
        assert_eq!(snap.hourly.len(), 1);
        assert_eq!(orch.snapshot().current.as_ref().map(|c| c.temperature_c), Some(-3.5));
        assert!(toasts.all().is_empty());
    }

    #[tokio::test]
    async fn denied_prompt_falls_back_and_fetches_once() {
        let prompts = Arc::new(AtomicUsize::new(0));
        let (provider, calls) = canned(Ok(ONE_ENTRY));
        let toasts = Arc::new(Toasts::default());
        let mut orch = Orchestrator::new(
            Box::new(CountingGate {
                check: PermissionStatus::Undetermined,
                answer: PermissionStatus::Denied,
                prompts: prompts.clone(),
            }),
            Box::new(StaticLocation(Some(Coordinate::new(1.0, 1.0)))),
            Box::new(provider),
            toasts.clone(),
        );

        orch.run().await.expect("cycle succeeds");

        assert_eq!(calls_of(&calls), vec![FALLBACK_COORDINATE]);
        assert_eq!(prompts.load(Ordering::SeqCst), 1);
        assert_eq!(
            toasts.all(),
            vec!["Location permission denied. Using default location."]
        );
    }

    #[tokio::test]
    async fn granted_prompt_uses_device_location() {
        let prompts = Arc::new(AtomicUsize::new(0));
        let bergen = Coordinate::new(60.39, 5.32);
        let (provider, calls) = canned(Ok(ONE_ENTRY));
        let toasts = Arc::new(Toasts::default());
        let mut orch = Orchestrator::new(
            Box::new(CountingGate {
                check: PermissionStatus::Undetermined,
                answer: PermissionStatus::Granted,
                prompts: prompts.clone(),
            }),
            Box::new(StaticLocation(Some(bergen))),
            Box::new(provider),
            toasts.clone(),
        );

        orch.run().await.expect("cycle succeeds");

        assert_eq!(calls_of(&calls), vec![bergen]);
        assert_eq!(prompts.load(Ordering::SeqCst), 1);
        assert_eq!(orch.state(), FetchState::Rendered);
        assert!(toasts.all().is_empty());
    }

    #[tokio::test]
    async fn user_is_prompted_at_most_once_per_session() {
        let prompts = Arc::new(AtomicUsize::new(0));
        let (provider, _) = canned(Ok(ONE_ENTRY));
        let mut orch = Orchestrator::new(
            Box::new(CountingGate {
                check: PermissionStatus::Undetermined,
                answer: PermissionStatus::Denied,
                prompts: prompts.clone(),
            }),
            Box::new(StaticLocation(None)),
            Box::new(provider),
            Arc::new(Toasts::default()),
        );

        assert_eq!(orch.resolve_coordinate().await, FALLBACK_COORDINATE);
        assert_eq!(orch.resolve_coordinate().await, FALLBACK_COORDINATE);
        assert_eq!(prompts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn missing_fix_falls_back_with_notice() {
        let (provider, _) = canned(Ok(ONE_ENTRY));
        let toasts = Arc::new(Toasts::default());
        let mut orch = Orchestrator::new(
            Box::new(FixedPermission(PermissionStatus::Granted)),
            Box::new(StaticLocation(None)),
            Box::new(provider),
            toasts.clone(),
        )
        .with_fallback(Coordinate::new(40.7128, -74.006));

        assert_eq!(orch.resolve_coordinate().await, Coordinate::new(40.7128, -74.006));
        assert_eq!(orch.state(), FetchState::ResolvingLocation);
        assert_eq!(toasts.all(), vec![NO_FIX_MESSAGE]);
    }

    #[tokio::test]
    async fn location_error_falls_back_with_notice() {
        let (provider, _) = canned(Ok(ONE_ENTRY));
        let toasts = Arc::new(Toasts::default());
        let mut orch = Orchestrator::new(
            Box::new(FixedPermission(PermissionStatus::Granted)),
            Box::new(BrokenLocation),
            Box::new(provider),
            toasts.clone(),
        );

        assert_eq!(orch.resolve_coordinate().await, FALLBACK_COORDINATE);
        assert_eq!(
            toasts.all(),
            vec!["Error getting location. Using default location."]
        );
    }

    #[tokio::test]
    async fn transport_failure_keeps_previous_snapshot() {
        let (provider, calls) = canned(Err("connection reset"));
        let toasts = Arc::new(Toasts::default());
        let mut orch = Orchestrator::new(
            Box::new(FixedPermission(PermissionStatus::Granted)),
            Box::new(StaticLocation(Some(Coordinate::new(1.0, 2.0)))),
            Box::new(provider),
            toasts.clone(),
        );
        let rx = orch.subscribe();

        let err = orch.run().await.unwrap_err();

        assert!(err.is_transport());
        assert_eq!(calls_of(&calls).len(), 1);
        assert_eq!(orch.state(), FetchState::Failed(FailureKind::Transport));
        assert!(orch.snapshot().is_empty());
        assert!(!rx.has_changed().unwrap_or(true));
        assert_eq!(toasts.all(), vec!["Error fetching weather data."]);
    }

    #[tokio::test]
    async fn parse_failure_keeps_previous_snapshot() {
        let (good, _) = canned(Ok(ONE_ENTRY));
        let toasts = Arc::new(Toasts::default());
        let mut orch = Orchestrator::new(
            Box::new(FixedPermission(PermissionStatus::Granted)),
            Box::new(StaticLocation(Some(Coordinate::new(1.0, 2.0)))),
            Box::new(good),
            toasts.clone(),
        );
        let before = orch.run().await.expect("first cycle succeeds");

        let (bad, _) = canned(Ok(r#"{ "city": { "name": "Oslo" }, "list": [{ "dt_txt": "yesterday" }] }"#));
        orch.provider = Box::new(bad);
        let err = orch.run().await.unwrap_err();

        assert!(err.is_malformed());
        assert_eq!(orch.state(), FetchState::Failed(FailureKind::Malformed));
        assert!(Arc::ptr_eq(&before, &orch.snapshot()));
        assert_eq!(toasts.all(), vec!["Error parsing weather data."]);
    }
}
