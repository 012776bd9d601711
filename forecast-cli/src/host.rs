//! Terminal stand-ins for the device collaborators.

use std::{
    collections::HashSet,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use forecast_core::{IconLoader, Notifier, PermissionGate, PermissionStatus};

/// Permission gate driven by flags, optionally asking on the terminal.
#[derive(Debug, Clone, Copy)]
pub struct PromptPermission {
    pub denied: bool,
    pub interactive: bool,
}

#[async_trait]
impl PermissionGate for PromptPermission {
    async fn check(&self) -> PermissionStatus {
        if self.denied {
            PermissionStatus::Denied
        } else if self.interactive {
            PermissionStatus::Undetermined
        } else {
            PermissionStatus::Granted
        }
    }

    async fn request(&self) -> PermissionStatus {
        let answer = tokio::task::spawn_blocking(|| {
            inquire::Confirm::new("Allow forecast to use your location?")
                .with_default(true)
                .prompt()
        })
        .await;

        match answer {
            Ok(Ok(true)) => PermissionStatus::Granted,
            Ok(Ok(false)) => PermissionStatus::Denied,
            Ok(Err(err)) => {
                tracing::warn!(error = %err, "Permission prompt aborted");
                PermissionStatus::Denied
            }
            Err(err) => {
                tracing::warn!(error = %err, "Permission prompt task failed");
                PermissionStatus::Denied
            }
        }
    }
}

/// Transient notices go to stderr so stdout stays the rendered forecast.
#[derive(Debug, Default)]
pub struct StderrNotifier;

impl Notifier for StderrNotifier {
    fn notify(&self, message: &str) {
        eprintln!("! {message}");
    }
}

/// A terminal has nowhere to draw icons; record which ones were requested
/// so each URL is only announced once.
#[derive(Debug, Default)]
pub struct IconLog {
    seen: Mutex<HashSet<String>>,
}

impl IconLog {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

impl IconLoader for IconLog {
    fn load(&self, url: &str) {
        let Ok(mut seen) = self.seen.lock() else {
            return;
        };
        if seen.insert(url.to_string()) {
            tracing::debug!(url, "Icon requested");
        }
    }
}
