use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::config::AppConfig;
use crate::core::api::{ApiError, DmApiClient};
use crate::core::docs::NpcDocumentExporter;

use super::events::{AppEvent, Notification, NotificationLevel};

/// Centralized handle to the backend client and exporter.
///
/// Created once at startup and passed by reference to views, which clone
/// what they need into spawned tasks.
pub struct Services {
    pub api: DmApiClient,
    /// `None` when Google export is not configured.
    pub exporter: Option<Arc<NpcDocumentExporter>>,
    /// Why `exporter` is `None`, shown when the user tries to export.
    pub exporter_error: Option<String>,
    pub maps_dir: PathBuf,
    pub rulebook_results: usize,
    pub notifier: Notifier,
}

impl Services {
    /// Build services from config. Only an unparseable backend URL is fatal;
    /// a missing Google setup just disables export.
    pub fn init(
        config: &AppConfig,
        event_tx: mpsc::UnboundedSender<AppEvent>,
    ) -> Result<Self, ApiError> {
        let api = DmApiClient::new(&config.api.base_url)?;
        tracing::info!(base_url = %api.base_url(), "backend client ready");

        let (exporter, exporter_error) = match NpcDocumentExporter::from_config(&config.google) {
            Ok(exporter) => (Some(Arc::new(exporter)), None),
            Err(e) => {
                tracing::info!(reason = %e, "google docs export disabled");
                (None, Some(e.to_string()))
            }
        };

        Ok(Self {
            api,
            exporter,
            exporter_error,
            maps_dir: config.maps_dir(),
            rulebook_results: config.api.rulebook_results,
            notifier: Notifier::new(event_tx),
        })
    }
}

/// Sends notifications into the app event channel; cloned into tasks.
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: mpsc::UnboundedSender<AppEvent>,
}

impl Notifier {
    pub fn new(tx: mpsc::UnboundedSender<AppEvent>) -> Self {
        Self { tx }
    }

    pub fn notify(&self, message: impl Into<String>, level: NotificationLevel) {
        let _ = self
            .tx
            .send(AppEvent::Notification(Notification::new(message, level)));
    }

    pub fn success(&self, message: impl Into<String>) {
        self.notify(message, NotificationLevel::Success);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.notify(message, NotificationLevel::Error);
    }
}

#[cfg(test)]
pub(crate) fn test_services() -> (Services, mpsc::UnboundedReceiver<AppEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let config = AppConfig::default();
    let services = Services::init(&config, tx).expect("default config is valid");
    (services, rx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_without_google_disables_export() {
        let (services, _rx) = test_services();
        assert!(services.exporter.is_none());
        assert!(services.exporter_error.is_some());
        assert_eq!(services.rulebook_results, 5);
    }

    #[test]
    fn test_init_rejects_bad_url() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut config = AppConfig::default();
        config.api.base_url = "not a url".into();
        assert!(Services::init(&config, tx).is_err());
    }

    #[test]
    fn test_notifier_sends_event() {
        let (services, mut rx) = test_services();
        services.notifier.success("saved");
        match rx.try_recv() {
            Ok(AppEvent::Notification(n)) => {
                assert_eq!(n.message, "saved");
                assert_eq!(n.level, NotificationLevel::Success);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }
}
