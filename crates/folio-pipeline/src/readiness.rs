// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Startup barrier: wait for the required capabilities to be installed.
//
// Polls the registry on a fixed interval. The first tick with everything
// present moves to Ready; running out of attempts moves to Failed with the
// capabilities that never showed up. Either way the state is terminal and
// the gate never polls again.

use std::time::Duration;

use folio_core::PipelineConfig;
use folio_core::error::{FolioError, Result};
use folio_core::types::Capability;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use crate::capability::CapabilityRegistry;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Readiness {
    #[default]
    Pending,
    Ready,
    /// Capabilities still missing when the attempt budget ran out.
    Failed(Vec<Capability>),
}

impl Readiness {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// `Ok` only when ready; otherwise the readiness error tools surface.
    pub fn ensure_ready(&self) -> Result<()> {
        match self {
            Self::Ready => Ok(()),
            Self::Pending => Err(FolioError::ReadinessPending),
            Self::Failed(missing) => Err(FolioError::ReadinessFailed(
                missing.iter().map(|cap| cap.name().to_string()).collect(),
            )),
        }
    }
}

/// Poll `registry` until every `required` capability is present or
/// `max_attempts` ticks (at least one) have passed.
#[instrument(skip(registry), fields(required = required.len()))]
pub async fn check_readiness(
    registry: &CapabilityRegistry,
    required: &[Capability],
    poll_interval: Duration,
    max_attempts: u32,
) -> Readiness {
    let max_attempts = max_attempts.max(1);
    // tokio intervals reject a zero period.
    let mut ticker = tokio::time::interval(poll_interval.max(Duration::from_millis(1)));

    let mut attempt = 0;
    loop {
        ticker.tick().await;
        attempt += 1;
        let missing = registry.missing(required);
        if missing.is_empty() {
            info!(attempt, "All required capabilities present");
            return Readiness::Ready;
        }
        if attempt >= max_attempts {
            warn!(attempt, ?missing, "Capabilities never became available");
            return Readiness::Failed(missing);
        }
        debug!(attempt, missing = missing.len(), "Waiting for capabilities");
    }
}

/// Runs the readiness check once and publishes the outcome to subscribers.
pub struct ReadinessGate {
    registry: CapabilityRegistry,
    required: Vec<Capability>,
    poll_interval: Duration,
    max_attempts: u32,
    worker_source: Option<String>,
    state: watch::Sender<Readiness>,
}

impl ReadinessGate {
    pub fn new(registry: CapabilityRegistry, config: &PipelineConfig) -> Self {
        let (state, _) = watch::channel(Readiness::Pending);
        Self {
            registry,
            required: config.required_capabilities.clone(),
            poll_interval: config.poll_interval(),
            max_attempts: config.readiness_max_attempts,
            worker_source: config.worker_source.clone(),
            state,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Readiness> {
        self.state.subscribe()
    }

    pub fn state(&self) -> Readiness {
        self.state.borrow().clone()
    }

    /// Check readiness unless a terminal state was already reached.
    pub async fn run(&self) -> Readiness {
        let current = self.state();
        if current.is_terminal() {
            return current;
        }

        let outcome = check_readiness(&self.registry, &self.required, self.poll_interval, self.max_attempts).await;
        if outcome == Readiness::Ready {
            self.configure_worker();
        }
        self.state.send_replace(outcome.clone());
        outcome
    }

    /// Hand the worker location to the rendering engine, once.
    fn configure_worker(&self) {
        let Some(source) = self.worker_source.as_deref() else {
            return;
        };
        match self.registry.rendering() {
            Ok(renderer) => {
                if let Err(err) = renderer.configure_worker(source) {
                    warn!(error = %err, source, "Rendering worker configuration failed");
                }
            }
            Err(_) => debug!(source, "No rendering capability to configure"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use folio_document::test_utils::FixtureRenderer;
    use folio_document::traits::RenderEngine;
    use folio_document::{LopdfEngine, ZipArchiver};
    use image::RgbaImage;

    use crate::capability::Engine;

    fn fast_config(required: Vec<Capability>, max_attempts: u32) -> PipelineConfig {
        PipelineConfig {
            required_capabilities: required,
            readiness_poll_interval_ms: 1,
            readiness_max_attempts: max_attempts,
            ..PipelineConfig::default()
        }
    }

    #[tokio::test]
    async fn ready_on_first_tick_when_everything_is_installed() {
        let registry = CapabilityRegistry::new();
        registry.install(Engine::DocumentModel(Arc::new(LopdfEngine::new())));
        let outcome =
            check_readiness(&registry, &[Capability::DocumentModel], Duration::from_millis(1), 1).await;
        assert_eq!(outcome, Readiness::Ready);
    }

    #[tokio::test]
    async fn zero_attempts_still_checks_once() {
        let registry = CapabilityRegistry::new();
        let outcome = check_readiness(&registry, &[Capability::Archive], Duration::ZERO, 0).await;
        assert_eq!(outcome, Readiness::Failed(vec![Capability::Archive]));
    }

    #[tokio::test]
    async fn capability_installed_while_polling_is_picked_up() {
        let registry = CapabilityRegistry::new();
        let host = registry.clone();
        let installer = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            host.install(Engine::Archive(Arc::new(ZipArchiver)));
        });
        let outcome = check_readiness(&registry, &[Capability::Archive], Duration::from_millis(2), 1_000).await;
        installer.await.unwrap();
        assert_eq!(outcome, Readiness::Ready);
    }

    #[tokio::test]
    async fn terminal_state_is_published_and_sticky() {
        let registry = CapabilityRegistry::new();
        let gate = ReadinessGate::new(registry.clone(), &fast_config(vec![Capability::Archive], 2));
        let watcher = gate.subscribe();
        assert_eq!(*watcher.borrow(), Readiness::Pending);

        assert_eq!(gate.run().await, Readiness::Failed(vec![Capability::Archive]));
        assert_eq!(*watcher.borrow(), Readiness::Failed(vec![Capability::Archive]));

        // Installing later does not revive a failed gate.
        registry.install(Engine::Archive(Arc::new(ZipArchiver)));
        assert_eq!(gate.run().await, Readiness::Failed(vec![Capability::Archive]));
    }

    #[test]
    fn readiness_errors_name_missing_capabilities() {
        let err = Readiness::Failed(vec![Capability::Rendering]).ensure_ready().unwrap_err();
        assert!(matches!(err, FolioError::ReadinessFailed(ref names) if names == &["rendering"]));
        assert!(matches!(Readiness::Pending.ensure_ready(), Err(FolioError::ReadinessPending)));
        assert!(Readiness::Ready.ensure_ready().is_ok());
    }

    /// Records every worker source it is configured with.
    #[derive(Default)]
    struct RecordingRenderer {
        sources: Mutex<Vec<String>>,
    }

    impl RenderEngine for RecordingRenderer {
        fn configure_worker(&self, source: &str) -> Result<()> {
            self.sources.lock().unwrap().push(source.to_string());
            Ok(())
        }

        fn page_count(&self, pdf: &[u8]) -> Result<u32> {
            FixtureRenderer.page_count(pdf)
        }

        fn page_text(&self, pdf: &[u8], page_number: u32) -> Result<Vec<String>> {
            FixtureRenderer.page_text(pdf, page_number)
        }

        fn render_page(&self, pdf: &[u8], page_number: u32, scale: f32) -> Result<RgbaImage> {
            FixtureRenderer.render_page(pdf, page_number, scale)
        }
    }

    #[tokio::test]
    async fn worker_source_is_configured_once_on_ready() {
        let renderer = Arc::new(RecordingRenderer::default());
        let registry = CapabilityRegistry::new();
        registry.install(Engine::Rendering(renderer.clone()));

        let mut config = fast_config(vec![Capability::Rendering], 3);
        config.worker_source = Some("/opt/pdfium".into());
        let gate = ReadinessGate::new(registry, &config);

        assert_eq!(gate.run().await, Readiness::Ready);
        assert_eq!(gate.run().await, Readiness::Ready);
        assert_eq!(*renderer.sources.lock().unwrap(), vec!["/opt/pdfium".to_string()]);
    }
}
