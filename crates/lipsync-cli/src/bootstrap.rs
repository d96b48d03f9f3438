//! CLI bootstrap - the composition root.
//!
//! This module is the ONLY place where the speech backend is chosen and the
//! avatar engine is wired to it. Command handlers receive a [`CliContext`]
//! and never construct infrastructure themselves.

use std::sync::Arc;

use lipsync_core::{AvatarEvent, ChannelEmitter, SpeechSynthesisPort};
use lipsync_voice::{
    AvatarEngine, EspeakSpeechService, SimulatedConfig, SimulatedSpeechService, VoiceError,
};
use tokio::sync::mpsc;

use crate::config::{BackendKind, CliConfig};
use crate::error::CliError;

/// Fully composed context for CLI commands.
pub struct CliContext {
    pub config: CliConfig,
    /// The speech backend every engine in this process talks to.
    pub service: Arc<dyn SpeechSynthesisPort>,
    /// Backend actually in use (`Auto` resolved).
    pub backend: BackendKind,
}

impl CliContext {
    /// Build an engine over the shared service.
    ///
    /// Returns the engine together with the receiver for its events.
    pub fn engine(&self) -> Result<(AvatarEngine, mpsc::UnboundedReceiver<AvatarEvent>), CliError> {
        let (emitter, events) = ChannelEmitter::new();
        let engine = AvatarEngine::new(
            Arc::clone(&self.service),
            self.config.settings.clone(),
            Arc::new(emitter),
        )?;
        Ok((engine, events))
    }
}

/// Compose the CLI context. Must run inside the tokio runtime.
pub fn bootstrap(config: CliConfig) -> Result<CliContext, CliError> {
    let (service, backend) = build_service(config.backend)?;
    tracing::info!(%backend, "Speech backend ready");
    Ok(CliContext {
        config,
        service,
        backend,
    })
}

fn build_service(
    kind: BackendKind,
) -> Result<(Arc<dyn SpeechSynthesisPort>, BackendKind), CliError> {
    let espeak = match kind {
        BackendKind::Simulated => return Ok((simulated()?, BackendKind::Simulated)),
        BackendKind::Espeak => EspeakSpeechService::detect()?,
        BackendKind::Auto => match EspeakSpeechService::detect() {
            Ok(service) => service,
            Err(VoiceError::BackendUnavailable(reason)) => {
                tracing::warn!(%reason, "espeak unavailable, falling back to simulated speech");
                return Ok((simulated()?, BackendKind::Simulated));
            }
            Err(e) => return Err(e.into()),
        },
    };
    let service: Arc<dyn SpeechSynthesisPort> = Arc::new(espeak);
    Ok((service, BackendKind::Espeak))
}

fn simulated() -> Result<Arc<dyn SpeechSynthesisPort>, CliError> {
    let service = SimulatedSpeechService::new(SimulatedConfig::default())?;
    Ok(Arc::new(service))
}

#[cfg(test)]
mod tests {
    use super::*;
    use lipsync_core::AvatarSettings;

    fn simulated_config() -> CliConfig {
        CliConfig {
            settings: AvatarSettings::default(),
            backend: BackendKind::Simulated,
        }
    }

    #[tokio::test]
    async fn simulated_backend_has_voices() {
        let ctx = bootstrap(simulated_config()).unwrap();
        assert_eq!(ctx.backend, BackendKind::Simulated);
        assert!(!ctx.service.voices().is_empty());
    }

    #[tokio::test]
    async fn engines_share_the_service() {
        let ctx = bootstrap(simulated_config()).unwrap();
        let (engine, mut events) = ctx.engine().unwrap();
        assert!(!engine.is_speaking());
        assert!(matches!(
            events.try_recv(),
            Ok(AvatarEvent::VoicesChanged { .. })
        ));
    }
}
