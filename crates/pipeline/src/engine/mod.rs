//! Synthesis engines
//!
//! The engine is a closed set of variants chosen once per worker from
//! configuration. [`SynthesisEngine`] dispatches on the variant and is what
//! workers hold behind the [`SynthesisPort`] trait.

mod http;
mod stub;

pub use http::{HttpEngine, HttpEngineConfig};
pub use stub::StubEngine;

use async_trait::async_trait;
use std::time::Duration;
use voice_render_config::{SynthesisEngineKind, SynthesisSettings};
use voice_render_core::{Result, SynthesisPort, SynthesisRequest};

use crate::PipelineError;

pub enum SynthesisEngine {
    Stub(StubEngine),
    Http(HttpEngine),
}

#[async_trait]
impl SynthesisPort for SynthesisEngine {
    async fn synthesize(&self, request: SynthesisRequest<'_>) -> Result<()> {
        let result = match self {
            SynthesisEngine::Stub(engine) => engine.render(request).await,
            SynthesisEngine::Http(engine) => engine.render(request).await,
        };
        result.map_err(Into::into)
    }

    fn name(&self) -> &str {
        match self {
            SynthesisEngine::Stub(_) => "stub",
            SynthesisEngine::Http(_) => "xtts-http",
        }
    }
}

/// Create the configured engine
///
/// # Arguments
/// * `settings` - Engine selection and HTTP endpoint
/// * `sample_rate` - Rate of stub output
pub fn create_engine(
    settings: &SynthesisSettings,
    sample_rate: u32,
) -> std::result::Result<SynthesisEngine, PipelineError> {
    match settings.engine {
        SynthesisEngineKind::Stub => {
            tracing::warn!("Using stub synthesis engine - output will be a placeholder tone");
            Ok(SynthesisEngine::Stub(StubEngine::new(sample_rate)))
        }
        SynthesisEngineKind::Http => {
            let engine = HttpEngine::new(HttpEngineConfig {
                endpoint: settings.endpoint.clone(),
                timeout: Duration::from_secs(settings.timeout_secs),
            })?;
            tracing::info!(endpoint = %settings.endpoint, "Using HTTP synthesis engine");
            Ok(SynthesisEngine::Http(engine))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_selects_variant() {
        let settings = SynthesisSettings::default();
        let engine = create_engine(&settings, 24_000).unwrap();
        assert_eq!(engine.name(), "stub");

        let settings = SynthesisSettings {
            engine: SynthesisEngineKind::Http,
            ..Default::default()
        };
        let engine = create_engine(&settings, 24_000).unwrap();
        assert_eq!(engine.name(), "xtts-http");
    }
}
