//! Per-worker service objects
//!
//! Each worker builds its context once at startup and reuses it for every
//! job it processes. Nothing in here is shared between workers.

use std::sync::Arc;
use std::time::Duration;
use voice_render_config::{AccenterKind, AccenterSettings, Settings};
use voice_render_core::{Accenter, Error, Result, SynthesisPort};
use voice_render_pipeline::{create_engine, AssemblerConfig, AudioAssembler};
use voice_render_text_processing::{
    DictionaryAccenter, HttpAccenter, HttpAccenterConfig, OverrideStore, TextFrontend,
};

pub struct WorkerContext {
    pub frontend: TextFrontend,
    pub engine: Arc<dyn SynthesisPort>,
    pub assembler: AudioAssembler,
}

impl WorkerContext {
    pub fn new(frontend: TextFrontend, engine: Arc<dyn SynthesisPort>, assembler: AudioAssembler) -> Self {
        Self {
            frontend,
            engine,
            assembler,
        }
    }

    /// Build the configured frontend, engine and assembler
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let overrides = OverrideStore::open(&settings.paths.accent_overrides_path);
        let accenter = build_accenter(&settings.accenter)?;
        let frontend = TextFrontend::new(overrides, accenter);
        let engine = create_engine(&settings.synthesis, settings.audio.sample_rate)?;
        let assembler = AudioAssembler::new(AssemblerConfig::from(&settings.audio));
        Ok(Self::new(frontend, Arc::new(engine), assembler))
    }
}

/// Automatic accenter for the configured kind; `None` means identity
pub fn build_accenter(settings: &AccenterSettings) -> Result<Option<Arc<dyn Accenter>>> {
    let accenter: Arc<dyn Accenter> = match settings.kind {
        AccenterKind::None => return Ok(None),
        AccenterKind::Dictionary => {
            let path = settings
                .dictionary_path
                .as_ref()
                .ok_or_else(|| Error::Input("accenter.dictionary_path is not set".into()))?;
            Arc::new(DictionaryAccenter::from_file(path)?)
        }
        AccenterKind::Http => {
            let endpoint = settings
                .endpoint
                .clone()
                .ok_or_else(|| Error::Input("accenter.endpoint is not set".into()))?;
            let mut config = HttpAccenterConfig {
                endpoint,
                ..Default::default()
            };
            if let Some(secs) = settings.timeout_secs {
                config.timeout = Duration::from_secs(secs);
            }
            Arc::new(HttpAccenter::new(config)?)
        }
    };
    tracing::info!(accenter = accenter.name(), "Automatic accenter enabled");
    Ok(Some(accenter))
}
