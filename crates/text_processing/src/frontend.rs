//! Text frontend
//!
//! Turns raw submitted text into synthesis-ready text: literal expansions,
//! whitespace collapse, then accent resolution according to the request's
//! accent mode.

use std::sync::Arc;
use voice_render_core::{AccentMode, Accenter};

use crate::accents::protect;
use crate::normalize::normalize;
use crate::overrides::OverrideStore;

pub struct TextFrontend {
    overrides: OverrideStore,
    accenter: Option<Arc<dyn Accenter>>,
}

impl TextFrontend {
    /// `accenter` of `None` makes automatic accenting the identity
    pub fn new(overrides: OverrideStore, accenter: Option<Arc<dyn Accenter>>) -> Self {
        Self {
            overrides,
            accenter,
        }
    }

    pub fn overrides(&self) -> &OverrideStore {
        &self.overrides
    }

    pub fn accenter_name(&self) -> &str {
        self.accenter.as_deref().map_or("none", |a| a.name())
    }

    /// Re-read the override file; failures keep the previous map
    pub fn reload_overrides(&self) -> usize {
        match self.overrides.reload() {
            Ok(count) => count,
            Err(e) => {
                tracing::warn!(
                    path = %self.overrides.path().display(),
                    error = %e,
                    "Accent overrides reload failed, keeping previous map"
                );
                self.overrides.snapshot().len()
            }
        }
    }

    /// Normalize and accent-resolve `text`
    pub async fn preprocess(
        &self,
        text: &str,
        use_accenting: bool,
        use_user_overrides: bool,
        accent_mode: AccentMode,
    ) -> String {
        let text = normalize(text);
        match accent_mode {
            AccentMode::None => text,
            AccentMode::OverridesOnly => self.apply_accents(&text, true, false).await,
            AccentMode::AutoPlusOverrides if use_accenting => {
                self.apply_accents(&text, use_user_overrides, true).await
            }
            AccentMode::AutoPlusOverrides => text,
        }
    }

    /// Resolve accents with manual marks first, then overrides, then the accenter
    pub async fn apply_accents(&self, text: &str, use_overrides: bool, enable_auto: bool) -> String {
        let overrides = use_overrides.then(|| self.overrides.snapshot());
        let protected = protect(text, overrides.as_deref());

        let accenter = match (&self.accenter, enable_auto) {
            (Some(accenter), true) => accenter,
            _ => return protected.restore_unaccented(),
        };

        match accenter.accent(&protected.text).await {
            Ok(accented) if protected.placeholders_intact(&accented) => protected.restore(&accented),
            Ok(_) => {
                tracing::warn!(
                    accenter = accenter.name(),
                    "Accenter dropped protected tokens, using unaccented text"
                );
                protected.restore_unaccented()
            }
            Err(e) => {
                tracing::warn!(accenter = accenter.name(), error = %e, "Accenter failed, using unaccented text");
                protected.restore_unaccented()
            }
        }
    }
}
