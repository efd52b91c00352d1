//! Centralized constants for the render pipeline
//!
//! Single source of truth for pacing, progress checkpoints and defaults so the
//! orchestrator, assembler and settings loader agree on the same numbers.

/// Pauses inserted by the assembler (milliseconds)
pub mod pauses {
    /// Story mode: pause after every sentence
    pub const STORY_LINE_MS: u32 = 260;

    /// Story mode: pause at a stanza break
    pub const STORY_STANZA_MS: u32 = 550;

    /// Poem mode: pause after every line
    pub const POEM_LINE_MS: u32 = 350;

    /// Poem mode: pause at a blank line between stanzas
    pub const POEM_STANZA_MS: u32 = 900;
}

/// Job progress checkpoints (percent)
pub mod progress {
    /// Set on pickup of render and train jobs
    pub const PICKUP: u8 = 5;

    /// Set on pickup of preview jobs
    pub const PREVIEW_PICKUP: u8 = 10;

    /// Offset added to the synthesis share
    pub const SYNTH_BASE: u8 = 5;

    /// Share of the bar covered by the synthesis loop
    pub const SYNTH_SPAN: u8 = 90;

    /// Highest value reported before finalization
    pub const SYNTH_CAP: u8 = 95;

    pub const DONE: u8 = 100;
}

/// Audio assembly defaults
pub mod audio {
    /// Track sample rate (Hz)
    pub const SAMPLE_RATE: u32 = 24_000;

    /// Upper bound on the crossfade between consecutive chunks (ms)
    pub const CROSSFADE_MAX_MS: u32 = 40;

    /// Length of the silent seed track (ms)
    pub const SEED_SILENCE_MS: u32 = 1;

    /// MP3 bitrate for compressed deliverables
    pub const MP3_BITRATE: &str = "192k";

    /// Transcoder binary
    pub const FFMPEG_BIN: &str = "ffmpeg";
}

/// Synthesis engine defaults
pub mod synthesis {
    /// XTTS-style sidecar endpoint
    pub const HTTP_ENDPOINT: &str = "http://localhost:8020";

    /// Per-chunk request timeout (seconds)
    pub const TIMEOUT_SECS: u64 = 300;

    /// Cloning mode recorded in profile caches
    pub const CLONING_MODE: &str = "reference";

    pub const LANGUAGE: &str = "ru";
}

/// Filesystem layout defaults
pub mod paths {
    pub const DATA_ROOT: &str = "data";
    pub const PROFILES_DIR: &str = "data/profiles";
    pub const JOBS_DIR: &str = "data/jobs";
    pub const OUTPUTS_DIR: &str = "data/outputs";
    pub const STORE_DIR: &str = "data/store";
    pub const ACCENT_OVERRIDES: &str = "data/accent_overrides.json";

    /// Reference cache descriptor written into each profile directory
    pub const REFERENCE_CACHE_FILE: &str = "reference_cache.json";
}

/// Worker pool defaults
pub mod workers {
    pub const PREVIEW: usize = 1;
    pub const TRAIN: usize = 1;
    pub const RENDER: usize = 2;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stanza_pauses_exceed_line_pauses() {
        assert!(pauses::STORY_STANZA_MS > pauses::STORY_LINE_MS);
        assert!(pauses::POEM_STANZA_MS > pauses::POEM_LINE_MS);
    }

    #[test]
    fn test_progress_checkpoints_ordered() {
        assert!(progress::PICKUP <= progress::SYNTH_BASE);
        assert_eq!(progress::SYNTH_BASE + progress::SYNTH_SPAN, progress::SYNTH_CAP);
        assert!(progress::SYNTH_CAP < progress::DONE);
        assert!(progress::PREVIEW_PICKUP < progress::DONE);
    }
}
