use serde::{Deserialize, Serialize};

/// Top-level configuration structure for the application.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub director: DirectorConfig,
    pub audio: AudioConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            director: DirectorConfig::default(),
            audio: AudioConfig::default(),
        }
    }
}

/// Timing knobs for the scene director. The defaults were tuned by feel in
/// the original experience; nothing downstream depends on the literal
/// values beyond "short enough to feel responsive, long enough that the
/// enter/exit animations do not race".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectorConfig {
    /// Minimum gap between two accepted transitions.
    pub debounce_ms: u64,
    /// Window for outgoing visuals to animate out before the commit.
    pub pre_delay_ms: u64,
    /// Window for incoming visuals to animate in after the commit.
    pub post_delay_ms: u64,
    /// How many full preload sweeps to attempt before a transition commits
    /// with an incomplete cache.
    pub max_preload_attempts: u8,
}

impl Default for DirectorConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 500,
            pre_delay_ms: 1_000,
            post_delay_ms: 1_000,
            max_preload_attempts: 2,
        }
    }
}

/// Configuration specific to the audio subsystem.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Length of the gain ramps used for click-free starts and switches.
    pub fade_ms: u64,
    /// Volume applied when no persisted value can be restored.
    pub default_volume: u8,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            fade_ms: 100,
            default_volume: 30,
        }
    }
}
