//! Core library for the Scene Showcase experience.
//!
//! The crate owns the three subsystems with real invariants: the scene
//! director (the action/transition state machine), the audio playback
//! engine, and the resource cache. Rendering and UI chrome live outside and
//! talk to these through snapshots, observers, and the loader/backend
//! seams. Everything is driven by explicit `now_ms` timestamps from a
//! [`SessionClock`], so the whole core is deterministic under test.

pub mod action;
pub mod audio;
pub mod cache;
pub mod clock;
pub mod config;
pub mod controls;
pub mod director;
pub mod error;
pub mod settings;

pub use action::{Action, ActionCatalog, ActionId, ActionKind, ModelSource, SoundCategory};
pub use audio::{
    gain_for_volume, AudioBackend, AudioEngine, EffectSink, EngineState, Playlist, Track,
    TransportSnapshot,
};
pub use cache::{LoadState, ModelLoader, PreloadStatus, ResourceCache, ResourceCacheEntry};
pub use clock::SessionClock;
pub use config::{AppConfig, AudioConfig, DirectorConfig};
pub use controls::{command_for_key, ControlCommand};
pub use director::{
    RequestOutcome, SceneDirector, SceneObserver, SceneSnapshot, TransitionState,
};
pub use error::{Result, ShowcaseError};
pub use settings::{VolumeSettings, DEFAULT_VOLUME, SETTINGS_FILE_NAME};
