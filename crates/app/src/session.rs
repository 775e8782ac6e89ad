use std::collections::HashMap;
use std::path::PathBuf;

use showcase_core::{
    command_for_key, ActionCatalog, AppConfig, AudioBackend, AudioEngine, ControlCommand,
    ModelLoader, Playlist, ResourceCache, Result, SceneDirector, SceneObserver, SceneSnapshot,
    SessionClock, SoundCategory, VolumeSettings, DEFAULT_VOLUME,
};

/// Loader that "fetches" each model over a couple of polls, standing in for
/// the platform asset pipeline.
#[derive(Default)]
struct DemoLoader {
    in_flight: HashMap<String, u8>,
}

impl ModelLoader for DemoLoader {
    fn begin(&mut self, id: &str, source_path: &str) {
        tracing::info!(%id, source_path, "demo loader fetching model");
        self.in_flight.insert(id.to_string(), 2);
    }

    fn poll(&mut self, id: &str) -> Option<std::result::Result<(), String>> {
        let remaining = self.in_flight.get_mut(id)?;
        if *remaining > 1 {
            *remaining -= 1;
            return None;
        }
        self.in_flight.remove(id);
        Some(Ok(()))
    }
}

/// Backend that logs graph operations instead of touching real audio
/// hardware; track loads complete after one poll.
#[derive(Default)]
struct DemoBackend {
    in_flight: HashMap<u64, u8>,
}

impl AudioBackend for DemoBackend {
    fn begin_track_load(&mut self, generation: u64, source_path: &str) {
        tracing::info!(generation, source_path, "demo backend loading track");
        self.in_flight.insert(generation, 1);
    }

    fn poll_track_load(&mut self, generation: u64) -> Option<std::result::Result<(), String>> {
        let remaining = self.in_flight.get_mut(&generation)?;
        if *remaining > 0 {
            *remaining -= 1;
            return None;
        }
        self.in_flight.remove(&generation);
        Some(Ok(()))
    }

    fn connect_graph(&mut self, generation: u64) -> std::result::Result<(), String> {
        tracing::info!(generation, "demo backend graph connected");
        Ok(())
    }

    fn set_gain(&mut self, gain: f32) -> std::result::Result<(), String> {
        tracing::trace!(gain, "demo backend gain");
        Ok(())
    }

    fn start_source(&mut self) -> std::result::Result<(), String> {
        tracing::info!("demo backend source started");
        Ok(())
    }

    fn stop_source(&mut self) -> std::result::Result<(), String> {
        tracing::info!("demo backend source stopped");
        Ok(())
    }

    fn disconnect_graph(&mut self) -> std::result::Result<(), String> {
        tracing::info!("demo backend graph disconnected");
        Ok(())
    }

    fn close_context(&mut self) -> std::result::Result<(), String> {
        tracing::info!("demo backend context closed");
        Ok(())
    }

    fn play_effect(&mut self, category: SoundCategory) -> std::result::Result<(), String> {
        tracing::info!(?category, "demo backend one-shot effect");
        Ok(())
    }
}

/// Renderer stand-in: logs every snapshot it receives.
struct LoggingRenderer;

impl SceneObserver for LoggingRenderer {
    fn scene_changed(&mut self, snapshot: &SceneSnapshot) -> Result<()> {
        tracing::info!(
            action = snapshot.current_action.as_str(),
            model = ?snapshot.active_model_id,
            progress = snapshot.transition_progress,
            "renderer received snapshot"
        );
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
enum Input {
    Action(&'static str),
    Key(char),
    Volume(i32),
}

const SCRIPT: [(u64, Input); 8] = [
    (300, Input::Key('c')),
    (500, Input::Action("EXPLORE_WORLDS")),
    (600, Input::Action("CAST_SPELLS")),
    (3_500, Input::Key('x')),
    (4_200, Input::Action("FIGHT_BOSSES")),
    (7_000, Input::Volume(45)),
    (7_200, Input::Key('Q')),
    (7_400, Input::Key('c')),
];

const STEP_MS: u64 = 100;
const SESSION_MS: u64 = 8_000;

/// Replays a fixed input script against the real core wired to in-memory
/// collaborators, logging what the renderer and UI would observe.
pub fn run_demo(settings_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::default();
    let settings = settings_path.map(VolumeSettings::new);
    let volume = settings
        .as_ref()
        .map(|settings| settings.load())
        .unwrap_or(DEFAULT_VOLUME);
    tracing::info!(volume, "starting demo session");

    let catalog = ActionCatalog::standard();
    let mut cache = ResourceCache::new(catalog.model_sources(), Box::new(DemoLoader::default()));
    let mut audio = AudioEngine::new(
        Playlist::standard(),
        Box::new(DemoBackend::default()),
        config.audio.clone(),
        volume,
    );
    let mut director = SceneDirector::new(catalog, config.director.clone());
    director.subscribe(Box::new(LoggingRenderer));

    let mut clock = SessionClock::new();
    audio.initialize(0);

    let mut next_input = 0;
    while clock.now_ms() < SESSION_MS {
        clock.advance(STEP_MS);
        let now = clock.now_ms();

        while next_input < SCRIPT.len() && SCRIPT[next_input].0 <= now {
            let (at, input) = SCRIPT[next_input];
            next_input += 1;
            tracing::debug!(at, ?input, "applying scripted input");
            apply_input(
                input,
                now,
                &mut director,
                &mut cache,
                &mut audio,
                settings.as_ref(),
            );
        }

        director.tick(now, &mut cache);
        audio.tick(now);
    }

    let scene = director.snapshot();
    let transport = audio.transport_snapshot(cache.load_progress());
    tracing::info!(
        action = scene.current_action.as_str(),
        progress = scene.transition_progress,
        playing = transport.is_playing,
        track = %transport.current_track_title,
        volume = transport.volume,
        "session finished"
    );

    audio.cleanup();
    Ok(())
}

fn apply_input(
    input: Input,
    now_ms: u64,
    director: &mut SceneDirector,
    cache: &mut ResourceCache,
    audio: &mut AudioEngine,
    settings: Option<&VolumeSettings>,
) {
    match input {
        Input::Action(key) => {
            let outcome = director.request_action(key, now_ms, cache, audio);
            tracing::info!(key, ?outcome, "action requested");
        }
        Input::Key(key) => match command_for_key(key) {
            Some(ControlCommand::PreviousTrack) => audio.previous_track(now_ms),
            Some(ControlCommand::NextTrack) => audio.next_track(now_ms),
            Some(ControlCommand::TogglePlayback) => {
                if audio.is_playing() {
                    audio.pause();
                } else {
                    audio.play(now_ms);
                }
            }
            Some(ControlCommand::ToggleFullscreen) => {
                tracing::info!("fullscreen toggle is handled by the shell");
            }
            None => tracing::debug!(key = %key, "unbound key ignored"),
        },
        Input::Volume(percent) => {
            audio.set_volume(percent);
            if let Some(settings) = settings {
                if let Err(error) = settings.store(audio.volume()) {
                    tracing::warn!(%error, "failed to persist volume");
                }
            }
        }
    }
}
