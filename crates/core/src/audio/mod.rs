use crate::action::SoundCategory;
use crate::config::AudioConfig;

/// Lifecycle of one audio session. `Closed` is the resting state after a
/// session's graph has been torn down; a new `initialize` re-enters
/// `Initializing` with a fresh generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Uninitialized,
    /// The background track for the current generation is loading.
    Initializing,
    Ready {
        playing: bool,
    },
    Closed,
}

/// One entry in the fixed background playlist.
#[derive(Debug, Clone, Copy)]
pub struct Track {
    pub title: &'static str,
    pub source_path: &'static str,
}

/// Fixed list of background tracks for the experience.
#[derive(Debug, Clone)]
pub struct Playlist {
    tracks: Vec<Track>,
}

impl Playlist {
    pub fn new(tracks: Vec<Track>) -> Self {
        Self { tracks }
    }

    pub fn standard() -> Self {
        Self::new(vec![
            Track {
                title: "Emberwind",
                source_path: "audio/emberwind.ogg",
            },
            Track {
                title: "Starlit Keep",
                source_path: "audio/starlit_keep.ogg",
            },
            Track {
                title: "Wyrmsong",
                source_path: "audio/wyrmsong.ogg",
            },
        ])
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn track(&self, index: usize) -> &Track {
        &self.tracks[index % self.tracks.len().max(1)]
    }
}

/// Seam to the platform audio graph (source -> gain -> analyser -> output).
///
/// Track loads are keyed by the generation that started them, so a
/// completion belonging to a superseded session is simply never claimed.
/// Implementations report failures as `Err(message)`; the engine logs them
/// and carries on, because audio is a best-effort enhancement.
pub trait AudioBackend {
    fn begin_track_load(&mut self, generation: u64, source_path: &str);
    /// `None` while the load for that generation is still in flight.
    fn poll_track_load(&mut self, generation: u64) -> Option<Result<(), String>>;
    fn connect_graph(&mut self, generation: u64) -> Result<(), String>;
    fn set_gain(&mut self, gain: f32) -> Result<(), String>;
    fn start_source(&mut self) -> Result<(), String>;
    fn stop_source(&mut self) -> Result<(), String>;
    fn disconnect_graph(&mut self) -> Result<(), String>;
    fn close_context(&mut self) -> Result<(), String>;
    fn play_effect(&mut self, category: SoundCategory) -> Result<(), String>;
}

/// Sink for one-shot UI sounds. [`AudioEngine`] is the production
/// implementation; the scene director depends only on this slice of it.
pub trait EffectSink {
    fn play_effect(&mut self, category: SoundCategory);
}

impl EffectSink for AudioEngine {
    fn play_effect(&mut self, category: SoundCategory) {
        AudioEngine::play_effect(self, category);
    }
}

/// Maps the linear user-facing volume percentage onto an exponential gain
/// curve so loudness control feels even across the range. Monotonic, with
/// `gain(0) == 0` and `gain(100) == 1`.
pub fn gain_for_volume(volume: u8) -> f32 {
    let normalised = f32::from(volume.min(100)) / 100.0;
    normalised * normalised
}

#[derive(Debug, Clone, Copy)]
enum RampFollowUp {
    /// Release the now-silent graph and load this track.
    SwitchTo(usize),
}

/// Linear gain ramp. Gain is always moved through a ramp when a transition
/// could otherwise produce an audible click.
#[derive(Debug, Clone, Copy)]
struct GainRamp {
    from: f32,
    to: f32,
    started_ms: u64,
    duration_ms: u64,
    follow: Option<RampFollowUp>,
}

impl GainRamp {
    fn value_at(&self, now_ms: u64) -> f32 {
        if self.finished(now_ms) {
            return self.to;
        }
        let elapsed = now_ms.saturating_sub(self.started_ms) as f32;
        let t = (elapsed / self.duration_ms as f32).clamp(0.0, 1.0);
        self.from + (self.to - self.from) * t
    }

    fn finished(&self, now_ms: u64) -> bool {
        now_ms >= self.started_ms + self.duration_ms
    }
}

/// Read-only transport view for the UI layer.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportSnapshot {
    pub is_playing: bool,
    pub volume: u8,
    pub current_track_title: String,
    pub load_progress: f32,
}

/// The single audio playback session for the application.
///
/// Owns the backend graph handles and the transport state, and serialises
/// track switches through the fade -> release -> load -> resume sequence so
/// two graphs are never audible at once.
pub struct AudioEngine {
    backend: Box<dyn AudioBackend>,
    playlist: Playlist,
    config: AudioConfig,
    state: EngineState,
    generation: u64,
    current_track: usize,
    volume: u8,
    last_gain: f32,
    ramp: Option<GainRamp>,
    resume_after_switch: bool,
}

impl AudioEngine {
    pub fn new(
        playlist: Playlist,
        backend: Box<dyn AudioBackend>,
        config: AudioConfig,
        volume: u8,
    ) -> Self {
        Self {
            backend,
            playlist,
            config,
            state: EngineState::Uninitialized,
            generation: 0,
            current_track: 0,
            volume: volume.min(100),
            last_gain: 0.0,
            ramp: None,
            resume_after_switch: false,
        }
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn volume(&self) -> u8 {
        self.volume
    }

    pub fn current_track_index(&self) -> usize {
        self.current_track
    }

    pub fn is_playing(&self) -> bool {
        matches!(self.state, EngineState::Ready { playing: true })
    }

    /// Tears down any existing session and begins loading the requested
    /// track under a fresh generation. Never leaves two live graphs behind:
    /// a call that supersedes an in-flight initialization bumps the
    /// generation, and the stale load's completion is never claimed.
    pub fn initialize(&mut self, track_index: usize) {
        self.release_graph();
        self.resume_after_switch = false;
        self.begin_session(track_index);
    }

    /// Starts playback with a fade from silence. Returns false, without
    /// side effects, when the session is not ready or already playing.
    pub fn play(&mut self, now_ms: u64) -> bool {
        match self.state {
            EngineState::Ready { playing: false } => {
                if matches!(
                    self.ramp,
                    Some(GainRamp {
                        follow: Some(_),
                        ..
                    })
                ) {
                    // A switch is mid-fade; remember the intent and let the
                    // new session resume playback once it is ready.
                    self.resume_after_switch = true;
                    return false;
                }
                self.apply_gain(0.0);
                if let Err(message) = self.backend.start_source() {
                    tracing::warn!(%message, "failed to start audio source");
                    return false;
                }
                self.state = EngineState::Ready { playing: true };
                self.ramp = Some(GainRamp {
                    from: 0.0,
                    to: gain_for_volume(self.volume),
                    started_ms: now_ms,
                    duration_ms: self.config.fade_ms,
                    follow: None,
                });
                true
            }
            _ => {
                tracing::debug!(state = ?self.state, "play ignored");
                false
            }
        }
    }

    /// Stops playback immediately. Only destructive transitions (track
    /// change, cleanup) require a fade-out first; pause does not.
    pub fn pause(&mut self) {
        if let EngineState::Ready { playing: true } = self.state {
            if let Err(message) = self.backend.stop_source() {
                tracing::warn!(%message, "failed to stop audio source");
            }
            self.resume_after_switch = false;
            // A fade carrying a pending switch still runs to completion so
            // the track change lands; the new session just stays paused.
            if !matches!(
                self.ramp,
                Some(GainRamp {
                    follow: Some(_),
                    ..
                })
            ) {
                self.ramp = None;
            }
            self.state = EngineState::Ready { playing: false };
        } else {
            tracing::debug!(state = ?self.state, "pause ignored");
        }
    }

    /// Switches the background track through the fade -> release -> load ->
    /// resume sequence. A switch requested while one is already in flight
    /// coalesces to the single most recent target.
    pub fn set_track(&mut self, index: usize, now_ms: u64) {
        if self.playlist.is_empty() {
            return;
        }
        let index = index % self.playlist.len();

        match self.state {
            EngineState::Uninitialized | EngineState::Closed => {
                self.resume_after_switch = false;
                self.begin_session(index);
            }
            EngineState::Initializing => {
                // Nothing is audible yet, so the partial session can be
                // superseded without a fade. The stale generation's load
                // completion is discarded by the generation check.
                self.release_graph();
                self.begin_session(index);
            }
            EngineState::Ready { playing } => {
                if let Some(ramp) = self.ramp.as_mut() {
                    if matches!(ramp.follow, Some(RampFollowUp::SwitchTo(_))) {
                        ramp.follow = Some(RampFollowUp::SwitchTo(index));
                        return;
                    }
                }
                if index == self.current_track {
                    tracing::debug!(index, "track already current");
                    return;
                }
                self.resume_after_switch = playing;
                self.ramp = Some(GainRamp {
                    from: self.last_gain,
                    to: 0.0,
                    started_ms: now_ms,
                    duration_ms: self.config.fade_ms,
                    follow: Some(RampFollowUp::SwitchTo(index)),
                });
            }
        }
    }

    pub fn next_track(&mut self, now_ms: u64) {
        if self.playlist.is_empty() {
            return;
        }
        let target = (self.current_track + 1) % self.playlist.len();
        self.set_track(target, now_ms);
    }

    pub fn previous_track(&mut self, now_ms: u64) {
        if self.playlist.is_empty() {
            return;
        }
        let len = self.playlist.len();
        let target = (self.current_track + len - 1) % len;
        self.set_track(target, now_ms);
    }

    /// Clamps to [0, 100] and applies the exponential gain curve as a
    /// direct set. This is a user-driven continuous control, not a
    /// transition, so it does not ramp.
    pub fn set_volume(&mut self, percent: i32) {
        let volume = percent.clamp(0, 100) as u8;
        self.volume = volume;
        match self.ramp.as_mut() {
            // A running fade-in should land on the new target.
            Some(ramp) if ramp.follow.is_none() => ramp.to = gain_for_volume(volume),
            Some(_) => {}
            None => {
                if self.is_playing() {
                    self.apply_gain(gain_for_volume(volume));
                }
            }
        }
    }

    /// Fires a one-shot UI sound. Fire-and-forget: a failure is logged and
    /// never surfaces to the caller.
    pub fn play_effect(&mut self, category: SoundCategory) {
        if let Err(message) = self.backend.play_effect(category) {
            tracing::warn!(?category, %message, "ui sound effect failed");
        }
    }

    /// Immediate teardown for unmount. Safe to call repeatedly and when
    /// never initialized. There is no fade here: no further ticks are
    /// guaranteed once the caller is shutting down, so gain is cut to
    /// silence synchronously before the graph is released.
    pub fn cleanup(&mut self) {
        self.ramp = None;
        self.resume_after_switch = false;
        self.apply_gain(0.0);
        self.release_graph();
        self.state = EngineState::Uninitialized;
    }

    /// Advances fades, claims track-load completions for the current
    /// generation, and runs ramp follow-ups (the release-and-reload half of
    /// a track switch).
    pub fn tick(&mut self, now_ms: u64) {
        if let Some(ramp) = self.ramp {
            self.apply_gain(ramp.value_at(now_ms));
            if ramp.finished(now_ms) {
                self.ramp = None;
                if let Some(RampFollowUp::SwitchTo(index)) = ramp.follow {
                    // Gain has reached zero: the old graph can be released
                    // without an audible artifact.
                    self.release_graph();
                    self.begin_session(index);
                }
            }
        }

        if self.state == EngineState::Initializing {
            if let Some(outcome) = self.backend.poll_track_load(self.generation) {
                match outcome {
                    Ok(()) => self.finish_session(now_ms),
                    Err(message) => {
                        tracing::warn!(
                            generation = self.generation,
                            %message,
                            "background track failed to load"
                        );
                        self.release_graph();
                        self.resume_after_switch = false;
                    }
                }
            }
        }
    }

    /// Read-only transport view for the UI. The overall resource load
    /// progress lives in the cache, so the caller supplies it.
    pub fn transport_snapshot(&self, load_progress: f32) -> TransportSnapshot {
        TransportSnapshot {
            is_playing: self.is_playing(),
            volume: self.volume,
            current_track_title: if self.playlist.is_empty() {
                String::new()
            } else {
                self.playlist.track(self.current_track).title.to_string()
            },
            load_progress,
        }
    }

    fn begin_session(&mut self, track_index: usize) {
        if self.playlist.is_empty() {
            tracing::warn!("playlist is empty; audio stays disabled");
            return;
        }
        let track_index = track_index % self.playlist.len();
        self.generation += 1;
        self.current_track = track_index;
        self.ramp = None;
        self.apply_gain(0.0);
        let track = *self.playlist.track(track_index);
        tracing::debug!(
            generation = self.generation,
            track = track.title,
            "loading background track"
        );
        self.backend.begin_track_load(self.generation, track.source_path);
        self.state = EngineState::Initializing;
    }

    fn finish_session(&mut self, now_ms: u64) {
        if let Err(message) = self.backend.connect_graph(self.generation) {
            tracing::warn!(%message, "audio graph connect failed");
            self.release_graph();
            self.resume_after_switch = false;
            return;
        }
        self.apply_gain(0.0);
        self.state = EngineState::Ready { playing: false };
        tracing::debug!(
            generation = self.generation,
            track = self.playlist.track(self.current_track).title,
            "audio session ready"
        );
        if self.resume_after_switch {
            self.resume_after_switch = false;
            self.play(now_ms);
        }
    }

    fn release_graph(&mut self) {
        if matches!(
            self.state,
            EngineState::Uninitialized | EngineState::Closed
        ) {
            return;
        }
        // "Already disconnected" and friends are non-errors here.
        if let Err(message) = self.backend.stop_source() {
            tracing::debug!(%message, "stop during release reported failure");
        }
        if let Err(message) = self.backend.disconnect_graph() {
            tracing::debug!(%message, "disconnect during release reported failure");
        }
        if let Err(message) = self.backend.close_context() {
            tracing::debug!(%message, "context close reported failure");
        }
        self.state = EngineState::Closed;
    }

    fn apply_gain(&mut self, gain: f32) {
        self.last_gain = gain;
        if let Err(message) = self.backend.set_gain(gain) {
            tracing::warn!(%message, "gain update failed");
        }
    }
}

impl std::fmt::Debug for AudioEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioEngine")
            .field("state", &self.state)
            .field("generation", &self.generation)
            .field("current_track", &self.current_track)
            .field("volume", &self.volume)
            .field("last_gain", &self.last_gain)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::rc::Rc;

    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    enum BackendOp {
        BeginLoad(u64, String),
        Connect(u64),
        SetGain(f32),
        Start,
        Stop,
        Disconnect,
        Close,
        Effect(SoundCategory),
    }

    #[derive(Default)]
    struct BackendState {
        ops: Vec<BackendOp>,
        load_outcomes: HashMap<u64, Result<(), String>>,
        fail_disconnect: bool,
    }

    /// Backend that records every call and settles loads on demand.
    #[derive(Clone, Default)]
    struct RecordingBackend {
        state: Rc<RefCell<BackendState>>,
    }

    impl RecordingBackend {
        fn ops(&self) -> Vec<BackendOp> {
            self.state.borrow().ops.clone()
        }

        fn settle_load(&self, generation: u64, outcome: Result<(), String>) {
            self.state
                .borrow_mut()
                .load_outcomes
                .insert(generation, outcome);
        }

        fn fail_disconnect(&self) {
            self.state.borrow_mut().fail_disconnect = true;
        }
    }

    impl AudioBackend for RecordingBackend {
        fn begin_track_load(&mut self, generation: u64, source_path: &str) {
            self.state
                .borrow_mut()
                .ops
                .push(BackendOp::BeginLoad(generation, source_path.to_string()));
        }

        fn poll_track_load(&mut self, generation: u64) -> Option<Result<(), String>> {
            self.state.borrow_mut().load_outcomes.remove(&generation)
        }

        fn connect_graph(&mut self, generation: u64) -> Result<(), String> {
            self.state
                .borrow_mut()
                .ops
                .push(BackendOp::Connect(generation));
            Ok(())
        }

        fn set_gain(&mut self, gain: f32) -> Result<(), String> {
            self.state.borrow_mut().ops.push(BackendOp::SetGain(gain));
            Ok(())
        }

        fn start_source(&mut self) -> Result<(), String> {
            self.state.borrow_mut().ops.push(BackendOp::Start);
            Ok(())
        }

        fn stop_source(&mut self) -> Result<(), String> {
            self.state.borrow_mut().ops.push(BackendOp::Stop);
            Ok(())
        }

        fn disconnect_graph(&mut self) -> Result<(), String> {
            let fail = {
                let mut state = self.state.borrow_mut();
                state.ops.push(BackendOp::Disconnect);
                state.fail_disconnect
            };
            if fail {
                Err("node already disconnected".to_string())
            } else {
                Ok(())
            }
        }

        fn close_context(&mut self) -> Result<(), String> {
            self.state.borrow_mut().ops.push(BackendOp::Close);
            Ok(())
        }

        fn play_effect(&mut self, category: SoundCategory) -> Result<(), String> {
            self.state.borrow_mut().ops.push(BackendOp::Effect(category));
            Ok(())
        }
    }

    const FADE_MS: u64 = 100;

    fn build_engine() -> (AudioEngine, RecordingBackend) {
        let backend = RecordingBackend::default();
        let config = AudioConfig {
            fade_ms: FADE_MS,
            default_volume: 30,
        };
        let engine = AudioEngine::new(
            Playlist::standard(),
            Box::new(backend.clone()),
            config,
            30,
        );
        (engine, backend)
    }

    fn ready_engine() -> (AudioEngine, RecordingBackend) {
        let (mut engine, backend) = build_engine();
        engine.initialize(0);
        backend.settle_load(engine.generation(), Ok(()));
        engine.tick(0);
        assert_eq!(engine.state(), EngineState::Ready { playing: false });
        (engine, backend)
    }

    #[test]
    fn play_is_refused_until_a_session_is_ready() {
        let (mut engine, backend) = build_engine();
        assert!(!engine.play(0));

        engine.initialize(0);
        assert!(!engine.play(0));
        assert!(!backend.ops().contains(&BackendOp::Start));
    }

    #[test]
    fn play_ramps_gain_from_silence_to_the_volume_target() {
        let (mut engine, backend) = ready_engine();

        assert!(engine.play(1_000));
        assert!(engine.is_playing());
        // A second play while already playing is a silent no-op.
        assert!(!engine.play(1_000));

        engine.tick(1_000 + FADE_MS / 2);
        engine.tick(1_000 + FADE_MS);

        let gains: Vec<f32> = backend
            .ops()
            .iter()
            .filter_map(|op| match op {
                BackendOp::SetGain(gain) => Some(*gain),
                _ => None,
            })
            .collect();
        let target = gain_for_volume(30);
        assert_eq!(gains.last().copied(), Some(target));
        // No abrupt jump: the ramp passed through an intermediate value.
        assert!(gains.iter().any(|gain| *gain > 0.0 && *gain < target));
    }

    #[test]
    fn set_track_drives_gain_to_zero_before_releasing_the_old_graph() {
        let (mut engine, backend) = ready_engine();
        engine.play(0);
        engine.tick(FADE_MS);

        engine.set_track(1, 1_000);
        engine.tick(1_000 + FADE_MS);

        let ops = backend.ops();
        let disconnect_at = ops
            .iter()
            .rposition(|op| *op == BackendOp::Disconnect)
            .expect("old graph must be released");
        let reload_at = ops
            .iter()
            .rposition(|op| matches!(op, BackendOp::BeginLoad(..)))
            .expect("new track must load");
        assert!(
            ops[..disconnect_at].contains(&BackendOp::SetGain(0.0)),
            "gain must reach zero before the old graph is released"
        );
        assert!(disconnect_at < reload_at);
    }

    #[test]
    fn playback_resumes_after_a_switch_when_it_was_active() {
        let (mut engine, backend) = ready_engine();
        engine.play(0);
        engine.tick(FADE_MS);

        engine.set_track(1, 1_000);
        engine.tick(1_000 + FADE_MS);
        assert_eq!(engine.state(), EngineState::Initializing);

        backend.settle_load(engine.generation(), Ok(()));
        engine.tick(1_000 + FADE_MS + 16);
        assert!(engine.is_playing());
        assert_eq!(engine.current_track_index(), 1);
    }

    #[test]
    fn paused_transport_stays_paused_across_a_switch() {
        let (mut engine, backend) = ready_engine();

        engine.set_track(2, 0);
        engine.tick(FADE_MS);
        backend.settle_load(engine.generation(), Ok(()));
        engine.tick(FADE_MS + 16);

        assert_eq!(engine.state(), EngineState::Ready { playing: false });
        assert_eq!(engine.current_track_index(), 2);
    }

    #[test]
    fn pause_during_a_switch_still_lands_the_track_change() {
        let (mut engine, backend) = ready_engine();
        engine.play(0);
        engine.tick(FADE_MS);

        engine.set_track(1, 1_000);
        engine.pause();
        engine.tick(1_000 + FADE_MS);
        backend.settle_load(engine.generation(), Ok(()));
        engine.tick(1_000 + FADE_MS + 16);

        assert_eq!(engine.state(), EngineState::Ready { playing: false });
        assert_eq!(engine.current_track_index(), 1);
    }

    #[test]
    fn play_during_a_switch_resumes_once_the_new_session_is_ready() {
        let (mut engine, backend) = ready_engine();

        engine.set_track(1, 0);
        assert!(!engine.play(50));
        engine.tick(FADE_MS);
        backend.settle_load(engine.generation(), Ok(()));
        engine.tick(FADE_MS + 16);

        assert!(engine.is_playing());
        assert_eq!(engine.current_track_index(), 1);
    }

    #[test]
    fn superseding_a_pending_initialize_discards_the_stale_load() {
        let (mut engine, backend) = build_engine();

        engine.initialize(0);
        let stale_generation = engine.generation();
        engine.set_track(1, 0);
        assert!(engine.generation() > stale_generation);

        // The first load finishing late must not produce a live graph.
        backend.settle_load(stale_generation, Ok(()));
        engine.tick(16);
        assert_eq!(engine.state(), EngineState::Initializing);

        backend.settle_load(engine.generation(), Ok(()));
        engine.tick(32);
        assert_eq!(engine.state(), EngineState::Ready { playing: false });

        let connects: Vec<u64> = backend
            .ops()
            .iter()
            .filter_map(|op| match op {
                BackendOp::Connect(generation) => Some(*generation),
                _ => None,
            })
            .collect();
        assert_eq!(connects, vec![engine.generation()]);
    }

    #[test]
    fn switching_to_the_current_track_is_a_no_op() {
        let (mut engine, backend) = ready_engine();
        let before = backend.ops().len();

        engine.set_track(0, 500);
        assert_eq!(backend.ops().len(), before);
    }

    #[test]
    fn mid_switch_requests_coalesce_to_the_most_recent_target() {
        let (mut engine, backend) = ready_engine();
        engine.play(0);
        engine.tick(FADE_MS);

        engine.set_track(1, 1_000);
        engine.set_track(2, 1_010);
        engine.tick(1_000 + FADE_MS);

        let loads: Vec<String> = backend
            .ops()
            .iter()
            .filter_map(|op| match op {
                BackendOp::BeginLoad(_, path) => Some(path.clone()),
                _ => None,
            })
            .collect();
        // The initial session load plus exactly one switch load, track 2's.
        assert_eq!(loads.len(), 2);
        assert_eq!(loads[1], "audio/wyrmsong.ogg");
        assert_eq!(engine.current_track_index(), 2);
    }

    #[test]
    fn next_and_previous_wrap_around_the_playlist() {
        let (mut engine, backend) = ready_engine();

        engine.previous_track(0);
        engine.tick(FADE_MS);
        backend.settle_load(engine.generation(), Ok(()));
        engine.tick(FADE_MS + 16);
        assert_eq!(engine.current_track_index(), 2);

        engine.next_track(2_000);
        engine.tick(2_000 + FADE_MS);
        backend.settle_load(engine.generation(), Ok(()));
        engine.tick(2_000 + FADE_MS + 16);
        assert_eq!(engine.current_track_index(), 0);
    }

    #[test]
    fn volume_clamps_and_follows_the_exponential_curve() {
        let (mut engine, _backend) = ready_engine();

        engine.set_volume(130);
        assert_eq!(engine.volume(), 100);
        engine.set_volume(-5);
        assert_eq!(engine.volume(), 0);

        assert_eq!(gain_for_volume(0), 0.0);
        assert_eq!(gain_for_volume(100), 1.0);
        let mut previous = -1.0_f32;
        for volume in 0..=100_u8 {
            let gain = gain_for_volume(volume);
            assert!(gain > previous, "gain curve must be strictly monotonic");
            previous = gain;
        }
    }

    #[test]
    fn cleanup_is_idempotent_and_safe_when_never_initialized() {
        let (mut engine, _backend) = build_engine();
        engine.cleanup();
        engine.cleanup();
        assert_eq!(engine.state(), EngineState::Uninitialized);

        let (mut engine, backend) = ready_engine();
        engine.play(0);
        engine.cleanup();
        assert_eq!(engine.state(), EngineState::Uninitialized);
        assert!(backend.ops().contains(&BackendOp::Close));

        let closes_before = backend
            .ops()
            .iter()
            .filter(|op| **op == BackendOp::Close)
            .count();
        engine.cleanup();
        let closes_after = backend
            .ops()
            .iter()
            .filter(|op| **op == BackendOp::Close)
            .count();
        assert_eq!(closes_before, closes_after);
    }

    #[test]
    fn backend_failures_are_swallowed() {
        let (mut engine, backend) = ready_engine();
        backend.fail_disconnect();
        engine.play(0);
        engine.tick(FADE_MS);

        engine.set_track(1, 1_000);
        engine.tick(1_000 + FADE_MS);
        // The failed disconnect was tolerated and the switch proceeded.
        assert_eq!(engine.state(), EngineState::Initializing);
    }

    #[test]
    fn failed_track_load_leaves_a_closed_session() {
        let (mut engine, backend) = build_engine();
        engine.initialize(0);
        backend.settle_load(engine.generation(), Err("decode error".to_string()));
        engine.tick(0);

        assert_eq!(engine.state(), EngineState::Closed);
        assert!(!engine.play(0));

        // A fresh initialize recovers.
        engine.initialize(1);
        backend.settle_load(engine.generation(), Ok(()));
        engine.tick(16);
        assert_eq!(engine.state(), EngineState::Ready { playing: false });
    }

    #[test]
    fn transport_snapshot_reports_title_and_volume() {
        let (mut engine, _backend) = ready_engine();
        engine.set_volume(45);

        let snapshot = engine.transport_snapshot(0.75);
        assert!(!snapshot.is_playing);
        assert_eq!(snapshot.volume, 45);
        assert_eq!(snapshot.current_track_title, "Emberwind");
        assert_eq!(snapshot.load_progress, 0.75);
    }
}
