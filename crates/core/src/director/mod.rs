use crate::action::{ActionCatalog, ActionId};
use crate::audio::EffectSink;
use crate::cache::ResourceCache;
use crate::config::DirectorConfig;
use crate::error::ShowcaseError;
use crate::Result;

/// Read-only scene view handed to the renderer. Must be treated as
/// immutable input; the renderer keys its enter/exit animations off
/// `transition_progress` crossing 0, 0.5, and 1.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneSnapshot {
    pub current_action: ActionId,
    pub active_model_id: Option<&'static str>,
    pub transition_progress: f32,
}

/// Typed observer for scene changes, replacing the implicit event bus of
/// the original experience. An error returned during the commit sequence of
/// a transition triggers a full rollback to the previous action.
pub trait SceneObserver {
    fn scene_changed(&mut self, snapshot: &SceneSnapshot) -> Result<()>;
}

/// Mutable transition record owned by the director. At most one transition
/// is ever in flight; `is_transitioning` gates re-entry.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionState {
    pub current: ActionId,
    pub previous: Option<ActionId>,
    pub is_transitioning: bool,
    pub progress: f32,
    pub last_transition_ms: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TransitionPhase {
    Idle,
    /// Waiting for a preload sweep so the renderer never receives an action
    /// whose model resources are missing.
    Validating { target: ActionId, attempts: u8 },
    /// Window for outgoing visuals to animate out before the commit.
    PreDelay { target: ActionId, until_ms: u64 },
    /// Window for incoming visuals to animate in after the commit.
    PostDelay { until_ms: u64 },
}

/// How a transition request was handled at the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    Accepted,
    /// A transition is already in flight; the request is dropped, not
    /// queued.
    RejectedBusy,
    /// The debounce window since the last accepted transition has not
    /// elapsed.
    RejectedDebounce,
    /// The action key is not part of the catalog.
    RejectedUnknown,
}

/// Orchestrator for scene-mode transitions.
///
/// Holds the current action, serialises transitions, gates them on resource
/// cache validity, and fires the per-action one-shot sound. Staged delays
/// are deadlines advanced by [`tick`]; a rolled-back or superseded stage
/// can never fire because the phase that scheduled it is gone.
///
/// [`tick`]: SceneDirector::tick
pub struct SceneDirector {
    catalog: ActionCatalog,
    config: DirectorConfig,
    state: TransitionState,
    phase: TransitionPhase,
    observers: Vec<Box<dyn SceneObserver>>,
}

impl SceneDirector {
    pub fn new(catalog: ActionCatalog, config: DirectorConfig) -> Self {
        let initial = catalog.initial().id;
        Self {
            catalog,
            config,
            state: TransitionState {
                current: initial,
                previous: None,
                is_transitioning: false,
                progress: 0.0,
                last_transition_ms: None,
            },
            phase: TransitionPhase::Idle,
            observers: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, observer: Box<dyn SceneObserver>) {
        self.observers.push(observer);
    }

    pub fn state(&self) -> &TransitionState {
        &self.state
    }

    pub fn current_action(&self) -> ActionId {
        self.state.current
    }

    pub fn is_transitioning(&self) -> bool {
        self.state.is_transitioning
    }

    /// Read-only view for the renderer.
    pub fn snapshot(&self) -> SceneSnapshot {
        let action = self.catalog.get(self.state.current);
        SceneSnapshot {
            current_action: action.id,
            active_model_id: action.model_id,
            transition_progress: self.state.progress,
        }
    }

    /// String-keyed boundary entry point for UI controls. An unknown key is
    /// a logged no-op.
    pub fn request_action(
        &mut self,
        key: &str,
        now_ms: u64,
        cache: &mut ResourceCache,
        effects: &mut dyn EffectSink,
    ) -> RequestOutcome {
        match ActionId::parse(key) {
            Some(target) => self.request(target, now_ms, cache, effects),
            None => {
                tracing::warn!(%key, "unknown action requested");
                RequestOutcome::RejectedUnknown
            }
        }
    }

    /// Requests a transition to `target`. Rejected while another transition
    /// is in flight or inside the debounce window; the lost update is
    /// intentional, the latest intent wins only once the machine is idle
    /// again.
    pub fn request(
        &mut self,
        target: ActionId,
        now_ms: u64,
        cache: &mut ResourceCache,
        effects: &mut dyn EffectSink,
    ) -> RequestOutcome {
        if self.state.is_transitioning {
            tracing::debug!(target = target.as_str(), "transition already in flight");
            return RequestOutcome::RejectedBusy;
        }
        if let Some(last) = self.state.last_transition_ms {
            if now_ms.saturating_sub(last) < self.config.debounce_ms {
                tracing::debug!(target = target.as_str(), "transition inside debounce window");
                return RequestOutcome::RejectedDebounce;
            }
        }

        self.state.previous = Some(self.state.current);
        self.state.is_transitioning = true;
        self.state.progress = 0.0;
        self.state.last_transition_ms = Some(now_ms);
        tracing::info!(target = target.as_str(), "transition accepted");

        // Fire-and-forget: the sound effect never blocks the transition.
        effects.play_effect(self.catalog.sound_for(target));

        if let Err(error) = self.notify_observers() {
            self.roll_back(now_ms, error);
            return RequestOutcome::Accepted;
        }

        if cache.is_valid() {
            self.phase = TransitionPhase::PreDelay {
                target,
                until_ms: now_ms + self.config.pre_delay_ms,
            };
        } else {
            tracing::debug!("resource cache incomplete; preloading before commit");
            cache.begin_preload_all();
            self.phase = TransitionPhase::Validating { target, attempts: 1 };
        }
        RequestOutcome::Accepted
    }

    /// Advances the staged transition. Call once per frame with the session
    /// clock.
    pub fn tick(&mut self, now_ms: u64, cache: &mut ResourceCache) {
        match self.phase {
            TransitionPhase::Idle => {}
            TransitionPhase::Validating { target, attempts } => {
                cache.poll_loads();
                if cache.sweep_active() {
                    return;
                }
                if cache.is_valid() {
                    self.phase = TransitionPhase::PreDelay {
                        target,
                        until_ms: now_ms + self.config.pre_delay_ms,
                    };
                } else if attempts < self.config.max_preload_attempts {
                    tracing::debug!(attempts, "cache still incomplete; retrying preload");
                    cache.begin_preload_all();
                    self.phase = TransitionPhase::Validating {
                        target,
                        attempts: attempts + 1,
                    };
                } else {
                    // Degrade rather than hang: after the bounded retries
                    // the transition proceeds with whatever loaded.
                    tracing::warn!(
                        target = target.as_str(),
                        attempts,
                        "cache incomplete after preload retries; transitioning anyway"
                    );
                    self.phase = TransitionPhase::PreDelay {
                        target,
                        until_ms: now_ms + self.config.pre_delay_ms,
                    };
                }
            }
            TransitionPhase::PreDelay { target, until_ms } => {
                if now_ms < until_ms {
                    return;
                }
                self.state.current = target;
                self.state.progress = 0.5;
                if let Err(error) = self.notify_observers() {
                    self.roll_back(now_ms, error);
                    return;
                }
                self.phase = TransitionPhase::PostDelay {
                    until_ms: now_ms + self.config.post_delay_ms,
                };
            }
            TransitionPhase::PostDelay { until_ms } => {
                if now_ms < until_ms {
                    return;
                }
                self.state.progress = 1.0;
                if let Err(error) = self.notify_observers() {
                    self.roll_back(now_ms, error);
                    return;
                }
                self.state.is_transitioning = false;
                self.state.last_transition_ms = Some(now_ms);
                self.phase = TransitionPhase::Idle;
                tracing::info!(
                    action = self.state.current.as_str(),
                    "transition complete"
                );
            }
        }
    }

    /// Unconditionally forces the machine back to the initial action.
    /// Recovery hatch for an unrecoverable external failure (for example a
    /// crashed renderer) without reloading the whole experience.
    pub fn reset(&mut self) {
        let initial = self.catalog.initial().id;
        self.state = TransitionState {
            current: initial,
            previous: None,
            is_transitioning: false,
            progress: 0.0,
            last_transition_ms: None,
        };
        self.phase = TransitionPhase::Idle;
        tracing::info!("scene director reset to initial action");
    }

    fn notify_observers(&mut self) -> Result<()> {
        let snapshot = SceneSnapshot {
            current_action: self.state.current,
            active_model_id: self.catalog.get(self.state.current).model_id,
            transition_progress: self.state.progress,
        };
        for observer in &mut self.observers {
            observer.scene_changed(&snapshot)?;
        }
        Ok(())
    }

    /// The only path on which observable state is reverted rather than
    /// merely logged.
    fn roll_back(&mut self, now_ms: u64, error: ShowcaseError) {
        tracing::warn!(%error, "transition failed; rolling back");
        if let Some(previous) = self.state.previous {
            self.state.current = previous;
        }
        self.state.progress = 0.0;
        self.state.is_transitioning = false;
        self.state.last_transition_ms = Some(now_ms);
        self.phase = TransitionPhase::Idle;
    }
}

impl std::fmt::Debug for SceneDirector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneDirector")
            .field("state", &self.state)
            .field("phase", &self.phase)
            .field("observers", &self.observers.len())
            .finish()
    }
}
