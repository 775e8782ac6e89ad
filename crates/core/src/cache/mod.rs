use std::collections::HashMap;

use crate::action::ModelSource;

/// Load status of one named resource. A resource moves monotonically from
/// absent to `Loading` to `Loaded` or `Failed`; it is never reloaded once
/// `Loaded` unless the whole cache is invalidated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Loading,
    Loaded,
    Failed(String),
}

/// Bookkeeping for one named resource.
#[derive(Debug, Clone)]
pub struct ResourceCacheEntry {
    pub id: String,
    pub source_path: String,
    pub state: LoadState,
}

/// Outcome reported to a `preload` caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreloadStatus {
    /// Already resident; nothing to do.
    Ready,
    /// A load is in flight, either newly begun or joined.
    InFlight,
    /// The id is not part of the known resource set.
    Unknown,
}

/// Seam to the platform model loader. `begin` is called at most once per
/// resource while that resource has a load pending; completion is observed
/// by polling, so the cache stays deterministic under test.
pub trait ModelLoader {
    fn begin(&mut self, id: &str, source_path: &str);
    /// `None` while the load is still in flight.
    fn poll(&mut self, id: &str) -> Option<Result<(), String>>;
}

#[derive(Debug, Clone, Copy)]
struct Sweep {
    next_index: usize,
}

/// Table of known 3D model resources and their load status.
///
/// Exactly one cache exists per running application; it is owned by the
/// composition root and handed by mutable reference to whoever needs it.
pub struct ResourceCache {
    sources: Vec<ModelSource>,
    entries: HashMap<String, ResourceCacheEntry>,
    loader: Box<dyn ModelLoader>,
    sweep: Option<Sweep>,
}

impl ResourceCache {
    pub fn new(sources: &[ModelSource], loader: Box<dyn ModelLoader>) -> Self {
        Self {
            sources: sources.to_vec(),
            entries: HashMap::new(),
            loader,
            sweep: None,
        }
    }

    /// Requests that one resource become resident. Concurrent requests for
    /// the same id share a single underlying load.
    pub fn preload(&mut self, id: &str) -> PreloadStatus {
        let Some(source) = self.sources.iter().find(|source| source.id == id) else {
            tracing::warn!(%id, "preload requested for unknown resource");
            return PreloadStatus::Unknown;
        };

        match self.entries.get(id).map(|entry| &entry.state) {
            Some(LoadState::Loaded) => PreloadStatus::Ready,
            Some(LoadState::Loading) => PreloadStatus::InFlight,
            // Never attempted, or a failed attempt being retried.
            _ => {
                let source = *source;
                self.entries.insert(
                    id.to_string(),
                    ResourceCacheEntry {
                        id: id.to_string(),
                        source_path: source.source_path.to_string(),
                        state: LoadState::Loading,
                    },
                );
                tracing::debug!(%id, path = source.source_path, "beginning model load");
                self.loader.begin(id, source.source_path);
                PreloadStatus::InFlight
            }
        }
    }

    /// Starts a sequential preload of every known resource. One resource is
    /// in flight at a time; the next begins on a later [`poll_loads`] call,
    /// which is the cooperative yield between loads.
    ///
    /// [`poll_loads`]: ResourceCache::poll_loads
    pub fn begin_preload_all(&mut self) {
        self.sweep = Some(Sweep { next_index: 0 });
        self.advance_sweep();
    }

    /// True while a preload sweep has resources left to attempt.
    pub fn sweep_active(&self) -> bool {
        self.sweep.is_some()
    }

    /// Drives every in-flight load forward and advances the sweep once the
    /// current load settles. Individual failures are recorded and logged;
    /// they never abort the sweep.
    pub fn poll_loads(&mut self) {
        let pending: Vec<String> = self
            .entries
            .values()
            .filter(|entry| entry.state == LoadState::Loading)
            .map(|entry| entry.id.clone())
            .collect();

        for id in pending {
            let Some(outcome) = self.loader.poll(&id) else {
                continue;
            };
            let Some(entry) = self.entries.get_mut(&id) else {
                continue;
            };
            match outcome {
                Ok(()) => {
                    tracing::debug!(%id, "model load complete");
                    entry.state = LoadState::Loaded;
                }
                Err(message) => {
                    tracing::warn!(%id, %message, "model load failed");
                    entry.state = LoadState::Failed(message);
                }
            }
        }

        self.advance_sweep();
    }

    /// True iff every known resource is resident.
    pub fn is_valid(&self) -> bool {
        self.sources.iter().all(|source| {
            self.entries
                .get(source.id)
                .map(|entry| entry.state == LoadState::Loaded)
                .unwrap_or(false)
        })
    }

    /// Fraction of known resources that are resident, for load UI.
    pub fn load_progress(&self) -> f32 {
        if self.sources.is_empty() {
            return 1.0;
        }
        let loaded = self
            .sources
            .iter()
            .filter(|source| {
                self.entries
                    .get(source.id)
                    .map(|entry| entry.state == LoadState::Loaded)
                    .unwrap_or(false)
            })
            .count();
        loaded as f32 / self.sources.len() as f32
    }

    pub fn entry(&self, id: &str) -> Option<&ResourceCacheEntry> {
        self.entries.get(id)
    }

    /// Full reset. Not part of normal operation; everything reloads on the
    /// next preload.
    pub fn invalidate(&mut self) {
        tracing::debug!("resource cache invalidated");
        self.entries.clear();
        self.sweep = None;
    }

    fn advance_sweep(&mut self) {
        let Some(sweep) = self.sweep else {
            return;
        };
        let loading = self
            .entries
            .values()
            .any(|entry| entry.state == LoadState::Loading);
        if loading {
            return;
        }

        let mut index = sweep.next_index;
        while let Some(source) = self.sources.get(index).copied() {
            index += 1;
            let resident = self
                .entries
                .get(source.id)
                .map(|entry| entry.state == LoadState::Loaded)
                .unwrap_or(false);
            if resident {
                continue;
            }
            self.sweep = Some(Sweep { next_index: index });
            self.preload(source.id);
            return;
        }

        self.sweep = None;
    }
}

impl std::fmt::Debug for ResourceCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceCache")
            .field("sources", &self.sources.len())
            .field("entries", &self.entries)
            .field("sweep", &self.sweep)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    const SOURCES: [ModelSource; 2] = [
        ModelSource {
            id: "worlds",
            source_path: "models/worlds.glb",
        },
        ModelSource {
            id: "boss",
            source_path: "models/boss.glb",
        },
    ];

    #[derive(Default)]
    struct LoaderState {
        begun: Vec<String>,
        outcomes: HashMap<String, Result<(), String>>,
    }

    /// Loader whose completions are scripted by the test.
    #[derive(Clone, Default)]
    struct ScriptedLoader {
        state: Rc<RefCell<LoaderState>>,
    }

    impl ScriptedLoader {
        fn begun(&self) -> Vec<String> {
            self.state.borrow().begun.clone()
        }

        fn settle(&self, id: &str, outcome: Result<(), String>) {
            self.state.borrow_mut().outcomes.insert(id.to_string(), outcome);
        }
    }

    impl ModelLoader for ScriptedLoader {
        fn begin(&mut self, id: &str, _source_path: &str) {
            self.state.borrow_mut().begun.push(id.to_string());
        }

        fn poll(&mut self, id: &str) -> Option<Result<(), String>> {
            self.state.borrow_mut().outcomes.remove(id)
        }
    }

    fn build_cache() -> (ResourceCache, ScriptedLoader) {
        let loader = ScriptedLoader::default();
        let cache = ResourceCache::new(&SOURCES, Box::new(loader.clone()));
        (cache, loader)
    }

    #[test]
    fn concurrent_preloads_share_one_load() {
        let (mut cache, loader) = build_cache();

        assert_eq!(cache.preload("worlds"), PreloadStatus::InFlight);
        assert_eq!(cache.preload("worlds"), PreloadStatus::InFlight);
        assert_eq!(cache.preload("worlds"), PreloadStatus::InFlight);
        assert_eq!(loader.begun(), vec!["worlds".to_string()]);

        loader.settle("worlds", Ok(()));
        cache.poll_loads();
        assert_eq!(cache.preload("worlds"), PreloadStatus::Ready);
        assert_eq!(loader.begun().len(), 1);
    }

    #[test]
    fn unknown_resource_is_rejected() {
        let (mut cache, loader) = build_cache();
        assert_eq!(cache.preload("castle"), PreloadStatus::Unknown);
        assert!(loader.begun().is_empty());
    }

    #[test]
    fn sweep_loads_sequentially_with_a_yield_between_loads() {
        let (mut cache, loader) = build_cache();

        cache.begin_preload_all();
        assert_eq!(loader.begun(), vec!["worlds".to_string()]);

        // First load still in flight: the sweep must not start the second.
        cache.poll_loads();
        assert_eq!(loader.begun().len(), 1);

        loader.settle("worlds", Ok(()));
        cache.poll_loads();
        assert_eq!(loader.begun(), vec!["worlds".to_string(), "boss".to_string()]);

        loader.settle("boss", Ok(()));
        cache.poll_loads();
        assert!(!cache.sweep_active());
        assert!(cache.is_valid());
        assert_eq!(cache.load_progress(), 1.0);
    }

    #[test]
    fn load_failure_is_recorded_without_aborting_the_sweep() {
        let (mut cache, loader) = build_cache();

        cache.begin_preload_all();
        loader.settle("worlds", Err("fetch timed out".to_string()));
        cache.poll_loads();
        loader.settle("boss", Ok(()));
        cache.poll_loads();

        assert!(!cache.sweep_active());
        assert!(!cache.is_valid());
        assert_eq!(cache.load_progress(), 0.5);
        assert!(matches!(
            cache.entry("worlds").map(|entry| &entry.state),
            Some(LoadState::Failed(_))
        ));
    }

    #[test]
    fn failed_resources_are_retried_by_the_next_sweep() {
        let (mut cache, loader) = build_cache();

        cache.begin_preload_all();
        loader.settle("worlds", Err("fetch timed out".to_string()));
        cache.poll_loads();
        loader.settle("boss", Ok(()));
        cache.poll_loads();

        cache.begin_preload_all();
        assert_eq!(loader.begun().iter().filter(|id| *id == "worlds").count(), 2);
        // Already resident resources are not reloaded.
        loader.settle("worlds", Ok(()));
        cache.poll_loads();
        cache.poll_loads();
        assert!(!cache.sweep_active());
        assert!(cache.is_valid());
        assert_eq!(loader.begun().iter().filter(|id| *id == "boss").count(), 1);
    }

    #[test]
    fn invalidate_clears_residency() {
        let (mut cache, loader) = build_cache();

        cache.begin_preload_all();
        loader.settle("worlds", Ok(()));
        cache.poll_loads();
        loader.settle("boss", Ok(()));
        cache.poll_loads();
        assert!(cache.is_valid());

        cache.invalidate();
        assert!(!cache.is_valid());
        assert_eq!(cache.load_progress(), 0.0);
    }
}
