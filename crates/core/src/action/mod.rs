use serde::{Deserialize, Serialize};

/// Identifier for one scene mode. The set is closed: it is defined once at
/// startup and never created or destroyed at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionId {
    Start,
    ExploreWorlds,
    CastSpells,
    Loot,
    FightBosses,
    Physics,
}

impl ActionId {
    pub const ALL: [ActionId; 6] = [
        ActionId::Start,
        ActionId::ExploreWorlds,
        ActionId::CastSpells,
        ActionId::Loot,
        ActionId::FightBosses,
        ActionId::Physics,
    ];

    /// Stable string key used at the UI boundary.
    pub fn as_str(self) -> &'static str {
        match self {
            ActionId::Start => "START",
            ActionId::ExploreWorlds => "EXPLORE_WORLDS",
            ActionId::CastSpells => "CAST_SPELLS",
            ActionId::Loot => "LOOT",
            ActionId::FightBosses => "FIGHT_BOSSES",
            ActionId::Physics => "PHYSICS",
        }
    }

    /// Parses a boundary string key. Unknown keys yield `None`; callers are
    /// expected to log and drop the request rather than fail.
    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|id| id.as_str() == raw)
    }
}

/// How a scene mode presents itself: a dedicated 3D model, or an animation
/// played on the resident creature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionKind {
    Model,
    Animation,
}

/// Category of the one-shot UI sound fired when a transition is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SoundCategory {
    Chime,
    Whoosh,
    Sparkle,
    Coin,
    Impact,
    Thud,
}

/// A scene mode. Deliberately plain data: which model and which sound an
/// action uses are table lookups, not per-action behaviour.
#[derive(Debug, Clone, Copy)]
pub struct Action {
    pub id: ActionId,
    pub kind: ActionKind,
    pub model_id: Option<&'static str>,
}

/// Named 3D model asset that the resource cache is responsible for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelSource {
    pub id: &'static str,
    pub source_path: &'static str,
}

const CATALOG: [Action; 6] = [
    Action {
        id: ActionId::Start,
        kind: ActionKind::Animation,
        model_id: None,
    },
    Action {
        id: ActionId::ExploreWorlds,
        kind: ActionKind::Model,
        model_id: Some("worlds"),
    },
    Action {
        id: ActionId::CastSpells,
        kind: ActionKind::Model,
        model_id: Some("spells"),
    },
    Action {
        id: ActionId::Loot,
        kind: ActionKind::Model,
        model_id: Some("loot"),
    },
    Action {
        id: ActionId::FightBosses,
        kind: ActionKind::Model,
        model_id: Some("boss"),
    },
    Action {
        id: ActionId::Physics,
        kind: ActionKind::Animation,
        model_id: None,
    },
];

const MODEL_SOURCES: [ModelSource; 4] = [
    ModelSource {
        id: "worlds",
        source_path: "models/worlds.glb",
    },
    ModelSource {
        id: "spells",
        source_path: "models/spells.glb",
    },
    ModelSource {
        id: "loot",
        source_path: "models/loot.glb",
    },
    ModelSource {
        id: "boss",
        source_path: "models/boss.glb",
    },
];

/// The fixed set of scene modes plus the lookup tables that hang off them.
#[derive(Debug, Clone, Default)]
pub struct ActionCatalog;

impl ActionCatalog {
    pub fn standard() -> Self {
        Self
    }

    /// The action the experience starts in and resets to.
    pub fn initial(&self) -> &'static Action {
        self.get(ActionId::Start)
    }

    pub fn get(&self, id: ActionId) -> &'static Action {
        CATALOG
            .iter()
            .find(|action| action.id == id)
            .unwrap_or(&CATALOG[0])
    }

    pub fn actions(&self) -> &'static [Action] {
        &CATALOG
    }

    /// Fixed action-id to sound-category table.
    pub fn sound_for(&self, id: ActionId) -> SoundCategory {
        match id {
            ActionId::Start => SoundCategory::Chime,
            ActionId::ExploreWorlds => SoundCategory::Whoosh,
            ActionId::CastSpells => SoundCategory::Sparkle,
            ActionId::Loot => SoundCategory::Coin,
            ActionId::FightBosses => SoundCategory::Impact,
            ActionId::Physics => SoundCategory::Thud,
        }
    }

    /// Every model asset referenced by any action. Seeds the resource cache.
    pub fn model_sources(&self) -> &'static [ModelSource] {
        &MODEL_SOURCES
    }
}
