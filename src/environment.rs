use crate::{
    error::DailiesResult,
    tracking::{EntityType, RecordId, TrackingBackend, VersionContext},
};

/// Cache state of one identity slot.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum SlotState {
    /// No lookup attempted yet.
    #[default]
    Unresolved,
    /// Lookup succeeded, or the ID was supplied explicitly.
    Present(RecordId),
    /// Lookup completed without a match; cached so the remote call is not
    /// repeated on every access.
    Absent,
}

#[derive(Clone, Debug, Default)]
struct IdentitySlot {
    name: Option<String>,
    state: SlotState,
}

impl IdentitySlot {
    fn new(name: Option<String>, id: Option<RecordId>) -> Self {
        let state = match id {
            Some(id) => SlotState::Present(id),
            None => SlotState::Unresolved,
        };
        Self { name, state }
    }

    fn id(&self) -> Option<RecordId> {
        match &self.state {
            SlotState::Present(id) => Some(id.clone()),
            _ => None,
        }
    }
}

/// Names and explicit IDs seeding an [`Environment`].
///
/// Every field defaults from the conventional pipeline environment variables
/// (`PROJECT`, `ENTITY_NAME`, `ENTITY_TYPE`, `TASK`, `ARTIST_NAME`,
/// `PROJECT_ID`, `ENTITY_ID`, `TASK_ID`, `ARTIST_ID`); explicit values win.
#[derive(Clone, Debug, Default)]
pub struct IdentitySeed {
    pub project_name: Option<String>,
    pub entity_name: Option<String>,
    pub entity_type: Option<EntityType>,
    pub task_name: Option<String>,
    pub artist_name: Option<String>,
    pub project_id: Option<RecordId>,
    pub entity_id: Option<RecordId>,
    pub task_id: Option<RecordId>,
    pub artist_id: Option<RecordId>,
}

impl IdentitySeed {
    pub fn from_env() -> DailiesResult<Self> {
        let var = |key: &str| std::env::var(key).ok().filter(|v| !v.is_empty());
        let entity_type = match var("ENTITY_TYPE") {
            Some(raw) => Some(raw.parse::<EntityType>()?),
            None => None,
        };
        Ok(Self {
            project_name: var("PROJECT"),
            entity_name: var("ENTITY_NAME"),
            entity_type,
            task_name: var("TASK"),
            artist_name: var("ARTIST_NAME"),
            project_id: var("PROJECT_ID").map(RecordId),
            entity_id: var("ENTITY_ID").map(RecordId),
            task_id: var("TASK_ID").map(RecordId),
            artist_id: var("ARTIST_ID").map(RecordId),
        })
    }

    /// Overlays explicit values onto this seed; `other` wins where set.
    pub fn overridden_by(mut self, other: IdentitySeed) -> Self {
        self.project_name = other.project_name.or(self.project_name);
        self.entity_name = other.entity_name.or(self.entity_name);
        self.entity_type = other.entity_type.or(self.entity_type);
        self.task_name = other.task_name.or(self.task_name);
        self.artist_name = other.artist_name.or(self.artist_name);
        self.project_id = other.project_id.or(self.project_id);
        self.entity_id = other.entity_id.or(self.entity_id);
        self.task_id = other.task_id.or(self.task_id);
        self.artist_id = other.artist_id.or(self.artist_id);
        self
    }
}

/// The identity-resolution cascade for one session.
///
/// Each slot resolves lazily: an explicitly supplied ID is returned without
/// any remote call; otherwise the tracking backend is consulted once and the
/// outcome cached, including negative results. Resolution order is
/// dependency-ordered (project, then entity, then task, which needs the
/// entity ID); the artist slot is independent. A slot that cannot resolve
/// never blocks the others.
///
/// One instance per session; cached IDs are never invalidated within its
/// lifetime, and instances are not shared across concurrent requests.
pub struct Environment {
    backend: Box<dyn TrackingBackend>,
    entity_type: EntityType,
    project: IdentitySlot,
    entity: IdentitySlot,
    task: IdentitySlot,
    artist: IdentitySlot,
}

impl Environment {
    /// Builds an environment from an already-constructed tracking backend
    /// and a seed, typically `IdentitySeed::from_env().overridden_by(cli)`.
    pub fn new(backend: Box<dyn TrackingBackend>, seed: IdentitySeed) -> Self {
        Self {
            backend,
            entity_type: seed.entity_type.unwrap_or_default(),
            project: IdentitySlot::new(seed.project_name, seed.project_id),
            entity: IdentitySlot::new(seed.entity_name, seed.entity_id),
            task: IdentitySlot::new(seed.task_name, seed.task_id),
            artist: IdentitySlot::new(seed.artist_name, seed.artist_id),
        }
    }

    pub fn entity_type(&self) -> EntityType {
        self.entity_type
    }

    pub fn fetch_project_id(&mut self) -> Option<RecordId> {
        if self.project.state == SlotState::Unresolved {
            self.project.state = match &self.project.name {
                Some(name) => {
                    let name = name.clone();
                    self.lookup("project", |backend| backend.get_project_id(&name))
                }
                None => SlotState::Absent,
            };
        }
        self.project.id()
    }

    pub fn fetch_entity_id(&mut self) -> Option<RecordId> {
        if self.entity.state == SlotState::Unresolved {
            let entity_type = self.entity_type;
            self.entity.state = match &self.entity.name {
                Some(name) => {
                    let name = name.clone();
                    self.lookup("entity", |backend| backend.get_entity_id(&name, entity_type))
                }
                None => SlotState::Absent,
            };
        }
        self.entity.id()
    }

    /// Task lookup needs the entity ID, so an unresolved entity slot is
    /// resolved first; if the entity stays absent, the task resolves absent
    /// without a remote call.
    pub fn fetch_task_id(&mut self) -> Option<RecordId> {
        if self.task.state == SlotState::Unresolved {
            let entity_id = self.fetch_entity_id();
            self.task.state = match (&self.task.name, entity_id) {
                (Some(name), Some(entity_id)) => {
                    let name = name.clone();
                    self.lookup("task", |backend| backend.get_task_id(&entity_id, &name))
                }
                _ => SlotState::Absent,
            };
        }
        self.task.id()
    }

    pub fn fetch_artist_id(&mut self) -> Option<RecordId> {
        if self.artist.state == SlotState::Unresolved {
            self.artist.state = match &self.artist.name {
                Some(name) => {
                    let name = name.clone();
                    self.lookup("artist", |backend| backend.get_artist_id(&name))
                }
                None => SlotState::Absent,
            };
        }
        self.artist.id()
    }

    /// Resolves every slot in dependency order. Individual failures degrade
    /// to absent slots; this never errors.
    pub fn resolve_all(&mut self) {
        self.fetch_project_id();
        self.fetch_entity_id();
        self.fetch_task_id();
        self.fetch_artist_id();
    }

    /// Assembles the context `insert_version` consumes. The backend decides
    /// which of the optional IDs it strictly requires.
    pub fn version_context(
        &mut self,
        version_name: impl Into<String>,
        artifact_path: impl Into<std::path::PathBuf>,
        comment: impl Into<String>,
    ) -> VersionContext {
        self.resolve_all();
        VersionContext {
            version_name: version_name.into(),
            artifact_path: artifact_path.into(),
            comment: comment.into(),
            entity_type: self.entity_type,
            project_id: self.project.id(),
            entity_id: self.entity.id(),
            task_id: self.task.id(),
            artist_id: self.artist.id(),
        }
    }

    pub fn insert_version(&mut self, ctx: &VersionContext) -> DailiesResult<()> {
        self.backend.insert_version(ctx)
    }

    fn lookup(
        &self,
        slot: &str,
        call: impl FnOnce(&dyn TrackingBackend) -> DailiesResult<Option<RecordId>>,
    ) -> SlotState {
        match call(self.backend.as_ref()) {
            Ok(Some(id)) => {
                tracing::info!("resolved {slot} id {id} via {}", self.backend.kind());
                SlotState::Present(id)
            }
            Ok(None) => {
                tracing::warn!("{slot} not found in {}", self.backend.kind());
                SlotState::Absent
            }
            Err(e) => {
                // Non-fatal at resolution time; the slot stays absent and
                // only a downstream operation that needs it will fail.
                tracing::warn!("{slot} lookup failed: {e}");
                SlotState::Absent
            }
        }
    }

    pub fn log_configuration(&mut self) {
        self.resolve_all();
        tracing::info!("environment configuration:");
        tracing::info!("  project: {:?} -> {:?}", self.project.name, self.project.id());
        tracing::info!(
            "  entity ({}): {:?} -> {:?}",
            self.entity_type.lower(),
            self.entity.name,
            self.entity.id()
        );
        tracing::info!("  task: {:?} -> {:?}", self.task.name, self.task.id());
        tracing::info!("  artist: {:?} -> {:?}", self.artist.name, self.artist.id());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracking::TrackingKind;
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    #[derive(Default)]
    struct Calls {
        project: AtomicUsize,
        entity: AtomicUsize,
        task: AtomicUsize,
        artist: AtomicUsize,
    }

    struct MockTracking {
        calls: Arc<Calls>,
        project: Option<&'static str>,
        entity: Option<&'static str>,
        task: Option<&'static str>,
        artist: Option<&'static str>,
    }

    impl MockTracking {
        fn found() -> (Arc<Calls>, Box<dyn TrackingBackend>) {
            let calls = Arc::new(Calls::default());
            let backend = MockTracking {
                calls: calls.clone(),
                project: Some("p-1"),
                entity: Some("e-1"),
                task: Some("t-1"),
                artist: Some("a-1"),
            };
            (calls, Box::new(backend))
        }

        fn empty() -> (Arc<Calls>, Box<dyn TrackingBackend>) {
            let calls = Arc::new(Calls::default());
            let backend = MockTracking {
                calls: calls.clone(),
                project: None,
                entity: None,
                task: None,
                artist: None,
            };
            (calls, Box::new(backend))
        }
    }

    impl TrackingBackend for MockTracking {
        fn kind(&self) -> TrackingKind {
            TrackingKind::Shotgun
        }

        fn get_project_id(&self, _name: &str) -> DailiesResult<Option<RecordId>> {
            self.calls.project.fetch_add(1, Ordering::Relaxed);
            Ok(self.project.map(RecordId::from))
        }

        fn get_entity_id(
            &self,
            _name: &str,
            _entity_type: EntityType,
        ) -> DailiesResult<Option<RecordId>> {
            self.calls.entity.fetch_add(1, Ordering::Relaxed);
            Ok(self.entity.map(RecordId::from))
        }

        fn get_task_id(&self, _entity_id: &RecordId, _name: &str) -> DailiesResult<Option<RecordId>> {
            self.calls.task.fetch_add(1, Ordering::Relaxed);
            Ok(self.task.map(RecordId::from))
        }

        fn get_artist_id(&self, _name: &str) -> DailiesResult<Option<RecordId>> {
            self.calls.artist.fetch_add(1, Ordering::Relaxed);
            Ok(self.artist.map(RecordId::from))
        }

        fn insert_version(&self, _ctx: &VersionContext) -> DailiesResult<()> {
            Ok(())
        }
    }

    #[test]
    fn preset_id_never_touches_the_backend() {
        let (calls, backend) = MockTracking::found();
        let seed = IdentitySeed {
            project_name: Some("mr".into()),
            project_id: Some(RecordId::from("explicit-7")),
            ..Default::default()
        };
        let mut env = Environment::new(backend, seed);

        assert_eq!(env.fetch_project_id(), Some(RecordId::from("explicit-7")));
        assert_eq!(env.fetch_project_id(), Some(RecordId::from("explicit-7")));
        assert_eq!(calls.project.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn name_only_slot_calls_backend_exactly_once() {
        let (calls, backend) = MockTracking::found();
        let seed = IdentitySeed {
            project_name: Some("mr".into()),
            ..Default::default()
        };
        let mut env = Environment::new(backend, seed);

        for _ in 0..3 {
            assert_eq!(env.fetch_project_id(), Some(RecordId::from("p-1")));
        }
        assert_eq!(calls.project.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn negative_lookups_are_cached_too() {
        let (calls, backend) = MockTracking::empty();
        let seed = IdentitySeed {
            project_name: Some("missing".into()),
            ..Default::default()
        };
        let mut env = Environment::new(backend, seed);

        for _ in 0..3 {
            assert_eq!(env.fetch_project_id(), None);
        }
        assert_eq!(calls.project.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn task_resolution_pulls_the_entity_first() {
        let (calls, backend) = MockTracking::found();
        let seed = IdentitySeed {
            entity_name: Some("sq01_sh010".into()),
            task_name: Some("comp".into()),
            ..Default::default()
        };
        let mut env = Environment::new(backend, seed);

        assert_eq!(env.fetch_task_id(), Some(RecordId::from("t-1")));
        assert_eq!(calls.entity.load(Ordering::Relaxed), 1);
        assert_eq!(calls.task.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn task_without_entity_resolves_absent_without_a_remote_call() {
        let (calls, backend) = MockTracking::found();
        let seed = IdentitySeed {
            task_name: Some("comp".into()),
            ..Default::default()
        };
        let mut env = Environment::new(backend, seed);

        assert_eq!(env.fetch_task_id(), None);
        assert_eq!(calls.task.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn missing_slots_never_block_independent_ones() {
        let (calls, backend) = MockTracking::found();
        let seed = IdentitySeed {
            artist_name: Some("ada".into()),
            ..Default::default()
        };
        let mut env = Environment::new(backend, seed);
        env.resolve_all();

        assert_eq!(env.fetch_artist_id(), Some(RecordId::from("a-1")));
        assert_eq!(calls.artist.load(Ordering::Relaxed), 1);
        // Slots with no name resolve absent without remote calls.
        assert_eq!(calls.project.load(Ordering::Relaxed), 0);
        assert_eq!(calls.entity.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn version_context_collects_resolved_ids() {
        let (_calls, backend) = MockTracking::found();
        let seed = IdentitySeed {
            project_name: Some("mr".into()),
            entity_name: Some("sq01".into()),
            entity_type: Some(EntityType::Sequence),
            task_name: Some("comp".into()),
            artist_name: Some("ada".into()),
            ..Default::default()
        };
        let mut env = Environment::new(backend, seed);
        let ctx = env.version_context("daily_v003", "/out/daily.mov", "first pass");

        assert_eq!(ctx.entity_type, EntityType::Sequence);
        assert_eq!(ctx.project_id, Some(RecordId::from("p-1")));
        assert_eq!(ctx.entity_id, Some(RecordId::from("e-1")));
        assert_eq!(ctx.task_id, Some(RecordId::from("t-1")));
        assert_eq!(ctx.artist_id, Some(RecordId::from("a-1")));
        assert_eq!(ctx.version_name, "daily_v003");
    }

    #[test]
    fn seed_override_prefers_explicit_values() {
        let base = IdentitySeed {
            project_name: Some("from_env".into()),
            task_name: Some("comp".into()),
            ..Default::default()
        };
        let merged = base.overridden_by(IdentitySeed {
            project_name: Some("from_cli".into()),
            ..Default::default()
        });
        assert_eq!(merged.project_name.as_deref(), Some("from_cli"));
        assert_eq!(merged.task_name.as_deref(), Some("comp"));
    }
}
