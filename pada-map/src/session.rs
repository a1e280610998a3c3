//! Session store: one accumulating graph per session, plus named
//! reference models.
//!
//! ```text
//! SessionStore
//!   sessions:   RwLock<SessionId → Arc<Mutex<Session>>>
//!   references: RwLock<name → ConsensusView>
//! ```
//!
//! Submissions to the same session are serialized by that session's mutex.
//! The map lock is only held long enough to look a session up, so different
//! sessions proceed in parallel.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use log::{debug, info};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};

use crate::config::PadaConfig;
use crate::error::{PadaError, Result};
use crate::features::ExtractedFeatures;
use crate::graph::{AccumulatorConfig, ConsensusView, FusionReport, SpatialGraph};
use crate::io::AccumulatorSnapshot;
use crate::similarity::{MatchDecision, SimilarityEngine};

/// Identifier of a session, unique within its store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub u64);

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

/// One user's accumulation session.
#[derive(Debug)]
pub struct Session {
    id: SessionId,
    graph: SpatialGraph,
}

impl Session {
    fn new(id: SessionId, graph: SpatialGraph) -> Self {
        Self { id, graph }
    }

    /// Session id.
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// The accumulated graph.
    pub fn graph(&self) -> &SpatialGraph {
        &self.graph
    }

    /// Mutable access to the graph, e.g. to advance its clock.
    pub fn graph_mut(&mut self) -> &mut SpatialGraph {
        &mut self.graph
    }

    /// Ingest one photograph's features under a fresh observation id.
    pub fn submit(&mut self, features: &ExtractedFeatures) -> FusionReport {
        let observation = self.graph.next_observation_id();
        self.graph.add_features(features, observation)
    }
}

/// Owner of all sessions and reference models.
pub struct SessionStore {
    graph_config: AccumulatorConfig,
    engine: SimilarityEngine,
    sessions: RwLock<HashMap<SessionId, Arc<Mutex<Session>>>>,
    references: RwLock<HashMap<String, ConsensusView>>,
    next_id: AtomicU64,
}

impl SessionStore {
    /// Create an empty store.
    ///
    /// # Panics
    ///
    /// Panics if the configuration is invalid.
    pub fn new(config: &PadaConfig) -> Self {
        // Fail here rather than on the first create_session
        if let Err(e) = config.graph.validate() {
            panic!("invalid accumulator configuration: {e}");
        }
        Self {
            graph_config: config.graph.clone(),
            engine: config.similarity_engine(),
            sessions: RwLock::new(HashMap::new()),
            references: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// The engine used for comparisons.
    pub fn engine(&self) -> &SimilarityEngine {
        &self.engine
    }

    fn allocate_id(&self) -> SessionId {
        SessionId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    fn insert(&self, session: Session) -> SessionId {
        let id = session.id;
        self.sessions
            .write()
            .insert(id, Arc::new(Mutex::new(session)));
        id
    }

    /// Start a session with an empty graph.
    pub fn create_session(&self) -> SessionId {
        let id = self.allocate_id();
        self.insert(Session::new(id, SpatialGraph::new(self.graph_config.clone())));
        info!("Created {id}");
        id
    }

    /// Start a session from a previously exported graph.
    pub fn restore_session(&self, snapshot: AccumulatorSnapshot) -> Result<SessionId> {
        let graph = SpatialGraph::import(snapshot)?;
        let id = self.allocate_id();
        self.insert(Session::new(id, graph));
        info!("Restored {id}");
        Ok(id)
    }

    /// End a session, returning its final state.
    pub fn destroy_session(&self, id: SessionId) -> Result<AccumulatorSnapshot> {
        let session = self
            .sessions
            .write()
            .remove(&id)
            .ok_or(PadaError::SessionNotFound(id))?;
        info!("Destroyed {id}");
        let snapshot = session.lock().graph.export();
        Ok(snapshot)
    }

    /// Whether the session exists.
    pub fn contains(&self, id: SessionId) -> bool {
        self.sessions.read().contains_key(&id)
    }

    /// Ids of all live sessions, ascending.
    pub fn session_ids(&self) -> Vec<SessionId> {
        let mut ids: Vec<SessionId> = self.sessions.read().keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Run `f` with exclusive access to one session.
    pub fn with_session<R>(&self, id: SessionId, f: impl FnOnce(&mut Session) -> R) -> Result<R> {
        let handle = self
            .sessions
            .read()
            .get(&id)
            .cloned()
            .ok_or(PadaError::SessionNotFound(id))?;
        let mut session = handle.lock();
        Ok(f(&mut session))
    }

    /// Ingest one photograph's features into a session.
    pub fn submit(&self, id: SessionId, features: &ExtractedFeatures) -> Result<FusionReport> {
        let report = self.with_session(id, |session| session.submit(features))?;
        debug!(
            "{id}: +{} nodes, {} reinforced, {} total",
            report.nodes_added, report.nodes_updated, report.stats.node_count
        );
        Ok(report)
    }

    /// Consensus of a session at the configured comparison threshold.
    pub fn consensus(&self, id: SessionId) -> Result<ConsensusView> {
        let threshold = self.engine.config().consensus_threshold;
        self.with_session(id, |session| session.graph.consensus(threshold))
    }

    /// Compare a fragment against a session's own model.
    pub fn compare_fragment(
        &self,
        id: SessionId,
        fragment: &ExtractedFeatures,
    ) -> Result<MatchDecision> {
        let model = self.consensus(id)?;
        Ok(self.engine.compare_with_model(&model, fragment))
    }

    /// Store a named reference model, replacing any previous one.
    pub fn register_reference(&self, name: impl Into<String>, model: ConsensusView) {
        let name = name.into();
        info!("Registered reference '{name}' ({} nodes)", model.len());
        self.references.write().insert(name, model);
    }

    /// Store a session's current consensus as a named reference.
    pub fn register_session_as_reference(
        &self,
        id: SessionId,
        name: impl Into<String>,
    ) -> Result<()> {
        let model = self.consensus(id)?;
        self.register_reference(name, model);
        Ok(())
    }

    /// Remove a reference model.
    pub fn remove_reference(&self, name: &str) -> Option<ConsensusView> {
        self.references.write().remove(name)
    }

    /// Names of all reference models, sorted.
    pub fn reference_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.references.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Compare a fragment against a named reference model.
    pub fn compare_with_reference(
        &self,
        name: &str,
        fragment: &ExtractedFeatures,
    ) -> Result<MatchDecision> {
        let references = self.references.read();
        let model = references
            .get(name)
            .ok_or_else(|| PadaError::ReferenceNotFound(name.to_string()))?;
        Ok(self.engine.compare_with_model(model, fragment))
    }

    /// Compare a session's model against a named reference model.
    pub fn compare_session_with_reference(&self, id: SessionId, name: &str) -> Result<MatchDecision> {
        let model = self.consensus(id)?;
        let references = self.references.read();
        let reference = references
            .get(name)
            .ok_or_else(|| PadaError::ReferenceNotFound(name.to_string()))?;
        Ok(self.engine.compare_models(reference, &model))
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(&PadaConfig::default())
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("sessions", &self.sessions.read().len())
            .field("references", &self.references.read().len())
            .finish()
    }
}
