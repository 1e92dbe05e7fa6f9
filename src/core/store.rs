//! The content store: one instance per application session.
//!
//! The store owns the cache, the transport handle and the lifecycle state.
//! It is shared by handle (`Arc<ContentStore>`); every operation takes
//! `&self`.
//!
//! Lifecycle: `Uninitialized -> Ready -> Reset -> Ready`. Fetches are only
//! accepted while `Ready`.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::adapters::Transport;
use crate::domain::{AppConfig, Resource};

use super::cache::ContentCache;
use super::engine::FetchOutcome;
use super::error::{FetchError, InitError};
use super::inflight::InflightRegistry;

/// Coarse lifecycle phase of a store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Uninitialized,
    Ready,
    Reset,
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lifecycle::Uninitialized => write!(f, "uninitialized"),
            Lifecycle::Ready => write!(f, "ready"),
            Lifecycle::Reset => write!(f, "reset"),
        }
    }
}

/// State of an initialized session
#[derive(Debug, Clone)]
pub struct Session {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    pub config: Arc<AppConfig>,
}

impl Session {
    fn new(config: Arc<AppConfig>) -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            config,
        }
    }
}

#[derive(Debug)]
enum StoreState {
    Uninitialized,
    Ready(Session),
    Reset,
}

impl StoreState {
    fn lifecycle(&self) -> Lifecycle {
        match self {
            StoreState::Uninitialized => Lifecycle::Uninitialized,
            StoreState::Ready(_) => Lifecycle::Ready,
            StoreState::Reset => Lifecycle::Reset,
        }
    }

    fn session(&self) -> Option<&Session> {
        match self {
            StoreState::Ready(session) => Some(session),
            StoreState::Uninitialized | StoreState::Reset => None,
        }
    }
}

/// Client-side content graph store
pub struct ContentStore {
    transport: Arc<dyn Transport>,
    cache: ContentCache,
    inflight: InflightRegistry,
    // Lock order: state before cache
    state: RwLock<StoreState>,
}

impl fmt::Debug for ContentStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentStore")
            .field("transport", &self.transport.name())
            .field("cached", &self.cache.len())
            .field("state", &self.lifecycle())
            .finish()
    }
}

impl ContentStore {
    /// Create an uninitialized store over a transport
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            cache: ContentCache::new(),
            inflight: InflightRegistry::new(),
            state: RwLock::new(StoreState::Uninitialized),
        }
    }

    fn read_state(&self) -> RwLockReadGuard<'_, StoreState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, StoreState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fetch the app config and open a session.
    ///
    /// Calling this on a store that is already ready returns the current
    /// config without a request. On failure the state is left untouched.
    #[instrument(skip(self), fields(transport = %self.transport.name()))]
    pub async fn initialize(&self) -> Result<Arc<AppConfig>, InitError> {
        if let Some(config) = self.config() {
            debug!("Store already initialized");
            return Ok(config);
        }

        let body = self.transport.fetch_config().await?;
        let config = Arc::new(AppConfig::decode(&body)?);

        let mut state = self.write_state();
        // Another initialize may have won the race while we were fetching
        if let Some(session) = state.session() {
            return Ok(Arc::clone(&session.config));
        }

        let session = Session::new(Arc::clone(&config));
        info!(
            session_id = %session.id,
            views = config.view_names().len(),
            "Content store ready"
        );
        *state = StoreState::Ready(session);

        Ok(config)
    }

    /// Clear the cache and end the session.
    ///
    /// Batches still in flight from the old session are not committed.
    pub fn reset_store(&self) {
        let mut state = self.write_state();
        let removed = self.cache.reset();
        if !matches!(*state, StoreState::Uninitialized) {
            *state = StoreState::Reset;
        }
        info!(removed, "Content store reset");
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.read_state().lifecycle()
    }

    /// Current session, if ready
    pub fn session(&self) -> Option<Session> {
        self.read_state().session().cloned()
    }

    /// App config of the current session
    pub fn config(&self) -> Option<Arc<AppConfig>> {
        self.read_state()
            .session()
            .map(|session| Arc::clone(&session.config))
    }

    pub fn cache(&self) -> &ContentCache {
        &self.cache
    }

    /// Snapshot of every cached resource
    pub fn media_objects(&self) -> Vec<Arc<Resource>> {
        self.cache.all()
    }

    pub(crate) fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    pub(crate) fn inflight(&self) -> &InflightRegistry {
        &self.inflight
    }

    /// Session id if the store accepts fetches
    pub(crate) fn ensure_ready(&self) -> Result<Uuid, FetchError> {
        let state = self.read_state();
        state
            .session()
            .map(|session| session.id)
            .ok_or_else(|| FetchError::NotReady(state.lifecycle()))
    }

    /// Commit a decoded batch if `session` is still current.
    ///
    /// Returns the number of new cache entries.
    pub(crate) fn commit<I>(&self, session: Uuid, resources: I) -> usize
    where
        I: IntoIterator<Item = Arc<Resource>>,
    {
        let state = self.read_state();
        if state.session().map(|s| s.id) != Some(session) {
            debug!(%session, "Session ended before commit, dropping batch");
            return 0;
        }
        self.cache.put_all(resources)
    }

    /// Fetch a view by its configured name
    pub async fn fetch_view(&self, name: &str, include: Option<&str>) -> Result<FetchOutcome, FetchError> {
        let config = self
            .config()
            .ok_or_else(|| FetchError::NotReady(self.lifecycle()))?;
        let id = config
            .id_for_view_name(name)
            .ok_or_else(|| FetchError::UnknownView(name.to_string()))?;

        self.objects_of_type(crate::domain::ResourceType::View, &[id], include)
            .await
    }
}
