//! Request scope tracking
//!
//! A [`Scope`] marks one logical request. The request scoping middleware
//! creates it and runs the rest of the pipeline inside [`Scope::enter`], which
//! stores it in a tokio task-local slot. Everything awaited inside that future
//! sees the same scope, whichever worker thread polls it, and concurrent
//! requests never see each other's scope.
//!
//! Request-scoped container instances live in the scope itself, so they are
//! released when the request future completes and the scope is dropped.

use crate::http::RequestContext;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, OnceLock};

pub(crate) type Instance = Arc<dyn Any + Send + Sync>;

static NEXT_SCOPE_ID: AtomicU64 = AtomicU64::new(1);

tokio::task_local! {
    static CURRENT: Arc<Scope>;
}

/// Factory creating a fresh scope for every request
pub type ScopeFactory = Arc<dyn Fn() -> Scope + Send + Sync>;

/// Per-request lifetime marker
pub struct Scope {
    id: u64,
    request: OnceLock<RequestContext>,
    instances: Mutex<HashMap<TypeId, Instance>>,
}

impl Scope {
    pub fn new() -> Self {
        Self {
            id: NEXT_SCOPE_ID.fetch_add(1, Ordering::Relaxed),
            request: OnceLock::new(),
            instances: Mutex::new(HashMap::new()),
        }
    }

    /// Unique id of this scope within the process
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Run a future with this scope as the current scope
    pub async fn enter<T, Fut>(self: Arc<Self>, fut: Fut) -> T
    where
        Fut: Future<Output = T>,
    {
        CURRENT.scope(self, fut).await
    }

    /// Get the current scope if one is active
    pub fn current() -> Option<Arc<Scope>> {
        CURRENT.try_with(|scope| scope.clone()).ok()
    }

    /// Check if a scope is active for the running task
    pub fn is_active() -> bool {
        CURRENT.try_with(|_| ()).is_ok()
    }

    /// Attach the request this scope belongs to; only the first call wins
    pub fn attach_request(&self, request: RequestContext) {
        let _ = self.request.set(request);
    }

    /// The request this scope belongs to
    pub fn request(&self) -> Option<&RequestContext> {
        self.request.get()
    }

    /// Number of scoped instances created so far
    pub fn instance_count(&self) -> usize {
        self.instances.lock().map(|map| map.len()).unwrap_or(0)
    }

    pub(crate) fn instance(&self, key: TypeId) -> Option<Instance> {
        self.instances.lock().ok()?.get(&key).cloned()
    }

    /// Store an instance unless another one won the race; returns the stored one
    pub(crate) fn store_instance(&self, key: TypeId, instance: Instance) -> Instance {
        match self.instances.lock() {
            Ok(mut map) => map.entry(key).or_insert(instance).clone(),
            Err(_) => instance,
        }
    }
}

impl Default for Scope {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scope")
            .field("id", &self.id)
            .field("instances", &self.instance_count())
            .finish()
    }
}

impl Drop for Scope {
    fn drop(&mut self) {
        tracing::trace!(scope = self.id, "request scope released");
    }
}
