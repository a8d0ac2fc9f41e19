//! Dependency injection container
//!
//! The container is assembled once by the composition root with a
//! [`ContainerBuilder`] and frozen with [`ContainerBuilder::build`]. After that
//! it only answers queries, so it can be shared behind an `Arc` by every
//! request without locking.
//!
//! Three binding strategies are supported:
//! - constants: the same instance for the whole process
//! - methods: a factory closure called on every resolution
//! - self-construction: the type builds itself through [`Injectable`], either
//!   on every resolution or once per request [`Scope`]
//!
//! # Example
//!
//! ```rust,ignore
//! use kit::{ContainerBuilder, Lifetime};
//!
//! let mut builder = ContainerBuilder::new();
//! builder.bind_constant::<dyn StudentRepository>(students);
//! builder.bind_self::<StudentController>(Lifetime::Request);
//! let container = builder.build();
//!
//! let students = container.resolve::<dyn StudentRepository>()?;
//! ```

mod scope;

pub use scope::{Scope, ScopeFactory};

use crate::error::FrameworkError;
use crate::mvc::ControllerRegistry;
use scope::Instance;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

type Factory = Arc<dyn Fn(&Container) -> Result<Instance, FrameworkError> + Send + Sync>;

/// How long a self-constructed instance is reused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifetime {
    /// A new instance on every resolution
    Transient,
    /// One instance per request scope
    Request,
}

/// Resolution strategy for one service
#[derive(Clone)]
enum Binding {
    /// Shared instance - same instance returned every time
    Constant(Instance),

    /// Factory closure - called on every resolution
    Method(Factory),

    /// The type constructs itself with the given lifetime
    SelfBound { factory: Factory, lifetime: Lifetime },
}

impl Binding {
    fn kind(&self) -> &'static str {
        match self {
            Binding::Constant(_) => "constant",
            Binding::Method(_) => "method",
            Binding::SelfBound {
                lifetime: Lifetime::Transient,
                ..
            } => "transient",
            Binding::SelfBound {
                lifetime: Lifetime::Request,
                ..
            } => "request",
        }
    }
}

/// Types that can build themselves from the container
///
/// Implemented by controllers and other self-bound services; dependencies
/// are pulled out of the container in `inject`.
pub trait Injectable: Send + Sync + Sized + 'static {
    fn inject(container: &Container) -> Result<Self, FrameworkError>;
}

/// Mutable registry used while the composition root registers bindings
#[derive(Default)]
pub struct ContainerBuilder {
    bindings: HashMap<TypeId, (&'static str, Binding)>,
}

impl ContainerBuilder {
    /// Create a new empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a service to a constant instance
    ///
    /// Works for concrete types and trait objects alike:
    ///
    /// ```rust,ignore
    /// builder.bind_constant::<dyn StudentRepository>(Arc::new(repo));
    /// builder.bind_constant(Arc::new(configuration));
    /// ```
    pub fn bind_constant<T: ?Sized + Send + Sync + 'static>(&mut self, instance: Arc<T>) -> &mut Self {
        // Stored as Arc<Arc<T>> so trait objects can be downcast
        let instance: Instance = Arc::new(instance);
        self.insert::<T>(Binding::Constant(instance))
    }

    /// Bind a service to a factory method called on every resolution
    ///
    /// Used to cross-wire services owned by the hosting layer, e.g. the
    /// current request's context.
    pub fn bind_method<T, F>(&mut self, method: F) -> &mut Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&Container) -> Result<Arc<T>, FrameworkError> + Send + Sync + 'static,
    {
        let factory: Factory = Arc::new(move |container: &Container| {
            method(container).map(|instance| Arc::new(instance) as Instance)
        });
        self.insert::<T>(Binding::Method(factory))
    }

    /// Bind a type to itself, constructed through [`Injectable`]
    pub fn bind_self<T: Injectable>(&mut self, lifetime: Lifetime) -> &mut Self {
        let factory: Factory = Arc::new(|container: &Container| {
            let instance: Arc<T> = Arc::new(T::inject(container)?);
            Ok(Arc::new(instance) as Instance)
        });
        self.insert::<T>(Binding::SelfBound { factory, lifetime })
    }

    /// Bind every registered controller to itself in request scope
    pub fn bind_controllers(&mut self, controllers: &ControllerRegistry) -> &mut Self {
        for descriptor in controllers.iter() {
            (descriptor.bind)(self);
        }
        self
    }

    /// Check if a service is bound
    pub fn has_binding<T: ?Sized + 'static>(&self) -> bool {
        self.bindings.contains_key(&TypeId::of::<Arc<T>>())
    }

    /// Freeze the registry into a read-only container
    pub fn build(self) -> Container {
        for (name, binding) in self.bindings.values() {
            tracing::debug!(service = name, binding = binding.kind(), "service bound");
        }
        Container {
            bindings: self.bindings,
        }
    }

    fn insert<T: ?Sized + 'static>(&mut self, binding: Binding) -> &mut Self {
        let name = std::any::type_name::<T>();
        if self
            .bindings
            .insert(TypeId::of::<Arc<T>>(), (name, binding))
            .is_some()
        {
            tracing::warn!(service = name, "service binding replaced");
        }
        self
    }
}

/// Read-only service container
///
/// Stores type-erased bindings keyed by the `TypeId` of `Arc<T>`, which
/// lets both concrete types and trait objects be resolved.
pub struct Container {
    bindings: HashMap<TypeId, (&'static str, Binding)>,
}

impl Container {
    /// Resolve a service, using the current request scope for scoped bindings
    ///
    /// # Errors
    ///
    /// - [`FrameworkError::ServiceNotFound`] if nothing is bound for `T`
    /// - [`FrameworkError::ScopeMissing`] if `T` is request scoped and no
    ///   scope is active
    pub fn resolve<T: ?Sized + Send + Sync + 'static>(&self) -> Result<Arc<T>, FrameworkError> {
        let scope = Scope::current();
        self.resolve_with(scope.as_deref())
    }

    /// Resolve a service against an explicit scope
    pub fn resolve_in<T: ?Sized + Send + Sync + 'static>(&self, scope: &Scope) -> Result<Arc<T>, FrameworkError> {
        self.resolve_with(Some(scope))
    }

    /// Resolve a service, returning `None` on any failure
    pub fn get<T: ?Sized + Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.resolve::<T>().ok()
    }

    /// Check if a service is bound
    pub fn has_binding<T: ?Sized + 'static>(&self) -> bool {
        self.bindings.contains_key(&TypeId::of::<Arc<T>>())
    }

    /// Number of bindings
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Check if nothing is bound
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    fn resolve_with<T: ?Sized + Send + Sync + 'static>(&self, scope: Option<&Scope>) -> Result<Arc<T>, FrameworkError> {
        let key = TypeId::of::<Arc<T>>();
        let (_, binding) = self
            .bindings
            .get(&key)
            .ok_or_else(FrameworkError::service_not_found::<T>)?;

        let instance = match binding {
            Binding::Constant(instance) => instance.clone(),
            Binding::Method(factory) => factory(self)?,
            Binding::SelfBound {
                factory,
                lifetime: Lifetime::Transient,
            } => factory(self)?,
            Binding::SelfBound {
                factory,
                lifetime: Lifetime::Request,
            } => {
                let scope = scope.ok_or_else(FrameworkError::scope_missing::<T>)?;
                match scope.instance(key) {
                    Some(existing) => existing,
                    // The lock is not held while constructing, dependencies may be scoped too
                    None => scope.store_instance(key, factory(self)?),
                }
            }
        };

        downcast::<T>(instance)
    }
}

fn downcast<T: ?Sized + 'static>(instance: Instance) -> Result<Arc<T>, FrameworkError> {
    let any: &dyn Any = instance.as_ref();
    any.downcast_ref::<Arc<T>>().cloned().ok_or_else(|| {
        FrameworkError::internal(format!(
            "binding for '{}' produced an instance of another type",
            std::any::type_name::<T>()
        ))
    })
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.bindings.values().map(|(name, _)| *name).collect();
        names.sort_unstable();
        f.debug_struct("Container").field("bindings", &names).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    trait Greeter: Send + Sync {
        fn greet(&self) -> String;
    }

    struct English;

    impl Greeter for English {
        fn greet(&self) -> String {
            "hello".to_string()
        }
    }

    static BUILT: AtomicUsize = AtomicUsize::new(0);

    struct Controller {
        greeter: Arc<dyn Greeter>,
    }

    impl Injectable for Controller {
        fn inject(container: &Container) -> Result<Self, FrameworkError> {
            BUILT.fetch_add(1, Ordering::SeqCst);
            Ok(Self {
                greeter: container.resolve::<dyn Greeter>()?,
            })
        }
    }

    struct NeedsMissing;

    impl Injectable for NeedsMissing {
        fn inject(container: &Container) -> Result<Self, FrameworkError> {
            container.resolve::<String>()?;
            Ok(Self)
        }
    }

    struct Counter(usize);

    fn container() -> Container {
        let mut builder = ContainerBuilder::new();
        builder
            .bind_constant::<dyn Greeter>(Arc::new(English))
            .bind_self::<Controller>(Lifetime::Request)
            .bind_self::<NeedsMissing>(Lifetime::Transient);
        builder.build()
    }

    #[test]
    fn test_constant_is_same_instance() {
        let container = container();
        let a = container.resolve::<dyn Greeter>().unwrap();
        let b = container.resolve::<dyn Greeter>().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.greet(), "hello");
    }

    #[test]
    fn test_unbound_service_fails() {
        let container = container();
        match container.resolve::<String>() {
            Err(FrameworkError::ServiceNotFound { type_name }) => assert!(type_name.contains("String")),
            other => panic!("expected ServiceNotFound, got {:?}", other.map(|_| ())),
        }
        assert!(container.get::<String>().is_none());
    }

    #[test]
    fn test_missing_dependency_fails_construction() {
        let container = container();
        assert!(matches!(
            container.resolve::<NeedsMissing>(),
            Err(FrameworkError::ServiceNotFound { .. })
        ));
    }

    #[test]
    fn test_scoped_without_scope_fails() {
        let container = container();
        assert!(matches!(
            container.resolve::<Controller>(),
            Err(FrameworkError::ScopeMissing { .. })
        ));
    }

    #[test]
    fn test_scoped_reused_within_scope_and_distinct_across() {
        let container = container();
        let first = Scope::new();
        let second = Scope::new();

        let a = container.resolve_in::<Controller>(&first).unwrap();
        let b = container.resolve_in::<Controller>(&first).unwrap();
        let c = container.resolve_in::<Controller>(&second).unwrap();

        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(a.greeter.greet(), "hello");
    }

    #[tokio::test]
    async fn test_resolve_uses_current_scope() {
        let container = Arc::new(container());
        let scope = Arc::new(Scope::new());

        let same = scope
            .clone()
            .enter({
                let container = container.clone();
                async move {
                    let a = container.resolve::<Controller>().unwrap();
                    tokio::task::yield_now().await;
                    let b = container.resolve::<Controller>().unwrap();
                    Arc::ptr_eq(&a, &b)
                }
            })
            .await;

        assert!(same);
        assert_eq!(scope.instance_count(), 1);
    }

    #[test]
    fn test_scoped_instances_released_with_scope() {
        let container = container();
        let scope = Scope::new();
        let weak = Arc::downgrade(&container.resolve_in::<Controller>(&scope).unwrap());

        assert!(weak.upgrade().is_some());
        drop(scope);
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn test_method_called_per_resolution() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut builder = ContainerBuilder::new();
        let counter = calls.clone();
        builder.bind_method::<Counter, _>(move |_| {
            Ok(Arc::new(Counter(counter.fetch_add(1, Ordering::SeqCst))))
        });
        let container = builder.build();

        assert_eq!(container.resolve::<Counter>().unwrap().0, 0);
        assert_eq!(container.resolve::<Counter>().unwrap().0, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_transient_builds_every_time() {
        let mut builder = ContainerBuilder::new();
        builder
            .bind_constant::<dyn Greeter>(Arc::new(English))
            .bind_self::<Controller>(Lifetime::Transient);
        let container = builder.build();

        let before = BUILT.load(Ordering::SeqCst);
        let a = container.resolve::<Controller>().unwrap();
        let b = container.resolve::<Controller>().unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
        assert!(BUILT.load(Ordering::SeqCst) >= before + 2);
    }

    #[test]
    fn test_has_binding() {
        let container = container();
        assert!(container.has_binding::<dyn Greeter>());
        assert!(!container.has_binding::<String>());
        assert_eq!(container.len(), 3);
    }
}
