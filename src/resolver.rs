use parking_lot::RwLock;
use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use crate::{UnitOfWorkError, UnitOfWorkResult};

/// Looks up collaborating services at runtime.
///
/// A resolver is injected into the factory and handed to every unit of work
/// and context it creates.
pub trait DependencyResolver: Send + Sync {
    /// Returns the service registered under `type_id`, if any.
    fn resolve_any(&self, type_id: TypeId) -> Option<Arc<dyn Any + Send + Sync>>;
}

impl<'a> dyn DependencyResolver + 'a {
    /// Typed lookup of a registered service.
    pub fn resolve<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.resolve_any(TypeId::of::<T>())?.downcast::<T>().ok()
    }

    /// Like [`resolve`](Self::resolve) but fails when the service is missing.
    pub fn require<T: Any + Send + Sync>(&self) -> UnitOfWorkResult<Arc<T>> {
        self.resolve::<T>()
            .ok_or(UnitOfWorkError::ServiceNotRegistered(type_name::<T>()))
    }
}

/// Type-keyed service registry, the default [`DependencyResolver`].
#[derive(Default)]
pub struct ServiceRegistry {
    services: RwLock<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>,
}

impl ServiceRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `service`, replacing any previous service of the same type.
    pub fn register<T: Any + Send + Sync>(&self, service: Arc<T>) {
        self.services.write().insert(TypeId::of::<T>(), service);
    }

    /// Registers `service` and returns the registry, for chained setup.
    pub fn with<T: Any + Send + Sync>(self, service: T) -> Self {
        self.register(Arc::new(service));
        self
    }

    /// Whether a service of type `T` is registered.
    pub fn contains<T: Any + Send + Sync>(&self) -> bool {
        self.services.read().contains_key(&TypeId::of::<T>())
    }
}

impl DependencyResolver for ServiceRegistry {
    fn resolve_any(&self, type_id: TypeId) -> Option<Arc<dyn Any + Send + Sync>> {
        self.services.read().get(&type_id).cloned()
    }
}
