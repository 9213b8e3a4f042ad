use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// A thread-safe, reference-counted resource container with read-write locking.
///
/// `MtResource` provides synchronized access to a value of type `T` that is shared
/// between the terrain generation worker and the consumer (render-loop) thread.
/// It uses an `Arc<RwLock<T>>` internally.
///
/// Unlike a bare `RwLock`, a poisoned lock is recovered instead of propagated: the
/// generation worker is restarted after a panic, and the data it guards (a camera
/// position, a set of chunk origins) is always left in a usable state between writes.
///
/// # Examples
///
/// ```
/// use voxel_terrain::core::MtResource;
///
/// let counter = MtResource::new(0);
/// let counter_clone = counter.clone();
///
/// let handle = std::thread::spawn(move || {
///     *counter_clone.get_mut() += 1;
/// });
///
/// handle.join().unwrap();
/// assert_eq!(*counter.get(), 1);
/// ```
///
/// # Performance Considerations
/// - Read operations (`get()`) can occur concurrently
/// - Write operations (`get_mut()`) are exclusive and will block other operations
/// - Keep guards short-lived; never hold one across a chunk build
pub struct MtResource<T: Send + Sync> {
    resource: Arc<RwLock<T>>,
}

impl<T: Send + Sync + 'static> MtResource<T> {
    /// Creates a new `MtResource` containing the given value.
    pub fn new(resource: T) -> Self {
        Self {
            resource: Arc::new(RwLock::new(resource)),
        }
    }

    /// Returns a read-only guard that allows reading the contained value.
    pub fn get(&self) -> RwLockReadGuard<'_, T> {
        self.resource.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns a mutable guard that allows modifying the contained value.
    pub fn get_mut(&self) -> RwLockWriteGuard<'_, T> {
        self.resource.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replaces the contained value, returning the previous one.
    pub fn replace(&self, value: T) -> T {
        std::mem::replace(&mut *self.get_mut(), value)
    }
}

impl<T: Send + Sync + Copy + 'static> MtResource<T> {
    /// Returns a copy of the contained value.
    pub fn snapshot(&self) -> T {
        *self.get()
    }
}

impl<T: Send + Sync> Clone for MtResource<T> {
    fn clone(&self) -> Self {
        Self {
            resource: self.resource.clone(),
        }
    }
}
