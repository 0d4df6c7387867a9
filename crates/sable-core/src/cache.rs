//! Per-view class caches.
//!
//! Caches synchronize internally so cache hits never need the view's resolution lock.
//! Inserting a second, different definition for an already cached type is a logic error and
//! is rejected with [`CacheError::DuplicateInsertion`].

use std::collections::HashMap;
use std::fmt;
use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use parking_lot::{Mutex, RwLock};

use crate::error::CacheError;
use crate::ids::ClassType;
use crate::model::ClassDef;

pub trait Cache: Send + Sync + fmt::Debug {
    fn contains(&self, class_type: &ClassType) -> bool;

    fn get(&self, class_type: &ClassType) -> Option<Arc<ClassDef>>;

    fn insert(&self, class_type: ClassType, class: Arc<ClassDef>) -> Result<(), CacheError>;

    /// All classes currently held.
    fn snapshot(&self) -> Vec<Arc<ClassDef>>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CachePolicy {
    /// Keep every class for the lifetime of the view.
    #[default]
    Full,
    /// Keep at most `capacity` classes, evicting the least recently used.
    Lru { capacity: NonZeroUsize },
}

impl CachePolicy {
    pub fn create_cache(&self) -> Box<dyn Cache> {
        match *self {
            CachePolicy::Full => Box::new(FullCache::default()),
            CachePolicy::Lru { capacity } => Box::new(LruClassCache::new(capacity)),
        }
    }
}

#[derive(Debug, Default)]
pub struct FullCache {
    classes: RwLock<HashMap<ClassType, Arc<ClassDef>>>,
}

impl Cache for FullCache {
    fn contains(&self, class_type: &ClassType) -> bool {
        self.classes.read().contains_key(class_type)
    }

    fn get(&self, class_type: &ClassType) -> Option<Arc<ClassDef>> {
        self.classes.read().get(class_type).cloned()
    }

    fn insert(&self, class_type: ClassType, class: Arc<ClassDef>) -> Result<(), CacheError> {
        let mut classes = self.classes.write();
        if let Some(existing) = classes.get(&class_type) {
            return check_same(existing, &class, class_type);
        }
        classes.insert(class_type, class);
        Ok(())
    }

    fn snapshot(&self) -> Vec<Arc<ClassDef>> {
        self.classes.read().values().cloned().collect()
    }

    fn len(&self) -> usize {
        self.classes.read().len()
    }
}

pub struct LruClassCache {
    classes: Mutex<LruCache<ClassType, Arc<ClassDef>>>,
}

impl LruClassCache {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            classes: Mutex::new(LruCache::new(capacity)),
        }
    }
}

impl fmt::Debug for LruClassCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let classes = self.classes.lock();
        f.debug_struct("LruClassCache")
            .field("len", &classes.len())
            .field("capacity", &classes.cap())
            .finish()
    }
}

impl Cache for LruClassCache {
    fn contains(&self, class_type: &ClassType) -> bool {
        self.classes.lock().contains(class_type)
    }

    fn get(&self, class_type: &ClassType) -> Option<Arc<ClassDef>> {
        self.classes.lock().get(class_type).cloned()
    }

    fn insert(&self, class_type: ClassType, class: Arc<ClassDef>) -> Result<(), CacheError> {
        let mut classes = self.classes.lock();
        if let Some(existing) = classes.peek(&class_type) {
            return check_same(existing, &class, class_type);
        }
        if let Some((evicted, _)) = classes.push(class_type, class) {
            tracing::trace!(target: "sable.cache", class_type = %evicted, "evicted class");
        }
        Ok(())
    }

    fn snapshot(&self) -> Vec<Arc<ClassDef>> {
        self.classes
            .lock()
            .iter()
            .map(|(_, class)| class.clone())
            .collect()
    }

    fn len(&self) -> usize {
        self.classes.lock().len()
    }
}

fn check_same(
    existing: &Arc<ClassDef>,
    incoming: &Arc<ClassDef>,
    class_type: ClassType,
) -> Result<(), CacheError> {
    if Arc::ptr_eq(existing, incoming) {
        Ok(())
    } else {
        Err(CacheError::DuplicateInsertion { class_type })
    }
}
