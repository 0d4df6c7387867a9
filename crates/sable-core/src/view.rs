//! The per-session resolver.
//!
//! A [`View`] pairs a [`Project`] with one cache. Cache hits are served without taking the
//! view lock; misses and full scans run inside a re-entrant exclusion region so racing
//! threads observe exactly one build per identifier, and annotation post-processing may
//! re-enter [`View::resolve`] from the same thread.

use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::ReentrantMutex;

use crate::cache::Cache;
use crate::error::ResolveError;
use crate::hierarchy::ViewTypeHierarchy;
use crate::ids::{ClassType, IdentifierFactory};
use crate::input::InputLocation;
use crate::interceptor::InterceptorSelector;
use crate::model::ClassDef;
use crate::project::{Project, ViewOptions};
use crate::source::{BuildContext, ClassSource};

pub struct View {
    project: Arc<Project>,
    cache: Box<dyn Cache>,
    interceptors: InterceptorSelector,
    resolve_lock: ReentrantMutex<()>,
    fully_resolved: AtomicBool,
}

impl View {
    pub fn new(project: Arc<Project>, options: ViewOptions) -> Self {
        let ViewOptions {
            cache,
            interceptors,
        } = options;
        Self {
            project,
            cache: cache.create_cache(),
            interceptors,
            resolve_lock: ReentrantMutex::new(()),
            fully_resolved: AtomicBool::new(false),
        }
    }

    pub fn project(&self) -> &Arc<Project> {
        &self.project
    }

    pub fn identifier_factory(&self) -> &IdentifierFactory {
        self.project.identifier_factory()
    }

    /// Resolve a single class, building it on first request.
    ///
    /// Returns `Ok(None)` when no input location provides `class_type`. A class that is found
    /// but fails to build is reported as [`ResolveError::Build`] and is not cached.
    ///
    /// Annotation types materialize the defaults of their own annotation usages right after
    /// they are cached. If that step fails the error is returned, but the class stays cached:
    /// later calls return it with those usages unmaterialized, and
    /// [`AnnotationUsage::values_with_defaults`](crate::AnnotationUsage::values_with_defaults)
    /// retries on demand.
    pub fn resolve(&self, class_type: &ClassType) -> Result<Option<Arc<ClassDef>>, ResolveError> {
        if let Some(class) = self.cache.get(class_type) {
            return Ok(Some(class));
        }

        let _guard = self.resolve_lock.lock();
        if let Some(class) = self.cache.get(class_type) {
            return Ok(Some(class));
        }

        let identifiers = self.identifier_factory();
        for location in self.project.input_locations() {
            let found = location
                .class_source(class_type, identifiers)
                .map_err(|source| ResolveError::Lookup {
                    class_type: class_type.clone(),
                    location: location.describe(),
                    source,
                })?;
            if let Some(source) = found {
                return self.build_and_cache(location.as_ref(), source).map(Some);
            }
        }

        tracing::trace!(target: "sable.view", class_type = %class_type, "class not found");
        Ok(None)
    }

    /// Build every class reachable from the project's input locations.
    ///
    /// The first call scans all locations in order; an identifier already provided by an
    /// earlier location (or already cached) is skipped. Later calls return the cached classes
    /// without rescanning. The result is sorted by identifier.
    pub fn resolve_all(&self) -> Result<Vec<Arc<ClassDef>>, ResolveError> {
        if !self.is_fully_resolved() {
            let _guard = self.resolve_lock.lock();
            if !self.is_fully_resolved() {
                self.scan_all()?;
                self.fully_resolved.store(true, Ordering::Release);
            }
        }

        let mut classes = self.cache.snapshot();
        classes.sort_by(|a, b| a.class_type.cmp(&b.class_type));
        Ok(classes)
    }

    pub fn is_fully_resolved(&self) -> bool {
        self.fully_resolved.load(Ordering::Acquire)
    }

    /// Number of classes currently held by this view's cache.
    pub fn cached_count(&self) -> usize {
        self.cache.len()
    }

    pub fn type_hierarchy(&self) -> ViewTypeHierarchy<'_> {
        ViewTypeHierarchy::new(self)
    }

    fn scan_all(&self) -> Result<(), ResolveError> {
        let identifiers = self.identifier_factory();
        let mut seen = HashSet::new();

        for location in self.project.input_locations() {
            let scan_error = |source| ResolveError::Scan {
                location: location.describe(),
                source,
            };

            let mut built = 0usize;
            for source in location.class_sources(identifiers).map_err(scan_error)? {
                let source = source.map_err(scan_error)?;
                if !seen.insert(source.class_type().clone()) || self.cache.contains(source.class_type()) {
                    continue;
                }
                self.build_and_cache(location.as_ref(), source)?;
                built += 1;
            }

            tracing::debug!(
                target: "sable.view",
                location = %location.describe(),
                built,
                "scanned input location"
            );
        }
        Ok(())
    }

    fn build_and_cache(
        &self,
        location: &dyn InputLocation,
        source: ClassSource,
    ) -> Result<Arc<ClassDef>, ResolveError> {
        let class_type = source.class_type().clone();
        let source_type = self
            .project
            .source_type_specifier()
            .source_type_for(&source);
        let interceptors = (self.interceptors)(location);
        let ctx = BuildContext {
            source_type,
            interceptors: &interceptors,
            identifiers: self.identifier_factory(),
        };

        let class = match source.build(&ctx) {
            Ok(class) => Arc::new(class),
            Err(err) => {
                tracing::warn!(
                    target: "sable.view",
                    class_type = %class_type,
                    location = %location.describe(),
                    error = %err,
                    "failed to build class"
                );
                return Err(ResolveError::Build {
                    class_type,
                    source: err,
                });
            }
        };

        self.cache.insert(class_type.clone(), class.clone())?;
        tracing::debug!(
            target: "sable.view",
            class_type = %class_type,
            origin = %class.origin,
            source_type = ?class.source_type,
            "built class"
        );

        // The class is already visible in the cache, so a self-annotated annotation type
        // resolves to itself here.
        if class.is_annotation() {
            for usage in &class.annotations {
                usage.values_with_defaults(self)?;
            }
        }

        Ok(class)
    }
}

impl fmt::Debug for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("View")
            .field("project", &self.project)
            .field("cache", &self.cache)
            .field("fully_resolved", &self.is_fully_resolved())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn view_is_shareable_across_threads() {
        assert_send_sync::<View>();
        assert_send_sync::<ViewTypeHierarchy<'static>>();
    }
}
