//! Supertype and subtype queries over the classes resolvable through a [`View`].
//!
//! All identifiers returned here are unqualified: module qualifiers are stripped before
//! comparison, since superclass and interface references in class data never carry one.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::sync::Arc;

use once_cell::sync::OnceCell;
use parking_lot::Mutex;

use crate::error::HierarchyError;
use crate::ids::ClassType;
use crate::model::ClassDef;
use crate::view::View;

#[derive(Debug, Default)]
struct Ancestors {
    /// Superclass chain, nearest first.
    superclasses: Vec<ClassType>,
    interfaces: BTreeSet<ClassType>,
}

impl Ancestors {
    fn contains(&self, class_type: &ClassType) -> bool {
        self.interfaces.contains(class_type) || self.superclasses.contains(class_type)
    }
}

pub struct ViewTypeHierarchy<'v> {
    view: &'v View,
    ancestors: Mutex<HashMap<ClassType, Arc<Ancestors>>>,
    direct_subtypes: OnceCell<HashMap<ClassType, BTreeSet<ClassType>>>,
}

impl<'v> ViewTypeHierarchy<'v> {
    pub fn new(view: &'v View) -> Self {
        Self {
            view,
            ancestors: Mutex::new(HashMap::new()),
            direct_subtypes: OnceCell::new(),
        }
    }

    pub fn view(&self) -> &'v View {
        self.view
    }

    /// The direct superclass, or `None` for a root such as `java.lang.Object`.
    pub fn superclass_of(&self, class_type: &ClassType) -> Result<Option<ClassType>, HierarchyError> {
        let class = self.require(class_type)?;
        Ok(class.superclass.as_ref().map(ClassType::without_module))
    }

    /// Interfaces declared directly on `class_type`.
    pub fn interfaces_of(&self, class_type: &ClassType) -> Result<BTreeSet<ClassType>, HierarchyError> {
        let class = self.require(class_type)?;
        Ok(class.interfaces.iter().map(ClassType::without_module).collect())
    }

    /// Every interface reachable through superclasses and superinterfaces.
    pub fn implemented_interfaces_of(
        &self,
        class_type: &ClassType,
    ) -> Result<BTreeSet<ClassType>, HierarchyError> {
        Ok(self.ancestors(class_type)?.interfaces.clone())
    }

    /// The superclass chain, nearest first. Stops at the first superclass that cannot be
    /// resolved.
    pub fn superclasses_of(&self, class_type: &ClassType) -> Result<Vec<ClassType>, HierarchyError> {
        Ok(self.ancestors(class_type)?.superclasses.clone())
    }

    /// Whether `candidate` is `supertype` or inherits from it.
    pub fn is_subtype(
        &self,
        supertype: &ClassType,
        candidate: &ClassType,
    ) -> Result<bool, HierarchyError> {
        let ancestors = self.ancestors(candidate)?;
        let supertype = supertype.without_module();
        Ok(candidate.name() == supertype.name() || ancestors.contains(&supertype))
    }

    /// Classes that name `class_type` as their superclass or a direct interface.
    ///
    /// Requires a full scan of the view on first use.
    pub fn direct_subtypes_of(
        &self,
        class_type: &ClassType,
    ) -> Result<BTreeSet<ClassType>, HierarchyError> {
        self.require(class_type)?;
        let index = self.subtype_index()?;
        Ok(index
            .get(&class_type.without_module())
            .cloned()
            .unwrap_or_default())
    }

    /// All transitive subtypes, excluding `class_type` itself.
    pub fn subtypes_of(&self, class_type: &ClassType) -> Result<BTreeSet<ClassType>, HierarchyError> {
        self.require(class_type)?;
        let index = self.subtype_index()?;

        let root = class_type.without_module();
        let mut found = BTreeSet::new();
        let mut queue = VecDeque::from([root.clone()]);
        while let Some(next) = queue.pop_front() {
            let Some(direct) = index.get(&next) else {
                continue;
            };
            for subtype in direct {
                if *subtype != root && found.insert(subtype.clone()) {
                    queue.push_back(subtype.clone());
                }
            }
        }
        Ok(found)
    }

    fn require(&self, class_type: &ClassType) -> Result<Arc<ClassDef>, HierarchyError> {
        self.view
            .resolve(class_type)?
            .ok_or_else(|| HierarchyError::UnknownType {
                class_type: class_type.clone(),
            })
    }

    fn ancestors(&self, class_type: &ClassType) -> Result<Arc<Ancestors>, HierarchyError> {
        let mut in_progress = HashSet::new();
        self.ancestors_of(class_type, &mut in_progress)?
            .ok_or_else(|| HierarchyError::UnknownType {
                class_type: class_type.clone(),
            })
    }

    /// `Ok(None)` when `class_type` itself cannot be resolved.
    ///
    /// Memoized per resolved identifier, so `m1/p.X` and `m2/p.X` keep separate entries.
    fn ancestors_of(
        &self,
        class_type: &ClassType,
        in_progress: &mut HashSet<ClassType>,
    ) -> Result<Option<Arc<Ancestors>>, HierarchyError> {
        if let Some(memo) = self.ancestors.lock().get(class_type) {
            return Ok(Some(memo.clone()));
        }

        let Some(class) = self.view.resolve(class_type)? else {
            return Ok(None);
        };
        let key = class.class_type.clone();
        if in_progress.contains(&key) {
            tracing::warn!(target: "sable.hierarchy", class_type = %key, "inheritance cycle");
            return Err(HierarchyError::Cycle {
                class_type: key.without_module(),
            });
        }

        in_progress.insert(key.clone());
        let mut ancestors = Ancestors::default();

        if let Some(superclass) = &class.superclass {
            ancestors.superclasses.push(superclass.without_module());
            if let Some(inherited) = self.inherited(superclass, &key, in_progress)? {
                ancestors
                    .superclasses
                    .extend(inherited.superclasses.iter().cloned());
                ancestors
                    .interfaces
                    .extend(inherited.interfaces.iter().cloned());
            }
        }

        for interface in &class.interfaces {
            ancestors.interfaces.insert(interface.without_module());
            if let Some(inherited) = self.inherited(interface, &key, in_progress)? {
                ancestors
                    .interfaces
                    .extend(inherited.interfaces.iter().cloned());
            }
        }

        in_progress.remove(&key);
        let ancestors = Arc::new(ancestors);
        self.ancestors.lock().insert(key, ancestors.clone());
        Ok(Some(ancestors))
    }

    /// Ancestors of a supertype referenced from `subtype`.
    ///
    /// A reference out of a module-qualified class is looked up in that module first and
    /// falls back to the unqualified name.
    fn inherited(
        &self,
        reference: &ClassType,
        subtype: &ClassType,
        in_progress: &mut HashSet<ClassType>,
    ) -> Result<Option<Arc<Ancestors>>, HierarchyError> {
        if let (Some(module), false) = (subtype.module(), reference.is_module_qualified()) {
            let local = ClassType::with_module(reference.name(), module.clone());
            if let Some(found) = self.ancestors_of(&local, in_progress)? {
                return Ok(Some(found));
            }
        }
        self.ancestors_of(reference, in_progress)
    }

    fn subtype_index(&self) -> Result<&HashMap<ClassType, BTreeSet<ClassType>>, HierarchyError> {
        self.direct_subtypes.get_or_try_init(|| {
            let classes = self.view.resolve_all()?;
            let mut index: HashMap<ClassType, BTreeSet<ClassType>> = HashMap::new();
            for class in &classes {
                let subtype = class.class_type.without_module();
                for supertype in class.supertypes() {
                    index
                        .entry(supertype.without_module())
                        .or_default()
                        .insert(subtype.clone());
                }
            }
            tracing::debug!(
                target: "sable.hierarchy",
                classes = classes.len(),
                supertypes = index.len(),
                "built subtype index"
            );
            Ok(index)
        })
    }
}
