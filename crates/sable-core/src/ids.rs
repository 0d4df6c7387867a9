//! Class and module identifiers.
//!
//! [`ClassType`] is the key every other component uses for lookup and caching. Values are
//! immutable and compare by value; cloning only bumps reference counts.

use std::cmp::Ordering;
use std::fmt;
use std::path::{Component, Path};
use std::sync::Arc;

pub const JAVA_BASE: &str = "java.base";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleName(Arc<str>);

impl ModuleName {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_java_base(&self) -> bool {
        &*self.0 == JAVA_BASE
    }
}

impl fmt::Display for ModuleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A class identifier: the binary name (`java.util.Map$Entry`) plus an optional module.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ClassType {
    name: Arc<str>,
    module: Option<ModuleName>,
}

impl ClassType {
    /// Construct from an already normalized dotted binary name.
    ///
    /// Most callers should go through [`IdentifierFactory`], which also accepts internal
    /// names and descriptors.
    pub fn new(name: impl AsRef<str>) -> Self {
        Self {
            name: Arc::from(name.as_ref()),
            module: None,
        }
    }

    pub fn with_module(name: impl AsRef<str>, module: ModuleName) -> Self {
        Self {
            name: Arc::from(name.as_ref()),
            module: Some(module),
        }
    }

    /// Fully qualified dotted name, without the module qualifier.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn module(&self) -> Option<&ModuleName> {
        self.module.as_ref()
    }

    pub fn is_module_qualified(&self) -> bool {
        self.module.is_some()
    }

    /// The same class without its module qualifier.
    pub fn without_module(&self) -> ClassType {
        Self {
            name: self.name.clone(),
            module: None,
        }
    }

    /// Dotted package name; empty for the default package.
    pub fn package_name(&self) -> &str {
        match self.name.rsplit_once('.') {
            Some((pkg, _)) => pkg,
            None => "",
        }
    }

    pub fn simple_name(&self) -> &str {
        match self.name.rsplit_once('.') {
            Some((_, simple)) => simple,
            None => &self.name,
        }
    }

    /// Internal (slash separated) form, e.g. `java/lang/String`.
    pub fn internal_name(&self) -> String {
        self.name.replace('.', "/")
    }

    /// Relative path of the backing file for a store whose files use `extension`.
    ///
    /// The module qualifier is not part of the path; module-aware stores root it
    /// themselves.
    pub fn to_relative_path(&self, extension: &str) -> String {
        let mut path = self.internal_name();
        path.push('.');
        path.push_str(extension);
        path
    }
}

impl fmt::Debug for ClassType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClassType({self})")
    }
}

impl fmt::Display for ClassType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.module {
            Some(module) => write!(f, "{module}/{}", self.name),
            None => f.write_str(&self.name),
        }
    }
}

impl PartialOrd for ClassType {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ClassType {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name
            .cmp(&other.name)
            .then_with(|| self.module.cmp(&other.module))
    }
}

/// Builds [`ClassType`]s consistently for one project.
///
/// A plain factory never attaches module qualifiers; a module-aware factory keeps them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IdentifierFactory {
    module_aware: bool,
}

impl IdentifierFactory {
    pub fn plain() -> Self {
        Self {
            module_aware: false,
        }
    }

    pub fn module_aware() -> Self {
        Self { module_aware: true }
    }

    pub fn is_module_aware(&self) -> bool {
        self.module_aware
    }

    /// Accepts binary (`a.b.C`), internal (`a/b/C`) and descriptor (`La/b/C;`) forms, with an
    /// optional trailing `.class`.
    pub fn class_type(&self, name: &str) -> ClassType {
        ClassType::new(normalize_class_name(name))
    }

    pub fn class_type_in_module(&self, name: &str, module: &str) -> ClassType {
        if self.module_aware {
            ClassType::with_module(normalize_class_name(name), ModuleName::new(module))
        } else {
            self.class_type(name)
        }
    }

    pub fn module_name(&self, name: &str) -> ModuleName {
        ModuleName::new(name.trim())
    }

    /// Derive a class identifier from a path relative to a store root.
    ///
    /// Returns `None` when the path does not carry `extension` or names a module/package
    /// descriptor rather than a class.
    pub fn class_type_from_path(
        &self,
        relative: &Path,
        extension: &str,
        module: Option<&ModuleName>,
    ) -> Option<ClassType> {
        if relative.extension()? != extension {
            return None;
        }
        let stem = relative.with_extension("");

        let mut name = String::new();
        for component in stem.components() {
            let Component::Normal(segment) = component else {
                continue;
            };
            if !name.is_empty() {
                name.push('.');
            }
            name.push_str(segment.to_str()?);
        }
        self.class_type_from_entry(&name, module)
    }

    /// Like [`Self::class_type_from_path`] but for archive entry names with the extension
    /// already stripped (`a/b/C`).
    pub fn class_type_from_entry(&self, entry: &str, module: Option<&ModuleName>) -> Option<ClassType> {
        let name = normalize_class_name(entry);
        if name.is_empty() || is_descriptor_class(&name) {
            return None;
        }

        Some(match module {
            Some(module) if self.module_aware => ClassType::with_module(name, module.clone()),
            _ => ClassType::new(name),
        })
    }
}

/// `module-info` and `package-info` are stored like classes but never resolve as one.
pub fn is_descriptor_class(binary_name: &str) -> bool {
    let simple = binary_name.rsplit('.').next().unwrap_or(binary_name);
    simple == "module-info" || simple == "package-info"
}

fn normalize_class_name(name: &str) -> String {
    let name = name.trim();
    let name = name.strip_suffix(".class").unwrap_or(name);
    let name = name
        .strip_prefix('L')
        .and_then(|rest| rest.strip_suffix(';'))
        .unwrap_or(name);
    let name = name.strip_prefix('/').unwrap_or(name);
    name.replace('/', ".")
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn factory_normalizes_internal_and_descriptor_forms() {
        let ids = IdentifierFactory::plain();
        let expected = ClassType::new("java.lang.String");
        assert_eq!(ids.class_type("java.lang.String"), expected);
        assert_eq!(ids.class_type("java/lang/String"), expected);
        assert_eq!(ids.class_type("Ljava/lang/String;"), expected);
        assert_eq!(ids.class_type("java/lang/String.class"), expected);
    }

    #[test]
    fn package_and_simple_names() {
        let ty = ClassType::new("java.util.Map$Entry");
        assert_eq!(ty.package_name(), "java.util");
        assert_eq!(ty.simple_name(), "Map$Entry");

        let default_pkg = ClassType::new("Main");
        assert_eq!(default_pkg.package_name(), "");
        assert_eq!(default_pkg.simple_name(), "Main");
    }

    #[test]
    fn relative_path_uses_extension() {
        let ty = ClassType::new("a.b.C");
        assert_eq!(ty.to_relative_path("class"), "a/b/C.class");
        assert_eq!(ty.to_relative_path("jimple"), "a/b/C.jimple");
    }

    #[test]
    fn plain_factory_drops_module_qualifier() {
        let ty = IdentifierFactory::plain().class_type_in_module("java.lang.String", JAVA_BASE);
        assert!(!ty.is_module_qualified());

        let ty =
            IdentifierFactory::module_aware().class_type_in_module("java.lang.String", JAVA_BASE);
        assert_eq!(ty.module().map(ModuleName::as_str), Some(JAVA_BASE));
        assert_eq!(ty.to_string(), "java.base/java.lang.String");
        assert_ne!(ty, ty.without_module());
    }

    #[test]
    fn class_type_from_path_skips_descriptors_and_foreign_extensions() {
        let ids = IdentifierFactory::plain();
        assert_eq!(
            ids.class_type_from_path(&PathBuf::from("a/b/C.class"), "class", None),
            Some(ClassType::new("a.b.C"))
        );
        assert_eq!(
            ids.class_type_from_path(&PathBuf::from("a/b/C.txt"), "class", None),
            None
        );
        assert_eq!(
            ids.class_type_from_path(&PathBuf::from("a/b/package-info.class"), "class", None),
            None
        );
        assert_eq!(
            ids.class_type_from_path(&PathBuf::from("module-info.class"), "class", None),
            None
        );
    }
}
