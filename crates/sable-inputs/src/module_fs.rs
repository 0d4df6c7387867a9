//! Module filesystems: read-only stores exposing each platform module as a named subtree.
//!
//! Two on-disk layouts are understood:
//! - an exploded image, `<root>/modules/<module>/a/b/C.class`;
//! - a jmods directory, `<root>/jmods/<module>.jmod` with classes under `classes/`.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use once_cell::sync::OnceCell;
use sable_core::{
    is_descriptor_class, ClassSource, ClassSourceIter, ClassType, IdentifierFactory,
    InputLocation, LocationError, ModuleInputLocation, ModuleName, SourceType,
};

use crate::archive::SharedArchive;
use crate::bytecode::BytecodeFrontend;
use crate::class_dir::walk_classes;
use crate::discovery::discover_jdk_root;
use crate::frontend::{ByteSource, Frontend, FrontendLoader};

const JMOD_CLASSES_PREFIX: &str = "classes/";

static SYSTEM: OnceCell<Arc<ModuleFs>> = OnceCell::new();

#[derive(Debug)]
enum Layout {
    Exploded { modules_dir: PathBuf },
    Jmods { archives: BTreeMap<ModuleName, Arc<SharedArchive>> },
}

#[derive(Debug)]
pub struct ModuleFs {
    root: PathBuf,
    layout: Layout,
}

impl ModuleFs {
    /// Open the module filesystem rooted at `root` (a JDK home or an exploded image).
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, LocationError> {
        let root = root.into();

        let modules_dir = root.join("modules");
        if modules_dir.is_dir() {
            return Ok(Self {
                root,
                layout: Layout::Exploded { modules_dir },
            });
        }

        let jmods_dir = root.join("jmods");
        if jmods_dir.is_dir() {
            let mut archives = BTreeMap::new();
            let entries =
                std::fs::read_dir(&jmods_dir).map_err(|err| LocationError::io(&jmods_dir, err))?;
            for entry in entries {
                let path = entry.map_err(|err| LocationError::io(&jmods_dir, err))?.path();
                if path.extension().is_some_and(|ext| ext == "jmod") && path.is_file() {
                    if let Some(module) = path.file_stem().and_then(|stem| stem.to_str()) {
                        archives.insert(ModuleName::new(module), Arc::new(SharedArchive::new(&path)));
                    }
                }
            }
            tracing::debug!(
                target: "sable.inputs",
                root = %root.display(),
                modules = archives.len(),
                "opened jmods module filesystem"
            );
            return Ok(Self {
                root,
                layout: Layout::Jmods { archives },
            });
        }

        Err(LocationError::NotAModuleFs { path: root })
    }

    /// The process-wide module filesystem of the discovered JDK.
    ///
    /// Opened on first successful call and shared for the rest of the process.
    pub fn system() -> Result<Arc<ModuleFs>, LocationError> {
        SYSTEM
            .get_or_try_init(|| {
                let root = discover_jdk_root().ok_or(LocationError::NoSystemModules)?;
                Ok(Arc::new(Self::open(root)?))
            })
            .cloned()
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Module names in sorted order.
    pub fn modules(&self) -> Result<BTreeSet<ModuleName>, LocationError> {
        match &self.layout {
            Layout::Exploded { modules_dir } => {
                let mut modules = BTreeSet::new();
                let entries = std::fs::read_dir(modules_dir)
                    .map_err(|err| LocationError::io(modules_dir, err))?;
                for entry in entries {
                    let entry = entry.map_err(|err| LocationError::io(modules_dir, err))?;
                    let is_dir = entry
                        .file_type()
                        .map_err(|err| LocationError::io(entry.path(), err))?
                        .is_dir();
                    if let (true, Some(name)) = (is_dir, entry.file_name().to_str()) {
                        modules.insert(ModuleName::new(name));
                    }
                }
                Ok(modules)
            }
            Layout::Jmods { archives } => Ok(archives.keys().cloned().collect()),
        }
    }

    /// The stored file at `relative` inside `module`, if it is a regular file.
    pub fn lookup(
        &self,
        module: &ModuleName,
        relative: &str,
    ) -> Result<Option<ByteSource>, LocationError> {
        match &self.layout {
            Layout::Exploded { modules_dir } => {
                let Some(module_root) = module_dir(modules_dir, module) else {
                    return Ok(None);
                };
                let path = module_root.join(relative);
                Ok(path.is_file().then_some(ByteSource::File(path)))
            }
            Layout::Jmods { archives } => {
                let Some(archive) = archives.get(module) else {
                    return Ok(None);
                };
                let entry = format!("{JMOD_CLASSES_PREFIX}{relative}");
                Ok(archive
                    .contains_file(&entry)?
                    .then(|| ByteSource::ArchiveEntry {
                        archive: archive.clone(),
                        entry,
                    }))
            }
        }
    }

    /// Every stored class of `module` with the given extension.
    pub fn entries(
        &self,
        module: &ModuleName,
        extension: &str,
        identifiers: IdentifierFactory,
    ) -> Result<Vec<(ClassType, ByteSource)>, LocationError> {
        match &self.layout {
            Layout::Exploded { modules_dir } => {
                let Some(module_root) = module_dir(modules_dir, module) else {
                    return Ok(Vec::new());
                };
                walk_classes(&module_root, extension, identifiers, Some(module.clone()))
                    .map(|found| found.map(|(class_type, path)| (class_type, ByteSource::File(path))))
                    .collect()
            }
            Layout::Jmods { archives } => {
                let Some(archive) = archives.get(module) else {
                    return Ok(Vec::new());
                };
                let suffix = format!(".{extension}");
                let mut out = Vec::new();
                for entry in archive.entry_names()? {
                    let Some(stem) = entry
                        .strip_prefix(JMOD_CLASSES_PREFIX)
                        .and_then(|rest| rest.strip_suffix(&suffix))
                    else {
                        continue;
                    };
                    if let Some(class_type) = identifiers.class_type_from_entry(stem, Some(module)) {
                        out.push((
                            class_type,
                            ByteSource::ArchiveEntry {
                                archive: archive.clone(),
                                entry,
                            },
                        ));
                    }
                }
                Ok(out)
            }
        }
    }
}

/// The subtree of `module` in an exploded image. `None` for names that are not a single
/// plain path segment, such as `..` or `a/b`.
fn module_dir(modules_dir: &Path, module: &ModuleName) -> Option<PathBuf> {
    let name = module.as_str();
    if name.contains(['/', '\\']) {
        return None;
    }
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(segment)), None) => Some(modules_dir.join(segment)),
        _ => None,
    }
}

/// An input location backed by a [`ModuleFs`].
#[derive(Debug)]
pub struct ModuleLocation {
    fs: Arc<ModuleFs>,
    frontend: Arc<dyn Frontend>,
    source_type: SourceType,
}

impl ModuleLocation {
    pub fn new(fs: Arc<ModuleFs>) -> Self {
        Self {
            fs,
            frontend: Arc::new(BytecodeFrontend),
            source_type: SourceType::Application,
        }
    }

    pub fn open(root: impl Into<PathBuf>) -> Result<Self, LocationError> {
        Ok(Self::new(Arc::new(ModuleFs::open(root)?)))
    }

    /// The running JDK's platform modules, classified as library code.
    pub fn system() -> Result<Self, LocationError> {
        Ok(Self::new(ModuleFs::system()?).with_source_type(SourceType::Library))
    }

    pub fn with_source_type(mut self, source_type: SourceType) -> Self {
        self.source_type = source_type;
        self
    }

    pub fn with_frontend(mut self, frontend: Arc<dyn Frontend>) -> Self {
        self.frontend = frontend;
        self
    }

    pub fn module_fs(&self) -> &Arc<ModuleFs> {
        &self.fs
    }

    fn source(&self, class_type: ClassType, bytes: ByteSource) -> ClassSource {
        FrontendLoader::new(self.frontend.clone(), bytes).into_source(class_type, self.source_type)
    }
}

impl InputLocation for ModuleLocation {
    fn class_source(
        &self,
        class_type: &ClassType,
        _identifiers: &IdentifierFactory,
    ) -> Result<Option<ClassSource>, LocationError> {
        if is_descriptor_class(class_type.name()) {
            return Ok(None);
        }
        let relative = class_type.to_relative_path(self.frontend.extension());

        if let Some(module) = class_type.module() {
            let found = self.fs.lookup(module, &relative)?;
            return Ok(found.map(|bytes| self.source(class_type.clone(), bytes)));
        }

        for module in self.fs.modules()? {
            if let Some(bytes) = self.fs.lookup(&module, &relative)? {
                tracing::trace!(
                    target: "sable.inputs",
                    class_type = %class_type,
                    module = %module,
                    "found unqualified class in module"
                );
                return Ok(Some(self.source(class_type.clone(), bytes)));
            }
        }
        Ok(None)
    }

    fn class_sources(
        &self,
        identifiers: &IdentifierFactory,
    ) -> Result<ClassSourceIter<'_>, LocationError> {
        let identifiers = *identifiers;
        let extension = self.frontend.extension();
        let modules = self.fs.modules()?;

        Ok(Box::new(modules.into_iter().flat_map(move |module| {
            match self.fs.entries(&module, extension, identifiers) {
                Ok(entries) => entries
                    .into_iter()
                    .map(|(class_type, bytes)| Ok(self.source(class_type, bytes)))
                    .collect::<Vec<_>>(),
                Err(err) => vec![Err(err)],
            }
        })))
    }

    fn source_type(&self) -> SourceType {
        self.source_type
    }

    fn describe(&self) -> String {
        format!("module fs {}", self.fs.root().display())
    }

    fn as_module_location(&self) -> Option<&dyn ModuleInputLocation> {
        Some(self)
    }
}

impl ModuleInputLocation for ModuleLocation {
    fn discover_modules(&self) -> Result<BTreeSet<ModuleName>, LocationError> {
        self.fs.modules()
    }
}
