use std::path::{Path, PathBuf};
use std::sync::Arc;

use sable_core::{
    is_descriptor_class, ClassSource, ClassSourceIter, ClassType, IdentifierFactory,
    InputLocation, LocationError, SourceType,
};

use crate::bytecode::BytecodeFrontend;
use crate::frontend::{ByteSource, Frontend, FrontendLoader};
use crate::text_ir::TextIrFrontend;

/// A directory tree of stored classes laid out by package (`a/b/C.class`).
#[derive(Debug)]
pub struct ClassDirLocation {
    root: PathBuf,
    frontend: Arc<dyn Frontend>,
    source_type: SourceType,
}

impl ClassDirLocation {
    /// A directory of `.class` files.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_frontend(root, Arc::new(BytecodeFrontend))
    }

    /// A directory of `.jimple` files.
    pub fn text_ir(root: impl Into<PathBuf>) -> Self {
        Self::with_frontend(root, Arc::new(TextIrFrontend))
    }

    pub fn with_frontend(root: impl Into<PathBuf>, frontend: Arc<dyn Frontend>) -> Self {
        Self {
            root: root.into(),
            frontend,
            source_type: SourceType::Application,
        }
    }

    pub fn with_source_type(mut self, source_type: SourceType) -> Self {
        self.source_type = source_type;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn source(&self, class_type: ClassType, path: PathBuf) -> ClassSource {
        FrontendLoader::new(self.frontend.clone(), ByteSource::File(path))
            .into_source(class_type, self.source_type)
    }
}

impl InputLocation for ClassDirLocation {
    fn class_source(
        &self,
        class_type: &ClassType,
        _identifiers: &IdentifierFactory,
    ) -> Result<Option<ClassSource>, LocationError> {
        // A plain directory belongs to no named module.
        if class_type.is_module_qualified() || is_descriptor_class(class_type.name()) {
            return Ok(None);
        }
        let path = self
            .root
            .join(class_type.to_relative_path(self.frontend.extension()));
        if !path.is_file() {
            tracing::trace!(target: "sable.inputs", path = %path.display(), "no such class file");
            return Ok(None);
        }
        Ok(Some(self.source(class_type.clone(), path)))
    }

    fn class_sources(
        &self,
        identifiers: &IdentifierFactory,
    ) -> Result<ClassSourceIter<'_>, LocationError> {
        Ok(Box::new(walk_classes(
            &self.root,
            self.frontend.extension(),
            *identifiers,
            None,
        )
        .map(move |found| found.map(|(class_type, path)| self.source(class_type, path)))))
    }

    fn source_type(&self) -> SourceType {
        self.source_type
    }

    fn describe(&self) -> String {
        format!("class dir {}", self.root.display())
    }
}

/// Walk `root` in file-name order, yielding each stored class and its path.
///
/// Traversal errors (including a missing root) are yielded, not skipped.
pub(crate) fn walk_classes<'a>(
    root: &'a Path,
    extension: &'a str,
    identifiers: IdentifierFactory,
    module: Option<sable_core::ModuleName>,
) -> impl Iterator<Item = Result<(ClassType, PathBuf), LocationError>> + 'a {
    walkdir::WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(move |entry| {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    let path = err.path().unwrap_or(root).to_path_buf();
                    return Some(Err(LocationError::io(path, err.into())));
                }
            };
            if !entry.file_type().is_file() {
                return None;
            }
            let relative = entry.path().strip_prefix(root).ok()?;
            let class_type =
                identifiers.class_type_from_path(relative, extension, module.as_ref())?;
            Some(Ok((class_type, entry.into_path())))
        })
}
