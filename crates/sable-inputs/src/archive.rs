//! Zip-based stores: jars, and the per-module archives of a jmods directory.

use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use sable_core::{
    is_descriptor_class, ClassSource, ClassSourceIter, ClassType, IdentifierFactory,
    InputLocation, LocationError, SourceType,
};
use zip::result::ZipError;
use zip::ZipArchive;

use crate::bytecode::BytecodeFrontend;
use crate::frontend::{ByteSource, Frontend, FrontendLoader};

/// A zip archive opened on first use and shared by every source that reads from it.
pub struct SharedArchive {
    path: PathBuf,
    archive: OnceCell<Mutex<ZipArchive<File>>>,
}

impl SharedArchive {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            archive: OnceCell::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn with_archive<R>(
        &self,
        f: impl FnOnce(&mut ZipArchive<File>) -> Result<R, ZipError>,
    ) -> Result<R, LocationError> {
        let archive = self.archive.get_or_try_init(|| {
            let file = File::open(&self.path).map_err(|err| LocationError::io(&self.path, err))?;
            let archive = ZipArchive::new(file).map_err(|err| self.zip_error(err))?;
            tracing::debug!(
                target: "sable.inputs",
                path = %self.path.display(),
                entries = archive.len(),
                "opened archive"
            );
            Ok::<_, LocationError>(Mutex::new(archive))
        })?;
        f(&mut archive.lock()).map_err(|err| self.zip_error(err))
    }

    /// Whether `entry` exists and is a regular file.
    pub fn contains_file(&self, entry: &str) -> Result<bool, LocationError> {
        self.with_archive(|archive| match archive.by_name(entry) {
            Ok(file) => Ok(file.is_file()),
            Err(ZipError::FileNotFound) => Ok(false),
            Err(err) => Err(err),
        })
    }

    pub fn read_entry(&self, entry: &str) -> Result<Option<Vec<u8>>, LocationError> {
        self.with_archive(|archive| match archive.by_name(entry) {
            Ok(mut file) => {
                let mut bytes = Vec::with_capacity(file.size() as usize);
                file.read_to_end(&mut bytes)?;
                Ok(Some(bytes))
            }
            Err(ZipError::FileNotFound) => Ok(None),
            Err(err) => Err(err),
        })
    }

    /// All entry names, sorted.
    pub fn entry_names(&self) -> Result<Vec<String>, LocationError> {
        let mut names = self.with_archive(|archive| {
            Ok(archive.file_names().map(str::to_owned).collect::<Vec<_>>())
        })?;
        names.sort();
        Ok(names)
    }

    fn zip_error(&self, err: ZipError) -> LocationError {
        match err {
            ZipError::Io(source) => LocationError::io(&self.path, source),
            other => LocationError::Archive {
                path: self.path.clone(),
                message: other.to_string(),
            },
        }
    }
}

impl fmt::Debug for SharedArchive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedArchive")
            .field("path", &self.path)
            .field("open", &self.archive.get().is_some())
            .finish()
    }
}

/// A jar (or any zip) of classes laid out by package.
#[derive(Debug)]
pub struct ArchiveLocation {
    archive: Arc<SharedArchive>,
    frontend: Arc<dyn Frontend>,
    source_type: SourceType,
}

impl ArchiveLocation {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_frontend(path, Arc::new(BytecodeFrontend))
    }

    pub fn with_frontend(path: impl Into<PathBuf>, frontend: Arc<dyn Frontend>) -> Self {
        Self {
            archive: Arc::new(SharedArchive::new(path)),
            frontend,
            source_type: SourceType::Application,
        }
    }

    pub fn with_source_type(mut self, source_type: SourceType) -> Self {
        self.source_type = source_type;
        self
    }

    pub fn path(&self) -> &Path {
        self.archive.path()
    }

    fn source(&self, class_type: ClassType, entry: String) -> ClassSource {
        let bytes = ByteSource::ArchiveEntry {
            archive: self.archive.clone(),
            entry,
        };
        FrontendLoader::new(self.frontend.clone(), bytes).into_source(class_type, self.source_type)
    }
}

impl InputLocation for ArchiveLocation {
    fn class_source(
        &self,
        class_type: &ClassType,
        _identifiers: &IdentifierFactory,
    ) -> Result<Option<ClassSource>, LocationError> {
        if class_type.is_module_qualified() || is_descriptor_class(class_type.name()) {
            return Ok(None);
        }
        let entry = class_type.to_relative_path(self.frontend.extension());
        if !self.archive.contains_file(&entry)? {
            return Ok(None);
        }
        Ok(Some(self.source(class_type.clone(), entry)))
    }

    fn class_sources(
        &self,
        identifiers: &IdentifierFactory,
    ) -> Result<ClassSourceIter<'_>, LocationError> {
        let suffix = format!(".{}", self.frontend.extension());
        let identifiers = *identifiers;
        let names = self.archive.entry_names()?;

        Ok(Box::new(names.into_iter().filter_map(move |entry| {
            if entry.starts_with("META-INF/") {
                return None;
            }
            let stem = entry.strip_suffix(&suffix)?;
            let class_type = identifiers.class_type_from_entry(stem, None)?;
            Some(Ok(self.source(class_type, entry)))
        })))
    }

    fn source_type(&self) -> SourceType {
        self.source_type
    }

    fn describe(&self) -> String {
        format!("archive {}", self.archive.path().display())
    }
}
