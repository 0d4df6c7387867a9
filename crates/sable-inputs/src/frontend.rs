use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use sable_core::{
    BuildContext, BuildError, ClassDef, ClassSource, ClassType, SourceLoader, SourceType,
};

use crate::archive::SharedArchive;

/// Turns the bytes of one stored class into a [`ClassDef`].
pub trait Frontend: Send + Sync + fmt::Debug {
    /// File extension of the stored classes, without the dot.
    fn extension(&self) -> &'static str;

    fn build(
        &self,
        class_type: &ClassType,
        bytes: &[u8],
        origin: &str,
        ctx: &BuildContext<'_>,
    ) -> Result<ClassDef, BuildError>;
}

/// Where the bytes of a located class live. Nothing is read until the class is built.
#[derive(Debug, Clone)]
pub enum ByteSource {
    File(PathBuf),
    ArchiveEntry {
        archive: Arc<SharedArchive>,
        entry: String,
    },
}

impl ByteSource {
    pub fn origin(&self) -> String {
        match self {
            ByteSource::File(path) => path.display().to_string(),
            ByteSource::ArchiveEntry { archive, entry } => {
                format!("{}!/{entry}", archive.path().display())
            }
        }
    }

    pub fn read(&self) -> Result<Vec<u8>, BuildError> {
        match self {
            ByteSource::File(path) => std::fs::read(path).map_err(|source| BuildError::Io {
                origin: path.display().to_string(),
                source,
            }),
            ByteSource::ArchiveEntry { archive, entry } => match archive.read_entry(entry)? {
                Some(bytes) => Ok(bytes),
                None => Err(BuildError::Io {
                    origin: self.origin(),
                    source: std::io::Error::new(
                        std::io::ErrorKind::NotFound,
                        "archive entry disappeared",
                    ),
                }),
            },
        }
    }
}

/// The deferred build step shared by every location in this crate.
#[derive(Debug)]
pub struct FrontendLoader {
    frontend: Arc<dyn Frontend>,
    bytes: ByteSource,
    origin: String,
}

impl FrontendLoader {
    pub fn new(frontend: Arc<dyn Frontend>, bytes: ByteSource) -> Self {
        let origin = bytes.origin();
        Self {
            frontend,
            bytes,
            origin,
        }
    }

    /// Wrap into a [`ClassSource`] for `class_type`.
    pub fn into_source(self, class_type: ClassType, source_type: SourceType) -> ClassSource {
        let origin = self.origin.clone();
        ClassSource::new(class_type, origin, source_type, self)
    }
}

impl SourceLoader for FrontendLoader {
    fn load(
        self: Box<Self>,
        class_type: &ClassType,
        ctx: &BuildContext<'_>,
    ) -> Result<ClassDef, BuildError> {
        let bytes = self.bytes.read()?;
        tracing::trace!(
            target: "sable.inputs",
            class_type = %class_type,
            origin = %self.origin,
            len = bytes.len(),
            "read class bytes"
        );
        self.frontend.build(class_type, &bytes, &self.origin, ctx)
    }
}
