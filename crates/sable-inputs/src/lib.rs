//! Concrete input locations and class frontends.
//!
//! Locations find stored classes and hand back deferred [`sable_core::ClassSource`]s; nothing
//! is parsed until a view builds the source. Three backing stores are supported: class
//! directories ([`ClassDirLocation`]), zip archives ([`ArchiveLocation`]) and module
//! filesystems ([`ModuleLocation`]). Each pairs with a [`Frontend`] that turns stored bytes
//! into a class model: [`BytecodeFrontend`] for `.class` files, [`TextIrFrontend`] for the
//! `.jimple` text form.

mod archive;
mod bytecode;
mod class_dir;
mod discovery;
mod frontend;
mod module_fs;
mod text_ir;

pub use archive::{ArchiveLocation, SharedArchive};
pub use bytecode::BytecodeFrontend;
pub use class_dir::ClassDirLocation;
pub use discovery::{coerce_to_jdk_root, discover_jdk_root};
pub use frontend::{ByteSource, Frontend, FrontendLoader};
pub use module_fs::{ModuleFs, ModuleLocation};
pub use text_ir::{parse_class, TextIrError, TextIrFrontend};
