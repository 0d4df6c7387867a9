#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use sable_core::{
    BuildContext, BuildError, ClassDef, ClassSource, ClassSourceIter, ClassType,
    IdentifierFactory, InputLocation, LocationError, ModuleInputLocation, ModuleName, SourceType,
};
use tracing_subscriber::fmt::MakeWriter;

/// An in-memory input location that counts how often each class is built.
#[derive(Debug, Default)]
pub struct MemoryLocation {
    name: String,
    source_type: SourceType,
    classes: BTreeMap<String, ClassDef>,
    failing: BTreeSet<String>,
    build_delay: Option<Duration>,
    builds: Arc<Mutex<BTreeMap<String, usize>>>,
    scans: Arc<AtomicUsize>,
}

impl MemoryLocation {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            ..Self::default()
        }
    }

    pub fn with_source_type(mut self, source_type: SourceType) -> Self {
        self.source_type = source_type;
        self
    }

    pub fn with_class(mut self, class: ClassDef) -> Self {
        self.classes.insert(class.class_type.name().to_owned(), class);
        self
    }

    /// A plain class with an optional superclass and interfaces.
    pub fn with(self, name: &str, superclass: Option<&str>, interfaces: &[&str]) -> Self {
        self.with_class(class(name, superclass, interfaces))
    }

    /// Present for lookup, but building it fails.
    pub fn with_broken(mut self, name: &str) -> Self {
        self.classes
            .insert(name.to_owned(), ClassDef::new(ClassType::new(name), 0));
        self.failing.insert(name.to_owned());
        self
    }

    pub fn with_build_delay(mut self, delay: Duration) -> Self {
        self.build_delay = Some(delay);
        self
    }

    pub fn counters(&self) -> Counters {
        Counters {
            builds: self.builds.clone(),
            scans: self.scans.clone(),
        }
    }

    fn source_for(&self, class_type: ClassType) -> Option<ClassSource> {
        let template = self.classes.get(class_type.name())?.clone();
        let failing = self.failing.contains(class_type.name());
        let delay = self.build_delay;
        let builds = self.builds.clone();
        let origin = format!("{}:{}", self.name, class_type.name());

        Some(ClassSource::new(
            class_type,
            origin.clone(),
            self.source_type,
            move |located: &ClassType, ctx: &BuildContext<'_>| {
                if let Some(delay) = delay {
                    std::thread::sleep(delay);
                }
                *builds.lock().entry(located.name().to_owned()).or_default() += 1;
                if failing {
                    return Err(BuildError::Malformed {
                        origin,
                        message: "truncated".into(),
                    });
                }
                let mut class = template;
                for method in &mut class.methods {
                    if let Some(body) = method.body.as_mut() {
                        ctx.intercept(located, &method.name, body);
                    }
                }
                Ok(class)
            },
        ))
    }
}

impl InputLocation for MemoryLocation {
    fn class_source(
        &self,
        class_type: &ClassType,
        _identifiers: &IdentifierFactory,
    ) -> Result<Option<ClassSource>, LocationError> {
        Ok(self.source_for(class_type.clone()))
    }

    fn class_sources(
        &self,
        identifiers: &IdentifierFactory,
    ) -> Result<ClassSourceIter<'_>, LocationError> {
        self.scans.fetch_add(1, Ordering::SeqCst);
        let identifiers = *identifiers;
        Ok(Box::new(self.classes.keys().filter_map(move |name| {
            self.source_for(identifiers.class_type(name)).map(Ok)
        })))
    }

    fn source_type(&self) -> SourceType {
        self.source_type
    }

    fn describe(&self) -> String {
        format!("memory:{}", self.name)
    }
}

/// A location that claims to be module-organised; used for project validation.
#[derive(Debug, Default)]
pub struct MemoryModuleLocation {
    pub modules: BTreeSet<String>,
}

impl InputLocation for MemoryModuleLocation {
    fn class_source(
        &self,
        _class_type: &ClassType,
        _identifiers: &IdentifierFactory,
    ) -> Result<Option<ClassSource>, LocationError> {
        Ok(None)
    }

    fn class_sources(
        &self,
        _identifiers: &IdentifierFactory,
    ) -> Result<ClassSourceIter<'_>, LocationError> {
        Ok(Box::new(std::iter::empty()))
    }

    fn describe(&self) -> String {
        "memory-modules".into()
    }

    fn as_module_location(&self) -> Option<&dyn ModuleInputLocation> {
        Some(self)
    }
}

impl ModuleInputLocation for MemoryModuleLocation {
    fn discover_modules(&self) -> Result<BTreeSet<ModuleName>, LocationError> {
        Ok(self.modules.iter().map(ModuleName::new).collect())
    }
}

/// A module location that leaves `as_module_location` at its default.
#[derive(Debug, Default)]
pub struct UnflaggedModuleLocation;

impl InputLocation for UnflaggedModuleLocation {
    fn class_source(
        &self,
        _class_type: &ClassType,
        _identifiers: &IdentifierFactory,
    ) -> Result<Option<ClassSource>, LocationError> {
        Ok(None)
    }

    fn class_sources(
        &self,
        _identifiers: &IdentifierFactory,
    ) -> Result<ClassSourceIter<'_>, LocationError> {
        Ok(Box::new(std::iter::empty()))
    }

    fn describe(&self) -> String {
        "unflagged-modules".into()
    }
}

impl ModuleInputLocation for UnflaggedModuleLocation {
    fn discover_modules(&self) -> Result<BTreeSet<ModuleName>, LocationError> {
        Ok(BTreeSet::from([ModuleName::new("java.base")]))
    }
}

#[derive(Debug, Clone)]
pub struct Counters {
    builds: Arc<Mutex<BTreeMap<String, usize>>>,
    scans: Arc<AtomicUsize>,
}

impl Counters {
    pub fn builds_of(&self, name: &str) -> usize {
        self.builds.lock().get(name).copied().unwrap_or(0)
    }

    pub fn total_builds(&self) -> usize {
        self.builds.lock().values().sum()
    }

    pub fn scans(&self) -> usize {
        self.scans.load(Ordering::SeqCst)
    }
}

pub fn class(name: &str, superclass: Option<&str>, interfaces: &[&str]) -> ClassDef {
    let mut class = ClassDef::new(ClassType::new(name), sable_core::model::ACC_PUBLIC);
    class.superclass = superclass.map(ClassType::new);
    class.interfaces = interfaces.iter().map(ClassType::new).collect();
    class
}

pub fn interface(name: &str, superinterfaces: &[&str]) -> ClassDef {
    let mut class = ClassDef::new(
        ClassType::new(name),
        sable_core::model::ACC_PUBLIC | sable_core::model::ACC_INTERFACE | sable_core::model::ACC_ABSTRACT,
    );
    class.superclass = Some(ClassType::new("java.lang.Object"));
    class.interfaces = superinterfaces.iter().map(ClassType::new).collect();
    class
}

/// Collects formatted log output for assertions.
#[derive(Debug, Clone, Default)]
pub struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    pub fn as_string(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }
}

pub struct LogBufferWriter(Arc<Mutex<Vec<u8>>>);

impl io::Write for LogBufferWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogBuffer {
    type Writer = LogBufferWriter;

    fn make_writer(&'a self) -> Self::Writer {
        LogBufferWriter(self.0.clone())
    }
}

/// Run `f` with `sable` events at `level` and above written to the returned buffer.
pub fn capture_logs<T>(level: &str, f: impl FnOnce() -> T) -> (T, String) {
    let logs = LogBuffer::default();
    let subscriber = tracing_subscriber::fmt()
        .with_ansi(false)
        .without_time()
        .with_env_filter(tracing_subscriber::EnvFilter::new(format!("sable={level}")))
        .with_writer(logs.clone())
        .finish();
    let out = tracing::subscriber::with_default(subscriber, f);
    (out, logs.as_string())
}
