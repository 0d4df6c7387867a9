//! Built class representations.
//!
//! A [`ClassDef`] is immutable once built and shared as `Arc<ClassDef>` between the cache
//! and every caller.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

use crate::error::ResolveError;
use crate::ids::ClassType;
use crate::view::View;

pub const ACC_PUBLIC: u16 = 0x0001;
pub const ACC_PRIVATE: u16 = 0x0002;
pub const ACC_PROTECTED: u16 = 0x0004;
pub const ACC_STATIC: u16 = 0x0008;
pub const ACC_FINAL: u16 = 0x0010;
pub const ACC_INTERFACE: u16 = 0x0200;
pub const ACC_ABSTRACT: u16 = 0x0400;
pub const ACC_ANNOTATION: u16 = 0x2000;
pub const ACC_ENUM: u16 = 0x4000;

/// Whether a class belongs to the analysed program, a library, or is only known by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    #[default]
    Application,
    Library,
    Phantom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassKind {
    Class,
    Interface,
    Enum,
    Annotation,
}

impl ClassKind {
    pub fn from_access_flags(flags: u16) -> Self {
        if flags & ACC_ANNOTATION != 0 {
            ClassKind::Annotation
        } else if flags & ACC_INTERFACE != 0 {
            ClassKind::Interface
        } else if flags & ACC_ENUM != 0 {
            ClassKind::Enum
        } else {
            ClassKind::Class
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClassDef {
    pub class_type: ClassType,
    pub access_flags: u16,
    pub kind: ClassKind,
    pub superclass: Option<ClassType>,
    pub interfaces: BTreeSet<ClassType>,
    pub fields: Vec<FieldDef>,
    pub methods: Vec<MethodDef>,
    pub annotations: Vec<AnnotationUsage>,
    pub source_type: SourceType,
    /// Where the class was loaded from (file path or `archive!/entry`).
    pub origin: String,
}

impl ClassDef {
    /// A bare class with no members; frontends fill in the rest.
    pub fn new(class_type: ClassType, access_flags: u16) -> Self {
        Self {
            class_type,
            access_flags,
            kind: ClassKind::from_access_flags(access_flags),
            superclass: None,
            interfaces: BTreeSet::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            annotations: Vec::new(),
            source_type: SourceType::default(),
            origin: String::new(),
        }
    }

    pub fn is_annotation(&self) -> bool {
        self.kind == ClassKind::Annotation
    }

    pub fn is_interface(&self) -> bool {
        matches!(self.kind, ClassKind::Interface | ClassKind::Annotation)
    }

    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// First method with the given name; overloads are not distinguished.
    pub fn method(&self, name: &str) -> Option<&MethodDef> {
        self.methods.iter().find(|m| m.name == name)
    }

    /// Direct supertypes: the superclass (if any) followed by the declared interfaces.
    pub fn supertypes(&self) -> impl Iterator<Item = &ClassType> {
        self.superclass.iter().chain(self.interfaces.iter())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    pub name: String,
    /// Field descriptor (`Ljava/lang/String;`) or, for text IR, the declared type.
    pub descriptor: String,
    pub access_flags: u16,
    pub annotations: Vec<AnnotationValue>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodDef {
    pub name: String,
    /// Method descriptor (`(I)V`) or, for text IR, `(params)return` in source notation.
    pub descriptor: String,
    pub access_flags: u16,
    pub annotations: Vec<AnnotationValue>,
    pub body: Option<Body>,
    /// `AnnotationDefault` of an annotation element.
    pub default_value: Option<ElementValue>,
}

impl MethodDef {
    pub fn is_static(&self) -> bool {
        self.access_flags & ACC_STATIC != 0
    }

    pub fn is_abstract(&self) -> bool {
        self.access_flags & ACC_ABSTRACT != 0
    }
}

/// An executable body as produced by a frontend. The contents are opaque to resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    Bytecode {
        max_stack: u16,
        max_locals: u16,
        code: Arc<[u8]>,
    },
    Statements(Vec<String>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConstValue {
    Byte(i8),
    Char(char),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Boolean(bool),
    String(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ElementValue {
    Const(ConstValue),
    Enum {
        enum_type: ClassType,
        const_name: String,
    },
    /// A class literal, kept as its field descriptor (`Ljava/lang/String;`, `I`, `[J`).
    Class(String),
    Annotation(Box<AnnotationValue>),
    Array(Vec<ElementValue>),
}

/// A nested or member-level annotation: its type and explicitly written elements.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationValue {
    pub annotation_type: ClassType,
    pub elements: BTreeMap<String, ElementValue>,
}

/// An annotation applied to a class.
///
/// The element map including defaults is computed once, on first request, by resolving the
/// annotation type through a [`View`].
#[derive(Debug, Clone)]
pub struct AnnotationUsage {
    value: AnnotationValue,
    with_defaults: OnceCell<BTreeMap<String, ElementValue>>,
}

impl AnnotationUsage {
    pub fn new(value: AnnotationValue) -> Self {
        Self {
            value,
            with_defaults: OnceCell::new(),
        }
    }

    pub fn annotation_type(&self) -> &ClassType {
        &self.value.annotation_type
    }

    /// Only the elements written at the use site.
    pub fn values(&self) -> &BTreeMap<String, ElementValue> {
        &self.value.elements
    }

    pub fn defaults_materialized(&self) -> bool {
        self.with_defaults.get().is_some()
    }

    /// Use-site elements merged over the annotation type's declared defaults.
    ///
    /// If the annotation type cannot be resolved, only the explicit elements are returned.
    pub fn values_with_defaults(
        &self,
        view: &View,
    ) -> Result<&BTreeMap<String, ElementValue>, ResolveError> {
        self.with_defaults.get_or_try_init(|| {
            let mut merged = BTreeMap::new();
            if let Some(declaring) = view.resolve(&self.value.annotation_type)? {
                for method in &declaring.methods {
                    if let Some(default) = &method.default_value {
                        merged.insert(method.name.clone(), default.clone());
                    }
                }
            }
            for (name, value) in &self.value.elements {
                merged.insert(name.clone(), value.clone());
            }
            Ok(merged)
        })
    }
}

impl PartialEq for AnnotationUsage {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}
