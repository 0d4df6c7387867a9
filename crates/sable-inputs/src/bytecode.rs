//! The class-file frontend.

use std::collections::BTreeMap;
use std::sync::Arc;

use sable_classfile as classfile;
use sable_core::{
    AnnotationUsage, AnnotationValue, Body, BuildContext, BuildError, ClassDef, ClassType,
    ConstValue, ElementValue, FieldDef, IdentifierFactory, MethodDef,
};

use crate::frontend::Frontend;

#[derive(Debug, Clone, Copy, Default)]
pub struct BytecodeFrontend;

impl Frontend for BytecodeFrontend {
    fn extension(&self) -> &'static str {
        "class"
    }

    fn build(
        &self,
        class_type: &ClassType,
        bytes: &[u8],
        origin: &str,
        ctx: &BuildContext<'_>,
    ) -> Result<ClassDef, BuildError> {
        let malformed = |err: classfile::Error| BuildError::Malformed {
            origin: origin.to_string(),
            message: err.to_string(),
        };
        let ids = ctx.identifiers;

        let cf = classfile::ClassFile::parse(bytes).map_err(malformed)?;
        let mut class = ClassDef::new(ids.class_type(&cf.this_class), cf.access_flags);
        class.superclass = cf.super_class.as_deref().map(|name| ids.class_type(name));
        class.interfaces = cf
            .interfaces
            .iter()
            .map(|name| ids.class_type(name))
            .collect();

        for field in &cf.fields {
            classfile::parse_field_descriptor(&field.descriptor).map_err(malformed)?;
            class.fields.push(FieldDef {
                name: field.name.clone(),
                descriptor: field.descriptor.clone(),
                access_flags: field.access_flags,
                annotations: convert_annotations(field.annotations(), ids),
            });
        }

        for method in &cf.methods {
            classfile::parse_method_descriptor(&method.descriptor).map_err(malformed)?;
            let mut body = method.code.as_ref().map(|code| Body::Bytecode {
                max_stack: code.max_stack,
                max_locals: code.max_locals,
                code: Arc::from(code.code.as_slice()),
            });
            if let Some(body) = body.as_mut() {
                ctx.intercept(class_type, &method.name, body);
            }
            let default_value = method
                .annotation_default
                .as_ref()
                .map(|value| convert_element(value, ids));

            class.methods.push(MethodDef {
                name: method.name.clone(),
                descriptor: method.descriptor.clone(),
                access_flags: method.access_flags,
                annotations: convert_annotations(method.annotations(), ids),
                body,
                default_value,
            });
        }

        class.annotations = convert_annotations(cf.annotations(), ids)
            .into_iter()
            .map(AnnotationUsage::new)
            .collect();

        Ok(class)
    }
}

fn convert_annotations<'a>(
    annotations: impl Iterator<Item = &'a classfile::Annotation>,
    ids: &IdentifierFactory,
) -> Vec<AnnotationValue> {
    annotations
        .map(|annotation| convert_annotation(annotation, ids))
        .collect()
}

fn convert_annotation(annotation: &classfile::Annotation, ids: &IdentifierFactory) -> AnnotationValue {
    AnnotationValue {
        annotation_type: ids.class_type(&annotation.annotation_type),
        elements: annotation
            .elements
            .iter()
            .map(|(name, value)| (name.clone(), convert_element(value, ids)))
            .collect::<BTreeMap<_, _>>(),
    }
}

fn convert_element(value: &classfile::ElementValue, ids: &IdentifierFactory) -> ElementValue {
    match value {
        classfile::ElementValue::Const(value) => ElementValue::Const(convert_const(value)),
        classfile::ElementValue::Enum {
            enum_type,
            const_name,
        } => ElementValue::Enum {
            enum_type: ids.class_type(enum_type),
            const_name: const_name.clone(),
        },
        classfile::ElementValue::Class(descriptor) => ElementValue::Class(descriptor.clone()),
        classfile::ElementValue::Annotation(nested) => {
            ElementValue::Annotation(Box::new(convert_annotation(nested, ids)))
        }
        classfile::ElementValue::Array(values) => ElementValue::Array(
            values.iter().map(|value| convert_element(value, ids)).collect(),
        ),
    }
}

fn convert_const(value: &classfile::ConstValue) -> ConstValue {
    match value {
        classfile::ConstValue::Byte(v) => ConstValue::Byte(*v),
        classfile::ConstValue::Char(v) => ConstValue::Char(*v),
        classfile::ConstValue::Short(v) => ConstValue::Short(*v),
        classfile::ConstValue::Int(v) => ConstValue::Int(*v),
        classfile::ConstValue::Long(v) => ConstValue::Long(*v),
        classfile::ConstValue::Float(v) => ConstValue::Float(*v),
        classfile::ConstValue::Double(v) => ConstValue::Double(*v),
        classfile::ConstValue::Boolean(v) => ConstValue::Boolean(*v),
        classfile::ConstValue::String(v) => ConstValue::String(v.clone()),
    }
}
