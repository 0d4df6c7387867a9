//! `RuntimeVisibleAnnotations`, `RuntimeInvisibleAnnotations` and `AnnotationDefault`
//! bodies.
//!
//! Type references are checked while parsing: an annotation or enum constant whose type
//! descriptor is not an object type is a parse error, so consumers only ever see internal
//! names.

use crate::constant_pool::{mismatch, ConstantPool, CpInfo};
use crate::descriptor::{parse_field_descriptor, FieldType};
use crate::error::{Error, ErrorKind, Result};
use crate::reader::Reader;

#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    /// Internal name of the annotation interface (`com/example/Marker`).
    pub annotation_type: String,
    /// Explicit elements in class-file order.
    pub elements: Vec<(String, ElementValue)>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ElementValue {
    Const(ConstValue),
    Enum {
        /// Internal name of the enum class.
        enum_type: String,
        const_name: String,
    },
    /// Return descriptor of a class literal (`Ljava/lang/String;`, `I`, `V`).
    Class(String),
    Annotation(Box<Annotation>),
    Array(Vec<ElementValue>),
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

pub(crate) fn parse_annotations(
    reader: &mut Reader<'_>,
    cp: &ConstantPool,
) -> Result<Vec<Annotation>> {
    let count = reader.read_u2()?;
    (0..count).map(|_| parse_annotation(reader, cp)).collect()
}

fn parse_annotation(reader: &mut Reader<'_>, cp: &ConstantPool) -> Result<Annotation> {
    let annotation_type = reader.read_constant(|index| object_type(cp, index))?;

    let count = reader.read_u2()?;
    let mut elements = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let name = reader.read_constant(|index| cp.get_utf8(index))?.to_owned();
        elements.push((name, parse_element_value(reader, cp)?));
    }

    Ok(Annotation {
        annotation_type,
        elements,
    })
}

pub(crate) fn parse_element_value(
    reader: &mut Reader<'_>,
    cp: &ConstantPool,
) -> Result<ElementValue> {
    let tag_offset = reader.offset();
    let tag = reader.read_u1()? as char;
    Ok(match tag {
        'B' | 'C' | 'D' | 'F' | 'I' | 'J' | 'S' | 'Z' | 's' => {
            ElementValue::Const(reader.read_constant(|index| const_value(cp, tag, index))?)
        }
        'e' => {
            let enum_type = reader.read_constant(|index| object_type(cp, index))?;
            let const_name = reader.read_constant(|index| cp.get_utf8(index))?.to_owned();
            ElementValue::Enum {
                enum_type,
                const_name,
            }
        }
        'c' => ElementValue::Class(reader.read_constant(|index| cp.get_utf8(index))?.to_owned()),
        '@' => ElementValue::Annotation(Box::new(parse_annotation(reader, cp)?)),
        '[' => {
            let count = reader.read_u2()?;
            let values = (0..count)
                .map(|_| parse_element_value(reader, cp))
                .collect::<Result<_>>()?;
            ElementValue::Array(values)
        }
        other => return Err(Error::at(ErrorKind::BadElementTag(other), tag_offset)),
    })
}

/// The internal name behind a `Utf8` field descriptor that must name a class.
fn object_type(cp: &ConstantPool, index: u16) -> Result<String> {
    let descriptor = cp.get_utf8(index)?;
    match parse_field_descriptor(descriptor)? {
        FieldType::Object(name) => Ok(name),
        _ => Err(ErrorKind::BadDescriptor(descriptor.to_owned()).into()),
    }
}

fn const_value(cp: &ConstantPool, tag: char, index: u16) -> Result<ConstValue> {
    if tag == 's' {
        return cp.get_string_constant(index).map(ConstValue::String);
    }
    Ok(match (tag, cp.get(index)?) {
        ('I', CpInfo::Integer(v)) => ConstValue::Int(*v),
        ('B', CpInfo::Integer(v)) => ConstValue::Byte(*v as i8),
        ('S', CpInfo::Integer(v)) => ConstValue::Short(*v as i16),
        ('Z', CpInfo::Integer(v)) => ConstValue::Boolean(*v != 0),
        ('C', CpInfo::Integer(v)) => ConstValue::Char(
            char::from_u32(*v as u32).ok_or(ErrorKind::BadAttribute("char element_value"))?,
        ),
        ('J', CpInfo::Long(v)) => ConstValue::Long(*v),
        ('F', CpInfo::Float(v)) => ConstValue::Float(*v),
        ('D', CpInfo::Double(v)) => ConstValue::Double(*v),
        (_, other) => {
            let expected = match tag {
                'J' => "Long",
                'F' => "Float",
                'D' => "Double",
                _ => "Integer",
            };
            return Err(mismatch(index, expected, other));
        }
    })
}
