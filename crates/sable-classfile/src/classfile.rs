use crate::annotation::{parse_annotations, parse_element_value, Annotation, ElementValue};
use crate::constant_pool::ConstantPool;
use crate::error::{Error, ErrorKind, Result};
use crate::reader::Reader;

pub const MAGIC: u32 = 0xCAFEBABE;

#[derive(Debug, Clone)]
pub struct ClassFile {
    pub minor_version: u16,
    pub major_version: u16,
    pub access_flags: u16,
    /// Internal name (`com/example/Foo`).
    pub this_class: String,
    pub super_class: Option<String>,
    pub interfaces: Vec<String>,
    pub fields: Vec<ClassMember>,
    pub methods: Vec<ClassMember>,
    pub runtime_visible_annotations: Vec<Annotation>,
    pub runtime_invisible_annotations: Vec<Annotation>,
}

#[derive(Debug, Clone)]
pub struct ClassMember {
    pub access_flags: u16,
    pub name: String,
    pub descriptor: String,
    pub runtime_visible_annotations: Vec<Annotation>,
    pub runtime_invisible_annotations: Vec<Annotation>,
    /// `Code` attribute of a concrete method.
    pub code: Option<Code>,
    /// `AnnotationDefault` attribute of an annotation interface element.
    pub annotation_default: Option<ElementValue>,
}

impl ClassMember {
    /// Visible annotations followed by invisible ones.
    pub fn annotations(&self) -> impl Iterator<Item = &Annotation> {
        self.runtime_visible_annotations
            .iter()
            .chain(&self.runtime_invisible_annotations)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Code {
    pub max_stack: u16,
    pub max_locals: u16,
    pub code: Vec<u8>,
}

impl ClassFile {
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let mut reader = Reader::new(bytes);
        let magic = reader.read_u4()?;
        if magic != MAGIC {
            return Err(Error::at(ErrorKind::BadMagic(magic), 0));
        }

        let minor_version = reader.read_u2()?;
        let major_version = reader.read_u2()?;
        let cp = ConstantPool::parse(&mut reader)?;

        let access_flags = reader.read_u2()?;
        let this_class = reader.read_constant(|index| cp.get_class_name(index))?;
        // Index 0 marks a root class.
        let super_class = reader.read_constant(|index| match index {
            0 => Ok(None),
            index => cp.get_class_name(index).map(Some),
        })?;

        let interfaces_count = reader.read_u2()? as usize;
        let mut interfaces = Vec::with_capacity(interfaces_count);
        for _ in 0..interfaces_count {
            interfaces.push(reader.read_constant(|index| cp.get_class_name(index))?);
        }

        let fields_count = reader.read_u2()? as usize;
        let mut fields = Vec::with_capacity(fields_count);
        for _ in 0..fields_count {
            fields.push(parse_member(&mut reader, &cp)?);
        }

        let methods_count = reader.read_u2()? as usize;
        let mut methods = Vec::with_capacity(methods_count);
        for _ in 0..methods_count {
            methods.push(parse_member(&mut reader, &cp)?);
        }

        let class_attrs = parse_attributes(&mut reader, &cp)?;

        reader.ensure_empty()?;

        Ok(Self {
            minor_version,
            major_version,
            access_flags,
            this_class,
            super_class,
            interfaces,
            fields,
            methods,
            runtime_visible_annotations: class_attrs.runtime_visible_annotations,
            runtime_invisible_annotations: class_attrs.runtime_invisible_annotations,
        })
    }

    /// Visible annotations followed by invisible ones.
    pub fn annotations(&self) -> impl Iterator<Item = &Annotation> {
        self.runtime_visible_annotations
            .iter()
            .chain(&self.runtime_invisible_annotations)
    }
}

fn parse_member(reader: &mut Reader<'_>, cp: &ConstantPool) -> Result<ClassMember> {
    let access_flags = reader.read_u2()?;
    let name = reader.read_constant(|index| cp.get_utf8(index))?.to_string();
    let descriptor = reader.read_constant(|index| cp.get_utf8(index))?.to_string();

    let attrs = parse_attributes(reader, cp)?;
    Ok(ClassMember {
        access_flags,
        name,
        descriptor,
        runtime_visible_annotations: attrs.runtime_visible_annotations,
        runtime_invisible_annotations: attrs.runtime_invisible_annotations,
        code: attrs.code,
        annotation_default: attrs.annotation_default,
    })
}

#[derive(Default)]
struct ParsedAttributes {
    runtime_visible_annotations: Vec<Annotation>,
    runtime_invisible_annotations: Vec<Annotation>,
    code: Option<Code>,
    annotation_default: Option<ElementValue>,
}

fn parse_attributes(reader: &mut Reader<'_>, cp: &ConstantPool) -> Result<ParsedAttributes> {
    let attributes_count = reader.read_u2()? as usize;
    let mut parsed = ParsedAttributes::default();
    for _ in 0..attributes_count {
        let name = reader.read_constant(|index| cp.get_utf8(index))?;
        let length = reader.read_u4()? as usize;
        let body_offset = reader.offset();
        let info = reader.read_bytes(length)?;

        let mut sub = Reader::at(info, body_offset);
        match name {
            "RuntimeVisibleAnnotations" => {
                parsed
                    .runtime_visible_annotations
                    .extend(parse_annotations(&mut sub, cp)?);
                sub.ensure_empty()?;
            }
            "RuntimeInvisibleAnnotations" => {
                parsed
                    .runtime_invisible_annotations
                    .extend(parse_annotations(&mut sub, cp)?);
                sub.ensure_empty()?;
            }
            "AnnotationDefault" => {
                parsed.annotation_default = Some(parse_element_value(&mut sub, cp)?);
                sub.ensure_empty()?;
            }
            "Code" => {
                parsed.code = Some(parse_code(&mut sub)?);
            }
            _ => {
                // Unknown attribute: skipped.
            }
        }
    }

    Ok(parsed)
}

/// Only the header and instruction bytes; exception tables and nested attributes are not
/// interpreted.
fn parse_code(reader: &mut Reader<'_>) -> Result<Code> {
    let max_stack = reader.read_u2()?;
    let max_locals = reader.read_u2()?;
    let length_offset = reader.offset();
    let code_length = reader.read_u4()? as usize;
    if code_length == 0 {
        return Err(Error::at(ErrorKind::BadAttribute("Code"), length_offset));
    }
    let code = reader.read_bytes(code_length)?.to_vec();
    Ok(Code {
        max_stack,
        max_locals,
        code,
    })
}
