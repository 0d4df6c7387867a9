use crate::error::{ErrorKind, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseType {
    Byte,
    Char,
    Double,
    Float,
    Int,
    Long,
    Short,
    Boolean,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    Base(BaseType),
    /// Internal name, e.g. `java/lang/String`.
    Object(String),
    Array(Box<FieldType>),
}

impl FieldType {
    /// The innermost object type's internal name, looking through arrays.
    pub fn element_class(&self) -> Option<&str> {
        match self {
            FieldType::Base(_) => None,
            FieldType::Object(name) => Some(name),
            FieldType::Array(component) => component.element_class(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReturnType {
    Void,
    Type(FieldType),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDescriptor {
    pub params: Vec<FieldType>,
    pub return_type: ReturnType,
}

pub fn parse_field_descriptor(desc: &str) -> Result<FieldType> {
    match parse_field_type(desc) {
        Some((ty, "")) => Ok(ty),
        _ => Err(ErrorKind::BadDescriptor(desc.to_string()).into()),
    }
}

pub fn parse_method_descriptor(desc: &str) -> Result<MethodDescriptor> {
    parse_method(desc).ok_or_else(|| ErrorKind::BadDescriptor(desc.to_string()).into())
}

fn parse_method(desc: &str) -> Option<MethodDescriptor> {
    let mut rest = desc.strip_prefix('(')?;
    let mut params = Vec::new();
    while let Some(c) = rest.chars().next() {
        if c == ')' {
            break;
        }
        let (param, after) = parse_field_type(rest)?;
        params.push(param);
        rest = after;
    }
    let rest = rest.strip_prefix(')')?;

    let return_type = if rest == "V" {
        ReturnType::Void
    } else {
        match parse_field_type(rest)? {
            (ty, "") => ReturnType::Type(ty),
            _ => return None,
        }
    };
    Some(MethodDescriptor {
        params,
        return_type,
    })
}

fn parse_field_type(input: &str) -> Option<(FieldType, &str)> {
    let mut chars = input.chars();
    let base = match chars.next()? {
        'B' => BaseType::Byte,
        'C' => BaseType::Char,
        'D' => BaseType::Double,
        'F' => BaseType::Float,
        'I' => BaseType::Int,
        'J' => BaseType::Long,
        'S' => BaseType::Short,
        'Z' => BaseType::Boolean,
        'L' => {
            let end = input.find(';')?;
            let name = &input[1..end];
            if name.is_empty() {
                return None;
            }
            return Some((FieldType::Object(name.to_string()), &input[end + 1..]));
        }
        '[' => {
            let (component, rest) = parse_field_type(&input[1..])?;
            return Some((FieldType::Array(Box::new(component)), rest));
        }
        _ => return None,
    };
    Some((FieldType::Base(base), chars.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_field_descriptor_primitives_and_arrays() {
        assert_eq!(parse_field_descriptor("I").unwrap(), FieldType::Base(BaseType::Int));
        let nested = parse_field_descriptor("[[Ljava/lang/String;").unwrap();
        assert_eq!(
            nested,
            FieldType::Array(Box::new(FieldType::Array(Box::new(FieldType::Object(
                "java/lang/String".to_string()
            )))))
        );
        assert_eq!(nested.element_class(), Some("java/lang/String"));
        assert!(parse_field_descriptor("IJ").is_err());
        assert!(parse_field_descriptor("L;").is_err());
    }

    #[test]
    fn parse_method_descriptor_basic() {
        let desc = parse_method_descriptor("(ILjava/lang/String;)[I").unwrap();
        assert_eq!(
            desc.params,
            vec![
                FieldType::Base(BaseType::Int),
                FieldType::Object("java/lang/String".to_string())
            ]
        );
        assert_eq!(
            desc.return_type,
            ReturnType::Type(FieldType::Array(Box::new(FieldType::Base(BaseType::Int))))
        );

        assert_eq!(parse_method_descriptor("()V").unwrap().return_type, ReturnType::Void);
        assert!(parse_method_descriptor("(I").is_err());
        assert!(parse_method_descriptor("()VV").is_err());
        assert!(parse_method_descriptor("I)V").is_err());
    }
}
