//! A line-oriented textual IR, one class per `.jimple` file.
//!
//! ```text
//! @com.example.Marker(level = 2)
//! public class com.example.Task extends com.example.Base implements java.lang.Runnable
//! {
//!     private int count;
//!
//!     public void run()
//!     {
//!         r0 := @this: com.example.Task;
//!         return;
//!     }
//!
//!     public abstract int limit() default 10;
//! }
//! ```
//!
//! For `interface` and `annotation` kinds, `extends` lists superinterfaces. Statement bodies
//! are kept verbatim (without the trailing `;`) and are not interpreted.

use std::collections::BTreeMap;

use sable_core::model::{
    ACC_ABSTRACT, ACC_ANNOTATION, ACC_ENUM, ACC_FINAL, ACC_INTERFACE, ACC_PRIVATE,
    ACC_PROTECTED, ACC_PUBLIC, ACC_STATIC,
};
use sable_core::{
    AnnotationUsage, AnnotationValue, Body, BuildContext, BuildError, ClassDef, ClassType,
    ConstValue, ElementValue, FieldDef, IdentifierFactory, MethodDef,
};
use thiserror::Error;

use crate::frontend::Frontend;

const ACC_SYNCHRONIZED: u16 = 0x0020;
const ACC_VOLATILE: u16 = 0x0040;
const ACC_TRANSIENT: u16 = 0x0080;
const ACC_NATIVE: u16 = 0x0100;

const OBJECT: &str = "java.lang.Object";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {message}")]
pub struct TextIrError {
    pub line: usize,
    pub message: String,
}

fn err(line: usize, message: impl Into<String>) -> TextIrError {
    TextIrError {
        line,
        message: message.into(),
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TextIrFrontend;

impl Frontend for TextIrFrontend {
    fn extension(&self) -> &'static str {
        "jimple"
    }

    fn build(
        &self,
        class_type: &ClassType,
        bytes: &[u8],
        origin: &str,
        ctx: &BuildContext<'_>,
    ) -> Result<ClassDef, BuildError> {
        let text = std::str::from_utf8(bytes).map_err(|e| BuildError::Malformed {
            origin: origin.to_string(),
            message: e.to_string(),
        })?;
        let mut class = parse_class(text, ctx.identifiers).map_err(|e| BuildError::Frontend {
            origin: origin.to_string(),
            source: Box::new(e),
        })?;

        for method in &mut class.methods {
            if let Some(body) = method.body.as_mut() {
                ctx.intercept(class_type, &method.name, body);
            }
        }
        Ok(class)
    }
}

/// Parse one class. Annotation usages are attached but their defaults are not merged.
pub fn parse_class(text: &str, ids: &IdentifierFactory) -> Result<ClassDef, TextIrError> {
    let lines: Vec<(usize, &str)> = text
        .lines()
        .enumerate()
        .map(|(idx, raw)| (idx + 1, strip_comment(raw).trim()))
        .filter(|(_, line)| !line.is_empty())
        .collect();
    let mut cursor = Cursor { lines: &lines, pos: 0 };

    let class_annotations = cursor.annotations(ids)?;
    let (line_no, header) = cursor
        .next()
        .ok_or_else(|| err(lines.last().map_or(1, |(n, _)| *n), "missing class header"))?;
    let (header, opened) = split_open_brace(header);
    let mut class = parse_header(line_no, header, ids)?;
    class.annotations = class_annotations.into_iter().map(AnnotationUsage::new).collect();
    if !opened {
        cursor.expect("{")?;
    }

    loop {
        let annotations = cursor.annotations(ids)?;
        let (line_no, line) = cursor
            .next()
            .ok_or_else(|| err(cursor.last_line(), "unterminated class body"))?;
        if line == "}" {
            if !annotations.is_empty() {
                return Err(err(line_no, "annotation without a member"));
            }
            break;
        }

        if let Some(decl) = line.strip_suffix(';') {
            if decl.contains('(') {
                let mut method = parse_method_sig(line_no, decl, ids)?;
                method.annotations = annotations;
                class.methods.push(method);
            } else {
                let mut field = parse_field(line_no, decl)?;
                field.annotations = annotations;
                class.fields.push(field);
            }
            continue;
        }

        let (sig, opened) = split_open_brace(line);
        let mut method = parse_method_sig(line_no, sig, ids)?;
        if method.default_value.is_some() {
            return Err(err(line_no, "a method with a body cannot declare a default"));
        }
        if !opened {
            cursor.expect("{")?;
        }
        let mut statements = Vec::new();
        loop {
            let (_, stmt) = cursor
                .next()
                .ok_or_else(|| err(cursor.last_line(), "unterminated method body"))?;
            if stmt == "}" {
                break;
            }
            statements.push(stmt.strip_suffix(';').unwrap_or(stmt).trim_end().to_string());
        }
        method.annotations = annotations;
        method.body = Some(Body::Statements(statements));
        class.methods.push(method);
    }

    if let Some((line_no, _)) = cursor.next() {
        return Err(err(line_no, "content after end of class"));
    }
    Ok(class)
}

struct Cursor<'a, 'b> {
    lines: &'b [(usize, &'a str)],
    pos: usize,
}

impl<'a> Cursor<'a, '_> {
    fn next(&mut self) -> Option<(usize, &'a str)> {
        let line = self.lines.get(self.pos).copied()?;
        self.pos += 1;
        Some(line)
    }

    fn peek(&self) -> Option<&'a str> {
        self.lines.get(self.pos).map(|(_, line)| *line)
    }

    fn last_line(&self) -> usize {
        self.lines.last().map_or(1, |(n, _)| *n)
    }

    fn expect(&mut self, token: &str) -> Result<(), TextIrError> {
        match self.next() {
            Some((_, line)) if line == token => Ok(()),
            Some((line_no, line)) => Err(err(line_no, format!("expected `{token}`, found `{line}`"))),
            None => Err(err(self.last_line(), format!("expected `{token}`"))),
        }
    }

    fn annotations(&mut self, ids: &IdentifierFactory) -> Result<Vec<AnnotationValue>, TextIrError> {
        let mut out = Vec::new();
        while self.peek().is_some_and(|line| line.starts_with('@')) {
            if let Some((line_no, line)) = self.next() {
                out.push(parse_annotation(line_no, line, ids)?);
            }
        }
        Ok(out)
    }
}

fn strip_comment(line: &str) -> &str {
    match line.find("//") {
        Some(idx) if !line[..idx].contains('"') => &line[..idx],
        _ => line,
    }
}

fn split_open_brace(line: &str) -> (&str, bool) {
    match line.strip_suffix('{') {
        Some(rest) => (rest.trim_end(), true),
        None => (line, false),
    }
}

fn parse_header(line: usize, header: &str, ids: &IdentifierFactory) -> Result<ClassDef, TextIrError> {
    let mut tokens = header.split_whitespace();
    let mut flags = 0u16;
    let kind = loop {
        let token = tokens.next().ok_or_else(|| err(line, "missing class kind"))?;
        match token {
            "class" | "interface" | "enum" | "annotation" => break token,
            other => flags |= modifier(line, other)?,
        }
    };
    flags |= match kind {
        "interface" => ACC_INTERFACE | ACC_ABSTRACT,
        "annotation" => ACC_INTERFACE | ACC_ABSTRACT | ACC_ANNOTATION,
        "enum" => ACC_ENUM,
        _ => 0,
    };

    let name = tokens.next().ok_or_else(|| err(line, "missing class name"))?;
    let mut class = ClassDef::new(ids.class_type(name), flags);
    let is_interface = flags & ACC_INTERFACE != 0;

    let rest: Vec<&str> = tokens.collect();
    let rest = rest.join(" ");
    let (extends, implements) = match rest.split_once("implements") {
        Some((extends, implements)) => (extends.trim(), Some(implements.trim())),
        None => (rest.trim(), None),
    };
    let extends = match extends {
        "" => None,
        clause => Some(
            clause
                .strip_prefix("extends")
                .ok_or_else(|| err(line, format!("unexpected `{clause}`")))?
                .trim(),
        ),
    };

    if is_interface {
        for interface in extends.into_iter().chain(implements).flat_map(type_list) {
            class.interfaces.insert(ids.class_type(interface));
        }
        class.superclass = Some(ids.class_type(OBJECT));
    } else {
        if let Some(superclass) = extends {
            if superclass.contains(',') {
                return Err(err(line, "a class extends at most one superclass"));
            }
            class.superclass = Some(ids.class_type(superclass));
        } else if name != OBJECT {
            class.superclass = Some(ids.class_type(OBJECT));
        }
        for interface in implements.into_iter().flat_map(type_list) {
            class.interfaces.insert(ids.class_type(interface));
        }
    }
    Ok(class)
}

fn type_list(list: &str) -> impl Iterator<Item = &str> {
    list.split(',').map(str::trim).filter(|name| !name.is_empty())
}

fn modifier(line: usize, token: &str) -> Result<u16, TextIrError> {
    Ok(match token {
        "public" => ACC_PUBLIC,
        "private" => ACC_PRIVATE,
        "protected" => ACC_PROTECTED,
        "static" => ACC_STATIC,
        "final" => ACC_FINAL,
        "abstract" => ACC_ABSTRACT,
        "synchronized" => ACC_SYNCHRONIZED,
        "volatile" => ACC_VOLATILE,
        "transient" => ACC_TRANSIENT,
        "native" => ACC_NATIVE,
        other => return Err(err(line, format!("unknown modifier `{other}`"))),
    })
}

/// `modifiers* type name`, returning the flags, type and name.
fn parse_decl<'a>(line: usize, decl: &'a str) -> Result<(u16, &'a str, &'a str), TextIrError> {
    let tokens: Vec<&str> = decl.split_whitespace().collect();
    let [modifiers @ .., ty, name] = tokens.as_slice() else {
        return Err(err(line, format!("expected `type name` in `{decl}`")));
    };
    let mut flags = 0;
    for token in modifiers {
        flags |= modifier(line, token)?;
    }
    Ok((flags, *ty, *name))
}

fn parse_field(line: usize, decl: &str) -> Result<FieldDef, TextIrError> {
    // Constant initializers are not part of the resolved model.
    let decl = decl.split_once('=').map_or(decl, |(head, _)| head).trim();
    let (access_flags, ty, name) = parse_decl(line, decl)?;
    Ok(FieldDef {
        name: name.to_string(),
        descriptor: ty.to_string(),
        access_flags,
        annotations: Vec::new(),
    })
}

fn parse_method_sig(line: usize, sig: &str, ids: &IdentifierFactory) -> Result<MethodDef, TextIrError> {
    let (head, tail) = sig
        .split_once('(')
        .ok_or_else(|| err(line, "missing parameter list"))?;
    let (params, trailer) = tail
        .split_once(')')
        .ok_or_else(|| err(line, "unclosed parameter list"))?;
    let (access_flags, return_type, name) = parse_decl(line, head)?;

    let params: Vec<&str> = type_list(params).collect();
    let descriptor = format!("({}){return_type}", params.join(","));

    let trailer = trailer.trim();
    let default_value = if let Some(value) = trailer.strip_prefix("default") {
        Some(parse_value(line, value.trim(), ids)?)
    } else if trailer.is_empty() || trailer.starts_with("throws") {
        None
    } else {
        return Err(err(line, format!("unexpected `{trailer}`")));
    };

    Ok(MethodDef {
        name: name.to_string(),
        descriptor,
        access_flags,
        annotations: Vec::new(),
        body: None,
        default_value,
    })
}

fn parse_annotation(line: usize, text: &str, ids: &IdentifierFactory) -> Result<AnnotationValue, TextIrError> {
    let text = text.strip_prefix('@').unwrap_or(text).trim();
    let (name, args) = match text.split_once('(') {
        Some((name, args)) => (
            name.trim(),
            args.strip_suffix(')')
                .ok_or_else(|| err(line, "unclosed annotation arguments"))?,
        ),
        None => (text, ""),
    };
    if name.is_empty() {
        return Err(err(line, "missing annotation type"));
    }

    let mut elements = BTreeMap::new();
    for arg in type_list(args) {
        let (key, value) = arg
            .split_once('=')
            .ok_or_else(|| err(line, format!("expected `name = value`, found `{arg}`")))?;
        elements.insert(key.trim().to_string(), parse_value(line, value.trim(), ids)?);
    }
    Ok(AnnotationValue {
        annotation_type: ids.class_type(name),
        elements,
    })
}

fn parse_value(line: usize, value: &str, ids: &IdentifierFactory) -> Result<ElementValue, TextIrError> {
    let constant = match value {
        "true" => ConstValue::Boolean(true),
        "false" => ConstValue::Boolean(false),
        _ if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') => {
            ConstValue::String(value[1..value.len() - 1].to_string())
        }
        _ if value.ends_with(".class") => {
            let name = &value[..value.len() - ".class".len()];
            return Ok(ElementValue::Class(format!("L{};", name.replace('.', "/"))));
        }
        _ => {
            if let Some(long) = value.strip_suffix('L').and_then(|v| v.parse::<i64>().ok()) {
                ConstValue::Long(long)
            } else if let Ok(int) = value.parse::<i32>() {
                ConstValue::Int(int)
            } else if let Ok(double) = value.parse::<f64>() {
                ConstValue::Double(double)
            } else if let Some((enum_type, const_name)) = value.rsplit_once('.') {
                return Ok(ElementValue::Enum {
                    enum_type: ids.class_type(enum_type),
                    const_name: const_name.to_string(),
                });
            } else {
                return Err(bad_value(line, value));
            }
        }
    };
    Ok(ElementValue::Const(constant))
}

fn bad_value(line: usize, value: &str) -> TextIrError {
    err(line, format!("unsupported value `{value}`"))
}
