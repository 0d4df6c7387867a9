#![allow(dead_code)]

use std::collections::HashMap;

pub const MAJOR_JAVA_8: u16 = 52;

pub const ACC_PUBLIC: u16 = 0x0001;
pub const ACC_SUPER: u16 = 0x0020;
pub const ACC_INTERFACE: u16 = 0x0200;
pub const ACC_ABSTRACT: u16 = 0x0400;
pub const ACC_ANNOTATION: u16 = 0x2000;

fn push_u16(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_be_bytes());
}

fn push_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_be_bytes());
}

/// Assembles class-file bytes with a deduplicated constant pool.
pub struct ClassBytes {
    pool: Vec<u8>,
    pool_count: u16,
    utf8: HashMap<String, u16>,
    access_flags: u16,
    this_class: String,
    super_class: Option<String>,
    interfaces: Vec<String>,
    fields: Vec<Vec<u8>>,
    methods: Vec<Vec<u8>>,
    annotations: Vec<(String, Vec<(String, i32)>)>,
}

impl ClassBytes {
    pub fn new(internal_name: &str) -> Self {
        Self {
            pool: Vec::new(),
            pool_count: 1,
            utf8: HashMap::new(),
            access_flags: ACC_PUBLIC | ACC_SUPER,
            this_class: internal_name.to_string(),
            super_class: Some("java/lang/Object".to_string()),
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            annotations: Vec::new(),
        }
    }

    pub fn access(mut self, flags: u16) -> Self {
        self.access_flags = flags;
        self
    }

    pub fn super_class(mut self, internal_name: Option<&str>) -> Self {
        self.super_class = internal_name.map(str::to_string);
        self
    }

    pub fn interface(mut self, internal_name: &str) -> Self {
        self.interfaces.push(internal_name.to_string());
        self
    }

    pub fn field(mut self, access: u16, name: &str, descriptor: &str) -> Self {
        let member = self.member(access, name, descriptor, Vec::new());
        self.fields.push(member);
        self
    }

    pub fn method(mut self, access: u16, name: &str, descriptor: &str, code: Option<&[u8]>) -> Self {
        let mut attributes = Vec::new();
        if let Some(code) = code {
            let mut info = Vec::new();
            push_u16(&mut info, 2); // max_stack
            push_u16(&mut info, 1); // max_locals
            push_u32(&mut info, code.len() as u32);
            info.extend_from_slice(code);
            push_u16(&mut info, 0); // exception_table_length
            push_u16(&mut info, 0); // attributes_count
            attributes.push(self.attribute("Code", info));
        }
        let member = self.member(access, name, descriptor, attributes);
        self.methods.push(member);
        self
    }

    /// An annotation interface element `int name() default value;`.
    pub fn int_element(mut self, name: &str, default: i32) -> Self {
        let mut info = vec![b'I'];
        let index = self.integer(default);
        push_u16(&mut info, index);
        let attribute = self.attribute("AnnotationDefault", info);
        let member = self.member(ACC_PUBLIC | ACC_ABSTRACT, name, "()I", vec![attribute]);
        self.methods.push(member);
        self
    }

    /// A class-level runtime-visible annotation with int-valued elements.
    pub fn annotation(mut self, type_descriptor: &str, elements: &[(&str, i32)]) -> Self {
        self.annotations.push((
            type_descriptor.to_string(),
            elements.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
        ));
        self
    }

    pub fn build(mut self) -> Vec<u8> {
        let mut body = Vec::new();
        push_u16(&mut body, self.access_flags);
        let this_class = self.this_class.clone();
        let this_index = self.class(&this_class);
        push_u16(&mut body, this_index);
        let super_index = match self.super_class.clone() {
            Some(name) => self.class(&name),
            None => 0,
        };
        push_u16(&mut body, super_index);

        push_u16(&mut body, self.interfaces.len() as u16);
        for name in self.interfaces.clone() {
            let index = self.class(&name);
            push_u16(&mut body, index);
        }

        push_u16(&mut body, self.fields.len() as u16);
        for field in &self.fields {
            body.extend_from_slice(field);
        }
        push_u16(&mut body, self.methods.len() as u16);
        for method in &self.methods {
            body.extend_from_slice(method);
        }

        if self.annotations.is_empty() {
            push_u16(&mut body, 0);
        } else {
            let mut info = Vec::new();
            push_u16(&mut info, self.annotations.len() as u16);
            for (descriptor, elements) in self.annotations.clone() {
                let type_index = self.utf8(&descriptor);
                push_u16(&mut info, type_index);
                push_u16(&mut info, elements.len() as u16);
                for (name, value) in elements {
                    let name_index = self.utf8(&name);
                    push_u16(&mut info, name_index);
                    info.push(b'I');
                    let value_index = self.integer(value);
                    push_u16(&mut info, value_index);
                }
            }
            push_u16(&mut body, 1);
            let attribute = self.attribute("RuntimeVisibleAnnotations", info);
            body.extend_from_slice(&attribute);
        }

        let mut bytes = Vec::new();
        push_u32(&mut bytes, 0xCAFEBABE);
        push_u16(&mut bytes, 0); // minor
        push_u16(&mut bytes, MAJOR_JAVA_8);
        push_u16(&mut bytes, self.pool_count);
        bytes.extend_from_slice(&self.pool);
        bytes.extend_from_slice(&body);
        bytes
    }

    fn utf8(&mut self, value: &str) -> u16 {
        if let Some(index) = self.utf8.get(value) {
            return *index;
        }
        self.pool.push(1); // CONSTANT_Utf8
        push_u16(&mut self.pool, value.len() as u16);
        self.pool.extend_from_slice(value.as_bytes());
        let index = self.next_index();
        self.utf8.insert(value.to_string(), index);
        index
    }

    fn class(&mut self, internal_name: &str) -> u16 {
        let name_index = self.utf8(internal_name);
        self.pool.push(7); // CONSTANT_Class
        push_u16(&mut self.pool, name_index);
        self.next_index()
    }

    fn integer(&mut self, value: i32) -> u16 {
        self.pool.push(3); // CONSTANT_Integer
        self.pool.extend_from_slice(&value.to_be_bytes());
        self.next_index()
    }

    fn next_index(&mut self) -> u16 {
        let index = self.pool_count;
        self.pool_count += 1;
        index
    }

    fn attribute(&mut self, name: &str, info: Vec<u8>) -> Vec<u8> {
        let mut out = Vec::new();
        let name_index = self.utf8(name);
        push_u16(&mut out, name_index);
        push_u32(&mut out, info.len() as u32);
        out.extend_from_slice(&info);
        out
    }

    fn member(&mut self, access: u16, name: &str, descriptor: &str, attributes: Vec<Vec<u8>>) -> Vec<u8> {
        let mut out = Vec::new();
        push_u16(&mut out, access);
        let name_index = self.utf8(name);
        push_u16(&mut out, name_index);
        let descriptor_index = self.utf8(descriptor);
        push_u16(&mut out, descriptor_index);
        push_u16(&mut out, attributes.len() as u16);
        for attribute in attributes {
            out.extend_from_slice(&attribute);
        }
        out
    }
}
