use crate::error::{Error, ErrorKind, Result};
use crate::reader::Reader;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum CpInfo {
    Utf8(String),
    Integer(i32),
    Float(f32),
    Long(i64),
    Double(f64),
    Class { name_index: u16 },
    String { string_index: u16 },
    /// Member references, name-and-type, method handles and the like: never needed for
    /// resolution, only skipped over.
    Other(&'static str),
    /// The unusable slot after a `Long` or `Double`.
    Unusable,
}

impl CpInfo {
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            CpInfo::Utf8(_) => "Utf8",
            CpInfo::Integer(_) => "Integer",
            CpInfo::Float(_) => "Float",
            CpInfo::Long(_) => "Long",
            CpInfo::Double(_) => "Double",
            CpInfo::Class { .. } => "Class",
            CpInfo::String { .. } => "String",
            CpInfo::Other(kind) => kind,
            CpInfo::Unusable => "Unusable",
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct ConstantPool {
    /// Slot 0 is unused, as in the class-file format.
    entries: Vec<CpInfo>,
}

impl ConstantPool {
    pub(crate) fn parse(reader: &mut Reader<'_>) -> Result<Self> {
        let count = reader.read_u2()?;
        let mut entries = Vec::with_capacity(count as usize);
        entries.push(CpInfo::Unusable);

        while entries.len() < count as usize {
            let tag_offset = reader.offset();
            let tag = reader.read_u1()?;
            let info = match tag {
                1 => {
                    let len = reader.read_u2()? as usize;
                    let start = reader.offset();
                    let text = decode_modified_utf8(reader.read_bytes(len)?)
                        .map_err(|err| err.or_at(start))?;
                    CpInfo::Utf8(text)
                }
                3 => CpInfo::Integer(reader.read_u4()? as i32),
                4 => CpInfo::Float(f32::from_bits(reader.read_u4()?)),
                5 => CpInfo::Long(reader.read_u8()? as i64),
                6 => CpInfo::Double(f64::from_bits(reader.read_u8()?)),
                7 => CpInfo::Class {
                    name_index: reader.read_u2()?,
                },
                8 => CpInfo::String {
                    string_index: reader.read_u2()?,
                },
                9 | 10 | 11 | 12 | 17 | 18 => {
                    reader.read_u4()?;
                    CpInfo::Other(match tag {
                        9 => "Fieldref",
                        10 => "Methodref",
                        11 => "InterfaceMethodref",
                        12 => "NameAndType",
                        17 => "Dynamic",
                        _ => "InvokeDynamic",
                    })
                }
                15 => {
                    reader.read_u1()?;
                    reader.read_u2()?;
                    CpInfo::Other("MethodHandle")
                }
                16 | 19 | 20 => {
                    reader.read_u2()?;
                    CpInfo::Other(match tag {
                        16 => "MethodType",
                        19 => "Module",
                        _ => "Package",
                    })
                }
                other => return Err(Error::at(ErrorKind::BadConstantTag(other), tag_offset)),
            };

            let wide = matches!(info, CpInfo::Long(_) | CpInfo::Double(_));
            entries.push(info);
            if wide {
                entries.push(CpInfo::Unusable);
            }
        }

        if entries.len() != count as usize {
            // A trailing Long/Double overran the declared count.
            return Err(reader.error(ErrorKind::BadConstantIndex(count)));
        }
        Ok(Self { entries })
    }

    pub(crate) fn get(&self, index: u16) -> Result<&CpInfo> {
        match self.entries.get(index as usize) {
            None | Some(CpInfo::Unusable) => Err(ErrorKind::BadConstantIndex(index).into()),
            Some(info) => Ok(info),
        }
    }

    pub(crate) fn get_utf8(&self, index: u16) -> Result<&str> {
        match self.get(index)? {
            CpInfo::Utf8(value) => Ok(value),
            other => Err(mismatch(index, "Utf8", other)),
        }
    }

    /// Internal name (`java/lang/Object`) of a `Class` constant.
    pub(crate) fn get_class_name(&self, index: u16) -> Result<String> {
        match self.get(index)? {
            CpInfo::Class { name_index } => Ok(self.get_utf8(*name_index)?.to_string()),
            other => Err(mismatch(index, "Class", other)),
        }
    }

    pub(crate) fn get_string_constant(&self, index: u16) -> Result<String> {
        match self.get(index)? {
            // Annotation `s` elements point straight at a Utf8 entry.
            CpInfo::Utf8(value) => Ok(value.clone()),
            CpInfo::String { string_index } => Ok(self.get_utf8(*string_index)?.to_string()),
            other => Err(mismatch(index, "String", other)),
        }
    }
}

pub(crate) fn mismatch(index: u16, expected: &'static str, found: &CpInfo) -> Error {
    ErrorKind::ConstantMismatch {
        index,
        expected,
        found: found.kind(),
    }
    .into()
}

/// Decode the JVM's modified UTF-8: `NUL` is two bytes and supplementary characters are
/// stored as surrogate pairs of three-byte sequences.
pub(crate) fn decode_modified_utf8(bytes: &[u8]) -> Result<String> {
    if bytes.is_ascii() && !bytes.contains(&0) {
        return Ok(bytes.iter().map(|&b| b as char).collect());
    }

    let mut units = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let b0 = bytes[i];
        let continuation = |offset: usize| -> Result<u16> {
            match bytes.get(i + offset) {
                Some(&b) if b & 0xC0 == 0x80 => Ok((b & 0x3F) as u16),
                _ => Err(ErrorKind::BadModifiedUtf8.into()),
            }
        };

        if b0 != 0 && b0 < 0x80 {
            units.push(b0 as u16);
            i += 1;
        } else if b0 & 0xE0 == 0xC0 {
            units.push(((b0 & 0x1F) as u16) << 6 | continuation(1)?);
            i += 2;
        } else if b0 & 0xF0 == 0xE0 {
            units.push(((b0 & 0x0F) as u16) << 12 | continuation(1)? << 6 | continuation(2)?);
            i += 3;
        } else {
            return Err(ErrorKind::BadModifiedUtf8.into());
        }
    }

    String::from_utf16(&units).map_err(|_| ErrorKind::BadModifiedUtf8.into())
}
