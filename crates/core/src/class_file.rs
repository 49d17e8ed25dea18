//! Minimal JVM class-file reader.
//!
//! Only the constant pool is decoded into values. Relocation rewrites `Utf8`
//! constants in place and copies everything after the pool verbatim, which is
//! safe because constant indices never move.

use std::borrow::Cow;

use crate::error::ClassFormatError;
use crate::plan::RelocationPlan;

const MAGIC: u32 = 0xCAFE_BABE;

const TAG_UTF8: u8 = 1;
const TAG_INTEGER: u8 = 3;
const TAG_FLOAT: u8 = 4;
const TAG_LONG: u8 = 5;
const TAG_DOUBLE: u8 = 6;
const TAG_CLASS: u8 = 7;
const TAG_STRING: u8 = 8;
const TAG_FIELDREF: u8 = 9;
const TAG_METHODREF: u8 = 10;
const TAG_INTERFACE_METHODREF: u8 = 11;
const TAG_NAME_AND_TYPE: u8 = 12;
const TAG_METHOD_HANDLE: u8 = 15;
const TAG_METHOD_TYPE: u8 = 16;
const TAG_DYNAMIC: u8 = 17;
const TAG_INVOKE_DYNAMIC: u8 = 18;
const TAG_MODULE: u8 = 19;
const TAG_PACKAGE: u8 = 20;

pub(crate) struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub(crate) fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    pub(crate) fn position(&self) -> usize {
        self.pos
    }

    pub(crate) fn remaining(&self) -> &'a [u8] {
        &self.bytes[self.pos..]
    }

    pub(crate) fn take(&mut self, len: usize) -> Result<&'a [u8], ClassFormatError> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.bytes.len())
            .ok_or(ClassFormatError::Truncated(self.pos))?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    pub(crate) fn u8(&mut self) -> Result<u8, ClassFormatError> {
        Ok(self.take(1)?[0])
    }

    pub(crate) fn u16(&mut self) -> Result<u16, ClassFormatError> {
        let b = self.take(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    pub(crate) fn u32(&mut self) -> Result<u32, ClassFormatError> {
        let b = self.take(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Constant<'a> {
    Utf8(&'a [u8]),
    Class(u16),
    String(u16),
    MethodType(u16),
    Package(u16),
    NameAndType { name: u16, descriptor: u16 },
    Fieldref { class: u16, name_and_type: u16 },
    Methodref { class: u16, name_and_type: u16 },
    InterfaceMethodref { class: u16, name_and_type: u16 },
    /// Constants relocation never looks inside; kept as raw bytes after the tag.
    Opaque { tag: u8, body: &'a [u8] },
    /// Second slot of a `Long` or `Double`.
    Unusable,
}

/// A parsed class file: header, constant pool, and the untouched remainder.
pub(crate) struct ClassFile<'a> {
    header: &'a [u8],
    /// Index 0 is unused, as in the class-file format.
    pub(crate) pool: Vec<Constant<'a>>,
    pub(crate) tail: &'a [u8],
}

impl<'a> ClassFile<'a> {
    pub(crate) fn parse(bytes: &'a [u8]) -> Result<Self, ClassFormatError> {
        let mut reader = Reader::new(bytes);
        let magic = reader.u32()?;
        if magic != MAGIC {
            return Err(ClassFormatError::BadMagic(magic));
        }
        reader.take(4)?;
        let header = &bytes[..reader.position()];
        let count = reader.u16()?;
        let mut pool = Vec::with_capacity(usize::from(count));
        pool.push(Constant::Unusable);
        let mut index: u16 = 1;
        while index < count {
            let tag = reader.u8()?;
            let constant = match tag {
                TAG_UTF8 => {
                    let len = reader.u16()?;
                    Constant::Utf8(reader.take(usize::from(len))?)
                }
                TAG_CLASS => Constant::Class(reader.u16()?),
                TAG_STRING => Constant::String(reader.u16()?),
                TAG_METHOD_TYPE => Constant::MethodType(reader.u16()?),
                TAG_PACKAGE => Constant::Package(reader.u16()?),
                TAG_NAME_AND_TYPE => Constant::NameAndType {
                    name: reader.u16()?,
                    descriptor: reader.u16()?,
                },
                TAG_FIELDREF => Constant::Fieldref {
                    class: reader.u16()?,
                    name_and_type: reader.u16()?,
                },
                TAG_METHODREF => Constant::Methodref {
                    class: reader.u16()?,
                    name_and_type: reader.u16()?,
                },
                TAG_INTERFACE_METHODREF => Constant::InterfaceMethodref {
                    class: reader.u16()?,
                    name_and_type: reader.u16()?,
                },
                TAG_INTEGER | TAG_FLOAT | TAG_DYNAMIC | TAG_INVOKE_DYNAMIC => Constant::Opaque {
                    tag,
                    body: reader.take(4)?,
                },
                TAG_LONG | TAG_DOUBLE => Constant::Opaque {
                    tag,
                    body: reader.take(8)?,
                },
                TAG_METHOD_HANDLE => Constant::Opaque {
                    tag,
                    body: reader.take(3)?,
                },
                TAG_MODULE => Constant::Opaque {
                    tag,
                    body: reader.take(2)?,
                },
                _ => return Err(ClassFormatError::UnknownTag { tag, index }),
            };
            let wide = matches!(constant, Constant::Opaque { tag: TAG_LONG | TAG_DOUBLE, .. });
            pool.push(constant);
            index += 1;
            if wide {
                // The second slot of a Long or Double must still lie inside the pool.
                if index >= count {
                    return Err(ClassFormatError::BadIndex(index - 1));
                }
                pool.push(Constant::Unusable);
                index = index
                    .checked_add(1)
                    .ok_or(ClassFormatError::BadIndex(index))?;
            }
        }
        Ok(Self {
            header,
            pool,
            tail: reader.remaining(),
        })
    }

    pub(crate) fn utf8(&self, index: u16) -> Result<&'a [u8], ClassFormatError> {
        match self.pool.get(usize::from(index)) {
            Some(Constant::Utf8(bytes)) => Ok(bytes),
            _ => Err(ClassFormatError::BadIndex(index)),
        }
    }

    /// Internal name referenced by a `Class` constant.
    pub(crate) fn class_name(&self, index: u16) -> Result<&'a [u8], ClassFormatError> {
        match self.pool.get(usize::from(index)) {
            Some(Constant::Class(name)) => self.utf8(*name),
            _ => Err(ClassFormatError::BadIndex(index)),
        }
    }

    pub(crate) fn name_and_type(
        &self,
        index: u16,
    ) -> Result<(&'a [u8], &'a [u8]), ClassFormatError> {
        match self.pool.get(usize::from(index)) {
            Some(Constant::NameAndType { name, descriptor }) => {
                Ok((self.utf8(*name)?, self.utf8(*descriptor)?))
            }
            _ => Err(ClassFormatError::BadIndex(index)),
        }
    }

    fn write(&self, replacements: &[Option<Vec<u8>>]) -> Result<Vec<u8>, ClassFormatError> {
        let mut out = Vec::with_capacity(self.header.len() + self.tail.len() * 2);
        out.extend_from_slice(self.header);
        let count = u16::try_from(self.pool.len())
            .map_err(|_| ClassFormatError::BadIndex(u16::MAX))?;
        out.extend_from_slice(&count.to_be_bytes());
        for (index, constant) in self.pool.iter().enumerate().skip(1) {
            match constant {
                Constant::Utf8(bytes) => {
                    let bytes = replacements[index].as_deref().unwrap_or(bytes);
                    let len = u16::try_from(bytes.len())
                        .map_err(|_| ClassFormatError::ConstantTooLong(bytes.len()))?;
                    out.push(TAG_UTF8);
                    out.extend_from_slice(&len.to_be_bytes());
                    out.extend_from_slice(bytes);
                }
                Constant::Class(i) => push_u16(&mut out, TAG_CLASS, *i),
                Constant::String(i) => push_u16(&mut out, TAG_STRING, *i),
                Constant::MethodType(i) => push_u16(&mut out, TAG_METHOD_TYPE, *i),
                Constant::Package(i) => push_u16(&mut out, TAG_PACKAGE, *i),
                Constant::NameAndType { name, descriptor } => {
                    push_u16(&mut out, TAG_NAME_AND_TYPE, *name);
                    out.extend_from_slice(&descriptor.to_be_bytes());
                }
                Constant::Fieldref {
                    class,
                    name_and_type,
                } => {
                    push_u16(&mut out, TAG_FIELDREF, *class);
                    out.extend_from_slice(&name_and_type.to_be_bytes());
                }
                Constant::Methodref {
                    class,
                    name_and_type,
                } => {
                    push_u16(&mut out, TAG_METHODREF, *class);
                    out.extend_from_slice(&name_and_type.to_be_bytes());
                }
                Constant::InterfaceMethodref {
                    class,
                    name_and_type,
                } => {
                    push_u16(&mut out, TAG_INTERFACE_METHODREF, *class);
                    out.extend_from_slice(&name_and_type.to_be_bytes());
                }
                Constant::Opaque { tag, body } => {
                    out.push(*tag);
                    out.extend_from_slice(body);
                }
                Constant::Unusable => {}
            }
        }
        out.extend_from_slice(self.tail);
        Ok(out)
    }
}

fn push_u16(out: &mut Vec<u8>, tag: u8, value: u16) {
    out.push(tag);
    out.extend_from_slice(&value.to_be_bytes());
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    ClassName,
    PackageName,
    StringLiteral,
    Descriptor,
}

/// Rewrites every class reference in `bytes`; `Ok(None)` when nothing changed.
pub(crate) fn relocate_class(
    plan: &RelocationPlan,
    bytes: &[u8],
) -> Result<Option<Vec<u8>>, ClassFormatError> {
    let class = ClassFile::parse(bytes)?;
    let mut roles = vec![Role::Descriptor; class.pool.len()];
    for constant in &class.pool {
        if let Constant::String(index) = constant {
            set_role(&mut roles, *index, Role::StringLiteral);
        }
    }
    for constant in &class.pool {
        match constant {
            Constant::Class(index) => set_role(&mut roles, *index, Role::ClassName),
            Constant::Package(index) => set_role(&mut roles, *index, Role::PackageName),
            _ => {}
        }
    }

    let mut replacements: Vec<Option<Vec<u8>>> = vec![None; class.pool.len()];
    let mut changed = false;
    for (index, constant) in class.pool.iter().enumerate() {
        let Constant::Utf8(raw) = constant else {
            continue;
        };
        // Modified UTF-8 with NUL or surrogates is never a class or package name.
        let Ok(text) = std::str::from_utf8(raw) else {
            continue;
        };
        let relocated = match roles[index] {
            Role::ClassName if text.starts_with('[') => remap_descriptor(plan, text),
            Role::ClassName | Role::PackageName => plan.relocate_path(text),
            Role::StringLiteral => relocate_string(plan, text),
            Role::Descriptor => remap_descriptor(plan, text),
        };
        if let Cow::Owned(relocated) = relocated {
            if relocated.len() > usize::from(u16::MAX) {
                return Err(ClassFormatError::ConstantTooLong(relocated.len()));
            }
            replacements[index] = Some(relocated.into_bytes());
            changed = true;
        }
    }
    if !changed {
        return Ok(None);
    }
    class.write(&replacements).map(Some)
}

fn set_role(roles: &mut [Role], index: u16, role: Role) {
    if let Some(slot) = roles.get_mut(usize::from(index)) {
        *slot = role;
    }
}

/// String literals may hold either a resource path or a dotted class name.
fn relocate_string<'a>(plan: &RelocationPlan, text: &'a str) -> Cow<'a, str> {
    if text.contains('/') {
        plan.relocate_path(text)
    } else if text.contains('.') {
        plan.relocate_class_name(text)
    } else {
        Cow::Borrowed(text)
    }
}

const TYPE_START: &[u8] = b"()[;<>:+-*^";

/// Remaps every `L<internal name>;` token of a field/method descriptor or generic signature.
///
/// Inside a formal type-parameter list an identifier such as `LISTENER` in
/// `<LISTENER:Ljava/lang/Object;>` ends in `:` and is a name, not a class token.
pub(crate) fn remap_descriptor<'a>(plan: &RelocationPlan, text: &'a str) -> Cow<'a, str> {
    let bytes = text.as_bytes();
    let mut out = String::new();
    let mut copied = 0;
    let mut i = 0;
    while i < bytes.len() {
        let at_type_start = i == 0 || TYPE_START.contains(&bytes[i - 1]);
        if bytes[i] == b'L' && at_type_start {
            let start = i + 1;
            let end = bytes[start..]
                .iter()
                .position(|b| matches!(b, b';' | b'<' | b'.' | b':'))
                .map(|offset| start + offset);
            if let Some(end) = end {
                if bytes[end] == b':' {
                    i = end;
                    continue;
                }
                if let Cow::Owned(relocated) = plan.relocate_path(&text[start..end]) {
                    out.push_str(&text[copied..start]);
                    out.push_str(&relocated);
                    copied = end;
                }
                i = end;
                continue;
            }
        }
        i += 1;
    }
    if copied == 0 {
        Cow::Borrowed(text)
    } else {
        out.push_str(&text[copied..]);
        Cow::Owned(out)
    }
}

/// A field or method as declared in a class body.
#[derive(Debug, Clone)]
pub(crate) struct Member<'a> {
    pub(crate) name: &'a [u8],
    pub(crate) descriptor: &'a [u8],
    /// Descriptors of annotations found in the runtime (in)visible annotation attributes.
    pub(crate) annotations: Vec<&'a [u8]>,
}

/// The class body after the constant pool, as far as the scanner needs it.
pub(crate) struct ClassBody<'a> {
    pub(crate) this_class: &'a [u8],
    /// `None` only for `java/lang/Object` and module descriptors.
    pub(crate) super_class: Option<&'a [u8]>,
    pub(crate) interfaces: Vec<&'a [u8]>,
    pub(crate) fields: Vec<Member<'a>>,
    pub(crate) methods: Vec<Member<'a>>,
}

impl<'a> ClassFile<'a> {
    pub(crate) fn body(&self) -> Result<ClassBody<'a>, ClassFormatError> {
        let mut reader = Reader::new(self.tail);
        reader.u16()?;
        let this_class = self.class_name(reader.u16()?)?;
        let super_class = match reader.u16()? {
            0 => None,
            index => Some(self.class_name(index)?),
        };
        let interface_count = reader.u16()?;
        let interfaces = (0..interface_count)
            .map(|_| self.class_name(reader.u16()?))
            .collect::<Result<Vec<_>, _>>()?;
        let fields = self.members(&mut reader)?;
        let methods = self.members(&mut reader)?;
        Ok(ClassBody {
            this_class,
            super_class,
            interfaces,
            fields,
            methods,
        })
    }

    fn members(&self, reader: &mut Reader<'a>) -> Result<Vec<Member<'a>>, ClassFormatError> {
        let count = reader.u16()?;
        let mut members = Vec::with_capacity(usize::from(count));
        for _ in 0..count {
            reader.u16()?;
            let name = self.utf8(reader.u16()?)?;
            let descriptor = self.utf8(reader.u16()?)?;
            let mut annotations = Vec::new();
            let attributes = reader.u16()?;
            for _ in 0..attributes {
                let attribute_name = self.utf8(reader.u16()?)?;
                let len = reader.u32()?;
                let body = reader.take(len as usize)?;
                if attribute_name == b"RuntimeVisibleAnnotations"
                    || attribute_name == b"RuntimeInvisibleAnnotations"
                {
                    self.read_annotations(body, &mut annotations)?;
                }
            }
            members.push(Member {
                name,
                descriptor,
                annotations,
            });
        }
        Ok(members)
    }

    fn read_annotations(
        &self,
        body: &'a [u8],
        out: &mut Vec<&'a [u8]>,
    ) -> Result<(), ClassFormatError> {
        let mut reader = Reader::new(body);
        let count = reader.u16()?;
        for _ in 0..count {
            out.push(self.utf8(reader.u16()?)?);
            skip_element_pairs(&mut reader)?;
        }
        Ok(())
    }
}

fn skip_element_pairs(reader: &mut Reader<'_>) -> Result<(), ClassFormatError> {
    let pairs = reader.u16()?;
    for _ in 0..pairs {
        reader.u16()?;
        skip_element_value(reader)?;
    }
    Ok(())
}

fn skip_element_value(reader: &mut Reader<'_>) -> Result<(), ClassFormatError> {
    match reader.u8()? {
        b'B' | b'C' | b'D' | b'F' | b'I' | b'J' | b'S' | b'Z' | b's' | b'c' => {
            reader.u16()?;
        }
        b'e' => {
            reader.take(4)?;
        }
        b'@' => {
            reader.u16()?;
            skip_element_pairs(reader)?;
        }
        b'[' => {
            let values = reader.u16()?;
            for _ in 0..values {
                skip_element_value(reader)?;
            }
        }
        _ => return Err(ClassFormatError::Truncated(reader.position())),
    }
    Ok(())
}
