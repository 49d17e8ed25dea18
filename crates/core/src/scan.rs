use std::collections::{HashMap, HashSet, VecDeque};

use serde::Serialize;

use crate::class_file::{ClassFile, Constant};
use crate::entry::{ArchiveEntry, EntryKind};
use crate::error::RelocateError;

/// A reference from `class` to a member annotated with a forbidden annotation.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct BadCall {
    /// Internal name of the referencing class
    pub class: String,
    /// Internal name of the class declaring the member
    pub owner: String,
    pub name: String,
    pub descriptor: String,
    /// Descriptor of the annotation that flagged the member
    pub annotation: String,
}

type MemberKey = (Vec<u8>, Vec<u8>, Vec<u8>);

/// Finds uses of members annotated with any of the configured annotation descriptors,
/// e.g. `Lio/papermc/paper/annotation/DoNotUse;`.
///
/// Only members declared inside the scanned entries are known; references into
/// the rest of the classpath are not resolved.
#[derive(Debug, Clone)]
pub struct BadCallScanner {
    bad_annotations: Vec<String>,
}

impl BadCallScanner {
    pub fn new(bad_annotations: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            bad_annotations: bad_annotations.into_iter().map(Into::into).collect(),
        }
    }

    /// # Errors
    /// Returns error naming the entry if a class file cannot be parsed.
    pub fn scan(&self, entries: &[ArchiveEntry]) -> Result<Vec<BadCall>, RelocateError> {
        if self.bad_annotations.is_empty() {
            return Ok(Vec::new());
        }
        let classes = entries
            .iter()
            .filter(|entry| entry.kind() == EntryKind::Class)
            .map(|entry| {
                ClassFile::parse(&entry.content)
                    .and_then(|class| class.body().map(|body| (class, body)))
                    .map_err(|source| RelocateError::ClassFormat {
                        path: entry.path.clone(),
                        source,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut flagged: HashMap<MemberKey, &str> = HashMap::new();
        for (_, body) in &classes {
            for member in body.fields.iter().chain(body.methods.iter()) {
                let bad = member.annotations.iter().find_map(|annotation| {
                    self.bad_annotations
                        .iter()
                        .find(|bad| bad.as_bytes() == *annotation)
                });
                if let Some(bad) = bad {
                    flagged.insert(
                        (
                            body.this_class.to_vec(),
                            member.name.to_vec(),
                            member.descriptor.to_vec(),
                        ),
                        bad.as_str(),
                    );
                }
            }
        }
        if flagged.is_empty() {
            return Ok(Vec::new());
        }
        let supertypes: HashMap<&[u8], Vec<&[u8]>> = classes
            .iter()
            .map(|(_, body)| {
                let parents = body
                    .super_class
                    .into_iter()
                    .chain(body.interfaces.iter().copied())
                    .collect();
                (body.this_class, parents)
            })
            .collect();

        let mut calls = Vec::new();
        for (class, body) in &classes {
            for constant in &class.pool {
                let (Constant::Fieldref {
                    class: owner,
                    name_and_type,
                }
                | Constant::Methodref {
                    class: owner,
                    name_and_type,
                }
                | Constant::InterfaceMethodref {
                    class: owner,
                    name_and_type,
                }) = constant
                else {
                    continue;
                };
                let owner = class.class_name(*owner).map_err(|source| {
                    RelocateError::ClassFormat {
                        path: lossy(body.this_class),
                        source,
                    }
                })?;
                if owner == body.this_class {
                    continue;
                }
                let (name, descriptor) = class.name_and_type(*name_and_type).map_err(|source| {
                    RelocateError::ClassFormat {
                        path: lossy(body.this_class),
                        source,
                    }
                })?;
                if let Some(annotation) =
                    resolve_flagged(&flagged, &supertypes, owner, name, descriptor)
                {
                    calls.push(BadCall {
                        class: lossy(body.this_class),
                        owner: lossy(owner),
                        name: lossy(name),
                        descriptor: lossy(descriptor),
                        annotation: annotation.to_string(),
                    });
                }
            }
        }
        calls.sort();
        calls.dedup();
        Ok(calls)
    }
}

/// Walks from `owner` up through the scanned superclasses and interfaces to the
/// class declaring the member, and returns its bad annotation if it is flagged.
fn resolve_flagged<'f, 'c>(
    flagged: &HashMap<MemberKey, &'f str>,
    supertypes: &HashMap<&'c [u8], Vec<&'c [u8]>>,
    owner: &'c [u8],
    name: &[u8],
    descriptor: &[u8],
) -> Option<&'f str> {
    let mut queue = VecDeque::from([owner]);
    let mut seen = HashSet::new();
    while let Some(class) = queue.pop_front() {
        if !seen.insert(class) {
            continue;
        }
        let key = (class.to_vec(), name.to_vec(), descriptor.to_vec());
        if let Some(annotation) = flagged.get(&key) {
            return Some(*annotation);
        }
        if let Some(parents) = supertypes.get(class) {
            queue.extend(parents.iter().copied());
        }
    }
    None
}

fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}
