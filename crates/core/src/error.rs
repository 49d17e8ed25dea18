use std::fmt::Display;

use thiserror::Error;

/// Which side of a rule failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleField {
    FromPackage,
    ToPackage,
}

impl Display for RuleField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::FromPackage => "fromPackage",
            Self::ToPackage => "toPackage",
        })
    }
}

/// Raised by [`crate::build_plan`] when a rule definition is malformed.
///
/// Always fatal to the packaging step: a plan is either fully valid or not built at all.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidRuleError {
    #[error("relocation rule #{index}: {field} is empty")]
    Empty { index: usize, field: RuleField },

    #[error("relocation rule #{index}: {field} `{value}` is not a dot-separated package name")]
    MalformedPackage {
        index: usize,
        field: RuleField,
        value: String,
    },

    #[error("relocation rule #{index}: invalid exclude pattern `{pattern}`: {reason}")]
    InvalidExclude {
        index: usize,
        pattern: String,
        reason: String,
    },
}

/// Structural problems found while reading a class file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClassFormatError {
    #[error("not a class file (magic {0:#010x})")]
    BadMagic(u32),

    #[error("unexpected end of class file at offset {0}")]
    Truncated(usize),

    #[error("unknown constant pool tag {tag} at index {index}")]
    UnknownTag { tag: u8, index: u16 },

    #[error("constant pool index {0} does not point at the expected constant")]
    BadIndex(u16),

    #[error("relocated constant is {0} bytes, the limit is 65535")]
    ConstantTooLong(usize),
}

/// Content rewriting failure for a single archive entry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelocateError {
    #[error("{path}: {source}")]
    ClassFormat {
        path: String,
        #[source]
        source: ClassFormatError,
    },
}
