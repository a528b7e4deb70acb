//! Error kinds shared by the reader, verifier and evaluator.

use core::fmt;

/// First-error classification shared by both phases.
///
/// Codes are stable and show up in rendered diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    SourceUnreadable,
    SyntaxInvalid,
    NameUndefined,
    ArityOrTypeMismatch,
    BranchSignatureMismatch,
    RecursionWithoutBaseCase,
    TypeUnificationFailed,
    ResourceExceeded,
}

impl ErrorKind {
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::SourceUnreadable => "E000",
            ErrorKind::SyntaxInvalid => "E001",
            ErrorKind::NameUndefined => "E002",
            ErrorKind::ArityOrTypeMismatch => "E003",
            ErrorKind::BranchSignatureMismatch => "E004",
            ErrorKind::RecursionWithoutBaseCase => "E005",
            ErrorKind::TypeUnificationFailed => "E006",
            ErrorKind::ResourceExceeded => "E007",
        }
    }

    /// Short headline used when no more specific message exists.
    pub fn describe(self) -> &'static str {
        match self {
            ErrorKind::SourceUnreadable => "source could not be read",
            ErrorKind::SyntaxInvalid => "invalid syntax",
            ErrorKind::NameUndefined => "undefined name",
            ErrorKind::ArityOrTypeMismatch => "arity or type mismatch",
            ErrorKind::BranchSignatureMismatch => "conditional branches disagree",
            ErrorKind::RecursionWithoutBaseCase => "recursion without a base case",
            ErrorKind::TypeUnificationFailed => "type unification failed",
            ErrorKind::ResourceExceeded => "resource limit exceeded",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_distinct() {
        let kinds = [
            ErrorKind::SourceUnreadable,
            ErrorKind::SyntaxInvalid,
            ErrorKind::NameUndefined,
            ErrorKind::ArityOrTypeMismatch,
            ErrorKind::BranchSignatureMismatch,
            ErrorKind::RecursionWithoutBaseCase,
            ErrorKind::TypeUnificationFailed,
            ErrorKind::ResourceExceeded,
        ];
        let mut codes: Vec<_> = kinds.iter().map(|k| k.code()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), kinds.len());
        assert_eq!(ErrorKind::RecursionWithoutBaseCase.code(), "E005");
    }
}
