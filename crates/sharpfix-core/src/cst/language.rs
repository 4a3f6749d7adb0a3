//! Rowan language implementation for the C# CST
//!
//! This module implements the `rowan::Language` trait, which connects
//! our CsSyntaxKind enum to Rowan's generic CST infrastructure.

use rowan::Language;

use super::CsSyntaxKind;

/// Language implementation for the C# subset
///
/// This is a zero-sized type that implements `rowan::Language` to provide
/// the connection between our syntax kinds and Rowan's generic tree types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CsLanguage;

impl Language for CsLanguage {
    type Kind = CsSyntaxKind;

    fn kind_from_raw(raw: rowan::SyntaxKind) -> Self::Kind {
        CsSyntaxKind::from_raw(raw.0).unwrap_or_else(|| {
            tracing::warn!("Unknown syntax kind: {}", raw.0);
            CsSyntaxKind::Error
        })
    }

    fn kind_to_raw(kind: Self::Kind) -> rowan::SyntaxKind {
        rowan::SyntaxKind(kind as u16)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_roundtrip() {
        let kinds = [
            CsSyntaxKind::Whitespace,
            CsSyntaxKind::Directive,
            CsSyntaxKind::UsingKw,
            CsSyntaxKind::Ident,
            CsSyntaxKind::CompilationUnit,
            CsSyntaxKind::MethodDecl,
        ];

        for &kind in &kinds {
            let raw = CsLanguage::kind_to_raw(kind);
            let back = CsLanguage::kind_from_raw(raw);
            assert_eq!(kind, back, "Roundtrip failed for {kind:?}");
        }
    }

    #[test]
    fn test_unknown_raw_maps_to_error() {
        let back = CsLanguage::kind_from_raw(rowan::SyntaxKind(u16::MAX));
        assert_eq!(back, CsSyntaxKind::Error);
    }
}
