//! Rowan glue: the language marker and node/token aliases.

use crate::syntax_kind::SyntaxKind;

/// Marker type connecting [`SyntaxKind`] to rowan's generic tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LoomLanguage {}

impl rowan::Language for LoomLanguage {
    type Kind = SyntaxKind;

    fn kind_from_raw(raw: rowan::SyntaxKind) -> Self::Kind {
        assert!(raw.0 <= SyntaxKind::TYPE_ARG_LIST as u16);
        // Safety: SyntaxKind is #[repr(u16)] with contiguous discriminants and
        // the bound was checked above. Rowan only hands back kinds that came
        // from kind_to_raw.
        unsafe { std::mem::transmute::<u16, SyntaxKind>(raw.0) }
    }

    fn kind_to_raw(kind: Self::Kind) -> rowan::SyntaxKind {
        rowan::SyntaxKind(kind as u16)
    }
}

pub type SyntaxNode = rowan::SyntaxNode<LoomLanguage>;
pub type SyntaxToken = rowan::SyntaxToken<LoomLanguage>;
pub type SyntaxElement = rowan::SyntaxElement<LoomLanguage>;
