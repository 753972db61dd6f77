/// Shape tag of a [`Type`](super::Type).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Alias,
    Enum,
    Bitfield,
    RawData,
    Array,
    Container,
    Complex,
}

const LEGACY_PREFIX: &str = "typekind.";

impl TypeKind {
    pub const ALL: [TypeKind; 7] = [
        Self::Alias,
        Self::Enum,
        Self::Bitfield,
        Self::RawData,
        Self::Array,
        Self::Container,
        Self::Complex,
    ];

    /// Parses a declaration `kind`. Matching is case-insensitive and the
    /// legacy dotted form (`TypeKind.COMPLEX`) is accepted.
    pub fn parse(text: &str) -> Option<Self> {
        let lower = text.trim().to_ascii_lowercase();
        let bare = lower.strip_prefix(LEGACY_PREFIX).unwrap_or(&lower);
        let bare = bare.replace('_', "");
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(&bare))
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Alias => "Alias",
            Self::Enum => "Enum",
            Self::Bitfield => "Bitfield",
            Self::RawData => "RawData",
            Self::Array => "Array",
            Self::Container => "Container",
            Self::Complex => "Complex",
        }
    }
}

impl std::fmt::Display for TypeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
