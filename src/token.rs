//! Token and value kinds.

use std::fmt;

/// One lexical unit produced by the [`Reader`](crate::Reader).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum TokenType {
    /// No token has been read yet.
    #[default]
    None = 0,
    StartObject,
    EndObject,
    StartArray,
    EndArray,
    StartSet,
    EndSet,
    StartMap,
    EndMap,
    PropertyName,
    String,
    Number,
    True,
    False,
    Null,
    DateTime,
    TimeOnly,
    Duration,
    RegExp,
    Binary,
    BigInteger,
}

impl TokenType {
    const ALL: [TokenType; 21] = [
        TokenType::None,
        TokenType::StartObject,
        TokenType::EndObject,
        TokenType::StartArray,
        TokenType::EndArray,
        TokenType::StartSet,
        TokenType::EndSet,
        TokenType::StartMap,
        TokenType::EndMap,
        TokenType::PropertyName,
        TokenType::String,
        TokenType::Number,
        TokenType::True,
        TokenType::False,
        TokenType::Null,
        TokenType::DateTime,
        TokenType::TimeOnly,
        TokenType::Duration,
        TokenType::RegExp,
        TokenType::Binary,
        TokenType::BigInteger,
    ];

    pub(crate) fn from_u8(tag: u8) -> TokenType {
        Self::ALL
            .get(tag as usize)
            .copied()
            .unwrap_or(TokenType::None)
    }

    #[inline]
    #[must_use]
    pub const fn is_start(self) -> bool {
        matches!(
            self,
            TokenType::StartObject | TokenType::StartArray | TokenType::StartSet | TokenType::StartMap
        )
    }

    #[inline]
    #[must_use]
    pub const fn is_end(self) -> bool {
        matches!(
            self,
            TokenType::EndObject | TokenType::EndArray | TokenType::EndSet | TokenType::EndMap
        )
    }

    /// Returns `true` for tokens that carry a byte range.
    #[inline]
    #[must_use]
    pub const fn is_scalar(self) -> bool {
        !self.is_start() && !self.is_end() && !matches!(self, TokenType::None)
    }

    /// Container kind opened or closed by this token.
    #[must_use]
    pub const fn container_kind(self) -> Option<ContainerKind> {
        match self {
            TokenType::StartObject | TokenType::EndObject => Some(ContainerKind::Object),
            TokenType::StartArray | TokenType::EndArray => Some(ContainerKind::Array),
            TokenType::StartSet | TokenType::EndSet => Some(ContainerKind::Set),
            TokenType::StartMap | TokenType::EndMap => Some(ContainerKind::Map),
            _ => None,
        }
    }

    /// Bytes stripped before and after the value range of a scalar token.
    pub(crate) const fn delimiter_lengths(self) -> (usize, usize) {
        match self {
            TokenType::String | TokenType::PropertyName => (1, 1),
            TokenType::Binary => (2, 1),
            TokenType::DateTime | TokenType::TimeOnly | TokenType::Duration | TokenType::RegExp => {
                (1, 0)
            }
            TokenType::BigInteger => (0, 1),
            _ => (0, 0),
        }
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// The kind of an open container.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ContainerKind {
    Object,
    Array,
    Set,
    Map,
}

impl ContainerKind {
    #[must_use]
    pub const fn start_token(self) -> TokenType {
        match self {
            ContainerKind::Object => TokenType::StartObject,
            ContainerKind::Array => TokenType::StartArray,
            ContainerKind::Set => TokenType::StartSet,
            ContainerKind::Map => TokenType::StartMap,
        }
    }

    #[must_use]
    pub const fn end_token(self) -> TokenType {
        match self {
            ContainerKind::Object => TokenType::EndObject,
            ContainerKind::Array => TokenType::EndArray,
            ContainerKind::Set => TokenType::EndSet,
            ContainerKind::Map => TokenType::EndMap,
        }
    }
}

impl fmt::Display for ContainerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// The logical kind of a value in a [`Document`](crate::Document).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Object,
    Array,
    Set,
    Map,
    String,
    Number,
    BigInteger,
    True,
    False,
    Null,
    DateTime,
    TimeOnly,
    Duration,
    RegExp,
    Binary,
}

impl ValueKind {
    pub(crate) fn from_token(token: TokenType) -> Option<ValueKind> {
        Some(match token {
            TokenType::StartObject => ValueKind::Object,
            TokenType::StartArray => ValueKind::Array,
            TokenType::StartSet => ValueKind::Set,
            TokenType::StartMap => ValueKind::Map,
            TokenType::String | TokenType::PropertyName => ValueKind::String,
            TokenType::Number => ValueKind::Number,
            TokenType::BigInteger => ValueKind::BigInteger,
            TokenType::True => ValueKind::True,
            TokenType::False => ValueKind::False,
            TokenType::Null => ValueKind::Null,
            TokenType::DateTime => ValueKind::DateTime,
            TokenType::TimeOnly => ValueKind::TimeOnly,
            TokenType::Duration => ValueKind::Duration,
            TokenType::RegExp => ValueKind::RegExp,
            TokenType::Binary => ValueKind::Binary,
            _ => return None,
        })
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_roundtrip() {
        for token in TokenType::ALL {
            assert_eq!(TokenType::from_u8(token as u8), token);
        }
        assert_eq!(TokenType::from_u8(200), TokenType::None);
    }

    #[test]
    fn test_container_kinds() {
        assert_eq!(TokenType::EndSet.container_kind(), Some(ContainerKind::Set));
        assert_eq!(ContainerKind::Map.end_token(), TokenType::EndMap);
        assert!(TokenType::Binary.is_scalar());
        assert!(!TokenType::StartMap.is_scalar());
    }
}
