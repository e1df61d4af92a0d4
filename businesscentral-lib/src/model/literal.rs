//! Literal values that can appear in a filter expression

use chrono::DateTime;
use chrono::FixedOffset;
use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

/// A constant operand in a predicate tree.
///
/// # Filter Mapping
///
/// | Variant | Rendered as |
/// |---------|-------------|
/// | `Null` | `null` |
/// | `String` | `'text'` (internal quotes doubled) |
/// | `Bool` | `true` / `false` |
/// | `DateTime` | `yyyy-MM-ddTHH:mm:ssZ` in UTC |
/// | `Guid` | unquoted hyphenated form |
/// | `Enum` | `'Name'` |
/// | `Number` | canonical decimal text |
///
/// `Binary` exists so raw payloads can be carried through a tree, but it has
/// no filter representation and fails translation.
///
/// # Example
///
/// ```
/// use businesscentral_lib::model::Literal;
///
/// let name = Literal::from("Contoso");
/// let balance = Literal::from(1_000i64);
/// let blocked = Literal::from(false);
/// let status = Literal::enumeration("Open");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// Null value.
    Null,
    /// Text value.
    String(String),
    /// Boolean value.
    Bool(bool),
    /// Point in time; always rendered in UTC.
    DateTime(DateTime<Utc>),
    /// GUID/UUID value.
    Guid(Uuid),
    /// Symbolic enumeration member, by name.
    Enum(String),
    /// Any numeric value.
    Number(Number),
    /// Raw bytes.
    Binary(Vec<u8>),
}

/// Numeric literal kinds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    /// Signed integer of any width.
    Int(i64),
    /// Unsigned integer of any width.
    UInt(u64),
    /// 32-bit float.
    Single(f32),
    /// 64-bit float.
    Double(f64),
    /// Arbitrary precision decimal.
    Decimal(Decimal),
}

impl Literal {
    /// Creates an enumeration literal from a member name.
    pub fn enumeration(name: impl Into<String>) -> Self {
        Literal::Enum(name.into())
    }

    /// Returns `true` if this is a null value.
    pub fn is_null(&self) -> bool {
        matches!(self, Literal::Null)
    }

    /// Returns the kind name of this literal.
    pub fn type_name(&self) -> &'static str {
        match self {
            Literal::Null => "null",
            Literal::String(_) => "string",
            Literal::Bool(_) => "bool",
            Literal::DateTime(_) => "datetime",
            Literal::Guid(_) => "guid",
            Literal::Enum(_) => "enum",
            Literal::Number(_) => "number",
            Literal::Binary(_) => "binary",
        }
    }
}

impl std::fmt::Display for Number {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Number::Int(n) => write!(f, "{}", n),
            Number::UInt(n) => write!(f, "{}", n),
            Number::Single(n) => write!(f, "{}", n),
            Number::Double(n) => write!(f, "{}", n),
            Number::Decimal(d) => write!(f, "{}", d),
        }
    }
}

impl Number {
    /// Returns `false` for NaN and infinite floats.
    pub fn is_finite(&self) -> bool {
        match self {
            Number::Single(n) => n.is_finite(),
            Number::Double(n) => n.is_finite(),
            _ => true,
        }
    }
}

// =============================================================================
// From implementations
// =============================================================================

macro_rules! impl_from_signed {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Literal {
                fn from(v: $t) -> Self {
                    Literal::Number(Number::Int(i64::from(v)))
                }
            }
        )*
    };
}

macro_rules! impl_from_unsigned {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Literal {
                fn from(v: $t) -> Self {
                    Literal::Number(Number::UInt(u64::from(v)))
                }
            }
        )*
    };
}

impl_from_signed!(i8, i16, i32, i64);
impl_from_unsigned!(u8, u16, u32, u64);

impl From<f32> for Literal {
    fn from(v: f32) -> Self {
        Literal::Number(Number::Single(v))
    }
}

impl From<f64> for Literal {
    fn from(v: f64) -> Self {
        Literal::Number(Number::Double(v))
    }
}

impl From<Decimal> for Literal {
    fn from(v: Decimal) -> Self {
        Literal::Number(Number::Decimal(v))
    }
}

impl From<bool> for Literal {
    fn from(v: bool) -> Self {
        Literal::Bool(v)
    }
}

impl From<String> for Literal {
    fn from(v: String) -> Self {
        Literal::String(v)
    }
}

impl From<&str> for Literal {
    fn from(v: &str) -> Self {
        Literal::String(v.to_string())
    }
}

impl From<Uuid> for Literal {
    fn from(v: Uuid) -> Self {
        Literal::Guid(v)
    }
}

impl From<DateTime<Utc>> for Literal {
    fn from(v: DateTime<Utc>) -> Self {
        Literal::DateTime(v)
    }
}

impl From<DateTime<FixedOffset>> for Literal {
    fn from(v: DateTime<FixedOffset>) -> Self {
        Literal::DateTime(v.with_timezone(&Utc))
    }
}

impl From<Vec<u8>> for Literal {
    fn from(v: Vec<u8>) -> Self {
        Literal::Binary(v)
    }
}

impl<T: Into<Literal>> From<Option<T>> for Literal {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Literal::Null,
        }
    }
}
