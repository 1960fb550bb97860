//! Validated value types for domain primitives.
//!
//! - [`Email`]: a normalised, validated email address
//! - [`StudentCode`]: the human-facing sequential student identifier (`SU-NNN`)
//!
//! Both serialize as plain JSON strings and map to `TEXT` columns.

use serde::{Deserialize, Serialize};
use sqlx::{Database, Decode, Encode, Type, postgres::PgTypeInfo};
use std::fmt;
use std::num::NonZeroU64;
use std::str::FromStr;
use utoipa::ToSchema;
use validator::ValidateEmail;

/// Error type for value type parsing failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueTypeError {
    InvalidEmail(String),
    InvalidStudentCode(String),
}

impl std::error::Error for ValueTypeError {}

impl fmt::Display for ValueTypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidEmail(msg) => write!(f, "Invalid email: {}", msg),
            Self::InvalidStudentCode(msg) => write!(f, "Invalid student code: {}", msg),
        }
    }
}

macro_rules! text_column {
    ($name:ident, $decode:expr) => {
        impl Type<sqlx::Postgres> for $name {
            fn type_info() -> PgTypeInfo {
                <String as Type<sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &PgTypeInfo) -> bool {
                <String as Type<sqlx::Postgres>>::compatible(ty)
            }
        }

        impl<'q> Encode<'q, sqlx::Postgres> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut <sqlx::Postgres as Database>::ArgumentBuffer<'q>,
            ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
                <String as Encode<'q, sqlx::Postgres>>::encode_by_ref(&self.to_string(), buf)
            }
        }

        impl<'r> Decode<'r, sqlx::Postgres> for $name {
            fn decode(
                value: <sqlx::Postgres as Database>::ValueRef<'r>,
            ) -> Result<Self, sqlx::error::BoxDynError> {
                let s = <String as Decode<'r, sqlx::Postgres>>::decode(value)?;
                let decode: fn(String) -> Result<Self, ValueTypeError> = $decode;
                decode(s).map_err(Into::into)
            }
        }
    };
}

// ============================================================================
// Email
// ============================================================================

/// A validated email address, stored trimmed and lower-cased so lookups by
/// email are case-insensitive.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[serde(transparent)]
#[schema(value_type = String, format = "email", example = "ada@school.test")]
pub struct Email(String);

impl Email {
    pub fn new(email: impl AsRef<str>) -> Result<Self, ValueTypeError> {
        let email = email.as_ref().trim().to_lowercase();

        if email.is_empty() {
            return Err(ValueTypeError::InvalidEmail("email cannot be empty".into()));
        }

        if !email.validate_email() {
            return Err(ValueTypeError::InvalidEmail(format!(
                "'{}' is not a valid email address",
                email
            )));
        }

        Ok(Self(email))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Email({})", self.0)
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Email {
    type Err = ValueTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for Email {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::new(s).map_err(serde::de::Error::custom)
    }
}

// Rows are trusted: they were validated on the way in.
text_column!(Email, |s| Ok(Email(s)));

// ============================================================================
// StudentCode
// ============================================================================

/// Literal prefix of every student code.
pub const STUDENT_CODE_PREFIX: &str = "SU-";

/// Minimum width of the zero-padded numeric part.
pub const STUDENT_CODE_MIN_DIGITS: usize = 3;

/// A student identifier of the form `SU-NNN`.
///
/// The numeric part is always a positive integer. It is rendered zero-padded
/// to three digits and simply grows wider past `SU-999`.
///
/// ```ignore
/// let code: StudentCode = "SU-042".parse()?;
/// assert_eq!(code.number(), 42);
/// assert_eq!(StudentCode::from_number(1000).unwrap().to_string(), "SU-1000");
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, ToSchema)]
#[schema(value_type = String, example = "SU-001")]
pub struct StudentCode(u64);

impl StudentCode {
    pub const FIRST: StudentCode = StudentCode(1);

    /// Returns `None` for zero, which is not a valid code number.
    #[inline]
    pub const fn from_number(number: u64) -> Option<Self> {
        if number == 0 { None } else { Some(Self(number)) }
    }

    #[inline]
    pub const fn from_nonzero(number: NonZeroU64) -> Self {
        Self(number.get())
    }

    #[inline]
    pub const fn number(self) -> u64 {
        self.0
    }

    /// Extracts the numeric suffix of a stored code without enforcing the
    /// canonical width or a positive value.
    ///
    /// Accepts `SU-` followed by one or more ASCII digits that fit in a `u64`.
    /// Anything else yields `None`; callers scanning legacy data skip those.
    pub fn parse_number(raw: &str) -> Option<u64> {
        let digits = raw.strip_prefix(STUDENT_CODE_PREFIX)?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok()
    }
}

impl fmt::Debug for StudentCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StudentCode({})", self)
    }
}

impl fmt::Display for StudentCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{:0width$}",
            STUDENT_CODE_PREFIX,
            self.0,
            width = STUDENT_CODE_MIN_DIGITS
        )
    }
}

impl FromStr for StudentCode {
    type Err = ValueTypeError;

    /// Strict parse: `^SU-\d{3,}$` with a positive value.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ValueTypeError::InvalidStudentCode(format!("'{}' is not of the form SU-NNN", s));

        let digits = s.strip_prefix(STUDENT_CODE_PREFIX).ok_or_else(invalid)?;
        if digits.len() < STUDENT_CODE_MIN_DIGITS {
            return Err(invalid());
        }

        Self::parse_number(s)
            .and_then(Self::from_number)
            .ok_or_else(invalid)
    }
}

impl PartialEq<str> for StudentCode {
    fn eq(&self, other: &str) -> bool {
        self.to_string() == other
    }
}

impl PartialEq<&str> for StudentCode {
    fn eq(&self, other: &&str) -> bool {
        self.to_string() == *other
    }
}

impl Serialize for StudentCode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for StudentCode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

text_column!(StudentCode, |s| s.parse());
