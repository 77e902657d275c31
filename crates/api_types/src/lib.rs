use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, Utc};
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A signed monetary amount, stored as integer minor units (hundredths).
///
/// On the wire it is accepted as a JSON number or a decimal string and
/// always serialized as a decimal string with trailing zeros trimmed
/// (`10000` in, `"10000"` out; `10.50` in, `"10.5"` out).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Amount(i64);

impl Amount {
    pub fn from_minor(minor: i64) -> Self {
        Self(minor)
    }

    /// The amount in minor units (hundredths).
    pub fn minor(self) -> i64 {
        self.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let units = abs / 100;
        let cents = abs % 100;
        if cents == 0 {
            write!(f, "{sign}{units}")
        } else if cents % 10 == 0 {
            write!(f, "{sign}{units}.{}", cents / 10)
        } else {
            write!(f, "{sign}{units}.{cents:02}")
        }
    }
}

/// Error returned when a decimal amount string cannot be parsed.
#[derive(Debug, PartialEq, Eq)]
pub struct ParseAmountError;

impl fmt::Display for ParseAmountError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("invalid decimal amount")
    }
}

impl std::error::Error for ParseAmountError {}

impl FromStr for Amount {
    type Err = ParseAmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (negative, rest) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s.strip_prefix('+').unwrap_or(s)),
        };
        let (units_str, frac_str) = match rest.split_once('.') {
            Some((units, frac)) => (units, frac),
            None => (rest, ""),
        };
        if units_str.is_empty() && frac_str.is_empty() {
            return Err(ParseAmountError);
        }
        if !units_str.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ParseAmountError);
        }
        if frac_str.len() > 2 || !frac_str.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ParseAmountError);
        }
        let units: i64 = if units_str.is_empty() {
            0
        } else {
            units_str.parse().map_err(|_| ParseAmountError)?
        };
        let mut cents: i64 = if frac_str.is_empty() {
            0
        } else {
            frac_str.parse().map_err(|_| ParseAmountError)?
        };
        if frac_str.len() == 1 {
            cents *= 10;
        }
        let minor = units
            .checked_mul(100)
            .and_then(|minor| minor.checked_add(cents))
            .ok_or(ParseAmountError)?;
        Ok(Self(if negative { -minor } else { minor }))
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct AmountVisitor;

        impl Visitor<'_> for AmountVisitor {
            type Value = Amount;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a monetary amount as a number or decimal string")
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Amount, E> {
                v.checked_mul(100)
                    .map(Amount)
                    .ok_or_else(|| E::custom("amount out of range"))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Amount, E> {
                i64::try_from(v)
                    .ok()
                    .and_then(|v| v.checked_mul(100))
                    .map(Amount)
                    .ok_or_else(|| E::custom("amount out of range"))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Amount, E> {
                let minor = (v * 100.0).round();
                if !minor.is_finite() || minor < i64::MIN as f64 || minor > i64::MAX as f64 {
                    return Err(E::custom("amount out of range"));
                }
                Ok(Amount(minor as i64))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Amount, E> {
                v.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_any(AmountVisitor)
    }
}

/// Confirmation body for deletes and logout.
#[derive(Debug, Serialize, Deserialize)]
pub struct Message {
    pub message: String,
}

impl Message {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Deserializes a field that distinguishes "absent" from "explicit null":
/// combined with `#[serde(default)]`, absent stays `None` while `null`
/// becomes `Some(None)`.
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

pub mod user {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Register {
        pub username: String,
        pub password: String,
        pub name: String,
        pub email: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Login {
        pub username: String,
        pub password: String,
    }

    /// Request body for updating the authenticated user's profile.
    /// Absent fields are left untouched.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct ProfileUpdate {
        pub name: Option<String>,
        pub password: Option<String>,
    }

    /// Public user projection. Never carries the credential hash or token.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct UserView {
        pub username: String,
        pub name: String,
        pub email: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Token {
        pub token: String,
    }
}

pub mod group {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct GroupNew {
        pub name: String,
        pub description: Option<String>,
    }

    /// Absent fields are left untouched.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct GroupUpdate {
        pub name: Option<String>,
        pub description: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct GroupView {
        pub id: Uuid,
        pub name: String,
        pub description: Option<String>,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }
}

pub mod category {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryNew {
        pub name: String,
        pub note: Option<String>,
    }

    /// Absent fields are left untouched.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct CategoryUpdate {
        pub name: Option<String>,
        pub note: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CategoryView {
        pub id: Uuid,
        pub group_id: Uuid,
        pub name: String,
        pub note: Option<String>,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }
}

pub mod expense {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ExpenseNew {
        pub group_id: Uuid,
        pub category_id: Option<Uuid>,
        /// RFC3339 timestamp, including timezone offset (local user time).
        pub date: DateTime<FixedOffset>,
        pub title: String,
        pub amount: Amount,
        pub note: Option<String>,
    }

    /// Partial update. Absent fields are left untouched; `categoryId` and
    /// `note` accept an explicit `null` to clear the stored value.
    #[derive(Debug, Default, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ExpenseUpdate {
        pub group_id: Option<Uuid>,
        #[serde(default, deserialize_with = "crate::double_option")]
        pub category_id: Option<Option<Uuid>>,
        /// RFC3339 timestamp, including timezone offset (local user time).
        pub date: Option<DateTime<FixedOffset>>,
        pub title: Option<String>,
        pub amount: Option<Amount>,
        #[serde(default, deserialize_with = "crate::double_option")]
        pub note: Option<Option<String>>,
    }

    /// Query parameters for the expense listing. Date bounds are inclusive
    /// on both ends.
    #[derive(Debug, Default, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ExpenseList {
        pub group_id: Option<Uuid>,
        pub category_id: Option<Uuid>,
        pub start: Option<DateTime<FixedOffset>>,
        pub end: Option<DateTime<FixedOffset>>,
        /// 1-based page number, defaults to 1.
        pub page: Option<i64>,
        /// Page size, defaults to 10.
        pub limit: Option<i64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ExpenseView {
        pub id: Uuid,
        pub group_id: Uuid,
        pub category_id: Option<Uuid>,
        pub date: DateTime<Utc>,
        pub title: String,
        pub amount: Amount,
        pub note: Option<String>,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct PageMeta {
        pub page: i64,
        pub limit: i64,
        pub total: i64,
        pub total_pages: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpensePage {
        pub data: Vec<ExpenseView>,
        pub meta: PageMeta,
    }
}
