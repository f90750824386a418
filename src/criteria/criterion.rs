//! A single smart-group / advanced-search rule.

use crate::error::{ModelError, ModelResult};
use crate::xml::XmlElement;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// Boolean join between a criterion and the one before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AndOr {
    And,
    Or,
}

impl AndOr {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::And => "and",
            Self::Or => "or",
        }
    }
}

impl fmt::Display for AndOr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AndOr {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "and" => Ok(Self::And),
            "or" => Ok(Self::Or),
            other => Err(ModelError::invalid_data(format!(
                "and_or must be 'and' or 'or', got '{}'",
                other
            ))),
        }
    }
}

/// Comparison applied by a criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SearchType {
    Is,
    IsNot,
    Like,
    NotLike,
    Has,
    DoesNotHave,
    MoreThan,
    LessThan,
    GreaterThan,
    LessThanOrEqual,
    GreaterThanOrEqual,
    BeforeDate,
    AfterDate,
    MoreThanDaysAgo,
    LessThanDaysAgo,
    InMoreThanDays,
    InLessThanDays,
    MemberOf,
    NotMemberOf,
    Current,
    NotCurrent,
    MatchesRegex,
    DoesNotMatchRegex,
}

impl SearchType {
    /// Every search type, in the server's order.
    pub const ALL: [SearchType; 23] = [
        Self::Is,
        Self::IsNot,
        Self::Like,
        Self::NotLike,
        Self::Has,
        Self::DoesNotHave,
        Self::MoreThan,
        Self::LessThan,
        Self::GreaterThan,
        Self::LessThanOrEqual,
        Self::GreaterThanOrEqual,
        Self::BeforeDate,
        Self::AfterDate,
        Self::MoreThanDaysAgo,
        Self::LessThanDaysAgo,
        Self::InMoreThanDays,
        Self::InLessThanDays,
        Self::MemberOf,
        Self::NotMemberOf,
        Self::Current,
        Self::NotCurrent,
        Self::MatchesRegex,
        Self::DoesNotMatchRegex,
    ];

    /// Wire text of the search type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Is => "is",
            Self::IsNot => "is not",
            Self::Like => "like",
            Self::NotLike => "not like",
            Self::Has => "has",
            Self::DoesNotHave => "does not have",
            Self::MoreThan => "more than",
            Self::LessThan => "less than",
            Self::GreaterThan => "greater than",
            Self::LessThanOrEqual => "less than or equal",
            Self::GreaterThanOrEqual => "greater than or equal",
            Self::BeforeDate => "before (yyyy-mm-dd)",
            Self::AfterDate => "after (yyyy-mm-dd)",
            Self::MoreThanDaysAgo => "more than x days ago",
            Self::LessThanDaysAgo => "less than x days ago",
            Self::InMoreThanDays => "in more than x days",
            Self::InLessThanDays => "in less than x days",
            Self::MemberOf => "member of",
            Self::NotMemberOf => "not member of",
            Self::Current => "current",
            Self::NotCurrent => "not current",
            Self::MatchesRegex => "matches regex",
            Self::DoesNotMatchRegex => "does not match regex",
        }
    }

    /// Search types whose value must be an integer.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Self::MoreThan
                | Self::LessThan
                | Self::GreaterThan
                | Self::LessThanOrEqual
                | Self::GreaterThanOrEqual
                | Self::MoreThanDaysAgo
                | Self::LessThanDaysAgo
                | Self::InMoreThanDays
                | Self::InLessThanDays
        )
    }

    /// Search types whose value must be a `yyyy-mm-dd` date.
    pub fn is_date(&self) -> bool {
        matches!(self, Self::BeforeDate | Self::AfterDate)
    }

    /// Check a value's format against this search type.
    pub fn check_value(&self, value: &str) -> ModelResult<()> {
        let digits = value.trim();
        if self.is_numeric() && (digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit())) {
            return Err(ModelError::invalid_data(format!(
                "Value must be a non-negative integer for search type '{}', got '{}'",
                self, value
            )));
        }
        if self.is_date() && NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").is_err() {
            return Err(ModelError::invalid_data(format!(
                "Value must be a yyyy-mm-dd date for search type '{}', got '{}'",
                self, value
            )));
        }
        Ok(())
    }
}

impl fmt::Display for SearchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchType {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == wanted)
            .ok_or_else(|| ModelError::invalid_data(format!("Unknown search type '{}'", s)))
    }
}

/// One rule of a [`Criteria`](super::Criteria) list.
///
/// Equality, hashing and ordering consider only the signature
/// `(and_or, name, search_type, value)`; priority and parentheses are ignored.
#[derive(Debug, Clone)]
pub struct Criterion {
    priority: usize,
    and_or: AndOr,
    name: String,
    search_type: SearchType,
    value: String,
    opening_paren: bool,
    closing_paren: bool,
}

impl Criterion {
    /// A new criterion; the value is checked against the search type.
    pub fn new(
        and_or: AndOr,
        name: impl Into<String>,
        search_type: SearchType,
        value: impl Into<String>,
    ) -> ModelResult<Self> {
        let value = value.into();
        search_type.check_value(&value)?;
        Ok(Self {
            priority: 0,
            and_or,
            name: name.into(),
            search_type,
            value,
            opening_paren: false,
            closing_paren: false,
        })
    }

    /// Builder form for parenthesis markers.
    pub fn with_parens(mut self, opening: bool, closing: bool) -> Self {
        self.opening_paren = opening;
        self.closing_paren = closing;
        self
    }

    /// Parse a classic API criterion object.
    pub fn from_classic(raw: &Value) -> ModelResult<Self> {
        let text = |key: &str| -> ModelResult<String> {
            match raw.get(key) {
                Some(Value::String(s)) => Ok(s.clone()),
                Some(Value::Number(n)) => Ok(n.to_string()),
                Some(Value::Bool(b)) => Ok(b.to_string()),
                _ => Err(ModelError::missing_data(format!("Criterion is missing '{}'", key))),
            }
        };
        let flag = |key: &str| raw.get(key).and_then(Value::as_bool).unwrap_or(false);

        let mut criterion = Self::new(
            text("and_or")?.parse()?,
            text("name")?,
            text("search_type")?.parse()?,
            text("value")?,
        )?
        .with_parens(flag("opening_paren"), flag("closing_paren"));
        criterion.priority = raw
            .get("priority")
            .and_then(Value::as_u64)
            .map(|p| p as usize)
            .unwrap_or(0);
        Ok(criterion)
    }

    pub fn priority(&self) -> usize {
        self.priority
    }

    pub(crate) fn set_priority(&mut self, priority: usize) {
        self.priority = priority;
    }

    pub fn and_or(&self) -> AndOr {
        self.and_or
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn search_type(&self) -> SearchType {
        self.search_type
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn opening_paren(&self) -> bool {
        self.opening_paren
    }

    pub fn closing_paren(&self) -> bool {
        self.closing_paren
    }

    pub fn set_and_or(&mut self, and_or: AndOr) {
        self.and_or = and_or;
    }

    pub fn set_name(&mut self, name: impl Into<String>) -> ModelResult<()> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ModelError::missing_data("Criterion name cannot be empty"));
        }
        self.name = name;
        Ok(())
    }

    /// Change the search type; the current value must suit the new type.
    pub fn set_search_type(&mut self, search_type: SearchType) -> ModelResult<()> {
        search_type.check_value(&self.value)?;
        self.search_type = search_type;
        Ok(())
    }

    pub fn set_value(&mut self, value: impl Into<String>) -> ModelResult<()> {
        let value = value.into();
        self.search_type.check_value(&value)?;
        self.value = value;
        Ok(())
    }

    pub fn set_opening_paren(&mut self, paren: bool) {
        self.opening_paren = paren;
    }

    pub fn set_closing_paren(&mut self, paren: bool) {
        self.closing_paren = paren;
    }

    /// The fields that define identity.
    pub fn signature(&self) -> (AndOr, &str, SearchType, &str) {
        (self.and_or, &self.name, self.search_type, &self.value)
    }

    /// `<criterion>` element for classic writes.
    pub fn to_xml(&self) -> XmlElement {
        XmlElement::new("criterion")
            .child(XmlElement::with_text("name", &self.name))
            .child(XmlElement::with_text("priority", self.priority))
            .child(XmlElement::with_text("and_or", self.and_or))
            .child(XmlElement::with_text("search_type", self.search_type))
            .child(XmlElement::with_text("value", &self.value))
            .child(XmlElement::with_text("opening_paren", self.opening_paren))
            .child(XmlElement::with_text("closing_paren", self.closing_paren))
    }
}

impl PartialEq for Criterion {
    fn eq(&self, other: &Self) -> bool {
        self.signature() == other.signature()
    }
}

impl Eq for Criterion {}

impl Hash for Criterion {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.signature().hash(state);
    }
}

impl PartialOrd for Criterion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Criterion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.signature().cmp(&other.signature())
    }
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{} {} {} '{}'{}",
            if self.opening_paren { "(" } else { "" },
            self.and_or,
            self.name,
            self.search_type,
            self.value,
            if self.closing_paren { ")" } else { "" }
        )
    }
}
