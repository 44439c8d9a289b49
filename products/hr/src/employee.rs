use std::{fmt, str::FromStr};

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ValidationError;

const MAX_EMAIL_LEN: usize = 254;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+(?:\.[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+)*@(?:[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?\.)+[A-Za-z]{2,63}$",
    )
    .expect("valid email regex")
});

/// Opaque identifier handed out by the store at insertion time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmployeeId(Uuid);

impl EmployeeId {
    pub(crate) fn random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for EmployeeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.hyphenated().fmt(f)
    }
}

impl FromStr for EmployeeId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

/// A single employee's stored attributes.
///
/// `(first_name, last_name, birthday)` is the business key; two records with
/// the same key describe the same person regardless of `email`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub first_name: String,
    pub last_name: String,
    pub birthday: NaiveDate,
    #[serde(default)]
    pub email: Option<String>,
}

impl Employee {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        birthday: NaiveDate,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            birthday,
            email: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn same_person(&self, other: &Employee) -> bool {
        self.first_name == other.first_name
            && self.last_name == other.last_name
            && self.birthday == other.birthday
    }

    /// Structural checks run before the record may enter a store.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_name("first_name", &self.first_name)?;
        require_name("last_name", &self.last_name)?;
        if let Some(email) = &self.email {
            validate_email(email)?;
        }
        Ok(())
    }
}

/// Untyped candidate as it arrives from a transport.
///
/// Absent fields decode as empty so validation can name them.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct EmployeeDraft {
    #[serde(default, alias = "firstName")]
    pub first_name: String,
    #[serde(default, alias = "lastName")]
    pub last_name: String,
    #[serde(default)]
    pub birthday: String,
    #[serde(default)]
    pub email: Option<String>,
}

impl TryFrom<EmployeeDraft> for Employee {
    type Error = ValidationError;

    fn try_from(draft: EmployeeDraft) -> Result<Self, Self::Error> {
        let birthday = parse_birthday(&draft.birthday)?;
        Ok(Self {
            first_name: draft.first_name,
            last_name: draft.last_name,
            birthday,
            email: draft.email,
        })
    }
}

fn parse_birthday(value: &str) -> Result<NaiveDate, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::new("birthday", "is required"));
    }
    trimmed.parse::<NaiveDate>().map_err(|err| {
        ValidationError::new(
            "birthday",
            format!("{trimmed:?} is not a calendar date ({err})"),
        )
    })
}

fn require_name(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new(field, "must not be empty"));
    }
    Ok(())
}

fn validate_email(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("email", "must not be blank when present"));
    }
    if value.len() > MAX_EMAIL_LEN {
        return Err(ValidationError::new(
            "email",
            format!("must be at most {MAX_EMAIL_LEN} characters"),
        ));
    }
    if !EMAIL_RE.is_match(value) {
        return Err(ValidationError::new(
            "email",
            format!("{value:?} is not a valid email address"),
        ));
    }
    Ok(())
}
