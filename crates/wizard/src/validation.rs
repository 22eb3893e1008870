//! Per-step validation gate.
//!
//! A [`Schema`] lists fields and, for each field, an ordered list of checks
//! with the message to show when the check fails. [`validate`] runs every
//! field of the schema against raw input and either returns the typed values
//! or one message per offending field. It never touches the clock on its
//! own: date checks compare against the `today` argument.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use shared::error::FieldErrors;

use crate::record::{FieldValue, RawInput, ValidatedStep};

const DATE_FORMAT: &str = "%Y-%m-%d";
pub const PASSWORD_SPECIALS: &str = "@$!%*?&#";

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
    )
    .expect("email pattern compiles")
});
// ASCII digits only: `\d` would also match other scripts' digits.
static ZIP5_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{5}$").expect("zip pattern compiles"));
static ZIP_PLUS4_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{5}(-[0-9]{4})?$").expect("zip+4 pattern compiles"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZipFormat {
    /// Exactly five digits.
    FiveDigits,
    /// Five digits, optionally followed by `-` and four more (ZIP+4).
    FiveOrPlusFour,
}

impl ZipFormat {
    pub fn accepts(self, value: &str) -> bool {
        match self {
            Self::FiveDigits => ZIP5_RE.is_match(value),
            Self::FiveOrPlusFour => ZIP_PLUS4_RE.is_match(value),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule {
    Required,
    Email,
    MinLength(usize),
    /// Lowercase, uppercase, digit and one of [`PASSWORD_SPECIALS`], nothing
    /// outside those classes.
    StrongPassword,
    Zip(ZipFormat),
    /// `YYYY-MM-DD`, stored as a typed date.
    Date,
    /// Date no later than the validation day.
    NotInFuture,
}

#[derive(Debug, Clone)]
struct Check {
    rule: Rule,
    message: String,
}

#[derive(Debug, Clone)]
pub struct FieldSpec {
    name: String,
    checks: Vec<Check>,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            checks: Vec::new(),
        }
    }

    pub fn rule(mut self, rule: Rule, message: impl Into<String>) -> Self {
        self.checks.push(Check {
            rule,
            message: message.into(),
        });
        self
    }

    pub fn required(self, message: impl Into<String>) -> Self {
        self.rule(Rule::Required, message)
    }

    pub fn email(self, message: impl Into<String>) -> Self {
        self.rule(Rule::Email, message)
    }

    pub fn min_length(self, len: usize, message: impl Into<String>) -> Self {
        self.rule(Rule::MinLength(len), message)
    }

    pub fn strong_password(self, message: impl Into<String>) -> Self {
        self.rule(Rule::StrongPassword, message)
    }

    pub fn zip(self, format: ZipFormat, message: impl Into<String>) -> Self {
        self.rule(Rule::Zip(format), message)
    }

    pub fn date(self, message: impl Into<String>) -> Self {
        self.rule(Rule::Date, message)
    }

    pub fn not_in_future(self, message: impl Into<String>) -> Self {
        self.rule(Rule::NotInFuture, message)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rules(&self) -> impl Iterator<Item = &Rule> {
        self.checks.iter().map(|check| &check.rule)
    }

    fn required_message(&self) -> Option<&str> {
        self.checks
            .iter()
            .find(|check| check.rule == Rule::Required)
            .map(|check| check.message.as_str())
    }

    fn is_date(&self) -> bool {
        self.rules()
            .any(|rule| matches!(rule, Rule::Date | Rule::NotInFuture))
    }

    /// Runs the non-presence checks in order; the first failure wins.
    fn check(&self, value: &str, today: NaiveDate) -> Result<FieldValue, String> {
        let mut date = None;
        for check in &self.checks {
            let ok = match &check.rule {
                Rule::Required => true,
                Rule::Email => EMAIL_RE.is_match(value),
                Rule::MinLength(len) => value.chars().count() >= *len,
                Rule::StrongPassword => is_strong_password(value),
                Rule::Zip(format) => format.accepts(value),
                Rule::Date => match parse_date(value) {
                    Some(parsed) => {
                        date = Some(parsed);
                        true
                    }
                    None => false,
                },
                Rule::NotInFuture => match date.or_else(|| parse_date(value)) {
                    Some(parsed) => {
                        date = Some(parsed);
                        parsed <= today
                    }
                    None => false,
                },
            };
            if !ok {
                return Err(check.message.clone());
            }
        }

        match date {
            Some(date) if self.is_date() => Ok(FieldValue::Date(date)),
            _ => Ok(FieldValue::Text(value.to_string())),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Schema {
    fields: Vec<FieldSpec>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, spec: FieldSpec) -> Self {
        self.fields.push(spec);
        self
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(FieldSpec::name)
    }
}

/// Validates `input` against every field of `schema`.
///
/// Fields missing from `input` are treated as empty. Input keys the schema
/// does not declare are dropped from the result.
pub fn validate(
    schema: &Schema,
    input: &RawInput,
    today: NaiveDate,
) -> Result<ValidatedStep, FieldErrors> {
    let mut validated = ValidatedStep::default();
    let mut errors = FieldErrors::new();

    for spec in schema.fields() {
        let value = input.get(spec.name()).map(String::as_str).unwrap_or("");
        if value.trim().is_empty() {
            match spec.required_message() {
                Some(message) => errors.insert(spec.name(), message),
                None => validated.insert(spec.name(), FieldValue::Text(value.to_string())),
            }
            continue;
        }

        match spec.check(value, today) {
            Ok(typed) => validated.insert(spec.name(), typed),
            Err(message) => errors.insert(spec.name(), message),
        }
    }

    if errors.is_empty() {
        Ok(validated)
    } else {
        Err(errors)
    }
}

pub fn is_strong_password(value: &str) -> bool {
    let allowed = |c: char| c.is_ascii_alphanumeric() || PASSWORD_SPECIALS.contains(c);
    value.chars().all(allowed)
        && value.chars().any(|c| c.is_ascii_lowercase())
        && value.chars().any(|c| c.is_ascii_uppercase())
        && value.chars().any(|c| c.is_ascii_digit())
        && value.chars().any(|c| PASSWORD_SPECIALS.contains(c))
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).ok()
}

#[cfg(test)]
#[path = "tests/validation_tests.rs"]
mod tests;
