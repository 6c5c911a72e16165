use core::str::FromStr;

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::{AppError, Result};

lazy_static! {
    static ref EMAIL: Regex = Regex::new(r"^\w+([.-]?\w+)*@\w+([.-]?\w+)*(\.\w{2,3})+$").unwrap();
    static ref PHONE: Regex = Regex::new(r"^\+?[1-9]\d{1,14}$").unwrap();
}

pub const TITLE_MAX: usize = 100;
pub const PROBLEM_MAX: usize = 1000;
pub const SOLUTION_MAX: usize = 280;
pub const SECRET_SAUCE_MAX: usize = 500;
pub const TARGET_AUDIENCE_MAX: usize = 300;
pub const TAG_MAX: usize = 30;
pub const REVIEW_NOTES_MAX: usize = 1000;
pub const COMMENT_MAX: usize = 1000;
pub const NAME_MAX: usize = 100;
pub const BIO_MAX: usize = 500;
pub const PASSWORD_MIN: usize = 6;

/// Collects every violation of a request so they are reported together.
#[derive(Debug, Default)]
pub struct Violations(Vec<String>);

impl Violations {
    pub fn new() -> Self { Self::default() }

    pub fn push(&mut self, message: impl Into<String>) { self.0.push(message.into()); }

    /// Trimmed, non-empty text no longer than `max` characters.
    pub fn required(
        &mut self,
        value: Option<&str>,
        max: usize,
        missing: &str,
        too_long: &str,
    ) -> Option<String> {
        match value.map(str::trim) {
            None | Some("") => {
                self.push(missing);
                None
            },
            Some(v) => self.bounded(v, max, too_long),
        }
    }

    /// Like `required`, but absence is fine.
    pub fn optional(&mut self, value: Option<&str>, max: usize, too_long: &str) -> Option<String> {
        value.map(str::trim).and_then(|v| self.bounded(v, max, too_long))
    }

    fn bounded(&mut self, value: &str, max: usize, too_long: &str) -> Option<String> {
        match value.chars().count() > max {
            true => {
                self.push(too_long);
                None
            },
            false => Some(value.to_string()),
        }
    }

    /// Parses one of the closed label sets, recording its own "Invalid ..." message.
    pub fn label<T>(&mut self, value: Option<&str>) -> Option<T>
    where T: FromStr<Err = String> {
        match value?.trim().parse() {
            Ok(v) => Some(v),
            Err(e) => {
                self.push(e);
                None
            },
        }
    }

    pub fn labels<T>(&mut self, values: Option<&[String]>) -> Option<Vec<T>>
    where T: FromStr<Err = String> + PartialEq {
        let mut parsed: Vec<T> = vec![];

        for value in values? {
            let label = self.label(Some(value))?;
            if !parsed.contains(&label) {
                parsed.push(label);
            }
        }

        Some(parsed)
    }

    /// Trimmed, non-empty tags, each no longer than the tag limit.
    pub fn tags(&mut self, values: Option<&[String]>) -> Option<Vec<String>> {
        let tags = values?
            .iter()
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>();

        match tags.iter().any(|t| t.chars().count() > TAG_MAX) {
            true => {
                self.push(format!("Each tag cannot be more than {} characters", TAG_MAX));
                None
            },
            false => Some(tags),
        }
    }

    pub fn email(&mut self, value: Option<&str>) -> Option<String> {
        match value.map(str::trim) {
            None | Some("") => {
                self.push("Email is required");
                None
            },
            Some(v) if !EMAIL.is_match(v) => {
                self.push("Please provide a valid email address");
                None
            },
            Some(v) => Some(v.to_lowercase()),
        }
    }

    pub fn phone(&mut self, value: Option<&str>) -> Option<String> {
        match value.map(str::trim) {
            None => None,
            Some(v) if !PHONE.is_match(v) => {
                self.push("Please provide a valid phone number");
                None
            },
            Some(v) => Some(v.to_string()),
        }
    }

    pub fn password(&mut self, value: Option<&str>) -> Option<String> {
        match value {
            Some(v) if v.chars().count() >= PASSWORD_MIN => Some(v.to_string()),
            _ => {
                self.push(format!(
                    "Password must be at least {} characters long",
                    PASSWORD_MIN
                ));
                None
            },
        }
    }

    pub fn year(&mut self, value: Option<i64>) -> Option<u8> {
        match value {
            None => None,
            Some(y @ 1..=6) => Some(y as u8),
            Some(_) => {
                self.push("Year must be between 1 and 6");
                None
            },
        }
    }

    pub fn finish(self) -> Result<()> {
        match self.0.is_empty() {
            true => Ok(()),
            false => Err(AppError::Validation(self.0)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Category, RequiredHelp};

    fn messages(v: Violations) -> Vec<String> {
        match v.finish() {
            Err(AppError::Validation(m)) => m,
            other => panic!("expected violations, got {:?}", other),
        }
    }

    #[test]
    fn required_text() {
        let mut v = Violations::new();

        assert_eq!(v.required(Some("  hi  "), 5, "missing", "long"), Some("hi".to_string()));
        assert_eq!(v.required(Some("   "), 5, "missing", "long"), None);
        assert_eq!(v.required(None, 5, "missing", "long"), None);
        assert_eq!(v.required(Some("toolong"), 5, "missing", "long"), None);

        assert_eq!(messages(v), vec!["missing", "missing", "long"]);
    }

    #[test]
    fn tweet_sized_solution() {
        let mut v = Violations::new();
        let solution = "x".repeat(SOLUTION_MAX + 1);

        v.required(
            Some(&solution),
            SOLUTION_MAX,
            "Solution description is required",
            "Solution must be like a tweet - max 280 characters",
        );

        assert_eq!(
            messages(v),
            vec!["Solution must be like a tweet - max 280 characters"]
        );
    }

    #[test]
    fn emails() {
        let mut v = Violations::new();

        assert_eq!(
            v.email(Some("Priya.Sharma@University.edu")),
            Some("priya.sharma@university.edu".to_string())
        );
        assert_eq!(v.email(Some("not an email")), None);
        assert!(v.finish().is_err());
    }

    #[test]
    fn labels_are_deduplicated() {
        let mut v = Violations::new();
        let raw = vec!["Funding".to_string(), "Funding".to_string(), "Networking".to_string()];

        let parsed: Vec<RequiredHelp> = v.labels(Some(&raw)).unwrap();

        assert_eq!(parsed, vec![RequiredHelp::Funding, RequiredHelp::Networking]);
        assert!(v.finish().is_ok());
    }

    #[test]
    fn unknown_label() {
        let mut v = Violations::new();

        assert_eq!(v.label::<Category>(Some("Cooking")), None);
        assert_eq!(messages(v), vec!["Invalid category"]);
    }

    #[test]
    fn phone_and_year() {
        let mut v = Violations::new();

        assert_eq!(v.phone(Some("+919876543210")), Some("+919876543210".to_string()));
        assert_eq!(v.phone(Some("0123")), None);
        assert_eq!(v.year(Some(3)), Some(3));
        assert_eq!(v.year(Some(7)), None);

        assert_eq!(
            messages(v),
            vec!["Please provide a valid phone number", "Year must be between 1 and 6"]
        );
    }
}
