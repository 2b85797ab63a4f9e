//! # Intake Filters
//!
//! Normalisation and validation applied to the free-text parts of a new
//! exception before it is stored. Each filter lower-cases its input and
//! returns the normalised value, or a [`ValidationError`] explaining every
//! rule that was broken. An invalid value is never returned alongside an
//! error.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Required username length.
pub const USERNAME_LEN: usize = 7;

/// Services accepted when no configuration overrides them.
pub const DEFAULT_SERVICES: &[&str] = &[
    "myriad",
    "legion",
    "grace",
    "aristotle",
    "thomas",
    "michael",
    "kathleen",
    "none",
];

/// Exception types accepted when no configuration overrides them.
pub const DEFAULT_EXCEPTION_TYPES: &[&str] =
    &["quota", "queue", "access", "special", "sharedspace"];

/// The allowed services and exception types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntakePolicy {
    /// Services an exception may apply to.
    pub services: Vec<String>,
    /// Kinds of exception that may be requested.
    pub exception_types: Vec<String>,
}

impl Default for IntakePolicy {
    fn default() -> Self {
        Self {
            services: DEFAULT_SERVICES.iter().map(|s| s.to_string()).collect(),
            exception_types: DEFAULT_EXCEPTION_TYPES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl IntakePolicy {
    /// Normalise and validate a username.
    ///
    /// Usernames are exactly [`USERNAME_LEN`] characters of `[a-z0-9]`
    /// after lower-casing.
    pub fn filter_username(&self, name: &str) -> Result<String, ValidationError> {
        let name = name.to_lowercase();
        let mut problems = Vec::new();

        let len = name.chars().count();
        if len != USERNAME_LEN {
            problems.push(format!(
                "username is incorrect length: {len}, not {USERNAME_LEN}"
            ));
        }
        for c in name.chars() {
            if !(c.is_ascii_lowercase() || c.is_ascii_digit()) {
                problems.push(format!("invalid character in username: {c:?}"));
            }
        }

        if problems.is_empty() {
            Ok(name)
        } else {
            Err(ValidationError::Username { problems })
        }
    }

    /// Normalise and validate a service name.
    pub fn filter_service(&self, service: &str) -> Result<String, ValidationError> {
        let service = service.to_lowercase();
        if self.services.iter().any(|s| *s == service) {
            Ok(service)
        } else {
            Err(ValidationError::Service {
                given: service,
                allowed: self.services.clone(),
            })
        }
    }

    /// Normalise and validate an exception type.
    pub fn filter_exception_type(&self, kind: &str) -> Result<String, ValidationError> {
        let kind = kind.to_lowercase();
        if self.exception_types.iter().any(|t| *t == kind) {
            Ok(kind)
        } else {
            Err(ValidationError::ExceptionType {
                given: kind,
                allowed: self.exception_types.clone(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn username_is_lowercased() {
        let policy = IntakePolicy::default();
        assert_eq!(policy.filter_username("CCSPAPP").unwrap(), "ccspapp");
        assert_eq!(policy.filter_username("uccaw12").unwrap(), "uccaw12");
    }

    #[test]
    fn username_reports_every_problem() {
        let policy = IntakePolicy::default();
        let err = policy.filter_username("ab-c").unwrap_err();
        match err {
            ValidationError::Username { problems } => {
                assert_eq!(problems.len(), 2);
                assert!(problems[0].contains("incorrect length: 4"));
                assert!(problems[1].contains("'-'"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn service_must_be_listed() {
        let policy = IntakePolicy::default();
        assert_eq!(policy.filter_service("Grace").unwrap(), "grace");
        assert!(matches!(
            policy.filter_service("hal9000"),
            Err(ValidationError::Service { .. })
        ));
    }

    #[test]
    fn exception_type_must_be_listed() {
        let policy = IntakePolicy::default();
        assert_eq!(policy.filter_exception_type("QUEUE").unwrap(), "queue");
        assert!(policy.filter_exception_type("pony").is_err());
    }

    #[test]
    fn custom_policy_replaces_defaults() {
        let policy = IntakePolicy {
            services: vec!["kathleen".into()],
            exception_types: vec!["gpu".into()],
        };
        assert!(policy.filter_service("myriad").is_err());
        assert_eq!(policy.filter_exception_type("GPU").unwrap(), "gpu");
    }

    #[test]
    fn partial_yaml_style_policy_keeps_defaults() {
        let policy: IntakePolicy =
            serde_json::from_str(r#"{"services": ["young"]}"#).unwrap();
        assert_eq!(policy.services, vec!["young".to_string()]);
        assert_eq!(policy.exception_types.len(), DEFAULT_EXCEPTION_TYPES.len());
    }

    proptest! {
        #[test]
        fn accepted_usernames_are_seven_lowercase_alnum(name in "[A-Za-z0-9]{7}") {
            let policy = IntakePolicy::default();
            let accepted = policy.filter_username(&name).unwrap();
            prop_assert_eq!(accepted.len(), USERNAME_LEN);
            prop_assert!(accepted.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
        }

        #[test]
        fn wrong_length_is_rejected(name in "[a-z0-9]{0,6}|[a-z0-9]{8,12}") {
            let policy = IntakePolicy::default();
            prop_assert!(policy.filter_username(&name).is_err());
        }
    }
}
