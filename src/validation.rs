//! Validation System - Rule/Policy Separation
//!
//! Rules produce structured violations.
//! Policy maps violations to actions.

use serde::{Deserialize, Serialize};
use crate::config::EmptyPolicy;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ViolationSeverity {
    Error,
    Warning,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationViolation {
    pub rule: String,
    pub severity: ViolationSeverity,
    pub message: String,
    pub expected: Option<String>,
    pub actual: Option<String>,
    pub remediation: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub violations: Vec<ValidationViolation>,
    pub tile_count: usize,
}

impl ValidationResult {
    pub fn success(input: &HostTables<'_>) -> Self {
        Self {
            valid: true,
            violations: vec![],
            tile_count: input.frame_important.len(),
        }
    }

    pub fn failure(input: &HostTables<'_>, violations: Vec<ValidationViolation>) -> Self {
        Self {
            valid: false,
            violations,
            tile_count: input.frame_important.len(),
        }
    }

    pub fn has_errors(&self) -> bool {
        self.violations.iter().any(|v| v.severity == ViolationSeverity::Error)
    }

    /// Error messages joined for reporting.
    pub fn error_summary(&self) -> String {
        self.violations.iter()
            .filter(|v| v.severity == ViolationSeverity::Error)
            .map(|v| match (&v.expected, &v.actual) {
                (Some(expected), Some(actual)) => {
                    format!("{}: {} (expected {}, actual {})", v.rule, v.message, expected, actual)
                }
                _ => format!("{}: {}", v.rule, v.message),
            })
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Validation rule trait - produces violations
pub trait ValidationRule {
    fn name(&self) -> &'static str;
    fn validate(&self, input: &HostTables<'_>) -> Vec<ValidationViolation>;
}

/// Raw tables as supplied by the host, before any snapshot exists.
#[derive(Debug, Clone, Copy)]
pub struct HostTables<'a> {
    pub frame_important: &'a [bool],
    pub solid: &'a [bool],
}

impl<'a> HostTables<'a> {
    pub fn new(frame_important: &'a [bool], solid: &'a [bool]) -> Self {
        Self { frame_important, solid }
    }
}

// --- Concrete Rules ---

pub struct LengthMatchRule;

impl ValidationRule for LengthMatchRule {
    fn name(&self) -> &'static str { "length_match" }

    fn validate(&self, input: &HostTables<'_>) -> Vec<ValidationViolation> {
        let fi = input.frame_important.len();
        let solid = input.solid.len();

        if fi != solid {
            vec![ValidationViolation {
                rule: self.name().to_string(),
                severity: ViolationSeverity::Error,
                message: "Flag tables differ in length".to_string(),
                expected: Some(format!("{} solid entries", fi)),
                actual: Some(format!("{} solid entries", solid)),
                remediation: vec!["Read both tables from the same host state".to_string()],
            }]
        } else {
            vec![]
        }
    }
}

pub struct CountRangeRule;

impl ValidationRule for CountRangeRule {
    fn name(&self) -> &'static str { "count_range" }

    fn validate(&self, input: &HostTables<'_>) -> Vec<ValidationViolation> {
        let n = input.frame_important.len().max(input.solid.len());

        if u32::try_from(n).is_err() {
            vec![ValidationViolation {
                rule: self.name().to_string(),
                severity: ViolationSeverity::Error,
                message: "Tile count exceeds header range".to_string(),
                expected: Some(format!("at most {}", u32::MAX)),
                actual: Some(n.to_string()),
                remediation: vec![],
            }]
        } else {
            vec![]
        }
    }
}

pub struct PopulatedRule;

impl ValidationRule for PopulatedRule {
    fn name(&self) -> &'static str { "populated" }

    fn validate(&self, input: &HostTables<'_>) -> Vec<ValidationViolation> {
        if input.frame_important.is_empty() && input.solid.is_empty() {
            vec![ValidationViolation {
                rule: self.name().to_string(),
                severity: ViolationSeverity::Warning,
                message: "Host tile tables are empty".to_string(),
                expected: Some("at least 1 tile".to_string()),
                actual: Some("0 tiles".to_string()),
                remediation: vec!["Export only after engine initialization has completed".to_string()],
            }]
        } else {
            vec![]
        }
    }
}

/// Validator orchestrates rules and applies policy
pub struct Validator {
    rules: Vec<Box<dyn ValidationRule>>,
    empty_policy: EmptyPolicy,
}

impl Validator {
    pub fn new(empty_policy: EmptyPolicy) -> Self {
        Self {
            rules: vec![
                Box::new(LengthMatchRule),
                Box::new(CountRangeRule),
                Box::new(PopulatedRule),
            ],
            empty_policy,
        }
    }

    pub fn validate(&self, input: &HostTables<'_>) -> ValidationResult {
        let mut all_violations = vec![];

        for rule in &self.rules {
            all_violations.extend(rule.validate(input));
        }

        // An empty table under the block policy is promoted to an error
        if self.empty_policy == EmptyPolicy::Block {
            for v in all_violations.iter_mut().filter(|v| v.rule == "populated") {
                v.severity = ViolationSeverity::Error;
            }
        }

        if all_violations.is_empty() {
            return ValidationResult::success(input);
        }

        let has_errors = all_violations.iter()
            .any(|v| v.severity == ViolationSeverity::Error);

        if has_errors {
            ValidationResult::failure(input, all_violations)
        } else {
            // Warnings never block, just record
            ValidationResult {
                valid: true,
                violations: all_violations,
                tile_count: input.frame_important.len(),
            }
        }
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(EmptyPolicy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matching_tables_pass() {
        let fi = [true, false];
        let solid = [false, true];
        let result = Validator::default().validate(&HostTables::new(&fi, &solid));
        assert!(result.valid);
        assert!(result.violations.is_empty());
        assert_eq!(result.tile_count, 2);
    }

    #[test]
    fn test_length_mismatch_is_error() {
        let fi = [true, false, true];
        let solid = [false];
        let result = Validator::default().validate(&HostTables::new(&fi, &solid));
        assert!(!result.valid);
        assert!(result.has_errors());
        assert!(result.error_summary().contains("length_match"));
        assert!(result.error_summary().contains("expected 3 solid entries, actual 1 solid entries"));
        assert!(!result.violations[0].remediation.is_empty());
    }

    #[test]
    fn test_empty_tables_warn_by_default() {
        let result = Validator::new(EmptyPolicy::Warn).validate(&HostTables::new(&[], &[]));
        assert!(result.valid);
        assert_eq!(result.violations.len(), 1);
        assert_eq!(result.violations[0].severity, ViolationSeverity::Warning);
    }

    #[test]
    fn test_empty_tables_block_when_configured() {
        let result = Validator::new(EmptyPolicy::Block).validate(&HostTables::new(&[], &[]));
        assert!(!result.valid);
        assert!(result.error_summary().contains("populated"));
    }
}
