//! Subject patterns
//!
//! Subjects are `.`-separated tokens. In patterns `*` matches exactly one
//! token and a trailing `>` matches one or more tokens.

use contracts::ContractError;

const SINGLE: &str = "*";
const TAIL: &str = ">";

/// Parsed subscription pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectPattern {
    raw: String,
    tokens: Vec<String>,
}

impl SubjectPattern {
    /// Parse and validate a pattern
    pub fn parse(pattern: &str) -> Result<Self, ContractError> {
        let tokens: Vec<String> = pattern.split('.').map(str::to_string).collect();

        if tokens.iter().any(String::is_empty) {
            return Err(ContractError::subscription(pattern, "empty subject token"));
        }
        if let Some(pos) = tokens.iter().position(|t| t == TAIL) {
            if pos != tokens.len() - 1 {
                return Err(ContractError::subscription(
                    pattern,
                    "'>' is only allowed as the last token",
                ));
            }
        }

        Ok(Self {
            raw: pattern.to_string(),
            tokens,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Whether a concrete subject matches this pattern
    pub fn matches(&self, subject: &str) -> bool {
        let mut parts = subject.split('.');

        for (idx, token) in self.tokens.iter().enumerate() {
            if token == TAIL {
                // at least one remaining token
                let rest_starts = parts.next().is_some_and(|p| !p.is_empty());
                debug_assert_eq!(idx, self.tokens.len() - 1);
                return rest_starts;
            }
            match parts.next() {
                Some(part) if !part.is_empty() && (token == SINGLE || token == part) => {}
                _ => return false,
            }
        }

        parts.next().is_none()
    }
}

/// Validate a concrete publish subject (no wildcards, no empty tokens)
pub fn validate_subject(subject: &str) -> Result<(), ContractError> {
    for token in subject.split('.') {
        if token.is_empty() {
            return Err(ContractError::subscription(subject, "empty subject token"));
        }
        if token == SINGLE || token == TAIL {
            return Err(ContractError::subscription(
                subject,
                "wildcards are not allowed when publishing",
            ));
        }
    }
    Ok(())
}
