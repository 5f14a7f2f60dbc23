//! New team input

use super::validation::{at_least, required_name};
use super::ValidationError;

/// Maximum length for team names
pub const MAX_TEAM_NAME_LEN: usize = 128;

/// Default starting budget offered by the form (USD)
pub const DEFAULT_TEAM_BUDGET: f64 = 10_000.0;

/// Validated team ready for insertion
#[derive(Debug, Clone, PartialEq)]
pub struct NewTeam {
    name: String,
    members: String,
    budget: f64,
}

impl NewTeam {
    /// Validate raw form input.
    ///
    /// # Rules
    /// - name is trimmed and required, max 128 characters
    /// - members is trimmed free text ("Alice,Bob"), may be empty
    /// - budget must be finite and >= 0
    ///
    /// # Example
    /// ```
    /// use rallyctl_core::models::NewTeam;
    ///
    /// assert!(NewTeam::new("  Red Devils ", "Alice,Bob", 10000.0).is_ok());
    /// assert!(NewTeam::new("   ", "", 10000.0).is_err());
    /// assert!(NewTeam::new("Blue", "", -1.0).is_err());
    /// ```
    pub fn new(name: &str, members: &str, budget: f64) -> Result<Self, ValidationError> {
        Ok(Self {
            name: required_name("Team name", name, MAX_TEAM_NAME_LEN)?,
            members: members.trim().to_owned(),
            budget: at_least("Initial budget", budget, 0.0)?,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn members(&self) -> &str {
        &self.members
    }

    pub fn budget(&self) -> f64 {
        self.budget
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_fields() {
        let team = NewTeam::new("  Red Devils ", " Alice,Bob \n", 500.0).unwrap();
        assert_eq!(team.name(), "Red Devils");
        assert_eq!(team.members(), "Alice,Bob");
        assert_eq!(team.budget(), 500.0);
    }

    #[test]
    fn rejects_blank_name() {
        let err = NewTeam::new(" \t ", "", 0.0).unwrap_err();
        assert!(matches!(err, ValidationError::Empty { field: "Team name" }));
    }

    #[test]
    fn rejects_negative_budget() {
        let err = NewTeam::new("Team", "", -5.0).unwrap_err();
        assert!(matches!(err, ValidationError::BelowMinimum { .. }));
    }

    #[test]
    fn max_length() {
        assert!(NewTeam::new(&"a".repeat(128), "", 0.0).is_ok());
        let err = NewTeam::new(&"a".repeat(129), "", 0.0).unwrap_err();
        assert!(matches!(err, ValidationError::TooLong { max: 128, .. }));
    }
}
