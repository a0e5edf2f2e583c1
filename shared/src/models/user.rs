//! User roles

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::types::UnknownVariant;

/// Role of an account on the platform
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Patient,
    Doctor,
    Admin,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Patient, Role::Doctor, Role::Admin];

    /// Name as stored in the `users.role` column
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Patient => "PATIENT",
            Role::Doctor => "DOCTOR",
            Role::Admin => "ADMIN",
        }
    }

    /// Doctors and admins may manage medical tests
    pub fn is_staff(&self) -> bool {
        matches!(self, Role::Doctor | Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| UnknownVariant::new("role", s, &Role::ALL.map(|r| r.as_str())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trips_through_column_name() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
    }

    #[test]
    fn test_unknown_role_lists_expected_values() {
        let err = "NURSE".parse::<Role>().unwrap_err();
        assert_eq!(err.expected(), "PATIENT, DOCTOR, ADMIN");
    }

    #[test]
    fn test_staff_roles() {
        assert!(!Role::Patient.is_staff());
        assert!(Role::Doctor.is_staff());
        assert!(Role::Admin.is_staff());
    }
}
