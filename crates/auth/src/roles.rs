use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Actor role.
///
/// Every authenticated request acts as exactly one role; what the role may do
/// is looked up in static tables (see `permissions`), never branched on ad hoc.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Merchant,
    Courier,
    Operator,
    Buyer,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Merchant, Role::Courier, Role::Operator, Role::Buyer];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Merchant => "merchant",
            Role::Courier => "courier",
            Role::Operator => "operator",
            Role::Buyer => "buyer",
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role '{0}'")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|r| r.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownRole(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("Operator".parse::<Role>().unwrap(), Role::Operator);
        assert_eq!(" courier ".parse::<Role>().unwrap(), Role::Courier);
        assert!("admin".parse::<Role>().is_err());
    }

    #[test]
    fn serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Merchant).unwrap(), "\"merchant\"");
    }
}
