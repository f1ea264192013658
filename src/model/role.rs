use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

/// Canonical role set. The legacy data carried role strings in mixed case
/// ("manager", "MANAGER"); parsing is case-insensitive so they all resolve
/// to the same variant, and serialization is always SCREAMING_SNAKE.
/// Deserialization funnels through `FromStr` so JSON payloads get the same
/// tolerance.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Display, EnumString, Serialize, Deserialize, ToSchema,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", try_from = "String")]
pub enum Role {
    Admin = 1,
    Manager = 2,
    Purchase = 3,
    Employee = 4,
}

impl TryFrom<String> for Role {
    type Error = strum::ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl Role {
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Role::Admin),
            2 => Some(Role::Manager),
            3 => Some(Role::Purchase),
            4 => Some(Role::Employee),
            _ => None,
        }
    }

    pub fn id(self) -> u8 {
        self as u8
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::Role;

    #[test]
    fn ids_round_trip() {
        for role in [Role::Admin, Role::Manager, Role::Purchase, Role::Employee] {
            assert_eq!(Role::from_id(role.id()), Some(role));
        }
        assert_eq!(Role::from_id(0), None);
        assert_eq!(Role::from_id(9), None);
    }

    #[test]
    fn parses_legacy_mixed_case_strings() {
        assert_eq!(Role::from_str("manager").unwrap(), Role::Manager);
        assert_eq!(Role::from_str("MANAGER").unwrap(), Role::Manager);
        assert_eq!(Role::from_str("Purchase").unwrap(), Role::Purchase);
        assert_eq!(Role::from_str("admin").unwrap(), Role::Admin);
        assert!(Role::from_str("hod").is_err());
    }

    #[test]
    fn displays_canonical_uppercase() {
        assert_eq!(Role::Employee.to_string(), "EMPLOYEE");
        assert_eq!(Role::Purchase.to_string(), "PURCHASE");
    }

    #[test]
    fn wire_payloads_parse_roles_case_insensitively() {
        assert_eq!(
            serde_json::from_str::<Role>(r#""manager""#).unwrap(),
            Role::Manager
        );
        assert_eq!(
            serde_json::from_str::<Role>(r#""EMPLOYEE""#).unwrap(),
            Role::Employee
        );
        assert_eq!(
            serde_json::to_string(&Role::Purchase).unwrap(),
            r#""PURCHASE""#
        );
        assert!(serde_json::from_str::<Role>(r#""hod""#).is_err());
    }
}
