use serde::{Deserialize, Serialize};

/// Account role as granted by the auth service.
///
/// The platform knows three roles. Any other wire value decodes to
/// [`Role::Unknown`] with the original string kept, so role matches stay
/// total and an unrecognized grant can be routed to a dead end instead of
/// crashing or falling through to a privileged default.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    Donor,
    Ngo,
    Admin,
    Unknown(String),
}

impl Role {
    pub fn as_str(&self) -> &str {
        match self {
            Role::Donor => "DONOR",
            Role::Ngo => "NGO",
            Role::Admin => "ADMIN",
            Role::Unknown(raw) => raw,
        }
    }
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        // Wire strings are matched exactly; case variants are not guessed at.
        match value.as_str() {
            "DONOR" => Role::Donor,
            "NGO" => Role::Ngo,
            "ADMIN" => Role::Admin,
            _ => Role::Unknown(value),
        }
    }
}

impl From<&str> for Role {
    fn from(value: &str) -> Self {
        Role::from(value.to_string())
    }
}

impl From<Role> for String {
    fn from(value: Role) -> Self {
        match value {
            Role::Unknown(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_wire_strings_map_to_known_roles() {
        assert_eq!(Role::from("DONOR"), Role::Donor);
        assert_eq!(Role::from("NGO"), Role::Ngo);
        assert_eq!(Role::from("ADMIN"), Role::Admin);
    }

    #[test]
    fn unrecognized_wire_string_is_preserved_as_unknown() {
        let role = Role::from("VOLUNTEER");
        assert_eq!(role, Role::Unknown("VOLUNTEER".to_string()));
        assert_eq!(role.as_str(), "VOLUNTEER");
    }

    #[test]
    fn case_variants_are_not_guessed_at() {
        assert_eq!(Role::from("donor"), Role::Unknown("donor".to_string()));
        assert_eq!(Role::from("Ngo"), Role::Unknown("Ngo".to_string()));
    }

    #[test]
    fn serde_round_trips_through_wire_strings() {
        let json = serde_json::to_string(&Role::Ngo).unwrap();
        assert_eq!(json, "\"NGO\"");

        let role: Role = serde_json::from_str("\"VOLUNTEER\"").unwrap();
        assert_eq!(role, Role::Unknown("VOLUNTEER".to_string()));
    }

    #[cfg(test)]
    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 512,
                ..ProptestConfig::default()
            })]

            /// Property: every wire string survives a decode/encode round trip
            /// unchanged, whether the role is recognized or not.
            #[test]
            fn wire_strings_round_trip(raw in ".*") {
                let role = Role::from(raw.clone());
                prop_assert_eq!(String::from(role), raw);
            }
        }
    }
}
