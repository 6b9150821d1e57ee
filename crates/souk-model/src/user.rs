// SPDX-License-Identifier: Apache-2.0

use crate::fields::{EmailAddress, ParseError};
use crate::ids::{UserId, VendorId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum Role {
    User,
    Admin,
    Vendor,
}

impl Role {
    pub fn parse(raw: &str) -> Result<Self, ParseError> {
        match raw {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            "vendor" => Ok(Self::Vendor),
            _ => Err(ParseError::InvalidFormat(
                "role must be one of 'user', 'admin', 'vendor'",
            )),
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
            Self::Vendor => "vendor",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: EmailAddress,
    // Argon2id PHC string; never leaves the process in a response body.
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub role: Role,
    pub vendor_id: Option<VendorId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl User {
    #[must_use]
    pub fn new(
        id: UserId,
        name: String,
        email: EmailAddress,
        password_hash: String,
        role: Role,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name,
            email,
            password_hash,
            role,
            vendor_id: None,
            created_at: at,
            updated_at: at,
            deleted_at: None,
        }
    }

    /// The vendor back-reference exists exactly when the role is vendor.
    pub fn validate(&self) -> Result<(), ParseError> {
        match (self.role, self.vendor_id.as_ref()) {
            (Role::Vendor, None) => Err(ParseError::InvalidFormat(
                "vendor accounts must reference a vendor",
            )),
            (Role::User | Role::Admin, Some(_)) => Err(ParseError::InvalidFormat(
                "only vendor accounts may reference a vendor",
            )),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user(role: Role) -> User {
        User::new(
            UserId::generate(),
            "Aisha".to_string(),
            EmailAddress::parse("aisha@example.com").expect("email"),
            "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".to_string(),
            role,
            Utc::now(),
        )
    }

    #[test]
    fn vendor_role_requires_back_reference() {
        let mut user = sample_user(Role::Vendor);
        assert!(user.validate().is_err());
        user.vendor_id = Some(crate::ids::VendorId::generate());
        assert!(user.validate().is_ok());
    }

    #[test]
    fn customer_role_refuses_back_reference() {
        let mut user = sample_user(Role::User);
        assert!(user.validate().is_ok());
        user.vendor_id = Some(crate::ids::VendorId::generate());
        assert!(user.validate().is_err());
    }

    #[test]
    fn password_hash_is_never_serialized() {
        let user = sample_user(Role::User);
        let json = serde_json::to_value(&user).expect("json");
        assert!(json.get("password_hash").is_none());
    }
}
