//! Current-user profile payload.
//!
//! The profile endpoints return a `{ status, data }` envelope where `data`
//! holds the user record. The session controller replaces its `User`
//! wholesale on every successful fetch; nothing mutates it in place.

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, NoneAsEmptyString};

/// Role granted to the authenticated user.
///
/// The backend serializes roles as upper-case strings; anything beyond the
/// two administrative roles is preserved verbatim in [`Role::Other`].
#[derive(Clone, Debug, Eq, Hash, PartialEq, Deserialize, Serialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    Admin,
    SuperAdmin,
    Other(String),
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        match value.as_str() {
            "ADMIN" => Self::Admin,
            "SUPERADMIN" => Self::SuperAdmin,
            _ => Self::Other(value),
        }
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        match role {
            Role::Admin => "ADMIN".to_owned(),
            Role::SuperAdmin => "SUPERADMIN".to_owned(),
            Role::Other(value) => value,
        }
    }
}

impl Role {
    /// Whether this role carries administrative privileges.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin | Self::SuperAdmin)
    }
}

/// Profile sub-object: presentation details, not identity.
///
/// The backend sends empty strings for unset fields; those normalize to
/// `None` on deserialization.
#[serde_as]
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq, Deserialize, Serialize)]
pub struct Profile {
    /// Profile picture URL.
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    pub picture: Option<String>,

    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    pub phone: Option<String>,

    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    pub designation: Option<String>,

    /// OAuth provider that issued the account, if any.
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default, rename = "authProvider")]
    pub provider: Option<String>,
}

/// The authenticated user.
///
/// Owned exclusively by the session state and replaced wholesale on every
/// login or profile fetch.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Deserialize, Serialize)]
pub struct User {
    pub id: String,

    pub email: String,

    pub role: Role,

    #[serde(default, rename = "firstName")]
    pub first_name: Option<String>,

    #[serde(default, rename = "lastName")]
    pub last_name: Option<String>,

    #[serde(default)]
    pub profile: Option<Profile>,
}

impl User {
    /// Display name assembled from the name parts, falling back to the
    /// email address.
    #[must_use]
    pub fn display_name(&self) -> String {
        match (self.first_name.as_deref(), self.last_name.as_deref()) {
            (Some(first), Some(last)) => format!("{first} {last}"),
            (Some(name), None) | (None, Some(name)) => name.to_owned(),
            (None, None) => self.email.clone(),
        }
    }

    /// Profile picture URL, if the profile carries one.
    #[must_use]
    pub fn picture(&self) -> Option<&str> {
        self.profile.as_ref()?.picture.as_deref()
    }
}

/// Envelope of the profile endpoints.
///
/// A payload is well-formed for session purposes only when `status` is
/// `true` and `data` is present.
#[derive(Clone, Debug, Deserialize)]
pub struct ProfileResponse {
    #[serde(default)]
    pub status: bool,

    #[serde(default)]
    pub data: Option<User>,
}

impl ProfileResponse {
    /// Extracts the user from a well-formed success payload.
    #[must_use]
    pub fn into_user(self) -> Option<User> {
        if self.status {
            self.data
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trip() {
        assert_eq!(Role::from("ADMIN".to_owned()), Role::Admin);
        assert_eq!(Role::from("SUPERADMIN".to_owned()), Role::SuperAdmin);
        assert_eq!(
            Role::from("EDITOR".to_owned()),
            Role::Other("EDITOR".to_owned())
        );
        assert_eq!(String::from(Role::SuperAdmin), "SUPERADMIN");
        assert!(Role::SuperAdmin.is_admin());
        assert!(!Role::Other("EDITOR".to_owned()).is_admin());
    }

    #[test]
    fn profile_envelope() {
        let response: ProfileResponse = serde_json::from_str(
            r#"{
                "status": true,
                "data": {
                    "id": "42",
                    "email": "admin@example.com",
                    "role": "ADMIN",
                    "firstName": "Ada",
                    "profile": { "picture": "https://cdn.example.com/ada.png" }
                }
            }"#,
        )
        .expect("profile response");

        let user = response.into_user().expect("user");
        assert_eq!(user.display_name(), "Ada");
        assert_eq!(user.picture(), Some("https://cdn.example.com/ada.png"));
    }

    #[test]
    fn empty_strings_normalize_to_none() {
        let profile: Profile = serde_json::from_str(
            r#"{"picture": "", "phone": "", "designation": "CTO", "authProvider": ""}"#,
        )
        .expect("profile");
        assert_eq!(profile.picture, None);
        assert_eq!(profile.phone, None);
        assert_eq!(profile.designation.as_deref(), Some("CTO"));
        assert_eq!(profile.provider, None);
    }

    #[test]
    fn false_status_is_not_well_formed() {
        let response: ProfileResponse =
            serde_json::from_str(r#"{"status": false}"#).expect("profile response");
        assert!(response.into_user().is_none());
    }

    #[test]
    fn display_name_falls_back_to_email() {
        let user: User = serde_json::from_str(
            r#"{"id":"1","email":"someone@example.com","role":"EDITOR"}"#,
        )
        .expect("user");
        assert_eq!(user.display_name(), "someone@example.com");
    }
}
