//! Wire shape of the upstream authentication request.

use serde::Serialize;

use crate::domain::ServiceIdentity;

#[derive(Debug, Serialize)]
pub(super) struct AuthRequestDto<'a> {
    pub(super) email: &'a str,
    pub(super) name: &'a str,
    #[serde(rename = "rollNo")]
    pub(super) roll_no: &'a str,
    #[serde(rename = "accessCode")]
    pub(super) access_code: &'a str,
    #[serde(rename = "clientID")]
    pub(super) client_id: &'a str,
    #[serde(rename = "clientSecret")]
    pub(super) client_secret: &'a str,
}

impl<'a> From<&'a ServiceIdentity> for AuthRequestDto<'a> {
    fn from(identity: &'a ServiceIdentity) -> Self {
        Self {
            email: &identity.email,
            name: &identity.name,
            roll_no: &identity.roll_no,
            access_code: &identity.access_code,
            client_id: &identity.client_id,
            client_secret: &identity.client_secret,
        }
    }
}
