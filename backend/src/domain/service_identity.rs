//! Fixed identity this service presents to the upstream auth endpoint.

use zeroize::Zeroize;

/// Registration details exchanged for an upstream bearer token.
///
/// The access code and client secret are wiped from memory on drop and never
/// appear in `Debug` output.
///
/// # Examples
/// ```
/// use backend::domain::ServiceIdentity;
///
/// let identity = ServiceIdentity {
///     email: "ops@example.invalid".to_owned(),
///     name: "Pulse".to_owned(),
///     roll_no: "42".to_owned(),
///     access_code: "code".to_owned(),
///     client_id: "client".to_owned(),
///     client_secret: "secret".to_owned(),
/// };
/// assert!(!format!("{identity:?}").contains("secret\""));
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct ServiceIdentity {
    /// Registered contact email.
    pub email: String,
    /// Registered name.
    pub name: String,
    /// Registration roll number.
    pub roll_no: String,
    /// Access code issued at registration.
    pub access_code: String,
    /// OAuth-style client identifier.
    pub client_id: String,
    /// OAuth-style client secret.
    pub client_secret: String,
}

impl std::fmt::Debug for ServiceIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceIdentity")
            .field("email", &self.email)
            .field("name", &self.name)
            .field("roll_no", &self.roll_no)
            .field("access_code", &"<redacted>")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

impl Drop for ServiceIdentity {
    fn drop(&mut self) {
        self.access_code.zeroize();
        self.client_secret.zeroize();
    }
}
