//! Request types for the auth endpoints.

use secrecy::SecretString;
use serde::Deserialize;
use utoipa::ToSchema;

/// Form body shared by login and registration.
#[derive(ToSchema, Deserialize, Debug)]
pub struct CredentialsForm {
    pub email: String,
    #[schema(value_type = String)]
    pub password: SecretString,
}
