//! Login gate.
//!
//! A credential is either a personal Perplexity key (recognised by its
//! prefix and used as-is) or the shared deployment password, which unlocks
//! the deployment's default key.

use crate::secrets::DeploymentSecrets;
use crate::session::SessionContext;

pub const API_KEY_PREFIX: &str = "pplx-";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoginError {
    #[error("Invalid key or password")]
    InvalidCredential,
    #[error("The default API key is missing from the deployment secrets")]
    MissingDefaultKey,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginMethod {
    PersonalKey,
    SharedPassword,
}

/// Check `credential` and, on success, mark the session authenticated with
/// the matching API key. The credential is compared as typed, with no
/// trimming. The session is untouched on failure.
pub fn login(
    session: &mut SessionContext,
    credential: &str,
    secrets: &DeploymentSecrets,
) -> Result<LoginMethod, LoginError> {
    let (key, method) = if credential.starts_with(API_KEY_PREFIX) {
        (credential, LoginMethod::PersonalKey)
    } else if !credential.is_empty() && secrets.password() == Some(credential) {
        let key = secrets
            .default_api_key()
            .ok_or(LoginError::MissingDefaultKey)?;
        (key, LoginMethod::SharedPassword)
    } else {
        tracing::warn!("login rejected");
        return Err(LoginError::InvalidCredential);
    };

    session.store_login_key(key);
    session.authenticated = true;
    tracing::info!(method = ?method, "logged in");
    Ok(method)
}
