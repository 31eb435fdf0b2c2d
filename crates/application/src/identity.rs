use std::sync::Arc;

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use veritrail_core::{AppError, AppResult, UserIdentity};

/// Repository port resolving API token digests to identities.
#[async_trait]
pub trait IdentityRepository: Send + Sync {
    /// Finds the identity behind an active token digest.
    async fn find_identity_by_token_digest(
        &self,
        token_digest: &str,
    ) -> AppResult<Option<UserIdentity>>;
}

/// Returns the lowercase hex SHA-256 digest stored for an API token.
///
/// Only digests are persisted; the raw token is shown once at issue time.
#[must_use]
pub fn token_digest(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    digest
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect::<String>()
}

/// Application service resolving bearer tokens to request identities.
#[derive(Clone)]
pub struct IdentityService {
    repository: Arc<dyn IdentityRepository>,
}

impl IdentityService {
    /// Creates a new service from a repository implementation.
    #[must_use]
    pub fn new(repository: Arc<dyn IdentityRepository>) -> Self {
        Self { repository }
    }

    /// Resolves a bearer token or rejects the request as unauthenticated.
    pub async fn authenticate(&self, token: &str) -> AppResult<UserIdentity> {
        if token.trim().is_empty() {
            return Err(AppError::Unauthorized(
                "missing bearer token".to_owned(),
            ));
        }

        self.repository
            .find_identity_by_token_digest(&token_digest(token))
            .await?
            .ok_or_else(|| AppError::Unauthorized("unknown or revoked bearer token".to_owned()))
    }
}
