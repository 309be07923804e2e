//! Server-side token validation

use async_trait::async_trait;
use ddrp_client::BackendClient;
use ddrp_core::DdrpResult;

/// Confirms with the backend that a token is still accepted
#[async_trait]
pub trait TokenValidator: Send + Sync {
    /// `Ok(())` iff the backend answered with a success status
    async fn validate(&self, token: &str) -> DdrpResult<()>;
}

#[async_trait]
impl TokenValidator for BackendClient {
    async fn validate(&self, token: &str) -> DdrpResult<()> {
        self.validate_token(token).await
    }
}
