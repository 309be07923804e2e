//! Credential exchange, token validation and registration

use super::BackendClient;
use ddrp_core::{DdrpResult, RegisterRequest, TokenResponse};
use log::info;
use reqwest::Method;

impl BackendClient {
    /// `POST /token`: exchange credentials for a bearer token
    ///
    /// The backend expects an OAuth2 password form, so the email travels as `username`.
    pub async fn login(&self, email: &str, password: &str) -> DdrpResult<TokenResponse> {
        let builder = self
            .request(Method::POST, "token", None)
            .form(&[("username", email), ("password", password)]);

        let token = self.send_json::<TokenResponse>(builder, "login").await?;
        info!("Obtained access token for {}", email);
        Ok(token)
    }

    /// `GET /validate_token`: succeeds iff the backend still accepts `token`
    pub async fn validate_token(&self, token: &str) -> DdrpResult<()> {
        let builder = self.request(Method::GET, "validate_token", Some(token));
        self.send(builder, "validate_token").await?;
        Ok(())
    }

    /// `POST /register`
    pub async fn register(&self, request: &RegisterRequest) -> DdrpResult<()> {
        let builder = self.request(Method::POST, "register", None).json(request);
        self.send(builder, "register").await?;
        info!("Registered account for {}", request.email);
        Ok(())
    }
}
