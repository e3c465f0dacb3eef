use serde::Deserialize;
use url::Url;

use crate::auth::AuthError;
use crate::config::OAuthConfig;

/// Identity returned by the OAuth provider's userinfo endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderIdentity {
    pub email: String,
    pub name: Option<String>,
    pub picture: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Thin client for the single configured OAuth provider (Google). Endpoint
/// URLs come from configuration so tests can point them at a local stub.
#[derive(Clone)]
pub struct GoogleOAuth {
    http: reqwest::Client,
    config: OAuthConfig,
}

impl GoogleOAuth {
    pub fn new(config: OAuthConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.config.google_client_id.is_empty()
    }

    /// Authorization URL the sign-in surface redirects the browser to.
    pub fn authorize_url(&self) -> Result<String, AuthError> {
        let url = Url::parse_with_params(
            &self.config.google_auth_url,
            &[
                ("client_id", self.config.google_client_id.as_str()),
                ("redirect_uri", self.config.google_redirect_uri.as_str()),
                ("response_type", "code"),
                ("scope", "openid email profile"),
            ],
        )
        .map_err(|e| AuthError::Provider(format!("bad authorize URL: {}", e)))?;
        Ok(url.into())
    }

    /// Exchange an authorization code for the provider identity.
    pub async fn exchange_code(&self, code: &str) -> Result<ProviderIdentity, AuthError> {
        let token: TokenResponse = self
            .http
            .post(&self.config.google_token_url)
            .form(&[
                ("code", code),
                ("client_id", self.config.google_client_id.as_str()),
                ("client_secret", self.config.google_client_secret.as_str()),
                ("redirect_uri", self.config.google_redirect_uri.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .map_err(|e| AuthError::Provider(e.to_string()))?
            .error_for_status()
            .map_err(|e| AuthError::Provider(e.to_string()))?
            .json()
            .await
            .map_err(|e| AuthError::Provider(e.to_string()))?;

        let identity: ProviderIdentity = self
            .http
            .get(&self.config.google_userinfo_url)
            .bearer_auth(&token.access_token)
            .send()
            .await
            .map_err(|e| AuthError::Provider(e.to_string()))?
            .error_for_status()
            .map_err(|e| AuthError::Provider(e.to_string()))?
            .json()
            .await
            .map_err(|e| AuthError::Provider(e.to_string()))?;

        if identity.email.is_empty() {
            return Err(AuthError::Provider("userinfo returned no email".to_string()));
        }

        Ok(identity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> OAuthConfig {
        OAuthConfig {
            google_client_id: "client-123".to_string(),
            google_client_secret: "secret".to_string(),
            google_redirect_uri: "http://localhost:3000/auth/google/callback".to_string(),
            google_auth_url: "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
            google_token_url: "https://oauth2.googleapis.com/token".to_string(),
            google_userinfo_url: "https://openidconnect.googleapis.com/v1/userinfo".to_string(),
        }
    }

    #[test]
    fn authorize_url_carries_client_and_redirect() {
        let oauth = GoogleOAuth::new(test_config());
        let url = oauth.authorize_url().expect("url");
        assert!(url.starts_with("https://accounts.google.com/o/oauth2/v2/auth?"));
        assert!(url.contains("client_id=client-123"));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("scope=openid+email+profile"));
    }

    #[test]
    fn unconfigured_client_is_detected() {
        let mut config = test_config();
        config.google_client_id.clear();
        assert!(!GoogleOAuth::new(config).is_configured());
    }
}
