//! HTTP boundary to the platform auth service.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use givehub_auth::{Role, UserId};

use crate::authorizer::RequestAuthorizer;

/// Login form payload.
#[derive(Debug, Clone, Serialize)]
pub struct LoginCredentials {
    pub email: String,
    pub password: String,
}

/// Registration payload shared by every role's endpoint.
///
/// The organization fields only mean something to the NGO endpoint; the
/// others ignore them. Field validation is the service's job, not this
/// client's.
#[derive(Debug, Clone, Serialize)]
pub struct RegistrationProfile {
    pub name: String,
    pub email: String,
    pub password: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,

    #[serde(rename = "registrationNumber", skip_serializing_if = "Option::is_none")]
    pub registration_number: Option<String>,
}

/// Response envelope every auth endpoint answers with.
///
/// Only `success`, `token` and `message` drive the client; identity fields
/// are read from the decoded credential so envelope and claims cannot
/// disagree.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub success: bool,

    #[serde(default)]
    pub token: Option<String>,

    #[serde(default)]
    pub subject: Option<String>,

    #[serde(default)]
    pub role: Option<Role>,

    #[serde(default, rename = "userId")]
    pub user_id: Option<UserId>,

    #[serde(default)]
    pub message: Option<String>,
}

/// Account summary returned by the authenticated `me` endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountSummary {
    pub email: String,
    pub role: Role,

    #[serde(rename = "userId")]
    pub user_id: UserId,
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("network error: {0}")]
    Network(String),

    #[error("request was not authorized")]
    Unauthorized,

    #[error("API error ({0}): {1}")]
    Api(u16, String),

    #[error("parse error: {0}")]
    Parse(String),
}

/// The auth service surface the session state machine drives.
///
/// Behind a trait so the state machine can be exercised against a scripted
/// collaborator in tests.
#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn login(&self, credentials: &LoginCredentials) -> Result<AuthResponse, GatewayError>;

    async fn register_donor(&self, profile: &RegistrationProfile)
    -> Result<AuthResponse, GatewayError>;

    async fn register_ngo(&self, profile: &RegistrationProfile)
    -> Result<AuthResponse, GatewayError>;

    async fn register_admin(&self, profile: &RegistrationProfile)
    -> Result<AuthResponse, GatewayError>;

    /// Account summary behind the current credential. The one authenticated
    /// call the session core owns.
    async fn me(&self) -> Result<AccountSummary, GatewayError>;
}

/// `reqwest`-backed [`AuthApi`] against the real platform API.
#[derive(Debug, Clone)]
pub struct AuthGateway {
    http: reqwest::Client,
    api_url: String,
    authorizer: RequestAuthorizer,
}

impl AuthGateway {
    pub fn new(api_url: impl Into<String>, authorizer: RequestAuthorizer) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url: api_url.into(),
            authorizer,
        }
    }

    async fn post_auth<B>(&self, path: &str, body: &B) -> Result<AuthResponse, GatewayError>
    where
        B: Serialize + Sync,
    {
        let url = format!("{}{}", self.api_url, path);
        let request = self.authorizer.apply(self.http.post(&url).json(body));

        let response = request
            .send()
            .await
            .map_err(|err| GatewayError::Network(err.to_string()))?;

        Self::read_auth_response(response).await
    }

    /// Auth endpoints answer the envelope on both happy and rejected paths,
    /// sometimes under a 4xx status. Prefer the envelope when it parses and
    /// fall back to the status otherwise.
    async fn read_auth_response(response: reqwest::Response) -> Result<AuthResponse, GatewayError> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| GatewayError::Network(err.to_string()))?;

        match serde_json::from_str::<AuthResponse>(&body) {
            Ok(envelope) => Ok(envelope),
            Err(_) if status == reqwest::StatusCode::UNAUTHORIZED => {
                Err(GatewayError::Unauthorized)
            }
            Err(_) if !status.is_success() => Err(GatewayError::Api(status.as_u16(), body)),
            Err(err) => Err(GatewayError::Parse(err.to_string())),
        }
    }

    async fn get_json<T>(&self, path: &str) -> Result<T, GatewayError>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.api_url, path);
        let request = self.authorizer.apply(self.http.get(&url));

        let response = request
            .send()
            .await
            .map_err(|err| GatewayError::Network(err.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(GatewayError::Unauthorized);
        }
        if !status.is_success() {
            return Err(GatewayError::Api(
                status.as_u16(),
                response.text().await.unwrap_or_default(),
            ));
        }

        response
            .json()
            .await
            .map_err(|err| GatewayError::Parse(err.to_string()))
    }
}

#[async_trait]
impl AuthApi for AuthGateway {
    async fn login(&self, credentials: &LoginCredentials) -> Result<AuthResponse, GatewayError> {
        self.post_auth("/api/auth/login", credentials).await
    }

    async fn register_donor(
        &self,
        profile: &RegistrationProfile,
    ) -> Result<AuthResponse, GatewayError> {
        self.post_auth("/api/donors/register", profile).await
    }

    async fn register_ngo(
        &self,
        profile: &RegistrationProfile,
    ) -> Result<AuthResponse, GatewayError> {
        self.post_auth("/api/ngos/register", profile).await
    }

    async fn register_admin(
        &self,
        profile: &RegistrationProfile,
    ) -> Result<AuthResponse, GatewayError> {
        self.post_auth("/api/admins/register", profile).await
    }

    async fn me(&self) -> Result<AccountSummary, GatewayError> {
        self.get_json("/api/auth/me").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_envelope_parses_without_identity_fields() {
        let envelope: AuthResponse =
            serde_json::from_str(r#"{"success":false,"message":"invalid email or password"}"#)
                .unwrap();

        assert!(!envelope.success);
        assert_eq!(envelope.token, None);
        assert_eq!(
            envelope.message.as_deref(),
            Some("invalid email or password")
        );
    }

    #[test]
    fn grant_envelope_parses_identity_fields() {
        let envelope: AuthResponse = serde_json::from_str(
            r#"{"success":true,"token":"abc","subject":"d@example.org","role":"DONOR","userId":"acct-1"}"#,
        )
        .unwrap();

        assert!(envelope.success);
        assert_eq!(envelope.token.as_deref(), Some("abc"));
        assert_eq!(envelope.role, Some(Role::Donor));
        assert_eq!(envelope.user_id, Some(UserId::new("acct-1")));
    }

    #[test]
    fn ngo_profile_serializes_its_organization_fields() {
        let profile = RegistrationProfile {
            name: "Shelter".to_string(),
            email: "ops@shelter.org".to_string(),
            password: "secret".to_string(),
            organization: Some("Shelter Intl".to_string()),
            registration_number: Some("NGO-4411".to_string()),
        };

        let json = serde_json::to_value(&profile).unwrap();
        assert_eq!(json["organization"], "Shelter Intl");
        assert_eq!(json["registrationNumber"], "NGO-4411");
    }

    #[test]
    fn donor_profile_omits_absent_organization_fields() {
        let profile = RegistrationProfile {
            name: "Dana".to_string(),
            email: "dana@example.org".to_string(),
            password: "secret".to_string(),
            organization: None,
            registration_number: None,
        };

        let json = serde_json::to_value(&profile).unwrap();
        assert!(json.get("organization").is_none());
        assert!(json.get("registrationNumber").is_none());
    }
}
