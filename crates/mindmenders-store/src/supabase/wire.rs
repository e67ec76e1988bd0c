//! Request and response bodies of the GoTrue and PostgREST endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub user_metadata: Value,
}

impl AuthUser {
    /// `full_name` given at sign up
    pub fn metadata_name(&self) -> Option<String> {
        self.user_metadata
            .get("full_name")
            .and_then(Value::as_str)
            .filter(|name| !name.trim().is_empty())
            .map(str::to_string)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub user: AuthUser,
}

impl TokenResponse {
    pub fn expires_at(&self, now: DateTime<Utc>) -> i64 {
        self.expires_at
            .or_else(|| self.expires_in.map(|secs| now.timestamp() + secs))
            .unwrap_or_else(|| now.timestamp() + 3600)
    }
}

/// `/signup` answers with a full session when email confirmation is off,
/// otherwise with the bare user (sometimes wrapped as `{ "user": ... }`).
#[derive(Debug)]
pub(crate) enum SignUpResponse {
    Session(TokenResponse),
    Pending(AuthUser),
}

impl SignUpResponse {
    pub fn parse(value: Value) -> Result<Self, serde_json::Error> {
        if value.get("access_token").and_then(Value::as_str).is_some() {
            return Ok(Self::Session(serde_json::from_value(value)?));
        }
        match value.get("user") {
            Some(user) if user.is_object() => Ok(Self::Pending(serde_json::from_value(user.clone())?)),
            _ => Ok(Self::Pending(serde_json::from_value(value)?)),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct PasswordGrant<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct RefreshGrant<'a> {
    pub refresh_token: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct SignUpRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub data: SignUpMetadata<'a>,
}

#[derive(Debug, Serialize)]
pub(crate) struct SignUpMetadata<'a> {
    pub full_name: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProfileRow {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ProfileUpsert<'a> {
    pub id: &'a str,
    pub email: &'a str,
    pub name: &'a str,
}

/// Pull a readable message out of a GoTrue / PostgREST error body
pub(crate) fn error_message(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return body.trim().to_string();
    };

    ["msg", "error_description", "message", "error"]
        .iter()
        .find_map(|key| value.get(*key).and_then(Value::as_str))
        .map(str::to_string)
        .unwrap_or_else(|| body.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_message_fields() {
        assert_eq!(
            error_message(r#"{"code":400,"error_code":"email_not_confirmed","msg":"Email not confirmed"}"#),
            "Email not confirmed"
        );
        assert_eq!(
            error_message(r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#),
            "Invalid login credentials"
        );
        assert_eq!(
            error_message(r#"{"code":"42501","message":"new row violates row-level security policy"}"#),
            "new row violates row-level security policy"
        );
        assert_eq!(error_message("Bad Gateway\n"), "Bad Gateway");
    }

    #[test]
    fn test_sign_up_response_shapes() {
        let user = json!({
            "id": "u-1",
            "email": "sam@example.com",
            "created_at": "2024-03-01T09:30:00Z",
            "user_metadata": { "full_name": "Sam" }
        });

        let pending = SignUpResponse::parse(user.clone()).unwrap();
        assert!(matches!(pending, SignUpResponse::Pending(ref u) if u.metadata_name().as_deref() == Some("Sam")));

        let wrapped = SignUpResponse::parse(json!({ "user": user.clone(), "session": null })).unwrap();
        assert!(matches!(wrapped, SignUpResponse::Pending(_)));

        let session = SignUpResponse::parse(json!({
            "access_token": "a",
            "refresh_token": "r",
            "expires_in": 3600,
            "user": user
        }))
        .unwrap();
        assert!(matches!(session, SignUpResponse::Session(_)));
    }

    #[test]
    fn test_token_expiry_fallbacks() {
        let now = Utc::now();
        let mut token: TokenResponse = serde_json::from_value(json!({
            "access_token": "a",
            "refresh_token": "r",
            "expires_in": 120,
            "user": { "id": "u-1", "created_at": "2024-03-01T09:30:00Z" }
        }))
        .unwrap();
        assert_eq!(token.expires_at(now), now.timestamp() + 120);

        token.expires_at = Some(42);
        assert_eq!(token.expires_at(now), 42);
    }
}
