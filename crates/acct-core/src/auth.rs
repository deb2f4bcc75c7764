//! Operator accounts: password check followed by an RFC 6238 one-time code.

use crate::error::AcctError;
use crate::storage::{AccountingStorage, StorageError};
use crate::types::User;
use crate::validation::FieldErrors;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::Utc;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use totp_rs::{Algorithm, Secret, TOTP};
use tracing::{info, warn};
use uuid::Uuid;

const OTP_DIGITS: usize = 6;
const OTP_STEP_SECS: u64 = 30;
const MAX_USERNAME_LEN: usize = 150;
const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Issuer shown by authenticator apps.
    pub issuer: String,
    /// Accepted clock drift in 30-second steps on either side.
    pub otp_skew: u8,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            issuer: "AcctSystem".to_string(),
            otp_skew: 1,
        }
    }
}

/// Sign-up form.
#[derive(Debug, Clone, Deserialize)]
pub struct Registration {
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    pub password: String,
}

/// Material an authenticator app needs to enroll a user.
#[derive(Debug, Clone, Serialize)]
pub struct Provisioning {
    pub otpauth_url: String,
    /// PNG QR code, base64 encoded.
    pub qr_code: String,
}

pub struct Authenticator {
    store: Arc<dyn AccountingStorage>,
    config: AuthConfig,
}

impl Authenticator {
    pub fn new(store: Arc<dyn AccountingStorage>, config: AuthConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Create an account with a fresh OTP secret. The account still has to
    /// confirm enrollment with a code before it counts as logged in.
    pub async fn register(&self, registration: Registration) -> Result<User, AcctError> {
        validate_registration(&registration)?;

        let user = User {
            id: Uuid::new_v4(),
            username: registration.username.trim().to_string(),
            email: registration
                .email
                .map(|email| email.trim().to_string())
                .filter(|email| !email.is_empty()),
            password_hash: hash_password(&registration.password)?,
            otp_secret: generate_otp_secret(),
            created_at: Utc::now(),
        };

        match self.store.insert_user(&user).await {
            Ok(()) => {}
            Err(StorageError::Conflict(_)) => {
                return Err(AcctError::invalid(
                    "username",
                    "A user with that username already exists.",
                ))
            }
            Err(other) => return Err(other.into()),
        }

        info!(user_id = %user.id, username = %user.username, "registered user");
        Ok(user)
    }

    /// First factor. Unknown users and wrong passwords are indistinguishable.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<User, AcctError> {
        let Some(user) = self.store.find_user_by_username(username.trim()).await? else {
            warn!(username, "login attempt for unknown user");
            return Err(AcctError::InvalidCredentials);
        };

        if !verify_password(password, &user.password_hash)? {
            warn!(user_id = %user.id, "password mismatch");
            return Err(AcctError::InvalidCredentials);
        }
        Ok(user)
    }

    /// Second factor.
    pub fn verify_otp(&self, user: &User, code: &str) -> Result<(), AcctError> {
        let code = code.trim();
        if code.len() != OTP_DIGITS || !code.chars().all(|c| c.is_ascii_digit()) {
            return Err(AcctError::InvalidOtp);
        }

        let accepted = self
            .totp(user)?
            .check_current(code)
            .map_err(|e| AcctError::Otp(e.to_string()))?;
        if !accepted {
            warn!(user_id = %user.id, "rejected one-time code");
            return Err(AcctError::InvalidOtp);
        }
        Ok(())
    }

    pub async fn user(&self, id: Uuid) -> Result<User, AcctError> {
        self.store
            .get_user(id)
            .await?
            .ok_or_else(|| AcctError::not_found("user", id))
    }

    /// Replace an OTP secret that cannot drive a code generator: missing,
    /// not base32, or shorter than 128 bits.
    pub async fn ensure_otp_secret(&self, mut user: User) -> Result<User, AcctError> {
        if self.totp(&user).is_ok() {
            return Ok(user);
        }
        user.otp_secret = generate_otp_secret();
        self.store.update_user(&user).await?;
        info!(user_id = %user.id, "regenerated OTP secret");
        Ok(user)
    }

    pub fn totp(&self, user: &User) -> Result<TOTP, AcctError> {
        let secret = Secret::Encoded(user.otp_secret.clone())
            .to_bytes()
            .map_err(|e| AcctError::Otp(format!("{e:?}")))?;
        TOTP::new(
            Algorithm::SHA1,
            OTP_DIGITS,
            self.config.otp_skew,
            OTP_STEP_SECS,
            secret,
            Some(self.config.issuer.clone()),
            user.username.clone(),
        )
        .map_err(|e| AcctError::Otp(e.to_string()))
    }

    pub fn provisioning(&self, user: &User) -> Result<Provisioning, AcctError> {
        let totp = self.totp(user)?;
        Ok(Provisioning {
            otpauth_url: totp.get_url(),
            qr_code: totp.get_qr_base64().map_err(AcctError::Otp)?,
        })
    }

    pub fn qr_png(&self, user: &User) -> Result<Vec<u8>, AcctError> {
        self.totp(user)?.get_qr_png().map_err(AcctError::Otp)
    }
}

fn validate_registration(registration: &Registration) -> Result<(), AcctError> {
    let mut errors = FieldErrors::new();

    let username = registration.username.trim();
    if username.is_empty() {
        errors.add("username", "This field is required.");
    } else if username.chars().count() > MAX_USERNAME_LEN
        || !username
            .chars()
            .all(|c| c.is_alphanumeric() || "@.+-_".contains(c))
    {
        errors.add(
            "username",
            "Enter a valid username: at most 150 characters, letters, digits and @/./+/-/_ only.",
        );
    }

    let password = &registration.password;
    if password.chars().count() < MIN_PASSWORD_LEN {
        errors.add(
            "password",
            format!(
                "This password is too short. It must contain at least {MIN_PASSWORD_LEN} \
                 characters."
            ),
        );
    }
    if !password.is_empty() && password.chars().all(|c| c.is_ascii_digit()) {
        errors.add("password", "This password is entirely numeric.");
    }

    errors.into_result()
}

/// 160-bit secret, base32 without padding.
fn generate_otp_secret() -> String {
    Secret::generate_secret().to_encoded().to_string()
}

fn hash_password(password: &str) -> Result<String, AcctError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AcctError::PasswordHash(e.to_string()))
}

fn verify_password(password: &str, stored: &str) -> Result<bool, AcctError> {
    let parsed = PasswordHash::new(stored).map_err(|e| AcctError::PasswordHash(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}
