//! User model, acting identity and JWT claims

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::enums::Role;
use crate::error::AppError;

/// User (reference data; authentication is delegated)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub username: String,
    pub full_name: String,
    pub role: Role,
    /// Required for clinic staff, absent for admins and technicians
    pub clinic_id: Option<String>,
}

impl User {
    pub fn actor(&self) -> Actor {
        Actor {
            username: self.username.clone(),
            role: self.role,
            clinic_id: self.clinic_id.clone(),
        }
    }
}

/// The identity on whose behalf a lifecycle or registry operation runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub username: String,
    pub role: Role,
    pub clinic_id: Option<String>,
}

impl Actor {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Clinic staff member of the given clinic
    pub fn is_staff_of(&self, clinic_id: &str) -> bool {
        self.role == Role::Clinic && self.clinic_id.as_deref() == Some(clinic_id)
    }

    /// Clinic the actor is confined to (clinic staff only)
    pub fn scoped_clinic(&self) -> Option<&str> {
        match self.role {
            Role::Clinic => self.clinic_id.as_deref(),
            _ => None,
        }
    }

    pub fn require_role(&self, roles: &[Role], action: &str) -> Result<(), AppError> {
        if roles.contains(&self.role) {
            Ok(())
        } else {
            Err(AppError::Authorization(format!(
                "{} ({}) is not allowed to {}",
                self.username, self.role, action
            )))
        }
    }
}

/// JWT claims issued by the login endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserClaims {
    pub sub: String,
    pub role: Role,
    pub clinic_id: Option<String>,
    pub exp: i64,
    pub iat: i64,
}

impl UserClaims {
    pub fn for_user(user: &User, expiration_hours: u64) -> Self {
        let now = chrono::Utc::now();
        let exp = now + chrono::Duration::hours(expiration_hours as i64);
        Self {
            sub: user.username.clone(),
            role: user.role,
            clinic_id: user.clinic_id.clone(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
        }
    }

    /// Create a new JWT token
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Parse JWT token
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }

    pub fn actor(&self) -> Actor {
        Actor {
            username: self.sub.clone(),
            role: self.role,
            clinic_id: self.clinic_id.clone(),
        }
    }
}
