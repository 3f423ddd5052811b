use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use password_hash::rand_core::OsRng;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, DbErr, EntityTrait, QueryFilter, Set,
    SqlErr,
};
use secrecy::ExposeSecret;
use uuid::Uuid;
use validator::Validate;

use crate::{
    audit,
    clients::google::OAuthError,
    dto::auth::{
        AuthorizeUrl, Claims, LoginRequest, LoginResponse, OAuthCallbackQuery, OAuthStateClaims,
        RegisterRequest, UpdateProfileRequest,
    },
    entity::users::{ActiveModel as UserActive, Column as UserCol, Entity as Users, Model as UserModel},
    error::{AppError, AppResult, FieldErrors},
    middleware::auth::AuthUser,
    models::{Role, User},
    phone::normalize_phone,
    response::{ApiResponse, Meta},
    services::non_empty,
    state::AppState,
};

const TOKEN_TTL_HOURS: i64 = 24;
const OAUTH_STATE_PURPOSE: &str = "oauth_state";
const OAUTH_STATE_TTL_MINUTES: i64 = 10;

pub async fn register_user(
    state: &AppState,
    payload: RegisterRequest,
) -> AppResult<ApiResponse<LoginResponse>> {
    let mut errors = match payload.validate() {
        Ok(()) => FieldErrors::new(),
        Err(err) => err.into(),
    };
    let phone = match non_empty(payload.phone.clone()).map(|p| normalize_phone(&p)) {
        None => None,
        Some(Ok(phone)) => Some(phone),
        Some(Err(err)) => {
            errors.add("phone", err.to_string());
            None
        }
    };
    errors.into_result()?;

    let email = payload.email.trim().to_lowercase();
    let exists = Users::find()
        .filter(UserCol::Email.eq(email.as_str()))
        .one(&state.orm)
        .await?;
    if exists.is_some() {
        return Err(AppError::Conflict("Email is already taken".to_string()));
    }

    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(payload.password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
        .to_string();

    let user = UserActive {
        id: Set(Uuid::new_v4()),
        email: Set(email),
        password_hash: Set(Some(password_hash)),
        full_name: Set(non_empty(payload.full_name)),
        phone: Set(phone),
        phone_verified: Set(false),
        role: Set(Role::User.as_str().to_string()),
        auth_provider: Set("password".to_string()),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await
    .map_err(duplicate_email)?;

    audit::record(
        &state.pool,
        Some(user.id),
        "user_register",
        "users",
        serde_json::json!({ "user_id": user.id }),
    )
    .await;

    let resp = issue_token(state, user)?;
    Ok(ApiResponse::success("User created", resp, Some(Meta::empty())))
}

pub async fn login_user(
    state: &AppState,
    payload: LoginRequest,
) -> AppResult<ApiResponse<LoginResponse>> {
    let LoginRequest { email, password } = payload;
    let user = Users::find()
        .filter(UserCol::Email.eq(email.trim().to_lowercase()))
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::BadRequest("Invalid email or password".into()))?;

    let Some(stored) = user.password_hash.as_deref() else {
        return Err(AppError::BadRequest(format!(
            "this account signs in with {}",
            user.auth_provider
        )));
    };
    let parsed_hash = PasswordHash::new(stored)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;

    if Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_err()
    {
        return Err(AppError::BadRequest("Invalid email or password".into()));
    }

    audit::record(
        &state.pool,
        Some(user.id),
        "user_login",
        "users",
        serde_json::json!({ "user_id": user.id }),
    )
    .await;

    let resp = issue_token(state, user)?;
    Ok(ApiResponse::success("Logged in", resp, Some(Meta::empty())))
}

pub async fn me(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<User>> {
    let model = Users::find_by_id(user.user_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::Unauthorized)?;
    Ok(ApiResponse::success("OK", model.into(), Some(Meta::empty())))
}

/// A changed phone number has to be verified again.
pub async fn update_profile(
    state: &AppState,
    user: &AuthUser,
    payload: UpdateProfileRequest,
) -> AppResult<ApiResponse<User>> {
    payload.validate()?;

    let model = Users::find_by_id(user.user_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::Unauthorized)?;

    let phone = match payload.phone.as_deref().map(str::trim) {
        None => model.phone.clone(),
        Some("") => None,
        Some(raw) => Some(normalize_phone(raw).map_err(|err| {
            let mut errors = FieldErrors::new();
            errors.add("phone", err.to_string());
            AppError::Validation(errors)
        })?),
    };
    let phone_verified = model.phone_verified && phone == model.phone;

    let mut active: UserActive = model.into();
    if let Some(full_name) = payload.full_name {
        active.full_name = Set(non_empty(Some(full_name)));
    }
    active.phone = Set(phone);
    active.phone_verified = Set(phone_verified);
    active.updated_at = Set(Utc::now().into());
    let updated = active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "profile_update",
        "users",
        serde_json::json!({ "user_id": user.user_id }),
    )
    .await;

    Ok(ApiResponse::success("Profile updated", updated.into(), Some(Meta::empty())))
}

pub fn google_authorize(state: &AppState) -> AppResult<ApiResponse<AuthorizeUrl>> {
    let google = state.google.as_ref().ok_or(AppError::NotConfigured("Google sign-in"))?;

    let exp = Utc::now() + Duration::minutes(OAUTH_STATE_TTL_MINUTES);
    let claims = OAuthStateClaims {
        purpose: OAUTH_STATE_PURPOSE.to_string(),
        nonce: Uuid::new_v4().simple().to_string(),
        exp: exp.timestamp() as usize,
    };
    let oauth_state = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(state.config.jwt_secret.expose_secret().as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?;

    let url = google
        .authorize_url(&oauth_state)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e)))?;
    Ok(ApiResponse::success("OK", AuthorizeUrl { url }, Some(Meta::empty())))
}

/// Finish the redirect flow: check our signed state, fetch the profile and
/// sign the user in, creating the account on first use.
pub async fn google_callback(
    state: &AppState,
    query: OAuthCallbackQuery,
) -> AppResult<ApiResponse<LoginResponse>> {
    let google = state.google.as_ref().ok_or(AppError::NotConfigured("Google sign-in"))?;
    verify_oauth_state(&query.state, state.config.jwt_secret.expose_secret())?;

    let profile = google.fetch_profile(&query.code).await.map_err(|err| match err {
        OAuthError::Timeout => AppError::Timeout,
        OAuthError::Rejected(msg) => AppError::BadRequest(msg),
        other => AppError::Upstream(other.to_string()),
    })?;
    if !profile.email_verified {
        return Err(AppError::BadRequest("Google account email is not verified".into()));
    }

    let email = profile.email.trim().to_lowercase();
    let existing = Users::find()
        .filter(UserCol::Email.eq(email.as_str()))
        .one(&state.orm)
        .await?;

    let user = match existing {
        Some(user) if user.full_name.is_none() && profile.name.is_some() => {
            let mut active: UserActive = user.into();
            active.full_name = Set(profile.name.clone());
            active.updated_at = Set(Utc::now().into());
            active.update(&state.orm).await?
        }
        Some(user) => user,
        None => {
            let user = UserActive {
                id: Set(Uuid::new_v4()),
                email: Set(email),
                password_hash: Set(None),
                full_name: Set(profile.name.clone()),
                phone: Set(None),
                phone_verified: Set(false),
                role: Set(Role::User.as_str().to_string()),
                auth_provider: Set("google".to_string()),
                created_at: NotSet,
                updated_at: NotSet,
            }
            .insert(&state.orm)
            .await
            .map_err(duplicate_email)?;
            audit::record(
                &state.pool,
                Some(user.id),
                "user_register",
                "users",
                serde_json::json!({ "user_id": user.id, "provider": "google" }),
            )
            .await;
            user
        }
    };

    audit::record(
        &state.pool,
        Some(user.id),
        "user_login",
        "users",
        serde_json::json!({ "user_id": user.id, "provider": "google" }),
    )
    .await;

    let resp = issue_token(state, user)?;
    Ok(ApiResponse::success("Logged in", resp, Some(Meta::empty())))
}

pub fn issue_token(state: &AppState, user: UserModel) -> AppResult<LoginResponse> {
    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(TOKEN_TTL_HOURS))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

    let claims = Claims {
        sub: user.id.to_string(),
        role: user.role.clone(),
        exp: expiration.timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(state.config.jwt_secret.expose_secret().as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?;

    Ok(LoginResponse {
        token,
        token_type: "Bearer".to_string(),
        expires_in: TOKEN_TTL_HOURS * 3600,
        user: user.into(),
    })
}

fn verify_oauth_state(token: &str, secret: &str) -> AppResult<()> {
    let decoded = decode::<OAuthStateClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|err| {
        tracing::debug!(error = %err, "rejected oauth state");
        AppError::BadRequest("sign-in link expired or invalid, try again".into())
    })?;
    if decoded.claims.purpose != OAUTH_STATE_PURPOSE {
        return Err(AppError::BadRequest("sign-in link expired or invalid, try again".into()));
    }
    Ok(())
}

fn duplicate_email(err: DbErr) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::Conflict("Email is already taken".to_string())
        }
        _ => AppError::OrmError(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::AppConfig, middleware::auth::decode_token};

    fn user(role: Role) -> UserModel {
        let now = Utc::now().into();
        UserModel {
            id: Uuid::new_v4(),
            email: "a@example.com".into(),
            password_hash: None,
            full_name: None,
            phone: None,
            phone_verified: false,
            role: role.as_str().to_string(),
            auth_provider: "password".into(),
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn issued_tokens_decode_back_to_the_user() {
        let state = AppState::lazy(AppConfig::for_tests()).expect("state");
        let model = user(Role::Admin);
        let id = model.id;
        let resp = issue_token(&state, model).expect("token");
        assert_eq!(resp.token_type, "Bearer");
        assert_eq!(resp.expires_in, 86_400);

        let auth = decode_token(&resp.token, "test-jwt-secret").expect("decodes");
        assert_eq!(auth.user_id, id);
        assert_eq!(auth.role, Role::Admin.as_str());
        assert!(decode_token(&resp.token, "other-secret").is_err());
    }

    #[test]
    fn oauth_state_must_carry_the_right_purpose() {
        let secret = "test-jwt-secret";
        let exp = (Utc::now() + Duration::minutes(5)).timestamp() as usize;
        let sign = |purpose: &str| {
            encode(
                &Header::default(),
                &OAuthStateClaims {
                    purpose: purpose.into(),
                    nonce: "n".into(),
                    exp,
                },
                &EncodingKey::from_secret(secret.as_bytes()),
            )
            .expect("encode")
        };
        assert!(verify_oauth_state(&sign(OAUTH_STATE_PURPOSE), secret).is_ok());
        assert!(verify_oauth_state(&sign("session"), secret).is_err());
        assert!(verify_oauth_state("garbage", secret).is_err());
    }
}
