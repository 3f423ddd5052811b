//! Phone verification by one-time code.
//!
//! Codes are six digits, valid for five minutes and stored only as a SHA-256
//! digest bound to the phone number.

use chrono::{Duration, Utc};
use rand::Rng;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
    Set, TransactionTrait, sea_query::LockType,
};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::{
    audit,
    clients::sms::SmsError,
    dto::otp::{SendOtpRequest, SendOtpResponse, VerifyOtpRequest, VerifyOtpResponse},
    entity::{
        phone_otps::{ActiveModel as OtpActive, Column as OtpCol, Entity as PhoneOtps},
        users::{ActiveModel as UserActive, Entity as Users},
    },
    error::{AppError, AppResult, FieldErrors},
    middleware::auth::AuthUser,
    phone::{mask_phone, normalize_phone},
    response::{ApiResponse, Meta},
    state::AppState,
};

pub const CODE_LEN: usize = 6;
pub const CODE_TTL_SECS: i64 = 300;
pub const RESEND_AFTER_SECS: i64 = 30;
pub const MAX_ATTEMPTS: i32 = 5;

pub fn generate_code() -> String {
    let n: u32 = rand::rng().random_range(0..1_000_000);
    format!("{n:06}")
}

pub fn hash_code(phone: &str, code: &str) -> String {
    let digest = Sha256::digest(format!("{phone}:{code}").as_bytes());
    hex::encode(digest)
}

fn phone_field(raw: &str) -> AppResult<String> {
    normalize_phone(raw).map_err(|err| {
        let mut errors = FieldErrors::new();
        errors.add("phone", err.to_string());
        AppError::Validation(errors)
    })
}

pub async fn send_otp(
    state: &AppState,
    payload: SendOtpRequest,
) -> AppResult<ApiResponse<SendOtpResponse>> {
    let phone = phone_field(&payload.phone)?;
    let now = Utc::now();

    let latest = PhoneOtps::find()
        .filter(OtpCol::Phone.eq(phone.as_str()))
        .order_by_desc(OtpCol::CreatedAt)
        .one(&state.orm)
        .await?;
    if let Some(latest) = latest {
        let age = now.signed_duration_since(latest.created_at.with_timezone(&Utc));
        if latest.consumed_at.is_none() && age < Duration::seconds(RESEND_AFTER_SECS) {
            let wait = RESEND_AFTER_SECS - age.num_seconds();
            return Err(AppError::RateLimited(format!(
                "wait {wait}s before requesting another code"
            )));
        }
    }

    let code = generate_code();
    let otp = OtpActive {
        id: Set(Uuid::new_v4()),
        phone: Set(phone.clone()),
        code_hash: Set(hash_code(&phone, &code)),
        attempts: Set(0),
        expires_at: Set((now + Duration::seconds(CODE_TTL_SECS)).into()),
        consumed_at: Set(None),
        created_at: Set(now.into()),
    }
    .insert(&state.orm)
    .await?;

    let message = format!(
        "{code} is your verification code. It expires in {} minutes.",
        CODE_TTL_SECS / 60
    );
    if let Err(err) = state.sms.send(&phone, &message).await {
        // Let the caller retry immediately instead of waiting out the resend window.
        PhoneOtps::delete_by_id(otp.id).exec(&state.orm).await?;
        return Err(match err {
            SmsError::Timeout => AppError::Timeout,
            other => AppError::Upstream(other.to_string()),
        });
    }

    tracing::info!(phone = %mask_phone(&phone), "otp sent");

    Ok(ApiResponse::success(
        "Code sent",
        SendOtpResponse {
            phone: mask_phone(&phone),
            expires_in: CODE_TTL_SECS,
            resend_after: RESEND_AFTER_SECS,
        },
        Some(Meta::empty()),
    ))
}

/// Check a code against the newest open one for the phone. Signed-in callers
/// whose profile carries the same number get it marked verified.
pub async fn verify_otp(
    state: &AppState,
    user: Option<&AuthUser>,
    payload: VerifyOtpRequest,
) -> AppResult<ApiResponse<VerifyOtpResponse>> {
    let phone = phone_field(&payload.phone)?;
    let code = payload.code.trim();
    if code.len() != CODE_LEN || !code.bytes().all(|b| b.is_ascii_digit()) {
        let mut errors = FieldErrors::new();
        errors.add("code", format!("must be {CODE_LEN} digits"));
        return Err(errors.into());
    }

    let now = Utc::now();
    let txn = state.orm.begin().await?;
    let otp = PhoneOtps::find()
        .filter(
            Condition::all()
                .add(OtpCol::Phone.eq(phone.as_str()))
                .add(OtpCol::ConsumedAt.is_null()),
        )
        .order_by_desc(OtpCol::CreatedAt)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::BadRequest("no active code for this number, request a new one".into()))?;

    if otp.expires_at.with_timezone(&Utc) <= now {
        return Err(AppError::BadRequest("code has expired, request a new one".into()));
    }
    if otp.attempts >= MAX_ATTEMPTS {
        return Err(AppError::RateLimited(
            "too many incorrect attempts, request a new code".into(),
        ));
    }

    if otp.code_hash != hash_code(&phone, code) {
        let attempts = otp.attempts + 1;
        let mut active: OtpActive = otp.into();
        active.attempts = Set(attempts);
        active.update(&txn).await?;
        txn.commit().await?;

        let mut errors = FieldErrors::new();
        errors.add(
            "code",
            format!("incorrect code, {} attempts left", (MAX_ATTEMPTS - attempts).max(0)),
        );
        return Err(errors.into());
    }

    let mut active: OtpActive = otp.into();
    active.consumed_at = Set(Some(now.into()));
    active.update(&txn).await?;

    let mut profile_updated = false;
    if let Some(user) = user {
        let owner = Users::find_by_id(user.user_id).one(&txn).await?;
        if let Some(owner) = owner.filter(|u| u.phone.as_deref() == Some(phone.as_str())) {
            let mut active: UserActive = owner.into();
            active.phone_verified = Set(true);
            active.updated_at = Set(now.into());
            active.update(&txn).await?;
            profile_updated = true;
        }
    }
    txn.commit().await?;

    audit::record(
        &state.pool,
        user.map(|u| u.user_id),
        "otp_verify",
        "phone_otps",
        serde_json::json!({ "phone": mask_phone(&phone), "profile_updated": profile_updated }),
    )
    .await;

    Ok(ApiResponse::success(
        "Phone verified",
        VerifyOtpResponse {
            verified: true,
            phone,
            profile_updated,
        },
        Some(Meta::empty()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_six_digits() {
        for _ in 0..200 {
            let code = generate_code();
            assert_eq!(code.len(), CODE_LEN);
            assert!(code.bytes().all(|b| b.is_ascii_digit()));
        }
    }

    #[test]
    fn hashes_bind_code_to_phone() {
        let a = hash_code("+919876543210", "123456");
        assert_eq!(a.len(), 64);
        assert_eq!(a, hash_code("+919876543210", "123456"));
        assert_ne!(a, hash_code("+919876543211", "123456"));
        assert_ne!(a, hash_code("+919876543210", "123457"));
    }
}
