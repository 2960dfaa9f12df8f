//! Email Verification HTTP Handlers
//!
//! 이메일 인증 코드와 비밀번호 재설정 코드의 발급/확인 엔드포인트를
//! 처리합니다.
use actix_web::{post, web, HttpResponse};
use serde_json::json;
use validator::Validate;
use crate::domain::dto::auth::request::{
    ForgotPasswordRequest, ResetPasswordRequest, SendCodeRequest, VerifyCodeRequest,
};
use crate::errors::errors::AppError;
use crate::services::email::mailer;
use crate::services::users::VerificationService;

/// 이메일 인증 코드 발송 핸들러
///
/// # Endpoint
/// `POST /api/verification/send-code`
#[post("/send-code")]
pub async fn send_code(payload: web::Json<SendCodeRequest>) -> Result<HttpResponse, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e.to_string()))?;

    let code = VerificationService::instance()
        .send_code(&payload.email)
        .await?;

    mailer::instance()
        .send_verification_code(&payload.email, &code)
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "인증 코드가 발송되었습니다"
    })))
}

/// 이메일 인증 코드 확인 핸들러
///
/// # Endpoint
/// `POST /api/verification/verify-code`
#[post("/verify-code")]
pub async fn verify_code(payload: web::Json<VerifyCodeRequest>) -> Result<HttpResponse, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e.to_string()))?;

    VerificationService::instance()
        .verify_code(&payload.email, &payload.code)
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "이메일 인증이 완료되었습니다"
    })))
}

/// 비밀번호 재설정 코드 발송 핸들러
///
/// # Endpoint
/// `POST /api/verification/forgot-password`
#[post("/forgot-password")]
pub async fn forgot_password(
    payload: web::Json<ForgotPasswordRequest>,
) -> Result<HttpResponse, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e.to_string()))?;

    let code = VerificationService::instance()
        .forgot_password(&payload.email)
        .await?;

    mailer::instance()
        .send_password_reset_code(&payload.email, &code)
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "비밀번호 재설정 코드가 발송되었습니다"
    })))
}

/// 비밀번호 재설정 핸들러
///
/// # Endpoint
/// `POST /api/verification/reset-password`
#[post("/reset-password")]
pub async fn reset_password(
    payload: web::Json<ResetPasswordRequest>,
) -> Result<HttpResponse, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e.to_string()))?;

    VerificationService::instance()
        .reset_password(&payload.email, &payload.code, &payload.new_password)
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "비밀번호가 재설정되었습니다"
    })))
}
