//! 인증 요청/응답 DTO 모듈

pub mod request;
pub mod response;

pub use request::{
    ForgotPasswordRequest, GoogleSignInRequest, LineSignInRequest, ResetPasswordRequest,
    SendCodeRequest, SignInRequest, SignOutQuery, SignUpRequest, VerifyCodeRequest,
};
pub use response::{SessionView, UserResponse};
