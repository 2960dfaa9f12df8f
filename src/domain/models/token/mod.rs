//! 토큰 관련 도메인 모델

pub mod token;

pub use token::AccessTokenClaims;
