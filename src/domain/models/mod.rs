//! 도메인 모델 모듈

pub mod auth;
pub mod oauth;
pub mod token;
