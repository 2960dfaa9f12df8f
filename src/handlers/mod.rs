//! HTTP 핸들러 모듈

pub mod auth;
pub mod verification;
