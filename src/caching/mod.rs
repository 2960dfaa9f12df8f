//! 캐싱 모듈

pub mod redis;
