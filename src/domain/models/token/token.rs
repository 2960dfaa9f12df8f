//! JWT 액세스 토큰 클레임 모델

use serde::{Deserialize, Serialize};

/// 액세스 토큰 클레임
///
/// 사용자 ID 외의 어떤 식별 정보도 담지 않습니다. 역할, 이메일 등은
/// 필요할 때 저장소에서 조회합니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    /// 사용자 ID (MongoDB ObjectId 문자열)
    pub sub: String,
    /// 발급 시각 (Unix timestamp)
    pub iat: i64,
    /// 만료 시각 (Unix timestamp)
    pub exp: i64,
}
