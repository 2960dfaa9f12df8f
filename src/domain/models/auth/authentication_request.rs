//! 인증 미들웨어 동작 모드 정의

/// 인증 요구 수준
///
/// 라우트 스코프 단위로 미들웨어에 지정합니다.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthMode {
    /// 유효한 액세스 토큰이 반드시 필요 (실패 시 401)
    Required,
    /// 토큰이 있으면 검증하고, 없어도 요청 진행 허용
    Optional,
}
