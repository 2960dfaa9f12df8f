//! 기기 식별 및 일회용 코드 유틸리티

use sha2::{Digest, Sha256};
use uuid::Uuid;

/// User-Agent 문자열에서 기기 지문을 생성합니다.
///
/// SHA-256 해시의 앞 32자리 16진수 문자열입니다. 같은 기기(같은
/// User-Agent)의 재로그인을 같은 세션 슬롯으로 귀속시키는 키로
/// 사용됩니다.
pub fn device_fingerprint(device_info: &str) -> String {
    let digest = Sha256::digest(device_info.as_bytes());
    let hex: String = digest.iter().map(|b| format!("{:02x}", b)).collect();
    hex[..32].to_string()
}

/// 6자리 숫자 인증 코드를 생성합니다.
///
/// 100000-999999 범위입니다.
pub fn numeric_code() -> String {
    let entropy = Uuid::new_v4().as_u128();
    format!("{}", 100_000 + (entropy % 900_000) as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_is_deterministic() {
        let a = device_fingerprint("Mozilla/5.0 (Macintosh)");
        let b = device_fingerprint("Mozilla/5.0 (Macintosh)");
        let c = device_fingerprint("Mozilla/5.0 (Windows)");

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|ch| ch.is_ascii_hexdigit()));
    }

    #[test]
    fn test_numeric_code_is_six_digits() {
        for _ in 0..50 {
            let code = numeric_code();
            assert_eq!(code.len(), 6);
            let n: u32 = code.parse().unwrap();
            assert!((100_000..=999_999).contains(&n));
        }
    }
}
