use moka::future::Cache;
use once_cell::sync::Lazy;
use rand::Rng;
use std::time::Duration;

const OTP_TTL_SECS: u64 = 600;
const MAX_ATTEMPTS: u8 = 5;

#[derive(Clone)]
struct OtpEntry {
    code: String,
    attempts_left: u8,
}

/// email (normalized) => pending password-reset code
static OTP_STORE: Lazy<Cache<String, OtpEntry>> = Lazy::new(|| {
    Cache::builder()
        .max_capacity(100_000)
        .time_to_live(Duration::from_secs(OTP_TTL_SECS)) // codes expire after 10 min
        .build()
});

// issue/verify/consume must agree on the key, whatever the caller sends
#[inline]
fn normalize(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Issue a fresh 4-digit code for the account, replacing any previous one.
pub async fn issue(email: &str) -> String {
    let code = rand::thread_rng().gen_range(1000..=9999).to_string();
    OTP_STORE
        .insert(
            normalize(email),
            OtpEntry {
                code: code.clone(),
                attempts_left: MAX_ATTEMPTS,
            },
        )
        .await;
    code
}

/// Check a code without consuming it. Wrong guesses burn an attempt;
/// the entry is dropped once attempts run out.
pub async fn verify(email: &str, code: &str) -> bool {
    let key = normalize(email);
    let entry = match OTP_STORE.get(&key).await {
        Some(entry) => entry,
        None => return false,
    };

    if entry.code == code {
        return true;
    }

    if entry.attempts_left <= 1 {
        OTP_STORE.invalidate(&key).await;
    } else {
        OTP_STORE
            .insert(
                key,
                OtpEntry {
                    code: entry.code,
                    attempts_left: entry.attempts_left - 1,
                },
            )
            .await;
    }
    false
}

/// Check a code and remove it so it cannot be replayed.
pub async fn consume(email: &str, code: &str) -> bool {
    if verify(email, code).await {
        OTP_STORE.invalidate(&normalize(email)).await;
        true
    } else {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // The store is process-global, so each test keys on its own email.

    #[actix_web::test]
    async fn issued_code_verifies_then_consumes_once() {
        let code = issue("reset-once@example.com").await;
        assert_eq!(code.len(), 4);
        assert!(verify("reset-once@example.com", &code).await);
        assert!(consume("reset-once@example.com", &code).await);
        assert!(!verify("reset-once@example.com", &code).await);
    }

    #[actix_web::test]
    async fn wrong_code_is_rejected_but_right_one_still_works() {
        let code = issue("reset-wrong@example.com").await;
        let wrong = if code == "1000" { "1001" } else { "1000" };
        assert!(!verify("reset-wrong@example.com", wrong).await);
        assert!(verify("reset-wrong@example.com", &code).await);
    }

    #[actix_web::test]
    async fn reissue_replaces_previous_code() {
        let first = issue("reset-reissue@example.com").await;
        let second = issue("reset-reissue@example.com").await;
        assert!(verify("reset-reissue@example.com", &second).await);
        if first != second {
            assert!(!verify("reset-reissue@example.com", &first).await);
        }
    }

    #[actix_web::test]
    async fn attempts_are_bounded() {
        let code = issue("reset-burn@example.com").await;
        let wrong = if code == "1000" { "1001" } else { "1000" };
        for _ in 0..MAX_ATTEMPTS {
            assert!(!verify("reset-burn@example.com", wrong).await);
        }
        // entry is gone, even the real code is refused now
        assert!(!verify("reset-burn@example.com", &code).await);
    }

    #[actix_web::test]
    async fn unknown_email_never_verifies() {
        assert!(!verify("reset-nobody@example.com", "1234").await);
    }

    #[actix_web::test]
    async fn email_lookup_is_case_insensitive() {
        let code = issue("Reset-Case@Example.com").await;
        assert!(verify("reset-case@example.com", &code).await);
    }

    #[actix_web::test]
    async fn email_lookup_ignores_surrounding_whitespace() {
        let code = issue("  Reset-Pad@Example.com ").await;
        assert!(verify("reset-pad@example.com", &code).await);
        assert!(consume(" RESET-PAD@EXAMPLE.COM", &code).await);
        assert!(!verify("reset-pad@example.com", &code).await);
    }
}
