//! Helpers for putting untrusted or secret strings into log lines.

/// Longest prefix of `s` containing at most `max_chars` characters.
pub fn prefix(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Redact a secret for logging: a short prefix followed by `…` and the
/// total length. Secrets shorter than 12 chars are fully masked.
pub fn redact(secret: &str) -> String {
    let len = secret.chars().count();
    if len < 12 {
        return format!("<redacted:{len}>");
    }
    format!("{}…<{len}>", prefix(secret, 6))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_shorter_than_input() {
        assert_eq!(prefix("hello world", 5), "hello");
    }

    #[test]
    fn prefix_longer_than_input() {
        assert_eq!(prefix("abc", 10), "abc");
    }

    #[test]
    fn prefix_respects_multibyte_chars() {
        assert_eq!(prefix("ab—cd", 3), "ab—");
        assert_eq!(prefix("ñandú", 2), "ña");
    }

    #[test]
    fn redact_long_secret() {
        let r = redact("eyJhbGciOiJSUzI1NiJ9.payload");
        assert!(r.starts_with("eyJhbG…"));
        assert!(r.ends_with("<28>"));
        assert!(!r.contains("payload"));
    }

    #[test]
    fn redact_short_secret_fully() {
        assert_eq!(redact("hunter2"), "<redacted:7>");
        assert_eq!(redact(""), "<redacted:0>");
    }
}
