//! Transcript sanitization
//!
//! Raw speech-to-text output is normalized before it enters a conversation
//! history: only letters, digits and whitespace survive. The stripped
//! characters are the ones that could smuggle structure into the downstream
//! generation prompt or into persisted records.

/// Sanitize a raw transcript for use as message content.
///
/// Unicode letter and digit classes are kept rather than ASCII ranges;
/// callers speak more than one language.
pub fn sanitize_transcript(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_punctuation() {
        assert_eq!(sanitize_transcript("Hello, World! 123"), "Hello World 123");
    }

    #[test]
    fn test_keeps_plain_text() {
        assert_eq!(sanitize_transcript("plain words only"), "plain words only");
    }

    #[test]
    fn test_strips_markup() {
        assert_eq!(sanitize_transcript("<Say>hi</Say>"), "SayhiSay");
        assert_eq!(sanitize_transcript("{\"role\": \"user\"}"), "role user");
    }

    #[test]
    fn test_keeps_non_ascii_letters() {
        assert_eq!(sanitize_transcript("Grüße, Welt!"), "Grüße Welt");
    }

    #[test]
    fn test_empty_after_sanitization() {
        assert_eq!(sanitize_transcript("?!..."), "");
    }
}
