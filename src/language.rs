/// Target languages offered to users.
pub const SUPPORTED_TARGET_LANGUAGES: &[&str] = &["en", "fr", "es", "de", "it", "ar", "zh", "ja"];

pub const DEFAULT_SOURCE_LANGUAGE: &str = "en";
pub const DEFAULT_TARGET_LANGUAGE: &str = "fr";

/// Canonical form of a user-supplied language code, e.g. `" JA "` becomes `"ja"`
pub fn normalize_code(code: &str) -> String {
    code.trim().to_lowercase()
}

pub fn is_supported_target(code: &str) -> bool {
    SUPPORTED_TARGET_LANGUAGES.contains(&normalize_code(code).as_str())
}

/// Convert language code to its English name, falling back to the code itself
pub fn language_name(code: &str) -> String {
    match normalize_code(code).as_str() {
        "en" => "English".to_string(),
        "fr" => "French".to_string(),
        "es" => "Spanish".to_string(),
        "de" => "German".to_string(),
        "it" => "Italian".to_string(),
        "ar" => "Arabic".to_string(),
        "zh" => "Chinese".to_string(),
        "ja" => "Japanese".to_string(),
        "ko" => "Korean".to_string(),
        "pt" => "Portuguese".to_string(),
        "ru" => "Russian".to_string(),
        "nl" => "Dutch".to_string(),
        "pl" => "Polish".to_string(),
        "tr" => "Turkish".to_string(),
        "sv" => "Swedish".to_string(),
        "uk" => "Ukrainian".to_string(),
        "hi" => "Hindi".to_string(),
        _ => code.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_targets() {
        assert!(is_supported_target("fr"));
        assert!(is_supported_target(" JA "));
        assert!(!is_supported_target("ko"));
        assert!(!is_supported_target(""));
    }

    #[test]
    fn test_normalize_code() {
        assert_eq!(normalize_code(" JA "), "ja");
        assert_eq!(normalize_code("fr"), "fr");
    }

    #[test]
    fn test_language_name_fallback() {
        assert_eq!(language_name("zh"), "Chinese");
        assert_eq!(language_name("xx"), "xx");
    }
}
