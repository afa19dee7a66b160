/// Canonicalize a language input to a lowercase code.
///
/// Accepts either a code ("fr", "pt-BR") or an English language name
/// ("French"); region subtags keep their conventional uppercase form.
pub fn canonical_language_code(input: &str) -> String {
    let trimmed = input.trim();

    let from_name = match trimmed.to_lowercase().as_str() {
        "english" => Some("en"),
        "spanish" | "español" => Some("es"),
        "french" | "français" => Some("fr"),
        "german" | "deutsch" => Some("de"),
        "italian" => Some("it"),
        "portuguese" => Some("pt"),
        "japanese" => Some("ja"),
        "korean" => Some("ko"),
        "chinese" | "mandarin" => Some("zh"),
        "hindi" => Some("hi"),
        "dutch" => Some("nl"),
        "polish" => Some("pl"),
        "russian" => Some("ru"),
        "arabic" => Some("ar"),
        "turkish" => Some("tr"),
        _ => None,
    };

    if let Some(code) = from_name {
        return code.to_string();
    }

    match trimmed.split_once('-') {
        Some((lang, region)) => format!("{}-{}", lang.to_lowercase(), region.to_uppercase()),
        None => trimmed.to_lowercase(),
    }
}

/// English display name for a language code
pub fn language_display_name(code: &str) -> String {
    let primary = code.split('-').next().unwrap_or(code).to_lowercase();

    let name = match primary.as_str() {
        "en" => "English",
        "es" => "Spanish",
        "fr" => "French",
        "de" => "German",
        "it" => "Italian",
        "pt" => "Portuguese",
        "ja" => "Japanese",
        "ko" => "Korean",
        "zh" => "Chinese",
        "hi" => "Hindi",
        "nl" => "Dutch",
        "pl" => "Polish",
        "ru" => "Russian",
        "ar" => "Arabic",
        "tr" => "Turkish",
        _ => return code.to_uppercase(),
    };

    name.to_string()
}

/// Display name for a dubbed audio track on the origin asset
pub fn track_name(language_code: &str) -> String {
    format!("{} (dubbed)", language_display_name(language_code))
}

/// Dubbing targets the CLI advertises
pub fn supported_targets() -> &'static [(&'static str, &'static str)] {
    &[
        ("en", "English"),
        ("es", "Spanish"),
        ("fr", "French"),
        ("de", "German"),
        ("it", "Italian"),
        ("pt", "Portuguese"),
        ("ja", "Japanese"),
        ("ko", "Korean"),
        ("zh", "Chinese"),
        ("hi", "Hindi"),
        ("nl", "Dutch"),
        ("pl", "Polish"),
        ("ru", "Russian"),
        ("ar", "Arabic"),
        ("tr", "Turkish"),
    ]
}

/// File extension for an artifact content type
pub fn extension_for_content_type(content_type: &str) -> &'static str {
    // Parameters like "; charset=..." are irrelevant here
    let essence = content_type.split(';').next().unwrap_or(content_type).trim();

    match essence {
        "audio/mpeg" | "audio/mp3" => "mp3",
        "audio/mp4" | "audio/m4a" | "audio/aac" => "m4a",
        "audio/wav" | "audio/x-wav" => "wav",
        "audio/flac" => "flac",
        "audio/ogg" => "ogg",
        "audio/webm" => "webm",
        _ => "bin",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_language_code() {
        assert_eq!(canonical_language_code("fr"), "fr");
        assert_eq!(canonical_language_code("FR"), "fr");
        assert_eq!(canonical_language_code("French"), "fr");
        assert_eq!(canonical_language_code("  spanish "), "es");
        assert_eq!(canonical_language_code("pt-br"), "pt-BR");
        assert_eq!(canonical_language_code("zh-TW"), "zh-TW");
        // unknown inputs pass through lowercased
        assert_eq!(canonical_language_code("xx"), "xx");
    }

    #[test]
    fn test_language_display_name() {
        assert_eq!(language_display_name("fr"), "French");
        assert_eq!(language_display_name("pt-BR"), "Portuguese");
        assert_eq!(language_display_name("xx"), "XX");
    }

    #[test]
    fn test_track_name() {
        assert_eq!(track_name("fr"), "French (dubbed)");
        assert_eq!(track_name("xx"), "XX (dubbed)");
    }

    #[test]
    fn test_extension_for_content_type() {
        assert_eq!(extension_for_content_type("audio/mpeg"), "mp3");
        assert_eq!(extension_for_content_type("audio/mp4"), "m4a");
        assert_eq!(extension_for_content_type("audio/mpeg; charset=binary"), "mp3");
        assert_eq!(extension_for_content_type("application/octet-stream"), "bin");
    }

    #[test]
    fn test_supported_targets_are_canonical() {
        for (code, _) in supported_targets() {
            assert_eq!(&canonical_language_code(code), code);
        }
    }
}
