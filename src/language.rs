//! Script-based language guess for the local document report.
//!
//! This is a heuristic, not a classifier: it checks which Unicode blocks occur
//! in the text and returns the label of the first rule in [`SCRIPT_RULES`]
//! that matches. Several rules share a block (Devanagari is listed for Hindi,
//! Nepali and Bodo; Bengali for Bengali and Assamese; and so on), so the
//! table order alone decides the label and the later duplicates can never
//! match. That ambiguity is kept as-is; telling those languages apart needs
//! more than a script check.
//!
//! A text mixing scripts gets the label of the highest-priority rule present,
//! e.g. Hindi text with English words is reported as "Hindi".

/// Label returned when no rule matches.
pub const UNKNOWN_LANGUAGE: &str = "Unknown";

/// One row of the priority table.
#[derive(Debug)]
pub struct ScriptRule {
    pub language: &'static str,
    /// Inclusive `(first, last)` code point ranges.
    pub ranges: &'static [(char, char)],
}

impl ScriptRule {
    /// `true` when any character of `text` falls into one of the rule's ranges.
    pub fn matches(&self, text: &str) -> bool {
        text.chars()
            .any(|c| self.ranges.iter().any(|&(lo, hi)| lo <= c && c <= hi))
    }
}

/// Ordered rule table. Earlier rows win.
pub static SCRIPT_RULES: &[ScriptRule] = &[
    ScriptRule { language: "Hindi", ranges: &[('\u{0900}', '\u{097F}')] },
    ScriptRule { language: "Bengali", ranges: &[('\u{0980}', '\u{09FF}')] },
    ScriptRule { language: "Telugu", ranges: &[('\u{0C00}', '\u{0C7F}')] },
    ScriptRule { language: "Gujarati", ranges: &[('\u{0A80}', '\u{0AFF}')] },
    ScriptRule { language: "Malayalam", ranges: &[('\u{0D00}', '\u{0D7F}')] },
    ScriptRule { language: "Tamil", ranges: &[('\u{0B80}', '\u{0BFF}')] },
    ScriptRule { language: "Sinhala", ranges: &[('\u{0D80}', '\u{0DFF}')] },
    ScriptRule { language: "Kannada", ranges: &[('\u{0C80}', '\u{0CFF}')] },
    ScriptRule { language: "Odia", ranges: &[('\u{0B00}', '\u{0B7F}')] },
    ScriptRule { language: "Punjabi", ranges: &[('\u{0A00}', '\u{0A7F}')] },
    // Shadowed by Bengali.
    ScriptRule { language: "Assamese", ranges: &[('\u{0980}', '\u{09FF}')] },
    ScriptRule { language: "Santali", ranges: &[('\u{1C00}', '\u{1C4F}')] },
    ScriptRule { language: "Urdu", ranges: &[('\u{0620}', '\u{06FF}')] },
    // Shadowed by Gujarati.
    ScriptRule { language: "Maithili", ranges: &[('\u{0A80}', '\u{0AFF}')] },
    ScriptRule { language: "Kashmiri", ranges: &[('\u{FB50}', '\u{FDFF}')] },
    // Shadowed by Hindi.
    ScriptRule { language: "Nepali", ranges: &[('\u{0900}', '\u{097F}')] },
    // Shadowed by Telugu.
    ScriptRule { language: "Konkani", ranges: &[('\u{0C00}', '\u{0C7F}')] },
    // Shadowed by Urdu.
    ScriptRule { language: "Sindhi", ranges: &[('\u{0620}', '\u{06FF}')] },
    // Shadowed by Hindi.
    ScriptRule { language: "Bodo", ranges: &[('\u{0900}', '\u{097F}')] },
    ScriptRule { language: "Manipuri", ranges: &[('\u{ABC0}', '\u{ABFF}')] },
    ScriptRule { language: "English", ranges: &[('a', 'z'), ('A', 'Z')] },
    ScriptRule { language: "Mandarin Chinese", ranges: &[('\u{4E00}', '\u{9FFF}')] },
    ScriptRule { language: "French", ranges: &[('\u{00C0}', '\u{017F}')] },
    ScriptRule { language: "Russian", ranges: &[('\u{0400}', '\u{04FF}')] },
    // Only U+0600..U+061F reach this row; the rest is taken by Urdu.
    ScriptRule { language: "Arabic", ranges: &[('\u{0600}', '\u{06FF}')] },
    ScriptRule { language: "Japanese", ranges: &[('\u{3040}', '\u{30FF}')] },
    ScriptRule { language: "Korean", ranges: &[('\u{AC00}', '\u{D7AF}')] },
    ScriptRule { language: "Italian", ranges: &[('\u{0100}', '\u{024F}')] },
    ScriptRule { language: "Vietnamese", ranges: &[('\u{1E00}', '\u{1EFF}')] },
    // Shadowed by Russian.
    ScriptRule { language: "Turkish", ranges: &[('\u{0400}', '\u{04FF}')] },
];

/// Guess the language of `text` from the scripts it contains.
pub fn detect_language(text: &str) -> &'static str {
    SCRIPT_RULES
        .iter()
        .find(|rule| rule.matches(text))
        .map(|rule| rule.language)
        .unwrap_or(UNKNOWN_LANGUAGE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn devanagari_is_hindi() {
        assert_eq!(detect_language("नमस्ते दुनिया"), "Hindi");
    }

    #[test]
    fn ascii_letters_are_english() {
        assert_eq!(detect_language("Hello world. This is a test."), "English");
    }

    #[test]
    fn no_script_is_unknown() {
        assert_eq!(detect_language("12345 !?. ---"), UNKNOWN_LANGUAGE);
        assert_eq!(detect_language(""), UNKNOWN_LANGUAGE);
    }

    #[test]
    fn higher_priority_script_wins_in_mixed_text() {
        assert_eq!(detect_language("PDF रिपोर्ट"), "Hindi");
        assert_eq!(detect_language("Tokyo 東京"), "English");
    }

    #[test]
    fn non_ascii_scripts_without_latin() {
        assert_eq!(detect_language("你好世界"), "Mandarin Chinese");
        assert_eq!(detect_language("Привет"), "Russian");
        assert_eq!(detect_language("こんにちは"), "Japanese");
        assert_eq!(detect_language("안녕하세요"), "Korean");
        assert_eq!(detect_language("établi à été"), "English");
        assert_eq!(detect_language("éàè"), "French");
    }

    #[test]
    fn shadowed_labels_are_unreachable() {
        for shadowed in ["Nepali", "Bodo", "Assamese", "Konkani", "Sindhi", "Maithili", "Turkish"] {
            let idx = SCRIPT_RULES
                .iter()
                .position(|r| r.language == shadowed)
                .unwrap();
            let rule = &SCRIPT_RULES[idx];
            let (lo, _) = rule.ranges[0];
            let sample: String = (lo..).take(3).collect();
            assert_ne!(detect_language(&sample), shadowed, "{shadowed} should be shadowed");
        }
    }

    #[test]
    fn table_order_is_stable() {
        let labels: Vec<&str> = SCRIPT_RULES.iter().map(|r| r.language).collect();
        assert_eq!(labels.first(), Some(&"Hindi"));
        assert_eq!(labels.last(), Some(&"Turkish"));
        assert_eq!(labels.len(), 30);
        let english = labels.iter().position(|l| *l == "English").unwrap();
        let mandarin = labels.iter().position(|l| *l == "Mandarin Chinese").unwrap();
        assert!(english < mandarin);
    }
}
