//! Quick-access topics most searched by Taiwanese readers.

pub const PRESET_TOPICS: [&str; 8] = [
    "⚡️ 即時氣象/地震",
    "📈 台股 & 台積電",
    "🏛️ 兩岸與國際政經",
    "🔥 PTT/Dcard 熱議",
    "🤖 AI 與科技新品",
    "🍱 旅遊美食情報",
    "⚾ 職棒與運動賽事",
    "💰 補助與新制",
];

/// Topic loaded when an interactive session starts.
pub fn default_topic() -> &'static str {
    PRESET_TOPICS[0]
}

/// Preset by 1-based position, as shown in the topic list.
pub fn preset(number: usize) -> Option<&'static str> {
    number.checked_sub(1).and_then(|i| PRESET_TOPICS.get(i).copied())
}

/// Drop leading emoji and other decoration, keeping ASCII word characters and CJK ideographs.
pub fn strip_emoji(topic: &str) -> &str {
    topic
        .trim_start_matches(|c: char| !is_word_char(c))
        .trim()
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || ('\u{4e00}'..='\u{9fa5}').contains(&c)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_leading_emoji_with_variation_selector() {
        assert_eq!(strip_emoji("⚡️ 即時氣象/地震"), "即時氣象/地震");
        assert_eq!(strip_emoji("🏛️ 兩岸與國際政經"), "兩岸與國際政經");
        assert_eq!(strip_emoji("🔥 PTT/Dcard 熱議"), "PTT/Dcard 熱議");
    }

    #[test]
    fn plain_text_is_untouched() {
        assert_eq!(strip_emoji("AI news"), "AI news");
        assert_eq!(strip_emoji("  "), "");
    }

    #[test]
    fn every_preset_has_a_label() {
        for topic in PRESET_TOPICS {
            assert!(!strip_emoji(topic).is_empty(), "{topic}");
        }
    }

    #[test]
    fn presets_are_one_based() {
        assert_eq!(preset(1), Some(default_topic()));
        assert_eq!(preset(8), Some("💰 補助與新制"));
        assert_eq!(preset(0), None);
        assert_eq!(preset(9), None);
    }
}
