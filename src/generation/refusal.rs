//! Refusal detection.
//!
//! The service declines some prompts with a chat message instead of an
//! image. The phrases below are the known wordings; matching is a
//! case-insensitive substring search over the text of the model's reply
//! nodes with the user's own prompt removed first, so a prompt that
//! happens to contain "sorry" does not count as a refusal. Chat titles in
//! the sidebar are never scanned.

use crate::page::Matcher;

/// Containers holding the model's replies, tried in order.
pub const RESPONSE_CONTAINERS: &[Matcher] = &[
    Matcher::Css("model-response"),
    Matcher::Css("div[class*=\"model-response\"]"),
];

/// Known refusal wordings, Japanese and English.
pub const REFUSAL_PHRASES: [&str; 6] = [
    "画像を生成できません",
    "生成できませんでした",
    "申し訳",
    "I cannot help",
    "Unable to generate",
    "Sorry",
];

/// Returns the first refusal phrase found in `text` once every non-empty
/// `echoes` entry has been removed from it.
#[must_use]
pub fn find_refusal(text: &str, echoes: &[&str]) -> Option<&'static str> {
    let mut haystack = text.to_lowercase();
    for echo in echoes.iter().filter(|e| !e.trim().is_empty()) {
        haystack = haystack.replace(&echo.to_lowercase(), " ");
    }

    REFUSAL_PHRASES
        .iter()
        .copied()
        .find(|phrase| haystack.contains(&phrase.to_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_japanese_refusal() {
        let text = "申し訳ありませんが、このリクエストの画像は生成できません。";
        assert_eq!(find_refusal(text, &[]), Some("申し訳"));
    }

    #[test]
    fn test_english_refusal_any_case() {
        assert_eq!(
            find_refusal("I'm unable to generate that image.", &[]),
            Some("Unable to generate")
        );
    }

    #[test]
    fn test_prompt_echo_is_ignored() {
        let prompt = "A sorry-looking puppy in the rain";
        let text = format!("{prompt}\nHere is your image.");
        assert_eq!(find_refusal(&text, &[prompt]), None);
        assert_eq!(find_refusal(&text, &[]), Some("Sorry"));
    }

    #[test]
    fn test_blank_echo_is_skipped() {
        assert_eq!(find_refusal("Sorry, I can't.", &["", "  "]), Some("Sorry"));
    }

    #[test]
    fn test_ordinary_reply() {
        assert_eq!(find_refusal("Here is a picture of a red fox.", &["red fox"]), None);
    }
}
