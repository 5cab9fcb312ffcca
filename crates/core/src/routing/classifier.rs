//! Keyword-based prompt classification.
//!
//! Matching is substring containment on a lowercased copy of the prompt, not
//! word matching: "coding" hits "code", "drawing" hits "draw". Code intent
//! wins over image intent unless the prompt literally contains "image".

use crate::config::RoutingConfig;

use super::types::Classification;

/// Literal whose presence disables the code short-circuit.
const IMAGE_LITERAL: &str = "image";

/// Pure classifier over two configured keyword sets.
#[derive(Debug, Clone)]
pub struct KeywordClassifier {
    code_keywords: Vec<String>,
    image_keywords: Vec<String>,
}

impl KeywordClassifier {
    pub fn new<I, J, S, T>(code_keywords: I, image_keywords: J) -> Self
    where
        I: IntoIterator<Item = S>,
        J: IntoIterator<Item = T>,
        S: AsRef<str>,
        T: AsRef<str>,
    {
        Self {
            code_keywords: normalize(code_keywords),
            image_keywords: normalize(image_keywords),
        }
    }

    pub fn from_config(config: &RoutingConfig) -> Self {
        Self::new(&config.code_keywords, &config.image_keywords)
    }

    /// Classify a prompt. Total and side-effect free.
    pub fn classify(&self, prompt: &str) -> Classification {
        let lowered = prompt.to_lowercase();

        if contains_any(&lowered, &self.code_keywords) && !lowered.contains(IMAGE_LITERAL) {
            return Classification::Code;
        }

        if contains_any(&lowered, &self.image_keywords) {
            return Classification::Image;
        }

        Classification::Text
    }
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        Self::from_config(&RoutingConfig::default())
    }
}

fn normalize<I, S>(keywords: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    keywords
        .into_iter()
        .map(|k| k.as_ref().trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .collect()
}

fn contains_any(haystack: &str, keywords: &[String]) -> bool {
    keywords.iter().any(|k| haystack.contains(k.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> KeywordClassifier {
        KeywordClassifier::default()
    }

    #[test]
    fn test_image_keyword() {
        assert_eq!(
            classifier().classify("Generate a cyberpunk city with neon lights"),
            Classification::Image
        );
    }

    #[test]
    fn test_code_keyword() {
        assert_eq!(
            classifier().classify("Write a Python script for a calculator"),
            Classification::Code
        );
    }

    #[test]
    fn test_code_beats_image_without_literal_image() {
        assert_eq!(classifier().classify("draw me some code"), Classification::Code);
    }

    #[test]
    fn test_literal_image_disables_code_priority() {
        assert_eq!(
            classifier().classify("an image of python code on a screen"),
            Classification::Image
        );
    }

    #[test]
    fn test_substring_matching_quirk() {
        assert_eq!(classifier().classify("how do I decode base64"), Classification::Code);
        assert_eq!(classifier().classify("a drawing of a fox"), Classification::Image);
        assert_eq!(classifier().classify("I trust you"), Classification::Code);
    }

    #[test]
    fn test_plain_text() {
        assert_eq!(
            classifier().classify("What is the capital of France?"),
            Classification::Text
        );
        assert_eq!(classifier().classify(""), Classification::Text);
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(classifier().classify("PAINT A BARN"), Classification::Image);
        assert_eq!(classifier().classify("JavaScript closures"), Classification::Code);
    }

    #[test]
    fn test_multi_word_keyword() {
        assert_eq!(classifier().classify("mountains in Ultra HD"), Classification::Image);
    }

    #[test]
    fn test_idempotent() {
        let c = classifier();
        for prompt in ["draw me some code", "hello", "a logo for my bakery", "fix this bug"] {
            assert_eq!(c.classify(prompt), c.classify(prompt));
        }
    }

    #[test]
    fn test_custom_keywords_are_normalized() {
        let c = KeywordClassifier::new(["  SQL ", ""], ["Mural"]);
        assert_eq!(c.classify("optimize this sql query"), Classification::Code);
        assert_eq!(c.classify("a mural of the sea"), Classification::Image);
        assert_eq!(c.classify("write python"), Classification::Text);
    }
}
