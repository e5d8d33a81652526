//! Prompt privacy classification.
//!
//! Advisor prompts carry only derived risk context (scores, levels, bounded
//! vitals). A prompt that also carries something identifying a person must
//! never leave the host, so the chain routes it to local backends only.

use regex::Regex;

/// Data classification levels for prompt content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DataClass {
    /// Scores, risk levels and anonymous clinical context.
    Public,
    /// Contains a direct identifier (email, phone number, SSN-shaped id).
    Identifiable,
}

impl DataClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataClass::Public       => "PUBLIC",
            DataClass::Identifiable => "IDENTIFIABLE",
        }
    }
}

/// Scans prompt content for direct identifiers.
pub struct DataClassifier {
    identifier_patterns: Vec<(&'static str, Regex)>,
}

impl Default for DataClassifier {
    fn default() -> Self {
        let sources: [(&'static str, &str); 3] = [
            ("email", r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}"),
            ("ssn",   r"\b\d{3}-\d{2}-\d{4}\b"),
            // 10+ digit phone numbers, optional country code and separators
            ("phone", r"(?:\+\d{1,3}[\s.-]?)?\(?\d{3}\)?[\s.-]?\d{3}[\s.-]?\d{4}\b"),
        ];
        let identifier_patterns = sources
            .into_iter()
            .filter_map(|(name, src)| Regex::new(src).ok().map(|re| (name, re)))
            .collect();
        Self { identifier_patterns }
    }
}

impl DataClassifier {
    pub fn classify(&self, prompt: &str) -> DataClass {
        if self.matched_identifier(prompt).is_some() {
            DataClass::Identifiable
        } else {
            DataClass::Public
        }
    }

    /// Name of the first identifier kind found in the prompt.
    pub fn matched_identifier(&self, prompt: &str) -> Option<&'static str> {
        self.identifier_patterns
            .iter()
            .find(|(_, re)| re.is_match(prompt))
            .map(|(name, _)| *name)
    }
}
