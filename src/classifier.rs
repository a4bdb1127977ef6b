//! Technical-content detection over inbound text.

/// Strategy for deciding whether a message is technical. Kept behind a
/// trait so the keyword heuristic can later be swapped for a model-based
/// classifier without touching callers.
pub trait TechnicalDetector: Send + Sync {
    fn is_technical(&self, text: &str) -> bool;
}

/// Keywords that mark a message as technical, matched case-insensitively
/// as substrings.
const TECHNICAL_KEYWORDS: &[&str] = &[
    "code",
    "coding",
    "program",
    "function",
    "debug",
    "bug",
    "compile",
    "api",
    "database",
    "sql",
    "server",
    "deploy",
    "algorithm",
    "script",
    "python",
    "javascript",
    "rust",
    "java",
    "git",
    "regex",
    "json",
];

pub struct KeywordDetector {
    keywords: Vec<String>,
}

impl KeywordDetector {
    pub fn new() -> Self {
        Self::with_keywords(TECHNICAL_KEYWORDS.iter().map(|k| k.to_string()).collect())
    }

    pub fn with_keywords(keywords: Vec<String>) -> Self {
        Self {
            keywords: keywords.into_iter().map(|k| k.to_lowercase()).collect(),
        }
    }
}

impl Default for KeywordDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl TechnicalDetector for KeywordDetector {
    fn is_technical(&self, text: &str) -> bool {
        let lowered = text.to_lowercase();
        self.keywords.iter().any(|k| lowered.contains(k.as_str()))
    }
}
