//! Reply parsing and validation

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

use crate::llm::LlmResponse;

/// Sentence returned in place of a reply that failed validation
pub const APOLOGY: &str = "Mi dispiace, non sono riuscito a generare una risposta valida.";

/// Fewest words a reply may have
pub const MIN_WORDS: usize = 3;

/// Fewest common-word hits needed to accept the language
pub const MIN_LANGUAGE_MARKERS: usize = 2;

static METADATA_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)^(.*?)\s*metadata:\s*(.*)$").expect("valid regex"));

static ITALIAN_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "il", "lo", "la", "i", "gli", "le", "un", "uno", "una", "e", "ed", "o", "ma", "se",
        "perché", "quando", "come", "sono", "sei", "è", "siamo", "siete", "hanno", "di", "che",
        "non", "per", "con", "del", "della", "al", "alla",
    ]
    .into_iter()
    .collect()
});

static ENGLISH_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "the", "a", "an", "and", "or", "but", "if", "when", "how", "is", "are", "was", "were",
        "to", "of", "in", "on", "for", "with", "you", "i", "it", "that", "this", "not",
    ]
    .into_iter()
    .collect()
});

/// Reply text with the optional trailing metadata block split off
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedReply {
    pub content: String,
    pub metadata: Option<serde_json::Value>,
}

/// Split a trailing `metadata: {...}` block from `raw`
///
/// When the block does not parse as JSON the text is kept whole and the
/// metadata stays absent.
pub fn parse_reply(raw: &str) -> ParsedReply {
    let Some(caps) = METADATA_BLOCK.captures(raw) else {
        return ParsedReply {
            content: raw.trim().to_string(),
            metadata: None,
        };
    };

    let body = caps.get(1).map_or("", |m| m.as_str());
    let block = caps.get(2).map_or("", |m| m.as_str()).trim();

    match serde_json::from_str::<serde_json::Value>(block) {
        Ok(metadata) => ParsedReply {
            content: body.trim().to_string(),
            metadata: Some(metadata),
        },
        Err(e) => {
            tracing::warn!("Ignoring unparsable metadata block: {}", e);
            ParsedReply {
                content: raw.trim().to_string(),
                metadata: None,
            }
        }
    }
}

/// Why a reply was rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    Empty,
    TooShort { words: usize },
    AbnormalFinish(Option<String>),
    WrongLanguage { language: String },
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rejection::Empty => write!(f, "empty reply"),
            Rejection::TooShort { words } => write!(f, "reply too short ({words} words)"),
            Rejection::AbnormalFinish(reason) => {
                write!(f, "abnormal finish reason {:?}", reason.as_deref())
            }
            Rejection::WrongLanguage { language } => {
                write!(f, "reply does not look like language {language:?}")
            }
        }
    }
}

fn common_words(language: &str) -> Option<&'static HashSet<&'static str>> {
    match language {
        "it" => Some(&ITALIAN_WORDS),
        "en" => Some(&ENGLISH_WORDS),
        _ => None,
    }
}

/// Whether `text` contains enough common words of `language`
///
/// Languages without a word bank always pass.
pub fn looks_like_language(text: &str, language: &str) -> bool {
    let Some(bank) = common_words(language) else {
        return true;
    };

    let words: HashSet<String> = text
        .split_whitespace()
        .map(|w| {
            w.trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase()
        })
        .filter(|w| !w.is_empty())
        .collect();

    words.iter().filter(|w| bank.contains(w.as_str())).count() >= MIN_LANGUAGE_MARKERS
}

/// Check a parsed reply against its completion metadata
pub fn validate(content: &str, response: &LlmResponse, language: &str) -> Result<(), Rejection> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(Rejection::Empty);
    }

    let words = trimmed.split_whitespace().count();
    if words < MIN_WORDS {
        return Err(Rejection::TooShort { words });
    }

    if !response.finished_normally() {
        return Err(Rejection::AbnormalFinish(response.finish_reason.clone()));
    }

    if !looks_like_language(trimmed, language) {
        return Err(Rejection::WrongLanguage {
            language: language.to_string(),
        });
    }

    Ok(())
}
