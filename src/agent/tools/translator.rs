//! Translator agent backed by a small marketplace glossary.
//!
//! Detection counts stopword hits per language (Devanagari text is taken
//! as Hindi outright). Translation swaps glossary words one for one and
//! keeps everything else, including `{{n}}` placeholders.

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::LazyLock;

use crate::agent::context::ToolContext;
use crate::agent::heuristics::round2;
use crate::agent::registry::{ToolCategory, ToolRegistry, ToolSpec};
use crate::error::Result;

static WORD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\p{L}+").expect("static regex"));
static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{\d+\}\}").expect("static regex"));

pub fn register(registry: &mut ToolRegistry) {
    registry
        .register(
            ToolSpec::new(
                "detectLanguage",
                ToolCategory::Translator,
                "Detect the primary language of a text sample.",
            ),
            detect_language,
        )
        .register(
            ToolSpec::new(
                "translateText",
                ToolCategory::Translator,
                "Translate text between supported languages using the marketplace glossary.",
            ),
            translate_text,
        )
        .register(
            ToolSpec::new(
                "autoTranslate",
                ToolCategory::Translator,
                "Detect language automatically, then translate to a target language.",
            ),
            auto_translate,
        )
        .register(
            ToolSpec::new(
                "preserveFields",
                ToolCategory::Translator,
                "Protect tokens such as prices or units from translation.",
            ),
            preserve_fields,
        );
}

const STOPWORDS: &[(&str, &[&str])] = &[
    ("en", &["the", "and", "is", "of", "for", "with", "to", "fresh", "price", "available"]),
    ("es", &["el", "los", "las", "y", "para", "con", "precio", "es", "fresco", "del"]),
    ("fr", &["le", "les", "et", "pour", "avec", "prix", "est", "des", "frais", "du"]),
    ("sw", &["na", "ya", "kwa", "wa", "ni", "bei", "nyanya", "mahindi", "safi", "soko"]),
    ("ha", &["da", "ne", "ta", "farashi", "tumatir", "masara", "akwai", "kasuwa", "sabo", "don"]),
];

/// Column order for [`GLOSSARY`]
const GLOSSARY_LANGS: [&str; 5] = ["en", "es", "fr", "sw", "ha"];

const GLOSSARY: &[[&str; 5]] = &[
    ["tomatoes", "tomates", "tomates", "nyanya", "tumatir"],
    ["maize", "maíz", "maïs", "mahindi", "masara"],
    ["onions", "cebollas", "oignons", "vitunguu", "albasa"],
    ["price", "precio", "prix", "bei", "farashi"],
    ["fresh", "fresco", "frais", "safi", "sabo"],
    ["farmer", "agricultor", "agriculteur", "mkulima", "manomi"],
    ["market", "mercado", "marché", "soko", "kasuwa"],
    ["buyer", "comprador", "acheteur", "mnunuzi", "mai saye"],
    ["pickup", "recogida", "collecte", "kuchukua", "dauka"],
    ["available", "disponible", "disponible", "inapatikana", "akwai"],
    ["sale", "venta", "vente", "mauzo", "sayarwa"],
    ["trade", "trueque", "troc", "kubadilishana", "musaya"],
    ["and", "y", "et", "na", "da"],
    ["for", "para", "pour", "kwa", "don"],
];

fn glossary_column(lang: &str) -> Option<usize> {
    let lang = lang.trim().to_ascii_lowercase();
    GLOSSARY_LANGS.iter().position(|l| *l == lang)
}

#[derive(Debug, Deserialize)]
pub struct DetectArgs {
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Detection {
    pub language: &'static str,
    pub confidence: f64,
}

pub fn detect(text: &str) -> Detection {
    if text.chars().any(|c| ('\u{0900}'..='\u{097F}').contains(&c)) {
        return Detection {
            language: "hi",
            confidence: 0.95,
        };
    }

    let words: Vec<String> = WORD_RE
        .find_iter(text)
        .map(|m| m.as_str().to_lowercase())
        .collect();
    let mut best = ("en", 0usize);
    for (lang, stops) in STOPWORDS {
        let hits = words.iter().filter(|w| stops.contains(&w.as_str())).count();
        if hits > best.1 {
            best = (lang, hits);
        }
    }

    if best.1 == 0 {
        return Detection {
            language: "en",
            confidence: 0.2,
        };
    }
    Detection {
        language: best.0,
        confidence: round2((0.5 + best.1 as f64 / words.len() as f64).min(0.99)),
    }
}

pub fn detect_language(_ctx: &ToolContext, args: DetectArgs) -> Result<Detection> {
    Ok(detect(&args.text))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslateArgs {
    pub text: String,
    pub source_lang: String,
    pub target_lang: String,
    #[serde(default)]
    pub preserve: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Translation {
    pub source_lang: String,
    pub target_lang: String,
    pub translated: String,
    pub replaced: usize,
    pub note: String,
}

fn match_case(original: &str, replacement: &str) -> String {
    let starts_upper = original.chars().next().is_some_and(char::is_uppercase);
    if !starts_upper {
        return replacement.to_string();
    }
    let mut chars = replacement.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Word-level glossary substitution. Returns the text and the number of swaps.
pub fn translate(text: &str, source: &str, target: &str) -> Option<(String, usize)> {
    let from = glossary_column(source)?;
    let to = glossary_column(target)?;
    if from == to {
        return Some((text.to_string(), 0));
    }
    let mut replaced = 0;
    let out = WORD_RE.replace_all(text, |caps: &Captures| {
        let word = &caps[0];
        let lower = word.to_lowercase();
        match GLOSSARY.iter().find(|row| row[from] == lower) {
            Some(row) => {
                replaced += 1;
                match_case(word, row[to])
            }
            None => word.to_string(),
        }
    });
    Some((out.into_owned(), replaced))
}

fn run_translation(text: &str, source: &str, target: &str, preserve: &[String]) -> Translation {
    let protected = protect(text, preserve);
    let (translated, replaced, note) = match translate(&protected.text, source, target) {
        Some((out, n)) => (
            restore(&out, &protected.placeholders),
            n,
            "Glossary translation; words outside the marketplace glossary are kept.".to_string(),
        ),
        None => (
            text.to_string(),
            0,
            format!(
                "No glossary for {} -> {}; supported: {}.",
                source,
                target,
                GLOSSARY_LANGS.join(", ")
            ),
        ),
    };
    Translation {
        source_lang: source.to_string(),
        target_lang: target.to_string(),
        translated,
        replaced,
        note,
    }
}

pub fn translate_text(_ctx: &ToolContext, args: TranslateArgs) -> Result<Translation> {
    Ok(run_translation(&args.text, &args.source_lang, &args.target_lang, &args.preserve))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoTranslateArgs {
    pub text: String,
    pub target_lang: String,
}

#[derive(Debug, Serialize)]
pub struct AutoTranslation {
    pub detected: Detection,
    #[serde(flatten)]
    pub translation: Translation,
}

pub fn auto_translate(_ctx: &ToolContext, args: AutoTranslateArgs) -> Result<AutoTranslation> {
    let detected = detect(&args.text);
    let translation = run_translation(&args.text, detected.language, &args.target_lang, &[]);
    Ok(AutoTranslation {
        detected,
        translation,
    })
}

#[derive(Debug, Deserialize)]
pub struct PreserveArgs {
    pub text: String,
    pub fields: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ProtectedText {
    pub text: String,
    pub placeholders: BTreeMap<String, String>,
}

/// Swap each field for `{{i}}`, where `i` is the field's index in `fields`.
/// Scans left to right and prefers the longest field at each position, so
/// text already swapped out is never matched again.
pub fn protect(text: &str, fields: &[String]) -> ProtectedText {
    let mut candidates: Vec<(usize, &str)> = fields
        .iter()
        .enumerate()
        .filter(|(_, f)| !f.is_empty())
        .map(|(i, f)| (i, f.as_str()))
        .collect();
    candidates.sort_by(|a, b| b.1.len().cmp(&a.1.len()));

    let mut out = String::with_capacity(text.len());
    let mut placeholders = BTreeMap::new();
    let mut rest = text;
    while let Some(ch) = rest.chars().next() {
        match candidates.iter().find(|(_, field)| rest.starts_with(*field)) {
            Some(&(i, field)) => {
                let key = format!("{{{{{}}}}}", i);
                out.push_str(&key);
                placeholders.insert(key, field.to_string());
                rest = &rest[field.len()..];
            }
            None => {
                out.push(ch);
                rest = &rest[ch.len_utf8()..];
            }
        }
    }
    ProtectedText {
        text: out,
        placeholders,
    }
}

pub fn restore(text: &str, placeholders: &BTreeMap<String, String>) -> String {
    PLACEHOLDER_RE
        .replace_all(text, |caps: &Captures| {
            placeholders
                .get(&caps[0])
                .cloned()
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

pub fn preserve_fields(_ctx: &ToolContext, args: PreserveArgs) -> Result<ProtectedText> {
    Ok(protect(&args.text, &args.fields))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_language() {
        assert_eq!(detect("Fresh tomatoes for the market").language, "en");
        assert_eq!(detect("Nyanya safi kwa bei nzuri").language, "sw");
        assert_eq!(detect("Tumatir sabo akwai a kasuwa").language, "ha");
        assert_eq!(detect("Tomates frescos para el mercado").language, "es");
        assert_eq!(detect("टमाटर ताज़ा").language, "hi");

        let d = detect("xyz qrs");
        assert_eq!(d.language, "en");
        assert_eq!(d.confidence, 0.2);
    }

    #[test]
    fn test_translate_keeps_unknown_words_and_case() {
        let (out, n) = translate("Fresh tomatoes, 40 kg, great price", "en", "sw").unwrap();
        assert_eq!(out, "Safi nyanya, 40 kg, great bei");
        assert_eq!(n, 3);

        assert_eq!(translate("same text", "en", "en").unwrap().0, "same text");
        assert!(translate("hola", "es", "de").is_none());
    }

    #[test]
    fn test_preserve_fields_round_trip() {
        let fields = vec!["2.50 USD".to_string(), "USD".to_string(), "".to_string()];
        let protected = protect("Tomatoes at 2.50 USD, paid in USD", &fields);
        assert_eq!(protected.text, "Tomatoes at {{0}}, paid in {{1}}");
        assert_eq!(protected.placeholders.len(), 2);
        assert_eq!(
            restore(&protected.text, &protected.placeholders),
            "Tomatoes at 2.50 USD, paid in USD"
        );
    }

    #[test]
    fn test_preserve_fields_never_rewrites_placeholders() {
        let fields = vec!["Tomatoes".to_string(), "0".to_string()];
        let protected = protect("Tomatoes 0", &fields);
        assert_eq!(protected.text, "{{0}} {{1}}");
        assert_eq!(restore(&protected.text, &protected.placeholders), "Tomatoes 0");

        let fields = vec!["".to_string(), "USD".to_string()];
        let protected = protect("Paid in USD", &fields);
        assert_eq!(protected.text, "Paid in {{1}}");
        assert_eq!(protected.placeholders.get("{{1}}").map(String::as_str), Some("USD"));
    }

    #[test]
    fn test_translation_respects_preserved_tokens() {
        let t = run_translation("Price for Market Street", "en", "fr", &["Market Street".to_string()]);
        assert_eq!(t.translated, "Prix pour Market Street");
        assert_eq!(t.replaced, 2);
    }
}
