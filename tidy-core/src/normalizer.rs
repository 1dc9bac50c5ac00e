//! # Normalizador de Texto
//!
//! Primeiro estágio do pipeline. Três passos em ordem fixa:
//!
//! 1. **Reparo de codificação** ([`fix_text`]): mojibake, quebras de linha,
//!    aspas curvas, caracteres de controle e forma NFC.
//! 2. **Remoção de acentos** ([`strip_accents`]): NFKD sem marcas combinantes.
//! 3. **Remoção de markup** ([`strip_markup`]): só os nós de texto do HTML.
//!
//! Por fim, espaços nas pontas são removidos.
//!
//! ```rust
//! use tidy_core::normalizer::{normalize, AccentMethod};
//!
//! let clean = normalize("  <b>Café</b> com leite ", AccentMethod::Unicode);
//! assert_eq!(clean, "Cafe com leite");
//! ```

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Html;
use serde::{Deserialize, Serialize};
use unicode_normalization::char::canonical_combining_class;
use unicode_normalization::UnicodeNormalization;

use crate::error::ConfigurationError;

/// Estratégia de remoção de acentos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccentMethod {
    /// Remove marcas combinantes e mantém os demais caracteres, ASCII ou não.
    #[default]
    Unicode,
    /// Além das marcas, descarta tudo o que não for ASCII.
    Ascii,
}

impl AccentMethod {
    pub fn name(&self) -> &'static str {
        match self {
            AccentMethod::Unicode => "unicode",
            AccentMethod::Ascii => "ascii",
        }
    }
}

impl FromStr for AccentMethod {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unicode" => Ok(AccentMethod::Unicode),
            "ascii" => Ok(AccentMethod::Ascii),
            other => Err(ConfigurationError::InvalidAccentMethod(other.to_string())),
        }
    }
}

impl fmt::Display for AccentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

static ANSI_ESCAPE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\x1b\[[0-9;?]*[A-Za-z]").expect("regex válida"));

/// Sequências sem espaço (candidatas a mojibake).
static NON_SPACE_RUN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^ \t\n]+").expect("regex válida"));

/// Bytes líderes de UTF-8 (0xC2..=0xF4) lidos como Latin-1/Windows-1252.
fn looks_like_mojibake(run: &str) -> bool {
    run.chars().any(|c| ('\u{C2}'..='\u{F4}').contains(&c))
        && run.chars().any(|c| !c.is_ascii())
}

/// Recodifica um trecho como Windows-1252 e tenta lê-lo como UTF-8.
fn repair_run(run: &str) -> Option<String> {
    let (bytes, _, had_unmappable) = encoding_rs::WINDOWS_1252.encode(run);
    if had_unmappable {
        return None;
    }
    match std::str::from_utf8(&bytes) {
        Ok(decoded) if decoded != run => Some(decoded.to_string()),
        _ => None,
    }
}

fn fix_mojibake(text: &str) -> String {
    NON_SPACE_RUN_RE
        .replace_all(text, |caps: &regex::Captures<'_>| {
            let run = &caps[0];
            if looks_like_mojibake(run) {
                if let Some(fixed) = repair_run(run) {
                    return fixed;
                }
            }
            run.to_string()
        })
        .into_owned()
}

/// Passo A: repara artefatos de codificação e normaliza para NFC.
pub fn fix_text(text: &str) -> String {
    let text = ANSI_ESCAPE_RE.replace_all(text, "");
    let text = text
        .replace("\r\n", "\n")
        .replace(['\r', '\u{2028}', '\u{2029}'], "\n");
    let text = fix_mojibake(&text);

    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '‘' | '’' | '‚' | '‛' => out.push('\''),
            '“' | '”' | '„' | '‟' => out.push('"'),
            '\t' | '\n' => out.push(c),
            c if c.is_control() => {}
            c => out.push(c),
        }
    }
    out.nfc().collect()
}

/// Passo B: decompõe (NFKD) e remove marcas combinantes.
pub fn strip_accents(text: &str, method: AccentMethod) -> String {
    let decomposed = text.nfkd();
    match method {
        AccentMethod::Unicode => decomposed
            .filter(|c| canonical_combining_class(*c) == 0)
            .collect(),
        AccentMethod::Ascii => decomposed.filter(char::is_ascii).collect(),
    }
}

/// Passo C: concatena apenas os nós de texto do HTML.
///
/// `None` na entrada devolve `None`; nunca falha.
pub fn strip_markup(html: Option<&str>) -> Option<String> {
    let html = html?;
    let fragment = Html::parse_fragment(html);
    Some(fragment.root_element().text().collect())
}

/// Executa os três passos em ordem e remove espaços nas pontas.
pub fn normalize(raw: &str, method: AccentMethod) -> String {
    let repaired = fix_text(raw);
    let unaccented = strip_accents(&repaired, method);
    strip_markup(Some(&unaccented))
        .unwrap_or_default()
        .trim()
        .to_string()
}
