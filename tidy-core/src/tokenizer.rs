//! # Tokenizador Customizado
//!
//! Divide o texto normalizado em tokens, preservando offsets de byte, com as
//! regras de fronteira do perfil inglês de base e as customizações do pipeline:
//!
//! - **Padrão de token inteiro** (URL | hashtag): qualquer trecho que case com
//!   ele vira um único token, antes de qualquer divisão por pontuação.
//! - **Prefixos / sufixos / infixos**: pontuação, aspas, moeda, reticências,
//!   pictogramas, clíticos (`'s`), unidades após dígitos, hífens entre letras...
//! - **Casos especiais**: exceções de lema (ex.: `humanities` → NOUN/NNS) e os
//!   emoticons ASCII, emitidos como um único token.
//!
//! ## Algoritmo
//!
//! O texto é separado em blocos sem espaço. Para cada bloco, prefixos e sufixos
//! são removidos alternadamente até sobrar um "miolo" que é um caso especial,
//! casa com o padrão de token inteiro, ou não tem mais afixos. O miolo é então
//! quebrado pelos infixos.
//!
//! ```rust
//! use tidy_core::tokenizer::{tokenize, TokenizerConfig};
//!
//! let config = TokenizerConfig::default();
//! let tokens = tokenize("check #WE1S_v2 now!", &config);
//! let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
//! assert_eq!(texts, ["check", "#WE1S_v2", "now", "!"]);
//! ```

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

use crate::lexicon::EMOTICONS;

/// Um token bruto, antes da anotação linguística.
///
/// Mantém a posição exata no texto (`start`/`end` em bytes) para que os
/// estágios seguintes possam alinhar entidades reconhecidas sobre o texto.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawToken {
    pub text: String,
    /// Índice de byte inicial no texto (inclusive).
    pub start: usize,
    /// Índice de byte final no texto (exclusivo).
    pub end: usize,
    /// Índice sequencial do token na lista.
    pub index: usize,
    /// Anotação fixa quando o token é uma exceção de lema.
    pub exception: Option<LemmaException>,
}

/// Exceção de lematização: forma literal → (lema, classe gramatical, tag).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LemmaException {
    pub orth: String,
    pub lemma: String,
    pub pos: String,
    pub tag: String,
}

impl LemmaException {
    pub fn new(orth: &str, lemma: &str, pos: &str, tag: &str) -> Self {
        Self {
            orth: orth.to_string(),
            lemma: lemma.to_string(),
            pos: pos.to_string(),
            tag: tag.to_string(),
        }
    }
}

/// Exceções de lema sempre presentes.
pub fn default_lemma_exceptions() -> Vec<LemmaException> {
    vec![LemmaException::new("humanities", "humanities", "NOUN", "NNS")]
}

#[derive(Debug, Clone, PartialEq)]
enum SpecialCase {
    Lemma(LemmaException),
    Emoticon,
}

const PUNCT_CHARS: &[char] = &[
    '…', ',', ':', ';', '!', '?', '¿', '؟', '¡', '(', ')', '[', ']', '{', '}', '<', '>',
    '_', '#', '*', '&', '。', '？', '！', '，', '、', '；', '：', '～', '·', '।', '،', '۔',
    '؛', '٪',
];

const QUOTE_CHARS: &[char] = &[
    '\'', '"', '”', '“', '`', '‘', '´', '’', '‚', ',', '„', '»', '«', '「', '」', '『', '』',
    '（', '）', '〔', '〕', '【', '】', '《', '》', '〈', '〉',
];

const CURRENCY: &[&str] = &["US$", "C$", "A$", "$", "£", "€", "¥", "฿", "₽", "﷼", "₴"];

const UNITS: &[&str] = &[
    "km²", "km³", "km", "m²", "m³", "m/s", "m", "dm²", "dm³", "dm", "cm²", "cm³", "cm", "mm²",
    "mm³", "mm", "ha", "µm", "nm", "yd", "in", "ft", "kg", "g", "mg", "µg", "t", "lb", "oz",
    "km/h", "kmh", "mph", "hPa", "Pa", "mbar", "mb", "MB", "kb", "KB", "gb", "GB", "tb", "TB",
    "T", "G", "M", "K", "%",
];

const CLITIC_SUFFIXES: &[&str] = &["'s", "'S", "’s", "’S", "—", "–"];

/// Hífens reconhecidos como infixo; a ordem segue a alternância (o primeiro vence).
const HYPHENS: &[&str] = &["-", "–", "—", "--", "---", "——", "~"];

/// Padrão de URL ancorado no token inteiro.
const URL_PATTERN: &str = concat!(
    r"^(?:[\w+\-.]{2,}://)?",
    r"(?:\S+(?::\S*)?@)?",
    r"(?:(?:\d{1,3}\.){3}\d{1,3}",
    r"|(?:[a-z0-9\-]*[a-z0-9]+)(?:\.[a-z0-9][a-z0-9\-]*[a-z0-9])*(?:\.[a-z]{2,}))",
    r"(?::\d{2,5})?",
    r"(?:[/?#]\S*)?$",
);

/// Hashtag: `#` seguido de caracteres de palavra, hífen ou sublinhado.
const HASHTAG_PATTERN: &str = r"^(#[\w_-]+)$";

static ICON_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\p{So}").expect("regex válida"));

fn is_quote_char(c: char) -> bool {
    QUOTE_CHARS.contains(&c)
}

/// Grafema inicial de `s` se ele começa com um símbolo (categoria So, exceto `°`).
fn leading_icon(s: &str) -> Option<usize> {
    if s.starts_with('°') || !ICON_RE.is_match(s) {
        return None;
    }
    s.graphemes(true).next().map(str::len)
}

fn is_single_icon(s: &str) -> bool {
    leading_icon(s) == Some(s.len())
}

fn last_char(s: &str) -> Option<char> {
    s.chars().next_back()
}

/// Regras de fronteira (prefixo, sufixo, infixo) e o padrão de token inteiro.
#[derive(Debug, Clone)]
pub struct BoundaryRules {
    token_match: Regex,
}

impl BoundaryRules {
    /// Regras do perfil inglês com o padrão URL | hashtag.
    pub fn english() -> Self {
        let pattern = format!("{URL_PATTERN}|{HASHTAG_PATTERN}");
        Self {
            token_match: Regex::new(&pattern).expect("padrão URL|hashtag válido"),
        }
    }

    /// O trecho inteiro deve virar um único token (URL ou hashtag)?
    pub fn token_match(&self, s: &str) -> bool {
        self.token_match.is_match(s)
    }

    /// Comprimento em bytes do prefixo de `s`, ou 0.
    pub fn find_prefix(&self, s: &str) -> usize {
        for p in ["§", "%", "=", "—", "–"] {
            if s.starts_with(p) {
                return p.len();
            }
        }
        let mut chars = s.chars();
        let Some(first) = chars.next() else {
            return 0;
        };
        if first == '+' {
            if chars.next().map(|c| c.is_ascii_digit()).unwrap_or(false) {
                return 0;
            }
            return 1;
        }
        if PUNCT_CHARS.contains(&first) {
            return first.len_utf8();
        }
        let dots = s.bytes().take_while(|b| *b == b'.').count();
        if dots >= 2 {
            return dots;
        }
        if is_quote_char(first) {
            return first.len_utf8();
        }
        for c in CURRENCY {
            if s.starts_with(c) {
                return c.len();
            }
        }
        leading_icon(s).unwrap_or(0)
    }

    fn suffix_at(&self, before: &str, tail: &str) -> bool {
        let mut tail_chars = tail.chars();
        let single = match (tail_chars.next(), tail_chars.next()) {
            (Some(c), None) => Some(c),
            _ => None,
        };
        if let Some(c) = single {
            if PUNCT_CHARS.contains(&c) || is_quote_char(c) {
                return true;
            }
        }
        if tail == "……" || (tail.len() >= 2 && tail.bytes().all(|b| b == b'.')) {
            return true;
        }
        if is_single_icon(tail) || CLITIC_SUFFIXES.contains(&tail) {
            return true;
        }
        let prev = last_char(before);
        let prev_is_digit = prev.map(|c| c.is_ascii_digit()).unwrap_or(false);
        if tail == "+" && prev_is_digit {
            return true;
        }
        if prev_is_digit && (CURRENCY.contains(&tail) || UNITS.contains(&tail)) {
            return true;
        }
        if tail == "." {
            let mut back = before.chars().rev();
            let p1 = back.next();
            let p2 = back.next();
            if let (Some(unit), Some('°')) = (p1, p2) {
                if matches!(unit, 'F' | 'f' | 'C' | 'c' | 'K' | 'k') {
                    return true;
                }
            }
            if let Some(p) = p1 {
                if p.is_ascii_digit()
                    || p.is_lowercase()
                    || matches!(p, '%' | '²' | '-' | '+')
                    || PUNCT_CHARS.contains(&p)
                    || is_quote_char(p)
                {
                    return true;
                }
                if p.is_uppercase() && p2.map(char::is_uppercase).unwrap_or(false) {
                    return true;
                }
            }
        }
        false
    }

    /// Comprimento em bytes do sufixo de `s`, ou 0.
    ///
    /// Vence o sufixo que começa mais à esquerda.
    pub fn find_suffix(&self, s: &str) -> usize {
        for (i, _) in s.char_indices() {
            if self.suffix_at(&s[..i], &s[i..]) {
                return s.len() - i;
            }
        }
        0
    }

    fn infix_at(&self, s: &str, i: usize) -> Option<usize> {
        let rest = &s[i..];
        let dots = rest.bytes().take_while(|b| *b == b'.').count();
        if dots >= 2 {
            return Some(dots);
        }
        if rest.starts_with('…') {
            return Some('…'.len_utf8());
        }
        if let Some(len) = leading_icon(rest) {
            return Some(len);
        }
        let prev = last_char(&s[..i])?;
        let c = rest.chars().next()?;
        let after = |len: usize| rest[len..].chars().next();

        if prev.is_ascii_digit() && matches!(c, '+' | '-' | '*' | '^') {
            if let Some(n) = after(1) {
                if n.is_ascii_digit() || n == '-' {
                    return Some(1);
                }
            }
        }
        if c == '.' && (prev.is_lowercase() || is_quote_char(prev)) {
            if let Some(n) = after(1) {
                if n.is_uppercase() || is_quote_char(n) {
                    return Some(1);
                }
            }
        }
        if c == ',' && prev.is_alphabetic() && after(1).map(char::is_alphabetic).unwrap_or(false) {
            return Some(1);
        }
        if prev.is_alphabetic() || prev.is_ascii_digit() {
            for h in HYPHENS {
                if rest.starts_with(h) {
                    if after(h.len()).map(char::is_alphabetic).unwrap_or(false) {
                        return Some(h.len());
                    }
                    break;
                }
            }
            if matches!(c, ':' | '<' | '>' | '=' | '/')
                && after(1).map(char::is_alphabetic).unwrap_or(false)
            {
                return Some(1);
            }
        }
        None
    }

    /// Intervalos `(início, fim)` dos infixos, sem sobreposição, da esquerda para a direita.
    pub fn find_infixes(&self, s: &str) -> Vec<(usize, usize)> {
        let mut found = Vec::new();
        let mut i = 0;
        while i < s.len() {
            if let Some(len) = self.infix_at(s, i) {
                found.push((i, i + len));
                i += len;
            } else {
                i += s[i..].chars().next().map(char::len_utf8).unwrap_or(1);
            }
        }
        found
    }
}

impl Default for BoundaryRules {
    fn default() -> Self {
        Self::english()
    }
}

/// Configuração do tokenizador, montada uma vez por pipeline.
#[derive(Debug, Clone)]
pub struct TokenizerConfig {
    rules: BoundaryRules,
    special_cases: HashMap<String, SpecialCase>,
}

impl TokenizerConfig {
    /// Regras inglesas, emoticons e as exceções de lema dadas (além das padrão).
    pub fn new(extra_exceptions: impl IntoIterator<Item = LemmaException>) -> Self {
        let mut special_cases: HashMap<String, SpecialCase> = EMOTICONS
            .iter()
            .map(|e| (e.to_string(), SpecialCase::Emoticon))
            .collect();
        for exception in default_lemma_exceptions().into_iter().chain(extra_exceptions) {
            special_cases.insert(exception.orth.clone(), SpecialCase::Lemma(exception));
        }
        Self {
            rules: BoundaryRules::english(),
            special_cases,
        }
    }

    pub fn rules(&self) -> &BoundaryRules {
        &self.rules
    }

    /// Exceção de lema registrada para a forma literal `orth`.
    pub fn lemma_exception(&self, orth: &str) -> Option<&LemmaException> {
        match self.special_cases.get(orth) {
            Some(SpecialCase::Lemma(exception)) => Some(exception),
            _ => None,
        }
    }

    fn is_special(&self, s: &str) -> bool {
        self.special_cases.contains_key(s)
    }

    fn make_token(&self, text: &str, start: usize) -> RawToken {
        RawToken {
            text: text.to_string(),
            start,
            end: start + text.len(),
            index: 0,
            exception: self.lemma_exception(text).cloned(),
        }
    }

    /// Remove prefixos e sufixos de `chunk[lo..hi]`.
    ///
    /// Retorna os intervalos dos prefixos (em ordem), o miolo e os sufixos
    /// (do mais externo ao mais interno).
    fn split_affixes(
        &self,
        chunk: &str,
    ) -> (Vec<(usize, usize)>, (usize, usize), Vec<(usize, usize)>) {
        let mut prefixes = Vec::new();
        let mut suffixes = Vec::new();
        let (mut lo, mut hi) = (0, chunk.len());

        while lo < hi {
            let s = &chunk[lo..hi];
            if self.rules.token_match(s) || self.is_special(s) {
                break;
            }
            let pre = self.rules.find_prefix(s);
            if pre > 0 && pre < s.len() && self.is_special(&s[pre..]) {
                prefixes.push((lo, lo + pre));
                lo += pre;
                break;
            }
            let suf = self.rules.find_suffix(s);
            if suf > 0 && suf < s.len() && self.is_special(&s[..s.len() - suf]) {
                suffixes.push((hi - suf, hi));
                hi -= suf;
                break;
            }
            if pre > 0 && suf > 0 && pre + suf <= s.len() {
                prefixes.push((lo, lo + pre));
                suffixes.push((hi - suf, hi));
                lo += pre;
                hi -= suf;
            } else if pre > 0 {
                prefixes.push((lo, lo + pre));
                lo += pre;
            } else if suf > 0 {
                suffixes.push((hi - suf, hi));
                hi -= suf;
            } else {
                break;
            }
        }
        (prefixes, (lo, hi), suffixes)
    }

    /// Tokeniza um bloco sem espaços que começa no byte `offset` do texto.
    fn tokenize_chunk(&self, chunk: &str, offset: usize, tokens: &mut Vec<RawToken>) {
        if self.is_special(chunk) {
            tokens.push(self.make_token(chunk, offset));
            return;
        }
        let (prefixes, (lo, hi), suffixes) = self.split_affixes(chunk);

        for (s, e) in prefixes {
            tokens.push(self.make_token(&chunk[s..e], offset + s));
        }
        if lo < hi {
            let middle = &chunk[lo..hi];
            if self.is_special(middle) || self.rules.token_match(middle) {
                tokens.push(self.make_token(middle, offset + lo));
            } else {
                let mut start = 0;
                for (infix_start, infix_end) in self.rules.find_infixes(middle) {
                    if infix_start > start {
                        tokens.push(self.make_token(&middle[start..infix_start], offset + lo + start));
                    }
                    tokens.push(self.make_token(&middle[infix_start..infix_end], offset + lo + infix_start));
                    start = infix_end;
                }
                if start < middle.len() {
                    tokens.push(self.make_token(&middle[start..], offset + lo + start));
                }
            }
        }
        for (s, e) in suffixes.into_iter().rev() {
            tokens.push(self.make_token(&chunk[s..e], offset + s));
        }
    }
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

/// Tokeniza o texto com a configuração dada.
///
/// Um único espaço `' '` depois de um token é apenas separador; qualquer outra
/// sequência de espaços em branco vira um token de espaço.
pub fn tokenize(text: &str, config: &TokenizerConfig) -> Vec<RawToken> {
    let mut tokens = Vec::new();
    let mut run_start = 0;
    let mut in_space = false;

    for (pos, ch) in text.char_indices() {
        if ch.is_whitespace() != in_space {
            flush_run(text, run_start, pos, in_space, !tokens.is_empty(), config, &mut tokens);
            run_start = pos;
            in_space = !in_space;
        }
    }
    flush_run(text, run_start, text.len(), in_space, !tokens.is_empty(), config, &mut tokens);

    // Re-indexa os tokens
    for (i, token) in tokens.iter_mut().enumerate() {
        token.index = i;
    }
    tokens
}

/// Fecha um bloco (espaço ou não-espaço) e adiciona seus tokens à lista.
fn flush_run(
    text: &str,
    start: usize,
    end: usize,
    is_space: bool,
    after_token: bool,
    config: &TokenizerConfig,
    tokens: &mut Vec<RawToken>,
) {
    if start >= end {
        return;
    }
    let run = &text[start..end];
    if !is_space {
        config.tokenize_chunk(run, start, tokens);
        return;
    }
    // O primeiro espaço simples após um token é só separador.
    let (skip, rest) = match run.strip_prefix(' ') {
        Some(rest) if after_token => (1, rest),
        _ => (0, run),
    };
    if !rest.is_empty() {
        push_token(tokens, rest.to_string(), start + skip, end);
    }
}

/// Adiciona um token sem exceção de lema
fn push_token(tokens: &mut Vec<RawToken>, text: String, start: usize, end: usize) {
    tokens.push(RawToken {
        text,
        start,
        end,
        index: 0,
        exception: None,
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(text: &str) -> Vec<String> {
        tokenize(text, &TokenizerConfig::default())
            .into_iter()
            .map(|t| t.text)
            .collect()
    }

    #[test]
    fn test_tokenize_basic_punctuation() {
        assert_eq!(texts("it's amazing!!!"), ["it", "'s", "amazing", "!", "!", "!"]);
        assert_eq!(texts("(hello), world."), ["(", "hello", ")", ",", "world", "."]);
    }

    #[test]
    fn test_hashtag_is_atomic() {
        assert_eq!(texts("check #WE1S_v2 now"), ["check", "#WE1S_v2", "now"]);
        assert_eq!(texts("#digital-humanities"), ["#digital-humanities"]);
    }

    #[test]
    fn test_url_is_atomic() {
        assert_eq!(
            texts("see http://t.co/xyz now"),
            ["see", "http://t.co/xyz", "now"]
        );
        assert_eq!(
            texts("visit www.we1s.ucsb.edu!"),
            ["visit", "www.we1s.ucsb.edu", "!"]
        );
    }

    #[test]
    fn test_iso_date_splits_on_hyphens() {
        assert_eq!(texts("2020-01-01,"), ["2020", "-", "01", "-", "01", ","]);
    }

    #[test]
    fn test_units_and_currency() {
        assert_eq!(texts("10km"), ["10", "km"]);
        assert_eq!(texts("$5"), ["$", "5"]);
        assert_eq!(texts("5$"), ["5", "$"]);
    }

    #[test]
    fn test_infix_hyphen_between_letters() {
        assert_eq!(texts("well-known"), ["well", "-", "known"]);
    }

    #[test]
    fn test_ellipsis_and_abbreviation() {
        assert_eq!(texts("wait..."), ["wait", "..."]);
        assert_eq!(texts("U.S."), ["U.S."]);
    }

    #[test]
    fn test_emoji_split_from_word() {
        assert_eq!(texts("OMG😊"), ["OMG", "😊"]);
        assert_eq!(texts("👍🏽"), ["👍🏽"]);
    }

    #[test]
    fn test_emoticons_are_special_cases() {
        assert_eq!(texts(":-) <3 :-||"), [":-)", "<3", ":-||"]);
    }

    #[test]
    fn test_lemma_exception_survives_suffix_split() {
        let tokens = tokenize("the humanities!", &TokenizerConfig::default());
        let humanities = &tokens[1];
        assert_eq!(humanities.text, "humanities");
        let exception = humanities.exception.as_ref().unwrap();
        assert_eq!(exception.pos, "NOUN");
        assert_eq!(exception.tag, "NNS");
        assert!(tokens[0].exception.is_none());
    }

    #[test]
    fn test_extra_lemma_exception() {
        let config = TokenizerConfig::new(vec![LemmaException::new("data", "data", "NOUN", "NNS")]);
        let tokens = tokenize("big data", &config);
        assert!(tokens[1].exception.is_some());
        assert!(config.lemma_exception("humanities").is_some());
    }

    #[test]
    fn test_whitespace_tokens_and_offsets() {
        let text = "a  b\nc";
        let tokens = tokenize(text, &TokenizerConfig::default());
        let got: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(got, ["a", " ", "b", "\n", "c"]);
        for token in &tokens {
            assert_eq!(&text[token.start..token.end], token.text);
        }
        assert!(tokens.iter().enumerate().all(|(i, t)| t.index == i));
    }
}
