//! # Motor de Regras para Inglês
//!
//! Implementação embutida de [`AnnotationEngine`]: não há modelo estatístico,
//! apenas conhecimento explícito aplicado em passadas ordenadas.
//!
//! ## Etapas
//!
//! 1. Tokenização com a [`TokenizerConfig`] do pipeline.
//! 2. Atributos léxicos de cada token ([`Vocabulary::lexeme`]).
//! 3. Classe gramatical, tag e lema por listas fechadas + sufixos; exceções de
//!    lema têm prioridade absoluta.
//! 4. Entidades, em ordem de prioridade (a primeira passada que cobre um token vence):
//!    gazetteer (n-gramas) → título + nome próprio (PERSON) → padrões regex
//!    (MONEY, PERCENT, DATE, TIME, QUANTITY, ORDINAL) → numerais soltos (CARDINAL).
//!
//! Os padrões regex rodam sobre o texto; um casamento só vira entidade se
//! começar e terminar exatamente em fronteiras de token.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::annotation::{AnnotationEngine, Document, EntityLabel, EntitySpan, Token};
use crate::config::PipelineConfig;
use crate::lexicon::{Lexeme, Vocabulary};
use crate::tokenizer::{tokenize, RawToken, TokenizerConfig};

const MONTHS: &str = "January|February|March|April|May|June|July|August|September|October|November|December|Jan|Feb|Mar|Apr|Jun|Jul|Aug|Sept|Sep|Oct|Nov|Dec";

static ENTITY_PATTERNS: Lazy<Vec<(EntityLabel, &'static str, Regex)>> = Lazy::new(|| {
    let date = format!(
        concat!(
            r"\b\d{{4}}-\d{{1,2}}-\d{{1,2}}\b",
            r"|\b\d{{1,2}}/\d{{1,2}}/\d{{2,4}}\b",
            r"|\b(?:{m})\.?(?:\s+\d{{1,2}}(?:st|nd|rd|th)?)?(?:,?\s+\d{{4}})?\b",
            r"|\b\d{{1,2}}(?:st|nd|rd|th)?\s+(?:of\s+)?(?:{m})(?:,?\s+\d{{4}})?\b",
            r"|(?i:\b(?:mon|tues|wednes|thurs|fri|satur|sun)day\b)",
            r"|(?i:\b(?:today|yesterday|tomorrow)\b)",
            r"|(?i:\b(?:last|next|this)\s+(?:week|month|year|weekend|summer|winter|spring|fall|autumn|decade|century)\b)",
            r"|(?i:\b\d+\s+(?:days?|weeks?|months?|years?|decades?)\s+(?:ago|later)\b)",
            r"|\b(?:19|20)\d{{2}}s?\b",
        ),
        m = MONTHS
    );
    let patterns: [(EntityLabel, &'static str, String); 6] = [
        (
            EntityLabel::Money,
            "money_pattern",
            concat!(
                r"(?i)(?:US\$|C\$|A\$|[$£€¥])\s?\d[\d,]*(?:\.\d+)?(?:\s?(?:k|m|bn|million|billion|trillion)\b)?",
                r"|\b\d[\d,]*(?:\.\d+)?\s*(?:dollars?|bucks|euros?|cents|pounds\s+sterling)\b",
            )
            .to_string(),
        ),
        (
            EntityLabel::Percent,
            "percent_pattern",
            r"(?i)\b\d+(?:\.\d+)?\s?(?:%|percent\b|per\s+cent\b)".to_string(),
        ),
        (EntityLabel::Date, "date_pattern", date),
        (
            EntityLabel::Time,
            "time_pattern",
            concat!(
                r"(?i)\b\d{1,2}:\d{2}(?::\d{2})?(?:\s*(?:am|pm)\b|\s*[ap]\.m\.)?",
                r"|\b\d{1,2}\s*(?:(?:am|pm)\b|a\.m\.|p\.m\.)",
                r"|\b(?:tonight|noon|midnight)\b",
                r"|\bthis\s+(?:morning|afternoon|evening)\b",
                r"|\b\d+\s+(?:hours?|minutes?|mins|seconds?|secs)\b",
            )
            .to_string(),
        ),
        (
            EntityLabel::Quantity,
            "quantity_pattern",
            r"(?i)\b\d+(?:\.\d+)?\s?(?:km|kg|mg|lbs?|miles?|feet|foot|ft|meters?|metres?|inches|tons?|gallons?|lit(?:er|re)s?|mph|kilomet(?:er|re)s?|pounds|ounces|oz|acres?)\b".to_string(),
        ),
        (
            EntityLabel::Ordinal,
            "ordinal_pattern",
            r"(?i)\b\d+(?:st|nd|rd|th)\b|\b(?:first|second|third|fourth|fifth|sixth|seventh|eighth|ninth|tenth|eleventh|twelfth|twentieth|hundredth)\b".to_string(),
        ),
    ];
    patterns
        .into_iter()
        .map(|(label, name, pattern)| {
            (label, name, Regex::new(&pattern).expect("padrão de entidade válido"))
        })
        .collect()
});

const DETERMINERS: &[&str] = &[
    "the", "a", "an", "this", "that", "these", "those", "every", "each", "some", "any", "no",
    "all", "both", "either", "neither", "another",
];
const POSSESSIVES: &[&str] = &["my", "your", "his", "its", "our", "their", "her"];
const PRONOUNS: &[&str] = &[
    "i", "you", "he", "she", "it", "we", "they", "me", "him", "us", "them", "myself",
    "yourself", "himself", "herself", "itself", "ourselves", "themselves", "mine", "yours",
    "ours", "theirs", "someone", "everyone", "anyone", "nobody", "something", "everything",
    "anything", "nothing",
];
const ADPOSITIONS: &[&str] = &[
    "in", "on", "at", "by", "for", "with", "from", "of", "about", "into", "over", "under",
    "after", "before", "through", "between", "without", "during", "against", "among", "via",
    "per", "across", "behind", "beyond", "near", "toward", "towards", "upon", "within",
];
const CONJUNCTIONS: &[&str] = &["and", "or", "but", "nor", "yet", "&"];
const SUBORDINATORS: &[&str] = &[
    "because", "although", "if", "while", "since", "unless", "whereas", "though", "whether",
    "than",
];
const MODALS: &[&str] = &["will", "would", "shall", "should", "can", "could", "may", "might", "must", "ca", "wo"];
const ADVERBS: &[&str] = &[
    "very", "really", "just", "also", "too", "so", "now", "then", "here", "there", "never",
    "always", "often", "quite", "still", "already", "soon", "again", "ever", "even", "only",
    "almost", "not",
];
const INTERJECTIONS: &[&str] = &[
    "omg", "lol", "wow", "oh", "yes", "yeah", "hey", "haha", "hahaha", "hi", "hello", "ok",
    "okay", "thanks", "thx", "ugh", "yay", "wtf", "lmao", "rofl", "smh", "please",
];
const ADJECTIVE_SUFFIXES: &[&str] = &["ous", "ful", "ive", "able", "ible", "ic", "less", "ish", "al"];

/// Títulos que precedem nomes de pessoas
const PERSON_TITLES: &[&str] = &[
    "mr", "mrs", "ms", "dr", "prof", "president", "senator", "sen", "rep", "gov", "governor",
    "mayor", "pope", "sir", "lady", "lord", "king", "queen", "prince", "princess", "professor",
];

/// Gazetteer embutido: (texto, rótulo).
const DEFAULT_GAZETTEER: &[(&str, EntityLabel)] = &[
    ("united states", EntityLabel::Gpe),
    ("usa", EntityLabel::Gpe),
    ("uk", EntityLabel::Gpe),
    ("united kingdom", EntityLabel::Gpe),
    ("new york", EntityLabel::Gpe),
    ("los angeles", EntityLabel::Gpe),
    ("san francisco", EntityLabel::Gpe),
    ("santa barbara", EntityLabel::Gpe),
    ("california", EntityLabel::Gpe),
    ("texas", EntityLabel::Gpe),
    ("london", EntityLabel::Gpe),
    ("paris", EntityLabel::Gpe),
    ("canada", EntityLabel::Gpe),
    ("china", EntityLabel::Gpe),
    ("india", EntityLabel::Gpe),
    ("europe", EntityLabel::Loc),
    ("africa", EntityLabel::Loc),
    ("asia", EntityLabel::Loc),
    ("twitter", EntityLabel::Org),
    ("google", EntityLabel::Org),
    ("facebook", EntityLabel::Org),
    ("apple", EntityLabel::Org),
    ("microsoft", EntityLabel::Org),
    ("nasa", EntityLabel::Org),
    ("white house", EntityLabel::Org),
    ("harvard", EntityLabel::Org),
    ("stanford", EntityLabel::Org),
    ("university of california", EntityLabel::Org),
    ("national endowment for the humanities", EntityLabel::Org),
    ("american", EntityLabel::Norp),
    ("americans", EntityLabel::Norp),
    ("british", EntityLabel::Norp),
    ("european", EntityLabel::Norp),
    ("democrats", EntityLabel::Norp),
    ("republicans", EntityLabel::Norp),
    ("english", EntityLabel::Language),
    ("spanish", EntityLabel::Language),
    ("french", EntityLabel::Language),
    ("covid-19", EntityLabel::Event),
    ("world war ii", EntityLabel::Event),
];

/// Motor de anotação baseado em regras, gazetteers e padrões regex.
pub struct RuleEngine {
    model: String,
    /// Entradas do gazetteer já tokenizadas (lowercase), mais longas primeiro.
    gazetteer: Vec<(Vec<String>, EntityLabel)>,
}

impl RuleEngine {
    pub fn new(model: &str) -> Self {
        let mut engine = Self {
            model: model.to_string(),
            gazetteer: Vec::new(),
        };
        for (text, label) in DEFAULT_GAZETTEER {
            engine.add_entry(text, *label);
        }
        engine
    }

    /// Motor com o gazetteer embutido mais as entradas válidas da configuração.
    pub fn from_config(model: &str, config: &PipelineConfig) -> Self {
        let mut engine = Self::new(model);
        for entry in &config.gazetteer {
            match entry.label.parse() {
                Ok(label) => engine.add_entry(&entry.text, label),
                Err(err) => debug!(%err, text = %entry.text, "entrada de gazetteer ignorada"),
            }
        }
        engine
    }

    pub fn add_entry(&mut self, text: &str, label: EntityLabel) {
        let parts: Vec<String> = tokenize(text, &TokenizerConfig::default())
            .into_iter()
            .filter(|t| !t.text.trim().is_empty())
            .map(|t| t.text.to_lowercase())
            .collect();
        if parts.is_empty() {
            return;
        }
        self.gazetteer.push((parts, label));
        self.gazetteer.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
    }

    /// Reconhece entidades sobre os tokens; spans em ordem e sem sobreposição.
    pub fn recognize(&self, text: &str, tokens: &[RawToken], lexemes: &[Lexeme]) -> Vec<EntitySpan> {
        let mut owner: Vec<Option<EntityLabel>> = vec![None; tokens.len()];
        let mut spans: Vec<EntitySpan> = Vec::new();

        let mut claim = |start: usize, end: usize, label: EntityLabel, rule: &str,
                         owner: &mut Vec<Option<EntityLabel>>| {
            if start >= end || owner[start..end].iter().any(Option::is_some) {
                return;
            }
            for slot in &mut owner[start..end] {
                *slot = Some(label);
            }
            let root = (start..end)
                .rev()
                .find(|&i| !lexemes[i].is_punctuation)
                .unwrap_or(end - 1);
            debug!(rule, label = label.name(), start, end, "entidade reconhecida");
            spans.push(EntitySpan { start, end, label, root });
        };

        // 1. Gazetteer (n-gramas, mais longos primeiro)
        for i in 0..tokens.len() {
            for (parts, label) in &self.gazetteer {
                if i + parts.len() > tokens.len() {
                    continue;
                }
                let matches = parts
                    .iter()
                    .enumerate()
                    .all(|(j, part)| tokens[i + j].text.to_lowercase() == *part);
                if matches {
                    claim(i, i + parts.len(), *label, "gazetteer", &mut owner);
                    break;
                }
            }
        }

        // 2. Título + nomes capitalizados: "Dr. Jane Smith" → PERSON
        for i in 0..tokens.len() {
            if !PERSON_TITLES.contains(&tokens[i].text.to_lowercase().as_str()) {
                continue;
            }
            let mut j = i + 1;
            if tokens.get(j).map(|t| t.text == ".").unwrap_or(false) {
                j += 1;
            }
            let first = j;
            while tokens.get(j).map(|t| is_capitalized_word(&t.text)).unwrap_or(false) {
                j += 1;
            }
            claim(first, j, EntityLabel::Person, "title_pattern", &mut owner);
        }

        // 3. Padrões regex alinhados a fronteiras de token
        for (label, name, regex) in ENTITY_PATTERNS.iter() {
            for m in regex.find_iter(text) {
                if let Some((start, end)) = align(tokens, m.start(), m.end()) {
                    claim(start, end, *label, name, &mut owner);
                }
            }
        }

        // 4. Numerais restantes → CARDINAL (sequências contíguas)
        let mut i = 0;
        while i < tokens.len() {
            if lexemes[i].is_numeric_like && owner[i].is_none() {
                let start = i;
                while i < tokens.len() && lexemes[i].is_numeric_like && owner[i].is_none() {
                    i += 1;
                }
                claim(start, i, EntityLabel::Cardinal, "numeral", &mut owner);
            } else {
                i += 1;
            }
        }

        spans.sort_by_key(|s| s.start);
        spans
    }
}

impl AnnotationEngine for RuleEngine {
    fn name(&self) -> &str {
        &self.model
    }

    fn annotate(&self, text: &str, tokenizer: &TokenizerConfig, vocab: &Vocabulary) -> Document {
        let raw = tokenize(text, tokenizer);
        let lexemes: Vec<Lexeme> = raw.iter().map(|t| vocab.lexeme(&t.text)).collect();

        let mut tagged: Vec<(String, String)> = Vec::with_capacity(raw.len());
        let mut is_first = true;
        for (i, token) in raw.iter().enumerate() {
            let prev_pos = tagged.last().map(|(pos, _)| pos.as_str());
            let (pos, tag) = tag_token(token, &lexemes[i], prev_pos, is_first);
            if pos != "SPACE" && pos != "PUNCT" {
                is_first = false;
            }
            tagged.push((pos, tag));
        }
        let deps = assign_deps(&tagged);
        let entities = self.recognize(text, &raw, &lexemes);

        let mut entity_of = vec![None; raw.len()];
        for span in &entities {
            for slot in &mut entity_of[span.start..span.end] {
                *slot = Some(span.label);
            }
        }

        let tokens = raw
            .into_iter()
            .zip(lexemes)
            .zip(tagged)
            .zip(deps)
            .enumerate()
            .map(|(i, (((token, lexeme), (pos, tag)), dep))| {
                let lemma = match &token.exception {
                    Some(exception) => exception.lemma.clone(),
                    None => lemmatize(&lexeme.norm, &pos, &tag),
                };
                Token {
                    norm: lexeme.norm,
                    lemma,
                    pos,
                    tag,
                    dep,
                    start: token.start,
                    end: token.end,
                    index: i,
                    is_stop: lexeme.is_stop,
                    is_punctuation: lexeme.is_punctuation,
                    is_quote: lexeme.is_quote,
                    is_space: lexeme.is_space,
                    is_numeric_like: lexeme.is_numeric_like,
                    is_url_like: lexeme.is_url_like,
                    is_emoji: lexeme.is_emoji,
                    entity_type: entity_of[i],
                    text: token.text,
                }
            })
            .collect();

        Document {
            text: text.to_string(),
            tokens,
            entities,
        }
    }
}

/// Intervalo de tokens `[início, fim)` que cobre exatamente os bytes `[start, end)`.
fn align(tokens: &[RawToken], start: usize, end: usize) -> Option<(usize, usize)> {
    let first = tokens.iter().position(|t| t.start == start)?;
    let last = tokens[first..].iter().position(|t| t.end == end)? + first;
    Some((first, last + 1))
}

fn is_capitalized_word(text: &str) -> bool {
    let mut chars = text.chars();
    chars.next().map(char::is_uppercase).unwrap_or(false) && chars.all(char::is_alphabetic)
}

fn punct_tag(text: &str) -> &'static str {
    match text {
        "." | "!" | "?" => ".",
        "," => ",",
        ":" | ";" | "..." | "…" | "-" | "--" | "—" | "–" => ":",
        "(" | "[" | "{" => "-LRB-",
        ")" | "]" | "}" => "-RRB-",
        "\"" | "“" | "``" | "'" | "‘" => "``",
        "”" | "''" | "’" => "''",
        _ => "NFP",
    }
}

fn aux_tag(lower: &str) -> Option<&'static str> {
    Some(match lower {
        "is" | "'s" => "VBZ",
        "am" | "are" | "'m" | "'re" => "VBP",
        "was" | "were" => "VBD",
        "be" => "VB",
        "been" => "VBN",
        "being" => "VBG",
        "have" | "'ve" => "VBP",
        "has" => "VBZ",
        "had" | "'d" => "VBD",
        "do" => "VBP",
        "does" => "VBZ",
        "did" => "VBD",
        "'ll" => "MD",
        m if MODALS.contains(&m) => "MD",
        _ => return None,
    })
}

/// Classe gramatical e tag de um token (heurística).
fn tag_token(
    token: &RawToken,
    lexeme: &Lexeme,
    prev_pos: Option<&str>,
    is_first: bool,
) -> (String, String) {
    if let Some(exception) = &token.exception {
        return (exception.pos.clone(), exception.tag.clone());
    }
    let text = token.text.as_str();
    let lower = lexeme.norm.as_str();
    let pair = |pos: &str, tag: &str| (pos.to_string(), tag.to_string());

    if lexeme.is_space {
        return pair("SPACE", "_SP");
    }
    if lexeme.is_emoji {
        return pair("SYM", "NFP");
    }
    if lexeme.is_url_like {
        return pair("X", "ADD");
    }
    if lexeme.is_punctuation {
        return pair("PUNCT", punct_tag(text));
    }
    if (text.starts_with('#') || text.starts_with('@')) && text.chars().count() > 1 {
        return pair("PROPN", "NNP");
    }
    if lexeme.is_numeric_like && !lower.chars().any(char::is_alphabetic) {
        return pair("NUM", "CD");
    }
    if matches!(text, "$" | "£" | "€" | "¥") {
        return pair("SYM", "$");
    }
    if lower == "'s" || lower == "’s" {
        return if prev_pos == Some("PRON") {
            pair("AUX", "VBZ")
        } else {
            pair("PART", "POS")
        };
    }
    if lower == "n't" || lower == "not" {
        return pair("PART", "RB");
    }
    if lower == "to" {
        return pair("PART", "TO");
    }
    if let Some(tag) = aux_tag(lower) {
        return pair("AUX", tag);
    }
    if DETERMINERS.contains(&lower) {
        return pair("DET", "DT");
    }
    if POSSESSIVES.contains(&lower) {
        return pair("DET", "PRP$");
    }
    if PRONOUNS.contains(&lower) {
        return pair("PRON", "PRP");
    }
    match lower {
        "what" | "who" | "whom" => return pair("PRON", "WP"),
        "which" => return pair("DET", "WDT"),
        "where" | "when" | "why" | "how" => return pair("ADV", "WRB"),
        _ => {}
    }
    if ADPOSITIONS.contains(&lower) {
        return pair("ADP", "IN");
    }
    if CONJUNCTIONS.contains(&lower) {
        return pair("CCONJ", "CC");
    }
    if SUBORDINATORS.contains(&lower) {
        return pair("SCONJ", "IN");
    }
    if INTERJECTIONS.contains(&lower) {
        return pair("INTJ", "UH");
    }
    if ADVERBS.contains(&lower) {
        return pair("ADV", "RB");
    }
    if lexeme.is_numeric_like {
        return pair("NUM", "CD");
    }
    let alphabetic = text.chars().all(char::is_alphabetic);
    let upper_initial = text.chars().next().map(char::is_uppercase).unwrap_or(false);
    if alphabetic && upper_initial && (!is_first || text.chars().count() > 1 && text.chars().all(char::is_uppercase)) {
        return if lower.ends_with('s') && !lower.ends_with("ss") && text.chars().count() > 3 {
            pair("PROPN", "NNPS")
        } else {
            pair("PROPN", "NNP")
        };
    }
    if lower.ends_with("ly") && lower.len() > 4 {
        return pair("ADV", "RB");
    }
    if lower.ends_with("ing") && lower.len() > 4 {
        return pair("VERB", "VBG");
    }
    if lower.ends_with("ed") && lower.len() > 3 {
        return pair("VERB", "VBD");
    }
    if ADJECTIVE_SUFFIXES.iter().any(|s| lower.ends_with(s) && lower.len() > s.len() + 2) {
        return pair("ADJ", "JJ");
    }
    if matches!(prev_pos, Some("PRON") | Some("AUX") | Some("PART")) && alphabetic {
        return if lower.ends_with('s') && prev_pos == Some("PRON") {
            pair("VERB", "VBZ")
        } else {
            pair("VERB", "VB")
        };
    }
    if lower.ends_with('s')
        && !["ss", "us", "is"].iter().any(|s| lower.ends_with(s))
        && lower.len() > 3
    {
        return pair("NOUN", "NNS");
    }
    pair("NOUN", "NN")
}

/// Rótulos de dependência simplificados: o primeiro verbo é a raiz.
fn assign_deps(tagged: &[(String, String)]) -> Vec<String> {
    let root = tagged
        .iter()
        .position(|(pos, _)| pos == "VERB")
        .or_else(|| tagged.iter().position(|(pos, _)| pos == "AUX"))
        .or_else(|| tagged.iter().position(|(pos, _)| pos == "NOUN" || pos == "PROPN"));

    let mut seen_verb = false;
    tagged
        .iter()
        .enumerate()
        .map(|(i, (pos, tag))| {
            if Some(i) == root {
                seen_verb = true;
                return "ROOT".to_string();
            }
            let next_pos = tagged.get(i + 1).map(|(p, _)| p.as_str());
            let prev_pos = i.checked_sub(1).and_then(|j| tagged.get(j)).map(|(p, _)| p.as_str());
            let dep = match pos.as_str() {
                "PUNCT" => "punct",
                "SPACE" => "",
                "DET" => "det",
                "ADP" => "prep",
                "CCONJ" => "cc",
                "SCONJ" => "mark",
                "AUX" => "aux",
                "PART" if tag == "POS" => "case",
                "PART" if tag == "RB" => "neg",
                "PART" => "aux",
                "ADJ" => "amod",
                "ADV" => "advmod",
                "NUM" => "nummod",
                "INTJ" => "intj",
                "PRON" => "nsubj",
                "VERB" => "conj",
                "NOUN" | "PROPN" => {
                    if matches!(next_pos, Some("NOUN") | Some("PROPN")) {
                        "compound"
                    } else if prev_pos == Some("ADP") {
                        "pobj"
                    } else if seen_verb {
                        "dobj"
                    } else {
                        "nsubj"
                    }
                }
                _ => "dep",
            };
            dep.to_string()
        })
        .collect()
}

/// Lema heurístico a partir da forma normalizada.
fn lemmatize(norm: &str, pos: &str, tag: &str) -> String {
    match (pos, tag) {
        ("AUX", _) => match norm {
            "is" | "am" | "are" | "was" | "were" | "be" | "been" | "being" | "'s" | "'m" | "'re" => {
                "be".to_string()
            }
            "has" | "had" | "have" | "'ve" | "'d" => "have".to_string(),
            "does" | "did" | "do" => "do".to_string(),
            "'ll" => "will".to_string(),
            other => other.to_string(),
        },
        ("NOUN", "NNS") | ("PROPN", "NNPS") => singularize(norm),
        ("VERB", "VBG") => norm.strip_suffix("ing").unwrap_or(norm).to_string(),
        ("VERB", "VBD") => {
            if let Some(stem) = norm.strip_suffix("ied") {
                format!("{stem}y")
            } else {
                norm.strip_suffix("ed").unwrap_or(norm).to_string()
            }
        }
        ("VERB", "VBZ") => singularize(norm),
        _ => norm.to_string(),
    }
}

fn singularize(word: &str) -> String {
    if let Some(stem) = word.strip_suffix("ies") {
        return format!("{stem}y");
    }
    for ending in ["sses", "xes", "zes", "ches", "shes"] {
        if word.ends_with(ending) {
            return word[..word.len() - 2].to_string();
        }
    }
    word.strip_suffix('s').unwrap_or(word).to_string()
}
