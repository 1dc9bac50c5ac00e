//! # Recursos Léxicos
//!
//! Listas fixas usadas pelo motor de anotação e pelos filtros:
//!
//! | Recurso          | Uso                                              |
//! |------------------|--------------------------------------------------|
//! | [`STOP_WORDS`]   | base do [`Vocabulary`] (stop words do inglês)    |
//! | [`EMOTICONS`]    | emoticons ASCII "felizes" e "tristes"            |
//! | números por extenso | atributo `is_numeric_like`                    |
//! | TLDs             | atributo `is_url_like`                           |
//!
//! O [`Vocabulary`] é construído uma única vez junto com o pipeline e fica
//! somente-leitura depois disso.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use unicode_segmentation::UnicodeSegmentation;

use crate::error::ConfigurationError;

/// Stop words de base do inglês.
pub const STOP_WORDS: &[&str] = &[
    "a", "about", "above", "across", "after", "afterwards", "again", "against", "all",
    "almost", "alone", "along", "already", "also", "although", "always", "am", "among",
    "amongst", "amount", "an", "and", "another", "any", "anyhow", "anyone", "anything",
    "anyway", "anywhere", "are", "around", "as", "at", "back", "be", "became", "because",
    "become", "becomes", "becoming", "been", "before", "beforehand", "behind", "being",
    "below", "beside", "besides", "between", "beyond", "both", "bottom", "but", "by",
    "ca", "call", "can", "cannot", "could", "did", "do", "does", "doing", "done", "down",
    "due", "during", "each", "eight", "either", "eleven", "else", "elsewhere", "empty",
    "enough", "even", "ever", "every", "everyone", "everything", "everywhere", "except",
    "few", "fifteen", "fifty", "first", "five", "for", "former", "formerly", "forty",
    "four", "from", "front", "full", "further", "get", "give", "go", "had", "has", "have",
    "he", "hence", "her", "here", "hereafter", "hereby", "herein", "hereupon", "hers",
    "herself", "him", "himself", "his", "how", "however", "hundred", "i", "if", "in",
    "indeed", "into", "is", "it", "its", "itself", "just", "keep", "last", "latter",
    "latterly", "least", "less", "made", "make", "many", "may", "me", "meanwhile",
    "might", "mine", "more", "moreover", "most", "mostly", "move", "much", "must", "my",
    "myself", "name", "namely", "neither", "never", "nevertheless", "next", "nine", "no",
    "nobody", "none", "noone", "nor", "not", "nothing", "now", "nowhere", "of", "off",
    "often", "on", "once", "one", "only", "onto", "or", "other", "others", "otherwise",
    "our", "ours", "ourselves", "out", "over", "own", "part", "per", "perhaps", "please",
    "put", "quite", "rather", "re", "really", "regarding", "same", "say", "see", "seem",
    "seemed", "seeming", "seems", "serious", "several", "she", "should", "show", "side",
    "since", "six", "sixty", "so", "some", "somehow", "someone", "something", "sometime",
    "sometimes", "somewhere", "still", "such", "take", "ten", "than", "that", "the",
    "their", "them", "themselves", "then", "thence", "there", "thereafter", "thereby",
    "therefore", "therein", "thereupon", "these", "they", "third", "this", "those",
    "though", "three", "through", "throughout", "thru", "thus", "to", "together", "too",
    "top", "toward", "towards", "twelve", "twenty", "two", "under", "unless", "until",
    "up", "upon", "us", "used", "using", "various", "very", "via", "was", "we", "well",
    "were", "what", "whatever", "when", "whence", "whenever", "where", "whereafter",
    "whereas", "whereby", "wherein", "whereupon", "wherever", "whether", "which", "while",
    "whither", "who", "whoever", "whole", "whom", "whose", "why", "will", "with",
    "within", "without", "would", "yet", "you", "your", "yours", "yourself", "yourselves",
    "'d", "'ll", "'m", "'re", "'s", "'ve", "n't", "’d", "’ll", "’m", "’re", "’s", "’ve",
    "n’t",
];

/// Emoticons ASCII "felizes".
pub const EMOTICONS_HAPPY: &[&str] = &[
    ":-)", ":)", ";)", ":o)", ":]", ":3", ":c)", ":>", "=]", "8)", "=)", ":}", ":^)",
    ":-D", ":D", "8-D", "8D", "x-D", "xD", "X-D", "XD", "=-D", "=D", "=-3", "=3", ":-))",
    ":'-)", ":')", ":*", ":^*", ">:P", ":-P", ":P", "X-P", "x-p", "xp", "XP", ":-p", ":p",
    "=p", ":-b", ":b", ">:)", ">;)", ">:-)", "<3",
];

/// Emoticons ASCII "tristes".
pub const EMOTICONS_SAD: &[&str] = &[
    ":L", ":-/", ">:/", ":S", ">:[", ":@", ":-(", ":[", ":-||", "=L", ":<", ":-[", ":-<",
    "=\\", "=/", ">:(", ":(", ">.<", ":'-(", ":'(", ":\\", ":-c", ":c", ":{", ">:\\", ";(",
];

/// Todos os emoticons reconhecidos (felizes + tristes).
pub static EMOTICONS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    EMOTICONS_HAPPY
        .iter()
        .chain(EMOTICONS_SAD.iter())
        .copied()
        .collect()
});

const NUMBER_WORDS: &[&str] = &[
    "zero", "one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten",
    "eleven", "twelve", "thirteen", "fourteen", "fifteen", "sixteen", "seventeen",
    "eighteen", "nineteen", "twenty", "thirty", "forty", "fifty", "sixty", "seventy",
    "eighty", "ninety", "hundred", "thousand", "million", "billion", "trillion",
    "quadrillion", "gajillion", "bazillion",
];

const ORDINAL_WORDS: &[&str] = &[
    "first", "second", "third", "fourth", "fifth", "sixth", "seventh", "eighth", "ninth",
    "tenth", "eleventh", "twelfth", "thirteenth", "fourteenth", "fifteenth", "sixteenth",
    "seventeenth", "eighteenth", "nineteenth", "twentieth", "thirtieth", "fortieth",
    "fiftieth", "sixtieth", "seventieth", "eightieth", "ninetieth", "hundredth",
    "thousandth", "millionth", "billionth", "trillionth",
];

const QUOTES: &[&str] = &[
    "'", "\"", "«", "»", "‘", "’", "‚", "‛", "“", "”", "„", "‟", "‹", "›", "❮", "❯", "''",
    "``",
];

const TLDS: &[&str] = &[
    "com", "org", "net", "edu", "gov", "mil", "int", "io", "co", "us", "uk", "ca", "au",
    "de", "fr", "es", "it", "nl", "be", "ch", "at", "se", "no", "dk", "fi", "pt", "br",
    "mx", "ar", "jp", "cn", "kr", "in", "ru", "pl", "cz", "ie", "nz", "za", "info", "biz",
    "me", "tv", "ly", "gl", "gd", "app", "dev", "ai", "fm", "am", "to", "cc", "ws", "news",
    "online", "site", "xyz", "blog", "tech", "art", "edu", "museum", "eu", "asia",
];

static PUNCT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\p{P}+$").expect("regex válida"));

/// Verifica se o texto é um emoticon ASCII da lista fixa.
pub fn is_emoticon(text: &str) -> bool {
    EMOTICONS.contains(text)
}

/// Todos os caracteres pertencem a alguma categoria Unicode de pontuação (P*).
pub fn is_punctuation(text: &str) -> bool {
    PUNCT_RE.is_match(text)
}

pub fn is_quote(text: &str) -> bool {
    QUOTES.contains(&text)
}

pub fn is_space(text: &str) -> bool {
    !text.is_empty() && text.chars().all(char::is_whitespace)
}

fn is_digits(text: &str) -> bool {
    !text.is_empty() && text.chars().all(char::is_numeric)
}

/// Numerais, frações simples, números por extenso e ordinais ("3rd", "first").
pub fn is_numeric_like(text: &str) -> bool {
    let text = text
        .strip_prefix(|c| matches!(c, '+' | '-' | '±' | '~'))
        .unwrap_or(text);
    let text: String = text.chars().filter(|c| *c != ',' && *c != '.').collect();
    if is_digits(&text) {
        return true;
    }
    if text.matches('/').count() == 1 {
        if let Some((num, denom)) = text.split_once('/') {
            if is_digits(num) && is_digits(denom) {
                return true;
            }
        }
    }
    let lower = text.to_lowercase();
    if NUMBER_WORDS.contains(&lower.as_str()) || ORDINAL_WORDS.contains(&lower.as_str()) {
        return true;
    }
    ["st", "nd", "rd", "th"]
        .iter()
        .any(|suffix| lower.strip_suffix(suffix).map(is_digits).unwrap_or(false))
}

/// Heurística de URL: esquema conhecido, prefixo `www.` ou domínio com TLD conhecido.
pub fn is_url_like(text: &str) -> bool {
    if text.starts_with("http://") || text.starts_with("https://") {
        return true;
    }
    if text.starts_with("www.") && text.len() >= 5 {
        return true;
    }
    if text.starts_with('.') || text.ends_with('.') || text.contains('@') {
        return false;
    }
    let Some((_, tail)) = text.rsplit_once('.') else {
        return false;
    };
    let tld = tail.split(':').next().unwrap_or(tail);
    if tld.ends_with('/') {
        return true;
    }
    !tld.is_empty()
        && tld.chars().all(char::is_alphabetic)
        && TLDS.contains(&tld.to_lowercase().as_str())
}

/// Caractere pictográfico (emoji) propriamente dito.
fn is_pictographic(c: char) -> bool {
    matches!(c as u32,
        0x1F000..=0x1F02F
        | 0x1F0A0..=0x1F0FF
        | 0x1F170..=0x1F251
        | 0x1F300..=0x1F5FF
        | 0x1F600..=0x1F64F
        | 0x1F680..=0x1F6FF
        | 0x1F900..=0x1F9FF
        | 0x1FA70..=0x1FAFF
        | 0x2600..=0x27BF
        | 0x2300..=0x23FF
        | 0x2B05..=0x2B07
        | 0x2B1B..=0x2B1C
        | 0x2B50
        | 0x2B55
        | 0x3030
        | 0x303D
        | 0x3297
        | 0x3299
        | 0x24C2
        | 0x203C
        | 0x2049
        | 0x2122
        | 0x2139
        | 0x2194..=0x21AA
        | 0x25AA..=0x25FE)
}

/// Modificadores que só fazem sentido dentro de uma sequência de emoji.
fn is_emoji_component(c: char) -> bool {
    matches!(c as u32,
        0x200D              // ZWJ
        | 0xFE0F            // seletor de variação 16
        | 0x20E3            // keycap
        | 0x1F1E6..=0x1F1FF // indicadores regionais (bandeiras)
        | 0x1F3FB..=0x1F3FF // tons de pele
        | 0xE0020..=0xE007F) // tags
}

fn is_emoji_grapheme(grapheme: &str) -> bool {
    // Keycap: "1️⃣", "#⃣"
    if grapheme.ends_with('\u{20E3}') {
        return grapheme
            .chars()
            .next()
            .map(|c| c.is_ascii_digit() || c == '#' || c == '*')
            .unwrap_or(false);
    }
    let mut has_pictograph = false;
    for c in grapheme.chars() {
        if is_pictographic(c) || matches!(c as u32, 0x1F1E6..=0x1F1FF) {
            has_pictograph = true;
        } else if matches!(c, '©' | '®') && grapheme.contains('\u{FE0F}') {
            has_pictograph = true;
        } else if !is_emoji_component(c) {
            return false;
        }
    }
    has_pictograph
}

/// Texto composto apenas de emojis (incluindo sequências ZWJ, bandeiras e tons de pele).
pub fn is_emoji(text: &str) -> bool {
    !text.is_empty() && text.graphemes(true).all(is_emoji_grapheme)
}

/// Forma normalizada de um texto: minúsculas, aspas e reticências canônicas.
pub fn norm(text: &str) -> String {
    let lower = text.to_lowercase();
    let mut out = String::with_capacity(lower.len());
    for c in lower.chars() {
        match c {
            '’' | '‘' | '´' | '`' | '‛' => out.push('\''),
            '“' | '”' | '„' | '‟' => out.push('"'),
            '…' => out.push_str("..."),
            _ => out.push(c),
        }
    }
    out
}

/// Atributos léxicos de uma forma de superfície, independentes do contexto.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lexeme {
    pub norm: String,
    pub is_stop: bool,
    pub is_punctuation: bool,
    pub is_quote: bool,
    pub is_space: bool,
    pub is_numeric_like: bool,
    pub is_url_like: bool,
    pub is_emoji: bool,
}

/// Conjunto de stop words do pipeline.
///
/// Criado uma vez (base do inglês + stoplist opcional) e somente-leitura
/// durante o processamento; é passado por referência a cada estágio.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    stop_words: HashSet<String>,
}

impl Vocabulary {
    /// Vocabulário com as stop words de base do inglês.
    pub fn english() -> Self {
        Self {
            stop_words: STOP_WORDS.iter().map(|w| w.to_string()).collect(),
        }
    }

    /// Estende o vocabulário com uma stoplist (um termo por linha).
    ///
    /// Linhas vazias são ignoradas. Arquivo ausente ou ilegível é erro de
    /// configuração.
    pub fn with_stoplist(mut self, path: &Path) -> Result<Self, ConfigurationError> {
        let content =
            fs::read_to_string(path).map_err(|source| ConfigurationError::UnreadableStoplist {
                path: path.to_path_buf(),
                source,
            })?;
        let before = self.stop_words.len();
        self.extend(content.lines());
        info!(
            path = %path.display(),
            added = self.stop_words.len() - before,
            "stoplist carregada"
        );
        Ok(self)
    }

    pub fn extend<I, S>(&mut self, words: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for word in words {
            let word = word.as_ref().trim();
            if !word.is_empty() {
                debug!(word, "stop word adicionada");
                self.stop_words.insert(word.to_lowercase());
            }
        }
    }

    pub fn is_stop(&self, text: &str) -> bool {
        self.stop_words.contains(&text.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.stop_words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stop_words.is_empty()
    }

    /// Calcula todos os atributos léxicos de `text`.
    pub fn lexeme(&self, text: &str) -> Lexeme {
        Lexeme {
            norm: norm(text),
            is_stop: self.is_stop(text),
            is_punctuation: is_punctuation(text),
            is_quote: is_quote(text),
            is_space: is_space(text),
            is_numeric_like: is_numeric_like(text),
            is_url_like: is_url_like(text),
            is_emoji: is_emoji(text),
        }
    }
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self::english()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_numeric_like() {
        for text in ["42", "1,000", "3.14", "-7", "1/2", "twenty", "Million", "3rd", "first"] {
            assert!(is_numeric_like(text), "{text}");
        }
        for text in ["abc", "2020s", "1/2/3", "", "."] {
            assert!(!is_numeric_like(text), "{text}");
        }
    }

    #[test]
    fn test_url_like() {
        assert!(is_url_like("http://t.co/xyz"));
        assert!(is_url_like("www.example.org"));
        assert!(is_url_like("example.com"));
        assert!(!is_url_like("hello.world"));
        assert!(!is_url_like("user@example.com"));
        assert!(!is_url_like("end."));
    }

    #[test]
    fn test_emoji_detection() {
        assert!(is_emoji("😊"));
        assert!(is_emoji("👍🏽"));
        assert!(is_emoji("👨‍👩‍👧"));
        assert!(is_emoji("🇧🇷"));
        assert!(is_emoji("❤️"));
        assert!(!is_emoji("©"));
        assert!(!is_emoji("a😊"));
        assert!(!is_emoji(""));
    }

    #[test]
    fn test_punctuation_and_quotes() {
        assert!(is_punctuation("!!!"));
        assert!(is_punctuation("'s") == false);
        assert!(is_quote("“"));
        assert!(is_quote("''"));
        assert!(!is_quote("x"));
    }

    #[test]
    fn test_emoticons() {
        assert!(is_emoticon(":-)"));
        assert!(is_emoticon("<3"));
        assert!(is_emoticon(">:\\"));
        assert!(!is_emoticon(":-)))"));
    }

    #[test]
    fn test_stoplist_extends_vocabulary() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "omg\n\n  LOL  \n").unwrap();
        let vocab = Vocabulary::english().with_stoplist(file.path()).unwrap();
        assert!(vocab.is_stop("omg"));
        assert!(vocab.is_stop("OMG"));
        assert!(vocab.is_stop("lol"));
        assert!(!vocab.is_stop(""));
        assert_eq!(vocab.len(), STOP_WORDS.len() + 2);
    }

    #[test]
    fn test_missing_stoplist_is_configuration_error() {
        let err = Vocabulary::english()
            .with_stoplist(Path::new("/nao/existe/stoplist.txt"))
            .unwrap_err();
        assert!(matches!(err, ConfigurationError::UnreadableStoplist { .. }));
    }

    #[test]
    fn test_norm_lowercases_and_straightens() {
        assert_eq!(norm("It’s"), "it's");
        assert_eq!(norm("Wait…"), "wait...");
    }
}
