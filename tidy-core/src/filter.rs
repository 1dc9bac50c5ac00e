//! # Pipeline de Filtros de Tokens
//!
//! Um token é **excluído** se qualquer um dos predicados abaixo valer,
//! avaliados nesta ordem (o primeiro que casa é o motivo registrado):
//!
//! | #  | Predicado                                         |
//! |----|---------------------------------------------------|
//! | 1  | emoji / pictograma                                |
//! | 2  | emoticon ASCII da lista fixa                      |
//! | 3  | stop word                                         |
//! | 4  | pontuação                                         |
//! | 5  | aspas                                             |
//! | 6  | espaço em branco                                  |
//! | 7  | numeral (inclusive por extenso)                   |
//! | 8  | parece URL                                        |
//! | 9  | começa com `pic.twitter.com`                      |
//! | 10 | entidade MONEY, DATE, TIME ou QUANTITY            |
//! | 11 | clítico possessivo `'s`                           |
//! | 12 | forma normalizada com no máximo 1 caractere       |
//!
//! Os sobreviventes seguem adiante pela forma normalizada, com espaços
//! internos trocados por `_`. A ordem original nunca é alterada.

use serde::{Deserialize, Serialize};

use crate::annotation::{Document, EntityLabel, Token};
use crate::lexicon::is_emoticon;

/// Entidades descartadas pelo predicado 10.
pub const EXCLUDED_ENTITY_TYPES: [EntityLabel; 4] = [
    EntityLabel::Money,
    EntityLabel::Date,
    EntityLabel::Time,
    EntityLabel::Quantity,
];

const PIC_TWITTER_PREFIX: &str = "pic.twitter.com";

/// Motivo da exclusão de um token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExclusionReason {
    Emoji,
    Emoticon,
    StopWord,
    Punctuation,
    Quote,
    Space,
    NumericLike,
    UrlLike,
    PicTwitterLink,
    EntityType,
    PossessiveClitic,
    TooShort,
}

impl ExclusionReason {
    pub fn name(&self) -> &'static str {
        match self {
            ExclusionReason::Emoji => "emoji",
            ExclusionReason::Emoticon => "emoticon",
            ExclusionReason::StopWord => "stop_word",
            ExclusionReason::Punctuation => "punctuation",
            ExclusionReason::Quote => "quote",
            ExclusionReason::Space => "space",
            ExclusionReason::NumericLike => "numeric_like",
            ExclusionReason::UrlLike => "url_like",
            ExclusionReason::PicTwitterLink => "pic_twitter_link",
            ExclusionReason::EntityType => "entity_type",
            ExclusionReason::PossessiveClitic => "possessive_clitic",
            ExclusionReason::TooShort => "too_short",
        }
    }
}

/// Primeiro predicado de exclusão que vale para o token, se algum.
pub fn exclusion_reason(token: &Token) -> Option<ExclusionReason> {
    let reason = if token.is_emoji {
        ExclusionReason::Emoji
    } else if is_emoticon(&token.text) {
        ExclusionReason::Emoticon
    } else if token.is_stop {
        ExclusionReason::StopWord
    } else if token.is_punctuation {
        ExclusionReason::Punctuation
    } else if token.is_quote {
        ExclusionReason::Quote
    } else if token.is_space {
        ExclusionReason::Space
    } else if token.is_numeric_like {
        ExclusionReason::NumericLike
    } else if token.is_url_like {
        ExclusionReason::UrlLike
    } else if token.text.starts_with(PIC_TWITTER_PREFIX) {
        ExclusionReason::PicTwitterLink
    } else if token
        .entity_type
        .map(|label| EXCLUDED_ENTITY_TYPES.contains(&label))
        .unwrap_or(false)
    {
        ExclusionReason::EntityType
    } else if token.text == "'s" {
        ExclusionReason::PossessiveClitic
    } else if token.norm.chars().count() <= 1 {
        ExclusionReason::TooShort
    } else {
        return None;
    };
    Some(reason)
}

/// Forma de saída de um sobrevivente: norma aparada, espaços internos → `_`.
pub fn tidy_form(norm: &str) -> String {
    norm.split_whitespace().collect::<Vec<_>>().join("_")
}

/// Formas de saída dos tokens que sobrevivem a todos os predicados, em ordem.
pub fn filter_tokens(document: &Document) -> Vec<String> {
    document
        .tokens
        .iter()
        .filter(|token| exclusion_reason(token).is_none())
        .map(|token| tidy_form(&token.norm))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(text: &str) -> Token {
        Token {
            text: text.to_string(),
            norm: text.to_lowercase(),
            lemma: text.to_lowercase(),
            pos: "NOUN".into(),
            tag: "NN".into(),
            dep: "dep".into(),
            start: 0,
            end: text.len(),
            index: 0,
            is_stop: false,
            is_punctuation: false,
            is_quote: false,
            is_space: false,
            is_numeric_like: false,
            is_url_like: false,
            is_emoji: false,
            entity_type: None,
        }
    }

    #[test]
    fn test_each_predicate() {
        let cases: Vec<(Token, ExclusionReason)> = vec![
            (Token { is_emoji: true, ..token("😊") }, ExclusionReason::Emoji),
            (token(":-)"), ExclusionReason::Emoticon),
            (Token { is_stop: true, ..token("the") }, ExclusionReason::StopWord),
            (Token { is_punctuation: true, ..token("!!") }, ExclusionReason::Punctuation),
            (Token { is_quote: true, ..token("``") }, ExclusionReason::Quote),
            (Token { is_space: true, ..token("\n\n") }, ExclusionReason::Space),
            (Token { is_numeric_like: true, ..token("twenty") }, ExclusionReason::NumericLike),
            (Token { is_url_like: true, ..token("example.com") }, ExclusionReason::UrlLike),
            (token("pic.twitter.com/abc"), ExclusionReason::PicTwitterLink),
            (Token { entity_type: Some(EntityLabel::Money), ..token("bucks") }, ExclusionReason::EntityType),
            (token("'s"), ExclusionReason::PossessiveClitic),
            (token("x"), ExclusionReason::TooShort),
        ];
        for (token, expected) in cases {
            assert_eq!(exclusion_reason(&token), Some(expected), "{}", token.text);
        }
    }

    #[test]
    fn test_short_circuit_order() {
        let t = Token { is_stop: true, is_punctuation: true, ..token(":)") };
        assert_eq!(exclusion_reason(&t), Some(ExclusionReason::Emoticon));
    }

    #[test]
    fn test_non_excluded_entities_survive() {
        for label in [EntityLabel::Gpe, EntityLabel::Cardinal, EntityLabel::Person] {
            let t = Token { entity_type: Some(label), ..token("york") };
            assert_eq!(exclusion_reason(&t), None);
        }
    }

    #[test]
    fn test_tidy_form_collapses_whitespace() {
        assert_eq!(tidy_form("new york"), "new_york");
        assert_eq!(tidy_form(" new \t york "), "new_york");
        assert_eq!(tidy_form("great"), "great");
    }

    #[test]
    fn test_filter_keeps_order() {
        let doc = Document {
            text: String::new(),
            tokens: vec![
                token("zeta"),
                Token { is_stop: true, ..token("the") },
                token("alpha"),
                Token { norm: "new york".into(), ..token("New York") },
            ],
            entities: vec![],
        };
        assert_eq!(filter_tokens(&doc), ["zeta", "alpha", "new_york"]);
    }
}
