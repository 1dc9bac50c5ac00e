//! # Política de Fusão de Entidades
//!
//! Cada span de entidade vira um único token, exceto quando o rótulo está no
//! conjunto de rótulos ignorados (padrão: CARDINAL, DATE, QUANTITY, TIME).
//! Spans ignorados continuam divididos, para que o filtro descarte cada
//! sub-token pelo tipo de entidade.
//!
//! O token fundido:
//! - tem como texto o trecho coberto pelo span;
//! - recalcula os atributos léxicos (norma, stop word, URL...) para esse texto;
//! - copia tag, dependência e classe gramatical do token raiz do span.
//!
//! É uma função pura: recebe um [`Document`] e devolve outro, com tokens e
//! spans reindexados.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::annotation::{Document, EntityLabel, EntitySpan, Token};
use crate::lexicon::Vocabulary;

/// O que aconteceu com um span de entidade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeDecision {
    pub label: EntityLabel,
    pub text: String,
    pub merged: bool,
}

/// Funde spans de entidade em tokens únicos, exceto os rótulos em `skip`.
pub fn merge_entities(
    document: &Document,
    skip: &BTreeSet<EntityLabel>,
    vocab: &Vocabulary,
) -> Document {
    merge_entities_traced(document, skip, vocab).0
}

/// Como [`merge_entities`], devolvendo também a decisão tomada para cada span.
pub fn merge_entities_traced(
    document: &Document,
    skip: &BTreeSet<EntityLabel>,
    vocab: &Vocabulary,
) -> (Document, Vec<MergeDecision>) {
    let mut tokens: Vec<Token> = Vec::with_capacity(document.tokens.len());
    let mut entities: Vec<EntitySpan> = Vec::with_capacity(document.entities.len());
    let mut decisions = Vec::with_capacity(document.entities.len());
    let mut cursor = 0;

    for span in &document.entities {
        // Spans fora de ordem, sobrepostos ou fora dos limites são descartados.
        if span.is_empty() || span.start < cursor || span.end > document.tokens.len() {
            continue;
        }
        tokens.extend(document.tokens[cursor..span.start].iter().cloned());

        let text = document.span_text(span).to_string();
        let merged = !skip.contains(&span.label);
        if merged {
            let index = tokens.len();
            tokens.push(merged_token(document, span, &text, vocab));
            entities.push(EntitySpan {
                start: index,
                end: index + 1,
                label: span.label,
                root: index,
            });
        } else {
            let offset = tokens.len() as isize - span.start as isize;
            let shift = |i: usize| (i as isize + offset) as usize;
            tokens.extend(document.tokens[span.start..span.end].iter().cloned());
            entities.push(EntitySpan {
                start: shift(span.start),
                end: shift(span.end),
                label: span.label,
                root: shift(span.root.clamp(span.start, span.end - 1)),
            });
        }
        decisions.push(MergeDecision {
            label: span.label,
            text,
            merged,
        });
        cursor = span.end;
    }
    tokens.extend(document.tokens[cursor..].iter().cloned());

    for (i, token) in tokens.iter_mut().enumerate() {
        token.index = i;
    }

    (
        Document {
            text: document.text.clone(),
            tokens,
            entities,
        },
        decisions,
    )
}

fn merged_token(document: &Document, span: &EntitySpan, text: &str, vocab: &Vocabulary) -> Token {
    let root_index = span.root.clamp(span.start, span.end - 1);
    let root = &document.tokens[root_index];
    let lexeme = vocab.lexeme(text);
    Token {
        text: text.to_string(),
        norm: lexeme.norm,
        lemma: text.to_string(),
        pos: root.pos.clone(),
        tag: root.tag.clone(),
        dep: root.dep.clone(),
        start: document.tokens[span.start].start,
        end: document.tokens[span.end - 1].end,
        index: 0,
        is_stop: lexeme.is_stop,
        is_punctuation: lexeme.is_punctuation,
        is_quote: lexeme.is_quote,
        is_space: lexeme.is_space,
        is_numeric_like: lexeme.is_numeric_like,
        is_url_like: lexeme.is_url_like,
        is_emoji: lexeme.is_emoji,
        entity_type: Some(span.label),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::AnnotationEngine;
    use crate::config::DEFAULT_SKIP_LABELS;
    use crate::engine::RuleEngine;
    use crate::tokenizer::TokenizerConfig;

    fn default_skip() -> BTreeSet<EntityLabel> {
        DEFAULT_SKIP_LABELS.iter().map(|s| s.parse().unwrap()).collect()
    }

    fn annotate(text: &str) -> Document {
        RuleEngine::new("en_rules").annotate(text, &TokenizerConfig::default(), &Vocabulary::english())
    }

    #[test]
    fn test_merges_non_skipped_span() {
        let doc = annotate("I love New York so much");
        let (merged, decisions) = merge_entities_traced(&doc, &default_skip(), &Vocabulary::english());

        assert_eq!(merged.tokens.len(), doc.tokens.len() - 1);
        let token = &merged.tokens[2];
        assert_eq!(token.text, "New York");
        assert_eq!(token.norm, "new york");
        assert_eq!(token.entity_type, Some(EntityLabel::Gpe));
        let root = doc.tokens.iter().find(|t| t.text == "York").unwrap();
        assert_eq!(token.tag, root.tag);
        assert_eq!(token.dep, root.dep);
        assert_eq!(merged.entities[0], EntitySpan { start: 2, end: 3, label: EntityLabel::Gpe, root: 2 });
        assert_eq!(decisions, vec![MergeDecision { label: EntityLabel::Gpe, text: "New York".into(), merged: true }]);
    }

    #[test]
    fn test_skipped_span_stays_split() {
        let doc = annotate("I love New York since 2020-01-01");
        let merged = merge_entities(&doc, &default_skip(), &Vocabulary::english());

        let date = merged.entities.iter().find(|e| e.label == EntityLabel::Date).unwrap();
        assert_eq!(date.len(), 5);
        assert_eq!(merged.span_text(date), "2020-01-01");
        assert!(merged.tokens[date.start..date.end]
            .iter()
            .all(|t| t.entity_type == Some(EntityLabel::Date)));
    }

    #[test]
    fn test_empty_skip_set_merges_everything() {
        let doc = annotate("on 2020-01-01");
        let merged = merge_entities(&doc, &BTreeSet::new(), &Vocabulary::english());
        assert_eq!(merged.tokens.len(), 2);
        assert_eq!(merged.tokens[1].text, "2020-01-01");
        assert_eq!(merged.tokens[1].entity_type, Some(EntityLabel::Date));
    }

    #[test]
    fn test_input_document_untouched_and_order_kept() {
        let doc = annotate("New York and London");
        let before = doc.clone();
        let merged = merge_entities(&doc, &default_skip(), &Vocabulary::english());
        assert_eq!(doc, before);
        let texts: Vec<&str> = merged.tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, ["New York", "and", "London"]);
        assert!(merged.tokens.iter().enumerate().all(|(i, t)| t.index == i));
        assert!(merged.tokens.windows(2).all(|w| w[0].end <= w[1].start));
    }
}
