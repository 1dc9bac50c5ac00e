//! # Contrato do Motor de Anotação
//!
//! O motor de anotação (tokenização + classes gramaticais + entidades + lemas)
//! é uma capacidade externa ao núcleo. Este módulo define apenas o contrato:
//!
//! - [`Document`]: tokens anotados + spans de entidade, derivados de um texto.
//! - [`AnnotationEngine`]: `annotate(texto, tokenizador, vocabulário) -> Document`.
//! - [`EngineRegistry`]: identificador de modelo → fábrica de motores.
//!
//! O pipeline depende somente dos atributos dos tokens e dos spans, nunca dos
//! detalhes internos de um modelo.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::PipelineConfig;
use crate::error::ConfigurationError;
use crate::lexicon::Vocabulary;
use crate::tokenizer::TokenizerConfig;

/// Rótulos de entidade (esquema OntoNotes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityLabel {
    Person,
    Norp,
    Fac,
    Org,
    Gpe,
    Loc,
    Product,
    Event,
    WorkOfArt,
    Law,
    Language,
    Date,
    Time,
    Percent,
    Money,
    Quantity,
    Ordinal,
    Cardinal,
}

impl EntityLabel {
    pub const ALL: [EntityLabel; 18] = [
        EntityLabel::Person,
        EntityLabel::Norp,
        EntityLabel::Fac,
        EntityLabel::Org,
        EntityLabel::Gpe,
        EntityLabel::Loc,
        EntityLabel::Product,
        EntityLabel::Event,
        EntityLabel::WorkOfArt,
        EntityLabel::Law,
        EntityLabel::Language,
        EntityLabel::Date,
        EntityLabel::Time,
        EntityLabel::Percent,
        EntityLabel::Money,
        EntityLabel::Quantity,
        EntityLabel::Ordinal,
        EntityLabel::Cardinal,
    ];

    /// Nome do rótulo como string (para serialização e UI)
    pub fn name(&self) -> &'static str {
        match self {
            EntityLabel::Person => "PERSON",
            EntityLabel::Norp => "NORP",
            EntityLabel::Fac => "FAC",
            EntityLabel::Org => "ORG",
            EntityLabel::Gpe => "GPE",
            EntityLabel::Loc => "LOC",
            EntityLabel::Product => "PRODUCT",
            EntityLabel::Event => "EVENT",
            EntityLabel::WorkOfArt => "WORK_OF_ART",
            EntityLabel::Law => "LAW",
            EntityLabel::Language => "LANGUAGE",
            EntityLabel::Date => "DATE",
            EntityLabel::Time => "TIME",
            EntityLabel::Percent => "PERCENT",
            EntityLabel::Money => "MONEY",
            EntityLabel::Quantity => "QUANTITY",
            EntityLabel::Ordinal => "ORDINAL",
            EntityLabel::Cardinal => "CARDINAL",
        }
    }

    /// Cor CSS para highlight na UI
    pub fn color(&self) -> &'static str {
        match self {
            EntityLabel::Person => "#3b82f6",
            EntityLabel::Org | EntityLabel::Fac => "#10b981",
            EntityLabel::Gpe | EntityLabel::Loc => "#f59e0b",
            EntityLabel::Date | EntityLabel::Time => "#ef4444",
            EntityLabel::Money | EntityLabel::Percent => "#eab308",
            EntityLabel::Quantity | EntityLabel::Ordinal | EntityLabel::Cardinal => "#64748b",
            _ => "#8b5cf6",
        }
    }
}

impl FromStr for EntityLabel {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_uppercase();
        EntityLabel::ALL
            .into_iter()
            .find(|label| label.name() == upper)
            .ok_or_else(|| ConfigurationError::InvalidLabel(s.to_string()))
    }
}

impl fmt::Display for EntityLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Um token anotado.
///
/// Produzido uma vez por documento e imutável depois da anotação.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    /// Texto de superfície (ex: "Amazing", "'s", "😊").
    pub text: String,
    /// Forma normalizada (minúsculas, aspas canônicas).
    pub norm: String,
    pub lemma: String,
    /// Classe gramatical universal (NOUN, VERB, PUNCT...).
    pub pos: String,
    /// Tag fina do Penn Treebank (NN, NNS, VBD...).
    pub tag: String,
    /// Rótulo de dependência sintática.
    pub dep: String,
    /// Índice de byte inicial no texto (inclusive).
    pub start: usize,
    /// Índice de byte final no texto (exclusivo).
    pub end: usize,
    pub index: usize,
    pub is_stop: bool,
    pub is_punctuation: bool,
    pub is_quote: bool,
    pub is_space: bool,
    pub is_numeric_like: bool,
    pub is_url_like: bool,
    pub is_emoji: bool,
    pub entity_type: Option<EntityLabel>,
}

/// Span de entidade: intervalo semiaberto `[start, end)` sobre os tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySpan {
    pub start: usize,
    pub end: usize,
    pub label: EntityLabel,
    /// Índice do token raiz sintático do span.
    pub root: usize,
}

impl EntitySpan {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    pub fn contains(&self, token_index: usize) -> bool {
        (self.start..self.end).contains(&token_index)
    }
}

/// Documento anotado: texto, tokens em ordem e spans de entidade em ordem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub text: String,
    pub tokens: Vec<Token>,
    pub entities: Vec<EntitySpan>,
}

impl Document {
    /// Texto coberto por um span de entidade.
    pub fn span_text(&self, span: &EntitySpan) -> &str {
        if span.is_empty() || span.end > self.tokens.len() {
            return "";
        }
        let (start, end) = (self.tokens[span.start].start, self.tokens[span.end - 1].end);
        self.text.get(start..end).unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Capacidade externa de anotação linguística.
///
/// Implementações devem tokenizar `text` com `tokenizer` (regras de fronteira
/// e exceções de lema) e marcar `is_stop` conforme `vocab`.
pub trait AnnotationEngine: Send + Sync {
    /// Identificador do modelo carregado.
    fn name(&self) -> &str;

    fn annotate(&self, text: &str, tokenizer: &TokenizerConfig, vocab: &Vocabulary) -> Document;
}

/// Fábrica de motores a partir da configuração do pipeline.
pub type EngineFactory =
    Box<dyn Fn(&PipelineConfig) -> Box<dyn AnnotationEngine> + Send + Sync>;

/// Registro de modelos conhecidos: identificador → fábrica.
pub struct EngineRegistry {
    factories: BTreeMap<String, EngineFactory>,
}

impl EngineRegistry {
    pub fn new() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    /// Registro com os perfis ingleses, todos servidos pelo motor de regras embutido.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for id in ["en_core_web_sm", "en_core_web_md", "en_core_web_lg", "en_rules"] {
            let model = id.to_string();
            registry.register(
                id,
                Box::new(move |config: &PipelineConfig| {
                    Box::new(crate::engine::RuleEngine::from_config(&model, config))
                        as Box<dyn AnnotationEngine>
                }),
            );
        }
        registry
    }

    pub fn register(&mut self, id: &str, factory: EngineFactory) {
        self.factories.insert(id.to_string(), factory);
    }

    pub fn models(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    /// Cria o motor para `id`; identificador desconhecido é erro de configuração.
    pub fn create(
        &self,
        id: &str,
        config: &PipelineConfig,
    ) -> Result<Box<dyn AnnotationEngine>, ConfigurationError> {
        let factory = self
            .factories
            .get(id)
            .ok_or_else(|| ConfigurationError::UnknownModel(id.to_string()))?;
        Ok(factory(config))
    }
}

impl Default for EngineRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_round_trip_names() {
        for label in EntityLabel::ALL {
            assert_eq!(label.name().parse::<EntityLabel>().unwrap(), label);
        }
        assert_eq!("work_of_art".parse::<EntityLabel>().unwrap(), EntityLabel::WorkOfArt);
        assert!(matches!(
            "SPORT".parse::<EntityLabel>(),
            Err(ConfigurationError::InvalidLabel(_))
        ));
    }

    #[test]
    fn test_label_serde_matches_name() {
        let json = serde_json::to_string(&EntityLabel::WorkOfArt).unwrap();
        assert_eq!(json, "\"WORK_OF_ART\"");
    }

    #[test]
    fn test_span_text_tolerates_offsets_off_char_boundary() {
        let engine = crate::engine::RuleEngine::new("en_rules");
        let mut doc = engine.annotate(
            "café rocks",
            &crate::tokenizer::TokenizerConfig::default(),
            &crate::lexicon::Vocabulary::english(),
        );
        let span = EntitySpan { start: 0, end: 1, label: EntityLabel::Org, root: 0 };
        assert_eq!(doc.span_text(&span), "café");
        // 'é' ocupa os bytes 3..5
        doc.tokens[0].end = 4;
        assert_eq!(doc.span_text(&span), "");
    }

    #[test]
    fn test_registry_unknown_model() {
        let registry = EngineRegistry::with_defaults();
        let err = registry
            .create("xx_unknown", &PipelineConfig::default())
            .err()
            .unwrap();
        assert!(matches!(err, ConfigurationError::UnknownModel(m) if m == "xx_unknown"));
        assert!(registry.models().any(|m| m == "en_core_web_sm"));
    }

    #[test]
    fn test_registry_creates_named_engine() {
        let registry = EngineRegistry::with_defaults();
        let engine = registry
            .create("en_core_web_md", &PipelineConfig::default())
            .unwrap();
        assert_eq!(engine.name(), "en_core_web_md");
    }
}
