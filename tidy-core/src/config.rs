//! # Configuração do Pipeline
//!
//! Todas as opções aceitas na construção do [`TweetPreprocessor`](crate::pipeline::TweetPreprocessor).
//! Pode ser montada em código (setters encadeados) ou lida de TOML:
//!
//! ```toml
//! stoplist = "twitter_stoplist.txt"
//! model = "en_core_web_sm"
//! accent_method = "unicode"
//! skip_labels = ["CARDINAL", "DATE", "QUANTITY", "TIME"]
//!
//! [[lemma_exceptions]]
//! orth = "data"
//! lemma = "data"
//! pos = "NOUN"
//! tag = "NNS"
//!
//! [[gazetteer]]
//! text = "WhatEvery1Says"
//! label = "ORG"
//! ```
//!
//! Os valores são validados na construção do pipeline, nunca no meio do
//! processamento.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::annotation::EntityLabel;
use crate::error::ConfigurationError;
use crate::normalizer::AccentMethod;
use crate::tokenizer::LemmaException;

pub const DEFAULT_MODEL: &str = "en_core_web_sm";

/// Rótulos que não são fundidos por padrão.
pub const DEFAULT_SKIP_LABELS: [&str; 4] = ["CARDINAL", "DATE", "QUANTITY", "TIME"];

/// Entrada extra do gazetteer do motor de regras.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GazetteerEntry {
    pub text: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub stoplist: Option<PathBuf>,
    pub model: String,
    pub accent_method: String,
    pub skip_labels: Vec<String>,
    pub lemma_exceptions: Vec<LemmaException>,
    pub gazetteer: Vec<GazetteerEntry>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            stoplist: None,
            model: DEFAULT_MODEL.to_string(),
            accent_method: AccentMethod::default().name().to_string(),
            skip_labels: DEFAULT_SKIP_LABELS.iter().map(|s| s.to_string()).collect(),
            lemma_exceptions: Vec::new(),
            gazetteer: Vec::new(),
        }
    }
}

impl PipelineConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigurationError> {
        Ok(toml::from_str(s)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigurationError> {
        let content =
            fs::read_to_string(path).map_err(|source| ConfigurationError::UnreadableConfigFile {
                path: path.to_path_buf(),
                source,
            })?;
        Self::from_toml_str(&content)
    }

    pub fn with_stoplist(mut self, path: impl Into<PathBuf>) -> Self {
        self.stoplist = Some(path.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_accent_method(mut self, method: impl Into<String>) -> Self {
        self.accent_method = method.into();
        self
    }

    pub fn with_skip_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skip_labels = labels.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_lemma_exception(mut self, exception: LemmaException) -> Self {
        self.lemma_exceptions.push(exception);
        self
    }

    pub fn with_gazetteer_entry(mut self, text: &str, label: &str) -> Self {
        self.gazetteer.push(GazetteerEntry {
            text: text.to_string(),
            label: label.to_string(),
        });
        self
    }

    pub fn accent(&self) -> Result<AccentMethod, ConfigurationError> {
        self.accent_method.parse()
    }

    pub fn skip_label_set(&self) -> Result<BTreeSet<EntityLabel>, ConfigurationError> {
        self.skip_labels.iter().map(|s| s.parse()).collect()
    }

    /// Entradas do gazetteer com rótulos validados.
    pub fn gazetteer_entries(&self) -> Result<Vec<(String, EntityLabel)>, ConfigurationError> {
        self.gazetteer
            .iter()
            .map(|entry| Ok((entry.text.clone(), entry.label.parse()?)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.model, "en_core_web_sm");
        assert_eq!(config.accent().unwrap(), AccentMethod::Unicode);
        let skip = config.skip_label_set().unwrap();
        assert_eq!(skip.len(), 4);
        assert!(skip.contains(&EntityLabel::Cardinal));
        assert!(skip.contains(&EntityLabel::Date));
        assert!(skip.contains(&EntityLabel::Quantity));
        assert!(skip.contains(&EntityLabel::Time));
    }

    #[test]
    fn test_from_toml() {
        let config = PipelineConfig::from_toml_str(
            r#"
            stoplist = "stop.txt"
            accent_method = "ascii"
            skip_labels = ["DATE"]

            [[lemma_exceptions]]
            orth = "data"
            lemma = "data"
            pos = "NOUN"
            tag = "NNS"

            [[gazetteer]]
            text = "WhatEvery1Says"
            label = "ORG"
            "#,
        )
        .unwrap();
        assert_eq!(config.stoplist, Some(PathBuf::from("stop.txt")));
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.accent().unwrap(), AccentMethod::Ascii);
        assert_eq!(config.skip_label_set().unwrap().len(), 1);
        assert_eq!(config.lemma_exceptions[0].orth, "data");
        assert_eq!(config.gazetteer_entries().unwrap()[0].1, EntityLabel::Org);
    }

    #[test]
    fn test_invalid_values_surface_as_configuration_errors() {
        let config = PipelineConfig::default()
            .with_accent_method("latin1")
            .with_skip_labels(["DATE", "NOPE"]);
        assert!(matches!(config.accent(), Err(ConfigurationError::InvalidAccentMethod(_))));
        assert!(matches!(config.skip_label_set(), Err(ConfigurationError::InvalidLabel(_))));
    }

    #[test]
    fn test_invalid_toml() {
        let err = PipelineConfig::from_toml_str("model = [").unwrap_err();
        assert!(matches!(err, ConfigurationError::InvalidConfigFile(_)));
    }

    #[test]
    fn test_missing_config_file() {
        let err = PipelineConfig::from_file(Path::new("/nao/existe.toml")).unwrap_err();
        assert!(matches!(err, ConfigurationError::UnreadableConfigFile { .. }));
    }
}
