//! # Taxonomia de Erros
//!
//! | Erro                   | Quando                         | Tratamento                       |
//! |------------------------|--------------------------------|----------------------------------|
//! | [`ConfigurationError`] | construção do pipeline         | fatal, falha cedo                |
//! | [`MalformedRecordError`] | leitura de um registro NDJSON | propagado; o chamador decide     |
//! | [`Error`]              | processamento em lote          | agrega os dois acima + I/O       |
//!
//! Falhas de markup e do parser de datas são recuperadas localmente e nunca
//! aparecem aqui.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Erro de configuração, sempre detectado na construção do pipeline.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("método de remoção de acentos inválido: {0:?} (use \"unicode\" ou \"ascii\")")]
    InvalidAccentMethod(String),

    #[error("não foi possível ler a stoplist {path}: {source}")]
    UnreadableStoplist {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("modelo desconhecido: {0:?}")]
    UnknownModel(String),

    #[error("rótulo de entidade desconhecido: {0:?}")]
    InvalidLabel(String),

    #[error("não foi possível ler o arquivo de configuração {path}: {source}")]
    UnreadableConfigFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("arquivo de configuração inválido: {0}")]
    InvalidConfigFile(#[from] toml::de::Error),
}

/// Registro NDJSON que não pode ser processado.
///
/// `line` é 1-based, contando linhas físicas do arquivo de entrada.
#[derive(Debug, Error)]
pub enum MalformedRecordError {
    #[error("linha {line}: JSON inválido: {source}")]
    InvalidJson {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("linha {line}: bytes fora de UTF-8")]
    InvalidUtf8 { line: usize },

    #[error("linha {line}: o registro não é um objeto JSON")]
    NotAnObject { line: usize },

    #[error("linha {line}: campo obrigatório ausente ou não textual: {field}")]
    MissingField { line: usize, field: &'static str },
}

impl MalformedRecordError {
    pub fn line(&self) -> usize {
        match self {
            MalformedRecordError::InvalidJson { line, .. }
            | MalformedRecordError::InvalidUtf8 { line }
            | MalformedRecordError::NotAnObject { line }
            | MalformedRecordError::MissingField { line, .. } => *line,
        }
    }
}

/// Erro de alto nível para operações em lote.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    MalformedRecord(#[from] MalformedRecordError),

    #[error("erro de I/O: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
