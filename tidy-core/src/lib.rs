//! # tidy-core — Pipeline de Normalização e Filtragem de Tweets
//!
//! Este crate transforma texto bruto e ruidoso de redes sociais em uma
//! sequência limpa de tokens unidos por espaço (o "tidy text"), pronta para
//! agregação de corpus. O processamento é determinístico: a mesma entrada com a
//! mesma configuração sempre produz a mesma saída.
//!
//! ## Arquitetura do Sistema
//!
//! O dado flui por um pipeline linear:
//!
//! 1.  **Entrada**: texto bruto (String).
//! 2.  **Normalização** ([`normalizer`]): conserto de mojibake, remoção de acentos e de markup.
//! 3.  **Anotação** ([`annotation`], [`engine`]): tokenização customizada ([`tokenizer`]),
//!     atributos léxicos ([`lexicon`]) e entidades nomeadas.
//! 4.  **Fusão de Entidades** ([`merge`]): spans viram um único token, exceto rótulos ignorados.
//! 5.  **Filtros** ([`filter`]): 12 predicados descartam ruído (emoji, stop words, URLs...).
//! 6.  **Resíduos de Data** ([`date_residue`]): descarta sobreviventes que parecem datas.
//! 7.  **Saída**: tokens restantes unidos por espaço.
//!
//! ## Exemplo de Uso
//!
//! ```rust
//! use tidy_core::{PipelineConfig, TweetPreprocessor};
//!
//! // 1. Constrói o pipeline (valida configuração, carrega modelo e stoplist)
//! let preprocessor = TweetPreprocessor::new(PipelineConfig::default()).unwrap();
//!
//! // 2. Processa um tweet
//! let tidy = preprocessor.preprocess_tweet("Loving the #humanities :) http://t.co/xyz");
//!
//! assert!(tidy.contains("#humanities"));
//! assert!(!tidy.contains("http"));
//! ```
//!
//! ## Módulos Principais
//!
//! - [`pipeline`]: orquestrador que conecta todos os estágios e emite eventos.
//! - [`record`]: leitura e escrita de registros NDJSON.
//! - [`config`]: opções do pipeline (TOML ou código).
//! - [`error`]: taxonomia de erros.
//! - [`samples`]: tweets de demonstração.

pub mod annotation;
pub mod config;
pub mod date_residue;
pub mod engine;
pub mod error;
pub mod filter;
pub mod lexicon;
pub mod merge;
pub mod normalizer;
pub mod pipeline;
pub mod record;
pub mod samples;
pub mod tokenizer;

pub use annotation::{AnnotationEngine, Document, EngineRegistry, EntityLabel, EntitySpan, Token};
pub use config::PipelineConfig;
pub use date_residue::{fuzzy_parse, DateFields, DateParse};
pub use error::{ConfigurationError, Error, MalformedRecordError, Result};
pub use filter::ExclusionReason;
pub use lexicon::Vocabulary;
pub use normalizer::AccentMethod;
pub use pipeline::{Analysis, EntityMention, PipelineEvent, TweetPreprocessor};
pub use record::{BatchReport, ErrorPolicy};
pub use tokenizer::{LemmaException, TokenizerConfig};
