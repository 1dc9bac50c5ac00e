//! # Pipeline de Pré-processamento — Orquestrador com Eventos Observáveis
//!
//! Coordena os estágios na ordem fixa:
//!
//! 1. normalização do texto bruto ([`normalize`]);
//! 2. anotação (tokenização customizada + entidades) pelo [`AnnotationEngine`];
//! 3. fusão de entidades ([`merge_entities`]);
//! 4. filtros de tokens ([`filter_tokens`]);
//! 5. supressão de resíduos de data ([`suppress`]);
//! 6. junção com espaço simples → "tidy text".
//!
//! Assim como o restante do crate, o pipeline pode emitir um evento por passo
//! via canal (`mpsc`), permitindo que o servidor WebSocket transmita o
//! progresso em tempo real.

use std::collections::BTreeSet;
use std::io::{BufRead, Write};
use std::sync::mpsc;
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::annotation::{AnnotationEngine, Document, EngineRegistry, EntityLabel, Token};
use crate::config::PipelineConfig;
use crate::date_residue::{fuzzy_parse, join_tidy, suppress, DateFields, DateParse};
use crate::error::{ConfigurationError, Result};
use crate::filter::{exclusion_reason, filter_tokens, tidy_form, ExclusionReason};
use crate::lexicon::Vocabulary;
use crate::merge::{merge_entities, merge_entities_traced};
use crate::normalizer::{normalize, AccentMethod};
use crate::record::{format_elapsed, BatchReport, ErrorPolicy, RecordReader};
use crate::tokenizer::TokenizerConfig;

/// Entidade reconhecida, com o texto coberto.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityMention {
    pub text: String,
    pub label: EntityLabel,
    /// Intervalo semiaberto de tokens.
    pub start_token: usize,
    pub end_token: usize,
}

fn mentions(document: &Document) -> Vec<EntityMention> {
    document
        .entities
        .iter()
        .map(|span| EntityMention {
            text: document.span_text(span).to_string(),
            label: span.label,
            start_token: span.start,
            end_token: span.end,
        })
        .collect()
}

/// Resultado completo da análise de um texto.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    /// Texto após o normalizador.
    pub normalized: String,
    /// Tokens após a fusão de entidades.
    pub tokens: Vec<Token>,
    /// Entidades reconhecidas antes da fusão.
    pub entities: Vec<EntityMention>,
    /// Tokens que sobreviveram a todos os filtros, em ordem.
    pub kept: Vec<String>,
    pub tidy_text: String,
    pub processing_ms: u64,
}

/// Eventos emitidos durante o processamento de um texto.
///
/// Cada variante carrega o necessário para a UI renderizar uma etapa.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum PipelineEvent {
    /// **Passo 1**: texto normalizado.
    Normalized { text: String },
    /// **Passo 2**: tokens produzidos pelo motor de anotação.
    TokenizationDone { tokens: Vec<Token>, total: usize },
    /// **Passo 2b**: entidades reconhecidas.
    EntitiesRecognized { entities: Vec<EntityMention> },
    /// **Passo 3**: span fundido em um único token.
    EntityMerged { text: String, label: EntityLabel },
    /// **Passo 3**: span mantido dividido (rótulo ignorado).
    EntitySkipped { text: String, label: EntityLabel },
    /// **Passo 4**: token descartado por um predicado.
    TokenExcluded {
        token_index: usize,
        token_text: String,
        reason: ExclusionReason,
    },
    /// **Passo 4**: token sobrevivente e sua forma de saída.
    TokenKept {
        token_index: usize,
        token_text: String,
        tidy_form: String,
    },
    /// **Passo 5**: sobrevivente que parecia data/hora.
    DateResidueDropped { token: String, fields: DateFields },
    /// **Conclusão**.
    Done { analysis: Analysis },
    /// **Falha**: erro irrecuperável (usado pela camada web).
    Error { message: String },
}

fn emit(tx: Option<&mpsc::Sender<PipelineEvent>>, event: impl FnOnce() -> PipelineEvent) {
    if let Some(tx) = tx {
        let _ = tx.send(event());
    }
}

/// O pré-processador de tweets.
///
/// Imutável depois de construído; pode ser compartilhado entre threads.
///
/// # Modos de Uso
/// - **Direto**: [`preprocess_tweet`](Self::preprocess_tweet) devolve só o tidy text.
/// - **Análise**: [`analyze`](Self::analyze) devolve todos os artefatos.
/// - **Streaming**: [`analyze_streaming`](Self::analyze_streaming) emite eventos (WebSocket).
/// - **Lote**: [`preprocess_batch`](Self::preprocess_batch) e
///   [`preprocess_records`](Self::preprocess_records).
pub struct TweetPreprocessor {
    config: PipelineConfig,
    accent: AccentMethod,
    skip: BTreeSet<EntityLabel>,
    vocab: Vocabulary,
    tokenizer: TokenizerConfig,
    engine: Box<dyn AnnotationEngine>,
}

impl TweetPreprocessor {
    /// Valida a configuração, carrega a stoplist e o modelo.
    ///
    /// Qualquer valor inválido falha aqui, nunca durante o processamento.
    pub fn new(config: PipelineConfig) -> std::result::Result<Self, ConfigurationError> {
        config.gazetteer_entries()?;
        let engine = EngineRegistry::with_defaults().create(&config.model, &config)?;
        Self::with_engine(config, engine)
    }

    /// Como [`new`](Self::new), mas com um motor de anotação já construído.
    pub fn with_engine(
        config: PipelineConfig,
        engine: Box<dyn AnnotationEngine>,
    ) -> std::result::Result<Self, ConfigurationError> {
        let start = Instant::now();
        let accent = config.accent()?;
        let skip = config.skip_label_set()?;
        let vocab = match &config.stoplist {
            Some(path) => Vocabulary::english().with_stoplist(path)?,
            None => Vocabulary::english(),
        };
        let tokenizer = TokenizerConfig::new(config.lemma_exceptions.iter().cloned());

        info!(
            model = engine.name(),
            accent = %accent,
            stop_words = vocab.len(),
            skip_labels = skip.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "pré-processador pronto"
        );
        Ok(Self {
            config,
            accent,
            skip,
            vocab,
            tokenizer,
            engine,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocab
    }

    pub fn model(&self) -> &str {
        self.engine.name()
    }

    /// Texto bruto → tidy text.
    pub fn preprocess_tweet(&self, text: &str) -> String {
        let normalized = normalize(text, self.accent);
        let document = self.engine.annotate(&normalized, &self.tokenizer, &self.vocab);
        let merged = merge_entities(&document, &self.skip, &self.vocab);
        let kept = filter_tokens(&merged);
        join_tidy(&suppress(&kept))
    }

    /// Processa o texto de forma síncrona e devolve todos os artefatos.
    pub fn analyze(&self, text: &str) -> Analysis {
        self.run(text, None)
    }

    /// Executa o pipeline enviando eventos de progresso em tempo real.
    ///
    /// # Fluxo de Eventos
    /// 1. `Normalized`
    /// 2. `TokenizationDone`, `EntitiesRecognized`
    /// 3. `EntityMerged` / `EntitySkipped` (um por span)
    /// 4. `TokenExcluded` / `TokenKept` (um por token)
    /// 5. `DateResidueDropped` (um por token descartado)
    /// 6. `Done`
    pub fn analyze_streaming(&self, text: &str, tx: mpsc::Sender<PipelineEvent>) {
        self.run(text, Some(&tx));
    }

    fn run(&self, text: &str, tx: Option<&mpsc::Sender<PipelineEvent>>) -> Analysis {
        let start = Instant::now();

        // === Passo 1: Normalização ===
        let normalized = normalize(text, self.accent);
        emit(tx, || PipelineEvent::Normalized {
            text: normalized.clone(),
        });

        // === Passo 2: Anotação ===
        let document = self.engine.annotate(&normalized, &self.tokenizer, &self.vocab);
        let entities = mentions(&document);
        debug!(
            tokens = document.len(),
            entities = entities.len(),
            "documento anotado"
        );
        emit(tx, || PipelineEvent::TokenizationDone {
            tokens: document.tokens.clone(),
            total: document.len(),
        });
        emit(tx, || PipelineEvent::EntitiesRecognized {
            entities: entities.clone(),
        });

        // === Passo 3: Fusão de entidades ===
        let (merged, decisions) = merge_entities_traced(&document, &self.skip, &self.vocab);
        for decision in decisions {
            emit(tx, || {
                if decision.merged {
                    PipelineEvent::EntityMerged {
                        text: decision.text,
                        label: decision.label,
                    }
                } else {
                    PipelineEvent::EntitySkipped {
                        text: decision.text,
                        label: decision.label,
                    }
                }
            });
        }

        // === Passo 4: Filtros ===
        let mut survivors = Vec::new();
        for token in &merged.tokens {
            match exclusion_reason(token) {
                Some(reason) => emit(tx, || PipelineEvent::TokenExcluded {
                    token_index: token.index,
                    token_text: token.text.clone(),
                    reason,
                }),
                None => {
                    let form = tidy_form(&token.norm);
                    emit(tx, || PipelineEvent::TokenKept {
                        token_index: token.index,
                        token_text: token.text.clone(),
                        tidy_form: form.clone(),
                    });
                    survivors.push(form);
                }
            }
        }

        // === Passo 5: Resíduos de data ===
        let mut kept = Vec::with_capacity(survivors.len());
        for token in survivors {
            match fuzzy_parse(&token) {
                DateParse::Parsed(fields) => {
                    debug!(token = %token, "resíduo de data descartado");
                    emit(tx, || PipelineEvent::DateResidueDropped { token, fields });
                }
                DateParse::NotParsed(_) => kept.push(token),
            }
        }

        let analysis = Analysis {
            normalized,
            tokens: merged.tokens,
            entities,
            tidy_text: join_tidy(&kept),
            kept,
            processing_ms: start.elapsed().as_millis() as u64,
        };
        emit(tx, || PipelineEvent::Done {
            analysis: analysis.clone(),
        });
        analysis
    }

    /// Processa textos independentes em paralelo, preservando a ordem.
    pub fn preprocess_batch<S: AsRef<str> + Sync>(&self, texts: &[S]) -> Vec<String> {
        texts
            .par_iter()
            .map(|text| self.preprocess_tweet(text.as_ref()))
            .collect()
    }

    /// Lê registros NDJSON, escreve cada um com `tidy_tweet` e `name`.
    ///
    /// Com [`ErrorPolicy::Halt`], o primeiro registro malformado interrompe o
    /// lote (o que já foi escrito permanece). Com
    /// [`ErrorPolicy::SkipAndContinue`], ele é registrado e contado.
    pub fn preprocess_records<R: BufRead, W: Write>(
        &self,
        reader: R,
        mut writer: W,
        policy: ErrorPolicy,
    ) -> Result<BatchReport> {
        let start = Instant::now();
        let mut report = BatchReport::default();

        for item in RecordReader::new(reader) {
            match item? {
                Ok(record) => {
                    let tidy = self.preprocess_tweet(record.tweet());
                    let output = record.into_output(tidy);
                    serde_json::to_writer(&mut writer, &output).map_err(std::io::Error::from)?;
                    writer.write_all(b"\n")?;
                    report.processed += 1;
                }
                Err(err) => match policy {
                    ErrorPolicy::Halt => return Err(err.into()),
                    ErrorPolicy::SkipAndContinue => {
                        warn!(line = err.line(), error = %err, "registro malformado ignorado");
                        report.skipped += 1;
                        report.skipped_lines.push(err.line());
                    }
                },
            }
        }
        writer.flush()?;

        let elapsed = start.elapsed();
        report.elapsed_ms = elapsed.as_millis() as u64;
        info!(
            processed = report.processed,
            skipped = report.skipped,
            elapsed = %format_elapsed(elapsed),
            "lote concluído"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::io::Cursor;

    fn preprocessor() -> TweetPreprocessor {
        TweetPreprocessor::new(PipelineConfig::default()).unwrap()
    }

    #[test]
    fn test_preprocess_tweet_example() {
        let tidy = preprocessor()
            .preprocess_tweet("OMG 😊 check http://t.co/xyz #great on 2020-01-01, it's amazing!!!");
        assert_eq!(tidy, "omg check #great amazing");
    }

    #[test]
    fn test_analyze_matches_direct_path() {
        let p = preprocessor();
        let text = "Visiting New York with Jane Smith on Friday at 5pm :)";
        let analysis = p.analyze(text);
        assert_eq!(analysis.tidy_text, p.preprocess_tweet(text));
        assert!(analysis.entities.iter().any(|e| e.label == EntityLabel::Gpe && e.text == "New York"));
        assert!(analysis.kept.contains(&"new_york".to_string()));
    }

    #[test]
    fn test_streaming_event_order() {
        let p = preprocessor();
        let (tx, rx) = mpsc::channel();
        p.analyze_streaming("I love New York since march", tx);
        let events: Vec<PipelineEvent> = rx.iter().collect();

        assert!(matches!(events.first(), Some(PipelineEvent::Normalized { .. })));
        assert!(matches!(events[1], PipelineEvent::TokenizationDone { .. }));
        assert!(matches!(events[2], PipelineEvent::EntitiesRecognized { .. }));
        assert!(matches!(events.last(), Some(PipelineEvent::Done { .. })));
        assert!(events
            .iter()
            .any(|e| matches!(e, PipelineEvent::EntityMerged { label: EntityLabel::Gpe, .. })));
        assert!(events.iter().any(|e| matches!(
            e,
            PipelineEvent::TokenExcluded { reason: ExclusionReason::StopWord, .. }
        )));
    }

    #[test]
    fn test_events_serialize_tagged() {
        let event = PipelineEvent::Normalized { text: "x".into() };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "Normalized");
        assert_eq!(json["data"]["text"], "x");
    }

    #[test]
    fn test_batch_preserves_order() {
        let p = preprocessor();
        let texts = ["alpha beta", "", "gamma delta :-)"];
        let out = p.preprocess_batch(&texts);
        assert_eq!(out, vec!["alpha beta", "", "gamma delta"]);
    }

    #[test]
    fn test_construction_errors() {
        let bad_model = PipelineConfig::default().with_model("xx_unknown");
        assert!(matches!(
            TweetPreprocessor::new(bad_model),
            Err(ConfigurationError::UnknownModel(_))
        ));
        let bad_stoplist = PipelineConfig::default().with_stoplist("/nao/existe.txt");
        assert!(matches!(
            TweetPreprocessor::new(bad_stoplist),
            Err(ConfigurationError::UnreadableStoplist { .. })
        ));
        let bad_gazetteer = PipelineConfig::default().with_gazetteer_entry("Acme", "COMPANY");
        assert!(matches!(
            TweetPreprocessor::new(bad_gazetteer),
            Err(ConfigurationError::InvalidLabel(_))
        ));
    }

    #[test]
    fn test_records_halt_and_skip() {
        let p = preprocessor();
        let input = "{\"tweet\":\"hello world\",\"date\":\"2020-01-01\",\"link\":\"https://twitter.com/a/status/1\"}\n\
                     not json\n\
                     {\"tweet\":\"second tweet\",\"date\":\"2020-01-02\",\"link\":\"https://twitter.com/a/status/2\"}\n";

        let mut out = Vec::new();
        let err = p
            .preprocess_records(Cursor::new(input), &mut out, ErrorPolicy::Halt)
            .unwrap_err();
        assert!(matches!(err, Error::MalformedRecord(ref e) if e.line() == 2));
        assert_eq!(String::from_utf8(out).unwrap().lines().count(), 1);

        let mut out = Vec::new();
        let report = p
            .preprocess_records(Cursor::new(input), &mut out, ErrorPolicy::SkipAndContinue)
            .unwrap();
        assert_eq!((report.processed, report.skipped), (2, 1));
        assert_eq!(report.skipped_lines, vec![2]);
        let lines: Vec<serde_json::Value> = String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines[0]["tidy_tweet"], "hello world");
        assert_eq!(lines[1]["name"], "2020-01-02__a_status_2");
    }
}
