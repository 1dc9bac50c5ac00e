//! Servidor web Axum com WebSocket para visualizar a limpeza de tweets em
//! tempo real, e comando em lote sobre arquivos NDJSON.

mod cli;

use std::fs::File;
use std::io::{BufReader, BufWriter, Cursor};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::{header, StatusCode},
    response::{Html, IntoResponse, Json},
    routing::{get, post},
    Router,
};
use clap::Parser;
use serde::{Deserialize, Serialize};
use tidy_core::{
    pipeline::{EntityMention, PipelineEvent, TweetPreprocessor},
    record::format_elapsed,
    samples::demo_texts,
    Error, ErrorPolicy,
};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};

/// Estado compartilhado da aplicação
struct AppState {
    preprocessor: TweetPreprocessor,
}

#[derive(Deserialize)]
struct PreprocessRequest {
    text: String,
}

/// Mensagem WebSocket recebida do cliente
#[derive(Deserialize)]
struct WsRequest {
    text: String,
}

#[derive(Serialize)]
struct PreprocessResponse {
    tidy_text: String,
    tokens: Vec<String>,
    entities: Vec<EntityMention>,
    processing_ms: u64,
}

#[derive(Deserialize)]
struct RecordsQuery {
    #[serde(default)]
    skip_malformed: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = cli.pipeline_config()?;
    let preprocessor = TweetPreprocessor::new(config)?;

    match cli.command {
        Commands::Serve { addr } => serve(preprocessor, addr).await,
        Commands::Preprocess {
            input,
            output,
            skip_malformed,
        } => {
            let policy = if skip_malformed {
                ErrorPolicy::SkipAndContinue
            } else {
                ErrorPolicy::Halt
            };
            tokio::task::spawn_blocking(move || preprocess_file(&preprocessor, input, output, policy))
                .await?
        }
    }
}

/// Lê `input`, escreve `output` e registra o tempo decorrido.
fn preprocess_file(
    preprocessor: &TweetPreprocessor,
    input: PathBuf,
    output: PathBuf,
    policy: ErrorPolicy,
) -> anyhow::Result<()> {
    let start = Instant::now();
    let reader = File::open(&input)
        .map(BufReader::new)
        .with_context(|| format!("abrindo {}", input.display()))?;
    let writer = File::create(&output)
        .map(BufWriter::new)
        .with_context(|| format!("criando {}", output.display()))?;

    let report = preprocessor
        .preprocess_records(reader, writer, policy)
        .with_context(|| format!("processando {}", input.display()))?;

    info!(
        input = %input.display(),
        output = %output.display(),
        processed = report.processed,
        skipped = report.skipped,
        "concluído em {}",
        format_elapsed(start.elapsed())
    );
    Ok(())
}

async fn serve(preprocessor: TweetPreprocessor, addr: SocketAddr) -> anyhow::Result<()> {
    let state = Arc::new(AppState { preprocessor });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/", get(index_handler))
        .route("/preprocess", post(preprocess_handler))
        .route("/records", post(records_handler))
        .route("/ws", get(ws_handler))
        .route("/demo-texts", get(demo_texts_handler))
        .layer(cors)
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("escutando em {addr}"))?;
    info!("🚀 Servidor iniciado em http://{addr}");
    axum::serve(listener, app).await?;
    Ok(())
}

/// Retorna a página principal HTML
async fn index_handler() -> impl IntoResponse {
    Html(include_str!("templates/index.html"))
}

/// Limpeza de um texto via HTTP POST (sem streaming)
async fn preprocess_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PreprocessRequest>,
) -> impl IntoResponse {
    if req.text.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": "Texto vazio"})),
        )
            .into_response();
    }

    let analysis = state.preprocessor.analyze(&req.text);
    Json(PreprocessResponse {
        tidy_text: analysis.tidy_text,
        tokens: analysis.kept,
        entities: analysis.entities,
        processing_ms: analysis.processing_ms,
    })
    .into_response()
}

/// Corpo NDJSON → NDJSON com `tidy_tweet` e `name`
async fn records_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RecordsQuery>,
    body: String,
) -> impl IntoResponse {
    let policy = if query.skip_malformed {
        ErrorPolicy::SkipAndContinue
    } else {
        ErrorPolicy::Halt
    };

    let result = tokio::task::spawn_blocking(move || {
        let mut out = Vec::new();
        state
            .preprocessor
            .preprocess_records(Cursor::new(body), &mut out, policy)
            .map(|report| (report, out))
    })
    .await;

    match result {
        Ok(Ok((report, out))) => (
            [
                (header::CONTENT_TYPE, "application/x-ndjson".to_string()),
                (header::HeaderName::from_static("x-skipped-records"), report.skipped.to_string()),
            ],
            out,
        )
            .into_response(),
        Ok(Err(Error::MalformedRecord(err))) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(serde_json::json!({"error": err.to_string(), "line": err.line()})),
        )
            .into_response(),
        Ok(Err(err)) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({"error": err.to_string()})),
        )
            .into_response(),
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({"error": err.to_string()})),
        )
            .into_response(),
    }
}

/// Retorna textos de demonstração
async fn demo_texts_handler() -> impl IntoResponse {
    let texts: Vec<serde_json::Value> = demo_texts()
        .iter()
        .map(|(category, text)| {
            serde_json::json!({
                "category": category,
                "text": text
            })
        })
        .collect();
    Json(texts)
}

/// Upgrade HTTP → WebSocket
async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_websocket(socket, state))
}

/// Lógica do WebSocket: recebe texto, executa pipeline e envia eventos em tempo real
async fn handle_websocket(mut socket: WebSocket, state: Arc<AppState>) {
    info!("WebSocket conectado");

    while let Some(Ok(msg)) = socket.recv().await {
        match msg {
            Message::Text(text) => {
                // JSON {text}; senão usa a mensagem como texto puro
                let text = match serde_json::from_str::<WsRequest>(&text) {
                    Ok(req) => req.text,
                    Err(_) => text,
                };
                if text.trim().is_empty() {
                    continue;
                }
                info!("Processando via WebSocket: {} chars", text.len());

                // O pipeline é síncrono: roda fora do runtime
                let (tx, rx) = std::sync::mpsc::channel::<PipelineEvent>();
                let state = Arc::clone(&state);
                let outcome = tokio::task::spawn_blocking(move || {
                    state.preprocessor.analyze_streaming(&text, tx);
                })
                .await;

                let mut events: Vec<PipelineEvent> = rx.try_iter().collect();
                if let Err(err) = outcome {
                    warn!(%err, "pipeline falhou");
                    events.push(PipelineEvent::Error {
                        message: err.to_string(),
                    });
                }

                for event in &events {
                    if let Ok(json) = serde_json::to_string(event) {
                        if socket.send(Message::Text(json)).await.is_err() {
                            return; // cliente desconectou
                        }
                        // Pequena pausa para animação visual (passo a passo)
                        tokio::time::sleep(tokio::time::Duration::from_millis(35)).await;
                    }
                }
            }
            Message::Close(_) => {
                info!("WebSocket desconectado");
                return;
            }
            Message::Ping(payload) => {
                let _ = socket.send(Message::Pong(payload)).await;
            }
            _ => {}
        }
    }
}
