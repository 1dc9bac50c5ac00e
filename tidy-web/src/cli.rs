//! Argumentos de linha de comando.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tidy_core::config::PipelineConfig;

/// Limpeza de tweets: servidor web e processamento em lote.
#[derive(Debug, Parser)]
#[command(name = "tidy-web", version, about)]
pub struct Cli {
    /// Arquivo TOML de configuração do pipeline
    #[arg(long, global = true, env = "TIDY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Stoplist extra (uma palavra por linha)
    #[arg(long, global = true)]
    pub stoplist: Option<PathBuf>,

    /// Identificador do modelo de anotação
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Remoção de acentos: "unicode" ou "ascii"
    #[arg(long, global = true)]
    pub accent_method: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Sobe o servidor HTTP/WebSocket
    Serve {
        #[arg(long, default_value = "0.0.0.0:3000", env = "TIDY_ADDR")]
        addr: SocketAddr,
    },

    /// Processa um arquivo NDJSON, adicionando `tidy_tweet` e `name`
    Preprocess {
        #[arg(long)]
        input: PathBuf,

        #[arg(long)]
        output: PathBuf,

        /// Ignora registros malformados em vez de parar
        #[arg(long)]
        skip_malformed: bool,
    },
}

impl Cli {
    /// Configuração final: arquivo (se houver) sobrescrito pelas flags.
    pub fn pipeline_config(&self) -> Result<PipelineConfig, tidy_core::ConfigurationError> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::from_file(path)?,
            None => PipelineConfig::default(),
        };
        if let Some(stoplist) = &self.stoplist {
            config = config.with_stoplist(stoplist);
        }
        if let Some(model) = &self.model {
            config = config.with_model(model);
        }
        if let Some(method) = &self.accent_method {
            config = config.with_accent_method(method);
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_defaults() {
        let cli = Cli::parse_from([
            "tidy-web",
            "--model",
            "en_rules",
            "--accent-method",
            "ascii",
            "preprocess",
            "--input",
            "in.jsonl",
            "--output",
            "out.jsonl",
            "--skip-malformed",
        ]);
        let config = cli.pipeline_config().unwrap();
        assert_eq!(config.model, "en_rules");
        assert_eq!(config.accent_method, "ascii");
        assert!(config.stoplist.is_none());
        assert!(matches!(cli.command, Commands::Preprocess { skip_malformed: true, .. }));
    }

    #[test]
    fn test_serve_default_addr() {
        let cli = Cli::parse_from(["tidy-web", "serve"]);
        match cli.command {
            Commands::Serve { addr } => assert_eq!(addr.port(), 3000),
            other => panic!("comando inesperado: {other:?}"),
        }
    }
}
