//! # Registros NDJSON
//!
//! Cada linha de entrada é um objeto JSON com pelo menos `tweet`, `date` e
//! `link` (strings). A saída é o mesmo objeto, com os campos originais na
//! ordem original, acrescido de:
//!
//! - `tidy_tweet`: o texto limpo (pode ser vazio);
//! - `name`: `date` + `link`, com `https://twitter.com/` trocado por `__` e
//!   cada `/` restante trocado por `_`.
//!
//! Linhas em branco são ignoradas. Um registro malformado nunca afeta os
//! vizinhos: a [`ErrorPolicy`] decide se o lote para ou segue.

use std::io::BufRead;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, MalformedRecordError};

const TWITTER_PREFIX: &str = "https://twitter.com/";

/// Registro de entrada já validado.
#[derive(Debug, Clone, PartialEq)]
pub struct TweetRecord {
    /// Linha física (1-based) de onde o registro veio.
    pub line: usize,
    fields: Map<String, Value>,
}

impl TweetRecord {
    fn text_field(&self, field: &str) -> &str {
        self.fields.get(field).and_then(Value::as_str).unwrap_or("")
    }

    pub fn tweet(&self) -> &str {
        self.text_field("tweet")
    }

    pub fn date(&self) -> &str {
        self.text_field("date")
    }

    pub fn link(&self) -> &str {
        self.text_field("link")
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Registro de saída: campos originais + `tidy_tweet` + `name`.
    pub fn into_output(self, tidy_tweet: String) -> Map<String, Value> {
        let name = derive_name(self.date(), self.link());
        let mut fields = self.fields;
        fields.insert("tidy_tweet".to_string(), Value::String(tidy_tweet));
        fields.insert("name".to_string(), Value::String(name));
        fields
    }
}

/// Valida uma linha NDJSON.
pub fn parse_record(line: &str, line_no: usize) -> Result<TweetRecord, MalformedRecordError> {
    let value: Value = serde_json::from_str(line)
        .map_err(|source| MalformedRecordError::InvalidJson { line: line_no, source })?;
    let Value::Object(fields) = value else {
        return Err(MalformedRecordError::NotAnObject { line: line_no });
    };
    for field in ["tweet", "date", "link"] {
        if !fields.get(field).map(Value::is_string).unwrap_or(false) {
            return Err(MalformedRecordError::MissingField { line: line_no, field });
        }
    }
    Ok(TweetRecord {
        line: line_no,
        fields,
    })
}

/// Nome estável do registro, derivado de data + link.
///
/// ```
/// use tidy_core::record::derive_name;
/// assert_eq!(
///     derive_name("2020-01-01", "https://twitter.com/user/status/1"),
///     "2020-01-01__user_status_1"
/// );
/// ```
pub fn derive_name(date: &str, link: &str) -> String {
    let link = link.replace(TWITTER_PREFIX, "__").replace('/', "_");
    format!("{date}{link}")
}

/// O que fazer quando um registro é malformado.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    /// Para no primeiro registro malformado.
    #[default]
    Halt,
    /// Registra, conta e segue.
    SkipAndContinue,
}

/// Resumo de um processamento em lote.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub processed: usize,
    pub skipped: usize,
    /// Linhas (1-based) dos registros descartados.
    pub skipped_lines: Vec<usize>,
    pub elapsed_ms: u64,
}

impl BatchReport {
    pub fn elapsed(&self) -> Duration {
        Duration::from_millis(self.elapsed_ms)
    }
}

/// Formata uma duração como `hh:mm:ss`.
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs / 60) % 60, secs % 60)
}

/// Lê registros de um `BufRead`, pulando linhas em branco.
///
/// Cada item é o resultado de um registro; uma linha que não é UTF-8 válido
/// vira [`MalformedRecordError::InvalidUtf8`]. Só falhas reais de leitura
/// encerram a iteração com `Err(Error::Io)`.
pub struct RecordReader<R> {
    reader: R,
    buf: Vec<u8>,
    line_no: usize,
}

impl<R: BufRead> RecordReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
            line_no: 0,
        }
    }
}

impl<R: BufRead> Iterator for RecordReader<R> {
    type Item = Result<Result<TweetRecord, MalformedRecordError>, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buf.clear();
            match self.reader.read_until(b'\n', &mut self.buf) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(e) => return Some(Err(Error::Io(e))),
            }
            self.line_no += 1;

            let Ok(line) = std::str::from_utf8(&self.buf) else {
                return Some(Ok(Err(MalformedRecordError::InvalidUtf8 { line: self.line_no })));
            };
            if line.trim().is_empty() {
                continue;
            }
            return Some(Ok(parse_record(line, self.line_no)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_derive_name() {
        assert_eq!(
            derive_name("2020-01-01", "https://twitter.com/user/status/1"),
            "2020-01-01__user_status_1"
        );
        assert_eq!(derive_name("2021-05-05", "http://x.org/a/b"), "2021-05-05http:__x.org_a_b");
        assert_eq!(derive_name("", ""), "");
    }

    #[test]
    fn test_output_keeps_field_order() {
        let record = parse_record(
            r#"{"id": 7, "tweet": "hi", "date": "2020-01-01", "link": "https://twitter.com/u/status/9", "lang": "en"}"#,
            1,
        )
        .unwrap();
        assert_eq!(record.tweet(), "hi");
        let out = record.into_output("hi".into());
        let keys: Vec<&str> = out.keys().map(String::as_str).collect();
        assert_eq!(keys, ["id", "tweet", "date", "link", "lang", "tidy_tweet", "name"]);
        assert_eq!(out["name"], "2020-01-01__u_status_9");
        assert_eq!(out["id"], 7);
    }

    #[test]
    fn test_malformed_records() {
        assert!(matches!(
            parse_record("{not json", 3),
            Err(MalformedRecordError::InvalidJson { line: 3, .. })
        ));
        assert!(matches!(
            parse_record("[1, 2]", 4),
            Err(MalformedRecordError::NotAnObject { line: 4 })
        ));
        assert!(matches!(
            parse_record(r#"{"tweet": "x", "date": "d"}"#, 5),
            Err(MalformedRecordError::MissingField { line: 5, field: "link" })
        ));
        assert!(matches!(
            parse_record(r#"{"tweet": 1, "date": "d", "link": "l"}"#, 6),
            Err(MalformedRecordError::MissingField { field: "tweet", .. })
        ));
    }

    #[test]
    fn test_reader_skips_blank_lines_and_counts_physical_lines() {
        let input = "\n{\"tweet\":\"a\",\"date\":\"d\",\"link\":\"l\"}\n   \nbroken\n";
        let items: Vec<_> = RecordReader::new(Cursor::new(input))
            .map(|item| item.unwrap())
            .collect();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].as_ref().unwrap().line, 2);
        assert_eq!(items[1].as_ref().unwrap_err().line(), 4);
    }

    #[test]
    fn test_reader_invalid_utf8_is_per_line() {
        let mut input = b"{\"tweet\":\"a\",\"date\":\"d\",\"link\":\"l\"}\n".to_vec();
        input.extend_from_slice(b"{\"tweet\":\"bad \xff\"}\r\n");
        input.extend_from_slice(b"{\"tweet\":\"c\",\"date\":\"d\",\"link\":\"l\"}");
        let items: Vec<_> = RecordReader::new(Cursor::new(input))
            .map(|item| item.unwrap())
            .collect();
        assert_eq!(items.len(), 3);
        assert!(matches!(items[1], Err(MalformedRecordError::InvalidUtf8 { line: 2 })));
        assert_eq!(items[2].as_ref().unwrap().line, 3);
        assert_eq!(items[2].as_ref().unwrap().tweet(), "c");
    }

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(Duration::from_secs(0)), "00:00:00");
        assert_eq!(format_elapsed(Duration::from_secs(3725)), "01:02:05");
        assert_eq!(format_elapsed(Duration::from_millis(59_999)), "00:00:59");
    }
}
