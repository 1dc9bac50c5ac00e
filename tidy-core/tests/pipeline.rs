use std::io::{Cursor, Write};

use proptest::prelude::*;
use tempfile::NamedTempFile;

use tidy_core::annotation::AnnotationEngine;
use tidy_core::normalizer::normalize;
use tidy_core::tokenizer::TokenizerConfig;
use tidy_core::{
    AccentMethod, ConfigurationError, EntityLabel, ErrorPolicy, LemmaException, PipelineConfig,
    TweetPreprocessor, Vocabulary,
};

fn preprocessor() -> TweetPreprocessor {
    TweetPreprocessor::new(PipelineConfig::default()).unwrap()
}

/// Verifica que `needles` aparecem em `haystack` nesta ordem.
fn in_order(haystack: &[&str], needles: &[&str]) -> bool {
    let mut it = haystack.iter();
    needles.iter().all(|n| it.any(|h| h == n))
}

#[test]
fn end_to_end_record() {
    let input = r#"{"tweet": "OMG 😊 check http://t.co/xyz #great on 2020-01-01, it's amazing!!!", "date": "2020-01-01", "link": "https://twitter.com/user/status/1"}"#;
    let mut out = Vec::new();
    let report = preprocessor()
        .preprocess_records(Cursor::new(input), &mut out, ErrorPolicy::Halt)
        .unwrap();
    assert_eq!(report.processed, 1);

    let record: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(record["name"], "2020-01-01__user_status_1");
    assert_eq!(record["tweet"], "OMG 😊 check http://t.co/xyz #great on 2020-01-01, it's amazing!!!");

    let tidy = record["tidy_tweet"].as_str().unwrap();
    let tokens: Vec<&str> = tidy.split(' ').collect();
    assert!(in_order(&tokens, &["check", "#great", "amazing"]), "{tidy}");
    for gone in ["😊", "http://t.co/xyz", "2020", "01", ",", "'s", "!", "on", "it"] {
        assert!(!tokens.contains(&gone), "{gone} em {tidy}");
    }
}

#[test]
fn stoplist_extends_stop_words() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "omg\n\n  lol  ").unwrap();
    let config = PipelineConfig::default().with_stoplist(file.path());
    let p = TweetPreprocessor::new(config).unwrap();

    let tidy = p.preprocess_tweet("OMG this is great lol");
    assert_eq!(tidy, "great");
    assert!(preprocessor().preprocess_tweet("OMG this is great").contains("omg"));
}

#[test]
fn emoticon_only_input_is_empty() {
    let p = preprocessor();
    assert_eq!(p.preprocess_tweet(":) :-( <3 ;)"), "");
    assert_eq!(p.preprocess_tweet("😊😂 👍🏽"), "");
    assert_eq!(p.preprocess_tweet(""), "");
    assert_eq!(p.preprocess_tweet("   \n\t "), "");
}

#[test]
fn hashtag_is_atomic() {
    let analysis = preprocessor().analyze("Reading the #WE1S_v2 report");
    let texts: Vec<&str> = analysis.tokens.iter().map(|t| t.text.as_str()).collect();
    assert_eq!(texts, ["Reading", "the", "#WE1S_v2", "report"]);
}

#[test]
fn humanities_lemma_override() {
    let engine = tidy_core::engine::RuleEngine::new("en_rules");
    let vocab = Vocabulary::english();
    let tokenizer = TokenizerConfig::default();
    for text in ["humanities", "The humanities matter.", "save the humanities!"] {
        let doc = engine.annotate(text, &tokenizer, &vocab);
        let token = doc.tokens.iter().find(|t| t.text == "humanities").unwrap();
        assert_eq!((token.lemma.as_str(), token.pos.as_str(), token.tag.as_str()), ("humanities", "NOUN", "NNS"));
    }
}

#[test]
fn configured_lemma_exception_applies() {
    let config = PipelineConfig::default()
        .with_lemma_exception(LemmaException::new("data", "data", "NOUN", "NNS"));
    let analysis = TweetPreprocessor::new(config).unwrap().analyze("big data rocks");
    let token = analysis.tokens.iter().find(|t| t.text == "data").unwrap();
    assert_eq!((token.lemma.as_str(), token.tag.as_str()), ("data", "NNS"));
}

#[test]
fn configured_gazetteer_and_skip_labels() {
    let config = PipelineConfig::default()
        .with_gazetteer_entry("WhatEvery1Says", "ORG")
        .with_skip_labels(["ORG"]);
    let analysis = TweetPreprocessor::new(config).unwrap().analyze("I love WhatEvery1Says and New York");
    assert!(analysis
        .entities
        .iter()
        .any(|e| e.label == EntityLabel::Org && e.text == "WhatEvery1Says"));
    // ORG não é fundido; GPE continua sendo.
    assert!(analysis.kept.contains(&"new_york".to_string()));
}

#[test]
fn config_file_drives_construction() {
    let mut stoplist = NamedTempFile::new().unwrap();
    writeln!(stoplist, "great").unwrap();
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        "stoplist = {:?}\naccent_method = \"ascii\"",
        stoplist.path().display().to_string()
    )
    .unwrap();

    let config = PipelineConfig::from_file(file.path()).unwrap();
    let p = TweetPreprocessor::new(config).unwrap();
    assert_eq!(p.preprocess_tweet("café great idea"), "cafe idea");
}

#[test]
fn configuration_errors_fail_early() {
    let cases = [
        PipelineConfig::default().with_accent_method("latin1"),
        PipelineConfig::default().with_skip_labels(["DATES"]),
        PipelineConfig::default().with_model("pt_core_news_sm"),
        PipelineConfig::default().with_stoplist("/nao/existe/stoplist.txt"),
    ];
    let errors: Vec<ConfigurationError> = cases
        .into_iter()
        .map(|c| TweetPreprocessor::new(c).err().unwrap())
        .collect();
    assert!(matches!(errors[0], ConfigurationError::InvalidAccentMethod(_)));
    assert!(matches!(errors[1], ConfigurationError::InvalidLabel(_)));
    assert!(matches!(errors[2], ConfigurationError::UnknownModel(_)));
    assert!(matches!(errors[3], ConfigurationError::UnreadableStoplist { .. }));
}

#[test]
fn malformed_records_do_not_affect_neighbours() {
    let input = concat!(
        r#"{"tweet": "first tweet", "date": "2020-01-01", "link": "https://twitter.com/a/status/1"}"#, "\n",
        "\n",
        r#"{"tweet": "no link", "date": "2020-01-01"}"#, "\n",
        r#"[1, 2, 3]"#, "\n",
        r#"{"tweet": "third tweet", "date": "2020-01-03", "link": "https://twitter.com/a/status/3", "extra": true}"#, "\n",
    );
    let mut out = Vec::new();
    let report = preprocessor()
        .preprocess_records(Cursor::new(input), &mut out, ErrorPolicy::SkipAndContinue)
        .unwrap();
    assert_eq!(report.processed, 2);
    assert_eq!(report.skipped_lines, vec![3, 4]);

    let text = String::from_utf8(out).unwrap();
    let records: Vec<serde_json::Value> =
        text.lines().map(|l| serde_json::from_str(l).unwrap()).collect();
    assert_eq!(records[0]["tidy_tweet"], "tweet");
    assert_eq!(records[1]["extra"], true);
    assert_eq!(records[1]["name"], "2020-01-03__a_status_3");
}

#[test]
fn invalid_utf8_line_is_skipped_like_any_malformed_record() {
    let mut input = Vec::new();
    input.extend_from_slice(
        br#"{"tweet": "first tweet", "date": "2020-01-01", "link": "https://twitter.com/a/status/1"}"#,
    );
    input.extend_from_slice(b"\n{\"tweet\": \"bad \xff byte\", \"date\": \"2020-01-02\", \"link\": \"x\"}\n");
    input.extend_from_slice(
        br#"{"tweet": "third tweet", "date": "2020-01-03", "link": "https://twitter.com/a/status/3"}"#,
    );
    input.push(b'\n');

    let mut out = Vec::new();
    let report = preprocessor()
        .preprocess_records(Cursor::new(input.clone()), &mut out, ErrorPolicy::SkipAndContinue)
        .unwrap();
    assert_eq!(report.processed, 2);
    assert_eq!(report.skipped_lines, vec![2]);
    let text = String::from_utf8(out).unwrap();
    let names: Vec<String> = text
        .lines()
        .map(|l| serde_json::from_str::<serde_json::Value>(l).unwrap()["name"].to_string())
        .collect();
    assert_eq!(names, ["\"2020-01-01__a_status_1\"", "\"2020-01-03__a_status_3\""]);

    let mut out = Vec::new();
    let err = preprocessor()
        .preprocess_records(Cursor::new(input), &mut out, ErrorPolicy::Halt)
        .unwrap_err();
    assert!(matches!(
        err,
        tidy_core::Error::MalformedRecord(tidy_core::MalformedRecordError::InvalidUtf8 { line: 2 })
    ));
    assert_eq!(String::from_utf8(out).unwrap().lines().count(), 1);
}

#[test]
fn demo_texts_process_without_panicking() {
    let p = preprocessor();
    let texts: Vec<&str> = tidy_core::samples::demo_texts().into_iter().map(|(_, t)| t).collect();
    let out = p.preprocess_batch(&texts);
    assert_eq!(out.len(), texts.len());
    for tidy in out {
        assert!(!tidy.contains("  "));
        assert!(tidy.split(' ').all(|t| t.is_empty() || t.chars().count() > 1));
    }
}

proptest! {
    #[test]
    fn normalize_is_idempotent(text in "[a-zA-Z0-9 .,!?#@:;'\"\t\néàçüñ😊-]{0,60}") {
        for method in [AccentMethod::Unicode, AccentMethod::Ascii] {
            let once = normalize(&text, method);
            prop_assert_eq!(normalize(&once, method), once.clone());
        }
    }

    #[test]
    fn output_preserves_input_order(words in prop::collection::vec("[a-z]{3,8}", 1..8)) {
        let p = preprocessor();
        let text = words.join(" ");
        let tidy = p.preprocess_tweet(&text);
        let kept: Vec<&str> = tidy.split(' ').filter(|t| !t.is_empty()).collect();
        let source: Vec<&str> = words.iter().map(String::as_str).collect();
        prop_assert!(in_order(&source, &kept));
    }

    #[test]
    fn survivors_never_contain_whitespace(text in "[a-zA-Z #@:)(.,!0-9]{0,80}") {
        let tidy = preprocessor().preprocess_tweet(&text);
        prop_assert!(!tidy.starts_with(' ') && !tidy.ends_with(' '));
        prop_assert!(!tidy.contains("  "));
    }
}
