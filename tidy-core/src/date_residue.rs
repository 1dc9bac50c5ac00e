//! # Supressor de Resíduos de Data
//!
//! Segunda passada heurística: tokens que sobreviveram aos filtros mas ainda
//! "parecem" uma data ou hora são descartados.
//!
//! ## Parser difuso
//!
//! O token é quebrado em sequências de dígitos, letras e demais caracteres.
//! Fragmentos desconhecidos são ignorados; os reconhecidos preenchem campos:
//!
//! | Fragmento                        | Campo                         |
//! |----------------------------------|-------------------------------|
//! | `jan`, `march`, `sept`...        | mês                           |
//! | `mon`, `friday`...               | dia da semana                 |
//! | `10:30`, `10:30:15`              | hora, minuto, segundo         |
//! | `5` + `am`/`pm`                  | hora (12h)                    |
//! | `10h`, `30m`, `15s`              | hora / minuto / segundo       |
//! | `20200101`, `200101`             | ano, mês, dia                 |
//! | `1/2`, `2020-01`                 | sequência ano/mês/dia         |
//! | demais números                   | dia (≤ 31) ou ano             |
//! | `utc`, `gmt` (após uma hora)     | fuso                          |
//!
//! Os campos são validados com `chrono` contra a data de referência
//! 2000-01-01 (campos ausentes vêm dela). Sem nenhum campo, ou com valores
//! fora de faixa, o resultado é [`DateParse::NotParsed`] e o token é mantido.
//!
//! É uma heurística, não detecção exata: tokens alfanuméricos curtos como
//! `covid19` também "parecem" datas e são descartados.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

const REFERENCE_YEAR: i32 = 2000;

/// Campos reconhecidos em um token já validados.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateFields {
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub day: Option<u32>,
    pub hour: Option<u32>,
    pub minute: Option<u32>,
    pub second: Option<u32>,
    /// 0 = segunda-feira ... 6 = domingo.
    pub weekday: Option<u32>,
    pub utc: bool,
}

/// Por que um token não foi reconhecido como data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum NotParsedReason {
    /// Nenhum fragmento de data ou hora.
    NoDateFields,
    /// Mais de três valores de ano/mês/dia.
    TooManyValues,
    /// Valores reconhecidos, mas inválidos (ex.: dia 45).
    OutOfRange(String),
}

/// Resultado do parser difuso.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "data", rename_all = "snake_case")]
pub enum DateParse {
    Parsed(DateFields),
    NotParsed(NotParsedReason),
}

impl DateParse {
    pub fn is_parsed(&self) -> bool {
        matches!(self, DateParse::Parsed(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LexKind {
    Digits,
    Alpha,
    Other,
}

fn lex(token: &str) -> Vec<(LexKind, &str)> {
    let kind_of = |c: char| {
        if c.is_ascii_digit() {
            LexKind::Digits
        } else if c.is_alphabetic() {
            LexKind::Alpha
        } else {
            LexKind::Other
        }
    };
    let mut out = Vec::new();
    let mut start = 0;
    let mut current: Option<LexKind> = None;
    for (i, c) in token.char_indices() {
        let kind = kind_of(c);
        match current {
            Some(k) if k == kind && kind != LexKind::Other => {}
            Some(k) => {
                out.push((k, &token[start..i]));
                start = i;
                current = Some(kind);
            }
            None => current = Some(kind),
        }
    }
    if let Some(k) = current {
        out.push((k, &token[start..]));
    }
    out
}

fn month_number(word: &str) -> Option<u32> {
    Some(match word {
        "jan" | "january" => 1,
        "feb" | "february" => 2,
        "mar" | "march" => 3,
        "apr" | "april" => 4,
        "may" => 5,
        "jun" | "june" => 6,
        "jul" | "july" => 7,
        "aug" | "august" => 8,
        "sep" | "sept" | "september" => 9,
        "oct" | "october" => 10,
        "nov" | "november" => 11,
        "dec" | "december" => 12,
        _ => return None,
    })
}

fn weekday_number(word: &str) -> Option<u32> {
    Some(match word {
        "mon" | "monday" => 0,
        "tue" | "tuesday" => 1,
        "wed" | "wednesday" => 2,
        "thu" | "thursday" => 3,
        "fri" | "friday" => 4,
        "sat" | "saturday" => 5,
        "sun" | "sunday" => 6,
        _ => return None,
    })
}

fn is_pm(word: &str) -> Option<bool> {
    match word {
        "am" | "a" => Some(false),
        "pm" | "p" => Some(true),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy)]
enum HmsField {
    Hour,
    Minute,
    Second,
}

fn hms_field(word: &str) -> Option<HmsField> {
    match word {
        "h" | "hour" | "hours" => Some(HmsField::Hour),
        "m" | "minute" | "minutes" => Some(HmsField::Minute),
        "s" | "second" | "seconds" => Some(HmsField::Second),
        _ => None,
    }
}

/// Valor de ano/mês/dia ainda não resolvido.
#[derive(Debug, Clone, Copy)]
enum YmdValue {
    /// Mês vindo de um nome ("jan").
    Month(u32),
    /// Certamente um ano (4+ dígitos, ou posição fixa em `YYMMDD`).
    Year { value: i64, digits: usize },
    Plain { value: i64, digits: usize },
}

#[derive(Default)]
struct Collected {
    ymd: Vec<YmdValue>,
    hour: Option<u32>,
    minute: Option<u32>,
    second: Option<u32>,
    weekday: Option<u32>,
    utc: bool,
}

impl Collected {
    fn is_empty(&self) -> bool {
        self.ymd.is_empty()
            && self.hour.is_none()
            && self.minute.is_none()
            && self.second.is_none()
            && self.weekday.is_none()
            && !self.utc
    }

    fn push_number(&mut self, digits: &str) {
        let Ok(value) = digits.parse::<i64>() else {
            // Grande demais para qualquer campo: vira um ano inválido.
            self.ymd.push(YmdValue::Year { value: i64::MAX, digits: digits.len() });
            return;
        };
        if digits.len() > 2 {
            self.ymd.push(YmdValue::Year { value, digits: digits.len() });
        } else {
            self.ymd.push(YmdValue::Plain { value, digits: digits.len() });
        }
    }
}

/// Fragmentos neutros entre campos.
fn is_jump(fragment: &str) -> bool {
    matches!(
        fragment,
        " " | "." | "," | ";" | "-" | "/" | "'"
            | "at" | "on" | "and" | "ad" | "m" | "t" | "of" | "st" | "nd" | "rd" | "th"
    )
}

fn could_be_day(value: u32) -> bool {
    (1..=31).contains(&value)
}

fn as_u32(text: &str) -> Option<u32> {
    text.parse().ok()
}

fn collect(token: &str) -> Collected {
    let lexed = lex(token);
    let lower: Vec<String> = lexed.iter().map(|(_, t)| t.to_lowercase()).collect();
    let kind = |i: usize| lexed.get(i).map(|(k, _)| *k);
    let text = |i: usize| lower.get(i).map(String::as_str).unwrap_or("");
    let mut c = Collected::default();
    let mut i = 0;

    while i < lexed.len() {
        match lexed[i].0 {
            LexKind::Digits => {
                let digits = text(i);
                let value = digits.parse::<u32>().ok();

                // HH:MM[:SS]
                if text(i + 1) == ":" && kind(i + 2) == Some(LexKind::Digits) {
                    c.hour = value;
                    c.minute = as_u32(text(i + 2));
                    i += 3;
                    if text(i) == ":" && kind(i + 1) == Some(LexKind::Digits) {
                        c.second = as_u32(text(i + 1));
                        i += 2;
                    }
                    continue;
                }
                // YYMMDD / YYYYMMDD
                if c.ymd.is_empty() && (digits.len() == 6 || digits.len() == 8) {
                    let year_len = digits.len() - 4;
                    if let (Ok(y), Ok(m), Ok(d)) = (
                        digits[..year_len].parse::<i64>(),
                        digits[year_len..year_len + 2].parse::<i64>(),
                        digits[year_len + 2..].parse::<i64>(),
                    ) {
                        c.ymd.push(YmdValue::Year { value: y, digits: year_len });
                        c.ymd.push(YmdValue::Plain { value: m, digits: 2 });
                        c.ymd.push(YmdValue::Plain { value: d, digits: 2 });
                    }
                    i += 1;
                    continue;
                }
                // 10h30m15s
                if kind(i + 1) == Some(LexKind::Alpha) {
                    if let Some(field) = hms_field(text(i + 1)) {
                        match field {
                            HmsField::Hour => c.hour = value,
                            HmsField::Minute => c.minute = value,
                            HmsField::Second => c.second = value,
                        }
                        i += 2;
                        continue;
                    }
                    // 5pm
                    if let (Some(pm), Some(v)) = (is_pm(text(i + 1)), value) {
                        if v < 24 {
                            c.hour = Some(v);
                            apply_ampm(&mut c, pm);
                            i += 2;
                            continue;
                        }
                    }
                }
                // 1/2/2020, 2020-01-01, 01-jan
                let sep = text(i + 1);
                if matches!(sep, "-" | "/" | ".") && lexed.get(i + 2).is_some() {
                    c.push_number(digits);
                    let mut j = i + 2;
                    loop {
                        match kind(j) {
                            Some(LexKind::Digits) => c.push_number(text(j)),
                            Some(LexKind::Alpha) => match month_number(text(j)) {
                                Some(m) => c.ymd.push(YmdValue::Month(m)),
                                None => break,
                            },
                            _ => break,
                        }
                        j += 1;
                        if text(j) == sep && lexed.get(j + 1).is_some() {
                            j += 1;
                        } else {
                            break;
                        }
                    }
                    i = j;
                    continue;
                }
                // Número colado a um fragmento desconhecido ("100x") só conta
                // se puder ser um dia.
                let glued = lexed.get(i + 1).is_some() && !is_jump(text(i + 1));
                if !glued || value.map(could_be_day).unwrap_or(false) {
                    c.push_number(digits);
                }
            }
            LexKind::Alpha => {
                let word = text(i);
                if let Some(m) = month_number(word) {
                    c.ymd.push(YmdValue::Month(m));
                } else if let Some(d) = weekday_number(word) {
                    c.weekday = Some(d);
                } else if let Some(pm) = is_pm(word) {
                    if c.hour.map(|h| h <= 12).unwrap_or(false) {
                        apply_ampm(&mut c, pm);
                    }
                } else if c.hour.is_some() && matches!(word, "utc" | "gmt" | "z") {
                    c.utc = true;
                }
                // Demais palavras são ignoradas (modo difuso).
            }
            LexKind::Other => {}
        }
        i += 1;
    }
    c
}

fn apply_ampm(c: &mut Collected, pm: bool) {
    if let Some(hour) = c.hour {
        if hour <= 12 {
            c.hour = Some(match (pm, hour) {
                (true, h) if h < 12 => h + 12,
                (false, 12) => 0,
                (_, h) => h,
            });
        }
    }
}

fn convert_year(value: i64, digits: usize) -> i64 {
    if digits <= 2 && value < 100 {
        if value < 50 {
            2000 + value
        } else {
            1900 + value
        }
    } else {
        value
    }
}

/// Resolve a lista de valores em (ano, mês, dia).
fn resolve_ymd(values: &[YmdValue]) -> Result<(Option<i64>, Option<i64>, Option<i64>), NotParsedReason> {
    if values.len() > 3 {
        return Err(NotParsedReason::TooManyValues);
    }
    let mut month: Option<i64> = None;
    let mut year: Option<i64> = None;
    let mut plain: Vec<(i64, usize)> = Vec::new();
    let mut year_first = false;

    for (pos, value) in values.iter().enumerate() {
        match *value {
            YmdValue::Month(m) if month.is_none() => month = Some(m as i64),
            YmdValue::Month(_) => return Err(NotParsedReason::TooManyValues),
            YmdValue::Year { value, digits } if year.is_none() => {
                year = Some(convert_year(value, digits));
                year_first = pos == 0;
            }
            YmdValue::Year { value, digits } | YmdValue::Plain { value, digits } => {
                plain.push((value, digits))
            }
        }
    }

    let mut day: Option<i64> = None;
    match (month.is_some(), year.is_some(), plain.as_slice()) {
        (_, _, []) => {}
        (true, true, [(d, _)]) => day = Some(*d),
        (true, false, [(v, digits)]) => {
            if *v > 31 {
                year = Some(convert_year(*v, *digits));
            } else {
                day = Some(*v);
            }
        }
        (true, false, [(a, ad), (b, bd)]) => {
            if *a > 31 {
                year = Some(convert_year(*a, *ad));
                day = Some(*b);
            } else {
                day = Some(*a);
                year = Some(convert_year(*b, *bd));
            }
        }
        (false, true, [(v, _)]) => month = Some(*v),
        (false, true, [(a, _), (b, _)]) => {
            if year_first || *a <= 12 {
                month = Some(*a);
                day = Some(*b);
            } else {
                day = Some(*a);
                month = Some(*b);
            }
        }
        (false, false, [(v, digits)]) => {
            if *v > 31 {
                year = Some(convert_year(*v, *digits));
            } else {
                day = Some(*v);
            }
        }
        (false, false, [(a, ad), (b, bd)]) => {
            if *a > 31 {
                year = Some(convert_year(*a, *ad));
                month = Some(*b);
            } else if *b > 31 {
                month = Some(*a);
                year = Some(convert_year(*b, *bd));
            } else if *a > 12 {
                day = Some(*a);
                month = Some(*b);
            } else {
                month = Some(*a);
                day = Some(*b);
            }
        }
        (false, false, [(a, ad), (b, _), (c, cd)]) => {
            if *a > 31 {
                year = Some(convert_year(*a, *ad));
                month = Some(*b);
                day = Some(*c);
            } else if *a > 12 {
                day = Some(*a);
                month = Some(*b);
                year = Some(convert_year(*c, *cd));
            } else {
                month = Some(*a);
                day = Some(*b);
                year = Some(convert_year(*c, *cd));
            }
        }
        _ => return Err(NotParsedReason::TooManyValues),
    }
    Ok((year, month, day))
}

fn out_of_range(what: &str) -> NotParsedReason {
    NotParsedReason::OutOfRange(what.to_string())
}

/// Tenta interpretar o token como data/hora, ignorando fragmentos desconhecidos.
pub fn fuzzy_parse(token: &str) -> DateParse {
    let collected = collect(token);
    if collected.is_empty() {
        return DateParse::NotParsed(NotParsedReason::NoDateFields);
    }
    let (year, month, day) = match resolve_ymd(&collected.ymd) {
        Ok(resolved) => resolved,
        Err(reason) => return DateParse::NotParsed(reason),
    };

    let to_i32 = |v: i64| i32::try_from(v).ok();
    let to_u32 = |v: i64| u32::try_from(v).ok();
    let Some(y) = to_i32(year.unwrap_or(REFERENCE_YEAR as i64)).filter(|y| *y >= 1) else {
        return DateParse::NotParsed(out_of_range("year"));
    };
    let Some(m) = to_u32(month.unwrap_or(1)) else {
        return DateParse::NotParsed(out_of_range("month"));
    };
    let Some(d) = to_u32(day.unwrap_or(1)) else {
        return DateParse::NotParsed(out_of_range("day"));
    };
    if NaiveDate::from_ymd_opt(y, m, d).is_none() {
        return DateParse::NotParsed(out_of_range("date"));
    }
    if NaiveTime::from_hms_opt(
        collected.hour.unwrap_or(0),
        collected.minute.unwrap_or(0),
        collected.second.unwrap_or(0),
    )
    .is_none()
    {
        return DateParse::NotParsed(out_of_range("time"));
    }

    DateParse::Parsed(DateFields {
        year: year.map(|_| y),
        month: month.map(|_| m),
        day: day.map(|_| d),
        hour: collected.hour,
        minute: collected.minute,
        second: collected.second,
        weekday: collected.weekday,
        utc: collected.utc,
    })
}

/// Remove os tokens que o parser difuso reconhece como data ou hora.
pub fn suppress<S: AsRef<str>>(tokens: &[S]) -> Vec<String> {
    tokens
        .iter()
        .map(AsRef::as_ref)
        .filter(|token| !fuzzy_parse(token).is_parsed())
        .map(str::to_string)
        .collect()
}

/// Junta os tokens com um espaço simples: o "tidy text".
pub fn join_tidy<S: AsRef<str>>(tokens: &[S]) -> String {
    tokens
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(" ")
}
