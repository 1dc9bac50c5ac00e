//! Tweets de demonstração para a interface web e para os testes.
//!
//! Cada par é (categoria, texto). Os textos cobrem os casos que o pipeline
//! trata de forma especial: emoji, emoticons, URLs, hashtags, datas, markup
//! e mojibake.

/// Retorna os textos de demonstração (categoria, tweet).
pub fn demo_texts() -> Vec<(&'static str, &'static str)> {
    vec![
        (
            "Básico",
            "OMG 😊 check http://t.co/xyz #great on 2020-01-01, it's amazing!!!",
        ),
        (
            "Humanidades",
            "The humanities matter more than ever. Funding from the National Endowment for the Humanities was cut by 15% last year #WE1S_v2",
        ),
        (
            "Emoticons",
            ":) :-( <3 ;) 👍🏽 🇧🇷",
        ),
        (
            "Markup",
            "<b>Breaking</b>: students &amp; faculty rally at UC Santa Barbara pic.twitter.com/AbC123",
        ),
        (
            "Mojibake",
            "CafÃ© culture in Paris â€” the professorsâ€™ strike continues",
        ),
        (
            "Datas",
            "Deadline is Friday March 3rd at 10:30am, costs $20 or 2 hours of work. See you 12/25/19!",
        ),
        (
            "Entidades",
            "Dr. Jane Smith from Harvard told NASA that New York needs more English majors",
        ),
        (
            "Misto",
            "Why study literature??? covid19 changed everything... #STEM vs #humanities @user https://example.com/a/b",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_texts_are_non_empty() {
        let texts = demo_texts();
        assert!(texts.len() >= 5);
        assert!(texts.iter().all(|(category, text)| !category.is_empty() && !text.is_empty()));
    }
}
