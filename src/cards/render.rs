use std::fmt::Write;

use super::Card;
use crate::error::Result;

pub fn render_json(card: &Card) -> Result<String> {
    Ok(serde_json::to_string_pretty(card)?)
}

pub fn render_markdown(card: &Card) -> String {
    let mut out = String::new();
    let date = match (card.year, card.month.as_deref()) {
        (Some(y), Some(m)) => format!("{}, {}", y, m),
        (Some(y), None) => y.to_string(),
        (None, Some(m)) => format!("undated, {}", m),
        (None, None) => "undated".to_string(),
    };

    let _ = writeln!(out, "# {}\n", card.title);
    let _ = writeln!(out, "> Published in: **{}** ({})\n", card.issue_label, date);
    let _ = writeln!(out, "**Source:** [{0}]({0})\n", card.source_url);
    out.push_str("## Summary\n");
    for point in &card.summary {
        let _ = writeln!(out, "- {}", point.trim());
    }
    let _ = writeln!(out, "\n**Tags:** {}", card.tags.join(", "));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card() -> Card {
        Card {
            title: "Annual Awards Banquet".into(),
            summary: vec!["First point".into(), " Second point ".into(), "Third point".into()],
            tags: vec!["awards".into(), "education".into(), "student".into()],
            issue_label: "March 2023".into(),
            year: Some(2023),
            month: Some("March".into()),
            source_url: "https://x.org/a.pdf".into(),
        }
    }

    #[test]
    fn markdown_layout() {
        let expected = "# Annual Awards Banquet\n\
                        \n\
                        > Published in: **March 2023** (2023, March)\n\
                        \n\
                        **Source:** [https://x.org/a.pdf](https://x.org/a.pdf)\n\
                        \n\
                        ## Summary\n\
                        - First point\n\
                        - Second point\n\
                        - Third point\n\
                        \n\
                        **Tags:** awards, education, student\n";
        assert_eq!(render_markdown(&card()), expected);
    }

    #[test]
    fn undated_publication_line() {
        let c = Card { year: None, month: None, ..card() };
        assert!(render_markdown(&c).contains("(undated)"));
    }

    #[test]
    fn json_field_order() {
        let json = render_json(&card()).unwrap();
        let keys: Vec<usize> = ["\"title\"", "\"summary\"", "\"tags\"", "\"issue_label\"", "\"year\"", "\"month\"", "\"source_url\""]
            .iter()
            .map(|k| json.find(k).unwrap())
            .collect();
        assert!(keys.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn both_forms_carry_the_same_values() {
        let c = card();
        let parsed: Card = serde_json::from_str(&render_json(&c).unwrap()).unwrap();
        let md = render_markdown(&parsed);
        assert!(md.starts_with(&format!("# {}\n", c.title)));
        for point in &c.summary {
            assert!(md.contains(&format!("- {}\n", point.trim())));
        }
        assert!(md.contains(&c.tags.join(", ")));
    }
}
