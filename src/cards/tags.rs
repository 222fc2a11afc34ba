use std::sync::LazyLock;

use regex::Regex;

pub const MIN_TAGS: usize = 3;
pub const MAX_TAGS: usize = 8;
pub const CATCH_ALL_TAG: &str = "society news";

/// Closed topic list. Order here is the order tags appear on a card.
pub const CONTROLLED_TAGS: &[&str] = &[
    "analytical chemistry",
    "outreach",
    "education",
    "safety",
    "awards",
    "industry news",
    "conference",
    "obituary",
    "research",
    "career",
    "society news",
    "events",
    "community",
    "honors",
    "member spotlight",
    "environment",
    "student",
    "grant",
    "public policy",
    "history",
];

static OBITUARY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"obit|in memoriam|passed away|remembrance").unwrap());

#[derive(Clone, Copy)]
pub enum Matcher {
    Substring(&'static str),
    AnyOf(&'static [&'static str]),
    Pattern(&'static LazyLock<Regex>),
}

impl Matcher {
    /// `content` is already lowercased.
    fn matches(&self, content: &str) -> bool {
        match self {
            Matcher::Substring(s) => content.contains(s),
            Matcher::AnyOf(words) => words.iter().any(|w| content.contains(w)),
            Matcher::Pattern(re) => re.is_match(content),
        }
    }
}

#[derive(Clone, Copy)]
pub struct TagRule {
    pub tag: &'static str,
    pub matcher: Matcher,
}

static KEYWORD_RULES: [TagRule; 3] = [
    TagRule {
        tag: "education",
        matcher: Matcher::AnyOf(&["school", "student"]),
    },
    TagRule {
        tag: "awards",
        matcher: Matcher::AnyOf(&["award", "honor"]),
    },
    TagRule {
        tag: "obituary",
        matcher: Matcher::Pattern(&OBITUARY_RE),
    },
];

/// Vocabulary substring rules first, then keyword rules.
static TAG_RULES: LazyLock<Vec<TagRule>> = LazyLock::new(|| {
    CONTROLLED_TAGS
        .iter()
        .map(|&tag| TagRule {
            tag,
            matcher: Matcher::Substring(tag),
        })
        .chain(KEYWORD_RULES.iter().copied())
        .collect()
});

/// Deterministic tag list for an article: rule order decides tag order,
/// one catch-all is added when fewer than three rules fire.
pub fn extract_tags(title: &str, body: &str) -> Vec<String> {
    let content = format!("{} {}", title, body).to_lowercase();
    let mut tags: Vec<&str> = Vec::new();

    for rule in TAG_RULES.iter() {
        if !tags.contains(&rule.tag) && rule.matcher.matches(&content) {
            tags.push(rule.tag);
        }
    }

    if tags.len() < MIN_TAGS && !tags.contains(&CATCH_ALL_TAG) {
        tags.push(CATCH_ALL_TAG);
    }
    tags.truncate(MAX_TAGS);
    tags.into_iter().map(str::to_string).collect()
}
