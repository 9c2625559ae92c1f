//! Episode identity and category resolution.
//!
//! [`slugify`] is the system's primary identity function: a pure,
//! deterministic mapping from episode title to a filesystem-safe slug.
//! Two titles that normalize identically are treated as the same episode
//! on purpose — reworded duplicates of the same episode should not be
//! ingested twice.
//!
//! Category resolution piggybacks on the same stage: a fixed, ordered
//! keyword rule list matched case-insensitively against the title, first
//! match wins, with the source's configured category as the fallback.

use once_cell::sync::Lazy;

/// Slugs are truncated to this many characters.
const MAX_SLUG_LEN: usize = 80;

/// Ordered `(category, keywords)` rules. Order matters: the first rule
/// whose keyword appears in the lowercased title wins.
static CATEGORY_RULES: Lazy<Vec<(&'static str, Vec<&'static str>)>> = Lazy::new(|| {
    vec![
        (
            "Anthropic",
            vec!["anthropic", "claude", "dario amodei", "amanda askell", "chris olah"],
        ),
        (
            "OpenAI",
            vec![
                "openai", "chatgpt", "gpt-4", "gpt-5", "gpt4", "sam altman", "greg brockman",
                "ilya sutskever", "sora", "o1", "o3",
            ],
        ),
        (
            "Google DeepMind",
            vec![
                "google", "deepmind", "gemini", "jeff dean", "sundar pichai", "demis hassabis",
                "noam shazeer",
            ],
        ),
        ("Meta AI", vec!["meta ai", "llama", "mark zuckerberg", "yann lecun"]),
        ("xAI", vec!["xai", "grok", "elon musk"]),
        ("Microsoft", vec!["microsoft", "github copilot", "satya nadella", "copilot"]),
        ("NVIDIA", vec!["nvidia", "jensen huang", "cuda"]),
        ("Mistral", vec!["mistral"]),
        ("Cohere", vec!["cohere"]),
        ("Stability AI", vec!["stability ai", "stable diffusion"]),
    ]
});

/// Convert an episode title to its canonical slug.
///
/// Lowercases, strips everything that is not ASCII alphanumeric,
/// whitespace, underscore, or hyphen, collapses whitespace/underscore runs
/// to single hyphens, collapses hyphen runs, trims leading/trailing
/// hyphens, and truncates to 80 characters (trimming again so a cut never
/// leaves a trailing hyphen).
///
/// Output always matches `^[a-z0-9-]{0,80}$`.
pub fn slugify(title: &str) -> String {
    let mut kept = String::with_capacity(title.len());
    for c in title.to_lowercase().chars() {
        if c.is_ascii_alphanumeric() || c == '-' {
            kept.push(c);
        } else if c.is_whitespace() || c == '_' {
            kept.push(' ');
        }
        // everything else is stripped
    }

    let mut slug = String::with_capacity(kept.len());
    let mut prev_hyphen = false;
    for c in kept.chars() {
        let mapped = if c == ' ' || c == '_' { '-' } else { c };
        if mapped == '-' {
            if !prev_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            prev_hyphen = true;
        } else {
            slug.push(mapped);
            prev_hyphen = false;
        }
    }

    slug.truncate(MAX_SLUG_LEN);
    slug.trim_matches('-').to_string()
}

/// Resolve the category for an episode title.
///
/// When `lock` is set the keyword rules are skipped entirely and the
/// source's configured category is used verbatim. Otherwise the title is
/// matched against [`CATEGORY_RULES`] in order; no match falls back to
/// `default_category`.
pub fn detect_category(title: &str, default_category: &str, lock: bool) -> String {
    if lock {
        return default_category.to_string();
    }
    let lower = title.to_lowercase();
    for (category, keywords) in CATEGORY_RULES.iter() {
        if keywords.iter().any(|kw| lower.contains(kw)) {
            return (*category).to_string();
        }
    }
    default_category.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_basic() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("Test-Article!"), "test-article");
        assert_eq!(slugify("Multiple   Spaces"), "multiple-spaces");
        assert_eq!(slugify("snake_case_title"), "snake-case-title");
    }

    #[test]
    fn slugify_strips_punctuation_and_collapses_hyphens() {
        assert_eq!(slugify("Trump-Xi 'situationship'"), "trump-xi-situationship");
        assert_eq!(slugify("a --- b"), "a-b");
        assert_eq!(slugify("--edge--"), "edge");
    }

    #[test]
    fn slugify_is_deterministic_and_shape_bounded() {
        let title = "Ep. 42: The (Unreasonable) Effectiveness of RSS!";
        let a = slugify(title);
        let b = slugify(title);
        assert_eq!(a, b);
        assert!(a.len() <= 80);
        assert!(a.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'));
        assert!(!a.starts_with('-') && !a.ends_with('-'));
    }

    #[test]
    fn slugify_truncates_without_trailing_hyphen() {
        // 79 chars of 'a', then a hyphen boundary right at the cut point.
        let title = format!("{} {}", "a".repeat(79), "tail words here");
        let slug = slugify(&title);
        assert!(slug.len() <= 80);
        assert!(!slug.ends_with('-'));
    }

    #[test]
    fn slugify_drops_non_ascii() {
        // Titles made entirely of stripped characters produce an empty slug.
        assert_eq!(slugify("完全中文标题"), "");
        assert_eq!(slugify("Café — déjà vu"), "caf-dj-vu");
    }

    #[test]
    fn category_keyword_match_beats_default() {
        assert_eq!(
            detect_category("Why Claude thinks in circuits", "Other", false),
            "Anthropic"
        );
        assert_eq!(
            detect_category("Interview with Sam Altman", "Other", false),
            "OpenAI"
        );
    }

    #[test]
    fn category_first_rule_wins() {
        // "claude" (Anthropic) appears before "chatgpt" (OpenAI) in rule order.
        assert_eq!(
            detect_category("Claude vs ChatGPT: a comparison", "Other", false),
            "Anthropic"
        );
    }

    #[test]
    fn category_falls_back_to_default() {
        assert_eq!(
            detect_category("Gardening for beginners", "Hobbies", false),
            "Hobbies"
        );
    }

    #[test]
    fn category_lock_skips_matching_entirely() {
        assert_eq!(
            detect_category("Why Claude thinks in circuits", "Interviews", true),
            "Interviews"
        );
    }

    #[test]
    fn category_match_is_case_insensitive() {
        assert_eq!(detect_category("NVIDIA GTC keynote", "Other", false), "NVIDIA");
        assert_eq!(detect_category("nvidia gtc keynote", "Other", false), "NVIDIA");
    }
}
