use std::sync::LazyLock;

use nutype::nutype;
use regex::Regex;

// Lowercase ASCII words joined by single hyphens.
// Example: "rust-for-beginners" is valid; "Rust For Beginners" or "rust--101" are not.
pub const SLUG_REGEX: &str = r"^[a-z0-9]+(?:-[a-z0-9]+)*$";

pub const SLUG_MAX_LENGTH: usize = 200;

static SLUG_REGEX_COMPILED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(SLUG_REGEX).expect("SLUG_REGEX must be a valid regex"));

static NON_SLUG_SYMBOLS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("slug separator regex must be valid"));

/// URL-friendly course identifier derived from the course title.
#[nutype(
    sanitize(trim, lowercase),
    validate(not_empty, len_char_max = 200, regex = SLUG_REGEX_COMPILED),
    derive(
        Clone,
        Debug,
        Display,
        FromStr,
        AsRef,
        PartialEq,
        Eq,
        Hash,
        Serialize,
        Deserialize
    )
)]
pub struct Slug(String);

impl Slug {
    /// Derives a slug from a human readable title.
    ///
    /// Every run of characters outside `[a-z0-9]` collapses into one hyphen,
    /// leading and trailing hyphens are dropped and the result is capped at
    /// [`SLUG_MAX_LENGTH`] characters. A title without any ASCII letter or digit
    /// has no slug.
    pub fn from_title(title: &str) -> Result<Self, SlugError> {
        let lowered = title.to_lowercase();
        let hyphenated = NON_SLUG_SYMBOLS.replace_all(&lowered, "-");
        let capped: String = hyphenated
            .trim_matches('-')
            .chars()
            .take(SLUG_MAX_LENGTH)
            .collect();
        Slug::try_new(capped.trim_end_matches('-'))
    }
}
