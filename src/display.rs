//! Text shaping for hook output

const ELLIPSIS: &str = "...";

/// Shorten `text` to at most `max_chars` characters for fixed-width
/// displays such as stream overlays.
///
/// Counts `char`s, so multi-byte titles are never cut mid-character. When
/// shortened, the last three characters become `...`; limits below three
/// leave no room for that and just cut.
///
/// ```
/// use lasthook::display::fit_width;
///
/// assert_eq!(fit_width("Artist A - Song B", 20), "Artist A - Song B");
/// assert_eq!(fit_width("Artist A - Song B", 10), "Artist ...");
/// ```
#[must_use]
pub fn fit_width(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }

    match max_chars.checked_sub(ELLIPSIS.len()) {
        Some(keep) => text.chars().take(keep).chain(ELLIPSIS.chars()).collect(),
        None => text.chars().take(max_chars).collect(),
    }
}
