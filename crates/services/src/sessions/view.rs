use quiz_core::model::OPTION_COUNT;

/// A question as shown to the player: text, options, and the current
/// selection. The correct option is deliberately absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibleQuestion<'a> {
    /// Index within the category, stable across pages.
    pub index: usize,
    pub text: &'a str,
    pub options: &'a [String; OPTION_COUNT],
    pub selected: Option<usize>,
}

/// Option label as printed next to each choice (`A`..`D`).
#[must_use]
pub fn option_label(option: usize) -> char {
    u8::try_from(option)
        .ok()
        .and_then(|o| b'A'.checked_add(o))
        .map_or('?', char::from)
}

/// Parse a label typed by the player: `A`-`D` (any case) or `1`-`4`.
#[must_use]
pub fn parse_option(raw: &str) -> Option<usize> {
    let raw = raw.trim();
    let mut chars = raw.chars();
    let c = chars.next()?;
    if chars.next().is_some() {
        return None;
    }
    let idx = match c.to_ascii_uppercase() {
        l @ 'A'..='Z' => (l as usize) - ('A' as usize),
        d @ '1'..='9' => (d as usize) - ('1' as usize),
        _ => return None,
    };
    (idx < OPTION_COUNT).then_some(idx)
}
