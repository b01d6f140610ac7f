//! Text rendering utilities for human-friendly error messages.
//!
//! Provides helpers to format dependency chains, type names, callable
//! descriptions, and helpful suggestions in error output.

/// Renders a dependency chain as a readable string.
///
/// # Examples
/// ```
/// use graft_support::rendering::render_chain;
///
/// let chain = vec!["app::kernel", "app::storage", "app::kernel"];
/// let rendered = render_chain(&chain);
/// assert_eq!(rendered, "app::kernel → app::storage → app::kernel");
/// ```
pub fn render_chain(chain: &[impl AsRef<str>]) -> String {
    let mut out = String::new();
    for (position, frame) in chain.iter().enumerate() {
        if position > 0 {
            out.push_str(" → ");
        }
        out.push_str(frame.as_ref());
    }
    out
}

/// Shortens a qualified type name for display.
///
/// Keeps the last segment of every `::`-separated (or `\`-separated)
/// path component while preserving generic brackets, so nested type
/// parameters stay readable.
///
/// ```
/// use graft_support::rendering::shorten_type_name;
///
/// let short = shorten_type_name("graft::locator::ServiceLocator");
/// assert_eq!(short, "ServiceLocator");
///
/// let short = shorten_type_name("alloc::sync::Arc<dyn core::fmt::Debug>");
/// assert_eq!(short, "Arc<dyn Debug>");
///
/// let short = shorten_type_name(r"App\Repository\UserRepository");
/// assert_eq!(short, "UserRepository");
/// ```
pub fn shorten_type_name(full_name: &str) -> String {
    let bytes = full_name.as_bytes();
    let mut out = String::with_capacity(full_name.len());
    // Start of the path segment currently being scanned.
    let mut segment = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b':' if bytes.get(i + 1) == Some(&b':') => {
                i += 2;
                segment = i;
            }
            b'\\' => {
                i += 1;
                segment = i;
            }
            b'<' | b'>' | b',' | b' ' => {
                out.push_str(&full_name[segment..i]);
                out.push(bytes[i] as char);
                i += 1;
                segment = i;
            }
            _ => i += 1,
        }
    }

    out.push_str(&full_name[segment..]);
    out
}

/// Clips a rendered descriptor to at most `max_chars` characters.
///
/// Used when quoting arbitrary caller input (callable descriptions, raw
/// values) back in an error message, so a pathological input cannot
/// balloon the message. Cuts on a character boundary, no ellipsis.
pub fn clip(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => text[..byte_idx].to_string(),
        None => text.to_string(),
    }
}

/// Generates a "did you mean?" suggestion based on registered keys.
///
/// Compares the requested name against available keys and returns close
/// matches, best first. Ties keep the order of `available`.
pub fn suggest_similar(
    requested: &str,
    available: &[&str],
    max_suggestions: usize,
) -> Vec<String> {
    let wanted = requested.to_lowercase();
    let wanted_short = shorten_type_name(requested).to_lowercase();

    let mut scored: Vec<(usize, &str)> = Vec::new();
    for &candidate in available {
        if let Some(score) = similarity(&wanted, &wanted_short, candidate) {
            scored.push((score, candidate));
        }
    }

    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored
        .into_iter()
        .take(max_suggestions)
        .map(|(_, name)| name.to_string())
        .collect()
}

fn similarity(wanted: &str, wanted_short: &str, candidate: &str) -> Option<usize> {
    let name = candidate.to_lowercase();
    // Substring either way is the strongest signal.
    if name.contains(wanted) || wanted.contains(&name) {
        return Some(100);
    }

    let short = shorten_type_name(candidate).to_lowercase();
    if short.contains(wanted_short) || wanted_short.contains(&short) {
        return Some(80);
    }

    let shared = short
        .chars()
        .zip(wanted_short.chars())
        .take_while(|(a, b)| a == b)
        .count();
    (shared >= 3).then_some(shared * 10)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_frames_with_arrows() {
        let chain = vec!["app::kernel", "app::storage", "app::kernel"];
        assert_eq!(
            render_chain(&chain),
            "app::kernel → app::storage → app::kernel"
        );
    }

    #[test]
    fn single_frame_renders_bare() {
        assert_eq!(render_chain(&["app::kernel"]), "app::kernel");
    }

    #[test]
    fn empty_chain_renders_empty() {
        let chain: Vec<&str> = vec![];
        assert_eq!(render_chain(&chain), "");
    }

    #[test]
    fn shorten_keeps_last_path_segment() {
        assert_eq!(
            shorten_type_name("graft::locator::ServiceLocator"),
            "ServiceLocator"
        );
    }

    #[test]
    fn shorten_keeps_generic_shape() {
        assert_eq!(
            shorten_type_name("alloc::sync::Arc<dyn core::fmt::Debug>"),
            "Arc<dyn Debug>"
        );
    }

    #[test]
    fn shorten_handles_backslash_names() {
        assert_eq!(
            shorten_type_name(r"App\Repository\UserRepository"),
            "UserRepository"
        );
    }

    #[test]
    fn shorten_leaves_bare_names_alone() {
        assert_eq!(shorten_type_name("String"), "String");
    }

    #[test]
    fn clip_leaves_short_text_alone() {
        assert_eq!(clip("closure", 250), "closure");
    }

    #[test]
    fn clip_cuts_long_text() {
        let long = "x".repeat(400);
        assert_eq!(clip(&long, 250).chars().count(), 250);
    }

    #[test]
    fn clip_respects_char_boundaries() {
        let text = "αβγδε";
        assert_eq!(clip(text, 3), "αβγ");
    }

    #[test]
    fn suggestions_rank_close_keys_first() {
        let available = vec![
            "app::user_service",
            "app::user_repository",
            "app::logger",
            "app::postgres",
        ];

        let suggestions = suggest_similar("app::user_servise", &available, 3);
        assert_eq!(suggestions[0], "app::user_service");
        assert!(suggestions.contains(&"app::user_repository".to_string()));
    }

    #[test]
    fn suggestion_count_is_capped() {
        let available = vec!["app::dep_a", "app::dep_b", "app::dep_c"];
        assert_eq!(suggest_similar("app::dep", &available, 2).len(), 2);
    }

    #[test]
    fn unrelated_keys_yield_no_suggestions() {
        let available = vec!["app::postgres"];
        assert!(suggest_similar("zzz::nothing", &available, 3).is_empty());
    }
}
