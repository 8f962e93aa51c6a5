/// Deterministic ASCII slug: lowercase, runs of anything other than
/// `[a-z0-9]` collapse to a single `-`, no leading or trailing `-`.
///
/// `"India  v Australia"` → `"india-v-australia"`
pub fn slugify(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    let mut pending_dash = false;
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    out
}

/// Correlation key of an event page title: the slug of the part before the
/// first `" - "` (the exchange suffixes titles with the competition name).
pub fn correlation_key_for_title(title: &str) -> Option<String> {
    let base = title.split(" - ").next().unwrap_or("").trim();
    let key = slugify(base);
    if key.is_empty() {
        None
    } else {
        Some(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_basic() {
        assert_eq!(slugify("India v Australia"), "india-v-australia");
        assert_eq!(slugify("  Mumbai Indians   v  Chennai  "), "mumbai-indians-v-chennai");
        assert_eq!(slugify("St. Lucia Kings v Trinbago (W)"), "st-lucia-kings-v-trinbago-w");
        assert_eq!(slugify("Zürich v Bern"), "z-rich-v-bern");
        assert_eq!(slugify("---"), "");
    }

    #[test]
    fn test_slugify_is_stable() {
        let s = slugify("India v Australia");
        assert_eq!(slugify(&s), s);
    }

    #[test]
    fn test_correlation_key_strips_competition_suffix() {
        assert_eq!(
            correlation_key_for_title("India v Australia - ICC World Cup").as_deref(),
            Some("india-v-australia")
        );
        assert_eq!(
            correlation_key_for_title("India v Australia").as_deref(),
            Some("india-v-australia")
        );
        assert_eq!(correlation_key_for_title(" - Cup"), None);
    }
}
