/// Lowercase ASCII slug. Any run of characters that are not ASCII
/// alphanumerics becomes a single `-`; leading and trailing dashes are dropped.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_dash = false;
    for ch in input.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    if slug.is_empty() {
        "item".to_string()
    } else {
        slug
    }
}

/// First of `base`, `base-2`, `base-3`, ... not present in `taken`.
pub fn unique_slug<S: AsRef<str>>(base: &str, taken: &[S]) -> String {
    let is_taken = |candidate: &str| taken.iter().any(|t| t.as_ref() == candidate);
    if !is_taken(base) {
        return base.to_string();
    }
    (2..)
        .map(|n| format!("{base}-{n}"))
        .find(|candidate| !is_taken(candidate))
        .unwrap_or_else(|| base.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_separators() {
        assert_eq!(slugify("  Hello,   World!! "), "hello-world");
        assert_eq!(slugify("Café & Crème"), "caf-cr-me");
    }

    #[test]
    fn empty_input_falls_back() {
        assert_eq!(slugify("!!!"), "item");
    }

    #[test]
    fn same_name_same_slug() {
        for name in ["Cordless Drill 18V", "  a--b  ", "Ünïcode"] {
            assert_eq!(slugify(name), slugify(name));
            let slug = slugify(name);
            assert_eq!(slugify(&slug), slug);
        }
    }

    #[test]
    fn unique_slug_skips_taken_suffixes() {
        let mut taken: Vec<String> = Vec::new();
        for _ in 0..5 {
            let next = unique_slug("drill", &taken);
            assert!(!taken.contains(&next));
            taken.push(next);
        }
        assert_eq!(taken, ["drill", "drill-2", "drill-3", "drill-4", "drill-5"]);
        assert_eq!(unique_slug("saw", &taken), "saw");
    }
}
