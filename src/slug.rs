//! Slug and SKU derivation for catalog records.

/// Lowercase, drop anything that is not a word character, space, or hyphen,
/// then collapse runs of spaces/hyphens into one hyphen.
pub fn slugify(value: &str) -> String {
    let cleaned: String = value
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-' || c.is_whitespace())
        .collect();

    let mut slug = String::with_capacity(cleaned.len());
    let mut pending_sep = false;
    for c in cleaned.trim().chars() {
        if c == '-' || c.is_whitespace() {
            pending_sep = true;
            continue;
        }
        if pending_sep && !slug.is_empty() {
            slug.push('-');
        }
        pending_sep = false;
        slug.push(c);
    }
    slug.trim_matches(|c| c == '-' || c == '_').to_string()
}

/// `CAT-NAM-SIZE` built from the first three characters of the category and
/// product names.
pub fn build_sku(category_name: &str, product_name: &str, size: i32) -> String {
    let prefix = |s: &str| s.chars().take(3).collect::<String>().to_uppercase();
    let base = format!("{}-{}-{}", prefix(category_name), prefix(product_name), size);
    slugify(&base).to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_collapses_separators_and_strips_punctuation() {
        assert_eq!(slugify("Eau de Parfum"), "eau-de-parfum");
        assert_eq!(slugify("  Oud & Rose -- Intense!  "), "oud-rose-intense");
        assert_eq!(slugify("No. 5"), "no-5");
        assert_eq!(slugify("snake_case_name"), "snake_case_name");
        assert_eq!(slugify("---"), "");
    }

    #[test]
    fn sku_uses_category_name_and_size() {
        assert_eq!(build_sku("Floral", "Midnight Bloom", 50), "FLO-MID-50");
        assert_eq!(build_sku("Oud", "Al", 100), "OUD-AL-100");
        assert_eq!(build_sku("Woody", "N° 9 Noir", 75), "WOO-N-75");
    }
}
