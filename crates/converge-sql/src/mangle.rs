/// Postgres truncates identifiers longer than this many bytes.
pub const PG_IDENT_MAX: usize = 63;

const FORBIDDEN_PREFIXES: &[&str] = &["pg"];

// Reserved for the names we derive ourselves.
const FORBIDDEN_SUFFIXES: &[&str] = &["id", "pk", "uk", "fk", "chk", "enum"];

/// Generate a SQL name from fragments and an optional suffix.
///
/// Fragments are joined with the shortest run of underscores that does not
/// occur in any fragment, and the suffix is appended with the same separator.
/// Names that are too long, or that could collide with a derived name
/// (reserved `pg` prefix, or a reserved suffix when no suffix is given), get
/// a short hash of the stem appended; overlong names are also cut in the
/// middle so the result always fits in [`PG_IDENT_MAX`] characters.
///
/// ```
/// use converge_sql::mangle;
/// assert_eq!(mangle(&["individual"], None), "individual");
/// assert_eq!(mangle(&["individual"], Some("uk")), "individual_uk");
/// assert_eq!(mangle(&["order", "line_item"], Some("fk")), "order__line_item__fk");
/// ```
pub fn mangle<T: AsRef<str>>(fragments: &[T], suffix: Option<&str>) -> String {
    mangle_with_limit(fragments, suffix, PG_IDENT_MAX)
}

/// Like [`mangle`], with an explicit length limit.
pub fn mangle_with_limit<T: AsRef<str>>(
    fragments: &[T],
    suffix: Option<&str>,
    max_length: usize,
) -> String {
    let fragments: Vec<&str> = fragments.iter().map(|f| f.as_ref()).collect();

    let mut separator = String::from("_");
    while fragments.iter().any(|f| f.contains(separator.as_str())) {
        separator.push('_');
    }

    let stem = fragments.join(&separator);
    let mut text = stem.clone();
    if let Some(suffix) = suffix {
        text.push_str(&separator);
        text.push_str(suffix);
    }

    let is_forbidden = FORBIDDEN_PREFIXES
        .iter()
        .any(|p| stem == *p || stem.starts_with(&format!("{p}_")))
        || (suffix.is_none()
            && FORBIDDEN_SUFFIXES
                .iter()
                .any(|s| stem == *s || stem.ends_with(&format!("_{s}"))));

    let length = text.chars().count();
    if !is_forbidden && length <= max_length {
        return text;
    }

    let hex = blake3::hash(stem.as_bytes()).to_hex().to_string();
    let digest = format!("{}{}", separator, &hex[..6]);
    let digest_length = digest.chars().count();

    if length + digest_length > max_length {
        let chars: Vec<char> = text.chars().collect();
        let cut_start = (max_length / 4).min(chars.len());
        let cut_end = (cut_start + digest_length + separator.len() + length - max_length)
            .min(chars.len());
        let head: String = chars[..cut_start].iter().collect();
        let tail: String = chars[cut_end..].iter().collect();
        text = format!("{head}{separator}{tail}");
    }
    text.push_str(&digest);
    text
}
