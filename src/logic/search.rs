/// Case-insensitive substring match of `needle` against any of `haystack`.
/// An empty needle matches everything.
pub fn matches_search<I, S>(needle: &str, haystack: I) -> bool
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let needle = needle.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    haystack
        .into_iter()
        .any(|field| field.as_ref().to_lowercase().contains(&needle))
}
