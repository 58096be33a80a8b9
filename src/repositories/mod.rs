//! Typed query access per entity. Every function takes any SeaORM connection,
//! so the same query runs against the pool or inside a transaction.

pub mod courses;
pub mod enrollments;
pub mod students;
pub mod users;

/// Builds an `ILIKE` pattern matching `term` anywhere, with the wildcard
/// characters of the input escaped.
pub(crate) fn contains_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    for ch in term.trim().chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    format!("%{escaped}%")
}

#[cfg(test)]
mod tests {
    use super::contains_pattern;

    #[test]
    fn pattern_wraps_and_escapes() {
        assert_eq!(contains_pattern(" spring "), "%spring%");
        assert_eq!(contains_pattern("100%_done"), "%100\\%\\_done%");
    }
}
