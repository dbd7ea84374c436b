//! Naming conventions shared by the resolver and the class registry.
//!
//! Table names are snake case (`user_account`), class names are camel case
//! (`UserAccount`) and fully-qualified class names use `.` as the namespace
//! separator (`app.models.UserAccountTable`). Names coming from callers may
//! also use `::` or `\` as separators; [`strip_namespace`] accepts all three.

use convert_case::{Case, Casing};

/// Canonical namespace separator.
pub const SEPARATOR: char = '.';

/// Convert a snake case name to camel case.
///
/// Words are split on underscores and case changes, each word is
/// capitalized and the words are joined. Empty words are dropped.
///
/// One-letter words produce adjacent capitals (`a_b_c` becomes `ABC`), which
/// [`snake_case`] reads back as an acronym, so the pair only round-trips for
/// names whose words are at least two letters long.
///
/// # Examples
///
/// ```
/// use tablegate::naming::camel_case;
///
/// assert_eq!(camel_case("user_account"), "UserAccount");
/// assert_eq!(camel_case("UserAccount"), "UserAccount");
/// ```
pub fn camel_case(s: &str) -> String {
    s.to_case(Case::Pascal)
}

/// Convert a camel case name to snake case.
///
/// An underscore is inserted before every uppercase letter that is not
/// followed by another uppercase letter, so acronym runs stay together
/// (`HTMLParser` becomes `html_parser`). The result is lowercased.
///
/// This is the literal table naming rule rather than a word-boundary
/// conversion: it must reproduce table names exactly as drivers store them,
/// including the `ID` to `i_d` case that case-conversion crates normalize
/// away.
///
/// # Examples
///
/// ```
/// use tablegate::naming::snake_case;
///
/// assert_eq!(snake_case("UserAccount"), "user_account");
/// assert_eq!(snake_case("user_account"), "user_account");
/// ```
pub fn snake_case(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut out = String::with_capacity(s.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() {
            let next_is_upper = chars.get(i + 1).is_some_and(|n| n.is_uppercase());
            let after_separator = i == 0 || chars[i - 1] == '_';
            if !next_is_upper && !after_separator {
                out.push('_');
            }
        }
        out.extend(c.to_lowercase());
    }

    out
}

/// Strip any namespace qualifier and return the last segment.
///
/// ```
/// use tablegate::naming::strip_namespace;
///
/// assert_eq!(strip_namespace("app.models.UserAccount"), "UserAccount");
/// assert_eq!(strip_namespace("app::models::UserAccount"), "UserAccount");
/// assert_eq!(strip_namespace("UserAccount"), "UserAccount");
/// ```
pub fn strip_namespace(name: &str) -> &str {
    let start = [".", "::", "\\"]
        .iter()
        .filter_map(|sep| name.rfind(sep).map(|pos| pos + sep.len()))
        .max()
        .unwrap_or(0);
    &name[start..]
}

/// Return the namespace part of a qualified name, if any.
pub fn parent_namespace(path: &str) -> Option<&str> {
    path.rfind(SEPARATOR).map(|pos| &path[..pos])
}

/// Join a namespace and a name. An empty namespace yields the bare name.
pub fn qualify(namespace: &str, name: &str) -> String {
    if namespace.is_empty() {
        name.to_string()
    } else {
        format!("{namespace}{SEPARATOR}{name}")
    }
}

/// Iterate over `path` and each of its ancestor namespaces, most specific
/// first. `app.models.User` yields `app.models.User`, `app.models`, `app`.
pub fn lineage(path: &str) -> impl Iterator<Item = &str> {
    let first = if path.is_empty() { None } else { Some(path) };
    std::iter::successors(first, |&p| parent_namespace(p))
}
