use path::Index;

/// Renders `index` as a tar entry name: `/`-joined components, the root
/// encoded as `.`, with a trailing `/` appended when `is_dir`.
///
/// Matches the newer `src/diffdir.py` copy's `get_index_from_tarinfo`
/// convention (root `"."`), preferred per the engine's design notes over
/// the older copy's differing behavior.
#[must_use]
pub fn index_to_tar_name(index: &Index, is_dir: bool) -> String {
    let mut name = if index.is_root() {
        ".".to_string()
    } else {
        index
            .components()
            .iter()
            .map(|c| c.to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    };
    if is_dir && !name.ends_with('/') {
        name.push('/');
    }
    name
}

/// Parses a tar entry name back into an [`Index`], tolerating a trailing
/// `/` on directory names and the root spellings `.` and `./`.
#[must_use]
pub fn tar_name_to_index(name: &str) -> Index {
    let trimmed = name.trim_end_matches('/');
    if trimmed.is_empty() || trimmed == "." {
        return Index::root();
    }
    Index::from_components(trimmed.split('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_encodes_as_dot() {
        assert_eq!(index_to_tar_name(&Index::root(), false), ".");
        assert_eq!(index_to_tar_name(&Index::root(), true), "./");
    }

    #[test]
    fn nested_index_is_slash_joined() {
        let idx = Index::root().join("a").join("b");
        assert_eq!(index_to_tar_name(&idx, false), "a/b");
        assert_eq!(index_to_tar_name(&idx, true), "a/b/");
    }

    #[test]
    fn parsing_tolerates_trailing_slash_and_root_spellings() {
        assert_eq!(tar_name_to_index("."), Index::root());
        assert_eq!(tar_name_to_index("./"), Index::root());
        assert_eq!(tar_name_to_index("a/b"), Index::root().join("a").join("b"));
        assert_eq!(tar_name_to_index("a/b/"), Index::root().join("a").join("b"));
    }

    #[test]
    fn round_trip_preserves_index() {
        let idx = Index::root().join("x").join("y").join("z");
        let name = index_to_tar_name(&idx, false);
        assert_eq!(tar_name_to_index(&name), idx);
    }
}
