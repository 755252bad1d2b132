//! Path and FQN arithmetic shared by the rewrite passes.
//!
//! All helpers are pure. Contained filesystem nodes carry a leading slash
//! on their relative `fileName` (scanner convention), so absolute paths are
//! plain string concatenation and "depth" means the number of
//! slash-separated segments the store's `split(path, '/')` would produce.

/// Number of `'/'`-separated segments, matching the store's `split` semantics.
///
/// `"/a/b"` has depth 3 (leading empty segment included).
pub fn split_depth(path: &str) -> usize {
    path.split('/').count()
}

/// True when `a` lies strictly under directory `b`.
pub fn starts_with_plus_slash(a: &str, b: &str) -> bool {
    a.len() > b.len() + 1 && a.starts_with(b) && a.as_bytes()[b.len()] == b'/'
}

/// Dotted package to a slash-rooted relative path; the empty package maps
/// to the empty string.
pub fn fqn_to_relpath(fqn: &str) -> String {
    if fqn.is_empty() {
        String::new()
    } else {
        format!("/{}", fqn.replace('.', "/"))
    }
}

/// Slash-rooted relative path back to a dotted FQN.
pub fn relpath_to_fqn(relpath: &str) -> String {
    relpath.trim_start_matches('/').replace('/', ".")
}

/// Package part of an FQN: everything before the final dot, or the empty
/// string for an unqualified name.
pub fn package_of(fqn: &str) -> &str {
    match fqn.rfind('.') {
        Some(idx) => &fqn[..idx],
        None => "",
    }
}

/// Directory part of a slash path: everything before the final slash.
pub fn parent_dir(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[..idx],
        None => "",
    }
}

/// `dir` without the trailing `suffix`, or `None` when `dir` does not end
/// with it. An empty suffix strips nothing and always succeeds.
pub fn strip_suffix_or_none<'a>(dir: &'a str, suffix: &str) -> Option<&'a str> {
    if suffix.is_empty() {
        Some(dir)
    } else {
        dir.strip_suffix(suffix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depth_counts_segments() {
        assert_eq!(split_depth("/a/b"), 3);
        assert_eq!(split_depth("/a"), 2);
        assert_eq!(split_depth(""), 1);
    }

    #[test]
    fn under_directory() {
        assert!(starts_with_plus_slash("/a/b/c", "/a/b"));
        assert!(!starts_with_plus_slash("/a/bc", "/a/b"));
        assert!(!starts_with_plus_slash("/a/b", "/a/b"));
    }

    #[test]
    fn fqn_relpath_round_trip() {
        assert_eq!(fqn_to_relpath("com.x.util"), "/com/x/util");
        assert_eq!(fqn_to_relpath(""), "");
        assert_eq!(relpath_to_fqn("/com/x/util"), "com.x.util");
    }

    #[test]
    fn package_and_parent() {
        assert_eq!(package_of("com.x.Foo"), "com.x");
        assert_eq!(package_of("Foo"), "");
        assert_eq!(parent_dir("/a/b/Foo.java"), "/a/b");
        assert_eq!(parent_dir("Foo.java"), "");
    }

    #[test]
    fn suffix_stripping() {
        assert_eq!(strip_suffix_or_none("/main/java/com/x", "/com/x"), Some("/main/java"));
        assert_eq!(strip_suffix_or_none("/main/java", "/com/x"), None);
        assert_eq!(strip_suffix_or_none("/main/java", ""), Some("/main/java"));
    }

    // For a class file in directory D with package P, stripping P's path
    // form off D recovers the artifact root.
    #[test]
    fn artifact_root_round_trip() {
        let fqn = "com.x.Foo";
        let file = "/main/java/com/x/Foo.java";
        let suffix = fqn_to_relpath(package_of(fqn));
        let dir = parent_dir(file);
        assert!(dir.ends_with(&suffix));
        assert_eq!(strip_suffix_or_none(dir, &suffix), Some("/main/java"));
    }
}
