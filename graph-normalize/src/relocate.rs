//! Root discovery for mis-scanned directory artifacts.
//!
//! The scanner labels the directory it was pointed at as the artifact, but
//! the true classpath roots may sit deeper (`src/main/java`, build output
//! folders, several of them at once). Given the classes directly contained
//! by the scanned directory, this module derives the set of true roots by
//! anchoring on fully-qualified names and cross-checking them against file
//! paths; the database rewrites live in the passes.

use crate::paths;

/// Outcome of validating one scanned `Directory:Artifact`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relocation {
    /// `fileName` of the scanned container.
    pub original: String,
    /// Absolute `fileName`s of the artifacts rooted under it after the
    /// pass (the container itself when its label was correct).
    pub promoted: Vec<String>,
    /// True when the container lost its Artifact label.
    pub demoted: bool,
}

/// Map of every validated container, in processing order. Later passes
/// consult it to rewrite containment and requirement edges.
#[derive(Debug, Default)]
pub struct RelocationMap {
    pub entries: Vec<Relocation>,
}

impl RelocationMap {
    pub fn push(&mut self, entry: Relocation) {
        self.entries.push(entry);
    }

    /// Containers that were demoted and received promotions beneath them.
    pub fn demoted_with_promotions(&self) -> impl Iterator<Item = &Relocation> {
        self.entries.iter().filter(|e| e.demoted && !e.promoted.is_empty())
    }

    /// All demoted container `fileName`s.
    pub fn demoted_roots(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|e| e.demoted)
            .map(|e| e.original.clone())
            .collect()
    }

    /// Roots promoted to new artifacts (excludes correctly-labeled keepers).
    pub fn promoted_artifacts(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|e| e.demoted)
            .flat_map(|e| e.promoted.iter().cloned())
            .collect()
    }
}

/// Derives the true artifact roots from `(fqn, fileName)` pairs of the
/// classes directly contained in a scanned directory.
///
/// Iteratively anchors on the longest unprocessed FQN: its package, in path
/// form, must be the tail of the file's directory; the root is that
/// directory with the tail stripped. Every class under a discovered root is
/// consumed. Anchors whose directory does not match their package are
/// dropped (mis-attributed classes cannot define a root).
///
/// Returned paths are relative to the scanned directory and sorted; the
/// root equal to the scanned directory itself comes back as `""`.
pub fn discover_artifact_roots(classes: &[(String, String)]) -> Vec<String> {
    let mut unprocessed: Vec<(&str, &str)> = classes
        .iter()
        .map(|(fqn, path)| (fqn.as_str(), path.as_str()))
        .collect();
    let mut roots: Vec<String> = Vec::new();

    while !unprocessed.is_empty() {
        // Longest FQN first: the deepest package pins the root most tightly.
        let mut anchor_idx = 0;
        for (i, (fqn, _)) in unprocessed.iter().enumerate().skip(1) {
            let (best, _) = unprocessed[anchor_idx];
            if fqn.len() > best.len() || (fqn.len() == best.len() && *fqn < best) {
                anchor_idx = i;
            }
        }
        let (anchor_fqn, anchor_path) = unprocessed[anchor_idx];

        let package_as_path = paths::fqn_to_relpath(paths::package_of(anchor_fqn));
        let anchor_dir = paths::parent_dir(anchor_path);

        let Some(root) = paths::strip_suffix_or_none(anchor_dir, &package_as_path) else {
            unprocessed.swap_remove(anchor_idx);
            continue;
        };
        let root = root.to_string();

        unprocessed.retain(|(_, path)| {
            !(*path == root || paths::starts_with_plus_slash(path, &root))
        });
        if !roots.contains(&root) {
            roots.push(root);
        }
    }

    roots.sort();
    roots
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classes(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(f, p)| (f.to_string(), p.to_string()))
            .collect()
    }

    // Scanned root /proj/src, classes actually rooted at /proj/src/main/java.
    #[test]
    fn mis_scanned_root_is_relocated() {
        let input = classes(&[
            ("com.x.Foo", "/main/java/com/x/Foo.java"),
            ("com.x.util.Bar", "/main/java/com/x/util/Bar.java"),
            ("com.x.Baz", "/main/java/com/x/Baz.java"),
        ]);
        assert_eq!(discover_artifact_roots(&input), vec!["/main/java"]);
    }

    // Single-segment package directly under the scanned root: the root
    // itself is the artifact (empty relative path).
    #[test]
    fn single_segment_package_keeps_root() {
        let input = classes(&[("a.B", "/a/B.java")]);
        assert_eq!(discover_artifact_roots(&input), vec![""]);
    }

    #[test]
    fn multiple_source_roots() {
        let input = classes(&[
            ("com.x.Foo", "/main/java/com/x/Foo.java"),
            ("com.x.FooTest", "/test/java/com/x/FooTest.java"),
        ]);
        assert_eq!(
            discover_artifact_roots(&input),
            vec!["/main/java", "/test/java"]
        );
    }

    // A class whose directory does not end with its package path cannot
    // anchor a root and is dropped.
    #[test]
    fn mismatched_anchor_is_skipped() {
        let input = classes(&[
            ("com.x.deep.pkg.Foo", "/elsewhere/Foo.java"),
            ("com.x.Bar", "/main/java/com/x/Bar.java"),
        ]);
        assert_eq!(discover_artifact_roots(&input), vec!["/main/java"]);
    }

    #[test]
    fn default_package_class_consumes_everything_below() {
        let input = classes(&[
            ("Top", "/out/Top.java"),
            ("p.Nested", "/out/p/Nested.java"),
        ]);
        // "p.Nested" is the longer FQN and anchors /out first; "Top" then
        // falls inside it.
        assert_eq!(discover_artifact_roots(&input), vec!["/out"]);
    }
}
