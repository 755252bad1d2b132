//! Kotlin source extraction.
//!
//! Beyond named top-level declarations, a file with top-level functions or
//! properties compiles to a synthetic `<FileName>Kt` facade class, which is
//! what the scanner sees in the bytecode; the parser synthesizes the same
//! name so those types link back to their source. The package itself is
//! also emitted so package nodes can be matched.

use std::path::Path;

use tree_sitter::{Node, Parser};

use crate::errors::NormalizeError;
use crate::parsers::{FileMetadata, capitalize};

const TYPE_DECLARATIONS: [&str; 4] = [
    "class_declaration",
    "object_declaration",
    "interface_declaration",
    "annotation_class",
];

pub struct KotlinSourceParser {
    parser: Parser,
}

impl KotlinSourceParser {
    pub fn new() -> Result<Self, NormalizeError> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_kotlin_ng::LANGUAGE.into())
            .map_err(|e| NormalizeError::Grammar(e.to_string()))?;
        Ok(Self { parser })
    }

    /// Extracts package and type FQNs from one `.kt` file's bytes.
    pub fn file_metadata(
        &mut self,
        path: &str,
        content: &[u8],
    ) -> Result<FileMetadata, NormalizeError> {
        let tree = self.parser.parse(content, None).ok_or_else(|| NormalizeError::Parse {
            path: path.to_string(),
            reason: "grammar produced no tree".to_string(),
        })?;
        let root = tree.root_node();

        let mut package = String::new();
        let mut type_names = Vec::new();
        let mut has_top_level_members = false;

        let mut cursor = root.walk();
        for child in root.children(&mut cursor) {
            match child.kind() {
                "package_header" => {
                    if let Some(name) = package_name(child, content) {
                        package = name;
                    }
                }
                kind if TYPE_DECLARATIONS.contains(&kind) => {
                    if let Some(name) = declared_name(child, content) {
                        type_names.push(name);
                    }
                }
                "function_declaration" | "property_declaration" => {
                    has_top_level_members = true;
                }
                _ => {}
            }
        }

        let base_name = Path::new(path)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default();
        let fqns = assemble_fqns(&package, &type_names, has_top_level_members, base_name);

        Ok(FileMetadata {
            path: path.to_string(),
            package,
            fqns,
        })
    }
}

fn package_name(node: Node<'_>, content: &[u8]) -> Option<String> {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if matches!(child.kind(), "qualified_identifier" | "identifier") {
            return child.utf8_text(content).ok().map(str::to_owned);
        }
    }
    None
}

/// Declaration name: the `name` field where the grammar provides one,
/// otherwise the first identifier-like child.
fn declared_name(node: Node<'_>, content: &[u8]) -> Option<String> {
    if let Some(name) = node.child_by_field_name("name") {
        return name.utf8_text(content).ok().map(str::to_owned);
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if matches!(child.kind(), "type_identifier" | "identifier") {
            return child.utf8_text(content).ok().map(str::to_owned);
        }
    }
    None
}

/// Builds the FQN list, including the synthetic file facade and the
/// package itself.
pub fn assemble_fqns(
    package: &str,
    type_names: &[String],
    has_top_level_members: bool,
    file_base_name: &str,
) -> Vec<String> {
    let prefix = if package.is_empty() {
        String::new()
    } else {
        format!("{package}.")
    };

    let mut fqns: Vec<String> = type_names
        .iter()
        .map(|name| format!("{prefix}{name}"))
        .collect();

    if has_top_level_members {
        fqns.push(format!("{prefix}{}Kt", capitalize(file_base_name)));
    }

    if !package.is_empty() && !fqns.iter().any(|f| f == package) {
        fqns.push(package.to_string());
    }

    fqns
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn qualifies_types_and_adds_package() {
        let fqns = assemble_fqns("com.x", &names(&["Foo", "Bar"]), false, "foo");
        assert_eq!(fqns, vec!["com.x.Foo", "com.x.Bar", "com.x"]);
    }

    #[test]
    fn synthesizes_file_facade() {
        let fqns = assemble_fqns("com.x", &names(&[]), true, "stringUtils");
        assert_eq!(fqns, vec!["com.x.StringUtilsKt", "com.x"]);
    }

    #[test]
    fn default_package_facade() {
        let fqns = assemble_fqns("", &names(&[]), true, "main");
        assert_eq!(fqns, vec!["MainKt"]);
    }

    #[test]
    fn no_duplicate_package_entry() {
        let fqns = assemble_fqns("com.x", &names(&[]), false, "empty");
        assert_eq!(fqns, vec!["com.x"]);
    }
}
