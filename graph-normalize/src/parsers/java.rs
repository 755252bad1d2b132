//! Java source extraction.
//!
//! Collects the package declaration and every top-level type declaration.
//! Module declarations keep their raw (unqualified) name; `package-info`
//! files additionally contribute the package itself, so package-level
//! documentation nodes can be linked.

use std::path::Path;

use tree_sitter::{Node, Parser};

use crate::errors::NormalizeError;
use crate::parsers::FileMetadata;

const TYPE_DECLARATIONS: [&str; 5] = [
    "class_declaration",
    "interface_declaration",
    "enum_declaration",
    "annotation_type_declaration",
    "record_declaration",
];

/// One top-level declaration: simple name plus whether the package prefix
/// applies (module names stay unqualified).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub name: String,
    pub qualified: bool,
}

pub struct JavaSourceParser {
    parser: Parser,
}

impl JavaSourceParser {
    pub fn new() -> Result<Self, NormalizeError> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_java::LANGUAGE.into())
            .map_err(|e| NormalizeError::Grammar(e.to_string()))?;
        Ok(Self { parser })
    }

    /// Extracts package and type FQNs from one `.java` file's bytes.
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
        let mut declarations = Vec::new();

        let mut cursor = root.walk();
        for child in root.children(&mut cursor) {
            match child.kind() {
                "package_declaration" => {
                    if let Some(name) = package_name(child, content) {
                        package = name;
                    }
                }
                "module_declaration" => {
                    if let Some(name) = field_text(child, "name", content) {
                        declarations.push(Declaration { name, qualified: false });
                    }
                }
                kind if TYPE_DECLARATIONS.contains(&kind) => {
                    if let Some(name) = field_text(child, "name", content) {
                        declarations.push(Declaration { name, qualified: true });
                    }
                }
                _ => {}
            }
        }

        let is_package_info = Path::new(path)
            .file_name()
            .is_some_and(|f| f == "package-info.java");
        let fqns = assemble_fqns(&package, &declarations, is_package_info);

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
        if matches!(child.kind(), "scoped_identifier" | "identifier") {
            return child.utf8_text(content).ok().map(str::to_owned);
        }
    }
    None
}

fn field_text(node: Node<'_>, field: &str, content: &[u8]) -> Option<String> {
    node.child_by_field_name(field)
        .and_then(|n| n.utf8_text(content).ok())
        .map(str::to_owned)
}

/// Builds the FQN list from extracted declarations.
pub fn assemble_fqns(
    package: &str,
    declarations: &[Declaration],
    is_package_info: bool,
) -> Vec<String> {
    let prefix = if package.is_empty() {
        String::new()
    } else {
        format!("{package}.")
    };

    let mut fqns: Vec<String> = declarations
        .iter()
        .map(|d| {
            if d.qualified {
                format!("{prefix}{}", d.name)
            } else {
                d.name.clone()
            }
        })
        .collect();

    if is_package_info && !package.is_empty() && !fqns.iter().any(|f| f == package) {
        fqns.push(package.to_string());
    }

    fqns
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decl(name: &str, qualified: bool) -> Declaration {
        Declaration { name: name.to_string(), qualified }
    }

    #[test]
    fn qualifies_with_package() {
        let fqns = assemble_fqns("com.x", &[decl("Foo", true), decl("Bar", true)], false);
        assert_eq!(fqns, vec!["com.x.Foo", "com.x.Bar"]);
    }

    #[test]
    fn module_names_stay_raw() {
        let fqns = assemble_fqns("com.x", &[decl("my.module", false)], false);
        assert_eq!(fqns, vec!["my.module"]);
    }

    #[test]
    fn package_info_adds_the_package() {
        let fqns = assemble_fqns("com.x", &[], true);
        assert_eq!(fqns, vec!["com.x"]);
    }

    #[test]
    fn default_package() {
        let fqns = assemble_fqns("", &[decl("Top", true)], false);
        assert_eq!(fqns, vec!["Top"]);
    }

    #[test]
    fn extracts_from_source() {
        let source = br#"
package com.x.util;

public class Helper {
    void run() {}
}

interface Callback {}
"#;
        let mut parser = JavaSourceParser::new().unwrap();
        let meta = parser.file_metadata("/p/Helper.java", source).unwrap();
        assert_eq!(meta.package, "com.x.util");
        assert_eq!(meta.fqns, vec!["com.x.util.Helper", "com.x.util.Callback"]);
    }

    #[test]
    fn extracts_record_and_enum() {
        let source = br#"
package com.x;

public record Point(int x, int y) {}
enum Color { RED, GREEN }
"#;
        let mut parser = JavaSourceParser::new().unwrap();
        let meta = parser.file_metadata("/p/Point.java", source).unwrap();
        assert_eq!(meta.fqns, vec!["com.x.Point", "com.x.Color"]);
    }
}
