//! Go source indexer using tree-sitter.
//!
//! Extracts:
//! - The package clause
//! - Top-level interface declarations with typed method signatures
//! - Top-level constants with their literal values
//! - The import table, in source order

use std::path::Path;

use streaming_iterator::StreamingIterator;
use tree_sitter::{Language, Node, Parser, Query, QueryCursor};

use crate::analysis::{
    ConstValue, Declaration, Import, InterfaceElement, MethodSignature, Param, ParsedFile,
    SourceFacts, SourceIndexer, Span, TypeRef,
};
use crate::error::GenerateError;

/// Tree-sitter query for package declaration.
const PACKAGE_QUERY: &str = r#"
(package_clause
  (package_identifier) @package_name
)
"#;

/// Tree-sitter query for import specs, grouped or not.
const IMPORT_QUERY: &str = r#"
(import_spec
  name: (_)? @alias
  path: (_) @path
) @import
"#;

/// Go source indexer.
pub struct GoAnalyzer {
    language: Language,
}

impl GoAnalyzer {
    /// Create a new Go analyzer.
    pub fn new() -> Self {
        Self {
            language: tree_sitter_go::LANGUAGE.into(),
        }
    }

    /// Create a new parser for this thread.
    fn create_parser(&self) -> anyhow::Result<Parser> {
        let mut parser = Parser::new();
        parser.set_language(&self.language)?;
        Ok(parser)
    }

    /// Extract the package name from a parsed file.
    fn extract_package(&self, parsed: &ParsedFile) -> Option<String> {
        let query = Query::new(&self.language, PACKAGE_QUERY).ok()?;
        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(&query, parsed.tree.root_node(), &parsed.source[..]);

        if let Some(m) = matches.next() {
            for capture in m.captures {
                let name = query.capture_names()[capture.index as usize];
                if name == "package_name" {
                    return Some(parsed.node_text(capture.node).to_string());
                }
            }
        }
        None
    }

    /// Extract imports from a parsed file, keeping source order.
    fn extract_imports(&self, parsed: &ParsedFile) -> Result<Vec<Import>, GenerateError> {
        let query = Query::new(&self.language, IMPORT_QUERY).map_err(|e| GenerateError::Parse {
            path: parsed.path.clone(),
            span: Span::from_node(parsed.tree.root_node()),
            message: format!("invalid import query: {}", e),
        })?;
        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(&query, parsed.tree.root_node(), &parsed.source[..]);

        let mut imports = Vec::new();

        while let Some(m) = matches.next() {
            let mut path = None;
            let mut alias = None;
            let mut start_byte = 0;

            for capture in m.captures {
                let name = query.capture_names()[capture.index as usize];
                match name {
                    "path" => {
                        path = unquote(parsed.node_text(capture.node));
                    }
                    "alias" => {
                        alias = Some(parsed.node_text(capture.node).to_string());
                    }
                    "import" => {
                        start_byte = capture.node.start_byte();
                    }
                    _ => {}
                }
            }

            if let Some(path) = path {
                imports.push((start_byte, Import { path, alias }));
            }
        }

        // The extractor resolves against the *first* matching entry.
        imports.sort_by_key(|(start, _)| *start);

        Ok(imports.into_iter().map(|(_, import)| import).collect())
    }

    /// Extract top-level type and const declarations in source order.
    fn extract_declarations(&self, parsed: &ParsedFile) -> Vec<Declaration> {
        let root = parsed.tree.root_node();
        let mut declarations = Vec::new();

        for decl in root.named_children(&mut root.walk()) {
            match decl.kind() {
                "type_declaration" => {
                    for spec in decl.named_children(&mut decl.walk()) {
                        if let Some(d) = self.type_spec(parsed, spec) {
                            declarations.push(d);
                        }
                    }
                }
                "const_declaration" => {
                    for spec in decl.named_children(&mut decl.walk()) {
                        if spec.kind() == "const_spec" {
                            declarations.extend(self.const_spec(parsed, spec));
                        }
                    }
                }
                _ => {}
            }
        }

        tracing::debug!(
            path = %parsed.path,
            count = declarations.len(),
            "indexed top-level declarations"
        );

        declarations
    }

    /// Convert a `type_spec` or `type_alias` node.
    fn type_spec(&self, parsed: &ParsedFile, spec: Node) -> Option<Declaration> {
        if spec.kind() != "type_spec" && spec.kind() != "type_alias" {
            return None;
        }
        let name = parsed.node_text(spec.child_by_field_name("name")?).to_string();
        let span = Span::from_node(spec);

        match spec.child_by_field_name("type") {
            Some(ty) if spec.kind() == "type_spec" && ty.kind() == "interface_type" => {
                Some(Declaration::Interface {
                    name,
                    elements: self.interface_elements(parsed, ty),
                    span,
                })
            }
            _ => Some(Declaration::Type { name, span }),
        }
    }

    /// Convert the body of an `interface_type`.
    fn interface_elements(&self, parsed: &ParsedFile, iface: Node) -> Vec<InterfaceElement> {
        let mut elements = Vec::new();

        for elem in iface.named_children(&mut iface.walk()) {
            match elem.kind() {
                "comment" => continue,
                // `method_spec` in older grammar releases
                "method_elem" | "method_spec" => {
                    let name = elem
                        .child_by_field_name("name")
                        .map(|n| parsed.node_text(n).to_string())
                        .unwrap_or_default();
                    let params = elem
                        .child_by_field_name("parameters")
                        .map(|p| self.parameter_list(parsed, p))
                        .unwrap_or_default();
                    let results = match elem.child_by_field_name("result") {
                        Some(r) if r.kind() == "parameter_list" => self.parameter_list(parsed, r),
                        Some(r) => vec![Param {
                            name: None,
                            ty: self.type_ref(parsed, r),
                        }],
                        None => Vec::new(),
                    };
                    elements.push(InterfaceElement::Method(MethodSignature {
                        name,
                        params,
                        results,
                        span: Span::from_node(elem),
                    }));
                }
                _ => elements.push(InterfaceElement::Embedded {
                    text: parsed.node_text(elem).to_string(),
                    span: Span::from_node(elem),
                }),
            }
        }

        elements
    }

    /// Flatten a `parameter_list` into one entry per parameter.
    fn parameter_list(&self, parsed: &ParsedFile, list: Node) -> Vec<Param> {
        let mut params = Vec::new();

        for decl in list.named_children(&mut list.walk()) {
            if !matches!(
                decl.kind(),
                "parameter_declaration" | "variadic_parameter_declaration"
            ) {
                continue;
            }

            let ty = match decl.child_by_field_name("type") {
                Some(t) if decl.kind() == "variadic_parameter_declaration" => {
                    TypeRef::Other(format!("...{}", parsed.node_text(t)))
                }
                Some(t) => self.type_ref(parsed, t),
                None => continue,
            };

            // the field also yields the anonymous `,` separators
            let names: Vec<String> = decl
                .children_by_field_name("name", &mut decl.walk())
                .filter(|n| n.is_named())
                .map(|n| parsed.node_text(n).to_string())
                .collect();

            if names.is_empty() {
                params.push(Param { name: None, ty });
            } else {
                for name in names {
                    params.push(Param {
                        name: Some(name),
                        ty: ty.clone(),
                    });
                }
            }
        }

        params
    }

    /// Convert a type node into a [`TypeRef`].
    fn type_ref(&self, parsed: &ParsedFile, node: Node) -> TypeRef {
        match node.kind() {
            "type_identifier" => TypeRef::named(parsed.node_text(node)),
            "qualified_type" => {
                let package = node.child_by_field_name("package");
                let name = node.child_by_field_name("name");
                match (package, name) {
                    (Some(p), Some(n)) => {
                        TypeRef::qualified(parsed.node_text(p), parsed.node_text(n))
                    }
                    _ => TypeRef::Other(parsed.node_text(node).to_string()),
                }
            }
            "pointer_type" => match node.named_child(0) {
                Some(inner) => TypeRef::Pointer(Box::new(self.type_ref(parsed, inner))),
                None => TypeRef::Other(parsed.node_text(node).to_string()),
            },
            "parenthesized_type" => match node.named_child(0) {
                Some(inner) => self.type_ref(parsed, inner),
                None => TypeRef::Other(parsed.node_text(node).to_string()),
            },
            "generic_type" => {
                let base = node.child_by_field_name("type");
                let args = node.child_by_field_name("type_arguments");
                match (base, args) {
                    (Some(base), Some(args)) => TypeRef::Generic {
                        base: Box::new(self.type_ref(parsed, base)),
                        args: args
                            .named_children(&mut args.walk())
                            .filter(|a| a.kind() != "comment")
                            .map(|a| self.type_argument(parsed, a))
                            .collect(),
                    },
                    _ => TypeRef::Other(parsed.node_text(node).to_string()),
                }
            }
            _ => TypeRef::Other(parsed.node_text(node).to_string()),
        }
    }

    /// Type arguments are wrapped in `type_elem` by newer grammars.
    fn type_argument(&self, parsed: &ParsedFile, node: Node) -> TypeRef {
        if node.kind() != "type_elem" {
            return self.type_ref(parsed, node);
        }
        if node.named_child_count() == 1 {
            if let Some(inner) = node.named_child(0) {
                return self.type_ref(parsed, inner);
            }
        }
        TypeRef::Other(parsed.node_text(node).to_string())
    }

    /// Convert a `const_spec`, which may bind several names.
    fn const_spec(&self, parsed: &ParsedFile, spec: Node) -> Vec<Declaration> {
        let values: Vec<Node> = match spec.child_by_field_name("value") {
            Some(list) if list.kind() == "expression_list" => list
                .named_children(&mut list.walk())
                .filter(|n| n.kind() != "comment")
                .collect(),
            Some(single) => vec![single],
            None => Vec::new(),
        };

        spec.children_by_field_name("name", &mut spec.walk())
            .filter(|n| n.is_named())
            .enumerate()
            .map(|(i, name)| Declaration::Const {
                name: parsed.node_text(name).to_string(),
                value: values.get(i).map(|v| self.const_value(parsed, *v)),
                span: Span::from_node(spec),
            })
            .collect()
    }

    fn const_value(&self, parsed: &ParsedFile, node: Node) -> ConstValue {
        let text = parsed.node_text(node);
        match node.kind() {
            "interpreted_string_literal" | "raw_string_literal" => match unquote(text) {
                Some(s) => ConstValue::String(s),
                None => ConstValue::Other(text.to_string()),
            },
            _ => ConstValue::Other(text.to_string()),
        }
    }
}

impl Default for GoAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceIndexer for GoAnalyzer {
    fn language_id(&self) -> &'static str {
        "go"
    }

    fn parse(&self, path: &Path, source: &[u8]) -> anyhow::Result<ParsedFile> {
        let mut parser = self.create_parser()?;
        let tree = parser
            .parse(source, None)
            .ok_or_else(|| anyhow::anyhow!("failed to parse Go source: {}", path.display()))?;

        Ok(ParsedFile {
            tree,
            source: source.to_vec(),
            path: path.to_string_lossy().to_string(),
        })
    }

    fn index(&self, parsed: &ParsedFile) -> Result<SourceFacts, GenerateError> {
        if let Some(node) = first_error(parsed.tree.root_node()) {
            let message = if node.is_missing() {
                format!("syntax error: missing {}", node.kind())
            } else {
                let text: String = parsed.node_text(node).chars().take(40).collect();
                format!("syntax error near `{}`", text.trim())
            };
            return Err(GenerateError::Parse {
                path: parsed.path.clone(),
                span: Span::from_node(node),
                message,
            });
        }

        let package = self
            .extract_package(parsed)
            .ok_or_else(|| GenerateError::MissingPackage {
                path: parsed.path.clone(),
            })?;

        Ok(SourceFacts {
            path: parsed.path.clone(),
            package,
            declarations: self.extract_declarations(parsed),
            imports: self.extract_imports(parsed)?,
        })
    }
}

/// Find the first ERROR or MISSING node in document order.
fn first_error(node: Node) -> Option<Node> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if let Some(found) = first_error(child) {
            return Some(found);
        }
    }
    Some(node)
}

/// Strip the delimiters of a Go string literal and resolve simple escapes.
fn unquote(literal: &str) -> Option<String> {
    if literal.len() >= 2 && literal.starts_with('`') && literal.ends_with('`') {
        return Some(literal[1..literal.len() - 1].to_string());
    }
    if literal.len() < 2 || !literal.starts_with('"') || !literal.ends_with('"') {
        return None;
    }

    let inner = &literal[1..literal.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('\\') => out.push('\\'),
            Some('"') => out.push('"'),
            Some('\'') => out.push('\''),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    Some(out)
}
