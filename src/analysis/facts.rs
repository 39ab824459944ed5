//! Fact structures extracted from a parsed Go source unit.

use std::fmt;

/// Source location span with byte offsets and line/column positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    /// Start byte offset (0-indexed).
    pub start_byte: usize,
    /// End byte offset (0-indexed, exclusive).
    pub end_byte: usize,
    /// Start line (1-indexed).
    pub start_line: usize,
    /// Start column (1-indexed).
    pub start_col: usize,
}

impl Span {
    /// Create a span from a tree-sitter node.
    pub fn from_node(node: tree_sitter::Node) -> Self {
        let start = node.start_position();
        Self {
            start_byte: node.start_byte(),
            end_byte: node.end_byte(),
            start_line: start.row + 1, // tree-sitter is 0-indexed
            start_col: start.column + 1,
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start_line, self.start_col)
    }
}

/// A Go type expression, reduced to the forms the extractor cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeRef {
    /// `name` or `qualifier.name`.
    Named {
        qualifier: Option<String>,
        name: String,
    },
    /// `*inner`
    Pointer(Box<TypeRef>),
    /// `base[args...]`
    Generic { base: Box<TypeRef>, args: Vec<TypeRef> },
    /// Anything else (slices, maps, funcs, channels...), kept as source text.
    Other(String),
}

impl TypeRef {
    /// Shorthand for an unqualified named type.
    pub fn named(name: &str) -> Self {
        TypeRef::Named {
            qualifier: None,
            name: name.to_string(),
        }
    }

    /// Shorthand for a package-qualified named type.
    pub fn qualified(qualifier: &str, name: &str) -> Self {
        TypeRef::Named {
            qualifier: Some(qualifier.to_string()),
            name: name.to_string(),
        }
    }

    /// Whether this is the predeclared `error` type.
    pub fn is_error(&self) -> bool {
        matches!(self, TypeRef::Named { qualifier: None, name } if name == "error")
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Named {
                qualifier: Some(q),
                name,
            } => write!(f, "{}.{}", q, name),
            TypeRef::Named {
                qualifier: None,
                name,
            } => write!(f, "{}", name),
            TypeRef::Pointer(inner) => write!(f, "*{}", inner),
            TypeRef::Generic { base, args } => {
                write!(f, "{}[", base)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, "]")
            }
            TypeRef::Other(text) => write!(f, "{}", text),
        }
    }
}

/// One parameter or result slot of a method signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    /// Parameter name, `None` for unnamed slots.
    pub name: Option<String>,
    pub ty: TypeRef,
}

/// A method declared inside an interface.
#[derive(Debug, Clone)]
pub struct MethodSignature {
    pub name: String,
    /// Parameters, one entry per name (`a, b int` yields two).
    pub params: Vec<Param>,
    /// Results, one entry per name or per unnamed type.
    pub results: Vec<Param>,
    pub span: Span,
}

/// An element of an interface body.
#[derive(Debug, Clone)]
pub enum InterfaceElement {
    Method(MethodSignature),
    /// An embedded interface or type-set constraint, kept as source text.
    Embedded { text: String, span: Span },
}

/// The value bound to a constant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstValue {
    /// A string literal, already unquoted.
    String(String),
    /// Any other expression, as source text.
    Other(String),
}

/// A top-level declaration.
#[derive(Debug, Clone)]
pub enum Declaration {
    Interface {
        name: String,
        elements: Vec<InterfaceElement>,
        span: Span,
    },
    Const {
        name: String,
        /// `None` when the name has no explicit value (iota continuation).
        value: Option<ConstValue>,
        span: Span,
    },
    /// Any other named top-level type (struct, alias, func type...).
    Type { name: String, span: Span },
}

impl Declaration {
    /// The declared name.
    pub fn name(&self) -> &str {
        match self {
            Declaration::Interface { name, .. }
            | Declaration::Const { name, .. }
            | Declaration::Type { name, .. } => name,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Declaration::Interface { span, .. }
            | Declaration::Const { span, .. }
            | Declaration::Type { span, .. } => *span,
        }
    }
}

/// An import table entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    /// The import path, unquoted.
    pub path: String,
    /// Optional alias (e.g., `import v1 "x/y/v1"` -> alias is "v1").
    pub alias: Option<String>,
}

/// All facts extracted from a single source unit.
#[derive(Debug, Clone)]
pub struct SourceFacts {
    /// Path label used in diagnostics ("STDIN" for standard input).
    pub path: String,
    /// Package name from the package clause.
    pub package: String,
    /// Top-level declarations in source order.
    pub declarations: Vec<Declaration>,
    /// Import table in source order.
    pub imports: Vec<Import>,
}

impl SourceFacts {
    /// Find a top-level constant by name.
    pub fn find_const(&self, name: &str) -> Option<&Declaration> {
        self.declarations
            .iter()
            .find(|d| matches!(d, Declaration::Const { .. }) && d.name() == name)
    }

    /// Iterate over interface declarations in source order.
    pub fn interfaces(&self) -> impl Iterator<Item = &Declaration> {
        self.declarations
            .iter()
            .filter(|d| matches!(d, Declaration::Interface { .. }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_ref_display() {
        let ty = TypeRef::Pointer(Box::new(TypeRef::Generic {
            base: Box::new(TypeRef::qualified("connect", "Request")),
            args: vec![TypeRef::qualified("v1", "PingRequest")],
        }));
        assert_eq!(ty.to_string(), "*connect.Request[v1.PingRequest]");

        let map = TypeRef::Generic {
            base: Box::new(TypeRef::named("Pair")),
            args: vec![TypeRef::named("int"), TypeRef::Other("[]byte".to_string())],
        };
        assert_eq!(map.to_string(), "Pair[int, []byte]");
    }

    #[test]
    fn test_is_error() {
        assert!(TypeRef::named("error").is_error());
        assert!(!TypeRef::qualified("errors", "error").is_error());
        assert!(!TypeRef::named("Error").is_error());
    }

    #[test]
    fn test_find_const() {
        let span = Span {
            start_byte: 0,
            end_byte: 1,
            start_line: 1,
            start_col: 1,
        };
        let facts = SourceFacts {
            path: "test.go".to_string(),
            package: "main".to_string(),
            declarations: vec![
                Declaration::Type {
                    name: "PingName".to_string(),
                    span,
                },
                Declaration::Const {
                    name: "PingName".to_string(),
                    value: Some(ConstValue::String("a.b.Ping".to_string())),
                    span,
                },
            ],
            imports: vec![],
        };

        match facts.find_const("PingName") {
            Some(Declaration::Const { value, .. }) => {
                assert_eq!(value, &Some(ConstValue::String("a.b.Ping".to_string())))
            }
            other => panic!("expected const, got {:?}", other),
        }
        assert!(facts.find_const("Missing").is_none());
    }
}
