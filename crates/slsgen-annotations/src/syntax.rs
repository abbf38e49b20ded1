//! Syntax nodes recovered from a source file.
//!
//! Only the shapes the extractor needs are modeled: decorator applications,
//! call chains, array literals, identifiers and property assignments.
//! Everything else is kept as raw [`Literal`] text.

use serde::Serialize;

/// An expression node.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
    Call(Call),
    Array(ArrayLiteral),
    Identifier(Identifier),
    Property(PropertyAssignment),
    Literal(Literal),
}

impl Node {
    /// The identifier name, if this node is a bare identifier.
    pub fn as_identifier(&self) -> Option<&str> {
        match self {
            Node::Identifier(ident) => Some(&ident.name),
            _ => None,
        }
    }

    /// The array literal, if this node is one.
    pub fn as_array(&self) -> Option<&ArrayLiteral> {
        match self {
            Node::Array(array) => Some(array),
            _ => None,
        }
    }
}

/// A call expression with optional fluent chain: `In("header").Name("x")`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Call {
    /// Callee path, possibly dotted (`PlatformServerless.bootstrap`).
    pub callee: String,
    pub arguments: Arguments,
    /// Calls chained onto the result, in source order. Chain segments never
    /// carry a chain of their own.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub chain: Vec<Call>,
}

impl Call {
    /// The last segment of the callee path.
    pub fn name(&self) -> &str {
        last_segment(&self.callee)
    }
}

/// The argument list of a call.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Arguments {
    /// Source text between the parentheses, trimmed.
    pub raw: String,
    pub items: Vec<Argument>,
}

/// One comma-separated argument.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Argument {
    /// Source text of the argument, trimmed.
    pub text: String,
    pub node: Node,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArrayLiteral {
    pub elements: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Identifier {
    /// Possibly dotted (`Foo.Bar`).
    pub name: String,
}

/// `key: value` inside an object literal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertyAssignment {
    pub key: String,
    pub value: Box<Node>,
}

/// Any expression the extractor does not model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Literal {
    pub text: String,
}

/// A decorator application (`@Expr`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Decorator {
    pub expression: Node,
    /// Full source text including the `@`.
    pub text: String,
}

impl Decorator {
    /// The decorator's name: the last segment of the identifier or callee.
    pub fn name(&self) -> Option<&str> {
        match &self.expression {
            Node::Identifier(ident) => Some(last_segment(&ident.name)),
            Node::Call(call) => Some(call.name()),
            _ => None,
        }
    }

    /// The call when the decorator is a direct application `@Name(...)`.
    ///
    /// Bare markers (`@Name`) and qualified callees (`@ns.Name(...)`)
    /// return `None`.
    pub fn application(&self) -> Option<&Call> {
        match &self.expression {
            Node::Call(call) if !call.callee.contains('.') => Some(call),
            _ => None,
        }
    }

    /// The first argument's text with quotes removed, if any.
    pub fn first_argument_unquoted(&self) -> Option<String> {
        match &self.expression {
            Node::Call(call) => call.arguments.items.first().map(|a| strip_quotes(&a.text)),
            _ => None,
        }
    }
}

/// A named import binding: `A` or `A as B`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamedImport {
    pub imported: String,
    pub local: String,
}

/// An `import ... from "specifier"` declaration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportDecl {
    /// Module specifier with quotes removed.
    pub specifier: String,
    pub named: Vec<NamedImport>,
}

/// A declared type annotation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeAnnotation {
    /// Source text of the type.
    pub text: String,
    /// Symbol name, when the type refers to a named declaration.
    pub symbol: Option<String>,
}

impl TypeAnnotation {
    /// The symbol name, falling back to the literal type text.
    pub fn resolved_name(&self) -> &str {
        self.symbol.as_deref().unwrap_or(&self.text)
    }
}

/// A method parameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterDecl {
    pub name: String,
    pub decorators: Vec<Decorator>,
    pub type_annotation: Option<TypeAnnotation>,
}

impl ParameterDecl {
    /// Declared type name; undeclared parameters are `any`.
    pub fn type_name(&self) -> &str {
        self.type_annotation
            .as_ref()
            .map(TypeAnnotation::resolved_name)
            .unwrap_or("any")
    }
}

/// A class method with a body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MethodDecl {
    pub name: String,
    pub is_static: bool,
    pub decorators: Vec<Decorator>,
    pub parameters: Vec<ParameterDecl>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassDecl {
    /// Empty for anonymous class expressions.
    pub name: String,
    pub decorators: Vec<Decorator>,
    pub methods: Vec<MethodDecl>,
}

impl ClassDecl {
    /// Non-static methods in declaration order.
    pub fn instance_methods(&self) -> impl Iterator<Item = &MethodDecl> {
        self.methods.iter().filter(|m| !m.is_static)
    }

    /// Look up an instance method by name.
    pub fn instance_method(&self, name: &str) -> Option<&MethodDecl> {
        self.instance_methods().find(|m| m.name == name)
    }

    /// First class-level decorator with the given name.
    pub fn decorator(&self, name: &str) -> Option<&Decorator> {
        self.decorators.iter().find(|d| d.name() == Some(name))
    }
}

/// Everything recovered from one source file.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SourceFile {
    pub imports: Vec<ImportDecl>,
    pub classes: Vec<ClassDecl>,
    /// Property assignments found outside class bodies, at any depth.
    pub properties: Vec<PropertyAssignment>,
}

impl SourceFile {
    /// Find the import that binds `local` as a named import.
    pub fn import_of(&self, local: &str) -> Option<&ImportDecl> {
        self.imports
            .iter()
            .find(|i| i.named.iter().any(|n| n.local == local))
    }
}

/// Remove every quote character (`'`, `"`, `` ` ``).
pub fn strip_quotes(text: &str) -> String {
    text.chars()
        .filter(|c| !matches!(c, '\'' | '"' | '`'))
        .collect()
}

fn last_segment(path: &str) -> &str {
    path.rsplit('.').next().unwrap_or(path)
}
