//! Tolerant parser over the token stream.
//!
//! Recovers imports, classes with their decorated methods and parameters,
//! and object-literal property assignments. Anything it does not model is
//! skipped by bracket matching, so unusual syntax degrades to missing nodes
//! rather than errors.

use crate::lexer::{tokenize, LexError, Token, TokenKind};
use crate::syntax::{
    Argument, Arguments, ArrayLiteral, Call, ClassDecl, Decorator, Identifier, ImportDecl,
    Literal, MethodDecl, NamedImport, Node, ParameterDecl, PropertyAssignment, SourceFile,
    TypeAnnotation, strip_quotes,
};

/// Words that may precede a class member name.
const MEMBER_MODIFIERS: &[&str] = &[
    "public",
    "private",
    "protected",
    "static",
    "readonly",
    "abstract",
    "async",
    "override",
    "declare",
    "accessor",
    "get",
    "set",
];

/// Words that may precede a parameter name.
const PARAMETER_MODIFIERS: &[&str] = &["public", "private", "protected", "readonly", "override"];

/// Words that may precede `class` in a declaration.
const CLASS_MODIFIERS: &[&str] = &["export", "default", "abstract", "declare"];

/// Type keywords that never name a declaration.
const NON_SYMBOL_TYPES: &[&str] = &[
    "string", "number", "boolean", "any", "unknown", "never", "void", "object", "symbol",
    "bigint", "undefined", "null", "this", "typeof", "keyof", "readonly", "unique", "infer",
    "true", "false",
];

/// Parse a TypeScript source file.
pub fn parse_source(src: &str) -> Result<SourceFile, LexError> {
    let tokens = tokenize(src)?;
    Ok(Parser::new(src, tokens).parse())
}

struct Parser<'a> {
    src: &'a str,
    tokens: Vec<Token>,
    /// Index of the matching bracket for every `(`, `[` and `{`.
    matching: Vec<Option<usize>>,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str, tokens: Vec<Token>) -> Self {
        let mut matching = vec![None; tokens.len()];
        let mut open: Vec<(usize, &str)> = Vec::new();
        for (i, token) in tokens.iter().enumerate() {
            if token.kind != TokenKind::Punct {
                continue;
            }
            let expected = match token.text(src) {
                "(" | "[" | "{" => {
                    open.push((i, token.text(src)));
                    continue;
                }
                ")" => "(",
                "]" => "[",
                "}" => "{",
                _ => continue,
            };
            if let Some(&(start, kind)) = open.last() {
                if kind == expected {
                    open.pop();
                    matching[start] = Some(i);
                    matching[i] = Some(start);
                }
            }
        }
        Self {
            src,
            tokens,
            matching,
        }
    }

    fn parse(&self) -> SourceFile {
        let mut file = SourceFile::default();
        let mut stack: Vec<&str> = Vec::new();
        let mut i = 0;

        while i < self.tokens.len() {
            let token = &self.tokens[i];
            let text = token.text(self.src);

            if token.kind == TokenKind::Punct {
                match text {
                    "(" | "[" | "{" => stack.push(text),
                    ")" | "]" | "}" => {
                        stack.pop();
                    }
                    "@" => {
                        let (decorators, next) = self.decorators(i);
                        if decorators.is_empty() {
                            i += 1;
                            continue;
                        }
                        self.collect_properties(i, next, &mut file.properties);
                        let after = self.skip_words(next, CLASS_MODIFIERS);
                        if self.is_class_keyword(after) {
                            let (class, end) = self.class(after, decorators);
                            file.classes.push(class);
                            i = end;
                        } else {
                            i = next;
                        }
                        continue;
                    }
                    _ => {}
                }
                i += 1;
                continue;
            }

            if stack.is_empty()
                && token.is_ident(self.src, "import")
                && !self.punct(i + 1, "(")
                && !self.punct(i + 1, ".")
            {
                let (import, next) = self.import(i);
                file.imports.extend(import);
                i = next;
                continue;
            }

            if self.is_class_keyword(i) {
                let (class, end) = self.class(i, Vec::new());
                file.classes.push(class);
                i = end;
                continue;
            }

            if stack.last() == Some(&"{") && self.is_property_key(i) {
                file.properties.push(self.property(i));
                // Keep scanning inside the value for nested assignments.
                i += 2;
                continue;
            }

            i += 1;
        }

        file
    }

    /// Property assignments inside a skipped range such as decorator arguments.
    fn collect_properties(&self, start: usize, end: usize, out: &mut Vec<PropertyAssignment>) {
        let mut stack: Vec<&str> = Vec::new();
        for i in start..end.min(self.tokens.len()) {
            let token = &self.tokens[i];
            if token.kind == TokenKind::Punct {
                match token.text(self.src) {
                    "(" => stack.push("("),
                    "[" => stack.push("["),
                    "{" => stack.push("{"),
                    ")" | "]" | "}" => {
                        stack.pop();
                    }
                    _ => {}
                }
            } else if stack.last() == Some(&"{") && self.is_property_key(i) {
                out.push(self.property(i));
            }
        }
    }

    fn property(&self, key: usize) -> PropertyAssignment {
        let end = self.value_end(key + 2);
        PropertyAssignment {
            key: strip_quotes(self.tokens[key].text(self.src)),
            value: Box::new(self.expression(key + 2, end)),
        }
    }

    // --- token helpers -------------------------------------------------

    fn punct(&self, i: usize, p: &str) -> bool {
        self.tokens.get(i).is_some_and(|t| t.is_punct(self.src, p))
    }

    fn word(&self, i: usize, name: &str) -> bool {
        self.tokens.get(i).is_some_and(|t| t.is_ident(self.src, name))
    }

    fn ident(&self, i: usize) -> Option<&'a str> {
        self.tokens
            .get(i)
            .filter(|t| t.kind == TokenKind::Ident)
            .map(|t| t.text(self.src))
    }

    fn string(&self, i: usize) -> Option<String> {
        self.tokens
            .get(i)
            .filter(|t| t.kind == TokenKind::Str)
            .map(|t| strip_quotes(t.text(self.src)))
    }

    fn is_open(&self, i: usize) -> bool {
        self.punct(i, "(") || self.punct(i, "[") || self.punct(i, "{")
    }

    /// Index of the bracket closing `open`; unbalanced input runs to the end.
    fn close(&self, open: usize) -> usize {
        self.matching
            .get(open)
            .copied()
            .flatten()
            .unwrap_or(self.tokens.len())
    }

    /// Source text covering tokens `start..end`.
    fn slice(&self, start: usize, end: usize) -> &'a str {
        let end = end.min(self.tokens.len());
        if start >= end {
            return "";
        }
        &self.src[self.tokens[start].start..self.tokens[end - 1].end]
    }

    fn skip_words(&self, mut i: usize, words: &[&str]) -> usize {
        while self.ident(i).is_some_and(|w| words.contains(&w)) {
            i += 1;
        }
        i
    }

    /// End of a dotted identifier path starting at `i`.
    fn path_end(&self, i: usize, end: usize) -> usize {
        let mut j = i + 1;
        while j + 1 < end && self.punct(j, ".") && self.ident(j + 1).is_some() {
            j += 2;
        }
        j
    }

    fn path_text(&self, start: usize, end: usize) -> String {
        (start..end)
            .step_by(2)
            .filter_map(|k| self.ident(k))
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Skip a `<...>` generic list at `i`, if present.
    fn skip_angles(&self, i: usize, end: usize) -> usize {
        if !self.punct(i, "<") {
            return i;
        }
        let mut depth = 0usize;
        let mut j = i;
        while j < end {
            if self.is_open(j) {
                j = self.close(j) + 1;
                continue;
            }
            if self.punct(j, "<") {
                depth += 1;
            } else if self.punct(j, ">") {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return j + 1;
                }
            }
            j += 1;
        }
        end
    }

    /// Split `start..end` at depth-zero commas, dropping empty segments.
    fn split_commas(&self, start: usize, end: usize, angles: bool) -> Vec<(usize, usize)> {
        let mut parts = Vec::new();
        let mut segment = start;
        let mut angle = 0usize;
        let mut j = start;
        while j < end {
            if self.is_open(j) {
                j = self.close(j) + 1;
                continue;
            }
            if angles && self.punct(j, "<") {
                angle += 1;
            } else if angles && self.punct(j, ">") {
                angle = angle.saturating_sub(1);
            } else if angle == 0 && self.punct(j, ",") {
                if segment < j {
                    parts.push((segment, j));
                }
                segment = j + 1;
            }
            j += 1;
        }
        if segment < end {
            parts.push((segment, end));
        }
        parts
    }

    // --- expressions ---------------------------------------------------

    fn is_property_key(&self, i: usize) -> bool {
        let Some(token) = self.tokens.get(i) else {
            return false;
        };
        matches!(token.kind, TokenKind::Ident | TokenKind::Str)
            && self.punct(i + 1, ":")
            && i > 0
            && (self.punct(i - 1, "{") || self.punct(i - 1, ","))
    }

    /// End of a property value: the next depth-zero delimiter.
    fn value_end(&self, start: usize) -> usize {
        let mut j = start;
        while j < self.tokens.len() {
            if self.is_open(j) {
                j = self.close(j) + 1;
                continue;
            }
            if [",", ";", ")", "]", "}"].iter().any(|p| self.punct(j, p)) {
                return j;
            }
            j += 1;
        }
        self.tokens.len()
    }

    fn expression(&self, start: usize, end: usize) -> Node {
        let end = end.min(self.tokens.len());
        if start >= end {
            return Node::Literal(Literal {
                text: String::new(),
            });
        }

        if self.punct(start, "[") && self.close(start) == end - 1 {
            let elements = self
                .split_commas(start + 1, end - 1, false)
                .into_iter()
                .map(|(s, e)| self.expression(s, e))
                .collect();
            return Node::Array(ArrayLiteral { elements });
        }

        if self.punct(start, "(") && self.close(start) == end - 1 {
            return self.expression(start + 1, end - 1);
        }

        if self.ident(start).is_some() {
            let path_end = self.path_end(start, end);
            let callee = self.path_text(start, path_end);
            if path_end == end {
                return Node::Identifier(Identifier { name: callee });
            }
            if self.punct(path_end, "(") {
                let close = self.close(path_end);
                let mut call = Call {
                    callee,
                    arguments: self.arguments(path_end, close),
                    chain: Vec::new(),
                };
                let mut j = close + 1;
                while j + 2 < end && self.punct(j, ".") && self.punct(j + 2, "(") {
                    let Some(name) = self.ident(j + 1) else {
                        break;
                    };
                    let segment_close = self.close(j + 2);
                    call.chain.push(Call {
                        callee: name.to_string(),
                        arguments: self.arguments(j + 2, segment_close),
                        chain: Vec::new(),
                    });
                    j = segment_close + 1;
                }
                if j == end {
                    return Node::Call(call);
                }
            }
        }

        Node::Literal(Literal {
            text: self.slice(start, end).to_string(),
        })
    }

    fn arguments(&self, open: usize, close: usize) -> Arguments {
        let close = close.min(self.tokens.len());
        let raw_start = self.tokens[open].end;
        let raw_end = self
            .tokens
            .get(close)
            .map(|t| t.start)
            .unwrap_or(self.src.len());
        let items = self
            .split_commas(open + 1, close, false)
            .into_iter()
            .map(|(s, e)| Argument {
                text: self.slice(s, e).trim().to_string(),
                node: self.expression(s, e),
            })
            .collect();
        Arguments {
            raw: self.src[raw_start..raw_end].trim().to_string(),
            items,
        }
    }

    // --- decorators ----------------------------------------------------

    fn decorators(&self, mut i: usize) -> (Vec<Decorator>, usize) {
        let mut decorators = Vec::new();
        while self.punct(i, "@") {
            match self.decorator(i) {
                Some((decorator, next)) => {
                    decorators.push(decorator);
                    i = next;
                }
                None => break,
            }
        }
        (decorators, i)
    }

    fn decorator(&self, at: usize) -> Option<(Decorator, usize)> {
        let start = at + 1;
        if self.punct(start, "(") {
            let close = self.close(start);
            let decorator = Decorator {
                expression: self.expression(start + 1, close),
                text: self.slice(at, close + 1).to_string(),
            };
            return Some((decorator, close + 1));
        }
        self.ident(start)?;

        let len = self.tokens.len();
        let mut end = self.path_end(start, len);
        if self.punct(end, "(") {
            end = self.close(end) + 1;
        }
        while self.punct(end, ".") && self.ident(end + 1).is_some() {
            end += 2;
            if self.punct(end, "(") {
                end = self.close(end) + 1;
            }
        }
        let decorator = Decorator {
            expression: self.expression(start, end),
            text: self.slice(at, end).to_string(),
        };
        Some((decorator, end))
    }

    // --- imports -------------------------------------------------------

    fn import(&self, at: usize) -> (Option<ImportDecl>, usize) {
        let mut j = at + 1;
        if self.word(j, "type") && !self.punct(j + 1, ",") && !self.word(j + 1, "from") {
            j += 1;
        }
        if let Some(specifier) = self.string(j) {
            let import = ImportDecl {
                specifier,
                named: Vec::new(),
            };
            return (Some(import), j + 1);
        }

        // default binding
        if self.ident(j).is_some() && !self.word(j, "from") {
            j += 1;
            if self.punct(j, ",") {
                j += 1;
            }
        }
        // namespace binding
        if self.punct(j, "*") {
            j += 3;
        }

        let mut named = Vec::new();
        if self.punct(j, "{") {
            let close = self.close(j);
            for (s, e) in self.split_commas(j + 1, close, false) {
                let mut k = s;
                if self.word(k, "type") && e - k > 1 && !self.word(k + 1, "as") {
                    k += 1;
                }
                let Some(imported) = self.binding_name(k) else {
                    continue;
                };
                let local = if self.word(k + 1, "as") && k + 2 < e {
                    self.binding_name(k + 2).unwrap_or_else(|| imported.clone())
                } else {
                    imported.clone()
                };
                named.push(NamedImport { imported, local });
            }
            j = close + 1;
        }

        if self.word(j, "from") {
            if let Some(specifier) = self.string(j + 1) {
                return (Some(ImportDecl { specifier, named }), j + 2);
            }
        }
        (None, j.max(at + 1))
    }

    fn binding_name(&self, i: usize) -> Option<String> {
        self.ident(i)
            .map(str::to_string)
            .or_else(|| self.string(i))
    }

    // --- classes -------------------------------------------------------

    fn is_class_keyword(&self, i: usize) -> bool {
        self.word(i, "class")
            && i + 1 < self.tokens.len()
            && !self.punct(i + 1, ":")
            && !self.punct(i + 1, "=")
            && !(i > 0 && (self.punct(i - 1, ".") || self.punct(i - 1, "?.")))
    }

    fn class(&self, at: usize, decorators: Vec<Decorator>) -> (ClassDecl, usize) {
        let len = self.tokens.len();
        let mut j = at + 1;
        let mut name = String::new();
        if let Some(word) = self.ident(j) {
            if word != "extends" && word != "implements" {
                name = word.to_string();
                j += 1;
            }
        }

        // heritage clauses and generics up to the body
        let mut angle = 0usize;
        while j < len {
            if angle == 0 && self.punct(j, "{") {
                break;
            }
            if self.is_open(j) {
                j = self.close(j) + 1;
                continue;
            }
            if self.punct(j, "<") {
                angle += 1;
            } else if self.punct(j, ">") {
                angle = angle.saturating_sub(1);
            }
            j += 1;
        }

        if j >= len {
            let class = ClassDecl {
                name,
                decorators,
                methods: Vec::new(),
            };
            return (class, len);
        }

        let close = self.close(j);
        let class = ClassDecl {
            name,
            decorators,
            methods: self.members(j + 1, close.min(len)),
        };
        (class, close + 1)
    }

    fn members(&self, start: usize, end: usize) -> Vec<MethodDecl> {
        let mut methods = Vec::new();
        let mut k = start;

        while k < end {
            if self.punct(k, ";") || self.punct(k, ",") {
                k += 1;
                continue;
            }

            let (decorators, next) = self.decorators(k);
            k = next;

            let mut is_static = false;
            let mut accessor = false;
            while let Some(word) = self.ident(k) {
                if !MEMBER_MODIFIERS.contains(&word) || self.ends_member_name(k + 1, end) {
                    break;
                }
                is_static |= word == "static";
                accessor |= word == "get" || word == "set";
                k += 1;
            }
            if self.punct(k, "*") {
                k += 1;
            }

            // static initialization block
            if self.punct(k, "{") {
                k = self.close(k) + 1;
                continue;
            }

            let name = match self.tokens.get(k) {
                Some(t) if matches!(t.kind, TokenKind::Ident | TokenKind::Str | TokenKind::Number) => {
                    k += 1;
                    strip_quotes(t.text(self.src))
                }
                Some(_) if self.punct(k, "[") => {
                    let close = self.close(k);
                    let name = self.slice(k, close + 1).to_string();
                    k = close + 1;
                    name
                }
                _ => {
                    k += 1;
                    continue;
                }
            };

            if self.punct(k, "?") || self.punct(k, "!") {
                k += 1;
            }
            k = self.skip_angles(k, end);

            if self.punct(k, "(") {
                let close = self.close(k);
                let parameters = self.parameters(k + 1, close.min(end));
                let (has_body, next) = self.method_body(close + 1, end);
                k = next;
                if has_body && !accessor && name != "constructor" {
                    methods.push(MethodDecl {
                        name,
                        is_static,
                        decorators,
                        parameters,
                    });
                }
            } else {
                k = self.property_end(k, end);
            }
        }

        methods
    }

    fn ends_member_name(&self, i: usize, end: usize) -> bool {
        i >= end
            || ["(", "=", ":", ";", "?", "!", "<", "}"]
                .iter()
                .any(|p| self.punct(i, p))
    }

    /// Skip a return type; report whether a body follows and where the member ends.
    fn method_body(&self, start: usize, end: usize) -> (bool, usize) {
        let mut angle = 0usize;
        let mut j = start;
        while j < end {
            if angle == 0 && self.punct(j, "{") && !self.opens_type_literal(j) {
                return (true, self.close(j) + 1);
            }
            if angle == 0 && self.punct(j, ";") {
                return (false, j + 1);
            }
            if self.is_open(j) {
                j = self.close(j) + 1;
                continue;
            }
            if self.punct(j, "<") {
                angle += 1;
            } else if self.punct(j, ">") {
                angle = angle.saturating_sub(1);
            }
            j += 1;
        }
        (false, end)
    }

    fn opens_type_literal(&self, brace: usize) -> bool {
        brace > 0
            && [":", "|", "&", "=>", "<", ",", "(", "["]
                .iter()
                .any(|p| self.punct(brace - 1, p))
    }

    /// End of a property member, by `;` or by a line break between members.
    fn property_end(&self, start: usize, end: usize) -> usize {
        let mut j = start;
        while j < end {
            if self.punct(j, ";") {
                return j + 1;
            }
            if j > start
                && self.tokens[j].newline_before
                && self.ends_expression(j - 1)
                && self.begins_member(j)
            {
                return j;
            }
            if self.is_open(j) {
                j = self.close(j) + 1;
                continue;
            }
            j += 1;
        }
        end
    }

    fn ends_expression(&self, i: usize) -> bool {
        match self.tokens.get(i) {
            Some(t) if t.kind == TokenKind::Punct => {
                matches!(t.text(self.src), ")" | "]" | "}")
            }
            Some(_) => true,
            None => false,
        }
    }

    fn begins_member(&self, i: usize) -> bool {
        match self.tokens.get(i) {
            Some(t) if t.kind == TokenKind::Punct => {
                matches!(t.text(self.src), "@" | "[" | "*")
            }
            Some(t) => matches!(t.kind, TokenKind::Ident | TokenKind::Str | TokenKind::Number),
            None => false,
        }
    }

    // --- parameters ----------------------------------------------------

    fn parameters(&self, start: usize, end: usize) -> Vec<ParameterDecl> {
        self.split_commas(start, end, true)
            .into_iter()
            .filter_map(|(s, e)| self.parameter(s, e))
            .collect()
    }

    fn parameter(&self, start: usize, end: usize) -> Option<ParameterDecl> {
        let (decorators, mut k) = self.decorators(start);
        while let Some(word) = self.ident(k) {
            let is_modifier = PARAMETER_MODIFIERS.contains(&word)
                && k + 1 < end
                && !["?", ":", "=", ","].iter().any(|p| self.punct(k + 1, p));
            if !is_modifier {
                break;
            }
            k += 1;
        }
        if self.punct(k, "...") {
            k += 1;
        }
        if k >= end {
            return None;
        }

        let name = if self.is_open(k) {
            let close = self.close(k);
            let pattern = self.slice(k, close + 1).to_string();
            k = close + 1;
            pattern
        } else {
            let word = self.ident(k)?;
            k += 1;
            word.to_string()
        };
        if self.punct(k, "?") {
            k += 1;
        }

        let type_annotation = if self.punct(k, ":") {
            let type_end = self.type_end(k + 1, end);
            Some(TypeAnnotation {
                text: self.slice(k + 1, type_end).trim().to_string(),
                symbol: self.type_symbol(k + 1, type_end),
            })
        } else {
            None
        };

        Some(ParameterDecl {
            name,
            decorators,
            type_annotation,
        })
    }

    /// A parameter's type runs up to its default initializer.
    fn type_end(&self, start: usize, end: usize) -> usize {
        let mut angle = 0usize;
        let mut j = start;
        while j < end {
            if self.is_open(j) {
                j = self.close(j) + 1;
                continue;
            }
            if self.punct(j, "<") {
                angle += 1;
            } else if self.punct(j, ">") {
                angle = angle.saturating_sub(1);
            } else if angle == 0 && self.punct(j, "=") {
                return j;
            }
            j += 1;
        }
        end
    }

    /// Symbol named by a type: the last identifier of a type reference,
    /// `Array` for `T[]`, nothing for keywords, literals and unions.
    fn type_symbol(&self, start: usize, end: usize) -> Option<String> {
        if start >= end {
            return None;
        }

        let mut angle = 0usize;
        let mut j = start;
        while j < end {
            if self.is_open(j) {
                j = self.close(j) + 1;
                continue;
            }
            if self.punct(j, "<") {
                angle += 1;
            } else if self.punct(j, ">") {
                angle = angle.saturating_sub(1);
            } else if angle == 0 && (self.punct(j, "|") || self.punct(j, "&")) {
                return None;
            }
            j += 1;
        }

        if end - start >= 2 && self.punct(end - 2, "[") && self.punct(end - 1, "]") {
            return Some("Array".to_string());
        }

        let first = self.ident(start)?;
        if NON_SYMBOL_TYPES.contains(&first) {
            return None;
        }
        let path_end = self.path_end(start, end);
        if self.skip_angles(path_end, end) != end {
            return None;
        }
        self.ident(path_end - 1).map(str::to_string)
    }
}
