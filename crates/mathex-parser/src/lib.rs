//! Recursive-descent, precedence-climbing parser for the expression
//! language. Produces a [`Node`] tree; see [`crate::node`] for the AST.

mod node;

pub use node::{BlockItem, ConstantKind, Node};

use mathex_lexer::{tokenize_detailed, Token};
use std::collections::HashMap;

/// Factory invoked for symbols registered under [`ParseOptions::nodes`];
/// receives the parsed call arguments and returns a replacement subtree.
pub type CustomNodeFactory = fn(Vec<Node>) -> Node;

#[derive(Default, Clone)]
pub struct ParseOptions {
    /// Custom node handlers keyed by symbol name.
    pub nodes: HashMap<String, CustomNodeFactory>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
    /// 1-based character column of the offending token.
    pub char_index: usize,
    pub found: Option<String>,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (char {})", self.message, self.char_index)
    }
}

impl std::error::Error for ParseError {}

impl From<ParseError> for String {
    fn from(e: ParseError) -> Self {
        format!("{e}")
    }
}

pub fn parse(input: &str) -> Result<Node, ParseError> {
    parse_with_options(input, &ParseOptions::default())
}

pub fn parse_with_options(input: &str, options: &ParseOptions) -> Result<Node, ParseError> {
    let tokens = tokenize_detailed(input)
        .into_iter()
        .map(|t| TokenInfo {
            token: t.token,
            lexeme: t.lexeme,
            start: t.start,
        })
        .collect();

    let mut parser = Parser {
        tokens,
        pos: 0,
        input: input.to_string(),
        nesting: 0,
        conditional: None,
        options,
    };
    let node = parser.parse_block()?;
    if let Some(info) = parser.peek_info() {
        let rest = input[info.start..].trim_end();
        return Err(parser.error(format!("Unexpected part \"{rest}\"")));
    }
    Ok(node)
}

#[derive(Clone)]
struct TokenInfo {
    token: Token,
    lexeme: String,
    start: usize,
}

struct Parser<'a> {
    tokens: Vec<TokenInfo>,
    pos: usize,
    input: String,
    /// Bracket nesting depth; newlines are whitespace when above zero.
    nesting: usize,
    /// Nesting level at which a conditional is currently being parsed;
    /// suppresses the range operator so `a ? b:c` reads as a conditional.
    conditional: Option<usize>,
    options: &'a ParseOptions,
}

impl<'a> Parser<'a> {
    fn peek_info(&self) -> Option<&TokenInfo> {
        let mut i = self.pos;
        if self.nesting > 0 {
            while matches!(self.tokens.get(i).map(|t| t.token), Some(Token::Newline)) {
                i += 1;
            }
        }
        self.tokens.get(i)
    }

    fn peek(&self) -> Option<Token> {
        self.peek_info().map(|t| t.token)
    }

    fn advance(&mut self) -> Option<TokenInfo> {
        if self.nesting > 0 {
            while matches!(self.tokens.get(self.pos).map(|t| t.token), Some(Token::Newline)) {
                self.pos += 1;
            }
        }
        let info = self.tokens.get(self.pos).cloned();
        if info.is_some() {
            self.pos += 1;
        }
        info
    }

    fn consume(&mut self, t: Token) -> bool {
        if self.peek() == Some(t) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Skip newlines unconditionally; used after binary and prefix operators
    /// so an operand may continue on the next line.
    fn skip_newlines(&mut self) {
        while matches!(self.tokens.get(self.pos).map(|t| t.token), Some(Token::Newline)) {
            self.pos += 1;
        }
    }

    fn open_params(&mut self) {
        self.advance();
        self.nesting += 1;
    }

    fn close_params(&mut self) {
        self.nesting -= 1;
    }

    fn char_col(&self, byte: usize) -> usize {
        self.input[..byte].chars().count() + 1
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        let (char_index, found) = match self.peek_info() {
            Some(t) => (self.char_col(t.start), Some(t.lexeme.clone())),
            None => (self.char_col(self.input.len()), None),
        };
        ParseError {
            message: message.into(),
            char_index,
            found,
        }
    }

    /// Top-level statement sequence; separators are `;` and newlines, and a
    /// trailing `;` suppresses that statement's value.
    fn parse_block(&mut self) -> Result<Node, ParseError> {
        let mut node: Option<Node> = None;
        let mut blocks: Vec<BlockItem> = Vec::new();

        if !matches!(self.peek(), None | Some(Token::Newline | Token::Semicolon)) {
            node = Some(self.parse_assignment()?);
        }
        while matches!(self.peek(), Some(Token::Newline | Token::Semicolon)) {
            if blocks.is_empty() {
                if let Some(n) = node.take() {
                    let visible = self.peek() != Some(Token::Semicolon);
                    blocks.push(BlockItem { node: n, visible });
                }
            }
            self.advance();
            if !matches!(self.peek(), None | Some(Token::Newline | Token::Semicolon)) {
                let n = self.parse_assignment()?;
                let visible = self.peek() != Some(Token::Semicolon);
                blocks.push(BlockItem { node: n, visible });
            }
        }

        if !blocks.is_empty() {
            Ok(Node::Block { blocks })
        } else if let Some(n) = node {
            Ok(n)
        } else {
            Err(self.error("Unexpected end of expression"))
        }
    }

    fn parse_assignment(&mut self) -> Result<Node, ParseError> {
        let node = self.parse_conditional()?;
        if !self.consume(Token::Assign) {
            return Ok(node);
        }
        self.skip_newlines();
        match node {
            Node::Symbol { .. } => {
                let value = self.parse_assignment()?;
                Ok(Node::Assignment {
                    object: Box::new(node),
                    index: None,
                    value: Box::new(value),
                })
            }
            Node::Accessor { object, index } => {
                let value = self.parse_assignment()?;
                Ok(Node::Assignment {
                    object,
                    index: Some(index),
                    value: Box::new(value),
                })
            }
            Node::Function { callee, args } => {
                // `f(x, y) = expr` defines a function when every argument
                // is a bare symbol
                let mut params = Vec::with_capacity(args.len());
                let mut valid = matches!(callee.as_ref(), Node::Symbol { .. });
                for arg in &args {
                    match arg {
                        Node::Symbol { name } => params.push(name.clone()),
                        _ => {
                            valid = false;
                            break;
                        }
                    }
                }
                if !valid {
                    return Err(self.error("Invalid left hand side of assignment operator ="));
                }
                let name = match callee.as_ref() {
                    Node::Symbol { name } => name.clone(),
                    _ => unreachable!(),
                };
                let body = self.parse_assignment()?;
                Ok(Node::FunctionAssignment {
                    name,
                    params,
                    body: Box::new(body),
                })
            }
            _ => Err(self.error("Invalid left hand side of assignment operator =")),
        }
    }

    fn parse_conditional(&mut self) -> Result<Node, ParseError> {
        let mut node = self.parse_logical_or()?;
        while self.peek() == Some(Token::Question) {
            let prev = self.conditional;
            self.conditional = Some(self.nesting);
            self.advance();
            self.skip_newlines();

            let condition = node;
            let if_true = self.parse_assignment()?;
            if !self.consume(Token::Colon) {
                return Err(self.error("False part of conditional expression expected"));
            }
            self.conditional = None;
            self.skip_newlines();
            let if_false = self.parse_assignment()?;

            node = Node::Conditional {
                condition: Box::new(condition),
                if_true: Box::new(if_true),
                if_false: Box::new(if_false),
            };
            self.conditional = prev;
        }
        Ok(node)
    }

    fn binary(op: &str, func: &str, left: Node, right: Node) -> Node {
        Node::Operator {
            op: op.to_string(),
            func: func.to_string(),
            args: vec![left, right],
            implicit: false,
        }
    }

    fn parse_logical_or(&mut self) -> Result<Node, ParseError> {
        let mut node = self.parse_logical_xor()?;
        while self.peek() == Some(Token::Or) {
            self.advance();
            self.skip_newlines();
            let rhs = self.parse_logical_xor()?;
            node = Self::binary("or", "or", node, rhs);
        }
        Ok(node)
    }

    fn parse_logical_xor(&mut self) -> Result<Node, ParseError> {
        let mut node = self.parse_logical_and()?;
        while self.peek() == Some(Token::Xor) {
            self.advance();
            self.skip_newlines();
            let rhs = self.parse_logical_and()?;
            node = Self::binary("xor", "xor", node, rhs);
        }
        Ok(node)
    }

    fn parse_logical_and(&mut self) -> Result<Node, ParseError> {
        let mut node = self.parse_bitwise_or()?;
        while self.peek() == Some(Token::And) {
            self.advance();
            self.skip_newlines();
            let rhs = self.parse_bitwise_or()?;
            node = Self::binary("and", "and", node, rhs);
        }
        Ok(node)
    }

    fn parse_bitwise_or(&mut self) -> Result<Node, ParseError> {
        let mut node = self.parse_bitwise_xor()?;
        while self.peek() == Some(Token::Pipe) {
            self.advance();
            self.skip_newlines();
            let rhs = self.parse_bitwise_xor()?;
            node = Self::binary("|", "bitOr", node, rhs);
        }
        Ok(node)
    }

    fn parse_bitwise_xor(&mut self) -> Result<Node, ParseError> {
        let mut node = self.parse_bitwise_and()?;
        while self.peek() == Some(Token::CaretPipe) {
            self.advance();
            self.skip_newlines();
            let rhs = self.parse_bitwise_and()?;
            node = Self::binary("^|", "bitXor", node, rhs);
        }
        Ok(node)
    }

    fn parse_bitwise_and(&mut self) -> Result<Node, ParseError> {
        let mut node = self.parse_relational()?;
        while self.peek() == Some(Token::Amp) {
            self.advance();
            self.skip_newlines();
            let rhs = self.parse_relational()?;
            node = Self::binary("&", "bitAnd", node, rhs);
        }
        Ok(node)
    }

    fn parse_relational(&mut self) -> Result<Node, ParseError> {
        let mut node = self.parse_shift()?;
        loop {
            let (op, func) = match self.peek() {
                Some(Token::Eq) => ("==", "equal"),
                Some(Token::Ne) => ("!=", "unequal"),
                Some(Token::Lt) => ("<", "smaller"),
                Some(Token::Gt) => (">", "larger"),
                Some(Token::Le) => ("<=", "smallerEq"),
                Some(Token::Ge) => (">=", "largerEq"),
                _ => break,
            };
            self.advance();
            self.skip_newlines();
            let rhs = self.parse_shift()?;
            node = Self::binary(op, func, node, rhs);
        }
        Ok(node)
    }

    fn parse_shift(&mut self) -> Result<Node, ParseError> {
        let mut node = self.parse_conversion()?;
        loop {
            let (op, func) = match self.peek() {
                Some(Token::Shl) => ("<<", "leftShift"),
                Some(Token::Shr) => (">>", "rightArithShift"),
                Some(Token::UnsignedShr) => (">>>", "rightLogShift"),
                _ => break,
            };
            self.advance();
            self.skip_newlines();
            let rhs = self.parse_conversion()?;
            node = Self::binary(op, func, node, rhs);
        }
        Ok(node)
    }

    fn parse_conversion(&mut self) -> Result<Node, ParseError> {
        let mut node = self.parse_range()?;
        loop {
            let op = match self.peek() {
                Some(Token::To) => "to",
                Some(Token::In) => "in",
                _ => break,
            };
            self.advance();
            self.skip_newlines();
            if op == "in" && self.peek().is_none() {
                // end of expression: `5 in` means the unit "in" (inch)
                node = Node::Operator {
                    op: "*".to_string(),
                    func: "multiply".to_string(),
                    args: vec![node, Node::Symbol { name: "in".to_string() }],
                    implicit: true,
                };
            } else {
                let rhs = self.parse_range()?;
                node = Self::binary(op, "to", node, rhs);
            }
        }
        Ok(node)
    }

    fn parse_range(&mut self) -> Result<Node, ParseError> {
        let mut node;
        if self.peek() == Some(Token::Colon) {
            // implicit start, e.g. `:4`
            node = Node::Constant {
                value: "1".to_string(),
                kind: ConstantKind::Number,
            };
        } else {
            node = self.parse_add_subtract()?;
        }

        if self.peek() == Some(Token::Colon) && self.conditional != Some(self.nesting) {
            let mut params = vec![node];
            while self.peek() == Some(Token::Colon) && params.len() < 3 {
                self.advance();
                self.skip_newlines();
                match self.peek() {
                    // implicit end, e.g. `a[2:]`
                    None | Some(Token::RParen | Token::RBracket | Token::Comma) => {
                        params.push(Node::Symbol { name: "end".to_string() });
                    }
                    _ => params.push(self.parse_add_subtract()?),
                }
            }
            node = if params.len() == 3 {
                // `start:step:end`
                let end = params.pop().unwrap();
                let step = params.pop().unwrap();
                let start = params.pop().unwrap();
                Node::Range {
                    start: Box::new(start),
                    end: Box::new(end),
                    step: Some(Box::new(step)),
                }
            } else {
                let end = params.pop().unwrap();
                let start = params.pop().unwrap();
                Node::Range {
                    start: Box::new(start),
                    end: Box::new(end),
                    step: None,
                }
            };
        }
        Ok(node)
    }

    fn parse_add_subtract(&mut self) -> Result<Node, ParseError> {
        let mut node = self.parse_multiply_divide()?;
        loop {
            let (op, func) = match self.peek() {
                Some(Token::Plus) => ("+", "add"),
                Some(Token::Minus) => ("-", "subtract"),
                _ => break,
            };
            self.advance();
            self.skip_newlines();
            let rhs = self.parse_multiply_divide()?;
            node = Self::binary(op, func, node, rhs);
        }
        Ok(node)
    }

    fn parse_multiply_divide(&mut self) -> Result<Node, ParseError> {
        let mut node = self.parse_unary()?;
        let mut last = node.clone();
        loop {
            let explicit = match self.peek() {
                Some(Token::Star) => Some(("*", "multiply")),
                Some(Token::DotStar) => Some((".*", "dotMultiply")),
                Some(Token::Slash) => Some(("/", "divide")),
                Some(Token::DotSlash) => Some(("./", "dotDivide")),
                Some(Token::Percent) => Some(("%", "mod")),
                Some(Token::Mod) => Some(("mod", "mod")),
                _ => None,
            };
            if let Some((op, func)) = explicit {
                self.advance();
                self.skip_newlines();
                last = self.parse_unary()?;
                node = Self::binary(op, func, node, last.clone());
                continue;
            }

            // Implicit multiplication: a value immediately followed by a
            // symbol, a number or an opening parenthesis.
            let implicit = match self.peek() {
                Some(Token::Ident) | Some(Token::LParen) => true,
                // `2 in` is two inches unless a conversion target follows
                Some(Token::In) => matches!(node, Node::Constant { .. }),
                Some(Token::Number) => {
                    !matches!(last, Node::Constant { .. })
                        && match &last {
                            Node::Operator { op, .. } => op == "!",
                            _ => true,
                        }
                }
                _ => false,
            };
            if !implicit {
                break;
            }
            last = self.parse_unary()?;
            node = Node::Operator {
                op: "*".to_string(),
                func: "multiply".to_string(),
                args: vec![node, last.clone()],
                implicit: true,
            };
        }
        Ok(node)
    }

    fn parse_unary(&mut self) -> Result<Node, ParseError> {
        let (op, func) = match self.peek() {
            Some(Token::Minus) => ("-", "unaryMinus"),
            Some(Token::Plus) => ("+", "unaryPlus"),
            Some(Token::Tilde) => ("~", "bitNot"),
            Some(Token::Not) => ("not", "not"),
            _ => return self.parse_pow(),
        };
        self.advance();
        self.skip_newlines();
        let arg = self.parse_unary()?;
        Ok(Node::Operator {
            op: op.to_string(),
            func: func.to_string(),
            args: vec![arg],
            implicit: false,
        })
    }

    fn parse_pow(&mut self) -> Result<Node, ParseError> {
        let node = self.parse_postfix()?;
        let (op, func) = match self.peek() {
            Some(Token::Caret) => ("^", "pow"),
            Some(Token::DotCaret) => (".^", "dotPow"),
            _ => return Ok(node),
        };
        self.advance();
        self.skip_newlines();
        // right associative; descending into unary also permits `2^-3`
        let rhs = self.parse_unary()?;
        Ok(Self::binary(op, func, node, rhs))
    }

    fn parse_postfix(&mut self) -> Result<Node, ParseError> {
        let mut node = self.parse_custom_nodes()?;
        loop {
            let (op, func) = match self.peek() {
                Some(Token::Bang) => ("!", "factorial"),
                Some(Token::Quote) => ("'", "ctranspose"),
                _ => break,
            };
            self.advance();
            node = Node::Operator {
                op: op.to_string(),
                func: func.to_string(),
                args: vec![node],
                implicit: false,
            };
            node = self.parse_accessors(node)?;
        }
        Ok(node)
    }

    fn parse_custom_nodes(&mut self) -> Result<Node, ParseError> {
        if self.peek() == Some(Token::Ident) {
            let name = self
                .peek_info()
                .map(|t| t.lexeme.clone())
                .unwrap_or_default();
            if let Some(factory) = self.options.nodes.get(&name).copied() {
                self.advance();
                let mut args = Vec::new();
                if self.peek() == Some(Token::LParen) {
                    self.open_params();
                    if self.peek() != Some(Token::RParen) {
                        args.push(self.parse_assignment()?);
                        while self.consume(Token::Comma) {
                            args.push(self.parse_assignment()?);
                        }
                    }
                    if !self.consume(Token::RParen) {
                        return Err(self.error("Parenthesis ) expected"));
                    }
                    self.close_params();
                }
                return Ok(factory(args));
            }
        }
        self.parse_symbol()
    }

    fn parse_symbol(&mut self) -> Result<Node, ParseError> {
        let is_symbol = match self.peek() {
            Some(Token::Ident) => true,
            // named operator keywords double as symbol names (`2 in`)
            Some(t) => t.is_named_operator(),
            None => false,
        };
        if !is_symbol {
            return self.parse_string();
        }
        let name = self.advance().map(|t| t.lexeme).unwrap_or_default();
        let node = Node::Symbol { name };
        self.parse_accessors(node)
    }

    /// Suffixes after a primary: `(...)` call, `[...]` index, `.name`
    /// property. Calls only apply to symbol and accessor objects; after
    /// anything else `(` means implicit multiplication.
    fn parse_accessors(&mut self, mut node: Node) -> Result<Node, ParseError> {
        loop {
            match self.peek() {
                Some(Token::LParen) => {
                    if !matches!(node, Node::Symbol { .. } | Node::Accessor { .. }) {
                        break;
                    }
                    self.open_params();
                    let mut args = Vec::new();
                    if self.peek() != Some(Token::RParen) {
                        args.push(self.parse_assignment()?);
                        while self.consume(Token::Comma) {
                            args.push(self.parse_assignment()?);
                        }
                    }
                    if !self.consume(Token::RParen) {
                        return Err(self.error("Parenthesis ) expected"));
                    }
                    self.close_params();
                    node = Node::Function {
                        callee: Box::new(node),
                        args,
                    };
                }
                Some(Token::LBracket) => {
                    self.open_params();
                    let mut dimensions = Vec::new();
                    if self.peek() != Some(Token::RBracket) {
                        dimensions.push(self.parse_assignment()?);
                        while self.consume(Token::Comma) {
                            dimensions.push(self.parse_assignment()?);
                        }
                    }
                    if !self.consume(Token::RBracket) {
                        return Err(self.error("Parenthesis ] expected"));
                    }
                    self.close_params();
                    node = Node::Accessor {
                        object: Box::new(node),
                        index: Box::new(Node::Index {
                            dimensions,
                            dot_notation: false,
                        }),
                    };
                }
                Some(Token::Dot) => {
                    self.advance();
                    let name = match self.peek() {
                        Some(Token::Ident) => self.advance().map(|t| t.lexeme).unwrap_or_default(),
                        _ => return Err(self.error("Property name expected after dot")),
                    };
                    node = Node::Accessor {
                        object: Box::new(node),
                        index: Box::new(Node::Index {
                            dimensions: vec![Node::Constant {
                                value: name,
                                kind: ConstantKind::String,
                            }],
                            dot_notation: true,
                        }),
                    };
                }
                _ => break,
            }
        }
        Ok(node)
    }

    fn parse_string(&mut self) -> Result<Node, ParseError> {
        if self.peek() == Some(Token::Str) {
            let lexeme = self.advance().map(|t| t.lexeme).unwrap_or_default();
            let node = Node::Constant {
                value: unescape(&lexeme),
                kind: ConstantKind::String,
            };
            return self.parse_accessors(node);
        }
        self.parse_matrix()
    }

    fn parse_matrix(&mut self) -> Result<Node, ParseError> {
        if self.peek() != Some(Token::LBracket) {
            return self.parse_object();
        }
        self.open_params();

        let node;
        if self.peek() == Some(Token::RBracket) {
            self.advance();
            self.close_params();
            node = Node::Array { items: Vec::new() };
        } else {
            let first = self.parse_row()?;
            if self.peek() == Some(Token::Semicolon) {
                // 2-dimensional matrix; rows separated by semicolons
                let mut rows = vec![first];
                while self.consume(Token::Semicolon) {
                    rows.push(self.parse_row()?);
                }
                if !self.consume(Token::RBracket) {
                    return Err(self.error("End of matrix ] expected"));
                }
                self.close_params();
                let cols = row_len(&rows[0]);
                for row in &rows[1..] {
                    let len = row_len(row);
                    if len != cols {
                        return Err(
                            self.error(format!("Column dimensions mismatch ({len} != {cols})"))
                        );
                    }
                }
                node = Node::Array { items: rows };
            } else {
                if !self.consume(Token::RBracket) {
                    return Err(self.error("End of matrix ] expected"));
                }
                self.close_params();
                node = first;
            }
        }
        self.parse_accessors(node)
    }

    fn parse_row(&mut self) -> Result<Node, ParseError> {
        let mut items = vec![self.parse_assignment()?];
        while self.consume(Token::Comma) {
            items.push(self.parse_assignment()?);
        }
        Ok(Node::Array { items })
    }

    fn parse_object(&mut self) -> Result<Node, ParseError> {
        if self.peek() != Some(Token::LBrace) {
            return self.parse_number();
        }
        self.open_params();
        let mut properties = Vec::new();
        if self.peek() != Some(Token::RBrace) {
            loop {
                let key = match self.peek() {
                    Some(Token::Str) => {
                        let lexeme = self.advance().map(|t| t.lexeme).unwrap_or_default();
                        unescape(&lexeme)
                    }
                    Some(Token::Ident) => self.advance().map(|t| t.lexeme).unwrap_or_default(),
                    _ => return Err(self.error("Symbol or string expected as object key")),
                };
                if !self.consume(Token::Colon) {
                    return Err(self.error("Colon : expected after object key"));
                }
                let value = self.parse_assignment()?;
                properties.push((key, value));
                if !self.consume(Token::Comma) {
                    break;
                }
            }
        }
        if !self.consume(Token::RBrace) {
            return Err(self.error("Comma , or bracket } expected"));
        }
        self.close_params();
        self.parse_accessors(Node::Object { properties })
    }

    fn parse_number(&mut self) -> Result<Node, ParseError> {
        match self.peek() {
            Some(Token::Number) => {
                let value = self.advance().map(|t| t.lexeme).unwrap_or_default();
                Ok(Node::Constant {
                    value,
                    kind: ConstantKind::Number,
                })
            }
            Some(Token::BadExponent) => {
                let lexeme = self
                    .peek_info()
                    .map(|t| t.lexeme.clone())
                    .unwrap_or_default();
                Err(self.error(format!("Digit expected, got \"{lexeme}\"")))
            }
            _ => self.parse_parentheses(),
        }
    }

    fn parse_parentheses(&mut self) -> Result<Node, ParseError> {
        if self.peek() != Some(Token::LParen) {
            return self.parse_end();
        }
        self.open_params();
        let inner = self.parse_assignment()?;
        if !self.consume(Token::RParen) {
            return Err(self.error("Parenthesis ) expected"));
        }
        self.close_params();
        let node = Node::Parenthesis {
            inner: Box::new(inner),
        };
        self.parse_accessors(node)
    }

    fn parse_end(&mut self) -> Result<Node, ParseError> {
        match self.peek_info() {
            None => Err(self.error("Unexpected end of expression")),
            Some(info) if info.token == Token::Error => {
                if info.lexeme.starts_with('"') {
                    Err(self.error("End of string \" expected"))
                } else {
                    let lexeme = info.lexeme.clone();
                    Err(self.error(format!("Syntax error in part \"{lexeme}\"")))
                }
            }
            Some(_) => Err(self.error("Value expected")),
        }
    }
}

fn row_len(row: &Node) -> usize {
    match row {
        Node::Array { items } => items.len(),
        _ => 1,
    }
}

fn unescape(lexeme: &str) -> String {
    // strip the surrounding quotes, then process escapes
    let inner = &lexeme[1..lexeme.len() - 1];
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
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}
