use serde::{Deserialize, Serialize};
use std::fmt;

/// Inferred type of a constant literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConstantKind {
    Number,
    String,
    Boolean,
    Null,
    Undefined,
}

/// One statement of a block together with its visibility. A statement
/// followed by `;` is evaluated but hidden from the result set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockItem {
    pub node: Node,
    pub visible: bool,
}

/// The AST produced by the parser: a closed set of node variants, shared
/// behaviors implemented via exhaustive matching.
///
/// Trees are immutable after construction; `map`/`transform` return new
/// trees. Every child is itself a `Node` (tree, not graph).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    /// A literal. The original source text is retained so numeric literals
    /// can be materialized by the compiler, not the parser.
    Constant { value: String, kind: ConstantKind },
    Symbol {
        name: String,
    },
    /// An operator application. `op` is the glyph (`+`, `.*`, ...); `func`
    /// the namespace function it dispatches to (`add`, `dotMultiply`, ...).
    /// `implicit` marks implicit multiplication (`2 a`) so stringification
    /// can suppress the glyph.
    Operator {
        op: String,
        func: String,
        args: Vec<Node>,
        implicit: bool,
    },
    /// A call. The callee is a `Symbol` or `Accessor` node.
    Function {
        callee: Box<Node>,
        args: Vec<Node>,
    },
    /// `symbol = value`, `object[index] = value` or `object.prop = value`.
    /// `index` (always an `Index` node) is present for the accessor forms.
    Assignment {
        object: Box<Node>,
        index: Option<Box<Node>>,
        value: Box<Node>,
    },
    /// `f(x, y) = expr`
    FunctionAssignment {
        name: String,
        params: Vec<String>,
        body: Box<Node>,
    },
    Conditional {
        condition: Box<Node>,
        if_true: Box<Node>,
        if_false: Box<Node>,
    },
    /// `start:end` or `start:step:end`
    Range {
        start: Box<Node>,
        end: Box<Node>,
        step: Option<Box<Node>>,
    },
    /// `object[index]` or `object.prop`; `index` is always an `Index` node.
    Accessor {
        object: Box<Node>,
        index: Box<Node>,
    },
    /// Subscript dimensions. `dot_notation` marks `.prop` access, in which
    /// case `dimensions` holds a single string constant.
    Index {
        dimensions: Vec<Node>,
        dot_notation: bool,
    },
    Array {
        items: Vec<Node>,
    },
    Object {
        properties: Vec<(String, Node)>,
    },
    Block {
        blocks: Vec<BlockItem>,
    },
    Parenthesis {
        inner: Box<Node>,
    },
}

impl Node {
    /// Immediate children, in evaluation order.
    pub fn children(&self) -> Vec<&Node> {
        match self {
            Node::Constant { .. } | Node::Symbol { .. } => Vec::new(),
            Node::Operator { args, .. } => args.iter().collect(),
            Node::Function { callee, args } => {
                let mut v = vec![callee.as_ref()];
                v.extend(args.iter());
                v
            }
            Node::Assignment { object, index, value } => {
                let mut v = vec![object.as_ref()];
                if let Some(ix) = index {
                    v.push(ix.as_ref());
                }
                v.push(value.as_ref());
                v
            }
            Node::FunctionAssignment { body, .. } => vec![body.as_ref()],
            Node::Conditional { condition, if_true, if_false } => {
                vec![condition.as_ref(), if_true.as_ref(), if_false.as_ref()]
            }
            Node::Range { start, end, step } => {
                let mut v = vec![start.as_ref()];
                if let Some(s) = step {
                    v.push(s.as_ref());
                }
                v.push(end.as_ref());
                v
            }
            Node::Accessor { object, index } => vec![object.as_ref(), index.as_ref()],
            Node::Index { dimensions, .. } => dimensions.iter().collect(),
            Node::Array { items } => items.iter().collect(),
            Node::Object { properties } => properties.iter().map(|(_, n)| n).collect(),
            Node::Block { blocks } => blocks.iter().map(|b| &b.node).collect(),
            Node::Parenthesis { inner } => vec![inner.as_ref()],
        }
    }

    /// Invoke `f` for each immediate child.
    pub fn for_each<F: FnMut(&Node)>(&self, mut f: F) {
        for child in self.children() {
            f(child);
        }
    }

    /// Rebuild this node with each immediate child replaced by `f(child)`.
    pub fn map<F: FnMut(&Node) -> Node>(&self, mut f: F) -> Node {
        self.map_ref(&mut f)
    }

    fn map_ref(&self, f: &mut dyn FnMut(&Node) -> Node) -> Node {
        match self {
            Node::Constant { .. } | Node::Symbol { .. } => self.clone(),
            Node::Operator { op, func, args, implicit } => Node::Operator {
                op: op.clone(),
                func: func.clone(),
                args: args.iter().map(|a| f(a)).collect(),
                implicit: *implicit,
            },
            Node::Function { callee, args } => Node::Function {
                callee: Box::new(f(callee)),
                args: args.iter().map(|a| f(a)).collect(),
            },
            Node::Assignment { object, index, value } => Node::Assignment {
                object: Box::new(f(object)),
                index: index.as_ref().map(|ix| Box::new(f(ix))),
                value: Box::new(f(value)),
            },
            Node::FunctionAssignment { name, params, body } => Node::FunctionAssignment {
                name: name.clone(),
                params: params.clone(),
                body: Box::new(f(body)),
            },
            Node::Conditional { condition, if_true, if_false } => Node::Conditional {
                condition: Box::new(f(condition)),
                if_true: Box::new(f(if_true)),
                if_false: Box::new(f(if_false)),
            },
            Node::Range { start, end, step } => Node::Range {
                start: Box::new(f(start)),
                end: Box::new(f(end)),
                step: step.as_ref().map(|s| Box::new(f(s))),
            },
            Node::Accessor { object, index } => Node::Accessor {
                object: Box::new(f(object)),
                index: Box::new(f(index)),
            },
            Node::Index { dimensions, dot_notation } => Node::Index {
                dimensions: dimensions.iter().map(|d| f(d)).collect(),
                dot_notation: *dot_notation,
            },
            Node::Array { items } => Node::Array {
                items: items.iter().map(|i| f(i)).collect(),
            },
            Node::Object { properties } => Node::Object {
                properties: properties.iter().map(|(k, v)| (k.clone(), f(v))).collect(),
            },
            Node::Block { blocks } => Node::Block {
                blocks: blocks
                    .iter()
                    .map(|b| BlockItem { node: f(&b.node), visible: b.visible })
                    .collect(),
            },
            Node::Parenthesis { inner } => Node::Parenthesis {
                inner: Box::new(f(inner)),
            },
        }
    }

    /// Visit this node and all descendants, depth first, parents first.
    pub fn traverse<F: FnMut(&Node)>(&self, mut f: F) {
        self.traverse_ref(&mut f);
    }

    fn traverse_ref(&self, f: &mut dyn FnMut(&Node)) {
        f(self);
        for child in self.children() {
            child.traverse_ref(f);
        }
    }

    /// Produce a new tree where every node (parents first) has been passed
    /// through `f`; the replacement's children are transformed in turn.
    pub fn transform<F: FnMut(Node) -> Node>(&self, mut f: F) -> Node {
        self.transform_ref(&mut f)
    }

    fn transform_ref(&self, f: &mut dyn FnMut(Node) -> Node) -> Node {
        let replaced = f(self.clone());
        replaced.map_ref(&mut |child| child.transform_ref(f))
    }

    /// Collect clones of all descendants (including self) matching `pred`.
    pub fn filter<F: Fn(&Node) -> bool>(&self, pred: F) -> Vec<Node> {
        let mut out = Vec::new();
        self.traverse(|n| {
            if pred(n) {
                out.push(n.clone());
            }
        });
        out
    }

    /// Deep structural clone. `Node` owns its tree, so this is `clone`.
    pub fn clone_deep(&self) -> Node {
        self.clone()
    }

    /// Structural equality; `PartialEq` compares whole trees.
    pub fn equals(&self, other: &Node) -> bool {
        self == other
    }

    /// Derived name of symbols, property accesses and calls.
    pub fn name(&self) -> Option<String> {
        match self {
            Node::Symbol { name } => Some(name.clone()),
            Node::FunctionAssignment { name, .. } => Some(name.clone()),
            Node::Function { callee, .. } => callee.name(),
            Node::Accessor { index, .. } => match index.as_ref() {
                Node::Index { dimensions, dot_notation: true } => match dimensions.first() {
                    Some(Node::Constant { value, kind: ConstantKind::String }) => {
                        Some(value.clone())
                    }
                    _ => None,
                },
                _ => None,
            },
            _ => None,
        }
    }

    /// True when a symbol with the given name occurs anywhere in the tree.
    pub fn contains_symbol(&self, name: &str) -> bool {
        let mut found = false;
        self.traverse(|n| {
            if let Node::Symbol { name: n2 } = n {
                if n2 == name {
                    found = true;
                }
            }
        });
        found
    }

    /// Binding strength used by the stringifier to decide parenthesization.
    /// Leaf-like nodes return `None` and never need parentheses.
    pub fn precedence(&self) -> Option<u8> {
        match self {
            Node::Assignment { .. } | Node::FunctionAssignment { .. } => Some(2),
            Node::Conditional { .. } => Some(3),
            Node::Range { .. } => Some(13),
            Node::Operator { func, args, .. } => Some(match func.as_str() {
                "or" => 4,
                "xor" => 5,
                "and" => 6,
                "bitOr" => 7,
                "bitXor" => 8,
                "bitAnd" => 9,
                "equal" | "unequal" | "smaller" | "larger" | "smallerEq" | "largerEq" => 10,
                "leftShift" | "rightArithShift" | "rightLogShift" => 11,
                "to" => 12,
                "add" | "subtract" => 14,
                "multiply" | "divide" | "dotMultiply" | "dotDivide" | "mod" => 15,
                "unaryPlus" | "unaryMinus" | "bitNot" | "not" => 16,
                "pow" | "dotPow" => 17,
                "factorial" | "ctranspose" => 18,
                _ => {
                    // unknown operator function, e.g. from a custom node
                    if args.len() == 1 {
                        16
                    } else {
                        15
                    }
                }
            }),
            _ => None,
        }
    }
}

fn escape_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Wrap `child` in parentheses when it binds weaker than its parent.
/// `strict` additionally wraps ties (used on the non-associating side).
fn child_str(child: &Node, parent_prec: u8, strict: bool) -> String {
    let needs = match child.precedence() {
        Some(p) => p < parent_prec || (strict && p == parent_prec),
        None => false,
    };
    if needs {
        format!("({child})")
    } else {
        format!("{child}")
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Constant { value, kind } => match kind {
                ConstantKind::String => write!(f, "{}", escape_string(value)),
                _ => write!(f, "{value}"),
            },
            Node::Symbol { name } => write!(f, "{name}"),
            Node::Operator { op, func, args, implicit } => {
                let prec = self.precedence().unwrap_or(15);
                match args.len() {
                    1 => {
                        if matches!(func.as_str(), "factorial" | "ctranspose") {
                            write!(f, "{}{op}", child_str(&args[0], prec, false))
                        } else if op.chars().all(|c| c.is_alphabetic()) {
                            // named prefix operator such as `not`
                            write!(f, "{op} {}", child_str(&args[0], prec, false))
                        } else {
                            write!(f, "{op}{}", child_str(&args[0], prec, false))
                        }
                    }
                    _ => {
                        let right_assoc = matches!(func.as_str(), "pow" | "dotPow");
                        let mut parts = Vec::with_capacity(args.len());
                        for (i, arg) in args.iter().enumerate() {
                            let strict = if right_assoc { i == 0 } else { i > 0 };
                            parts.push(child_str(arg, prec, strict));
                        }
                        if *implicit {
                            write!(f, "{}", parts.join(" "))
                        } else {
                            write!(f, "{}", parts.join(&format!(" {op} ")))
                        }
                    }
                }
            }
            Node::Function { callee, args } => {
                let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
                write!(f, "{callee}({})", args.join(", "))
            }
            Node::Assignment { object, index, value } => {
                match index {
                    Some(ix) => write!(f, "{object}{ix} = {value}"),
                    None => write!(f, "{object} = {value}"),
                }
            }
            Node::FunctionAssignment { name, params, body } => {
                write!(f, "{name}({}) = {body}", params.join(", "))
            }
            Node::Conditional { condition, if_true, if_false } => {
                let prec = self.precedence().unwrap_or(3);
                write!(
                    f,
                    "{} ? {} : {}",
                    child_str(condition, prec + 1, false),
                    child_str(if_true, prec, false),
                    child_str(if_false, prec, false)
                )
            }
            Node::Range { start, end, step } => {
                let prec = self.precedence().unwrap_or(13);
                match step {
                    Some(s) => write!(
                        f,
                        "{}:{}:{}",
                        child_str(start, prec + 1, false),
                        child_str(s, prec + 1, false),
                        child_str(end, prec + 1, false)
                    ),
                    None => write!(
                        f,
                        "{}:{}",
                        child_str(start, prec + 1, false),
                        child_str(end, prec + 1, false)
                    ),
                }
            }
            Node::Accessor { object, index } => write!(f, "{object}{index}"),
            Node::Index { dimensions, dot_notation } => {
                if *dot_notation {
                    match dimensions.first() {
                        Some(Node::Constant { value, .. }) => write!(f, ".{value}"),
                        _ => write!(f, "."),
                    }
                } else {
                    let dims: Vec<String> = dimensions.iter().map(|d| d.to_string()).collect();
                    write!(f, "[{}]", dims.join(", "))
                }
            }
            Node::Array { items } => {
                let items: Vec<String> = items.iter().map(|i| i.to_string()).collect();
                write!(f, "[{}]", items.join(", "))
            }
            Node::Object { properties } => {
                let props: Vec<String> = properties
                    .iter()
                    .map(|(k, v)| format!("{k}: {v}"))
                    .collect();
                write!(f, "{{{}}}", props.join(", "))
            }
            Node::Block { blocks } => {
                let mut first = true;
                for item in blocks {
                    if !first {
                        writeln!(f)?;
                    }
                    first = false;
                    write!(f, "{}", item.node)?;
                    if !item.visible {
                        write!(f, ";")?;
                    }
                }
                Ok(())
            }
            Node::Parenthesis { inner } => write!(f, "({inner})"),
        }
    }
}

fn greek(name: &str) -> Option<&'static str> {
    Some(match name {
        "alpha" => r"\alpha",
        "beta" => r"\beta",
        "gamma" => r"\gamma",
        "delta" => r"\delta",
        "theta" => r"\theta",
        "lambda" => r"\lambda",
        "pi" => r"\pi",
        "tau" => r"\tau",
        "phi" => r"\phi",
        "omega" => r"\omega",
        _ => return None,
    })
}

impl Node {
    /// Render the tree as LaTeX.
    pub fn to_tex(&self) -> String {
        match self {
            Node::Constant { value, kind } => match kind {
                ConstantKind::String => format!(r"\text{{{value}}}"),
                _ => value.clone(),
            },
            Node::Symbol { name } => greek(name)
                .map(str::to_string)
                .unwrap_or_else(|| {
                    if name.chars().count() > 1 {
                        format!(r"\mathrm{{{name}}}")
                    } else {
                        name.clone()
                    }
                }),
            Node::Operator { func, args, .. } => self.operator_tex(func, args),
            Node::Function { callee, args } => {
                let rendered: Vec<String> = args.iter().map(|a| a.to_tex()).collect();
                match callee.name().as_deref() {
                    Some("sqrt") if args.len() == 1 => format!(r"\sqrt{{{}}}", rendered[0]),
                    Some("abs") if args.len() == 1 => {
                        format!(r"\left|{}\right|", rendered[0])
                    }
                    Some(name) => {
                        format!(r"\mathrm{{{name}}}\left({}\right)", rendered.join(", "))
                    }
                    None => format!(r"{}\left({}\right)", callee.to_tex(), rendered.join(", ")),
                }
            }
            Node::Assignment { object, index, value } => match index {
                Some(ix) => format!("{}{}:={}", object.to_tex(), ix.to_tex(), value.to_tex()),
                None => format!("{}:={}", object.to_tex(), value.to_tex()),
            },
            Node::FunctionAssignment { name, params, body } => {
                format!(
                    r"\mathrm{{{name}}}\left({}\right):={}",
                    params.join(", "),
                    body.to_tex()
                )
            }
            Node::Conditional { condition, if_true, if_false } => format!(
                r"\begin{{cases}} {} & \text{{if }} {} \\ {} & \text{{otherwise}} \end{{cases}}",
                if_true.to_tex(),
                condition.to_tex(),
                if_false.to_tex()
            ),
            Node::Range { start, end, step } => match step {
                Some(s) => format!("{}:{}:{}", start.to_tex(), s.to_tex(), end.to_tex()),
                None => format!("{}:{}", start.to_tex(), end.to_tex()),
            },
            Node::Accessor { object, index } => format!("{}{}", object.to_tex(), index.to_tex()),
            Node::Index { dimensions, dot_notation } => {
                if *dot_notation {
                    match dimensions.first() {
                        Some(Node::Constant { value, .. }) => format!(r".\mathrm{{{value}}}"),
                        _ => ".".to_string(),
                    }
                } else {
                    let dims: Vec<String> = dimensions.iter().map(|d| d.to_tex()).collect();
                    format!(r"_{{{}}}", dims.join(","))
                }
            }
            Node::Array { items } => {
                if items.iter().all(|i| matches!(i, Node::Array { .. })) && !items.is_empty() {
                    let rows: Vec<String> = items
                        .iter()
                        .map(|row| {
                            row.children()
                                .iter()
                                .map(|c| c.to_tex())
                                .collect::<Vec<_>>()
                                .join(" & ")
                        })
                        .collect();
                    format!(
                        r"\begin{{bmatrix}}{}\end{{bmatrix}}",
                        rows.join(r" \\ ")
                    )
                } else {
                    let items: Vec<String> = items.iter().map(|i| i.to_tex()).collect();
                    format!(
                        r"\begin{{bmatrix}}{}\end{{bmatrix}}",
                        items.join(" & ")
                    )
                }
            }
            Node::Object { properties } => {
                let props: Vec<String> = properties
                    .iter()
                    .map(|(k, v)| format!(r"\mathbf{{{k}}}: {}", v.to_tex()))
                    .collect();
                format!(r"\left\{{{}\right\}}", props.join(", "))
            }
            Node::Block { blocks } => blocks
                .iter()
                .map(|b| b.node.to_tex())
                .collect::<Vec<_>>()
                .join(r" \;\; "),
            Node::Parenthesis { inner } => format!(r"\left({}\right)", inner.to_tex()),
        }
    }

    fn operator_tex(&self, func: &str, args: &[Node]) -> String {
        let tex: Vec<String> = args.iter().map(|a| a.to_tex()).collect();
        if args.len() == 1 {
            let arg = &tex[0];
            return match func {
                "unaryMinus" => format!("-{arg}"),
                "unaryPlus" => format!("+{arg}"),
                "not" => format!(r"\neg\left({arg}\right)"),
                "bitNot" => format!(r"{{\sim}}{arg}"),
                "factorial" => format!("{arg}!"),
                "ctranspose" => format!(r"{arg}^\dagger"),
                _ => format!(r"\mathrm{{{func}}}\left({arg}\right)"),
            };
        }
        let join = |sep: &str| tex.join(sep);
        match func {
            "add" => join("+"),
            "subtract" => join("-"),
            "multiply" | "dotMultiply" => join(r"\cdot"),
            "divide" | "dotDivide" if tex.len() == 2 => {
                format!(r"\frac{{{}}}{{{}}}", tex[0], tex[1])
            }
            "pow" | "dotPow" if tex.len() == 2 => {
                format!(r"{{{}}}^{{{}}}", tex[0], tex[1])
            }
            "mod" => join(r"\mod"),
            "to" => join(r"\rightarrow"),
            "equal" => join("="),
            "unequal" => join(r"\neq"),
            "smaller" => join("<"),
            "larger" => join(">"),
            "smallerEq" => join(r"\leq"),
            "largerEq" => join(r"\geq"),
            "and" => join(r"\wedge"),
            "or" => join(r"\vee"),
            "xor" => join(r"\veebar"),
            "bitAnd" => join(r"\&"),
            "bitOr" => join(r"\mid"),
            "bitXor" => join(r"\oplus"),
            "leftShift" => join(r"\ll"),
            "rightArithShift" => join(r"\gg"),
            "rightLogShift" => join(r"\gg\gg"),
            _ => format!(r"\mathrm{{{func}}}\left({}\right)", tex.join(", ")),
        }
    }
}
