use logos::Logos;

/// Token set for the expression language.
///
/// Numbers, identifiers and strings carry their text through the
/// [`SpannedToken`] lexeme; operator tokens are fixed delimiters. The named
/// operator keywords (`mod`, `to`, `in`, `and`, `xor`, `or`, `not`) are
/// tokenized as delimiters even though they are alphabetic; the parser may
/// still accept them as symbol names where the grammar allows it.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r]+")]
#[logos(skip r"#[^\n]*")]
pub enum Token {
    // Statement separator outside of parens/brackets/braces; whitespace inside
    #[token("\n")]
    Newline,

    // Named operator keywords
    #[token("mod")]
    Mod,
    #[token("to")]
    To,
    #[token("in")]
    In,
    #[token("and")]
    And,
    #[token("xor")]
    Xor,
    #[token("or")]
    Or,
    #[token("not")]
    Not,

    // Identifiers are unicode-aware: letters, digits, underscore and dollar
    #[regex(r"[\p{L}_$][\p{L}\p{N}_$]*")]
    Ident,

    // Integer, decimal and scientific notation. A leading dot followed by a
    // digit is a number; a trailing dot is not consumed so that `2.*3` lexes
    // as `2 .* 3`.
    #[regex(r"(\d+\.\d+|\d+|\.\d+)([eE][+-]?\d+)?")]
    Number,
    // Exponent marker without digits. Surfaced as its own token so the
    // parser can report "Digit expected" at the right column.
    #[regex(r"(\d+\.\d+|\d+|\.\d+)[eE][+-]?")]
    BadExponent,

    #[regex(r#""([^"\\\n]|\\.)*""#)]
    Str,

    // Multi-character delimiters
    #[token(".*")]
    DotStar,
    #[token("./")]
    DotSlash,
    #[token(".^")]
    DotCaret,
    #[token("^|")]
    CaretPipe,
    #[token("==")]
    Eq,
    #[token("!=")]
    Ne,
    #[token("<=")]
    Le,
    #[token(">=")]
    Ge,
    #[token("<<")]
    Shl,
    #[token(">>>")]
    UnsignedShr,
    #[token(">>")]
    Shr,

    // Single-character delimiters
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("^")]
    Caret,
    #[token("~")]
    Tilde,
    #[token("&")]
    Amp,
    #[token("|")]
    Pipe,
    #[token("!")]
    Bang,
    #[token("'")]
    Quote,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("=")]
    Assign,
    #[token("?")]
    Question,
    #[token(":")]
    Colon,
    #[token(";")]
    Semicolon,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,

    // Anything logos cannot match (stray characters, unterminated strings)
    Error,
}

impl Token {
    /// True for the alphabetic operator keywords that the parser may also
    /// accept as plain symbol names (`2 in` meaning inches, for example).
    pub fn is_named_operator(&self) -> bool {
        matches!(
            self,
            Token::Mod | Token::To | Token::In | Token::And | Token::Xor | Token::Or | Token::Not
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpannedToken {
    pub token: Token,
    pub lexeme: String,
    pub start: usize,
    pub end: usize,
}

pub fn tokenize(input: &str) -> Vec<Token> {
    tokenize_detailed(input)
        .into_iter()
        .map(|t| t.token)
        .collect()
}

pub fn tokenize_detailed(input: &str) -> Vec<SpannedToken> {
    let mut lex = Token::lexer(input);
    let mut out = Vec::new();
    while let Some(res) = lex.next() {
        let span = lex.span();
        let token = match res {
            Ok(tok) => tok,
            Err(_) => Token::Error,
        };
        out.push(SpannedToken {
            token,
            lexeme: lex.slice().to_string(),
            start: span.start,
            end: span.end,
        });
    }
    out
}
