//! Template parsing: source text to [`Node`]s.

use regex::Regex;
use std::sync::LazyLock;

use super::ast::{Branch, Condition, Filter, Node};
use super::engine::TemplateError;

/// `<< expr >>` or `<%-? stmt -?%>`.
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<<(.*?)>>|<%(-?)(.*?)(-?)%>").expect("valid regex")
});

const KEYWORDS: &[&str] = &["and", "or", "not", "in", "is", "defined"];

#[derive(Debug, Clone)]
enum Token {
    Text(String),
    Expr { inner: String, offset: usize },
    Stmt { inner: String, offset: usize },
}

/// Parse template source into nodes.
pub fn parse(source: &str) -> Result<Vec<Node>, TemplateError> {
    let mut parser = Parser { tokens: tokenize(source).into_iter() };
    let (nodes, stop) = parser.parse_block()?;
    match stop {
        None => Ok(nodes),
        Some((stop, offset)) => Err(TemplateError::syntax(
            offset,
            format!("`{}` without a matching `if`", stop.keyword()),
        )),
    }
}

/// Whether `source` contains any template tag at all.
pub fn has_tags(source: &str) -> bool {
    TAG_RE.is_match(source)
}

fn tokenize(source: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut last = 0;
    let mut trim_next = false;

    for caps in TAG_RE.captures_iter(source) {
        let Some(whole) = caps.get(0) else { continue };

        let mut text = &source[last..whole.start()];
        if trim_next {
            text = text.trim_start();
        }
        let trim_before = caps.get(2).is_some_and(|g| !g.as_str().is_empty());
        if trim_before {
            text = text.trim_end();
        }
        if !text.is_empty() {
            tokens.push(Token::Text(text.to_string()));
        }

        if let Some(expr) = caps.get(1) {
            tokens.push(Token::Expr { inner: expr.as_str().to_string(), offset: whole.start() });
            trim_next = false;
        } else {
            let inner = caps.get(3).map_or("", |g| g.as_str());
            tokens.push(Token::Stmt { inner: inner.to_string(), offset: whole.start() });
            trim_next = caps.get(4).is_some_and(|g| !g.as_str().is_empty());
        }
        last = whole.end();
    }

    let mut rest = &source[last..];
    if trim_next {
        rest = rest.trim_start();
    }
    if !rest.is_empty() {
        tokens.push(Token::Text(rest.to_string()));
    }
    tokens
}

enum Stop {
    Elif(Condition),
    Else,
    Endif,
}

impl Stop {
    fn keyword(&self) -> &'static str {
        match self {
            Stop::Elif(_) => "elif",
            Stop::Else => "else",
            Stop::Endif => "endif",
        }
    }
}

enum Statement {
    If(Condition),
    Stop(Stop),
}

struct Parser {
    tokens: std::vec::IntoIter<Token>,
}

impl Parser {
    /// Parse nodes until a block-ending statement or end of input.
    fn parse_block(&mut self) -> Result<(Vec<Node>, Option<(Stop, usize)>), TemplateError> {
        let mut nodes = Vec::new();
        while let Some(token) = self.tokens.next() {
            match token {
                Token::Text(t) => nodes.push(Node::Text(t)),
                Token::Expr { inner, offset } => nodes.push(parse_param(&inner, offset)?),
                Token::Stmt { inner, offset } => match parse_statement(&inner, offset)? {
                    Statement::If(cond) => nodes.push(self.parse_if(cond, offset)?),
                    Statement::Stop(stop) => return Ok((nodes, Some((stop, offset)))),
                },
            }
        }
        Ok((nodes, None))
    }

    fn parse_if(&mut self, first: Condition, open: usize) -> Result<Node, TemplateError> {
        let mut branches = Vec::new();
        let mut condition = first;
        loop {
            let (body, stop) = self.parse_block()?;
            branches.push(Branch { condition, body });
            match stop {
                Some((Stop::Elif(next), _)) => condition = next,
                Some((Stop::Endif, _)) => {
                    return Ok(Node::Conditional { branches, otherwise: None });
                }
                Some((Stop::Else, _)) => {
                    let (body, stop) = self.parse_block()?;
                    return match stop {
                        Some((Stop::Endif, _)) => {
                            Ok(Node::Conditional { branches, otherwise: Some(body) })
                        }
                        Some((other, offset)) => Err(TemplateError::syntax(
                            offset,
                            format!("`{}` after `else`", other.keyword()),
                        )),
                        None => Err(TemplateError::syntax(open, "unclosed `if` block")),
                    };
                }
                None => return Err(TemplateError::syntax(open, "unclosed `if` block")),
            }
        }
    }
}

fn parse_statement(inner: &str, offset: usize) -> Result<Statement, TemplateError> {
    let inner = inner.trim();
    let (keyword, rest) = match inner.split_once(char::is_whitespace) {
        Some((k, r)) => (k, r.trim()),
        None => (inner, ""),
    };
    match keyword {
        "if" => Ok(Statement::If(parse_condition(rest, offset)?)),
        "elif" => Ok(Statement::Stop(Stop::Elif(parse_condition(rest, offset)?))),
        "else" | "endif" if !rest.is_empty() => Err(TemplateError::syntax(
            offset,
            format!("unexpected text after `{keyword}`: {rest}"),
        )),
        "else" => Ok(Statement::Stop(Stop::Else)),
        "endif" => Ok(Statement::Stop(Stop::Endif)),
        "" => Err(TemplateError::syntax(offset, "empty statement")),
        other => Err(TemplateError::syntax(offset, format!("unknown statement `{other}`"))),
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Lex {
    Ident(String),
    Str(String),
    Eq,
    Ne,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Pipe,
}

fn lex(input: &str, offset: usize) -> Result<Vec<Lex>, TemplateError> {
    let mut out = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '(' | ')' | '[' | ']' | ',' | '|' => {
                chars.next();
                out.push(match c {
                    '(' => Lex::LParen,
                    ')' => Lex::RParen,
                    '[' => Lex::LBracket,
                    ']' => Lex::RBracket,
                    ',' => Lex::Comma,
                    _ => Lex::Pipe,
                });
            }
            '=' | '!' => {
                chars.next();
                if chars.next() != Some('=') {
                    return Err(TemplateError::syntax(offset, format!("expected `{c}=`")));
                }
                out.push(if c == '=' { Lex::Eq } else { Lex::Ne });
            }
            '"' | '\'' => {
                chars.next();
                let mut s = String::new();
                loop {
                    match chars.next() {
                        Some('\\') => match chars.next() {
                            Some(escaped) => s.push(escaped),
                            None => break,
                        },
                        Some(ch) if ch == c => {
                            out.push(Lex::Str(s));
                            break;
                        }
                        Some(ch) => s.push(ch),
                        None => {
                            return Err(TemplateError::syntax(
                                offset,
                                "unterminated string literal",
                            ));
                        }
                    }
                }
            }
            c if c.is_ascii_digit() || c == '-' || c == '.' => {
                let mut s = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_digit() || d == '.' || d == '-' {
                        s.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                out.push(Lex::Str(s));
            }
            c if c.is_alphabetic() || c == '_' => {
                let mut s = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_alphanumeric() || d == '_' {
                        s.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                out.push(Lex::Ident(s));
            }
            other => {
                return Err(TemplateError::syntax(
                    offset,
                    format!("unexpected character `{other}`"),
                ));
            }
        }
    }
    Ok(out)
}

/// Cursor over lexed tokens shared by expression and condition parsing.
struct Cursor {
    toks: Vec<Lex>,
    pos: usize,
    offset: usize,
}

impl Cursor {
    fn new(input: &str, offset: usize) -> Result<Self, TemplateError> {
        Ok(Self { toks: lex(input, offset)?, pos: 0, offset })
    }

    fn peek(&self) -> Option<&Lex> {
        self.toks.get(self.pos)
    }

    fn peek_keyword(&self, kw: &str) -> bool {
        matches!(self.peek(), Some(Lex::Ident(s)) if s == kw)
    }

    fn next(&mut self) -> Option<Lex> {
        let tok = self.toks.get(self.pos).cloned();
        self.pos += 1;
        tok
    }

    fn expect(&mut self, want: &Lex, what: &str) -> Result<(), TemplateError> {
        match self.next() {
            Some(ref got) if got == want => Ok(()),
            _ => Err(self.error(format!("expected {what}"))),
        }
    }

    fn expect_keyword(&mut self, kw: &str) -> Result<(), TemplateError> {
        if self.peek_keyword(kw) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error(format!("expected `{kw}`")))
        }
    }

    fn name(&mut self) -> Result<String, TemplateError> {
        match self.next() {
            Some(Lex::Ident(s)) if !KEYWORDS.contains(&s.as_str()) => Ok(s),
            Some(Lex::Ident(s)) => {
                Err(self.error(format!("`{s}` is reserved and cannot name a parameter")))
            }
            _ => Err(self.error("expected a parameter name".to_string())),
        }
    }

    fn literal(&mut self) -> Result<String, TemplateError> {
        match self.next() {
            Some(Lex::Str(s)) => Ok(s),
            _ => Err(self.error("expected a quoted string".to_string())),
        }
    }

    fn list(&mut self) -> Result<Vec<String>, TemplateError> {
        self.expect(&Lex::LBracket, "`[`")?;
        let mut items = Vec::new();
        loop {
            if self.peek() == Some(&Lex::RBracket) {
                self.pos += 1;
                return Ok(items);
            }
            items.push(self.literal()?);
            match self.next() {
                Some(Lex::Comma) => {}
                Some(Lex::RBracket) => return Ok(items),
                _ => return Err(self.error("expected `,` or `]`".to_string())),
            }
        }
    }

    fn finish(&self) -> Result<(), TemplateError> {
        match self.peek() {
            None => Ok(()),
            Some(tok) => Err(self.error(format!("unexpected trailing {tok:?}"))),
        }
    }

    fn error(&self, message: String) -> TemplateError {
        TemplateError::syntax(self.offset, message)
    }
}

fn parse_param(inner: &str, offset: usize) -> Result<Node, TemplateError> {
    let mut cur = Cursor::new(inner, offset)?;
    let name = cur.name()?;
    let mut filters = Vec::new();

    while cur.peek() == Some(&Lex::Pipe) {
        cur.pos += 1;
        let filter = match cur.next() {
            Some(Lex::Ident(f)) => f,
            _ => return Err(cur.error("expected a filter name after `|`".to_string())),
        };
        filters.push(match filter.as_str() {
            "default" | "d" => {
                cur.expect(&Lex::LParen, "`(`")?;
                let fallback = cur.literal()?;
                cur.expect(&Lex::RParen, "`)`")?;
                Filter::Default(fallback)
            }
            "lower" | "lowercase" => Filter::Lower,
            "upper" | "uppercase" => Filter::Upper,
            "title" => Filter::Title,
            "trim" => Filter::Trim,
            "underscore" => Filter::Underscore,
            other => return Err(cur.error(format!("unknown filter `{other}`"))),
        });
    }
    cur.finish()?;
    Ok(Node::Param { name, filters })
}

fn parse_condition(input: &str, offset: usize) -> Result<Condition, TemplateError> {
    if input.trim().is_empty() {
        return Err(TemplateError::syntax(offset, "missing condition"));
    }
    let mut cur = Cursor::new(input, offset)?;
    let cond = parse_or(&mut cur)?;
    cur.finish()?;
    Ok(cond)
}

fn parse_or(cur: &mut Cursor) -> Result<Condition, TemplateError> {
    let mut left = parse_and(cur)?;
    while cur.peek_keyword("or") {
        cur.pos += 1;
        let right = parse_and(cur)?;
        left = Condition::Or(Box::new(left), Box::new(right));
    }
    Ok(left)
}

fn parse_and(cur: &mut Cursor) -> Result<Condition, TemplateError> {
    let mut left = parse_not(cur)?;
    while cur.peek_keyword("and") {
        cur.pos += 1;
        let right = parse_not(cur)?;
        left = Condition::And(Box::new(left), Box::new(right));
    }
    Ok(left)
}

fn parse_not(cur: &mut Cursor) -> Result<Condition, TemplateError> {
    if cur.peek_keyword("not") {
        cur.pos += 1;
        return Ok(Condition::Not(Box::new(parse_not(cur)?)));
    }
    parse_atom(cur)
}

fn parse_atom(cur: &mut Cursor) -> Result<Condition, TemplateError> {
    if cur.peek() == Some(&Lex::LParen) {
        cur.pos += 1;
        let inner = parse_or(cur)?;
        cur.expect(&Lex::RParen, "`)`")?;
        return Ok(inner);
    }

    let name = cur.name()?;
    match cur.peek() {
        Some(Lex::Eq) => {
            cur.pos += 1;
            Ok(Condition::Eq(name, cur.literal()?))
        }
        Some(Lex::Ne) => {
            cur.pos += 1;
            Ok(Condition::Ne(name, cur.literal()?))
        }
        Some(Lex::Ident(kw)) if kw == "in" => {
            cur.pos += 1;
            Ok(Condition::In(name, cur.list()?))
        }
        Some(Lex::Ident(kw)) if kw == "not" => {
            cur.pos += 1;
            cur.expect_keyword("in")?;
            Ok(Condition::Not(Box::new(Condition::In(name, cur.list()?))))
        }
        Some(Lex::Ident(kw)) if kw == "is" => {
            cur.pos += 1;
            let negated = cur.peek_keyword("not");
            if negated {
                cur.pos += 1;
            }
            cur.expect_keyword("defined")?;
            let cond = Condition::Defined(name);
            Ok(if negated { Condition::Not(Box::new(cond)) } else { cond })
        }
        _ => Ok(Condition::Truthy(name)),
    }
}
