//! Token stream for the selector surface syntax.

use crate::error::{CouchError, Result};

/// One lexical token of the selector language.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    Ident(String),
    Int(i64),
    Float(f64),
    Str(String),
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Dot,
    Lt,
    Le,
    EqEq,
    Ne,
    Ge,
    Gt,
    AndAnd,
    OrOr,
    Not,
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Ident(name) => write!(f, "{name}"),
            Token::Int(v) => write!(f, "{v}"),
            Token::Float(v) => write!(f, "{v}"),
            Token::Str(s) => write!(f, "\"{s}\""),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::LBracket => write!(f, "["),
            Token::RBracket => write!(f, "]"),
            Token::LBrace => write!(f, "{{"),
            Token::RBrace => write!(f, "}}"),
            Token::Comma => write!(f, ","),
            Token::Dot => write!(f, "."),
            Token::Lt => write!(f, "<"),
            Token::Le => write!(f, "<="),
            Token::EqEq => write!(f, "=="),
            Token::Ne => write!(f, "!="),
            Token::Ge => write!(f, ">="),
            Token::Gt => write!(f, ">"),
            Token::AndAnd => write!(f, "&&"),
            Token::OrOr => write!(f, "||"),
            Token::Not => write!(f, "!"),
        }
    }
}

/// Split a selector expression into tokens.
pub(crate) fn lex(input: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&ch) = chars.peek() {
        match ch {
            c if c.is_whitespace() => {
                chars.next();
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            '[' => {
                chars.next();
                tokens.push(Token::LBracket);
            }
            ']' => {
                chars.next();
                tokens.push(Token::RBracket);
            }
            '{' => {
                chars.next();
                tokens.push(Token::LBrace);
            }
            '}' => {
                chars.next();
                tokens.push(Token::RBrace);
            }
            ',' => {
                chars.next();
                tokens.push(Token::Comma);
            }
            '.' => {
                chars.next();
                tokens.push(Token::Dot);
            }
            '<' => {
                chars.next();
                if chars.peek() == Some(&'=') {
                    chars.next();
                    tokens.push(Token::Le);
                } else {
                    tokens.push(Token::Lt);
                }
            }
            '>' => {
                chars.next();
                if chars.peek() == Some(&'=') {
                    chars.next();
                    tokens.push(Token::Ge);
                } else {
                    tokens.push(Token::Gt);
                }
            }
            '=' => {
                chars.next();
                if chars.peek() == Some(&'=') {
                    chars.next();
                    tokens.push(Token::EqEq);
                } else {
                    return Err(CouchError::Selector(
                        "single '=' is not an operator, use '=='".into(),
                    ));
                }
            }
            '!' => {
                chars.next();
                if chars.peek() == Some(&'=') {
                    chars.next();
                    tokens.push(Token::Ne);
                } else {
                    tokens.push(Token::Not);
                }
            }
            '&' => {
                chars.next();
                if chars.peek() == Some(&'&') {
                    chars.next();
                    tokens.push(Token::AndAnd);
                } else {
                    return Err(CouchError::Selector("single '&' is not an operator".into()));
                }
            }
            '|' => {
                chars.next();
                if chars.peek() == Some(&'|') {
                    chars.next();
                    tokens.push(Token::OrOr);
                } else {
                    return Err(CouchError::Selector("single '|' is not an operator".into()));
                }
            }
            '"' => {
                chars.next();
                let mut value = String::new();
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') => match chars.next() {
                            Some('"') => value.push('"'),
                            Some('\\') => value.push('\\'),
                            Some('n') => value.push('\n'),
                            Some('t') => value.push('\t'),
                            Some('r') => value.push('\r'),
                            Some(other) => {
                                return Err(CouchError::Selector(format!(
                                    "unknown escape sequence \\{other}"
                                )))
                            }
                            None => {
                                return Err(CouchError::Selector(
                                    "unterminated string literal".into(),
                                ))
                            }
                        },
                        Some(other) => value.push(other),
                        None => {
                            return Err(CouchError::Selector("unterminated string literal".into()))
                        }
                    }
                }
                tokens.push(Token::Str(value));
            }
            '-' => {
                chars.next();
                match chars.peek() {
                    Some(c) if c.is_ascii_digit() => {
                        let token = lex_number(&mut chars, true)?;
                        tokens.push(token);
                    }
                    _ => {
                        return Err(CouchError::Selector(
                            "'-' must be followed by a number".into(),
                        ))
                    }
                }
            }
            c if c.is_ascii_digit() => {
                let token = lex_number(&mut chars, false)?;
                tokens.push(token);
            }
            c if c.is_alphabetic() || c == '_' => {
                let mut name = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_alphanumeric() || c == '_' {
                        name.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Ident(name));
            }
            other => {
                return Err(CouchError::Selector(format!(
                    "unexpected character '{other}'"
                )))
            }
        }
    }
    Ok(tokens)
}

fn lex_number(
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
    negative: bool,
) -> Result<Token> {
    let mut text = String::new();
    if negative {
        text.push('-');
    }
    let mut is_float = false;
    while let Some(&c) = chars.peek() {
        if c.is_ascii_digit() {
            text.push(c);
            chars.next();
        } else if c == '.' {
            // A digit must follow, otherwise the dot belongs to a field
            // chain and the number ends here.
            let mut lookahead = chars.clone();
            lookahead.next();
            match lookahead.peek() {
                Some(d) if d.is_ascii_digit() => {
                    is_float = true;
                    text.push('.');
                    chars.next();
                }
                _ => break,
            }
        } else if c == 'e' || c == 'E' {
            is_float = true;
            text.push(c);
            chars.next();
            if let Some(&sign) = chars.peek() {
                if sign == '+' || sign == '-' {
                    text.push(sign);
                    chars.next();
                }
            }
        } else {
            break;
        }
    }
    if is_float {
        text.parse::<f64>()
            .map(Token::Float)
            .map_err(|_| CouchError::Selector(format!("invalid number literal {text}")))
    } else {
        text.parse::<i64>()
            .map(Token::Int)
            .map_err(|_| CouchError::Selector(format!("invalid number literal {text}")))
    }
}
