//! Hand-written, char-by-char lexer, restartable and line/column aware.
//!
//! Lex errors are never fatal by themselves: a diagnostic is logged and the
//! lexer substitutes a zero `Int` token so the caller can keep going. Fatal
//! abort-on-error-count is a parser/assembler-level decision (see `context`).

use crate::token::{Token, TokenKind};
use log::warn;

pub struct Lexer<'a> {
    source: &'a [u8],
    file: String,
    pos: usize,
    line: u32,
    col: u32,
    pub error_count: u32,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str, file: impl Into<String>) -> Lexer<'a> {
        Lexer {
            source: source.as_bytes(),
            file: file.into(),
            pos: 0,
            line: 1,
            col: 1,
            error_count: 0,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.source.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.source.get(self.pos + offset).copied()
    }

    fn step(&mut self) -> Option<u8> {
        let c = self.peek()?;
        self.pos += 1;
        if c == b'\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(c)
    }

    fn error(&mut self, message: &str) {
        self.error_count += 1;
        warn!("{}:{}:{}: error: {}", self.file, self.line, self.col, message);
    }

    pub fn next_token(&mut self) -> Token {
        loop {
            match self.peek() {
                Some(b' ') | Some(b'\t') | Some(b'\r') => {
                    self.step();
                    continue;
                }
                Some(b'[') | Some(b']') => {
                    // Bracket punctuation is a disassembler display affordance
                    // only; the opcode's own mnemonic already fixes its
                    // operand mode, so brackets carry no information here and
                    // are simply skipped, the same way whitespace is.
                    self.step();
                    continue;
                }
                Some(b';') => {
                    while let Some(c) = self.peek() {
                        if c == b'\n' {
                            break;
                        }
                        self.step();
                    }
                    continue;
                }
                _ => break,
            }
        }

        let (line, col) = (self.line, self.col);

        match self.peek() {
            None => Token::new(TokenKind::Eof, "", line, col),
            Some(b'\n') => {
                self.step();
                Token::new(TokenKind::Eol, "\n", line, col)
            }
            Some(b':') => {
                self.step();
                Token::new(TokenKind::Colon, ":", line, col)
            }
            Some(b'\'') => self.lex_char(line, col),
            Some(c) if c == b'-' || c.is_ascii_digit() => self.lex_number(line, col),
            Some(c) if c == b'_' || c == b'.' || c.is_ascii_alphabetic() => self.lex_ident(line, col),
            Some(c) => {
                self.step();
                self.error(&format!("unexpected character '{}'", c as char));
                Token::int(0, (c as char).to_string(), line, col)
            }
        }
    }

    fn lex_ident(&mut self, line: u32, col: u32) -> Token {
        let start = self.pos;
        // A leading '.' is allowed so section directives (`.text`, `.data`)
        // lex as plain identifiers rather than needing their own token kind.
        if self.peek() == Some(b'.') {
            self.step();
        }
        while matches!(self.peek(), Some(c) if c == b'_' || c.is_ascii_alphanumeric()) {
            self.step();
        }
        let text = String::from_utf8_lossy(&self.source[start..self.pos]).to_lowercase();
        Token::new(TokenKind::Ident, text, line, col)
    }

    fn lex_char(&mut self, line: u32, col: u32) -> Token {
        self.step(); // opening quote
        let value = match self.step() {
            Some(b'\\') => match self.step() {
                Some(b'n') => 10,
                Some(b't') => 9,
                Some(b'r') => 13,
                Some(b'0') => 0,
                Some(b'\'') => b'\'' as i64,
                Some(b'"') => b'"' as i64,
                Some(b'\\') => b'\\' as i64,
                Some(other) => {
                    self.error(&format!("unsupported escape '\\{}'", other as char));
                    0
                }
                None => {
                    self.error("unterminated character constant");
                    return Token::int(0, "", line, col);
                }
            },
            Some(c) => c as i64,
            None => {
                self.error("unterminated character constant");
                return Token::int(0, "", line, col);
            }
        };

        if self.peek() == Some(b'\'') {
            self.step();
        } else {
            self.error("unterminated character constant");
        }

        Token::int(value, format!("'{}'", value as u8 as char), line, col)
    }

    fn lex_number(&mut self, line: u32, col: u32) -> Token {
        let start = self.pos;
        let negative = self.peek() == Some(b'-');
        if negative {
            self.step();
        }

        if self.peek() == Some(b'0') && matches!(self.peek_at(1), Some(b'x') | Some(b'X')) {
            self.step();
            self.step();
            return self.lex_radix_digits(16, start, line, col, negative);
        }

        if self.peek() == Some(b'0') && matches!(self.peek_at(1), Some(b'0'..=b'7')) {
            self.step();
            return self.lex_radix_digits(8, start, line, col, negative);
        }

        let digits_start = self.pos;
        let mut saw_dot = false;
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() || c == b'_' {
                self.step();
            } else if c == b'.' && !saw_dot {
                saw_dot = true;
                self.step();
            } else {
                break;
            }
        }

        // Trailing radix suffix: h(ex)/o(ctal)/b(inary), re-rendered as decimal.
        let radix = match self.peek() {
            Some(b'h') => Some(16),
            Some(b'o') => Some(8),
            Some(b'b') => Some(2),
            _ => None,
        };
        if let Some(radix) = radix {
            let digits: String = String::from_utf8_lossy(&self.source[digits_start..self.pos])
                .chars()
                .filter(|c| *c != '_')
                .collect();
            self.step();
            return self.finish_number(&digits, radix, negative, start, line, col);
        }

        if self.peek() == Some(b'f') {
            self.step();
            saw_dot = true;
        }

        let text = String::from_utf8_lossy(&self.source[start..self.pos]).to_string();

        if saw_dot {
            self.error("floating point literals are not supported");
            return Token::int(0, text, line, col);
        }

        let digits: String = text.trim_start_matches('-').chars().filter(|c| *c != '_').collect();
        self.finish_number(&digits, 10, negative, start, line, col)
    }

    fn lex_radix_digits(&mut self, radix: u32, start: usize, line: u32, col: u32, negative: bool) -> Token {
        let digits_start = self.pos;
        while matches!(self.peek(), Some(c) if (c as char).is_digit(radix) || c == b'_') {
            self.step();
        }
        let digits: String = String::from_utf8_lossy(&self.source[digits_start..self.pos])
            .chars()
            .filter(|c| *c != '_')
            .collect();
        self.finish_number(&digits, radix, negative, start, line, col)
    }

    fn finish_number(&mut self, digits: &str, radix: u32, negative: bool, start: usize, line: u32, col: u32) -> Token {
        let text = String::from_utf8_lossy(&self.source[start..self.pos]).to_string();
        match i64::from_str_radix(digits, radix) {
            Ok(value) => Token::int(if negative { -value } else { value }, text, line, col),
            Err(_) => {
                self.error(&format!("integer literal '{}' out of range or malformed", text));
                Token::int(0, text, line, col)
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn tokens(source: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(source, "test.asm");
        let mut out = Vec::new();
        loop {
            let tok = lexer.next_token();
            let done = tok.kind == TokenKind::Eof;
            out.push(tok);
            if done {
                break;
            }
        }
        out
    }

    #[test]
    fn lexes_identifier_and_lowercases_it() {
        let toks = tokens("LdI");
        assert_eq!(toks[0].kind, TokenKind::Ident);
        assert_eq!(toks[0].text, "ldi");
    }

    #[test]
    fn lexes_negative_decimal() {
        let toks = tokens("-42");
        assert_eq!(toks[0].value, -42);
    }

    #[test]
    fn lexes_hex_and_octal_prefixes() {
        assert_eq!(tokens("0xff")[0].value, 255);
        assert_eq!(tokens("017")[0].value, 15);
    }

    #[test]
    fn lexes_radix_suffixes() {
        assert_eq!(tokens("ffh")[0].value, 255);
        assert_eq!(tokens("101b")[0].value, 5);
    }

    #[test]
    fn underscore_is_a_digit_separator() {
        assert_eq!(tokens("1_000")[0].value, 1000);
    }

    #[test]
    fn lexes_char_literal_with_escape() {
        assert_eq!(tokens("'\\n'")[0].value, 10);
        assert_eq!(tokens("'a'")[0].value, b'a' as i64);
    }

    #[test]
    fn unterminated_char_literal_is_a_counted_error() {
        let mut lexer = Lexer::new("'a", "test.asm");
        lexer.next_token();
        assert_eq!(lexer.error_count, 1);
    }

    #[test]
    fn comment_runs_to_end_of_line_not_past_it() {
        let toks = tokens("ldi 1 ; comment\nhlt");
        let kinds: Vec<_> = toks.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Ident,
                TokenKind::Int,
                TokenKind::Eol,
                TokenKind::Ident,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn brackets_are_transparent_punctuation() {
        let toks = tokens("ldm [4]");
        assert_eq!(toks[0].kind, TokenKind::Ident);
        assert_eq!(toks[1].kind, TokenKind::Int);
        assert_eq!(toks[1].value, 4);
    }

    #[test]
    fn section_directive_lexes_as_a_single_identifier() {
        let toks = tokens(".text");
        assert_eq!(toks[0].kind, TokenKind::Ident);
        assert_eq!(toks[0].text, ".text");
    }

    #[test]
    fn float_literal_is_a_counted_error_substituted_zero() {
        let mut lexer = Lexer::new("3.14", "test.asm");
        let tok = lexer.next_token();
        assert_eq!(tok.value, 0);
        assert_eq!(lexer.error_count, 1);
    }
}
