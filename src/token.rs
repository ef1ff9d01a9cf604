//! # token.rs
//!
//! This module lexes raw expression text into a flat, ordered sequence of
//! typed [`Token`]s.
//!
//! The tokenizer recognizes whitespace (skipped), single-character operators
//! and delimiters (`+ - * / ^ ( ) { } ,`), identifiers (a letter followed by
//! letters or digits, classified as [`TokenKind::Function`] when immediately
//! followed by `(`), and numeric literals (digits, at most one decimal point,
//! an optional exponent, and an optional imaginary-unit suffix `i`/`j`).
//! Every token sequence terminates with exactly one [`TokenKind::End`] token
//! whose value is `"$"`; the tree builder uses it as its lookahead
//! terminator.
//!
//! The post-processing of numeric literals is the tokenizer's one
//! specialization point, selected by [`ScalarMode`]: the plain tokenizer
//! passes literals through unchanged, while the imaginary-aware tokenizer
//! rewrites a suffixed literal `2i` into the token triple `(2, *, 1i)` so the
//! builder can treat the imaginary unit uniformly as a multiplication.

use crate::error::{ExprError, Result};

/// Value of the end-marker token.
pub const END_MARKER: &str = "$";

/// Canonical scalar-token value meaning "the imaginary unit as a literal
/// coefficient of 1", emitted by the imaginary-aware tokenizer.
pub const IMAGINARY_MARKER: &str = "1i";

/// Classification of a [`Token`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Numeric literal.
    Scalar,
    /// Name that is not immediately followed by `(`: a variable or constant.
    Identifier,
    /// Name immediately followed by `(`.
    Function,
    /// Operator, delimiter or separator.
    Operator,
    /// End of input, value `"$"`.
    End,
}

/// A single lexed token: its raw text and its classification.
///
/// Immutable once created; equality is by value and kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    value: String,
    kind: TokenKind,
}

impl Token {
    /// Creates a new token.
    pub fn new(value: impl Into<String>, kind: TokenKind) -> Self {
        Self {
            value: value.into(),
            kind,
        }
    }

    /// Creates the end-marker token.
    pub fn end() -> Self {
        Self::new(END_MARKER, TokenKind::End)
    }

    /// Returns the raw text of the token.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Returns the token's classification.
    pub fn kind(&self) -> TokenKind {
        self.kind
    }

    /// Returns true when the token is an operator with exactly this text.
    pub fn is_operator(&self, symbol: &str) -> bool {
        self.kind == TokenKind::Operator && self.value == symbol
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.value)
    }
}

/// How the tokenizer post-processes numeric literals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarMode {
    /// Literals pass through unchanged; `2i` stays one `Scalar("2i")` token.
    Plain,
    /// A trailing `i`/`j` suffix is split off: `2i` becomes the token triple
    /// `Scalar("2")`, `Operator("*")`, `Scalar("1i")`.
    Imaginary,
}

type CharIter<'a> = std::iter::Peekable<std::str::CharIndices<'a>>;

/// Lexer for expression text.
///
/// # Examples
///
/// ```
/// use treeform::token::Tokenizer;
///
/// let tokens = Tokenizer::imaginary().tokens("1/2i").unwrap();
/// let values: Vec<&str> = tokens.iter().map(|t| t.value()).collect();
/// assert_eq!(values, ["1", "/", "2", "*", "1i", "$"]);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Tokenizer {
    mode: ScalarMode,
}

impl Tokenizer {
    /// Creates a tokenizer with the given scalar mode.
    pub fn new(mode: ScalarMode) -> Self {
        Self { mode }
    }

    /// Tokenizer that passes numeric literals through unchanged.
    pub fn plain() -> Self {
        Self::new(ScalarMode::Plain)
    }

    /// Tokenizer that splits imaginary-unit suffixes off numeric literals.
    pub fn imaginary() -> Self {
        Self::new(ScalarMode::Imaginary)
    }

    /// Lexes `text` into tokens, ending with exactly one end marker.
    ///
    /// # Errors
    ///
    /// Returns [`ExprError::Syntax`] for a character outside the lexical
    /// grammar or a malformed numeric literal.
    pub fn tokens(&self, text: &str) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        let mut chars = text.char_indices().peekable();

        while let Some((start_idx, ch)) = chars.next() {
            if ch.is_whitespace() {
                continue;
            }

            if ch.is_ascii_digit() {
                let end_idx = lex_number(text, start_idx, start_idx + ch.len_utf8(), &mut chars)?;
                self.push_scalar(&text[start_idx..end_idx], &mut tokens);
            } else if ch.is_ascii_alphabetic() {
                let end_idx = lex_ident(start_idx + ch.len_utf8(), &mut chars);
                // A name immediately followed by `(` is a function call.
                let kind = match chars.peek() {
                    Some(&(_, '(')) => TokenKind::Function,
                    _ => TokenKind::Identifier,
                };
                tokens.push(Token::new(&text[start_idx..end_idx], kind));
            } else if OPERATOR_CHARS.contains(ch) {
                tokens.push(Token::new(ch.to_string(), TokenKind::Operator));
            } else {
                return Err(ExprError::Syntax {
                    found: ch.to_string(),
                });
            }
        }

        tokens.push(Token::end());
        Ok(tokens)
    }

    /// Scalar post-processing hook: the specialization point between the
    /// plain and the imaginary-aware tokenizer.
    fn push_scalar(&self, raw: &str, tokens: &mut Vec<Token>) {
        match self.mode {
            ScalarMode::Plain => tokens.push(Token::new(raw, TokenKind::Scalar)),
            ScalarMode::Imaginary => {
                let stripped = raw.strip_suffix('i').or_else(|| raw.strip_suffix('j'));
                match stripped {
                    Some(number) => {
                        tokens.push(Token::new(number, TokenKind::Scalar));
                        tokens.push(Token::new("*", TokenKind::Operator));
                        tokens.push(Token::new(IMAGINARY_MARKER, TokenKind::Scalar));
                    }
                    None => tokens.push(Token::new(raw, TokenKind::Scalar)),
                }
            }
        }
    }
}

const OPERATOR_CHARS: &str = "+-*/^(){},";

/// Consumes identifier characters and returns the end index.
fn lex_ident(mut end: usize, chars: &mut CharIter) -> usize {
    while let Some(&(idx, ch)) = chars.peek() {
        if ch.is_ascii_alphanumeric() {
            chars.next();
            end = idx + ch.len_utf8();
        } else {
            break;
        }
    }
    end
}

/// Consumes the remainder of a numeric literal and returns its end index.
/// Accepts digits, at most one decimal point, an optional signed exponent and
/// an optional trailing imaginary-unit suffix.
fn lex_number(text: &str, start: usize, mut end: usize, chars: &mut CharIter) -> Result<usize> {
    let mut seen_point = false;

    while let Some(&(idx, ch)) = chars.peek() {
        match ch {
            d if d.is_ascii_digit() => {}
            '.' if !seen_point => seen_point = true,
            'e' | 'E' => {
                // The exponent ends the mantissa; `2e3` but never `2e3e4`.
                chars.next();
                return lex_exponent(text, start, idx + ch.len_utf8(), chars);
            }
            'i' | 'j' => {
                // The suffix only counts when it is not the start of a longer
                // identifier: `2interval` lexes as `2` then `interval`.
                let mut ahead = chars.clone();
                ahead.next();
                if matches!(ahead.peek(), Some(&(_, next)) if next.is_ascii_alphanumeric()) {
                    break;
                }
                chars.next();
                return Ok(idx + ch.len_utf8());
            }
            _ => break,
        }
        chars.next();
        end = idx + ch.len_utf8();
    }

    Ok(end)
}

/// Consumes the exponent part after `e`/`E`: an optional sign then at least
/// one digit, then an optional imaginary-unit suffix.
fn lex_exponent(
    text: &str,
    start: usize,
    mut end: usize,
    chars: &mut CharIter,
) -> Result<usize> {
    if let Some(&(idx, sign @ ('+' | '-'))) = chars.peek() {
        chars.next();
        end = idx + sign.len_utf8();
    }

    let mut digits = 0usize;
    while let Some(&(idx, ch)) = chars.peek() {
        if ch.is_ascii_digit() {
            chars.next();
            end = idx + ch.len_utf8();
            digits += 1;
        } else {
            break;
        }
    }

    if digits == 0 {
        return Err(ExprError::Syntax {
            found: text[start..end].to_string(),
        });
    }

    if let Some(&(idx, suffix @ ('i' | 'j'))) = chars.peek() {
        chars.next();
        end = idx + suffix.len_utf8();
    }

    Ok(end)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(text: &str) -> Vec<Token> {
        Tokenizer::plain().tokens(text).unwrap()
    }

    fn imaginary(text: &str) -> Vec<Token> {
        Tokenizer::imaginary().tokens(text).unwrap()
    }

    fn pairs(tokens: &[Token]) -> Vec<(&str, TokenKind)> {
        tokens.iter().map(|t| (t.value(), t.kind())).collect()
    }

    #[test]
    fn test_empty_input_yields_single_end() {
        assert_eq!(plain(""), vec![Token::end()]);
        assert_eq!(plain("  \t\n "), vec![Token::end()]);
    }

    #[test]
    fn test_function_identifier_and_scalar() {
        let tokens = plain("sin(x + 2) - 3.6");
        assert_eq!(
            pairs(&tokens),
            vec![
                ("sin", TokenKind::Function),
                ("(", TokenKind::Operator),
                ("x", TokenKind::Identifier),
                ("+", TokenKind::Operator),
                ("2", TokenKind::Scalar),
                (")", TokenKind::Operator),
                ("-", TokenKind::Operator),
                ("3.6", TokenKind::Scalar),
                ("$", TokenKind::End),
            ]
        );
    }

    #[test]
    fn test_imaginary_suffix_split() {
        let tokens = imaginary("1/2i");
        assert_eq!(
            pairs(&tokens),
            vec![
                ("1", TokenKind::Scalar),
                ("/", TokenKind::Operator),
                ("2", TokenKind::Scalar),
                ("*", TokenKind::Operator),
                ("1i", TokenKind::Scalar),
                ("$", TokenKind::End),
            ]
        );
    }

    #[test]
    fn test_plain_mode_keeps_suffix() {
        let tokens = plain("1/2i");
        assert_eq!(
            pairs(&tokens),
            vec![
                ("1", TokenKind::Scalar),
                ("/", TokenKind::Operator),
                ("2i", TokenKind::Scalar),
                ("$", TokenKind::End),
            ]
        );
    }

    #[test]
    fn test_j_suffix() {
        let tokens = imaginary("3j");
        assert_eq!(
            pairs(&tokens),
            vec![
                ("3", TokenKind::Scalar),
                ("*", TokenKind::Operator),
                ("1i", TokenKind::Scalar),
                ("$", TokenKind::End),
            ]
        );
    }

    #[test]
    fn test_scientific_notation() {
        assert_eq!(
            pairs(&plain("1.0e+4")),
            vec![("1.0e+4", TokenKind::Scalar), ("$", TokenKind::End)]
        );
        assert_eq!(
            pairs(&plain("2E-3")),
            vec![("2E-3", TokenKind::Scalar), ("$", TokenKind::End)]
        );
    }

    #[test]
    fn test_exponent_with_imaginary_suffix() {
        assert_eq!(
            pairs(&imaginary("2e10i")),
            vec![
                ("2e10", TokenKind::Scalar),
                ("*", TokenKind::Operator),
                ("1i", TokenKind::Scalar),
                ("$", TokenKind::End),
            ]
        );
    }

    #[test]
    fn test_empty_exponent_is_syntax_error() {
        assert!(matches!(
            Tokenizer::plain().tokens("2e").unwrap_err(),
            ExprError::Syntax { .. }
        ));
        assert!(matches!(
            Tokenizer::plain().tokens("2e+").unwrap_err(),
            ExprError::Syntax { .. }
        ));
    }

    #[test]
    fn test_unknown_character_is_syntax_error() {
        let err = Tokenizer::plain().tokens("3 # 4").unwrap_err();
        assert_eq!(err, ExprError::Syntax { found: "#".into() });
        // A literal may not start with a bare decimal point.
        let err = Tokenizer::plain().tokens(".5").unwrap_err();
        assert_eq!(err, ExprError::Syntax { found: ".".into() });
    }

    #[test]
    fn test_second_decimal_point_is_syntax_error() {
        // `1.2.3` lexes `1.2` and then hits a stray `.`.
        let err = Tokenizer::plain().tokens("1.2.3").unwrap_err();
        assert_eq!(err, ExprError::Syntax { found: ".".into() });
    }

    #[test]
    fn test_braces_and_comma_are_operators() {
        assert_eq!(
            pairs(&plain("{1,2}")),
            vec![
                ("{", TokenKind::Operator),
                ("1", TokenKind::Scalar),
                (",", TokenKind::Operator),
                ("2", TokenKind::Scalar),
                ("}", TokenKind::Operator),
                ("$", TokenKind::End),
            ]
        );
    }

    #[test]
    fn test_suffix_not_part_of_longer_identifier() {
        let tokens = imaginary("2interval");
        assert_eq!(
            pairs(&tokens),
            vec![
                ("2", TokenKind::Scalar),
                ("interval", TokenKind::Identifier),
                ("$", TokenKind::End),
            ]
        );
    }

    #[test]
    fn test_function_classification_requires_adjacent_paren() {
        let tokens = plain("sin (x)");
        assert_eq!(tokens[0], Token::new("sin", TokenKind::Identifier));
    }

    #[test]
    fn test_consecutive_operators() {
        assert_eq!(
            pairs(&plain("3*-4")),
            vec![
                ("3", TokenKind::Scalar),
                ("*", TokenKind::Operator),
                ("-", TokenKind::Operator),
                ("4", TokenKind::Scalar),
                ("$", TokenKind::End),
            ]
        );
    }
}
