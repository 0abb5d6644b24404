// tarn-parser - Reader for Tarn source text
// Copyright (c) 2025 the tarn authors. MIT licensed.

//! Reader for Tarn source text.
//!
//! Tokenization happens inline in the recursive reader state; there is no
//! separate token stream. A linear pre-pass validates delimiter nesting
//! first so the reader itself never has to recover from an unbalanced
//! scope.
//!
//! Two rewrites run as each list closes, a poor man's macro layer:
//!
//! - `(defn NAME PARAMS BODY…)` becomes `(def NAME (fn PARAMS BODY…))`
//! - `(. FN OBJ ARGS…)` becomes `(((fnext OBJ) FN) (first OBJ) ARGS…)`
//!
//! `[ … ]` reads as a list with `make-vector` prepended, `{ … }` likewise
//! with `make-map`, and the whole parse is wrapped in `(begin …)`.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

use crate::value::{Heap, ListHandle, Value};

/// Parser error with position information.
#[derive(Debug, Clone)]
pub struct ParseError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Parse error at {}:{}: {}",
            self.line, self.column, self.message
        )
    }
}

impl std::error::Error for ParseError {}

const DELIMITERS: &[u8] = b"(){}[];'";

fn is_space(b: u8) -> bool {
    b.is_ascii_whitespace() || b == b','
}

fn is_delimiter(b: u8) -> bool {
    DELIMITERS.contains(&b)
}

fn line_col(src: &str, pos: usize) -> (usize, usize) {
    let mut line = 1;
    let mut line_start = 0;
    for (i, b) in src.bytes().enumerate().take(pos) {
        if b == b'\n' {
            line += 1;
            line_start = i + 1;
        }
    }
    (line, pos - line_start + 1)
}

fn error_at(src: &str, pos: usize, message: impl Into<String>) -> ParseError {
    let (line, column) = line_col(src, pos);
    ParseError {
        message: message.into(),
        line,
        column,
    }
}

// Integer literals: decimal, a lone zero, hex, binary.
fn int_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?:[-+]?[1-9][0-9]*|0|0[xX][0-9A-Fa-f]+|0[bB][01]+)$")
            .expect("integer literal pattern is valid")
    })
}

// Standard decimal/exponent float form.
fn float_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^([-+]?[0-9]+(\.[0-9]*)?|\.[0-9]+)([eE][-+]?[0-9]+)?$")
            .expect("float literal pattern is valid")
    })
}

// ============================================================================
// Delimiter validation
// ============================================================================

/// Linear pre-pass over `src` checking that `(`/`[`/`{` nest and close
/// correctly, with strings and comments masked out. Reports the first
/// unexpected closer, or the unclosed opener still pending at end of
/// input.
pub fn check_delimiters(src: &str) -> Result<(), ParseError> {
    let bytes = src.as_bytes();
    let mut stack: Vec<(u8, usize)> = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b';' => {
                while i < bytes.len() && bytes[i] != b'\n' {
                    i += 1;
                }
            }
            b'"' => {
                i += 1;
                while i < bytes.len() && bytes[i] != b'"' {
                    if bytes[i] == b'\\' {
                        i += 1;
                    }
                    i += 1;
                }
            }
            b @ (b'(' | b'[' | b'{') => stack.push((b, i)),
            b @ (b')' | b']' | b'}') => {
                let expected = match b {
                    b')' => b'(',
                    b']' => b'[',
                    _ => b'{',
                };
                match stack.pop() {
                    Some((open, _)) if open == expected => {}
                    _ => {
                        return Err(error_at(
                            src,
                            i,
                            format!("unexpected closing '{}'", b as char),
                        ));
                    }
                }
            }
            _ => {}
        }
        i += 1;
    }
    if let Some((open, pos)) = stack.pop() {
        return Err(error_at(
            src,
            pos,
            format!("'{}' was never closed", open as char),
        ));
    }
    Ok(())
}

// ============================================================================
// Reader
// ============================================================================

/// Parse a whole program into a single `(begin …)` value tree.
pub fn parse_source(src: &str, heap: &Heap) -> Result<Value, ParseError> {
    check_delimiters(src)?;
    let mut reader = Reader {
        src,
        bytes: src.as_bytes(),
        pos: 0,
        heap,
    };
    let forms = reader.parse_forms()?;
    let list = reader.finalize_list(forms)?;
    Ok(Value::list(list.prepend(Value::symbol("begin"))))
}

struct Reader<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
    heap: &'a Heap,
}

impl<'a> Reader<'a> {
    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn error(&self, pos: usize, message: impl Into<String>) -> ParseError {
        error_at(self.src, pos, message)
    }

    /// Read forms until a closing delimiter or end of input. The matching
    /// of closers was verified by the pre-pass, so any closer ends the
    /// current scope.
    fn parse_forms(&mut self) -> Result<Vec<Value>, ParseError> {
        let mut forms = Vec::new();
        let mut quote_at: Option<usize> = None;
        loop {
            match self.peek() {
                None => break,
                Some(b';') => {
                    while let Some(b) = self.peek() {
                        if b == b'\n' {
                            break;
                        }
                        self.pos += 1;
                    }
                }
                Some(b) if is_space(b) => self.pos += 1,
                Some(b')') | Some(b']') | Some(b'}') => {
                    self.pos += 1;
                    break;
                }
                Some(b'\'') => {
                    quote_at = Some(self.pos);
                    self.pos += 1;
                }
                Some(_) => {
                    let value = self.read_value()?;
                    if quote_at.take().is_some() {
                        let quoted = self
                            .heap
                            .list_from_iter(vec![Value::symbol("quote"), value]);
                        forms.push(Value::list(quoted));
                    } else {
                        forms.push(value);
                    }
                }
            }
        }
        if let Some(pos) = quote_at {
            return Err(self.error(pos, "quote cannot be empty"));
        }
        Ok(forms)
    }

    fn read_value(&mut self) -> Result<Value, ParseError> {
        match self.peek() {
            Some(b'"') => self.read_string(),
            Some(b'(') => {
                self.pos += 1;
                let forms = self.parse_forms()?;
                Ok(Value::list(self.finalize_list(forms)?))
            }
            Some(b'[') => {
                self.pos += 1;
                let forms = self.parse_forms()?;
                let list = self.finalize_list(forms)?;
                Ok(Value::list(list.prepend(Value::symbol("make-vector"))))
            }
            Some(b'{') => {
                self.pos += 1;
                let forms = self.parse_forms()?;
                let list = self.finalize_list(forms)?;
                Ok(Value::list(list.prepend(Value::symbol("make-map"))))
            }
            Some(_) => {
                if let Some(number) = self.try_read_number() {
                    Ok(number)
                } else {
                    Ok(self.read_symbol())
                }
            }
            None => Err(self.error(self.pos, "unexpected end of input")),
        }
    }

    fn read_string(&mut self) -> Result<Value, ParseError> {
        let open = self.pos;
        let start = self.pos + 1;
        let mut i = start;
        let mut closed = false;
        while i < self.bytes.len() {
            match self.bytes[i] {
                b'\\' => i += 2,
                b'"' => {
                    closed = true;
                    break;
                }
                _ => i += 1,
            }
        }
        if !closed || i > self.bytes.len() {
            return Err(self.error(open, "unterminated string"));
        }
        let raw = &self.src[start..i];
        self.pos = i + 1;
        Ok(Value::string(unescape(raw)))
    }

    fn token_end(&self, start: usize) -> usize {
        let mut end = start + 1;
        while end < self.bytes.len() && !is_space(self.bytes[end]) && !is_delimiter(self.bytes[end])
        {
            end += 1;
        }
        end
    }

    /// Numbers are recognised first: the integer rule, then the float
    /// rule. A token that starts numerically but matches neither reads as
    /// a symbol.
    fn try_read_number(&mut self) -> Option<Value> {
        let b = self.peek()?;
        let next_is_digit = self
            .bytes
            .get(self.pos + 1)
            .is_some_and(|c| c.is_ascii_digit());
        if !(b.is_ascii_digit() || ((b == b'+' || b == b'-') && next_is_digit)) {
            return None;
        }
        let end = self.token_end(self.pos);
        let token = &self.src[self.pos..end];
        let value = parse_number_token(token)?;
        self.pos = end;
        Some(value)
    }

    fn read_symbol(&mut self) -> Value {
        let end = self.token_end(self.pos);
        let token = &self.src[self.pos..end];
        self.pos = end;
        match token {
            "nil" => Value::nil(),
            "true" => Value::bool(true),
            "false" => Value::bool(false),
            _ => Value::symbol(token),
        }
    }

    /// Build the list for a closed scope, applying the rewrites keyed on
    /// the head symbol.
    fn finalize_list(&self, forms: Vec<Value>) -> Result<ListHandle, ParseError> {
        match forms.first() {
            Some(head) if head.is_symbol_named("defn") => self.rewrite_defn(forms),
            Some(head) if head.is_symbol_named(".") => self.rewrite_member_call(forms),
            _ => Ok(self.heap.list_from_iter(forms)),
        }
    }

    // (defn NAME PARAMS BODY…) → (def NAME (fn PARAMS BODY…))
    fn rewrite_defn(&self, forms: Vec<Value>) -> Result<ListHandle, ParseError> {
        if forms.len() < 4 {
            return Err(self.error(self.pos, "defn needs a name, parameters and a body"));
        }
        let name = forms[1].clone();
        let mut lambda = vec![Value::symbol("fn")];
        lambda.extend(forms.into_iter().skip(2));
        let lambda = Value::list(self.heap.list_from_iter(lambda));
        Ok(self
            .heap
            .list_from_iter(vec![Value::symbol("def"), name, lambda]))
    }

    // (. FN OBJ ARGS…) → (((fnext OBJ) FN) (first OBJ) ARGS…)
    // An object is expected to be a two-element list of a handle and a
    // dispatch map from method names to functions.
    fn rewrite_member_call(&self, forms: Vec<Value>) -> Result<ListHandle, ParseError> {
        if forms.len() < 3 {
            return Err(self.error(self.pos, "method call needs a function name and an object"));
        }
        let fun = forms[1].clone();
        let obj = forms[2].clone();
        let fnext_obj = Value::list(
            self.heap
                .list_from_iter(vec![Value::symbol("fnext"), obj.clone()]),
        );
        let lookup = Value::list(self.heap.list_from_iter(vec![fnext_obj, fun]));
        let first_obj = Value::list(self.heap.list_from_iter(vec![Value::symbol("first"), obj]));
        let mut out = vec![lookup, first_obj];
        out.extend(forms.into_iter().skip(3));
        Ok(self.heap.list_from_iter(out))
    }
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut escaped = false;
    for c in raw.chars() {
        if escaped {
            out.push(match c {
                'n' => '\n',
                'r' => '\r',
                't' => '\t',
                'b' => '\u{0008}',
                'f' => '\u{000C}',
                other => other,
            });
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else {
            out.push(c);
        }
    }
    out
}

fn parse_number_token(token: &str) -> Option<Value> {
    if int_pattern().is_match(token) {
        let parsed = if let Some(hex) = token.strip_prefix("0x").or_else(|| token.strip_prefix("0X"))
        {
            i64::from_str_radix(hex, 16)
        } else if let Some(bin) = token.strip_prefix("0b").or_else(|| token.strip_prefix("0B")) {
            i64::from_str_radix(bin, 2)
        } else {
            token.parse::<i64>()
        };
        if let Ok(i) = parsed {
            return Some(Value::int(i));
        }
        // Out-of-range integers fall through to the float rule.
    }
    if float_pattern().is_match(token) {
        return token.parse::<f64>().ok().map(Value::float);
    }
    None
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(src: &str) -> Result<Value, ParseError> {
        let heap = Heap::new();
        parse_source(src, &heap)
    }

    /// Strip the `(begin …)` wrapper and return the top-level forms.
    fn top_forms(src: &str) -> Vec<Value> {
        let parsed = parse(src).expect("parse failed");
        let list = parsed.as_list().expect("not a list").clone();
        assert!(list.first().expect("empty parse").is_symbol_named("begin"));
        list.rest().iter().collect()
    }

    fn list_items(v: &Value) -> Vec<Value> {
        v.as_list().expect("not a list").iter().collect()
    }

    #[test]
    fn parses_scalars() {
        let forms = top_forms("42 -7 +3 2.5 -0.5 1e3 \"hi\" foo nil true false");
        assert_eq!(forms[0], Value::int(42));
        assert_eq!(forms[1], Value::int(-7));
        assert_eq!(forms[2], Value::int(3));
        assert_eq!(forms[3], Value::float(2.5));
        assert_eq!(forms[4], Value::float(-0.5));
        assert_eq!(forms[5], Value::float(1000.0));
        assert_eq!(forms[6], Value::string("hi"));
        assert_eq!(forms[7], Value::symbol("foo"));
        assert_eq!(forms[8], Value::nil());
        assert_eq!(forms[9], Value::bool(true));
        assert_eq!(forms[10], Value::bool(false));
    }

    #[test]
    fn parses_radix_literals() {
        let forms = top_forms("0 0x1F 0XfF 0b101 0B11");
        assert_eq!(forms[0], Value::int(0));
        assert_eq!(forms[1], Value::int(31));
        assert_eq!(forms[2], Value::int(255));
        assert_eq!(forms[3], Value::int(5));
        assert_eq!(forms[4], Value::int(3));
    }

    #[test]
    fn numeric_looking_garbage_reads_as_symbol() {
        let forms = top_forms("1abc");
        assert_eq!(forms[0], Value::symbol("1abc"));
    }

    #[test]
    fn comma_is_whitespace() {
        let forms = top_forms("1,2, 3");
        assert_eq!(
            forms,
            vec![Value::int(1), Value::int(2), Value::int(3)]
        );
    }

    #[test]
    fn comments_are_skipped() {
        let forms = top_forms("1 ; the rest of this line vanishes (\n2");
        assert_eq!(forms, vec![Value::int(1), Value::int(2)]);
    }

    #[test]
    fn string_escapes() {
        let forms = top_forms(r#""a\nb\tc\"d\\e\q""#);
        assert_eq!(forms[0], Value::string("a\nb\tc\"d\\eq"));
    }

    #[test]
    fn lists_nest() {
        let forms = top_forms("(+ 1 (f 2))");
        let outer = list_items(&forms[0]);
        assert_eq!(outer[0], Value::symbol("+"));
        assert_eq!(outer[1], Value::int(1));
        let inner = list_items(&outer[2]);
        assert_eq!(inner, vec![Value::symbol("f"), Value::int(2)]);
    }

    #[test]
    fn vector_sugar_prepends_make_vector() {
        let forms = top_forms("[1 2]");
        let items = list_items(&forms[0]);
        assert_eq!(
            items,
            vec![Value::symbol("make-vector"), Value::int(1), Value::int(2)]
        );
    }

    #[test]
    fn map_sugar_prepends_make_map() {
        let forms = top_forms("{:a 1}");
        let items = list_items(&forms[0]);
        assert_eq!(
            items,
            vec![Value::symbol("make-map"), Value::symbol(":a"), Value::int(1)]
        );
    }

    #[test]
    fn quote_wraps_next_value() {
        let forms = top_forms("'x '(1 2)");
        assert_eq!(
            list_items(&forms[0]),
            vec![Value::symbol("quote"), Value::symbol("x")]
        );
        let quoted_list = list_items(&forms[1]);
        assert_eq!(quoted_list[0], Value::symbol("quote"));
        assert_eq!(
            list_items(&quoted_list[1]),
            vec![Value::int(1), Value::int(2)]
        );
    }

    #[test]
    fn defn_rewrites_to_def_fn() {
        let forms = top_forms("(defn square (x) (* x x))");
        let items = list_items(&forms[0]);
        assert_eq!(items[0], Value::symbol("def"));
        assert_eq!(items[1], Value::symbol("square"));
        let lambda = list_items(&items[2]);
        assert_eq!(lambda[0], Value::symbol("fn"));
        assert_eq!(list_items(&lambda[1]), vec![Value::symbol("x")]);
        assert_eq!(items.len(), 3);
    }

    #[test]
    fn member_call_rewrites() {
        // (. area shape 2) → (((fnext shape) area) (first shape) 2)
        let forms = top_forms("(. area shape 2)");
        let items = list_items(&forms[0]);
        assert_eq!(items.len(), 3);
        let lookup = list_items(&items[0]);
        let fnext_call = list_items(&lookup[0]);
        assert_eq!(fnext_call[0], Value::symbol("fnext"));
        assert_eq!(fnext_call[1], Value::symbol("shape"));
        assert_eq!(lookup[1], Value::symbol("area"));
        let first_call = list_items(&items[1]);
        assert_eq!(first_call[0], Value::symbol("first"));
        assert_eq!(first_call[1], Value::symbol("shape"));
        assert_eq!(items[2], Value::int(2));
    }

    #[test]
    fn whole_parse_is_wrapped_in_begin() {
        let parsed = parse("1 2").unwrap();
        let items = list_items(&parsed);
        assert_eq!(items[0], Value::symbol("begin"));
        assert_eq!(items.len(), 3);
    }

    #[test]
    fn unclosed_scope_is_reported_with_position() {
        let err = parse("(def x\n  (+ 1 2)").unwrap_err();
        assert!(err.message.contains("never closed"), "{}", err.message);
        assert_eq!(err.line, 1);
        assert_eq!(err.column, 1);
    }

    #[test]
    fn unexpected_closer_is_reported() {
        let err = parse("(+ 1 2))").unwrap_err();
        assert!(err.message.contains("unexpected closing"), "{}", err.message);
    }

    #[test]
    fn mismatched_closer_is_reported() {
        let err = parse("(]").unwrap_err();
        assert!(err.message.contains("unexpected closing"), "{}", err.message);
    }

    #[test]
    fn scope_check_ignores_strings_and_comments() {
        assert!(parse("\"(((\" ; )))\n1").is_ok());
    }

    #[test]
    fn empty_quote_is_an_error() {
        let err = parse("(quote-me ')").unwrap_err();
        assert!(err.message.contains("quote"), "{}", err.message);
        assert!(parse("'").is_err());
    }

    #[test]
    fn unterminated_string_is_an_error() {
        let err = parse("\"abc").unwrap_err();
        assert!(err.message.contains("unterminated"), "{}", err.message);
    }

    #[test]
    fn defn_with_too_few_parts_is_an_error() {
        assert!(parse("(defn f (x))").is_err());
    }
}
