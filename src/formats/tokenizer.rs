//! Shell-style tokenizer with a caller-chosen delimiter
//!
//! Reads one token the way a POSIX shell would split words, except that the
//! word boundary is a single delimiter character (any whitespace when the
//! delimiter is whitespace). Single quotes are literal, double quotes allow
//! `\"` and `\\` escapes, and a backslash outside quotes escapes the next
//! character.

/// One token read from the start of a string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Unquoted, unescaped token text
    pub value: String,
    /// Bytes of input the token spans, quotes included
    pub raw_len: usize,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Quote {
    None,
    Single,
    Double,
}

/// Read the first token of `input`
///
/// Returns `None` for an unterminated quote or a trailing backslash.
pub fn next_token(input: &str, delimiter: char) -> Option<Token> {
    let is_boundary = |c: char| {
        if delimiter.is_whitespace() {
            c.is_whitespace()
        } else {
            c == delimiter
        }
    };

    let mut value = String::new();
    let mut quote = Quote::None;
    let mut escaped = false;
    let mut raw_len = input.len();

    for (idx, ch) in input.char_indices() {
        match quote {
            Quote::None => {
                if escaped {
                    value.push(ch);
                    escaped = false;
                } else if ch == '\\' {
                    escaped = true;
                } else if is_boundary(ch) {
                    raw_len = idx;
                    break;
                } else if ch == '\'' {
                    quote = Quote::Single;
                } else if ch == '"' {
                    quote = Quote::Double;
                } else {
                    value.push(ch);
                }
            }
            Quote::Single => {
                if ch == '\'' {
                    quote = Quote::None;
                } else {
                    value.push(ch);
                }
            }
            Quote::Double => {
                if escaped {
                    if ch != '"' && ch != '\\' {
                        value.push('\\');
                    }
                    value.push(ch);
                    escaped = false;
                } else if ch == '\\' {
                    escaped = true;
                } else if ch == '"' {
                    quote = Quote::None;
                } else {
                    value.push(ch);
                }
            }
        }
    }

    if quote != Quote::None || escaped {
        return None;
    }

    Some(Token { value, raw_len })
}
