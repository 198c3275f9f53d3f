//! Scalar resolution and quoting rules (YAML 1.2 core schema).

use super::node::Tag;

/// Resolve the tag of a plain (unquoted) scalar.
pub fn resolve_plain(text: &str) -> Tag {
    if is_null(text) {
        Tag::Null
    } else if parse_bool(text).is_some() {
        Tag::Bool
    } else if is_int_shape(text) {
        if parse_int(text).is_some() {
            Tag::Int
        } else {
            // Too large for i64; keep it numeric
            Tag::Float
        }
    } else if parse_float(text).is_some() {
        Tag::Float
    } else {
        Tag::String
    }
}

/// Tag named by an explicit `!!type` property, if it is a core one.
pub fn explicit_tag(token: &str) -> Option<Tag> {
    let name = token
        .strip_prefix("!!")
        .or_else(|| token.strip_prefix("!<tag:yaml.org,2002:").and_then(|t| t.strip_suffix('>')))?;
    match name {
        "str" => Some(Tag::String),
        "int" => Some(Tag::Int),
        "float" => Some(Tag::Float),
        "bool" => Some(Tag::Bool),
        "null" => Some(Tag::Null),
        _ => None,
    }
}

pub fn is_null(text: &str) -> bool {
    matches!(text, "" | "~" | "null" | "Null" | "NULL")
}

pub fn parse_bool(text: &str) -> Option<bool> {
    match text {
        "true" | "True" | "TRUE" => Some(true),
        "false" | "False" | "FALSE" => Some(false),
        _ => None,
    }
}

fn is_int_shape(text: &str) -> bool {
    let digits = text.strip_prefix(['-', '+']).unwrap_or(text);
    if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
        return true;
    }
    if let Some(hex) = text.strip_prefix("0x") {
        return !hex.is_empty() && hex.bytes().all(|b| b.is_ascii_hexdigit());
    }
    if let Some(oct) = text.strip_prefix("0o") {
        return !oct.is_empty() && oct.bytes().all(|b| (b'0'..=b'7').contains(&b));
    }
    false
}

/// Parse a core-schema integer: decimal, `0x` hex or `0o` octal.
pub fn parse_int(text: &str) -> Option<i64> {
    if !is_int_shape(text) {
        return None;
    }
    if let Some(hex) = text.strip_prefix("0x") {
        return i64::from_str_radix(hex, 16).ok();
    }
    if let Some(oct) = text.strip_prefix("0o") {
        return i64::from_str_radix(oct, 8).ok();
    }
    text.parse().ok()
}

/// Parse a core-schema float, including `.inf`, `-.inf` and `.nan`.
pub fn parse_float(text: &str) -> Option<f64> {
    match text {
        ".inf" | ".Inf" | ".INF" | "+.inf" | "+.Inf" | "+.INF" => return Some(f64::INFINITY),
        "-.inf" | "-.Inf" | "-.INF" => return Some(f64::NEG_INFINITY),
        ".nan" | ".NaN" | ".NAN" => return Some(f64::NAN),
        _ => {}
    }
    if !is_float_shape(text) {
        return None;
    }
    text.parse().ok()
}

/// `[-+]?(\.[0-9]+|[0-9]+(\.[0-9]*)?)([eE][-+]?[0-9]+)?`
fn is_float_shape(text: &str) -> bool {
    let body = text.strip_prefix(['-', '+']).unwrap_or(text);
    let (mantissa, exponent) = match body.find(['e', 'E']) {
        Some(pos) => (&body[..pos], Some(&body[pos + 1..])),
        None => (body, None),
    };
    let mantissa_ok = match mantissa.split_once('.') {
        Some((int, frac)) => {
            let int_ok = int.bytes().all(|b| b.is_ascii_digit());
            let frac_ok = frac.bytes().all(|b| b.is_ascii_digit());
            int_ok && frac_ok && (!int.is_empty() || !frac.is_empty())
        }
        None => !mantissa.is_empty() && mantissa.bytes().all(|b| b.is_ascii_digit()),
    };
    let exponent_ok = match exponent {
        Some(exp) => {
            let digits = exp.strip_prefix(['-', '+']).unwrap_or(exp);
            !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
        }
        None => true,
    };
    mantissa_ok && exponent_ok
}

/// Shortest text that reads back as the same float.
pub fn format_float(f: f64) -> String {
    if f.is_nan() {
        ".nan".to_string()
    } else if f.is_infinite() {
        if f.is_sign_positive() {
            ".inf".to_string()
        } else {
            "-.inf".to_string()
        }
    } else {
        format!("{:?}", f)
    }
}

/// Whether a string must be quoted to read back as the same string.
pub fn needs_quotes(s: &str, in_flow: bool) -> bool {
    if s.is_empty() || resolve_plain(s) != Tag::String {
        return true;
    }
    let first = s.chars().next().unwrap_or(' ');
    let last = s.chars().last().unwrap_or(' ');
    if first.is_whitespace() || last.is_whitespace() {
        return true;
    }
    if "[]{},#&*!|>'\"%@`".contains(first) {
        return true;
    }
    if matches!(first, '-' | '?' | ':') && (s.len() == 1 || s[1..].starts_with(' ')) {
        return true;
    }
    if s.starts_with("---") || s.starts_with("...") {
        return true;
    }
    if s.contains(": ") || s.contains(" #") || last == ':' {
        return true;
    }
    if s.chars().any(|c| c.is_control()) {
        return true;
    }
    in_flow && s.contains([',', '[', ']', '{', '}'])
}

/// Render a string as a double-quoted scalar.
pub fn quote_double(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '\0' => out.push_str("\\0"),
            c if c.is_control() => out.push_str(&format!("\\x{:02x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Decode the inside of a double-quoted scalar (escapes and line folding).
pub fn unescape_double(body: &str) -> Result<String, String> {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                let esc = chars.next().ok_or("unterminated escape sequence")?;
                match esc {
                    '0' => out.push('\0'),
                    'a' => out.push('\x07'),
                    'b' => out.push('\x08'),
                    't' | '\t' => out.push('\t'),
                    'n' => out.push('\n'),
                    'v' => out.push('\x0b'),
                    'f' => out.push('\x0c'),
                    'r' => out.push('\r'),
                    'e' => out.push('\x1b'),
                    ' ' => out.push(' '),
                    '"' => out.push('"'),
                    '/' => out.push('/'),
                    '\\' => out.push('\\'),
                    'N' => out.push('\u{85}'),
                    '_' => out.push('\u{a0}'),
                    'L' => out.push('\u{2028}'),
                    'P' => out.push('\u{2029}'),
                    'x' => out.push(hex_escape(&mut chars, 2)?),
                    'u' => out.push(hex_escape(&mut chars, 4)?),
                    'U' => out.push(hex_escape(&mut chars, 8)?),
                    '\n' => {
                        while matches!(chars.peek(), Some(' ' | '\t')) {
                            chars.next();
                        }
                    }
                    other => return Err(format!("unknown escape sequence '\\{}'", other)),
                }
            }
            '\n' => fold_break(&mut out, &mut chars),
            c => out.push(c),
        }
    }
    Ok(out)
}

/// Decode the inside of a single-quoted scalar.
pub fn unescape_single(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\'' if chars.peek() == Some(&'\'') => {
                chars.next();
                out.push('\'');
            }
            '\n' => fold_break(&mut out, &mut chars),
            c => out.push(c),
        }
    }
    out
}

/// Join the lines of a multi-line plain scalar.
pub fn fold_plain(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\n' {
            fold_break(&mut out, &mut chars);
        } else {
            out.push(c);
        }
    }
    out
}

/// Fold one line break: a single break becomes a space, each following
/// empty line becomes a newline.
fn fold_break(out: &mut String, chars: &mut std::iter::Peekable<std::str::Chars<'_>>) {
    let trimmed = out.trim_end_matches([' ', '\t']).len();
    out.truncate(trimmed);
    let mut empty_lines = 0;
    loop {
        while matches!(chars.peek(), Some(' ' | '\t')) {
            chars.next();
        }
        if chars.peek() == Some(&'\n') {
            chars.next();
            empty_lines += 1;
        } else {
            break;
        }
    }
    if empty_lines == 0 {
        out.push(' ');
    } else {
        out.extend(std::iter::repeat('\n').take(empty_lines));
    }
}

fn hex_escape(
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
    width: usize,
) -> Result<char, String> {
    let digits: String = chars.take(width).collect();
    if digits.len() != width {
        return Err("truncated hexadecimal escape".to_string());
    }
    u32::from_str_radix(&digits, 16)
        .ok()
        .and_then(char::from_u32)
        .ok_or_else(|| format!("invalid hexadecimal escape '{}'", digits))
}

/// Decode the body of a literal (`|`) or folded (`>`) block scalar.
///
/// `lines` are the raw body lines; `indent` is the content indentation
/// (detected from the first non-empty line when zero).
pub fn decode_block(header: &str, lines: &[String], mut indent: usize) -> String {
    let folded = header.starts_with('>');
    let chomp = if header.contains('-') {
        '-'
    } else if header.contains('+') {
        '+'
    } else {
        ' '
    };
    if indent == 0 {
        indent = lines
            .iter()
            .find(|l| !l.trim_matches([' ', '\t']).is_empty())
            .map(|l| l.len() - l.trim_start_matches(' ').len())
            .unwrap_or(0);
    }
    let content = lines.iter().map(|l| {
        let spaces = l.len() - l.trim_start_matches(' ').len();
        if spaces >= indent {
            &l[indent..]
        } else if l.trim_matches([' ', '\t']).is_empty() {
            ""
        } else {
            &l[spaces..]
        }
    });

    let mut out = String::new();
    let mut pending = 0;
    let mut seen_content = false;
    let mut prev_more_indented = false;
    for line in content {
        if line.is_empty() {
            pending += 1;
            continue;
        }
        let more_indented = line.starts_with([' ', '\t']);
        if !seen_content {
            out.extend(std::iter::repeat('\n').take(pending));
        } else if folded && !prev_more_indented && !more_indented {
            if pending == 0 {
                out.push(' ');
            } else {
                out.extend(std::iter::repeat('\n').take(pending));
            }
        } else {
            out.extend(std::iter::repeat('\n').take(pending + 1));
        }
        out.push_str(line);
        seen_content = true;
        prev_more_indented = more_indented;
        pending = 0;
    }

    match chomp {
        '-' => out,
        '+' if seen_content => out + &"\n".repeat(pending + 1),
        '+' => "\n".repeat(pending),
        _ if seen_content => out + "\n",
        _ => out,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_plain_core_schema() {
        assert_eq!(resolve_plain("~"), Tag::Null);
        assert_eq!(resolve_plain("null"), Tag::Null);
        assert_eq!(resolve_plain("True"), Tag::Bool);
        assert_eq!(resolve_plain("yes"), Tag::String);
        assert_eq!(resolve_plain("42"), Tag::Int);
        assert_eq!(resolve_plain("-7"), Tag::Int);
        assert_eq!(resolve_plain("0x1F"), Tag::Int);
        assert_eq!(resolve_plain("0o17"), Tag::Int);
        assert_eq!(resolve_plain("3.14"), Tag::Float);
        assert_eq!(resolve_plain("1e10"), Tag::Float);
        assert_eq!(resolve_plain(".inf"), Tag::Float);
        assert_eq!(resolve_plain(".nan"), Tag::Float);
        assert_eq!(resolve_plain("1.2.3"), Tag::String);
        assert_eq!(resolve_plain("inf"), Tag::String);
        assert_eq!(resolve_plain("hello"), Tag::String);
    }

    #[test]
    fn test_huge_integer_is_float() {
        assert_eq!(resolve_plain("99999999999999999999"), Tag::Float);
    }

    #[test]
    fn test_parse_int_radix() {
        assert_eq!(parse_int("0x10"), Some(16));
        assert_eq!(parse_int("0o10"), Some(8));
        assert_eq!(parse_int("+5"), Some(5));
        assert_eq!(parse_int("5.0"), None);
    }

    #[test]
    fn test_format_float() {
        assert_eq!(format_float(1.0), "1.0");
        assert_eq!(format_float(0.1), "0.1");
        assert_eq!(format_float(f64::INFINITY), ".inf");
        assert_eq!(format_float(f64::NEG_INFINITY), "-.inf");
        assert_eq!(format_float(f64::NAN), ".nan");
        assert_eq!(parse_float(&format_float(2.5e-8)), Some(2.5e-8));
    }

    #[test]
    fn test_needs_quotes() {
        assert!(!needs_quotes("hello world", false));
        assert!(needs_quotes("", false));
        assert!(needs_quotes("true", false));
        assert!(needs_quotes("123", false));
        assert!(needs_quotes("a: b", false));
        assert!(needs_quotes("#comment", false));
        assert!(needs_quotes(" padded", false));
        assert!(needs_quotes("- item", false));
        assert!(needs_quotes("line\nbreak", false));
        assert!(!needs_quotes("a,b", false));
        assert!(needs_quotes("a,b", true));
        assert!(!needs_quotes("-5x", false));
        assert!(!needs_quotes("http://example.com", false));
    }

    #[test]
    fn test_double_quote_round_trip() {
        let s = "tab\there \"quoted\" back\\slash\nnext";
        let quoted = quote_double(s);
        assert_eq!(unescape_double(&quoted[1..quoted.len() - 1]).unwrap(), s);
    }

    #[test]
    fn test_unescape_double_folding() {
        assert_eq!(unescape_double("a\n  b").unwrap(), "a b");
        assert_eq!(unescape_double("a\n\n  b").unwrap(), "a\nb");
        assert_eq!(unescape_double("a\\\n  b").unwrap(), "ab");
        assert_eq!(unescape_double("\\u00e9").unwrap(), "é");
        assert!(unescape_double("\\q").is_err());
    }

    #[test]
    fn test_unescape_single() {
        assert_eq!(unescape_single("it''s"), "it's");
    }

    #[test]
    fn test_decode_block_literal() {
        let lines = vec!["  one".to_string(), "  two".to_string()];
        assert_eq!(decode_block("|", &lines, 0), "one\ntwo\n");
        assert_eq!(decode_block("|-", &lines, 0), "one\ntwo");
    }

    #[test]
    fn test_decode_block_folded() {
        let lines = vec!["  one".to_string(), "  two".to_string(), "".to_string(), "  three".to_string()];
        assert_eq!(decode_block(">", &lines, 0), "one two\nthree\n");
    }

    #[test]
    fn test_decode_block_keep() {
        let lines = vec!["  one".to_string(), "".to_string()];
        assert_eq!(decode_block("|+", &lines, 0), "one\n\n");
    }

    #[test]
    fn test_decode_block_non_ascii_line() {
        let lines = vec!["  x".to_string(), "\u{3000}".to_string(), "  y".to_string()];
        assert_eq!(decode_block("|", &lines, 2), "x\n\u{3000}\ny\n");
    }
}
