//! Text format
//!
//! One line per node, children in a braced block:
//!
//! ```text
//! # comment
//! = 1                    value of the enclosing node itself
//! window {
//!     title = "Crossworld"
//!     width = 1920
//!     vsync = true
//!     scale = 1.5
//!     seed = 4000000000u
//!     key = 'w'
//! }
//! list {
//!     [-4026531839] = 0
//!     [7] = 3
//!     [+4026531840] = 1
//!     [+4026531841] = 2
//! }
//! "key with spaces" = grass
//! ```
//!
//! Keys are bare identifiers, quoted strings or bracketed numeric keys.
//! Numeric keys of children made by `APPEND` carry a `+`, those made by
//! `PREPEND` a `-`, so a reloaded list keeps its order.
//! Values are literals as accepted by [`Value::parse_literal`]; strings and
//! characters may be quoted and use Rust escapes. A line with only a key
//! creates an empty node. Blocks left open at the end of input are closed.
//!
//! Parsing is line by line, so a malformed line never affects siblings that
//! were already read. The forgiving entry points skip such lines with a
//! warning; [`str::parse`] rejects them. Bytes that are not UTF-8 are
//! replaced before parsing, so they only spoil the line they are on.

use crate::hash::hash;
use crate::node::{Band, Slot};
use crate::{Config, Error, Result, Value};
use nom::{
    branch::alt,
    bytes::complete::take_while1,
    character::complete::{char, digit1, one_of, space0},
    combinator::{eof, map, map_res, opt, rest, value},
    sequence::{delimited, preceded},
    IResult, Parser,
};
use std::borrow::Cow;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

const INDENT: &str = "    ";

/// How a line names its node
#[derive(Debug, Clone, PartialEq)]
enum Label {
    Name(String),
    Key(Slot),
}

/// One parsed line of the text format
#[derive(Debug, Clone, PartialEq)]
enum Line {
    Blank,
    Close,
    Value(Value),
    Entry {
        label: Label,
        value: Option<Value>,
        open: bool,
    },
}

// Lexing

/// Quoted string with Rust-style escapes; returns the decoded text
fn quoted(quote: char) -> impl Fn(&str) -> IResult<&str, String> {
    move |input: &str| {
        let error = || nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Char));
        let mut chars = input.char_indices();
        if chars.next().map(|(_, c)| c) != Some(quote) {
            return Err(error());
        }
        let mut out = String::new();
        while let Some((i, c)) = chars.next() {
            if c == quote {
                return Ok((&input[i + c.len_utf8()..], out));
            }
            if c != '\\' {
                out.push(c);
                continue;
            }
            let escaped = match chars.next().map(|(_, c)| c) {
                Some('n') => '\n',
                Some('t') => '\t',
                Some('r') => '\r',
                Some('0') => '\0',
                Some(c @ ('\\' | '"' | '\'')) => c,
                Some('u') => {
                    let tail = &input[chars.offset()..];
                    let close = tail.find('}').ok_or_else(error)?;
                    let code = tail
                        .strip_prefix('{')
                        .and_then(|t| u32::from_str_radix(&t[..close - 1], 16).ok())
                        .and_then(char::from_u32)
                        .ok_or_else(error)?;
                    // skip past the closing brace
                    for _ in 0..=close {
                        chars.next();
                    }
                    code
                }
                _ => return Err(error()),
            };
            out.push(escaped);
        }
        Err(error())
    }
}

/// Character literal `'c'` holding a single byte
fn char_literal(input: &str) -> IResult<&str, u8> {
    map_res(quoted('\''), |s: String| {
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => u8::try_from(c as u32).map_err(|_| ()),
            _ => Err(()),
        }
    })
    .parse(input)
}

/// Parse a complete `'c'` literal
pub(crate) fn parse_char_literal(text: &str) -> Option<u8> {
    match char_literal(text) {
        Ok(("", c)) => Some(c),
        _ => None,
    }
}

fn bareword(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| !c.is_whitespace() && !matches!(c, '{' | '}' | '#' | '=' | '"')).parse(input)
}

fn literal(input: &str) -> IResult<&str, Value> {
    alt((
        map(quoted('"'), Value::String),
        map(char_literal, Value::Char),
        map(bareword, Value::parse_literal),
    ))
    .parse(input)
}

/// `[n]`, `[+n]` or `[-n]`
fn numeric_label(input: &str) -> IResult<&str, Slot> {
    let band = map(opt(one_of("+-")), |sign: Option<char>| match sign {
        Some('+') => Band::Appended,
        Some(_) => Band::Prepended,
        None => Band::Keyed,
    });
    map(
        delimited(char('['), (band, map_res(digit1, str::parse::<u32>)), char(']')),
        |(band, key): (Band, u32)| Slot::new(band, key),
    )
    .parse(input)
}

fn label(input: &str) -> IResult<&str, Label> {
    alt((
        map(quoted('"'), Label::Name),
        map(numeric_label, Label::Key),
        map(bareword, |s: &str| Label::Name(s.to_string())),
    ))
    .parse(input)
}

fn entry(input: &str) -> IResult<&str, Line> {
    let (input, label) = label(input)?;
    let (input, value) = opt(preceded((space0, char('='), space0), literal)).parse(input)?;
    let (input, open) = opt(preceded(space0, char('{'))).parse(input)?;
    Ok((
        input,
        Line::Entry {
            label,
            value,
            open: open.is_some(),
        },
    ))
}

fn comment(input: &str) -> IResult<&str, &str> {
    preceded(char('#'), rest).parse(input)
}

fn line(input: &str) -> IResult<&str, Line> {
    let (input, _) = space0(input)?;
    let (input, line) = alt((
        value(Line::Blank, alt((eof, comment))),
        value(Line::Close, char('}')),
        map(preceded((char('='), space0), literal), Line::Value),
        entry,
    ))
    .parse(input)?;
    let (input, _) = (space0, opt(comment), eof).parse(input)?;
    Ok((input, line))
}

// Document parsing

/// Open block: the node being filled and the line that opened it
struct Frame {
    node: Config,
    opened_at: usize,
}

fn parse_document(text: &str, strict: bool) -> Result<Config> {
    let mut stack = vec![Frame {
        node: Config::new(),
        opened_at: 0,
    }];

    for (index, raw) in text.lines().enumerate() {
        let number = index + 1;
        let parsed = match line(raw) {
            Ok((_, parsed)) => parsed,
            Err(e) => {
                if strict {
                    return Err(Error::Parse {
                        line: number,
                        message: e.to_string(),
                    });
                }
                tracing::warn!("skipping malformed config line {}: {:?}", number, raw);
                continue;
            }
        };

        match parsed {
            Line::Blank => {}
            Line::Value(v) => {
                if let Some(top) = stack.last_mut() {
                    top.node.set(v);
                }
            }
            Line::Entry { label, value, open } => {
                let (slot, name) = match label {
                    Label::Name(name) => (Slot::keyed(hash(&name)), Some(name)),
                    Label::Key(slot) => (slot, None),
                };
                if open {
                    let mut node = Config::with_key(slot.band, slot.key, name);
                    if let Some(v) = value {
                        node.set(v);
                    }
                    stack.push(Frame {
                        node,
                        opened_at: number,
                    });
                } else if let Some(top) = stack.last_mut() {
                    let child = top.node.vivify(slot, name.as_deref());
                    if let Some(v) = value {
                        child.set(v);
                    }
                }
            }
            Line::Close => {
                if stack.len() > 1 {
                    close_block(&mut stack);
                } else if strict {
                    return Err(Error::Parse {
                        line: number,
                        message: "unmatched '}'".to_string(),
                    });
                } else {
                    tracing::warn!("ignoring unmatched '}}' on config line {}", number);
                }
            }
        }
    }

    while stack.len() > 1 {
        if let Some(frame) = stack.last() {
            tracing::warn!("config block opened on line {} is not closed", frame.opened_at);
        }
        close_block(&mut stack);
    }

    Ok(stack.pop().map(|frame| frame.node).unwrap_or_default())
}

fn close_block(stack: &mut Vec<Frame>) {
    if let Some(frame) = stack.pop() {
        if let Some(parent) = stack.last_mut() {
            parent.node.graft(frame.node);
        }
    }
}

// Printing

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

fn write_label<W: fmt::Write>(out: &mut W, node: &Config) -> fmt::Result {
    match (node.band(), node.key()) {
        (Band::Keyed, Some(name)) if is_identifier(name) => out.write_str(name),
        (Band::Keyed, Some(name)) => write!(out, "\"{}\"", name.escape_debug()),
        (Band::Keyed, None) => write!(out, "[{}]", node.numeric_key()),
        (Band::Appended, _) => write!(out, "[+{}]", node.numeric_key()),
        (Band::Prepended, _) => write!(out, "[-{}]", node.numeric_key()),
    }
}

fn write_literal<W: fmt::Write>(out: &mut W, value: &Value) -> fmt::Result {
    match value {
        Value::Null => Ok(()),
        Value::Bool(b) => write!(out, "{}", b),
        Value::Char(c) => write!(out, "'{}'", (*c as char).escape_debug()),
        Value::Int(i) => write!(out, "{}", i),
        Value::Float(f) => write!(out, "{:?}", f),
        Value::UInt(u) => write!(out, "{}u", u),
        Value::String(s) => write!(out, "\"{}\"", s.escape_debug()),
    }
}

impl Config {
    /// Write this node's value and children in the text format
    ///
    /// The node's own value, if any, comes first as an `= value` line. Each
    /// child is one line, followed by an indented block for its children.
    pub fn print<W: fmt::Write>(&self, out: &mut W, indent: usize) -> fmt::Result {
        let value = self.value();
        if !value.is_null() {
            out.write_str(&INDENT.repeat(indent))?;
            out.write_str("= ")?;
            write_literal(out, &value)?;
            out.write_char('\n')?;
        }
        self.print_children(out, indent)
    }

    fn print_children<W: fmt::Write>(&self, out: &mut W, indent: usize) -> fmt::Result {
        for child in self.entries().values() {
            child.print_entry(out, indent)?;
        }
        Ok(())
    }

    fn print_entry<W: fmt::Write>(&self, out: &mut W, indent: usize) -> fmt::Result {
        let pad = INDENT.repeat(indent);
        out.write_str(&pad)?;
        write_label(out, self)?;

        let value = self.value();
        if !value.is_null() {
            out.write_str(" = ")?;
            write_literal(out, &value)?;
        }

        let children = self.entries();
        if children.is_empty() {
            return out.write_char('\n');
        }
        out.write_str(" {\n")?;
        for child in children.values() {
            child.print_entry(out, indent + 1)?;
        }
        writeln!(out, "{}}}", pad)
    }

    /// The tree in the text format
    pub fn to_text(&self) -> String {
        self.to_string()
    }

    /// Parse the text format, skipping malformed lines with a warning
    pub fn from_text(text: &str) -> Config {
        parse_document(text, false).unwrap_or_default()
    }

    /// Write the tree to a text file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        std::fs::write(path, self.to_text())?;
        tracing::debug!("saved config to {}", path.display());
        Ok(())
    }

    /// Read a text file, skipping malformed lines with a warning
    pub fn read_text_file<P: AsRef<Path>>(path: P) -> Result<Config> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let content = String::from_utf8_lossy(&bytes);
        if let Cow::Owned(_) = content {
            tracing::warn!("config {} is not valid UTF-8, replacing bad bytes", path.display());
        }
        tracing::debug!("loaded config from {}", path.display());
        parse_document(&content, false)
    }

    /// Read a text file, returning an empty tree if it cannot be read
    pub fn load<P: AsRef<Path>>(path: P) -> Config {
        let path = path.as_ref();
        Self::read_text_file(path).unwrap_or_else(|e| {
            tracing::warn!("cannot load config {}: {}", path.display(), e);
            Config::new()
        })
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.print(f, 0)
    }
}

/// Strict parse: any malformed line is an error
impl FromStr for Config {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        parse_document(s, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_line_forms() {
        assert_eq!(line("   ").unwrap().1, Line::Blank);
        assert_eq!(line("# note").unwrap().1, Line::Blank);
        assert_eq!(line("  }  ").unwrap().1, Line::Close);
        assert_eq!(line("= 4").unwrap().1, Line::Value(Value::Int(4)));
        assert_eq!(
            line("width = 1920 # px").unwrap().1,
            Line::Entry {
                label: Label::Name("width".to_string()),
                value: Some(Value::Int(1920)),
                open: false,
            }
        );
        assert_eq!(
            line("[12] {").unwrap().1,
            Line::Entry {
                label: Label::Key(Slot::keyed(12)),
                value: None,
                open: true,
            }
        );
        assert_eq!(
            line("[+4026531840] = 1").unwrap().1,
            Line::Entry {
                label: Label::Key(Slot::new(Band::Appended, 4026531840)),
                value: Some(Value::Int(1)),
                open: false,
            }
        );
        assert_eq!(
            line("[-7]").unwrap().1,
            Line::Entry {
                label: Label::Key(Slot::new(Band::Prepended, 7)),
                value: None,
                open: false,
            }
        );
        assert!(line("width = ").is_err());
        assert!(line("\"unterminated").is_err());
    }

    #[test]
    fn test_quoted_escapes() {
        let (rest, s) = quoted('"')(r#""a\"b\n\u{e9}" tail"#).unwrap();
        assert_eq!(s, "a\"b\né");
        assert_eq!(rest, " tail");
        assert_eq!(parse_char_literal(r"'\n'"), Some(b'\n'));
        assert_eq!(parse_char_literal("'ab'"), None);
    }

    #[test]
    fn test_parse_nested_document() {
        let text = r#"
            app {
                name = "Crossworld"
                version = 1
                scene {
                    world = grass {
                        seed = 12345u
                    }
                }
            }
        "#;
        let cfg: Config = text.parse().unwrap();
        assert_eq!(cfg["app"]["name"].string(""), "Crossworld");
        assert_eq!(cfg["app"]["version"].integer(0), 1);
        assert_eq!(cfg["app"]["scene"]["world"].string(""), "grass");
        assert_eq!(
            cfg["app"]["scene"]["world"]["seed"].value(),
            Value::UInt(12345)
        );
    }

    #[test]
    fn test_print_layout() {
        let mut cfg = Config::new();
        cfg.find("window/title").set("Crossworld");
        cfg.at("my key").set('x' as u8);
        cfg.at(7u32);

        let text = cfg.to_text();
        assert!(text.contains("window {\n    title = \"Crossworld\"\n}\n"));
        assert!(text.contains("\"my key\" = 'x'\n"));
        assert!(text.contains("[7]\n"));
    }

    #[test]
    fn test_bands_survive_text() {
        let mut list = Config::new();
        list.at(Config::APPEND).set(1);
        list.at(Config::PREPEND).set(-1);
        list.at("x").set(0);

        let text = list.to_text();
        assert!(text.contains("[+4026531840] = 1\n"));
        assert!(text.contains("[-4026531839] = -1\n"));

        let mut back: Config = text.parse().unwrap();
        assert_eq!(back, list);
        back.at("input").set(0);
        back.at(Config::APPEND).set(2);
        let values: Vec<i32> = back.children().map(|c| c.integer(9)).collect();
        assert_eq!(values, vec![-1, 0, 0, 1, 2]);
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        let text = "a = 1\nb = \"broken\nc = 3\n}\n";
        let cfg = Config::from_text(text);
        assert_eq!(cfg["a"].integer(0), 1);
        assert_eq!(cfg["c"].integer(0), 3);
        assert!(cfg.get("b").is_none());

        match text.parse::<Config>() {
            Err(Error::Parse { line, .. }) => assert_eq!(line, 2),
            other => panic!("Expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_unclosed_block_is_kept() {
        let cfg = Config::from_text("outer {\n    inner = 2\n");
        assert_eq!(cfg["outer"]["inner"].integer(0), 2);
    }

    #[test]
    fn test_root_value_round_trip() {
        let mut cfg = Config::new();
        cfg.set(2.5f32);
        cfg.at("child").set(true);
        let back = Config::from_text(&cfg.to_text());
        assert_eq!(back, cfg);
    }

    #[test]
    fn test_repeated_blocks_merge() {
        let cfg = Config::from_text("a {\n x = 1\n}\na = 5 {\n y = 2\n}\n");
        assert_eq!(cfg["a"].integer(0), 5);
        assert_eq!(cfg["a"]["x"].integer(0), 1);
        assert_eq!(cfg["a"]["y"].integer(0), 2);
    }
}
