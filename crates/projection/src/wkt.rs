//! WKT1 (OGC 01-009) coordinate system parsing and serialization.
//!
//! The parser produces a generic [`WktNode`] tree; interpretation of the
//! nodes (PROJCS, GEOGCS, PARAMETER, ...) happens in [`crate::mapping`].

use std::fmt;

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while1},
    character::complete::{char, multispace0, satisfy},
    combinator::{all_consuming, map},
    multi::{many0, separated_list0},
    number::complete::double,
    sequence::{delimited, preceded, terminated},
    IResult,
};

use crate::error::{CrsError, Result};

/// One `KEYWORD[arg, arg, ...]` element.
#[derive(Debug, Clone, PartialEq)]
pub struct WktNode {
    pub keyword: String,
    pub args: Vec<WktValue>,
}

/// An argument inside a WKT node.
#[derive(Debug, Clone, PartialEq)]
pub enum WktValue {
    Node(WktNode),
    Text(String),
    Number(f64),
    /// Bare enumeration value such as `EAST` in `AXIS["x",EAST]`.
    Identifier(String),
}

impl WktNode {
    pub fn new(keyword: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into().to_ascii_uppercase(),
            args: Vec::new(),
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.args.push(WktValue::Text(text.into()));
        self
    }

    pub fn with_number(mut self, value: f64) -> Self {
        self.args.push(WktValue::Number(value));
        self
    }

    pub fn with_node(mut self, node: WktNode) -> Self {
        self.args.push(WktValue::Node(node));
        self
    }

    /// True when the keyword matches, ignoring case.
    pub fn is(&self, keyword: &str) -> bool {
        self.keyword.eq_ignore_ascii_case(keyword)
    }

    /// First quoted string argument, which WKT uses as the element name.
    pub fn name(&self) -> Option<&str> {
        self.args.iter().find_map(|arg| match arg {
            WktValue::Text(s) => Some(s.as_str()),
            _ => None,
        })
    }

    /// Numeric arguments in order of appearance.
    pub fn numbers(&self) -> Vec<f64> {
        self.args
            .iter()
            .filter_map(|arg| match arg {
                WktValue::Number(n) => Some(*n),
                _ => None,
            })
            .collect()
    }

    /// First direct child node with the given keyword.
    pub fn child<'a>(&'a self, keyword: &'a str) -> Option<&'a WktNode> {
        self.children(keyword).next()
    }

    /// All direct child nodes with the given keyword.
    pub fn children<'a>(&'a self, keyword: &'a str) -> impl Iterator<Item = &'a WktNode> + 'a {
        self.args.iter().filter_map(move |arg| match arg {
            WktValue::Node(node) if node.is(keyword) => Some(node),
            _ => None,
        })
    }

    /// `AUTHORITY["name","code"]` attached directly to this node.
    pub fn authority(&self) -> Option<(String, String)> {
        let node = self.child("AUTHORITY")?;
        let mut values = node.args.iter().filter_map(|arg| match arg {
            WktValue::Text(s) => Some(s.clone()),
            WktValue::Number(n) => Some(format!("{n}")),
            WktValue::Identifier(s) => Some(s.clone()),
            WktValue::Node(_) => None,
        });
        Some((values.next()?, values.next()?))
    }
}

impl fmt::Display for WktNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[", self.keyword)?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{arg}")?;
        }
        f.write_str("]")
    }
}

impl fmt::Display for WktValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WktValue::Node(node) => write!(f, "{node}"),
            WktValue::Text(s) => write!(f, "\"{}\"", s.replace('"', "\"\"")),
            WktValue::Number(n) => write!(f, "{n}"),
            WktValue::Identifier(s) => f.write_str(s),
        }
    }
}

/// Parse a complete WKT string into its root node.
pub fn parse(input: &str) -> Result<WktNode> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(CrsError::parse("empty WKT"));
    }

    match all_consuming(terminated(node, multispace0))(trimmed) {
        Ok((_, root)) => Ok(root),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
            let offset = trimmed.len() - e.input.len();
            Err(CrsError::parse(format!(
                "malformed WKT at offset {offset}: '{}'",
                snippet(e.input)
            )))
        }
        Err(nom::Err::Incomplete(_)) => Err(CrsError::parse("truncated WKT")),
    }
}

fn snippet(rest: &str) -> String {
    rest.chars().take(24).collect()
}

fn identifier(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_ascii_alphanumeric() || c == '_')(input)
}

fn open_bracket(input: &str) -> IResult<&str, char> {
    preceded(multispace0, alt((char('['), char('('))))(input)
}

fn close_bracket(input: &str) -> IResult<&str, char> {
    preceded(multispace0, alt((char(']'), char(')'))))(input)
}

fn node(input: &str) -> IResult<&str, WktNode> {
    let (input, keyword) = preceded(multispace0, identifier)(input)?;
    let (input, _) = open_bracket(input)?;
    let (input, args) = separated_list0(preceded(multispace0, char(',')), value)(input)?;
    let (input, _) = close_bracket(input)?;
    Ok((
        input,
        WktNode {
            keyword: keyword.to_ascii_uppercase(),
            args,
        },
    ))
}

fn quoted(input: &str) -> IResult<&str, String> {
    delimited(
        char('"'),
        map(
            many0(alt((map(tag("\"\""), |_| '"'), satisfy(|c| c != '"')))),
            |chars: Vec<char>| chars.into_iter().collect(),
        ),
        char('"'),
    )(input)
}

fn value(input: &str) -> IResult<&str, WktValue> {
    preceded(
        multispace0,
        alt((
            map(node, WktValue::Node),
            map(quoted, WktValue::Text),
            map(double, WktValue::Number),
            map(identifier, |s: &str| WktValue::Identifier(s.to_string())),
        )),
    )(input)
}
