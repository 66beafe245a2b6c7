//! Function specs: the textual handle naming a loader, storer or stream
//! (de)serializer together with its constructor arguments.
//!
//! Accepted forms: `Name`, `Name()`, `Name('a')`, `Name('a', "b")`. Inside an
//! argument, a backslash escapes the enclosing quote or another backslash.

use std::fmt::{self, Write as _};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FuncSpec {
    pub class_name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
}

impl FuncSpec {
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            args: Vec::new(),
        }
    }

    pub fn with_args<I, S>(class_name: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            class_name: class_name.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse the textual form. Malformed specs are configuration errors.
    pub fn parse(spec: &str) -> Result<Self> {
        let spec = spec.trim();
        let (name, args) = match spec.find('(') {
            None => (spec, Vec::new()),
            Some(open) => {
                let inner = spec[open + 1..]
                    .strip_suffix(')')
                    .ok_or_else(|| Error::Config(format!("unterminated function spec '{spec}'")))?;
                (spec[..open].trim(), parse_args(inner, spec)?)
            }
        };

        if name.is_empty() || name.chars().any(|c| c.is_whitespace() || c == ')') {
            return Err(Error::Config(format!("invalid function name in '{spec}'")));
        }
        Ok(Self {
            class_name: name.to_string(),
            args,
        })
    }
}

fn parse_args(inner: &str, spec: &str) -> Result<Vec<String>> {
    let mut args = Vec::new();
    let mut chars = inner.chars().peekable();

    loop {
        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        let Some(quote) = chars.next() else {
            break;
        };
        if quote != '\'' && quote != '"' {
            return Err(Error::Config(format!(
                "function spec arguments must be quoted in '{spec}'"
            )));
        }

        let mut arg = String::new();
        loop {
            match chars.next() {
                Some(c) if c == quote => break,
                Some('\\') => match chars.next_if(|c| *c == quote || *c == '\\') {
                    Some(escaped) => arg.push(escaped),
                    None => arg.push('\\'),
                },
                Some(c) => arg.push(c),
                None => {
                    return Err(Error::Config(format!(
                        "unterminated argument in function spec '{spec}'"
                    )))
                }
            }
        }
        args.push(arg);

        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        match chars.next() {
            None => break,
            Some(',') => continue,
            Some(c) => {
                return Err(Error::Config(format!(
                    "unexpected '{c}' between arguments in function spec '{spec}'"
                )))
            }
        }
    }

    Ok(args)
}

impl FromStr for FuncSpec {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        FuncSpec::parse(s)
    }
}

/// Writes `arg` so that `parse` reads it back unchanged. Single quotes are
/// preferred; an argument holding only `'` switches to double quotes.
fn write_quoted(f: &mut fmt::Formatter<'_>, arg: &str) -> fmt::Result {
    let quote = if arg.contains('\'') && !arg.contains('"') {
        '"'
    } else {
        '\''
    };
    f.write_char(quote)?;
    let mut chars = arg.chars().peekable();
    while let Some(c) = chars.next() {
        let escape = c == quote
            || (c == '\\' && chars.peek().map_or(true, |n| *n == quote || *n == '\\'));
        if escape {
            f.write_char('\\')?;
        }
        f.write_char(c)?;
    }
    f.write_char(quote)
}

impl fmt::Display for FuncSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.class_name)?;
        if !self.args.is_empty() {
            f.write_str("(")?;
            for (i, arg) in self.args.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write_quoted(f, arg)?;
            }
            f.write_str(")")?;
        }
        Ok(())
    }
}
