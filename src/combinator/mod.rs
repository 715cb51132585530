mod tuple;

use std::fmt;

use thiserror::Error;

pub use tuple::{Alt, Sequence};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parsed<'a, T> {
    pub outcome: Result<T, ParseError>,
    pub remaining: &'a str,
}

impl<'a, T> Parsed<'a, T> {
    pub fn success(value: T, remaining: &'a str) -> Self {
        Self {
            outcome: Ok(value),
            remaining,
        }
    }

    pub fn failure(error: ParseError, remaining: &'a str) -> Self {
        Self {
            outcome: Err(error),
            remaining,
        }
    }

    pub fn value(&self) -> Option<&T> {
        self.outcome.as_ref().ok()
    }

    pub fn error(&self) -> Option<&ParseError> {
        self.outcome.as_ref().err()
    }

    pub fn into_value(self) -> Option<T> {
        self.outcome.ok()
    }
}

// `remaining` is the byte length of the input left at the failure point.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("expected '{literal}'")]
    Tag { literal: String, remaining: usize },
    #[error("no alternative matched: {}", describe_children(.children))]
    Alt { children: Vec<ParseError> },
    #[error("sequence failed at element {index}: {inner}")]
    Sequence {
        index: usize,
        inner: Box<ParseError>,
    },
    #[error("expected at least {min} matching characters, found {found}")]
    TakeWhile {
        min: usize,
        found: usize,
        remaining: usize,
    },
    #[error("{message}")]
    Map { message: String, remaining: usize },
}

impl ParseError {
    pub fn remaining_len(&self) -> usize {
        match self {
            Self::Tag { remaining, .. }
            | Self::TakeWhile { remaining, .. }
            | Self::Map { remaining, .. } => *remaining,
            Self::Alt { children } => children
                .iter()
                .map(Self::remaining_len)
                .min()
                .unwrap_or(usize::MAX),
            Self::Sequence { inner, .. } => inner.remaining_len(),
        }
    }

    pub fn expectations(&self) -> Vec<String> {
        let deepest = self.remaining_len();
        let mut leaves = Vec::new();
        self.collect_leaves(deepest, &mut leaves);
        leaves
    }

    fn collect_leaves(&self, deepest: usize, leaves: &mut Vec<String>) {
        match self {
            Self::Alt { children } => {
                for child in children {
                    child.collect_leaves(deepest, leaves);
                }
            }
            Self::Sequence { inner, .. } => inner.collect_leaves(deepest, leaves),
            leaf => {
                let text = leaf.to_string();
                if leaf.remaining_len() == deepest && !leaves.contains(&text) {
                    leaves.push(text);
                }
            }
        }
    }
}

fn describe_children(children: &[ParseError]) -> String {
    children
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

pub trait Parser<'a, T>: Fn(&'a str) -> Parsed<'a, T> {}

impl<'a, T, F> Parser<'a, T> for F where F: Fn(&'a str) -> Parsed<'a, T> {}

pub fn tag<'a>(literal: &'static str) -> impl Parser<'a, &'a str> {
    move |input: &'a str| match input.strip_prefix(literal) {
        Some(rest) => Parsed::success(&input[..literal.len()], rest),
        None => Parsed::failure(
            ParseError::Tag {
                literal: literal.to_string(),
                remaining: input.len(),
            },
            input,
        ),
    }
}

pub fn alt<'a, T, A>(parsers: A) -> impl Parser<'a, T>
where
    A: Alt<'a, T>,
{
    move |input: &'a str| parsers.choice(input)
}

pub fn sequence<'a, T, S>(parsers: S) -> impl Parser<'a, T>
where
    S: Sequence<'a, T>,
{
    move |input: &'a str| parsers.run(input)
}

/// A success that consumes nothing ends the repetition and is not collected.
pub fn many0<'a, T, P>(parser: P) -> impl Parser<'a, Vec<T>>
where
    P: Parser<'a, T>,
{
    move |input: &'a str| {
        let mut values = Vec::new();
        let mut rest = input;
        loop {
            let parsed = parser(rest);
            match parsed.outcome {
                Ok(value) if parsed.remaining.len() < rest.len() => {
                    values.push(value);
                    rest = parsed.remaining;
                }
                _ => return Parsed::success(values, rest),
            }
        }
    }
}

pub fn take_while<'a, P>(predicate: P) -> impl Parser<'a, &'a str>
where
    P: Fn(char) -> bool,
{
    move |input: &'a str| {
        let end = input
            .char_indices()
            .find(|&(_, c)| !predicate(c))
            .map_or(input.len(), |(index, _)| index);
        Parsed::success(&input[..end], &input[end..])
    }
}

pub fn take_while_m_n<'a, P>(min: usize, max: usize, predicate: P) -> impl Parser<'a, &'a str>
where
    P: Fn(char) -> bool,
{
    move |input: &'a str| {
        let mut end = 0;
        let mut count = 0;
        for (index, c) in input.char_indices() {
            if count == max || !predicate(c) {
                break;
            }
            end = index + c.len_utf8();
            count += 1;
        }

        if count < min {
            Parsed::failure(
                ParseError::TakeWhile {
                    min,
                    found: count,
                    remaining: input.len(),
                },
                input,
            )
        } else {
            Parsed::success(&input[..end], &input[end..])
        }
    }
}

pub fn map<'a, T, U, P, F>(parser: P, f: F) -> impl Parser<'a, U>
where
    P: Parser<'a, T>,
    F: Fn(T) -> U,
{
    move |input: &'a str| {
        let parsed = parser(input);
        Parsed {
            outcome: parsed.outcome.map(&f),
            remaining: parsed.remaining,
        }
    }
}

pub fn map_with_recoverable_exception<'a, T, U, E, P, F>(parser: P, f: F) -> impl Parser<'a, U>
where
    P: Parser<'a, T>,
    F: Fn(T) -> Result<U, E>,
    E: fmt::Display,
{
    move |input: &'a str| {
        let parsed = parser(input);
        match parsed.outcome {
            Ok(value) => match f(value) {
                Ok(mapped) => Parsed::success(mapped, parsed.remaining),
                Err(error) => Parsed::failure(
                    ParseError::Map {
                        message: error.to_string(),
                        remaining: input.len(),
                    },
                    input,
                ),
            },
            Err(error) => Parsed::failure(error, parsed.remaining),
        }
    }
}

pub fn opt<'a, T, P>(parser: P) -> impl Parser<'a, Option<T>>
where
    P: Parser<'a, T>,
{
    move |input: &'a str| {
        let parsed = parser(input);
        match parsed.outcome {
            Ok(value) => Parsed::success(Some(value), parsed.remaining),
            Err(_) => Parsed::success(None, input),
        }
    }
}

pub fn preceded<'a, T, U, P, Q>(first: P, second: Q) -> impl Parser<'a, U>
where
    P: Parser<'a, T>,
    Q: Parser<'a, U>,
{
    map(sequence((first, second)), |(_, value)| value)
}

pub fn terminated<'a, T, U, P, Q>(first: P, second: Q) -> impl Parser<'a, T>
where
    P: Parser<'a, T>,
    Q: Parser<'a, U>,
{
    map(sequence((first, second)), |(value, _)| value)
}

pub fn delimited<'a, T, U, V, P, Q, R>(open: P, inner: Q, close: R) -> impl Parser<'a, U>
where
    P: Parser<'a, T>,
    Q: Parser<'a, U>,
    R: Parser<'a, V>,
{
    map(sequence((open, inner, close)), |(_, value, _)| value)
}

pub fn is_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r')
}

pub fn space0<'a>() -> impl Parser<'a, &'a str> {
    take_while(is_space)
}

pub fn space1<'a>() -> impl Parser<'a, &'a str> {
    take_while_m_n(1, usize::MAX, is_space)
}
