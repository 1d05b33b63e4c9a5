use nom::{
    Err, Finish, IResult, Parser,
    combinator::{all_consuming, complete},
    error::{ErrorKind, ParseError},
};

use crate::errors::{MalformedNotation, NotationErrorKind};

pub type ParseResult<'a, O> = IResult<&'a str, O, LabeledParseError<'a>>;

/// A parse error pinned to the remaining input at the point it occurred
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct LabeledParseError<'a> {
    input: &'a str,
    kind: NotationErrorKind,
}

impl<'a> LabeledParseError<'a> {
    pub const fn new(input: &'a str, kind: NotationErrorKind) -> Self {
        Self { input, kind }
    }

    pub const fn kind(&self) -> &NotationErrorKind {
        &self.kind
    }

    // NOTE: Every `input` is a suffix of `notation`, so the error's offset is just the length of what was consumed
    fn into_malformed(self, notation: &str) -> MalformedNotation {
        let offset = notation.len() - self.input.len();
        MalformedNotation::new(notation, offset, self.kind)
    }
}

impl<'a> ParseError<&'a str> for LabeledParseError<'a> {
    fn from_error_kind(input: &'a str, kind: ErrorKind) -> Self {
        Self::new(input, kind.into())
    }

    fn append(_input: &str, _kind: ErrorKind, other: Self) -> Self {
        other
    }

    // NOTE: Of two failed alternatives, report the one that made it further into the input
    fn or(self, other: Self) -> Self {
        if other.input.len() < self.input.len() {
            other
        } else {
            self
        }
    }
}

/// Runs `parser` over the whole of its input, converting any failure into a [`MalformedNotation`]
pub fn final_parser<'a, O>(
    parser: impl Parser<&'a str, O, LabeledParseError<'a>>,
) -> impl FnMut(&'a str) -> Result<O, MalformedNotation> {
    let mut parser = all_consuming(complete(parser));
    move |input| {
        parser
            .parse(input)
            .finish()
            .map(|(_, output)| output)
            .map_err(|e| e.into_malformed(input))
    }
}

/// Replaces any error from `parser` with `kind`, pointing at the input `parser` started from
pub fn expect<'a, O>(
    mut parser: impl Parser<&'a str, O, LabeledParseError<'a>>,
    kind: NotationErrorKind,
) -> impl FnMut(&'a str) -> ParseResult<'a, O> {
    move |i| {
        parser
            .parse(i)
            .map_err(|e| e.map(|_| LabeledParseError::new(i, kind.clone())))
    }
}

/// Like [`expect`], but only replaces recoverable errors, letting committed failures through untouched
pub fn expect_soft<'a, O>(
    mut parser: impl Parser<&'a str, O, LabeledParseError<'a>>,
    kind: NotationErrorKind,
) -> impl FnMut(&'a str) -> ParseResult<'a, O> {
    move |i| match parser.parse(i) {
        Err(Err::Error(_)) => Err(Err::Error(LabeledParseError::new(i, kind.clone()))),
        result => result,
    }
}
