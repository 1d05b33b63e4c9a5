use std::{fmt, iter};

use miette::{Diagnostic, LabeledSpan, SourceCode, SourceSpan};
use nom::error::ErrorKind;
use polygraph::{PolygraphError, PolymerType};
use thiserror::Error;

pub type Result<T, E = Box<NotationError>> = std::result::Result<T, E>;

#[derive(Debug, Diagnostic, Clone, Eq, PartialEq, Error)]
pub enum NotationError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Malformed(#[from] MalformedNotation),

    #[error("the {polymer_type} monomer {id:?} could not be found in the supplied monomer catalog")]
    #[diagnostic(help(
        "double-check for typos, add {id:?} to the monomer catalog, or give the monomer's SMILES in brackets"
    ))]
    UnknownMonomer {
        #[source_code]
        notation: String,
        #[label("unknown monomer")]
        span: SourceSpan,
        polymer_type: PolymerType,
        id: String,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Graph(#[from] Box<PolygraphError>),
}

/// A notation that breaks the grammar, or describes a structure that can't be built
#[derive(Debug, Clone, Eq, PartialEq, Error)]
#[error("{kind}")]
pub struct MalformedNotation {
    notation: String,
    label: LabeledSpan,
    kind: NotationErrorKind,
}

#[derive(Clone, Eq, PartialEq, Debug, Diagnostic, Error)]
pub enum NotationErrorKind {
    // Grammar ---------------------------------------------------------------------------------------------------------
    #[diagnostic(help("polymer ids are made of RNA, DNA, PEPTIDE, or CHEM followed by a number, like RNA1"))]
    #[error("expected a polymer id")]
    ExpectedPolymerId,

    #[error("expected '{{' to open the monomers of a polymer")]
    ExpectedPolymerBody,

    #[diagnostic(help("you've probably forgotten to close an earlier '{{'"))]
    #[error("expected '}}' to close the polymer")]
    ExpectedPolymerEnd,

    #[diagnostic(help("monomer ids longer than one character must be wrapped in brackets, like [dR]"))]
    #[error("expected a monomer: either a single letter or digit, or a bracketed monomer id")]
    ExpectedMonomer,

    #[error("expected a chemical monomer: either an identifier or a bracketed monomer id")]
    ExpectedChemicalMonomer,

    #[error("expected a branch monomer between parentheses")]
    ExpectedBranch,

    #[diagnostic(help("you've probably forgotten to close an earlier '(' parenthesis"))]
    #[error("expected ')' to close the branch monomer")]
    ExpectedBranchEnd,

    #[diagnostic(help("you've probably forgotten to close an earlier '[' bracket"))]
    #[error("expected ']' to close the bracketed monomer")]
    ExpectedBracketEnd,

    #[error("expected a ',' between the parts of a connection")]
    ExpectedComma,

    #[error("expected a '-' between the two ends of a connection")]
    ExpectedDash,

    #[error("expected a monomer position and attachment point, like 3:R2")]
    ExpectedAttachment,

    #[diagnostic(help("a 0 value doesn't make sense here, so try dropping any leading zeros"))]
    #[error("counts cannot start with 0")]
    ExpectedNoLeadingZero,

    #[error("expected an ASCII digit 1-9")]
    ExpectedDigit,

    #[diagnostic(help("every notation has five sections separated by '$', even when some of them are empty"))]
    #[error("expected a '$' to end this section of the notation")]
    ExpectedSectionEnd,

    // Structure -------------------------------------------------------------------------------------------------------
    #[error("the polymer id {0:?} was declared more than once")]
    DuplicatePolymer(String),

    #[diagnostic(help("connections and annotations can only refer to polymers declared in the first section"))]
    #[error("the polymer {0:?} was never declared")]
    UndeclaredPolymer(String),

    #[error("the polymer {polymer:?} has no monomer at position {position}")]
    MissingPosition { polymer: String, position: u32 },

    #[error("the attachment point {label:?} is not declared by the monomer {monomer:?}")]
    UndeclaredAttachment { label: String, monomer: String },

    #[diagnostic(help(
        "backbone monomers need a free R2 to link the next unit, and a free R3 to carry a branch monomer"
    ))]
    #[error("the monomer {monomer:?} has no free {label:?} attachment point to extend its chain with")]
    UnavailableAttachment { label: String, monomer: String },

    #[error("a chemical polymer must contain exactly one monomer")]
    MultipleChemicalMonomers,

    // Internal --------------------------------------------------------------------------------------------------------
    #[diagnostic(help(
        "this is an internal error that you shouldn't ever see! If you have gotten this error, \
        then please report it as a bug!"
    ))]
    #[error("internal `nom` error: {0:?}")]
    NomError(ErrorKind),

    #[diagnostic(help(
        "check the unparsed region for errors, or remove it from the rest of the notation"
    ))]
    #[error("could not interpret the full input as a valid notation")]
    Incomplete,
}

impl NotationError {
    pub(crate) fn unknown_monomer(
        notation: &str,
        span: impl Into<SourceSpan>,
        polymer_type: PolymerType,
        id: &str,
    ) -> Self {
        let notation = notation.to_owned();
        let span = span.into();
        let id = id.to_owned();

        Self::UnknownMonomer {
            notation,
            span,
            polymer_type,
            id,
        }
    }
}

impl From<MalformedNotation> for Box<NotationError> {
    fn from(value: MalformedNotation) -> Self {
        Self::new(NotationError::Malformed(value))
    }
}

impl From<Box<PolygraphError>> for Box<NotationError> {
    fn from(value: Box<PolygraphError>) -> Self {
        Self::new(NotationError::Graph(value))
    }
}

impl MalformedNotation {
    pub(crate) fn new(notation: &str, span: impl Into<SourceSpan>, kind: NotationErrorKind) -> Self {
        // NOTE: The additional space is added so that labels can point to the end of the notation
        let notation = format!("{notation} ");
        let label = LabeledSpan::new_with_span(Some(kind.label().to_owned()), span);

        Self {
            notation,
            label,
            kind,
        }
    }

    #[must_use]
    pub const fn kind(&self) -> &NotationErrorKind {
        &self.kind
    }
}

impl Diagnostic for MalformedNotation {
    fn source_code(&self) -> Option<&dyn SourceCode> {
        Some(&self.notation)
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.kind.help()
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        Some(Box::new(iter::once(self.label.clone())))
    }
}

impl NotationErrorKind {
    const fn label(&self) -> &'static str {
        match self {
            Self::ExpectedPolymerId => "expected a polymer id",
            Self::ExpectedPolymerBody => "expected '{'",
            Self::ExpectedPolymerEnd => "expected '}'",
            Self::ExpectedMonomer | Self::ExpectedChemicalMonomer => "expected a monomer",
            Self::ExpectedBranch => "expected a branch monomer",
            Self::ExpectedBranchEnd => "expected ')'",
            Self::ExpectedBracketEnd => "expected ']'",
            Self::ExpectedComma => "expected ','",
            Self::ExpectedDash => "expected '-'",
            Self::ExpectedAttachment => "expected an attachment",
            Self::ExpectedNoLeadingZero => "expected non-zero",
            Self::ExpectedDigit => "expected digit",
            Self::ExpectedSectionEnd => "expected '$'",
            Self::DuplicatePolymer(_) => "redeclared here",
            Self::UndeclaredPolymer(_) => "unknown polymer",
            Self::MissingPosition { .. } => "no such position",
            Self::UndeclaredAttachment { .. } => "undeclared attachment point",
            Self::UnavailableAttachment { .. } => "can't be chained",
            Self::MultipleChemicalMonomers => "unexpected monomer",
            Self::Incomplete => "input was valid up until this point",
            Self::NomError(_) => "the region that triggered this bug!",
        }
    }
}

impl From<ErrorKind> for NotationErrorKind {
    fn from(value: ErrorKind) -> Self {
        match value {
            ErrorKind::Eof => Self::Incomplete,
            kind => Self::NomError(kind),
        }
    }
}
