mod labeled;

use nom::{
    branch::alt,
    bytes::complete::{is_not, tag, take_till},
    character::complete::{alphanumeric1, char, satisfy, u32},
    combinator::{consumed, cut, map, not, opt, recognize, rest},
    multi::{many0_count, many1, many1_count, separated_list1},
    sequence::{delimited, pair, preceded, separated_pair, terminated, tuple},
};
use polygraph::PolymerType;

pub use labeled::{LabeledParseError, ParseResult, expect, expect_soft, final_parser};

use crate::errors::NotationErrorKind;

// Syntax Tree =========================================================================================================

#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Notation<'s> {
    pub polymers: Vec<Polymer<'s>>,
    pub connections: Vec<Connection<'s>>,
    pub pairs: Vec<Connection<'s>>,
    pub annotations: Vec<Annotation<'s>>,
    pub extra: &'s str,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct PolymerName<'s> {
    pub text: &'s str,
    pub marker: &'s str,
    pub polymer_type: PolymerType,
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Polymer<'s> {
    pub name: PolymerName<'s>,
    pub units: Vec<Unit<'s>>,
}

pub type Unit<'s> = Vec<UnitItem<'s>>;

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct UnitItem<'s> {
    pub token: MonomerToken<'s>,
    pub branch: bool,
}

/// A monomer id, along with the full text it was written as (brackets included)
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct MonomerToken<'s> {
    pub id: &'s str,
    pub text: &'s str,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct Connection<'s> {
    pub source: PolymerName<'s>,
    pub target: PolymerName<'s>,
    pub source_end: ConnectionEnd<'s>,
    pub target_end: ConnectionEnd<'s>,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct ConnectionEnd<'s> {
    pub text: &'s str,
    pub position: u32,
    pub label: &'s str,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct Annotation<'s> {
    pub name: PolymerName<'s>,
    pub text: &'s str,
}

impl MonomerToken<'_> {
    #[must_use]
    pub fn is_bracketed(&self) -> bool {
        self.text.starts_with('[')
    }
}

// Sections ============================================================================================================

/// Notation = Polymers , "$" , Connections , "$" , Pairs , "$" , Annotations , "$" , Extra ;
pub fn notation(i: &str) -> ParseResult<Notation> {
    let section_end = || expect(char('$'), NotationErrorKind::ExpectedSectionEnd);
    let parser = tuple((
        terminated(polymers, section_end()),
        terminated(connections, section_end()),
        terminated(connections, section_end()),
        terminated(annotations, section_end()),
        rest,
    ));
    map(
        parser,
        |(polymers, connections, pairs, annotations, extra)| Notation {
            polymers,
            connections,
            pairs,
            annotations,
            extra,
        },
    )(i)
}

/// Polymers = Polymer , { "|" , Polymer } ;
fn polymers(i: &str) -> ParseResult<Vec<Polymer>> {
    separated_list1(char('|'), polymer)(i)
}

/// Connections = [ Connection , { "|" , Connection } ] ;
fn connections(i: &str) -> ParseResult<Vec<Connection>> {
    map(opt(separated_list1(char('|'), connection)), Option::unwrap_or_default)(i)
}

/// Annotations = [ Annotation , { "|" , Annotation } ] ;
fn annotations(i: &str) -> ParseResult<Vec<Annotation>> {
    map(opt(separated_list1(char('|'), annotation)), Option::unwrap_or_default)(i)
}

// Polymers ============================================================================================================

/// Polymer = Polymer Id , "{" , Polymer Body , "}" ;
fn polymer(i: &str) -> ParseResult<Polymer> {
    let (i, name) = polymer_id(i)?;
    let (i, units) = delimited(
        cut(expect(char('{'), NotationErrorKind::ExpectedPolymerBody)),
        cut(polymer_body(name.polymer_type)),
        cut(expect(char('}'), NotationErrorKind::ExpectedPolymerEnd)),
    )(i)?;
    Ok((i, Polymer { name, units }))
}

/// Polymer Id = ( "RNA" | "DNA" | "PEPTIDE" | "CHEM" ) , Count ;
fn polymer_id(i: &str) -> ParseResult<PolymerName> {
    let marker = alt((tag("RNA"), tag("DNA"), tag("PEPTIDE"), tag("CHEM")));
    let marker = expect(marker, NotationErrorKind::ExpectedPolymerId);
    let parser = consumed(terminated(marker, count));
    map(parser, |(text, marker)| PolymerName {
        text,
        marker,
        polymer_type: match marker {
            "PEPTIDE" => PolymerType::Peptide,
            "CHEM" => PolymerType::Chemical,
            _ => PolymerType::NucleicAcid,
        },
    })(i)
}

/// Polymer Body = Unit , { "." , Unit } ;
fn polymer_body<'s>(polymer_type: PolymerType) -> impl FnMut(&'s str) -> ParseResult<'s, Vec<Unit<'s>>> {
    let unit: for<'a> fn(&'a str) -> ParseResult<'a, Unit<'a>> = match polymer_type {
        PolymerType::NucleicAcid => nucleotide_unit,
        PolymerType::Peptide => residue_unit,
        PolymerType::Chemical => chemical_unit,
    };
    separated_list1(char('.'), unit)
}

/// Nucleotide Unit = { Monomer Token | Branch }- ;
fn nucleotide_unit(i: &str) -> ParseResult<Unit> {
    let backbone = map(monomer_token, |token| UnitItem {
        token,
        branch: false,
    });
    let branch = map(branch, |token| UnitItem {
        token,
        branch: true,
    });
    many1(alt((backbone, branch)))(i)
}

/// Residue Unit = Monomer Token ;
fn residue_unit(i: &str) -> ParseResult<Unit> {
    map(monomer_token, |token| {
        vec![UnitItem {
            token,
            branch: false,
        }]
    })(i)
}

/// Chemical Unit = Identifier | Bracketed Token ;
fn chemical_unit(i: &str) -> ParseResult<Unit> {
    let bare = map(identifier, |id| MonomerToken { id, text: id });
    let bare = expect(bare, NotationErrorKind::ExpectedChemicalMonomer);
    map(alt((bare, bracketed_token)), |token| {
        vec![UnitItem {
            token,
            branch: false,
        }]
    })(i)
}

/// Branch = "(" , Monomer Token , ")" ;
fn branch(i: &str) -> ParseResult<MonomerToken> {
    delimited(
        char('('),
        cut(expect_soft(monomer_token, NotationErrorKind::ExpectedBranch)),
        cut(expect(char(')'), NotationErrorKind::ExpectedBranchEnd)),
    )(i)
}

// Monomers ============================================================================================================

/// Monomer Token = letter | digit | Bracketed Token ;
fn monomer_token(i: &str) -> ParseResult<MonomerToken> {
    let single = recognize(satisfy(|c| c.is_ascii_alphanumeric()));
    let single = map(single, |id| MonomerToken { id, text: id });
    let single = expect(single, NotationErrorKind::ExpectedMonomer);
    alt((single, bracketed_token))(i)
}

/// Bracketed Token = "[" , Bracketed , "]" ;
fn bracketed_token(i: &str) -> ParseResult<MonomerToken> {
    let open = expect(char('['), NotationErrorKind::ExpectedMonomer);
    let close = cut(expect(char(']'), NotationErrorKind::ExpectedBracketEnd));
    let parser = consumed(delimited(open, cut(bracketed), close));
    map(parser, |(text, id)| MonomerToken { id, text })(i)
}

/// Bracketed = { ( any character - "[" - "]" ) | "[" , [ Bracketed ] , "]" }- ;
fn bracketed(i: &str) -> ParseResult<&str> {
    let nested = delimited(
        char('['),
        opt(bracketed),
        cut(expect(char(']'), NotationErrorKind::ExpectedBracketEnd)),
    );
    let parser = recognize(many1_count(alt((is_not("[]"), recognize(nested)))));
    expect_soft(parser, NotationErrorKind::ExpectedMonomer)(i)
}

/// Identifier = letter , { letter | digit | "_" | "-" } ;
fn identifier(i: &str) -> ParseResult<&str> {
    let tail = many0_count(alt((alphanumeric1, tag("_"), tag("-"))));
    recognize(pair(satisfy(|c| c.is_ascii_alphabetic()), tail))(i)
}

// Connections =========================================================================================================

/// Connection = Polymer Id , "," , Polymer Id , "," , Connection End , "-" , Connection End ;
fn connection(i: &str) -> ParseResult<Connection> {
    let comma = || expect(char(','), NotationErrorKind::ExpectedComma);
    let dash = expect(char('-'), NotationErrorKind::ExpectedDash);
    let ends = separated_pair(connection_end, dash, connection_end);
    let parser = pair(
        polymer_id,
        cut(tuple((
            preceded(comma(), polymer_id),
            preceded(comma(), ends),
        ))),
    );
    map(
        parser,
        |(source, (target, (source_end, target_end)))| Connection {
            source,
            target,
            source_end,
            target_end,
        },
    )(i)
}

/// Connection End = Count , ":" , Label ;
fn connection_end(i: &str) -> ParseResult<ConnectionEnd> {
    let parser = consumed(separated_pair(count, char(':'), label));
    let parser = map(parser, |(text, (position, label))| ConnectionEnd {
        text,
        position,
        label,
    });
    expect(parser, NotationErrorKind::ExpectedAttachment)(i)
}

/// Label = { letter | digit | "_" }- ;
fn label(i: &str) -> ParseResult<&str> {
    recognize(many1_count(alt((alphanumeric1, tag("_")))))(i)
}

/// Annotation = Polymer Id , "{" , { any character - "}" } , "}" ;
fn annotation(i: &str) -> ParseResult<Annotation> {
    let body = delimited(
        expect(char('{'), NotationErrorKind::ExpectedPolymerBody),
        take_till(|c| c == '}'),
        expect(char('}'), NotationErrorKind::ExpectedPolymerEnd),
    );
    let parser = pair(polymer_id, cut(body));
    map(parser, |(name, text)| Annotation { name, text })(i)
}

// Primitives ==========================================================================================================

/// Count = digit - "0" , { digit } ;
fn count(i: &str) -> ParseResult<u32> {
    let not_zero = expect(cut(not(char('0'))), NotationErrorKind::ExpectedNoLeadingZero);
    let digits = expect(u32, NotationErrorKind::ExpectedDigit);
    preceded(not_zero, digits)(i)
}

// Module Tests ========================================================================================================
