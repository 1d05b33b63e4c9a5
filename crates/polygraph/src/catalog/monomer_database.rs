// Standard Library Imports
use std::collections::hash_map::Entry;

// External Crate Imports
use ahash::{HashMap, HashMapExt};
use knus::{Decode, span::Span};
use miette::{Diagnostic, LabeledSpan, NamedSource};
use thiserror::Error;

// Local Crate Imports
use crate::{
    Catalog, MonomerClass, MonomerDescriptor, PolymerType, Result, errors::PolygraphError,
};

pub const DEFAULT_KDL: &str = include_str!("../../data/monomer_database.kdl");

// Public API ==========================================================================================================

#[derive(Clone, Eq, PartialEq, Debug)]
pub struct MonomerDatabase {
    nucleic_acids: Monomers,
    peptides: Monomers,
    chemicals: Monomers,
}

impl MonomerDatabase {
    pub fn new(file_name: impl AsRef<str>, kdl_text: impl AsRef<str>) -> miette::Result<Self> {
        let parsed_db: MonomerDatabaseKdl = knus::parse(file_name.as_ref(), kdl_text.as_ref())?;
        parsed_db
            .validate(())
            .map_err(|e| e.finalize(file_name, kdl_text).into())
    }

    #[must_use]
    pub fn empty() -> Self {
        Self {
            nucleic_acids: Monomers::new(),
            peptides: Monomers::new(),
            chemicals: Monomers::new(),
        }
    }

    pub fn monomers(&self, polymer_type: PolymerType) -> impl Iterator<Item = &MonomerDescriptor> {
        self.section(polymer_type).values()
    }

    #[must_use]
    pub fn contains(&self, polymer_type: PolymerType, monomer_id: &str) -> bool {
        self.section(polymer_type).contains_key(monomer_id)
    }

    const fn section(&self, polymer_type: PolymerType) -> &Monomers {
        match polymer_type {
            PolymerType::NucleicAcid => &self.nucleic_acids,
            PolymerType::Peptide => &self.peptides,
            PolymerType::Chemical => &self.chemicals,
        }
    }
}

impl Catalog for MonomerDatabase {
    fn lookup(&self, polymer_type: PolymerType, monomer_id: &str) -> Result<&MonomerDescriptor> {
        self.section(polymer_type)
            .get(monomer_id)
            .ok_or_else(|| PolygraphError::monomer_lookup(polymer_type, monomer_id).into())
    }
}

impl Default for MonomerDatabase {
    // NOTE: `DEFAULT_KDL` is validated by the `default_database_is_complete` test
    fn default() -> Self {
        Self::new("monomer_database.kdl", DEFAULT_KDL).unwrap()
    }
}

// Private Types =======================================================================================================

type Monomers = HashMap<String, MonomerDescriptor>;

// KDL File Schema =====================================================================================================

#[derive(Debug, Decode)]
#[knus(span_type=Span)]
struct MonomerDatabaseKdl {
    #[knus(child)]
    nucleic_acids: SectionKdl,
    #[knus(child)]
    peptides: SectionKdl,
    #[knus(child)]
    chemicals: SectionKdl,
}

#[derive(Debug, Decode)]
#[knus(span_type=Span)]
struct SectionKdl {
    #[knus(child, unwrap(children))]
    types: Vec<MonomerTypeKdl>,
    #[knus(children)]
    monomers: Vec<MonomerKdl>,
}

// ---------------------------------------------------------------------------------------------------------------------

#[derive(Debug, Decode)]
#[knus(span_type=Span)]
struct MonomerTypeKdl {
    #[knus(span)]
    span: Span,
    #[knus(node_name)]
    name: String,
    #[knus(property)]
    class: String,
    #[knus(children(name = "attachment"))]
    attachments: Vec<AttachmentKdl>,
}

#[derive(Debug, Decode)]
#[knus(span_type=Span)]
struct MonomerKdl {
    #[knus(span)]
    span: Span,
    #[knus(node_name)]
    monomer_type: String,
    #[knus(argument)]
    id: String,
    #[knus(argument)]
    name: String,
    #[knus(property)]
    analog: Option<String>,
    #[knus(property)]
    modified: Option<bool>,
    #[knus(property)]
    smiles: Option<String>,
    #[knus(children(name = "attachment"))]
    attachments: Vec<AttachmentKdl>,
}

#[derive(Clone, Debug, Decode)]
#[knus(span_type=Span)]
struct AttachmentKdl {
    #[knus(span)]
    span: Span,
    #[knus(argument)]
    label: String,
}

// Contextual Validation Trait  ========================================================================================

type CatalogResult<T> = std::result::Result<T, CatalogErrorKind>;

trait ValidateInto<'c, T> {
    type Context: 'c;

    fn validate(self, ctx: Self::Context) -> CatalogResult<T>;
}

// Monomer Database Validation =========================================================================================

impl ValidateInto<'_, MonomerDatabase> for MonomerDatabaseKdl {
    type Context = ();

    fn validate(self, _ctx: Self::Context) -> CatalogResult<MonomerDatabase> {
        Ok(MonomerDatabase {
            nucleic_acids: self.nucleic_acids.validate(())?,
            peptides: self.peptides.validate(())?,
            chemicals: self.chemicals.validate(())?,
        })
    }
}

// Validate Sections ===================================================================================================

impl ValidateInto<'_, Monomers> for SectionKdl {
    type Context = ();

    fn validate(self, _ctx: Self::Context) -> CatalogResult<Monomers> {
        let types = self.types.validate(())?;

        let mut seen_monomers: HashMap<String, (Span, MonomerDescriptor)> = HashMap::new();
        for monomer in self.monomers {
            let span = monomer.span;
            let descriptor = monomer.validate(&types)?;
            match seen_monomers.entry(descriptor.id.clone()) {
                Entry::Occupied(e) => {
                    let (id, (first_defined_at, _)) = e.remove_entry();
                    return Err(CatalogErrorKind::DuplicateMonomer(first_defined_at, span, id));
                }
                Entry::Vacant(e) => e.insert((span, descriptor)),
            };
        }

        Ok(seen_monomers
            .into_iter()
            .map(|(id, (_, descriptor))| (id, descriptor))
            .collect())
    }
}

// Validate Monomer Types and Monomers =================================================================================

struct MonomerType {
    class: MonomerClass,
    attachments: Vec<AttachmentKdl>,
}

type MonomerTypes = HashMap<String, MonomerType>;

impl ValidateInto<'_, MonomerTypes> for Vec<MonomerTypeKdl> {
    type Context = ();

    fn validate(self, _ctx: Self::Context) -> CatalogResult<MonomerTypes> {
        let mut seen_types = HashMap::new();

        for monomer_type in self {
            let class = match monomer_type.class.as_str() {
                "backbone" => MonomerClass::Backbone,
                "branch" => MonomerClass::Branch,
                "chemical" => MonomerClass::Chemical,
                _ => {
                    return Err(CatalogErrorKind::UnknownMonomerClass(
                        monomer_type.span,
                        monomer_type.class,
                    ));
                }
            };

            match seen_types.entry(monomer_type.name) {
                Entry::Occupied(e) => {
                    let (type_name, (first_defined_at, _)) = e.remove_entry();
                    return Err(CatalogErrorKind::DuplicateMonomerType(
                        first_defined_at,
                        monomer_type.span,
                        type_name,
                    ));
                }
                Entry::Vacant(e) => e.insert((
                    monomer_type.span,
                    MonomerType {
                        class,
                        attachments: monomer_type.attachments,
                    },
                )),
            };
        }

        Ok(seen_types.into_iter().map(|(k, (_, v))| (k, v)).collect())
    }
}

impl<'t> ValidateInto<'t, MonomerDescriptor> for MonomerKdl {
    type Context = &'t MonomerTypes;

    fn validate(self, ctx: Self::Context) -> CatalogResult<MonomerDescriptor> {
        let MonomerType { class, attachments } = ctx
            .get(&self.monomer_type)
            .ok_or_else(|| CatalogErrorKind::UndefinedMonomerType(self.span, self.monomer_type))?;

        // NOTE: A `Vec` keeps attachment points in declaration order, which is the order they are reported in
        let mut seen_points: Vec<(String, Span)> = Vec::new();
        for AttachmentKdl { span, label } in attachments.iter().cloned().chain(self.attachments) {
            if let Some(&(_, first_defined_at)) = seen_points.iter().find(|(l, _)| *l == label) {
                return Err(CatalogErrorKind::DuplicateAttachment(
                    first_defined_at,
                    span,
                    label,
                ));
            }
            seen_points.push((label, span));
        }

        Ok(MonomerDescriptor {
            natural_analog: self.analog.unwrap_or_else(|| self.id.clone()),
            id: self.id,
            name: self.name,
            class: *class,
            attachment_points: seen_points.into_iter().map(|(l, _)| l).collect(),
            is_modified: self.modified.unwrap_or_default(),
            smiles: self.smiles,
        })
    }
}

// Validation Error Types and Trait Implementations  ===================================================================

#[derive(Debug, Error)]
#[error("failed to validate monomer database file")]
struct CatalogError {
    kdl: NamedSource<String>,
    #[source]
    kind: CatalogErrorKind,
}

// NOTE: This is manually implemented because the list of labels is dynamic and needs to be extracted from `self.kind`
impl Diagnostic for CatalogError {
    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        Some(&self.kdl)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        Some(Box::new(self.kind.labels().into_iter().map(|(s, l)| {
            LabeledSpan::new_with_span(Some(l.to_owned()), *s)
        })))
    }

    fn diagnostic_source(&self) -> Option<&dyn Diagnostic> {
        Some(&self.kind)
    }
}

#[derive(Clone, Debug, Diagnostic, Error)]
enum CatalogErrorKind {
    #[error("the monomer type {2:?} has already been defined")]
    #[diagnostic(help("consider consolidating duplicate types or picking a new type name"))]
    DuplicateMonomerType(Span, Span, String),

    #[error("the monomer type {1:?} is undefined")]
    #[diagnostic(help("double-check for typos, or add {1:?} to the types section"))]
    UndefinedMonomerType(Span, String),

    #[error("the monomer class {1:?} is not one of \"backbone\", \"branch\", or \"chemical\"")]
    #[diagnostic(help("double-check for typos in the type's `class` property"))]
    UnknownMonomerClass(Span, String),

    #[error("the attachment point {2:?} has already been defined")]
    #[diagnostic(help(
        "double-check for typos, or remove the duplicate attachment point (types already supply theirs)"
    ))]
    DuplicateAttachment(Span, Span, String),

    #[error("the monomer {2:?} has already been defined")]
    #[diagnostic(help("monomer ids must be unique within each polymer type"))]
    DuplicateMonomer(Span, Span, String),
}

impl CatalogErrorKind {
    fn labels(&self) -> Vec<(&Span, &'static str)> {
        match self {
            Self::DuplicateMonomerType(s1, s2, _)
            | Self::DuplicateAttachment(s1, s2, _)
            | Self::DuplicateMonomer(s1, s2, _) => {
                vec![(s1, "first defined here"), (s2, "then again here")]
            }
            Self::UndefinedMonomerType(s, _) => vec![(s, "undefined monomer type")],
            Self::UnknownMonomerClass(s, _) => vec![(s, "unknown monomer class")],
        }
    }

    fn finalize(self, file_name: impl AsRef<str>, kdl: impl AsRef<str>) -> CatalogError {
        let kdl = NamedSource::new(file_name, kdl.as_ref().to_owned());
        CatalogError { kdl, kind: self }
    }
}

// Module Tests ========================================================================================================

#[cfg(test)]
mod tests {
    use indoc::indoc;
    use once_cell::sync::Lazy;

    use crate::testing_tools::render_miette;

    use super::*;

    static DB: Lazy<MonomerDatabase> = Lazy::new(MonomerDatabase::default);

    fn parse_section(kdl: &str) -> std::result::Result<Monomers, CatalogError> {
        let section: SectionKdl = knus::parse("test", kdl).unwrap();
        section.validate(()).map_err(|e| e.finalize("test", kdl))
    }

    #[test]
    fn default_database_is_complete() {
        let standard_bases = ["A", "C", "G", "T", "U"];
        for base in standard_bases {
            let descriptor = DB.lookup(PolymerType::NucleicAcid, base).unwrap();
            assert_eq!(descriptor.class, MonomerClass::Branch);
            assert_eq!(descriptor.natural_analog, base);
            assert!(!descriptor.is_modified);
        }

        assert_eq!(DB.monomers(PolymerType::Peptide).filter(|m| !m.is_modified).count(), 20);
        assert!(DB.monomers(PolymerType::Chemical).all(|m| m.class == MonomerClass::Chemical));
    }

    #[test]
    fn lookup_inherits_and_extends_attachments() {
        let sugar = DB.lookup(PolymerType::NucleicAcid, "R").unwrap();
        assert_eq!(sugar.attachment_points, ["R1", "R2", "R3"]);
        assert!(sugar.smiles.is_some());

        let cysteine = DB.lookup(PolymerType::Peptide, "C").unwrap();
        assert_eq!(cysteine.attachment_points, ["R1", "R2", "R3"]);

        let alanine = DB.lookup(PolymerType::Peptide, "A").unwrap();
        assert_eq!(alanine.attachment_points, ["R1", "R2"]);
    }

    #[test]
    fn lookup_analogs_and_modifications() {
        let phosphorothioate = DB.lookup(PolymerType::NucleicAcid, "sP").unwrap();
        assert_eq!(phosphorothioate.natural_analog, "P");
        assert_eq!(phosphorothioate.class, MonomerClass::Backbone);
        assert!(phosphorothioate.is_modified);

        let phosphate = DB.lookup(PolymerType::NucleicAcid, "P").unwrap();
        assert_eq!(phosphate.natural_analog, "P");
        assert!(!phosphate.is_modified);
    }

    #[test]
    fn lookup_is_keyed_by_polymer_type() {
        // "R" is ribose in nucleic acids, but arginine in peptides
        assert_eq!(DB.lookup(PolymerType::NucleicAcid, "R").unwrap().name, "Ribose");
        assert_eq!(DB.lookup(PolymerType::Peptide, "R").unwrap().name, "Arginine");

        let missing = DB.lookup(PolymerType::Chemical, "R").unwrap_err();
        assert_eq!(
            missing.to_string(),
            r#"the chemical monomer "R" could not be found in the supplied monomer catalog"#
        );
        assert!(!DB.contains(PolymerType::Chemical, "R"));
    }

    #[test]
    fn parse_section_with_defaults() {
        let kdl = indoc! {r#"
            types {
                base class="branch" {
                    attachment "R1"
                }
            }
            base "A" "Adenine"
            base "5meC" "5-Methyl Cytosine" analog="C" modified=true {
                attachment "R2"
            }
        "#};
        let monomers = parse_section(kdl).unwrap();
        assert_eq!(monomers.len(), 2);

        let adenine = &monomers["A"];
        assert_eq!(adenine.natural_analog, "A");
        assert!(!adenine.is_modified);
        assert_eq!(adenine.smiles, None);

        let methyl_cytosine = &monomers["5meC"];
        assert_eq!(methyl_cytosine.natural_analog, "C");
        assert!(methyl_cytosine.is_modified);
        assert_eq!(methyl_cytosine.attachment_points, ["R1", "R2"]);
    }

    #[test]
    fn parse_section_with_duplicate_types() {
        let kdl = indoc! {r#"
            types {
                base class="branch"
                base class="backbone"
            }
        "#};
        let report = render_miette(parse_section(kdl).unwrap_err());
        assert!(report.contains(r#"the monomer type "base" has already been defined"#));
        assert!(report.contains("first defined here"));
        assert!(report.contains("then again here"));
    }

    #[test]
    fn parse_section_with_undefined_type() {
        let kdl = indoc! {r#"
            types {
                base class="branch"
            }
            sugar "R" "Ribose"
        "#};
        let report = render_miette(parse_section(kdl).unwrap_err());
        assert!(report.contains(r#"the monomer type "sugar" is undefined"#));
        assert!(report.contains("undefined monomer type"));
    }

    #[test]
    fn parse_section_with_unknown_class() {
        let kdl = indoc! {r#"
            types {
                base class="side-chain"
            }
        "#};
        let report = render_miette(parse_section(kdl).unwrap_err());
        assert!(report.contains(r#"the monomer class "side-chain" is not one of"#));
    }

    #[test]
    fn parse_section_with_duplicate_attachments() {
        let kdl = indoc! {r#"
            types {
                base class="branch" {
                    attachment "R1"
                }
            }
            base "A" "Adenine" {
                attachment "R1"
            }
        "#};
        let report = render_miette(parse_section(kdl).unwrap_err());
        assert!(report.contains(r#"the attachment point "R1" has already been defined"#));
    }

    #[test]
    fn parse_section_with_duplicate_monomers() {
        let kdl = indoc! {r#"
            types {
                base class="branch"
            }
            base "A" "Adenine"
            base "A" "Another Adenine"
        "#};
        let report = render_miette(parse_section(kdl).unwrap_err());
        assert!(report.contains(r#"the monomer "A" has already been defined"#));
    }

    #[test]
    fn parse_database_without_sections() {
        let kdl = indoc! {r#"
            nucleic-acids {
                types {}
            }
        "#};
        assert!(MonomerDatabase::new("test", kdl).is_err());
    }
}
