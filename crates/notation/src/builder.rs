use ahash::HashMap;
use miette::SourceSpan;
use polygraph::{
    Catalog, DetailedGraph, MonomerClass, MonomerRef, NodeId, PolymerId, PolymerManager,
    PolymerType, R1, R2, R3, Terminal,
};
use tracing::debug;

use crate::{
    Document,
    errors::{MalformedNotation, NotationError, NotationErrorKind, Result},
    parser::{Annotation, Connection, ConnectionEnd, MonomerToken, Notation, Polymer, PolymerName},
    smiles,
};

/// Materializes a parsed [`Notation`] into a [`Document`]
pub struct Builder<'n, 'c> {
    notation: &'n str,
    catalog: &'c dyn Catalog,
    graph: DetailedGraph,
    manager: PolymerManager,
    polymers: HashMap<&'n str, PolymerId>,
}

// A backbone node, along with the token that declared it
type Backbone<'n> = (NodeId, MonomerToken<'n>);

impl<'n, 'c> Builder<'n, 'c> {
    pub fn new(notation: &'n str, catalog: &'c dyn Catalog) -> Self {
        Self {
            notation,
            catalog,
            graph: DetailedGraph::new(),
            manager: PolymerManager::new(),
            polymers: HashMap::default(),
        }
    }

    pub fn build(mut self, ast: Notation<'n>) -> Result<Document> {
        for polymer in &ast.polymers {
            self.polymer(polymer)?;
        }
        for connection in ast.connections.iter().chain(&ast.pairs) {
            self.connection(connection)?;
        }
        for annotation in &ast.annotations {
            self.annotation(annotation)?;
        }
        self.manager.set_extra(ast.extra);

        Ok(Document {
            graph: self.graph,
            manager: self.manager,
        })
    }

    // Polymers --------------------------------------------------------------------------------------------------------

    fn polymer(&mut self, ast: &Polymer<'n>) -> Result<()> {
        let PolymerName {
            text,
            marker,
            polymer_type,
        } = ast.name;
        if self.polymers.contains_key(text) {
            let kind = NotationErrorKind::DuplicatePolymer(text.to_owned());
            return Err(self.malformed(text, kind).into());
        }
        if polymer_type.is_chemical() {
            if let Some(extra) = ast.units.get(1).and_then(|unit| unit.first()) {
                let kind = NotationErrorKind::MultipleChemicalMonomers;
                return Err(self.malformed(extra.token.text, kind).into());
            }
        }

        let polymer = self.manager.add_polymer(polymer_type, marker);
        self.polymers.insert(text, polymer);

        let mut position = 0;
        let mut previous_unit: Option<Backbone> = None;
        for unit in &ast.units {
            let mut last_backbone: Option<Backbone> = None;
            for item in unit {
                position += 1;
                let node = self.monomer(polymer_type, item.token, item.branch, polymer, position)?;
                let this = (node, item.token);
                if item.branch {
                    if let Some(backbone) = last_backbone {
                        self.chain((backbone, R3), (this, R1))?;
                    }
                } else {
                    if let Some(previous) = last_backbone.or(previous_unit) {
                        self.chain((previous, R2), (this, R1))?;
                    }
                    last_backbone = Some(this);
                }
            }
            // NOTE: A unit without any backbone breaks the chain
            previous_unit = last_backbone;
        }

        self.annotate_residues(polymer, polymer_type)?;
        Ok(())
    }

    fn monomer(
        &mut self,
        polymer_type: PolymerType,
        token: MonomerToken<'n>,
        branch: bool,
        polymer: PolymerId,
        position: u32,
    ) -> Result<NodeId> {
        let monomer = self.resolve(polymer_type, token, branch)?;
        Ok(self
            .graph
            .add_monomer(self.catalog, monomer, polymer, position)?)
    }

    fn resolve(
        &mut self,
        polymer_type: PolymerType,
        token: MonomerToken<'n>,
        branch: bool,
    ) -> Result<MonomerRef> {
        let monomer = MonomerRef::new(polymer_type, token.id);
        if self.graph.resolve(self.catalog, &monomer).is_ok() {
            return Ok(monomer);
        }

        if token.is_bracketed() && smiles::is_smiles(token.id) {
            let class = match polymer_type {
                PolymerType::NucleicAcid if branch => MonomerClass::Branch,
                PolymerType::Chemical => MonomerClass::Chemical,
                _ => MonomerClass::Backbone,
            };
            let descriptor = smiles::adhoc_descriptor(token.id, class);
            debug!(smiles = token.id, %class, "registering an ad-hoc monomer");
            return Ok(self.graph.register_adhoc(polymer_type, descriptor));
        }

        let span = self.span(token.text);
        Err(NotationError::unknown_monomer(self.notation, span, polymer_type, token.id).into())
    }

    fn chain(
        &mut self,
        ((source, source_token), source_label): (Backbone<'n>, &str),
        ((target, target_token), target_label): (Backbone<'n>, &str),
    ) -> Result<()> {
        // NOTE: Checked up front so that the error can point at the offending token
        for (node, token, label) in [
            (source, source_token, source_label),
            (target, target_token, target_label),
        ] {
            if !self.graph.node(node)?.attachments().is_free(label) {
                let kind = NotationErrorKind::UnavailableAttachment {
                    label: label.to_owned(),
                    monomer: token.id.to_owned(),
                };
                return Err(self.malformed(token.text, kind).into());
            }
        }

        self.graph
            .connect(self.catalog, (source, source_label), (target, target_label))?;
        Ok(())
    }

    // NOTE: Nucleic acid backbone units carrying an R3 are sugars, and those without are linkers
    fn annotate_residues(&mut self, polymer: PolymerId, polymer_type: PolymerType) -> Result<()> {
        let nodes = self.graph.polymer_nodes(polymer);
        let starting_node = nodes
            .iter()
            .copied()
            .find(|&node| self.class(node) == Some(MonomerClass::Backbone))
            .or_else(|| nodes.first().copied());
        if let Some(node) = starting_node {
            self.manager.set_starting_node(polymer, node);
        }

        let (numbered, terminals) = match polymer_type {
            PolymerType::NucleicAcid => {
                let branches = self.filter_class(&nodes, MonomerClass::Branch);
                let sugars: Vec<_> = nodes
                    .iter()
                    .copied()
                    .filter(|&node| self.is_sugar(node))
                    .collect();
                (branches, Some((sugars, Terminal::FivePrime, Terminal::ThreePrime)))
            }
            PolymerType::Peptide => {
                let residues = self.filter_class(&nodes, MonomerClass::Backbone);
                let terminals = (residues.clone(), Terminal::NTerminal, Terminal::CTerminal);
                (residues, Some(terminals))
            }
            PolymerType::Chemical => (Vec::new(), None),
        };

        for (node, number) in numbered.into_iter().zip(1..) {
            self.graph.node_mut(node)?.set_residue_number(Some(number));
        }
        if let Some((nodes, first_label, last_label)) = terminals {
            if let (Some(&first), Some(&last)) = (nodes.first(), nodes.last()) {
                self.graph.node_mut(first)?.set_terminal(Some(first_label));
                if last != first {
                    self.graph.node_mut(last)?.set_terminal(Some(last_label));
                }
            }
        }
        Ok(())
    }

    fn class(&self, node: NodeId) -> Option<MonomerClass> {
        self.graph.class(self.catalog, node).ok()
    }

    fn filter_class(&self, nodes: &[NodeId], class: MonomerClass) -> Vec<NodeId> {
        nodes
            .iter()
            .copied()
            .filter(|&node| self.class(node) == Some(class))
            .collect()
    }

    fn is_sugar(&self, node: NodeId) -> bool {
        self.graph.descriptor(self.catalog, node).is_ok_and(|descriptor| {
            descriptor.class == MonomerClass::Backbone
                && descriptor.attachment_points.iter().any(|l| l == R3)
        })
    }

    // Connections -----------------------------------------------------------------------------------------------------

    fn connection(&mut self, ast: &Connection<'n>) -> Result<()> {
        let source = self.endpoint(ast.source, ast.source_end)?;
        let target = self.endpoint(ast.target, ast.target_end)?;
        let source_label = ast.source_end.label;
        let target_label = ast.target_end.label;

        let inserted = self.graph.insert_connection(
            self.catalog,
            (source, source_label),
            (target, target_label),
        )?;
        if inserted.is_none() {
            debug!(
                source = ast.source.text,
                target = ast.target.text,
                "dropped a connection between occupied attachment points"
            );
        }
        Ok(())
    }

    fn endpoint(&self, name: PolymerName<'n>, end: ConnectionEnd<'n>) -> Result<NodeId> {
        let polymer = self.polymer_id(name)?;
        let Some(node) = self.graph.find_position(polymer, end.position) else {
            let kind = NotationErrorKind::MissingPosition {
                polymer: name.text.to_owned(),
                position: end.position,
            };
            return Err(self.malformed(end.text, kind).into());
        };

        let detailed = self.graph.node(node)?;
        if !detailed.attachments().contains(end.label) {
            let kind = NotationErrorKind::UndeclaredAttachment {
                label: end.label.to_owned(),
                monomer: detailed.monomer().monomer_id().to_owned(),
            };
            return Err(self.malformed(end.text, kind).into());
        }

        Ok(node)
    }

    fn annotation(&mut self, ast: &Annotation<'n>) -> Result<()> {
        let polymer = self.polymer_id(ast.name)?;
        if let Some(node) = self.manager.starting_node(polymer) {
            self.manager.annotate(node, ast.text);
        }
        Ok(())
    }

    fn polymer_id(&self, name: PolymerName<'n>) -> Result<PolymerId> {
        self.polymers.get(name.text).copied().ok_or_else(|| {
            let kind = NotationErrorKind::UndeclaredPolymer(name.text.to_owned());
            self.malformed(name.text, kind).into()
        })
    }

    // Errors ----------------------------------------------------------------------------------------------------------

    // NOTE: Every `part` handed to this is a slice of `self.notation`
    fn span(&self, part: &str) -> SourceSpan {
        let offset = part.as_ptr() as usize - self.notation.as_ptr() as usize;
        (offset, part.len()).into()
    }

    fn malformed(&self, part: &str, kind: NotationErrorKind) -> MalformedNotation {
        MalformedNotation::new(self.notation, self.span(part), kind)
    }
}
