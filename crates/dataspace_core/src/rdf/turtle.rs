//! Turtle in and out of [`Graph`] values.

use oxiri::Iri;
use rio_api::formatter::TriplesFormatter;
use rio_api::model as rio;
use rio_api::parser::TriplesParser;
use rio_turtle::{TurtleError, TurtleFormatter, TurtleParser};

use super::{Graph, Statement, Term};
use crate::error::{StoreError, StoreResult};

/// Parse a Turtle document, resolving relative IRIs against `base_url`.
pub fn parse(base_url: &str, body: &str) -> StoreResult<Graph> {
    let base = Iri::parse(base_url.to_string())
        .map_err(|e| StoreError::parse(base_url, format!("invalid base IRI: {e}")))?;

    let mut graph = Graph::new();
    let mut parser = TurtleParser::new(body.as_bytes(), Some(base));
    parser
        .parse_all(&mut |triple| -> Result<(), TurtleError> {
            if let Some(statement) = from_rio(&triple) {
                graph.insert(statement);
            }
            Ok(())
        })
        .map_err(|e| StoreError::parse(base_url, e.to_string()))?;

    Ok(graph)
}

/// Serialize a graph as Turtle.
pub fn serialize(graph: &Graph) -> std::io::Result<String> {
    let mut formatter = TurtleFormatter::new(Vec::new());
    for statement in graph.iter() {
        let object = match &statement.object {
            Term::Iri { iri } => rio::Term::NamedNode(rio::NamedNode { iri }),
            Term::Blank { id } => rio::Term::BlankNode(rio::BlankNode { id }),
            Term::Literal {
                value,
                datatype: Some(datatype),
                ..
            } => rio::Term::Literal(rio::Literal::Typed {
                value,
                datatype: rio::NamedNode { iri: datatype },
            }),
            Term::Literal {
                value,
                language: Some(language),
                ..
            } => rio::Term::Literal(rio::Literal::LanguageTaggedString { value, language }),
            Term::Literal { value, .. } => rio::Term::Literal(rio::Literal::Simple { value }),
        };
        let subject = match statement.subject.strip_prefix("_:") {
            Some(id) => rio::Subject::BlankNode(rio::BlankNode { id }),
            None => rio::Subject::NamedNode(rio::NamedNode {
                iri: &statement.subject,
            }),
        };
        formatter.format(&rio::Triple {
            subject,
            predicate: rio::NamedNode {
                iri: &statement.predicate,
            },
            object,
        })?;
    }
    let bytes = formatter.finish()?;
    String::from_utf8(bytes).map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}

fn from_rio(triple: &rio::Triple<'_>) -> Option<Statement> {
    let subject = match triple.subject {
        rio::Subject::NamedNode(node) => node.iri.to_string(),
        rio::Subject::BlankNode(node) => format!("_:{}", node.id),
        // RDF-star quoted triples carry nothing catalogs use
        _ => return None,
    };
    let object = match triple.object {
        rio::Term::NamedNode(node) => Term::iri(node.iri),
        rio::Term::BlankNode(node) => Term::blank(node.id),
        rio::Term::Literal(rio::Literal::Simple { value }) => Term::literal(value),
        rio::Term::Literal(rio::Literal::LanguageTaggedString { value, language }) => {
            Term::lang_literal(value, language)
        }
        rio::Term::Literal(rio::Literal::Typed { value, datatype }) => Term::Literal {
            value: value.to_string(),
            datatype: Some(datatype.iri.to_string()),
            language: None,
        },
        _ => return None,
    };
    Some(Statement::new(subject, triple.predicate.iri, object))
}
