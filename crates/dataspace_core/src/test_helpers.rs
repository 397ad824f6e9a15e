#![cfg(test)]

use crate::config::DataspaceConfig;
use crate::identity::WebId;

pub fn web_id(value: &str) -> WebId {
    WebId::parse(value).expect("test WebID")
}

/// Catalog document at `<doc>#it` listing `members` as written (relative or absolute).
pub fn catalog_turtle(members: &[&str]) -> String {
    let mut body = String::from(
        "@prefix dcat: <http://www.w3.org/ns/dcat#>.\n\
         @prefix dcterms: <http://purl.org/dc/terms/>.\n\n\
         <#it> a dcat:Catalog ;\n  dcterms:title \"Test catalog\"",
    );
    for member in members {
        body.push_str(&format!(" ;\n  dcat:dataset <{member}>"));
    }
    body.push_str(" .\n");
    body
}

/// Minimal dataset document with one CSV distribution.
pub fn dataset_turtle(identifier: &str, modified: &str) -> String {
    format!(
        r#"@prefix dcat: <http://www.w3.org/ns/dcat#>.
@prefix dcterms: <http://purl.org/dc/terms/>.
@prefix xsd: <http://www.w3.org/2001/XMLSchema#>.

<#it> a dcat:Dataset ;
  dcterms:identifier "{identifier}" ;
  dcterms:title "Dataset {identifier}" ;
  dcterms:modified "{modified}"^^xsd:dateTime ;
  dcterms:accessRights "public" ;
  dcat:distribution <#dist> .

<#dist> a dcat:Distribution ;
  dcat:downloadURL <../data/{identifier}.csv> ;
  dcat:mediaType "text/csv" .
"#
    )
}

/// Config for `owner` with an in-memory cache.
pub fn memory_config(owner: &str) -> DataspaceConfig {
    let mut config = DataspaceConfig::default();
    config.identity.web_id = Some(web_id(owner));
    config.cache.path = None;
    config
}
