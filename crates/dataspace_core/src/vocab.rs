//! IRIs of the vocabularies catalog documents are written in.
//!
//! These are a stable contract with other catalog producers; change nothing here
//! without a migration story for documents already on pods.

pub mod rdf {
    pub const TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
}

pub mod xsd {
    pub const DATE_TIME: &str = "http://www.w3.org/2001/XMLSchema#dateTime";
    pub const STRING: &str = "http://www.w3.org/2001/XMLSchema#string";
}

pub mod dcat {
    pub const NS: &str = "http://www.w3.org/ns/dcat#";
    pub const CATALOG: &str = "http://www.w3.org/ns/dcat#Catalog";
    pub const CATALOG_RECORD: &str = "http://www.w3.org/ns/dcat#CatalogRecord";
    pub const DATASET: &str = "http://www.w3.org/ns/dcat#Dataset";
    pub const DATASET_SERIES: &str = "http://www.w3.org/ns/dcat#DatasetSeries";
    pub const DISTRIBUTION: &str = "http://www.w3.org/ns/dcat#Distribution";
    pub const DATASET_PROP: &str = "http://www.w3.org/ns/dcat#dataset";
    pub const DISTRIBUTION_PROP: &str = "http://www.w3.org/ns/dcat#distribution";
    pub const DOWNLOAD_URL: &str = "http://www.w3.org/ns/dcat#downloadURL";
    pub const ACCESS_URL: &str = "http://www.w3.org/ns/dcat#accessURL";
    pub const MEDIA_TYPE: &str = "http://www.w3.org/ns/dcat#mediaType";
    pub const CONTACT_POINT: &str = "http://www.w3.org/ns/dcat#contactPoint";
    pub const THEME: &str = "http://www.w3.org/ns/dcat#theme";
    pub const SERIES_MEMBER: &str = "http://www.w3.org/ns/dcat#seriesMember";
    /// Pre-DCAT-3 spelling still found on older pods.
    pub const LEGACY_CONFORMS_TO: &str = "http://www.w3.org/ns/dcat#conformsTo";
}

pub mod dcterms {
    pub const IDENTIFIER: &str = "http://purl.org/dc/terms/identifier";
    pub const TITLE: &str = "http://purl.org/dc/terms/title";
    pub const DESCRIPTION: &str = "http://purl.org/dc/terms/description";
    pub const ISSUED: &str = "http://purl.org/dc/terms/issued";
    pub const MODIFIED: &str = "http://purl.org/dc/terms/modified";
    pub const PUBLISHER: &str = "http://purl.org/dc/terms/publisher";
    pub const CREATOR: &str = "http://purl.org/dc/terms/creator";
    pub const ACCESS_RIGHTS: &str = "http://purl.org/dc/terms/accessRights";
    pub const CONFORMS_TO: &str = "http://purl.org/dc/terms/conformsTo";
    pub const FORMAT: &str = "http://purl.org/dc/terms/format";
    pub const HAS_PART: &str = "http://purl.org/dc/terms/hasPart";
}

pub mod foaf {
    pub const AGENT: &str = "http://xmlns.com/foaf/0.1/Agent";
    pub const MEMBER: &str = "http://xmlns.com/foaf/0.1/member";
    pub const NAME: &str = "http://xmlns.com/foaf/0.1/name";
    pub const MBOX: &str = "http://xmlns.com/foaf/0.1/mbox";
    pub const PRIMARY_TOPIC: &str = "http://xmlns.com/foaf/0.1/primaryTopic";
}

pub mod vcard {
    pub const FN: &str = "http://www.w3.org/2006/vcard/ns#fn";
    pub const HAS_EMAIL: &str = "http://www.w3.org/2006/vcard/ns#hasEmail";
    pub const VALUE: &str = "http://www.w3.org/2006/vcard/ns#value";
}

pub mod ldp {
    pub const CONTAINS: &str = "http://www.w3.org/ns/ldp#contains";
    pub const BASIC_CONTAINER: &str = "http://www.w3.org/ns/ldp#BasicContainer";
}

pub mod solid {
    pub const PUBLIC_TYPE_INDEX: &str = "http://www.w3.org/ns/solid/terms#publicTypeIndex";
    pub const TYPE_REGISTRATION: &str = "http://www.w3.org/ns/solid/terms#TypeRegistration";
    pub const FOR_CLASS: &str = "http://www.w3.org/ns/solid/terms#forClass";
    pub const INSTANCE: &str = "http://www.w3.org/ns/solid/terms#instance";
}

pub mod acl {
    pub const AUTHORIZATION: &str = "http://www.w3.org/ns/auth/acl#Authorization";
    pub const ACCESS_TO: &str = "http://www.w3.org/ns/auth/acl#accessTo";
    pub const DEFAULT: &str = "http://www.w3.org/ns/auth/acl#default";
    pub const AGENT: &str = "http://www.w3.org/ns/auth/acl#agent";
    pub const AGENT_CLASS: &str = "http://www.w3.org/ns/auth/acl#agentClass";
    pub const MODE: &str = "http://www.w3.org/ns/auth/acl#mode";
    pub const READ: &str = "http://www.w3.org/ns/auth/acl#Read";
    pub const WRITE: &str = "http://www.w3.org/ns/auth/acl#Write";
    pub const CONTROL: &str = "http://www.w3.org/ns/auth/acl#Control";
}

/// Dataspace-manager change log terms.
pub mod sdm {
    pub const NS: &str = "https://w3id.org/solid-dataspace-manager#";
    pub const CHANGE_LOG: &str = "https://w3id.org/solid-dataspace-manager#changeLog";
    pub const CHANGE_EVENT: &str = "https://w3id.org/solid-dataspace-manager#ChangeEvent";
    pub const THEME_NS: &str = "https://w3id.org/solid-dataspace-manager/theme/";
}
