//! Document store speaking Turtle to Solid pods over HTTP

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE, IF_NONE_MATCH, LINK};
use reqwest::{Client, RequestBuilder, Response, StatusCode};

use super::DocumentStore;
use crate::error::{CoreError, StoreError, StoreResult};
use crate::identity::{document_url, WebId};
use crate::rdf::{turtle, Graph};
use crate::vocab::{acl, foaf, rdf};

const TURTLE: &str = "text/turtle";

#[derive(Debug, Clone)]
pub struct HttpStore {
    client: Client,
    /// Bearer token sent with every request, if any
    access_token: Option<String>,
    /// Granted control in the ACLs this store writes
    owner: Option<WebId>,
}

impl HttpStore {
    /// Build a store with the given request and connect timeouts.
    pub fn new(request_timeout: Duration, connect_timeout: Duration) -> Result<Self, CoreError> {
        let client = Client::builder()
            .user_agent(concat!("dataspace/", env!("CARGO_PKG_VERSION")))
            .timeout(request_timeout)
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| CoreError::HttpClient {
                details: e.to_string(),
            })?;
        Ok(Self {
            client,
            access_token: None,
            owner: None,
        })
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    pub fn with_owner(mut self, owner: WebId) -> Self {
        self.owner = Some(owner);
        self
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.access_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, url: &str, request: RequestBuilder) -> StoreResult<Response> {
        self.authorized(request)
            .send()
            .await
            .map_err(|e| StoreError::network(url, e.to_string()))
    }

    async fn put_turtle(&self, url: &str, graph: &Graph) -> StoreResult<()> {
        let body = turtle::serialize(graph)
            .map_err(|e| StoreError::parse(url, format!("serializing document: {e}")))?;
        let request = self
            .client
            .put(url)
            .header(CONTENT_TYPE, TURTLE)
            .body(body);
        let response = self.send(url, request).await?;
        check_status(url, response.status())
    }

    /// WAC document granting public read and owner control on `target`.
    fn public_read_acl(&self, target: &str, owner: &WebId) -> Graph {
        let acl_doc = acl_url(target);
        let public = format!("{acl_doc}#public");
        let owner_auth = format!("{acl_doc}#owner");
        let is_container = target.ends_with('/');

        let mut graph = Graph::new();
        graph
            .add_iri(&public, rdf::TYPE, acl::AUTHORIZATION)
            .add_iri(&public, acl::ACCESS_TO, target)
            .add_iri(&public, acl::AGENT_CLASS, foaf::AGENT)
            .add_iri(&public, acl::MODE, acl::READ)
            .add_iri(&owner_auth, rdf::TYPE, acl::AUTHORIZATION)
            .add_iri(&owner_auth, acl::ACCESS_TO, target)
            .add_iri(&owner_auth, acl::AGENT, owner.as_str())
            .add_iri(&owner_auth, acl::MODE, acl::READ)
            .add_iri(&owner_auth, acl::MODE, acl::WRITE)
            .add_iri(&owner_auth, acl::MODE, acl::CONTROL);
        if is_container {
            graph
                .add_iri(&public, acl::DEFAULT, target)
                .add_iri(&owner_auth, acl::DEFAULT, target);
        }
        graph
    }
}

/// ACL document governing a resource.
fn acl_url(target: &str) -> String {
    format!("{}.acl", document_url(target))
}

fn check_status(url: &str, status: StatusCode) -> StoreResult<()> {
    if status.is_success() {
        return Ok(());
    }
    Err(match status {
        StatusCode::NOT_FOUND | StatusCode::GONE => StoreError::not_found(url),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => StoreError::forbidden(url),
        other => StoreError::Http {
            url: url.to_string(),
            status: other.as_u16(),
        },
    })
}

#[async_trait]
impl DocumentStore for HttpStore {
    async fn fetch_document(&self, url: &str) -> StoreResult<Graph> {
        let doc = document_url(url);
        tracing::debug!(url = %doc, "GET");
        let request = self.client.get(&doc).header(ACCEPT, TURTLE);
        let response = self.send(&doc, request).await?;
        check_status(&doc, response.status())?;
        let body = response
            .text()
            .await
            .map_err(|e| StoreError::network(&doc, e.to_string()))?;
        turtle::parse(&doc, &body)
    }

    async fn write_document(&self, url: &str, graph: &Graph) -> StoreResult<()> {
        let doc = document_url(url);
        tracing::debug!(url = %doc, statements = graph.len(), "PUT");
        self.put_turtle(&doc, graph).await
    }

    async fn create_container(&self, url: &str) -> StoreResult<()> {
        let mut container = document_url(url);
        if !container.ends_with('/') {
            container.push('/');
        }
        let request = self
            .client
            .put(&container)
            .header(CONTENT_TYPE, TURTLE)
            .header(IF_NONE_MATCH, "*")
            .header(
                LINK,
                "<http://www.w3.org/ns/ldp#BasicContainer>; rel=\"type\"",
            );
        let response = self.send(&container, request).await?;
        match response.status() {
            StatusCode::CONFLICT | StatusCode::PRECONDITION_FAILED => {
                Err(StoreError::already_exists(container))
            }
            status => check_status(&container, status),
        }
    }

    async fn set_public_read(&self, url: &str) -> StoreResult<()> {
        let target = document_url(url);
        let acl_doc = acl_url(&target);
        let Some(owner) = &self.owner else {
            // Writing an ACL without an owner grant would lock the owner out.
            return Err(StoreError::forbidden(acl_doc));
        };
        let graph = self.public_read_acl(&target, owner);
        self.put_turtle(&acl_doc, &graph).await
    }

    async fn delete_document(&self, url: &str) -> StoreResult<()> {
        let doc = document_url(url);
        tracing::debug!(url = %doc, "DELETE");
        let request = self.client.delete(&doc);
        let response = self.send(&doc, request).await?;
        check_status(&doc, response.status())
    }
}
