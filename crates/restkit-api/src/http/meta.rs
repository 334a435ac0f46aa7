//! Exception catalog for operators and client authors.

use std::sync::Arc;

use axum::Json;
use restkit_errors::ExceptionRegistry;
use serde::Serialize;

use crate::dispatch::{Endpoint, EndpointRequest, Unvalidated};
use crate::error::{DefinitionError, HandlerError};
use crate::state::ApiState;

#[derive(Debug, Serialize)]
pub(crate) struct KindEntry {
    pub(crate) name: &'static str,
    pub(crate) parent: Option<&'static str>,
    pub(crate) code: i64,
    pub(crate) status: u16,
    pub(crate) category: &'static str,
    pub(crate) message: &'static str,
    pub(crate) ambiguous: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct CatalogResponse {
    pub(crate) kinds: Vec<KindEntry>,
    pub(crate) tree: Vec<String>,
}

pub(crate) fn catalog(registry: &ExceptionRegistry) -> CatalogResponse {
    let kinds = registry
        .iter()
        .map(|kind| KindEntry {
            name: kind.name(),
            parent: kind.parent(),
            code: kind.code(),
            status: kind.status(),
            category: kind.category().as_str(),
            message: kind.message(),
            ambiguous: kind.parent().is_some() && registry.is_ambiguous(kind.code()),
        })
        .collect();
    let tree = registry.render_tree().map(|line| line.to_string()).collect();
    CatalogResponse { kinds, tree }
}

pub(crate) fn endpoint(state: &Arc<ApiState>) -> Result<Endpoint, DefinitionError> {
    let state = Arc::clone(state);
    Endpoint::builder("exception_catalog")
        .get(move |_request: EndpointRequest, _payload: Unvalidated| {
            let response = catalog(state.registry());
            async move { Ok::<_, HandlerError>(Json(response)) }
        })
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_lists_every_kind_with_its_tree_line() -> anyhow::Result<()> {
        let registry = ExceptionRegistry::standard()?;
        let catalog = catalog(&registry);
        assert_eq!(catalog.kinds.len(), registry.len());
        assert_eq!(catalog.tree.len(), registry.len());

        let not_found = catalog
            .kinds
            .iter()
            .find(|kind| kind.name == "not_found")
            .ok_or_else(|| anyhow::anyhow!("not_found missing"))?;
        assert!(not_found.ambiguous);
        assert_eq!(not_found.parent, Some("api_exception"));

        let root = &catalog.kinds[0];
        assert_eq!(root.name, "api_exception");
        assert!(!root.ambiguous);
        Ok(())
    }
}
