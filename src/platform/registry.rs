// Copyright (c) 2025 - Cowboy AI, Inc.
//! Container image repository

use serde_json::json;
use tracing::info;

use crate::deferred::Deferred;
use crate::domain::ResourceKind;
use crate::errors::ProvisionResult;
use crate::stack::{Properties, ResourceRef, Stack};

#[derive(Debug, Clone)]
pub struct ImageRepository {
    pub resource: ResourceRef,
}

impl ImageRepository {
    /// Registry URL without a tag
    pub fn url(&self) -> Deferred<String> {
        self.resource.output_str("repositoryUrl")
    }
}

/// Declare `{project}-{environment}`, scanned on push with mutable tags
pub fn declare_image_repository(stack: &mut Stack) -> ProvisionResult<ImageRepository> {
    let scope = stack.scope().clone();
    let name = format!("{}-{}", scope.project(), scope.environment());

    let resource = stack.declare(
        ResourceKind::ImageRepository,
        &name,
        Properties::new()
            .set("name", name.as_str())
            .set("imageScanningConfiguration", json!({ "scanOnPush": true }))
            .set("imageTagMutability", "MUTABLE")
            .tags(scope.tags(&name)),
    )?;

    info!(repository = %name, "Declared image repository");
    Ok(ImageRepository { resource })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::InMemoryEngine;
    use crate::naming::NameScope;

    #[tokio::test]
    async fn test_repository_url() {
        let mut stack = Stack::new(NameScope::new("shop", "prod"));
        let repository = declare_image_repository(&mut stack).unwrap();
        assert_eq!(repository.resource.name(), "shop-prod");

        let engine = InMemoryEngine::new();
        stack.apply(&engine).await.unwrap();

        let url = repository.url().resolve().unwrap();
        assert!(url.ends_with("/shop-prod"));
        let created = engine.created().await;
        assert_eq!(created[0].properties["imageScanningConfiguration"]["scanOnPush"], json!(true));
    }
}
