//! Pipeline catalog
//!
//! The ordered list of pipelines that drives a run. Built once from the build
//! service's listing; order is preserved exactly as returned.

use std::collections::HashSet;
use tracing::debug;

use crate::domain::pipeline::Pipeline;
use crate::domain::repository::Repository;
use crate::dto::pipeline::PipelineRecord;
use crate::error::{Result, RotorError};
use crate::service::BuildService;
use crate::token::{WebhookToken, extract_token};

/// Pipelines eligible for rotation, in build-service order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineCatalog {
    pipelines: Vec<Pipeline>,
}

impl PipelineCatalog {
    pub fn new(pipelines: Vec<Pipeline>) -> Self {
        Self { pipelines }
    }

    /// Query the build service and build the catalog
    ///
    /// # Arguments
    /// * `build` - The build service client
    /// * `org` - Organization slug
    /// * `filter` - Only keep the pipeline with this slug
    pub async fn load(
        build: &dyn BuildService,
        org: &str,
        filter: Option<&str>,
    ) -> Result<Self> {
        let records = build
            .list_pipelines(org)
            .await
            .map_err(|source| RotorError::Catalog {
                organization: org.to_string(),
                source,
            })?;

        debug!("Build service returned {} pipeline(s)", records.len());

        Self::from_records(org, records, filter)
    }

    /// Convert raw records into pipelines
    ///
    /// Records from providers other than GitHub are dropped silently. A
    /// GitHub record with an unparseable remote or webhook URL aborts the
    /// whole catalog.
    pub fn from_records(
        org: &str,
        records: Vec<PipelineRecord>,
        filter: Option<&str>,
    ) -> Result<Self> {
        let mut pipelines = Vec::new();

        for record in records {
            if filter.is_some_and(|slug| slug != record.slug) {
                continue;
            }
            if !record.is_github() {
                debug!(
                    "Skipping {}/{} with provider {}",
                    org, record.slug, record.provider_type
                );
                continue;
            }

            let name = format!("{}/{}", org, record.slug);
            let repository = Repository::parse(&record.repository_url)
                .map_err(|e| e.in_pipeline(&name))?;
            let webhook_url = record.webhook_url.ok_or_else(|| {
                RotorError::parse(&record.slug, "pipeline has no webhook URL").in_pipeline(&name)
            })?;
            let webhook_token = extract_token(&webhook_url).map_err(|e| e.in_pipeline(&name))?;

            pipelines.push(Pipeline {
                id: record.id,
                org: org.to_string(),
                slug: record.slug,
                url: record.url,
                webhook_url,
                webhook_token,
                repository,
            });
        }

        Ok(Self { pipelines })
    }

    pub fn pipelines(&self) -> &[Pipeline] {
        &self.pipelines
    }

    pub fn len(&self) -> usize {
        self.pipelines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pipelines.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Pipeline> {
        self.pipelines.iter()
    }

    /// Repositories backing the catalog, deduplicated, in first-seen order
    pub fn repositories(&self) -> Vec<&Repository> {
        let mut seen = HashSet::new();
        self.pipelines
            .iter()
            .map(|p| &p.repository)
            .filter(|repo| seen.insert(*repo))
            .collect()
    }

    /// Check whether any pipeline currently uses this token
    pub fn references(&self, token: &WebhookToken) -> bool {
        self.pipelines.iter().any(|p| &p.webhook_token == token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::pipeline::GITHUB_PROVIDER;

    fn record(slug: &str, provider: &str, repo: &str) -> PipelineRecord {
        PipelineRecord {
            id: format!("id-{slug}"),
            slug: slug.to_string(),
            url: format!("https://buildkite.com/acme/{slug}"),
            provider_type: provider.to_string(),
            webhook_url: Some(format!("https://webhook.buildkite.com/deliver/tok-{slug}")),
            repository_url: repo.to_string(),
        }
    }

    #[test]
    fn test_from_records_keeps_order_and_derives_tokens() {
        let records = vec![
            record("web", GITHUB_PROVIDER, "git@github.com:acme/web.git"),
            record("api", GITHUB_PROVIDER, "https://github.com/acme/api.git"),
        ];

        let catalog = PipelineCatalog::from_records("acme", records, None).unwrap();

        let slugs: Vec<_> = catalog.iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(slugs, ["web", "api"]);
        assert_eq!(catalog.pipelines()[0].webhook_token.as_str(), "tok-web");
        assert_eq!(catalog.pipelines()[1].repository.to_string(), "acme/api");
        assert_eq!(catalog.pipelines()[0].to_string(), "acme/web");
        assert_eq!(catalog.pipelines()[1].url, "https://buildkite.com/acme/api");
    }

    #[test]
    fn test_unsupported_providers_are_dropped() {
        let records = vec![
            record("web", GITHUB_PROVIDER, "git@github.com:acme/web.git"),
            record("legacy", "RepositoryProviderBitbucket", "git@bitbucket.org:acme/legacy.git"),
        ];

        let catalog = PipelineCatalog::from_records("acme", records, None).unwrap();

        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.pipelines()[0].slug, "web");
    }

    #[test]
    fn test_malformed_remote_aborts() {
        let records = vec![
            record("web", GITHUB_PROVIDER, "git@github.com:acme/web.git"),
            record("broken", GITHUB_PROVIDER, "https://github.com/acme"),
        ];

        let err = PipelineCatalog::from_records("acme", records, None).unwrap_err();

        match &err {
            RotorError::InvalidPipeline { pipeline, source } => {
                assert_eq!(pipeline, "acme/broken");
                assert!(matches!(**source, RotorError::Parse { .. }));
            }
            other => panic!("expected invalid pipeline error, got {other:?}"),
        }
        assert!(err.to_string().contains("acme/broken"));
        assert!(err.to_string().contains("https://github.com/acme"));
    }

    #[test]
    fn test_malformed_webhook_url_names_pipeline() {
        let mut rec = record("web", GITHUB_PROVIDER, "git@github.com:acme/web.git");
        rec.webhook_url = Some("https://webhook.buildkite.com/".to_string());

        let err = PipelineCatalog::from_records("acme", vec![rec], None).unwrap_err();

        assert!(matches!(err, RotorError::InvalidPipeline { ref pipeline, .. } if pipeline == "acme/web"));
    }

    #[test]
    fn test_filter_keeps_only_named_pipeline() {
        let records = vec![
            record("web", GITHUB_PROVIDER, "git@github.com:acme/web.git"),
            record("api", GITHUB_PROVIDER, "git@github.com:acme/api.git"),
            // filtered out before its remote is ever parsed
            record("broken", GITHUB_PROVIDER, "nonsense"),
        ];

        let catalog = PipelineCatalog::from_records("acme", records, Some("api")).unwrap();

        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.pipelines()[0].slug, "api");
    }

    #[test]
    fn test_missing_webhook_url_names_pipeline() {
        let mut rec = record("web", GITHUB_PROVIDER, "git@github.com:acme/web.git");
        rec.webhook_url = None;

        let err = PipelineCatalog::from_records("acme", vec![rec], None).unwrap_err();

        assert!(err.to_string().contains("acme/web"));
        assert!(err.to_string().contains("no webhook URL"));
    }

    #[test]
    fn test_repositories_deduplicated() {
        let records = vec![
            record("web", GITHUB_PROVIDER, "git@github.com:acme/mono.git"),
            record("api", GITHUB_PROVIDER, "https://github.com/acme/mono"),
            record("docs", GITHUB_PROVIDER, "git@github.com:acme/docs.git"),
        ];

        let catalog = PipelineCatalog::from_records("acme", records, None).unwrap();
        let repos: Vec<_> = catalog.repositories().iter().map(|r| r.to_string()).collect();

        assert_eq!(repos, ["acme/mono", "acme/docs"]);
    }

    #[test]
    fn test_references() {
        let records = vec![record("web", GITHUB_PROVIDER, "git@github.com:acme/web.git")];
        let catalog = PipelineCatalog::from_records("acme", records, None).unwrap();

        let known = extract_token("https://webhook.buildbox.io/github/tok-web").unwrap();
        let unknown = extract_token("https://webhook.buildkite.com/deliver/other").unwrap();

        assert!(catalog.references(&known));
        assert!(!catalog.references(&unknown));
    }
}
