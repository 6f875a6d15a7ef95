//! In-memory service fakes shared by unit tests

use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};

use crate::domain::hook::{Hook, HookConfig};
use crate::domain::repository::Repository;
use crate::dto::pipeline::{GITHUB_PROVIDER, PipelineRecord};
use crate::orchestrator::{Reporter, RotationEvent};
use crate::service::{BuildService, Confirmation, HostingService, ServiceResult};

/// An external call observed by a fake
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ListPipelines(String),
    ListHooks(String),
    UpdateHook {
        repository: String,
        hook_id: u64,
        url: String,
    },
    Rotate(String),
}

/// Ordered log of calls, shared between fakes
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<Call>>>);

impl CallLog {
    fn push(&self, call: Call) {
        self.0.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.0.lock().unwrap().clone()
    }

    pub fn rotations(&self) -> usize {
        self.count(|c| matches!(c, Call::Rotate(_)))
    }

    pub fn updates(&self) -> Vec<(u64, String)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::UpdateHook { hook_id, url, .. } => Some((hook_id, url)),
                _ => None,
            })
            .collect()
    }

    pub fn listings(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::ListHooks(repo) => Some(repo),
                _ => None,
            })
            .collect()
    }

    fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.0.lock().unwrap().iter().filter(|c| pred(c)).count()
    }
}

pub fn hook(id: u64, url: &str) -> Hook {
    Hook {
        id,
        name: "web".to_string(),
        active: true,
        events: vec!["push".to_string()],
        config: HookConfig {
            url: Some(url.to_string()),
            content_type: Some("json".to_string()),
        },
    }
}

pub fn github_record(slug: &str, repo: &str, webhook_url: &str) -> PipelineRecord {
    PipelineRecord {
        id: format!("id-{slug}"),
        slug: slug.to_string(),
        url: format!("https://buildkite.com/acme/{slug}"),
        provider_type: GITHUB_PROVIDER.to_string(),
        webhook_url: Some(webhook_url.to_string()),
        repository_url: repo.to_string(),
    }
}

/// Hosting service backed by a map of repository hooks
#[derive(Debug, Default)]
pub struct FakeHosting {
    hooks: HashMap<Repository, Vec<Hook>>,
    failing_list: HashSet<Repository>,
    failing_updates: HashSet<u64>,
    failing_urls: HashSet<String>,
    log: CallLog,
}

impl FakeHosting {
    pub fn with_log(mut self, log: &CallLog) -> Self {
        self.log = log.clone();
        self
    }

    pub fn with_hooks(mut self, repository: &Repository, hooks: Vec<Hook>) -> Self {
        self.hooks.insert(repository.clone(), hooks);
        self
    }

    pub fn failing_list(mut self, repository: &Repository) -> Self {
        self.failing_list.insert(repository.clone());
        self
    }

    pub fn failing_update(mut self, hook_id: u64) -> Self {
        self.failing_updates.insert(hook_id);
        self
    }

    /// Reject every update that sets this URL, on any hook
    pub fn failing_url(mut self, url: &str) -> Self {
        self.failing_urls.insert(url.to_string());
        self
    }

    pub fn log(&self) -> &CallLog {
        &self.log
    }
}

#[async_trait]
impl HostingService for FakeHosting {
    async fn list_hooks(&self, repository: &Repository) -> ServiceResult<Vec<Hook>> {
        self.log.push(Call::ListHooks(repository.to_string()));
        if self.failing_list.contains(repository) {
            return Err("401 Bad credentials".into());
        }
        Ok(self.hooks.get(repository).cloned().unwrap_or_default())
    }

    async fn update_hook_url(
        &self,
        repository: &Repository,
        hook_id: u64,
        url: &str,
    ) -> ServiceResult<()> {
        self.log.push(Call::UpdateHook {
            repository: repository.to_string(),
            hook_id,
            url: url.to_string(),
        });
        if self.failing_updates.contains(&hook_id) || self.failing_urls.contains(url) {
            return Err("404 Not Found".into());
        }
        Ok(())
    }
}

/// Build service returning fixed records and predictable rotated URLs
#[derive(Debug, Default)]
pub struct FakeBuild {
    records: Vec<PipelineRecord>,
    fail_rotate: bool,
    log: CallLog,
}

impl FakeBuild {
    pub fn with_log(mut self, log: &CallLog) -> Self {
        self.log = log.clone();
        self
    }

    pub fn with_records(mut self, records: Vec<PipelineRecord>) -> Self {
        self.records = records;
        self
    }

    pub fn failing_rotate(mut self) -> Self {
        self.fail_rotate = true;
        self
    }

    pub fn rotated_url(pipeline_id: &str) -> String {
        format!("https://webhook.buildkite.com/deliver/new-{pipeline_id}")
    }
}

#[async_trait]
impl BuildService for FakeBuild {
    async fn list_pipelines(&self, org: &str) -> ServiceResult<Vec<PipelineRecord>> {
        self.log.push(Call::ListPipelines(org.to_string()));
        Ok(self.records.clone())
    }

    async fn rotate_webhook(&self, pipeline_id: &str) -> ServiceResult<String> {
        self.log.push(Call::Rotate(pipeline_id.to_string()));
        if self.fail_rotate {
            return Err("pipeline not found".into());
        }
        Ok(Self::rotated_url(pipeline_id))
    }
}

/// Confirmation answering from a script, then falling back to the default
#[derive(Debug, Default)]
pub struct ScriptedConfirmation {
    answers: Mutex<VecDeque<bool>>,
    asked: Mutex<usize>,
}

impl ScriptedConfirmation {
    pub fn answering(answers: &[bool]) -> Self {
        Self {
            answers: Mutex::new(answers.iter().copied().collect()),
            asked: Mutex::new(0),
        }
    }

    pub fn asked(&self) -> usize {
        *self.asked.lock().unwrap()
    }
}

impl Confirmation for ScriptedConfirmation {
    fn confirm(&self, _question: &str, default: bool) -> ServiceResult<bool> {
        *self.asked.lock().unwrap() += 1;
        Ok(self.answers.lock().unwrap().pop_front().unwrap_or(default))
    }
}

/// Reporter keeping the name of every event
#[derive(Debug, Default)]
pub struct RecordingReporter {
    events: Mutex<Vec<String>>,
}

impl RecordingReporter {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    pub fn saw(&self, name: &str) -> bool {
        self.events().iter().any(|e| e == name)
    }
}

impl Reporter for RecordingReporter {
    fn report(&self, event: RotationEvent<'_>) {
        self.events.lock().unwrap().push(event.name().to_string());
    }
}
