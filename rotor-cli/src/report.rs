//! Console output
//!
//! Renders rotation events, the end-of-run summary and fatal errors for the
//! operator. Progress logging goes through `tracing` on stderr; everything
//! here is printed to stdout.

use colored::*;
use rotor_core::domain::hook::{Hook, RepositoryHook};
use rotor_core::domain::pipeline::Pipeline;
use rotor_core::orchestrator::PipelineState;
use rotor_client::ClientError;
use rotor_core::{PartialPropagation, Reporter, RotationEvent, RotorError, RunSummary, WebhookHosts};
use std::process::ExitCode;

/// Exit status when a rotation left hooks on the old URL
pub const EXIT_PARTIALLY_PROPAGATED: u8 = 2;

/// Prints rotation events to the terminal
pub struct ConsoleReporter {
    hosts: WebhookHosts,
}

impl ConsoleReporter {
    pub fn new(hosts: WebhookHosts) -> Self {
        Self { hosts }
    }

    /// Note hooks registered with a different URL format than the pipeline
    fn format_note(&self, pipeline: &Pipeline, hook: &Hook) -> Option<&'static str> {
        let hook_url = hook.url()?;
        let hook_format = self.hosts.format_of(hook_url);
        if hook_format.is_some() && hook_format == self.hosts.format_of(&pipeline.webhook_url) {
            None
        } else {
            Some("(older URL format)")
        }
    }

    fn print_matches(&self, pipeline: &Pipeline, matches: &[RepositoryHook]) {
        println!("\tMatching GitHub Repositories:");
        for matched in matches {
            let note = self.format_note(pipeline, &matched.hook).unwrap_or_default();
            println!("\t\t{}", matched.repository.html_url());
            println!(
                "\t\t\tUpdate {} {}",
                matched.hook_ref().settings_url(),
                note.dimmed()
            );
        }
    }

    fn print_orphans(&self, pipeline: &Pipeline, hooks: &[&Hook]) {
        println!("{}", "\t⚠️  Unknown Buildkite hooks found".yellow());
        for hook in hooks {
            println!("\t\t{}", pipeline.repository.html_url());
            println!(
                "\t\t\t{}/settings/hooks/{}",
                pipeline.repository.html_url(),
                hook.id
            );
            println!("\t\t\t\t{}", hook.url().unwrap_or_default().dimmed());
        }
    }
}

impl Reporter for ConsoleReporter {
    fn report(&self, event: RotationEvent<'_>) {
        match event {
            RotationEvent::Listed { pipeline } => {
                println!("Pipeline: {}", pipeline.url.bold());
                println!("\tCurrent Webhook: {}", pipeline.webhook_url);
            }
            RotationEvent::Matched { pipeline, matches } => {
                self.print_matches(pipeline, matches);
            }
            RotationEvent::Unmatched { .. } => {
                println!(
                    "{}",
                    "\t⚠️  No GitHub repositories with matching hooks".yellow()
                );
            }
            RotationEvent::Orphaned { pipeline, hooks } => {
                self.print_orphans(pipeline, hooks);
            }
            RotationEvent::Skipped { pipeline } => {
                println!("{}\n", format!("Skipped {}", pipeline).dimmed());
            }
            RotationEvent::Verified { hook, .. } => {
                println!(
                    "\t{} {}",
                    "✓".green(),
                    format!("Update permission confirmed on {}", hook.hook_ref()).dimmed()
                );
            }
            RotationEvent::Rotated {
                new_webhook_url, ..
            } => {
                println!("\tNew Webhook: {}", new_webhook_url.cyan());
            }
            RotationEvent::HookUpdated { hook, .. } => {
                println!(
                    "\t{} Updated {}",
                    "✓".green(),
                    hook.hook_ref().settings_url()
                );
            }
            RotationEvent::Done { .. } => {
                println!("{}", "\nUpdated webhook ✅\n".green());
            }
        }
    }
}

/// Print the end-of-run summary
pub fn print_summary(summary: &RunSummary) {
    if summary.outcomes.is_empty() {
        println!("{}", "No GitHub pipelines found.".yellow());
        return;
    }

    println!(
        "{}",
        format!(
            "Rotated {} of {} pipeline(s), updated {} hook(s)",
            summary.rotated(),
            summary.outcomes.len(),
            summary.hooks_updated()
        )
        .bold()
    );

    for outcome in &summary.outcomes {
        let state = match outcome.state {
            PipelineState::Skipped => "skipped".yellow(),
            PipelineState::Done if outcome.propagated == 0 => "rotated, no hooks".yellow(),
            PipelineState::Done => "rotated".green(),
            other => format!("{:?}", other).red(),
        };
        println!("  {} {} {}", "▸".cyan(), outcome.pipeline.bold(), state);
    }
}

/// Print a fatal error and choose the exit status
pub fn print_failure(err: &anyhow::Error) -> ExitCode {
    eprintln!("{}", format!("🚨 {:#}", err).red());
    if let Some(hint) = hint(err) {
        eprintln!("{}", hint.dimmed());
    }

    if let Some(partial) = partial_propagation(err) {
        print_partial_propagation(partial);
    }
    ExitCode::from(exit_status(err))
}

/// Exit status for a fatal error
pub fn exit_status(err: &anyhow::Error) -> u8 {
    if partial_propagation(err).is_some() {
        EXIT_PARTIALLY_PROPAGATED
    } else {
        1
    }
}

/// Suggest a likely cause for an HTTP failure
fn hint(err: &anyhow::Error) -> Option<&'static str> {
    let client = err.chain().find_map(|e| e.downcast_ref::<ClientError>())?;
    let on_github = matches!(
        err.downcast_ref::<RotorError>(),
        Some(RotorError::Permission { .. } | RotorError::Discovery { .. })
    );

    if client.is_not_found() && on_github {
        Some("GitHub answers 404 when the token lacks the admin:repo_hook scope")
    } else if client.is_not_found() {
        Some("Check the organization slug and that the GraphQL token can access it")
    } else if client.is_client_error() {
        Some("Check that both API tokens are valid and not expired")
    } else if client.is_server_error() {
        Some("The API returned a server error, retrying later may help")
    } else {
        None
    }
}

fn partial_propagation(err: &anyhow::Error) -> Option<&PartialPropagation> {
    err.downcast_ref::<RotorError>()
        .and_then(RotorError::partial_propagation)
}

fn print_partial_propagation(partial: &PartialPropagation) {
    eprintln!();
    eprintln!(
        "{}",
        format!(
            "{} was rotated but these hooks still point at the old webhook:",
            partial.pipeline
        )
        .red()
        .bold()
    );
    for hook in &partial.unresolved {
        eprintln!("  {} {}", "▸".red(), hook.settings_url());
    }
    eprintln!();
    eprintln!("Set their Payload URL to {}", partial.new_webhook_url.cyan());
    eprintln!("or re-run rotor to discover and fix the mismatch.");
}
