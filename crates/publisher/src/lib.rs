//! Build-completion integration for Notifo notifications.
//!
//! Sits between the build host and the delivery client: decides whether a
//! finished build warrants a notification, resolves the effective credential
//! and recipient list, composes the message, and runs one dispatch. Delivery
//! failures go to the build's console sink and never fail the build.

use notifo_client::{HttpTransport, Notifo, Transport};
use notifo_common::config::{ConfigStore, JobConfig, ResolvedConfig, split_user_names};
use notifo_common::error::NotifyError;
use notifo_common::types::{
    BufferSink, BuildInfo, BuildResult, ConsoleSink, Credential, DeliveryReport,
};

/// Body sent by the interactive configuration check.
pub const SAMPLE_BODY: &str = "Sample notification";

/// Whether a build with this result should notify.
///
/// Anything other than success always notifies; success notifies only when
/// the job opts in.
pub fn should_notify(result: BuildResult, notify_on_success: bool) -> bool {
    result != BuildResult::Success || notify_on_success
}

/// Compose the notification body for a finished build.
///
/// `"<project>: <RESULT>\n"` followed by one `"Possible Culprit: <name>"`
/// per culprit. Culprit lines run together with no separator.
pub fn compose_message(build: &BuildInfo) -> String {
    let mut message = format!("{}: {}\n", build.project_name, build.result);
    for culprit in &build.culprits {
        message.push_str("Possible Culprit: ");
        message.push_str(&culprit.display_name);
    }
    message
}

/// How a build-completion event was handled.
#[derive(Debug)]
pub enum PublishStatus {
    /// Trigger condition not met; nothing sent, configuration untouched.
    Skipped,
    /// Dispatch ran to completion; per-recipient outcomes inside.
    Completed(Vec<DeliveryReport>),
}

/// Publisher invoked once per build completion.
///
/// Holds the job's settings and the host's global-config store. The
/// dispatcher is built fresh for every invocation — there is no cached
/// client and no shared mutable state between builds.
pub struct BuildPublisher<S> {
    job: JobConfig,
    store: S,
}

impl<S: ConfigStore> BuildPublisher<S> {
    pub fn new(job: JobConfig, store: S) -> Self {
        Self { job, store }
    }

    /// Handle one build-completion event against the real Notifo API.
    ///
    /// Only setup-time failures (configuration, client construction)
    /// propagate; delivery failures land in `sink` and in the returned
    /// reports, and the build carries on regardless.
    pub async fn publish(
        &self,
        build: &BuildInfo,
        sink: &mut dyn ConsoleSink,
    ) -> Result<PublishStatus, NotifyError> {
        self.publish_with(build, sink, HttpTransport::new()?).await
    }

    /// Handle one build-completion event over a caller-supplied transport.
    pub async fn publish_with<T: Transport>(
        &self,
        build: &BuildInfo,
        sink: &mut dyn ConsoleSink,
        transport: T,
    ) -> Result<PublishStatus, NotifyError> {
        if !should_notify(build.result, self.job.notify_on_success) {
            tracing::debug!(
                project = %build.project_name,
                "Successful build, notification not requested"
            );
            return Ok(PublishStatus::Skipped);
        }

        let resolved = ResolvedConfig::resolve(&self.job, &self.store)?;
        let notifo = Notifo::with_transport(resolved.credential, resolved.recipients, transport);

        let message = compose_message(build);
        let reports = notifo.dispatch(&message, sink).await;

        let failures = reports.iter().filter(|r| !r.outcome.is_delivered()).count();
        tracing::info!(
            project = %build.project_name,
            result = %build.result,
            recipients = reports.len(),
            failures,
            "Build notification dispatched"
        );

        Ok(PublishStatus::Completed(reports))
    }
}

/// Result of the interactive configuration check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    Ok,
    Error(String),
}

/// Send one sample notification with candidate credentials.
///
/// Used while editing the global configuration: builds a dispatcher ad hoc
/// from the submitted values, sends [`SAMPLE_BODY`], and reports back any
/// captured error text instead of writing to a build console.
pub async fn send_sample_notification(
    service_user: &str,
    api_token: &str,
    user_names: &str,
) -> Validation {
    match Notifo::new(
        Credential::new(service_user, api_token),
        split_user_names(user_names),
    ) {
        Ok(notifo) => sample_dispatch(&notifo).await,
        Err(err) => Validation::Error(format!("Client error: {}", err)),
    }
}

/// Sample-notification check over a caller-supplied transport.
pub async fn send_sample_notification_with<T: Transport>(
    service_user: &str,
    api_token: &str,
    user_names: &str,
    transport: T,
) -> Validation {
    let notifo = Notifo::with_transport(
        Credential::new(service_user, api_token),
        split_user_names(user_names),
        transport,
    );
    sample_dispatch(&notifo).await
}

async fn sample_dispatch<T: Transport>(notifo: &Notifo<T>) -> Validation {
    let mut sink = BufferSink::new();
    notifo.dispatch(SAMPLE_BODY, &mut sink).await;

    if sink.is_empty() {
        Validation::Ok
    } else {
        Validation::Error(format!(
            "Notify returned following errors {}",
            sink.into_lines().join("\n")
        ))
    }
}
