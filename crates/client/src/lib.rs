//! Notifo delivery client.
//!
//! Sends one message to every configured recipient through the Notifo
//! `send_notification` endpoint. Recipients are handled independently and in
//! order: a slow or broken recipient never blocks or cancels delivery to the
//! rest, so the loop records each failure and moves on.

use notifo_common::error::NotifyError;
use notifo_common::types::{ConsoleSink, Credential, DeliveryOutcome, DeliveryReport};

/// Fixed Notifo API endpoint.
pub const NOTIFO_URI: &str = "https://api.notifo.com/v1/send_notification";

/// Title attached to every notification.
pub const MESSAGE_TITLE: &str = "Build Status";

/// Seam between the dispatch loop and the wire.
///
/// One call sends one notification to one recipient and reports either the
/// HTTP status code or a transport-level failure.
pub trait Transport {
    fn send(
        &self,
        credential: &Credential,
        recipient: &str,
        body: &str,
    ) -> impl Future<Output = anyhow::Result<u16>> + Send;
}

/// reqwest-backed transport talking to the real Notifo API.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self, NotifyError> {
        Ok(Self {
            client: reqwest::Client::builder().build()?,
        })
    }
}

impl Transport for HttpTransport {
    /// POST the form-encoded notification.
    ///
    /// Basic auth is set on the request itself, so the credentials go out
    /// preemptively with the first request rather than after a 401
    /// challenge — the behavior the Notifo API expects.
    async fn send(
        &self,
        credential: &Credential,
        recipient: &str,
        body: &str,
    ) -> anyhow::Result<u16> {
        let response = self
            .client
            .post(NOTIFO_URI)
            .basic_auth(&credential.service_user, Some(&credential.token))
            .form(&[("to", recipient), ("msg", body), ("title", MESSAGE_TITLE)])
            .send()
            .await?;

        Ok(response.status().as_u16())
    }
}

/// Notification dispatcher for one credential + recipient list.
///
/// Construction performs no network activity; everything happens in
/// [`Notifo::dispatch`].
pub struct Notifo<T = HttpTransport> {
    credential: Credential,
    recipients: Vec<String>,
    transport: T,
}

impl Notifo<HttpTransport> {
    /// Create a dispatcher backed by the real Notifo API.
    ///
    /// Fails only if the HTTP client cannot be constructed.
    pub fn new(credential: Credential, recipients: Vec<String>) -> Result<Self, NotifyError> {
        Ok(Self::with_transport(
            credential,
            recipients,
            HttpTransport::new()?,
        ))
    }
}

impl<T: Transport> Notifo<T> {
    /// Create a dispatcher over a custom transport.
    pub fn with_transport(credential: Credential, recipients: Vec<String>, transport: T) -> Self {
        Self {
            credential,
            recipients,
            transport,
        }
    }

    pub fn recipients(&self) -> &[String] {
        &self.recipients
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Send `body` to every recipient, sequentially.
    ///
    /// Each recipient is attempted exactly once:
    /// - 200 OK → [`DeliveryOutcome::Delivered`], nothing written to the sink
    /// - any other status → [`DeliveryOutcome::HttpError`] and one sink line
    /// - transport failure → [`DeliveryOutcome::TransportError`] and one sink line
    ///
    /// Individual failures never abort the loop; the returned reports are in
    /// recipient order, one per recipient.
    pub async fn dispatch(&self, body: &str, sink: &mut dyn ConsoleSink) -> Vec<DeliveryReport> {
        let mut reports = Vec::with_capacity(self.recipients.len());

        for recipient in &self.recipients {
            tracing::debug!(recipient = %recipient, "Sending Notifo notification");

            let outcome = match self.transport.send(&self.credential, recipient, body).await {
                Ok(200) => DeliveryOutcome::Delivered,
                Ok(code) => {
                    tracing::warn!(
                        recipient = %recipient,
                        status = code,
                        "Notifo rejected notification"
                    );
                    sink.error(format!(
                        "Bad status code {} received from Notifo for user {}",
                        code, recipient
                    ));
                    DeliveryOutcome::HttpError(code)
                }
                Err(err) => {
                    let cause = format!("{err:#}");
                    tracing::warn!(
                        recipient = %recipient,
                        error = %cause,
                        "Unable to reach Notifo API"
                    );
                    sink.error(format!(
                        "Unable to send message to Notifo API for username: {}: {}",
                        recipient, cause
                    ));
                    DeliveryOutcome::TransportError(cause)
                }
            };

            reports.push(DeliveryReport {
                recipient: recipient.clone(),
                outcome,
            });
        }

        reports
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notifo_common::types::BufferSink;

    /// Transport that answers 200 for everyone.
    struct AlwaysOk;

    impl Transport for AlwaysOk {
        async fn send(
            &self,
            _credential: &Credential,
            _recipient: &str,
            _body: &str,
        ) -> anyhow::Result<u16> {
            Ok(200)
        }
    }

    #[tokio::test]
    async fn test_all_delivered_writes_nothing_to_sink() {
        let notifo = Notifo::with_transport(
            Credential::new("svc", "tok"),
            vec!["a".to_string(), "b".to_string()],
            AlwaysOk,
        );
        let mut sink = BufferSink::new();

        let reports = notifo.dispatch("hello", &mut sink).await;

        assert_eq!(notifo.recipients(), &["a", "b"]);
        assert_eq!(reports.len(), 2);
        assert!(reports.iter().all(|r| r.outcome.is_delivered()));
        assert!(sink.is_empty());
    }

    #[tokio::test]
    async fn test_empty_recipient_list_sends_nothing() {
        let notifo = Notifo::with_transport(Credential::new("svc", "tok"), vec![], AlwaysOk);
        let mut sink = BufferSink::new();

        let reports = notifo.dispatch("hello", &mut sink).await;

        assert!(reports.is_empty());
        assert!(sink.is_empty());
    }
}
