//! Delivers one message to every configured token.
//!
//! Recipients are attempted in configured order and a failure never stops the
//! loop. After each attempt the fan-out pauses for the per-recipient delay,
//! whatever the outcome, so a burst of recipients cannot exhaust the
//! provider's shared hourly quota.

use std::time::Duration;

use tokio::time::Instant;

use relay_common::types::Message;

use crate::client::NotificationClient;

/// Summary of one fan-out run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FanoutReport {
    /// Recipients a send was attempted for.
    pub attempted: usize,
    /// Recipients that accepted the message.
    pub delivered: usize,
    /// Time of the latest successful send, if any.
    pub last_success: Option<Instant>,
}

/// Send `message` to each non-blank token, pausing `recipient_delay` after every attempt.
pub async fn dispatch_to_all(
    client: &dyn NotificationClient,
    message: &Message,
    tokens: &[String],
    recipient_delay: Duration,
) -> FanoutReport {
    let mut report = FanoutReport::default();

    for token in tokens.iter().map(|t| t.trim()).filter(|t| !t.is_empty()) {
        let outcome = client
            .send(token, message.title_str(), message.text_str())
            .await;
        report.attempted += 1;

        if outcome.is_success() {
            report.delivered += 1;
            // Later successes overwrite earlier ones.
            report.last_success = Some(Instant::now());
        }

        tokio::time::sleep(recipient_delay).await;
    }

    tracing::debug!(
        attempted = report.attempted,
        delivered = report.delivered,
        "Fan-out finished"
    );

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::DispatchOutcome;
    use crate::testing::RecordingClient;

    const DELAY: Duration = Duration::from_secs(5);

    fn tokens(list: &[&str]) -> Vec<String> {
        list.iter().map(|t| t.to_string()).collect()
    }

    fn message() -> Message {
        Message {
            title: Some("Download finished".to_string()),
            text: Some("Some.Show.S01E01".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_three_tokens_three_paced_calls() {
        let client = RecordingClient::with_outcomes(vec![
            DispatchOutcome::NoResponse,
            DispatchOutcome::Success,
            DispatchOutcome::Exception("connection reset".to_string()),
        ]);

        let report =
            dispatch_to_all(&client, &message(), &tokens(&["A", "B", "C"]), DELAY).await;

        let calls = client.calls();
        assert_eq!(calls.len(), 3);
        assert_eq!(report.attempted, 3);
        assert_eq!(report.delivered, 1);
        for pair in calls.windows(2) {
            assert!(pair[1].at.duration_since(pair[0].at) >= DELAY);
        }
        assert_eq!(calls[0].title, "Download finished");
        assert_eq!(calls[0].text, "Some.Show.S01E01");
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_then_success_records_success_time() {
        let client = RecordingClient::with_outcomes(vec![
            DispatchOutcome::TransportFailure {
                status: 502,
                reason: "Bad Gateway".to_string(),
            },
            DispatchOutcome::Success,
            DispatchOutcome::ProviderRejected {
                code: 1,
                message: "quota".to_string(),
            },
        ]);

        let report =
            dispatch_to_all(&client, &message(), &tokens(&["A", "B", "C"]), DELAY).await;

        let calls = client.calls();
        assert_eq!(calls.len(), 3, "third recipient must still be attempted");
        assert_eq!(calls[2].token, "C");
        assert_eq!(report.last_success, Some(calls[1].at));
    }

    #[tokio::test(start_paused = true)]
    async fn test_last_success_wins() {
        let client = RecordingClient::succeeding();

        let report = dispatch_to_all(&client, &message(), &tokens(&["A", "B"]), DELAY).await;

        let calls = client.calls();
        assert_eq!(report.delivered, 2);
        assert_eq!(report.last_success, Some(calls[1].at));
    }

    #[tokio::test(start_paused = true)]
    async fn test_blank_tokens_skipped() {
        let client = RecordingClient::succeeding();

        let report =
            dispatch_to_all(&client, &message(), &tokens(&["A", "", " ", "B"]), DELAY).await;

        let sent: Vec<String> = client.calls().into_iter().map(|c| c.token).collect();
        assert_eq!(sent, vec!["A", "B"]);
        assert_eq!(report.attempted, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_fields_sent_as_empty_strings() {
        let client = RecordingClient::succeeding();
        let text_only = Message {
            text: Some("body only".to_string()),
            ..Default::default()
        };

        dispatch_to_all(&client, &text_only, &tokens(&["A"]), DELAY).await;

        let calls = client.calls();
        assert_eq!(calls[0].title, "");
        assert_eq!(calls[0].text, "body only");
    }
}
