use std::{sync::Arc, time::Duration};

use {
    chrono::Local,
    tracing::{info, warn},
};

use crate::{
    api::BotApi,
    chunk::MessageSegment,
    config::NotifierConfig,
    log::{DispatchLog, DispatchOutcome, FileDispatchLog, SendResult},
    sanitize::FormattingMode,
};

/// Fixed pause between consecutive segment sends of one dispatch. Keeps a
/// multi-segment notification under the API's burst limit; deliberately
/// non-adaptive, no backoff.
pub const SEGMENT_PAUSE: Duration = Duration::from_secs(1);

/// Sends an ordered sequence of segments to one destination, best-effort.
///
/// Rejections and transport failures are recorded per segment and never stop
/// the remaining sends or surface to the caller: the notification must not
/// fail the host operation that triggered it.
pub struct Dispatcher {
    api: BotApi,
    log: Option<Arc<dyn DispatchLog>>,
    log_full_text: bool,
    pause: Duration,
}

impl Dispatcher {
    #[must_use]
    pub fn new(api: BotApi) -> Self {
        Self {
            api,
            log: None,
            log_full_text: false,
            pause: SEGMENT_PAUSE,
        }
    }

    /// Build an API client and file log from `config`.
    #[must_use]
    pub fn from_config(config: &NotifierConfig) -> Self {
        let api = BotApi::new(config.api_base.clone(), config.token.clone());
        let mut dispatcher = Self::new(api);
        if config.log.enabled {
            dispatcher = dispatcher.with_log(
                Arc::new(FileDispatchLog::new(config.log.path.clone())),
                config.log.full_text,
            );
        }
        dispatcher
    }

    /// Attach an outcome log; `full_text` also records each segment's text.
    #[must_use]
    pub fn with_log(mut self, log: Arc<dyn DispatchLog>, full_text: bool) -> Self {
        self.log = Some(log);
        self.log_full_text = full_text;
        self
    }

    /// Override the inter-segment pause (tests shrink it to zero).
    #[must_use]
    pub fn with_pause(mut self, pause: Duration) -> Self {
        self.pause = pause;
        self
    }

    /// Send `segments` to `destination` strictly in order, pausing after each
    /// non-final segment.
    ///
    /// Infallible at the orchestration level: the per-segment outcomes are the
    /// only failure signal, and fire-and-forget callers may drop them.
    pub async fn dispatch(
        &self,
        destination: &str,
        segments: &[MessageSegment],
        mode: FormattingMode,
    ) -> Vec<DispatchOutcome> {
        info!(
            chat_id = destination,
            segment_count = segments.len(),
            mode = mode.parse_mode(),
            "dispatch start"
        );

        let mut outcomes = Vec::with_capacity(segments.len());
        for segment in segments {
            let result = self.send_segment(destination, segment, mode).await;
            let outcome = DispatchOutcome {
                timestamp: Local::now(),
                destination: destination.to_owned(),
                len: segment.len(),
                result,
            };
            self.record(&outcome, segment).await;
            outcomes.push(outcome);

            if !segment.is_final {
                tokio::time::sleep(self.pause).await;
            }
        }

        info!(
            chat_id = destination,
            segment_count = segments.len(),
            sent = outcomes.iter().filter(|o| o.result.is_success()).count(),
            "dispatch done"
        );
        outcomes
    }

    async fn send_segment(
        &self,
        destination: &str,
        segment: &MessageSegment,
        mode: FormattingMode,
    ) -> SendResult {
        match self
            .api
            .send_message(destination, &segment.text, mode.parse_mode())
            .await
        {
            Ok(resp) if resp.ok => match resp.result {
                Some(message) => SendResult::Sent {
                    message_id: message.message_id,
                },
                // ok:true without a result object; treat the envelope itself
                // as the failure description.
                None => SendResult::Transport {
                    description: "ok response without result".into(),
                },
            },
            Ok(resp) => {
                let error_code = resp.error_code.unwrap_or(0);
                let description = resp.description.unwrap_or_default();
                warn!(
                    chat_id = destination,
                    index = segment.index,
                    error_code,
                    description = %description,
                    "sendMessage rejected"
                );
                SendResult::Rejected {
                    error_code,
                    description,
                }
            },
            Err(e) => {
                warn!(
                    chat_id = destination,
                    index = segment.index,
                    error = %e,
                    "sendMessage transport failure"
                );
                SendResult::Transport {
                    description: e.to_string(),
                }
            },
        }
    }

    async fn record(&self, outcome: &DispatchOutcome, segment: &MessageSegment) {
        let Some(ref log) = self.log else {
            return;
        };
        let full_text = self.log_full_text.then_some(segment.text.as_str());
        if let Err(e) = log.record(outcome, full_text).await {
            warn!(error = %e, "failed to write dispatch log entry");
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {mockito::Matcher, secrecy::Secret};

    use super::*;

    fn segment(index: usize, text: &str, is_final: bool) -> MessageSegment {
        MessageSegment {
            index,
            text: text.to_owned(),
            is_final,
        }
    }

    fn dispatcher_for(server: &mockito::Server) -> Dispatcher {
        let api = BotApi::new(server.url(), Secret::new("123:ABC".into()));
        Dispatcher::new(api).with_pause(Duration::ZERO)
    }

    fn ok_body(message_id: i64) -> String {
        serde_json::json!({"ok": true, "result": {"message_id": message_id}}).to_string()
    }

    #[tokio::test]
    async fn sends_segments_in_order() {
        let mut server = mockito::Server::new_async().await;
        let first = server
            .mock("POST", "/bot123:ABC/sendMessage")
            .match_body(Matcher::UrlEncoded("text".into(), "one...".into()))
            .with_body(ok_body(10))
            .create_async()
            .await;
        let second = server
            .mock("POST", "/bot123:ABC/sendMessage")
            .match_body(Matcher::UrlEncoded("text".into(), "two".into()))
            .with_body(ok_body(11))
            .create_async()
            .await;

        let segments = vec![segment(0, "one...", false), segment(1, "two", true)];
        let outcomes = dispatcher_for(&server)
            .dispatch("@channel", &segments, FormattingMode::Plain)
            .await;

        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].result, SendResult::Sent { message_id: 10 });
        assert_eq!(outcomes[1].result, SendResult::Sent { message_id: 11 });
        first.assert_async().await;
        second.assert_async().await;
    }

    #[tokio::test]
    async fn rejection_does_not_stop_remaining_segments() {
        let mut server = mockito::Server::new_async().await;
        let _first = server
            .mock("POST", "/bot123:ABC/sendMessage")
            .match_body(Matcher::UrlEncoded("text".into(), "bad...".into()))
            .with_status(400)
            .with_body(
                serde_json::json!({
                    "ok": false,
                    "error_code": 400,
                    "description": "Bad Request"
                })
                .to_string(),
            )
            .create_async()
            .await;
        let second = server
            .mock("POST", "/bot123:ABC/sendMessage")
            .match_body(Matcher::UrlEncoded("text".into(), "good".into()))
            .with_body(ok_body(12))
            .create_async()
            .await;

        let segments = vec![segment(0, "bad...", false), segment(1, "good", true)];
        let outcomes = dispatcher_for(&server)
            .dispatch("@channel", &segments, FormattingMode::Plain)
            .await;

        assert_eq!(
            outcomes[0].result,
            SendResult::Rejected {
                error_code: 400,
                description: "Bad Request".into(),
            }
        );
        assert_eq!(outcomes[1].result, SendResult::Sent { message_id: 12 });
        second.assert_async().await;
    }

    #[tokio::test]
    async fn transport_failure_yields_outcomes_for_every_segment() {
        let api = BotApi::new("http://127.0.0.1:1", Secret::new("t".into()));
        let dispatcher = Dispatcher::new(api).with_pause(Duration::ZERO);

        let segments = vec![segment(0, "a...", false), segment(1, "b", true)];
        let outcomes = dispatcher
            .dispatch("@channel", &segments, FormattingMode::Plain)
            .await;

        assert_eq!(outcomes.len(), 2);
        assert!(
            outcomes
                .iter()
                .all(|o| matches!(o.result, SendResult::Transport { .. }))
        );
    }

    #[tokio::test]
    async fn transport_outcome_never_contains_bot_token() {
        let api = BotApi::new("http://127.0.0.1:1", Secret::new("123:SECRETTOKEN".into()));
        let dispatcher = Dispatcher::new(api).with_pause(Duration::ZERO);

        let segments = vec![segment(0, "hello", true)];
        let outcomes = dispatcher
            .dispatch("@channel", &segments, FormattingMode::Plain)
            .await;

        let SendResult::Transport { ref description } = outcomes[0].result else {
            panic!("expected transport failure");
        };
        assert!(
            !description.contains("SECRETTOKEN"),
            "token in transport description: {description}"
        );
        let line = outcomes[0].log_line();
        assert!(!line.contains("SECRETTOKEN"), "token in log line: {line}");
    }

    #[tokio::test]
    async fn html_mode_sets_parse_mode_field() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/bot123:ABC/sendMessage")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("parse_mode".into(), "HTML".into()),
                Matcher::UrlEncoded("text".into(), "<b>hi</b>".into()),
            ]))
            .with_body(ok_body(1))
            .create_async()
            .await;

        let segments = vec![segment(0, "<b>hi</b>", true)];
        dispatcher_for(&server)
            .dispatch("@channel", &segments, FormattingMode::Html)
            .await;
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn logs_one_line_per_segment_without_text_by_default() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/bot123:ABC/sendMessage")
            .with_body(ok_body(5))
            .expect(2)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("telegram.log");
        let dispatcher = dispatcher_for(&server)
            .with_log(Arc::new(FileDispatchLog::new(path.clone())), false);

        let segments = vec![segment(0, "secret one...", false), segment(1, "two", true)];
        dispatcher
            .dispatch("@channel", &segments, FormattingMode::Plain)
            .await;

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines.iter().all(|l| l.contains("@channel")));
        assert!(!content.contains("secret"));
    }

    #[tokio::test]
    async fn full_text_logging_appends_segment_text() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/bot123:ABC/sendMessage")
            .with_body(ok_body(5))
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("telegram.log");
        let dispatcher = dispatcher_for(&server)
            .with_log(Arc::new(FileDispatchLog::new(path.clone())), true);

        let segments = vec![segment(0, "the payload", true)];
        dispatcher
            .dispatch("@channel", &segments, FormattingMode::Plain)
            .await;

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1], "the payload");
    }

    #[tokio::test]
    async fn pauses_between_non_final_segments() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/bot123:ABC/sendMessage")
            .with_body(ok_body(1))
            .expect(2)
            .create_async()
            .await;

        let api = BotApi::new(server.url(), Secret::new("123:ABC".into()));
        let dispatcher = Dispatcher::new(api).with_pause(Duration::from_millis(80));

        let segments = vec![segment(0, "a...", false), segment(1, "b", true)];
        let start = std::time::Instant::now();
        dispatcher
            .dispatch("@channel", &segments, FormattingMode::Plain)
            .await;
        assert!(start.elapsed() >= Duration::from_millis(80));
    }
}
