//! Line-delimited JSON transport.
//!
//! The relay writes one input message per line and expects exactly one
//! verdict line back per message, in order. Logs never go to the output
//! stream.

use crate::application::engine::DecisionEngine;
use crate::application::ports::KeyValueStore;
use crate::domain::{message::InputMessage, verdict::Verdict};
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

/// Message attached to verdicts for events whose decision failed.
pub const STORE_FAILURE_MSG: &str = "error: rate limiter unavailable";

/// Errors that end a transport run.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Reading input or writing output failed
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// A line could not be decoded. The stream cannot be resynchronised.
    #[error("malformed input line: {source}")]
    Malformed {
        /// The offending line
        line: String,
        #[source]
        source: serde_json::Error,
    },

    /// A verdict could not be encoded
    #[error("failed to encode verdict: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Decode one raw input line.
///
/// Invalid UTF-8 is reported the same way as invalid JSON.
///
/// # Errors
/// Returns `TransportError::Malformed` with the line attached, lossily
/// decoded.
pub fn parse_line(line: &[u8]) -> Result<InputMessage, TransportError> {
    serde_json::from_slice(line).map_err(|source| TransportError::Malformed {
        line: String::from_utf8_lossy(line).into_owned(),
        source,
    })
}

/// Strip the line terminator (`\n` or `\r\n`).
fn trim_newline(mut line: &[u8]) -> &[u8] {
    if let [rest @ .., b'\n'] = line {
        line = rest;
    }
    if let [rest @ .., b'\r'] = line {
        line = rest;
    }
    line
}

/// Write one verdict as a JSON line and flush it.
///
/// # Errors
/// Returns `TransportError::Encode` or `TransportError::Io`.
pub async fn write_verdict<W>(writer: &mut W, verdict: &Verdict) -> Result<(), TransportError>
where
    W: AsyncWrite + Unpin,
{
    let mut line = serde_json::to_vec(verdict).map_err(TransportError::Encode)?;
    line.push(b'\n');
    writer.write_all(&line).await?;
    writer.flush().await?;
    Ok(())
}

/// Decide every message read from `reader`, writing verdicts to `writer`.
///
/// Runs until the input ends and returns the number of verdicts written.
/// Blank lines are skipped. A malformed line is logged and ends the run
/// with an error. A store failure for one event is logged and answered
/// with a reject carrying [`STORE_FAILURE_MSG`], then processing continues.
///
/// # Errors
/// Returns `TransportError` for malformed input or i/o failure.
pub async fn run<S, R, W>(
    engine: &DecisionEngine<S>,
    mut reader: R,
    mut writer: W,
) -> Result<u64, TransportError>
where
    S: KeyValueStore + Clone,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = Vec::new();
    let mut written = 0u64;

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }
        let line = trim_newline(&buf);
        if line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }

        let message = match parse_line(line) {
            Ok(message) => message,
            Err(e) => {
                if let TransportError::Malformed { line, source } = &e {
                    tracing::error!(line = %line, error = %source, "Malformed input, stopping");
                }
                return Err(e);
            }
        };

        let verdict = match engine.decide(&message).await {
            Ok(verdict) => verdict,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    id = %message.event.id,
                    source = %message.source_info,
                    "Decision failed, rejecting event"
                );
                Verdict::reject(message.event.id, STORE_FAILURE_MSG)
            }
        };

        write_verdict(&mut writer, &verdict).await?;
        written += 1;
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::config::RateLimitConfig;
    use crate::domain::verdict::Action;
    use crate::infrastructure::memory_store::InMemoryStore;
    use crate::infrastructure::mocks::{FailingStore, MockCaptureLayer};
    use std::time::Duration;
    use tracing_subscriber::layer::SubscriberExt;

    fn line(id: &str, source_type: &str, source_info: &str) -> String {
        format!(
            r#"{{"type":"new","event":{{"id":"{id}","pubkey":"ab","kind":1,"created_at":1,"tags":[],"content":"","sig":""}},"receivedAt":1,"sourceType":"{source_type}","sourceInfo":"{source_info}"}}"#
        )
    }

    fn decode(output: &[u8]) -> Vec<Verdict> {
        std::str::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    fn engine(max: u64) -> DecisionEngine<InMemoryStore> {
        let config = RateLimitConfig::builder()
            .with_max(max)
            .with_interval(Duration::from_secs(60))
            .build()
            .unwrap();
        DecisionEngine::new(InMemoryStore::new(), config)
    }

    #[tokio::test]
    async fn test_one_verdict_per_line_in_order() {
        let input = [
            line("a", "IP4", "1.1.1.1"),
            line("b", "IP4", "1.1.1.1"),
            line("c", "IP4", "1.1.1.1"),
        ]
        .join("\n");
        let mut output = Vec::new();

        let written = run(&engine(2), input.as_bytes(), &mut output).await.unwrap();

        assert_eq!(written, 3);
        let verdicts = decode(&output);
        let ids: Vec<_> = verdicts.iter().map(|v| v.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(verdicts[2].action, Action::Reject);
    }

    #[tokio::test]
    async fn test_output_line_format() {
        let input = line("abc", "IP6", "::1");
        let mut output = Vec::new();

        run(&engine(10), input.as_bytes(), &mut output).await.unwrap();

        assert_eq!(
            std::str::from_utf8(&output).unwrap(),
            "{\"id\":\"abc\",\"action\":\"accept\",\"msg\":\"\"}\n"
        );
    }

    #[tokio::test]
    async fn test_blank_lines_skipped() {
        let input = format!("\n{}\n\n", line("a", "IP4", "1.1.1.1"));
        let mut output = Vec::new();

        let written = run(&engine(10), input.as_bytes(), &mut output).await.unwrap();
        assert_eq!(written, 1);
    }

    #[tokio::test]
    async fn test_malformed_line_is_fatal() {
        let input = format!(
            "{}\nnot json\n{}\n",
            line("a", "IP4", "1.1.1.1"),
            line("b", "IP4", "1.1.1.1")
        );
        let mut output = Vec::new();
        let capture = MockCaptureLayer::new();
        let subscriber = tracing_subscriber::registry().with(capture.clone());
        let _guard = tracing::subscriber::set_default(subscriber);

        let result = run(&engine(10), input.as_bytes(), &mut output).await;

        match result {
            Err(TransportError::Malformed { line, .. }) => assert_eq!(line, "not json"),
            other => panic!("expected malformed error, got {:?}", other),
        }
        // Verdicts before the bad line were already written, none after it
        assert_eq!(decode(&output).len(), 1);

        let logged = capture.with_message("Malformed input, stopping");
        assert_eq!(logged.len(), 1);
        assert_eq!(logged[0].field("line"), Some("not json"));
    }

    #[tokio::test]
    async fn test_invalid_utf8_line_is_malformed() {
        let input = format!("{}\n", line("a", "IP4", "1.1.1.1")).into_bytes();
        let input = [input, b"\xff\xfe garbage\n".to_vec()].concat();
        let mut output = Vec::new();
        let capture = MockCaptureLayer::new();
        let subscriber = tracing_subscriber::registry().with(capture.clone());
        let _guard = tracing::subscriber::set_default(subscriber);

        let result = run(&engine(10), &input[..], &mut output).await;

        match result {
            Err(TransportError::Malformed { line, .. }) => {
                assert_eq!(line, "\u{fffd}\u{fffd} garbage")
            }
            other => panic!("expected malformed error, got {:?}", other),
        }
        assert_eq!(decode(&output).len(), 1);

        let logged = capture.with_message("Malformed input, stopping");
        assert_eq!(logged.len(), 1);
        assert_eq!(logged[0].field("line"), Some("\u{fffd}\u{fffd} garbage"));
    }

    #[tokio::test]
    async fn test_crlf_and_final_line_without_newline() {
        let input = format!(
            "{}\r\n \r\n{}",
            line("a", "IP4", "1.1.1.1"),
            line("b", "IP4", "1.1.1.1")
        );
        let mut output = Vec::new();

        let written = run(&engine(10), input.as_bytes(), &mut output).await.unwrap();

        assert_eq!(written, 2);
        let ids: Vec<_> = decode(&output).into_iter().map(|v| v.id).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_store_failure_rejects_and_continues() {
        let config = RateLimitConfig::builder().build().unwrap();
        let engine = DecisionEngine::new(FailingStore::new("connection refused"), config);
        let input = [line("a", "IP4", "1.1.1.1"), line("b", "IP4", "2.2.2.2")].join("\n");
        let mut output = Vec::new();

        let written = run(&engine, input.as_bytes(), &mut output).await.unwrap();

        assert_eq!(written, 2);
        for verdict in decode(&output) {
            assert_eq!(verdict.action, Action::Reject);
            assert_eq!(verdict.msg, STORE_FAILURE_MSG);
        }
    }

    #[test]
    fn test_parse_line_keeps_offending_input() {
        let err = parse_line(b"{\"event\":").unwrap_err();
        assert!(matches!(err, TransportError::Malformed { ref line, .. } if line == "{\"event\":"));
    }
}
