//! JSON-lines transport between the UI and the coordinator.
//!
//! Each stdin line is one command [`Envelope`]. Each stdout line is either a
//! [`ResultEnvelope`] or a [`DomainEvent`].

use pagepilot_protocol::{CorrelationId, DomainEvent, Envelope, ErrorKind, ResultEnvelope};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, trace, warn};

/// Forward envelopes from `input` until EOF.
///
/// A line that is not an envelope but still names a correlation id is
/// answered with a `ValidationError`; anything else is logged and skipped.
pub(crate) async fn read_commands<R>(
    input: R,
    commands: mpsc::Sender<Envelope>,
    replies: mpsc::Sender<ResultEnvelope>,
) -> anyhow::Result<()>
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(input).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        trace!(line = %line, "Inbound envelope");

        match serde_json::from_str::<Envelope>(line) {
            Ok(envelope) => {
                if commands.send(envelope).await.is_err() {
                    debug!("Coordinator stopped accepting commands");
                    break;
                }
            }
            Err(e) => match correlation_id_of(line) {
                Some(id) => {
                    let reply = ResultEnvelope::error(
                        id,
                        ErrorKind::ValidationError,
                        format!("malformed envelope: {}", e),
                    );
                    if replies.send(reply).await.is_err() {
                        break;
                    }
                }
                None => warn!("Skipping line without a correlation id: {}", e),
            },
        }
    }
    debug!("Command input closed");
    Ok(())
}

fn correlation_id_of(line: &str) -> Option<CorrelationId> {
    let value: Value = serde_json::from_str(line).ok()?;
    value
        .get("correlationId")
        .and_then(Value::as_str)
        .map(CorrelationId::from)
}

/// Write replies and events to `output`, one JSON document per line.
///
/// Returns once every reply sender is gone.
pub(crate) async fn write_output<W>(
    mut output: W,
    mut replies: mpsc::Receiver<ResultEnvelope>,
    mut events: broadcast::Receiver<DomainEvent>,
) -> anyhow::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut events_open = true;
    loop {
        let line = tokio::select! {
            biased;
            reply = replies.recv() => match reply {
                Some(reply) => serde_json::to_string(&reply)?,
                None => break,
            },
            event = events.recv(), if events_open => match event {
                Ok(event) => serde_json::to_string(&event)?,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Event output fell behind");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => {
                    events_open = false;
                    continue;
                }
            },
        };

        trace!(line = %line, "Outbound line");
        output.write_all(line.as_bytes()).await?;
        output.write_all(b"\n").await?;
        output.flush().await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagepilot_protocol::{Command, ProjectId};

    #[tokio::test]
    async fn test_read_commands_parses_lines() {
        let envelope = Envelope::wrap(
            CorrelationId::from("ui-1"),
            &Command::CreateProject {
                name: "Inbox".into(),
            },
        )
        .unwrap();
        let input = format!(
            "{}\n\n{{\"correlationId\":\"ui-2\",\"type\":7}}\nnot json\n",
            serde_json::to_string(&envelope).unwrap()
        );

        let (command_tx, mut command_rx) = mpsc::channel(4);
        let (reply_tx, mut reply_rx) = mpsc::channel(4);
        read_commands(input.as_bytes(), command_tx, reply_tx)
            .await
            .unwrap();

        assert_eq!(command_rx.recv().await.unwrap(), envelope);
        assert!(command_rx.recv().await.is_none());

        let reply = reply_rx.recv().await.unwrap();
        assert_eq!(reply.correlation_id, CorrelationId::from("ui-2"));
        assert_eq!(reply.error_kind(), Some(ErrorKind::ValidationError));
        assert!(reply_rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_write_output_emits_json_lines() {
        let (reply_tx, reply_rx) = mpsc::channel(4);
        let (event_tx, event_rx) = broadcast::channel(4);

        event_tx
            .send(DomainEvent::ProjectArchived {
                project_id: ProjectId::from("p-1"),
            })
            .unwrap();
        reply_tx
            .send(ResultEnvelope::error(
                CorrelationId::from("ui-9"),
                ErrorKind::Busy,
                "chat busy",
            ))
            .await
            .unwrap();
        drop(reply_tx);

        let mut out = Vec::new();
        write_output(&mut out, reply_rx, event_rx).await.unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<Value> = text
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines[0]["correlationId"], "ui-9");
        assert_eq!(lines[0]["status"], "error");
    }
}
