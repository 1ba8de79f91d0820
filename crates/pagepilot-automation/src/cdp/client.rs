//! DevTools WebSocket client.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio::sync::oneshot;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, trace, warn};

use super::error::CdpError;
use super::protocol::{BrowserVersion, CdpRequest, CdpResponse, PageInfo};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;
type WsSource = SplitStream<WsStream>;
type Pending = Arc<Mutex<HashMap<u64, oneshot::Sender<Result<Value, CdpError>>>>>;

/// Bound on a single command round trip.
const CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Browser-level DevTools connection.
///
/// Replies are matched to requests by id; events are not consumed.
pub struct CdpClient {
    http_endpoint: String,
    ws_tx: tokio::sync::Mutex<WsSink>,
    request_id: AtomicU64,
    pending: Pending,
    recv_task: tokio::task::JoinHandle<()>,
}

impl CdpClient {
    /// Connect to Chrome at `endpoint` (e.g. `http://localhost:9222`).
    pub async fn connect(endpoint: &str) -> Result<Self, CdpError> {
        let http_endpoint = endpoint.trim_end_matches('/').to_string();
        url::Url::parse(&http_endpoint)?;

        let version_url = format!("{}/json/version", http_endpoint);
        debug!("Fetching browser version from {}", version_url);

        let version: BrowserVersion = reqwest::get(&version_url)
            .await
            .map_err(|e| CdpError::ChromeNotAvailable(format!("{}: {}", endpoint, e)))?
            .json()
            .await
            .map_err(|e| CdpError::ChromeNotAvailable(format!("{}: {}", endpoint, e)))?;

        debug!("Connected to browser: {}", version.browser);

        let (ws_stream, _) = tokio_tungstenite::connect_async(&version.web_socket_debugger_url)
            .await
            .map_err(|e| CdpError::ConnectionFailed(format!("WebSocket: {}", e)))?;

        let (ws_sink, ws_source) = ws_stream.split();
        let pending: Pending = Arc::new(Mutex::new(HashMap::new()));
        let recv_task = tokio::spawn(Self::receive_loop(ws_source, pending.clone()));

        Ok(Self {
            http_endpoint,
            ws_tx: tokio::sync::Mutex::new(ws_sink),
            request_id: AtomicU64::new(1),
            pending,
            recv_task,
        })
    }

    async fn receive_loop(mut ws_source: WsSource, pending: Pending) {
        while let Some(msg) = ws_source.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    trace!("CDP recv: {}", text);
                    let resp = match serde_json::from_str::<CdpResponse>(&text) {
                        Ok(resp) => resp,
                        Err(e) => {
                            warn!("Failed to parse CDP message: {}", e);
                            continue;
                        }
                    };
                    let Some(id) = resp.id else {
                        continue;
                    };
                    let waiter = pending.lock().remove(&id);
                    if let Some(tx) = waiter {
                        let result = match resp.error {
                            Some(error) => Err(CdpError::Protocol {
                                code: error.code,
                                message: error.message,
                            }),
                            None => Ok(resp.result.unwrap_or(Value::Null)),
                        };
                        let _ = tx.send(result);
                    }
                }
                Ok(Message::Close(_)) => {
                    debug!("WebSocket closed");
                    break;
                }
                Err(e) => {
                    error!("WebSocket error: {}", e);
                    break;
                }
                _ => {}
            }
        }
        // Dropping the senders fails every outstanding call with SessionClosed.
        pending.lock().clear();
    }

    /// Send a command and wait for its reply.
    pub async fn call(
        &self,
        method: &str,
        params: Option<Value>,
        session_id: Option<&str>,
    ) -> Result<Value, CdpError> {
        let id = self.request_id.fetch_add(1, Ordering::SeqCst);
        let request = CdpRequest {
            id,
            method: method.to_string(),
            params,
            session_id: session_id.map(str::to_string),
        };
        let json = serde_json::to_string(&request)?;
        trace!("CDP send: {}", json);

        let (tx, rx) = oneshot::channel();
        self.pending.lock().insert(id, tx);

        {
            let mut ws = self.ws_tx.lock().await;
            if let Err(e) = ws.send(Message::Text(json.into())).await {
                self.pending.lock().remove(&id);
                return Err(e.into());
            }
        }

        match tokio::time::timeout(CALL_TIMEOUT, rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(CdpError::SessionClosed),
            Err(_) => {
                self.pending.lock().remove(&id);
                Err(CdpError::Timeout(format!("Request {} timed out", method)))
            }
        }
    }

    /// Open tabs.
    pub async fn list_pages(&self) -> Result<Vec<PageInfo>, CdpError> {
        let url = format!("{}/json/list", self.http_endpoint);
        let pages: Vec<PageInfo> = reqwest::get(&url).await?.json().await?;
        Ok(pages.into_iter().filter(PageInfo::is_page).collect())
    }

    /// First open tab whose URL starts with `target_url`.
    pub async fn find_page(&self, target_url: &str) -> Result<PageInfo, CdpError> {
        let prefix = target_url.trim_end_matches('/');
        self.list_pages()
            .await?
            .into_iter()
            .find(|p| p.url.starts_with(prefix))
            .ok_or_else(|| CdpError::PageNotFound(target_url.to_string()))
    }

    /// Attach to a tab and return the flattened session id.
    pub async fn attach(&self, target_id: &str) -> Result<String, CdpError> {
        let result = self
            .call(
                "Target.attachToTarget",
                Some(json!({
                    "targetId": target_id,
                    "flatten": true
                })),
                None,
            )
            .await?;

        let session_id = result["sessionId"]
            .as_str()
            .ok_or_else(|| CdpError::InvalidResponse("Missing sessionId".to_string()))?
            .to_string();

        self.call("Runtime.enable", None, Some(&session_id)).await?;
        debug!("Attached to target {} (session {})", target_id, session_id);
        Ok(session_id)
    }
}

impl Drop for CdpClient {
    fn drop(&mut self) {
        self.recv_task.abort();
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
