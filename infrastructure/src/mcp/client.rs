//! MCP tool backend over a child process's stdio.
//!
//! One background reader task owns the server's stdout and fulfils pending
//! requests through `oneshot` channels, so concurrent conversation loops can
//! call tools through a single shared [`McpToolBackend`] without contending
//! on the read side.

use super::error::{McpError, Result};
use super::protocol::{
    CallToolResult, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse, MessageKind,
    ToolsListResult, classify_message, initialize_params, reply_to, tools_call_params,
    tools_list_params,
};
use crate::config::BackendLaunch;
use async_trait::async_trait;
use relay_application::{ToolExecutorError, ToolExecutorPort};
use relay_domain::{RawToolOutput, ToolDescriptor};
use serde::Serialize;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::process::Stdio;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, BufWriter};
use tokio::process::{Child, Command};
use tokio::sync::{Mutex, RwLock, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

type PendingMap = Arc<RwLock<HashMap<u64, oneshot::Sender<JsonRpcResponse>>>>;
type SharedWriter = Arc<Mutex<BufWriter<Box<dyn AsyncWrite + Send + Unpin>>>>;

pub struct McpToolBackend {
    reader_handle: JoinHandle<()>,

    /// Request-response correlation (request_id -> oneshot sender)
    pending_responses: PendingMap,

    /// Set by the reader task once the server's stdout is gone
    closed: Arc<AtomicBool>,

    /// Serialized writes; the reader also uses it to answer server requests
    writer: SharedWriter,

    /// Server process, killed on Drop
    child: Option<Child>,

    request_timeout: Duration,
}

impl McpToolBackend {
    /// Launch the server and complete the `initialize` handshake.
    pub async fn spawn(launch: &BackendLaunch) -> Result<Arc<Self>> {
        debug!("Spawning tool server: {} {:?}", launch.program, launch.args);

        let mut cmd = Command::new(&launch.program);
        cmd.args(&launch.args)
            .envs(&launch.env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit());
        if let Some(cwd) = &launch.cwd {
            cmd.current_dir(cwd);
        }

        // Linux: have the kernel SIGTERM the server if we die without Drop running
        #[cfg(target_os = "linux")]
        unsafe {
            cmd.pre_exec(|| {
                libc::prctl(libc::PR_SET_PDEATHSIG, libc::SIGTERM);
                Ok(())
            });
        }

        let mut child = cmd.spawn().map_err(|source| McpError::SpawnError {
            program: launch.program.clone(),
            source,
        })?;

        let stdout = child.stdout.take().ok_or_else(|| {
            McpError::UnexpectedResponse("Failed to capture server stdout".into())
        })?;
        let stdin = child.stdin.take().ok_or_else(|| {
            McpError::UnexpectedResponse("Failed to capture server stdin".into())
        })?;

        let backend = Self::connect(stdout, stdin, Some(child), launch.request_timeout);
        backend.initialize().await?;
        Ok(backend)
    }

    /// Wrap an already-open stream pair. The handshake is not performed.
    pub fn connect<R, W>(
        reader: R,
        writer: W,
        child: Option<Child>,
        request_timeout: Duration,
    ) -> Arc<Self>
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let pending_responses: PendingMap = Arc::new(RwLock::new(HashMap::new()));
        let closed = Arc::new(AtomicBool::new(false));
        let boxed: Box<dyn AsyncWrite + Send + Unpin> = Box::new(writer);
        let writer: SharedWriter = Arc::new(Mutex::new(BufWriter::new(boxed)));

        let pending_bg = Arc::clone(&pending_responses);
        let closed_bg = Arc::clone(&closed);
        let writer_bg = Arc::clone(&writer);
        let reader_handle = tokio::spawn(async move {
            Self::reader_loop(reader, pending_bg, closed_bg, writer_bg).await;
        });

        Arc::new(Self {
            reader_handle,
            pending_responses,
            closed,
            writer,
            child,
            request_timeout,
        })
    }

    /// `initialize` followed by `notifications/initialized`.
    pub async fn initialize(&self) -> Result<Value> {
        let result = self
            .request("initialize", Some(initialize_params()))
            .await?;

        let server = result
            .pointer("/serverInfo/name")
            .and_then(Value::as_str)
            .unwrap_or("unknown");
        let version = result
            .get("protocolVersion")
            .and_then(Value::as_str)
            .unwrap_or("?");
        info!("Tool server '{}' initialized (protocol {})", server, version);

        self.write_frame(&JsonRpcNotification::new("notifications/initialized"))
            .await?;
        Ok(result)
    }

    /// Background reader: single owner of the server's stdout.
    ///
    /// Exits when the stream closes; pending senders are dropped so every
    /// waiting request observes [`McpError::TransportClosed`].
    async fn reader_loop<R>(
        reader: R,
        pending_responses: PendingMap,
        closed: Arc<AtomicBool>,
        writer: SharedWriter,
    ) where
        R: AsyncRead + Unpin,
    {
        let mut lines = BufReader::new(reader).lines();

        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => {
                    debug!("Tool server closed stdout");
                    break;
                }
                Err(e) => {
                    warn!("Reader loop: read error: {}", e);
                    break;
                }
            };
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            trace!("MCP received: {}", trimmed);

            let json_value: Value = match serde_json::from_str(trimmed) {
                Ok(v) => v,
                Err(e) => {
                    // Servers sometimes print banners to stdout
                    debug!("Ignoring non-JSON line from tool server: {} ({})", trimmed, e);
                    continue;
                }
            };

            match classify_message(&json_value) {
                MessageKind::Response => {
                    let Some(id) = json_value.get("id").and_then(Value::as_u64) else {
                        continue;
                    };
                    let response: JsonRpcResponse = match serde_json::from_value(json_value) {
                        Ok(r) => r,
                        Err(e) => {
                            warn!("Failed to parse response id={}: {}", id, e);
                            continue;
                        }
                    };
                    let sender = pending_responses.write().await.remove(&id);
                    match sender {
                        Some(tx) => {
                            let _ = tx.send(response);
                        }
                        None => debug!("No pending request for response id={}", id),
                    }
                }
                MessageKind::IncomingRequest { id } => {
                    let method = json_value
                        .get("method")
                        .and_then(Value::as_str)
                        .unwrap_or_default();
                    debug!("Server request '{}' (id={})", method, id);
                    let reply = reply_to(id, method);
                    if let Err(e) = write_line(&writer, &reply).await {
                        warn!("Failed to answer server request id={}: {}", id, e);
                    }
                }
                MessageKind::Notification => {
                    let method = json_value
                        .get("method")
                        .and_then(Value::as_str)
                        .unwrap_or("?");
                    trace!("Server notification: {}", method);
                }
            }
        }

        closed.store(true, Ordering::SeqCst);
        pending_responses.write().await.clear();
    }

    /// Send a request and wait for its response, bounded by the request timeout.
    pub async fn request(&self, method: &str, params: Option<Value>) -> Result<Value> {
        let request = JsonRpcRequest::new(method, params);
        let request_id = request.id;
        let (tx, rx) = oneshot::channel();

        self.pending_responses.write().await.insert(request_id, tx);

        // Checked after registering so a concurrent reader shutdown cannot strand us
        if self.closed.load(Ordering::SeqCst) {
            self.pending_responses.write().await.remove(&request_id);
            return Err(McpError::TransportClosed);
        }

        if let Err(e) = self.write_frame(&request).await {
            self.pending_responses.write().await.remove(&request_id);
            return Err(e);
        }

        let response = match tokio::time::timeout(self.request_timeout, rx).await {
            Ok(Ok(response)) => response,
            Ok(Err(_)) => return Err(McpError::TransportClosed),
            Err(_) => {
                self.pending_responses.write().await.remove(&request_id);
                return Err(McpError::Timeout {
                    method: method.to_string(),
                    secs: self.request_timeout.as_secs(),
                });
            }
        };

        if let Some(error) = response.error {
            return Err(McpError::RpcError {
                code: error.code,
                message: error.message,
            });
        }
        Ok(response.result.unwrap_or(Value::Null))
    }

    async fn write_frame<T: Serialize>(&self, frame: &T) -> Result<()> {
        write_line(&self.writer, frame).await
    }

    /// Every tool across all `tools/list` pages.
    pub async fn list_all_tools(&self) -> Result<Vec<ToolDescriptor>> {
        let mut tools = Vec::new();
        let mut seen_cursors = HashSet::new();
        let mut cursor: Option<String> = None;

        loop {
            let result = self
                .request("tools/list", tools_list_params(cursor.as_deref()))
                .await?;
            let page: ToolsListResult = serde_json::from_value(result)?;
            debug!("tools/list page: {} tools", page.tools.len());
            tools.extend(page.tools);

            match page.next_cursor {
                Some(next) if !next.is_empty() => {
                    if !seen_cursors.insert(next.clone()) {
                        return Err(McpError::UnexpectedResponse(format!(
                            "tools/list repeated cursor '{}'",
                            next
                        )));
                    }
                    cursor = Some(next);
                }
                _ => break,
            }
        }

        Ok(tools)
    }

    pub async fn call_tool(&self, name: &str, arguments: &Value) -> Result<RawToolOutput> {
        let result = self
            .request("tools/call", Some(tools_call_params(name, arguments)))
            .await?;
        let result: CallToolResult = serde_json::from_value(result)?;
        Ok(result.into())
    }
}

async fn write_line<T: Serialize>(writer: &SharedWriter, frame: &T) -> Result<()> {
    let mut line = serde_json::to_string(frame)?;
    trace!("MCP sending: {}", line);
    line.push('\n');

    let mut writer = writer.lock().await;
    writer.write_all(line.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}

#[async_trait]
impl ToolExecutorPort for McpToolBackend {
    async fn list_tools(&self) -> std::result::Result<Vec<ToolDescriptor>, ToolExecutorError> {
        Ok(self.list_all_tools().await?)
    }

    async fn invoke(
        &self,
        name: &str,
        arguments: &Value,
    ) -> std::result::Result<RawToolOutput, ToolExecutorError> {
        Ok(self.call_tool(name, arguments).await?)
    }
}

impl Drop for McpToolBackend {
    fn drop(&mut self) {
        self.reader_handle.abort();
        if let Some(child) = self.child.as_mut() {
            debug!("McpToolBackend dropping, killing tool server process");
            let _ = child.start_kill();
        }
    }
}

// ==================== Tests ====================
