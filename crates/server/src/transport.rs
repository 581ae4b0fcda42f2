//! TCP message transport.
//!
//! Each frame is `<length>#<json>` with the length counted in UTF-16 code
//! units, as JavaScript peers count it. A request packet looks like
//! `{"pattern": {"cmd": "get_all"}, "data": ..., "id": "..."}`; packets without
//! an `id` are events and get no reply. The pattern may also arrive as its
//! JSON-encoded string form.

use std::future::Future;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::dispatcher::{DispatchError, Dispatcher};

/// Upper bound for a single frame body.
pub const MAX_FRAME_LEN: usize = 4 * 1024 * 1024;
const DELIMITER: u8 = b'#';

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed frame: {0}")]
    Frame(String),
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("remote error {status_code}: {message}")]
    Remote { status_code: u16, message: String },
    #[error("connection closed")]
    Closed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestPacket {
    pub pattern: Value,
    #[serde(default)]
    pub data: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl RequestPacket {
    /// Command name from `{"cmd": ..}`, its string-encoded form, or a bare string.
    pub fn cmd(&self) -> Option<String> {
        match &self.pattern {
            Value::Object(map) => map.get("cmd").and_then(Value::as_str).map(str::to_string),
            Value::String(s) => match serde_json::from_str::<Value>(s) {
                Ok(Value::Object(map)) => map.get("cmd").and_then(Value::as_str).map(str::to_string),
                _ => Some(s.clone()),
            },
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub status: String,
    pub status_code: u16,
    pub message: String,
}

impl From<&DispatchError> for ErrorBody {
    fn from(e: &DispatchError) -> Self {
        Self { status: "error".into(), status_code: e.status_code().as_u16(), message: e.to_string() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponsePacket {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub err: Option<ErrorBody>,
    #[serde(default)]
    pub is_disposed: bool,
}

impl ResponsePacket {
    pub fn from_result(id: String, result: &Result<Value, DispatchError>) -> Self {
        match result {
            Ok(v) => Self { id, response: Some(v.clone()), err: None, is_disposed: true },
            Err(e) => Self { id, response: None, err: Some(e.into()), is_disposed: true },
        }
    }
}

/// Length of `s` as counted by the peer: UTF-16 code units, not bytes.
pub fn frame_len(s: &str) -> usize {
    s.encode_utf16().count()
}

/// UTF-8 sequence width and UTF-16 unit cost for a leading byte.
fn utf8_lead(b: u8) -> Option<(usize, usize)> {
    match b {
        0x00..=0x7F => Some((1, 1)),
        0xC0..=0xDF => Some((2, 1)),
        0xE0..=0xEF => Some((3, 1)),
        0xF0..=0xF7 => Some((4, 2)),
        _ => None,
    }
}

/// Read one frame. `Ok(None)` on a clean EOF between frames.
///
/// The prefix counts UTF-16 code units, so the body is consumed character by
/// character until that many units have been read.
pub async fn read_frame<R: AsyncBufRead + Unpin>(reader: &mut R) -> Result<Option<Vec<u8>>, TransportError> {
    let mut header = Vec::with_capacity(16);
    let n = reader.read_until(DELIMITER, &mut header).await?;
    if n == 0 {
        return Ok(None);
    }
    if header.pop() != Some(DELIMITER) {
        return Err(TransportError::Frame("eof inside length prefix".into()));
    }
    let len: usize = std::str::from_utf8(&header)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .ok_or_else(|| TransportError::Frame(format!("bad length prefix {:?}", String::from_utf8_lossy(&header))))?;
    if len > MAX_FRAME_LEN {
        return Err(TransportError::Frame(format!("frame of {} units exceeds limit", len)));
    }

    let mut body = Vec::with_capacity(len);
    let mut units = 0usize;
    // continuation bytes still owed by the current character
    let mut pending = 0usize;
    while units < len || pending > 0 {
        let buf = reader.fill_buf().await?;
        if buf.is_empty() {
            return Err(TransportError::Frame("eof inside frame body".into()));
        }
        let mut used = 0;
        for &b in buf {
            if units >= len && pending == 0 {
                break;
            }
            if pending > 0 {
                if b & 0xC0 != 0x80 {
                    return Err(TransportError::Frame("invalid utf-8 in frame body".into()));
                }
                pending -= 1;
            } else {
                let (width, cost) = utf8_lead(b).ok_or_else(|| TransportError::Frame("invalid utf-8 in frame body".into()))?;
                units += cost;
                pending = width - 1;
            }
            used += 1;
        }
        body.extend_from_slice(&buf[..used]);
        reader.consume(used);
    }
    if units != len {
        return Err(TransportError::Frame("length prefix splits a surrogate pair".into()));
    }
    if std::str::from_utf8(&body).is_err() {
        return Err(TransportError::Frame("invalid utf-8 in frame body".into()));
    }
    Ok(Some(body))
}

pub async fn write_frame<W: AsyncWrite + Unpin, T: Serialize>(writer: &mut W, value: &T) -> Result<(), TransportError> {
    let body = serde_json::to_string(value)?;
    let frame = format!("{}#{}", frame_len(&body), body);
    writer.write_all(frame.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}

/// Accept connections until the listener fails; one task per connection.
pub async fn serve(listener: TcpListener, dispatcher: Arc<Dispatcher>) -> Result<(), TransportError> {
    serve_with_shutdown(listener, dispatcher, std::future::pending()).await
}

/// Like [`serve`], but stops accepting once `shutdown` resolves.
/// Connections already open keep running on their own tasks.
pub async fn serve_with_shutdown<F>(listener: TcpListener, dispatcher: Arc<Dispatcher>, shutdown: F) -> Result<(), TransportError>
where
    F: Future<Output = ()> + Send,
{
    if let Ok(addr) = listener.local_addr() {
        info!(service = "transport", event = "listening", %addr, "message transport ready");
    }
    tokio::pin!(shutdown);
    loop {
        let (stream, peer) = tokio::select! {
            _ = &mut shutdown => {
                info!(service = "transport", event = "stop", "message transport stopped accepting");
                return Ok(());
            }
            accepted = listener.accept() => accepted?,
        };
        let dispatcher = Arc::clone(&dispatcher);
        tokio::spawn(async move {
            debug!(%peer, "transport connection opened");
            if let Err(e) = handle_connection(stream, dispatcher).await {
                warn!(%peer, error = %e, "transport connection closed with error");
            }
        });
    }
}

async fn handle_connection(stream: TcpStream, dispatcher: Arc<Dispatcher>) -> Result<(), TransportError> {
    let (rd, mut wr) = stream.into_split();
    let mut rd = BufReader::new(rd);

    while let Some(body) = read_frame(&mut rd).await? {
        let packet: RequestPacket = match serde_json::from_slice(&body) {
            Ok(p) => p,
            Err(e) => {
                // framing is intact, skip the packet
                warn!(error = %e, "dropping undecodable packet");
                continue;
            }
        };
        let cmd = packet.cmd().unwrap_or_default();
        let result = dispatcher.dispatch(&cmd, packet.data).await;

        match packet.id {
            Some(id) => write_frame(&mut wr, &ResponsePacket::from_result(id, &result)).await?,
            None => {
                if let Err(e) = result {
                    warn!(cmd = %cmd, error = %e, "event handler failed");
                }
            }
        }
    }
    Ok(())
}

/// Request/response client for the transport.
pub struct TransportClient {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl TransportClient {
    pub async fn connect<A: ToSocketAddrs>(addr: A) -> Result<Self, TransportError> {
        let stream = TcpStream::connect(addr).await?;
        let (rd, writer) = stream.into_split();
        Ok(Self { reader: BufReader::new(rd), writer })
    }

    /// Send `cmd` and wait for the matching reply; an `err` reply becomes `TransportError::Remote`.
    pub async fn send(&mut self, cmd: &str, data: Value) -> Result<Value, TransportError> {
        let id = Uuid::new_v4().to_string();
        let packet = RequestPacket { pattern: serde_json::json!({ "cmd": cmd }), data, id: Some(id.clone()) };
        write_frame(&mut self.writer, &packet).await?;

        loop {
            let body = read_frame(&mut self.reader).await?.ok_or(TransportError::Closed)?;
            let reply: ResponsePacket = serde_json::from_slice(&body)?;
            if reply.id != id {
                continue;
            }
            return match (reply.err, reply.response) {
                (Some(err), _) => Err(TransportError::Remote { status_code: err.status_code, message: err.message }),
                (None, response) => Ok(response.unwrap_or(Value::Null)),
            };
        }
    }

    /// Fire-and-forget event.
    pub async fn emit(&mut self, cmd: &str, data: Value) -> Result<(), TransportError> {
        let packet = RequestPacket { pattern: serde_json::json!({ "cmd": cmd }), data, id: None };
        write_frame(&mut self.writer, &packet).await
    }
}
