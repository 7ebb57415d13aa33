use crate::error::LensError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::{BufRead, Read, Write};

pub const METHOD_NOT_FOUND: i64 = -32601;
pub const SERVER_NOT_INITIALIZED: i64 = -32002;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcMessage {
    pub jsonrpc: String,
    #[serde(flatten)]
    pub content: RpcContent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RpcContent {
    Request {
        id: Value,
        method: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        params: Option<Value>,
    },
    Notification {
        method: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        params: Option<Value>,
    },
    Response {
        id: Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        result: Option<Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<RpcError>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

impl RpcMessage {
    fn new(content: RpcContent) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            content,
        }
    }

    pub fn request(id: Value, method: &str, params: Option<Value>) -> Self {
        Self::new(RpcContent::Request {
            id,
            method: method.to_string(),
            params,
        })
    }

    pub fn notification(method: &str, params: Option<Value>) -> Self {
        Self::new(RpcContent::Notification {
            method: method.to_string(),
            params,
        })
    }

    /// Successful response; a `None` result is sent as `null`.
    pub fn success(id: Value, result: Option<Value>) -> Self {
        Self::new(RpcContent::Response {
            id,
            result: Some(result.unwrap_or(Value::Null)),
            error: None,
        })
    }

    pub fn failure(id: Value, code: i64, message: impl Into<String>) -> Self {
        Self::new(RpcContent::Response {
            id,
            result: None,
            error: Some(RpcError {
                code,
                message: message.into(),
            }),
        })
    }
}

/// Read one `Content-Length` framed message. `Ok(None)` means the stream ended.
pub fn read_message<R: BufRead>(reader: &mut R) -> Result<Option<RpcMessage>, LensError> {
    let mut content_length: Option<usize> = None;
    let mut saw_header = false;

    loop {
        let mut line = String::new();
        if reader.read_line(&mut line)? == 0 {
            if saw_header {
                return Err(LensError::Protocol("stream ended inside headers".to_string()));
            }
            return Ok(None);
        }

        let line = line.trim_end_matches(['\r', '\n']);
        if line.is_empty() {
            if saw_header {
                break;
            }
            continue;
        }
        saw_header = true;

        if let Some((name, value)) = line.split_once(':') {
            if name.trim().eq_ignore_ascii_case("Content-Length") {
                let length = value.trim().parse().map_err(|_| {
                    LensError::Protocol(format!("bad Content-Length: {}", value.trim()))
                })?;
                content_length = Some(length);
            }
        }
    }

    let length = content_length
        .ok_or_else(|| LensError::Protocol("missing Content-Length header".to_string()))?;
    let mut buffer = vec![0u8; length];
    reader.read_exact(&mut buffer)?;
    Ok(Some(serde_json::from_slice(&buffer)?))
}

/// Write one message with its `Content-Length` header and flush.
pub fn write_message<W: Write>(writer: &mut W, msg: &RpcMessage) -> Result<(), LensError> {
    let json = serde_json::to_string(msg)?;
    write!(writer, "Content-Length: {}\r\n\r\n{}", json.len(), json)?;
    writer.flush()?;
    tracing::trace!("sent {} bytes", json.len());
    Ok(())
}
