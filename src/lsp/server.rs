use super::protocol::{
    write_message, RpcContent, RpcMessage, METHOD_NOT_FOUND, SERVER_NOT_INITIALIZED,
};
use crate::config::Settings;
use crate::error::LensError;
use crate::runner::{CommandDispatcher, RunRequest, SessionProvider};
use crate::scanner::{ActionArgs, Annotation, LensRegistry, DEBUG_TEST_COMMAND, RUN_TEST_COMMAND};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;
use url::Url;

/// Text of an open document as last synced by the client.
#[derive(Debug, Clone)]
pub struct OpenDocument {
    pub language_id: String,
    pub version: i64,
    pub text: String,
}

/// Whether the read loop should keep going after a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

pub struct LspServer<W, P> {
    out: W,
    registry: LensRegistry,
    dispatcher: CommandDispatcher<P>,
    documents: HashMap<String, OpenDocument>,
    settings: Settings,
    workspace_root: Option<PathBuf>,
    initialized: bool,
    shutdown_requested: bool,
}

impl<W: Write, P: SessionProvider> LspServer<W, P> {
    pub fn new(out: W, registry: LensRegistry, provider: P) -> Self {
        Self {
            out,
            registry,
            dispatcher: CommandDispatcher::new(provider),
            documents: HashMap::new(),
            settings: Settings::default(),
            workspace_root: None,
            initialized: false,
            shutdown_requested: false,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn workspace_root(&self) -> Option<&PathBuf> {
        self.workspace_root.as_ref()
    }

    pub fn document(&self, uri: &str) -> Option<&OpenDocument> {
        self.documents.get(uri)
    }

    pub fn provider(&self) -> &P {
        self.dispatcher.provider()
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    pub fn shutdown_requested(&self) -> bool {
        self.shutdown_requested
    }

    /// Handle one incoming message, writing any response.
    pub fn handle(&mut self, msg: RpcMessage) -> Result<Flow, LensError> {
        match msg.content {
            RpcContent::Request { id, method, params } => {
                tracing::debug!("request {} ({})", method, id);
                let reply = self.handle_request(id, &method, params);
                write_message(&mut self.out, &reply)?;
                Ok(Flow::Continue)
            }
            RpcContent::Notification { method, params } => {
                tracing::debug!("notification {}", method);
                Ok(self.handle_notification(&method, params))
            }
            RpcContent::Response { id, .. } => {
                tracing::debug!("ignoring client response {}", id);
                Ok(Flow::Continue)
            }
        }
    }

    fn handle_request(&mut self, id: Value, method: &str, params: Option<Value>) -> RpcMessage {
        if !self.initialized && method != "initialize" {
            return RpcMessage::failure(id, SERVER_NOT_INITIALIZED, "server not initialized");
        }

        let result = match method {
            "initialize" => Ok(self.handle_initialize(params.as_ref())),
            "shutdown" => {
                self.shutdown_requested = true;
                Ok(Value::Null)
            }
            "textDocument/codeLens" => self.handle_code_lens(params.as_ref()),
            "workspace/executeCommand" => self.handle_execute_command(params.as_ref()),
            _ => {
                tracing::warn!("unhandled request: {}", method);
                return RpcMessage::failure(
                    id,
                    METHOD_NOT_FOUND,
                    format!("unhandled method: {}", method),
                );
            }
        };

        match result {
            Ok(value) => RpcMessage::success(id, Some(value)),
            Err(e) => {
                tracing::error!("{} failed: {}", method, e);
                RpcMessage::failure(id, e.rpc_code(), e.to_string())
            }
        }
    }

    fn handle_notification(&mut self, method: &str, params: Option<Value>) -> Flow {
        let params = params.unwrap_or(Value::Null);
        match method {
            "initialized" => {}
            "exit" => return Flow::Exit,
            "textDocument/didOpen" => self.handle_did_open(&params),
            "textDocument/didChange" => self.handle_did_change(&params),
            "textDocument/didClose" => {
                if let Some(uri) = params.pointer("/textDocument/uri").and_then(Value::as_str) {
                    self.documents.remove(uri);
                }
            }
            "workspace/didChangeConfiguration" => {
                self.settings = Settings::from_lsp_payload(params.get("settings"));
                tracing::info!("settings updated: {:?}", self.settings);
            }
            _ => tracing::debug!("ignoring notification {}", method),
        }
        Flow::Continue
    }

    fn handle_initialize(&mut self, params: Option<&Value>) -> Value {
        self.workspace_root = params.and_then(workspace_root_from_params);
        self.settings = Settings::from_lsp_payload(params.and_then(|p| p.get("initializationOptions")));
        self.initialized = true;

        tracing::info!(
            "initialized (root: {:?}, languages: {:?})",
            self.workspace_root,
            self.registry.languages()
        );

        json!({
            "capabilities": {
                "textDocumentSync": 1,
                "codeLensProvider": { "resolveProvider": false },
                "executeCommandProvider": {
                    "commands": [RUN_TEST_COMMAND, DEBUG_TEST_COMMAND]
                }
            },
            "serverInfo": {
                "name": env!("CARGO_PKG_NAME"),
                "version": env!("CARGO_PKG_VERSION")
            }
        })
    }

    fn handle_did_open(&mut self, params: &Value) {
        let Some(doc) = params.get("textDocument") else {
            tracing::warn!("didOpen without textDocument");
            return;
        };
        let (Some(uri), Some(text)) = (
            doc.get("uri").and_then(Value::as_str),
            doc.get("text").and_then(Value::as_str),
        ) else {
            tracing::warn!("didOpen without uri or text");
            return;
        };

        self.documents.insert(
            uri.to_string(),
            OpenDocument {
                language_id: doc
                    .get("languageId")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                version: doc.get("version").and_then(Value::as_i64).unwrap_or(0),
                text: text.to_string(),
            },
        );
    }

    fn handle_did_change(&mut self, params: &Value) {
        let Some(uri) = params.pointer("/textDocument/uri").and_then(Value::as_str) else {
            return;
        };
        let Some(doc) = self.documents.get_mut(uri) else {
            tracing::warn!("didChange for unopened document {}", uri);
            return;
        };

        // Full sync: the last change carries the whole text.
        let text = params
            .get("contentChanges")
            .and_then(Value::as_array)
            .and_then(|changes| changes.last())
            .and_then(|change| change.get("text"))
            .and_then(Value::as_str);
        if let Some(text) = text {
            doc.text = text.to_string();
        }
        if let Some(version) = params.pointer("/textDocument/version").and_then(Value::as_i64) {
            doc.version = version;
        }
    }

    fn handle_code_lens(&self, params: Option<&Value>) -> Result<Value, LensError> {
        let uri = params
            .and_then(|p| p.pointer("/textDocument/uri"))
            .and_then(Value::as_str)
            .ok_or_else(|| LensError::InvalidParams("codeLens needs textDocument.uri".to_string()))?;

        let Some(doc) = self.documents.get(uri) else {
            return Ok(Value::Null);
        };

        let lines: Vec<&str> = doc.text.lines().collect();
        let path = uri_to_path(uri);
        let Some(annotations) = self.registry.provide(&doc.language_id, &lines, &path) else {
            return Ok(Value::Null);
        };

        tracing::debug!("{} lenses for {}", annotations.len(), path);
        Ok(Value::Array(annotations.iter().map(code_lens_json).collect()))
    }

    fn handle_execute_command(&mut self, params: Option<&Value>) -> Result<Value, LensError> {
        let params = params
            .ok_or_else(|| LensError::InvalidParams("executeCommand needs params".to_string()))?;
        let command = params
            .get("command")
            .and_then(Value::as_str)
            .ok_or_else(|| LensError::InvalidParams("missing command".to_string()))?;
        let args = params
            .get("arguments")
            .and_then(Value::as_array)
            .and_then(|a| a.first())
            .ok_or_else(|| LensError::InvalidParams(format!("{} needs test arguments", command)))?;
        let args: ActionArgs = serde_json::from_value(args.clone())
            .map_err(|e| LensError::InvalidParams(e.to_string()))?;

        let request =
            RunRequest::from_settings(&args, self.workspace_root.as_deref(), &self.settings);

        match command {
            RUN_TEST_COMMAND => {
                tracing::info!("running {:?} in {}", request.test_name, request.test_file);
                self.dispatcher.dispatch(&request)?;
                Ok(Value::Null)
            }
            DEBUG_TEST_COMMAND => {
                tracing::info!("debug config for {:?} in {}", request.test_name, request.test_file);
                Ok(serde_json::to_value(request.launch_config())?)
            }
            other => Err(LensError::UnknownCommand(other.to_string())),
        }
    }
}

fn code_lens_json(annotation: &Annotation) -> Value {
    json!({
        "range": annotation.range,
        "command": {
            "title": annotation.label,
            "command": annotation.action.command_id(),
            "arguments": [annotation.args]
        }
    })
}

/// Filesystem path for `file://` URIs; anything else is used verbatim.
pub fn uri_to_path(uri: &str) -> String {
    Url::parse(uri)
        .ok()
        .filter(|url| url.scheme() == "file")
        .and_then(|url| url.to_file_path().ok())
        .map(|path| path.to_string_lossy().into_owned())
        .unwrap_or_else(|| uri.to_string())
}

fn workspace_root_from_params(params: &Value) -> Option<PathBuf> {
    let from_uri = |uri: &str| Url::parse(uri).ok().and_then(|u| u.to_file_path().ok());

    params
        .pointer("/workspaceFolders/0/uri")
        .and_then(Value::as_str)
        .and_then(from_uri)
        .or_else(|| params.get("rootUri").and_then(Value::as_str).and_then(from_uri))
        .or_else(|| {
            params
                .get("rootPath")
                .and_then(Value::as_str)
                .map(PathBuf::from)
        })
}
