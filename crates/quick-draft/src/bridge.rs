//! RPC Bridge
//!
//! Sends action-based requests over a [`Transport`] and normalizes the
//! response protocol:
//! - the legacy sentinel `1` / `"1"` resolves with no data
//! - `{success, data}` resolves or rejects with `data`
//! - anything else rejects with the raw payload
//!
//! Every call returns a [`PendingRequest`] that can be aborted. The bridge
//! itself keeps no per-call state and is cheap to clone.

use futures::future::{AbortHandle, Abortable, Aborted, LocalBoxFuture};
use futures::FutureExt;
use serde_json::{Map, Value};
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};

use crate::error::{RpcError, TransportError};
use crate::template::is_truthy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Method {
    Get,
    #[default]
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

/// Fully resolved request handed to the transport
#[derive(Debug, Clone, PartialEq)]
pub struct TransportRequest {
    pub method: Method,
    pub url: String,
    pub data: Map<String, Value>,
}

/// The underlying client. Failures are reported as-is to bridge callers.
pub trait Transport {
    fn request(&self, request: TransportRequest) -> LocalBoxFuture<'static, Result<Value, TransportError>>;
}

/// Explicit request options; unset fields fall back to the bridge defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestOptions {
    pub method: Method,
    pub url: Option<String>,
    pub data: Map<String, Value>,
}

impl RequestOptions {
    pub fn new(method: Method) -> Self {
        Self { method, ..Default::default() }
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn data(mut self, data: Map<String, Value>) -> Self {
        self.data = data;
        self
    }
}

/// The two accepted call shapes: a bare action (plus data) or full options.
#[derive(Debug, Clone, PartialEq)]
pub enum RpcCall {
    Action { action: String, data: Map<String, Value> },
    Options(RequestOptions),
}

impl From<&str> for RpcCall {
    fn from(action: &str) -> Self {
        RpcCall::Action { action: action.to_string(), data: Map::new() }
    }
}

impl From<String> for RpcCall {
    fn from(action: String) -> Self {
        RpcCall::Action { action, data: Map::new() }
    }
}

impl<A: Into<String>> From<(A, Map<String, Value>)> for RpcCall {
    fn from((action, data): (A, Map<String, Value>)) -> Self {
        RpcCall::Action { action: action.into(), data }
    }
}

impl From<RequestOptions> for RpcCall {
    fn from(options: RequestOptions) -> Self {
        RpcCall::Options(options)
    }
}

impl RpcCall {
    fn into_request(self, default_url: &str) -> TransportRequest {
        match self {
            RpcCall::Action { action, mut data } => {
                data.insert("action".to_string(), Value::String(action));
                TransportRequest { method: Method::Post, url: default_url.to_string(), data }
            }
            RpcCall::Options(options) => TransportRequest {
                method: options.method,
                url: options.url.unwrap_or_else(|| default_url.to_string()),
                data: options.data,
            },
        }
    }
}

/// Decoded response payload
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseShape {
    /// Legacy `1` / `"1"` success marker
    Sentinel,
    Structured { success: bool, data: Value },
    Unrecognized(Value),
}

impl ResponseShape {
    pub fn decode(payload: Value) -> Self {
        match payload {
            Value::Number(ref n) if n.as_f64() == Some(1.0) => ResponseShape::Sentinel,
            Value::String(ref s) if s == "1" => ResponseShape::Sentinel,
            Value::Object(mut map) if map.contains_key("success") => {
                let success = map.get("success").is_some_and(is_truthy);
                let data = map.remove("data").unwrap_or(Value::Null);
                ResponseShape::Structured { success, data }
            }
            other => ResponseShape::Unrecognized(other),
        }
    }

    pub fn into_result(self) -> Result<Value, RpcError> {
        match self {
            ResponseShape::Sentinel => Ok(Value::Null),
            ResponseShape::Structured { success: true, data } => Ok(data),
            ResponseShape::Structured { success: false, data } => Err(RpcError::Rejected(data)),
            ResponseShape::Unrecognized(payload) => Err(RpcError::Unrecognized(payload)),
        }
    }
}

/// An in-flight bridge call. Resolves once; `abort` turns it into
/// `RpcError::Cancelled` and drops the transport future.
pub struct PendingRequest {
    inner: Abortable<LocalBoxFuture<'static, Result<Value, RpcError>>>,
    handle: AbortHandle,
}

impl PendingRequest {
    /// No-op once the request has settled.
    pub fn abort(&self) {
        self.handle.abort();
    }

    pub fn abort_handle(&self) -> AbortHandle {
        self.handle.clone()
    }
}

impl Future for PendingRequest {
    type Output = Result<Value, RpcError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match self.inner.poll_unpin(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(Aborted)) => Poll::Ready(Err(RpcError::Cancelled)),
            Poll::Pending => Poll::Pending,
        }
    }
}

#[derive(Clone)]
pub struct RpcBridge {
    transport: Rc<dyn Transport>,
    default_url: String,
}

impl RpcBridge {
    pub fn new(transport: Rc<dyn Transport>, default_url: impl Into<String>) -> Self {
        Self { transport, default_url: default_url.into() }
    }

    pub fn send(&self, call: impl Into<RpcCall>) -> PendingRequest {
        let request = call.into().into_request(&self.default_url);
        log::debug!("[bridge] {} {}", request.method.as_str(), request.url);

        let response = self.transport.request(request);
        let (handle, registration) = AbortHandle::new_pair();
        let normalized = async move {
            match response.await {
                Ok(payload) => ResponseShape::decode(payload).into_result(),
                Err(error) => Err(RpcError::Transport(error)),
            }
        }
        .boxed_local();

        PendingRequest { inner: Abortable::new(normalized, registration), handle }
    }

    /// POST `data` plus `action` to the default URL.
    pub fn post(&self, action: &str, data: Map<String, Value>) -> PendingRequest {
        self.send((action, data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MockTransport;
    use futures::executor::block_on;
    use serde_json::json;

    fn bridge() -> (Rc<MockTransport>, RpcBridge) {
        let transport = Rc::new(MockTransport::new());
        let bridge = RpcBridge::new(transport.clone(), "/ajax");
        (transport, bridge)
    }

    #[test]
    fn test_sentinel_resolves_with_no_data() {
        let (transport, bridge) = bridge();
        for sentinel in [json!(1), json!("1"), json!(1.0)] {
            let pending = bridge.send("ping");
            transport.respond(Ok(sentinel));
            assert_eq!(block_on(pending), Ok(Value::Null));
        }
    }

    #[test]
    fn test_structured_success_and_failure() {
        let (transport, bridge) = bridge();

        let pending = bridge.send("load");
        transport.respond(Ok(json!({"success": true, "data": {"id": 4}})));
        assert_eq!(block_on(pending), Ok(json!({"id": 4})));

        let pending = bridge.send("load");
        transport.respond(Ok(json!({"success": false, "data": {"message": "x"}})));
        assert_eq!(block_on(pending), Err(RpcError::Rejected(json!({"message": "x"}))));

        let pending = bridge.send("load");
        transport.respond(Ok(json!({"success": true})));
        assert_eq!(block_on(pending), Ok(Value::Null));
    }

    #[test]
    fn test_unrecognized_shape_rejects_with_raw_payload() {
        let (transport, bridge) = bridge();
        for payload in [json!(0), json!("ok"), json!({"data": 1}), json!([1])] {
            let pending = bridge.send("load");
            transport.respond(Ok(payload.clone()));
            assert_eq!(block_on(pending), Err(RpcError::Unrecognized(payload)));
        }
    }

    #[test]
    fn test_transport_failure_passes_through() {
        let (transport, bridge) = bridge();
        let pending = bridge.send("load");
        transport.respond(Err(TransportError::Timeout));
        assert_eq!(block_on(pending), Err(RpcError::Transport(TransportError::Timeout)));
    }

    #[test]
    fn test_call_shapes() {
        let (transport, bridge) = bridge();
        let mut data = Map::new();
        data.insert("action".into(), json!("overridden"));
        data.insert("visible".into(), json!(1));

        let _ = bridge.post("update-welcome-panel", data);
        let _ = bridge.send(RequestOptions::new(Method::Get).url("/wp-json/wp/v2/posts"));
        let _ = bridge.send(RequestOptions::new(Method::Put));

        let requests = transport.requests();
        assert_eq!(requests[0].method, Method::Post);
        assert_eq!(requests[0].url, "/ajax");
        assert_eq!(requests[0].data.get("action"), Some(&json!("update-welcome-panel")));
        assert_eq!(requests[0].data.get("visible"), Some(&json!(1)));

        assert_eq!(requests[1].method, Method::Get);
        assert_eq!(requests[1].url, "/wp-json/wp/v2/posts");
        assert!(requests[1].data.is_empty());

        assert_eq!(requests[2].url, "/ajax");
    }

    #[test]
    fn test_abort_before_settle_cancels() {
        let (transport, bridge) = bridge();
        let pending = bridge.send("slow");
        pending.abort();
        assert_eq!(block_on(pending), Err(RpcError::Cancelled));
        // A late response has nowhere to go.
        assert!(!transport.respond(Ok(json!(1))));
    }

    #[test]
    fn test_abort_after_settle_is_noop() {
        let (transport, bridge) = bridge();
        let mut pending = bridge.send("fast");
        let handle = pending.abort_handle();
        transport.respond(Ok(json!({"success": true, "data": "done"})));
        let result = block_on(&mut pending);
        handle.abort();
        pending.abort();
        assert_eq!(result, Ok(json!("done")));
    }
}
