//! Fetch Transport
//!
//! `Transport` over `window.fetch`, sending form-encoded bodies the way the
//! admin AJAX and REST endpoints expect.

use futures::future::{FutureExt, LocalBoxFuture};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use quick_draft::{Method, Transport, TransportError, TransportRequest};
use serde_json::{Map, Value};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{AbortController, Headers, Request, RequestInit, Response};

/// Characters left as-is in form values, matching `encodeURIComponent`
const FORM_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded; charset=UTF-8";

#[derive(Debug, Default, Clone, Copy)]
pub struct FetchTransport;

impl Transport for FetchTransport {
    fn request(&self, request: TransportRequest) -> LocalBoxFuture<'static, Result<Value, TransportError>> {
        fetch(request).boxed_local()
    }
}

/// Aborts the in-flight fetch if the future is dropped before it settles.
struct AbortOnDrop(Option<AbortController>);

impl AbortOnDrop {
    fn disarm(mut self) {
        self.0 = None;
    }
}

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        if let Some(controller) = self.0.take() {
            controller.abort();
        }
    }
}

async fn fetch(request: TransportRequest) -> Result<Value, TransportError> {
    let window = web_sys::window().ok_or_else(|| TransportError::Network("no window".into()))?;
    let controller = AbortController::new().map_err(js_error)?;

    let init = RequestInit::new();
    init.set_method(request.method.as_str());
    init.set_signal(Some(&controller.signal()));

    let body = encode_form(&request.data);
    let url = match request.method {
        Method::Get => append_query(&request.url, &body),
        _ => {
            let headers = Headers::new().map_err(js_error)?;
            headers.set("Content-Type", FORM_CONTENT_TYPE).map_err(js_error)?;
            init.set_headers(&headers);
            init.set_body(&JsValue::from_str(&body));
            request.url
        }
    };

    let js_request = Request::new_with_str_and_init(&url, &init).map_err(js_error)?;
    let guard = AbortOnDrop(Some(controller));

    let response: Response = JsFuture::from(window.fetch_with_request(&js_request))
        .await
        .map_err(js_error)?
        .dyn_into()
        .map_err(js_error)?;
    let text = JsFuture::from(response.text().map_err(js_error)?)
        .await
        .map_err(js_error)?
        .as_string()
        .unwrap_or_default();
    guard.disarm();

    log::debug!("[fetch] {} {} -> {}", request.method.as_str(), url, response.status());
    if !response.ok() {
        return Err(TransportError::Status { status: response.status(), response_text: text });
    }
    Ok(parse_body(text))
}

/// JSON bodies are decoded; anything else is handed back as a string.
fn parse_body(text: String) -> Value {
    serde_json::from_str(&text).unwrap_or(Value::String(text))
}

fn js_error(value: JsValue) -> TransportError {
    match value.dyn_ref::<js_sys::Error>() {
        Some(error) if String::from(error.name()) == "AbortError" => TransportError::Aborted,
        Some(error) => TransportError::Network(error.message().into()),
        None => TransportError::Network(format!("{:?}", value)),
    }
}

fn append_query(url: &str, query: &str) -> String {
    if query.is_empty() {
        return url.to_string();
    }
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{}{}{}", url, separator, query)
}

/// Flatten `data` into `key=value&...`. Nested values are sent as JSON.
pub(crate) fn encode_form(data: &Map<String, Value>) -> String {
    data.iter()
        .map(|(key, value)| {
            let value = match value {
                Value::Null => String::new(),
                Value::String(text) => text.clone(),
                other => other.to_string(),
            };
            format!("{}={}", utf8_percent_encode(key, FORM_VALUE), utf8_percent_encode(&value, FORM_VALUE))
        })
        .collect::<Vec<_>>()
        .join("&")
}
