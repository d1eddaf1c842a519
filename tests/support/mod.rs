//! Offline test doubles shared by the behavior tests.

#![allow(dead_code)]

use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;

use tickwatch_core::{HttpClient, HttpError, HttpRequest, HttpResponse, Symbol};

type Responder = dyn Fn(&str) -> Result<HttpResponse, HttpError> + Send + Sync;

/// Answers requests from a closure keyed on the URL and records every request it saw.
pub struct ScriptedHttpClient {
    responder: Box<Responder>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedHttpClient {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&str) -> Result<HttpResponse, HttpError> + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(responder),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Every request fails at the transport level.
    pub fn offline() -> Self {
        Self::new(|_| Err(HttpError::timeout("request timeout")))
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests
            .lock()
            .expect("request log should not be poisoned")
            .clone()
    }

    pub fn urls(&self) -> Vec<String> {
        self.requests()
            .into_iter()
            .map(|request| request.url)
            .collect()
    }

    pub fn count_matching(&self, needle: &str) -> usize {
        self.urls().iter().filter(|url| url.contains(needle)).count()
    }
}

impl HttpClient for ScriptedHttpClient {
    fn execute<'a>(
        &'a self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
        let result = {
            let mut requests = self
                .requests
                .lock()
                .expect("request log should not be poisoned");
            let result = (self.responder)(&request.url);
            requests.push(request);
            result
        };
        Box::pin(async move { result })
    }
}

pub fn symbol(raw: &str) -> Symbol {
    Symbol::parse(raw).expect("valid symbol")
}

/// Minimal chart payload whose latest close is `close`.
pub fn chart_body(close: f64) -> String {
    format!(
        r#"{{"chart":{{"result":[{{"meta":{{"regularMarketPrice":null}},"indicators":{{"quote":[{{"close":[{close}]}}]}}}}],"error":null}}}}"#
    )
}
