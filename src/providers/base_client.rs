use crate::core::error::HubError;
use futures::stream::{self, BoxStream, StreamExt};
use reqwest::{Client, Response};
use serde::Serialize;
use std::collections::HashMap;

/// Turns one line of a streamed body into an optional text chunk.
pub type LineParser = fn(&str) -> Result<Option<String>, HubError>;

#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
    auth_header: Option<(String, String)>,
    extra_headers: HashMap<String, String>,
    query_params: Vec<(String, String)>,
}

impl HttpClient {
    pub fn new(
        base_url: String,
        auth_header: Option<(String, String)>,
        extra_headers: Option<HashMap<String, String>>,
    ) -> Self {
        Self {
            client: Client::new(),
            base_url,
            auth_header,
            extra_headers: extra_headers.unwrap_or_default(),
            query_params: Vec::new(),
        }
    }

    pub fn add_query_param(&mut self, key: &str, value: String) {
        self.query_params.push((key.to_string(), value));
    }

    /// Posts a JSON payload and returns the response if it has a success status.
    pub async fn post<T: Serialize + ?Sized>(
        &self,
        path: &str,
        payload: &T,
    ) -> Result<Response, HubError> {
        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), path);
        tracing::debug!(url = %url, "sending request");

        let mut request = self
            .client
            .post(&url)
            .header("Content-Type", "application/json");

        if let Some((name, value)) = &self.auth_header {
            request = request.header(name, value);
        }
        for (key, value) in &self.extra_headers {
            request = request.header(key, value);
        }
        if !self.query_params.is_empty() {
            request = request.query(&self.query_params);
        }

        let response = request.json(payload).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::debug!(status = %status, "request rejected");
            return Err(HubError::Api(format!("{}: {}", status, body.trim())));
        }

        Ok(response)
    }

    /// Splits a streamed body into lines and feeds each complete line to
    /// `parser`. Lines may straddle network chunks; they are buffered until
    /// their newline arrives.
    pub fn stream_response(
        &self,
        response: Response,
        parser: LineParser,
    ) -> BoxStream<'static, Result<String, HubError>> {
        let mut buffer: Vec<u8> = Vec::new();

        response
            .bytes_stream()
            .map(move |item| match item {
                Err(e) => vec![Err(HubError::from(e))],
                Ok(bytes) => {
                    buffer.extend_from_slice(&bytes);
                    drain_lines(&mut buffer, parser)
                }
            })
            .flat_map(stream::iter)
            .boxed()
    }
}

fn drain_lines(buffer: &mut Vec<u8>, parser: LineParser) -> Vec<Result<String, HubError>> {
    let mut chunks = Vec::new();
    while let Some(pos) = buffer.iter().position(|b| *b == b'\n') {
        let raw: Vec<u8> = buffer.drain(..=pos).collect();
        let line = String::from_utf8_lossy(&raw);
        match parser(line.trim_end()) {
            Ok(Some(text)) => chunks.push(Ok(text)),
            Ok(None) => {}
            Err(e) => chunks.push(Err(e)),
        }
    }
    chunks
}

/// Returns the payload of an SSE `data:` line, if this is one.
pub fn sse_data(line: &str) -> Option<&str> {
    line.strip_prefix("data:").map(str::trim)
}
