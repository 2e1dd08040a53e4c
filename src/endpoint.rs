// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2026 nervosys

//! Question-answering endpoint client
//!
//! The endpoint under test is an opaque HTTP service: the harness POSTs
//! `{"question": "..."}` and reads back `{"answer": "..."}` on success. Any
//! other status is a failure whose body is not inspected.

use crate::Result;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Answer prefix used for every failure recorded in place of an answer
pub const ERROR_PREFIX: &str = "Error: ";

/// Request body sent to the endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskRequest<'a> {
    pub question: &'a str,
}

/// Successful response body; extra fields are ignored
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AskResponse {
    #[serde(default)]
    pub answer: Option<String>,
}

/// Raw reply from the endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointReply {
    /// HTTP status code
    pub status: u16,
    /// Response body text
    pub body: String,
}

/// Something that answers questions over a round trip
pub trait AskEndpoint {
    /// Send one question and wait for the full reply
    ///
    /// An `Err` means the round trip itself failed (connection refused, DNS,
    /// timeout). Non-success statuses are returned as `Ok`.
    fn ask(&self, question: &str) -> Result<EndpointReply>;

    /// Where the questions go, for reporting
    fn url(&self) -> &str;
}

/// Blocking HTTP implementation backed by `reqwest`
pub struct HttpEndpoint {
    client: Client,
    url: String,
}

impl HttpEndpoint {
    /// Build a client for `url`
    ///
    /// `timeout` of `None` waits indefinitely for a reply.
    pub fn new(url: impl Into<String>, timeout: Option<Duration>) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, url))
    }

    /// Use a preconfigured client (proxies, TLS, headers)
    pub fn with_client(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

impl AskEndpoint for HttpEndpoint {
    fn ask(&self, question: &str) -> Result<EndpointReply> {
        let response = self
            .client
            .post(&self.url)
            .json(&AskRequest { question })
            .send()?;
        let status = response.status().as_u16();
        let body = response.text()?;
        Ok(EndpointReply { status, body })
    }

    fn url(&self) -> &str {
        &self.url
    }
}

/// Turn a reply into the text stored in the answer column
///
/// - 200 with a JSON body: the `answer` field, or `""` if absent
/// - 200 with a body that is not JSON: an error marker
/// - anything else: `"Error: <status>"`
pub fn answer_from_reply(reply: &EndpointReply) -> String {
    if reply.status != 200 {
        return format!("{}{}", ERROR_PREFIX, reply.status);
    }

    match serde_json::from_str::<AskResponse>(&reply.body) {
        Ok(parsed) => parsed.answer.unwrap_or_default(),
        Err(e) => {
            log::warn!("Endpoint returned 200 with an invalid body: {}", e);
            format!("{}invalid response body", ERROR_PREFIX)
        }
    }
}

/// Answer text recorded when the round trip itself failed
pub fn answer_from_transport_error(err: &crate::BenchError) -> String {
    format!("{}request failed: {}", ERROR_PREFIX, err)
}

/// Whether an answer column value is an error marker
pub fn is_error_answer(answer: &str) -> bool {
    answer.starts_with(ERROR_PREFIX)
}


#[cfg(test)]
mod tests {
    use super::*;

    fn reply(status: u16, body: &str) -> EndpointReply {
        EndpointReply {
            status,
            body: body.to_string(),
        }
    }

    #[test]
    fn test_answer_from_success() {
        let r = reply(200, r#"{"question":"Q1","answer":"X","inference_time":1.5}"#);
        assert_eq!(answer_from_reply(&r), "X");
    }

    #[test]
    fn test_answer_missing_field_is_empty() {
        assert_eq!(answer_from_reply(&reply(200, r#"{"result":"X"}"#)), "");
        assert_eq!(answer_from_reply(&reply(200, r#"{"answer":null}"#)), "");
    }

    #[test]
    fn test_answer_from_error_status() {
        let answer = answer_from_reply(&reply(404, r#"{"detail":"Not Found 500"}"#));
        assert_eq!(answer, "Error: 404");
        assert!(!answer.contains("500"));

        assert_eq!(answer_from_reply(&reply(500, "")), "Error: 500");
        assert!(is_error_answer(&answer_from_reply(&reply(503, ""))));
    }

    #[test]
    fn test_answer_from_invalid_body() {
        let answer = answer_from_reply(&reply(200, "<html>oops</html>"));
        assert!(is_error_answer(&answer));
    }

    #[test]
    fn test_client_builds_without_timeout() {
        let endpoint = HttpEndpoint::new("http://127.0.0.1:8000/ask", None).unwrap();
        assert_eq!(endpoint.url(), "http://127.0.0.1:8000/ask");
    }

    #[test]
    fn test_request_body_shape() {
        let json = serde_json::to_value(AskRequest { question: "What?" }).unwrap();
        assert_eq!(json, serde_json::json!({ "question": "What?" }));
    }

    #[test]
    fn test_http_endpoint_round_trip() {
        let (url, requests) = stub::serve(vec![
            (200, r#"{"answer":"A1"}"#.to_string()),
            (404, r#"{"detail":"Not Found"}"#.to_string()),
        ]);
        let endpoint = stub::local_endpoint(&url);
        assert_eq!(endpoint.url(), url);

        let first = endpoint.ask("Q1").unwrap();
        assert_eq!(first.status, 200);
        assert_eq!(answer_from_reply(&first), "A1");

        let sent: serde_json::Value = serde_json::from_str(&requests.recv().unwrap()).unwrap();
        assert_eq!(sent["question"], "Q1");

        let second = endpoint.ask("Q2").unwrap();
        assert_eq!(second.status, 404);
        assert_eq!(answer_from_reply(&second), "Error: 404");
    }

    #[test]
    fn test_connection_refused_is_err() {
        // Bind then drop to get a port nobody listens on
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let endpoint = stub::local_endpoint(&format!("http://127.0.0.1:{}/ask", port));
        let err = endpoint.ask("Q1").unwrap_err();
        assert!(answer_from_transport_error(&err).starts_with("Error: request failed"));
    }
}
