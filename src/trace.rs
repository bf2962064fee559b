//! Request/response dumps printed to standard output in debug mode.
//!
//! Dumps are best-effort: formatting cannot fail and write errors on stdout
//! are ignored, so tracing never changes the outcome of a call.

use std::fmt::Write as _;
use std::io::Write as _;

use reqwest::header::{HeaderMap, HOST};

use crate::{Response, Result};

pub(crate) fn dump_request(request: &reqwest::Request) {
    print_block("Request", &format_request(request));
}

pub(crate) fn dump_outcome(outcome: &Result<Response>) {
    print_block("Response", &format_outcome(outcome));
}

fn format_outcome(outcome: &Result<Response>) -> String {
    match outcome {
        Ok(response) => format_response(response),
        Err(err) => err.to_string(),
    }
}

fn print_block(title: &str, text: &str) {
    let mut stdout = std::io::stdout().lock();
    let _ = write!(stdout, "[{title}]\n\n{text}\n");
    let _ = stdout.flush();
}

/// Wire-like rendering of an outbound request: request line, headers, body.
pub fn format_request(request: &reqwest::Request) -> String {
    let url = request.url();
    let mut target = url.path().to_owned();
    if let Some(query) = url.query() {
        target.push('?');
        target.push_str(query);
    }

    let mut out = String::new();
    let _ = write!(out, "{} {} HTTP/1.1\r\n", request.method(), target);
    if !request.headers().contains_key(HOST) {
        let host = url.host_str().unwrap_or_default();
        match url.port() {
            Some(port) => {
                let _ = write!(out, "Host: {host}:{port}\r\n");
            }
            None => {
                let _ = write!(out, "Host: {host}\r\n");
            }
        }
    }
    write_headers(&mut out, request.headers());
    out.push_str("\r\n");

    if let Some(body) = request.body() {
        match body.as_bytes() {
            Some(bytes) => out.push_str(&String::from_utf8_lossy(bytes)),
            None => out.push_str("<streaming body>"),
        }
    }
    out
}

/// Wire-like rendering of a response: status line, headers, buffered body.
pub fn format_response(response: &Response) -> String {
    let mut out = String::new();
    let _ = write!(out, "{:?} {}\r\n", response.version(), response.status());
    write_headers(&mut out, response.headers());
    out.push_str("\r\n");
    match response.buffered_body() {
        Some(bytes) => out.push_str(&String::from_utf8_lossy(bytes)),
        None => out.push_str("<unread body>"),
    }
    out
}

fn write_headers(out: &mut String, headers: &HeaderMap) {
    for (name, value) in headers {
        let value = String::from_utf8_lossy(value.as_bytes());
        let _ = write!(out, "{name}: {value}\r\n");
    }
}
