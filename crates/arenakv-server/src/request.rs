//! Request-line parsing.
//!
//! Only the request line matters: `METHOD /plugin/param HTTP/1.1`. Header
//! lines are ignored, with one framing exception: `Content-Length`, when
//! present, tells the connection reader how many body bytes to expect.

use arenakv_common::{KvError, Result};

/// Request methods the server understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Head,
    Get,
    Put,
    Post,
    Delete,
}

impl Method {
    /// Parses a request-line method token.
    pub fn parse(token: &str) -> Option<Method> {
        match token {
            "HEAD" => Some(Method::Head),
            "GET" => Some(Method::Get),
            "PUT" => Some(Method::Put),
            "POST" => Some(Method::Post),
            "DELETE" => Some(Method::Delete),
            _ => None,
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let token = match self {
            Method::Head => "HEAD",
            Method::Get => "GET",
            Method::Put => "PUT",
            Method::Post => "POST",
            Method::Delete => "DELETE",
        };
        f.write_str(token)
    }
}

/// Parsed request head: routing fields plus body framing.
#[derive(Debug)]
pub struct RequestHead {
    pub method: Method,
    pub plugin: String,
    pub param: String,
    pub content_length: Option<usize>,
}

/// A complete request: head fields plus the body bytes.
#[derive(Debug)]
pub struct Request {
    pub method: Method,
    pub plugin: String,
    pub param: String,
    pub body: Vec<u8>,
}

/// Parses the request head (everything before the first blank line).
///
/// The target path is split on its first `/` into plugin and param; an
/// optional `?...` suffix is stripped from the param.
pub fn parse_head(head: &[u8]) -> Result<RequestHead> {
    let text = std::str::from_utf8(head)
        .map_err(|_| KvError::MalformedRequest("request head is not UTF-8".to_string()))?;

    let mut lines = text.split("\r\n");
    let request_line = lines
        .next()
        .filter(|line| !line.is_empty())
        .ok_or_else(|| KvError::MalformedRequest("missing request line".to_string()))?;

    let mut parts = request_line.split_whitespace();
    let method_token = parts
        .next()
        .ok_or_else(|| KvError::MalformedRequest("missing method".to_string()))?;
    let target = parts
        .next()
        .ok_or_else(|| KvError::MalformedRequest("missing request target".to_string()))?;

    let method = Method::parse(method_token)
        .ok_or_else(|| KvError::UnsupportedMethod(method_token.to_string()))?;

    let path = target.strip_prefix('/').unwrap_or(target);
    let (plugin, param) = match path.split_once('/') {
        Some((plugin, param)) => (plugin, param),
        None => (path, ""),
    };
    let param = param.split('?').next().unwrap_or("");

    let mut content_length = None;
    for line in lines {
        if let Some((name, value)) = line.split_once(':') {
            if name.trim().eq_ignore_ascii_case("content-length") {
                content_length = value.trim().parse::<usize>().ok();
            }
        }
    }

    Ok(RequestHead {
        method,
        plugin: plugin.to_string(),
        param: param.to_string(),
        content_length,
    })
}
