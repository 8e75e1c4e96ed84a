//! Response framing.
//!
//! Responses are `HTTP/1.1 <code> <reason>\r\n\r\n<body>`; the connection
//! is closed right after writing, so no length or connection headers are
//! emitted.

/// A response ready to be written to the socket.
#[derive(Debug)]
pub struct Response {
    pub status: u16,
    pub body: Vec<u8>,
}

impl Response {
    /// 200 with no body.
    pub fn ok() -> Self {
        Self {
            status: 200,
            body: Vec::new(),
        }
    }

    /// 200 with a body.
    pub fn ok_with(body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    /// 404 with no body.
    pub fn not_found() -> Self {
        Self {
            status: 404,
            body: Vec::new(),
        }
    }

    /// 500 with no body.
    pub fn internal_error() -> Self {
        Self {
            status: 500,
            body: Vec::new(),
        }
    }

    /// 500 carrying an error message.
    pub fn internal_error_with(message: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 500,
            body: message.into(),
        }
    }

    /// 501 with no body.
    pub fn not_implemented() -> Self {
        Self {
            status: 501,
            body: Vec::new(),
        }
    }

    fn reason(&self) -> &'static str {
        match self.status {
            200 => "OK",
            404 => "Not Found",
            500 => "Internal Server Error",
            501 => "Not Implemented",
            _ => "Unknown",
        }
    }

    /// Serializes the status line, blank line, and body.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = format!("HTTP/1.1 {} {}\r\n\r\n", self.status, self.reason()).into_bytes();
        bytes.extend_from_slice(&self.body);
        bytes
    }
}
