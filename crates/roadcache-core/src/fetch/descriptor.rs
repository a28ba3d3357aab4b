use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestMethod {
    Get,
    Head,
    Post,
    Put,
    Delete,
    Patch,
}

impl RequestMethod {
    pub fn is_get(self) -> bool {
        self == RequestMethod::Get
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RequestMethod::Get => "GET",
            RequestMethod::Head => "HEAD",
            RequestMethod::Post => "POST",
            RequestMethod::Put => "PUT",
            RequestMethod::Delete => "DELETE",
            RequestMethod::Patch => "PATCH",
        }
    }
}

impl std::fmt::Display for RequestMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One outgoing request as seen by the interceptor: method, origin-relative
/// path and the declared accept type. The body is only carried for
/// pass-through methods.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestDescriptor {
    pub method: RequestMethod,
    pub path: String,
    #[serde(default)]
    pub accept: Option<String>,
    #[serde(default)]
    pub body: Option<Vec<u8>>,
}

impl RequestDescriptor {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: RequestMethod::Get,
            path: path.into(),
            accept: None,
            body: None,
        }
    }

    pub fn post(path: impl Into<String>, body: Vec<u8>) -> Self {
        Self {
            method: RequestMethod::Post,
            path: path.into(),
            accept: None,
            body: Some(body),
        }
    }

    pub fn with_accept(mut self, accept: impl Into<String>) -> Self {
        self.accept = Some(accept.into());
        self
    }

    /// Whether the client asked for an HTML document. A missing accept
    /// header counts as non-HTML.
    pub fn wants_html(&self) -> bool {
        self.accept
            .as_deref()
            .map(|a| a.contains("text/html"))
            .unwrap_or(false)
    }

    /// Whether the path falls under the API namespace.
    pub fn is_api(&self) -> bool {
        self.path.starts_with(super::interceptor::API_PREFIX)
    }
}
