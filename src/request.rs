/// The parts of an inbound request the gate needs to reach a verdict.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct RequestContext {
    path: String,
    remote_addr: Option<String>,
}

impl RequestContext {
    /// Builds a request context from the request URI and the peer address.
    ///
    /// `path` should include the query string, since bypass tokens may live there.
    pub fn new(path: impl Into<String>, remote_addr: Option<&str>) -> Self {
        Self {
            path: path.into(),
            remote_addr: remote_addr.map(ToOwned::to_owned),
        }
    }

    /// Request URI, query string included.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Remote address of the request, if known and not empty.
    #[must_use]
    pub fn remote_addr(&self) -> Option<&str> {
        self.remote_addr.as_deref().filter(|addr| !addr.is_empty())
    }
}

/// HTTP status used to terminate a denied request.
pub const DENIAL_STATUS: u16 = 403;

/// Message shown to the client of a denied request.
pub const DENIAL_MESSAGE: &str = "Sorry, you are not allowed to access this page.";

/// How a denied request must be terminated.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Denial {
    pub status: u16,
    pub message: &'static str,
}

impl Default for Denial {
    fn default() -> Self {
        Self {
            status: DENIAL_STATUS,
            message: DENIAL_MESSAGE,
        }
    }
}

/// Terminates a request the gate denied.
///
/// Implemented for any `Fn(&RequestContext, &Denial)`, so a closure writing the
/// response is enough in most servers.
pub trait DenyAction {
    fn deny(&self, request: &RequestContext, denial: &Denial);
}

impl<F> DenyAction for F
where
    F: Fn(&RequestContext, &Denial),
{
    fn deny(&self, request: &RequestContext, denial: &Denial) {
        self(request, denial);
    }
}
