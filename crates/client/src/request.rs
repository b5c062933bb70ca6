/// One logical request: target service, endpoint, and a body the codec encodes.
#[derive(Clone, Debug)]
pub struct Request<B> {
    service: String,
    endpoint: String,
    body: B,
}

impl<B> Request<B> {
    /// Create a request for `endpoint` on `service`.
    pub fn new(service: impl Into<String>, endpoint: impl Into<String>, body: B) -> Self {
        Self {
            service: service.into(),
            endpoint: endpoint.into(),
            body,
        }
    }

    /// Target service name.
    pub fn service(&self) -> &str {
        &self.service
    }

    /// Target endpoint.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Request body.
    pub const fn body(&self) -> &B {
        &self.body
    }
}
