use crate::protocol::{MessageKind, RequestId};

/// Per-call information the dispatcher attaches before invoking a handler.
///
/// Carries the method name, the kind of message being handled and, for
/// method calls and inbound responses, the request id. Values are fixed at
/// construction; handlers read them through the accessors.
#[derive(Debug, Clone)]
pub struct CallContext {
    method: String,
    kind: MessageKind,
    request_id: Option<RequestId>,
}

impl CallContext {
    pub fn new(
        method: impl Into<String>,
        kind: MessageKind,
        request_id: Option<RequestId>,
    ) -> Self {
        Self {
            method: method.into(),
            kind,
            request_id,
        }
    }

    /// The method name this call was routed under.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Whether the handler is serving a method call, a notification or an
    /// inbound response.
    pub fn kind(&self) -> MessageKind {
        self.kind
    }

    /// The request id, present for method calls and inbound responses.
    pub fn request_id(&self) -> Option<&RequestId> {
        self.request_id.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_accessors() {
        let ctx = CallContext::new("add", MessageKind::Method, Some(RequestId::Number(1)));
        assert_eq!(ctx.method(), "add");
        assert_eq!(ctx.kind(), MessageKind::Method);
        assert_eq!(ctx.request_id(), Some(&RequestId::Number(1)));

        let ctx = CallContext::new("notify", MessageKind::Notification, None);
        assert!(ctx.request_id().is_none());
    }
}
