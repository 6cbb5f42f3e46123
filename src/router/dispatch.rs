//! Request → matcher adapter.

use tracing::debug;

use super::{DispatchResult, Dispatcher};
use crate::error::Result;
use crate::request::Request;

/// Feeds a request's method and URI to a [`Dispatcher`].
///
/// Pure delegation: no caching, no retries. Whatever the matcher returns,
/// including its errors, comes back unchanged.
#[derive(Debug)]
pub struct RequestDispatcher<D> {
    matcher: D,
}

impl<D: Dispatcher> RequestDispatcher<D> {
    pub fn new(matcher: D) -> Self {
        Self { matcher }
    }

    pub fn dispatch(&self, req: &Request) -> Result<DispatchResult> {
        let result = self.matcher.dispatch(req.method(), req.uri())?;
        debug!(method = req.method(), uri = req.uri(), outcome = outcome(&result), "dispatched");
        Ok(result)
    }

    pub fn matcher(&self) -> &D {
        &self.matcher
    }
}

fn outcome(result: &DispatchResult) -> &'static str {
    match result {
        DispatchResult::Matched { .. } => "matched",
        DispatchResult::NotFound => "not_found",
        DispatchResult::MethodNotAllowed { .. } => "method_not_allowed",
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::error::Error;

    /// Records every call and answers from a fixed script.
    struct Scripted {
        calls: RefCell<Vec<(String, String)>>,
        fail: bool,
    }

    impl Dispatcher for Scripted {
        fn dispatch(&self, method: &str, uri: &str) -> Result<DispatchResult> {
            self.calls.borrow_mut().push((method.to_owned(), uri.to_owned()));
            if self.fail {
                return Err(Error::invalid("matcher exploded"));
            }
            Ok(DispatchResult::NotFound)
        }
    }

    #[test]
    fn passes_method_and_full_uri_through() {
        let d = RequestDispatcher::new(Scripted { calls: RefCell::default(), fail: false });
        let result = d.dispatch(&Request::new("PATCH", "/a/b?c=d")).unwrap();
        assert!(matches!(result, DispatchResult::NotFound));
        assert_eq!(*d.matcher().calls.borrow(), [("PATCH".to_owned(), "/a/b?c=d".to_owned())]);
    }

    #[test]
    fn matcher_errors_propagate() {
        let d = RequestDispatcher::new(Scripted { calls: RefCell::default(), fail: true });
        let err = d.dispatch(&Request::new("GET", "/")).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(msg) if msg == "matcher exploded"));
        assert_eq!(d.matcher().calls.borrow().len(), 1);
    }
}
