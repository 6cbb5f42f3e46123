//! Hierarchical route registration.
//!
//! A group pushes a prefix and a data map onto the composer for the duration
//! of its body. Every route registered inside sees the concatenated prefix and
//! the deep-merged data of all enclosing groups:
//!
//! ```rust
//! use serde_json::json;
//! use spout::{Params, Request, RouteGroupComposer, RouteTable};
//!
//! async fn show(_: Request, _: Params) -> &'static str { "user" }
//!
//! let mut routes = RouteGroupComposer::new(RouteTable::new());
//! routes.group("/api", spout::route_data(json!({"auth": "token"})), |api| {
//!     api.group("/v1", Default::default(), |v1| {
//!         v1.get("/users/{id}", show) // registered as /api/v1/users/{id}
//!     })
//! })?;
//! # Ok::<(), spout::Error>(())
//! ```
//!
//! The previous context is restored by a drop guard, so it comes back on
//! every exit path: a normal return, an `Err` from the body, or a panic.

use std::collections::BTreeSet;
use std::ops::{Deref, DerefMut};

use tracing::debug;

use super::data::{RouteData, deep_merge};
use super::{Controller, RouteCollector, RouteDefinition};
use crate::error::Result;
use crate::handler::Handler;

#[derive(Clone, Debug, Default, PartialEq)]
struct GroupContext {
    prefix: String,
    data: RouteData,
}

/// Builds route definitions under nested prefixes and forwards them to a
/// [`RouteCollector`].
#[derive(Debug)]
pub struct RouteGroupComposer<C> {
    collector: C,
    context: GroupContext,
}

impl<C: RouteCollector> RouteGroupComposer<C> {
    pub fn new(collector: C) -> Self {
        Self { collector, context: GroupContext::default() }
    }

    /// Registers a route under the current prefix and inherited data.
    ///
    /// The prefix is prepended verbatim: no `/` is inserted, so `pattern`
    /// should start with one. Errors from the collector are returned as-is.
    pub fn add_route<M, S>(
        &mut self,
        methods: M,
        pattern: &str,
        controller: Controller,
        data: RouteData,
    ) -> Result<()>
    where
        M: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let methods: BTreeSet<String> = methods.into_iter().map(Into::into).collect();
        let pattern = format!("{}{}", self.context.prefix, pattern);
        let data = deep_merge(&self.context.data, &data);

        debug!(?methods, %pattern, "route registered");
        self.collector.attach(RouteDefinition::new(methods, pattern, controller, data))
    }

    /// Registers `handler` for one method with no extra data.
    pub fn on(&mut self, method: &str, pattern: &str, handler: impl Handler) -> Result<()> {
        self.add_route([method], pattern, Controller::handler(handler), RouteData::new())
    }

    pub fn get(&mut self, pattern: &str, handler: impl Handler) -> Result<()> {
        self.on("GET", pattern, handler)
    }

    pub fn post(&mut self, pattern: &str, handler: impl Handler) -> Result<()> {
        self.on("POST", pattern, handler)
    }

    pub fn put(&mut self, pattern: &str, handler: impl Handler) -> Result<()> {
        self.on("PUT", pattern, handler)
    }

    pub fn patch(&mut self, pattern: &str, handler: impl Handler) -> Result<()> {
        self.on("PATCH", pattern, handler)
    }

    pub fn delete(&mut self, pattern: &str, handler: impl Handler) -> Result<()> {
        self.on("DELETE", pattern, handler)
    }

    /// Runs `body` with `prefix` appended to the current prefix and `data`
    /// merged over the current data. Returns whatever `body` returns.
    pub fn group<F>(&mut self, prefix: &str, data: RouteData, body: F) -> Result<()>
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        let inner = GroupContext {
            prefix: format!("{}{}", self.context.prefix, prefix),
            data: deep_merge(&self.context.data, &data),
        };
        let saved = std::mem::replace(&mut self.context, inner);
        let mut scope = ContextGuard { composer: self, saved: Some(saved) };
        body(&mut *scope)
    }

    /// The prefix routes registered right now would receive.
    pub fn prefix(&self) -> &str {
        &self.context.prefix
    }

    /// The data routes registered right now would inherit.
    pub fn data(&self) -> &RouteData {
        &self.context.data
    }

    pub fn collector(&self) -> &C {
        &self.collector
    }

    /// Ends registration and hands back the collector.
    pub fn into_collector(self) -> C {
        self.collector
    }
}

/// Restores the enclosing group's context when dropped.
struct ContextGuard<'a, C> {
    composer: &'a mut RouteGroupComposer<C>,
    saved: Option<GroupContext>,
}

impl<C> Deref for ContextGuard<'_, C> {
    type Target = RouteGroupComposer<C>;

    fn deref(&self) -> &Self::Target {
        self.composer
    }
}

impl<C> DerefMut for ContextGuard<'_, C> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.composer
    }
}

impl<C> Drop for ContextGuard<'_, C> {
    fn drop(&mut self) {
        if let Some(saved) = self.saved.take() {
            self.composer.context = saved;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::panic::{AssertUnwindSafe, catch_unwind};

    use serde_json::{Value, json};

    use super::*;
    use crate::error::Error;

    #[derive(Default)]
    struct Recorder {
        routes: Vec<RouteDefinition>,
    }

    impl RouteCollector for Recorder {
        fn attach(&mut self, route: RouteDefinition) -> Result<()> {
            if route.methods().is_empty() {
                return Err(Error::invalid("no methods"));
            }
            self.routes.push(route);
            Ok(())
        }
    }

    fn data(value: Value) -> RouteData {
        crate::route_data(value)
    }

    fn named(name: &str) -> Controller {
        Controller::named(name)
    }

    fn patterns(composer: &RouteGroupComposer<Recorder>) -> Vec<&str> {
        composer.collector().routes.iter().map(RouteDefinition::pattern).collect()
    }

    #[test]
    fn nested_prefixes_concatenate() {
        let mut c = RouteGroupComposer::new(Recorder::default());
        c.group("/p1", RouteData::new(), |g| {
            g.group("/p2", RouteData::new(), |g| {
                g.add_route(["GET"], "/x", named("x"), RouteData::new())
            })
        })
        .unwrap();
        assert_eq!(patterns(&c), ["/p1/p2/x"]);
    }

    #[test]
    fn prefix_is_prepended_without_separator() {
        let mut c = RouteGroupComposer::new(Recorder::default());
        c.group("/users", RouteData::new(), |g| {
            g.add_route(["GET"], "", named("index"), RouteData::new())?;
            g.add_route(["GET"], "-export", named("export"), RouteData::new())
        })
        .unwrap();
        assert_eq!(patterns(&c), ["/users", "/users-export"]);
    }

    #[test]
    fn group_data_is_inherited_and_deep_merged() {
        let mut c = RouteGroupComposer::new(Recorder::default());
        c.group("/a", data(json!({"mw": {"auth": true}, "team": "core"})), |g| {
            g.group("", data(json!({"mw": {"cache": 60}})), |g| {
                g.add_route(["GET"], "/x", named("x"), data(json!({"team": "edge"})))
            })
        })
        .unwrap();

        let route = &c.collector().routes[0];
        assert_eq!(
            Value::Object(route.data().clone()),
            json!({"mw": {"auth": true, "cache": 60}, "team": "edge"})
        );
    }

    #[test]
    fn context_is_restored_after_group_returns() {
        let mut c = RouteGroupComposer::new(Recorder::default());
        c.group("/a", data(json!({"k": 1})), |g| {
            assert_eq!(g.prefix(), "/a");
            g.add_route(["GET"], "/in", named("in"), RouteData::new())
        })
        .unwrap();
        assert_eq!(c.prefix(), "");
        assert!(c.data().is_empty());
    }

    #[test]
    fn failing_group_body_does_not_leak_into_siblings() {
        let mut c = RouteGroupComposer::new(Recorder::default());
        c.group("/parent", data(json!({"scope": "parent"})), |g| {
            let failed = g.group("/broken", data(json!({"scope": "broken"})), |g| {
                g.add_route(Vec::<String>::new(), "/never", named("never"), RouteData::new())
            });
            assert!(matches!(failed, Err(Error::InvalidArgument(_))));
            g.add_route(["GET"], "/sibling", named("sibling"), RouteData::new())
        })
        .unwrap();

        let route = &c.collector().routes[0];
        assert_eq!(route.pattern(), "/parent/sibling");
        assert_eq!(route.data()["scope"], json!("parent"));
    }

    #[test]
    fn panicking_group_body_still_restores_context() {
        let mut c = RouteGroupComposer::new(Recorder::default());
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            c.group("/boom", data(json!({"x": 1})), |_| panic!("group body failed"))
        }));
        assert!(outcome.is_err());
        assert_eq!(c.prefix(), "");
        assert!(c.data().is_empty());

        c.add_route(["GET"], "/after", named("after"), RouteData::new()).unwrap();
        assert_eq!(patterns(&c), ["/after"]);
    }

    #[test]
    fn collector_rejection_is_returned_unchanged() {
        let mut c = RouteGroupComposer::new(Recorder::default());
        let err = c.add_route(Vec::<&str>::new(), "/x", named("x"), RouteData::new()).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(msg) if msg == "no methods"));
    }
}
