//! Route registration and request matching.
//!
//! Registration and matching meet at two narrow traits. A [`RouteCollector`]
//! accepts finished [`RouteDefinition`]s; a [`Dispatcher`] turns a method and
//! URI into a [`DispatchResult`]. [`RouteGroupComposer`] and
//! [`RequestDispatcher`] sit in front of them, and [`RouteTable`] is the
//! radix-tree implementation of both that ships with the crate.

mod data;
mod dispatch;
mod group;
mod table;

use std::collections::BTreeSet;
use std::fmt;

pub use data::{RouteData, deep_merge, route_data};
pub use dispatch::RequestDispatcher;
pub use group::RouteGroupComposer;
pub use table::RouteTable;

use crate::error::Result;
use crate::handler::{BoxedHandler, Handler};
use crate::request::Params;

/// What a route points at.
#[derive(Clone)]
pub enum Controller {
    /// A handler ready to be invoked.
    Handler(BoxedHandler),
    /// An identifier the application resolves at dispatch time.
    Named(String),
}

impl Controller {
    pub fn handler(handler: impl Handler) -> Self {
        Self::Handler(handler.into_boxed_handler())
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }
}

impl fmt::Debug for Controller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Handler(_) => f.write_str("Handler(..)"),
            Self::Named(name) => f.debug_tuple("Named").field(name).finish(),
        }
    }
}

/// A finished route, as handed to a [`RouteCollector`].
#[derive(Clone, Debug)]
pub struct RouteDefinition {
    methods: BTreeSet<String>,
    pattern: String,
    controller: Controller,
    data: RouteData,
}

impl RouteDefinition {
    pub fn new(
        methods: BTreeSet<String>,
        pattern: String,
        controller: Controller,
        data: RouteData,
    ) -> Self {
        Self { methods, pattern, controller, data }
    }

    pub fn methods(&self) -> &BTreeSet<String> { &self.methods }
    pub fn pattern(&self) -> &str { &self.pattern }
    pub fn controller(&self) -> &Controller { &self.controller }
    pub fn data(&self) -> &RouteData { &self.data }

    pub fn into_parts(self) -> (BTreeSet<String>, String, Controller, RouteData) {
        (self.methods, self.pattern, self.controller, self.data)
    }
}

/// Receives route definitions during registration.
pub trait RouteCollector {
    /// Stores `route`, or rejects it with [`Error::InvalidArgument`](crate::Error::InvalidArgument).
    fn attach(&mut self, route: RouteDefinition) -> Result<()>;
}

/// Outcome of matching one method + URI.
#[derive(Clone, Debug)]
pub enum DispatchResult {
    Matched {
        controller: Controller,
        args: Params,
        data: RouteData,
    },
    NotFound,
    MethodNotAllowed {
        allowed: BTreeSet<String>,
    },
}

/// Matches a method + URI against registered routes.
pub trait Dispatcher {
    fn dispatch(&self, method: &str, uri: &str) -> Result<DispatchResult>;
}

impl<T: RouteCollector + ?Sized> RouteCollector for &mut T {
    fn attach(&mut self, route: RouteDefinition) -> Result<()> {
        (**self).attach(route)
    }
}

impl<T: Dispatcher + ?Sized> Dispatcher for std::sync::Arc<T> {
    fn dispatch(&self, method: &str, uri: &str) -> Result<DispatchResult> {
        (**self).dispatch(method, uri)
    }
}
