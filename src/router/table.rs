//! Radix-tree route table.
//!
//! One tree per HTTP method. O(path-length) lookup. It is both the
//! [`RouteCollector`] the composer feeds during registration and the
//! [`Dispatcher`] the application asks at request time.

use std::collections::{BTreeSet, HashMap};

use matchit::Router as MatchitRouter;

use super::data::RouteData;
use super::{Controller, DispatchResult, Dispatcher, RouteCollector, RouteDefinition};
use crate::error::{Error, Result};
use crate::request::Params;

#[derive(Clone)]
struct Entry {
    controller: Controller,
    data: RouteData,
}

/// The built-in route store and matcher.
///
/// Path parameters use matchit's `{name}` syntax and catch-alls use
/// `{*rest}`. A `HEAD` request with no `HEAD` route of its own is matched
/// against the `GET` routes.
#[derive(Default)]
pub struct RouteTable {
    trees: HashMap<String, MatchitRouter<Entry>>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn lookup(&self, method: &str, path: &str) -> Option<(Entry, Params)> {
        let tree = self.trees.get(method)?;
        let matched = tree.at(path).ok()?;
        let args = matched.params.iter().collect();
        Some((matched.value.clone(), args))
    }

    fn allowed_methods(&self, path: &str) -> BTreeSet<String> {
        let mut allowed: BTreeSet<String> = self.trees.iter()
            .filter(|(_, tree)| tree.at(path).is_ok())
            .map(|(method, _)| method.clone())
            .collect();
        if allowed.contains("GET") {
            allowed.insert("HEAD".to_owned());
        }
        allowed
    }
}

impl RouteCollector for RouteTable {
    fn attach(&mut self, route: RouteDefinition) -> Result<()> {
        let (methods, pattern, controller, data) = route.into_parts();
        if methods.is_empty() {
            return Err(Error::invalid(format!("route `{pattern}` has no methods")));
        }
        if !pattern.starts_with('/') {
            return Err(Error::invalid(format!("route `{pattern}` must start with `/`")));
        }
        let methods = methods.iter()
            .map(|m| normalize_method(m))
            .collect::<Result<BTreeSet<_>>>()?;

        let entry = Entry { controller, data };
        let mut inserted = Vec::with_capacity(methods.len());
        for method in methods {
            let tree = self.trees.entry(method.clone()).or_default();
            if let Err(e) = tree.insert(pattern.as_str(), entry.clone()) {
                // Leave the table exactly as it was before this route.
                for done in &inserted {
                    if let Some(tree) = self.trees.get_mut(done) {
                        tree.remove(pattern.as_str());
                    }
                }
                return Err(Error::invalid(format!("invalid route `{method} {pattern}`: {e}")));
            }
            inserted.push(method);
        }
        Ok(())
    }
}

impl Dispatcher for RouteTable {
    fn dispatch(&self, method: &str, uri: &str) -> Result<DispatchResult> {
        let method = method.to_ascii_uppercase();
        let path = request_path(uri);

        let found = self.lookup(&method, &path)
            .or_else(|| if method == "HEAD" { self.lookup("GET", &path) } else { None });

        Ok(match found {
            Some((entry, args)) => DispatchResult::Matched {
                controller: entry.controller,
                args,
                data: entry.data,
            },
            None => {
                let allowed = self.allowed_methods(&path);
                if allowed.is_empty() {
                    DispatchResult::NotFound
                } else {
                    DispatchResult::MethodNotAllowed { allowed }
                }
            }
        })
    }
}

fn normalize_method(method: &str) -> Result<String> {
    let upper = method.to_ascii_uppercase();
    http::Method::from_bytes(upper.as_bytes())
        .map(|m| m.as_str().to_owned())
        .map_err(|_| Error::invalid(format!("invalid HTTP method `{method}`")))
}

/// The path component of a request URI: no scheme, authority, query or fragment.
fn request_path(uri: &str) -> String {
    let uri = uri.split('#').next().unwrap_or_default();
    match uri.parse::<http::Uri>() {
        Ok(parsed) if !parsed.path().is_empty() => parsed.path().to_owned(),
        Ok(_) => "/".to_owned(),
        Err(_) => uri.split('?').next().unwrap_or_default().to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::router::route_data;

    fn def(methods: &[&str], pattern: &str, name: &str) -> RouteDefinition {
        RouteDefinition::new(
            methods.iter().map(|m| m.to_string()).collect(),
            pattern.to_owned(),
            Controller::named(name),
            route_data(json!({"name": name})),
        )
    }

    fn matched_name(result: DispatchResult) -> String {
        match result {
            DispatchResult::Matched { controller: Controller::Named(name), .. } => name,
            other => panic!("expected a named match, got {other:?}"),
        }
    }

    #[test]
    fn matches_and_extracts_args_and_data() {
        let mut t = RouteTable::new();
        t.attach(def(&["GET"], "/users/{id}", "show")).unwrap();

        match t.dispatch("GET", "/users/42?full=1").unwrap() {
            DispatchResult::Matched { args, data, .. } => {
                assert_eq!(args.get("id"), Some("42"));
                assert_eq!(data["name"], json!("show"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn absolute_uri_is_reduced_to_its_path() {
        let mut t = RouteTable::new();
        t.attach(def(&["get"], "/ping", "ping")).unwrap();
        assert_eq!(matched_name(t.dispatch("GET", "http://example.com/ping#top").unwrap()), "ping");
    }

    #[test]
    fn unknown_path_is_not_found() {
        let t = RouteTable::new();
        assert!(matches!(t.dispatch("GET", "/nope").unwrap(), DispatchResult::NotFound));
    }

    #[test]
    fn wrong_method_lists_allowed_ones() {
        let mut t = RouteTable::new();
        t.attach(def(&["GET", "POST"], "/items", "items")).unwrap();
        match t.dispatch("DELETE", "/items").unwrap() {
            DispatchResult::MethodNotAllowed { allowed } => {
                assert_eq!(allowed.into_iter().collect::<Vec<_>>(), ["GET", "HEAD", "POST"]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn head_falls_back_to_get() {
        let mut t = RouteTable::new();
        t.attach(def(&["GET"], "/page", "page")).unwrap();
        assert_eq!(matched_name(t.dispatch("head", "/page").unwrap()), "page");

        t.attach(def(&["HEAD"], "/page", "page-head")).unwrap();
        assert_eq!(matched_name(t.dispatch("HEAD", "/page").unwrap()), "page-head");
    }

    #[test]
    fn rejects_malformed_routes() {
        let mut t = RouteTable::new();
        assert!(matches!(t.attach(def(&[], "/x", "x")), Err(Error::InvalidArgument(_))));
        assert!(matches!(t.attach(def(&["GET"], "x", "x")), Err(Error::InvalidArgument(_))));
        assert!(matches!(t.attach(def(&["GE T"], "/x", "x")), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn conflicting_route_leaves_table_untouched() {
        let mut t = RouteTable::new();
        t.attach(def(&["POST"], "/dup", "first")).unwrap();

        let err = t.attach(def(&["GET", "POST"], "/dup", "second")).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));

        // GET was inserted before POST failed and must have been rolled back.
        assert!(matches!(
            t.dispatch("GET", "/dup").unwrap(),
            DispatchResult::MethodNotAllowed { .. }
        ));
        assert_eq!(matched_name(t.dispatch("POST", "/dup").unwrap()), "first");
    }
}
