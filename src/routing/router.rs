//! Router table module
//!
//! Routes are registered with explicit builder calls at startup. `build()`
//! validates the table once; the resulting `Router` is immutable and owns the
//! state handle injected into every handler.

use hyper::body::Bytes;
use hyper::{Method, StatusCode};
use serde_json::Value;
use std::collections::HashMap;

use super::{HandlerError, PathTemplate, RouteArgs, RouteError};
use crate::schema::{FieldError, Location, Schema, ValidationErrors};

/// Handler signature: injected state plus validated arguments
pub type HandlerFn<S> = fn(&S, &RouteArgs) -> Result<Value, HandlerError>;

/// How a route reads its request body
#[derive(Debug, Clone, Default, PartialEq)]
pub enum BodyKind {
    /// Body is not read
    #[default]
    Empty,
    /// Any JSON value, passed through unvalidated
    Raw,
    /// JSON object validated against a schema
    Schema(Schema),
}

/// Decoupled request data, independent of the HTTP connection
#[derive(Debug, Clone)]
pub struct RequestParts {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub body: Bytes,
}

impl RequestParts {
    /// Request without a body; `target` may carry a query string
    pub fn new(method: Method, target: &str) -> Self {
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path.to_string(), Some(query.to_string())),
            None => (target.to_string(), None),
        };
        Self {
            method,
            path,
            query,
            body: Bytes::new(),
        }
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }
}

/// Outcome of dispatching one request
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
    Handled(Value),
    NotFound,
    MethodNotAllowed(Vec<Method>),
    Invalid(ValidationErrors),
    Failed(HandlerError),
}

impl Dispatch {
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Handled(_) => StatusCode::OK,
            Self::NotFound | Self::Failed(HandlerError::NotFound(_)) => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            Self::Invalid(_) | Self::Failed(HandlerError::Invalid(_)) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            Self::Failed(HandlerError::Internal(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

struct Route<S> {
    method: Method,
    template: PathTemplate,
    path_schema: Schema,
    query: Schema,
    body: BodyKind,
    handler: HandlerFn<S>,
}

/// Route declaration collected by the builder
pub struct RouteDef<S> {
    methods: Vec<Method>,
    template: String,
    query: Schema,
    body: BodyKind,
    handler: HandlerFn<S>,
}

impl<S> RouteDef<S> {
    /// Declare the query parameters
    pub fn query(&mut self, schema: Schema) -> &mut Self {
        self.query = schema;
        self
    }

    /// Declare how the body is read
    pub fn body(&mut self, kind: BodyKind) -> &mut Self {
        self.body = kind;
        self
    }
}

/// Builder for the router table
pub struct RouterBuilder<S> {
    state: S,
    defs: Vec<RouteDef<S>>,
}

impl<S> RouterBuilder<S> {
    pub const fn new(state: S) -> Self {
        Self {
            state,
            defs: Vec::new(),
        }
    }

    /// Register one handler for one or more methods on a path template
    pub fn route(&mut self, methods: &[Method], template: &str, handler: HandlerFn<S>) -> &mut RouteDef<S> {
        let index = self.defs.len();
        self.defs.push(RouteDef {
            methods: methods.to_vec(),
            template: template.to_string(),
            query: Schema::new(),
            body: BodyKind::Empty,
            handler,
        });
        &mut self.defs[index]
    }

    pub fn get(&mut self, template: &str, handler: HandlerFn<S>) -> &mut RouteDef<S> {
        self.route(&[Method::GET], template, handler)
    }

    pub fn post(&mut self, template: &str, handler: HandlerFn<S>) -> &mut RouteDef<S> {
        self.route(&[Method::POST], template, handler)
    }

    pub fn put(&mut self, template: &str, handler: HandlerFn<S>) -> &mut RouteDef<S> {
        self.route(&[Method::PUT], template, handler)
    }

    pub fn delete(&mut self, template: &str, handler: HandlerFn<S>) -> &mut RouteDef<S> {
        self.route(&[Method::DELETE], template, handler)
    }

    /// Validate the table and freeze it
    pub fn build(self) -> Result<Router<S>, RouteError> {
        let mut routes = Vec::new();
        let mut seen: HashMap<(Method, String), String> = HashMap::new();

        for def in self.defs {
            let template = PathTemplate::parse(&def.template)?;
            let path_schema = template.params_schema();

            for method in def.methods {
                let key = (method.clone(), template.shape());
                if let Some(existing) = seen.get(&key) {
                    return Err(RouteError::Duplicate {
                        method,
                        template: def.template,
                        existing: existing.clone(),
                    });
                }
                seen.insert(key, def.template.clone());

                routes.push(Route {
                    method,
                    template: template.clone(),
                    path_schema: path_schema.clone(),
                    query: def.query.clone(),
                    body: def.body.clone(),
                    handler: def.handler,
                });
            }
        }

        // More literal segments match first; registration order otherwise
        routes.sort_by_key(|route| std::cmp::Reverse(route.template.literal_count()));

        Ok(Router {
            routes,
            state: self.state,
        })
    }
}

/// Immutable router table
pub struct Router<S> {
    routes: Vec<Route<S>>,
    state: S,
}

impl<S> Router<S> {
    pub const fn state(&self) -> &S {
        &self.state
    }

    /// Number of (method, template) entries
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Methods registered for the template matching `path`, in registration order
    pub fn allowed_methods(&self, path: &str) -> Vec<Method> {
        let mut allowed: Vec<Method> = Vec::new();
        for route in &self.routes {
            if route.template.match_path(path).is_some() && !allowed.contains(&route.method) {
                allowed.push(route.method.clone());
            }
        }
        allowed
    }

    /// Match, validate and invoke
    pub fn dispatch(&self, req: &RequestParts) -> Dispatch {
        let mut allowed: Vec<Method> = Vec::new();
        let mut matched = None;

        for route in &self.routes {
            let Some(raw_params) = route.template.match_path(&req.path) else {
                continue;
            };
            if route.method == req.method {
                matched = Some((route, raw_params));
                break;
            }
            if !allowed.contains(&route.method) {
                allowed.push(route.method.clone());
            }
        }

        let Some((route, raw_params)) = matched else {
            return if allowed.is_empty() {
                Dispatch::NotFound
            } else {
                Dispatch::MethodNotAllowed(allowed)
            };
        };

        match extract_args(route, &raw_params, req) {
            Ok(args) => match (route.handler)(self.state(), &args) {
                Ok(value) => Dispatch::Handled(value),
                Err(HandlerError::Invalid(errors)) => Dispatch::Invalid(errors),
                Err(err) => Dispatch::Failed(err),
            },
            Err(errors) => Dispatch::Invalid(errors),
        }
    }
}

/// Validate path, query and body, collecting errors from all three
fn extract_args<S>(
    route: &Route<S>,
    raw_params: &[(String, String)],
    req: &RequestParts,
) -> Result<RouteArgs, ValidationErrors> {
    let query_pairs: Vec<(String, String)> = req
        .query
        .as_deref()
        .map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
        .unwrap_or_default();

    let path = route.path_schema.validate_strings(Location::Path, raw_params);
    let query = route.query.validate_strings(Location::Query, &query_pairs);
    let body = decode_body(&route.body, &req.body);

    match (path, query, body) {
        (Ok(path), Ok(mut params), Ok(body)) => {
            params.extend(path);
            Ok(RouteArgs::new(params, body))
        }
        (path, query, body) => Err(ValidationErrors::merge(
            [path.err(), query.err(), body.err()].into_iter().flatten(),
        )),
    }
}

fn decode_body(kind: &BodyKind, raw: &[u8]) -> Result<Option<Value>, ValidationErrors> {
    match kind {
        BodyKind::Empty => Ok(None),
        BodyKind::Raw => parse_json(raw).map(Some),
        BodyKind::Schema(schema) => {
            let Value::Object(map) = parse_json(raw)? else {
                return Err(FieldError::NotAnObject {
                    location: Location::Body,
                }
                .into());
            };
            schema
                .validate(Location::Body, &map)
                .map(|validated| Some(Value::Object(validated)))
        }
    }
}

fn parse_json(raw: &[u8]) -> Result<Value, ValidationErrors> {
    if raw.iter().all(u8::is_ascii_whitespace) {
        return Err(FieldError::MissingBody.into());
    }
    serde_json::from_slice(raw).map_err(|e| {
        FieldError::JsonDecode {
            line: e.line(),
            column: e.column(),
            message: e.to_string(),
        }
        .into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldType;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn echo(_: &(), args: &RouteArgs) -> Result<Value, HandlerError> {
        Ok(json!({ "id": args.int("id")? }))
    }

    fn fixed(_: &(), _: &RouteArgs) -> Result<Value, HandlerError> {
        Ok(json!("fixed"))
    }

    fn missing(_: &(), _: &RouteArgs) -> Result<Value, HandlerError> {
        Err(HandlerError::NotFound("gone".to_string()))
    }

    #[test]
    fn test_build_rejects_duplicate_shape() {
        let mut builder = RouterBuilder::new(());
        builder.get("/items/{id:int}", echo);
        builder.get("/items/{name}", fixed);
        let err = builder.build().err();
        assert_eq!(
            err,
            Some(RouteError::Duplicate {
                method: Method::GET,
                template: "/items/{name}".to_string(),
                existing: "/items/{id:int}".to_string(),
            })
        );
    }

    #[test]
    fn test_same_shape_different_methods_is_allowed() {
        let mut builder = RouterBuilder::new(());
        builder.route(&[Method::GET, Method::POST], "/things", fixed);
        builder.delete("/things", fixed);
        let router = builder.build().unwrap();
        assert_eq!(router.len(), 3);
        assert_eq!(
            router.allowed_methods("/things"),
            vec![Method::GET, Method::POST, Method::DELETE]
        );
    }

    #[test]
    fn test_build_rejects_invalid_template() {
        let mut builder = RouterBuilder::new(());
        builder.get("/items/{id:bool}", fixed);
        assert!(matches!(
            builder.build(),
            Err(RouteError::InvalidTemplate { .. })
        ));
    }

    #[test]
    fn test_literal_segments_win_over_params() {
        let mut builder = RouterBuilder::new(());
        builder.get("/items/{id:int}", echo);
        builder.get("/items/latest", fixed);
        let router = builder.build().unwrap();
        assert_eq!(
            router.dispatch(&RequestParts::new(Method::GET, "/items/latest")),
            Dispatch::Handled(json!("fixed"))
        );
        assert_eq!(
            router.dispatch(&RequestParts::new(Method::GET, "/items/3")),
            Dispatch::Handled(json!({"id": 3}))
        );
    }

    #[test]
    fn test_dispatch_outcomes() {
        let mut builder = RouterBuilder::new(());
        builder.get("/items/{id:int}", echo);
        builder.delete("/gone", missing);
        let router = builder.build().unwrap();

        let not_found = router.dispatch(&RequestParts::new(Method::GET, "/nowhere"));
        assert_eq!(not_found, Dispatch::NotFound);
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);

        let wrong_method = router.dispatch(&RequestParts::new(Method::POST, "/items/1"));
        assert_eq!(wrong_method, Dispatch::MethodNotAllowed(vec![Method::GET]));

        let invalid = router.dispatch(&RequestParts::new(Method::GET, "/items/a"));
        assert_eq!(invalid.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let failed = router.dispatch(&RequestParts::new(Method::DELETE, "/gone"));
        assert_eq!(failed, Dispatch::Failed(HandlerError::NotFound("gone".to_string())));
        assert_eq!(failed.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_errors_collected_across_locations() {
        let mut builder = RouterBuilder::new(());
        builder
            .post("/items/{id:int}", echo)
            .query(Schema::new().required("q", FieldType::Str))
            .body(BodyKind::Schema(Schema::new().required("price", FieldType::Float)));
        let router = builder.build().unwrap();

        let req = RequestParts::new(Method::POST, "/items/x").with_body("{}");
        let Dispatch::Invalid(errors) = router.dispatch(&req) else {
            panic!("expected validation failure");
        };
        assert_eq!(
            errors.errors(),
            &[
                FieldError::Coercion {
                    location: Location::Path,
                    field: "id".to_string(),
                    expected: FieldType::Int,
                },
                FieldError::Missing {
                    location: Location::Query,
                    field: "q".to_string(),
                },
                FieldError::Missing {
                    location: Location::Body,
                    field: "price".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_body_decoding_errors() {
        let kind = BodyKind::Schema(Schema::new().required("id", FieldType::Int));
        assert_eq!(
            decode_body(&kind, b"  ").unwrap_err().errors(),
            &[FieldError::MissingBody]
        );
        assert_eq!(
            decode_body(&kind, b"[1, 2]").unwrap_err().errors(),
            &[FieldError::NotAnObject {
                location: Location::Body
            }]
        );
        assert!(matches!(
            decode_body(&kind, b"{\"id\": ").unwrap_err().errors(),
            [FieldError::JsonDecode { line: 1, .. }]
        ));
        assert_eq!(decode_body(&BodyKind::Raw, b"[1]").unwrap(), Some(json!([1])));
        assert_eq!(decode_body(&BodyKind::Empty, b"ignored").unwrap(), None);
    }

    #[test]
    fn test_request_parts_splits_query() {
        let req = RequestParts::new(Method::GET, "/getUserInfo?id=1&name=thomas");
        assert_eq!(req.path, "/getUserInfo");
        assert_eq!(req.query.as_deref(), Some("id=1&name=thomas"));
    }
}
