//! Demo route table
//!
//! Every handler here is a few lines: echo the input, append to or remove
//! from the shared username list, or re-shape a validated payload.

use hyper::Method;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::routing::{BodyKind, HandlerError, RouteArgs, RouteError, Router, RouterBuilder};
use crate::schema::{FieldError, FieldType, Location, Schema};
use crate::store::{StoreError, UsernameStore};

type HandlerResult = Result<Value, HandlerError>;

/// State injected into every demo handler
#[derive(Debug, Clone, Default)]
pub struct DemoState {
    pub usernames: UsernameStore,
}

/// `{id, name}` payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Info {
    pub id: i64,
    pub name: String,
}

impl Info {
    fn schema() -> Schema {
        Schema::new()
            .required("id", FieldType::Int)
            .required("name", FieldType::Str)
    }
}

/// Item payload shared by the `/items*` routes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub tax: Option<f64>,
}

impl Item {
    fn schema() -> Schema {
        Schema::new()
            .required("name", FieldType::Str)
            .optional("description", FieldType::Str, Value::Null)
            .required("price", FieldType::Float)
            .optional("tax", FieldType::Float, Value::Null)
    }

    /// Price including tax, when tax is set
    ///
    /// Fails when the sum overflows, since JSON has no infinity.
    pub fn price_with_tax(&self) -> Result<Option<f64>, HandlerError> {
        match self.tax.map(|tax| self.price + tax) {
            Some(total) if !total.is_finite() => Err(HandlerError::Invalid(
                FieldError::NotFinite {
                    location: Location::Body,
                    field: "price_with_tax".to_string(),
                }
                .into(),
            )),
            total => Ok(total),
        }
    }
}

impl From<StoreError> for HandlerError {
    fn from(err: StoreError) -> Self {
        Self::NotFound(err.to_string())
    }
}

fn username_query() -> Schema {
    Schema::new().required("username", FieldType::Str)
}

/// Build the demo router table
pub fn build_router(state: DemoState) -> Result<Router<DemoState>, RouteError> {
    let mut router = RouterBuilder::new(state);

    router.get("/", root);
    router.get("/items/{item_id:int}", read_item);
    router.get("/getUserInfo", get_user_info).query(
        Schema::new()
            .required("id", FieldType::Int)
            .required("name", FieldType::Str),
    );

    router.post("/getInformation", get_information).body(BodyKind::Raw);
    router
        .post("/getInformation2", get_information2)
        .body(BodyKind::Schema(Info::schema()));

    router.post("/items1", create_item1).body(BodyKind::Schema(Item::schema()));
    router.post("/items2", create_item2).body(BodyKind::Schema(Item::schema()));
    router.post("/items3", create_item3).body(BodyKind::Schema(Item::schema()));

    router.put("/putdata/{username}", put_data);
    router.post("/postdata", post_data).query(username_query());
    router.delete("/deletedata", delete_data).query(username_query());
    router
        .route(
            &[Method::GET, Method::POST, Method::PUT, Method::DELETE],
            "/homedata",
            home_data,
        )
        .query(username_query());

    router.build()
}

fn root(_: &DemoState, _: &RouteArgs) -> HandlerResult {
    Ok(json!({ "message": "Hello World" }))
}

fn read_item(_: &DemoState, args: &RouteArgs) -> HandlerResult {
    Ok(json!({ "item_id": args.int("item_id")? }))
}

fn get_user_info(_: &DemoState, args: &RouteArgs) -> HandlerResult {
    Ok(json!([{
        "id": args.int("id")?,
        "firstName": args.str("name")?,
    }]))
}

fn get_information(_: &DemoState, args: &RouteArgs) -> HandlerResult {
    Ok(json!({
        "status": "SUCCESS",
        "author": "Mohamed",
        "data": args.body()?,
    }))
}

fn get_information2(_: &DemoState, args: &RouteArgs) -> HandlerResult {
    let info: Info = args.body_as()?;
    Ok(json!({
        "status": "SUCCESS",
        "author": "M.Ibrahim",
        "data": info,
    }))
}

fn create_item1(_: &DemoState, args: &RouteArgs) -> HandlerResult {
    let item: Item = args.body_as()?;
    Ok(serde_json::to_value(item)?)
}

fn create_item2(_: &DemoState, args: &RouteArgs) -> HandlerResult {
    let item: Item = args.body_as()?;
    let rebuilt = Item {
        name: item.name,
        description: item.description,
        price: item.price,
        tax: item.tax,
    };
    Ok(serde_json::to_value(rebuilt)?)
}

fn create_item3(_: &DemoState, args: &RouteArgs) -> HandlerResult {
    let item: Item = args.body_as()?;
    let mut value = serde_json::to_value(&item)?;
    if let (Some(total), Value::Object(fields)) = (item.price_with_tax()?, &mut value) {
        fields.insert("price_with_tax".to_string(), json!(total));
    }
    Ok(value)
}

fn put_data(state: &DemoState, args: &RouteArgs) -> HandlerResult {
    let username = args.str("username")?;
    tracing::info!(username, "appending username");
    Ok(listing(username, &state.usernames.append(username)))
}

fn post_data(state: &DemoState, args: &RouteArgs) -> HandlerResult {
    let username = args.str("username")?;
    tracing::info!(username, "appending username");
    Ok(listing(username, &state.usernames.append(username)))
}

fn delete_data(state: &DemoState, args: &RouteArgs) -> HandlerResult {
    let username = args.str("username")?;
    tracing::info!(username, "removing username");
    let list = state.usernames.remove(username)?;
    Ok(listing(username, &list))
}

fn home_data(state: &DemoState, args: &RouteArgs) -> HandlerResult {
    let username = args.str("username")?;
    tracing::info!(username, "listing usernames");
    Ok(listing(username, &state.usernames.snapshot()))
}

fn listing(username: &str, list: &[String]) -> Value {
    json!({
        "data": username,
        "list_of": list,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::{Dispatch, RequestParts};
    use hyper::StatusCode;
    use pretty_assertions::assert_eq;

    fn router() -> Router<DemoState> {
        build_router(DemoState::default()).unwrap()
    }

    fn handled(router: &Router<DemoState>, req: &RequestParts) -> Value {
        match router.dispatch(req) {
            Dispatch::Handled(value) => value,
            other => panic!("expected 200 for {} {}, got {other:?}", req.method, req.path),
        }
    }

    fn invalid(router: &Router<DemoState>, req: &RequestParts) -> Vec<FieldError> {
        match router.dispatch(req) {
            Dispatch::Invalid(errors) => errors.errors().to_vec(),
            other => panic!("expected 422 for {} {}, got {other:?}", req.method, req.path),
        }
    }

    fn missing(location: Location, field: &str) -> FieldError {
        FieldError::Missing {
            location,
            field: field.to_string(),
        }
    }

    fn list_len(router: &Router<DemoState>, username: &str) -> usize {
        router.state().usernames.count(username)
    }

    #[test]
    fn test_root() {
        let router = router();
        assert_eq!(
            handled(&router, &RequestParts::new(Method::GET, "/")),
            json!({"message": "Hello World"})
        );
    }

    #[test]
    fn test_read_item() {
        let router = router();
        assert_eq!(
            handled(&router, &RequestParts::new(Method::GET, "/items/1")),
            json!({"item_id": 1})
        );
    }

    #[test]
    fn test_integer_path_rejects_non_numeric_segment() {
        let router = router();
        for target in ["/items/a", "/items/1.5", "/items/%20"] {
            let errors = invalid(&router, &RequestParts::new(Method::GET, target));
            assert_eq!(
                errors,
                vec![FieldError::Coercion {
                    location: Location::Path,
                    field: "item_id".to_string(),
                    expected: FieldType::Int,
                }]
            );
        }
    }

    #[test]
    fn test_get_user_info() {
        let router = router();
        assert_eq!(
            handled(
                &router,
                &RequestParts::new(Method::GET, "/getUserInfo?id=1&name=thomas")
            ),
            json!([{"id": 1, "firstName": "thomas"}])
        );
        // Numeric strings are valid for string parameters
        assert_eq!(
            handled(&router, &RequestParts::new(Method::GET, "/getUserInfo?id=1&name=100")),
            json!([{"id": 1, "firstName": "100"}])
        );
    }

    #[test]
    fn test_get_user_info_rejects_bad_id() {
        let router = router();
        let req = RequestParts::new(Method::GET, "/getUserInfo?id=a&name=thomas");
        assert_eq!(router.dispatch(&req).status(), StatusCode::UNPROCESSABLE_ENTITY);

        let errors = invalid(&router, &RequestParts::new(Method::GET, "/getUserInfo"));
        assert_eq!(
            errors,
            vec![missing(Location::Query, "id"), missing(Location::Query, "name")]
        );
    }

    #[test]
    fn test_get_information_echoes_any_json() {
        let router = router();
        let req = RequestParts::new(Method::POST, "/getInformation")
            .with_body(r#"{"id": 100, "name": "Jay", "city": "Kochi"}"#);
        assert_eq!(
            handled(&router, &req),
            json!({
                "status": "SUCCESS",
                "author": "Mohamed",
                "data": {"id": 100, "name": "Jay", "city": "Kochi"}
            })
        );
    }

    #[test]
    fn test_get_information_rejects_malformed_json() {
        let router = router();
        let req = RequestParts::new(Method::POST, "/getInformation").with_body("{oops");
        assert!(matches!(
            invalid(&router, &req).as_slice(),
            [FieldError::JsonDecode { .. }]
        ));
    }

    #[test]
    fn test_get_information2() {
        let router = router();
        let req = RequestParts::new(Method::POST, "/getInformation2")
            .with_body(r#"{"id": 100, "name": "Jay", "city": "Kochi"}"#);
        assert_eq!(
            handled(&router, &req),
            json!({
                "status": "SUCCESS",
                "author": "M.Ibrahim",
                "data": {"id": 100, "name": "Jay"}
            })
        );
    }

    #[test]
    fn test_body_schemas_name_missing_required_fields() {
        let router = router();

        let req = RequestParts::new(Method::POST, "/getInformation2").with_body(r#"{"id": 100}"#);
        assert_eq!(invalid(&router, &req), vec![missing(Location::Body, "name")]);

        for path in ["/items1", "/items2", "/items3"] {
            let req = RequestParts::new(Method::POST, path).with_body(r#"{"description": "abcd"}"#);
            assert_eq!(
                invalid(&router, &req),
                vec![missing(Location::Body, "name"), missing(Location::Body, "price")]
            );

            let req = RequestParts::new(Method::POST, path);
            assert_eq!(invalid(&router, &req), vec![FieldError::MissingBody]);
        }
    }

    #[test]
    fn test_items1_echoes_item_with_nulls() {
        let router = router();
        let req = RequestParts::new(Method::POST, "/items1").with_body(r#"{"name": 100, "price": 100}"#);
        assert_eq!(
            handled(&router, &req),
            json!({"name": "100", "description": null, "price": 100.0, "tax": null})
        );
    }

    #[test]
    fn test_items2_rebuilds_item() {
        let router = router();
        let req = RequestParts::new(Method::POST, "/items2")
            .with_body(r#"{"name": 105, "description": "abcdefgh", "price": 100, "tax": 4}"#);
        assert_eq!(
            handled(&router, &req),
            json!({"name": "105", "description": "abcdefgh", "price": 100.0, "tax": 4.0})
        );
    }

    #[test]
    fn test_items3_adds_price_with_tax() {
        let router = router();
        let req = RequestParts::new(Method::POST, "/items3")
            .with_body(r#"{"name": 210, "description": "abcdefgh", "price": 200, "tax": 6}"#);
        let value = handled(&router, &req);
        assert_eq!(value["price_with_tax"], json!(206.0));
        assert_eq!(
            value["price_with_tax"].as_f64(),
            Some(value["price"].as_f64().unwrap() + value["tax"].as_f64().unwrap())
        );

        // Zero tax is still present
        let req = RequestParts::new(Method::POST, "/items3")
            .with_body(r#"{"name": "pen", "price": 2.5, "tax": 0}"#);
        assert_eq!(handled(&router, &req)["price_with_tax"], json!(2.5));
    }

    #[test]
    fn test_items3_omits_price_with_tax_without_tax() {
        let router = router();
        let req = RequestParts::new(Method::POST, "/items3").with_body(r#"{"name": "pen", "price": 2.5}"#);
        let value = handled(&router, &req);
        assert_eq!(value.get("price_with_tax"), None);
        assert_eq!(value["tax"], Value::Null);
    }

    #[test]
    fn test_items3_rejects_overflowing_price_with_tax() {
        let router = router();
        let req = RequestParts::new(Method::POST, "/items3")
            .with_body(r#"{"name": "yacht", "price": 1e308, "tax": 1e308}"#);
        assert_eq!(router.dispatch(&req).status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            invalid(&router, &req),
            vec![FieldError::NotFinite {
                location: Location::Body,
                field: "price_with_tax".to_string(),
            }]
        );
    }

    #[test]
    fn test_out_of_range_ids_rejected_in_body_and_query() {
        let router = router();
        let id_error = |location| FieldError::Coercion {
            location,
            field: "id".to_string(),
            expected: FieldType::Int,
        };

        for body in [
            r#"{"id": 1e20, "name": "Jay"}"#,
            r#"{"id": 18446744073709551615, "name": "Jay"}"#,
        ] {
            let req = RequestParts::new(Method::POST, "/getInformation2").with_body(body);
            assert_eq!(invalid(&router, &req), vec![id_error(Location::Body)]);
        }

        let req = RequestParts::new(Method::GET, "/getUserInfo?id=99999999999999999999&name=x");
        assert_eq!(invalid(&router, &req), vec![id_error(Location::Query)]);
    }

    #[test]
    fn test_put_then_delete_restores_count() {
        let router = router();
        router.state().usernames.append("thomas");
        let before = list_len(&router, "thomas");

        let put = handled(&router, &RequestParts::new(Method::PUT, "/putdata/thomas"));
        assert_eq!(put["data"], json!("thomas"));
        assert_eq!(list_len(&router, "thomas"), before + 1);

        let listed = handled(
            &router,
            &RequestParts::new(Method::GET, "/homedata?username=thomas"),
        );
        assert_eq!(listed["list_of"], json!(["thomas", "thomas"]));

        let deleted = handled(
            &router,
            &RequestParts::new(Method::DELETE, "/deletedata?username=thomas"),
        );
        assert_eq!(deleted["list_of"], json!(["thomas"]));
        assert_eq!(list_len(&router, "thomas"), before);
    }

    #[test]
    fn test_post_data_appends_from_query() {
        let router = router();
        let value = handled(&router, &RequestParts::new(Method::POST, "/postdata?username=amy"));
        assert_eq!(value, json!({"data": "amy", "list_of": ["amy"]}));

        let errors = invalid(&router, &RequestParts::new(Method::POST, "/postdata"));
        assert_eq!(errors, vec![missing(Location::Query, "username")]);
    }

    #[test]
    fn test_delete_absent_username_is_not_found() {
        let router = router();
        let outcome = router.dispatch(&RequestParts::new(
            Method::DELETE,
            "/deletedata?username=ghost",
        ));
        assert_eq!(
            outcome,
            Dispatch::Failed(HandlerError::NotFound("ghost not found in list".to_string()))
        );
        assert_eq!(outcome.status(), StatusCode::NOT_FOUND);
        assert!(router.state().usernames.is_empty());
    }

    #[test]
    fn test_homedata_answers_four_methods_without_mutating() {
        let router = router();
        router.state().usernames.append("amy");
        for method in [Method::GET, Method::POST, Method::PUT, Method::DELETE] {
            let value = handled(&router, &RequestParts::new(method, "/homedata?username=bob"));
            assert_eq!(value, json!({"data": "bob", "list_of": ["amy"]}));
        }
        assert_eq!(
            router.dispatch(&RequestParts::new(Method::PATCH, "/homedata?username=bob")),
            Dispatch::MethodNotAllowed(vec![Method::GET, Method::POST, Method::PUT, Method::DELETE])
        );
    }

    #[test]
    fn test_unknown_route_is_not_found() {
        let router = router();
        assert_eq!(
            router.dispatch(&RequestParts::new(Method::GET, "/nothing/here")),
            Dispatch::NotFound
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_puts_are_all_observed() {
        let router = std::sync::Arc::new(router());
        let tasks: Vec<_> = (0..32)
            .map(|i| {
                let router = std::sync::Arc::clone(&router);
                tokio::spawn(async move {
                    let req = RequestParts::new(Method::PUT, &format!("/putdata/client{i}"));
                    router.dispatch(&req).status()
                })
            })
            .collect();
        for task in tasks {
            assert_eq!(task.await.unwrap(), StatusCode::OK);
        }

        let snapshot = router.state().usernames.snapshot();
        assert_eq!(snapshot.len(), 32);
        for i in 0..32 {
            assert!(snapshot.contains(&format!("client{i}")));
        }
    }
}
