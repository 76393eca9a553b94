//! Route map for Rocket applications.
//!
//! Lists every registered route as `{uri, methods, endpoint}` and can mount
//! `map.json` / `map.html` endpoints that render the live route table.

mod html;

use log::{debug, error};
use rocket::http::Status;
use rocket::request::{self, FromRequest, Request};
use rocket::response::content::RawHtml;
use rocket::serde::json::Json;
use rocket::{Build, Rocket, Route, get, routes};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::convert::Infallible;

/// Endpoint label used for routes without a name.
pub const UNNAMED_ENDPOINT: &str = "<unnamed>";

/// One entry of the route map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteEntry {
    pub uri: String,
    /// HTTP methods, sorted and deduplicated.
    pub methods: Vec<String>,
    pub endpoint: String,
}

/// Build the route map from a Rocket route table.
///
/// Routes sharing a URI collapse into one entry; their methods are merged
/// and their handler names sorted and joined with `", "`. Entries are
/// sorted by URI.
pub fn routing_list<'a, I>(routes: I) -> Vec<RouteEntry>
where
    I: IntoIterator<Item = &'a Route>,
{
    group_routes(routes.into_iter().map(|route| {
        (
            route.uri.to_string(),
            route.method.as_str().to_string(),
            route
                .name
                .as_deref()
                .unwrap_or(UNNAMED_ENDPOINT)
                .to_string(),
        )
    }))
}

/// Group `(uri, method, endpoint)` rows into sorted route entries.
pub fn group_routes<I>(rows: I) -> Vec<RouteEntry>
where
    I: IntoIterator<Item = (String, String, String)>,
{
    let mut grouped: BTreeMap<String, (BTreeSet<String>, BTreeSet<String>)> = BTreeMap::new();
    for (uri, method, endpoint) in rows {
        let (methods, endpoints) = grouped.entry(uri).or_default();
        methods.insert(method);
        endpoints.insert(endpoint);
    }
    grouped
        .into_iter()
        .map(|(uri, (methods, endpoints))| RouteEntry {
            uri,
            methods: methods.into_iter().collect(),
            endpoint: endpoints.into_iter().collect::<Vec<_>>().join(", "),
        })
        .collect()
}

/// Mount `{base}/map.html` and `{base}/map.json` on the application.
pub fn add_routing_map(rocket: Rocket<Build>, base: &str) -> Rocket<Build> {
    debug!("mounting routing map (base={base})");
    rocket.mount(base, routes![routing_map_html, routing_map_json])
}

/// Request guard yielding the route map of the running application.
pub struct RouteTable(pub Vec<RouteEntry>);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for RouteTable {
    type Error = Infallible;

    async fn from_request(request: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        request::Outcome::Success(RouteTable(routing_list(request.rocket().routes())))
    }
}

#[get("/map.json")]
fn routing_map_json(table: RouteTable) -> Json<Vec<RouteEntry>> {
    Json(table.0)
}

#[get("/map.html")]
fn routing_map_html(table: RouteTable) -> Result<RawHtml<String>, Status> {
    html::render(&table.0).map(RawHtml).map_err(|err| {
        error!("failed to render routing map: {err}");
        Status::InternalServerError
    })
}
