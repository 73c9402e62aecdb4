// Copyright 2025 the burrow developers.
//
// Licensed under the Apache License, Version 2.0 (the "License"); you
// may not use this file except in compliance with the License. You may
// obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or
// implied. See the License for the specific language governing
// permissions and limitations under the License.

//! The DNS-over-HTTPS JSON adapter.
//!
//! One route, `GET /dns-query`, in the JSON style of the public DoH
//! resolvers: `name` and optional `type` query parameters in, a JSON
//! rendering of the resolved message out. Requests must declare an
//! `Accept` header in the `application/dns*` family. The route answers
//! 405 to other methods, 415 to other `Accept` values, and 422 to
//! missing or unknown names and types.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use super::Server;
use crate::class::Class;
use crate::message::{Message, Question};
use crate::name::Name;
use crate::resolver::Upstream;
use crate::rr::{Record, Type};

/// Builds the HTTP router around a shared [`Server`].
pub fn router<U>(server: Arc<Server<U>>) -> Router
where
    U: Upstream + 'static,
{
    Router::new()
        .route("/dns-query", get(dns_query::<U>))
        .with_state(server)
}

////////////////////////////////////////////////////////////////////////
// THE /dns-query HANDLER                                             //
////////////////////////////////////////////////////////////////////////

#[derive(Debug, Deserialize)]
struct DnsQueryParams {
    name: Option<String>,
    #[serde(rename = "type")]
    rr_type: Option<String>,
}

async fn dns_query<U>(
    State(server): State<Arc<Server<U>>>,
    headers: HeaderMap,
    Query(params): Query<DnsQueryParams>,
) -> Response
where
    U: Upstream + 'static,
{
    let accepted = headers
        .get(header::ACCEPT)
        .and_then(|value| value.to_str().ok())
        .map_or(false, |value| value.starts_with("application/dns"));
    if !accepted {
        return StatusCode::UNSUPPORTED_MEDIA_TYPE.into_response();
    }

    let mut name = match params.name {
        Some(name) if !name.is_empty() => name,
        _ => return StatusCode::UNPROCESSABLE_ENTITY.into_response(),
    };
    if !name.ends_with('.') {
        name.push('.');
    }
    let rr_type = match params.rr_type.as_deref() {
        None | Some("") => Type::A,
        Some(text) => match text.parse::<Type>() {
            Ok(rr_type) => rr_type,
            Err(_) => return StatusCode::UNPROCESSABLE_ENTITY.into_response(),
        },
    };

    let mut request = Message::new();
    request.header.set_rd(true);
    request.questions.push(Question {
        name: Name::new(&name),
        rr_type,
        class: Class::IN,
    });

    let reply = server.handle_message(request).await;
    Json(DnsJson::from(&reply)).into_response()
}

////////////////////////////////////////////////////////////////////////
// THE JSON RENDERING                                                 //
////////////////////////////////////////////////////////////////////////

/// The JSON body of a successful response. Empty record sections are
/// omitted entirely rather than serialized as empty arrays.
#[derive(Debug, Serialize)]
struct DnsJson {
    #[serde(rename = "Status")]
    status: u8,
    #[serde(rename = "TC")]
    tc: bool,
    #[serde(rename = "RD")]
    rd: bool,
    #[serde(rename = "RA")]
    ra: bool,
    #[serde(rename = "Question")]
    question: Vec<QuestionJson>,
    #[serde(rename = "Answer", skip_serializing_if = "Option::is_none")]
    answer: Option<Vec<RecordJson>>,
    #[serde(rename = "Authority", skip_serializing_if = "Option::is_none")]
    authority: Option<Vec<RecordJson>>,
    #[serde(rename = "Additional", skip_serializing_if = "Option::is_none")]
    additional: Option<Vec<RecordJson>>,
}

#[derive(Debug, Serialize)]
struct QuestionJson {
    name: String,
    #[serde(rename = "type")]
    rr_type: u16,
}

#[derive(Debug, Serialize)]
struct RecordJson {
    name: String,
    #[serde(rename = "type")]
    rr_type: u16,
    #[serde(rename = "TTL")]
    ttl: i32,
    data: String,
}

impl From<&Message> for DnsJson {
    fn from(message: &Message) -> Self {
        Self {
            status: message.header.rcode(),
            tc: message.header.tc(),
            rd: message.header.rd(),
            ra: message.header.ra(),
            question: message
                .questions
                .iter()
                .map(|question| QuestionJson {
                    name: question.name.as_str().to_owned(),
                    rr_type: question.rr_type.into(),
                })
                .collect(),
            answer: render_section(&message.answers),
            authority: render_section(&message.authority),
            additional: render_section(&message.additional),
        }
    }
}

fn render_section(records: &[Record]) -> Option<Vec<RecordJson>> {
    if records.is_empty() {
        return None;
    }
    Some(
        records
            .iter()
            .map(|record| RecordJson {
                name: record.name.as_str().to_owned(),
                rr_type: record.rr_type().into(),
                ttl: record.ttl,
                data: record.rdata.to_string(),
            })
            .collect(),
    )
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use super::*;
    use crate::server::testing::FailingUpstream;
    use crate::zone::Root;

    const SEED: &str = "\
. 86400 IN SOA a.root-servers.net. nstld.example. 1 1800 900 604800 86400
com. 172800 IN NS a.gtld-servers.net.
a.gtld-servers.net. 172800 IN A 192.5.6.30
";

    fn test_router() -> Router {
        let root = Arc::new(Root::from_reader(Cursor::new(SEED)).unwrap());
        router(Arc::new(Server::new(root, FailingUpstream)))
    }

    fn dns_get(uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header(header::ACCEPT, "application/dns-json")
            .body(Body::empty())
            .unwrap()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn answers_a_referral_query_as_json() {
        let response = test_router()
            .oneshot(dns_get("/dns-query?name=com&type=NS"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["Status"], 0);
        assert_eq!(json["RD"], true);
        assert_eq!(json["RA"], true);
        // The trailing dot was appended before resolution.
        assert_eq!(json["Question"][0]["name"], "com.");
        assert_eq!(json["Question"][0]["type"], 2);
        assert_eq!(json["Authority"][0]["data"], "a.gtld-servers.net.");
        assert_eq!(json["Additional"][0]["data"], "192.5.6.30");
        // Empty sections are omitted, not empty arrays.
        assert!(json.get("Answer").is_none());
    }

    #[tokio::test]
    async fn the_type_parameter_defaults_to_a() {
        let response = test_router()
            .oneshot(dns_get("/dns-query?name=com"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["Question"][0]["type"], 1);
    }

    #[tokio::test]
    async fn an_unknown_type_symbol_is_unprocessable() {
        let response = test_router()
            .oneshot(dns_get("/dns-query?name=com&type=TXT"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn a_missing_name_is_unprocessable() {
        let response = test_router().oneshot(dns_get("/dns-query")).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn a_missing_or_foreign_accept_header_is_unsupported() {
        let bare = Request::builder()
            .uri("/dns-query?name=com")
            .body(Body::empty())
            .unwrap();
        let response = test_router().oneshot(bare).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);

        let html = Request::builder()
            .uri("/dns-query?name=com")
            .header(header::ACCEPT, "text/html")
            .body(Body::empty())
            .unwrap();
        let response = test_router().oneshot(html).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }

    #[tokio::test]
    async fn non_get_methods_are_not_allowed() {
        let request = Request::builder()
            .method("POST")
            .uri("/dns-query?name=com")
            .header(header::ACCEPT, "application/dns-json")
            .body(Body::empty())
            .unwrap();
        let response = test_router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
