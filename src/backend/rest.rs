use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{AuthSession, AuthUser, BackendError, MarketBackend, SignUpOutcome, SignUpRequest};
use crate::models::*;

/// Listing projection: professional columns plus embedded profile,
/// review ratings and projects.
pub const LISTING_SELECT: &str = "*,\
profile:profiles(first_name,last_name,avatar_url,location,bio,phone),\
avg_rating:reviews(rating),\
projects(id,professional_id,title,description,image_url,is_featured,completion_date)";

/// Booking projection with the client's contact summary embedded.
pub const BOOKING_SELECT: &str = "*,client:client_id(first_name,last_name,location,phone)";

/// Managed backend client: PostgREST tables under `/rest/v1`, auth under `/auth/v1`.
pub struct RestBackend {
    base_url: String,
    anon_key: String,
    client: Client,
    timeout_secs: u64,
}

impl RestBackend {
    pub fn new(base_url: &str, anon_key: &str, timeout: Duration) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::Http(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
            client,
            timeout_secs: timeout.as_secs(),
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.base_url)
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{path}", self.base_url)
    }

    /// Request carrying the project key, authorized as the user when a
    /// token is given and as the anonymous role otherwise.
    fn request(&self, method: Method, url: &str, auth: Option<&str>) -> RequestBuilder {
        let bearer = auth.unwrap_or(&self.anon_key);
        self.client
            .request(method, url)
            .header("apikey", &self.anon_key)
            .bearer_auth(bearer)
    }

    fn send(&self, builder: RequestBuilder) -> Result<Response, BackendError> {
        let response = builder.send().map_err(|e| {
            if e.is_connect() {
                BackendError::Connection(self.base_url.clone())
            } else if e.is_timeout() {
                BackendError::Http(format!("Request timed out after {}s", self.timeout_secs))
            } else {
                BackendError::Http(e.to_string())
            }
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().unwrap_or_default();
        tracing::warn!(status = status.as_u16(), body = %body, "Backend request failed");
        match status.as_u16() {
            401 | 403 => Err(BackendError::Unauthorized),
            code => Err(BackendError::Status { status: code, body }),
        }
    }

    fn fetch<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, BackendError> {
        self.send(builder)?
            .json()
            .map_err(|e| BackendError::ResponseParsing(e.to_string()))
    }

    /// Fetch at most one row of a filtered select.
    fn fetch_one<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
    ) -> Result<Option<T>, BackendError> {
        let rows: Vec<T> = self.fetch(builder.query(&[("limit", "1")]))?;
        Ok(rows.into_iter().next())
    }

    /// Write returning the stored row (`Prefer: return=representation`).
    fn write_returning<B, T>(
        &self,
        method: Method,
        url: &str,
        auth: &str,
        query: &[(&str, String)],
        body: &B,
        entity: &'static str,
    ) -> Result<T, BackendError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let builder = self
            .request(method, url, Some(auth))
            .header("Prefer", "return=representation")
            .query(query)
            .json(body);
        let rows: Vec<T> = self.fetch(builder)?;
        rows.into_iter().next().ok_or_else(|| BackendError::NotFound {
            entity,
            id: query
                .iter()
                .find(|(k, _)| *k == "id")
                .map(|(_, v)| v.trim_start_matches("eq.").to_string())
                .unwrap_or_default(),
        })
    }
}

fn eq(value: impl std::fmt::Display) -> String {
    format!("eq.{value}")
}

/// Parse the total out of a `Content-Range` header (`0-19/134` or `*/134`).
pub fn parse_content_range_total(headers: &HeaderMap) -> Option<u64> {
    headers
        .get("content-range")
        .and_then(|v: &HeaderValue| v.to_str().ok())
        .and_then(|v| v.rsplit('/').next())
        .and_then(|total| total.parse().ok())
}

#[derive(Serialize)]
struct PasswordGrant<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct RefreshGrant<'a> {
    refresh_token: &'a str,
}

#[derive(Serialize)]
struct SignUpBody<'a> {
    email: &'a str,
    password: &'a str,
    data: SignUpMetadata<'a>,
}

#[derive(Serialize)]
struct SignUpMetadata<'a> {
    first_name: &'a str,
    last_name: &'a str,
    phone: Option<&'a str>,
    is_professional: bool,
}

/// `/signup` answers with a session when confirmation is off, and with the
/// bare user otherwise.
#[derive(Deserialize)]
#[serde(untagged)]
enum SignUpResponse {
    Session(AuthSession),
    User(AuthUser),
}

#[derive(Serialize)]
struct StatusPatch {
    status: BookingStatus,
}

impl MarketBackend for RestBackend {
    fn kind(&self) -> &'static str {
        "remote"
    }

    fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, BackendError> {
        let builder = self
            .request(Method::POST, &self.auth_url("token"), None)
            .query(&[("grant_type", "password")])
            .json(&PasswordGrant { email, password });

        match self.fetch(builder) {
            Err(BackendError::Status { status: 400, .. }) => Err(BackendError::InvalidCredentials),
            other => other,
        }
    }

    fn sign_up(&self, request: &SignUpRequest) -> Result<SignUpOutcome, BackendError> {
        let body = SignUpBody {
            email: &request.email,
            password: &request.password,
            data: SignUpMetadata {
                first_name: &request.first_name,
                last_name: &request.last_name,
                phone: request.phone.as_deref().filter(|p| !p.trim().is_empty()),
                is_professional: request.is_professional,
            },
        };
        let builder = self
            .request(Method::POST, &self.auth_url("signup"), None)
            .json(&body);

        match self.fetch::<SignUpResponse>(builder) {
            Ok(SignUpResponse::Session(session)) => Ok(SignUpOutcome {
                user: session.user.clone(),
                session: Some(session),
            }),
            Ok(SignUpResponse::User(user)) => Ok(SignUpOutcome {
                user,
                session: None,
            }),
            Err(BackendError::Status { status, body })
                if (status == 400 || status == 422) && body.contains("already") =>
            {
                Err(BackendError::AccountExists(request.email.clone()))
            }
            Err(e) => Err(e),
        }
    }

    /// A used, revoked or unknown refresh token comes back as 400
    /// `invalid_grant`, which ends the session.
    fn refresh_session(&self, refresh_token: &str) -> Result<AuthSession, BackendError> {
        let builder = self
            .request(Method::POST, &self.auth_url("token"), None)
            .query(&[("grant_type", "refresh_token")])
            .json(&RefreshGrant { refresh_token });

        match self.fetch(builder) {
            Err(BackendError::Status { status: 400, .. }) => Err(BackendError::Unauthorized),
            other => other,
        }
    }

    fn sign_out(&self, auth: &str) -> Result<(), BackendError> {
        self.send(self.request(Method::POST, &self.auth_url("logout"), Some(auth)))?;
        Ok(())
    }

    fn list_professionals(
        &self,
        query: &ProfessionalQuery,
    ) -> Result<Vec<ProfessionalRow>, BackendError> {
        let mut params: Vec<(&str, String)> = vec![
            ("select", LISTING_SELECT.to_string()),
            ("order", "years_experience.desc.nullsfirst".to_string()),
            ("limit", query.limit.to_string()),
            ("offset", query.offset.to_string()),
        ];
        if let Some(ref category) = query.category {
            params.push(("category", eq(category)));
        }
        if let Some(id) = query.id {
            params.push(("id", eq(id)));
        }

        let builder = self
            .request(Method::GET, &self.table_url("professionals"), None)
            .query(&params);
        self.fetch(builder)
    }

    fn count_professionals(&self) -> Result<u64, BackendError> {
        let builder = self
            .request(Method::HEAD, &self.table_url("professionals"), None)
            .header("Prefer", "count=exact")
            .query(&[("select", "*")]);
        let response = self.send(builder)?;
        parse_content_range_total(response.headers()).ok_or_else(|| {
            BackendError::ResponseParsing("missing or malformed Content-Range".into())
        })
    }

    fn get_professional(&self, id: &Uuid) -> Result<Option<Professional>, BackendError> {
        let builder = self
            .request(Method::GET, &self.table_url("professionals"), None)
            .query(&[("select", "*".to_string()), ("id", eq(id))]);
        self.fetch_one(builder)
    }

    fn list_services(&self, professional_id: &Uuid) -> Result<Vec<Service>, BackendError> {
        let builder = self
            .request(Method::GET, &self.table_url("services"), None)
            .query(&[
                ("select", "*".to_string()),
                ("professional_id", eq(professional_id)),
                ("order", "created_at.desc".to_string()),
            ]);
        self.fetch(builder)
    }

    fn get_service(&self, id: &Uuid) -> Result<Option<Service>, BackendError> {
        let builder = self
            .request(Method::GET, &self.table_url("services"), None)
            .query(&[("select", "*".to_string()), ("id", eq(id))]);
        self.fetch_one(builder)
    }

    fn list_reviews(&self, professional_id: &Uuid) -> Result<Vec<Review>, BackendError> {
        let builder = self
            .request(Method::GET, &self.table_url("reviews"), None)
            .query(&[
                ("select", "*".to_string()),
                ("professional_id", eq(professional_id)),
                ("order", "created_at.desc".to_string()),
            ]);
        self.fetch(builder)
    }

    fn get_profile(&self, auth: &str, id: &Uuid) -> Result<Option<Profile>, BackendError> {
        let builder = self
            .request(Method::GET, &self.table_url("profiles"), Some(auth))
            .query(&[("select", "*".to_string()), ("id", eq(id))]);
        self.fetch_one(builder)
    }

    fn update_profile(
        &self,
        auth: &str,
        id: &Uuid,
        update: &ProfileUpdate,
    ) -> Result<Profile, BackendError> {
        self.write_returning(
            Method::PATCH,
            &self.table_url("profiles"),
            auth,
            &[("id", eq(id))],
            update,
            "Profile",
        )
    }

    fn upsert_professional(
        &self,
        auth: &str,
        professional: &Professional,
    ) -> Result<Professional, BackendError> {
        if self.get_professional(&professional.id)?.is_some() {
            #[derive(Serialize)]
            struct Editable<'a> {
                category: &'a str,
                hourly_rate: Option<f64>,
                years_experience: Option<i32>,
                availability: Option<&'a str>,
                specialties: &'a [String],
                emergency_available: bool,
                daily_pay_available: bool,
            }
            let patch = Editable {
                category: &professional.category,
                hourly_rate: professional.hourly_rate,
                years_experience: professional.years_experience,
                availability: professional.availability.as_deref(),
                specialties: &professional.specialties,
                emergency_available: professional.emergency_available,
                daily_pay_available: professional.daily_pay_available,
            };
            self.write_returning(
                Method::PATCH,
                &self.table_url("professionals"),
                auth,
                &[("id", eq(professional.id))],
                &patch,
                "Professional",
            )
        } else {
            self.write_returning(
                Method::POST,
                &self.table_url("professionals"),
                auth,
                &[],
                professional,
                "Professional",
            )
        }
    }

    fn insert_service(&self, auth: &str, service: &NewService) -> Result<Service, BackendError> {
        self.write_returning(
            Method::POST,
            &self.table_url("services"),
            auth,
            &[],
            service,
            "Service",
        )
    }

    fn list_bookings(&self, auth: &str, scope: BookingScope) -> Result<Vec<Booking>, BackendError> {
        let (column, id) = match scope {
            BookingScope::Professional(id) => ("professional_id", id),
            BookingScope::Client(id) => ("client_id", id),
        };
        let builder = self
            .request(Method::GET, &self.table_url("bookings"), Some(auth))
            .query(&[
                ("select", BOOKING_SELECT.to_string()),
                (column, eq(id)),
                ("order", "booking_date.desc".to_string()),
            ]);
        self.fetch(builder)
    }

    fn get_booking(&self, auth: &str, id: &Uuid) -> Result<Option<Booking>, BackendError> {
        let builder = self
            .request(Method::GET, &self.table_url("bookings"), Some(auth))
            .query(&[("select", BOOKING_SELECT.to_string()), ("id", eq(id))]);
        self.fetch_one(builder)
    }

    fn insert_booking(&self, auth: &str, booking: &NewBooking) -> Result<Booking, BackendError> {
        self.write_returning(
            Method::POST,
            &self.table_url("bookings"),
            auth,
            &[],
            booking,
            "Booking",
        )
    }

    fn update_booking_status(
        &self,
        auth: &str,
        id: &Uuid,
        status: BookingStatus,
    ) -> Result<Booking, BackendError> {
        self.write_returning(
            Method::PATCH,
            &self.table_url("bookings"),
            auth,
            &[("id", eq(id)), ("select", BOOKING_SELECT.to_string())],
            &StatusPatch { status },
            "Booking",
        )
    }

    fn insert_emergency(
        &self,
        auth: &str,
        sos: &NewEmergencySos,
    ) -> Result<EmergencySos, BackendError> {
        self.write_returning(
            Method::POST,
            &self.table_url("emergency_sos"),
            auth,
            &[],
            sos,
            "EmergencySOS",
        )
    }

    fn list_emergencies(
        &self,
        auth: &str,
        client_id: &Uuid,
    ) -> Result<Vec<EmergencySos>, BackendError> {
        let builder = self
            .request(Method::GET, &self.table_url("emergency_sos"), Some(auth))
            .query(&[
                ("select", "*".to_string()),
                ("client_id", eq(client_id)),
                ("order", "created_at.desc".to_string()),
            ]);
        self.fetch(builder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use axum::body::Body;
    use axum::extract::State;
    use axum::http::{Request, StatusCode};
    use axum::response::{IntoResponse, Response as AxumResponse};
    use axum::Router;

    #[derive(Debug, Clone)]
    struct Recorded {
        method: String,
        path: String,
        query: String,
        apikey: Option<String>,
        authorization: Option<String>,
        prefer: Option<String>,
        body: String,
    }

    type Log = Arc<Mutex<Vec<Recorded>>>;

    const PRO_ID: &str = "6f1c2f7a-2a55-4a1e-9a53-0c1f4d3c8b11";
    const USER_ID: &str = "0b6f7bde-7b8b-4d7e-a2a4-3fd1f1b0e003";

    fn header(req: &Request<Body>, name: &str) -> Option<String> {
        req.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(String::from)
    }

    async fn mock(State(log): State<Log>, req: Request<Body>) -> AxumResponse {
        let method = req.method().to_string();
        let path = req.uri().path().to_string();
        let query = req.uri().query().unwrap_or_default().to_string();
        let apikey = header(&req, "apikey");
        let authorization = header(&req, "authorization");
        let prefer = header(&req, "prefer");
        let bytes = axum::body::to_bytes(req.into_body(), 1 << 20).await.unwrap();
        let body = String::from_utf8_lossy(&bytes).to_string();

        log.lock().unwrap().push(Recorded {
            method: method.clone(),
            path: path.clone(),
            query: query.clone(),
            apikey,
            authorization,
            prefer,
            body: body.clone(),
        });

        match (method.as_str(), path.as_str()) {
            ("HEAD", "/rest/v1/professionals") => (
                StatusCode::OK,
                [("content-range", "0-24/134")],
                "",
            )
                .into_response(),
            ("GET", "/rest/v1/professionals") => (
                StatusCode::OK,
                [("content-type", "application/json")],
                format!(
                    r#"[{{"id":"{PRO_ID}","category":"plumbing","hourly_rate":75,
                    "years_experience":15,"availability":"Available now",
                    "verification_badge":true,"specialties":["Repairs"],
                    "emergency_available":null,"daily_pay_available":false,
                    "profile":{{"first_name":"Alex","last_name":"Rivera","avatar_url":null,
                    "location":"Denver, CO","bio":null,"phone":null}},
                    "avg_rating":[{{"rating":5}},{{"rating":4}}],"projects":[]}}]"#
                ),
            )
                .into_response(),
            ("POST", "/auth/v1/token") if query.contains("refresh_token") && body.contains("used") => (
                StatusCode::BAD_REQUEST,
                r#"{"error":"invalid_grant","error_description":"Invalid Refresh Token: Already Used"}"#,
            )
                .into_response(),
            ("POST", "/auth/v1/token") if body.contains("wrong") => (
                StatusCode::BAD_REQUEST,
                r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#,
            )
                .into_response(),
            ("POST", "/auth/v1/token") => (
                StatusCode::OK,
                [("content-type", "application/json")],
                format!(
                    r#"{{"access_token":"user-jwt","token_type":"bearer","expires_in":3600,
                    "refresh_token":"r","user":{{"id":"{USER_ID}","email":"m@example.com"}}}}"#
                ),
            )
                .into_response(),
            ("POST", "/auth/v1/signup") => (
                StatusCode::OK,
                [("content-type", "application/json")],
                format!(r#"{{"id":"{USER_ID}","email":"new@example.com"}}"#),
            )
                .into_response(),
            ("PATCH", "/rest/v1/bookings") => (
                StatusCode::OK,
                [("content-type", "application/json")],
                format!(
                    r#"[{{"id":"0b6f7bde-7b8b-4d7e-a2a4-3fd1f1b0e001","professional_id":"{PRO_ID}",
                    "client_id":"{USER_ID}","service_id":"0b6f7bde-7b8b-4d7e-a2a4-3fd1f1b0e004",
                    "booking_date":"2026-11-02T15:00:00+00:00","status":"confirmed",
                    "created_at":"2026-10-01T09:30:00+00:00","client":null}}]"#
                ),
            )
                .into_response(),
            ("PATCH", "/rest/v1/professionals") => (
                StatusCode::OK,
                [("content-type", "application/json")],
                format!(
                    r#"[{{"id":"{PRO_ID}","category":"roofing","hourly_rate":80,
                    "years_experience":16,"availability":"Weekends",
                    "verification_badge":true,"specialties":["Repairs"],
                    "emergency_available":true,"daily_pay_available":false}}]"#
                ),
            )
                .into_response(),
            ("GET", "/rest/v1/services") => (
                StatusCode::UNAUTHORIZED,
                r#"{"message":"JWT expired"}"#,
            )
                .into_response(),
            _ => (StatusCode::NOT_FOUND, "").into_response(),
        }
    }

    /// Start the mock backend and run `f` against a client pointed at it.
    async fn with_backend<T, F>(f: F) -> (T, Vec<Recorded>)
    where
        F: FnOnce(RestBackend) -> T + Send + 'static,
        T: Send + 'static,
    {
        let log: Log = Arc::new(Mutex::new(Vec::new()));
        let app = Router::new().fallback(mock).with_state(log.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let url = format!("http://{addr}/");
        let result = tokio::task::spawn_blocking(move || {
            let backend = RestBackend::new(&url, "anon-key", Duration::from_secs(5)).unwrap();
            f(backend)
        })
        .await
        .unwrap();

        server.abort();
        let recorded = log.lock().unwrap().clone();
        (result, recorded)
    }

    #[test]
    fn content_range_total_is_parsed() {
        let mut headers = HeaderMap::new();
        headers.insert("content-range", HeaderValue::from_static("*/134"));
        assert_eq!(parse_content_range_total(&headers), Some(134));
        headers.insert("content-range", HeaderValue::from_static("0-9/*"));
        assert_eq!(parse_content_range_total(&headers), None);
        assert_eq!(parse_content_range_total(&HeaderMap::new()), None);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn listing_query_is_shaped_for_postgrest() {
        let (rows, log) = with_backend(|b| {
            b.list_professionals(&ProfessionalQuery::by_category("plumbing", 20, 40))
        })
        .await;

        let rows = rows.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].ratings.len(), 2);
        assert!(!rows[0].professional.emergency_available);

        let req = &log[0];
        assert_eq!(req.method, "GET");
        assert_eq!(req.path, "/rest/v1/professionals");
        assert!(req.query.contains("category=eq.plumbing"));
        assert!(req.query.contains("order=years_experience.desc.nullsfirst"));
        assert!(req.query.contains("limit=20"));
        assert!(req.query.contains("offset=40"));
        assert!(req.query.contains("avg_rating%3Areviews%28rating%29"));
        assert_eq!(req.apikey.as_deref(), Some("anon-key"));
        assert_eq!(req.authorization.as_deref(), Some("Bearer anon-key"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn count_reads_content_range() {
        let (count, log) = with_backend(|b| b.count_professionals()).await;
        assert_eq!(count.unwrap(), 134);
        assert_eq!(log[0].method, "HEAD");
        assert_eq!(log[0].prefer.as_deref(), Some("count=exact"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn sign_in_maps_bad_request_to_invalid_credentials() {
        let (results, log) = with_backend(|b| {
            (
                b.sign_in("m@example.com", "password123"),
                b.sign_in("m@example.com", "wrong"),
            )
        })
        .await;

        let session = results.0.unwrap();
        assert_eq!(session.access_token, "user-jwt");
        assert_eq!(session.user.id.to_string(), USER_ID);
        assert!(matches!(results.1, Err(BackendError::InvalidCredentials)));
        assert_eq!(log[0].query, "grant_type=password");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn refresh_uses_refresh_grant_and_rejects_used_tokens() {
        let (results, log) = with_backend(|b| {
            (b.refresh_session("fresh-refresh"), b.refresh_session("used-refresh"))
        })
        .await;

        let session = results.0.unwrap();
        assert_eq!(session.access_token, "user-jwt");
        assert_eq!(session.refresh_token.as_deref(), Some("r"));
        assert_eq!(session.expires_in, Some(3600));
        assert!(matches!(results.1, Err(BackendError::Unauthorized)));

        assert_eq!(log[0].query, "grant_type=refresh_token");
        assert_eq!(log[0].authorization.as_deref(), Some("Bearer anon-key"));
        let body: serde_json::Value = serde_json::from_str(&log[0].body).unwrap();
        assert_eq!(body["refresh_token"], "fresh-refresh");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn professional_update_leaves_badge_out_of_patch() {
        let id: Uuid = PRO_ID.parse().unwrap();
        let mut edited = Professional::onboarding(id);
        edited.category = "roofing".into();
        edited.years_experience = Some(16);
        let (stored, log) = with_backend(move |b| b.upsert_professional("user-jwt", &edited)).await;

        assert!(stored.unwrap().verification_badge);
        assert_eq!(log[0].method, "GET");
        let patch = &log[1];
        assert_eq!(patch.method, "PATCH");
        assert_eq!(patch.path, "/rest/v1/professionals");
        assert!(patch.query.contains(&format!("id=eq.{PRO_ID}")));
        assert_eq!(patch.authorization.as_deref(), Some("Bearer user-jwt"));

        let body: serde_json::Value = serde_json::from_str(&patch.body).unwrap();
        assert_eq!(body["category"], "roofing");
        assert!(body.get("verification_badge").is_none());
        assert!(body.get("id").is_none());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn sign_up_without_session_returns_user_only() {
        let request = SignUpRequest {
            email: "new@example.com".into(),
            password: "secret1".into(),
            first_name: "New".into(),
            last_name: "User".into(),
            phone: None,
            is_professional: true,
        };
        let (outcome, log) = with_backend(move |b| b.sign_up(&request)).await;

        let outcome = outcome.unwrap();
        assert!(outcome.session.is_none());
        assert_eq!(outcome.user.email.as_deref(), Some("new@example.com"));

        let body: serde_json::Value = serde_json::from_str(&log[0].body).unwrap();
        assert_eq!(body["data"]["first_name"], "New");
        assert_eq!(body["data"]["is_professional"], true);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn status_update_patches_with_user_token() {
        let id: Uuid = "0b6f7bde-7b8b-4d7e-a2a4-3fd1f1b0e001".parse().unwrap();
        let (booking, log) = with_backend(move |b| {
            b.update_booking_status("user-jwt", &id, BookingStatus::Confirmed)
        })
        .await;

        assert_eq!(booking.unwrap().status, BookingStatus::Confirmed);
        let req = &log[0];
        assert_eq!(req.method, "PATCH");
        assert!(req.query.contains(&format!("id=eq.{id}")));
        assert_eq!(req.authorization.as_deref(), Some("Bearer user-jwt"));
        assert_eq!(req.prefer.as_deref(), Some("return=representation"));
        assert_eq!(req.body, r#"{"status":"confirmed"}"#);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn unauthorized_status_maps_to_unauthorized() {
        let id = Uuid::new_v4();
        let (result, _) = with_backend(move |b| b.list_services(&id)).await;
        assert!(matches!(result, Err(BackendError::Unauthorized)));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn unreachable_backend_is_connection_error() {
        let result = tokio::task::spawn_blocking(|| {
            let backend =
                RestBackend::new("http://127.0.0.1:9", "anon", Duration::from_secs(2)).unwrap();
            backend.count_professionals()
        })
        .await
        .unwrap();
        assert!(matches!(result, Err(BackendError::Connection(_))));
    }
}
