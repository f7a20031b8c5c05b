//! The scenario driver.
//!
//! [`Driver`] owns everything a run accumulates: the session table, the
//! resource ledger and the reporter. Scenario procedures live in [`admin`]
//! and [`student`]; each one is a fixed script of requests that checks its
//! ledger prerequisites first and skips with a warning when they are missing.
mod admin;
mod student;

use std::sync::Arc;

use anyhow::{Result, anyhow};
use reqwest::Method;
use serde_json::{Map, Value, json};

use crate::client::{ApiClient, ClientError};
use crate::config::ProbeConfig;
use crate::ledger::{Ledger, ResourceKind};
use crate::report::{Event, Reporter, Severity, dispatch};
use crate::session::{Credential, Role, Sessions, StudentProfile};

/// Result of a single authenticated request.
///
/// `success` is true only when the status matched the expected one. The body
/// is kept on a mismatch; it is an empty object when nothing could be parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub success: bool,
    pub status: Option<u16>,
    pub body: Value,
    pub error: Option<String>,
}

impl ApiResponse {
    fn failed(error: String) -> Self {
        Self {
            success: false,
            status: None,
            body: Value::Object(Map::new()),
            error: Some(error),
        }
    }
}

/// Counts and flags printed after a run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub base_url: String,
    pub classes: usize,
    pub subjects: usize,
    pub assessments: usize,
    pub students: usize,
    pub class_subjects: usize,
    pub admin_token: bool,
    pub student_token: bool,
    /// Error that stopped the sequence early, if any.
    pub aborted: Option<String>,
}

pub struct Driver {
    client: ApiClient,
    config: ProbeConfig,
    sessions: Sessions,
    ledger: Ledger,
    reporter: Arc<dyn Reporter>,
}

impl Driver {
    pub fn new(config: ProbeConfig, reporter: Arc<dyn Reporter>) -> Result<Self> {
        let client = ApiClient::new(&config.base_url, config.timeout())?;
        Ok(Self {
            client,
            config,
            sessions: Sessions::default(),
            ledger: Ledger::default(),
            reporter,
        })
    }

    pub fn sessions(&self) -> &Sessions {
        &self.sessions
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut Ledger {
        &mut self.ledger
    }

    pub(crate) fn log(&self, severity: Severity, message: impl Into<String>) {
        dispatch(
            self.reporter.as_ref(),
            Event::Log {
                severity,
                message: message.into(),
            },
        );
    }

    pub(crate) fn section(&self, title: &str, major: bool) {
        dispatch(
            self.reporter.as_ref(),
            Event::Section {
                title: title.to_string(),
                major,
            },
        );
    }

    fn log_request(&self, method: &Method, path: &str, body: Option<&Value>) {
        dispatch(
            self.reporter.as_ref(),
            Event::Request {
                method: method.to_string(),
                path: path.to_string(),
                body: body.cloned(),
            },
        );
    }

    fn log_response(&self, status: u16, body: &Value) {
        dispatch(
            self.reporter.as_ref(),
            Event::Response {
                status,
                body: body.clone(),
            },
        );
    }

    /// Registers `credential`. Students also get an id and names derived from
    /// their email, plus the first known class.
    pub async fn register(&mut self, credential: &Credential) -> bool {
        self.log(
            Severity::Info,
            format!(
                "Registering {} user: {}",
                credential.role, credential.email
            ),
        );

        let mut data = json!({
            "email": credential.email,
            "password": credential.password,
            "role": credential.role.as_str(),
        });
        let mut profile = None;
        if credential.role == Role::Student {
            let student = StudentProfile::from_email(&credential.email);
            data["studentId"] = json!(student.student_id);
            data["firstName"] = json!(student.first_name);
            data["lastName"] = json!(student.last_name);
            data["classId"] = json!(self.ledger.first(ResourceKind::Class));
            profile = Some(student);
        }

        let path = "/auth/register";
        self.log_request(&Method::POST, path, Some(&data));
        let reply = match self.client.send(Method::POST, path, None, Some(&data)).await {
            Ok(reply) => reply,
            Err(e) => {
                self.log(
                    Severity::Error,
                    format!("Registration request failed: {e}"),
                );
                return false;
            }
        };
        self.log_response(reply.status, &reply.body);

        if matches!(reply.status, 200 | 201) {
            self.log(
                Severity::Success,
                format!("User {} registered successfully", credential.role),
            );
            if let Some(student) = profile {
                self.ledger
                    .record(ResourceKind::Student, student.student_id);
            }
            true
        } else {
            self.log(
                Severity::Error,
                format!("Registration failed: {}", reply.text),
            );
            false
        }
    }

    /// Logs in and stores the issued token under the credential's role.
    pub async fn login(&mut self, credential: &Credential) -> bool {
        self.log(
            Severity::Info,
            format!("Logging in {} user: {}", credential.role, credential.email),
        );

        let data = json!({
            "email": credential.email,
            "password": credential.password,
        });
        let path = "/auth/login";
        self.log_request(&Method::POST, path, Some(&data));
        let reply = match self.client.send(Method::POST, path, None, Some(&data)).await {
            Ok(reply) => reply,
            Err(e) => {
                self.log(Severity::Error, format!("Login request failed: {e}"));
                return false;
            }
        };
        self.log_response(reply.status, &reply.body);

        if reply.status != 200 {
            self.log(Severity::Error, format!("Login failed: {}", reply.text));
            return false;
        }

        let token = ["token", "accessToken"]
            .iter()
            .filter_map(|key| reply.body.get(*key).and_then(Value::as_str))
            .find(|token| !token.is_empty());
        let Some(token) = token else {
            self.log(Severity::Error, "No token in response");
            return false;
        };

        let user_id = reply.body.get("user").and_then(|user| id_of(user, "id"));
        if user_id.is_none() {
            self.log(Severity::Warning, "No user id in login response");
        }
        let preview: String = token.chars().take(20).collect();
        self.sessions
            .store(credential.role, token.to_string(), user_id);
        self.log(
            Severity::Success,
            format!("Login successful. Token: {preview}..."),
        );
        true
    }

    /// Sends a request as `role`, attaching its token when one is stored.
    ///
    /// Never fails: transport errors and unexpected statuses are logged and
    /// reported through [`ApiResponse::success`].
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        role: Role,
        body: Option<Value>,
        expected_status: u16,
    ) -> ApiResponse {
        self.log_request(&method, path, body.as_ref());

        let token = self.sessions.token(role);
        let reply = match self.client.send(method, path, token, body.as_ref()).await {
            Ok(reply) => reply,
            Err(e) => {
                self.log(Severity::Error, format!("Request failed: {e}"));
                let status = match &e {
                    ClientError::InvalidJson { status, .. } => Some(*status),
                    ClientError::Transport(_) => None,
                };
                return ApiResponse {
                    status,
                    ..ApiResponse::failed(e.to_string())
                };
            }
        };
        self.log_response(reply.status, &reply.body);

        let success = reply.status == expected_status;
        if !success {
            self.log(
                Severity::Warning,
                format!("Expected {expected_status}, got {}", reply.status),
            );
        }
        ApiResponse {
            success,
            status: Some(reply.status),
            body: reply.body,
            error: None,
        }
    }

    /// Logs in as `role`, registering the user first when the login fails.
    pub(crate) async fn authenticate(&mut self, role: Role) {
        let credential = self.config.credential(role);
        if !self.login(&credential).await {
            self.register(&credential).await;
            self.login(&credential).await;
        }
    }

    async fn run_scenarios(&mut self) -> Result<()> {
        self.admin_auth().await;
        self.admin_classes().await?;
        self.admin_subjects().await?;
        self.admin_assessments().await?;
        self.admin_bulk_import().await;
        self.admin_publish().await;
        self.admin_students().await;

        self.student_auth().await;
        self.student_assessments().await;
        self.student_exam().await;
        self.student_results().await;
        Ok(())
    }

    /// Runs every scenario once, in order, and summarizes what was created.
    ///
    /// An error escaping a scenario stops the sequence; the summary is still returned.
    pub async fn run_all(&mut self) -> RunSummary {
        self.section("STARTING FULL API TEST SUITE", true);

        let aborted = match self.run_scenarios().await {
            Ok(()) => None,
            Err(e) => {
                self.log(Severity::Error, format!("Test suite error: {e}"));
                self.log(Severity::Error, format!("{e:?}"));
                Some(e.to_string())
            }
        };

        self.section("TEST SUMMARY", true);
        self.summary(aborted)
    }

    /// Extracts the id of a created resource wrapped as `{"<wrapper>": {"id": ...}}`.
    ///
    /// A missing or empty wrapper yields `Ok(None)`, as does an `id` that is
    /// present but null, empty or not a scalar; the latter is logged as a
    /// warning. A wrapper with no `id` key at all means the response shape is
    /// not what the scenarios are written against, and is an error.
    pub(crate) fn created_id(&self, body: &Value, wrapper: &str) -> Result<Option<String>> {
        let Some(resource) = body.get(wrapper).filter(|v| is_truthy(v)) else {
            return Ok(None);
        };
        let Some(raw) = resource.get("id") else {
            return Err(anyhow!("Response field '{wrapper}' has no 'id': {resource}"));
        };
        let id = id_of(resource, "id");
        if id.is_none() {
            self.log(
                Severity::Warning,
                format!("Response field '{wrapper}' has an unusable id: {raw}"),
            );
        }
        Ok(id)
    }

    pub fn summary(&self, aborted: Option<String>) -> RunSummary {
        RunSummary {
            base_url: self.client.base_url().to_string(),
            classes: self.ledger.count(ResourceKind::Class),
            subjects: self.ledger.count(ResourceKind::Subject),
            assessments: self.ledger.count(ResourceKind::Assessment),
            students: self.ledger.count(ResourceKind::Student),
            class_subjects: self.ledger.count(ResourceKind::ClassSubject),
            admin_token: self.sessions.has_token(Role::Admin),
            student_token: self.sessions.has_token(Role::Student),
            aborted,
        }
    }
}

/// Reads `object[key]` as an identifier; numeric ids are rendered as strings.
fn id_of(object: &Value, key: &str) -> Option<String> {
    match object.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
        Value::Number(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{CaptureReporter, config_for, unreachable_base_url};
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn driver_for(server: &MockServer) -> (Driver, Arc<CaptureReporter>) {
        let reporter = CaptureReporter::new();
        let driver = Driver::new(config_for(&server.uri()), reporter.clone()).unwrap();
        (driver, reporter)
    }

    fn admin() -> Credential {
        Credential {
            email: "admin@test.com".to_string(),
            password: "admin123!".to_string(),
            role: Role::Admin,
        }
    }

    fn student() -> Credential {
        Credential {
            email: "student@test.com".to_string(),
            password: "Student123!@".to_string(),
            role: Role::Student,
        }
    }

    #[tokio::test]
    async fn test_created_id() {
        let server = MockServer::start().await;
        let (driver, reporter) = driver_for(&server);
        let created_id = |body: Value, wrapper: &str| driver.created_id(&body, wrapper);

        assert_eq!(
            created_id(json!({"class": {"id": "C1"}}), "class").unwrap(),
            Some("C1".to_string())
        );
        assert_eq!(
            created_id(json!({"subject": {"id": 7}}), "subject").unwrap(),
            Some("7".to_string())
        );
        assert_eq!(created_id(json!({}), "class").unwrap(), None);
        assert_eq!(created_id(json!({"class": null}), "class").unwrap(), None);
        assert!(reporter.messages(Severity::Warning).is_empty());

        assert!(created_id(json!({"class": {"name": "JSS1"}}), "class").is_err());
        assert!(created_id(json!({"class": "C1"}), "class").is_err());
    }

    #[tokio::test]
    async fn test_created_id_unusable_value_is_a_warning() {
        let server = MockServer::start().await;
        let (driver, reporter) = driver_for(&server);

        assert_eq!(
            driver.created_id(&json!({"class": {"id": null}}), "class").unwrap(),
            None
        );
        assert_eq!(
            driver.created_id(&json!({"subject": {"id": ""}}), "subject").unwrap(),
            None
        );
        assert!(reporter.has_message(Severity::Warning, "'class' has an unusable id: null"));
        assert!(reporter.has_message(Severity::Warning, "'subject' has an unusable id"));
    }

    #[tokio::test]
    async fn test_login_stores_token_and_user_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .and(body_json(json!({"email": "admin@test.com", "password": "admin123!"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "token": "tok-admin-0123456789abcdef",
                "user": {"id": "U1"}
            })))
            .mount(&server)
            .await;

        let (mut driver, reporter) = driver_for(&server);
        assert!(driver.login(&admin()).await);

        assert_eq!(
            driver.sessions().token(Role::Admin),
            Some("tok-admin-0123456789abcdef")
        );
        assert_eq!(driver.sessions().user_id(Role::Admin), Some("U1"));
        assert!(!driver.sessions().has_token(Role::Student));
        assert!(reporter.has_message(Severity::Success, "Token: tok-admin-0123456789..."));
    }

    #[tokio::test]
    async fn test_login_accepts_access_token_and_overwrites() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "accessToken": "first",
                "user": {"id": 1}
            })))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "token": "",
                "accessToken": "second",
                "user": {"id": 2}
            })))
            .mount(&server)
            .await;

        let (mut driver, _) = driver_for(&server);
        assert!(driver.login(&student()).await);
        assert!(driver.login(&student()).await);

        assert_eq!(driver.sessions().token(Role::Student), Some("second"));
        assert_eq!(driver.sessions().user_id(Role::Student), Some("2"));
    }

    #[tokio::test]
    async fn test_login_without_token_fails() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"user": {"id": "U1"}})))
            .mount(&server)
            .await;

        let (mut driver, reporter) = driver_for(&server);
        assert!(!driver.login(&admin()).await);
        assert!(!driver.sessions().has_token(Role::Admin));
        assert!(reporter.has_message(Severity::Error, "No token in response"));
    }

    #[tokio::test]
    async fn test_login_missing_user_id_is_a_warning() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "t"})))
            .mount(&server)
            .await;

        let (mut driver, reporter) = driver_for(&server);
        assert!(driver.login(&admin()).await);
        assert_eq!(driver.sessions().token(Role::Admin), Some("t"));
        assert_eq!(driver.sessions().user_id(Role::Admin), None);
        assert!(reporter.has_message(Severity::Warning, "No user id"));
    }

    #[tokio::test]
    async fn test_login_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({"error": "Invalid credentials"})),
            )
            .mount(&server)
            .await;

        let (mut driver, reporter) = driver_for(&server);
        assert!(!driver.login(&admin()).await);
        assert!(reporter.has_message(Severity::Error, "Login failed"));
        assert!(reporter.has_message(Severity::Error, "Invalid credentials"));
    }

    #[tokio::test]
    async fn test_register_student_payload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/register"))
            .and(body_json(json!({
                "email": "student@test.com",
                "password": "Student123!@",
                "role": "student",
                "studentId": "student",
                "firstName": "Student",
                "lastName": "Student",
                "classId": "C1"
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"user": {"id": "U2"}})))
            .expect(1)
            .mount(&server)
            .await;

        let (mut driver, _) = driver_for(&server);
        driver.ledger_mut().record(ResourceKind::Class, "C1");

        assert!(driver.register(&student()).await);
        assert_eq!(driver.ledger().first(ResourceKind::Student), Some("student"));
    }

    #[tokio::test]
    async fn test_register_student_without_class_sends_null() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/register"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({"error": "classId required"})))
            .mount(&server)
            .await;

        let (mut driver, reporter) = driver_for(&server);
        assert!(!driver.register(&student()).await);

        let requests = server.received_requests().await.unwrap();
        let sent: Value = requests[0].body_json().unwrap();
        assert_eq!(sent["classId"], Value::Null);
        assert!(driver.ledger().is_empty(ResourceKind::Student));
        assert!(reporter.has_message(Severity::Error, "Registration failed"));
    }

    #[tokio::test]
    async fn test_register_admin_has_no_student_fields() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/register"))
            .and(body_json(json!({
                "email": "admin@test.com",
                "password": "admin123!",
                "role": "admin"
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let (mut driver, _) = driver_for(&server);
        assert!(driver.register(&admin()).await);
        assert!(driver.ledger().is_empty(ResourceKind::Student));
    }

    #[tokio::test]
    async fn test_request_attaches_token_only_when_stored() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/student/results"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
            .mount(&server)
            .await;

        let (mut driver, _) = driver_for(&server);
        let before = driver
            .request(Method::GET, "/student/results", Role::Student, None, 200)
            .await;
        assert!(before.success);

        driver
            .sessions
            .store(Role::Student, "stok".to_string(), None);
        driver
            .request(Method::GET, "/student/results", Role::Student, None, 200)
            .await;
        // The admin slot is still empty
        driver
            .request(Method::GET, "/student/results", Role::Admin, None, 200)
            .await;

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 3);
        assert!(requests[0].headers.get("authorization").is_none());
        assert_eq!(
            requests[1].headers.get("authorization").unwrap(),
            "Bearer stok"
        );
        assert!(requests[2].headers.get("authorization").is_none());
    }

    #[tokio::test]
    async fn test_request_status_mismatch_keeps_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/admin/classes"))
            .respond_with(
                ResponseTemplate::new(400).set_body_json(json!({"error": "Class already exists"})),
            )
            .mount(&server)
            .await;

        let (driver, reporter) = driver_for(&server);
        let response = driver
            .request(
                Method::POST,
                "/admin/classes",
                Role::Admin,
                Some(json!({"name": "JSS1"})),
                201,
            )
            .await;

        assert!(!response.success);
        assert_eq!(response.status, Some(400));
        assert_eq!(response.body["error"], "Class already exists");
        assert!(response.error.is_none());
        assert!(reporter.has_message(Severity::Warning, "Expected 201, got 400"));
    }

    #[tokio::test]
    async fn test_request_transport_failure() {
        let uri = unreachable_base_url();
        let reporter = CaptureReporter::new();
        let driver = Driver::new(config_for(&uri), reporter.clone()).unwrap();

        let response = driver
            .request(Method::GET, "/admin/students", Role::Admin, None, 200)
            .await;

        assert!(!response.success);
        assert_eq!(response.status, None);
        assert_eq!(response.body, json!({}));
        assert!(response.error.is_some());
        assert!(reporter.has_message(Severity::Error, "Request failed"));
    }

    #[tokio::test]
    async fn test_request_non_json_reply_keeps_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/assessment"))
            .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
            .mount(&server)
            .await;

        let (driver, reporter) = driver_for(&server);
        let response = driver
            .request(Method::GET, "/assessment", Role::Admin, None, 200)
            .await;

        assert!(!response.success);
        assert_eq!(response.status, Some(502));
        assert_eq!(response.body, json!({}));
        assert!(response.error.unwrap().contains("Invalid JSON"));
        assert!(reporter.has_message(Severity::Error, "Request failed"));
    }
}
