use chrono::Utc;
use reqwest::{header, Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::types::*;
use crate::config::Config;
use crate::roster::Roster;
use crate::session::Session;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("API request failed: {status} - {body}")]
    Http { status: StatusCode, body: String },
    #[error("error sending request: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("not signed in")]
    NotAuthenticated,
}

impl ApiError {
    /// Connectivity problems, as opposed to the backend rejecting the call
    pub fn is_offline(&self) -> bool {
        match self {
            ApiError::Transport(e) => e.is_connect() || e.is_timeout() || e.is_request(),
            _ => false,
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Clone, Copy)]
enum Auth {
    Bearer,
    // Client registry accepts anonymous calls; send the token when we have one
    IfSignedIn,
    Anonymous,
}

pub struct AttendanceClient {
    client: Client,
    origin: String,
    base_url: String,
    tasks_base_url: String,
    auth_header: Option<String>,
}

impl AttendanceClient {
    pub fn new(config: &Config, session: Option<&Session>) -> ApiResult<Self> {
        let client = Client::builder()
            .build()?;

        Ok(Self {
            client,
            origin: config.origin(),
            base_url: config.base_url(),
            tasks_base_url: config.tasks_base_url(),
            auth_header: session.map(Session::bearer),
        })
    }

    fn authorized(&self, request: RequestBuilder, auth: Auth) -> ApiResult<RequestBuilder> {
        match (auth, &self.auth_header) {
            (Auth::Bearer | Auth::IfSignedIn, Some(header_value)) => {
                Ok(request.header(header::AUTHORIZATION, header_value))
            }
            (Auth::Bearer, None) => Err(ApiError::NotAuthenticated),
            _ => Ok(request),
        }
    }

    fn api(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    fn tasks_api(&self, endpoint: &str) -> String {
        format!("{}{}", self.tasks_base_url, endpoint)
    }

    async fn send(&self, request: RequestBuilder) -> ApiResult<String> {
        let response = request
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(ApiError::Http { status, body });
        }
        Ok(body)
    }

    async fn get<T: DeserializeOwned>(&self, url: String, auth: Auth) -> ApiResult<T> {
        debug!(%url, "GET");
        let body = self.send(self.authorized(self.client.get(&url), auth)?).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// POST returning the raw JSON body; empty bodies come back as `Null`
    async fn post<B: Serialize>(&self, url: String, body: &B, auth: Auth) -> ApiResult<serde_json::Value> {
        debug!(%url, "POST");
        let request = self.client
            .post(&url)
            .header(header::CONTENT_TYPE, "application/json")
            .json(body);
        let request = self.authorized(request, auth)?;

        let body = self.send(request).await?;
        if body.trim().is_empty() {
            return Ok(serde_json::Value::Null);
        }
        Ok(serde_json::from_str(&body)?)
    }

    /// Exchange dashboard credentials for a bearer token
    pub async fn login(&self, email: &str, key: &str) -> ApiResult<LoginResponse> {
        let request = LoginRequest {
            email: email.to_string(),
            key_address: key.to_string(),
        };
        let value = self.post(self.api("/Employee/DashboardLogin"), &request, Auth::Anonymous).await?;
        Ok(serde_json::from_value(value)?)
    }

    pub async fn get_departments(&self) -> ApiResult<Vec<DepartmentDto>> {
        self.get(self.api("/Employee/GetDepartments"), Auth::Bearer).await
    }

    /// Employees of one department; the backend filters on the lowercased name
    pub async fn search_employees(&self, department_name: &str) -> ApiResult<Vec<EmployeeDto>> {
        let endpoint = format!(
            "/Employee/SearchEmployees?departments={}",
            urlencoding::encode(&department_name.to_lowercase())
        );
        self.get(self.api(&endpoint), Auth::Bearer).await
    }

    pub async fn get_all_tasks(&self) -> ApiResult<Vec<TaskDto>> {
        // Timestamp defeats intermediate caches
        let endpoint = format!("/Tasks/GetAllTasks?timestamp={}", Utc::now().timestamp_millis());
        self.get(self.api(&endpoint), Auth::Bearer).await
    }

    /// Create a task; returns the stored task when the backend echoes it back
    pub async fn create_task(&self, task: &TaskRequest) -> ApiResult<Option<TaskDto>> {
        let value = self.post(self.api("/Tasks/CreateTask"), task, Auth::Bearer).await?;
        Ok(serde_json::from_value(value).ok())
    }

    pub async fn update_task(&self, task_id: &str, task: &TaskRequest) -> ApiResult<()> {
        let endpoint = format!("/Tasks/UpdateTask/{}", urlencoding::encode(task_id));
        self.post(self.api(&endpoint), task, Auth::Bearer).await?;
        Ok(())
    }

    pub async fn delete_task(&self, task_id: &str) -> ApiResult<()> {
        let endpoint = format!("/Tasks/DeleteTask/{}", urlencoding::encode(task_id));
        self.post(self.api(&endpoint), &serde_json::Value::Null, Auth::Bearer).await?;
        Ok(())
    }

    pub async fn get_clients(&self) -> ApiResult<Vec<ClientDto>> {
        self.get(self.tasks_api("/Clients/GetAllClients"), Auth::IfSignedIn).await
    }

    pub async fn create_client(&self, name: &str, client_code: &str) -> ApiResult<()> {
        let request = ClientRequest {
            id: None,
            name: name.to_string(),
            client_code: client_code.to_string(),
        };
        self.post(self.tasks_api("/Clients/CreateClient"), &request, Auth::IfSignedIn).await?;
        Ok(())
    }

    pub async fn update_client(&self, client_id: &str, name: &str, client_code: &str) -> ApiResult<()> {
        let request = ClientRequest {
            id: Some(wire_id(client_id)),
            name: name.to_string(),
            client_code: client_code.to_string(),
        };
        let endpoint = format!("/Clients/UpdateClient/{}", urlencoding::encode(client_id));
        self.post(self.tasks_api(&endpoint), &request, Auth::IfSignedIn).await?;
        Ok(())
    }

    pub async fn delete_client(&self, client_id: &str) -> ApiResult<()> {
        let endpoint = format!("/Clients/DeleteClient/{}", urlencoding::encode(client_id));
        self.post(self.tasks_api(&endpoint), &serde_json::Value::Null, Auth::IfSignedIn).await?;
        Ok(())
    }

    /// Departments, their employees and all tasks, joined into a roster
    pub async fn fetch_roster(&self) -> ApiResult<Roster> {
        let departments = self.get_departments().await?;
        let tasks = self.get_all_tasks().await?;

        let mut employees = Vec::with_capacity(departments.len());
        for department in &departments {
            // Skip departments that fail to load rather than losing the whole board
            match self.search_employees(&department.name).await {
                Ok(list) => employees.push((department.id.clone(), list)),
                Err(e) => warn!(department = %department.name, error = %e, "Failed to load employees"),
            }
        }

        info!(
            departments = departments.len(),
            tasks = tasks.len(),
            "Fetched roster"
        );
        Ok(Roster::assemble(departments, employees, tasks, &self.origin))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::LoginResponse;
    use mockito::Matcher;

    fn config_for(server: &mockito::Server) -> Config {
        Config {
            backend_origin: server.url(),
            tasks_service_origin: server.url(),
            ..Config::default()
        }
    }

    fn session() -> Session {
        Session::from_login(
            LoginResponse {
                token: "tok123".to_string(),
                role: None,
            },
            "hr@example.com",
            false,
        )
    }

    #[tokio::test]
    async fn login_posts_credentials_without_auth() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/Employee/DashboardLogin")
            .match_body(Matcher::Json(serde_json::json!({
                "email": "hr@example.com",
                "keyAddress": "k3y"
            })))
            .with_status(200)
            .with_body(r#"{"token": "fresh"}"#)
            .create_async()
            .await;

        let client = AttendanceClient::new(&config_for(&server), None).unwrap();
        let response = client.login("hr@example.com", "k3y").await.unwrap();
        assert_eq!(response.token, "fresh");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn fetch_roster_sends_bearer_and_joins() {
        let mut server = mockito::Server::new_async().await;
        let departments = server
            .mock("GET", "/api/Employee/GetDepartments")
            .match_header("authorization", "Bearer tok123")
            .with_body(r#"[{"id": 1, "name": "Sales"}]"#)
            .create_async()
            .await;
        let employees = server
            .mock("GET", "/api/Employee/SearchEmployees")
            .match_query(Matcher::UrlEncoded("departments".into(), "sales".into()))
            .with_body(r#"[{"id": 160, "name": "Mona", "jobTitle": "Cashier", "imagePath": "/img/m.png"}]"#)
            .create_async()
            .await;
        let tasks = server
            .mock("GET", "/api/Tasks/GetAllTasks")
            .match_query(Matcher::Regex("timestamp=\\d+".into()))
            .with_body(
                r#"[{"id": 5, "title": "Till count", "startTime": "2025-05-20T10:00:00",
                     "endTime": "2025-05-20T10:40:00", "assignedToEmployeeId": 160}]"#,
            )
            .create_async()
            .await;

        let session = session();
        let client = AttendanceClient::new(&config_for(&server), Some(&session)).unwrap();
        let roster = client.fetch_roster().await.unwrap();

        departments.assert_async().await;
        employees.assert_async().await;
        tasks.assert_async().await;

        let mona = roster.employee("1", "160").unwrap();
        assert_eq!(mona.position, "Cashier");
        assert_eq!(mona.avatar_url.as_deref(), Some(format!("{}/img/m.png", server.url()).as_str()));
        assert_eq!(mona.tasks.len(), 1);
        assert_eq!(mona.tasks[0].time, "10:00 AM");
        assert_eq!(mona.tasks[0].end_time.as_deref(), Some("10:40 AM"));
    }

    #[tokio::test]
    async fn non_success_maps_to_http_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/Employee/GetDepartments")
            .with_status(401)
            .with_body("expired")
            .create_async()
            .await;

        let session = session();
        let client = AttendanceClient::new(&config_for(&server), Some(&session)).unwrap();
        match client.get_departments().await {
            Err(ApiError::Http { status, body }) => {
                assert_eq!(status, StatusCode::UNAUTHORIZED);
                assert_eq!(body, "expired");
            }
            other => panic!("expected HTTP error, got {:?}", other.map(|d| d.len())),
        }
    }

    #[tokio::test]
    async fn task_mutations_hit_their_endpoints() {
        let mut server = mockito::Server::new_async().await;
        let create = server
            .mock("POST", "/api/Tasks/CreateTask")
            .match_header("authorization", "Bearer tok123")
            .match_body(Matcher::PartialJson(serde_json::json!({"title": "Restock"})))
            .with_body(r#"{"id": 77, "title": "Restock", "startTime": "2025-05-20T15:00:00"}"#)
            .create_async()
            .await;
        let update = server
            .mock("POST", "/api/Tasks/UpdateTask/77")
            .with_status(200)
            .create_async()
            .await;
        let delete = server
            .mock("POST", "/api/Tasks/DeleteTask/77")
            .with_status(204)
            .create_async()
            .await;

        let session = session();
        let client = AttendanceClient::new(&config_for(&server), Some(&session)).unwrap();
        let request = TaskRequest {
            title: "Restock".to_string(),
            description: String::new(),
            start_time: "2025-05-20T15:00:00".to_string(),
            end_time: "2025-05-20T16:00:00".to_string(),
            department_id: None,
            assigned_to_employee_id: Some(wire_id("160")),
        };

        let created = client.create_task(&request).await.unwrap().unwrap();
        assert_eq!(created.id, "77");
        client.update_task("77", &request).await.unwrap();
        client.delete_task("77").await.unwrap();

        create.assert_async().await;
        update.assert_async().await;
        delete.assert_async().await;
    }

    #[tokio::test]
    async fn client_registry_crud_hits_its_endpoints() {
        let mut server = mockito::Server::new_async().await;
        let list = server
            .mock("GET", "/api/Clients/GetAllClients")
            .with_body(r#"[{"id": 9, "name": "Acme", "clientCode": "ACM"}]"#)
            .create_async()
            .await;
        let create = server
            .mock("POST", "/api/Clients/CreateClient")
            .match_body(Matcher::Json(serde_json::json!({"name": "Globex", "clientCode": "GLX"})))
            .create_async()
            .await;
        let update = server
            .mock("POST", "/api/Clients/UpdateClient/9")
            .match_body(Matcher::Json(serde_json::json!({"id": 9, "name": "Acme Corp", "clientCode": "ACM"})))
            .create_async()
            .await;
        let delete = server
            .mock("POST", "/api/Clients/DeleteClient/9")
            .with_status(204)
            .create_async()
            .await;

        // Anonymous calls are fine against the client registry
        let client = AttendanceClient::new(&config_for(&server), None).unwrap();
        let clients = client.get_clients().await.unwrap();
        assert_eq!(clients[0].id, "9");
        assert_eq!(clients[0].client_code, "ACM");
        client.create_client("Globex", "GLX").await.unwrap();
        client.update_client("9", "Acme Corp", "ACM").await.unwrap();
        client.delete_client("9").await.unwrap();

        list.assert_async().await;
        create.assert_async().await;
        update.assert_async().await;
        delete.assert_async().await;
    }

    #[tokio::test]
    async fn client_registry_uses_its_own_host() {
        let attendance = mockito::Server::new_async().await;
        let mut tasks_service = mockito::Server::new_async().await;
        let list = tasks_service
            .mock("GET", "/api/Clients/GetAllClients")
            .match_header("authorization", "Bearer tok123")
            .with_body("[]")
            .create_async()
            .await;

        let config = Config {
            backend_origin: attendance.url(),
            tasks_service_origin: tasks_service.url(),
            ..Config::default()
        };
        let session = session();
        let client = AttendanceClient::new(&config, Some(&session)).unwrap();
        assert!(client.get_clients().await.unwrap().is_empty());
        list.assert_async().await;
    }

    #[tokio::test]
    async fn authenticated_calls_need_a_session() {
        let server = mockito::Server::new_async().await;
        let client = AttendanceClient::new(&config_for(&server), None).unwrap();
        assert!(matches!(client.get_all_tasks().await, Err(ApiError::NotAuthenticated)));
    }
}
