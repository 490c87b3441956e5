use serde::{Deserialize, Deserializer, Serialize};

/// Backend ids arrive as numbers or strings depending on the endpoint
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Number(i64),
    Text(String),
}

impl From<RawId> for String {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Number(n) => n.to_string(),
            RawId::Text(s) => s,
        }
    }
}

fn id_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    RawId::deserialize(deserializer).map(String::from)
}

fn opt_id_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Option::<RawId>::deserialize(deserializer).map(|raw| raw.map(String::from))
}

/// Send numeric-looking ids back as JSON numbers, anything else as a string
pub fn wire_id(id: &str) -> serde_json::Value {
    match id.parse::<i64>() {
        Ok(n) => serde_json::Value::from(n),
        Err(_) => serde_json::Value::from(id),
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub key_address: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DepartmentDto {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeDto {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub job_title: Option<String>,
    #[serde(default)]
    pub image_path: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDto {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
    #[serde(default, deserialize_with = "opt_id_string")]
    pub department_id: Option<String>,
    #[serde(default, deserialize_with = "opt_id_string")]
    pub assigned_to_employee_id: Option<String>,
}

/// Body for task create and update calls
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRequest {
    pub title: String,
    pub description: String,
    pub start_time: String,
    pub end_time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department_id: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to_employee_id: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientDto {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub client_code: String,
}

/// Body for client create and update calls; updates repeat the id
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<serde_json::Value>,
    pub name: String,
    pub client_code: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_ids_accept_numbers_and_strings() {
        let tasks: Vec<TaskDto> = serde_json::from_str(
            r#"[
                {"id": 12, "title": "Standup", "startTime": "2025-05-20T10:00:00", "assignedToEmployeeId": 160},
                {"id": "a-7", "title": "Review", "startTime": "2025-05-20T11:00:00", "endTime": null, "departmentId": "3"}
            ]"#,
        )
        .unwrap();

        assert_eq!(tasks[0].id, "12");
        assert_eq!(tasks[0].assigned_to_employee_id.as_deref(), Some("160"));
        assert_eq!(tasks[0].end_time, None);
        assert_eq!(tasks[1].id, "a-7");
        assert_eq!(tasks[1].assigned_to_employee_id, None);
        assert_eq!(tasks[1].department_id.as_deref(), Some("3"));
    }

    #[test]
    fn task_request_uses_backend_field_names() {
        let request = TaskRequest {
            title: "Inventory".to_string(),
            description: String::new(),
            start_time: "2025-05-20T14:00:00".to_string(),
            end_time: "2025-05-20T14:40:00".to_string(),
            department_id: None,
            assigned_to_employee_id: Some(wire_id("42")),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["startTime"], "2025-05-20T14:00:00");
        assert_eq!(json["assignedToEmployeeId"], 42);
        assert!(json.get("departmentId").is_none());
    }

    #[test]
    fn login_request_shape() {
        let json = serde_json::to_value(LoginRequest {
            email: "hr@example.com".to_string(),
            key_address: "secret".to_string(),
        })
        .unwrap();
        assert_eq!(json["keyAddress"], "secret");
    }

    #[test]
    fn client_shapes() {
        let clients: Vec<ClientDto> = serde_json::from_str(
            r#"[{"id": 3, "name": "Acme", "clientCode": "ACM"}, {"id": "x", "name": "Blank"}]"#,
        )
        .unwrap();
        assert_eq!(clients[0].id, "3");
        assert_eq!(clients[0].client_code, "ACM");
        assert_eq!(clients[1].client_code, "");

        let json = serde_json::to_value(ClientRequest {
            id: None,
            name: "Acme".to_string(),
            client_code: "ACM".to_string(),
        })
        .unwrap();
        assert_eq!(json["clientCode"], "ACM");
        assert!(json.get("id").is_none());
    }
}
