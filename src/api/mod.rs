use crate::models::{MenuId, MenuRecord};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum ApiErrorKind {
    Network,
    Http,
    Parse,
}

#[derive(Clone, Debug)]
pub(crate) struct ApiError {
    pub kind: ApiErrorKind,
    pub message: String,
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl ApiError {
    fn network(e: reqwest::Error) -> Self {
        Self {
            kind: ApiErrorKind::Network,
            message: e.to_string(),
        }
    }

    fn parse(e: impl std::fmt::Display) -> Self {
        Self {
            kind: ApiErrorKind::Parse,
            message: e.to_string(),
        }
    }

    fn http(status: reqwest::StatusCode, body: String, ctx: &str) -> Self {
        Self {
            kind: ApiErrorKind::Http,
            message: format!("{ctx} ({status}): {body}"),
        }
    }
}

pub(crate) type ApiResult<T> = Result<T, ApiError>;

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct EnvConfig {
    pub api_url: String,
}

impl EnvConfig {
    pub fn new() -> Self {
        let default_api_url = "http://localhost:3000/api".to_string();

        // We support BOTH `window.ENV.API_URL` (documented in README) and
        // `window.ENV.api_url` (legacy/implementation detail) for compatibility.
        if let Some(window) = web_sys::window() {
            if let Some(env) = window.get("ENV") {
                if !env.is_undefined() && env.is_object() {
                    // 1) Prefer README style: API_URL
                    if let Ok(api_url) = js_sys::Reflect::get(&env, &"API_URL".into()) {
                        if let Some(url_str) = api_url.as_string() {
                            return Self { api_url: url_str };
                        }
                    }

                    // 2) Fallback: api_url
                    if let Ok(api_url) = js_sys::Reflect::get(&env, &"api_url".into()) {
                        if let Some(url_str) = api_url.as_string() {
                            return Self { api_url: url_str };
                        }
                    }
                }
            }
        }

        Self {
            api_url: default_api_url,
        }
    }
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Write payload for POST /menus and PUT /menus/{id}.
///
/// `parentId` is always on the wire: an integer, or an explicit `null`
/// for "no parent". Omission would be ambiguous and `0` is a real id on
/// some deployments, so neither is ever used as the root marker.
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub(crate) struct MenuWriteRequest {
    pub parent_id: Option<MenuId>,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub order_no: i64,
}

#[derive(Clone)]
pub(crate) struct ApiClient {
    pub(crate) base_url: String,
}

impl ApiClient {
    pub fn new(base_url: String) -> Self {
        Self { base_url }
    }

    pub fn from_env() -> Self {
        Self {
            base_url: EnvConfig::new().api_url,
        }
    }

    async fn request<T: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        path: &str,
        body: Option<&impl serde::Serialize>,
        ctx: &str,
    ) -> ApiResult<T> {
        let res = self.send(method, path, body, ctx).await?;
        res.json().await.map_err(ApiError::parse)
    }

    async fn send(
        &self,
        method: &str,
        path: &str,
        body: Option<&impl serde::Serialize>,
        ctx: &str,
    ) -> ApiResult<reqwest::Response> {
        let client = reqwest::Client::new();
        let url = format!("{}{}", self.base_url, path);
        let method: reqwest::Method = method.parse().map_err(ApiError::parse)?;
        let mut req = client.request(method, url);

        if let Some(b) = body {
            req = req.json(b);
        }

        let res = req.send().await.map_err(ApiError::network)?;

        if res.status().is_success() {
            Ok(res)
        } else {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            Err(ApiError::http(status, body, ctx))
        }
    }

    /// GET /menus: full node set, flat or nested.
    pub async fn list_menus(&self) -> ApiResult<Vec<MenuRecord>> {
        self.request("GET", "/menus", None::<&()>, "Failed to fetch menus")
            .await
    }

    /// POST /menus: the collaborator assigns the id.
    pub async fn create_menu(&self, body: &MenuWriteRequest) -> ApiResult<MenuRecord> {
        self.request("POST", "/menus", Some(body), "Failed to create menu")
            .await
    }

    /// PUT /menus/{id}.
    pub async fn update_menu(&self, id: MenuId, body: &MenuWriteRequest) -> ApiResult<MenuRecord> {
        self.request(
            "PUT",
            &format!("/menus/{id}"),
            Some(body),
            "Failed to update menu",
        )
        .await
    }

    /// DELETE /menus/{id}: 2xx is enough, no body required.
    pub async fn delete_menu(&self, id: MenuId) -> ApiResult<()> {
        self.send(
            "DELETE",
            &format!("/menus/{id}"),
            None::<&()>,
            "Failed to delete menu",
        )
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_client_new() {
        let client = ApiClient::new("http://localhost:3000/api".to_string());
        assert_eq!(client.base_url, "http://localhost:3000/api");
    }

    #[test]
    fn test_list_contract_flat_deserialize() {
        // Contract: GET /menus may return the flat relation.
        let json = r#"[
            {"id": 1, "parentId": null, "name": "Home", "orderNo": 0},
            {"id": 2, "parentId": 1, "name": "About", "url": "/about", "orderNo": 0}
        ]"#;
        let parsed: Vec<MenuRecord> = serde_json::from_str(json).expect("list should parse");
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].parent_id, None);
        assert_eq!(parsed[1].parent_id, Some(1));
        assert_eq!(parsed[1].url.as_deref(), Some("/about"));
    }

    #[test]
    fn test_list_contract_nested_deserialize() {
        // Contract: GET /menus may also return pre-nested children.
        let json = r#"[
            {"id": 1, "name": "Home", "orderNo": 0, "children": [
                {"id": 2, "parentId": 1, "name": "About", "orderNo": 0}
            ]}
        ]"#;
        let parsed: Vec<MenuRecord> = serde_json::from_str(json).expect("list should parse");
        assert_eq!(parsed[0].children.len(), 1);
        assert_eq!(parsed[0].children[0].id, 2);
    }

    #[test]
    fn test_write_request_root_sends_explicit_null_parent() {
        let req = MenuWriteRequest {
            parent_id: None,
            name: "New".to_string(),
            url: None,
            order_no: 0,
        };
        let v = serde_json::to_value(&req).expect("should serialize");

        // "no parent" must be a present null, never an omitted key and never 0.
        assert!(v.as_object().expect("object").contains_key("parentId"));
        assert!(v["parentId"].is_null());
        assert_eq!(v["name"], "New");
        assert_eq!(v["orderNo"], 0);
        // Empty url is omitted entirely.
        assert!(!v.as_object().expect("object").contains_key("url"));
    }

    #[test]
    fn test_write_request_child_sends_integer_parent() {
        let req = MenuWriteRequest {
            parent_id: Some(4),
            name: "Reports".to_string(),
            url: Some("/reports".to_string()),
            order_no: 2,
        };
        let v = serde_json::to_value(&req).expect("should serialize");
        assert_eq!(v["parentId"], 4);
        assert_eq!(v["url"], "/reports");
    }

    #[test]
    fn test_api_error_display_is_message() {
        let e = ApiError {
            kind: ApiErrorKind::Http,
            message: "Failed to update menu (409 Conflict): order taken".to_string(),
        };
        assert_eq!(e.to_string(), "Failed to update menu (409 Conflict): order taken");
    }
}
