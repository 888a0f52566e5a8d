use std::sync::Arc;

use serde::de::DeserializeOwned;
use shared::{
    domain::{MenuId, MenuItem, UserId, UserSummary},
    protocol::{ApiResponse, ServerReply},
};
use tracing::warn;
use url::form_urlencoded;

use crate::bridge::{join_url, RequestBridge};

pub const UNEXPECTED_RESPONSE_MESSAGE: &str = "Unexpected response";

/// Listing and deletion calls behind the menu and user screens.
pub struct ManagerApi<B: ?Sized> {
    bridge: Arc<B>,
    base_url: String,
    token: String,
}

impl<B: RequestBridge + ?Sized> ManagerApi<B> {
    pub fn new(bridge: Arc<B>, base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            bridge,
            base_url: base_url.into(),
            token: token.into(),
        }
    }

    pub async fn list_menus(&self, search: Option<&str>) -> ApiResponse<Vec<MenuItem>> {
        self.list("menu", search).await
    }

    pub async fn list_users(&self, search: Option<&str>) -> ApiResponse<Vec<UserSummary>> {
        self.list("user", search).await
    }

    pub async fn delete_menu(&self, id: MenuId) -> ApiResponse {
        self.remove("menu", id.0).await
    }

    pub async fn delete_user(&self, id: UserId) -> ApiResponse {
        self.remove("user", id.0).await
    }

    fn endpoint(&self, path: &str) -> String {
        join_url(&self.base_url, path)
    }

    async fn list<T: DeserializeOwned>(
        &self,
        resource: &str,
        search: Option<&str>,
    ) -> ApiResponse<Vec<T>> {
        let mut url = self.endpoint(&format!("{resource}/"));
        if let Some(search) = search.filter(|keyword| !keyword.is_empty()) {
            let encoded: String = form_urlencoded::byte_serialize(search.as_bytes()).collect();
            url.push_str(&format!("?search={encoded}"));
        }

        let envelope = self.bridge.get(&url, &self.token).await;
        if !envelope.status {
            return ApiResponse::fail(envelope.message_or_fallback());
        }

        match envelope.decode::<ServerReply<Vec<T>>>() {
            Ok(ApiResponse {
                data: Some(reply), ..
            }) if reply.status => {
                ApiResponse::ok(reply.data.unwrap_or_default()).with_message(reply.message)
            }
            Ok(ApiResponse {
                data: Some(reply), ..
            }) => ApiResponse::fail(
                reply
                    .message
                    .unwrap_or_else(|| UNEXPECTED_RESPONSE_MESSAGE.to_string()),
            ),
            Ok(_) => ApiResponse::fail(UNEXPECTED_RESPONSE_MESSAGE),
            Err(err) => {
                warn!(resource, error = %err, "listing did not match the expected shape");
                ApiResponse::fail(UNEXPECTED_RESPONSE_MESSAGE)
            }
        }
    }

    async fn remove(&self, resource: &str, id: i64) -> ApiResponse {
        let url = self.endpoint(&format!("{resource}/{id}"));
        let envelope = self.bridge.delete(&url, &self.token).await;
        if !envelope.status {
            return envelope;
        }

        let reply = envelope.server_reply();
        if reply.status {
            ApiResponse::ok(reply.data.unwrap_or_default()).with_message(reply.message)
        } else {
            ApiResponse::fail(
                reply
                    .message
                    .unwrap_or_else(|| UNEXPECTED_RESPONSE_MESSAGE.to_string()),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::json;
    use shared::domain::{Category, Role};

    use super::*;
    use crate::payload::RequestBody;

    struct ScriptedBridge {
        reply: ApiResponse,
        urls: Mutex<Vec<String>>,
    }

    impl ScriptedBridge {
        fn new(reply: ApiResponse) -> Arc<Self> {
            Arc::new(Self {
                reply,
                urls: Mutex::new(Vec::new()),
            })
        }

        fn urls(&self) -> Vec<String> {
            self.urls.lock().expect("lock").clone()
        }
    }

    #[async_trait]
    impl RequestBridge for ScriptedBridge {
        async fn get(&self, url: &str, _token: &str) -> ApiResponse {
            self.urls.lock().expect("lock").push(format!("GET {url}"));
            self.reply.clone()
        }

        async fn post(&self, url: &str, _body: RequestBody, _token: &str) -> ApiResponse {
            self.urls.lock().expect("lock").push(format!("POST {url}"));
            self.reply.clone()
        }

        async fn put(&self, url: &str, _body: RequestBody, _token: &str) -> ApiResponse {
            self.urls.lock().expect("lock").push(format!("PUT {url}"));
            self.reply.clone()
        }

        async fn delete(&self, url: &str, _token: &str) -> ApiResponse {
            self.urls.lock().expect("lock").push(format!("DELETE {url}"));
            self.reply.clone()
        }
    }

    #[tokio::test]
    async fn list_menus_decodes_rows_and_encodes_search() {
        let bridge = ScriptedBridge::new(ApiResponse::ok(json!({
            "status": true,
            "message": "Menu has been retrieved",
            "data": [{
                "id": 1,
                "name": "Soto Ayam",
                "price": 12000,
                "description": "chicken soup",
                "category": "FOOD"
            }]
        })));
        let api = ManagerApi::new(bridge.clone(), "http://api.local/", "tok");

        let result = api.list_menus(Some("soto ayam")).await;

        assert!(result.status);
        assert_eq!(result.message.as_deref(), Some("Menu has been retrieved"));
        let menus = result.data.expect("menus");
        assert_eq!(menus.len(), 1);
        assert_eq!(menus[0].category, Category::Food);
        assert_eq!(
            bridge.urls(),
            vec!["GET http://api.local/menu/?search=soto+ayam".to_string()]
        );
    }

    #[tokio::test]
    async fn list_users_without_search_has_no_query() {
        let bridge = ScriptedBridge::new(ApiResponse::ok(json!({
            "status": true,
            "data": [{"id": 2, "name": "Budi", "email": "budi@example.com", "role": "CASHIER"}]
        })));
        let api = ManagerApi::new(bridge.clone(), "http://api.local", "tok");

        let result = api.list_users(Some("")).await;

        assert_eq!(result.data.expect("users")[0].role, Role::Cashier);
        assert_eq!(bridge.urls(), vec!["GET http://api.local/user/".to_string()]);
    }

    #[tokio::test]
    async fn listing_with_wrong_shape_becomes_failure() {
        let bridge = ScriptedBridge::new(ApiResponse::ok(json!({
            "status": true,
            "data": [{"unexpected": true}]
        })));
        let api = ManagerApi::new(bridge, "http://api.local", "tok");

        let result = api.list_menus(None).await;

        assert_eq!(result, ApiResponse::fail(UNEXPECTED_RESPONSE_MESSAGE));
    }

    #[tokio::test]
    async fn bridge_failure_passes_message_through() {
        let bridge = ScriptedBridge::new(ApiResponse::fail("Unauthorized"));
        let api = ManagerApi::new(bridge, "http://api.local", "");

        let result = api.list_users(None).await;

        assert_eq!(result, ApiResponse::fail("Unauthorized"));
    }

    #[tokio::test]
    async fn delete_menu_reports_server_message() {
        let bridge = ScriptedBridge::new(ApiResponse::ok(json!({
            "status": true,
            "message": "Menu has been deleted"
        })));
        let api = ManagerApi::new(bridge.clone(), "http://api.local", "tok");

        let result = api.delete_menu(MenuId(5)).await;

        assert!(result.status);
        assert_eq!(result.message.as_deref(), Some("Menu has been deleted"));
        assert_eq!(bridge.urls(), vec!["DELETE http://api.local/menu/5".to_string()]);
    }

    #[tokio::test]
    async fn delete_user_rejected_by_server_is_failure() {
        let bridge = ScriptedBridge::new(ApiResponse::ok(json!({
            "status": false,
            "message": "User not found"
        })));
        let api = ManagerApi::new(bridge, "http://api.local", "tok");

        let result = api.delete_user(UserId(77)).await;

        assert_eq!(result, ApiResponse::fail("User not found"));
    }
}
