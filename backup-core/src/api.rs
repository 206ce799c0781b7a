use crate::config::AppConfig;
use crate::constants::api;
use crate::error::{RemoteError, Result};
use crate::provider::{Backup, BackupHandle, BackupProvider, Server, ServerId};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Vscale API 客户端
#[derive(Clone)]
pub struct VscaleClient {
    client: Client,
    base_url: String,
    token: String,
}

/// 创建备份请求
#[derive(Debug, Serialize)]
struct CreateBackupRequest<'a> {
    name: &'a str,
}

impl std::fmt::Debug for VscaleClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VscaleClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl VscaleClient {
    /// 创建新的 API 客户端
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(api::REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::new(config.api.base_url.clone(), config.token.clone())
    }

    /// 获取完整的端点URL
    fn get_endpoint_url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    /// 构建带令牌的请求
    fn build_request(&self, method: Method, url: &str) -> RequestBuilder {
        self.client
            .request(method, url)
            .header(api::TOKEN_HEADER, &self.token)
    }

    /// 发送请求，非成功响应转换为 [`RemoteError`]
    async fn send(&self, request: RequestBuilder, method: Method, url: &str) -> Result<Response> {
        debug!("{} {}", method, url);
        let response = request.send().await?;

        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let headers = response.headers().clone();
        let body = response.text().await.unwrap_or_default();
        debug!("API请求失败: {} {} -> {} - {}", method, url, status, body);

        Err(RemoteError {
            method: method.to_string(),
            url: url.to_string(),
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            headers,
            body,
        }
        .into())
    }

    async fn get_json<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T> {
        let url = self.get_endpoint_url(endpoint);
        let request = self.build_request(Method::GET, &url);
        let response = self.send(request, Method::GET, &url).await?;
        decode_body(response).await
    }
}

/// 读取响应体并按 JSON 解码
async fn decode_body<T: DeserializeOwned>(response: Response) -> Result<T> {
    let body = response.text().await?;
    Ok(serde_json::from_str(&body)?)
}

#[async_trait]
impl BackupProvider for VscaleClient {
    async fn list_servers(&self) -> Result<Vec<Server>> {
        self.get_json(api::endpoints::SERVERS).await
    }

    async fn list_backups(&self) -> Result<Vec<Backup>> {
        let items: Vec<Value> = self.get_json(api::endpoints::BACKUPS).await?;

        // 单条记录格式异常时跳过，不影响整个列表
        let backups = items
            .into_iter()
            .filter_map(|item| match serde_json::from_value::<Backup>(item.clone()) {
                Ok(backup) => Some(backup),
                Err(e) => {
                    debug!("跳过无法解析的备份记录 {}: {}", item, e);
                    None
                }
            })
            .collect();
        Ok(backups)
    }

    async fn create_backup(&self, server_id: ServerId, name: &str) -> Result<BackupHandle> {
        let endpoint = api::endpoints::SERVER_BACKUP.replace("{server_id}", &server_id.to_string());
        let url = self.get_endpoint_url(&endpoint);
        let request = self
            .build_request(Method::POST, &url)
            .json(&CreateBackupRequest { name });

        let response = self.send(request, Method::POST, &url).await?;
        decode_body(response).await
    }

    async fn delete_backup(&self, backup_id: &str) -> Result<()> {
        let endpoint = api::endpoints::BACKUP.replace("{backup_id}", backup_id);
        let url = self.get_endpoint_url(&endpoint);
        let request = self.build_request(Method::DELETE, &url);

        // 响应体内容不影响结果
        self.send(request, Method::DELETE, &url).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BackupError;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client_for(server: &MockServer) -> VscaleClient {
        VscaleClient::new(format!("{}/", server.uri()), "test-token").unwrap()
    }

    #[tokio::test]
    async fn test_list_servers_sends_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/scalets"))
            .and(header("X-Token", "test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"ctid": 1, "name": "web1", "status": "started"},
                {"ctid": 2, "name": "db1", "status": "stopped"}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let servers = client_for(&server).await.list_servers().await.unwrap();
        assert_eq!(
            servers,
            vec![
                Server { id: 1, name: "web1".into() },
                Server { id: 2, name: "db1".into() },
            ]
        );
    }

    #[tokio::test]
    async fn test_list_backups_tolerates_missing_owner() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/backups"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": "b1", "name": "web1_auto_backup_2023-01-01T00:00:00Z", "scalet": 1, "status": "finished"},
                {"id": "b2", "name": "orphan", "scalet": null}
            ])))
            .mount(&server)
            .await;

        let backups = client_for(&server).await.list_backups().await.unwrap();
        assert_eq!(backups.len(), 2);
        assert_eq!(backups[0].server_id, Some(1));
        assert_eq!(backups[0].status.as_deref(), Some("finished"));
        assert_eq!(backups[1].server_id, None);
    }

    #[tokio::test]
    async fn test_list_backups_skips_malformed_records() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/backups"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": "b1", "name": "web1_auto_backup_2023-01-01T00:00:00Z", "scalet": 1},
                {"id": 10, "name": "something_manual", "scalet": 1},
                {"id": 11, "name": null, "scalet": 1},
                {"name": "no_id", "scalet": 1},
                "not-an-object"
            ])))
            .mount(&server)
            .await;

        let backups = client_for(&server).await.list_backups().await.unwrap();
        let ids: Vec<&str> = backups.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["b1", "10"]);
        assert_eq!(backups[1].name, "something_manual");
    }

    #[tokio::test]
    async fn test_malformed_body_is_serde_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/scalets"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = client_for(&server).await.list_servers().await.unwrap_err();
        assert!(matches!(err, BackupError::Serde(_)), "unexpected error: {err:?}");
        assert_eq!(err.remote_status(), None);
    }

    #[tokio::test]
    async fn test_create_backup_posts_name() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/scalets/42/backup"))
            .and(header("X-Token", "test-token"))
            .and(body_json(json!({"name": "web1_auto_backup_2023-01-03T00:00:00.000Z"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "new-backup",
                "name": "web1_auto_backup_2023-01-03T00:00:00.000Z",
                "status": "creating"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let handle = client_for(&server)
            .await
            .create_backup(42, "web1_auto_backup_2023-01-03T00:00:00.000Z")
            .await
            .unwrap();
        assert_eq!(handle.id, "new-backup");
        assert_eq!(handle.status.as_deref(), Some("creating"));
    }

    #[tokio::test]
    async fn test_delete_backup_by_id() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/v1/backups/b1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "b1"})))
            .expect(1)
            .mount(&server)
            .await;

        client_for(&server).await.delete_backup("b1").await.unwrap();
    }

    #[tokio::test]
    async fn test_failure_surfaces_status_headers_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/scalets/1/backup"))
            .respond_with(
                ResponseTemplate::new(429)
                    .insert_header("Retry-After", "10")
                    .set_body_string("too many requests"),
            )
            .mount(&server)
            .await;

        let err = client_for(&server)
            .await
            .create_backup(1, "web1_auto_backup_x")
            .await
            .unwrap_err();

        assert_eq!(err.remote_status(), Some(429));
        match err {
            BackupError::Remote(remote) => {
                assert_eq!(remote.method, "POST");
                assert!(remote.url.ends_with("/v1/scalets/1/backup"));
                assert_eq!(remote.body, "too many requests");
                assert_eq!(
                    remote.headers.get("retry-after").and_then(|v| v.to_str().ok()),
                    Some("10")
                );
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_find_backup_scans_listing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/backups"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": "b1", "name": "a", "scalet": 1},
                {"id": "b2", "name": "b", "scalet": 1}
            ])))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        assert_eq!(client.find_backup("b2").await.unwrap().unwrap().name, "b");
        assert!(client.find_backup("b3").await.unwrap().is_none());
    }
}
