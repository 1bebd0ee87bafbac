//! Tests for the catalog API clients

use super::*;
use catalog_core::{
    AuthToken, Authenticator, CatalogError, CatalogRemote, Credentials, ProductCategory,
    ProductInput,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

fn token() -> AuthToken {
    AuthToken::new(MOCK_TOKEN).unwrap()
}

fn input(name: &str) -> ProductInput {
    ProductInput {
        name: name.to_string(),
        description: "A sturdy product for everyday use.".to_string(),
        price: 19.5,
        category: ProductCategory::Books,
        stock: 3,
        image: "https://example.com/item.jpg".to_string(),
    }
}

/// Serve exactly one canned response and hand back the raw request
async fn serve_once(status: u16, body: &'static str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}/api", listener.local_addr().unwrap());

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = Vec::new();
        let mut buf = [0u8; 4096];

        // Head, then as much body as Content-Length announces
        loop {
            let n = socket.read(&mut buf).await.unwrap();
            request.extend_from_slice(&buf[..n]);
            let text = String::from_utf8_lossy(&request).to_string();
            if let Some(head_end) = text.find("\r\n\r\n") {
                let length = text[..head_end]
                    .lines()
                    .find_map(|line| {
                        let lower = line.to_ascii_lowercase();
                        lower
                            .strip_prefix("content-length:")
                            .map(|v| v.trim().parse::<usize>().unwrap_or(0))
                    })
                    .unwrap_or(0);
                if request.len() >= head_end + 4 + length {
                    break;
                }
            }
            if n == 0 {
                break;
            }
        }

        let response = format!(
            "HTTP/1.1 {} X\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.unwrap();

        String::from_utf8_lossy(&request).to_string()
    });

    (base_url, handle)
}

fn client(base_url: &str) -> HttpCatalogClient {
    HttpCatalogClient::new(ApiClientConfig::new(base_url).with_timeout(2).without_proxy()).unwrap()
}

#[test]
fn test_api_client_config_creation() {
    let config = ApiClientConfig::default();
    assert_eq!(config.base_url, "http://localhost:4000/api");
    assert_eq!(config.timeout_seconds, 10);

    let custom = ApiClientConfig::new("https://catalog.example.com/api/")
        .with_timeout(3)
        .with_header("X-Tenant".to_string(), "acme".to_string());
    assert_eq!(custom.timeout_seconds, 3);
    assert_eq!(custom.headers.get("X-Tenant"), Some(&"acme".to_string()));
    assert_eq!(
        custom.endpoint("/product/update/7"),
        "https://catalog.example.com/api/product/update/7"
    );
}

#[test]
fn test_invalid_header_is_rejected() {
    let config =
        ApiClientConfig::default().with_header("bad header".to_string(), "x".to_string());
    assert!(matches!(
        HttpCatalogClient::new(config),
        Err(CatalogError::Config { .. })
    ));
}

#[test]
fn test_status_mapping() {
    assert!(matches!(
        status_error(401, "", "list_products", "product"),
        CatalogError::Authentication { .. }
    ));
    assert!(matches!(
        status_error(403, r#"{"message":"forbidden"}"#, "list_products", "product"),
        CatalogError::Authentication { .. }
    ));

    match status_error(404, "", "get_product", "product 9") {
        CatalogError::NotFound { resource, .. } => assert_eq!(resource, "product 9"),
        other => panic!("Expected NotFound, got {:?}", other),
    }

    match status_error(500, r#"{"message":"Database unavailable"}"#, "create_product", "product") {
        CatalogError::Remote {
            message, status, ..
        } => {
            assert_eq!(message, "Database unavailable");
            assert_eq!(status, Some(500));
        }
        other => panic!("Expected Remote, got {:?}", other),
    }

    match status_error(422, "not json", "create_product", "product") {
        CatalogError::Remote { message, .. } => assert_eq!(message, "Unprocessable Entity"),
        other => panic!("Expected Remote, got {:?}", other),
    }
}

#[tokio::test]
async fn test_list_products_sends_bearer_token() {
    let body = r#"{"data":[{"_id":"1","name":"Lamp","description":"A bright desk lamp.","price":10,"category":"home","stock":2,"image":"https://example.com/l.jpg","createdAt":"2023-01-01T00:00:00Z","updatedAt":"2023-01-02T00:00:00Z"}]}"#;
    let (base_url, server) = serve_once(200, body).await;

    let products = client(&base_url).list_products(&token()).await.unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].id, "1");

    let request = server.await.unwrap();
    assert!(request.starts_with("GET /api/product HTTP/1.1"));
    assert!(request
        .to_ascii_lowercase()
        .contains(&format!("authorization: bearer {}", MOCK_TOKEN)));
}

#[tokio::test]
async fn test_ids_are_percent_encoded() {
    let (base_url, server) = serve_once(200, "{}").await;

    client(&base_url).delete_product(&token(), "a/b c").await.unwrap();

    let request = server.await.unwrap();
    assert!(
        request.starts_with("DELETE /api/product/delete/a%2Fb%20c HTTP/1.1"),
        "{}",
        request
    );
}

#[tokio::test]
async fn test_update_uses_put_route() {
    let body = r#"{"product":{"id":"7","name":"Novel","description":"A sturdy product for everyday use.","price":19.5,"category":"books","stock":3,"image":"https://example.com/item.jpg","createdAt":"2023-01-01T00:00:00Z","updatedAt":"2024-01-01T00:00:00Z"}}"#;
    let (base_url, server) = serve_once(200, body).await;

    let product = client(&base_url)
        .update_product(&token(), "7", &input("Novel"))
        .await
        .unwrap();
    assert_eq!(product.name, "Novel");

    let request = server.await.unwrap();
    assert!(request.starts_with("PUT /api/product/update/7 HTTP/1.1"));
    assert!(request.contains(r#""name":"Novel""#));
}

#[tokio::test]
async fn test_login_decodes_token() {
    let (base_url, server) = serve_once(200, r#"{"token":"server-token"}"#).await;

    let token = client(&base_url)
        .authenticate(&Credentials::new("user@example.com", "password123"))
        .await
        .unwrap();
    assert_eq!(token.as_str(), "server-token");

    let request = server.await.unwrap();
    assert!(request.starts_with("POST /api/auth/login HTTP/1.1"));
    assert!(!request.to_ascii_lowercase().contains("authorization:"));
}

#[tokio::test]
async fn test_error_status_is_mapped() {
    let (base_url, _server) = serve_once(404, r#"{"message":"Product not found"}"#).await;

    let result = client(&base_url).get_product(&token(), "42").await;
    assert!(matches!(result, Err(CatalogError::NotFound { .. })));
}

#[tokio::test]
async fn test_malformed_body_is_decode_error() {
    let (base_url, _server) = serve_once(200, r#"{"data":[{"id":"1"}]}"#).await;

    let result = client(&base_url).list_products(&token()).await;
    assert!(matches!(result, Err(CatalogError::Decode { .. })));
}

#[tokio::test]
async fn test_connection_refused_is_network_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}/api", listener.local_addr().unwrap());
    drop(listener);

    let result = client(&base_url).list_products(&token()).await;
    assert!(matches!(result, Err(CatalogError::Network { .. })));
}

#[tokio::test]
async fn test_unresponsive_server_times_out() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}/api", listener.local_addr().unwrap());
    let _hold = tokio::spawn(async move {
        let (_socket, _) = listener.accept().await.unwrap();
        tokio::time::sleep(std::time::Duration::from_secs(10)).await;
    });

    let client = HttpCatalogClient::new(
        ApiClientConfig::new(&base_url)
            .with_timeout(1)
            .without_proxy(),
    )
    .unwrap();
    match client.list_products(&token()).await {
        Err(CatalogError::Timeout { duration_ms, .. }) => assert_eq!(duration_ms, 1000),
        other => panic!("Expected Timeout, got {:?}", other.map(|p| p.len())),
    }
}

#[tokio::test]
async fn test_mock_authentication() {
    let mock = MockCatalogRemote::seeded();

    let token = mock
        .authenticate(&Credentials::new(MOCK_EMAIL, MOCK_PASSWORD))
        .await
        .unwrap();
    assert_eq!(token.as_str(), MOCK_TOKEN);

    let rejected = mock
        .authenticate(&Credentials::new(MOCK_EMAIL, "wrong-password"))
        .await;
    assert!(matches!(rejected, Err(CatalogError::Authentication { .. })));
    assert_eq!(mock.calls().authenticate, 2);
}

#[tokio::test]
async fn test_mock_rejects_foreign_token() {
    let mock = MockCatalogRemote::seeded();
    let foreign = AuthToken::new("someone-else").unwrap();

    assert!(matches!(
        mock.list_products(&foreign).await,
        Err(CatalogError::Authentication { .. })
    ));
}

#[tokio::test]
async fn test_mock_crud() {
    let mock = MockCatalogRemote::seeded();
    let token = token();

    assert_eq!(mock.list_products(&token).await.unwrap().len(), 8);

    let created = mock.create_product(&token, &input("Field Guide")).await.unwrap();
    assert!(!created.id.is_empty());
    assert_eq!(mock.snapshot().await.len(), 9);

    let updated = mock
        .update_product(&token, &created.id, &input("Field Guide, 2nd ed."))
        .await
        .unwrap();
    assert_eq!(updated.id, created.id);
    assert_eq!(updated.created_at, created.created_at);
    assert!(updated.updated_at >= created.updated_at);

    mock.delete_product(&token, &created.id).await.unwrap();
    assert!(matches!(
        mock.get_product(&token, &created.id).await,
        Err(CatalogError::NotFound { .. })
    ));
    assert!(matches!(
        mock.delete_product(&token, &created.id).await,
        Err(CatalogError::NotFound { .. })
    ));

    let calls = mock.calls();
    assert_eq!(calls.create, 1);
    assert_eq!(calls.delete, 2);
    assert_eq!(calls.total(), 6);
}

#[tokio::test]
async fn test_mock_failure_injection_is_consumed_in_order() {
    let mock = MockCatalogRemote::seeded();
    mock.fail_next(MockFailure::Status(500)).await;
    mock.fail_next(MockFailure::Network).await;

    assert!(matches!(
        mock.list_products(&token()).await,
        Err(CatalogError::Remote {
            status: Some(500),
            ..
        })
    ));
    assert!(matches!(
        mock.list_products(&token()).await,
        Err(CatalogError::Network { .. })
    ));
    assert!(mock.list_products(&token()).await.is_ok());
}

#[test]
fn test_backend_selection() {
    let mut config = catalog_core::CatalogConfig::default();
    assert!(RemoteBackend::from_config(&config).is_ok());

    config.api.mode = catalog_core::RemoteMode::Mock;
    assert!(RemoteBackend::from_config(&config).is_ok());
}

#[test]
fn test_empty_mock_has_no_products() {
    let mock = MockCatalogRemote::default();
    let products = tokio_test::block_on(mock.list_products(&token())).unwrap();
    assert!(products.is_empty());

    let missing = tokio_test::block_on(mock.get_product(&token(), "1"));
    assert!(matches!(missing, Err(CatalogError::NotFound { .. })));
}

#[tokio::test]
async fn test_mock_lists_new_products_first() {
    let mock = MockCatalogRemote::seeded();
    let token = token();

    let created = mock.create_product(&token, &input("Field Guide")).await.unwrap();
    let listed = mock.list_products(&token).await.unwrap();

    assert_eq!(listed[0].id, created.id);
    assert_eq!(listed[1].id, "1");
}
