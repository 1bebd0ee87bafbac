//! HTTP implementation of the catalog collaborators

use async_trait::async_trait;
use catalog_core::{
    AuthToken, Authenticator, CatalogRemote, CatalogResult, Credentials, Product, ProductInput,
};
use log::{debug, info};
use reqwest::Method;
use serde::Serialize;

use super::{
    create_http_client, decode, handle_response_error, transport_error, ApiClientConfig,
};

/// Catalog REST API client
pub struct HttpCatalogClient {
    client: reqwest::Client,
    config: ApiClientConfig,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

impl HttpCatalogClient {
    /// Create a new catalog API client
    pub fn new(config: ApiClientConfig) -> CatalogResult<Self> {
        let client = create_http_client(&config)?;

        info!("Created catalog API client for {}", config.base_url);

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ApiClientConfig {
        &self.config
    }

    fn product_path(prefix: &str, id: &str) -> String {
        format!("{}/{}", prefix, urlencoding::encode(id))
    }

    /// Send a request and return the body of a successful response
    ///
    /// `resource` names what a 404 refers to.
    async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        token: Option<&AuthToken>,
        body: Option<&B>,
        operation: &str,
        resource: &str,
    ) -> CatalogResult<String> {
        let url = self.config.endpoint(path);

        debug!("{} {}", method, url);

        let mut request = self.client.request(method, &url);
        if let Some(token) = token {
            request = request.header(reqwest::header::AUTHORIZATION, token.bearer());
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| transport_error(e, operation, self.config.timeout_seconds))?;

        if !response.status().is_success() {
            return Err(handle_response_error(response, operation, resource).await);
        }

        response
            .text()
            .await
            .map_err(|e| transport_error(e, operation, self.config.timeout_seconds))
    }
}

#[async_trait]
impl Authenticator for HttpCatalogClient {
    async fn authenticate(&self, credentials: &Credentials) -> CatalogResult<AuthToken> {
        let request = LoginRequest {
            email: &credentials.email,
            password: &credentials.password,
        };

        let body = self
            .send(Method::POST, "auth/login", None, Some(&request), "login", "auth/login")
            .await?;

        let token = decode::decode_token(&body)?;
        info!("Signed in as {}", credentials.email);
        Ok(token)
    }
}

#[async_trait]
impl CatalogRemote for HttpCatalogClient {
    async fn list_products(&self, token: &AuthToken) -> CatalogResult<Vec<Product>> {
        let body = self
            .send::<()>(Method::GET, "product", Some(token), None, "list_products", "product")
            .await?;

        let products = decode::decode_products(&body)?;
        debug!("Fetched {} products", products.len());
        Ok(products)
    }

    async fn get_product(&self, token: &AuthToken, id: &str) -> CatalogResult<Product> {
        let resource = format!("product {}", id);
        let body = self
            .send::<()>(
                Method::GET,
                &Self::product_path("product", id),
                Some(token),
                None,
                "get_product",
                &resource,
            )
            .await?;

        decode::decode_product(&body)
    }

    async fn create_product(
        &self,
        token: &AuthToken,
        input: &ProductInput,
    ) -> CatalogResult<Product> {
        let body = self
            .send(Method::POST, "product", Some(token), Some(input), "create_product", "product")
            .await?;

        let product = decode::decode_product(&body)?;
        info!("Created product {}", product.id);
        Ok(product)
    }

    async fn update_product(
        &self,
        token: &AuthToken,
        id: &str,
        input: &ProductInput,
    ) -> CatalogResult<Product> {
        let resource = format!("product {}", id);
        let body = self
            .send(
                Method::PUT,
                &Self::product_path("product/update", id),
                Some(token),
                Some(input),
                "update_product",
                &resource,
            )
            .await?;

        let product = decode::decode_product(&body)?;
        info!("Updated product {}", product.id);
        Ok(product)
    }

    async fn delete_product(&self, token: &AuthToken, id: &str) -> CatalogResult<()> {
        let resource = format!("product {}", id);
        self.send::<()>(
            Method::DELETE,
            &Self::product_path("product/delete", id),
            Some(token),
            None,
            "delete_product",
            &resource,
        )
        .await?;

        info!("Deleted product {}", id);
        Ok(())
    }
}
