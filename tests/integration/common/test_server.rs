use mockshape::adapters::store::Definitions;
use mockshape::config::{EngineSettings, ServerSettings, Settings};
use mockshape::domain::{
    ArrayElement, Endpoint, FakerType, HttpMethod, ItemCount, ResponseWrapper, Schema,
    SchemaField,
};
use mockshape::AppContext;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;

pub struct TestServer {
    pub addr: SocketAddr,
    pub base_url: String,
    pub ctx: Arc<AppContext>,
}

impl TestServer {
    pub async fn new() -> Self {
        Self::with_definitions(sample_definitions()).await
    }

    pub async fn with_definitions(definitions: Definitions) -> Self {
        let settings = Settings {
            server: ServerSettings {
                host: "127.0.0.1".to_string(),
                port: 0, // Random port
            },
            engine: EngineSettings::default(),
            rate_limit: None,
            schemas: definitions.schemas,
            endpoints: definitions.endpoints,
            response_wrappers: definitions.response_wrappers,
        };
        let ctx = Arc::new(AppContext::new(settings).unwrap());
        let app = mockshape::create_app(&ctx);

        // Start server on random port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Wait for server to be ready
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        TestServer {
            addr,
            base_url,
            ctx,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

fn endpoint(id: &str, method: HttpMethod, path: &str, schema_id: &str) -> Endpoint {
    Endpoint {
        id: id.to_string(),
        project_id: "default".to_string(),
        method,
        path: path.to_string(),
        schema_id: schema_id.to_string(),
        wrapper_id: None,
        status: None,
    }
}

/// Users with addresses, a wrapped list endpoint and a cyclic pair.
pub fn sample_definitions() -> Definitions {
    let mut list = endpoint("list-users", HttpMethod::Get, "/users", "user-page");
    list.wrapper_id = Some("envelope".to_string());
    let mut create = endpoint("create-user", HttpMethod::Post, "/users", "user");
    create.status = Some(201);

    Definitions {
        schemas: vec![
            Schema::new(
                "user",
                vec![
                    SchemaField::primitive("id", FakerType::new("uuid")),
                    SchemaField::primitive("email", FakerType::new("email")),
                    SchemaField::primitive(
                        "age",
                        FakerType::new("integer")
                            .with_param("min", json!(18))
                            .with_param("max", json!(65)),
                    ),
                    SchemaField::object("address", "address"),
                ],
            ),
            Schema::new(
                "address",
                vec![
                    SchemaField::primitive("city", FakerType::new("city")),
                    SchemaField::primitive(
                        "zip",
                        FakerType::new("pattern").with_param("pattern", json!("#####")),
                    ),
                ],
            ),
            Schema::new(
                "user-page",
                vec![SchemaField::array(
                    "items",
                    ArrayElement::Object {
                        schema: "user".to_string(),
                    },
                    ItemCount::Fixed(3),
                )],
            ),
            Schema::new("left", vec![SchemaField::object("right", "right")]),
            Schema::new("right", vec![SchemaField::object("left", "left")]),
        ],
        endpoints: vec![
            list,
            create,
            endpoint("get-user", HttpMethod::Get, "/users/{id}", "user"),
            endpoint("cyclic", HttpMethod::Get, "/loop", "left"),
            endpoint("dangling", HttpMethod::Get, "/ghost", "ghost"),
        ],
        response_wrappers: vec![ResponseWrapper {
            id: "envelope".to_string(),
            project_id: "default".to_string(),
            name: "Envelope".to_string(),
            json: r#"{"ok": true, "data": "__PAYLOAD__", "meta": {"source": "mockshape"}}"#
                .to_string(),
        }],
    }
}
