//! End-to-end test: configuration file to dispatched request.

use std::sync::Arc;

use http::Method;
use ramify::core::fixtures::{MemoryAclFactory, MemoryIndex, MemoryModel};
use ramify::prelude::*;
use serde_json::json;

const CONFIG: &str = r#"
[views]
default_limit = 2
raw_search_results = true

[search_index]
enabled = false
"#;

fn registry(config: &RamifyConfig) -> ViewRegistry {
    let mut tree = ResourceTree::builder();
    let users = tree.add(None, ResourceSpec::new("user", "users")).unwrap();

    let index = Arc::new(MemoryIndex::new("users").with_documents([json!({"id": 99})]));
    let model = Arc::new(MemoryModel::new("User").with_rows([
        json!({"id": 1}),
        json!({"id": 2}),
        json!({"id": 3}),
    ]));

    ViewRegistry::builder(Arc::new(tree.build()))
        .with_config(config)
        .bind(
            users,
            ViewBinding::new(model, Arc::new(MemoryAclFactory::new())).search_indexed(index),
        )
        .unwrap()
        .build()
}

#[tokio::test]
async fn test_configured_limit_and_disabled_index() {
    let config = ConfigLoader::new()
        .with_defaults()
        .with_string(CONFIG, "toml")
        .unwrap()
        .load()
        .unwrap();
    let dispatcher = Dispatcher::new(Arc::new(registry(&config)));

    let output = dispatcher
        .dispatch(RequestContext::new(Method::GET, "/users"))
        .await
        .unwrap();

    // With the index disabled the primary store answers, two rows per page.
    let ViewOutput::Collection(page) = output else {
        panic!("expected a primary-store collection");
    };
    assert_eq!(page.len(), 2);
    assert_eq!(page.total, Some(3));
}

#[test]
fn test_init_rejects_bad_filter() {
    let mut config = RamifyConfig::default();
    config.logging.level = "ramify=loudest".to_string();
    assert!(ramify::init(&config).is_err());
}
