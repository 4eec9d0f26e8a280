#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use axum::{
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use tokio::net::TcpListener;
use uuid::Uuid;

use culinary_api::catalog::{
    Brand, BrandDraft, CatalogError, CatalogStore, Category, CategoryDraft, Entity, Food,
    FoodDraft, FoodTable, FoodType, FoodTypeDraft, FoodTypeTable, Readiness, Relation,
};
use culinary_api::config::AppConfig;
use culinary_api::identity::{Identity, IdentityError, IdentityProvider};
use culinary_api::pagination::PageRequest;
use culinary_api::{app, AppState};

pub const TOKEN: &str = "valid-token";

pub fn test_config() -> AppConfig {
    let mut config = AppConfig::development(
        "postgres://localhost/culinary_test".to_string(),
        "http://127.0.0.1:1".to_string(),
    );
    config.auth.cache_ttl_secs = 0;
    config.pagination.max_page_size = 50;
    config
}

pub fn identity(name: &str) -> Identity {
    Identity {
        id: Uuid::new_v4(),
        timestamp: Utc::now(),
        name: name.to_string(),
    }
}

// In-memory catalog

#[derive(Default)]
pub struct Tables {
    pub categories: Vec<Category>,
    pub brands: Vec<Brand>,
    pub food_types: Vec<FoodType>,
    pub foods: Vec<Food>,
}

/// Stand-in for Postgres: unique names, foreign keys, insertion order.
/// Every store call is counted.
#[derive(Clone, Default)]
pub struct MemoryCatalog {
    tables: Arc<Mutex<Tables>>,
    calls: Arc<AtomicUsize>,
    unhealthy: Arc<AtomicBool>,
    delay_ms: Arc<AtomicU64>,
}

impl MemoryCatalog {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.unhealthy.store(!healthy, Ordering::SeqCst);
    }

    /// Make every `get` wait this long before answering.
    pub fn set_delay(&self, delay: Duration) {
        self.delay_ms.store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    async fn stall(&self) {
        let ms = self.delay_ms.load(Ordering::SeqCst);
        if ms > 0 {
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }
    }

    pub fn with_tables<T>(&self, f: impl FnOnce(&mut Tables) -> T) -> T {
        let mut tables = self.tables.lock().unwrap();
        f(&mut tables)
    }

    fn touch(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

/// Per-entity access to the in-memory tables.
pub trait MemoryEntity: Entity<Row = Self> + Clone {
    fn rows(tables: &Tables) -> &Vec<Self>;
    fn rows_mut(tables: &mut Tables) -> &mut Vec<Self>;
    fn id(&self) -> Uuid;
    fn name(&self) -> &str;
    fn draft_name(draft: &Self::Draft) -> &str;
    fn build(id: Uuid, user: Uuid, draft: &Self::Draft) -> Self;
    fn apply(&mut self, draft: &Self::Draft);
    fn references_exist(tables: &Tables, draft: &Self::Draft) -> bool;
    fn is_referenced(tables: &Tables, id: Uuid) -> bool;
    fn table(&self, tables: &Tables) -> Self::Table;
}

fn relation(id: Uuid, name: Option<&str>) -> Relation {
    Relation {
        id,
        name: name.unwrap_or_default().to_string(),
    }
}

impl MemoryEntity for Category {
    fn rows(tables: &Tables) -> &Vec<Self> {
        &tables.categories
    }
    fn rows_mut(tables: &mut Tables) -> &mut Vec<Self> {
        &mut tables.categories
    }
    fn id(&self) -> Uuid {
        self.id
    }
    fn name(&self) -> &str {
        &self.name
    }
    fn draft_name(draft: &CategoryDraft) -> &str {
        &draft.name
    }
    fn build(id: Uuid, user: Uuid, draft: &CategoryDraft) -> Self {
        Category {
            id,
            timestamp: Utc::now(),
            user,
            name: draft.name.clone(),
        }
    }
    fn apply(&mut self, draft: &CategoryDraft) {
        self.name = draft.name.clone();
    }
    fn references_exist(_: &Tables, _: &CategoryDraft) -> bool {
        true
    }
    fn is_referenced(tables: &Tables, id: Uuid) -> bool {
        tables.food_types.iter().any(|ft| ft.category == id)
    }
    fn table(&self, _: &Tables) -> Category {
        self.clone()
    }
}

impl MemoryEntity for Brand {
    fn rows(tables: &Tables) -> &Vec<Self> {
        &tables.brands
    }
    fn rows_mut(tables: &mut Tables) -> &mut Vec<Self> {
        &mut tables.brands
    }
    fn id(&self) -> Uuid {
        self.id
    }
    fn name(&self) -> &str {
        &self.name
    }
    fn draft_name(draft: &BrandDraft) -> &str {
        &draft.name
    }
    fn build(id: Uuid, user: Uuid, draft: &BrandDraft) -> Self {
        Brand {
            id,
            timestamp: Utc::now(),
            user,
            name: draft.name.clone(),
        }
    }
    fn apply(&mut self, draft: &BrandDraft) {
        self.name = draft.name.clone();
    }
    fn references_exist(_: &Tables, _: &BrandDraft) -> bool {
        true
    }
    fn is_referenced(tables: &Tables, id: Uuid) -> bool {
        tables.foods.iter().any(|f| f.brand == id)
    }
    fn table(&self, _: &Tables) -> Brand {
        self.clone()
    }
}

impl MemoryEntity for FoodType {
    fn rows(tables: &Tables) -> &Vec<Self> {
        &tables.food_types
    }
    fn rows_mut(tables: &mut Tables) -> &mut Vec<Self> {
        &mut tables.food_types
    }
    fn id(&self) -> Uuid {
        self.id
    }
    fn name(&self) -> &str {
        &self.name
    }
    fn draft_name(draft: &FoodTypeDraft) -> &str {
        &draft.name
    }
    fn build(id: Uuid, user: Uuid, draft: &FoodTypeDraft) -> Self {
        FoodType {
            id,
            timestamp: Utc::now(),
            user,
            category: draft.category,
            name: draft.name.clone(),
        }
    }
    fn apply(&mut self, draft: &FoodTypeDraft) {
        self.name = draft.name.clone();
        self.category = draft.category;
    }
    fn references_exist(tables: &Tables, draft: &FoodTypeDraft) -> bool {
        tables.categories.iter().any(|c| c.id == draft.category)
    }
    fn is_referenced(tables: &Tables, id: Uuid) -> bool {
        tables.foods.iter().any(|f| f.foodtype == id)
    }
    fn table(&self, tables: &Tables) -> FoodTypeTable {
        let category = tables.categories.iter().find(|c| c.id == self.category);
        FoodTypeTable {
            id: self.id,
            timestamp: self.timestamp,
            user: self.user,
            category: relation(self.category, category.map(|c| c.name.as_str())),
            name: self.name.clone(),
        }
    }
}

impl MemoryEntity for Food {
    fn rows(tables: &Tables) -> &Vec<Self> {
        &tables.foods
    }
    fn rows_mut(tables: &mut Tables) -> &mut Vec<Self> {
        &mut tables.foods
    }
    fn id(&self) -> Uuid {
        self.id
    }
    fn name(&self) -> &str {
        &self.name
    }
    fn draft_name(draft: &FoodDraft) -> &str {
        &draft.name
    }
    fn build(id: Uuid, user: Uuid, draft: &FoodDraft) -> Self {
        Food {
            id,
            timestamp: Utc::now(),
            user,
            foodtype: draft.food_type,
            brand: draft.brand,
            name: draft.name.clone(),
            nutrition: draft.nutrition,
        }
    }
    fn apply(&mut self, draft: &FoodDraft) {
        self.name = draft.name.clone();
        self.foodtype = draft.food_type;
        self.brand = draft.brand;
        self.nutrition = draft.nutrition;
    }
    fn references_exist(tables: &Tables, draft: &FoodDraft) -> bool {
        tables.food_types.iter().any(|ft| ft.id == draft.food_type)
            && tables.brands.iter().any(|b| b.id == draft.brand)
    }
    fn is_referenced(_: &Tables, _: Uuid) -> bool {
        false
    }
    fn table(&self, tables: &Tables) -> FoodTable {
        let food_type = tables.food_types.iter().find(|ft| ft.id == self.foodtype);
        let brand = tables.brands.iter().find(|b| b.id == self.brand);
        FoodTable {
            id: self.id,
            timestamp: self.timestamp,
            user: self.user,
            foodtype: relation(self.foodtype, food_type.map(|ft| ft.name.as_str())),
            brand: relation(self.brand, brand.map(|b| b.name.as_str())),
            name: self.name.clone(),
            nutrition: self.nutrition,
        }
    }
}

fn check_unique<E: MemoryEntity>(tables: &Tables, name: &str, except: Option<Uuid>) -> Result<(), CatalogError> {
    let taken = E::rows(tables)
        .iter()
        .any(|row| row.name() == name && Some(row.id()) != except);
    if taken {
        return Err(CatalogError::DuplicateName(E::LABEL));
    }
    Ok(())
}

#[async_trait]
impl<E: MemoryEntity> CatalogStore<E> for MemoryCatalog {
    async fn list(&self, page: PageRequest) -> Result<Vec<E::Table>, CatalogError> {
        self.touch();
        self.with_tables(|tables| {
            Ok(E::rows(tables)
                .iter()
                .skip(page.offset() as usize)
                .take(page.limit() as usize)
                .map(|row| row.table(tables))
                .collect())
        })
    }

    async fn count(&self) -> Result<i64, CatalogError> {
        self.touch();
        self.with_tables(|tables| Ok(E::rows(tables).len() as i64))
    }

    async fn get(&self, id: Uuid) -> Result<E::Row, CatalogError> {
        self.touch();
        self.stall().await;
        self.with_tables(|tables| {
            E::rows(tables)
                .iter()
                .find(|row| row.id() == id)
                .cloned()
                .ok_or(CatalogError::NotFound(E::LABEL))
        })
    }

    async fn create(&self, user: Uuid, draft: &E::Draft) -> Result<Uuid, CatalogError> {
        self.touch();
        self.with_tables(|tables| {
            check_unique::<E>(tables, E::draft_name(draft), None)?;
            if !E::references_exist(tables, draft) {
                return Err(CatalogError::ForeignKeyInvalid("Referenced record does not exist".to_string()));
            }
            let id = Uuid::new_v4();
            E::rows_mut(tables).push(E::build(id, user, draft));
            Ok(id)
        })
    }

    async fn edit(&self, id: Uuid, draft: &E::Draft) -> Result<(), CatalogError> {
        self.touch();
        self.with_tables(|tables| {
            check_unique::<E>(tables, E::draft_name(draft), Some(id))?;
            if !E::references_exist(tables, draft) {
                return Err(CatalogError::ForeignKeyInvalid("Referenced record does not exist".to_string()));
            }
            let row = E::rows_mut(tables)
                .iter_mut()
                .find(|row| row.id() == id)
                .ok_or(CatalogError::NotFound(E::LABEL))?;
            row.apply(draft);
            Ok(())
        })
    }

    async fn delete(&self, id: Uuid) -> Result<(), CatalogError> {
        self.touch();
        self.with_tables(|tables| {
            if E::is_referenced(tables, id) {
                return Err(CatalogError::ForeignKeyInvalid(format!("{} is still referenced", E::LABEL)));
            }
            let rows = E::rows_mut(tables);
            let before = rows.len();
            rows.retain(|row| row.id() != id);
            if rows.len() == before {
                return Err(CatalogError::NotFound(E::LABEL));
            }
            Ok(())
        })
    }
}

#[async_trait]
impl Readiness for MemoryCatalog {
    async fn ping(&self) -> Result<(), CatalogError> {
        if self.unhealthy.load(Ordering::SeqCst) {
            return Err(CatalogError::Storage("connection refused".to_string()));
        }
        Ok(())
    }
}

// Identity fake

/// Accepts a fixed set of tokens and counts how often it is asked.
#[derive(Default)]
pub struct StaticIdentity {
    tokens: Mutex<HashMap<String, Identity>>,
    calls: AtomicUsize,
}

impl StaticIdentity {
    pub fn with_token(token: &str, identity: Identity) -> Self {
        let fake = Self::default();
        fake.tokens.lock().unwrap().insert(token.to_string(), identity);
        fake
    }

    pub fn revoke(&self, token: &str) {
        self.tokens.lock().unwrap().remove(token);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentity {
    async fn validate_token(&self, token: &str) -> Result<Identity, IdentityError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.tokens
            .lock()
            .unwrap()
            .get(token)
            .cloned()
            .ok_or(IdentityError::Rejected(401))
    }
}

// In-process server

pub struct TestApp {
    pub base_url: String,
    pub catalog: MemoryCatalog,
    pub identity: Arc<StaticIdentity>,
    pub user: Identity,
    pub client: reqwest::Client,
}

pub fn build_router(catalog: &MemoryCatalog, identity: Arc<StaticIdentity>, config: &AppConfig) -> Router {
    let state = AppState {
        categories: Arc::new(catalog.clone()),
        brands: Arc::new(catalog.clone()),
        food_types: Arc::new(catalog.clone()),
        foods: Arc::new(catalog.clone()),
        readiness: Arc::new(catalog.clone()),
        identity,
    };
    app(state, config).expect("test config is valid")
}

impl TestApp {
    pub async fn spawn() -> Result<Self> {
        Self::spawn_with(test_config()).await
    }

    pub async fn spawn_with(config: AppConfig) -> Result<Self> {
        let user = identity("ada");
        let identity = Arc::new(StaticIdentity::with_token(TOKEN, user.clone()));
        let catalog = MemoryCatalog::default();
        let router = build_router(&catalog, identity.clone(), &config);

        let base_url = serve(router).await?;
        Ok(Self {
            base_url,
            catalog,
            identity,
            user,
            client: reqwest::Client::new(),
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.client.get(self.url(path)).bearer_auth(TOKEN)
    }

    pub fn post(&self, path: &str, body: serde_json::Value) -> reqwest::RequestBuilder {
        self.client.post(self.url(path)).bearer_auth(TOKEN).json(&body)
    }

    pub fn put(&self, path: &str, body: serde_json::Value) -> reqwest::RequestBuilder {
        self.client.put(self.url(path)).bearer_auth(TOKEN).json(&body)
    }

    pub fn delete(&self, path: &str) -> reqwest::RequestBuilder {
        self.client.delete(self.url(path)).bearer_auth(TOKEN)
    }

    /// POST a body and return the new id, failing unless the server answered 201.
    pub async fn create(&self, resource: &str, body: serde_json::Value) -> Result<String> {
        let res = self.post(&format!("/api/v1/{}", resource), body).send().await?;
        let status = res.status();
        let body = res.json::<serde_json::Value>().await?;
        anyhow::ensure!(status == StatusCode::CREATED, "expected 201, got {}: {}", status, body);
        body["id"]
            .as_str()
            .map(str::to_string)
            .context("create response has no id")
    }
}

/// Bind a picked port, serve `router` on it in the background, and return the base URL.
pub async fn serve(router: Router) -> Result<String> {
    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    let listener = TcpListener::bind(("127.0.0.1", port))
        .await
        .with_context(|| format!("failed to bind port {}", port))?;

    tokio::spawn(async move {
        axum::serve(listener, router).await.ok();
    });

    Ok(format!("http://127.0.0.1:{}", port))
}

/// A stand-in identity service answering `GET /ping` for the given tokens.
/// The token `garbled` gets a 200 with a body that is not an identity.
pub async fn spawn_identity_service(tokens: HashMap<String, Identity>) -> Result<String> {
    let tokens = Arc::new(tokens);
    let router = Router::new().route(
        "/ping",
        get(move |headers: HeaderMap| {
            let tokens = tokens.clone();
            async move {
                let token = headers
                    .get(AUTHORIZATION)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.strip_prefix("Bearer "))
                    .unwrap_or_default();

                if token == "garbled" {
                    return (StatusCode::OK, Json(serde_json::json!({ "ok": true })));
                }
                match tokens.get(token) {
                    Some(identity) => (StatusCode::OK, Json(serde_json::json!(identity))),
                    None => (
                        StatusCode::UNAUTHORIZED,
                        Json(serde_json::json!({ "error": "invalid token" })),
                    ),
                }
            }
        }),
    );

    serve(router).await
}
