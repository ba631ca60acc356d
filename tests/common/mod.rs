#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use concessions_api::{
    build_router,
    config::AppConfig,
    db,
    entities::{
        auditorium, bundle_item, cart_item, code_puzzle, coupon, customer, customer_showing,
        driver, movie, movie_showing, payment_method, product, seat, staff, theatre, DriverStatus,
        StaffRole,
    },
    events::{Event, EventSender},
    handlers::AppServices,
    services::{
        bundles::BundleService,
        fulfillment::{DefaultFulfillment, Fulfillment},
        puzzles::PuzzleVerifier,
    },
    AppState,
};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use serde_json::Value;
use tempfile::TempDir;
use tokio::sync::mpsc;
use tower::ServiceExt;
use uuid::Uuid;

pub const CUSTOMER_USER: &str = "customer-1";
pub const ADMIN_USER: &str = "admin-1";

/// Seat booking chain shared by every fixture
#[derive(Debug, Clone, Copy)]
pub struct Venue {
    pub theatre_id: Uuid,
    pub auditorium_id: Uuid,
    pub seat_id: Uuid,
    pub movie_showing_id: Uuid,
}

/// Helper harness backed by a single-connection in-memory SQLite database.
pub struct TestApp {
    pub state: AppState,
    pub db: Arc<DatabaseConnection>,
    pub venue: Venue,
    pub puzzle_dir: TempDir,
    events: mpsc::Receiver<Event>,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_fulfillment(Arc::new(DefaultFulfillment)).await
    }

    pub async fn with_fulfillment(fulfillment: Arc<dyn Fulfillment>) -> Self {
        let puzzle_dir = tempfile::tempdir().expect("puzzle dir");

        let mut cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        // Every connection to sqlite::memory: is its own database
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;
        cfg.allow_puzzle_skip = true;
        cfg.puzzle_root = puzzle_dir.path().display().to_string();

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");
        let db = Arc::new(pool);

        let (tx, events) = mpsc::channel(256);
        let event_sender = Arc::new(EventSender::new(tx));
        let services = AppServices::new(
            db.clone(),
            event_sender.clone(),
            PuzzleVerifier::new(puzzle_dir.path()),
            fulfillment,
        );
        let state = AppState {
            db: db.clone(),
            config: cfg,
            event_sender,
            services,
        };

        let venue = seed_venue(&db).await;
        Self {
            state,
            db,
            venue,
            puzzle_dir,
            events,
        }
    }

    pub fn router(&self) -> Router {
        build_router(self.state.clone())
    }

    pub fn bundles(&self) -> &BundleService {
        &self.state.services.bundles
    }

    /// Sends a request through the full middleware stack
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        user: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user) = user {
            builder = builder.header("x-user-id", user);
        }
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request");

        let response = self.router().oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    /// Events emitted so far
    pub fn drain_events(&mut self) -> Vec<Event> {
        let mut out = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            out.push(event);
        }
        out
    }

    pub async fn create_customer(&self, user_id: &str) -> customer::Model {
        customer::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id.to_string()),
            name: Set(format!("Customer {}", user_id)),
            email: Set(format!("{}@example.com", user_id)),
            default_theatre_id: Set(Some(self.venue.theatre_id)),
            created_at: Set(Utc::now()),
        }
        .insert(self.db.as_ref())
        .await
        .expect("customer")
    }

    pub async fn create_staff(&self, user_id: &str, role: StaffRole) -> staff::Model {
        staff::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id.to_string()),
            name: Set(format!("Staff {}", user_id)),
            theatre_id: Set(self.venue.theatre_id),
            role: Set(role),
            created_at: Set(Utc::now()),
        }
        .insert(self.db.as_ref())
        .await
        .expect("staff")
    }

    pub async fn create_driver(&self, user_id: &str) -> driver::Model {
        driver::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id.to_string()),
            name: Set(format!("Driver {}", user_id)),
            rating: Set(Decimal::ZERO),
            rating_count: Set(0),
            status: Set(DriverStatus::Available),
            created_at: Set(Utc::now()),
        }
        .insert(self.db.as_ref())
        .await
        .expect("driver")
    }

    pub async fn create_product(&self, name: &str, price: Decimal, stock: i32) -> product::Model {
        product::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            description: Set(None),
            unit_price: Set(price),
            discount: Set(Decimal::ZERO),
            inventory_quantity: Set(stock),
            is_available: Set(true),
            created_at: Set(Utc::now()),
        }
        .insert(self.db.as_ref())
        .await
        .expect("product")
    }

    pub async fn create_payment_method(
        &self,
        customer: &customer::Model,
        balance: Decimal,
    ) -> payment_method::Model {
        payment_method::ActiveModel {
            id: Set(Uuid::new_v4()),
            customer_id: Set(customer.id),
            card_number: Set("4111111111111111".to_string()),
            expiration_month: Set(12),
            expiration_year: Set(2099),
            billing_address: Set("1 Main St".to_string()),
            balance: Set(balance),
            is_default: Set(true),
            created_at: Set(Utc::now()),
        }
        .insert(self.db.as_ref())
        .await
        .expect("payment method")
    }

    pub async fn book_showing(&self, customer: &customer::Model) -> customer_showing::Model {
        customer_showing::ActiveModel {
            id: Set(Uuid::new_v4()),
            customer_id: Set(customer.id),
            movie_showing_id: Set(self.venue.movie_showing_id),
            seat_id: Set(self.venue.seat_id),
            created_at: Set(Utc::now()),
        }
        .insert(self.db.as_ref())
        .await
        .expect("customer showing")
    }

    /// Puts a line straight into the cart, bypassing stock checks
    pub async fn put_in_cart(
        &self,
        customer: &customer::Model,
        product_id: Option<Uuid>,
        bundle_id: Option<Uuid>,
        quantity: i32,
    ) -> cart_item::Model {
        cart_item::ActiveModel {
            id: Set(Uuid::new_v4()),
            customer_id: Set(customer.id),
            product_id: Set(product_id),
            bundle_id: Set(bundle_id),
            quantity: Set(quantity),
            created_at: Set(Utc::now()),
        }
        .insert(self.db.as_ref())
        .await
        .expect("cart item")
    }

    pub async fn create_coupon(&self, code: &str, percent: Decimal, difficulty: i32) -> coupon::Model {
        coupon::ActiveModel {
            id: Set(Uuid::new_v4()),
            code: Set(code.to_string()),
            discount_percent: Set(percent),
            difficulty: Set(difficulty),
            is_active: Set(true),
            created_at: Set(Utc::now()),
        }
        .insert(self.db.as_ref())
        .await
        .expect("coupon")
    }

    pub async fn create_db_puzzle(
        &self,
        difficulty: i32,
        answer: &str,
        is_active: bool,
    ) -> code_puzzle::Model {
        code_puzzle::ActiveModel {
            id: Set(Uuid::new_v4()),
            difficulty: Set(difficulty),
            script: Set("print(6 * 7)".to_string()),
            answer: Set(answer.to_string()),
            is_active: Set(is_active),
            created_at: Set(Utc::now()),
        }
        .insert(self.db.as_ref())
        .await
        .expect("puzzle")
    }

    /// Writes `<pool>/<name>.py` and `<pool>/<name>.txt` under the puzzle root
    pub fn write_file_puzzle(&self, pool: &str, name: &str, answer: &str) {
        let dir = self.puzzle_dir.path().join(pool);
        std::fs::create_dir_all(&dir).expect("pool dir");
        write(&dir.join(format!("{}.py", name)), "print('answer')\n");
        write(&dir.join(format!("{}.txt", name)), answer);
    }

    /// Inserts a bundle row directly at the given price, without admin checks
    pub async fn insert_bundle_items(&self, bundle_id: Uuid, items: &[(Uuid, i32)]) {
        for (product_id, quantity) in items {
            bundle_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                bundle_id: Set(bundle_id),
                product_id: Set(*product_id),
                quantity: Set(*quantity),
            }
            .insert(self.db.as_ref())
            .await
            .expect("bundle item");
        }
    }

    pub async fn balance(&self, payment_method_id: Uuid) -> Decimal {
        payment_method::Entity::find_by_id(payment_method_id)
            .one(self.db.as_ref())
            .await
            .expect("query")
            .expect("payment method exists")
            .balance
    }

    pub async fn stock(&self, product_id: Uuid) -> i32 {
        product::Entity::find_by_id(product_id)
            .one(self.db.as_ref())
            .await
            .expect("query")
            .expect("product exists")
            .inventory_quantity
    }
}

fn write(path: &Path, contents: &str) {
    std::fs::write(path, contents).expect("write puzzle file");
}

async fn seed_venue(db: &DatabaseConnection) -> Venue {
    let theatre = theatre::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set("Grand Cinema".to_string()),
        address: Set("42 Film Ave".to_string()),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .expect("theatre");
    let auditorium = auditorium::ActiveModel {
        id: Set(Uuid::new_v4()),
        theatre_id: Set(theatre.id),
        number: Set(1),
    }
    .insert(db)
    .await
    .expect("auditorium");
    let seat = seat::ActiveModel {
        id: Set(Uuid::new_v4()),
        auditorium_id: Set(auditorium.id),
        aisle: Set("B".to_string()),
        number: Set(7),
    }
    .insert(db)
    .await
    .expect("seat");
    let movie = movie::ActiveModel {
        id: Set(Uuid::new_v4()),
        title: Set("The Long Intermission".to_string()),
    }
    .insert(db)
    .await
    .expect("movie");
    let showing = movie_showing::ActiveModel {
        id: Set(Uuid::new_v4()),
        movie_id: Set(movie.id),
        auditorium_id: Set(auditorium.id),
        start_time: Set(Utc::now() + Duration::hours(2)),
    }
    .insert(db)
    .await
    .expect("movie showing");

    Venue {
        theatre_id: theatre.id,
        auditorium_id: auditorium.id,
        seat_id: seat.id,
        movie_showing_id: showing.id,
    }
}
