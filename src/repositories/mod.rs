use sea_orm::ConnectionTrait;

pub mod cart_repository;
pub mod catalog_repository;
pub mod customer_repository;
pub mod delivery_repository;
pub mod payment_repository;

pub use cart_repository::CartRepository;
pub use catalog_repository::CatalogRepository;
pub use customer_repository::CustomerRepository;
pub use delivery_repository::DeliveryRepository;
pub use payment_repository::PaymentRepository;

/// Repository trait for common database operations.
///
/// Repositories borrow a connection rather than owning a pool so the same
/// lookups run against a `DatabaseConnection` or inside an open `DatabaseTransaction`.
pub trait Repository {
    type Conn: ConnectionTrait;

    fn conn(&self) -> &Self::Conn;
}

#[derive(Debug)]
pub struct BaseRepository<'c, C> {
    conn: &'c C,
}

impl<'c, C: ConnectionTrait> BaseRepository<'c, C> {
    pub fn new(conn: &'c C) -> Self {
        Self { conn }
    }
}

impl<'c, C: ConnectionTrait> Repository for BaseRepository<'c, C> {
    type Conn = C;

    fn conn(&self) -> &C {
        self.conn
    }
}
