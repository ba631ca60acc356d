use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::{Expr, OnConflict},
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};
use serde::Serialize;
use tracing::{debug, instrument};

use crate::entities::ngo_donation;
use crate::errors::ServiceError;

/// Static reference data for an NGO that can receive checkout donations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Ngo {
    pub id: i32,
    pub name: &'static str,
    pub cause: &'static str,
    pub description: &'static str,
}

pub const NGOS: [Ngo; 6] = [
    Ngo {
        id: 1,
        name: "Animal Care Foundation",
        cause: "Animal Care",
        description: "Supporting animal welfare and rescue operations",
    },
    Ngo {
        id: 2,
        name: "Elderly Protection Network",
        cause: "Abused Elderly",
        description: "Protecting and supporting abused elderly individuals",
    },
    Ngo {
        id: 3,
        name: "Hope for Children",
        cause: "Orphan Children",
        description: "Providing care and education for orphaned children",
    },
    Ngo {
        id: 4,
        name: "Medical Support Alliance",
        cause: "Cancer/HIV Patients",
        description: "Supporting cancer and HIV patients with medical care",
    },
    Ngo {
        id: 5,
        name: "Disease Relief Fund",
        cause: "Disease People",
        description: "Helping people affected by various diseases",
    },
    Ngo {
        id: 6,
        name: "Homeless Shelter Initiative",
        cause: "Homeless",
        description: "Providing shelter and support for homeless individuals",
    },
];

pub fn find_ngo(id: i32) -> Option<&'static Ngo> {
    NGOS.iter().find(|ngo| ngo.id == id)
}

/// Running total for one NGO
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NgoTotal {
    pub ngo_id: i32,
    pub ngo_name: &'static str,
    pub total_amount_donated: Decimal,
}

/// Per-NGO donation accumulator. Totals only ever grow.
#[derive(Clone)]
pub struct DonationLedger {
    db: Arc<DatabaseConnection>,
}

impl DonationLedger {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    pub fn list_ngos(&self) -> &'static [Ngo] {
        &NGOS
    }

    /// Adds `amount` to the NGO's total. Amounts at or below zero are ignored.
    #[instrument(skip(conn))]
    pub async fn increment<C: ConnectionTrait>(
        conn: &C,
        ngo_id: i32,
        amount: Decimal,
    ) -> Result<Decimal, ServiceError> {
        let ngo = find_ngo(ngo_id).ok_or(ServiceError::InvalidNgo(ngo_id))?;
        if amount <= Decimal::ZERO {
            debug!(ngo = ngo.name, "ignoring non-positive donation");
            return Ok(Self::read_total(conn, ngo_id).await?);
        }

        ngo_donation::Entity::insert(ngo_donation::ActiveModel {
            ngo_id: Set(ngo_id),
            total_amount_donated: Set(Decimal::ZERO),
            updated_at: Set(Utc::now()),
        })
        .on_conflict(
            OnConflict::column(ngo_donation::Column::NgoId)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(conn)
        .await?;

        ngo_donation::Entity::update_many()
            .col_expr(
                ngo_donation::Column::TotalAmountDonated,
                Expr::col(ngo_donation::Column::TotalAmountDonated).add(amount),
            )
            .col_expr(ngo_donation::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(ngo_donation::Column::NgoId.eq(ngo_id))
            .exec(conn)
            .await?;

        let total = Self::read_total(conn, ngo_id).await?;
        debug!(ngo = ngo.name, %amount, %total, "donation ledger incremented");
        Ok(total)
    }

    async fn read_total<C: ConnectionTrait>(conn: &C, ngo_id: i32) -> Result<Decimal, ServiceError> {
        Ok(ngo_donation::Entity::find_by_id(ngo_id)
            .one(conn)
            .await?
            .map(|row| row.total_amount_donated)
            .unwrap_or(Decimal::ZERO))
    }

    /// Total donated to one NGO; unknown ids are `NotFound`
    #[instrument(skip(self))]
    pub async fn total_for(&self, ngo_id: i32) -> Result<NgoTotal, ServiceError> {
        let ngo = find_ngo(ngo_id)
            .ok_or_else(|| ServiceError::NotFound(format!("NGO {} not found", ngo_id)))?;
        let total = Self::read_total(self.db.as_ref(), ngo_id).await?;
        Ok(NgoTotal {
            ngo_id,
            ngo_name: ngo.name,
            total_amount_donated: total,
        })
    }
}
