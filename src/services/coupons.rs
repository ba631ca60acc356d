use std::path::PathBuf;
use std::sync::Arc;

use rust_decimal::Decimal;
use sea_orm::{ConnectionTrait, DatabaseConnection};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use validator::Validate;

use crate::{
    entities::coupon,
    errors::ServiceError,
    repositories::CatalogRepository,
    services::{
        pricing::coupon_discount,
        puzzles::{PuzzleRef, PuzzleVerifier},
    },
};

/// Directory holding file puzzles for a coupon difficulty
pub fn difficulty_pool(difficulty: i32) -> Result<&'static str, ServiceError> {
    match difficulty {
        1 => Ok("easy"),
        2 => Ok("medium"),
        3 => Ok("hard"),
        other => Err(ServiceError::InvalidState(format!(
            "Coupon difficulty {} has no puzzle pool",
            other
        ))),
    }
}

/// What the caller supplied to unlock a coupon
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PuzzleAttempt {
    pub token: Option<String>,
    pub answer: Option<String>,
    /// Trusted bypass; handlers decide who may set it
    #[serde(default)]
    pub skip: bool,
}

/// Resolves an active coupon and runs the puzzle gate in front of it.
///
/// Used by both the checkout and the preview endpoint so the two can never disagree.
pub async fn unlock_coupon<C: ConnectionTrait>(
    conn: &C,
    verifier: &PuzzleVerifier,
    code: &str,
    attempt: &PuzzleAttempt,
) -> Result<coupon::Model, ServiceError> {
    let code = code.trim();
    let coupon = CatalogRepository::new(conn)
        .find_active_coupon(code)
        .await?
        .ok_or_else(|| ServiceError::InvalidCoupon(code.to_string()))?;

    if attempt.skip {
        debug!(coupon = %coupon.code, "puzzle skipped");
        return Ok(coupon);
    }

    match (attempt.token.as_deref(), attempt.answer.as_deref()) {
        (Some(token), Some(answer)) if !token.trim().is_empty() => {
            verifier.verify(conn, token, answer).await?;
            Ok(coupon)
        }
        _ => Err(ServiceError::PuzzleRequired),
    }
}

/// Issues coupon puzzles and previews coupon discounts
#[derive(Clone)]
pub struct CouponService {
    db: Arc<DatabaseConnection>,
    verifier: PuzzleVerifier,
}

impl CouponService {
    pub fn new(db: Arc<DatabaseConnection>, verifier: PuzzleVerifier) -> Self {
        Self { db, verifier }
    }

    /// Picks a puzzle for the coupon's difficulty. Database puzzles win over files.
    #[instrument(skip(self))]
    pub async fn issue_puzzle(&self, code: &str) -> Result<IssuedPuzzle, ServiceError> {
        let conn = self.db.as_ref();
        let repo = CatalogRepository::new(conn);
        let code = code.trim();
        let coupon = repo
            .find_active_coupon(code)
            .await?
            .ok_or_else(|| ServiceError::InvalidCoupon(code.to_string()))?;

        if let Some(puzzle) = repo
            .find_active_puzzle_for_difficulty(coupon.difficulty)
            .await?
        {
            info!(puzzle_id = %puzzle.id, "issuing database puzzle");
            return Ok(IssuedPuzzle {
                token: PuzzleRef::Database(puzzle.id).encode(),
                puzzle_script: puzzle.script,
            });
        }

        let pool = difficulty_pool(coupon.difficulty)?;
        let (rel, script_path): (PathBuf, PathBuf) = self
            .verifier
            .file_puzzles(pool)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| {
                ServiceError::PuzzleNotFound(format!("no puzzle available for {}", pool))
            })?;

        let puzzle_script = tokio::fs::read_to_string(&script_path)
            .await
            .map_err(|e| {
                ServiceError::PuzzleVerificationError(format!(
                    "{}: {}",
                    script_path.display(),
                    e
                ))
            })?;
        info!(puzzle = %rel.display(), "issuing file puzzle");
        Ok(IssuedPuzzle {
            token: PuzzleRef::File(rel).encode(),
            puzzle_script,
        })
    }

    /// Runs the coupon gate against `total` without persisting anything
    #[instrument(skip(self, input), fields(code = %input.code))]
    pub async fn apply_coupon(&self, input: ApplyCouponInput) -> Result<CouponPreview, ServiceError> {
        input.validate()?;
        if input.total < Decimal::ZERO {
            return Err(ServiceError::InvalidInput(
                "Total cannot be negative".to_string(),
            ));
        }

        let attempt = PuzzleAttempt {
            token: input.token,
            answer: input.answer,
            skip: input.skip_puzzle,
        };
        let coupon = unlock_coupon(self.db.as_ref(), &self.verifier, &input.code, &attempt).await?;
        let discount_amount = coupon_discount(input.total, coupon.discount_percent);

        Ok(CouponPreview {
            code: coupon.code,
            discount_percent: coupon.discount_percent,
            discount_amount,
            new_total: input.total - discount_amount,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssuedPuzzle {
    pub token: String,
    pub puzzle_script: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ApplyCouponInput {
    #[validate(length(min = 1, max = 64))]
    pub code: String,
    pub total: Decimal,
    pub token: Option<String>,
    pub answer: Option<String>,
    #[serde(default)]
    pub skip_puzzle: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouponPreview {
    pub code: String,
    pub discount_percent: Decimal,
    pub discount_amount: Decimal,
    pub new_total: Decimal,
}
