use std::sync::Arc;

use crate::{
    db::DbPool,
    events::EventSender,
    services::{
        bundles::BundleService, cart::CartService, checkout::CheckoutService,
        coupons::CouponService, donations::DonationLedger, fulfillment::Fulfillment,
        payments::PaymentService, puzzles::PuzzleVerifier,
    },
};

pub mod bundles;
pub mod cart;
pub mod common;
pub mod coupons;
pub mod deliveries;
pub mod health;
pub mod ngos;
pub mod payments;

/// Service container shared by every handler
#[derive(Clone)]
pub struct AppServices {
    pub bundles: Arc<BundleService>,
    pub cart: Arc<CartService>,
    pub payments: Arc<PaymentService>,
    pub coupons: Arc<CouponService>,
    pub donations: Arc<DonationLedger>,
    pub checkout: Arc<CheckoutService>,
}

impl AppServices {
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
        verifier: PuzzleVerifier,
        fulfillment: Arc<dyn Fulfillment>,
    ) -> Self {
        Self {
            bundles: Arc::new(BundleService::new(db_pool.clone(), event_sender.clone())),
            cart: Arc::new(CartService::new(db_pool.clone())),
            payments: Arc::new(PaymentService::new(db_pool.clone(), event_sender.clone())),
            coupons: Arc::new(CouponService::new(db_pool.clone(), verifier.clone())),
            donations: Arc::new(DonationLedger::new(db_pool.clone())),
            checkout: Arc::new(CheckoutService::new(
                db_pool,
                event_sender,
                verifier,
                fulfillment,
            )),
        }
    }
}
