mod common;

use assert_matches::assert_matches;
use common::{TestApp, ADMIN_USER, CUSTOMER_USER};
use concessions_api::{
    auth::CallerId,
    entities::{
        cart_item, delivery, delivery_item, driver, ngo_donation, DeliveryStatus, DriverStatus,
        PaymentStatus, StaffRole,
    },
    errors::ServiceError,
    events::Event,
    services::{checkout::CreateDeliveryInput, payments::PaymentLedger, puzzles::PuzzleRef},
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, ConnectionTrait, EntityTrait, PaginatorTrait, Set};
use uuid::Uuid;

fn caller(user: &str) -> CallerId {
    CallerId(user.to_string())
}

fn checkout_input(showing_id: Uuid, payment_method_id: Uuid) -> CreateDeliveryInput {
    CreateDeliveryInput {
        customer_showing_id: showing_id,
        payment_method_id,
        coupon_code: None,
        puzzle_token: None,
        puzzle_answer: None,
        skip_puzzle: false,
        ngo_id: None,
        donation_amount: None,
        donation_percentage: None,
    }
}

async fn delivery_count(app: &TestApp) -> u64 {
    delivery::Entity::find()
        .count(app.db.as_ref())
        .await
        .expect("count deliveries")
}

#[tokio::test]
async fn coupon_and_percentage_donation_are_charged_together() {
    let mut app = TestApp::new().await;
    let customer = app.create_customer(CUSTOMER_USER).await;
    let card = app.create_payment_method(&customer, dec!(200.00)).await;
    let showing = app.book_showing(&customer).await;
    let popcorn = app.create_product("Large Popcorn", dec!(25.00), 10).await;
    app.put_in_cart(&customer, Some(popcorn.id), None, 4).await;

    app.create_coupon("SAVE20", dec!(20), 1).await;
    let puzzle = app.create_db_puzzle(1, "42", true).await;

    let mut input = checkout_input(showing.id, card.id);
    input.coupon_code = Some("SAVE20".into());
    input.puzzle_token = Some(PuzzleRef::Database(puzzle.id).encode());
    input.puzzle_answer = Some(" 42\n".into());
    input.ngo_id = Some(3);
    input.donation_percentage = Some(dec!(5));

    let receipt = app
        .state
        .services
        .checkout
        .create_delivery(&caller(CUSTOMER_USER), input)
        .await
        .expect("checkout should succeed");

    assert_eq!(receipt.total_price, dec!(100.00));
    assert_eq!(receipt.discount_amount, dec!(20.00));
    assert_eq!(receipt.charged, dec!(85.00));
    assert_eq!(receipt.applied_coupon_code.as_deref(), Some("SAVE20"));
    assert_eq!(receipt.payment_status, PaymentStatus::Completed);
    assert_eq!(receipt.delivery_status, DeliveryStatus::Pending);
    assert!(receipt.warnings.is_empty());

    let donation = receipt.donation.expect("donation summary");
    assert_eq!(donation.ngo_id, 3);
    assert_eq!(donation.donation_amount, dec!(5.00));
    assert_eq!(donation.donation_percentage, Some(dec!(5)));

    assert_eq!(app.balance(card.id).await, dec!(115.00));
    assert_eq!(app.stock(popcorn.id).await, 6);

    let total = app
        .state
        .services
        .donations
        .total_for(3)
        .await
        .expect("ngo total");
    assert_eq!(total.total_amount_donated, dec!(5.00));

    tokio::task::yield_now().await;
    let events = app.drain_events();
    assert!(events
        .iter()
        .any(|e| matches!(e, Event::DeliveryCreated { charged, .. } if *charged == dec!(85.00))));
    assert!(events
        .iter()
        .any(|e| matches!(e, Event::DonationRecorded { ngo_id: 3, .. })));
}

#[tokio::test]
async fn checkout_without_coupon_charges_cart_total_and_empties_cart() {
    let app = TestApp::new().await;
    let customer = app.create_customer(CUSTOMER_USER).await;
    let card = app.create_payment_method(&customer, dec!(50.00)).await;
    let showing = app.book_showing(&customer).await;
    let soda = app.create_product("Soda", dec!(4.50), 20).await;
    let nachos = app.create_product("Nachos", dec!(8.00), 5).await;
    app.put_in_cart(&customer, Some(soda.id), None, 2).await;
    app.put_in_cart(&customer, Some(nachos.id), None, 1).await;

    let receipt = app
        .state
        .services
        .checkout
        .create_delivery(&caller(CUSTOMER_USER), checkout_input(showing.id, card.id))
        .await
        .expect("checkout");

    assert_eq!(receipt.total_price, dec!(17.00));
    assert_eq!(receipt.discount_amount, Decimal::ZERO);
    assert_eq!(receipt.charged, dec!(17.00));
    assert!(receipt.donation.is_none());
    assert_eq!(app.balance(card.id).await, dec!(33.00));

    let cart = app
        .state
        .services
        .cart
        .get_cart(&caller(CUSTOMER_USER))
        .await
        .expect("cart");
    assert!(cart.items.is_empty());

    let items = delivery_item::Entity::find()
        .all(app.db.as_ref())
        .await
        .expect("delivery items");
    assert_eq!(items.len(), 2);
    let snapshot: Decimal = items.iter().map(|i| i.line_total).sum();
    assert_eq!(snapshot, dec!(17.00));
}

#[tokio::test]
async fn insufficient_funds_rolls_back_everything() {
    let app = TestApp::new().await;
    let customer = app.create_customer(CUSTOMER_USER).await;
    let card = app.create_payment_method(&customer, dec!(10.00)).await;
    let showing = app.book_showing(&customer).await;
    let popcorn = app.create_product("Popcorn", dec!(12.00), 3).await;
    app.put_in_cart(&customer, Some(popcorn.id), None, 1).await;

    let err = app
        .state
        .services
        .checkout
        .create_delivery(&caller(CUSTOMER_USER), checkout_input(showing.id, card.id))
        .await
        .expect_err("should be declined");

    assert_matches!(err, ServiceError::InsufficientFunds(id) if id == card.id);
    assert_eq!(app.balance(card.id).await, dec!(10.00));
    assert_eq!(app.stock(popcorn.id).await, 3);
    assert_eq!(delivery_count(&app).await, 0);
    assert_eq!(
        delivery_item::Entity::find()
            .count(app.db.as_ref())
            .await
            .unwrap(),
        0
    );

    let cart = app
        .state
        .services
        .cart
        .get_cart(&caller(CUSTOMER_USER))
        .await
        .expect("cart");
    assert_eq!(cart.items.len(), 1);
}

#[tokio::test]
async fn empty_cart_is_rejected() {
    let app = TestApp::new().await;
    let customer = app.create_customer(CUSTOMER_USER).await;
    let card = app.create_payment_method(&customer, dec!(10.00)).await;
    let showing = app.book_showing(&customer).await;

    let err = app
        .state
        .services
        .checkout
        .create_delivery(&caller(CUSTOMER_USER), checkout_input(showing.id, card.id))
        .await
        .expect_err("empty cart");
    assert_matches!(err, ServiceError::EmptyCart(id) if id == customer.id);
}

#[tokio::test]
async fn cancel_refunds_items_but_keeps_donation() {
    let mut app = TestApp::new().await;
    let customer = app.create_customer(CUSTOMER_USER).await;
    let card = app.create_payment_method(&customer, dec!(200.00)).await;
    let showing = app.book_showing(&customer).await;
    let combo = app.create_product("Combo", dec!(50.00), 10).await;
    app.put_in_cart(&customer, Some(combo.id), None, 2).await;
    app.create_coupon("TENOFF", dec!(10), 2).await;
    let driver = app.create_driver("driver-1").await;

    let mut input = checkout_input(showing.id, card.id);
    input.coupon_code = Some("TENOFF".into());
    input.skip_puzzle = true;
    input.ngo_id = Some(1);
    input.donation_amount = Some(dec!(2.50));

    let checkout = &app.state.services.checkout;
    let receipt = checkout
        .create_delivery(&caller(CUSTOMER_USER), input)
        .await
        .expect("checkout");
    assert_eq!(receipt.charged, dec!(92.50));
    assert_eq!(receipt.driver_id, Some(driver.id));
    assert_eq!(app.balance(card.id).await, dec!(107.50));

    let cancelled = checkout
        .cancel_delivery(&caller(CUSTOMER_USER), receipt.delivery_id)
        .await
        .expect("cancel");
    assert_eq!(cancelled.refunded, dec!(90.00));
    assert_eq!(cancelled.delivery.delivery_status, DeliveryStatus::Cancelled);
    assert_eq!(app.balance(card.id).await, dec!(197.50));

    let total = app.state.services.donations.total_for(1).await.unwrap();
    assert_eq!(total.total_amount_donated, dec!(2.50));

    let again = checkout
        .cancel_delivery(&caller(CUSTOMER_USER), receipt.delivery_id)
        .await
        .expect_err("second cancel");
    assert_matches!(again, ServiceError::AlreadyCancelled(_));
    assert_eq!(app.balance(card.id).await, dec!(197.50));

    tokio::task::yield_now().await;
    assert!(app
        .drain_events()
        .iter()
        .any(|e| matches!(e, Event::DeliveryCancelled { refunded, .. } if *refunded == dec!(90.00))));
}

#[tokio::test]
async fn zero_donation_is_recorded_against_the_ngo() {
    let app = TestApp::new().await;
    let customer = app.create_customer(CUSTOMER_USER).await;
    let card = app.create_payment_method(&customer, dec!(20.00)).await;
    let showing = app.book_showing(&customer).await;
    let candy = app.create_product("Candy", dec!(3.00), 10).await;
    app.put_in_cart(&customer, Some(candy.id), None, 1).await;

    let mut input = checkout_input(showing.id, card.id);
    input.ngo_id = Some(6);
    input.donation_amount = Some(Decimal::ZERO);

    let receipt = app
        .state
        .services
        .checkout
        .create_delivery(&caller(CUSTOMER_USER), input)
        .await
        .expect("checkout");

    let donation = receipt.donation.expect("ngo recorded");
    assert_eq!(donation.ngo_id, 6);
    assert_eq!(donation.donation_amount, Decimal::ZERO);
    assert_eq!(receipt.charged, dec!(3.00));

    let stored = delivery::Entity::find_by_id(receipt.delivery_id)
        .one(app.db.as_ref())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.ngo_id, Some(6));
    assert_eq!(stored.donation_amount, Some(Decimal::ZERO));
}

#[tokio::test]
async fn unknown_ngo_and_orphan_donation_are_rejected() {
    let app = TestApp::new().await;
    let customer = app.create_customer(CUSTOMER_USER).await;
    let card = app.create_payment_method(&customer, dec!(20.00)).await;
    let showing = app.book_showing(&customer).await;
    let candy = app.create_product("Candy", dec!(3.00), 10).await;
    app.put_in_cart(&customer, Some(candy.id), None, 1).await;
    let checkout = &app.state.services.checkout;

    let mut input = checkout_input(showing.id, card.id);
    input.ngo_id = Some(99);
    let err = checkout
        .create_delivery(&caller(CUSTOMER_USER), input)
        .await
        .expect_err("unknown ngo");
    assert_matches!(err, ServiceError::InvalidNgo(99));

    let mut input = checkout_input(showing.id, card.id);
    input.donation_amount = Some(dec!(1.00));
    let err = checkout
        .create_delivery(&caller(CUSTOMER_USER), input)
        .await
        .expect_err("donation without ngo");
    assert_matches!(err, ServiceError::InvalidInput(_));

    assert_eq!(app.balance(card.id).await, dec!(20.00));
    assert_eq!(delivery_count(&app).await, 0);
}

#[tokio::test]
async fn coupon_puzzle_gate_blocks_checkout() {
    let app = TestApp::new().await;
    let customer = app.create_customer(CUSTOMER_USER).await;
    let card = app.create_payment_method(&customer, dec!(100.00)).await;
    let showing = app.book_showing(&customer).await;
    let popcorn = app.create_product("Popcorn", dec!(10.00), 10).await;
    app.put_in_cart(&customer, Some(popcorn.id), None, 1).await;
    app.create_coupon("HALF", dec!(50), 1).await;
    let inactive = app.create_db_puzzle(1, "7", false).await;
    let active = app.create_db_puzzle(1, "7", true).await;
    let checkout = &app.state.services.checkout;

    let with_coupon = |token: Option<String>, answer: Option<&str>| {
        let mut input = checkout_input(showing.id, card.id);
        input.coupon_code = Some("HALF".into());
        input.puzzle_token = token;
        input.puzzle_answer = answer.map(str::to_string);
        input
    };

    let err = checkout
        .create_delivery(&caller(CUSTOMER_USER), with_coupon(None, None))
        .await
        .expect_err("puzzle required");
    assert_matches!(err, ServiceError::PuzzleRequired);

    let missing = PuzzleRef::Database(Uuid::new_v4()).encode();
    let err = checkout
        .create_delivery(&caller(CUSTOMER_USER), with_coupon(Some(missing), Some("7")))
        .await
        .expect_err("missing puzzle");
    assert_matches!(err, ServiceError::PuzzleNotFound(_));

    let retired = PuzzleRef::Database(inactive.id).encode();
    let err = checkout
        .create_delivery(&caller(CUSTOMER_USER), with_coupon(Some(retired), Some("7")))
        .await
        .expect_err("inactive puzzle");
    assert_matches!(err, ServiceError::PuzzleNotFound(_));

    let token = PuzzleRef::Database(active.id).encode();
    let err = checkout
        .create_delivery(&caller(CUSTOMER_USER), with_coupon(Some(token.clone()), Some("8")))
        .await
        .expect_err("wrong answer");
    assert_matches!(err, ServiceError::PuzzleMismatch);

    let err = checkout
        .create_delivery(
            &caller(CUSTOMER_USER),
            with_coupon(Some(PuzzleRef::File("../secrets".into()).encode()), Some("7")),
        )
        .await
        .expect_err("escaping path");
    assert_matches!(err, ServiceError::PuzzleVerificationError(_));

    let mut input = checkout_input(showing.id, card.id);
    input.coupon_code = Some("NOPE".into());
    input.skip_puzzle = true;
    let err = checkout
        .create_delivery(&caller(CUSTOMER_USER), input)
        .await
        .expect_err("unknown coupon");
    assert_matches!(err, ServiceError::InvalidCoupon(code) if code == "NOPE");

    assert_eq!(app.balance(card.id).await, dec!(100.00));
    assert_eq!(delivery_count(&app).await, 0);

    let receipt = checkout
        .create_delivery(&caller(CUSTOMER_USER), with_coupon(Some(token), Some("7")))
        .await
        .expect("correct answer");
    assert_eq!(receipt.charged, dec!(5.00));
}

#[tokio::test]
async fn file_puzzle_unlocks_coupon() {
    let app = TestApp::new().await;
    app.write_file_puzzle("hard", "p01", "fizzbuzz\n");
    let customer = app.create_customer(CUSTOMER_USER).await;
    let card = app.create_payment_method(&customer, dec!(100.00)).await;
    let showing = app.book_showing(&customer).await;
    let popcorn = app.create_product("Popcorn", dec!(40.00), 10).await;
    app.put_in_cart(&customer, Some(popcorn.id), None, 1).await;
    app.create_coupon("BRAINY", dec!(25), 3).await;

    let issued = app
        .state
        .services
        .coupons
        .issue_puzzle("BRAINY")
        .await
        .expect("file puzzle");
    assert!(issued.puzzle_script.contains("print"));

    let mut input = checkout_input(showing.id, card.id);
    input.coupon_code = Some("BRAINY".into());
    input.puzzle_token = Some(issued.token);
    input.puzzle_answer = Some("fizzbuzz".into());

    let receipt = app
        .state
        .services
        .checkout
        .create_delivery(&caller(CUSTOMER_USER), input)
        .await
        .expect("checkout");
    assert_eq!(receipt.discount_amount, dec!(10.00));
    assert_eq!(receipt.charged, dec!(30.00));
}

#[tokio::test]
async fn donation_ledger_failure_does_not_fail_checkout() {
    let app = TestApp::new().await;
    let customer = app.create_customer(CUSTOMER_USER).await;
    let card = app.create_payment_method(&customer, dec!(50.00)).await;
    let showing = app.book_showing(&customer).await;
    let popcorn = app.create_product("Popcorn", dec!(10.00), 10).await;
    app.put_in_cart(&customer, Some(popcorn.id), None, 1).await;

    app.db
        .execute_unprepared("DROP TABLE ngo_donations")
        .await
        .expect("drop ledger table");

    let mut input = checkout_input(showing.id, card.id);
    input.ngo_id = Some(2);
    input.donation_amount = Some(dec!(1.00));

    let receipt = app
        .state
        .services
        .checkout
        .create_delivery(&caller(CUSTOMER_USER), input)
        .await
        .expect("checkout still succeeds");

    assert_eq!(receipt.charged, dec!(11.00));
    assert_eq!(receipt.payment_status, PaymentStatus::Completed);
    assert!(receipt
        .warnings
        .iter()
        .any(|w| w.starts_with("Donation ledger not updated")));
    assert_eq!(app.balance(card.id).await, dec!(39.00));
    assert_eq!(delivery_count(&app).await, 1);
}

#[tokio::test]
async fn bundle_lines_consume_constituent_stock() {
    let app = TestApp::new().await;
    let admin = app.create_staff(ADMIN_USER, StaffRole::Admin).await;
    let customer = app.create_customer(CUSTOMER_USER).await;
    let card = app.create_payment_method(&customer, dec!(100.00)).await;
    let showing = app.book_showing(&customer).await;
    let popcorn = app.create_product("Popcorn", dec!(10.00), 10).await;
    let soda = app.create_product("Soda", dec!(5.00), 10).await;

    let bundle = app
        .bundles()
        .create_bundle(
            &caller(ADMIN_USER),
            concessions_api::services::bundles::CreateBundleInput {
                name: "Movie Night".into(),
                description: None,
                original_price: dec!(20.00),
                items: vec![
                    concessions_api::services::bundles::BundleItemInput {
                        product_id: popcorn.id,
                        quantity: 1,
                    },
                    concessions_api::services::bundles::BundleItemInput {
                        product_id: soda.id,
                        quantity: 2,
                    },
                ],
            },
        )
        .await
        .expect("bundle");
    assert_eq!(bundle.total_price, dec!(16.00));

    app.put_in_cart(&customer, None, Some(bundle.id), 2).await;

    let receipt = app
        .state
        .services
        .checkout
        .create_delivery(&caller(CUSTOMER_USER), checkout_input(showing.id, card.id))
        .await
        .expect("checkout");

    assert_eq!(receipt.total_price, dec!(32.00));
    assert_eq!(receipt.staff_id, Some(admin.id));
    assert_eq!(app.stock(popcorn.id).await, 8);
    assert_eq!(app.stock(soda.id).await, 6);
}

#[tokio::test]
async fn stock_shortfall_aborts_checkout() {
    let app = TestApp::new().await;
    let customer = app.create_customer(CUSTOMER_USER).await;
    let card = app.create_payment_method(&customer, dec!(100.00)).await;
    let showing = app.book_showing(&customer).await;
    let popcorn = app.create_product("Popcorn", dec!(10.00), 1).await;
    app.put_in_cart(&customer, Some(popcorn.id), None, 3).await;

    let err = app
        .state
        .services
        .checkout
        .create_delivery(&caller(CUSTOMER_USER), checkout_input(showing.id, card.id))
        .await
        .expect_err("not enough stock");
    assert_matches!(err, ServiceError::InsufficientStock(id) if id == popcorn.id);
    assert_eq!(app.balance(card.id).await, dec!(100.00));
    assert_eq!(app.stock(popcorn.id).await, 1);
    assert_eq!(delivery_count(&app).await, 0);
}

#[tokio::test]
async fn foreign_payment_method_is_refused() {
    let app = TestApp::new().await;
    let owner = app.create_customer("someone-else").await;
    let foreign_card = app.create_payment_method(&owner, dec!(100.00)).await;
    let customer = app.create_customer(CUSTOMER_USER).await;
    let showing = app.book_showing(&customer).await;
    let popcorn = app.create_product("Popcorn", dec!(10.00), 10).await;
    app.put_in_cart(&customer, Some(popcorn.id), None, 1).await;

    let err = app
        .state
        .services
        .checkout
        .create_delivery(
            &caller(CUSTOMER_USER),
            checkout_input(showing.id, foreign_card.id),
        )
        .await
        .expect_err("foreign card");
    assert!(matches!(
        err,
        ServiceError::Unauthorized(_) | ServiceError::NotFound(_)
    ));
    assert_eq!(app.balance(foreign_card.id).await, dec!(100.00));
}

#[tokio::test]
async fn driver_fulfills_then_customer_rates() {
    let app = TestApp::new().await;
    let customer = app.create_customer(CUSTOMER_USER).await;
    let card = app.create_payment_method(&customer, dec!(30.00)).await;
    let showing = app.book_showing(&customer).await;
    let popcorn = app.create_product("Popcorn", dec!(10.00), 10).await;
    app.put_in_cart(&customer, Some(popcorn.id), None, 1).await;
    let driver = app.create_driver("driver-7").await;
    let checkout = &app.state.services.checkout;

    let receipt = checkout
        .create_delivery(&caller(CUSTOMER_USER), checkout_input(showing.id, card.id))
        .await
        .expect("checkout");
    assert_eq!(receipt.driver_id, Some(driver.id));

    let early = checkout
        .rate_delivery(&caller(CUSTOMER_USER), receipt.delivery_id, 5)
        .await
        .expect_err("not fulfilled yet");
    assert_matches!(early, ServiceError::InvalidInput(_));

    let stranger = checkout
        .fulfill_delivery(&caller(CUSTOMER_USER), receipt.delivery_id)
        .await
        .expect_err("customer cannot fulfill");
    assert_matches!(stranger, ServiceError::Unauthorized(_));

    let fulfilled = checkout
        .fulfill_delivery(&caller("driver-7"), receipt.delivery_id)
        .await
        .expect("driver fulfills");
    assert_eq!(fulfilled.delivery_status, DeliveryStatus::Fulfilled);
    assert!(fulfilled.delivery_time.is_some());

    let rated = checkout
        .rate_delivery(&caller(CUSTOMER_USER), receipt.delivery_id, 4)
        .await
        .expect("rate");
    assert_eq!(rated.driver_id, driver.id);
    assert_eq!(rated.driver_rating, dec!(4.00));

    let rated = checkout
        .rate_delivery(&caller(CUSTOMER_USER), receipt.delivery_id, 5)
        .await
        .expect("rate again");
    assert_eq!(rated.driver_rating, dec!(4.50));

    let details = checkout
        .get_delivery_details(&caller(CUSTOMER_USER), receipt.delivery_id)
        .await
        .expect("details");
    assert_eq!(details.theatre_name, "Grand Cinema");
    assert_eq!(details.movie_title, "The Long Intermission");
    assert_eq!(details.items.len(), 1);
    assert_eq!(details.items[0].name, "Popcorn");
}

#[tokio::test]
async fn concurrent_checkouts_of_one_cart_consume_it_once() {
    let app = TestApp::new().await;
    let customer = app.create_customer(CUSTOMER_USER).await;
    let card = app.create_payment_method(&customer, dec!(100.00)).await;
    let showing = app.book_showing(&customer).await;
    let popcorn = app.create_product("Popcorn", dec!(10.00), 10).await;
    app.put_in_cart(&customer, Some(popcorn.id), None, 1).await;

    let checkout = app.state.services.checkout.clone();
    let first = {
        let checkout = checkout.clone();
        let input = checkout_input(showing.id, card.id);
        tokio::spawn(async move { checkout.create_delivery(&caller(CUSTOMER_USER), input).await })
    };
    let second = {
        let checkout = checkout.clone();
        let input = checkout_input(showing.id, card.id);
        tokio::spawn(async move { checkout.create_delivery(&caller(CUSTOMER_USER), input).await })
    };

    let (a, b) = tokio::join!(first, second);
    let outcomes = [a.expect("join"), b.expect("join")];
    assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
    let loser = outcomes
        .into_iter()
        .find_map(Result::err)
        .expect("one checkout fails");
    assert_matches!(loser, ServiceError::EmptyCart(id) if id == customer.id);

    assert_eq!(app.balance(card.id).await, dec!(90.00));
    assert_eq!(app.stock(popcorn.id).await, 9);
    assert_eq!(delivery_count(&app).await, 1);
}

#[tokio::test]
async fn checkout_racing_another_charge_never_overdraws() {
    let app = TestApp::new().await;
    let customer = app.create_customer(CUSTOMER_USER).await;
    let card = app.create_payment_method(&customer, dec!(15.00)).await;
    let showing = app.book_showing(&customer).await;
    let popcorn = app.create_product("Popcorn", dec!(10.00), 10).await;
    app.put_in_cart(&customer, Some(popcorn.id), None, 1).await;

    let customer_caller = caller(CUSTOMER_USER);
    let (checkout, direct) = tokio::join!(
        app.state
            .services
            .checkout
            .create_delivery(&customer_caller, checkout_input(showing.id, card.id)),
        PaymentLedger::charge(app.db.as_ref(), card.id, dec!(10.00)),
    );
    let direct = direct.expect("direct charge");

    assert_ne!(checkout.is_ok(), direct, "exactly one debit goes through");
    assert_eq!(app.balance(card.id).await, dec!(5.00));
    match checkout {
        Ok(receipt) => {
            assert_eq!(receipt.charged, dec!(10.00));
            assert_eq!(app.stock(popcorn.id).await, 9);
        }
        Err(err) => {
            assert_matches!(err, ServiceError::InsufficientFunds(id) if id == card.id);
            assert_eq!(delivery_count(&app).await, 0);
            assert_eq!(app.stock(popcorn.id).await, 10);
            let cart = cart_item::Entity::find()
                .count(app.db.as_ref())
                .await
                .expect("count cart");
            assert_eq!(cart, 1);
        }
    }
}

#[tokio::test]
async fn cart_line_is_snapshotted_by_one_delivery_only() {
    let app = TestApp::new().await;
    let customer = app.create_customer(CUSTOMER_USER).await;
    let card = app.create_payment_method(&customer, dec!(100.00)).await;
    let showing = app.book_showing(&customer).await;
    let popcorn = app.create_product("Popcorn", dec!(10.00), 10).await;
    let checkout = &app.state.services.checkout;

    app.put_in_cart(&customer, Some(popcorn.id), None, 1).await;
    checkout
        .create_delivery(&caller(CUSTOMER_USER), checkout_input(showing.id, card.id))
        .await
        .expect("first checkout");
    app.put_in_cart(&customer, Some(popcorn.id), None, 1).await;
    let second = checkout
        .create_delivery(&caller(CUSTOMER_USER), checkout_input(showing.id, card.id))
        .await
        .expect("second checkout");

    let first_item = delivery_item::Entity::find()
        .all(app.db.as_ref())
        .await
        .expect("items")
        .into_iter()
        .find(|item| item.delivery_id != second.delivery_id)
        .expect("first delivery item");

    let duplicate = delivery_item::ActiveModel {
        id: Set(Uuid::new_v4()),
        delivery_id: Set(second.delivery_id),
        cart_item_id: Set(first_item.cart_item_id),
        product_id: Set(Some(popcorn.id)),
        bundle_id: Set(None),
        quantity: Set(1),
        line_total: Set(dec!(10.00)),
    }
    .insert(app.db.as_ref())
    .await;
    assert!(duplicate.is_err());
}

#[tokio::test]
async fn cancelling_fulfilled_delivery_leaves_reassigned_driver_busy() {
    let app = TestApp::new().await;
    let customer = app.create_customer(CUSTOMER_USER).await;
    let card = app.create_payment_method(&customer, dec!(50.00)).await;
    let showing = app.book_showing(&customer).await;
    let popcorn = app.create_product("Popcorn", dec!(10.00), 10).await;
    let driver = app.create_driver("driver-7").await;
    let checkout = &app.state.services.checkout;

    app.put_in_cart(&customer, Some(popcorn.id), None, 1).await;
    let first = checkout
        .create_delivery(&caller(CUSTOMER_USER), checkout_input(showing.id, card.id))
        .await
        .expect("first checkout");
    assert_eq!(first.driver_id, Some(driver.id));
    checkout
        .fulfill_delivery(&caller("driver-7"), first.delivery_id)
        .await
        .expect("fulfill");

    app.put_in_cart(&customer, Some(popcorn.id), None, 1).await;
    let second = checkout
        .create_delivery(&caller(CUSTOMER_USER), checkout_input(showing.id, card.id))
        .await
        .expect("second checkout");
    assert_eq!(second.driver_id, Some(driver.id));

    let cancelled = checkout
        .cancel_delivery(&caller(CUSTOMER_USER), first.delivery_id)
        .await
        .expect("cancel fulfilled delivery");
    assert_eq!(cancelled.refunded, dec!(10.00));
    assert_eq!(app.balance(card.id).await, dec!(40.00));

    let stored = driver::Entity::find_by_id(driver.id)
        .one(app.db.as_ref())
        .await
        .expect("query")
        .expect("driver");
    assert_eq!(stored.status, DriverStatus::Busy);

    checkout
        .cancel_delivery(&caller(CUSTOMER_USER), second.delivery_id)
        .await
        .expect("cancel pending delivery");
    let stored = driver::Entity::find_by_id(driver.id)
        .one(app.db.as_ref())
        .await
        .expect("query")
        .expect("driver");
    assert_eq!(stored.status, DriverStatus::Available);
}

#[tokio::test]
async fn ngo_ledger_starts_empty() {
    let app = TestApp::new().await;
    let rows = ngo_donation::Entity::find()
        .count(app.db.as_ref())
        .await
        .expect("count");
    assert_eq!(rows, 0);

    let total = app.state.services.donations.total_for(4).await.unwrap();
    assert_eq!(total.total_amount_donated, Decimal::ZERO);
    assert_matches!(
        app.state.services.donations.total_for(42).await,
        Err(ServiceError::NotFound(_))
    );
}
