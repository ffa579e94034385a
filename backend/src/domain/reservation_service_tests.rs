//! Tests for the reservation lifecycle service.
//!
//! These run against the in-memory store so claims, confirmations, and
//! releases exercise real occupancy bookkeeping.

use std::collections::HashSet;
use std::sync::Arc;

use rstest::rstest;

use super::*;
use crate::domain::ports::{LotRepository, MockNotifier, NoOpNotifier, NotifierError};
use crate::domain::{
    Address, ErrorCode, FullName, LotDraft, LotName, LotWithSpots, PasswordHash, Pincode,
    ReservationState, Role, SpotCount, User, UserDraft, UserId,
};
use crate::outbound::memory::InMemoryParkingStore;
use crate::test_support::{MutableClock, march};

type Service<N> =
    ReservationService<InMemoryParkingStore, InMemoryParkingStore, InMemoryParkingStore, N>;

struct Harness<N> {
    store: Arc<InMemoryParkingStore>,
    clock: Arc<MutableClock>,
    service: Service<N>,
}

fn harness_with<N: Notifier>(notifier: N) -> Harness<N> {
    let store = Arc::new(InMemoryParkingStore::new());
    let clock = Arc::new(MutableClock::new(march(14, 9, 0)));
    let service = ReservationService::new(
        ReservationPorts {
            lots: Arc::clone(&store),
            reservations: Arc::clone(&store),
            users: Arc::clone(&store),
            notifier: Arc::new(notifier),
        },
        clock.clone(),
        HoldPolicy::default(),
    );
    Harness {
        store,
        clock,
        service,
    }
}

fn harness() -> Harness<NoOpNotifier> {
    harness_with(NoOpNotifier)
}

async fn seed_lot(store: &InMemoryParkingStore, spots: i64, price: f64) -> LotWithSpots {
    let lot = LotDraft {
        name: LotName::new("Market Square").expect("name"),
        address: Address::new("12 Bazaar Road").expect("address"),
        pincode: Pincode::new("560001").expect("pincode"),
        price_per_hour: Money::from_major_units(price).expect("rate"),
        spot_count: SpotCount::new(spots).expect("count"),
    }
    .into_lot_with_spots(UserId::random());
    LotRepository::create(store, &lot).await.expect("lot stored");
    lot
}

async fn seed_user(store: &InMemoryParkingStore, email: &str) -> Identity {
    let user = User::new(UserDraft {
        id: UserId::random(),
        full_name: FullName::new("Asha Rao").expect("name"),
        email: EmailAddress::new(email).expect("email"),
        address: Address::new("4 Lake View").expect("address"),
        pincode: Pincode::new("560002").expect("pincode"),
        role: Role::User,
    });
    UserRepository::insert(store, &user, &PasswordHash::new("hash"))
        .await
        .expect("user stored");
    Identity::new(user.id(), Role::User)
}

fn plate(raw: &str) -> VehicleNumber {
    VehicleNumber::new(raw).expect("plate")
}

fn detail_code(error: &Error) -> Option<&str> {
    error
        .details()
        .and_then(|details| details.get("code"))
        .and_then(|code| code.as_str())
}

#[rstest]
#[tokio::test]
async fn assign_holds_the_lowest_free_spot() {
    let h = harness();
    let lot = seed_lot(&h.store, 3, 20.0).await;
    let driver = seed_user(&h.store, "asha@example.com").await;

    let reservation = h.service.assign(&driver, &lot.lot.id).await.expect("assigned");

    assert_eq!(reservation.state(), ReservationState::Held);
    assert_eq!(reservation.spot_number().get(), 1);
    assert_eq!(reservation.held_at(), march(14, 9, 0));
    assert!(reservation.start_time().is_none());
}

#[rstest]
#[tokio::test]
async fn assign_reports_missing_lot_and_full_lot() {
    let h = harness();
    let lot = seed_lot(&h.store, 1, 20.0).await;
    let driver = seed_user(&h.store, "asha@example.com").await;
    h.service.assign(&driver, &lot.lot.id).await.expect("first");

    let full = h.service.assign(&driver, &lot.lot.id).await.expect_err("full");
    let missing = h
        .service
        .assign(&driver, &LotId::random())
        .await
        .expect_err("missing");

    assert_eq!(full.code(), ErrorCode::NoCapacity);
    assert_eq!(missing.code(), ErrorCode::NotFound);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_assignments_never_share_a_spot() {
    let h = harness();
    let lot = seed_lot(&h.store, 4, 20.0).await;
    let driver = seed_user(&h.store, "asha@example.com").await;
    let service = Arc::new(h.service);

    let handles: Vec<_> = (0..10)
        .map(|_| {
            let service = Arc::clone(&service);
            let lot_id = lot.lot.id;
            tokio::spawn(async move { service.assign(&driver, &lot_id).await })
        })
        .collect();

    let mut numbers = HashSet::new();
    let mut no_capacity = 0;
    for handle in handles {
        match handle.await.expect("task") {
            Ok(reservation) => assert!(numbers.insert(reservation.spot_number().get())),
            Err(error) => {
                assert_eq!(error.code(), ErrorCode::NoCapacity);
                no_capacity += 1;
            }
        }
    }
    assert_eq!(numbers, HashSet::from([1, 2, 3, 4]));
    assert_eq!(no_capacity, 6);
}

#[rstest]
#[tokio::test]
async fn confirm_starts_the_clock_once() {
    let h = harness();
    let lot = seed_lot(&h.store, 2, 20.0).await;
    let driver = seed_user(&h.store, "asha@example.com").await;
    let held = h.service.assign(&driver, &lot.lot.id).await.expect("assigned");

    h.clock.advance_minutes(5);
    let first = h
        .service
        .confirm(&driver, &held.id(), plate("KA01AB1234"))
        .await
        .expect("confirmed");
    h.clock.advance_minutes(10);
    let again = h
        .service
        .confirm(&driver, &held.id(), plate("KA01AB9999"))
        .await
        .expect("reconfirmed");

    assert_eq!(first.start_time(), Some(march(14, 9, 5)));
    assert_eq!(again.start_time(), Some(march(14, 9, 5)));
    assert_eq!(again.vehicle().map(AsRef::as_ref), Some("KA01AB9999"));
    assert_eq!(again.state(), ReservationState::Active);
}

#[rstest]
#[tokio::test]
async fn release_bills_elapsed_time_and_frees_the_spot() {
    let h = harness();
    let lot = seed_lot(&h.store, 1, 20.0).await;
    let driver = seed_user(&h.store, "asha@example.com").await;
    let held = h.service.assign(&driver, &lot.lot.id).await.expect("assigned");
    h.service
        .confirm(&driver, &held.id(), plate("KA01"))
        .await
        .expect("confirmed");

    h.clock.advance_minutes(150);
    let released = h
        .service
        .release(&driver, &held.id())
        .await
        .expect("released");

    assert_eq!(released.cost(), Some(Money::from_major_units(50.0).expect("cost")));
    assert_eq!(released.end_time(), Some(march(14, 11, 30)));
    let next = h
        .service
        .assign(&driver, &lot.lot.id)
        .await
        .expect("spot reusable");
    assert_eq!(next.spot_number(), released.spot_number());
}

#[rstest]
#[tokio::test]
async fn release_uses_the_current_lot_rate() {
    let h = harness();
    let lot = seed_lot(&h.store, 1, 20.0).await;
    let driver = seed_user(&h.store, "asha@example.com").await;
    let held = h.service.assign(&driver, &lot.lot.id).await.expect("assigned");
    h.service
        .confirm(&driver, &held.id(), plate("KA01"))
        .await
        .expect("confirmed");

    let mut repriced = lot.lot.clone();
    repriced.price_per_hour = Money::from_major_units(40.0).expect("rate");
    LotRepository::update(h.store.as_ref(), &repriced)
        .await
        .expect("repriced");
    h.clock.advance_minutes(30);
    let released = h
        .service
        .release(&driver, &held.id())
        .await
        .expect("released");

    assert_eq!(released.cost(), Some(Money::from_major_units(20.0).expect("cost")));
    assert_eq!(released.billed_rate(), Some(repriced.price_per_hour));
}

#[rstest]
#[tokio::test]
async fn releasing_an_unconfirmed_hold_costs_nothing() {
    let h = harness();
    let lot = seed_lot(&h.store, 1, 20.0).await;
    let driver = seed_user(&h.store, "asha@example.com").await;
    let held = h.service.assign(&driver, &lot.lot.id).await.expect("assigned");

    h.clock.advance_minutes(3);
    let released = h
        .service
        .release(&driver, &held.id())
        .await
        .expect("released");

    assert_eq!(released.cost(), Some(Money::ZERO));
    assert!(released.start_time().is_none());
}

#[rstest]
#[tokio::test]
async fn completed_reservations_reject_further_transitions() {
    let h = harness();
    let lot = seed_lot(&h.store, 1, 20.0).await;
    let driver = seed_user(&h.store, "asha@example.com").await;
    let held = h.service.assign(&driver, &lot.lot.id).await.expect("assigned");
    h.service.release(&driver, &held.id()).await.expect("released");

    let release_again = h
        .service
        .release(&driver, &held.id())
        .await
        .expect_err("already released");
    let confirm_after = h
        .service
        .confirm(&driver, &held.id(), plate("KA01"))
        .await
        .expect_err("already released");

    for error in [release_again, confirm_after] {
        assert_eq!(error.code(), ErrorCode::Conflict);
        assert_eq!(detail_code(&error), Some("already_completed"));
    }
}

#[rstest]
#[tokio::test]
async fn other_users_reservations_look_missing() {
    let h = harness();
    let lot = seed_lot(&h.store, 1, 20.0).await;
    let owner = seed_user(&h.store, "owner@example.com").await;
    let intruder = seed_user(&h.store, "intruder@example.com").await;
    let held = h.service.assign(&owner, &lot.lot.id).await.expect("assigned");

    let confirm = h
        .service
        .confirm(&intruder, &held.id(), plate("KA01"))
        .await
        .expect_err("hidden");
    let release = h
        .service
        .release(&intruder, &held.id())
        .await
        .expect_err("hidden");

    assert_eq!(confirm.code(), ErrorCode::NotFound);
    assert_eq!(release.code(), ErrorCode::NotFound);
}

#[rstest]
#[tokio::test]
async fn expired_holds_cannot_be_confirmed_and_are_reclaimed() {
    let h = harness();
    let lot = seed_lot(&h.store, 1, 20.0).await;
    let slow = seed_user(&h.store, "slow@example.com").await;
    let quick = seed_user(&h.store, "quick@example.com").await;
    let stale = h.service.assign(&slow, &lot.lot.id).await.expect("assigned");

    h.clock.advance_minutes(16);
    let error = h
        .service
        .confirm(&slow, &stale.id(), plate("KA01"))
        .await
        .expect_err("expired");
    let reclaimed = h
        .service
        .assign(&quick, &lot.lot.id)
        .await
        .expect("stale hold reaped");

    assert_eq!(error.code(), ErrorCode::Conflict);
    assert_eq!(detail_code(&error), Some("hold_expired"));
    assert_eq!(reclaimed.spot_number(), stale.spot_number());
}

#[rstest]
#[tokio::test]
async fn notifications_carry_the_owner_and_kind() {
    let mut notifier = MockNotifier::new();
    notifier
        .expect_notify()
        .withf(|n| {
            n.kind == NotificationKind::BookingConfirmed
                && n.recipient.as_ref() == "asha@example.com"
                && n.body.contains("KA01")
        })
        .times(1)
        .returning(|_| Ok(()));
    notifier
        .expect_notify()
        .withf(|n| n.kind == NotificationKind::SpotReleased && n.body.contains("20.00"))
        .times(1)
        .returning(|_| Ok(()));
    let h = harness_with(notifier);
    let lot = seed_lot(&h.store, 1, 20.0).await;
    let driver = seed_user(&h.store, "asha@example.com").await;
    let held = h.service.assign(&driver, &lot.lot.id).await.expect("assigned");

    h.service
        .confirm(&driver, &held.id(), plate("KA01"))
        .await
        .expect("confirmed");
    h.clock.advance_minutes(60);
    h.service.release(&driver, &held.id()).await.expect("released");
}

#[rstest]
#[tokio::test]
async fn notifier_failures_do_not_fail_the_transition() {
    let mut notifier = MockNotifier::new();
    notifier
        .expect_notify()
        .times(2)
        .returning(|_| Err(NotifierError::QueueFull));
    let h = harness_with(notifier);
    let lot = seed_lot(&h.store, 1, 20.0).await;
    let driver = seed_user(&h.store, "asha@example.com").await;
    let held = h.service.assign(&driver, &lot.lot.id).await.expect("assigned");

    let confirmed = h.service.confirm(&driver, &held.id(), plate("KA01")).await;
    let released = h.service.release(&driver, &held.id()).await;

    assert!(confirmed.is_ok());
    assert!(released.is_ok());
}
