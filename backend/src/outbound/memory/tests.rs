//! Tests for the in-memory parking store.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::TimeDelta;
use rstest::{fixture, rstest};

use super::*;
use crate::domain::{
    Address, HoldPolicy, LotDraft, LotName, Money, Pincode, SpotCount, VehicleNumber,
};
use crate::test_support::march;

fn lot_with(spots: i64) -> LotWithSpots {
    LotDraft {
        name: LotName::new("Station Yard").expect("name"),
        address: Address::new("9 Platform Lane").expect("address"),
        pincode: Pincode::new("110001").expect("pincode"),
        price_per_hour: Money::from_major_units(20.0).expect("rate"),
        spot_count: SpotCount::new(spots).expect("count"),
    }
    .into_lot_with_spots(UserId::random())
}

fn claim(lot_id: LotId, at: DateTime<Utc>) -> ClaimRequest {
    ClaimRequest {
        reservation_id: ReservationId::random(),
        user_id: UserId::random(),
        lot_id,
        held_at: at,
        stale_before: HoldPolicy::default().stale_before(at),
    }
}

fn claimed(outcome: ClaimOutcome) -> Reservation {
    match outcome {
        ClaimOutcome::Claimed(reservation) => reservation,
        other => panic!("expected a claim, got {other:?}"),
    }
}

#[fixture]
fn store() -> InMemoryParkingStore {
    InMemoryParkingStore::new()
}

async fn seeded(store: &InMemoryParkingStore, spots: i64) -> LotWithSpots {
    let lot = lot_with(spots);
    LotRepository::create(store, &lot).await.expect("lot stored");
    lot
}

async fn occupancy(store: &InMemoryParkingStore, lot_id: &LotId) -> Vec<bool> {
    store
        .find_with_spots(lot_id)
        .await
        .expect("query")
        .expect("lot exists")
        .spots
        .iter()
        .map(|spot| spot.occupied)
        .collect()
}

#[rstest]
#[tokio::test]
async fn claims_take_the_lowest_free_number(store: InMemoryParkingStore) {
    let lot = seeded(&store, 3).await;

    let first = claimed(store.claim_spot(&claim(lot.lot.id, march(1, 9, 0))).await.expect("claim"));
    let second = claimed(store.claim_spot(&claim(lot.lot.id, march(1, 9, 1))).await.expect("claim"));

    assert_eq!(first.spot_number().get(), 1);
    assert_eq!(second.spot_number().get(), 2);
    assert_eq!(occupancy(&store, &lot.lot.id).await, vec![true, true, false]);
}

#[rstest]
#[tokio::test]
async fn full_and_missing_lots_are_reported(store: InMemoryParkingStore) {
    let lot = seeded(&store, 1).await;
    claimed(store.claim_spot(&claim(lot.lot.id, march(1, 9, 0))).await.expect("claim"));

    let full = store.claim_spot(&claim(lot.lot.id, march(1, 9, 1))).await.expect("claim");
    let missing = store.claim_spot(&claim(LotId::random(), march(1, 9, 1))).await.expect("claim");

    assert_eq!(full, ClaimOutcome::NoCapacity);
    assert_eq!(missing, ClaimOutcome::LotNotFound);
}

#[rstest]
#[tokio::test]
async fn stale_holds_are_reaped_before_claiming(store: InMemoryParkingStore) {
    let lot = seeded(&store, 1).await;
    let stale = claimed(store.claim_spot(&claim(lot.lot.id, march(1, 9, 0))).await.expect("claim"));

    let later = march(1, 9, 0) + TimeDelta::minutes(16);
    let fresh = claimed(store.claim_spot(&claim(lot.lot.id, later)).await.expect("claim"));

    assert_eq!(fresh.spot_number().get(), 1);
    let reaped = store
        .find_for_user(&stale.id(), &stale.user_id())
        .await
        .expect("query")
        .expect("still recorded");
    assert_eq!(reaped.state(), ReservationState::Released);
    assert_eq!(reaped.cost(), Some(Money::ZERO));
}

#[rstest]
#[tokio::test]
async fn confirmation_is_a_compare_and_swap(store: InMemoryParkingStore) {
    let lot = seeded(&store, 1).await;
    let held = claimed(store.claim_spot(&claim(lot.lot.id, march(1, 9, 0))).await.expect("claim"));
    let confirmed = held
        .confirm(
            VehicleNumber::new("KA01").expect("plate"),
            march(1, 9, 5),
            HoldPolicy::default(),
        )
        .expect("confirm");

    assert!(store.save_confirmation(&confirmed, None).await.expect("write"));
    assert!(
        !store.save_confirmation(&confirmed, None).await.expect("write"),
        "a stale observed start time must not overwrite"
    );
}

#[rstest]
#[tokio::test]
async fn closing_frees_the_spot_once(store: InMemoryParkingStore) {
    let lot = seeded(&store, 1).await;
    let held = claimed(store.claim_spot(&claim(lot.lot.id, march(1, 9, 0))).await.expect("claim"));
    let released = held
        .release(march(1, 9, 2), lot.lot.price_per_hour)
        .expect("release");

    assert!(store.close(&released).await.expect("close"));
    assert!(!store.close(&released).await.expect("close"));
    assert_eq!(occupancy(&store, &lot.lot.id).await, vec![false]);
    assert!(
        store
            .find_open_for_spot(&lot.spots[0].id)
            .await
            .expect("query")
            .is_none()
    );
}

#[rstest]
#[tokio::test]
async fn reaping_frees_lapsed_holds_only(store: InMemoryParkingStore) {
    let lot = seeded(&store, 2).await;
    let policy = HoldPolicy::default();
    let lapsed = claimed(store.claim_spot(&claim(lot.lot.id, march(1, 9, 0))).await.expect("claim"));
    claimed(store.claim_spot(&claim(lot.lot.id, march(1, 9, 10))).await.expect("claim"));
    let now = march(1, 9, 20);

    let reaped = store
        .reap_stale_holds(&lot.lot.id, policy.stale_before(now), now)
        .await
        .expect("reap");

    assert_eq!(reaped, 1);
    assert_eq!(occupancy(&store, &lot.lot.id).await, vec![false, true]);
    let closed = store
        .find_for_user(&lapsed.id(), &lapsed.user_id())
        .await
        .expect("query")
        .expect("still recorded");
    assert_eq!(closed.state(), ReservationState::Released);
    assert_eq!(
        store.delete_spot_if_vacant(&lot.lot.id, &lot.spots[0].id).await.expect("delete"),
        RemovalOutcome::Removed
    );
}

#[rstest]
#[tokio::test]
async fn occupied_lots_and_spots_resist_deletion(store: InMemoryParkingStore) {
    let lot = seeded(&store, 2).await;
    claimed(store.claim_spot(&claim(lot.lot.id, march(1, 9, 0))).await.expect("claim"));

    let lot_outcome = store.delete_if_vacant(&lot.lot.id).await.expect("delete");
    let spot_outcome = store
        .delete_spot_if_vacant(&lot.lot.id, &lot.spots[0].id)
        .await
        .expect("delete");
    let free_outcome = store
        .delete_spot_if_vacant(&lot.lot.id, &lot.spots[1].id)
        .await
        .expect("delete");

    assert_eq!(lot_outcome, RemovalOutcome::Occupied);
    assert_eq!(spot_outcome, RemovalOutcome::Occupied);
    assert_eq!(free_outcome, RemovalOutcome::Removed);
    assert_eq!(occupancy(&store, &lot.lot.id).await, vec![true]);
}

#[rstest]
#[tokio::test]
async fn deleting_a_lot_keeps_reservation_snapshots(store: InMemoryParkingStore) {
    let lot = seeded(&store, 1).await;
    let held = claimed(store.claim_spot(&claim(lot.lot.id, march(1, 9, 0))).await.expect("claim"));
    let released = held.release(march(1, 9, 1), Money::ZERO).expect("release");
    store.close(&released).await.expect("close");

    let outcome = store.delete_if_vacant(&lot.lot.id).await.expect("delete");

    assert_eq!(outcome, RemovalOutcome::Removed);
    let history = store.list_for_user(&held.user_id()).await.expect("history");
    let entry = history.first().expect("kept");
    assert!(entry.lot_id().is_none());
    assert!(entry.spot_id().is_none());
    assert_eq!(entry.lot_name().as_ref(), "Station Yard");
}

#[rstest]
#[tokio::test]
async fn spot_numbers_stay_unique_within_a_lot(store: InMemoryParkingStore) {
    let lot = seeded(&store, 2).await;
    let duplicate = ParkingSpot::vacant(lot.lot.id, SpotNumber::new(2).expect("number"));

    let added = store.add_spot(&duplicate).await;
    let renumbered = store
        .renumber_spot(&lot.lot.id, &lot.spots[0].id, SpotNumber::new(2).expect("number"))
        .await;

    assert_eq!(added, Err(LotPersistenceError::duplicate_spot_number(2_i32)));
    assert_eq!(renumbered, Err(LotPersistenceError::duplicate_spot_number(2_i32)));
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_claims_receive_distinct_spots() {
    let store = Arc::new(InMemoryParkingStore::new());
    let lot = seeded(&store, 5).await;

    let handles: Vec<_> = (0..12)
        .map(|_| {
            let store = Arc::clone(&store);
            let lot_id = lot.lot.id;
            tokio::spawn(async move { store.claim_spot(&claim(lot_id, march(1, 9, 0))).await })
        })
        .collect();

    let mut numbers = HashSet::new();
    let mut rejected = 0;
    for handle in handles {
        match handle.await.expect("task").expect("claim") {
            ClaimOutcome::Claimed(reservation) => {
                assert!(numbers.insert(reservation.spot_number().get()));
            }
            ClaimOutcome::NoCapacity => rejected += 1,
            ClaimOutcome::LotNotFound => panic!("lot vanished"),
        }
    }
    assert_eq!(numbers.len(), 5);
    assert_eq!(rejected, 7);
}
