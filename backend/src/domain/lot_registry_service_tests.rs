//! Tests for the lot registry service.

use std::sync::Arc;

use chrono::TimeDelta;
use rstest::{fixture, rstest};

use super::*;
use crate::domain::ports::{MockLotRepository, MockReservationRepository};
use crate::domain::{
    Address, ErrorCode, HoldPolicy, LotName, Pincode, Reservation, ReservationId, Role,
    SpotCount, UserId, VehicleNumber,
};
use crate::test_support::{MutableClock, march};

type TestService = LotRegistryService<MockLotRepository, MockReservationRepository>;

fn make_service(lots: MockLotRepository, reservations: MockReservationRepository) -> TestService {
    LotRegistryService::new(
        Arc::new(lots),
        Arc::new(reservations),
        Arc::new(MutableClock::new(march(14, 10, 30))),
    )
}

fn rate(major: f64) -> Money {
    Money::from_major_units(major).expect("valid rate")
}

fn draft(spots: i64) -> LotDraft {
    LotDraft {
        name: LotName::new("Harbour").expect("name"),
        address: Address::new("3 Dock Road").expect("address"),
        pincode: Pincode::new("400001").expect("pincode"),
        price_per_hour: rate(20.0),
        spot_count: SpotCount::new(spots).expect("count"),
    }
}

#[fixture]
fn admin() -> Identity {
    Identity::new(UserId::random(), Role::Admin)
}

fn owned_lot(admin: &Identity) -> LotWithSpots {
    draft(3).into_lot_with_spots(admin.user_id())
}

fn expect_lot(lots: &mut MockLotRepository, lot: ParkingLot) {
    lots.expect_find_lot().return_once(move |_| Ok(Some(lot)));
}

#[rstest]
#[tokio::test]
async fn create_lot_persists_numbered_spots(admin: Identity) {
    let mut lots = MockLotRepository::new();
    lots.expect_create()
        .withf(|lot| lot.total_spots() == 5 && lot.available_spots() == 5)
        .times(1)
        .return_once(|_| Ok(()));
    let service = make_service(lots, MockReservationRepository::new());

    let created = service.create_lot(&admin, draft(5)).await.expect("created");

    assert_eq!(created.lot.owner, admin.user_id());
    let numbers: Vec<i32> = created.spots.iter().map(|s| s.number.get()).collect();
    assert_eq!(numbers, vec![1, 2, 3, 4, 5]);
}

#[rstest]
#[tokio::test]
async fn plain_users_cannot_create_lots() {
    let mut lots = MockLotRepository::new();
    lots.expect_create().times(0);
    let service = make_service(lots, MockReservationRepository::new());
    let user = Identity::new(UserId::random(), Role::User);

    let err = service.create_lot(&user, draft(1)).await.expect_err("forbidden");

    assert_eq!(err.code(), ErrorCode::Forbidden);
}

#[rstest]
#[tokio::test]
async fn other_admins_lots_look_missing(admin: Identity) {
    let foreign = owned_lot(&Identity::new(UserId::random(), Role::Admin));
    let lot_id = foreign.lot.id;
    let mut lots = MockLotRepository::new();
    expect_lot(&mut lots, foreign.lot);
    lots.expect_delete_if_vacant().times(0);
    let service = make_service(lots, MockReservationRepository::new());

    let err = service.delete_lot(&admin, &lot_id).await.expect_err("hidden");

    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[rstest]
#[case(RemovalOutcome::Removed, None)]
#[case(RemovalOutcome::Occupied, Some(ErrorCode::Conflict))]
#[case(RemovalOutcome::NotFound, Some(ErrorCode::NotFound))]
#[tokio::test]
async fn delete_lot_reports_guard_outcome(
    admin: Identity,
    #[case] outcome: RemovalOutcome,
    #[case] expected: Option<ErrorCode>,
) {
    let lot = owned_lot(&admin);
    let lot_id = lot.lot.id;
    let mut lots = MockLotRepository::new();
    expect_lot(&mut lots, lot.lot);
    lots.expect_delete_if_vacant()
        .return_once(move |_| Ok(outcome));
    let mut reservations = MockReservationRepository::new();
    reservations
        .expect_reap_stale_holds()
        .times(1)
        .returning(|_, _, _| Ok(0));
    let service = make_service(lots, reservations);

    let result = service.delete_lot(&admin, &lot_id).await;

    assert_eq!(result.err().map(|err| err.code()), expected);
}

#[rstest]
#[tokio::test]
async fn remove_spot_closes_lapsed_holds_first(admin: Identity) {
    let lot = owned_lot(&admin);
    let lot_id = lot.lot.id;
    let spot_id = lot.spots[0].id;
    let mut sequence = mockall::Sequence::new();
    let mut lots = MockLotRepository::new();
    expect_lot(&mut lots, lot.lot);
    let mut reservations = MockReservationRepository::new();
    reservations
        .expect_reap_stale_holds()
        .withf(move |id, stale_before, now| {
            *id == lot_id
                && *now == march(14, 10, 30)
                && *stale_before == march(14, 10, 20)
        })
        .times(1)
        .in_sequence(&mut sequence)
        .returning(|_, _, _| Ok(1));
    lots.expect_delete_spot_if_vacant()
        .times(1)
        .in_sequence(&mut sequence)
        .return_once(|_, _| Ok(RemovalOutcome::Removed));
    let service = make_service(lots, reservations)
        .with_hold_policy(HoldPolicy::new(std::time::Duration::from_secs(600)));

    service
        .remove_spot(&admin, &lot_id, &spot_id)
        .await
        .expect("lapsed hold no longer blocks removal");
}

#[rstest]
#[tokio::test]
async fn duplicate_spot_number_is_conflict(admin: Identity) {
    let lot = owned_lot(&admin);
    let lot_id = lot.lot.id;
    let mut lots = MockLotRepository::new();
    expect_lot(&mut lots, lot.lot);
    lots.expect_add_spot()
        .return_once(|_| Err(LotPersistenceError::duplicate_spot_number(2_i32)));
    let service = make_service(lots, MockReservationRepository::new());
    let number = SpotNumber::new(2).expect("number");

    let err = service
        .add_spot(&admin, &lot_id, number)
        .await
        .expect_err("duplicate");

    assert_eq!(err.code(), ErrorCode::Conflict);
    assert_eq!(
        err.details().and_then(|d| d.get("code")).and_then(|c| c.as_str()),
        Some("duplicate_spot_number")
    );
}

#[rstest]
#[tokio::test]
async fn renumbering_an_unknown_spot_is_not_found(admin: Identity) {
    let lot = owned_lot(&admin);
    let lot_id = lot.lot.id;
    let mut lots = MockLotRepository::new();
    expect_lot(&mut lots, lot.lot);
    lots.expect_renumber_spot().return_once(|_, _, _| Ok(None));
    let service = make_service(lots, MockReservationRepository::new());

    let err = service
        .renumber_spot(
            &admin,
            &lot_id,
            &SpotId::random(),
            SpotNumber::new(9).expect("number"),
        )
        .await
        .expect_err("missing");

    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[rstest]
#[tokio::test]
async fn update_lot_keeps_unchanged_fields(admin: Identity) {
    let lot = owned_lot(&admin);
    let lot_id = lot.lot.id;
    let mut lots = MockLotRepository::new();
    expect_lot(&mut lots, lot.lot);
    lots.expect_update()
        .withf(|lot| lot.price_per_hour.minor_units() == 3550 && lot.name.as_ref() == "Harbour")
        .times(1)
        .return_once(|_| Ok(true));
    let service = make_service(lots, MockReservationRepository::new());
    let changes = LotChanges {
        price_per_hour: Some(rate(35.5)),
        ..LotChanges::default()
    };

    let updated = service
        .update_lot(&admin, &lot_id, changes)
        .await
        .expect("updated");

    assert_eq!(updated.price_per_hour, rate(35.5));
}

#[rstest]
#[tokio::test]
async fn spot_detail_estimates_running_cost(admin: Identity) {
    let mut lot = owned_lot(&admin);
    if let Some(spot) = lot.spots.first_mut() {
        spot.occupied = true;
    }
    let spot = lot.spots.first().expect("spot").clone();
    let reservation = Reservation::hold(
        ReservationId::random(),
        UserId::random(),
        &lot.lot,
        &spot,
        march(14, 9, 0),
    )
    .confirm(
        VehicleNumber::new("KA01AB1234").expect("plate"),
        march(14, 9, 0),
        HoldPolicy::default(),
    )
    .expect("confirm");

    let lot_id = lot.lot.id;
    let spot_id = spot.id;
    let mut lots = MockLotRepository::new();
    expect_lot(&mut lots, lot.lot.clone());
    lots.expect_find_with_spots()
        .return_once(move |_| Ok(Some(lot)));
    let mut reservations = MockReservationRepository::new();
    reservations
        .expect_find_open_for_spot()
        .return_once(move |_| Ok(Some(reservation)));
    let service = make_service(lots, reservations);

    let detail = service
        .spot_detail(&admin, &lot_id, &spot_id)
        .await
        .expect("detail");

    // 09:00 to 10:30 at 20/h.
    assert_eq!(detail.estimated_cost, rate(30.0));
    assert_eq!(
        detail.reservation.start_time().map(|s| s + TimeDelta::minutes(90)),
        Some(march(14, 10, 30))
    );
}

#[rstest]
#[tokio::test]
async fn spot_detail_of_free_spot_is_not_found(admin: Identity) {
    let lot = owned_lot(&admin);
    let lot_id = lot.lot.id;
    let spot_id = lot.spots.first().expect("spot").id;
    let mut lots = MockLotRepository::new();
    expect_lot(&mut lots, lot.lot.clone());
    lots.expect_find_with_spots()
        .return_once(move |_| Ok(Some(lot)));
    let mut reservations = MockReservationRepository::new();
    reservations.expect_find_open_for_spot().times(0);
    let service = make_service(lots, reservations);

    let err = service
        .spot_detail(&admin, &lot_id, &spot_id)
        .await
        .expect_err("free spot");

    assert_eq!(err.code(), ErrorCode::NotFound);
}
