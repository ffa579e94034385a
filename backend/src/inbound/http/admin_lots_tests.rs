//! Tests for the lot administration handlers.

use actix_web::http::StatusCode;
use actix_web::test::TestRequest;
use rstest::{fixture, rstest};
use serde_json::{Value, json};

use crate::inbound::http::test_utils::{bearer, send};
use crate::test_support::{MemoryStack, march};

#[fixture]
fn stack() -> MemoryStack {
    MemoryStack::new(march(10, 9, 0))
}

fn lot_body(spots: i64) -> Value {
    json!({
        "name": "Central Plaza",
        "location": "1 Main Street",
        "pincode": "560001",
        "price": 20.0,
        "maxSpots": spots,
    })
}

async fn create_lot(stack: &MemoryStack, admin: &str, spots: i64) -> Value {
    let (status, body) = send(
        stack,
        TestRequest::post()
            .uri("/admin/lots")
            .insert_header(bearer(admin))
            .set_json(lot_body(spots)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "unexpected body: {body}");
    body
}

fn spot_id(lot: &Value, number: i64) -> String {
    lot["lot"]["spots"]
        .as_array()
        .and_then(|spots| spots.iter().find(|spot| spot["number"] == number))
        .and_then(|spot| spot["id"].as_str())
        .map(str::to_owned)
        .expect("spot present")
}

async fn assign(stack: &MemoryStack, user: &str, lot_id: &str) -> Value {
    let (status, body) = send(
        stack,
        TestRequest::post()
            .uri("/user/assign")
            .insert_header(bearer(user))
            .set_json(json!({ "lot_id": lot_id })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "unexpected body: {body}");
    body
}

#[rstest]
#[actix_web::test]
async fn creating_a_lot_numbers_its_spots(stack: MemoryStack) {
    let admin = stack.seed_admin().await;

    let body = create_lot(&stack, &admin, 3).await;

    assert_eq!(body["message"], "Lot created");
    assert_eq!(body["lot_id"], body["lot"]["id"]);
    assert_eq!(body["lot"]["price_per_hour"], 20.0);
    assert_eq!(body["lot"]["address"], "1 Main Street");
    let numbers: Vec<i64> = body["lot"]["spots"]
        .as_array()
        .expect("spots")
        .iter()
        .filter_map(|spot| spot["number"].as_i64())
        .collect();
    assert_eq!(numbers, vec![1, 2, 3]);
}

#[rstest]
#[actix_web::test]
async fn drivers_cannot_create_lots(stack: MemoryStack) {
    let driver = stack.register_user("driver@example.com").await;

    let (status, body) = send(
        &stack,
        TestRequest::post()
            .uri("/admin/lots")
            .insert_header(bearer(&driver))
            .set_json(lot_body(2)),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "forbidden");
}

#[rstest]
#[case("maxSpots", json!(0), "max_spots")]
#[case("maxSpots", json!(1001), "max_spots")]
#[case("price", json!(-1.0), "price_per_hour")]
#[case("name", json!("  "), "name")]
#[case("pincode", json!("?"), "pincode")]
#[actix_web::test]
async fn invalid_lots_name_the_field(
    stack: MemoryStack,
    #[case] key: &str,
    #[case] value: Value,
    #[case] field: &str,
) {
    let admin = stack.seed_admin().await;
    let mut body = lot_body(2);
    body[key] = value;

    let (status, error) = send(
        &stack,
        TestRequest::post()
            .uri("/admin/lots")
            .insert_header(bearer(&admin))
            .set_json(body),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["details"]["field"], field);
}

#[rstest]
#[actix_web::test]
async fn updates_keep_omitted_fields(stack: MemoryStack) {
    let admin = stack.seed_admin().await;
    let lot = create_lot(&stack, &admin, 1).await;
    let lot_id = lot["lot_id"].as_str().expect("lot id");

    let (status, body) = send(
        &stack,
        TestRequest::put()
            .uri(&format!("/admin/lots/{lot_id}"))
            .insert_header(bearer(&admin))
            .set_json(json!({ "price_per_hour": 35.5 })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["lot"]["price_per_hour"], 35.5);
    assert_eq!(body["lot"]["name"], "Central Plaza");
}

#[rstest]
#[actix_web::test]
async fn empty_updates_are_rejected(stack: MemoryStack) {
    let admin = stack.seed_admin().await;
    let lot = create_lot(&stack, &admin, 1).await;
    let lot_id = lot["lot_id"].as_str().expect("lot id");

    let (status, body) = send(
        &stack,
        TestRequest::put()
            .uri(&format!("/admin/lots/{lot_id}"))
            .insert_header(bearer(&admin))
            .set_json(json!({})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["code"], "empty_update");
}

#[rstest]
#[case("/admin/lots/not-a-uuid", "lot_id", StatusCode::BAD_REQUEST)]
#[case(
    "/admin/lots/6f1c1d0e-7c43-4b7e-9a43-0b6f3c2f4d11",
    "",
    StatusCode::NOT_FOUND
)]
#[actix_web::test]
async fn deleting_unknown_lots_fails(
    stack: MemoryStack,
    #[case] uri: &str,
    #[case] field: &str,
    #[case] expected: StatusCode,
) {
    let admin = stack.seed_admin().await;

    let (status, body) = send(
        &stack,
        TestRequest::delete().uri(uri).insert_header(bearer(&admin)),
    )
    .await;

    assert_eq!(status, expected);
    if !field.is_empty() {
        assert_eq!(body["details"]["field"], field);
        assert_eq!(body["details"]["code"], "invalid_uuid");
    }
}

#[rstest]
#[actix_web::test]
async fn spot_numbers_are_unique_within_a_lot(stack: MemoryStack) {
    let admin = stack.seed_admin().await;
    let lot = create_lot(&stack, &admin, 2).await;
    let lot_id = lot["lot_id"].as_str().expect("lot id");
    let uri = format!("/admin/lots/{lot_id}/spots");

    let (created, body) = send(
        &stack,
        TestRequest::post()
            .uri(&uri)
            .insert_header(bearer(&admin))
            .set_json(json!({ "number": 7 })),
    )
    .await;
    assert_eq!(created, StatusCode::CREATED);
    assert_eq!(body["spot"]["number"], 7);
    assert_eq!(body["spot"]["is_available"], true);

    let (duplicate, error) = send(
        &stack,
        TestRequest::post()
            .uri(&uri)
            .insert_header(bearer(&admin))
            .set_json(json!({ "number": 2 })),
    )
    .await;
    assert_eq!(duplicate, StatusCode::CONFLICT);
    assert_eq!(error["details"]["code"], "duplicate_spot_number");
}

#[rstest]
#[actix_web::test]
async fn renumbering_onto_a_taken_number_conflicts(stack: MemoryStack) {
    let admin = stack.seed_admin().await;
    let lot = create_lot(&stack, &admin, 2).await;
    let lot_id = lot["lot_id"].as_str().expect("lot id");
    let first = spot_id(&lot, 1);
    let uri = format!("/admin/lots/{lot_id}/spots/{first}");

    let (conflict, _) = send(
        &stack,
        TestRequest::put()
            .uri(&uri)
            .insert_header(bearer(&admin))
            .set_json(json!({ "number": 2 })),
    )
    .await;
    let (renumbered, body) = send(
        &stack,
        TestRequest::put()
            .uri(&uri)
            .insert_header(bearer(&admin))
            .set_json(json!({ "number": 10 })),
    )
    .await;

    assert_eq!(conflict, StatusCode::CONFLICT);
    assert_eq!(renumbered, StatusCode::OK);
    assert_eq!(body["spot"]["number"], 10);
}

#[rstest]
#[actix_web::test]
async fn occupied_spots_block_deletion_and_show_their_booking(stack: MemoryStack) {
    let admin = stack.seed_admin().await;
    let driver = stack.register_user("driver@example.com").await;
    let lot = create_lot(&stack, &admin, 2).await;
    let lot_id = lot["lot_id"].as_str().expect("lot id");
    let held = assign(&stack, &driver, lot_id).await;
    let reservation_id = held["reservation"]["reservation_id"]
        .as_str()
        .expect("reservation id");
    let occupied = spot_id(&lot, 1);
    let spot_uri = format!("/admin/lots/{lot_id}/spots/{occupied}");

    let (lot_delete, lot_error) = send(
        &stack,
        TestRequest::delete()
            .uri(&format!("/admin/lots/{lot_id}"))
            .insert_header(bearer(&admin)),
    )
    .await;
    let (spot_delete, _) = send(
        &stack,
        TestRequest::delete()
            .uri(&spot_uri)
            .insert_header(bearer(&admin)),
    )
    .await;
    assert_eq!(lot_delete, StatusCode::CONFLICT);
    assert_eq!(lot_error["details"]["code"], "spot_occupied");
    assert_eq!(spot_delete, StatusCode::CONFLICT);

    let (status, detail) = send(
        &stack,
        TestRequest::get()
            .uri(&spot_uri)
            .insert_header(bearer(&admin)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["reservation_id"], reservation_id);
    assert_eq!(detail["spot_number"], 1);
    assert_eq!(detail["estimated_cost"], 0.0);
}

#[rstest]
#[actix_web::test]
async fn lapsed_holds_do_not_block_removal(stack: MemoryStack) {
    let admin = stack.seed_admin().await;
    let driver = stack.register_user("driver@example.com").await;
    let lot = create_lot(&stack, &admin, 2).await;
    let lot_id = lot["lot_id"].as_str().expect("lot id");
    assign(&stack, &driver, lot_id).await;
    stack.clock.advance_minutes(16);

    let (spot_status, _) = send(
        &stack,
        TestRequest::delete()
            .uri(&format!("/admin/lots/{lot_id}/spots/{}", spot_id(&lot, 1)))
            .insert_header(bearer(&admin)),
    )
    .await;
    let (lot_status, _) = send(
        &stack,
        TestRequest::delete()
            .uri(&format!("/admin/lots/{lot_id}"))
            .insert_header(bearer(&admin)),
    )
    .await;

    assert_eq!(spot_status, StatusCode::OK);
    assert_eq!(lot_status, StatusCode::OK);
}

#[rstest]
#[actix_web::test]
async fn spot_detail_estimates_at_the_lot_price(stack: MemoryStack) {
    let admin = stack.seed_admin().await;
    let driver = stack.register_user("driver@example.com").await;
    let lot = create_lot(&stack, &admin, 1).await;
    let lot_id = lot["lot_id"].as_str().expect("lot id");
    let held = assign(&stack, &driver, lot_id).await;
    let (confirmed, _) = send(
        &stack,
        TestRequest::post()
            .uri("/user/reserve")
            .insert_header(bearer(&driver))
            .set_json(json!({
                "reservation_id": held["reservation"]["reservation_id"],
                "vehicle_number": "ka01 ab 1234",
            })),
    )
    .await;
    assert_eq!(confirmed, StatusCode::OK);
    stack.clock.advance_minutes(120);

    let (status, detail) = send(
        &stack,
        TestRequest::get()
            .uri(&format!("/admin/lots/{lot_id}/spots/{}", spot_id(&lot, 1)))
            .insert_header(bearer(&admin)),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["vehicle_number"], "KA01 AB 1234");
    assert_eq!(detail["estimated_cost"], 40.0);
}

#[rstest]
#[actix_web::test]
async fn vacant_spots_and_lots_can_be_removed(stack: MemoryStack) {
    let admin = stack.seed_admin().await;
    let lot = create_lot(&stack, &admin, 2).await;
    let lot_id = lot["lot_id"].as_str().expect("lot id");

    let (spot_status, _) = send(
        &stack,
        TestRequest::delete()
            .uri(&format!("/admin/lots/{lot_id}/spots/{}", spot_id(&lot, 2)))
            .insert_header(bearer(&admin)),
    )
    .await;
    let (status, body) = send(
        &stack,
        TestRequest::get()
            .uri(&format!("/admin/lots/{lot_id}/spots/{}", spot_id(&lot, 1)))
            .insert_header(bearer(&admin)),
    )
    .await;
    assert_eq!(spot_status, StatusCode::OK);
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "spot is available");

    let (lot_status, body) = send(
        &stack,
        TestRequest::delete()
            .uri(&format!("/admin/lots/{lot_id}"))
            .insert_header(bearer(&admin)),
    )
    .await;
    assert_eq!(lot_status, StatusCode::OK);
    assert_eq!(body["message"], "Lot deleted");
    let driver = stack.register_user("driver@example.com").await;
    let (_, lots) = send(
        &stack,
        TestRequest::get()
            .uri("/user/lots")
            .insert_header(bearer(&driver)),
    )
    .await;
    assert_eq!(lots, json!([]));
}
