//! Driver dashboard and monthly billing summary.

use actix_web::{get, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{Error, MonthlyLotUsage};
use crate::inbound::http::ApiResult;
use crate::inbound::http::identity::UserIdentity;
use crate::inbound::http::parking_dto::{ReservationView, UserView};
use crate::inbound::http::state::HttpState;

/// Body of `GET /user/dashboard`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserDashboardResponse {
    pub user: UserView,
    /// Most recent first.
    pub reservations: Vec<ReservationView>,
}

/// One lot's share of the caller's parking this month.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MonthlyUsageView {
    pub lot_id: Option<String>,
    pub lot_name: String,
    pub times_parked: u32,
    #[schema(example = 210.0)]
    pub total_time_minutes: f64,
    #[schema(example = 70.0)]
    pub total_cost: f64,
}

impl From<&MonthlyLotUsage> for MonthlyUsageView {
    fn from(usage: &MonthlyLotUsage) -> Self {
        Self {
            lot_id: usage.lot_id.map(|id| id.to_string()),
            lot_name: usage.lot_name.to_string(),
            times_parked: usage.times_parked,
            total_time_minutes: usage.total_time_minutes(),
            total_cost: usage.total_cost.as_major_units(),
        }
    }
}

#[utoipa::path(
    get,
    path = "/user/dashboard",
    responses(
        (status = 200, description = "Profile and reservation history", body = UserDashboardResponse),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error)
    ),
    tags = ["parking"],
    operation_id = "userDashboard"
)]
#[get("/user/dashboard")]
pub async fn dashboard(
    state: web::Data<HttpState>,
    UserIdentity(caller): UserIdentity,
) -> ApiResult<web::Json<UserDashboardResponse>> {
    let history = state.reports.user_dashboard(&caller).await?;
    Ok(web::Json(UserDashboardResponse {
        user: UserView::from(&history.user),
        reservations: history
            .reservations
            .iter()
            .map(ReservationView::from)
            .collect(),
    }))
}

/// Released parking this UTC month, grouped by lot.
#[utoipa::path(
    get,
    path = "/user/summary",
    responses(
        (status = 200, description = "Monthly usage per lot", body = [MonthlyUsageView]),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error)
    ),
    tags = ["parking"],
    operation_id = "monthlySummary"
)]
#[get("/user/summary")]
pub async fn summary(
    state: web::Data<HttpState>,
    UserIdentity(caller): UserIdentity,
) -> ApiResult<web::Json<Vec<MonthlyUsageView>>> {
    let usage = state.reports.monthly_summary(&caller).await?;
    Ok(web::Json(usage.iter().map(MonthlyUsageView::from).collect()))
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::test::TestRequest;
    use rstest::rstest;
    use serde_json::{Value, json};

    use crate::inbound::http::test_utils::{bearer, send};
    use crate::test_support::{MemoryStack, march};

    async fn park(stack: &MemoryStack, driver: &str, lot_id: &Value, minutes: i64) {
        let (_, held) = send(
            stack,
            TestRequest::post()
                .uri("/user/assign")
                .insert_header(bearer(driver))
                .set_json(json!({ "lot_id": lot_id })),
        )
        .await;
        let id = &held["reservation"]["reservation_id"];
        send(
            stack,
            TestRequest::post()
                .uri("/user/reserve")
                .insert_header(bearer(driver))
                .set_json(json!({ "reservation_id": id, "vehicle_number": "KA01AB1234" })),
        )
        .await;
        stack.clock.advance_minutes(minutes);
        let (status, _) = send(
            stack,
            TestRequest::post()
                .uri("/user/release")
                .insert_header(bearer(driver))
                .set_json(json!({ "reservation_id": id })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    async fn lot(stack: &MemoryStack, admin: &str) -> Value {
        let (_, body) = send(
            stack,
            TestRequest::post()
                .uri("/admin/lots")
                .insert_header(bearer(admin))
                .set_json(json!({
                    "name": "Lakeside",
                    "address": "2 Shore Road",
                    "pincode": "560004",
                    "price_per_hour": 20.0,
                    "max_spots": 1,
                })),
        )
        .await;
        body["lot_id"].clone()
    }

    #[rstest]
    #[actix_web::test]
    async fn summary_totals_this_months_stays() {
        let stack = MemoryStack::new(march(3, 8, 0));
        let admin = stack.seed_admin().await;
        let driver = stack.register_user("driver@example.com").await;
        let lot_id = lot(&stack, &admin).await;
        park(&stack, &driver, &lot_id, 60).await;
        park(&stack, &driver, &lot_id, 150).await;

        let (status, body) = send(
            &stack,
            TestRequest::get()
                .uri("/user/summary")
                .insert_header(bearer(&driver)),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!([{
                "lot_id": lot_id,
                "lot_name": "Lakeside",
                "times_parked": 2,
                "total_time_minutes": 210.0,
                "total_cost": 70.0,
            }])
        );
    }

    #[rstest]
    #[actix_web::test]
    async fn dashboard_lists_the_callers_history() {
        let stack = MemoryStack::new(march(3, 8, 0));
        let admin = stack.seed_admin().await;
        let driver = stack.register_user("driver@example.com").await;
        let other = stack.register_user("other@example.com").await;
        let lot_id = lot(&stack, &admin).await;
        park(&stack, &driver, &lot_id, 30).await;
        park(&stack, &other, &lot_id, 30).await;

        let (status, body) = send(
            &stack,
            TestRequest::get()
                .uri("/user/dashboard")
                .insert_header(bearer(&driver)),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["email"], "driver@example.com");
        let reservations = body["reservations"].as_array().expect("reservations");
        assert_eq!(reservations.len(), 1);
        assert_eq!(reservations[0]["lot_name"], "Lakeside");
        assert_eq!(reservations[0]["lot_address"], "2 Shore Road");
        assert_eq!(reservations[0]["cost"], 10.0);
    }
}
