mod support;

use serde_json::json;
use support::{join_approved, send_json, signup, signup_with_khata, spawn_app};

#[tokio::test]
async fn bill_shares_must_sum_and_each_member_decides_their_own() {
    let addr = spawn_app().await;
    let (manager_token, manager_id, khata_id) =
        signup_with_khata(addr, "Asha", "asha@flat.tld").await;
    let (bala_token, bala_id) =
        join_approved(addr, &manager_token, &khata_id, "Bala", "bala@flat.tld").await;
    let (chitra_token, chitra_id) =
        join_approved(addr, &manager_token, &khata_id, "Chitra", "chitra@flat.tld").await;

    // Shares that do not sum to the total are rejected outright.
    let (status, body) = send_json(
        addr,
        "POST",
        &format!("/v1/khatas/{khata_id}/bills"),
        Some(&manager_token),
        Some(&json!({
            "title": "Electricity",
            "month": "2026-08",
            "total_cents": 9000,
            "shares": [
                {"member": bala_id, "amount_cents": 4000},
                {"member": chitra_id, "amount_cents": 4000},
            ],
        })),
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(body["error"]["code"], "INVALID_REQUEST_BODY");

    // Members only publish through the manager.
    let (status, _) = send_json(
        addr,
        "POST",
        &format!("/v1/khatas/{khata_id}/bills"),
        Some(&bala_token),
        Some(&json!({
            "title": "Electricity",
            "month": "2026-08",
            "total_cents": 1000,
            "shares": [{"member": bala_id, "amount_cents": 1000}],
        })),
    )
    .await;
    assert_eq!(status, 403);

    let (status, body) = send_json(
        addr,
        "POST",
        &format!("/v1/khatas/{khata_id}/bills"),
        Some(&manager_token),
        Some(&json!({
            "title": "Electricity",
            "month": "2026-08",
            "total_cents": 9000,
            "shares": [
                {"member": manager_id, "amount_cents": 3000},
                {"member": bala_id, "amount_cents": 3000},
                {"member": chitra_id, "amount_cents": 3000},
            ],
        })),
    )
    .await;
    assert_eq!(status, 200, "bill creation failed: {body}");
    let bill_id = body["id"].as_str().expect("bill id").to_string();
    assert!(body["shares"]
        .as_array()
        .expect("shares")
        .iter()
        .all(|s| s["status"] == "pending"));

    // Publication notified the share members.
    let (_, body) = send_json(addr, "GET", "/v1/notifications", Some(&bala_token), None).await;
    assert!(body
        .as_array()
        .expect("notifications")
        .iter()
        .any(|n| n["kind"] == "bill_published"));

    // Chitra cannot decide Bala's share.
    let (status, _) = send_json(
        addr,
        "POST",
        &format!("/v1/bills/{bill_id}/shares/{bala_id}/decision"),
        Some(&chitra_token),
        Some(&json!({"decision": "approve"})),
    )
    .await;
    assert_eq!(status, 403);

    let (status, body) = send_json(
        addr,
        "POST",
        &format!("/v1/bills/{bill_id}/shares/{bala_id}/decision"),
        Some(&bala_token),
        Some(&json!({"decision": "approve"})),
    )
    .await;
    assert_eq!(status, 200);
    let share = body["shares"]
        .as_array()
        .expect("shares")
        .iter()
        .find(|s| s["member"] == bala_id.as_str())
        .expect("bala share")
        .clone();
    assert_eq!(share["status"], "approved");
    assert_eq!(share["decided_by"], bala_id);

    // And exactly once.
    let (status, body) = send_json(
        addr,
        "POST",
        &format!("/v1/bills/{bill_id}/shares/{bala_id}/decision"),
        Some(&bala_token),
        Some(&json!({"decision": "reject"})),
    )
    .await;
    assert_eq!(status, 409);
    assert_eq!(body["error"]["code"], "NOT_PENDING");

    // Month filter on the listing.
    let (_, body) = send_json(
        addr,
        "GET",
        &format!("/v1/khatas/{khata_id}/bills?month=2026-08"),
        Some(&bala_token),
        None,
    )
    .await;
    assert_eq!(body.as_array().expect("bills").len(), 1);
    let (_, body) = send_json(
        addr,
        "GET",
        &format!("/v1/khatas/{khata_id}/bills?month=2026-09"),
        Some(&bala_token),
        None,
    )
    .await;
    assert_eq!(body.as_array().expect("bills").len(), 0);
}

#[tokio::test]
async fn bill_shares_only_name_approved_members() {
    let addr = spawn_app().await;
    let (manager_token, manager_id, khata_id) =
        signup_with_khata(addr, "Asha", "asha@flat.tld").await;

    // Dev signed up but never joined this khata.
    let (_, stranger_id) = signup(addr, "Dev", "dev@flat.tld").await;
    let (status, body) = send_json(
        addr,
        "POST",
        &format!("/v1/khatas/{khata_id}/bills"),
        Some(&manager_token),
        Some(&json!({
            "title": "Internet",
            "month": "2026-08",
            "total_cents": 1000,
            "shares": [
                {"member": manager_id, "amount_cents": 500},
                {"member": stranger_id, "amount_cents": 500},
            ],
        })),
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(body["error"]["code"], "INVALID_REQUEST_BODY");

    // Esha's join request is still pending, so she carries no shares yet.
    let (esha_token, esha_id) = signup(addr, "Esha", "esha@flat.tld").await;
    let (status, _) = send_json(
        addr,
        "POST",
        &format!("/v1/khatas/{khata_id}/join"),
        Some(&esha_token),
        None,
    )
    .await;
    assert_eq!(status, 200);
    let (status, body) = send_json(
        addr,
        "POST",
        &format!("/v1/khatas/{khata_id}/bills"),
        Some(&manager_token),
        Some(&json!({
            "title": "Internet",
            "month": "2026-08",
            "total_cents": 1000,
            "shares": [
                {"member": manager_id, "amount_cents": 500},
                {"member": esha_id, "amount_cents": 500},
            ],
        })),
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(body["error"]["code"], "INVALID_REQUEST_BODY");

    // The same bill naming only approved members goes through.
    let (status, _) = send_json(
        addr,
        "POST",
        &format!("/v1/khatas/{khata_id}/bills"),
        Some(&manager_token),
        Some(&json!({
            "title": "Internet",
            "month": "2026-08",
            "total_cents": 1000,
            "shares": [{"member": manager_id, "amount_cents": 1000}],
        })),
    )
    .await;
    assert_eq!(status, 200);
}

#[tokio::test]
async fn meal_counts_are_bounded_and_listable_by_month() {
    let addr = spawn_app().await;
    let (manager_token, _, khata_id) = signup_with_khata(addr, "Asha", "asha@flat.tld").await;
    let (member_token, member_id) =
        join_approved(addr, &manager_token, &khata_id, "Bala", "bala@flat.tld").await;

    let (status, body) = send_json(
        addr,
        "PUT",
        &format!("/v1/khatas/{khata_id}/meals/2026-08-10"),
        Some(&member_token),
        Some(&json!({"breakfast": 1, "lunch": 0, "dinner": 10})),
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(body["error"]["code"], "INVALID_REQUEST_BODY");

    let (status, body) = send_json(
        addr,
        "PUT",
        &format!("/v1/khatas/{khata_id}/meals/2026-08-10"),
        Some(&member_token),
        Some(&json!({"breakfast": 1, "lunch": 1, "dinner": 3})),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["member"], member_id);

    // A second put for the same day replaces, not appends.
    send_json(
        addr,
        "PUT",
        &format!("/v1/khatas/{khata_id}/meals/2026-08-10"),
        Some(&member_token),
        Some(&json!({"breakfast": 0, "lunch": 1, "dinner": 1})),
    )
    .await;

    let (_, body) = send_json(
        addr,
        "GET",
        &format!("/v1/khatas/{khata_id}/meals?month=2026-08&member={member_id}"),
        Some(&manager_token),
        None,
    )
    .await;
    let days = body.as_array().expect("meal days");
    assert_eq!(days.len(), 1);
    assert_eq!(days[0]["lunch"], 1);
    assert_eq!(days[0]["dinner"], 1);
}

#[tokio::test]
async fn duty_roster_is_manager_assigned_one_member_per_day() {
    let addr = spawn_app().await;
    let (manager_token, _, khata_id) = signup_with_khata(addr, "Asha", "asha@flat.tld").await;
    let (member_token, member_id) =
        join_approved(addr, &manager_token, &khata_id, "Bala", "bala@flat.tld").await;

    let (status, _) = send_json(
        addr,
        "PUT",
        &format!("/v1/khatas/{khata_id}/duties/2026-08-14"),
        Some(&member_token),
        Some(&json!({"member": member_id, "note": null})),
    )
    .await;
    assert_eq!(status, 403);

    let (status, body) = send_json(
        addr,
        "PUT",
        &format!("/v1/khatas/{khata_id}/duties/2026-08-14"),
        Some(&manager_token),
        Some(&json!({"member": member_id, "note": "buy rice"})),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["member"], member_id);
    assert_eq!(body["note"], "buy rice");

    let (_, body) = send_json(addr, "GET", "/v1/notifications", Some(&member_token), None).await;
    assert!(body
        .as_array()
        .expect("notifications")
        .iter()
        .any(|n| n["kind"] == "duty_assigned"));

    let (_, body) = send_json(
        addr,
        "GET",
        &format!("/v1/khatas/{khata_id}/duties?month=2026-08"),
        Some(&member_token),
        None,
    )
    .await;
    assert_eq!(body.as_array().expect("duties").len(), 1);
}

#[tokio::test]
async fn monthly_ledger_combines_deposits_meals_and_expense_split() {
    let addr = spawn_app().await;
    let (manager_token, manager_id, khata_id) =
        signup_with_khata(addr, "Asha", "asha@flat.tld").await;
    let (member_token, member_id) =
        join_approved(addr, &manager_token, &khata_id, "Bala", "bala@flat.tld").await;

    // Month is mandatory.
    let (status, body) = send_json(
        addr,
        "GET",
        &format!("/v1/khatas/{khata_id}/ledger"),
        Some(&manager_token),
        None,
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(body["error"]["code"], "INVALID_QUERY_PARAMETER");

    let (status, _) = send_json(
        addr,
        "PUT",
        &format!("/v1/khatas/{khata_id}/meal-rate"),
        Some(&manager_token),
        Some(&json!({"meal_rate_cents": 50})),
    )
    .await;
    assert_eq!(status, 200);

    // Member eats five meals in August.
    send_json(
        addr,
        "PUT",
        &format!("/v1/khatas/{khata_id}/meals/2026-08-01"),
        Some(&member_token),
        Some(&json!({"breakfast": 1, "lunch": 2, "dinner": 2})),
    )
    .await;

    // Approved deposit of 1000 cents for the member.
    let (_, body) = send_json(
        addr,
        "POST",
        &format!("/v1/khatas/{khata_id}/deposits"),
        Some(&member_token),
        Some(&json!({"amount_cents": 1000, "note": null})),
    )
    .await;
    let deposit_id = body["id"].as_str().expect("deposit id").to_string();
    send_json(
        addr,
        "POST",
        &format!("/v1/deposits/{deposit_id}/decision"),
        Some(&manager_token),
        Some(&json!({"decision": "approve"})),
    )
    .await;

    // One approved expense of 401 cents and one pending that must not count.
    let (_, body) = send_json(
        addr,
        "POST",
        &format!("/v1/khatas/{khata_id}/expenses"),
        Some(&manager_token),
        Some(&json!({"description": "gas refill", "amount_cents": 401})),
    )
    .await;
    let expense_id = body["id"].as_str().expect("expense id").to_string();
    send_json(
        addr,
        "POST",
        &format!("/v1/expenses/{expense_id}/decision"),
        Some(&manager_token),
        Some(&json!({"decision": "approve"})),
    )
    .await;
    send_json(
        addr,
        "POST",
        &format!("/v1/khatas/{khata_id}/expenses"),
        Some(&member_token),
        Some(&json!({"description": "snacks", "amount_cents": 9999})),
    )
    .await;

    let (status, body) = send_json(
        addr,
        "GET",
        &format!("/v1/khatas/{khata_id}/ledger?month=2026-08"),
        Some(&member_token),
        None,
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["month"], "2026-08");
    assert_eq!(body["meal_rate_cents"], 50);
    let rows = body["rows"].as_array().expect("rows");
    assert_eq!(rows.len(), 2);

    let member_row = rows
        .iter()
        .find(|r| r["member"] == member_id.as_str())
        .expect("member row");
    assert_eq!(member_row["deposits_cents"], 1000);
    assert_eq!(member_row["meal_count"], 5);
    assert_eq!(member_row["meal_cost_cents"], 250);
    // 401 split two ways: the lexicographically-first member takes the spare cent.
    let manager_row = rows
        .iter()
        .find(|r| r["member"] == manager_id.as_str())
        .expect("manager row");
    let shares = [
        member_row["expense_share_cents"].as_i64().expect("share"),
        manager_row["expense_share_cents"].as_i64().expect("share"),
    ];
    assert_eq!(shares.iter().sum::<i64>(), 401);
    assert!(shares.contains(&200) && shares.contains(&201));
    assert_eq!(
        member_row["balance_cents"].as_i64().expect("balance"),
        1000 - 250 - member_row["expense_share_cents"].as_i64().expect("share")
    );
}
