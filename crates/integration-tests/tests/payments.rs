//! Payment-proof upload and staff verification.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use axum::http::{StatusCode, header};
use serde_json::{Value, json};

use zahra_integration_tests::{MultipartBody, PNG_PIXEL, Shopper, TestApp, checkout};

/// Place a one-line bank-transfer order and return its order number.
async fn place_order(app: &TestApp, shopper: &mut Shopper) -> String {
    let lawn = app.category("Lawn", "lawn");
    let suit = app.product(lawn.id, "Lawn Suit", 4500).await;
    let response = shopper
        .post_json("/orders", &checkout(&[(suit.id, "Lawn Suit", 4500, 1)], "bank"))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    response.json()["orderNumber"].as_str().unwrap().to_owned()
}

async fn upload_proof(shopper: &mut Shopper, order_number: &str) -> Value {
    let form = MultipartBody::new()
        .text("orderNumber", order_number)
        .file("file", "image/png", PNG_PIXEL);
    let response = shopper.post_form("/payment-proof", form).await;
    assert_eq!(response.status, StatusCode::OK, "{}", response.json());
    response.json()
}

async fn order_detail(shopper: &mut Shopper, order_number: &str) -> Value {
    shopper
        .get(&format!("/orders?orderNumber={order_number}"))
        .await
        .json()
}

#[tokio::test]
async fn upload_marks_order_and_serves_the_file() {
    let app = TestApp::new();
    let mut shopper = app.shopper();
    let order_number = place_order(&app, &mut shopper).await;

    let uploaded = upload_proof(&mut shopper, &order_number).await;
    assert_eq!(uploaded["success"], true);
    let file_url = uploaded["fileUrl"].as_str().unwrap().to_owned();
    assert!(file_url.starts_with("/uploads/"));
    assert!(file_url.ends_with(".png"));
    assert_eq!(app.stored_uploads().len(), 1);

    let detail = order_detail(&mut shopper, &order_number).await;
    assert_eq!(detail["order"]["payment_status"], "proof_uploaded");
    assert_eq!(detail["paymentProof"]["proof_image_url"], file_url.as_str());
    assert_eq!(detail["paymentProof"]["verification_status"], "pending");

    let served = shopper.get(&file_url).await;
    assert_eq!(served.status, StatusCode::OK);
    assert_eq!(served.bytes, PNG_PIXEL);
    assert_eq!(served.headers[header::CONTENT_TYPE], "image/png");
}

#[tokio::test]
async fn latest_proof_wins() {
    let app = TestApp::new();
    let mut shopper = app.shopper();
    let order_number = place_order(&app, &mut shopper).await;

    upload_proof(&mut shopper, &order_number).await;
    let second = upload_proof(&mut shopper, &order_number).await;

    let detail = order_detail(&mut shopper, &order_number).await;
    assert_eq!(detail["paymentProof"]["proof_image_url"], second["fileUrl"]);
}

#[tokio::test]
async fn unknown_order_stores_nothing() {
    let app = TestApp::new();
    let mut shopper = app.shopper();

    let form = MultipartBody::new()
        .text("orderNumber", "ORD-LOST-0000")
        .file("file", "image/png", PNG_PIXEL);
    let response = shopper.post_form("/payment-proof", form).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert!(app.stored_uploads().is_empty());
}

#[tokio::test]
async fn rejects_missing_parts_and_bad_files() {
    let app = TestApp::new();
    let mut shopper = app.shopper();
    let order_number = place_order(&app, &mut shopper).await;

    let form = MultipartBody::new().text("orderNumber", &order_number);
    let response = shopper.post_form("/payment-proof", form).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json()["error"], "Order number and file are required");

    let form = MultipartBody::new().file("file", "image/png", PNG_PIXEL);
    let response = shopper.post_form("/payment-proof", form).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let form = MultipartBody::new()
        .text("orderNumber", &order_number)
        .file("file", "application/pdf", b"%PDF-1.4");
    let response = shopper.post_form("/payment-proof", form).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let oversized = vec![0_u8; zahra_integration_tests::TEST_MAX_UPLOAD_BYTES + 1];
    let form = MultipartBody::new()
        .text("orderNumber", &order_number)
        .file("file", "image/png", &oversized);
    let response = shopper.post_form("/payment-proof", form).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    assert!(app.stored_uploads().is_empty());
    let detail = order_detail(&mut shopper, &order_number).await;
    assert_eq!(detail["order"]["payment_status"], "pending");
}

#[tokio::test]
async fn approving_confirms_payment() {
    let app = TestApp::new();
    let mut shopper = app.shopper();
    let order_number = place_order(&app, &mut shopper).await;
    upload_proof(&mut shopper, &order_number).await;
    let proof_id = order_detail(&mut shopper, &order_number).await["paymentProof"]["id"].clone();

    let response = shopper
        .put_json(
            "/admin/payment-proofs",
            &json!({ "proofId": proof_id, "status": "approved", "adminEmail": "Staff@Zahra.pk" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK, "{}", response.json());
    let proof = &response.json()["paymentProof"];
    assert_eq!(proof["verification_status"], "approved");
    assert_eq!(proof["verified_by"], "staff@zahra.pk");
    assert!(proof["verified_at"].is_string());

    let detail = order_detail(&mut shopper, &order_number).await;
    assert_eq!(detail["order"]["payment_status"], "confirmed");
    assert_eq!(detail["paymentProof"]["verification_status"], "approved");
}

#[tokio::test]
async fn rejecting_leaves_payment_status_alone() {
    let app = TestApp::new();
    let mut shopper = app.shopper();
    let order_number = place_order(&app, &mut shopper).await;
    upload_proof(&mut shopper, &order_number).await;
    let proof_id = order_detail(&mut shopper, &order_number).await["paymentProof"]["id"].clone();

    let response = shopper
        .put_json(
            "/admin/payment-proofs",
            &json!({ "proofId": proof_id, "status": "rejected" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.json()["paymentProof"]["verified_by"].is_null());

    let detail = order_detail(&mut shopper, &order_number).await;
    assert_eq!(detail["order"]["payment_status"], "proof_uploaded");
    assert_eq!(detail["paymentProof"]["verification_status"], "rejected");
}

#[tokio::test]
async fn signed_in_reviewer_is_recorded_when_no_email_given() {
    let app = TestApp::new();
    let mut shopper = app.shopper();
    let order_number = place_order(&app, &mut shopper).await;
    upload_proof(&mut shopper, &order_number).await;
    let proof_id = order_detail(&mut shopper, &order_number).await["paymentProof"]["id"].clone();

    let mut staff = app.shopper();
    staff.register("hina@zahra.pk", "s3cure-passw0rd").await;
    let response = staff
        .put_json(
            "/admin/payment-proofs",
            &json!({ "proofId": proof_id, "status": "approved" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["paymentProof"]["verified_by"], "hina@zahra.pk");
}

#[tokio::test]
async fn decided_proofs_cannot_be_decided_again() {
    let app = TestApp::new();
    let mut shopper = app.shopper();
    let order_number = place_order(&app, &mut shopper).await;
    upload_proof(&mut shopper, &order_number).await;
    let proof_id = order_detail(&mut shopper, &order_number).await["paymentProof"]["id"].clone();

    let decide = |status: &'static str| json!({ "proofId": proof_id, "status": status });
    assert_eq!(
        shopper.put_json("/admin/payment-proofs", &decide("rejected")).await.status,
        StatusCode::OK
    );
    let again = shopper.put_json("/admin/payment-proofs", &decide("approved")).await;
    assert_eq!(again.status, StatusCode::CONFLICT);

    let detail = order_detail(&mut shopper, &order_number).await;
    assert_eq!(detail["order"]["payment_status"], "proof_uploaded");
}

#[tokio::test]
async fn review_requires_proof_and_decision() {
    let app = TestApp::new();
    let mut shopper = app.shopper();

    let response = shopper
        .put_json("/admin/payment-proofs", &json!({ "status": "approved" }))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json()["error"], "Proof ID and status are required");

    let response = shopper
        .put_json(
            "/admin/payment-proofs",
            &json!({ "proofId": 4040, "status": "approved" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let response = shopper
        .put_json(
            "/admin/payment-proofs",
            &json!({ "proofId": 1, "status": "pending" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}
