use std::{path::Path, sync::Arc};

use serde_json::{Value, json};
use sheetgrade::{
    SheetError, SheetStore,
    sheet::{
        CellWrite, GoogleSheet, ServiceAccountAuth, ServiceAccountKey, StaticToken, TokenSource,
        resolve_output_columns,
    },
};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_string_contains, header, method, path, query_param},
};

fn sheet(server: &MockServer) -> GoogleSheet {
    GoogleSheet::new(
        reqwest::Client::new(),
        server.uri(),
        "sheet-123",
        "Sheet1",
        Arc::new(StaticToken("tok".into())),
    )
}

#[tokio::test]
async fn reads_header_and_rows() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v4/spreadsheets/sheet-123/values/Sheet1"))
        .and(header("authorization", "Bearer tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "range": "Sheet1!A1:C3",
            "majorDimension": "ROWS",
            "values": [
                ["Student ID", "Bits answer", "Hex answer"],
                ["alice", "01010111", 57],
                ["bob"]
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let snapshot = sheet(&server).read_all().await.expect("read should succeed");

    assert_eq!(snapshot.header, vec!["Student ID", "Bits answer", "Hex answer"]);
    assert_eq!(snapshot.rows.len(), 2);
    assert_eq!(snapshot.rows[0].index, 1);
    assert_eq!(snapshot.rows[0].cell(2), "57");
    assert_eq!(snapshot.rows[1].cells, vec!["bob"]);
    assert_eq!(snapshot.rows[1].cell(1), "");
}

#[tokio::test]
async fn empty_tab_reads_as_empty_snapshot() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v4/spreadsheets/sheet-123/values/Sheet1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "range": "Sheet1!A1:Z1000" })),
        )
        .mount(&server)
        .await;

    let snapshot = sheet(&server).read_all().await.expect("read should succeed");
    assert!(snapshot.header.is_empty());
    assert!(snapshot.rows.is_empty());
}

#[tokio::test]
async fn writes_are_sent_as_one_raw_batch() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v4/spreadsheets/sheet-123/values:batchUpdate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "totalUpdatedCells": 2 })))
        .expect(1)
        .mount(&server)
        .await;

    sheet(&server)
        .write_cells(&[
            CellWrite::new(1, 5, "Bits answer (0.50): Correct"),
            CellWrite::new(1, 6, "0.50"),
        ])
        .await
        .expect("write should succeed");

    let requests = server.received_requests().await.expect("recording enabled");
    let body: Value = serde_json::from_slice(&requests[0].body).expect("JSON body");
    assert_eq!(
        body,
        json!({
            "valueInputOption": "RAW",
            "data": [
                { "range": "Sheet1!F2", "values": [["Bits answer (0.50): Correct"]] },
                { "range": "Sheet1!G2", "values": [["0.50"]] }
            ]
        })
    );
}

#[tokio::test]
async fn empty_write_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    sheet(&server)
        .write_cells(&[])
        .await
        .expect("nothing to write");
}

#[tokio::test]
async fn missing_columns_are_labelled_in_the_header_row() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v4/spreadsheets/sheet-123/values:batchUpdate"))
        .and(body_string_contains("Sheet1!C1"))
        .and(body_string_contains("Sheet1!D1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let header = vec!["Student ID".to_string(), "Bits answer".to_string()];
    let columns = resolve_output_columns(&sheet(&server), &header)
        .await
        .expect("columns should be created");
    assert_eq!((columns.feedback, columns.grade), (2, 3));
}

#[tokio::test]
async fn title_includes_the_tab() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v4/spreadsheets/sheet-123"))
        .and(query_param("fields", "properties.title"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "properties": { "title": "Encoding quiz" } })),
        )
        .mount(&server)
        .await;

    let title = sheet(&server).title().await.expect("title should load");
    assert_eq!(title, "Encoding quiz / Sheet1");
}

#[tokio::test]
async fn api_errors_keep_status_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403).set_body_string("caller does not have permission"))
        .mount(&server)
        .await;

    let err = sheet(&server).read_all().await.expect_err("403 must fail");
    match err {
        SheetError::Api { status, body } => {
            assert_eq!(status, 403);
            assert!(body.contains("permission"));
        }
        other => panic!("expected an API error, got {other:?}"),
    }
}

#[tokio::test]
async fn first_tab_is_looked_up() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v4/spreadsheets/history-1"))
        .and(query_param("fields", "sheets.properties.title"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "sheets": [
                { "properties": { "title": "Notes" } },
                { "properties": { "title": "Archive" } }
            ]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v4/spreadsheets/history-1/values/Notes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "values": [["Note"], ["forgot the padding"]]
        })))
        .mount(&server)
        .await;

    let history = GoogleSheet::open_first_tab(
        reqwest::Client::new(),
        server.uri(),
        "history-1",
        Arc::new(StaticToken("tok".into())),
    )
    .await
    .expect("first tab should resolve");

    assert_eq!(history.tab(), "Notes");
    let snapshot = history.read_all().await.expect("read should succeed");
    assert_eq!(snapshot.rows[0].cells, vec!["forgot the padding"]);
}

fn fixture_key(token_uri: String) -> ServiceAccountKey {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/service_account.json");
    let text = std::fs::read_to_string(path).expect("fixture exists");
    let mut key: ServiceAccountKey = serde_json::from_str(&text).expect("fixture parses");
    key.token_uri = token_uri;
    key
}

#[tokio::test]
async fn service_account_token_is_exchanged_once_and_cached() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant-type%3Ajwt-bearer"))
        .and(body_string_contains("assertion="))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "minted-token",
            "expires_in": 3599,
            "token_type": "Bearer"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v4/spreadsheets/sheet-123/values/Sheet1"))
        .and(header("authorization", "Bearer minted-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "values": [["Student ID"]] })))
        .expect(2)
        .mount(&server)
        .await;

    let auth = ServiceAccountAuth::new(fixture_key(format!("{}/token", server.uri())))
        .expect("fixture key is a valid RSA key");
    assert_eq!(auth.client_email(), "grader@sheetgrade-tests.iam.gserviceaccount.com");

    let sheet = GoogleSheet::new(
        reqwest::Client::new(),
        server.uri(),
        "sheet-123",
        "Sheet1",
        Arc::new(auth),
    );
    sheet.read_all().await.expect("first read");
    sheet.read_all().await.expect("second read reuses the token");
}

#[tokio::test]
async fn rejected_assertion_is_an_auth_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({ "error": "invalid_grant" })))
        .mount(&server)
        .await;

    let auth = ServiceAccountAuth::new(fixture_key(format!("{}/token", server.uri())))
        .expect("fixture key is a valid RSA key");
    let err = auth
        .access_token(&reqwest::Client::new())
        .await
        .expect_err("token exchange must fail");
    assert!(matches!(err, SheetError::Auth(msg) if msg.contains("invalid_grant")));
}

#[test]
fn garbage_private_key_is_rejected() {
    let mut key = fixture_key("http://127.0.0.1:9/token".into());
    key.private_key = "not a key".into();
    assert!(matches!(ServiceAccountAuth::new(key), Err(SheetError::Auth(_))));
}
