use super::*;

fn test_client(base_url: &str) -> CianClient {
    CianClient::with_base_url("test-token", 30, "cianstat-test/0.1", base_url)
        .expect("client construction should not fail")
}

#[test]
fn build_url_joins_endpoint_under_base() {
    let client = test_client("https://public-api.cian.ru");
    let url = client
        .build_url(VIEWS_BY_DAYS, &[("offerId", "42".to_owned())])
        .unwrap();
    assert_eq!(
        url.as_str(),
        "https://public-api.cian.ru/v1/get-views-statistics-by-days?offerId=42"
    );
}

#[test]
fn build_url_strips_trailing_slashes() {
    let client = test_client("https://public-api.cian.ru//");
    let url = client.build_url(CHATS, &[]).unwrap();
    assert_eq!(url.as_str(), "https://public-api.cian.ru/v1/get-chats");
}

#[test]
fn build_url_repeats_list_params() {
    let client = test_client("https://public-api.cian.ru");
    let url = client
        .build_url(
            AUCTION,
            &[("offerIds", "1".to_owned()), ("offerIds", "2".to_owned())],
        )
        .unwrap();
    assert_eq!(
        url.as_str(),
        "https://public-api.cian.ru/v1/get-auction?offerIds=1&offerIds=2"
    );
}

#[test]
fn with_base_url_rejects_garbage() {
    let result = CianClient::with_base_url("t", 30, "ua", "not a url");
    assert!(
        matches!(result, Err(ApiError::InvalidBaseUrl { .. })),
        "expected InvalidBaseUrl"
    );
}

#[test]
fn status_error_collects_result_errors() {
    let url = Url::parse("https://public-api.cian.ru/v1/get-auction").unwrap();
    let body = r#"{"result":{"errors":[{"code":"badRequest","key":"offerIds","message":"too many ids"}]}}"#;
    let err = CianClient::status_error(400, &url, body);
    match err {
        ApiError::Status {
            status, detail, ..
        } => {
            assert_eq!(status, 400);
            assert_eq!(detail, "offerIds: too many ids");
        }
        other => panic!("expected Status, got {other:?}"),
    }
}

#[test]
fn status_error_tolerates_non_json_body() {
    let url = Url::parse("https://public-api.cian.ru/v1/get-chats").unwrap();
    let err = CianClient::status_error(502, &url, "<html>bad gateway</html>");
    assert!(err.is_server_error());
    assert!(err.to_string().contains("no error details"));
}
