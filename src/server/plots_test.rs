use super::*;

fn ring() -> Value {
    json!([
        {"lat": -13.240, "lng": 34.300},
        {"lat": -13.240, "lng": 34.301},
        {"lat": -13.241, "lng": 34.301}
    ])
}

#[test]
fn validate_accepts_minimal_body() {
    let draft = validate_draft(json!({ "name": "  Maize  ", "points": ring() })).unwrap();
    assert_eq!(draft.name, "Maize");
    assert_eq!(draft.points.len(), 3);
    assert!(draft.owner_ref.is_none());
    assert!(draft.metadata.is_empty());
}

#[test]
fn validate_accepts_legacy_field_names() {
    let draft = validate_draft(json!({
        "plot_name": "Rice",
        "owner_phone": "+265991112222",
        "points": ring(),
        "area_acres": "1.5"
    }))
    .unwrap();
    assert_eq!(draft.name, "Rice");
    assert_eq!(draft.owner_ref.as_deref(), Some("+265991112222"));
    assert_eq!(draft.metadata.get("area_acres"), Some(&json!("1.5")));
}

#[test]
fn blank_or_non_string_name_falls_back_to_plot_name() {
    let draft = validate_draft(json!({ "name": "", "plot_name": "Rice", "points": ring() })).unwrap();
    assert_eq!(draft.name, "Rice");
    let draft = validate_draft(json!({ "name": 7, "plot_name": " Millet ", "points": ring() })).unwrap();
    assert_eq!(draft.name, "Millet");
}

#[test]
fn both_owner_keys_are_consumed() {
    let draft = validate_draft(json!({
        "name": "A",
        "points": ring(),
        "ownerRef": "u-1",
        "owner_phone": "+265990000001"
    }))
    .unwrap();
    assert_eq!(draft.owner_ref.as_deref(), Some("u-1"));
    assert!(draft.metadata.get("ownerRef").is_none());
    assert!(draft.metadata.get("owner_phone").is_none());
}

#[test]
fn validate_strips_server_owned_fields() {
    let draft = validate_draft(json!({ "name": "A", "points": ring(), "id": "X", "status": "approved" })).unwrap();
    assert!(draft.metadata.get("id").is_none());
    assert!(draft.metadata.get("status").is_none());
}

#[test]
fn validate_requires_name() {
    let err = validate_draft(json!({ "points": ring() })).unwrap_err();
    assert_eq!(err, ApiError::bad_request("name required"));
    let err = validate_draft(json!({ "name": "   ", "points": ring() })).unwrap_err();
    assert_eq!(err.message, "name required");
}

#[test]
fn validate_requires_points() {
    assert_eq!(validate_draft(json!({ "name": "A" })).unwrap_err().message, "points required");
}

#[test]
fn validate_rejects_malformed_points() {
    let err = validate_draft(json!({ "name": "A", "points": [{"lat": "north"}] })).unwrap_err();
    assert_eq!(err.message, "invalid points");
}

#[test]
fn validate_rejects_fewer_than_three_points() {
    let err = validate_draft(json!({ "name": "A", "points": [{"lat": 0.0, "lng": 0.0}, {"lat": 1.0, "lng": 1.0}] }))
        .unwrap_err();
    assert_eq!(err.message, "at least 3 points required");
    assert_eq!(err.status, StatusCode::BAD_REQUEST);
}

#[test]
fn validate_rejects_non_object() {
    assert!(validate_draft(json!([1, 2, 3])).is_err());
}

#[test]
fn plot_ids_are_sequential_and_padded() {
    assert_eq!(next_plot_id(0), "PL0001");
    assert_eq!(next_plot_id(41), "PL0042");
    assert_eq!(next_plot_id(9999), "PL10000");
}

#[test]
fn authorize_without_configured_token_allows_all() {
    let state = RegistryState::new(None);
    assert!(authorize(&state, &HeaderMap::new()).is_ok());
}

#[test]
fn authorize_checks_bearer_token() {
    let state = RegistryState::new(Some("t0k".into()));
    let mut headers = HeaderMap::new();
    assert_eq!(authorize(&state, &headers).unwrap_err().status, StatusCode::UNAUTHORIZED);

    headers.insert(AUTHORIZATION, "Bearer wrong".parse().unwrap());
    assert!(authorize(&state, &headers).is_err());

    headers.insert(AUTHORIZATION, "Bearer t0k".parse().unwrap());
    assert!(authorize(&state, &headers).is_ok());
}
