use super::*;

#[test]
fn user_without_timestamps_parses() {
    let user: User = serde_json::from_str(r#"{"id":"u1","email":"a@b.com","name":"A"}"#).unwrap();
    assert_eq!(user.id, "u1");
    assert_eq!(user.created_at, None);
}

#[test]
fn user_accepts_camel_case_timestamps() {
    let user: User = serde_json::from_value(serde_json::json!({
        "id": "u1",
        "email": "a@b.com",
        "name": "A",
        "createdAt": "2024-01-01T00:00:00Z"
    }))
    .unwrap();
    assert_eq!(user.created_at.as_deref(), Some("2024-01-01T00:00:00Z"));
}

#[test]
fn profile_uses_server_field_names() {
    let profile: Profile = serde_json::from_value(serde_json::json!({
        "id": "p1",
        "user_id": "u1",
        "name": "Production",
        "description": null,
        "created_at": "2024-01-01",
        "updated_at": "2024-01-02"
    }))
    .unwrap();
    assert_eq!(profile.user_id, "u1");
    assert_eq!(profile.description, None);
    assert_eq!(profile.updated_at, "2024-01-02");
}

#[test]
fn token_response_refresh_is_optional() {
    let tokens: TokenResponse = serde_json::from_str(r#"{"access_token":"T1"}"#).unwrap();
    assert_eq!(tokens.access_token, "T1");
    assert_eq!(tokens.refresh_token, None);
    assert_eq!(tokens.token_type, None);
}

#[test]
fn empty_accepts_any_object() {
    let _: Empty = serde_json::from_str("{}").unwrap();
    let _: Empty = serde_json::from_str(r#"{"ok":true}"#).unwrap();
}

#[test]
fn billing_cycle_parsing() {
    assert_eq!("Monthly".parse::<BillingCycle>(), Ok(BillingCycle::Monthly));
    assert_eq!("annual".parse::<BillingCycle>(), Ok(BillingCycle::Yearly));
    assert!("weekly".parse::<BillingCycle>().is_err());
    assert_eq!(serde_json::to_string(&BillingCycle::Yearly).unwrap(), r#""yearly""#);
}

#[test]
fn subscription_accepts_both_spellings() {
    let camel: Subscription = serde_json::from_value(serde_json::json!({
        "planId": "pro",
        "billingCycle": "monthly",
        "cancelAtPeriodEnd": true
    }))
    .unwrap();
    let snake: Subscription = serde_json::from_value(serde_json::json!({
        "plan_id": "pro",
        "billing_cycle": "monthly",
        "cancel_at_period_end": true
    }))
    .unwrap();
    assert_eq!(camel, snake);
    assert_eq!(camel.plan_id.as_deref(), Some("pro"));
    assert!(camel.cancel_at_period_end);
}

#[test]
fn invoice_minimal_parses() {
    let invoice: Invoice = serde_json::from_str(r#"{"id":"in_1","amount_due":4900}"#).unwrap();
    assert_eq!(invoice.amount, 4900);
    assert_eq!(invoice.currency, None);
}
