// Integration tests for form templates, field validation and configuration

use chrono::{Local, TimeZone};
use serde_json::json;
use std::io::Write;
use tempfile::NamedTempFile;
use voiceform::config::Config;
use voiceform::error::ClientError;
use voiceform::protocol::ParamType;
use voiceform::session::FieldCatalog;
use voiceform::templates::{
    default_templates, function_definitions, parsing_guide, TemplateStore, TimeContext,
};

fn template(name: &str) -> voiceform::templates::Template {
    TemplateStore::default()
        .find(name)
        .cloned()
        .unwrap_or_else(|| panic!("missing built-in template {}", name))
}

fn fixed_time() -> TimeContext {
    TimeContext {
        now: Local.with_ymd_and_hms(2026, 10, 18, 19, 30, 0).unwrap(),
    }
}

#[test]
fn test_builtin_templates() {
    let store = TemplateStore::default();
    let names: Vec<&str> = store.templates().iter().map(|t| t.name.as_str()).collect();

    assert_eq!(names, vec!["Restaurant Booking", "Meeting Scheduling", "Product Ordering"]);
    assert!(store.find("restaurant booking").is_some(), "Lookup ignores case");
    assert!(store.find("Hotel Booking").is_none());
}

#[test]
fn test_function_definition_per_field() {
    let restaurant = template("Restaurant Booking");
    let definitions = function_definitions(&restaurant);

    let names: Vec<&str> = definitions.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "update_customer_name",
            "update_party_size",
            "update_date",
            "update_time",
            "update_special_requests"
        ]
    );

    let party = &definitions[1];
    assert_eq!(
        party.description,
        "Update the Party Size field. Number of people for the reservation"
    );
    assert_eq!(party.parameters.kind, ParamType::Object);
    assert_eq!(party.parameters.properties["party_size"].kind, ParamType::Number);
    assert_eq!(party.parameters.required, Some(vec!["party_size".to_string()]));

    let date = &definitions[2].parameters.properties["date"];
    assert_eq!(date.kind, ParamType::String);
    assert!(date.description.as_deref().unwrap().contains("YYYY-MM-DD"));

    let requests = &definitions[4];
    assert_eq!(requests.parameters.required, Some(Vec::new()), "Optional field");
}

#[test]
fn test_select_and_checkbox_fields() {
    let ordering = template("Product Ordering");
    let definitions = function_definitions(&ordering);

    let shipping = definitions
        .iter()
        .find(|d| d.name == "update_shipping_method")
        .unwrap();
    let schema = &shipping.parameters.properties["shipping_method"];
    assert_eq!(schema.kind, ParamType::String);
    assert_eq!(schema.format.as_deref(), Some("enum"));
    assert_eq!(schema.enum_values.as_ref().map(Vec::len), Some(4));
    assert!(schema.description.as_deref().unwrap().contains("(one of: Standard (5-7 days)"));

    let gift_wrap = definitions.iter().find(|d| d.name == "update_gift_wrap").unwrap();
    assert_eq!(gift_wrap.parameters.properties["gift_wrap"].kind, ParamType::Boolean);
}

#[test]
fn test_parsing_guide_contents() {
    let guide = parsing_guide(&template("Meeting Scheduling"), &fixed_time());

    assert!(guide.contains("**Type of speech**: Meeting Scheduling"));
    assert!(guide.contains("scheduling meetings"));
    assert!(guide.contains("Date: **2026-10-18** (Sunday, October 18, 2026)"));
    assert!(guide.contains("Time: **19:30:00** (Sunday)"));
    assert!(guide.contains("\"tomorrow\" ⇒ 2026-10-19"));
}

#[test]
fn test_field_validation() {
    let mut definitions = function_definitions(&template("Meeting Scheduling"));
    definitions.extend(function_definitions(&template("Product Ordering")));
    let catalog = FieldCatalog::from_definitions(&definitions);

    assert!(catalog.contains("location"));
    assert!(!catalog.contains("update_location"));

    // Numbers accept their string spelling
    assert_eq!(catalog.validate("duration", json!(45)).unwrap(), json!(45));
    assert_eq!(catalog.validate("duration", json!("30.5")).unwrap().as_f64(), Some(30.5));
    assert!(catalog.validate("duration", json!("half an hour")).is_err());
    assert!(catalog.validate("duration", json!(true)).is_err());

    // Selections must be one of the options
    assert_eq!(catalog.validate("location", json!("Zoom")).unwrap(), json!("Zoom"));
    match catalog.validate("location", json!("Skype")) {
        Err(ClientError::Validation { field, reason }) => {
            assert_eq!(field, "location");
            assert!(reason.contains("Zoom"));
        }
        other => panic!("expected a validation error, got {:?}", other),
    }

    // Checkboxes
    assert_eq!(catalog.validate("gift_wrap", json!("true")).unwrap(), json!(true));
    assert_eq!(catalog.validate("gift_wrap", json!(false)).unwrap(), json!(false));
    assert!(catalog.validate("gift_wrap", json!("yes")).is_err());

    // Text fields take strings only
    assert!(catalog.validate("meeting_title", json!(12)).is_err());

    // null clears any known field
    assert_eq!(catalog.validate("duration", json!(null)).unwrap(), json!(null));
    assert!(catalog.validate("nonexistent", json!(null)).is_err());
}

#[test]
fn test_load_template_file() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        "{}",
        json!([{
            "name": "Support Ticket",
            "description": "For speech about reporting problems",
            "fields": [
                {"identifier": "summary", "name": "Summary", "type": "text", "required": true},
                {"identifier": "priority", "name": "Priority", "type": "radio-group",
                 "options": ["low", "high"]}
            ]
        }])
    )
    .unwrap();

    let store = TemplateStore::load(file.path()).unwrap();
    let ticket = store.find("support ticket").unwrap();
    assert_eq!(ticket.fields.len(), 2);

    let definitions = function_definitions(ticket);
    let priority = &definitions[1].parameters.properties["priority"];
    assert_eq!(priority.enum_values, Some(vec!["low".to_string(), "high".to_string()]));
    assert_eq!(definitions[1].parameters.required, Some(Vec::new()));
}

#[test]
fn test_invalid_template_files_are_rejected() {
    let cases = [
        "not json".to_string(),
        "[]".to_string(),
        json!([{"name": "Broken", "fields": [
            {"identifier": "a", "name": "A", "type": "text"},
            {"identifier": "a", "name": "Again", "type": "text"}
        ]}])
        .to_string(),
        json!([{"name": "Broken", "fields": [
            {"identifier": "", "name": "Nameless", "type": "text"}
        ]}])
        .to_string(),
        json!([{"name": "Broken", "fields": [
            {"identifier": "a", "name": "A", "type": "slider"}
        ]}])
        .to_string(),
    ];

    for content in cases {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        assert!(TemplateStore::load(file.path()).is_err(), "{} should be rejected", content);
    }
}

#[test]
fn test_missing_template_file() {
    assert!(TemplateStore::load("/nonexistent/templates.json").is_err());
    assert_eq!(
        TemplateStore::load_or_default(None).unwrap().templates(),
        default_templates().as_slice()
    );
}

#[test]
fn test_config_file_and_session_config() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    write!(
        file,
        r#"
[client]
endpoint = "wss://speech.example.com/ws"
language = "de-DE"

[speech]
stability_threshold = 0.6

[functions]
update_interval_ms = 500

[audio]
chunk_ms = 100
"#
    )
    .unwrap();

    let config = Config::load(file.path().to_str().unwrap()).unwrap();

    assert_eq!(config.client.endpoint, "wss://speech.example.com/ws");
    assert_eq!(config.service.http.port, 3030, "Unset sections keep defaults");
    assert_eq!(config.speech.sample_rate, 16000);
    assert_eq!(config.backend_config().chunk_ms, 100);

    let session = config.session_config(&template("Restaurant Booking"), &fixed_time());
    assert_eq!(session.endpoint, "wss://speech.example.com/ws");
    assert_eq!(session.language, "de-DE");
    assert!((session.speech.stability_threshold - 0.6).abs() < 1e-6);
    assert_eq!(session.functions.update_interval_ms, 500);
    assert_eq!(session.functions.definitions.len(), 5);
    assert!(session.functions.parsing_guide.contains("Restaurant Booking"));
    assert!(session.validate().is_ok());
}

#[test]
fn test_session_config_validation() {
    let config = Config::default();
    let mut session = config.session_config(&template("Restaurant Booking"), &fixed_time());
    assert!(session.validate().is_ok());

    session.speech.stability_threshold = 1.5;
    assert!(matches!(session.validate(), Err(ClientError::Config(_))));

    session.speech.stability_threshold = 0.8;
    let duplicate = session.functions.definitions[0].clone();
    session.functions.definitions.push(duplicate);
    assert!(matches!(session.validate(), Err(ClientError::Config(_))));
}
