use loopgov::admission::FallbackPolicy;
use loopgov::config::Config;

#[test]
fn minimal_config_deserializes_with_defaults() {
    let toml = r#"
audit_dir = "/var/lib/loopgov"

[admission]
fallback_policy = "log_and_alert_operator"
"#;

    let parsed: Config = toml::from_str(toml).expect("minimal config should deserialize");

    assert_eq!(parsed.audit_dir, "/var/lib/loopgov");
    assert_eq!(
        parsed.admission.fallback_policy,
        FallbackPolicy::LogAndAlertOperator
    );
    assert!((parsed.admission.min_trust_score - 0.5).abs() < f64::EPSILON);
    assert_eq!(parsed.enforcer.violation_threshold, 3);
    assert_eq!(parsed.historian.window, 5);
    assert_eq!(parsed.observability.log_level, "info");
    parsed.validate().expect("defaults validate");
}

#[test]
fn agent_overrides_parse_with_tool_alias() {
    let toml = r#"
[enforcer.base_profile]
tools = ["web_search", "summarize"]
rate_limit_per_minute = 10

[enforcer.agents.hal]
tools = ["summarize"]

[enforcer.agents.nova]
allow_code_execution = true
elevated = true
"#;

    let parsed: Config = toml::from_str(toml).expect("enforcer config should deserialize");
    let base = &parsed.enforcer.base_profile;
    assert_eq!(base.allowed_tools, vec!["web_search", "summarize"]);
    assert_eq!(base.rate_limit_per_minute, 10);
    assert_eq!(base.max_retries, 3);

    let hal = &parsed.enforcer.agents["hal"];
    assert_eq!(hal.allowed_tools.as_deref(), Some(&["summarize".to_string()][..]));
    assert!(!hal.elevated);
    assert!(parsed.enforcer.agents["nova"].elevated);
}

#[test]
fn config_round_trips_through_toml() {
    let config = Config::default();
    let rendered = toml::to_string_pretty(&config).expect("serialize");
    let parsed: Config = toml::from_str(&rendered).expect("parse");
    assert_eq!(parsed.reconciler.belief_weight_floor, config.reconciler.belief_weight_floor);
    assert_eq!(parsed.enforcer.base_profile, config.enforcer.base_profile);
}

#[test]
fn unknown_fallback_policy_is_rejected() {
    let toml = r#"
[admission]
fallback_policy = "sometimes"
"#;
    assert!(toml::from_str::<Config>(toml).is_err());
}
