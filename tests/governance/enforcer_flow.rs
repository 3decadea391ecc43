use super::support::{plane, plane_with};
use chrono::Duration;
use loopgov::Config;
use loopgov::enforcer::{PermissionOverride, ViolationKind};

#[test]
fn rate_limit_window_resets_after_sixty_one_seconds() {
    let mut config = Config::default();
    config.enforcer.base_profile.rate_limit_per_minute = 3;
    let (plane, clock) = plane_with(config);
    let enforcer = plane.enforcer();

    assert!(enforcer.check_rate_limit("hal"));
    assert!(enforcer.check_rate_limit("hal"));
    assert!(enforcer.check_rate_limit("hal"));
    assert!(!enforcer.check_rate_limit("hal"));

    clock.advance(Duration::seconds(61));
    assert!(enforcer.check_rate_limit("hal"));

    let violations = enforcer.violations("hal");
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].violation_type, ViolationKind::RateLimit);
}

#[test]
fn narrowing_override_applies_and_widening_falls_back() {
    let mut config = Config::default();
    config.enforcer.base_profile.allowed_tools = vec!["a".into(), "b".into()];
    config.enforcer.agents.insert(
        "narrow".into(),
        PermissionOverride {
            allowed_tools: Some(vec!["a".into()]),
            ..PermissionOverride::default()
        },
    );
    config.enforcer.agents.insert(
        "wide".into(),
        PermissionOverride {
            allowed_tools: Some(vec!["a".into(), "b".into(), "c".into()]),
            ..PermissionOverride::default()
        },
    );
    config.enforcer.agents.insert(
        "elevated".into(),
        PermissionOverride {
            allowed_tools: Some(vec!["a".into(), "b".into(), "c".into()]),
            elevated: true,
            ..PermissionOverride::default()
        },
    );
    let (plane, _) = plane_with(config);
    let enforcer = plane.enforcer();

    assert!(!enforcer.check_tool_permission("narrow", "b"));
    assert!(enforcer.check_tool_permission("narrow", "a"));

    assert!(!enforcer.check_tool_permission("wide", "c"));
    assert!(enforcer.check_tool_permission("wide", "b"));
    assert!(
        enforcer
            .violations("wide")
            .iter()
            .any(|v| v.violation_type == ViolationKind::ConfigElevation)
    );

    assert!(enforcer.check_tool_permission("elevated", "c"));
}

#[test]
fn repeated_violations_turn_severe() {
    let (plane, _) = plane();
    let enforcer = plane.enforcer();
    for _ in 0..3 {
        assert!(!enforcer.check_code_execution("nova"));
    }
    let violations = enforcer.violations("nova");
    assert_eq!(violations.len(), 3);
    assert_eq!(violations[0].recommended_action, "block");
    assert!(violations[2].threshold_exceeded);
    assert_eq!(violations[2].recommended_action, "terminate");
}

#[test]
fn low_confidence_escalates() {
    let (plane, _) = plane();
    let verdict = plane.enforcer().check_confidence("sage", 0.2);
    assert!(verdict.escalate);
    assert!(!plane.enforcer().check_confidence("sage", 0.9).escalate);
}
