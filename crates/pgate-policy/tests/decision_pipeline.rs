//! Scenario tests for the gate decision pipeline.
//!
//! Each test drives the public API only, with an explicit clock so every
//! call lands in a known rate-limit window.

use chrono::{DateTime, Duration, Utc};
use pgate_core::{Decision, OrderIntent, OrderSide, PolicyConfig, ReasonCode};
use pgate_policy::{PolicyGate, PolicyUpdate, SymbolHalt};
use rust_decimal_macros::dec;

fn t0() -> DateTime<Utc> {
    DateTime::from_timestamp_millis(1_700_000_000_000).unwrap()
}

fn config(raw: &str) -> PolicyConfig {
    serde_json::from_str(raw).expect("parse PolicyConfig")
}

fn gate_from_json(raw: &str) -> PolicyGate {
    PolicyGate::new_at(config(raw), t0())
}

fn order(raw: &str) -> OrderIntent {
    serde_json::from_str(raw).expect("parse OrderIntent")
}

const SCENARIO_CONFIG: &str =
    r#"{"limits":{"rate_per_sec":2,"max_order_usdt":1000},"guards":{},"kill_switch":false}"#;

#[test]
fn test_two_pass_then_rate_limit_in_same_second() {
    let gate = gate_from_json(SCENARIO_CONFIG);
    let o = order(r#"{"symbol":"ETHUSDT","side":"buy","notional":500}"#);

    assert_eq!(gate.evaluate_at(&o, t0()).reason(), ReasonCode::Pass);
    assert_eq!(gate.evaluate_at(&o, t0()).reason(), ReasonCode::Pass);

    let third = gate.evaluate_at(&o, t0() + Duration::milliseconds(999));
    assert_eq!(third.reason(), ReasonCode::RateLimit);
    assert!(third.is_deny());

    // Next wall-clock second: admission resumes.
    let next = gate.evaluate_at(&o, t0() + Duration::seconds(1));
    assert_eq!(next.reason(), ReasonCode::Pass);
}

#[test]
fn test_max_order_reports_both_values() {
    let gate = gate_from_json(SCENARIO_CONFIG);
    let d = gate.evaluate_at(
        &order(r#"{"symbol":"ETHUSDT","side":"buy","notional":5000}"#),
        t0(),
    );

    assert_eq!(d.reason(), ReasonCode::MaxOrder);
    assert!(d.detail().unwrap().contains("5000 > 1000"), "{d:?}");
}

#[test]
fn test_out_of_range_notional_hits_max_order() {
    let cases = [
        r#"{"symbol":"ETHUSDT","side":"buy","notional":1e30}"#,
        r#"{"symbol":"ETHUSDT","side":"buy","notional":"123456789012345678901234567890"}"#,
        r#"{"symbol":"ETHUSDT","side":"buy","quote":"1e30"}"#,
        r#"{"symbol":"ETHUSDT","side":"buy","quote":1e300}"#,
    ];
    let gate = gate_from_json(r#"{"limits":{"rate_per_sec":100,"max_order_usdt":1000}}"#);

    for raw in cases {
        let d = gate.evaluate_at(&order(raw), t0());
        assert_eq!(d.reason(), ReasonCode::MaxOrder, "order {raw}");
        assert!(d.detail().unwrap().ends_with("> 1000"), "{d:?}");
    }
}

#[test]
fn test_non_positive_limits_mean_default_or_disabled() {
    let gate = gate_from_json(
        r#"{"limits":{"rate_per_sec":-3,"max_order_usdt":-1},"guards":{"max_staleness_ms":-1}}"#,
    );
    let o = order(r#"{"symbol":"ETHUSDT","side":"buy","notional":1e30}"#);
    let late = t0() + Duration::seconds(3600);

    for _ in 0..5 {
        assert_eq!(gate.evaluate_at(&o, late).reason(), ReasonCode::Pass);
    }
    assert_eq!(gate.evaluate_at(&o, late).reason(), ReasonCode::RateLimit);
}

#[test]
fn test_global_halt_reduce_only_is_close_only_allow() {
    let gate = gate_from_json("{}");
    gate.set_global_halt(true);

    let d = gate.evaluate_at(&order(r#"{"symbol":"X","side":"sell","reduceOnly":true}"#), t0());
    assert_eq!(d.reason(), ReasonCode::CloseOnly);
    assert!(d.is_allow());

    let d = gate.evaluate_at(&order(r#"{"symbol":"X","side":"buy"}"#), t0());
    assert_eq!(d.reason(), ReasonCode::GlobalHalt);
}

#[test]
fn test_kill_switch_close_intent_vs_plain_buy() {
    let gate = gate_from_json(r#"{"kill_switch":true}"#);

    let d = gate.evaluate_at(&order(r#"{"symbol":"X","side":"sell","intent":"close"}"#), t0());
    assert_eq!(d.reason(), ReasonCode::KillSwitchCloseOnly);
    assert!(d.is_allow());

    let d = gate.evaluate_at(&order(r#"{"symbol":"X","side":"buy"}"#), t0());
    assert_eq!(d.reason(), ReasonCode::KillSwitch);
    assert!(d.is_deny());
}

#[test]
fn test_symbol_halt_is_case_insensitive() {
    let gate = gate_from_json("{}");
    gate.set_symbol_halt("btcusdt", true);

    let d = gate.evaluate_at(&OrderIntent::new("BTCUSDT", OrderSide::Buy), t0());
    assert_eq!(d.reason(), ReasonCode::SymbolHalt);

    let d = gate.evaluate_at(&OrderIntent::new("ETHUSDT", OrderSide::Buy), t0());
    assert_eq!(d.reason(), ReasonCode::Pass);

    gate.set_symbol_halt("BTCUSDT", false);
    let d = gate.evaluate_at(&OrderIntent::new("btcusdt", OrderSide::Buy), t0());
    assert_eq!(d.reason(), ReasonCode::Pass);
}

#[test]
fn test_close_only_never_gets_bypassable_denials() {
    let gate = gate_from_json(
        r#"{"limits":{"rate_per_sec":1000,"max_order_usdt":10},"guards":{"max_staleness_ms":1}}"#,
    );
    gate.set_global_halt(true);
    gate.set_safe_mode(true);
    gate.set_symbol_halt("X", true);

    let forbidden = [
        ReasonCode::GlobalHalt,
        ReasonCode::SymbolHalt,
        ReasonCode::SafeMode,
        ReasonCode::DataStale,
        ReasonCode::MaxOrder,
    ];
    let closers = [
        OrderIntent::new("x", OrderSide::Sell).with_reduce_only(),
        OrderIntent::new("x", OrderSide::Buy).with_close_only(),
        OrderIntent::new("x", OrderSide::Sell).with_intent("close"),
    ];

    let mut now = t0();
    for closer in closers {
        now += Duration::seconds(10);
        let d = gate.evaluate_at(&closer.with_notional(dec!(99999)), now);
        assert!(!forbidden.contains(&d.reason()), "{d:?}");
        assert_eq!(d.reason(), ReasonCode::CloseOnly);
    }
}

#[test]
fn test_each_rule_in_isolation() {
    let cases: [(&str, fn(&PolicyGate), ReasonCode); 5] = [
        ("{}", |g| g.set_global_halt(true), ReasonCode::GlobalHalt),
        ("{}", |g| g.set_symbol_halt("ethusdt", true), ReasonCode::SymbolHalt),
        ("{}", |g| g.set_safe_mode(true), ReasonCode::SafeMode),
        (r#"{"kill_switch":true}"#, |_| {}, ReasonCode::KillSwitch),
        (r#"{"limits":{"max_order_usdt":1}}"#, |_| {}, ReasonCode::MaxOrder),
    ];

    for (config, setup, expected) in cases {
        let gate = gate_from_json(config);
        setup(&gate);
        let d = gate.evaluate_at(
            &order(r#"{"symbol":"ETHUSDT","side":"buy","notional":50}"#),
            t0(),
        );
        assert_eq!(d.reason(), expected, "config {config}");
        assert!(d.is_deny());
    }
}

#[test]
fn test_global_halt_precedes_symbol_halt_and_safe_mode() {
    let gate = gate_from_json("{}");
    gate.set_global_halt(true);
    gate.set_symbol_halt("ETHUSDT", true);
    gate.set_safe_mode(true);

    let o = OrderIntent::new("ETHUSDT", OrderSide::Buy);
    assert_eq!(gate.evaluate_at(&o, t0()).reason(), ReasonCode::GlobalHalt);

    gate.set_global_halt(false);
    assert_eq!(gate.evaluate_at(&o, t0()).reason(), ReasonCode::SymbolHalt);

    gate.set_symbol_halt("ETHUSDT", false);
    assert_eq!(gate.evaluate_at(&o, t0()).reason(), ReasonCode::SafeMode);
}

#[test]
fn test_rate_limit_precedes_safe_mode() {
    let gate = gate_from_json(r#"{"limits":{"rate_per_sec":1}}"#);
    gate.set_safe_mode(true);

    let o = OrderIntent::new("ETHUSDT", OrderSide::Buy);
    assert_eq!(gate.evaluate_at(&o, t0()).reason(), ReasonCode::SafeMode);
    assert_eq!(gate.evaluate_at(&o, t0()).reason(), ReasonCode::RateLimit);
}

#[test]
fn test_stale_data_precedes_max_order() {
    let gate = gate_from_json(r#"{"limits":{"max_order_usdt":1},"guards":{"max_staleness_ms":500}}"#);
    let o = OrderIntent::new("ETHUSDT", OrderSide::Buy).with_notional(dec!(10));

    let d = gate.evaluate_at(&o, t0() + Duration::seconds(5));
    assert_eq!(d.reason(), ReasonCode::DataStale);
    assert!(d.detail().unwrap().contains("5000ms"));

    let d = gate.evaluate_at(&o, t0() + Duration::seconds(5) + Duration::milliseconds(100));
    assert_eq!(d.reason(), ReasonCode::MaxOrder);
}

#[test]
fn test_versions_are_monotonic_per_epoch() {
    let gate = gate_from_json(r#"{"limits":{"rate_per_sec":100}}"#);
    let o = OrderIntent::new("ETHUSDT", OrderSide::Buy);

    let first = gate.evaluate_at(&o, t0()).version();
    assert_eq!(gate.evaluate_at(&o, t0()).version(), first);

    let v2 = gate.replace_config(config(r#"{"limits":{"rate_per_sec":100}}"#));
    assert!(v2 > first);
    assert_eq!(gate.evaluate_at(&o, t0()).version(), v2);
    assert_eq!(gate.evaluate_at(&o, t0()).version(), v2);

    let v3 = gate.replace_config(PolicyConfig::default());
    assert!(v3 > v2);
    assert_eq!(gate.evaluate_at(&o, t0()).version(), v3);
}

#[test]
fn test_replace_config_discards_rate_counts() {
    let gate = gate_from_json(r#"{"limits":{"rate_per_sec":1}}"#);
    let o = OrderIntent::new("ETHUSDT", OrderSide::Buy);

    assert_eq!(gate.evaluate_at(&o, t0()).reason(), ReasonCode::Pass);
    assert_eq!(gate.evaluate_at(&o, t0()).reason(), ReasonCode::RateLimit);

    gate.replace_config(config(r#"{"limits":{"rate_per_sec":1}}"#));
    assert_eq!(gate.evaluate_at(&o, t0()).reason(), ReasonCode::Pass);
}

#[test]
fn test_every_decision_has_one_known_reason() {
    let gate = gate_from_json(r#"{"limits":{"rate_per_sec":3,"max_order_usdt":100}}"#);
    let orders = [
        "{}",
        r#"{"symbol":"A","side":"buy"}"#,
        r#"{"symbol":"A","side":"buy","notional":1000}"#,
        r#"{"symbol":"A","side":"sell","reduceOnly":true}"#,
        r#"{"symbol":"A","side":"sell","quote":"abc"}"#,
    ];

    for raw in orders {
        let d = gate.evaluate_at(&order(raw), t0());
        assert!(ReasonCode::ALL.contains(&d.reason()));
        assert_eq!(d.is_allow(), d.reason().is_allow());
    }
}

#[test]
fn test_allow_expiry_and_deny_instant() {
    let gate = gate_from_json("{}");
    let o = OrderIntent::new("ETHUSDT", OrderSide::Buy);

    match gate.evaluate_at(&o, t0()) {
        Decision::Allow { expires_at, .. } => {
            assert_eq!(expires_at, t0() + Duration::milliseconds(3000));
        }
        other => panic!("expected allow, got {other:?}"),
    }

    gate.set_safe_mode(true);
    match gate.evaluate_at(&o, t0()) {
        Decision::Deny { denied_at, detail, .. } => {
            assert_eq!(denied_at, t0());
            assert!(!detail.is_empty());
        }
        other => panic!("expected deny, got {other:?}"),
    }
}

#[test]
fn test_empty_order_still_gets_a_decision() {
    let gate = gate_from_json("{}");
    let d = gate.evaluate_at(&order("{}"), t0());
    assert!(d.is_allow());
    assert_eq!(gate.last_evaluated_at(), Some(t0()));

    let gate = gate_from_json(r#"{"empty_order_pass":true,"kill_switch":true}"#);
    let d = gate.evaluate_at(&order("{}"), t0());
    assert_eq!(d.reason(), ReasonCode::EmptyOrderPass);
}

#[test]
fn test_snapshot_after_update() {
    let gate = gate_from_json(SCENARIO_CONFIG);
    let snap = gate
        .apply(PolicyUpdate {
            global_halt: Some(true),
            symbol_halts: vec![
                SymbolHalt {
                    symbol: "solusdt".into(),
                    halted: true,
                },
                SymbolHalt {
                    symbol: "adausdt".into(),
                    halted: true,
                },
            ],
            ..PolicyUpdate::default()
        });

    assert!(snap.global_halt);
    assert!(!snap.safe_mode);
    assert_eq!(snap.halted_symbols, vec!["ADAUSDT", "SOLUSDT"]);
    assert_eq!(snap.limits.rate_per_sec, 2);
    assert_eq!(snap.limits.max_order_usdt, dec!(1000));
    assert_eq!(snap.ttl_ms, 3000);
    // Flags alone do not change the version.
    assert_eq!(snap.version, gate.snapshot().version);
    assert_eq!(snap.version.get(), 1);
}
