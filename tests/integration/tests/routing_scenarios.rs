//! Integration test: end-to-end routing over a live monitor.
//!
//! Gas prices flow from the fee client through the monitor into the routing
//! engine, and every decision lands in the decision log.

use chainroute_core::{PaymentCurrency, SpeedClass, Urgency};
use chainroute_integration_tests::{snapshot_engine, state, Harness};
use chainroute_routing::{
    PreferencesUpdate, Priority, RouteRequest, SelectionReason, SimulationScenario, TimeRange,
};

const TOLERANCE: f64 = 1e-6;

// =========================================================================
// Cheapest-and-fastest network wins
// =========================================================================

#[tokio::test]
async fn test_cheap_fast_network_beats_slow_expensive_one() {
    let harness = Harness::new();
    harness.set_cheap_a_slow_b();
    harness.poll_ok().await;

    let a = harness.monitor.state("a").unwrap();
    let b = harness.monitor.state("b").unwrap();
    assert!((a.estimated_cost_usd - 0.001).abs() < TOLERANCE);
    assert!((b.estimated_cost_usd - 0.5).abs() < TOLERANCE);
    assert_eq!(a.speed_class, SpeedClass::VeryFast);
    assert_eq!(b.speed_class, SpeedClass::Slow);

    let decision = harness
        .engine
        .route(RouteRequest::new(50.0, PaymentCurrency::Usdc))
        .unwrap();

    assert_eq!(decision.selected_network, "a");
    assert_eq!(decision.selection_reason, SelectionReason::BestScore);
    assert!(!decision.fallback);
    assert_eq!(decision.alternative_networks, vec!["b".to_string()]);
    assert!((decision.estimated_cost_usd - 0.001).abs() < TOLERANCE);
    assert!((decision.estimated_savings_usd - 0.499).abs() < TOLERANCE);
    assert!((decision.estimated_savings_percent - 99.8).abs() < 1e-3);
    assert!(decision.recommendation.starts_with("Small payment"));
}

#[tokio::test]
async fn test_new_gas_prices_flip_the_choice() {
    let harness = Harness::new();
    harness.set_cheap_a_slow_b();
    harness.poll_ok().await;
    let before = harness
        .engine
        .route(RouteRequest::new(500.0, PaymentCurrency::Usdt))
        .unwrap();
    assert_eq!(before.selected_network, "a");

    // a: $0.01 fast scores 80; b: $0.02 very fast scores 82.
    harness.set_fast_b();
    harness.poll_ok().await;
    assert_eq!(harness.monitor.state("a").unwrap().speed_class, SpeedClass::Fast);
    assert_eq!(harness.monitor.state("b").unwrap().speed_class, SpeedClass::VeryFast);

    let after = harness
        .engine
        .route(RouteRequest::new(500.0, PaymentCurrency::Usdt))
        .unwrap();
    assert_eq!(after.selected_network, "b");
    assert_eq!(after.alternative_networks, vec!["a".to_string()]);
    // The pick is dearer than its only alternative: no negative savings.
    assert_eq!(after.estimated_savings_usd, 0.0);
    assert_eq!(after.estimated_savings_percent, 0.0);
}

// =========================================================================
// Fallback
// =========================================================================

#[tokio::test]
async fn test_routes_to_fallback_before_any_poll() {
    let harness = Harness::new();
    let decision = harness
        .engine
        .route(RouteRequest::new(10.0, PaymentCurrency::Eth))
        .unwrap();

    assert!(decision.fallback);
    assert_eq!(decision.selected_network, "a");
    assert_eq!(decision.selection_reason, SelectionReason::Fallback);
    assert!(decision.alternative_networks.is_empty());
    assert_eq!(decision.estimated_cost_usd, 0.0);
    assert_eq!(decision.estimated_savings_usd, 0.0);
    assert_eq!(harness.log.len(), 1);
}

#[tokio::test]
async fn test_routes_to_fallback_when_every_poll_fails() {
    let harness = Harness::new();
    harness.fees.fail("a", "connection refused");
    harness.fees.fail("b", "connection refused");

    let summary = harness.monitor.poll_all().await;
    assert_eq!(summary.failed.len(), 2);

    let decision = harness
        .engine
        .route(RouteRequest::new(10.0, PaymentCurrency::Usdc))
        .unwrap();
    assert!(decision.fallback);
    assert_eq!(decision.selected_network, "a");
}

#[tokio::test]
async fn test_fallback_when_all_data_is_stale() {
    let (engine, _log) = snapshot_engine(vec![
        state("a", 0.001, SpeedClass::VeryFast, 1.0, 120),
        state("b", 0.5, SpeedClass::Slow, 1.0, 120),
    ]);

    let decision = engine
        .route(RouteRequest::new(10.0, PaymentCurrency::Usdc))
        .unwrap();
    assert!(decision.fallback);
    assert_eq!(decision.selected_network, "a");
    // Last known cost is carried on a fallback decision.
    assert!((decision.estimated_cost_usd - 0.001).abs() < TOLERANCE);
}

#[tokio::test]
async fn test_hanging_network_times_out_and_is_skipped() {
    let harness = Harness::new();
    harness.set_cheap_a_slow_b();
    harness.fees.hang("a");

    let summary = harness.monitor.poll_all().await;
    assert_eq!(summary.failed, vec!["a".to_string()]);
    assert_eq!(summary.succeeded, vec!["b".to_string()]);

    let decision = harness
        .engine
        .route(RouteRequest::new(10.0, PaymentCurrency::Usdc))
        .unwrap();
    assert_eq!(decision.selected_network, "b");
    assert!(!decision.fallback);
}

// =========================================================================
// Preferences
// =========================================================================

#[tokio::test]
async fn test_customer_choice_beats_merchant_preference() {
    let harness = Harness::new();
    harness.set_cheap_a_slow_b();
    harness.poll_ok().await;

    // Two failed polls leave b recent but at reliability 0.8.
    harness.fees.fail("b", "rpc unavailable");
    harness.monitor.poll_network("b").await.unwrap_err();
    harness.monitor.poll_network("b").await.unwrap_err();
    let b = harness.monitor.state("b").unwrap();
    assert!((b.reliability - 0.8).abs() < 1e-9);

    harness
        .engine
        .set_preferences(
            "merchant-1",
            PreferencesUpdate {
                preferred_networks: Some(vec!["a".into()]),
                ..Default::default()
            },
        )
        .unwrap();

    let merchant_only = harness
        .engine
        .route(RouteRequest::new(50.0, PaymentCurrency::Usdc).merchant("merchant-1"))
        .unwrap();
    assert_eq!(merchant_only.selected_network, "a");
    assert_eq!(
        merchant_only.selection_reason,
        SelectionReason::MerchantPreferredNetwork
    );

    let decision = harness
        .engine
        .route(
            RouteRequest::new(50.0, PaymentCurrency::Usdc)
                .merchant("merchant-1")
                .customer_network("b"),
        )
        .unwrap();
    assert_eq!(decision.selected_network, "b");
    assert_eq!(decision.selection_reason, SelectionReason::CustomerOverride);
    let applied = decision.applied_preferences;
    assert_eq!(applied.merchant.unwrap().preferred_networks, vec!["a"]);
    assert_eq!(applied.customer.unwrap().network.as_deref(), Some("b"));
}

#[tokio::test]
async fn test_customer_choice_ignored_once_reliability_drops() {
    let harness = Harness::new();
    harness.set_cheap_a_slow_b();
    harness.poll_ok().await;

    // Three failed polls put b at exactly 0.7, which is not above the bar.
    harness.fees.fail("b", "rpc unavailable");
    for _ in 0..3 {
        harness.monitor.poll_network("b").await.unwrap_err();
    }
    assert_eq!(harness.monitor.state("b").unwrap().reliability, 0.7);

    let decision = harness
        .engine
        .route(RouteRequest::new(50.0, PaymentCurrency::Usdc).customer_network("b"))
        .unwrap();
    assert_eq!(decision.selected_network, "a");
    assert_eq!(decision.selection_reason, SelectionReason::BestScore);
}

#[tokio::test]
async fn test_merchant_speed_priority() {
    let harness = Harness::new();
    harness.set_cheap_a_slow_b();
    harness.poll_ok().await;
    harness
        .engine
        .set_preferences(
            "merchant-2",
            PreferencesUpdate {
                priority: Some(Priority::Speed),
                ..Default::default()
            },
        )
        .unwrap();

    let decision = harness
        .engine
        .route(RouteRequest::new(50.0, PaymentCurrency::Usdc).merchant("merchant-2"))
        .unwrap();
    assert_eq!(decision.selected_network, "a");
    assert_eq!(decision.selection_reason, SelectionReason::MerchantPrioritySpeed);
}

#[tokio::test]
async fn test_merchant_gas_ceiling_blocks_priority_pick() {
    let harness = Harness::new();
    harness.set_fast_b();
    harness.poll_ok().await;
    harness
        .engine
        .set_preferences(
            "merchant-3",
            PreferencesUpdate {
                priority: Some(Priority::Cost),
                max_gas_price_gwei: Some(5.0),
                ..Default::default()
            },
        )
        .unwrap();

    // a is cheaper in USD but its 10 gwei breaks the ceiling; b qualifies.
    let decision = harness
        .engine
        .route(RouteRequest::new(500.0, PaymentCurrency::Usdc).merchant("merchant-3"))
        .unwrap();
    assert_eq!(decision.selected_network, "b");
    assert_eq!(decision.selection_reason, SelectionReason::MerchantPriorityCost);
}

// =========================================================================
// Simulation, recommendations and analytics
// =========================================================================

#[tokio::test]
async fn test_simulation_and_recommendations_do_not_log() {
    let harness = Harness::new();
    harness.set_cheap_a_slow_b();
    harness.poll_ok().await;

    let results = harness
        .engine
        .simulate(&[
            SimulationScenario {
                amount: 10.0,
                urgency: Urgency::Low,
            },
            SimulationScenario {
                amount: 5000.0,
                urgency: Urgency::High,
            },
        ])
        .unwrap();
    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| r.optimal_network == "a"));
    assert_eq!(results[0].estimated_confirmation_time, "< 30 seconds");

    let report = harness.engine.recommendations(2000.0, Urgency::Normal).unwrap();
    assert_eq!(report.optimal_network, "a");
    assert_eq!(report.alternatives.len(), 1);
    assert_eq!(report.alternatives[0].network, "b");
    assert!(report.recommendation.starts_with("Large payment"));

    assert!(harness.log.is_empty());
}

#[tokio::test]
async fn test_analytics_flags_frequent_fallbacks() {
    let harness = Harness::new();
    for _ in 0..4 {
        harness
            .engine
            .route(RouteRequest::new(20.0, PaymentCurrency::Usdc).merchant("shop"))
            .unwrap();
    }
    harness.set_cheap_a_slow_b();
    harness.poll_ok().await;
    for _ in 0..6 {
        harness
            .engine
            .route(RouteRequest::new(20.0, PaymentCurrency::Usdc).merchant("shop"))
            .unwrap();
    }
    harness
        .engine
        .route(RouteRequest::new(20.0, PaymentCurrency::Usdc).merchant("elsewhere"))
        .unwrap();

    let summary = harness.engine.analytics("shop", TimeRange::Week);
    assert_eq!(summary.total_payments, 10);
    assert_eq!(summary.fallback_count, 4);
    assert_eq!(summary.network_usage.get("a"), Some(&10));
    assert!((summary.total_savings_usd - 6.0 * 0.499).abs() < 1e-4);
    assert!(summary
        .recommendations
        .iter()
        .any(|r| r.contains("network monitor health")));

    let empty = harness.engine.analytics("nobody", TimeRange::Day);
    assert_eq!(empty.total_payments, 0);
    assert_eq!(empty.recommendations.len(), 1);
}
