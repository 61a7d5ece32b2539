//! Integration test: properties that hold for every routing decision.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use chainroute_core::{is_fresh, NetworkStateSource, PaymentCurrency, SpeedClass, Urgency};
use chainroute_integration_tests::{snapshot_engine, state, Harness};
use chainroute_routing::{PreferencesUpdate, Priority, RouteRequest, SelectionReason};
use chrono::Utc;

// =========================================================================
// Selection
// =========================================================================

#[tokio::test]
async fn test_selection_is_fresh_or_fallback() {
    let (engine, _log) = snapshot_engine(vec![
        state("fallback", 0.02, SpeedClass::Medium, 1.0, 300),
        state("fresh-1", 0.01, SpeedClass::Fast, 0.95, 5),
        state("fresh-2", 0.004, SpeedClass::VeryFast, 0.9, 10),
        state("old", 0.0001, SpeedClass::VeryFast, 1.0, 61),
        state("flaky", 0.0001, SpeedClass::VeryFast, 0.8, 1),
    ]);
    let fresh: BTreeSet<&str> = ["fresh-1", "fresh-2"].into_iter().collect();

    for amount in [1.0, 50.0, 99.99, 100.0, 500.0, 1000.0, 1000.01, 25_000.0] {
        for urgency in [Urgency::Low, Urgency::Normal, Urgency::High] {
            let decision = engine
                .route(RouteRequest::new(amount, PaymentCurrency::Dai).urgency(urgency))
                .unwrap();
            assert!(!decision.fallback);
            assert!(fresh.contains(decision.selected_network.as_str()));
            for alternative in &decision.alternative_networks {
                assert!(fresh.contains(alternative.as_str()));
                assert_ne!(alternative, &decision.selected_network);
            }
            assert!(decision.estimated_savings_usd >= 0.0);
            assert!((0.0..=100.0).contains(&decision.estimated_savings_percent));
        }
    }
}

#[tokio::test]
async fn test_routing_is_deterministic_for_a_snapshot() {
    let (engine, _log) = snapshot_engine(vec![
        state("x", 0.01, SpeedClass::Fast, 1.0, 1),
        state("y", 0.01, SpeedClass::Fast, 1.0, 1),
        state("z", 0.01, SpeedClass::Fast, 1.0, 1),
    ]);

    let first = engine
        .route(RouteRequest::new(250.0, PaymentCurrency::Usdc))
        .unwrap();
    for _ in 0..20 {
        let again = engine
            .route(RouteRequest::new(250.0, PaymentCurrency::Usdc))
            .unwrap();
        assert_eq!(again.selected_network, first.selected_network);
        assert_eq!(again.alternative_networks, first.alternative_networks);
        assert_ne!(again.routing_id, first.routing_id);
    }
    // Equal scores tie-break on network key.
    assert_eq!(first.selected_network, "x");
    assert_eq!(first.alternative_networks, vec!["y", "z"]);
}

#[tokio::test]
async fn test_precedence_customer_then_merchant_then_score() {
    let harness = Harness::new();
    harness.set_fast_b();
    harness.poll_ok().await;

    let base = harness
        .engine
        .route(RouteRequest::new(500.0, PaymentCurrency::Usdc))
        .unwrap();
    assert_eq!(base.selected_network, "b");
    assert_eq!(base.selection_reason, SelectionReason::BestScore);

    harness
        .engine
        .set_preferences(
            "m",
            PreferencesUpdate {
                priority: Some(Priority::Cost),
                ..Default::default()
            },
        )
        .unwrap();
    let merchant = harness
        .engine
        .route(RouteRequest::new(500.0, PaymentCurrency::Usdc).merchant("m"))
        .unwrap();
    assert_eq!(merchant.selected_network, "a");
    assert_eq!(merchant.selection_reason, SelectionReason::MerchantPriorityCost);

    let customer = harness
        .engine
        .route(
            RouteRequest::new(500.0, PaymentCurrency::Usdc)
                .merchant("m")
                .customer_network("b"),
        )
        .unwrap();
    assert_eq!(customer.selected_network, "b");
    assert_eq!(customer.selection_reason, SelectionReason::CustomerOverride);
}

// =========================================================================
// Reliability
// =========================================================================

#[tokio::test]
async fn test_reliability_decays_to_floor_and_success_does_not_restore_it() {
    let harness = Harness::new();
    harness.set_cheap_a_slow_b();
    harness.poll_ok().await;

    harness.fees.fail("a", "timeout");
    let mut previous = harness.monitor.state("a").unwrap().reliability;
    for _ in 0..10 {
        harness.monitor.poll_network("a").await.unwrap_err();
        let current = harness.monitor.state("a").unwrap().reliability;
        assert!(current <= previous);
        assert!(current >= 0.5);
        previous = current;
    }
    assert_eq!(previous, 0.5);

    harness.fees.set_gas_price_gwei("a", 1.0);
    harness.monitor.poll_network("a").await.unwrap();
    let a = harness.monitor.state("a").unwrap();
    assert_eq!(a.reliability, 0.5);
    assert!(!is_fresh(&a, Utc::now()));

    // Only b is routable now.
    let decision = harness
        .engine
        .route(RouteRequest::new(50.0, PaymentCurrency::Usdc))
        .unwrap();
    assert_eq!(decision.selected_network, "b");
    assert!(decision.alternative_networks.is_empty());
}

#[tokio::test]
async fn test_operator_reset_makes_network_routable_again() {
    let harness = Harness::new();
    harness.set_cheap_a_slow_b();
    harness.poll_ok().await;
    harness.fees.fail("a", "timeout");
    for _ in 0..3 {
        harness.monitor.poll_network("a").await.unwrap_err();
    }
    harness.fees.set_gas_price_gwei("a", 1.0);
    harness.poll_ok().await;
    assert_ne!(
        harness
            .engine
            .route(RouteRequest::new(50.0, PaymentCurrency::Usdc))
            .unwrap()
            .selected_network,
        "a"
    );

    assert_eq!(harness.monitor.reset_reliability("a").unwrap(), 1.0);
    let decision = harness
        .engine
        .route(RouteRequest::new(50.0, PaymentCurrency::Usdc))
        .unwrap();
    assert_eq!(decision.selected_network, "a");
    assert!(harness.monitor.reset_reliability("nowhere").is_err());
}

// =========================================================================
// Decision log
// =========================================================================

#[tokio::test]
async fn test_decision_log_keeps_the_most_recent_thousand() {
    let harness = Harness::new();
    harness.set_cheap_a_slow_b();
    harness.poll_ok().await;

    for i in 1..=1200 {
        harness
            .engine
            .route(RouteRequest::new(i as f64, PaymentCurrency::Usdc))
            .unwrap();
    }

    let entries = harness.log.entries();
    assert_eq!(entries.len(), 1000);
    assert_eq!(entries.first().unwrap().payment_amount, 201.0);
    assert_eq!(entries.last().unwrap().payment_amount, 1200.0);
    assert!(entries
        .windows(2)
        .all(|w| w[0].payment_amount < w[1].payment_amount));
}

// =========================================================================
// Concurrency
// =========================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_routing_while_the_monitor_polls() {
    let harness = Arc::new(Harness::with_log_capacity(10_000));
    harness.set_cheap_a_slow_b();
    harness.monitor.start();

    let mut tasks = Vec::new();
    for worker in 0..4 {
        let harness = harness.clone();
        tasks.push(tokio::spawn(async move {
            for i in 0..100 {
                let decision = harness
                    .engine
                    .route(
                        RouteRequest::new(10.0 + i as f64, PaymentCurrency::Usdc)
                            .merchant(format!("merchant-{worker}")),
                    )
                    .unwrap();
                assert!(decision.selected_network == "a" || decision.selected_network == "b");
                if i % 10 == 0 {
                    tokio::task::yield_now().await;
                }
            }
        }));
    }

    // Flip prices under the running monitor.
    for round in 0..5 {
        if round % 2 == 0 {
            harness.set_fast_b();
        } else {
            harness.set_cheap_a_slow_b();
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }

    for task in tasks {
        task.await.unwrap();
    }
    assert!(harness.monitor.shutdown(Duration::from_secs(1)).await);
    assert_eq!(harness.log.len(), 400);

    // Every record is internally consistent: speed class matches its price.
    for record in harness.monitor.snapshot().values() {
        let expected = harness
            .monitor
            .speed_class_for(&record.key, record.gas_price_gwei)
            .unwrap();
        assert_eq!(record.speed_class, expected);
    }
}
