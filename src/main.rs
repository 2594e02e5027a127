//! Prediction Market Core Simulation.
//!
//! Demonstrates the full market lifecycle: cold-start quoting, demand-driven
//! price movement, slippage protection, balance enforcement, settlement, and
//! concurrent purchases through the gateway.

use polyparty_core::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::thread;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    println!("Prediction Market Core Engine Simulation");
    println!("Per-Unit Incremental Pricing, Atomic Trades, Par Settlement\n");

    scenario_1_cold_start_quotes();
    scenario_2_demand_moves_prices();
    scenario_3_slippage_and_balance_protection();
    scenario_4_settlement();
    scenario_5_concurrent_buyers();

    println!("\nAll simulations completed successfully.");
}

fn market_draft(title: &str) -> EventDraft {
    // a one-hour trading window around the wall clock
    let now = Timestamp::now();
    EventDraft {
        title: title.to_string(),
        start_time: Timestamp::from_millis(now.as_millis() - 60_000),
        end_time: Timestamp::from_millis(now.as_millis() + 3_600_000),
        kind: EventKind::OverUnder,
        value: 50,
        outcomes: vec![
            OutcomeDraft {
                description: "Over 45.5".to_string(),
                value: 1,
            },
            OutcomeDraft {
                description: "Under 45.5".to_string(),
                value: 0,
            },
        ],
    }
}

fn outcome_ids(engine: &Engine, event_id: &EventId) -> (OutcomeId, OutcomeId) {
    let event = engine.get_event(event_id).expect("event exists");
    (
        event.outcome_by_value(1).expect("over outcome").id.clone(),
        event.outcome_by_value(0).expect("under outcome").id.clone(),
    )
}

/// Cold-start pricing: the uniform prior and the clamp.
fn scenario_1_cold_start_quotes() {
    println!("Scenario 1: Cold-Start Quotes\n");

    let mut engine = Engine::new(EngineConfig::default());
    engine.set_time(Timestamp::now());
    let event_id = engine.create_event(market_draft("Super Bowl total")).unwrap();
    let (over, _) = outcome_ids(&engine, &event_id);

    let quote = engine.quote(&event_id, &over, 3).unwrap();
    println!("  First 3 units of 'Over 45.5' on an untraded market:");
    for (i, price) in quote.prices.iter().enumerate() {
        println!("    unit {}: {}", i + 1, price);
    }
    println!("  Total cost: {}\n", quote.total_cost);
}

/// Demand on one side cheapens the other.
fn scenario_2_demand_moves_prices() {
    println!("Scenario 2: Demand Moves Prices\n");

    let mut engine = Engine::new(EngineConfig::default());
    engine.set_time(Timestamp::now());
    let event_id = engine.create_event(market_draft("Game total")).unwrap();
    let (over, under) = outcome_ids(&engine, &event_id);

    let alice = engine.create_funded_account();
    let bob = engine.create_funded_account();

    let bought = engine
        .buy(&event_id, &over, 5, Price::ceiling(), &alice)
        .unwrap();
    println!(
        "  Alice buys 5 'Over' units for {} total",
        bought.total_cost
    );

    let under_quote = engine.quote(&event_id, &under, 1).unwrap();
    println!(
        "  'Under' now quotes at {} (all demand is on the other side)",
        under_quote.prices[0]
    );

    let bought = engine
        .buy(&event_id, &under, 2, Price::ceiling(), &bob)
        .unwrap();
    println!("  Bob picks up 2 'Under' units for {}", bought.total_cost);

    let event = engine.get_event(&event_id).unwrap();
    for outcome in &event.outcomes {
        println!(
            "    display price {} = {}",
            outcome.description, outcome.cost
        );
    }
    println!();
}

/// Both rejection paths leave no partial state behind.
fn scenario_3_slippage_and_balance_protection() {
    println!("Scenario 3: Slippage and Balance Protection\n");

    let mut engine = Engine::new(EngineConfig::default());
    engine.set_time(Timestamp::now());
    let event_id = engine.create_event(market_draft("Protected market")).unwrap();
    let (over, _) = outcome_ids(&engine, &event_id);
    let alice = engine.create_funded_account();

    match engine.buy(&event_id, &over, 3, Price::clamped(dec!(0.50)), &alice) {
        Err(err) => println!("  Tight ceiling rejected as expected: {err}"),
        Ok(_) => println!("  unexpected fill"),
    }

    let broke = engine.create_account();
    match engine.buy(&event_id, &over, 3, Price::ceiling(), &broke) {
        Err(err) => println!("  Unfunded account rejected as expected: {err}"),
        Ok(_) => println!("  unexpected fill"),
    }

    let balance = engine.get_account(&alice).unwrap().balance;
    println!(
        "  Alice's balance untouched: {} | committed units: {}\n",
        balance,
        engine.ledger().event_units(&event_id)
    );
}

/// Close the market, pay winners at par, refuse a second close.
fn scenario_4_settlement() {
    println!("Scenario 4: Settlement\n");

    let mut engine = Engine::new(EngineConfig::default());
    engine.set_time(Timestamp::now());
    let event_id = engine.create_event(market_draft("Settled market")).unwrap();
    let (over, under) = outcome_ids(&engine, &event_id);

    let alice = engine.create_funded_account();
    let bob = engine.create_funded_account();
    engine
        .buy(&event_id, &over, 3, Price::ceiling(), &alice)
        .unwrap();
    engine
        .buy(&event_id, &under, 4, Price::ceiling(), &bob)
        .unwrap();

    let report = engine.close(&event_id, 1, true).unwrap();
    println!(
        "  '{}' wins: {} units paid, {} total",
        report.winning_description, report.shares_paid, report.total_paid
    );
    println!(
        "  Alice: {} | Bob: {}",
        engine.get_account(&alice).unwrap().balance,
        engine.get_account(&bob).unwrap().balance
    );

    match engine.close(&event_id, 1, true) {
        Err(err) => println!("  Re-close rejected as expected: {err}\n"),
        Ok(_) => println!("  unexpected second settlement\n"),
    }
}

/// Hammer one market from several threads; value must be conserved.
fn scenario_5_concurrent_buyers() {
    println!("Scenario 5: Concurrent Buyers\n");

    let mut engine = Engine::new(EngineConfig::default());
    engine.set_time(Timestamp::now());
    let gateway = MarketGateway::new(engine);
    let event_id = gateway.create_event(market_draft("Busy market")).unwrap();
    let (over, under) = gateway.with_engine(|e| outcome_ids(e, &event_id));

    let buyers: Vec<AccountId> = (0..6).map(|_| gateway.create_funded_account()).collect();

    thread::scope(|scope| {
        for (i, account) in buyers.iter().enumerate() {
            let outcome = if i % 2 == 0 { over.clone() } else { under.clone() };
            let gateway = &gateway;
            let event_id = &event_id;
            scope.spawn(move || {
                for _ in 0..10 {
                    let _ = gateway.buy(event_id, &outcome, 1, Price::ceiling(), account);
                }
            });
        }
    });

    gateway.with_engine(|engine| {
        let units = engine.ledger().event_units(&event_id);
        let paid: Decimal = engine
            .ledger()
            .shares()
            .iter()
            .map(|s| s.price_paid.value())
            .sum();
        let spent: Decimal = buyers
            .iter()
            .map(|b| dec!(100) - engine.get_account(b).unwrap().balance.value())
            .sum();

        println!("  {units} units committed, {paid} collected, {spent} debited");
        assert_eq!(paid, spent);
        println!("  Paid-in value matches debits exactly\n");
    });
}
