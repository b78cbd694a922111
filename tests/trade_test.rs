use std::sync::Arc;

use common::{STARTING_CASH, TestApp, setup_file_db};
use finance_sim::{error::CustomError, trade::model::TradeRequest};
use rust_decimal_macros::dec;
mod common;

fn order(symbol: &str, shares: i64) -> TradeRequest {
    TradeRequest {
        symbol: symbol.to_string(),
        shares: Some(shares),
    }
}

#[tokio::test]
async fn buy_then_sell_scenario() {
    let app = TestApp::new().await;
    let (user, _) = app.signed_in("trader").await;
    let svc = app.trade_service();

    app.quotes.set("AAPL", dec!(50.00));
    let receipt = svc.buy(&user, &order("AAPL", 10)).await.unwrap();
    assert_eq!(receipt.total, dec!(500.00));
    assert_eq!(receipt.cash, dec!(9500.00));
    assert_eq!(app.cash(user.user_id).await, 950_000);
    assert_eq!(
        app.ledger_rows(user.user_id).await,
        vec![("AAPL".to_string(), 10, 5000)]
    );

    app.quotes.set("AAPL", dec!(60.00));
    let receipt = svc.sell(&user, &order("AAPL", 4)).await.unwrap();
    assert_eq!(receipt.shares, 4);
    assert_eq!(receipt.cash, dec!(9740.00));
    assert_eq!(app.cash(user.user_id).await, 974_000);
    assert_eq!(
        app.ledger_rows(user.user_id).await,
        vec![
            ("AAPL".to_string(), 10, 5000),
            ("AAPL".to_string(), -4, 6000),
        ]
    );

    let err = svc.sell(&user, &order("AAPL", 20)).await.unwrap_err();
    assert!(matches!(err, CustomError::InsufficientShares));
    assert_eq!(app.cash(user.user_id).await, 974_000);
    assert_eq!(app.ledger_rows(user.user_id).await.len(), 2);

    let portfolio = svc.portfolio(&user).await.unwrap();
    assert_eq!(portfolio.positions.len(), 1);
    assert_eq!(portfolio.positions[0].shares, 6);
}

#[tokio::test]
async fn buy_rejects_when_cost_exceeds_cash() {
    let app = TestApp::new().await;
    let (user, _) = app.signed_in("trader").await;
    let svc = app.trade_service();
    app.quotes.set("BRK", dec!(5000.01));

    let err = svc.buy(&user, &order("BRK", 2)).await.unwrap_err();

    assert!(matches!(err, CustomError::InsufficientFunds));
    assert_eq!(app.cash(user.user_id).await, STARTING_CASH);
    assert!(app.ledger_rows(user.user_id).await.is_empty());
}

#[tokio::test]
async fn buy_may_spend_entire_balance() {
    let app = TestApp::new().await;
    let (user, _) = app.signed_in("trader").await;
    let svc = app.trade_service();
    app.quotes.set("BRK", dec!(5000.00));

    svc.buy(&user, &order("BRK", 2)).await.unwrap();

    assert_eq!(app.cash(user.user_id).await, 0);
    let err = svc.buy(&user, &order("BRK", 1)).await.unwrap_err();
    assert!(matches!(err, CustomError::InsufficientFunds));
    assert_eq!(app.cash(user.user_id).await, 0);
}

#[tokio::test]
async fn buy_validates_input_before_quoting() {
    let app = TestApp::new().await;
    let (user, _) = app.signed_in("trader").await;
    let svc = app.trade_service();
    app.quotes.set("AAPL", dec!(50.00));

    let missing_symbol = svc.buy(&user, &order("  ", 1)).await.unwrap_err();
    let zero = svc.buy(&user, &order("AAPL", 0)).await.unwrap_err();
    let negative = svc.buy(&user, &order("AAPL", -3)).await.unwrap_err();
    let missing_shares = svc
        .buy(
            &user,
            &TradeRequest {
                symbol: "AAPL".to_string(),
                shares: None,
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(missing_symbol, CustomError::MissingField("symbol")));
    assert!(matches!(zero, CustomError::InvalidShares));
    assert!(matches!(negative, CustomError::InvalidShares));
    assert!(matches!(missing_shares, CustomError::MissingField("shares")));
    assert_eq!(app.quotes.lookups(), 0);
    assert_eq!(app.cash(user.user_id).await, STARTING_CASH);
}

#[tokio::test]
async fn unknown_symbol_is_invalid() {
    let app = TestApp::new().await;
    let (user, _) = app.signed_in("trader").await;
    let svc = app.trade_service();

    let err = svc.buy(&user, &order("NOPE", 1)).await.unwrap_err();

    assert!(matches!(err, CustomError::InvalidSymbol));
    assert!(app.ledger_rows(user.user_id).await.is_empty());
}

#[tokio::test]
async fn symbols_are_case_insensitive() {
    let app = TestApp::new().await;
    let (user, _) = app.signed_in("trader").await;
    let svc = app.trade_service();
    app.quotes.set("MSFT", dec!(10.00));

    svc.buy(&user, &order("msft", 3)).await.unwrap();
    svc.sell(&user, &order(" MSFT ", 3)).await.unwrap();

    assert_eq!(app.cash(user.user_id).await, STARTING_CASH);
    assert!(svc.portfolio(&user).await.unwrap().positions.is_empty());
}

#[tokio::test]
async fn sell_without_holding_fails_before_quoting() {
    let app = TestApp::new().await;
    let (user, _) = app.signed_in("trader").await;
    let svc = app.trade_service();
    app.quotes.set("AAPL", dec!(50.00));

    let err = svc.sell(&user, &order("AAPL", 1)).await.unwrap_err();

    assert!(matches!(err, CustomError::NoSharesOwned));
    assert_eq!(app.quotes.lookups(), 0);
    assert_eq!(app.cash(user.user_id).await, STARTING_CASH);
}

#[tokio::test]
async fn holdings_are_per_user() {
    let app = TestApp::new().await;
    let (alice, _) = app.signed_in("alice").await;
    let (bob, _) = app.signed_in("bob").await;
    let svc = app.trade_service();
    app.quotes.set("AAPL", dec!(50.00));

    svc.buy(&alice, &order("AAPL", 5)).await.unwrap();

    let err = svc.sell(&bob, &order("AAPL", 1)).await.unwrap_err();
    assert!(matches!(err, CustomError::NoSharesOwned));
    assert_eq!(app.cash(bob.user_id).await, STARTING_CASH);
}

#[tokio::test]
async fn portfolio_values_positions_at_current_prices() {
    let app = TestApp::new().await;
    let (user, _) = app.signed_in("trader").await;
    let svc = app.trade_service();
    app.quotes.set("AAPL", dec!(50.00));
    app.quotes.set("MSFT", dec!(100.00));
    svc.buy(&user, &order("AAPL", 10)).await.unwrap();
    svc.buy(&user, &order("MSFT", 2)).await.unwrap();

    app.quotes.set("AAPL", dec!(55.50));
    let portfolio = svc.portfolio(&user).await.unwrap();

    assert_eq!(portfolio.cash, dec!(9300.00));
    let symbols: Vec<_> = portfolio.positions.iter().map(|p| p.symbol.as_str()).collect();
    assert_eq!(symbols, ["AAPL", "MSFT"]);
    assert_eq!(portfolio.positions[0].price, dec!(55.50));
    assert_eq!(portfolio.positions[0].value, dec!(555.00));
    assert_eq!(portfolio.positions[1].value, dec!(200.00));
    assert_eq!(portfolio.total, dec!(10055.00));
}

#[tokio::test]
async fn portfolio_fails_when_a_quote_is_unavailable() {
    let app = TestApp::new().await;
    let (user, _) = app.signed_in("trader").await;
    let svc = app.trade_service();
    app.quotes.set("AAPL", dec!(50.00));
    svc.buy(&user, &order("AAPL", 1)).await.unwrap();

    // Same database, but a provider that knows no symbols.
    let unpriced = TestApp::with_pool(app.pool.clone());
    let err = unpriced.trade_service().portfolio(&user).await.unwrap_err();

    assert!(matches!(err, CustomError::QuoteUnavailable(symbol) if symbol == "AAPL"));
}

#[tokio::test]
async fn sub_cent_quote_is_unusable_everywhere() {
    let app = TestApp::new().await;
    let (user, _) = app.signed_in("trader").await;
    let svc = app.trade_service();
    app.quotes.set("PENNY", dec!(1.00));
    svc.buy(&user, &order("PENNY", 3)).await.unwrap();

    app.quotes.set("PENNY", dec!(0.004));

    let err = svc.buy(&user, &order("PENNY", 1)).await.unwrap_err();
    assert!(matches!(err, CustomError::InvalidSymbol));
    let err = svc.portfolio(&user).await.unwrap_err();
    assert!(matches!(err, CustomError::QuoteUnavailable(symbol) if symbol == "PENNY"));
}

#[tokio::test]
async fn history_lists_signed_rows_in_order() {
    let app = TestApp::new().await;
    let (user, _) = app.signed_in("trader").await;
    let svc = app.trade_service();
    app.quotes.set("AAPL", dec!(50.00));
    svc.buy(&user, &order("AAPL", 10)).await.unwrap();
    app.quotes.set("AAPL", dec!(60.00));
    svc.sell(&user, &order("AAPL", 4)).await.unwrap();

    let history = svc.history(&user).await.unwrap();

    assert_eq!(history.len(), 2);
    assert_eq!((history[0].shares, history[0].price), (10, dec!(50.00)));
    assert_eq!((history[1].shares, history[1].price), (-4, dec!(60.00)));
    assert!(history.iter().all(|row| row.symbol == "AAPL"));
}

#[tokio::test]
async fn quote_returns_provider_price() {
    let app = TestApp::new().await;
    let svc = app.trade_service();
    app.quotes.set("AAPL", dec!(187.44));

    let quote = svc.quote("aapl").await.unwrap();

    assert_eq!(quote.symbol, "AAPL");
    assert_eq!(quote.price, dec!(187.44));
    assert!(matches!(
        svc.quote("ZZZZ").await,
        Err(CustomError::QuoteUnavailable(_))
    ));
    assert!(matches!(
        svc.quote("").await,
        Err(CustomError::MissingField("symbol"))
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_buys_never_overspend() {
    let app = Arc::new(TestApp::with_pool(setup_file_db().await));
    let (user, _) = app.signed_in("racer").await;
    // Each order costs 3000.00 of the 10000.00 balance.
    app.quotes.set("AAPL", dec!(300.00));

    let mut tasks = Vec::new();
    for _ in 0..6 {
        let app = Arc::clone(&app);
        let user = user.clone();
        tasks.push(tokio::spawn(async move {
            app.trade_service().buy(&user, &order("AAPL", 10)).await
        }));
    }
    let mut filled = 0;
    for task in tasks {
        if task.await.unwrap().is_ok() {
            filled += 1;
        }
    }

    assert!(filled <= 3);
    let cash = app.cash(user.user_id).await;
    assert!(cash >= 0);
    assert_eq!(cash, STARTING_CASH - filled * 300_000);
    assert_eq!(app.ledger_rows(user.user_id).await.len() as i64, filled);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_sells_never_oversell() {
    let app = Arc::new(TestApp::with_pool(setup_file_db().await));
    let (user, _) = app.signed_in("racer").await;
    app.quotes.set("AAPL", dec!(10.00));
    app.trade_service()
        .buy(&user, &order("AAPL", 5))
        .await
        .unwrap();

    let mut tasks = Vec::new();
    for _ in 0..4 {
        let app = Arc::clone(&app);
        let user = user.clone();
        tasks.push(tokio::spawn(async move {
            app.trade_service().sell(&user, &order("AAPL", 2)).await
        }));
    }
    let mut filled = 0;
    for task in tasks {
        if task.await.unwrap().is_ok() {
            filled += 1;
        }
    }

    assert!(filled <= 2);
    let rows = app.ledger_rows(user.user_id).await;
    let held: i64 = rows.iter().map(|(_, shares, _)| shares).sum();
    assert_eq!(held, 5 - 2 * filled);
    assert!(held >= 0);
    assert_eq!(
        app.cash(user.user_id).await,
        STARTING_CASH - 5_000 + filled * 2_000
    );
}
