use std::sync::{Arc, Mutex};

use battleship_agent::encryption::{SealMode, SealedFleet, SealedPosition};
use battleship_agent::ledger::{
    padded_fees, GameId, GameStatus, InMemoryClient, InMemoryLedger, LedgerCall, LedgerClient,
    PlayerId, ReceiptEvent, TxFees,
};
use battleship_agent::FeePolicy;

fn clear(positions: &[u8]) -> SealedFleet {
    SealedFleet {
        positions: positions.iter().map(|&p| SealedPosition::Clear(p)).collect(),
        mode: SealMode::Cleartext,
    }
}

async fn place(client: &InMemoryClient, game: GameId, positions: &[u8]) -> anyhow::Result<()> {
    let fleet = clear(positions);
    let call = LedgerCall::PlaceFleet {
        positions: fleet.positions.len(),
    };
    let fees = padded_fees(client, game, call, &FeePolicy::default()).await?;
    client.place_fleet(game, &fleet, fees).await
}

async fn fire(client: &InMemoryClient, game: GameId, position: u8) -> anyhow::Result<bool> {
    let fees = padded_fees(
        client,
        game,
        LedgerCall::FireShot { position },
        &FeePolicy::default(),
    )
    .await?;
    let receipt = client.fire_shot(game, position, fees).await?;
    Ok(receipt.events.iter().any(|e| match e {
        ReceiptEvent::ShotFired(s) => s.hit,
        _ => false,
    }))
}

/// Game with alice (player 1) fleet at 0..5 and bob fleet at 11..16.
async fn ready_game(
    ledger: &Arc<InMemoryLedger>,
) -> anyhow::Result<(GameId, InMemoryClient, InMemoryClient)> {
    let alice = ledger.connect(PlayerId::new("alice"));
    let bob = ledger.connect(PlayerId::new("bob"));
    let game = alice.create_game("gpt-4-turbo").await?;
    bob.join_game(game).await?;
    place(&alice, game, &[0, 1, 2, 3, 4]).await?;
    place(&bob, game, &[11, 12, 13, 14, 15]).await?;
    Ok((game, alice, bob))
}

#[tokio::test]
async fn lifecycle_and_turn_order() -> anyhow::Result<()> {
    let ledger = Arc::new(InMemoryLedger::new());
    let (game, alice, bob) = ready_game(&ledger).await?;

    let record = alice.game(game).await?;
    assert!(record.is_my_turn(alice.account()));
    assert_eq!(record.model, "gpt-4-turbo");

    assert!(fire(&bob, game, 0).await.is_err(), "bob must wait");
    assert!(!fire(&alice, game, 0).await?);
    assert!(fire(&alice, game, 1).await.is_err(), "turn passed to bob");
    assert!(fire(&bob, game, 4).await?);

    assert_eq!(alice.cell_status(game, bob.account()).await?[0], 1);
    assert_eq!(alice.cell_status(game, alice.account()).await?[4], 2);
    Ok(())
}

#[tokio::test]
async fn repeated_and_off_board_shots_are_rejected() -> anyhow::Result<()> {
    let ledger = Arc::new(InMemoryLedger::new());
    let (game, alice, bob) = ready_game(&ledger).await?;
    fire(&alice, game, 5).await?;
    fire(&bob, game, 5).await?;
    assert!(fire(&alice, game, 5).await.is_err());
    assert!(fire(&alice, game, 16).await.is_err());
    Ok(())
}

#[tokio::test]
async fn under_padded_limit_is_rejected() -> anyhow::Result<()> {
    let ledger = Arc::new(InMemoryLedger::new());
    let (game, alice, _bob) = ready_game(&ledger).await?;
    let estimate = alice
        .estimate(game, LedgerCall::FireShot { position: 6 })
        .await?;
    let short = TxFees {
        limit: estimate.units - 1,
        price: estimate.unit_price,
    };
    assert!(alice.fire_shot(game, 6, short).await.is_err());
    assert_eq!(ledger.calls().shot_attempts, 0);
    Ok(())
}

#[tokio::test]
async fn sinking_every_segment_ends_the_game() -> anyhow::Result<()> {
    let ledger = Arc::new(InMemoryLedger::new());
    let ended = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&ended);
    ledger
        .events()
        .game_ended
        .subscribe(move |e| sink.lock().unwrap().push(e.clone()));
    let (game, alice, bob) = ready_game(&ledger).await?;

    for (a, b) in [(11, 6), (12, 7), (13, 8), (14, 9)] {
        fire(&alice, game, a).await?;
        fire(&bob, game, b).await?;
    }
    let fees = padded_fees(
        &alice,
        game,
        LedgerCall::FireShot { position: 15 },
        &FeePolicy::default(),
    )
    .await?;
    let receipt = alice.fire_shot(game, 15, fees).await?;
    assert!(receipt
        .events
        .iter()
        .any(|e| matches!(e, ReceiptEvent::GameEnded(g) if g.winner.as_ref() == Some(alice.account()))));
    assert_eq!(
        alice.game(game).await?.status,
        GameStatus::Ended {
            winner: Some(alice.account().clone())
        }
    );
    assert_eq!(ended.lock().unwrap().len(), 1);
    assert!(fire(&bob, game, 10).await.is_err());
    Ok(())
}

#[tokio::test]
async fn injected_faults_and_external_end() -> anyhow::Result<()> {
    let ledger = Arc::new(InMemoryLedger::new());
    let (game, alice, _bob) = ready_game(&ledger).await?;

    ledger.fail_next_shots(1);
    assert!(fire(&alice, game, 7).await.is_err());
    assert!(!fire(&alice, game, 7).await?);
    assert_eq!(ledger.calls().shot_attempts, 2);

    ledger.fail_next_odds_updates(1);
    let fees = padded_fees(&alice, game, LedgerCall::UpdateOdds { odds: 150 }, &FeePolicy::default()).await?;
    assert!(alice.update_odds(game, 150, fees).await.is_err());
    alice.update_odds(game, 150, fees).await?;
    assert_eq!(ledger.odds(game, alice.account()), Some(150));

    ledger.end_game(game, None)?;
    assert!(alice.game(game).await?.is_ended());
    assert!(ledger.end_game(game, None).is_err());
    Ok(())
}

#[tokio::test]
async fn seats_are_enforced() -> anyhow::Result<()> {
    let ledger = Arc::new(InMemoryLedger::new());
    let alice = ledger.connect(PlayerId::new("alice"));
    let game = alice.create_game("").await?;
    assert!(alice.join_game(game).await.is_err(), "cannot join own game");
    assert!(place(&alice, game, &[0, 0, 1, 2, 3]).await.is_err(), "repeated cell");
    assert!(place(&alice, game, &[0, 1, 2]).await.is_err(), "short fleet");

    let bob = ledger.connect(PlayerId::new("bob"));
    bob.join_game(game).await?;
    let carol = ledger.connect(PlayerId::new("carol"));
    assert!(carol.join_game(game).await.is_err(), "game is full");
    assert!(!alice.game(game).await?.is_ready());
    Ok(())
}
