/// End-to-end play through `TableService` with its background tasks running.
use std::time::Duration;

use holdem_engine::game::Phase;
use holdem_engine::player::PlayerAction;
use holdem_table::config::TableConfig;
use holdem_table::events::{ActionOutcome, EventSubscription, TableEvent};
use holdem_table::{TableHandle, TableService};

const WAIT: Duration = Duration::from_secs(5);

fn config(turn_timeout_secs: u64) -> TableConfig {
    TableConfig {
        seed: Some(21),
        turn_timeout_secs,
        ..TableConfig::default()
    }
}

async fn await_receipt(sub: &mut EventSubscription, seq: u64) -> ActionOutcome {
    tokio::time::timeout(WAIT, sub.receipt_for(seq))
        .await
        .expect("receipt in time")
        .expect("bus open")
        .outcome
}

async fn seat_two(service: &TableService, sub: &mut EventSubscription, table_id: &str) -> (TableHandle, TableHandle) {
    let ann = service.handle(table_id, "ann").expect("ann handle");
    let bob = service.handle(table_id, "bob").expect("bob handle");
    ann.join("Ann", 100).expect("queue join");
    let seq = bob.join("Bob", 100).expect("queue join");
    assert_eq!(await_receipt(sub, seq).await, ActionOutcome::Accepted);
    (ann, bob)
}

#[tokio::test]
async fn heads_up_hand_plays_to_showdown() {
    let service = TableService::new(config(0)).expect("service");
    let table_id = service.create_table().expect("table");
    let mut sub = service.events().subscribe(&table_id);
    let (ann, bob) = seat_two(&service, &mut sub, &table_id).await;

    let seq = ann.start_game().expect("queue start");
    assert_eq!(await_receipt(&mut sub, seq).await, ActionOutcome::Accepted);

    for _ in 0..16 {
        let view = ann.snapshot().expect("snapshot");
        if !view.state.phase.in_hand() {
            break;
        }
        let turn = view.state.current_turn.clone().expect("someone to act");
        let holder = if turn == "ann" { &ann } else { &bob };
        let owes = view.player(&turn).map(|p| p.current_bet < view.state.current_bet).unwrap_or(false);
        let action = if owes { PlayerAction::Call } else { PlayerAction::Check };
        let seq = holder.submit_action(action).expect("queue action");
        assert_eq!(await_receipt(&mut sub, seq).await, ActionOutcome::Accepted);
    }

    let view = bob.snapshot().expect("snapshot");
    assert_eq!(view.state.phase, Phase::Waiting);
    assert_eq!(view.state.community_cards.len(), 5);
    assert!(view.state.last_message.contains("wins $4"), "{}", view.state.last_message);
    assert_eq!(view.players.iter().map(|p| p.chips).sum::<u32>(), 200);
    // both hands were turned over at showdown
    assert!(view.players.iter().all(|p| p.hole_cards.iter().all(Option::is_some)));
}

#[tokio::test]
async fn rejected_command_gets_a_receipt_with_reason() {
    let service = TableService::new(config(0)).expect("service");
    let table_id = service.create_table().expect("table");
    let mut sub = service.events().subscribe(&table_id);
    let (ann, _bob) = seat_two(&service, &mut sub, &table_id).await;

    let seq = ann.submit("check", None).expect("queue check");
    match await_receipt(&mut sub, seq).await {
        ActionOutcome::Rejected { reason, .. } => assert!(reason.contains("No hand in progress"), "{reason}"),
        other => panic!("expected rejection, got {other:?}"),
    }
    assert_eq!(ann.snapshot().expect("snapshot").state.phase, Phase::Waiting);
}

#[tokio::test(start_paused = true)]
async fn idle_player_is_folded_when_the_turn_runs_out() {
    let service = TableService::new(config(5)).expect("service");
    let table_id = service.create_table().expect("table");
    let mut sub = service.events().subscribe(&table_id);
    let (ann, _bob) = seat_two(&service, &mut sub, &table_id).await;

    let seq = ann.start_game().expect("queue start");
    assert_eq!(await_receipt(&mut sub, seq).await, ActionOutcome::Accepted);
    let first = ann
        .snapshot()
        .expect("snapshot")
        .state
        .current_turn
        .expect("someone to act");

    let mut timed_out = None;
    let message = tokio::time::timeout(Duration::from_secs(60), async {
        loop {
            match sub.recv().await.expect("bus open") {
                TableEvent::TurnTimedOut { player_id, .. } => timed_out = Some(player_id),
                TableEvent::HandCompleted { message, .. } => return message,
                _ => {}
            }
        }
    })
    .await
    .expect("hand completes after the timeout");

    assert_eq!(timed_out.as_deref(), Some(first.as_str()));
    assert!(message.ends_with("wins $3"), "{message}");
    let view = ann.snapshot().expect("snapshot");
    // first to act heads-up is the small blind, who owed a chip and folded
    assert_eq!(view.player(&first).map(|p| p.chips), Some(99));
    assert_eq!(view.players.iter().map(|p| p.chips).sum::<u32>(), 200);
}

#[tokio::test(start_paused = true)]
async fn acting_in_time_beats_the_timer() {
    let service = TableService::new(config(5)).expect("service");
    let table_id = service.create_table().expect("table");
    let mut sub = service.events().subscribe(&table_id);
    let (ann, bob) = seat_two(&service, &mut sub, &table_id).await;

    let seq = ann.start_game().expect("queue start");
    assert_eq!(await_receipt(&mut sub, seq).await, ActionOutcome::Accepted);

    tokio::time::sleep(Duration::from_secs(3)).await;
    let view = ann.snapshot().expect("snapshot");
    let turn = view.state.current_turn.clone().expect("someone to act");
    let holder = if turn == "ann" { &ann } else { &bob };
    let seq = holder.submit_action(PlayerAction::Call).expect("queue call");
    assert_eq!(await_receipt(&mut sub, seq).await, ActionOutcome::Accepted);

    let view = ann.snapshot().expect("snapshot");
    assert_eq!(view.state.phase, Phase::PreFlop);
    assert_eq!(view.state.pot, 4);
    assert!(view.players.iter().all(|p| !p.has_folded));
}
