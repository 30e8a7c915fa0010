//! The action processor: one action in, one new table out.

use rand::Rng;

use crate::action::{Action, ActionKind};
use crate::deck::Deck;
use crate::errors::GameError;
use crate::game::{Phase, Table};
use crate::hand::{compare_hands, evaluate, HandStrength};
use crate::player::{Player, PlayerAction};
use crate::rules::{is_round_settled, next_to_act, players_with_chips, validate_action, ValidatedAction};

pub const NOT_ENOUGH_PLAYERS: &str = "Not enough players to start.";
pub const HAND_STARTED: &str = "New hand started!";

/// Applies one action to a snapshot and returns the table that results.
///
/// Any `Err` is a rejection: the input snapshot is never touched and the
/// caller keeps it as the current state. The only source of nondeterminism
/// is the shuffle on `StartGame`, drawn from `rng`.
///
/// # Examples
///
/// ```
/// use holdem_engine::action::{Action, ActionKind};
/// use holdem_engine::engine::apply;
/// use holdem_engine::game::{Phase, Stakes, Table};
/// use rand::SeedableRng;
/// use rand_chacha::ChaCha20Rng;
///
/// let mut rng = ChaCha20Rng::seed_from_u64(7);
/// let mut table = Table::new(Stakes::default());
/// for (seq, id) in ["ann", "bob"].into_iter().enumerate() {
///     let join = ActionKind::Join { name: id.to_uppercase(), buy_in: 100 };
///     table = apply(&table, &Action::new(seq as u64 + 1, id, join), &mut rng).unwrap();
/// }
/// table = apply(&table, &Action::new(3, "ann", ActionKind::StartGame), &mut rng).unwrap();
/// assert_eq!(table.state.phase, Phase::PreFlop);
/// assert_eq!(table.state.pot, 3);
/// ```
pub fn apply<R: Rng + ?Sized>(table: &Table, action: &Action, rng: &mut R) -> Result<Table, GameError> {
    let mut next = table.clone();
    let id = action.player_id.as_str();
    match &action.kind {
        ActionKind::Join { name, buy_in } => join(&mut next, id, name, *buy_in)?,
        ActionKind::StartGame => {
            if next.player(id).is_none() {
                return Err(GameError::PlayerNotFound(id.to_string()));
            }
            start_hand(&mut next, rng)?
        }
        ActionKind::Play(play) => betting_action(&mut next, id, *play, action.expected_turn)?,
        ActionKind::Rebuy(amount) => rebuy(&mut next, id, *amount)?,
        ActionKind::ToggleSpectator => toggle_spectator(&mut next, id)?,
    }
    Ok(next)
}

fn join(table: &mut Table, id: &str, name: &str, buy_in: u32) -> Result<(), GameError> {
    let stakes = table.state.stakes;
    if buy_in == 0 || buy_in > stakes.max_buy_in {
        return Err(GameError::InvalidBuyIn {
            amount: buy_in,
            max: stakes.max_buy_in,
        });
    }
    let name = name.trim();
    if name.is_empty() {
        return Err(GameError::InvalidName);
    }
    if table.player(id).is_some() {
        return Err(GameError::AlreadySeated(id.to_string()));
    }

    let mut player = Player::new(id, name, buy_in, table.free_seat());
    if table.seated_count() >= stakes.max_players {
        player.is_spectator = true;
        player.last_action = "Joined as Spectator".to_string();
    } else {
        player.last_action = "Joined".to_string();
    }
    table.state.last_message = format!("{name} joined the table");
    table.players.push(player);
    Ok(())
}

fn rebuy(table: &mut Table, id: &str, amount: u32) -> Result<(), GameError> {
    let max = table.state.stakes.max_buy_in;
    if amount == 0 || amount > max {
        return Err(GameError::InvalidBuyIn { amount, max });
    }
    let in_hand = table.state.phase.in_hand();
    let player = table
        .player_mut(id)
        .ok_or_else(|| GameError::PlayerNotFound(id.to_string()))?;
    // dealt in means no top-up until the hand is over, folded or not
    if in_hand && !player.hole_cards.is_empty() {
        return Err(GameError::HandInProgress);
    }
    player.add_chips(amount);
    let message = format!("{} rebought ${amount}", player.name);
    table.state.last_message = message;
    Ok(())
}

fn toggle_spectator(table: &mut Table, id: &str) -> Result<(), GameError> {
    let in_hand = table.state.phase.in_hand();
    let seated = table.seated_count();
    let max_players = table.state.stakes.max_players;
    let free_seat = table.free_seat();
    let player = table
        .player_mut(id)
        .ok_or_else(|| GameError::PlayerNotFound(id.to_string()))?;
    if in_hand && player.is_live() {
        return Err(GameError::HandInProgress);
    }

    if player.is_spectator {
        if seated >= max_players {
            return Err(GameError::TableFull);
        }
        player.is_spectator = false;
        player.seat_index = free_seat;
    } else {
        player.is_spectator = true;
        player.reset_for_hand();
    }
    Ok(())
}

fn start_hand<R: Rng + ?Sized>(table: &mut Table, rng: &mut R) -> Result<(), GameError> {
    if table.state.phase.in_hand() {
        return Err(GameError::HandInProgress);
    }
    let eligible = table.seat_order(Player::is_eligible);
    if eligible.len() < 2 {
        table.state.last_message = NOT_ENOUGH_PLAYERS.to_string();
        return Ok(());
    }

    for p in table.players.iter_mut() {
        p.reset_for_hand();
    }
    let mut deck = Deck::shuffled(rng);

    // eligible seats starting at the new dealer; heads-up the big blind
    // wraps back onto the dealer
    let order = match table.state.dealer_position {
        Some(previous) => rotate_after(table, previous, &eligible),
        None => eligible,
    };
    let n = order.len();
    let (dealer, sb, bb) = (order[0], order[1 % n], order[2 % n]);
    let dealer_seat = table.players[dealer].seat_index;
    let sb_seat = table.players[sb].seat_index;
    let bb_seat = table.players[bb].seat_index;

    for &i in order.iter().cycle().skip(1).take(n) {
        table.players[i].hole_cards = deck.deal(2)?;
    }

    let stakes = table.state.stakes;
    let posted = table.players[sb].commit(stakes.small_blind) + table.players[bb].commit(stakes.big_blind);

    let state = &mut table.state;
    state.deck = deck;
    state.community_cards.clear();
    state.pot = posted;
    state.current_bet = stakes.big_blind;
    state.last_raise = stakes.big_blind;
    state.dealer_position = Some(dealer_seat);
    state.small_blind_position = Some(sb_seat);
    state.big_blind_position = Some(bb_seat);
    state.phase = Phase::PreFlop;
    state.hand_number += 1;
    state.last_message = HAND_STARTED.to_string();

    advance(table, Some(bb_seat))
}

fn betting_action(
    table: &mut Table,
    id: &str,
    action: PlayerAction,
    expected_turn: Option<u64>,
) -> Result<(), GameError> {
    if !table.state.phase.in_hand() {
        return Err(GameError::NoHandInProgress);
    }
    if let Some(expected) = expected_turn {
        if expected != table.state.turn_seq {
            return Err(GameError::StaleTurn {
                expected,
                actual: table.state.turn_seq,
            });
        }
    }
    let idx = table
        .players
        .iter()
        .position(|p| p.id == id)
        .ok_or_else(|| GameError::PlayerNotFound(id.to_string()))?;
    if table.state.current_turn.as_deref() != Some(id) {
        return Err(GameError::NotPlayersTurn {
            expected: table.state.current_turn.clone(),
            actual: id.to_string(),
        });
    }
    let state = &mut table.state;
    let player = &mut table.players[idx];
    let validated = validate_action(
        player.chips,
        player.current_bet,
        state.current_bet,
        state.min_raise_to(),
        action,
    )?;

    let label = match validated {
        ValidatedAction::Fold => {
            player.has_folded = true;
            action.label()
        }
        ValidatedAction::Check => action.label(),
        ValidatedAction::Call(amount) => {
            state.pot += player.commit(amount);
            action.label()
        }
        ValidatedAction::Raise(total) => {
            state.pot += player.commit(total - player.current_bet);
            state.last_raise = total - state.current_bet;
            state.current_bet = total;
            action.label()
        }
        ValidatedAction::AllIn(amount) => {
            state.pot += player.commit(amount);
            if player.current_bet > state.current_bet {
                state.last_raise = player.current_bet - state.current_bet;
                state.current_bet = player.current_bet;
            }
            PlayerAction::AllIn.label()
        }
    };
    player.last_action = label;

    let seat = player.seat_index;
    advance(table, Some(seat))
}

/// Moves the hand forward after a change at `seat`: fold win, next turn,
/// next street or showdown.
fn advance(table: &mut Table, seat: Option<usize>) -> Result<(), GameError> {
    let live = table.seat_order(Player::is_live);
    if let &[winner] = live.as_slice() {
        let pot = table.state.pot;
        let player = &mut table.players[winner];
        player.add_chips(pot);
        table.state.last_message = format!("{} wins ${pot}", player.name);
        finish_hand(table);
        return Ok(());
    }

    if !is_round_settled(table) {
        let next = next_to_act(table, seat).map(|i| table.players[i].id.clone());
        table.state.set_turn(next);
        return Ok(());
    }

    // settled: deal streets until someone has a decision to make
    while let Some((phase, count)) = table.state.phase.next_street() {
        for p in table.players.iter_mut().filter(|p| p.is_live()) {
            p.current_bet = 0;
            p.last_action.clear();
        }
        let cards = table.state.deck.deal(count)?;
        let state = &mut table.state;
        state.current_bet = 0;
        state.last_raise = 0;
        state.community_cards.extend(cards);
        state.phase = phase;

        if players_with_chips(table) >= 2 {
            let first = table
                .next_after(table.state.dealer_position, Player::can_act)
                .map(|i| table.players[i].id.clone());
            table.state.set_turn(first);
            return Ok(());
        }
    }

    showdown(table)
}

fn showdown(table: &mut Table) -> Result<(), GameError> {
    table.state.phase = Phase::Showdown;
    let board = table.state.community_cards.clone();
    let contenders = table.seat_order(Player::is_live);
    let dealer = table.state.dealer_position.unwrap_or(0);

    let mut best: Option<(usize, HandStrength)> = None;
    for i in rotate_after(table, dealer, &contenders) {
        let player = &mut table.players[i];
        let strength = evaluate(&player.hole_cards, &board)?;
        player.hand_ranking = Some(strength.clone());
        player.show_cards = true;
        // strictly better only, so ties stay with the earlier seat
        if best.as_ref().map_or(true, |(_, b)| compare_hands(&strength, b).is_gt()) {
            best = Some((i, strength));
        }
    }

    let (winner, strength) = best.ok_or(GameError::NoHandInProgress)?;
    let pot = table.state.pot;
    let player = &mut table.players[winner];
    player.add_chips(pot);
    table.state.last_message = format!("{} wins ${pot} with a {}", player.name, strength.category.name());
    finish_hand(table);
    Ok(())
}

fn finish_hand(table: &mut Table) {
    for p in table.players.iter_mut() {
        p.current_bet = 0;
    }
    let state = &mut table.state;
    state.pot = 0;
    state.current_bet = 0;
    state.last_raise = 0;
    state.phase = Phase::Waiting;
    state.set_turn(None);
}

/// `indices` (already in seat order) rotated to start after `seat`.
fn rotate_after(table: &Table, seat: usize, indices: &[usize]) -> Vec<usize> {
    let split = indices
        .iter()
        .position(|&i| table.players[i].seat_index > seat)
        .unwrap_or(indices.len());
    let mut out = indices[split..].to_vec();
    out.extend_from_slice(&indices[..split]);
    out
}
