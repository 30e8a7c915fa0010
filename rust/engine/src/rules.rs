use crate::errors::GameError;
use crate::game::Table;
use crate::player::{Player, PlayerAction as A};

/// A betting action checked against the player's stack. Amounts are the
/// chips that move from stack to bet, except `Raise` which keeps the new
/// round total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidatedAction {
    Fold,
    Check,
    Call(u32),
    Raise(u32),
    AllIn(u32),
}

/// Validates a betting action for a player holding `stack` chips who has
/// already put `player_bet` in this round, against a table target of
/// `table_bet` and a smallest legal raise total of `min_raise_to`.
///
/// A call for more than the stack becomes an all-in for the stack.
///
/// # Errors
///
/// - [`GameError::CannotCheck`] when checking while facing a bet
/// - [`GameError::CannotCall`] when there is nothing to call
/// - [`GameError::InvalidRaise`] when the raise total is below `min_raise_to`
/// - [`GameError::InsufficientChips`] when a raise or all-in needs more chips
///   than the stack holds
///
/// # Examples
///
/// ```
/// use holdem_engine::rules::{validate_action, ValidatedAction};
/// use holdem_engine::player::PlayerAction;
///
/// // 2 to call on a 10-chip stack
/// let v = validate_action(10, 0, 2, 4, PlayerAction::Call);
/// assert_eq!(v, Ok(ValidatedAction::Call(2)));
///
/// // short stack calling goes all-in
/// let v = validate_action(1, 0, 2, 4, PlayerAction::Call);
/// assert_eq!(v, Ok(ValidatedAction::AllIn(1)));
/// ```
///
/// ```
/// use holdem_engine::rules::validate_action;
/// use holdem_engine::player::PlayerAction;
/// use holdem_engine::errors::GameError;
///
/// let v = validate_action(100, 0, 10, 20, PlayerAction::Raise(15));
/// assert_eq!(v, Err(GameError::InvalidRaise { amount: 15, minimum: 20 }));
/// ```
pub fn validate_action(
    stack: u32,
    player_bet: u32,
    table_bet: u32,
    min_raise_to: u32,
    action: A,
) -> Result<ValidatedAction, GameError> {
    let to_call = table_bet.saturating_sub(player_bet);
    match action {
        A::Fold => Ok(ValidatedAction::Fold),
        A::Check => {
            if to_call == 0 {
                Ok(ValidatedAction::Check)
            } else {
                Err(GameError::CannotCheck { to_call })
            }
        }
        A::Call => {
            if to_call == 0 {
                Err(GameError::CannotCall)
            } else if stack <= to_call {
                Ok(ValidatedAction::AllIn(stack))
            } else {
                Ok(ValidatedAction::Call(to_call))
            }
        }
        A::Raise(total) => {
            if total < min_raise_to {
                Err(GameError::InvalidRaise {
                    amount: total,
                    minimum: min_raise_to,
                })
            } else if total - player_bet > stack {
                Err(GameError::InsufficientChips)
            } else {
                Ok(ValidatedAction::Raise(total))
            }
        }
        A::AllIn => {
            if stack == 0 {
                Err(GameError::InsufficientChips)
            } else {
                Ok(ValidatedAction::AllIn(stack))
            }
        }
    }
}

/// Still owes a decision this round: has not acted yet, or is behind the
/// table bet.
pub fn needs_action(player: &Player, table_bet: u32) -> bool {
    player.can_act() && (!player.has_acted() || player.current_bet < table_bet)
}

/// The betting round is over once every non-folded player is all-in or has
/// acted and matched the table bet. Blinds don't count as acting.
pub fn is_round_settled(table: &Table) -> bool {
    table
        .players
        .iter()
        .filter(|p| p.is_live())
        .all(|p| !needs_action(p, table.state.current_bet))
}

/// Index of the next player owing a decision after `seat`, in seat order.
pub fn next_to_act(table: &Table, seat: Option<usize>) -> Option<usize> {
    let bet = table.state.current_bet;
    table.next_after(seat, |p| needs_action(p, bet))
}

/// Non-folded players who can still put chips in.
pub fn players_with_chips(table: &Table) -> usize {
    table.players.iter().filter(|p| p.can_act()).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::parse_cards;
    use crate::game::Stakes;

    fn live(id: &str, seat: usize, chips: u32, bet: u32, acted: bool) -> Player {
        let mut p = Player::new(id, id, chips, seat);
        p.hole_cards = parse_cards("2♠ 3♠").unwrap();
        p.current_bet = bet;
        if acted {
            p.last_action = "Call".into();
        }
        p
    }

    #[test]
    fn raise_to_exact_stack_is_a_raise() {
        assert_eq!(
            validate_action(18, 2, 2, 4, A::Raise(20)),
            Ok(ValidatedAction::Raise(20))
        );
        assert_eq!(
            validate_action(18, 2, 2, 4, A::Raise(21)),
            Err(GameError::InsufficientChips)
        );
    }

    #[test]
    fn check_facing_a_bet_is_rejected() {
        assert_eq!(
            validate_action(100, 1, 2, 4, A::Check),
            Err(GameError::CannotCheck { to_call: 1 })
        );
        assert_eq!(validate_action(100, 2, 2, 4, A::Check), Ok(ValidatedAction::Check));
    }

    #[test]
    fn all_in_needs_chips() {
        assert_eq!(validate_action(0, 2, 2, 4, A::AllIn), Err(GameError::InsufficientChips));
    }

    #[test]
    fn big_blind_keeps_the_option() {
        let mut t = Table::new(Stakes::default());
        t.state.current_bet = 2;
        t.players.push(live("sb", 0, 98, 2, true));
        t.players.push(live("bb", 1, 98, 2, false));
        assert!(!is_round_settled(&t));
        assert_eq!(next_to_act(&t, Some(0)), Some(1));

        t.players[1].last_action = "Check".into();
        assert!(is_round_settled(&t));
        assert_eq!(next_to_act(&t, Some(1)), None);
    }

    #[test]
    fn all_in_players_never_block_settlement() {
        let mut t = Table::new(Stakes::default());
        t.state.current_bet = 50;
        t.players.push(live("a", 0, 0, 30, false));
        t.players.push(live("b", 1, 50, 50, true));
        assert!(is_round_settled(&t));
        assert_eq!(players_with_chips(&t), 1);
    }
}
