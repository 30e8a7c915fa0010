use holdem_engine::cards::{parse_cards, Card, Rank as R, Suit as S};
use holdem_engine::hand::{compare_hands, evaluate, evaluate_hand, Category, HandStrength};

fn c(r: R, s: S) -> Card {
    Card::new(r, s)
}

fn eval(hole: &str, board: &str) -> HandStrength {
    evaluate(&parse_cards(hole).unwrap(), &parse_cards(board).unwrap()).unwrap()
}

#[test]
fn detects_royal_flush() {
    let hs = eval("A♠ K♠", "Q♠ J♠ 10♠ 2♦ 3♣");
    assert_eq!(hs.category, Category::RoyalFlush);
    assert_eq!(hs.category.class(), 9);
    assert_eq!(
        hs.best5,
        [
            c(R::Ace, S::Spades),
            c(R::King, S::Spades),
            c(R::Queen, S::Spades),
            c(R::Jack, S::Spades),
            c(R::Ten, S::Spades),
        ]
    );
}

#[test]
fn wheel_sits_between_pairs_and_flushes() {
    let wheel = eval("A♥ 2♥", "3♣ 4♦ 5♠ 9♣ 9♦");
    assert_eq!(wheel.category, Category::Straight);
    assert_eq!(wheel.rank_values(), [5, 4, 3, 2, 14]);

    let pair = eval("A♣ A♦", "3♣ 4♦ 5♠ 9♣ J♦");
    let high = eval("A♣ K♦", "3♣ 4♦ 7♠ 9♣ J♦");
    let flush = eval("2♣ 7♣", "3♣ 4♦ 5♠ 9♣ J♣");
    assert_eq!(flush.category, Category::Flush);

    assert!(compare_hands(&wheel, &pair).is_gt());
    assert!(compare_hands(&wheel, &high).is_gt());
    assert!(compare_hands(&wheel, &flush).is_lt());
}

#[test]
fn equal_quads_are_ordered_by_kicker() {
    let board = "8♠ 8♥ 8♦ 8♣ 2♠";
    let king = eval("K♦ 3♣", board);
    let queen = eval("Q♦ 3♦", board);
    assert_eq!(king.category, Category::FourOfAKind);
    assert_eq!(king.rank_values(), [8, 8, 8, 8, 13]);
    assert!(compare_hands(&king, &queen).is_gt());
}

#[test]
fn category_ordering_is_correct() {
    let cases = [
        ("2♣ 7♦", "9♠ J♥ K♣ 4♦ 3♠", Category::HighCard),
        ("2♣ 2♦", "9♠ J♥ K♣ 4♦ 3♠", Category::OnePair),
        ("2♣ 2♦", "9♠ 9♥ K♣ 4♦ 3♠", Category::TwoPair),
        ("2♣ 2♦", "2♠ 9♥ K♣ 4♦ 3♠", Category::ThreeOfAKind),
        ("5♣ 6♦", "7♠ 8♥ 9♣ K♦ 2♠", Category::Straight),
        ("2♣ 6♣", "9♣ J♣ K♣ 4♦ 3♠", Category::Flush),
        ("2♣ 2♦", "2♠ 9♥ 9♣ 4♦ 3♠", Category::FullHouse),
        ("2♣ 2♦", "2♠ 2♥ K♣ 4♦ 3♠", Category::FourOfAKind),
        ("5♣ 6♣", "7♣ 8♣ 9♣ K♦ 2♠", Category::StraightFlush),
        ("A♣ K♣", "Q♣ J♣ 10♣ 4♦ 3♠", Category::RoyalFlush),
    ];
    let strengths: Vec<HandStrength> = cases
        .iter()
        .map(|(hole, board, expected)| {
            let hs = eval(hole, board);
            assert_eq!(hs.category, *expected, "{hole} {board}");
            hs
        })
        .collect();
    for pair in strengths.windows(2) {
        assert!(compare_hands(&pair[1], &pair[0]).is_gt());
    }
}

#[test]
fn kickers_break_one_pair_ties() {
    let a = eval("J♠ 9♦", "J♥ 7♣ 5♦ 3♠ 2♣");
    let b = eval("J♦ 8♦", "J♥ 7♣ 5♦ 3♠ 2♣");
    assert_eq!(a.rank_values(), [11, 11, 9, 7, 5]);
    assert!(compare_hands(&a, &b).is_gt());
    assert!(compare_hands(&b, &a).is_lt());
}

#[test]
fn board_plays_for_both_is_a_tie() {
    let board = "A♠ K♦ Q♣ J♥ 10♠";
    let a = eval("2♣ 3♦", board);
    let b = eval("4♣ 5♦", board);
    assert!(compare_hands(&a, &b).is_eq());
}

#[test]
fn six_cards_evaluate_like_seven() {
    let cards = parse_cards("K♠ K♥ 4♦ 4♣ 9♠ 2♥").unwrap();
    let hs = evaluate_hand(&cards).unwrap();
    assert_eq!(hs.category, Category::TwoPair);
    assert_eq!(hs.rank_values(), [13, 13, 4, 4, 9]);
    assert_eq!(hs.describe(), "Two Pair (K♠ K♥ 4♦ 4♣ 9♠)");
}
