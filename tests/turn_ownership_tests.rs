use battleship_agent::ledger::{GameId, GameRecord, GameStatus, PlayerId, Role, TurnOwner};

fn record(player1s_turn: bool) -> GameRecord {
    GameRecord {
        id: GameId(1),
        player1: PlayerId::new("alice"),
        player2: Some(PlayerId::new("bob")),
        player1s_turn,
        model: String::new(),
        fleets_placed: [true, true],
        status: GameStatus::Active,
    }
}

#[test]
fn player_one_moves_when_flag_is_set() {
    let g = record(true);
    let alice = PlayerId::new("alice");
    let bob = PlayerId::new("bob");
    assert_eq!(g.mover(), Role::Player1);
    assert_eq!(g.turn_owner(&alice), TurnOwner::Mine);
    assert_eq!(g.turn_owner(&bob), TurnOwner::Opponent);
    assert!(g.is_my_turn(&alice));
    assert!(!g.is_my_turn(&bob));
}

#[test]
fn player_two_moves_when_flag_is_clear() {
    let g = record(false);
    let alice = PlayerId::new("alice");
    let bob = PlayerId::new("bob");
    assert_eq!(g.mover(), Role::Player2);
    assert_eq!(g.turn_owner(&alice), TurnOwner::Opponent);
    assert_eq!(g.turn_owner(&bob), TurnOwner::Mine);
    assert!(!g.is_my_turn(&alice));
    assert!(g.is_my_turn(&bob));
}

#[test]
fn outsiders_never_move() {
    let carol = PlayerId::new("carol");
    for flag in [true, false] {
        let g = record(flag);
        assert_eq!(g.turn_owner(&carol), TurnOwner::NotSeated);
        assert!(!g.is_my_turn(&carol));
        assert_eq!(g.opponent_of(&carol), None);
    }
}

#[test]
fn no_turn_before_both_fleets_or_after_the_end() {
    let alice = PlayerId::new("alice");
    let mut g = record(true);
    g.fleets_placed = [true, false];
    assert_eq!(g.turn_owner(&alice), TurnOwner::Mine);
    assert!(!g.is_my_turn(&alice));

    let mut g = record(true);
    g.status = GameStatus::Ended { winner: None };
    assert!(!g.is_my_turn(&alice));
    assert!(g.is_ended());
}

#[test]
fn roles_map_to_seats() {
    let g = record(true);
    let alice = PlayerId::new("alice");
    let bob = PlayerId::new("bob");
    assert_eq!(g.role_of(&alice), Some(Role::Player1));
    assert_eq!(g.role_of(&bob), Some(Role::Player2));
    assert_eq!(g.opponent_of(&alice), Some(&bob));
    assert_eq!(g.opponent_of(&bob), Some(&alice));
    assert_eq!(Role::Player1.other(), Role::Player2);
}
