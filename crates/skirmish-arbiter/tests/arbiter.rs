//! Integration tests for the arbiter actor.

use std::time::Duration;

use skirmish_arbiter::{
    ArbiterError, ArbiterHandle, Roster, TurnRejection,
    UnitSpec, spawn_arbiter,
};
use skirmish_protocol::{
    Hand, HandOutcome, Location, PlayerNumber, Turn, UnitId,
};

use PlayerNumber::{One, Two};

fn arbiter() -> ArbiterHandle {
    spawn_arbiter(Roster::default(), 16)
}

/// Two sturdy, non-decisive units per side so long sequences never end the
/// match by accident.
fn sturdy_roster() -> Roster {
    Roster::new(vec![
        UnitSpec::new("p1-mover", One, Location::new(0, 0), 1_000),
        UnitSpec::new("p1-target", One, Location::new(0, 1), 1_000),
        UnitSpec::new("p2-mover", Two, Location::new(9, 0), 1_000),
        UnitSpec::new("p2-target", Two, Location::new(9, 1), 1_000),
    ])
    .expect("valid roster")
}

// =========================================================================
// Turn alternation
// =========================================================================

#[tokio::test]
async fn test_active_player_alternates_and_rejections_change_nothing() {
    let arbiter = arbiter();
    let mut expected = One;

    for round in 0..6u16 {
        // The wrong player tries first and must bounce off.
        let before = arbiter.snapshot().await.unwrap();
        let verdict = arbiter
            .apply_turn(Turn::default(), expected.other())
            .await
            .unwrap();
        assert_eq!(
            verdict,
            Err(TurnRejection::NotYourTurn { active: expected })
        );
        assert_eq!(arbiter.snapshot().await.unwrap(), before);

        let unit = if expected == One { "p1-square" } else { "p2-square" };
        let turn = Turn::moving(unit, Location::new(3, round));
        arbiter.apply_turn(turn, expected).await.unwrap().unwrap();

        expected = expected.other();
        assert_eq!(arbiter.snapshot().await.unwrap().active_player, expected);
    }
}

#[tokio::test]
async fn test_move_only_turn_is_published_as_pending() {
    let arbiter = arbiter();
    let turn = Turn::moving("p1-triangle", Location::new(2, 3));
    arbiter.apply_turn(turn.clone(), One).await.unwrap().unwrap();

    let update = arbiter.turn_update().await.unwrap();
    assert_eq!(update.active_player, Two);
    assert_eq!(update.pending_turn, Some(turn));
    assert!(!update.game_over);

    let snapshot = arbiter.snapshot().await.unwrap();
    assert_eq!(
        snapshot.unit_positions[&UnitId::from("p1-triangle")],
        Location::new(2, 3)
    );
}

// =========================================================================
// Atomicity under concurrent access
// =========================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_snapshots_never_see_half_a_turn() {
    const TURNS: u16 = 40;
    let arbiter = spawn_arbiter(sturdy_roster(), 16);

    // Turn k moves the actor's mover to column k and hits the opponent's
    // target for 1. In any consistent snapshot the number of hits a target
    // has taken equals the number of moves its attacker has made.
    let writer = {
        let arbiter = arbiter.clone();
        tokio::spawn(async move {
            for k in 0..TURNS {
                let player = if k % 2 == 0 { One } else { Two };
                let (mover, target) = match player {
                    One => ("p1-mover", "p2-target"),
                    Two => ("p2-mover", "p1-target"),
                };
                let turn = Turn::moving(mover, Location::new(k + 1, 5))
                    .with_attack(target, 1);
                arbiter.apply_turn(turn, player).await.unwrap().unwrap();
                tokio::task::yield_now().await;
            }
        })
    };

    let reader = {
        let arbiter = arbiter.clone();
        tokio::spawn(async move {
            for _ in 0..200 {
                let snap = arbiter.snapshot().await.unwrap();
                for (mover, target) in
                    [("p1-mover", "p2-target"), ("p2-mover", "p1-target")]
                {
                    let moved = snap.unit_positions[&UnitId::from(mover)].row == 5;
                    let hits = 1_000 - snap.unit_health[&UnitId::from(target)];
                    assert_eq!(moved, hits > 0, "move without its attack");
                }
                tokio::task::yield_now().await;
            }
        })
    };

    writer.await.unwrap();
    reader.await.unwrap();

    let snap = arbiter.snapshot().await.unwrap();
    assert_eq!(snap.unit_health[&UnitId::from("p2-target")], 1_000 - 20);
    assert_eq!(snap.unit_health[&UnitId::from("p1-target")], 1_000 - 20);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_hands_both_land() {
    let arbiter = arbiter();
    let a = {
        let arbiter = arbiter.clone();
        tokio::spawn(async move { arbiter.set_hand(One, Hand::Rock).await })
    };
    let b = {
        let arbiter = arbiter.clone();
        tokio::spawn(async move { arbiter.set_hand(Two, Hand::Scissors).await })
    };
    a.await.unwrap().unwrap();
    b.await.unwrap().unwrap();

    let snap = arbiter.snapshot().await.unwrap();
    assert_eq!(snap.hands.one, Some(Hand::Rock));
    assert_eq!(snap.hands.two, Some(Hand::Scissors));
}

// =========================================================================
// Hands
// =========================================================================

#[tokio::test]
async fn test_hand_protocol_through_handle() {
    let arbiter = arbiter();
    assert!(!arbiter.hands_pending().await.unwrap());
    assert_eq!(arbiter.resolve_hands().await.unwrap(), None);

    arbiter.set_hand(Two, Hand::Scissors).await.unwrap();
    assert!(arbiter.hands_pending().await.unwrap());

    // A later commit replaces the earlier one.
    arbiter.set_hand(Two, Hand::Paper).await.unwrap();
    assert!(arbiter.hands_pending().await.unwrap());

    arbiter.set_hand(One, Hand::Scissors).await.unwrap();
    assert!(!arbiter.hands_pending().await.unwrap());

    let first = arbiter.resolve_hands().await.unwrap();
    let second = arbiter.resolve_hands().await.unwrap();
    assert_eq!(first, Some(HandOutcome::Winner(One)));
    assert_eq!(first, second);
}

// =========================================================================
// Game over, reset, readiness
// =========================================================================

#[tokio::test]
async fn test_decisive_kill_blocks_turns_until_reset() {
    let arbiter = arbiter();
    let kill = Turn::default().with_attack("p2-circle", 10);
    arbiter.apply_turn(kill, One).await.unwrap().unwrap();

    let snap = arbiter.snapshot().await.unwrap();
    assert!(snap.game_over);
    assert!(!snap.unit_positions.contains_key(&UnitId::from("p2-circle")));

    assert_eq!(
        arbiter.apply_turn(Turn::default(), Two).await.unwrap(),
        Err(TurnRejection::GameOver)
    );

    arbiter.reset().await.unwrap();
    let snap = arbiter.snapshot().await.unwrap();
    assert!(!snap.game_over);
    assert_eq!(snap.active_player, One);
    assert_eq!(snap.unit_health[&UnitId::from("p2-circle")], 10);
    arbiter.apply_turn(Turn::default(), One).await.unwrap().unwrap();
}

#[tokio::test]
async fn test_ready_requires_both() {
    let arbiter = arbiter();
    assert!(!arbiter.ready().await.unwrap());
    arbiter.set_ready(One).await.unwrap();
    assert!(!arbiter.ready().await.unwrap());
    arbiter.set_ready(Two).await.unwrap();
    assert!(arbiter.ready().await.unwrap());

    arbiter.reset().await.unwrap();
    assert!(!arbiter.ready().await.unwrap());
}

// =========================================================================
// Turn notifications
// =========================================================================

#[tokio::test]
async fn test_wait_for_turn_wakes_on_handoff() {
    let arbiter = arbiter();

    let waiter = {
        let arbiter = arbiter.clone();
        tokio::spawn(async move {
            arbiter.wait_for_turn(Two, Duration::from_secs(5)).await
        })
    };
    tokio::task::yield_now().await;

    let turn = Turn::moving("p1-square", Location::new(1, 1));
    arbiter.apply_turn(turn.clone(), One).await.unwrap().unwrap();

    let update = waiter.await.unwrap().unwrap();
    assert_eq!(update.active_player, Two);
    assert_eq!(update.pending_turn, Some(turn));
}

#[tokio::test]
async fn test_wait_for_turn_returns_immediately_when_already_active() {
    let arbiter = arbiter();
    let update = arbiter
        .wait_for_turn(One, Duration::from_secs(5))
        .await
        .unwrap();
    assert_eq!(update.active_player, One);
}

#[tokio::test(start_paused = true)]
async fn test_wait_for_turn_times_out_with_current_state() {
    let arbiter = arbiter();
    let update = arbiter
        .wait_for_turn(Two, Duration::from_secs(30))
        .await
        .unwrap();
    assert_eq!(update.active_player, One);
    assert!(update.pending_turn.is_none());
}

#[tokio::test]
async fn test_subscribers_see_reset() {
    let arbiter = arbiter();
    let mut updates = arbiter.subscribe();

    arbiter
        .apply_turn(Turn::moving("p1-square", Location::new(1, 1)), One)
        .await
        .unwrap()
        .unwrap();
    updates.changed().await.unwrap();
    assert_eq!(updates.borrow_and_update().active_player, Two);

    arbiter.reset().await.unwrap();
    updates.changed().await.unwrap();
    let update = updates.borrow_and_update().clone();
    assert_eq!(update.active_player, One);
    assert!(update.pending_turn.is_none());
}

// =========================================================================
// Lifecycle
// =========================================================================

#[tokio::test]
async fn test_handle_is_unavailable_after_shutdown() {
    let arbiter = arbiter();
    arbiter.shutdown().await.unwrap();
    // Give the actor a moment to drain the command and drop its receiver.
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(matches!(
        arbiter.snapshot().await,
        Err(ArbiterError::Unavailable)
    ));
}
