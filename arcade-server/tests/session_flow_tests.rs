mod test_helpers;

use arcade_types::{InviteStatus, RoundConclusion};
use test_helpers::*;

#[tokio::test]
async fn test_invite_accept_round_progression_cycle() {
    let setup = TestArcadeSetup::new().await;
    setup
        .register_customers(&[("0912", "Sara"), ("0913", "Reza")])
        .await;

    let invite = setup
        .invite_board
        .send_invite(
            test_customer("0912", "Sara"),
            test_customer("0913", "Reza"),
            60,
        )
        .await
        .unwrap();

    let accepted = setup
        .invite_board
        .resolve("0912", "0913", InviteStatus::Accepted)
        .await
        .unwrap();
    assert_eq!(accepted.status, InviteStatus::Accepted);

    let info = setup.round_manager.start_invite_round(&invite).await.unwrap();
    assert_eq!(setup.round_manager.active_round_count().await, 1);

    // Sara answers everything, Reza submits a blank sheet
    setup
        .round_manager
        .submit_answers("0912", &info.round_id, letter_sheet(info.letter))
        .await
        .unwrap();
    let outcome = setup
        .round_manager
        .submit_answers("0913", &info.round_id, Default::default())
        .await
        .unwrap()
        .expect("second sheet finishes the round");

    let sara = &outcome.results[0];
    assert_eq!(sara.customer.id, "0912");
    assert_eq!(sara.score, 70);
    assert_eq!(sara.conclusion, RoundConclusion::Win);

    let reza = &outcome.results[1];
    assert_eq!(reza.score, 0);
    assert_eq!(reza.conclusion, RoundConclusion::Lose);

    // both scores landed in the store
    let sara_progression = setup
        .progression
        .get_progression("0912")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(sara_progression.total_score, 70);
    assert_eq!(sara_progression.high_score, 70);
    let reza_progression = setup
        .progression
        .get_progression("0913")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reza_progression.total_score, 0);

    // and both are free to play again
    assert!(setup.round_manager.round_for_customer("0912").await.is_none());
    assert_eq!(setup.round_manager.active_round_count().await, 0);
}

#[tokio::test]
async fn test_declined_invite_starts_no_round() {
    let setup = TestArcadeSetup::new().await;

    setup
        .invite_board
        .send_invite(
            test_customer("0912", "Sara"),
            test_customer("0913", "Reza"),
            30,
        )
        .await
        .unwrap();
    setup
        .invite_board
        .resolve("0912", "0913", InviteStatus::Declined)
        .await
        .unwrap();

    assert_eq!(setup.round_manager.active_round_count().await, 0);
    assert!(setup.invite_board.pending_for("0913").await.is_empty());
}

#[tokio::test]
async fn test_unregistered_participant_still_gets_a_result() {
    let setup = TestArcadeSetup::new().await;
    // only Sara exists in the store
    setup.register_customers(&[("0912", "Sara")]).await;

    let info = setup
        .round_manager
        .start_ai_round(test_customer("0915", "Ghost"), 30)
        .await
        .unwrap();

    let outcome = setup
        .round_manager
        .submit_answers("0915", &info.round_id, letter_sheet(info.letter))
        .await
        .unwrap()
        .unwrap();

    // the score stands even though the store had nowhere to put it
    let result = &outcome.results[0];
    assert_eq!(result.score, 70);
    assert!(result.progression.is_none());
}

#[tokio::test]
async fn test_scores_accumulate_across_rounds() {
    let setup = TestArcadeSetup::new().await;
    setup.register_customers(&[("0912", "Sara")]).await;

    for _ in 0..2 {
        let info = setup
            .round_manager
            .start_ai_round(test_customer("0912", "Sara"), 30)
            .await
            .unwrap();
        setup
            .round_manager
            .submit_answers("0912", &info.round_id, letter_sheet(info.letter))
            .await
            .unwrap()
            .unwrap();
    }

    let progression = setup
        .progression
        .get_progression("0912")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(progression.total_score, 140);
    assert_eq!(progression.high_score, 70);
    assert_eq!(progression.level, 1);
}
