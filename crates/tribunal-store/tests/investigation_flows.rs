//! # Evidence and Investigation Scenarios
//!
//! Drives disputes through escalation, evidence intake, jury broadcast,
//! ballot tallying, and closure, checking rating accounting and the
//! propagation of the outcome back into the disputants' participations.

mod common;

use common::Harness;
use tribunal_core::{
    Attachment, BallotResult, DisputeId, EngineError, InvestigationId, InvestigationStatus,
    JurorChoice, ParticipationResult, ParticipationStatus, User,
};
use tribunal_engine::ledger::{BallotStore, InvestigationStore, ParticipationStore};
use tribunal_engine::{InvestigationFilter, NewDispute, NewEvidence};

fn proof(dispute: DisputeId, username: &str) -> NewEvidence {
    NewEvidence {
        dispute_id: dispute,
        username: username.into(),
        description: format!("{username}'s account of the outcome"),
        image: Attachment {
            data: vec![0xff, 0xd8, 0xff],
            mime: "image/jpeg".into(),
        },
    }
}

/// Register `jurors` extra users, escalate a dispute between alice and bob,
/// and return its id. Alice submits evidence first, so alice is "p1".
async fn escalated(harness: &Harness, jurors: &[&str]) -> DisputeId {
    harness.register("alice", 1).await;
    harness.register("bob", 2).await;
    for (offset, juror) in jurors.iter().enumerate() {
        harness.register(juror, 100 + offset as i64).await;
    }

    let id = harness
        .disputes
        .create(
            NewDispute {
                title: "Chess match".into(),
                description: "Best of three, loser pays".into(),
                opponent: "bob".into(),
                amount: 100,
                currency: None,
                image: None,
            },
            "alice",
        )
        .await
        .unwrap();
    harness.disputes.accept(id, "bob").await.unwrap();
    harness.disputes.vote(id, "alice", true).await.unwrap();
    harness.disputes.vote(id, "bob", true).await.unwrap();
    id
}

/// Escalate, submit both sides' evidence, and return the investigation id.
async fn investigated(harness: &Harness, jurors: &[&str]) -> (DisputeId, InvestigationId) {
    let dispute = escalated(harness, jurors).await;
    harness
        .evidence
        .provide(proof(dispute, "alice"))
        .await
        .unwrap();
    harness
        .evidence
        .provide(proof(dispute, "bob"))
        .await
        .unwrap();

    let page = harness
        .investigations
        .list(jurors[0], InvestigationFilter::default())
        .await
        .unwrap();
    (dispute, page.items[0].id)
}

async fn participation_of(
    harness: &Harness,
    dispute: DisputeId,
    username: &str,
) -> tribunal_core::Participation {
    let user = harness.users.by_username(username).await.unwrap();
    harness.ledger.participation(dispute, user.id).await.unwrap()
}

async fn rating_of(harness: &Harness, username: &str) -> i64 {
    harness.users.by_username(username).await.unwrap().rating
}

// ── Evidence intake ────────────────────────────────────────────────────

#[tokio::test]
async fn first_evidence_never_creates_an_investigation() {
    let harness = Harness::new();
    let dispute = escalated(&harness, &["carol"]).await;

    harness
        .evidence
        .provide(proof(dispute, "alice"))
        .await
        .unwrap();

    let mine = participation_of(&harness, dispute, "alice").await;
    assert_eq!(mine.result, ParticipationResult::EvidenceAnswered);
    let theirs = participation_of(&harness, dispute, "bob").await;
    assert_eq!(theirs.result, ParticipationResult::Evidence);

    // No juror has anything to vote on yet.
    let page = harness
        .investigations
        .list("carol", InvestigationFilter::default())
        .await
        .unwrap();
    assert!(page.items.is_empty());
}

#[tokio::test]
async fn second_evidence_opens_investigation_and_broadcasts() {
    let harness = Harness::new();
    let jurors = ["carol", "dave", "erin"];
    let (dispute, investigation) = investigated(&harness, &jurors).await;

    for name in ["alice", "bob"] {
        let row = participation_of(&harness, dispute, name).await;
        assert_eq!(row.result, ParticipationResult::Inspected);
    }

    // Jury size is every registered user minus the two disputants.
    let record = harness.ledger.investigation(investigation).await.unwrap();
    assert_eq!(record.total, jurors.len() as i32);
    assert_eq!(record.status, InvestigationStatus::Current);
    assert_eq!(record.title, "Chess match");

    // Every juror got a ballot and a notification; the disputants got
    // neither.
    for juror in jurors {
        let user = harness.users.by_username(juror).await.unwrap();
        let ballot = harness.ledger.ballot(investigation, user.id).await.unwrap();
        assert_eq!(ballot.result, BallotResult::New);
        assert!(ballot.vote.is_none());
        assert!(harness
            .notifier
            .texts_for(user.channel_id)
            .iter()
            .any(|text| text.contains("investigation")));
    }
    for disputant in ["alice", "bob"] {
        let user = harness.users.by_username(disputant).await.unwrap();
        assert!(matches!(
            harness.ledger.ballot(investigation, user.id).await,
            Err(tribunal_core::StoreError::NotFound)
        ));
    }
}

#[tokio::test]
async fn evidence_requires_the_escalated_state() {
    let harness = Harness::new();
    harness.register("alice", 1).await;
    harness.register("bob", 2).await;
    harness.register("carol", 3).await;

    let id = harness
        .disputes
        .create(
            NewDispute {
                title: "Race".into(),
                description: "First to the bridge".into(),
                opponent: "bob".into(),
                amount: 50,
                currency: None,
                image: None,
            },
            "alice",
        )
        .await
        .unwrap();

    // Not escalated yet.
    let err = harness
        .evidence
        .provide(proof(id, "alice"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidState(_)));
}

#[tokio::test]
async fn double_submission_from_one_side_is_rejected() {
    let harness = Harness::new();
    let dispute = escalated(&harness, &["carol"]).await;

    harness
        .evidence
        .provide(proof(dispute, "alice"))
        .await
        .unwrap();
    let err = harness
        .evidence
        .provide(proof(dispute, "alice"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidState(_)));
}

#[tokio::test]
async fn evidence_listing_preserves_submission_order() {
    let harness = Harness::new();
    let dispute = escalated(&harness, &["carol"]).await;
    harness
        .evidence
        .provide(proof(dispute, "alice"))
        .await
        .unwrap();
    harness
        .evidence
        .provide(proof(dispute, "bob"))
        .await
        .unwrap();

    let rows = harness.evidence.list(dispute).await.unwrap();
    assert_eq!(rows.len(), 2);
    let alice = harness.users.by_username("alice").await.unwrap();
    assert_eq!(rows[0].user_id, alice.id);
}

// ── Ballot voting ──────────────────────────────────────────────────────

#[tokio::test]
async fn ballot_vote_rewards_juror_and_keeps_investigation_open() {
    let harness = Harness::new();
    let (_, investigation) = investigated(&harness, &["carol", "dave", "erin"]).await;

    assert_eq!(rating_of(&harness, "carol").await, 0);
    harness
        .investigations
        .vote(investigation, "carol", "p1")
        .await
        .unwrap();
    assert_eq!(rating_of(&harness, "carol").await, 1);

    let record = harness.ledger.investigation(investigation).await.unwrap();
    assert_eq!((record.p1, record.p2, record.draw), (1, 0, 0));
    assert_eq!(record.status, InvestigationStatus::Current);

    let carol = harness.users.by_username("carol").await.unwrap();
    let ballot = harness.ledger.ballot(investigation, carol.id).await.unwrap();
    assert_eq!(ballot.result, BallotResult::Sent);
    assert_eq!(ballot.vote, Some(JurorChoice::P1));
}

#[tokio::test]
async fn non_juror_vote_is_not_found() {
    let harness = Harness::new();
    let (_, investigation) = investigated(&harness, &["carol"]).await;

    // Disputants hold no ballot.
    let err = harness
        .investigations
        .vote(investigation, "alice", "p1")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)));
}

#[tokio::test]
async fn revote_is_rejected() {
    let harness = Harness::new();
    let (_, investigation) = investigated(&harness, &["carol", "dave"]).await;

    harness
        .investigations
        .vote(investigation, "carol", "p1")
        .await
        .unwrap();
    let err = harness
        .investigations
        .vote(investigation, "carol", "p2")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidState(_)));

    // The tally saw carol exactly once.
    let record = harness.ledger.investigation(investigation).await.unwrap();
    assert_eq!(record.votes_cast(), 1);
}

// ── Closure ────────────────────────────────────────────────────────────

#[tokio::test]
async fn final_ballot_closes_with_plurality_winner() {
    let harness = Harness::new();
    let (dispute, investigation) =
        investigated(&harness, &["carol", "dave", "erin"]).await;

    harness
        .investigations
        .vote(investigation, "carol", "p1")
        .await
        .unwrap();
    harness
        .investigations
        .vote(investigation, "dave", "p1")
        .await
        .unwrap();
    harness
        .investigations
        .vote(investigation, "erin", "p2")
        .await
        .unwrap();

    let record = harness.ledger.investigation(investigation).await.unwrap();
    assert_eq!(record.status, InvestigationStatus::Passed);
    assert_eq!((record.p1, record.p2, record.draw), (2, 1, 0));

    // Alice submitted evidence first, so "p1" is alice: she wins and may
    // collect; bob loses with nothing to claim.
    let alice_row = participation_of(&harness, dispute, "alice").await;
    assert_eq!(alice_row.status, ParticipationStatus::Passed);
    assert_eq!(alice_row.result, ParticipationResult::Win);
    assert!(alice_row.claim);

    let bob_row = participation_of(&harness, dispute, "bob").await;
    assert_eq!(bob_row.status, ParticipationStatus::Passed);
    assert_eq!(bob_row.result, ParticipationResult::Lose);
    assert!(!bob_row.claim);

    // +1 for voting, +3 for matching the outcome.
    assert_eq!(rating_of(&harness, "carol").await, 4);
    assert_eq!(rating_of(&harness, "dave").await, 4);
    assert_eq!(rating_of(&harness, "erin").await, 1);

    // Ballots are marked by correctness.
    for (name, expected) in [
        ("carol", BallotResult::Correct),
        ("dave", BallotResult::Correct),
        ("erin", BallotResult::Incorrect),
    ] {
        let user = harness.users.by_username(name).await.unwrap();
        let ballot = harness.ledger.ballot(investigation, user.id).await.unwrap();
        assert_eq!(ballot.result, expected, "{name}");
    }

    // Both disputants heard the outcome; correct jurors heard theirs.
    let alice = harness.users.by_username("alice").await.unwrap();
    let bob = harness.users.by_username("bob").await.unwrap();
    assert!(harness
        .notifier
        .texts_for(alice.channel_id)
        .iter()
        .any(|text| text.contains("victory")));
    assert!(harness
        .notifier
        .texts_for(bob.channel_id)
        .iter()
        .any(|text| text.contains("defeat")));
    let carol = harness.users.by_username("carol").await.unwrap();
    assert!(harness
        .notifier
        .texts_for(carol.channel_id)
        .iter()
        .any(|text| text.contains("correctly")));
}

#[tokio::test]
async fn tied_tallies_close_as_draw() {
    let harness = Harness::new();
    let (dispute, investigation) =
        investigated(&harness, &["carol", "dave", "erin"]).await;

    harness
        .investigations
        .vote(investigation, "carol", "p1")
        .await
        .unwrap();
    harness
        .investigations
        .vote(investigation, "dave", "p2")
        .await
        .unwrap();
    // Unknown input counts as a draw vote.
    harness
        .investigations
        .vote(investigation, "erin", "abstain")
        .await
        .unwrap();

    let record = harness.ledger.investigation(investigation).await.unwrap();
    assert_eq!(record.status, InvestigationStatus::Passed);
    assert_eq!((record.p1, record.p2, record.draw), (1, 1, 1));

    for name in ["alice", "bob"] {
        let row = participation_of(&harness, dispute, name).await;
        assert_eq!(row.result, ParticipationResult::Draw);
        assert_eq!(row.status, ParticipationStatus::Passed);
        assert!(row.claim, "both sides may collect on a draw");
    }

    // The outcome is draw, so only the draw voter earns the bonus.
    assert_eq!(rating_of(&harness, "erin").await, 4);
    assert_eq!(rating_of(&harness, "carol").await, 1);
    assert_eq!(rating_of(&harness, "dave").await, 1);
}

#[tokio::test]
async fn closure_happens_exactly_once() {
    let harness = Harness::new();
    let (_, investigation) = investigated(&harness, &["carol"]).await;

    harness
        .investigations
        .vote(investigation, "carol", "draw")
        .await
        .unwrap();
    let record = harness.ledger.investigation(investigation).await.unwrap();
    assert_eq!(record.status, InvestigationStatus::Passed);
    let carol_rating = rating_of(&harness, "carol").await;

    // A retried final vote must fail its ballot precondition rather than
    // re-close and double-apply bonuses.
    let err = harness
        .investigations
        .vote(investigation, "carol", "draw")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidState(_)));
    assert_eq!(rating_of(&harness, "carol").await, carol_rating);
}

#[tokio::test]
async fn unvoted_ballots_are_purged_on_closure() {
    // Purge is exercised at the store level: issue ballots, cast one, and
    // purge the rest.
    let harness = Harness::new();
    let (_, investigation) = investigated(&harness, &["carol", "dave"]).await;

    harness
        .investigations
        .vote(investigation, "carol", "p1")
        .await
        .unwrap();
    let removed = harness.ledger.purge_unvoted(investigation).await.unwrap();
    assert_eq!(removed, 1);

    let dave = harness.users.by_username("dave").await.unwrap();
    assert!(matches!(
        harness.ledger.ballot(investigation, dave.id).await,
        Err(tribunal_core::StoreError::NotFound)
    ));
    let carol = harness.users.by_username("carol").await.unwrap();
    assert!(harness.ledger.ballot(investigation, carol.id).await.is_ok());
}

// ── Juror views ────────────────────────────────────────────────────────

#[tokio::test]
async fn juror_views_carry_their_own_ballot_state() {
    let harness = Harness::new();
    let (_, investigation) = investigated(&harness, &["carol", "dave"]).await;

    harness
        .investigations
        .vote(investigation, "carol", "p2")
        .await
        .unwrap();

    let view = harness
        .investigations
        .get(investigation, "carol")
        .await
        .unwrap();
    assert_eq!(view.ballot_result, BallotResult::Sent);
    assert_eq!(view.ballot_vote, Some(JurorChoice::P2));

    let view = harness
        .investigations
        .get(investigation, "dave")
        .await
        .unwrap();
    assert_eq!(view.ballot_result, BallotResult::New);
    assert!(view.ballot_vote.is_none());
}

#[tokio::test]
async fn investigation_list_filters_by_status() {
    let harness = Harness::new();
    let (_, investigation) = investigated(&harness, &["carol"]).await;

    let open = harness
        .investigations
        .list(
            "carol",
            InvestigationFilter {
                status: Some(InvestigationStatus::Current),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(open.items.len(), 1);

    harness
        .investigations
        .vote(investigation, "carol", "p1")
        .await
        .unwrap();

    let open = harness
        .investigations
        .list(
            "carol",
            InvestigationFilter {
                status: Some(InvestigationStatus::Current),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(open.items.is_empty());

    let passed = harness
        .investigations
        .list(
            "carol",
            InvestigationFilter {
                status: Some(InvestigationStatus::Passed),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(passed.items.len(), 1);
}

// ── Leaderboard ────────────────────────────────────────────────────────

#[tokio::test]
async fn leaderboard_orders_by_rating() {
    let harness = Harness::new();
    let (_, investigation) =
        investigated(&harness, &["carol", "dave", "erin"]).await;

    harness
        .investigations
        .vote(investigation, "carol", "p1")
        .await
        .unwrap();
    harness
        .investigations
        .vote(investigation, "dave", "p1")
        .await
        .unwrap();
    harness
        .investigations
        .vote(investigation, "erin", "draw")
        .await
        .unwrap();

    let top: Vec<User> = harness.users.leaderboard(2).await.unwrap();
    assert_eq!(top.len(), 2);
    assert_eq!(top[0].rating, 4);
    assert_eq!(top[1].rating, 4);
    assert!(top.iter().all(|user| ["carol", "dave"].contains(&user.username.as_str())));
}
