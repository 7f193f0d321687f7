//! # Verdict Rules
//!
//! The two pure decision rules of the arbitration system, decoupled from
//! persistence so they can be tested exhaustively:
//!
//! - [`resolve_claims`] — the four-quadrant resolution of two self-reported
//!   boolean claims ("I won").
//! - [`plurality`] — the strict-plurality tally rule for investigation
//!   outcomes.
//!
//! The engines call these to decide, then apply the decision as a
//! side-effecting step.

use crate::investigation::JurorChoice;

/// Outcome of applying a voter's claim against the opponent's state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteOutcome {
    /// The opponent has not voted yet; the claim is recorded and the
    /// dispute stays open.
    Recorded,
    /// Both parties conceded: the dispute ends even.
    Draw,
    /// The opponent conceded and the voter claims victory: the opponent
    /// loses.
    OpponentLoses,
    /// The opponent claims victory and the voter concedes: the voter
    /// loses.
    VoterLoses,
    /// Both parties claim victory: escalate to evidence collection.
    Escalated,
}

/// Resolve a dispute vote.
///
/// The negotiation is a symmetric two-bit protocol — each party's claim is
/// the boolean "I won" — so once both claims are known the outcome is a
/// deterministic function of the quadrant:
///
/// | opponent claim | voter claim | outcome         |
/// |----------------|-------------|-----------------|
/// | lost           | lost        | draw            |
/// | lost           | won         | opponent loses  |
/// | won            | lost        | voter loses     |
/// | won            | won         | escalate        |
///
/// No other inputs affect the result.
pub fn resolve_claims(opponent_has_voted: bool, opponent_claim: bool, voter_claim: bool) -> VoteOutcome {
    if !opponent_has_voted {
        return VoteOutcome::Recorded;
    }
    match (opponent_claim, voter_claim) {
        (false, false) => VoteOutcome::Draw,
        (false, true) => VoteOutcome::OpponentLoses,
        (true, false) => VoteOutcome::VoterLoses,
        (true, true) => VoteOutcome::Escalated,
    }
}

/// Determine an investigation's outcome from its final tallies.
///
/// This is a plurality rule, not a majority rule: a bucket wins by being
/// strictly greater than *both* others, which can happen with well under
/// half the votes. Any tie at the top — including a three-way tie — is a
/// draw.
pub fn plurality(p1: i32, p2: i32, draw: i32) -> JurorChoice {
    if p1 > p2 && p1 > draw {
        JurorChoice::P1
    } else if p2 > p1 && p2 > draw {
        JurorChoice::P2
    } else {
        JurorChoice::Draw
    }
}
