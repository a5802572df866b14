use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::customer::{CustomerRef, Progression};
use crate::invite::GameInvite;
use crate::word::{AnswerSet, Opponent, RoundConclusion};

/// Messages a customer's client sends over the websocket channel.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum ClientMessage {
    /// Identify (and register on first contact) by phone number.
    Hello {
        customer_id: String,
        display_name: String,
    },
    ListOnline,
    SendInvite {
        to: String,
        timer_seconds: u32,
    },
    AcceptInvite {
        from: String,
    },
    DeclineInvite {
        from: String,
    },
    CancelInvite {
        to: String,
    },
    /// Start a solo round against the AI stand-in, no invite involved.
    StartAiRound {
        timer_seconds: u32,
    },
    SubmitAnswers {
        round_id: String,
        answers: AnswerSet,
    },
    Heartbeat,
}

/// Messages the server pushes back.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum ServerMessage {
    Welcome {
        customer: CustomerRef,
        progression: Progression,
    },
    OnlineCustomers {
        customers: Vec<OnlineCustomer>,
    },
    InviteReceived {
        invite: GameInvite,
    },
    InviteUpdated {
        invite: GameInvite,
    },
    RoundStarted {
        round_id: String,
        letter: char,
        timer_seconds: u32,
        opponent: Opponent,
    },
    RoundFinished {
        round_id: String,
        your_score: u32,
        opponent_score: u32,
        conclusion: RoundConclusion,
        opponent_answers: AnswerSet,
        /// Present when the score was applied to the customer record; absent
        /// if the store was unreachable (the outcome itself still stands).
        progression: Option<Progression>,
    },
    Error {
        message: String,
    },
}

/// Presence entry: enough for the challenge list and its star ratings.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OnlineCustomer {
    pub customer: CustomerRef,
    pub level: u32,
    pub total_score: u32,
}
