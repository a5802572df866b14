use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::invites::InviteBoard;
use crate::progression::ProgressionService;
use crate::round_manager::{RoundManager, RoundOutcome};
use crate::websocket::connection::{ConnectionId, ConnectionManager};
use arcade_types::{
    AnswerSet, ClientMessage, CustomerRef, GameInvite, InviteStatus, OnlineCustomer, Opponent,
    ServerMessage,
};

#[derive(Clone)]
pub struct MessageHandler {
    connection_id: ConnectionId,
    connection_manager: Arc<ConnectionManager>,
    invite_board: Arc<InviteBoard>,
    round_manager: Arc<RoundManager>,
    progression: Arc<ProgressionService>,
    restaurant_id: String,
}

impl MessageHandler {
    pub fn new(
        connection_id: ConnectionId,
        connection_manager: Arc<ConnectionManager>,
        invite_board: Arc<InviteBoard>,
        round_manager: Arc<RoundManager>,
        progression: Arc<ProgressionService>,
        restaurant_id: String,
    ) -> Self {
        Self {
            connection_id,
            connection_manager,
            invite_board,
            round_manager,
            progression,
            restaurant_id,
        }
    }

    pub async fn handle_message(&self, message: ClientMessage) -> Result<(), String> {
        self.connection_manager
            .update_activity(self.connection_id)
            .await;

        match message {
            ClientMessage::Hello {
                customer_id,
                display_name,
            } => self.handle_hello(customer_id, display_name).await,
            ClientMessage::ListOnline => self.handle_list_online().await,
            ClientMessage::SendInvite { to, timer_seconds } => {
                self.handle_send_invite(to, timer_seconds).await
            }
            ClientMessage::AcceptInvite { from } => self.handle_accept_invite(from).await,
            ClientMessage::DeclineInvite { from } => self.handle_decline_invite(from).await,
            ClientMessage::CancelInvite { to } => self.handle_cancel_invite(to).await,
            ClientMessage::StartAiRound { timer_seconds } => {
                self.handle_start_ai_round(timer_seconds).await
            }
            ClientMessage::SubmitAnswers { round_id, answers } => {
                self.handle_submit_answers(round_id, answers).await
            }
            ClientMessage::Heartbeat => Ok(()),
        }
    }

    pub async fn handle_disconnect(&self) {
        let Some(connection) = self
            .connection_manager
            .get_connection(self.connection_id)
            .await
        else {
            return;
        };
        let Some(customer) = connection.customer else {
            return;
        };

        info!("Customer {} disconnected", customer.id);

        // Open invites in either direction die with the connection; the
        // round sweeper deals with any round still running.
        let cancelled = self.invite_board.cancel_involving(&customer.id).await;
        for invite in cancelled {
            if let Some(other) = invite.opponent_of(&customer.id) {
                let _ = self
                    .connection_manager
                    .send_to_customer(&other.id, ServerMessage::InviteUpdated { invite: invite.clone() })
                    .await;
            }
        }
    }

    async fn handle_hello(&self, customer_id: String, display_name: String) -> Result<(), String> {
        let customer_id = customer_id.trim().to_string();
        let display_name = display_name.trim().to_string();
        if customer_id.is_empty() || display_name.is_empty() {
            return self
                .send_error("A phone number and a display name are required")
                .await;
        }

        let customer = match self
            .progression
            .register(&customer_id, &display_name, &self.restaurant_id)
            .await
        {
            Ok(customer) => customer,
            Err(e) => {
                warn!("Registration failed for {customer_id}: {e:#}");
                return self.send_error("Registration failed").await;
            }
        };

        let customer_ref = CustomerRef::from(&customer);
        if let Err(e) = self
            .connection_manager
            .identify_connection(self.connection_id, customer_ref.clone())
            .await
        {
            return self.send_error(&e).await;
        }

        info!(
            "Connection {} identified as {} ({})",
            self.connection_id, customer.display_name, customer.id
        );

        self.send_message(ServerMessage::Welcome {
            customer: customer_ref,
            progression: customer.progression,
        })
        .await?;

        // Re-deliver anything still waiting on this customer's answer.
        for invite in self.invite_board.pending_for(&customer.id).await {
            self.send_message(ServerMessage::InviteReceived { invite })
                .await?;
        }
        Ok(())
    }

    async fn handle_list_online(&self) -> Result<(), String> {
        let Some(me) = self.identified_customer().await else {
            return Ok(());
        };

        let mut customers = Vec::new();
        for customer in self.connection_manager.online_customers().await {
            if customer.id == me.id {
                continue;
            }
            let progression = self
                .progression
                .get_progression(&customer.id)
                .await
                .ok()
                .flatten()
                .unwrap_or_default();
            customers.push(OnlineCustomer {
                customer,
                level: progression.level,
                total_score: progression.total_score,
            });
        }

        self.send_message(ServerMessage::OnlineCustomers { customers })
            .await
    }

    async fn handle_send_invite(&self, to: String, timer_seconds: u32) -> Result<(), String> {
        let Some(me) = self.identified_customer().await else {
            return Ok(());
        };

        let target = self
            .connection_manager
            .online_customers()
            .await
            .into_iter()
            .find(|c| c.id == to);
        let Some(target) = target else {
            // they may have just walked out; nothing to tell the sender
            debug!("Invite from {} to offline customer {}", me.id, to);
            return Ok(());
        };

        match self.invite_board.send_invite(me, target, timer_seconds).await {
            Ok(invite) => {
                let _ = self
                    .connection_manager
                    .send_to_customer(
                        &invite.to.id,
                        ServerMessage::InviteReceived {
                            invite: invite.clone(),
                        },
                    )
                    .await;
                self.send_message(ServerMessage::InviteUpdated { invite })
                    .await
            }
            Err(e) => self.send_error(&e.to_string()).await,
        }
    }

    async fn handle_accept_invite(&self, from: String) -> Result<(), String> {
        let Some(me) = self.identified_customer().await else {
            return Ok(());
        };

        let invite = match self
            .invite_board
            .resolve(&from, &me.id, InviteStatus::Accepted)
            .await
        {
            Ok(invite) => invite,
            Err(e) => return self.send_error(&e.to_string()).await,
        };

        self.notify_both_sides(&invite).await;

        match self.round_manager.start_invite_round(&invite).await {
            Ok(info) => {
                let _ = self
                    .connection_manager
                    .send_to_customer(
                        &invite.from.id,
                        ServerMessage::RoundStarted {
                            round_id: info.round_id.clone(),
                            letter: info.letter,
                            timer_seconds: info.timer_seconds,
                            opponent: Opponent::Human {
                                customer: invite.to.clone(),
                            },
                        },
                    )
                    .await;
                self.send_message(ServerMessage::RoundStarted {
                    round_id: info.round_id,
                    letter: info.letter,
                    timer_seconds: info.timer_seconds,
                    opponent: Opponent::Human {
                        customer: invite.from.clone(),
                    },
                })
                .await
            }
            Err(e) => self.send_error(&e).await,
        }
    }

    async fn handle_decline_invite(&self, from: String) -> Result<(), String> {
        let Some(me) = self.identified_customer().await else {
            return Ok(());
        };

        match self
            .invite_board
            .resolve(&from, &me.id, InviteStatus::Declined)
            .await
        {
            Ok(invite) => {
                self.notify_both_sides(&invite).await;
                Ok(())
            }
            Err(e) => self.send_error(&e.to_string()).await,
        }
    }

    async fn handle_cancel_invite(&self, to: String) -> Result<(), String> {
        let Some(me) = self.identified_customer().await else {
            return Ok(());
        };

        match self
            .invite_board
            .resolve(&me.id, &to, InviteStatus::Cancelled)
            .await
        {
            Ok(invite) => {
                self.notify_both_sides(&invite).await;
                Ok(())
            }
            Err(e) => self.send_error(&e.to_string()).await,
        }
    }

    async fn handle_start_ai_round(&self, timer_seconds: u32) -> Result<(), String> {
        let Some(me) = self.identified_customer().await else {
            return Ok(());
        };

        match self.round_manager.start_ai_round(me, timer_seconds).await {
            Ok(info) => {
                self.send_message(ServerMessage::RoundStarted {
                    round_id: info.round_id,
                    letter: info.letter,
                    timer_seconds: info.timer_seconds,
                    opponent: Opponent::Ai,
                })
                .await
            }
            Err(e) => self.send_error(&e).await,
        }
    }

    async fn handle_submit_answers(
        &self,
        round_id: String,
        answers: AnswerSet,
    ) -> Result<(), String> {
        let Some(me) = self.identified_customer().await else {
            return Ok(());
        };

        match self
            .round_manager
            .submit_answers(&me.id, &round_id, answers)
            .await
        {
            Ok(Some(outcome)) => {
                deliver_outcome(&self.connection_manager, outcome).await;
                Ok(())
            }
            Ok(None) => Ok(()),
            Err(e) => self.send_error(&e).await,
        }
    }

    /// The customer behind this connection. An unidentified client gets an
    /// error message back but keeps its connection; it may simply not have
    /// said hello yet.
    async fn identified_customer(&self) -> Option<CustomerRef> {
        let connection = self
            .connection_manager
            .get_connection(self.connection_id)
            .await?;

        match connection.customer {
            Some(customer) => Some(customer),
            None => {
                let _ = self.send_error("Say hello first").await;
                None
            }
        }
    }

    async fn notify_both_sides(&self, invite: &GameInvite) {
        let message = ServerMessage::InviteUpdated {
            invite: invite.clone(),
        };
        let _ = self
            .connection_manager
            .send_to_customer(&invite.from.id, message.clone())
            .await;
        let _ = self
            .connection_manager
            .send_to_customer(&invite.to.id, message)
            .await;
    }

    async fn send_message(&self, message: ServerMessage) -> Result<(), String> {
        self.connection_manager
            .send_to_connection(self.connection_id, message)
            .await
    }

    async fn send_error(&self, message: &str) -> Result<(), String> {
        self.send_message(ServerMessage::Error {
            message: message.to_string(),
        })
        .await
    }
}

/// Push one finished round's results out, each participant seeing their own
/// side of the sheet. Offline participants just miss the message.
pub async fn deliver_outcome(connection_manager: &ConnectionManager, outcome: RoundOutcome) {
    for result in outcome.results {
        let message = ServerMessage::RoundFinished {
            round_id: outcome.round_id.clone(),
            your_score: result.score,
            opponent_score: result.opponent_score,
            conclusion: result.conclusion,
            opponent_answers: result.opponent_answers,
            progression: result.progression,
        };
        if let Err(e) = connection_manager
            .send_to_customer(&result.customer.id, message)
            .await
        {
            debug!(
                "Could not deliver round result to {}: {}",
                result.customer.id, e
            );
        }
    }
}
