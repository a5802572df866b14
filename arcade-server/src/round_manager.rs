use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{info, warn};
use uuid::Uuid;

use crate::invites::TIMER_OPTIONS;
use crate::progression::ProgressionService;
use arcade_core::{AiOpponent, RoundPhase, WordRound};
use arcade_types::{
    AnswerSet, Category, CustomerId, CustomerRef, GameInvite, Opponent, Progression,
    RoundConclusion,
};

/// What a client needs to render the round screen.
#[derive(Debug, Clone)]
pub struct RoundInfo {
    pub round_id: String,
    pub letter: char,
    pub timer_seconds: u32,
}

#[derive(Debug, Clone)]
pub struct ParticipantResult {
    pub customer: CustomerRef,
    pub score: u32,
    pub opponent_score: u32,
    pub conclusion: RoundConclusion,
    pub opponent_answers: AnswerSet,
    /// `None` when the progression store could not be updated; the round
    /// outcome itself still stands.
    pub progression: Option<Progression>,
}

/// A finished round, with one result per human participant.
#[derive(Debug, Clone)]
pub struct RoundOutcome {
    pub round_id: String,
    pub results: Vec<ParticipantResult>,
}

struct ActiveRound {
    id: String,
    host: CustomerRef,
    round: WordRound,
    deadline: Instant,
    host_submitted: bool,
    guest_submitted: bool,
}

impl ActiveRound {
    fn guest(&self) -> Option<&CustomerRef> {
        match self.round.opponent() {
            Opponent::Human { customer } => Some(customer),
            Opponent::Ai => None,
        }
    }

    fn ready_to_score(&self) -> bool {
        match self.round.opponent() {
            Opponent::Ai => self.host_submitted,
            Opponent::Human { .. } => self.host_submitted && self.guest_submitted,
        }
    }
}

/// Server-authoritative word rounds. The server draws the letter, owns the
/// deadline, scores once both sheets are in, and folds the results into the
/// progression store. Clients only ever submit their own answers.
pub struct RoundManager {
    rounds: RwLock<HashMap<String, ActiveRound>>,
    customer_to_round: RwLock<HashMap<CustomerId, String>>,
    ai: Arc<dyn AiOpponent>,
    progression: Arc<ProgressionService>,
    grace: Duration,
}

impl RoundManager {
    pub fn new(
        ai: Arc<dyn AiOpponent>,
        progression: Arc<ProgressionService>,
        grace: Duration,
    ) -> Self {
        Self {
            rounds: RwLock::new(HashMap::new()),
            customer_to_round: RwLock::new(HashMap::new()),
            ai,
            progression,
            grace,
        }
    }

    pub async fn round_for_customer(&self, customer_id: &str) -> Option<String> {
        let map = self.customer_to_round.read().await;
        map.get(customer_id).cloned()
    }

    pub async fn start_ai_round(
        &self,
        host: CustomerRef,
        timer_seconds: u32,
    ) -> Result<RoundInfo, String> {
        self.start_round(host, Opponent::Ai, timer_seconds).await
    }

    /// Start a round from an accepted invite. The sender becomes the host
    /// side of the score sheet; the distinction is internal, both sides get
    /// their own perspective back.
    pub async fn start_invite_round(&self, invite: &GameInvite) -> Result<RoundInfo, String> {
        self.start_round(
            invite.from.clone(),
            Opponent::Human {
                customer: invite.to.clone(),
            },
            invite.settings.timer_seconds,
        )
        .await
    }

    async fn start_round(
        &self,
        host: CustomerRef,
        opponent: Opponent,
        timer_seconds: u32,
    ) -> Result<RoundInfo, String> {
        if !TIMER_OPTIONS.contains(&timer_seconds) {
            return Err(format!("Invalid timer length: {timer_seconds} seconds"));
        }

        let mut rounds = self.rounds.write().await;
        let mut customer_to_round = self.customer_to_round.write().await;

        if customer_to_round.contains_key(&host.id) {
            return Err(format!("{} is already in a round", host.display_name));
        }
        if let Opponent::Human { customer } = &opponent {
            if customer_to_round.contains_key(&customer.id) {
                return Err(format!("{} is already in a round", customer.display_name));
            }
        }

        let round = WordRound::new(opponent, timer_seconds, &mut rand::rng());
        let round_id = Uuid::new_v4().to_string();
        let info = RoundInfo {
            round_id: round_id.clone(),
            letter: round.letter(),
            timer_seconds,
        };

        customer_to_round.insert(host.id.clone(), round_id.clone());
        if let Opponent::Human { customer } = round.opponent() {
            customer_to_round.insert(customer.id.clone(), round_id.clone());
        }

        info!(
            "Round {} started: letter '{}', {}s, host {}",
            round_id,
            round.letter(),
            timer_seconds,
            host.id
        );

        rounds.insert(
            round_id,
            ActiveRound {
                id: info.round_id.clone(),
                host,
                round,
                deadline: Instant::now() + Duration::from_secs(timer_seconds as u64),
                host_submitted: false,
                guest_submitted: false,
            },
        );

        Ok(info)
    }

    /// Record one participant's finished sheet. Returns the outcome once the
    /// round has everything it needs, `None` while it is still waiting on the
    /// other side.
    pub async fn submit_answers(
        &self,
        customer_id: &str,
        round_id: &str,
        answers: AnswerSet,
    ) -> Result<Option<RoundOutcome>, String> {
        let finished = {
            let mut rounds = self.rounds.write().await;
            let active = rounds
                .get_mut(round_id)
                .ok_or_else(|| format!("Round {round_id} not found"))?;

            if active.host.id == customer_id {
                if active.host_submitted {
                    return Err("Answers already submitted".to_string());
                }
                for category in Category::ALL {
                    let answer = answers.get(category).to_string();
                    active
                        .round
                        .set_answer(category, answer)
                        .map_err(|e| e.to_string())?;
                }
                active.round.stop();
                active.host_submitted = true;
            } else if active.guest().is_some_and(|g| g.id == customer_id) {
                if active.guest_submitted {
                    return Err("Answers already submitted".to_string());
                }
                active.round.receive_opponent_answers(answers);
                active.guest_submitted = true;
            } else {
                return Err(format!("{customer_id} is not part of round {round_id}"));
            }

            if active.ready_to_score() {
                rounds.remove(round_id)
            } else {
                None
            }
        };

        match finished {
            Some(active) => {
                let outcome = self.score_round(active).await;
                Ok(Some(outcome))
            }
            None => Ok(None),
        }
    }

    /// Close out rounds whose deadline plus grace has passed. Sides that
    /// never submitted are scored with a blank sheet.
    pub async fn finish_overdue(&self) -> Vec<RoundOutcome> {
        let overdue = {
            let mut rounds = self.rounds.write().await;
            let expired_ids: Vec<String> = rounds
                .values()
                .filter(|a| a.deadline.elapsed() > self.grace)
                .map(|a| a.id.clone())
                .collect();
            expired_ids
                .into_iter()
                .filter_map(|id| rounds.remove(&id))
                .collect::<Vec<_>>()
        };

        let mut outcomes = Vec::new();
        for mut active in overdue {
            info!("Round {} overdue, scoring with what arrived", active.id);
            active.round.stop();
            if active.guest().is_some() && !active.guest_submitted {
                active.round.receive_opponent_answers(AnswerSet::default());
            }
            outcomes.push(self.score_round(active).await);
        }
        outcomes
    }

    async fn score_round(&self, mut active: ActiveRound) -> RoundOutcome {
        active.round.stop();
        if active.round.opponent().is_ai() && active.round.opponent_answers().is_none() {
            // adapter failures degrade to a blank AI sheet inside the round
            if let Err(e) = active.round.resolve_ai_opponent(self.ai.as_ref()).await {
                warn!("AI resolution failed for round {}: {e:#}", active.id);
            }
        }

        debug_assert_eq!(active.round.phase(), RoundPhase::Scoring);
        let scores = self
            .round_scores(&mut active.round)
            .unwrap_or_else(|| arcade_types::RoundScores { mine: 0, theirs: 0 });

        {
            let mut customer_to_round = self.customer_to_round.write().await;
            customer_to_round.remove(&active.host.id);
            if let Some(guest) = active.guest() {
                customer_to_round.remove(&guest.id);
            }
        }

        let opponent_answers = active.round.opponent_answers().cloned().unwrap_or_default();
        let host_progression = self.apply_score(&active.host.id, scores.mine).await;

        let mut results = vec![ParticipantResult {
            customer: active.host.clone(),
            score: scores.mine,
            opponent_score: scores.theirs,
            conclusion: scores.conclusion(),
            opponent_answers,
            progression: host_progression,
        }];

        if let Some(guest) = active.guest() {
            let flipped = scores.flipped();
            let guest_progression = self.apply_score(&guest.id, flipped.mine).await;
            results.push(ParticipantResult {
                customer: guest.clone(),
                score: flipped.mine,
                opponent_score: flipped.theirs,
                conclusion: flipped.conclusion(),
                opponent_answers: active.round.my_answers().clone(),
                progression: guest_progression,
            });
        }

        info!(
            "Round {} scored {} - {}",
            active.id, scores.mine, scores.theirs
        );

        RoundOutcome {
            round_id: active.id,
            results,
        }
    }

    fn round_scores(&self, round: &mut WordRound) -> Option<arcade_types::RoundScores> {
        round.try_score().or_else(|| round.scores())
    }

    async fn apply_score(&self, customer_id: &str, score: u32) -> Option<Progression> {
        match self.progression.apply_round_score(customer_id, score).await {
            Ok(progression) => Some(progression),
            Err(e) => {
                warn!("Failed to store round score for {customer_id}: {e:#}");
                None
            }
        }
    }

    pub async fn active_round_count(&self) -> usize {
        let rounds = self.rounds.read().await;
        rounds.len()
    }
}
