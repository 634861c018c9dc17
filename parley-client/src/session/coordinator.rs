use parley_core::{CandidateInit, PeerId, SignalError};

/// Negotiation phase of one peer session.
///
/// `OfferReceived` and `AnswerReceived` are held while the session is in the
/// middle of executing the corresponding step; the per-session event queue
/// guarantees no other event is processed until the step settles and the
/// session reports completion via [`NegotiationCoordinator::answer_sent`] or
/// [`NegotiationCoordinator::answer_applied`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationState {
    Idle,
    OfferSent,
    OfferReceived,
    AnswerSent,
    AnswerReceived,
    Stable,
    Closed,
}

/// One observed event, local or remote.
#[derive(Debug)]
pub enum NegotiationEvent {
    LocalOfferRequested,
    RemoteOffer { sdp: String },
    RemoteAnswer { sdp: String },
    RemoteCandidate { candidate: CandidateInit },
    EngineConnected,
}

/// The single legal reaction to an event in the current state.
#[derive(Debug, PartialEq)]
pub enum Step {
    /// Generate a local offer, set it locally, send OFFER.
    SendOffer,
    /// Apply the remote offer, generate an answer, send ANSWER.
    SendAnswer { remote_sdp: String },
    /// Apply the remote answer; the session becomes stable afterwards.
    ApplyAnswer { remote_sdp: String },
    /// Remote description is set; hand the candidate to the engine now.
    ApplyCandidate { candidate: CandidateInit },
    /// Engine cannot take candidates yet; hold it in arrival order.
    BufferCandidate { candidate: CandidateInit },
    /// Connection is up; flush anything still buffered.
    EnterStable,
    /// Legal no-op. The reason is for the log line only.
    Ignore(&'static str),
}

/// Per-peer negotiation state machine.
///
/// Pure decision logic: every (state, event) pair maps to exactly one
/// [`Step`]. Engine and transport effects are executed by the owning session,
/// which reports async completions back so the in-flight states resolve.
pub struct NegotiationCoordinator {
    local_id: PeerId,
    peer_id: PeerId,
    state: NegotiationState,
}

impl NegotiationCoordinator {
    pub fn new(local_id: PeerId, peer_id: PeerId) -> Self {
        Self {
            local_id,
            peer_id,
            state: NegotiationState::Idle,
        }
    }

    pub fn state(&self) -> NegotiationState {
        self.state
    }

    /// Glare tie-break: the lexicographically smaller identity keeps its
    /// offer. Symmetric on both peers, so a simultaneous-offer pair always
    /// converges without extra coordination.
    fn holds_glare_priority(&self) -> bool {
        self.local_id < self.peer_id
    }

    pub fn handle(&mut self, event: NegotiationEvent) -> Result<Step, SignalError> {
        use NegotiationEvent as Ev;
        use NegotiationState as St;

        if self.state == St::Closed {
            return match event {
                Ev::RemoteCandidate { .. } => Ok(Step::Ignore("candidate for closed session")),
                Ev::EngineConnected => Ok(Step::Ignore("engine event for closed session")),
                _ => Err(SignalError::SessionClosed),
            };
        }

        let step = match (self.state, event) {
            (St::Idle | St::Stable, Ev::LocalOfferRequested) => {
                self.state = St::OfferSent;
                Step::SendOffer
            }
            (_, Ev::LocalOfferRequested) => Step::Ignore("already negotiating"),

            (St::Idle | St::Stable, Ev::RemoteOffer { sdp }) => {
                self.state = St::OfferReceived;
                Step::SendAnswer { remote_sdp: sdp }
            }
            (St::OfferSent, Ev::RemoteOffer { sdp }) => {
                if self.holds_glare_priority() {
                    Step::Ignore("glare: local offer holds priority")
                } else {
                    // Discard our pending offer and answer theirs instead.
                    self.state = St::OfferReceived;
                    Step::SendAnswer { remote_sdp: sdp }
                }
            }
            (_, Ev::RemoteOffer { .. }) => Step::Ignore("duplicate offer"),

            (St::OfferSent, Ev::RemoteAnswer { sdp }) => {
                self.state = St::AnswerReceived;
                Step::ApplyAnswer { remote_sdp: sdp }
            }
            (St::Idle, Ev::RemoteAnswer { .. }) => Step::Ignore("stale answer"),
            (_, Ev::RemoteAnswer { .. }) => Step::Ignore("answer out of turn"),

            (St::AnswerSent | St::Stable, Ev::RemoteCandidate { candidate }) => {
                Step::ApplyCandidate { candidate }
            }
            (_, Ev::RemoteCandidate { candidate }) => Step::BufferCandidate { candidate },

            (St::OfferSent | St::AnswerSent | St::AnswerReceived, Ev::EngineConnected) => {
                self.state = St::Stable;
                Step::EnterStable
            }
            (_, Ev::EngineConnected) => Step::Ignore("connection report out of turn"),
        };
        Ok(step)
    }

    /// The answer produced for a remote offer went out.
    pub fn answer_sent(&mut self) {
        if self.state == NegotiationState::OfferReceived {
            self.state = NegotiationState::AnswerSent;
        }
    }

    /// The remote answer was applied to the engine.
    pub fn answer_applied(&mut self) {
        if self.state == NegotiationState::AnswerReceived {
            self.state = NegotiationState::Stable;
        }
    }

    /// Session-fatal failure or deliberate shutdown. Terminal.
    pub fn close(&mut self) {
        self.state = NegotiationState::Closed;
    }
}
