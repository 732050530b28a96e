use sagechat_store::{ChatSessionStore, KeyValueStore};
use sagechat_types::{ChatMessage, WireMessage, FAILURE_MESSAGE};
use tracing::{debug, info, warn};

use crate::composer::Composer;
use crate::policy::RetryPolicy;
use crate::ports::{ChatEndpoint, Timer};
use crate::state::{DispatchState, Step, Submission};
use crate::{DispatchError, EndpointError, Rejection};

/// Result of one full submit cycle
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// Nothing was appended or sent
    Rejected(Rejection),
    /// The assistant reply that was appended
    Replied(ChatMessage),
    /// Retries ran out; the failure message that was appended
    GaveUp(ChatMessage),
}

/// Drives submissions through the dispatch state machine.
///
/// Event-loop frontends call [`begin`](Self::begin),
/// [`on_success`](Self::on_success), [`on_failure`](Self::on_failure) and
/// [`resume`](Self::resume) themselves so no borrow of the store is held
/// across an await. Everything else can use [`send`](Self::send).
#[derive(Debug, Clone, Default)]
pub struct Dispatcher {
    policy: RetryPolicy,
    state: DispatchState,
}

impl Dispatcher {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            state: DispatchState::Idle,
        }
    }

    pub fn state(&self) -> &DispatchState {
        &self.state
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn is_busy(&self) -> bool {
        self.state.is_busy()
    }

    /// Accept a submission.
    ///
    /// The user message is appended to the active chat and persisted before
    /// anything is sent, and the composer is cleared.
    pub fn begin<S: KeyValueStore>(
        &mut self,
        store: &mut ChatSessionStore<S>,
        composer: &mut Composer,
    ) -> Result<Submission, DispatchError> {
        let content = composer
            .compose()
            .ok_or(DispatchError::Rejected(Rejection::Empty))?;
        if self.is_busy() {
            debug!("submission rejected while another is in flight");
            return Err(DispatchError::Rejected(Rejection::Busy));
        }

        let chat_id = store.ensure_active_chat()?;
        let user_message = ChatMessage::user(content);
        store.append_messages(&chat_id, [user_message.clone()])?;
        composer.clear();

        let payload: Vec<WireMessage> = store
            .get(&chat_id)
            .map(|h| h.messages.iter().map(ChatMessage::to_wire).collect())
            .unwrap_or_default();

        self.state = DispatchState::Sending { attempt: 1 };
        info!(chat_id = %chat_id, messages = payload.len(), "sending submission");

        Ok(Submission {
            chat_id,
            user_message,
            payload,
            retries: 0,
        })
    }

    /// Record the reply for `submission` in its chat
    pub fn on_success<S: KeyValueStore>(
        &mut self,
        store: &mut ChatSessionStore<S>,
        submission: Submission,
        reply: WireMessage,
    ) -> Result<ChatMessage, DispatchError> {
        // The submission is over even if the reply cannot be persisted.
        self.state = DispatchState::Succeeded;
        let message = ChatMessage::assistant(reply.content);
        store.append_messages(&submission.chat_id, [message.clone()])?;
        info!(
            chat_id = %submission.chat_id,
            attempt = submission.attempt(),
            "assistant reply appended"
        );
        Ok(message)
    }

    /// Decide between another retry and giving up
    pub fn on_failure<S: KeyValueStore>(
        &mut self,
        store: &mut ChatSessionStore<S>,
        mut submission: Submission,
        error: &EndpointError,
    ) -> Result<Step, DispatchError> {
        if submission.retries < self.policy.max_retries {
            submission.retries += 1;
            let delay = self.policy.delay_for(submission.retries);
            warn!(
                chat_id = %submission.chat_id,
                retry = submission.retries,
                ?delay,
                error = %error,
                "send failed, retrying"
            );
            self.state = DispatchState::Retrying {
                retry: submission.retries,
                delay,
            };
            return Ok(Step::Retry { submission, delay });
        }

        warn!(
            chat_id = %submission.chat_id,
            retries = submission.retries,
            error = %error,
            "send failed, giving up"
        );
        self.state = DispatchState::Failed;
        let message = ChatMessage::assistant(FAILURE_MESSAGE);
        store.append_messages(&submission.chat_id, [message.clone()])?;
        Ok(Step::GaveUp(message))
    }

    /// Mark the retry delay as elapsed for `submission`
    pub fn resume(&mut self, submission: &Submission) {
        self.state = DispatchState::Sending {
            attempt: submission.attempt(),
        };
    }

    /// Run one submit cycle to completion
    pub async fn send<S, E, T>(
        &mut self,
        store: &mut ChatSessionStore<S>,
        composer: &mut Composer,
        endpoint: &E,
        timer: &T,
    ) -> Result<DispatchOutcome, DispatchError>
    where
        S: KeyValueStore,
        E: ChatEndpoint + ?Sized,
        T: Timer + ?Sized,
    {
        let mut submission = match self.begin(store, composer) {
            Ok(submission) => submission,
            Err(DispatchError::Rejected(rejection)) => {
                return Ok(DispatchOutcome::Rejected(rejection))
            }
            Err(e) => return Err(e),
        };

        loop {
            match endpoint.send(&submission.payload).await {
                Ok(reply) => {
                    let message = self.on_success(store, submission, reply)?;
                    return Ok(DispatchOutcome::Replied(message));
                }
                Err(error) => match self.on_failure(store, submission, &error)? {
                    Step::Retry {
                        submission: next,
                        delay,
                    } => {
                        timer.sleep(delay).await;
                        self.resume(&next);
                        submission = next;
                    }
                    Step::GaveUp(message) => return Ok(DispatchOutcome::GaveUp(message)),
                },
            }
        }
    }
}
