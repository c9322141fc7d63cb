//! Bridge to the external narrative generator.
//!
//! Generation calls (dialogue, reactions, events, resolutions) are slow
//! and may fail, so they never run on the tick path. Each request is
//! spawned as a tokio task into a [`JoinSet`]; the simulation drains
//! whatever has finished at the start of a later tick and folds it into
//! agent histories or the event book. A failed call resolves to a
//! deterministic fallback line instead of an error.
//!
//! Outside a tokio runtime (plain unit tests, offline tools) requests
//! resolve to their fallback immediately.

use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use tokio::task::JoinSet;
use townsfolk_types::{ActiveEvent, Agent, AgentId, EventId, EventType};
use tracing::warn;

use crate::clock::WorldClock;

/// Text returned when resolution generation fails.
pub const FALLBACK_RESOLUTION: &str = "The event ended without particular consequences.";

/// Errors reported by a [`NarrativeGenerator`].
#[derive(Debug, thiserror::Error)]
pub enum NarrativeError {
    /// No generator backend is configured.
    #[error("narrative generator unavailable")]
    Unavailable,

    /// The backend failed.
    #[error("narrative generation failed: {message}")]
    Generation {
        /// Backend error description.
        message: String,
    },
}

/// Future returned by generator calls.
pub type NarrativeFuture<T> = BoxFuture<'static, Result<T, NarrativeError>>;

/// An external text generator.
///
/// Implementations copy whatever they need out of the borrowed arguments;
/// the returned future must be `'static` so it can run as its own task.
pub trait NarrativeGenerator: Send + Sync {
    /// A short exchange between two agents.
    fn generate_dialogue(&self, speaker: &Agent, listener: &Agent) -> NarrativeFuture<String>;

    /// A new event as raw JSON text, or `None` if nothing happens.
    fn generate_event(&self, agents: &[Agent], clock: &WorldClock) -> NarrativeFuture<Option<String>>;

    /// How an ended event played out.
    fn generate_event_resolution(&self, event: &ActiveEvent, agents: &[Agent]) -> NarrativeFuture<String>;

    /// One agent's reaction to an event.
    fn generate_reaction(&self, agent: &Agent, event: &ActiveEvent) -> NarrativeFuture<String>;
}

/// A generator with no backend: every text call fails (so fallbacks are
/// used) and no events are ever produced.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullNarrator;

impl NarrativeGenerator for NullNarrator {
    fn generate_dialogue(&self, _speaker: &Agent, _listener: &Agent) -> NarrativeFuture<String> {
        Box::pin(async { Err(NarrativeError::Unavailable) })
    }

    fn generate_event(&self, _agents: &[Agent], _clock: &WorldClock) -> NarrativeFuture<Option<String>> {
        Box::pin(async { Ok(None) })
    }

    fn generate_event_resolution(&self, _event: &ActiveEvent, _agents: &[Agent]) -> NarrativeFuture<String> {
        Box::pin(async { Err(NarrativeError::Unavailable) })
    }

    fn generate_reaction(&self, _agent: &Agent, _event: &ActiveEvent) -> NarrativeFuture<String> {
        Box::pin(async { Err(NarrativeError::Unavailable) })
    }
}

/// Fallback dialogue between `speaker` and `listener`.
pub fn fallback_dialogue(speaker: &str, listener: &str) -> String {
    format!("{speaker}: Hello {listener}, how are you today?\n{listener}: Very well {speaker}, thanks for asking!")
}

/// Fallback reaction of `name` to an event of `event_type`.
pub fn fallback_reaction(name: &str, event_type: EventType) -> String {
    format!("{name} takes note of the {event_type}.")
}

/// Generation work queued by decision policies during a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NarrativeRequest {
    /// Two agents started talking.
    Dialogue {
        /// Who opened the conversation.
        speaker: AgentId,
        /// Who was addressed.
        listener: AgentId,
    },
    /// An agent noticed an event it takes part in.
    Reaction {
        /// The reacting agent.
        agent: AgentId,
        /// The event.
        event: EventId,
    },
}

/// A finished generation call.
#[derive(Debug, Clone, PartialEq)]
pub enum NarrativeOutcome {
    /// Dialogue text.
    Dialogue {
        /// Who opened the conversation.
        speaker: AgentId,
        /// Who was addressed.
        listener: AgentId,
        /// The exchange.
        text: String,
    },
    /// Reaction text.
    Reaction {
        /// The reacting agent.
        agent: AgentId,
        /// Kind of event reacted to.
        event_type: EventType,
        /// The reaction.
        text: String,
    },
    /// A generated event payload, not yet validated.
    Event {
        /// Raw JSON text, `None` when the generator declined or failed.
        payload: Option<String>,
    },
    /// Resolution of an ended event.
    Resolution {
        /// The ended event.
        event: ActiveEvent,
        /// How it played out.
        text: String,
    },
}

/// Runs generation calls off the tick path and collects their results.
pub struct NarrativeBridge {
    generator: Arc<dyn NarrativeGenerator>,
    tasks: JoinSet<NarrativeOutcome>,
    ready: Vec<NarrativeOutcome>,
}

impl core::fmt::Debug for NarrativeBridge {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("NarrativeBridge")
            .field("pending", &self.tasks.len())
            .field("ready", &self.ready.len())
            .finish_non_exhaustive()
    }
}

impl NarrativeBridge {
    /// Create a bridge around `generator`.
    pub fn new(generator: Arc<dyn NarrativeGenerator>) -> Self {
        Self {
            generator,
            tasks: JoinSet::new(),
            ready: Vec::new(),
        }
    }

    /// Calls still in flight.
    pub fn pending(&self) -> usize {
        self.tasks.len()
    }

    /// Spawn `task`, or record `fallback` right away when no runtime is
    /// available.
    fn spawn<F>(&mut self, task: F, fallback: Option<NarrativeOutcome>)
    where
        F: Future<Output = NarrativeOutcome> + Send + 'static,
    {
        if tokio::runtime::Handle::try_current().is_ok() {
            self.tasks.spawn(task);
        } else if let Some(outcome) = fallback {
            self.ready.push(outcome);
        }
    }

    /// Ask for a dialogue between two agents.
    pub fn request_dialogue(&mut self, speaker: &Agent, listener: &Agent) {
        let (speaker_id, listener_id) = (speaker.id, listener.id);
        let fallback = fallback_dialogue(&speaker.name, &listener.name);
        let call = self.generator.generate_dialogue(speaker, listener);
        let text_on_error = fallback.clone();
        let task = async move {
            let text = call.await.unwrap_or_else(|e| {
                warn!(error = %e, "Dialogue generation failed, using fallback");
                text_on_error
            });
            NarrativeOutcome::Dialogue {
                speaker: speaker_id,
                listener: listener_id,
                text,
            }
        };
        self.spawn(
            task,
            Some(NarrativeOutcome::Dialogue {
                speaker: speaker_id,
                listener: listener_id,
                text: fallback,
            }),
        );
    }

    /// Ask for `agent`'s reaction to `event`.
    pub fn request_reaction(&mut self, agent: &Agent, event: &ActiveEvent) {
        let (agent_id, event_type) = (agent.id, event.event_type);
        let fallback = fallback_reaction(&agent.name, event_type);
        let call = self.generator.generate_reaction(agent, event);
        let text_on_error = fallback.clone();
        let task = async move {
            let text = call.await.unwrap_or_else(|e| {
                warn!(error = %e, "Reaction generation failed, using fallback");
                text_on_error
            });
            NarrativeOutcome::Reaction {
                agent: agent_id,
                event_type,
                text,
            }
        };
        self.spawn(
            task,
            Some(NarrativeOutcome::Reaction {
                agent: agent_id,
                event_type,
                text: fallback,
            }),
        );
    }

    /// Ask for a new event. Nothing is produced without a runtime.
    pub fn request_event(&mut self, agents: &[Agent], clock: &WorldClock) {
        let call = self.generator.generate_event(agents, clock);
        let task = async move {
            let payload = call.await.unwrap_or_else(|e| {
                warn!(error = %e, "Event generation failed");
                None
            });
            NarrativeOutcome::Event { payload }
        };
        self.spawn(task, None);
    }

    /// Ask how an ended event played out.
    pub fn request_resolution(&mut self, event: ActiveEvent, agents: &[Agent]) {
        let call = self.generator.generate_event_resolution(&event, agents);
        let fallback_event = event.clone();
        let task = async move {
            let text = call.await.unwrap_or_else(|e| {
                warn!(error = %e, "Resolution generation failed, using fallback");
                String::from(FALLBACK_RESOLUTION)
            });
            NarrativeOutcome::Resolution { event, text }
        };
        self.spawn(
            task,
            Some(NarrativeOutcome::Resolution {
                event: fallback_event,
                text: String::from(FALLBACK_RESOLUTION),
            }),
        );
    }

    /// Collect every finished call without waiting.
    pub fn drain_ready(&mut self) -> Vec<NarrativeOutcome> {
        let mut done = core::mem::take(&mut self.ready);
        while let Some(joined) = self.tasks.try_join_next() {
            match joined {
                Ok(outcome) => done.push(outcome),
                Err(e) => warn!(error = %e, "Narrative task failed"),
            }
        }
        done
    }

    /// Wait for every call in flight and collect all results.
    pub async fn settle(&mut self) -> Vec<NarrativeOutcome> {
        let mut done = core::mem::take(&mut self.ready);
        while let Some(joined) = self.tasks.join_next().await {
            match joined {
                Ok(outcome) => done.push(outcome),
                Err(e) => warn!(error = %e, "Narrative task failed"),
            }
        }
        done
    }

    /// Abort everything in flight and forget finished results.
    pub async fn shutdown(&mut self) {
        self.tasks.shutdown().await;
        self.ready.clear();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::{BTreeMap, BTreeSet};

    use townsfolk_types::{Needs, Personality, Position, Profession};

    use super::*;

    /// Answers every call with a fixed line built from the arguments.
    struct EchoNarrator;

    impl NarrativeGenerator for EchoNarrator {
        fn generate_dialogue(&self, speaker: &Agent, listener: &Agent) -> NarrativeFuture<String> {
            let line = format!("{} greets {}", speaker.name, listener.name);
            Box::pin(async move { Ok(line) })
        }

        fn generate_event(&self, agents: &[Agent], _clock: &WorldClock) -> NarrativeFuture<Option<String>> {
            let payload = agents
                .first()
                .map(|a| format!(r#"{{"event_type": "meeting", "involved": ["{}"]}}"#, a.id));
            Box::pin(async move { Ok(payload) })
        }

        fn generate_event_resolution(&self, event: &ActiveEvent, _agents: &[Agent]) -> NarrativeFuture<String> {
            let line = format!("The {} wrapped up.", event.event_type);
            Box::pin(async move { Ok(line) })
        }

        fn generate_reaction(&self, agent: &Agent, _event: &ActiveEvent) -> NarrativeFuture<String> {
            let line = format!("{} shrugs.", agent.name);
            Box::pin(async move { Ok(line) })
        }
    }

    fn make_agent(name: &str) -> Agent {
        Agent::new(
            name,
            25,
            Profession::Artisan,
            Personality::Helpful,
            Needs::uniform(70.0),
            Position::default(),
        )
    }

    fn make_event() -> ActiveEvent {
        ActiveEvent {
            id: EventId::new(),
            event_type: EventType::Wedding,
            description: String::from("Two neighbours marry."),
            involved: Vec::new(),
            started_at: 0,
            duration_minutes: 30,
            impacts: BTreeMap::new(),
            applied_minutes: 0,
            active: true,
            reacted: BTreeSet::new(),
        }
    }

    #[test]
    fn fallback_lines() {
        assert_eq!(
            fallback_dialogue("Ada", "Bram"),
            "Ada: Hello Bram, how are you today?\nBram: Very well Ada, thanks for asking!"
        );
        assert_eq!(fallback_reaction("Ada", EventType::Festival), "Ada takes note of the festival.");
    }

    #[test]
    fn without_runtime_fallbacks_are_ready_immediately() {
        let mut bridge = NarrativeBridge::new(Arc::new(EchoNarrator));
        let (a, b) = (make_agent("Ada"), make_agent("Bram"));
        bridge.request_dialogue(&a, &b);
        bridge.request_event(&[a.clone()], &WorldClock::default());
        assert_eq!(bridge.pending(), 0);

        let done = bridge.drain_ready();
        assert_eq!(done.len(), 1);
        assert!(matches!(
            done.first(),
            Some(NarrativeOutcome::Dialogue { text, .. }) if text.starts_with("Ada: Hello Bram")
        ));
    }

    #[tokio::test]
    async fn generated_text_is_collected() {
        let mut bridge = NarrativeBridge::new(Arc::new(EchoNarrator));
        let (a, b) = (make_agent("Ada"), make_agent("Bram"));
        bridge.request_dialogue(&a, &b);
        bridge.request_reaction(&b, &make_event());
        bridge.request_event(&[a.clone()], &WorldClock::default());

        let done = bridge.settle().await;
        assert_eq!(done.len(), 3);
        assert!(done.iter().any(|o| matches!(o, NarrativeOutcome::Dialogue { text, .. } if text == "Ada greets Bram")));
        assert!(done.iter().any(|o| matches!(o, NarrativeOutcome::Reaction { text, .. } if text == "Bram shrugs.")));
        assert!(done.iter().any(|o| matches!(o, NarrativeOutcome::Event { payload: Some(_) })));
        assert_eq!(bridge.pending(), 0);
    }

    #[tokio::test]
    async fn failures_fall_back() {
        let mut bridge = NarrativeBridge::new(Arc::new(NullNarrator));
        let a = make_agent("Ada");
        let event = make_event();
        bridge.request_reaction(&a, &event);
        bridge.request_resolution(event.clone(), &[a.clone()]);
        bridge.request_event(&[a], &WorldClock::default());

        let done = bridge.settle().await;
        assert_eq!(done.len(), 3);
        assert!(done.contains(&NarrativeOutcome::Resolution {
            event,
            text: String::from(FALLBACK_RESOLUTION),
        }));
        assert!(done.iter().any(|o| matches!(o, NarrativeOutcome::Reaction { text, .. } if text == "Ada takes note of the wedding.")));
        assert!(done.contains(&NarrativeOutcome::Event { payload: None }));
    }
}
