//! Narrative events: registration, gradual need impacts, and expiry.
//!
//! Generated events arrive as loosely structured JSON text.
//! [`parse_event_payload`] recovers what it can (direct parse, fenced code
//! block, trailing commas) and drops agent ids the simulation does not
//! know. A payload naming no known agent is rejected outright, so no
//! partial event is ever registered.
//!
//! [`EventBook::apply_impacts`] spreads each event's need deltas over its
//! duration: after `m` of `d` in-world minutes exactly `m / d` of every
//! delta has been applied, no matter how the minutes were split across
//! ticks.

use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

use serde::Deserialize;
use townsfolk_types::{ActiveEvent, Agent, AgentId, EventId, EventType, Need};
use tracing::{debug, info};

/// Impact deltas beyond this magnitude are clamped.
const MAX_IMPACT: f64 = 100.0;

/// Errors from turning generated text into an [`ActiveEvent`].
#[derive(Debug, thiserror::Error)]
pub enum EventPayloadError {
    /// No recovery strategy produced valid JSON of the expected shape.
    #[error("unparsable event payload: {reason}")]
    Unparsable {
        /// Last parser error.
        reason: String,
    },

    /// The event type is not one the simulation knows.
    #[error("unknown event type: {0}")]
    UnknownType(String),

    /// None of the named agents exist.
    #[error("event involves no known agent")]
    NoKnownAgents,
}

/// Shape of a generated event before validation.
#[derive(Debug, Deserialize)]
struct RawEventPayload {
    #[serde(alias = "type")]
    event_type: String,
    #[serde(default)]
    description: String,
    #[serde(default, alias = "agents", alias = "involved_agents")]
    involved: Vec<String>,
    #[serde(default = "default_duration", alias = "duration")]
    duration_minutes: u64,
    #[serde(default, alias = "need_impacts")]
    impacts: BTreeMap<String, BTreeMap<String, f64>>,
}

const fn default_duration() -> u64 {
    60
}

/// Parse generated event text into an event starting at world minute
/// `started_at`.
///
/// `is_known` decides which agent ids survive. Unknown need names and
/// impacts on agents outside the involved set are dropped.
///
/// # Errors
///
/// See [`EventPayloadError`].
pub fn parse_event_payload<F>(raw: &str, started_at: u64, is_known: F) -> Result<ActiveEvent, EventPayloadError>
where
    F: Fn(AgentId) -> bool,
{
    let payload = try_parse(raw)?;
    let event_type = EventType::from_name(&payload.event_type)
        .ok_or_else(|| EventPayloadError::UnknownType(payload.event_type.clone()))?;

    let mut involved: Vec<AgentId> = Vec::new();
    for name in &payload.involved {
        match AgentId::from_str(name.trim()) {
            Ok(id) if is_known(id) && !involved.contains(&id) => involved.push(id),
            Ok(_) | Err(_) => debug!(agent = %name, "Dropping unknown agent from event payload"),
        }
    }
    if involved.is_empty() {
        return Err(EventPayloadError::NoKnownAgents);
    }

    let mut impacts: BTreeMap<AgentId, BTreeMap<Need, f64>> = BTreeMap::new();
    for (agent, deltas) in &payload.impacts {
        let Ok(agent_id) = AgentId::from_str(agent.trim()) else {
            continue;
        };
        if !involved.contains(&agent_id) {
            continue;
        }
        let parsed: BTreeMap<Need, f64> = deltas
            .iter()
            .filter(|(_, delta)| delta.is_finite())
            .filter_map(|(name, delta)| {
                Need::from_name(name).map(|need| (need, delta.clamp(-MAX_IMPACT, MAX_IMPACT)))
            })
            .collect();
        if !parsed.is_empty() {
            impacts.insert(agent_id, parsed);
        }
    }

    let description = if payload.description.trim().is_empty() {
        format!("A {event_type} takes place.")
    } else {
        payload.description
    };

    Ok(ActiveEvent {
        id: EventId::new(),
        event_type,
        description,
        involved,
        started_at,
        duration_minutes: payload.duration_minutes,
        impacts,
        applied_minutes: 0,
        active: true,
        reacted: BTreeSet::new(),
    })
}

/// Attempt to parse the payload through multiple recovery strategies.
fn try_parse(raw: &str) -> Result<RawEventPayload, EventPayloadError> {
    let trimmed = raw.trim();

    // Strategy 1: direct parse
    let direct_err = match serde_json::from_str::<RawEventPayload>(trimmed) {
        Ok(parsed) => return Ok(parsed),
        Err(e) => e,
    };

    // Strategy 2: extract from markdown code block
    let block = extract_json_from_codeblock(trimmed);
    if let Some(json_str) = block
        && let Ok(parsed) = serde_json::from_str::<RawEventPayload>(json_str)
    {
        return Ok(parsed);
    }

    // Strategy 3: strip trailing commas, from the block if there is one
    let cleaned = strip_trailing_commas(block.unwrap_or(trimmed));
    serde_json::from_str::<RawEventPayload>(&cleaned).map_err(|e| EventPayloadError::Unparsable {
        reason: format!("{direct_err}; after cleanup: {e}"),
    })
}

/// Pull the body out of a fenced code block.
fn extract_json_from_codeblock(text: &str) -> Option<&str> {
    let fence = text.find("```")?;
    let after_fence = text.get(fence.checked_add(3)?..)?;
    // Skip an optional language tag on the opening line.
    let body_start = after_fence.find('\n').and_then(|nl| nl.checked_add(1)).unwrap_or(0);
    let body = after_fence.get(body_start..)?;
    let end = body.find("```")?;
    body.get(..end).map(str::trim)
}

/// Strip trailing commas before closing braces and brackets.
fn strip_trailing_commas(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut result = String::with_capacity(text.len());
    for (i, c) in chars.iter().enumerate() {
        if *c == ',' {
            let next = chars
                .iter()
                .skip(i.saturating_add(1))
                .find(|n| !n.is_whitespace());
            if matches!(next, Some('}' | ']')) {
                continue;
            }
        }
        result.push(*c);
    }
    result
}

/// The set of running events.
#[derive(Debug, Clone, Default)]
pub struct EventBook {
    active: BTreeMap<EventId, ActiveEvent>,
    max_active: usize,
}

impl EventBook {
    /// Create an empty book holding at most `max_active` events.
    pub fn new(max_active: usize) -> Self {
        Self {
            active: BTreeMap::new(),
            max_active,
        }
    }

    /// Add an event. Returns `false` (and drops the event) if the book is
    /// full.
    pub fn register(&mut self, event: ActiveEvent) -> bool {
        if self.is_full() {
            debug!(event_type = %event.event_type, "Event book full, dropping event");
            return false;
        }
        info!(
            event_id = %event.id,
            event_type = %event.event_type,
            involved = event.involved.len(),
            duration_minutes = event.duration_minutes,
            "Event registered"
        );
        self.active.insert(event.id, event);
        true
    }

    /// Whether no more events fit.
    pub fn is_full(&self) -> bool {
        self.active.len() >= self.max_active
    }

    /// Number of running events.
    pub fn len(&self) -> usize {
        self.active.len()
    }

    /// Whether nothing is running.
    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Look up an event.
    pub fn get(&self, id: EventId) -> Option<&ActiveEvent> {
        self.active.get(&id)
    }

    /// Every running event.
    pub fn active(&self) -> impl Iterator<Item = &ActiveEvent> {
        self.active.values()
    }

    /// The most recently started event involving `agent_id` that the agent
    /// has not reacted to yet.
    pub fn next_unreacted(&self, agent_id: AgentId) -> Option<&ActiveEvent> {
        self.active
            .values()
            .filter(|e| e.active && e.involves(agent_id) && !e.reacted.contains(&agent_id))
            .max_by_key(|e| e.started_at)
    }

    /// Remember that `agent_id` reacted to `event_id`. Returns `false` if
    /// the event is gone or the agent already reacted.
    pub fn mark_reacted(&mut self, event_id: EventId, agent_id: AgentId) -> bool {
        self.active
            .get_mut(&event_id)
            .is_some_and(|e| e.reacted.insert(agent_id))
    }

    /// Apply the slice of every event's impacts due by world minute `now`,
    /// then remove and return the events that have run their course.
    ///
    /// The final slice of an ending event is applied before it is removed.
    /// Each involved agent gets one history entry per event, on the first
    /// applied slice.
    pub fn apply_impacts(&mut self, now: u64, agents: &mut BTreeMap<AgentId, Agent>) -> Vec<ActiveEvent> {
        let mut ended = Vec::new();
        for event in self.active.values_mut() {
            let elapsed = event.elapsed(now);
            let slice = elapsed.saturating_sub(event.applied_minutes);
            let instantaneous = event.duration_minutes == 0;

            if slice > 0 || instantaneous {
                let fraction = if instantaneous {
                    1.0
                } else {
                    slice as f64 / event.duration_minutes as f64
                };
                let first_slice = event.applied_minutes == 0;
                for (agent_id, deltas) in &event.impacts {
                    let Some(agent) = agents.get_mut(agent_id) else {
                        continue;
                    };
                    for (need, delta) in deltas {
                        agent.needs.adjust(*need, delta * fraction);
                    }
                    if first_slice {
                        agent.record(format!(
                            "{} is caught up in the {}: {}",
                            agent.name, event.event_type, event.description
                        ));
                    }
                }
                event.applied_minutes = elapsed;
            }

            if event.is_over(now) {
                event.active = false;
                ended.push(event.id);
            }
        }
        ended
            .into_iter()
            .filter_map(|id| self.active.remove(&id))
            .inspect(|e| info!(event_id = %e.id, event_type = %e.event_type, "Event ended"))
            .collect()
    }

    /// Stop `agent_id` from taking part in any event.
    pub fn forget_agent(&mut self, agent_id: AgentId) {
        for event in self.active.values_mut() {
            event.involved.retain(|id| *id != agent_id);
            event.impacts.remove(&agent_id);
        }
    }

    /// Drop every event.
    pub fn clear(&mut self) {
        self.active.clear();
    }
}
