//! Behavior tree evaluator and the fixed-priority policy built on it.
//!
//! The tree is a plain interpreter over four node kinds:
//!
//! - [`Sequence`] -- children in order until one does not succeed
//! - [`Selector`] -- children in order until one does not fail
//! - [`Condition`] -- a predicate over the agent and its context
//! - [`Action`] -- a side-effecting step
//!
//! Every leaf resolves within the tick. [`BehaviorStatus::Running`] exists
//! for custom nodes but none of the shipped ones produce it. Slow work
//! (dialogue, reactions) is queued as a [`NarrativeRequest`] and completes
//! on a later tick.

use townsfolk_agents::describe_activity;
use townsfolk_types::{Activity, Agent, AgentId, BuildingType, Need, Service};
use tracing::debug;

use crate::config::{BehaviorThresholds, DecisionConfig};
use crate::decision::{DecisionContext, DecisionOutcome, DecisionPolicy, head_to};
use crate::movement::NeedBump;
use crate::narrative::NarrativeRequest;

/// Social gain from starting a conversation.
const CONVERSATION_SOCIAL_GAIN: f64 = 20.0;

/// Diversion gain from a stroll outdoors.
const STROLL_DIVERSION_GAIN: f64 = 5.0;

/// Result of ticking a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BehaviorStatus {
    /// The node achieved its goal.
    Success,
    /// The node could not act.
    Failure,
    /// The node needs more ticks.
    Running,
}

/// A node of a behavior tree.
pub trait BehaviorNode: Send + Sync {
    /// Evaluate the node for `agent`.
    fn tick(&self, agent: &mut Agent, ctx: &mut DecisionContext<'_>) -> BehaviorStatus;
}

/// Runs children in order, stopping at the first that does not succeed.
pub struct Sequence {
    children: Vec<Box<dyn BehaviorNode>>,
}

impl Sequence {
    /// Create a sequence.
    pub fn new(children: Vec<Box<dyn BehaviorNode>>) -> Self {
        Self { children }
    }
}

impl BehaviorNode for Sequence {
    fn tick(&self, agent: &mut Agent, ctx: &mut DecisionContext<'_>) -> BehaviorStatus {
        for child in &self.children {
            let status = child.tick(agent, ctx);
            if status != BehaviorStatus::Success {
                return status;
            }
        }
        BehaviorStatus::Success
    }
}

/// Runs children in order, stopping at the first that does not fail.
pub struct Selector {
    children: Vec<Box<dyn BehaviorNode>>,
}

impl Selector {
    /// Create a selector.
    pub fn new(children: Vec<Box<dyn BehaviorNode>>) -> Self {
        Self { children }
    }
}

impl BehaviorNode for Selector {
    fn tick(&self, agent: &mut Agent, ctx: &mut DecisionContext<'_>) -> BehaviorStatus {
        for child in &self.children {
            let status = child.tick(agent, ctx);
            if status != BehaviorStatus::Failure {
                return status;
            }
        }
        BehaviorStatus::Failure
    }
}

type Predicate = Box<dyn Fn(&Agent, &DecisionContext<'_>) -> bool + Send + Sync>;
type Step = Box<dyn Fn(&mut Agent, &mut DecisionContext<'_>) -> BehaviorStatus + Send + Sync>;

/// Succeeds when its predicate holds.
pub struct Condition {
    predicate: Predicate,
}

impl Condition {
    /// Wrap a predicate.
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&Agent, &DecisionContext<'_>) -> bool + Send + Sync + 'static,
    {
        Self {
            predicate: Box::new(predicate),
        }
    }
}

impl BehaviorNode for Condition {
    fn tick(&self, agent: &mut Agent, ctx: &mut DecisionContext<'_>) -> BehaviorStatus {
        if (self.predicate)(agent, ctx) {
            BehaviorStatus::Success
        } else {
            BehaviorStatus::Failure
        }
    }
}

/// Performs a step and reports its status.
pub struct Action {
    step: Step,
}

impl Action {
    /// Wrap a step.
    pub fn new<F>(step: F) -> Self
    where
        F: Fn(&mut Agent, &mut DecisionContext<'_>) -> BehaviorStatus + Send + Sync + 'static,
    {
        Self { step: Box::new(step) }
    }
}

impl BehaviorNode for Action {
    fn tick(&self, agent: &mut Agent, ctx: &mut DecisionContext<'_>) -> BehaviorStatus {
        (self.step)(agent, ctx)
    }
}

/// Fixed-priority policy.
///
/// In order: react to an unseen event, serve the first critical need
/// (hunger, fatigue, social, diversion), follow the schedule or chat with
/// someone nearby or do whatever the current building offers (a stroll
/// when outside), and finally wander off to a training ground.
pub struct BehaviorTreePolicy {
    root: Selector,
}

impl BehaviorTreePolicy {
    /// Build the tree from `config`.
    pub fn new(config: &DecisionConfig) -> Self {
        let thresholds = config.behavior;
        let bump = config.critical_bump;
        let root = Selector::new(vec![
            Box::new(Action::new(react_to_event)),
            Box::new(critical_needs(thresholds, bump)),
            Box::new(Selector::new(vec![
                Box::new(Sequence::new(vec![
                    Box::new(Condition::new(|agent, ctx| {
                        agent.schedule.get(&ctx.clock.hour()) == Some(&Activity::Work)
                    })),
                    Box::new(Action::new(|agent, ctx| {
                        serve_or_seek(agent, ctx, Service::Commerce, None, Activity::Work)
                    })),
                ])),
                Box::new(Sequence::new(vec![
                    Box::new(Condition::new(|agent, ctx| conversation_partner(agent, ctx).is_some())),
                    Box::new(Action::new(converse)),
                ])),
                Box::new(Action::new(passive_activity)),
            ])),
            Box::new(Action::new(|agent, ctx| {
                serve_or_seek(agent, ctx, Service::Training, None, Activity::Leisure)
            })),
        ]);
        Self { root }
    }
}

impl DecisionPolicy for BehaviorTreePolicy {
    fn name(&self) -> &'static str {
        "behavior_tree"
    }

    fn decide(&self, agent: &mut Agent, ctx: &mut DecisionContext<'_>) -> DecisionOutcome {
        let status = self.root.tick(agent, ctx);
        if ctx.movement.is_moving(agent.id) {
            DecisionOutcome::Moving
        } else {
            match status {
                BehaviorStatus::Success | BehaviorStatus::Running => DecisionOutcome::Acted,
                BehaviorStatus::Failure => DecisionOutcome::Failed,
            }
        }
    }
}

/// The critical-need branch: the first need below its threshold, in
/// declared order, sends the agent to the matching service.
fn critical_needs(thresholds: BehaviorThresholds, amount: f64) -> Selector {
    let branch = |is_critical: fn(&Agent, &BehaviorThresholds) -> bool,
                  service: Service,
                  need: Need,
                  activity: Activity|
     -> Box<dyn BehaviorNode> {
        let bump = NeedBump { need, amount };
        Box::new(Sequence::new(vec![
            Box::new(Condition::new(move |agent, _ctx| is_critical(agent, &thresholds))),
            Box::new(Action::new(move |agent, ctx| {
                serve_or_seek(agent, ctx, service, Some(bump), activity)
            })),
        ]))
    };

    Selector::new(vec![
        branch(
            |a, t| a.needs.hunger.value() < t.hunger,
            Service::Meal,
            Need::Hunger,
            Activity::Meal,
        ),
        branch(
            |a, t| a.needs.fatigue.value() < t.fatigue || a.needs.energy.value() < t.energy,
            Service::Rest,
            Need::Fatigue,
            Activity::Rest,
        ),
        branch(
            |a, t| a.needs.social.value() < t.social,
            Service::Drink,
            Need::Social,
            Activity::Social,
        ),
        branch(
            |a, t| a.needs.diversion.value() < t.diversion,
            Service::Commerce,
            Need::Diversion,
            Activity::Leisure,
        ),
    ])
}

/// React once to the newest event the agent has not seen yet.
fn react_to_event(agent: &mut Agent, ctx: &mut DecisionContext<'_>) -> BehaviorStatus {
    let Some((event_id, event_type)) = ctx
        .events
        .next_unreacted(agent.id)
        .map(|e| (e.id, e.event_type))
    else {
        return BehaviorStatus::Failure;
    };
    if !ctx.events.mark_reacted(event_id, agent.id) {
        return BehaviorStatus::Failure;
    }
    ctx.narrative.push(NarrativeRequest::Reaction {
        agent: agent.id,
        event: event_id,
    });
    debug!(agent_id = %agent.id, event_id = %event_id, "Reacting to event");
    agent.record(format!("{} hears about the {event_type}.", agent.name));
    BehaviorStatus::Success
}

/// Use `service` where the agent stands, or head for the nearest open
/// building offering it.
fn serve_or_seek(
    agent: &mut Agent,
    ctx: &mut DecisionContext<'_>,
    service: Service,
    bump: Option<NeedBump>,
    activity: Activity,
) -> BehaviorStatus {
    let served_here = agent
        .building_id()
        .and_then(|id| ctx.buildings.get(id))
        .is_some_and(|b| b.offers(service));
    if served_here {
        if let Some(bump) = bump {
            agent.needs.adjust(bump.need, bump.amount);
        }
        set_activity(agent, activity, ctx.clock.total_minutes());
        return BehaviorStatus::Success;
    }

    let hour = ctx.clock.hour();
    let Some(target) = ctx
        .buildings
        .nearest_open_offering(service, agent.position(), hour)
        .map(|b| b.id)
    else {
        debug!(agent_id = %agent.id, service = %service, "No open building offers service");
        return BehaviorStatus::Failure;
    };
    match head_to(agent, target, bump, ctx) {
        Ok(_) => {
            agent.status.activity = activity;
            debug!(agent_id = %agent.id, service = %service, building_id = %target, "Heading out");
            BehaviorStatus::Success
        }
        Err(e) => {
            debug!(agent_id = %agent.id, building_id = %target, error = %e, "Building unreachable");
            BehaviorStatus::Failure
        }
    }
}

/// The closest stationary agent within talking range: same building, or
/// both outside within the conversation radius.
fn conversation_partner(agent: &Agent, ctx: &DecisionContext<'_>) -> Option<AgentId> {
    let radius = ctx.config.conversation_radius;
    let here = agent.position();
    ctx.others
        .values()
        .filter(|other| other.id != agent.id && !ctx.movement.is_moving(other.id))
        .filter(|other| match (agent.building_id(), other.building_id()) {
            (Some(a), Some(b)) => a == b,
            (None, None) => here.distance_to(other.position()) <= radius,
            _ => false,
        })
        .min_by(|a, b| {
            here.distance_to(a.position())
                .total_cmp(&here.distance_to(b.position()))
        })
        .map(|other| other.id)
}

fn converse(agent: &mut Agent, ctx: &mut DecisionContext<'_>) -> BehaviorStatus {
    let Some(partner) = conversation_partner(agent, ctx) else {
        return BehaviorStatus::Failure;
    };
    let partner_name = ctx
        .others
        .get(&partner)
        .map_or_else(String::new, |p| p.name.clone());
    agent.needs.adjust(Need::Social, CONVERSATION_SOCIAL_GAIN);
    agent.status.activity = Activity::Social;
    ctx.narrative.push(NarrativeRequest::Dialogue {
        speaker: agent.id,
        listener: partner,
    });
    debug!(agent_id = %agent.id, partner = %partner, "Conversation started");
    agent.record(format!("{} strikes up a conversation with {partner_name}.", agent.name));
    BehaviorStatus::Success
}

/// Whatever the current building offers, or a stroll outdoors. Fails only
/// inside a building the registry no longer knows.
fn passive_activity(agent: &mut Agent, ctx: &mut DecisionContext<'_>) -> BehaviorStatus {
    let Some(building_id) = agent.building_id() else {
        agent.needs.adjust(Need::Diversion, STROLL_DIVERSION_GAIN);
        set_activity(agent, Activity::Leisure, ctx.clock.total_minutes());
        debug!(agent_id = %agent.id, "Strolling outside");
        return BehaviorStatus::Success;
    };
    let Some(building) = ctx.buildings.get(building_id) else {
        return BehaviorStatus::Failure;
    };
    let own_home = agent.home == Some(building.id);
    let (gains, activity): (&[(Need, f64)], Option<Activity>) = match building.building_type {
        BuildingType::Restaurant => (&[(Need::Hunger, 40.0)], Some(Activity::Meal)),
        BuildingType::Residence if own_home => (&[(Need::Energy, 10.0)], Some(Activity::Rest)),
        BuildingType::Residence => (&[(Need::Social, 10.0)], Some(Activity::Social)),
        BuildingType::Park | BuildingType::Library => (&[(Need::Diversion, 15.0)], Some(Activity::Leisure)),
        BuildingType::Shop | BuildingType::Market => (&[(Need::Diversion, 10.0)], Some(Activity::Leisure)),
        BuildingType::Office | BuildingType::Factory => (&[], Some(Activity::Work)),
        BuildingType::Bar | BuildingType::Tavern => {
            (&[(Need::Social, 15.0), (Need::Diversion, 10.0)], Some(Activity::Social))
        }
        BuildingType::Forge | BuildingType::Temple | BuildingType::Barracks => (&[], None),
    };

    let Some(activity) = activity else {
        debug!(agent_id = %agent.id, building = %building.name, "Idling");
        return BehaviorStatus::Success;
    };
    for (need, amount) in gains {
        agent.needs.adjust(*need, *amount);
    }
    set_activity(agent, activity, ctx.clock.total_minutes());
    BehaviorStatus::Success
}

/// Switch activity, writing a history line only when it changes.
fn set_activity(agent: &mut Agent, activity: Activity, variant: u64) {
    if agent.status.activity == activity {
        return;
    }
    agent.status.activity = activity;
    let line = describe_activity(&agent.name, activity, variant);
    agent.record(line);
}
