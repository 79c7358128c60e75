use fr_core::EntityId;
use glam::Vec3;
use serde::Serialize;

/// What kind of simulation event occurred.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SimEventKind {
    // Movement
    /// A robot was given a new movement target.
    MoveStarted {
        /// The robot that will move.
        robot: EntityId,
        /// Where it is heading.
        destination: Vec3,
    },
    /// A robot reached its movement target.
    Arrived {
        /// The robot that arrived.
        robot: EntityId,
    },

    // Observability
    /// A robot perceived an entity for the first time.
    Revealed {
        /// The observing robot.
        robot: EntityId,
        /// The revealed entity.
        entity: EntityId,
    },

    // Actions
    /// A robot equipped an extinguisher.
    Equipped {
        /// The robot.
        robot: EntityId,
    },
    /// A robot put out every fire in its field of view.
    FiresExtinguished {
        /// The robot.
        robot: EntityId,
        /// The fires that were put out, possibly none.
        fires: Vec<EntityId>,
    },
    /// A robot picked something up.
    Picked {
        /// The robot.
        robot: EntityId,
        /// The picked entity.
        item: EntityId,
    },
    /// A pick was out of reach and turned into a move.
    PickDeferred {
        /// The robot.
        robot: EntityId,
        /// The entity it is moving toward.
        item: EntityId,
    },
    /// A robot put down what it held.
    Dropped {
        /// The robot.
        robot: EntityId,
        /// The dropped entity.
        item: EntityId,
    },
    /// A held entity was delivered and consumed.
    Delivered {
        /// The robot.
        robot: EntityId,
        /// The consumed entity.
        item: EntityId,
        /// The delivery target.
        to: EntityId,
    },
    /// A survivor was brought to the safe zone.
    Rescued {
        /// The robot.
        robot: EntityId,
        /// The rescued survivor.
        survivor: EntityId,
    },
    /// A rescue found no survivor in view.
    NoSurvivorInView {
        /// The robot.
        robot: EntityId,
    },

    // Dynamics
    /// A fire spawned in a room.
    FireSpawned {
        /// The new fire.
        fire: EntityId,
        /// The room it spawned in.
        room: EntityId,
    },
    /// An obstacle drifted.
    ObstacleNudged {
        /// The obstacle.
        obstacle: EntityId,
        /// The horizontal offset applied.
        offset: Vec3,
    },
    /// Dynamics were suspended.
    DynamicsSuspended {
        /// Length of the window in seconds.
        seconds: f64,
    },
    /// A suspension window ended.
    DynamicsResumed {
        /// The restored enabled flag.
        enabled: bool,
    },
    /// Dynamics were reconfigured.
    DynamicsConfigured {
        /// Periodic spawning on or off.
        enabled: bool,
        /// Step-coupled changes on or off.
        on_step: bool,
        /// Seconds between periodic spawns.
        interval: f64,
    },

    // Commands
    /// A command was rejected without changing the world.
    CommandRejected {
        /// The robot the command was addressed to, as given.
        robot: String,
        /// The action name, as given.
        action: String,
        /// Why it was rejected.
        reason: String,
    },
}

impl SimEventKind {
    /// Check whether a given entity is involved in this event.
    pub fn involves(&self, id: &str) -> bool {
        match self {
            Self::MoveStarted { robot, .. }
            | Self::Arrived { robot }
            | Self::Equipped { robot }
            | Self::NoSurvivorInView { robot } => robot.as_str() == id,
            Self::Revealed { robot, entity } => robot.as_str() == id || entity.as_str() == id,
            Self::Picked { robot, item }
            | Self::PickDeferred { robot, item }
            | Self::Dropped { robot, item } => robot.as_str() == id || item.as_str() == id,
            Self::Delivered { robot, item, to } => {
                robot.as_str() == id || item.as_str() == id || to.as_str() == id
            }
            Self::Rescued { robot, survivor } => robot.as_str() == id || survivor.as_str() == id,
            Self::FiresExtinguished { robot, fires } => {
                robot.as_str() == id || fires.iter().any(|f| f.as_str() == id)
            }
            Self::FireSpawned { fire, room } => fire.as_str() == id || room.as_str() == id,
            Self::ObstacleNudged { obstacle, .. } => obstacle.as_str() == id,
            Self::CommandRejected { robot, .. } => robot == id,
            Self::DynamicsSuspended { .. }
            | Self::DynamicsResumed { .. }
            | Self::DynamicsConfigured { .. } => false,
        }
    }
}

/// A record of something that happened during simulation.
#[derive(Debug, Clone, Serialize)]
pub struct SimEvent {
    /// The simulation tick when this event occurred.
    pub tick: u64,
    /// The specific kind of event that occurred.
    pub kind: SimEventKind,
    /// A human-readable description of the event.
    pub description: String,
}

impl SimEvent {
    /// Create a new simulation event with the given tick, kind, and description.
    pub fn new(tick: u64, kind: SimEventKind, description: impl Into<String>) -> Self {
        Self {
            tick,
            kind,
            description: description.into(),
        }
    }
}

/// Accumulates events during a simulation run.
#[derive(Debug, Default)]
pub struct EventLog {
    events: Vec<SimEvent>,
    max_events: usize,
}

impl EventLog {
    /// Create a new event log with the given maximum capacity (0 = unlimited).
    pub fn new(max_events: usize) -> Self {
        Self {
            events: Vec::new(),
            max_events,
        }
    }

    /// Append an event, dropping the oldest events if the log exceeds its capacity.
    pub fn push(&mut self, event: SimEvent) {
        self.events.push(event);
        if self.max_events > 0 && self.events.len() > self.max_events {
            let drain_count = self.events.len() - self.max_events;
            self.events.drain(..drain_count);
        }
    }

    /// Return a slice of all recorded events.
    pub fn events(&self) -> &[SimEvent] {
        &self.events
    }

    /// Return all events that occurred at the given tick.
    pub fn events_at_tick(&self, tick: u64) -> Vec<&SimEvent> {
        self.events.iter().filter(|e| e.tick == tick).collect()
    }

    /// Return all events involving the given entity.
    pub fn events_for_entity(&self, id: &str) -> Vec<&SimEvent> {
        self.events.iter().filter(|e| e.kind.involves(id)).collect()
    }

    /// The most recent event, if any.
    pub fn last(&self) -> Option<&SimEvent> {
        self.events.last()
    }

    /// Return the number of recorded events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Return `true` if no events have been recorded.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Remove all recorded events.
    pub fn clear(&mut self) {
        self.events.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arrived(robot: &str) -> SimEventKind {
        SimEventKind::Arrived {
            robot: robot.into(),
        }
    }

    #[test]
    fn event_log_push_and_query() {
        let mut log = EventLog::new(0);
        log.push(SimEvent::new(1, arrived("robot1"), "test"));
        assert_eq!(log.len(), 1);
        assert_eq!(log.events_at_tick(1).len(), 1);
        assert_eq!(log.events_for_entity("robot1").len(), 1);
        assert!(log.events_for_entity("robot2").is_empty());
    }

    #[test]
    fn event_log_max_events_trims() {
        let mut log = EventLog::new(2);
        for i in 0..5 {
            log.push(SimEvent::new(i, arrived("robot1"), "test"));
        }
        assert_eq!(log.len(), 2);
        // Oldest events were dropped, newest remain
        assert_eq!(log.events()[0].tick, 3);
        assert_eq!(log.events()[1].tick, 4);
    }

    #[test]
    fn event_kind_involves_entity() {
        let kind = SimEventKind::Delivered {
            robot: "robot1".into(),
            item: "Kit1".into(),
            to: "Surv1".into(),
        };
        assert!(kind.involves("robot1"));
        assert!(kind.involves("Kit1"));
        assert!(kind.involves("Surv1"));
        assert!(!kind.involves("robot2"));

        let kind = SimEventKind::FiresExtinguished {
            robot: "robot1".into(),
            fires: vec!["Fire1".into(), "Fire2".into()],
        };
        assert!(kind.involves("Fire2"));
        assert!(!kind.involves("Fire3"));

        let kind = SimEventKind::DynamicsSuspended { seconds: 1.0 };
        assert!(!kind.involves("robot1"));
    }

    #[test]
    fn event_log_clear() {
        let mut log = EventLog::new(0);
        log.push(SimEvent::new(1, arrived("robot1"), "test"));
        assert!(!log.is_empty());
        log.clear();
        assert!(log.is_empty());
        assert!(log.last().is_none());
    }

    #[test]
    fn event_log_multi_tick_filtering() {
        let mut log = EventLog::new(0);
        log.push(SimEvent::new(1, arrived("robot1"), "r1 arrived"));
        log.push(SimEvent::new(
            1,
            SimEventKind::FireSpawned {
                fire: "Fire2".into(),
                room: "Room1".into(),
            },
            "fire",
        ));
        log.push(SimEvent::new(2, arrived("robot2"), "r2 arrived"));

        assert_eq!(log.events_at_tick(1).len(), 2);
        assert_eq!(log.events_at_tick(2).len(), 1);
        assert_eq!(log.events_at_tick(3).len(), 0);
        assert_eq!(log.events_for_entity("Room1").len(), 1);
        assert_eq!(log.last().unwrap().description, "r2 arrived");
    }

    #[test]
    fn event_serializes_with_tag() {
        let event = SimEvent::new(3, arrived("robot1"), "done");
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"]["event"], "arrived");
        assert_eq!(json["kind"]["robot"], "robot1");
    }
}
