use std::fmt;

use fr_core::geometry::horizontal_distance;
use fr_core::{EntityId, EntityKind};
use glam::Vec3;

use crate::collision::CollisionResolver;
use crate::context::SimContext;
use crate::error::{SimError, SimResult};
use crate::event::SimEventKind;
use crate::observability::{is_visible, visible_of_kind};

/// Step direction relative to the robot's heading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Along the heading.
    Forward,
    /// Against the heading.
    Back,
    /// To the robot's left.
    Left,
    /// To the robot's right.
    Right,
}

impl Direction {
    /// Parse the suffix of a `move_<direction>` action.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "forward" => Some(Self::Forward),
            "back" => Some(Self::Back),
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            _ => None,
        }
    }

    /// The name used in action strings.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Forward => "forward",
            Self::Back => "back",
            Self::Left => "left",
            Self::Right => "right",
        }
    }

    /// Unit vector for this direction given a heading.
    pub fn vector(self, pose: &fr_core::Pose) -> Vec3 {
        match self {
            Self::Forward => pose.forward(),
            Self::Back => -pose.forward(),
            Self::Left => -pose.right(),
            Self::Right => pose.right(),
        }
    }
}

/// A parsed command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// `move_<direction>`: one collision-checked step.
    Move(Direction),
    /// `move`: head for an entity's current position.
    MoveTo(EntityId),
    /// `pick_extinguisher`
    PickExtinguisher,
    /// `extinguish_all_fov`, also accepted as `extinguish_fire`.
    ExtinguishAllInFov,
    /// `pick`
    Pick(EntityId),
    /// `drop`
    Drop,
    /// `deliver`
    Deliver(EntityId),
    /// `rescue_fov`
    RescueInFov,
}

impl Action {
    /// Interpret an action name and its target argument.
    ///
    /// Actions that take no target ignore it.
    pub fn parse(name: &str, target: &str) -> SimResult<Self> {
        let target_id = || {
            if target.is_empty() {
                Err(SimError::MissingTarget(name.to_string()))
            } else {
                Ok(EntityId::new(target))
            }
        };

        if let Some(dir) = name.strip_prefix("move_") {
            return Direction::parse(dir)
                .map(Self::Move)
                .ok_or_else(|| SimError::UnknownAction(name.to_string()));
        }
        match name {
            "move" => Ok(Self::MoveTo(target_id()?)),
            "pick_extinguisher" => Ok(Self::PickExtinguisher),
            "extinguish_all_fov" | "extinguish_fire" => Ok(Self::ExtinguishAllInFov),
            "pick" => Ok(Self::Pick(target_id()?)),
            "drop" => Ok(Self::Drop),
            "deliver" => Ok(Self::Deliver(target_id()?)),
            "rescue_fov" => Ok(Self::RescueInFov),
            _ => Err(SimError::UnknownAction(name.to_string())),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Move(dir) => write!(f, "move_{}", dir.as_str()),
            Self::MoveTo(id) => write!(f, "move({id})"),
            Self::PickExtinguisher => write!(f, "pick_extinguisher"),
            Self::ExtinguishAllInFov => write!(f, "extinguish_all_fov"),
            Self::Pick(id) => write!(f, "pick({id})"),
            Self::Drop => write!(f, "drop"),
            Self::Deliver(id) => write!(f, "deliver({id})"),
            Self::RescueInFov => write!(f, "rescue_fov"),
        }
    }
}

/// What a command did.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// A movement target was set. `blocked_by` names the obstacle that
    /// rejected a directional step, in which case the robot stays put.
    MoveStarted {
        /// Where the robot is headed.
        destination: Vec3,
        /// Obstacle that stopped a directional step.
        blocked_by: Option<EntityId>,
    },
    /// The robot now carries an extinguisher.
    Equipped,
    /// Every listed fire was deactivated. Also reports an automatic equip.
    Extinguished {
        /// Fires put out, in registration order.
        fires: Vec<EntityId>,
        /// The robot was unequipped and equipped itself first.
        auto_equipped: bool,
    },
    /// The item is now held.
    Picked {
        /// The held item.
        item: EntityId,
    },
    /// The item was out of reach; the robot is moving toward it instead.
    PickDeferred {
        /// The item to pick on arrival.
        item: EntityId,
        /// The item's position.
        destination: Vec3,
    },
    /// The held item was put down.
    Dropped {
        /// The released item.
        item: EntityId,
        /// Where it landed.
        at: Vec3,
    },
    /// The held item was handed over and consumed.
    Delivered {
        /// The consumed item.
        item: EntityId,
        /// The recipient.
        to: EntityId,
    },
    /// The target was out of reach; the robot is moving toward it instead.
    DeliverDeferred {
        /// The recipient.
        to: EntityId,
        /// The recipient's position.
        destination: Vec3,
    },
    /// A survivor was carried to the safe zone.
    Rescued {
        /// The rescued survivor.
        survivor: EntityId,
        /// Where the survivor was set down.
        at: Vec3,
    },
    /// `rescue_fov` found nobody to rescue.
    NoSurvivorInView,
    /// Nothing changed.
    Rejected(SimError),
}

impl Outcome {
    /// Whether the command was refused.
    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }

    /// Whether the outcome is a move issued in place of a pick or deliver.
    /// The caller has to repeat the command once the robot has arrived.
    pub fn is_deferred(&self) -> bool {
        matches!(self, Self::PickDeferred { .. } | Self::DeliverDeferred { .. })
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MoveStarted {
                destination,
                blocked_by: None,
            } => write!(f, "moving to ({:.1}, {:.1})", destination.x, destination.z),
            Self::MoveStarted {
                blocked_by: Some(obstacle),
                ..
            } => write!(f, "blocked by {obstacle}"),
            Self::Equipped => write!(f, "extinguisher equipped"),
            Self::Extinguished { fires, .. } => write!(f, "extinguished {} fire(s)", fires.len()),
            Self::Picked { item } => write!(f, "picked {item}"),
            Self::PickDeferred { item, .. } => write!(f, "moving toward {item} to pick it"),
            Self::Dropped { item, .. } => write!(f, "dropped {item}"),
            Self::Delivered { item, to } => write!(f, "delivered {item} to {to}"),
            Self::DeliverDeferred { to, .. } => write!(f, "moving toward {to} to deliver"),
            Self::Rescued { survivor, .. } => write!(f, "rescued {survivor} to the safe zone"),
            Self::NoSurvivorInView => write!(f, "no survivor in view"),
            Self::Rejected(err) => write!(f, "rejected: {err}"),
        }
    }
}

/// Turns commands into registry mutations.
///
/// Every precondition is checked before anything is written, so an `Err`
/// leaves the world exactly as it was.
#[derive(Debug, Clone)]
pub struct ActionExecutor {
    resolver: CollisionResolver,
}

impl ActionExecutor {
    /// Executor that checks steps with `resolver`.
    pub fn new(resolver: CollisionResolver) -> Self {
        Self { resolver }
    }

    /// The collision resolver used for directional steps.
    pub fn resolver(&self) -> &CollisionResolver {
        &self.resolver
    }

    /// Run `action` for `robot` to completion against the current world.
    ///
    /// Movement is only initiated here; the movement system carries it out
    /// over the following ticks.
    pub fn execute(
        &self,
        ctx: &mut SimContext<'_>,
        robot: &EntityId,
        action: &Action,
    ) -> SimResult<Outcome> {
        if ctx.world.robot(robot.as_str()).is_err() {
            return Err(SimError::UnknownRobot(robot.to_string()));
        }
        match action {
            Action::Move(dir) => self.step(ctx, robot, *dir),
            Action::MoveTo(target) => {
                let destination = self.target_position(ctx, target)?;
                self.go_to(ctx, robot, destination)?;
                Ok(Outcome::MoveStarted {
                    destination,
                    blocked_by: None,
                })
            }
            Action::PickExtinguisher => {
                ctx.world.set_equipped(robot.as_str(), true)?;
                tracing::info!(%robot, "extinguisher equipped");
                ctx.emit(
                    SimEventKind::Equipped {
                        robot: robot.clone(),
                    },
                    format!("{robot} equipped an extinguisher"),
                );
                Ok(Outcome::Equipped)
            }
            Action::ExtinguishAllInFov => self.extinguish(ctx, robot),
            Action::Pick(item) => self.pick(ctx, robot, item),
            Action::Drop => self.drop_held(ctx, robot),
            Action::Deliver(to) => self.deliver(ctx, robot, to),
            Action::RescueInFov => self.rescue(ctx, robot),
        }
    }

    fn step(&self, ctx: &mut SimContext<'_>, robot: &EntityId, dir: Direction) -> SimResult<Outcome> {
        let pose = ctx.world.pose(robot.as_str())?;
        let delta = dir.vector(&pose) * ctx.config.step_length;
        let resolution = self.resolver.resolve_detailed(ctx.world, pose.position, delta);
        let destination = Vec3::new(
            resolution.position.x,
            pose.position.y,
            resolution.position.z,
        );
        if let Some(obstacle) = &resolution.blocked_by {
            tracing::info!(%robot, %obstacle, direction = dir.as_str(), "step blocked");
        }
        self.go_to(ctx, robot, destination)?;
        Ok(Outcome::MoveStarted {
            destination,
            blocked_by: resolution.blocked_by,
        })
    }

    fn go_to(&self, ctx: &mut SimContext<'_>, robot: &EntityId, destination: Vec3) -> SimResult<()> {
        ctx.world.set_target(robot.as_str(), Some(destination))?;
        tracing::debug!(%robot, ?destination, "movement target set");
        ctx.emit(
            SimEventKind::MoveStarted {
                robot: robot.clone(),
                destination,
            },
            format!(
                "{robot} heads for ({:.1}, {:.1})",
                destination.x, destination.z
            ),
        );
        Ok(())
    }

    /// Live position of an active entity, or `UnknownTarget`.
    fn target_position(&self, ctx: &SimContext<'_>, target: &EntityId) -> SimResult<Vec3> {
        match ctx.world.get_active(target.as_str()) {
            Ok(_) => Ok(ctx.world.position_of(target.as_str())?),
            Err(_) => Err(SimError::UnknownTarget(target.to_string())),
        }
    }

    fn extinguish(&self, ctx: &mut SimContext<'_>, robot: &EntityId) -> SimResult<Outcome> {
        let fires = visible_of_kind(ctx.world, robot.as_str(), EntityKind::Fire)?;

        let auto_equipped = !ctx.world.robot(robot.as_str())?.equipped;
        if auto_equipped {
            ctx.world.set_equipped(robot.as_str(), true)?;
            tracing::info!(%robot, "auto-equipped extinguisher");
        }
        for fire in &fires {
            ctx.world.deactivate(fire.as_str())?;
        }
        tracing::info!(%robot, count = fires.len(), "extinguished fires in view");
        ctx.emit(
            SimEventKind::FiresExtinguished {
                robot: robot.clone(),
                fires: fires.clone(),
            },
            format!("{robot} extinguished {} fire(s)", fires.len()),
        );
        Ok(Outcome::Extinguished {
            fires,
            auto_equipped,
        })
    }

    fn pick(&self, ctx: &mut SimContext<'_>, robot: &EntityId, item: &EntityId) -> SimResult<Outcome> {
        let state = ctx.world.robot(robot.as_str())?;
        if let Some(held) = &state.holding {
            return Err(SimError::HandsFull {
                robot: robot.clone(),
                held: held.clone(),
            });
        }
        let entity = ctx
            .world
            .get_active(item.as_str())
            .map_err(|_| SimError::UnknownTarget(item.to_string()))?;
        if !entity.kind.is_carriable() {
            return Err(SimError::NotCarriable {
                id: item.clone(),
                kind: entity.kind,
            });
        }
        if let Some(by) = &entity.carried_by {
            return Err(SimError::AlreadyCarried {
                id: item.clone(),
                by: by.clone(),
            });
        }

        let robot_pos = ctx.world.position_of(robot.as_str())?;
        let item_pos = entity.position;
        if horizontal_distance(robot_pos, item_pos) > ctx.config.interaction_radius {
            self.go_to(ctx, robot, item_pos)?;
            tracing::info!(%robot, %item, "out of reach, moving closer before picking");
            ctx.emit(
                SimEventKind::PickDeferred {
                    robot: robot.clone(),
                    item: item.clone(),
                },
                format!("{robot} moves toward {item} to pick it"),
            );
            return Ok(Outcome::PickDeferred {
                item: item.clone(),
                destination: item_pos,
            });
        }

        ctx.world.attach(robot.as_str(), item.as_str())?;
        tracing::info!(%robot, %item, "picked");
        ctx.emit(
            SimEventKind::Picked {
                robot: robot.clone(),
                item: item.clone(),
            },
            format!("{robot} picked {item}"),
        );
        Ok(Outcome::Picked { item: item.clone() })
    }

    fn drop_held(&self, ctx: &mut SimContext<'_>, robot: &EntityId) -> SimResult<Outcome> {
        let pose = ctx.world.pose(robot.as_str())?;
        let at = pose.position + pose.forward() * ctx.config.drop_distance;
        let Some(item) = ctx.world.release(robot.as_str(), at)? else {
            return Err(SimError::NotHolding(robot.clone()));
        };
        tracing::info!(%robot, %item, "dropped");
        ctx.emit(
            SimEventKind::Dropped {
                robot: robot.clone(),
                item: item.clone(),
            },
            format!("{robot} dropped {item}"),
        );
        Ok(Outcome::Dropped { item, at })
    }

    fn deliver(&self, ctx: &mut SimContext<'_>, robot: &EntityId, to: &EntityId) -> SimResult<Outcome> {
        let Some(item) = ctx.world.robot(robot.as_str())?.holding.clone() else {
            return Err(SimError::NotHolding(robot.clone()));
        };
        let destination = self.target_position(ctx, to)?;
        let robot_pos = ctx.world.position_of(robot.as_str())?;

        if horizontal_distance(robot_pos, destination) > ctx.config.interaction_radius {
            self.go_to(ctx, robot, destination)?;
            tracing::info!(%robot, target = %to, "out of reach, moving closer before delivering");
            return Ok(Outcome::DeliverDeferred {
                to: to.clone(),
                destination,
            });
        }

        ctx.world.deactivate(item.as_str())?;
        tracing::info!(%robot, %item, target = %to, "delivered");
        ctx.emit(
            SimEventKind::Delivered {
                robot: robot.clone(),
                item: item.clone(),
                to: to.clone(),
            },
            format!("{robot} delivered {item} to {to}"),
        );
        Ok(Outcome::Delivered {
            item,
            to: to.clone(),
        })
    }

    fn rescue(&self, ctx: &mut SimContext<'_>, robot: &EntityId) -> SimResult<Outcome> {
        let Some(zone) = ctx.world.safe_zone() else {
            return Err(SimError::MissingSafeZone);
        };
        let zone_pos = zone.position;

        let holding = ctx.world.robot(robot.as_str())?.holding.clone();
        if let Some(held) = holding {
            if ctx.world.get(held.as_str())?.kind == EntityKind::Survivor {
                return self.rescue_held(ctx, robot, held, zone_pos);
            }
        }

        let pose = ctx.world.pose(robot.as_str())?;
        let fov = ctx.world.robot(robot.as_str())?.fov;
        let mut nearest: Option<(EntityId, f32)> = None;
        for survivor in ctx.world.entities_of_kind(EntityKind::Survivor) {
            if survivor.is_carried() || !is_visible(&pose, &fov, survivor.position) {
                continue;
            }
            let d = horizontal_distance(pose.position, survivor.position);
            if nearest.as_ref().is_none_or(|(_, best)| d < *best) {
                nearest = Some((survivor.id.clone(), d));
            }
        }

        match nearest {
            Some((survivor, _)) => self.pick(ctx, robot, &survivor),
            None => {
                tracing::info!(%robot, "no survivor in view");
                ctx.emit(
                    SimEventKind::NoSurvivorInView {
                        robot: robot.clone(),
                    },
                    format!("{robot} sees no survivor"),
                );
                Ok(Outcome::NoSurvivorInView)
            }
        }
    }

    fn rescue_held(
        &self,
        ctx: &mut SimContext<'_>,
        robot: &EntityId,
        survivor: EntityId,
        zone_pos: Vec3,
    ) -> SimResult<Outcome> {
        let jitter = ctx.config.rescue_jitter;
        let at = zone_pos + Vec3::new(ctx.jitter(jitter), 0.0, ctx.jitter(jitter));

        ctx.world.release(robot.as_str(), at)?;
        ctx.world.deactivate(survivor.as_str())?;
        self.go_to(ctx, robot, zone_pos)?;
        tracing::info!(%robot, %survivor, "rescued to safe zone");
        ctx.emit(
            SimEventKind::Rescued {
                robot: robot.clone(),
                survivor: survivor.clone(),
            },
            format!("{robot} rescued {survivor}"),
        );
        Ok(Outcome::Rescued { survivor, at })
    }
}
