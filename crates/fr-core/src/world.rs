use std::collections::{BTreeMap, HashMap};

use glam::Vec3;

use crate::entity::{Entity, EntityId, EntityKind};
use crate::error::{FrError, FrResult};
use crate::geometry::Aabb;
use crate::robot::{Pose, Robot, normalize_heading};
use crate::spatial::SpatialIndex;

/// Where a carried entity sits relative to its carrier (right, up, forward).
pub const DEFAULT_CARRY_OFFSET: Vec3 = Vec3::new(0.0, 1.0, 0.6);

/// The entity registry. Owns every entity, every robot, and the spatial index.
///
/// Records are never removed: deactivated entities stay resolvable so that
/// diagnostics can still name them, and their identifiers are never handed out
/// again by [`World::next_spawn_id`].
#[derive(Debug, Clone)]
pub struct World {
    entities: BTreeMap<EntityId, Entity>,
    robots: BTreeMap<EntityId, Robot>,

    // Indexes
    by_kind: HashMap<EntityKind, Vec<EntityId>>,
    index: SpatialIndex,

    safe_zone: Option<EntityId>,
    carry_offset: Vec3,
    spawn_counter: u64,
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl World {
    /// An empty world with the default carry offset.
    pub fn new() -> Self {
        Self {
            entities: BTreeMap::new(),
            robots: BTreeMap::new(),
            by_kind: HashMap::new(),
            index: SpatialIndex::default(),
            safe_zone: None,
            carry_offset: DEFAULT_CARRY_OFFSET,
            spawn_counter: 0,
        }
    }

    /// Use a different carry offset for held entities.
    pub fn with_carry_offset(mut self, offset: Vec3) -> Self {
        self.carry_offset = offset;
        self
    }

    // -----------------------------------------------------------------------
    // Registration
    // -----------------------------------------------------------------------

    /// Register an entity.
    ///
    /// Fails with [`FrError::DuplicateId`] if the ID is taken and with
    /// [`FrError::UnknownId`] if the entity names a room that is not registered
    /// yet. Registering a [`EntityKind::SafeZone`] makes it the world's safe
    /// zone.
    pub fn register(&mut self, entity: Entity) -> FrResult<()> {
        if self.entities.contains_key(&entity.id) {
            return Err(FrError::DuplicateId(entity.id));
        }
        if let Some(room) = &entity.room {
            if !self.entities.contains_key(room) {
                return Err(FrError::UnknownId(room.clone()));
            }
        }
        if let Some(carrier) = &entity.carried_by {
            return Err(FrError::Carried {
                id: entity.id.clone(),
                by: carrier.clone(),
            });
        }

        let id = entity.id.clone();
        if entity.kind == EntityKind::SafeZone {
            self.safe_zone = Some(id.clone());
        }
        if entity.active {
            self.index.insert(id.clone(), entity.footprint());
        }
        self.by_kind.entry(entity.kind).or_default().push(id.clone());
        tracing::debug!(%id, kind = %entity.kind, "registered entity");
        self.entities.insert(id, entity);
        Ok(())
    }

    /// Register a robot together with its entity record.
    pub fn register_robot(
        &mut self,
        robot: Robot,
        position: Vec3,
        room: Option<EntityId>,
    ) -> FrResult<()> {
        let mut entity = Entity::new(robot.id.clone(), EntityKind::Robot, position).shown();
        entity.room = room;
        self.register(entity)?;
        self.robots.insert(robot.id.clone(), robot);
        Ok(())
    }

    /// Produce an identifier for a newly spawned entity.
    ///
    /// Identifiers are `{prefix}{n}` with a counter that only increases, and
    /// any ID already in the registry (active or not) is skipped.
    pub fn next_spawn_id(&mut self, prefix: &str) -> EntityId {
        loop {
            self.spawn_counter += 1;
            let id = EntityId::new(format!("{prefix}{}", self.spawn_counter));
            if !self.entities.contains_key(&id) {
                return id;
            }
        }
    }

    // -----------------------------------------------------------------------
    // Lookup
    // -----------------------------------------------------------------------

    /// Get an entity by ID, active or not.
    pub fn get(&self, id: &str) -> FrResult<&Entity> {
        self.entities
            .get(id)
            .ok_or_else(|| FrError::UnknownId(EntityId::new(id)))
    }

    /// Get an active entity by ID.
    pub fn get_active(&self, id: &str) -> FrResult<&Entity> {
        let entity = self.get(id)?;
        if entity.active {
            Ok(entity)
        } else {
            Err(FrError::Inactive(entity.id.clone()))
        }
    }

    /// Whether an entity with this ID was ever registered.
    pub fn contains(&self, id: &str) -> bool {
        self.entities.contains_key(id)
    }

    /// Get a robot by ID.
    pub fn robot(&self, id: &str) -> FrResult<&Robot> {
        self.robots.get(id).ok_or_else(|| {
            if self.entities.contains_key(id) {
                FrError::NotARobot(EntityId::new(id))
            } else {
                FrError::UnknownId(EntityId::new(id))
            }
        })
    }

    /// All robots in ID order.
    pub fn robots(&self) -> impl Iterator<Item = &Robot> {
        self.robots.values()
    }

    /// Robot IDs in registration order.
    pub fn robot_ids(&self) -> Vec<EntityId> {
        self.ids_of_kind(EntityKind::Robot)
            .filter(|id| self.robots.contains_key(*id))
            .cloned()
            .collect()
    }

    /// The registered safe zone, if any.
    pub fn safe_zone(&self) -> Option<&Entity> {
        self.safe_zone.as_ref().and_then(|id| self.entities.get(id))
    }

    /// Active entities of one kind, in registration order.
    ///
    /// The iterator borrows the world and can be recreated at will; two passes
    /// without an intervening mutation yield the same order.
    pub fn entities_of_kind(&self, kind: EntityKind) -> impl Iterator<Item = &Entity> + '_ {
        self.ids_of_kind(kind)
            .filter_map(|id| self.entities.get(id))
            .filter(|e| e.active)
    }

    fn ids_of_kind(&self, kind: EntityKind) -> impl Iterator<Item = &EntityId> + '_ {
        self.by_kind.get(&kind).into_iter().flatten()
    }

    /// Every entity, active or not, in ID order.
    pub fn all_entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    /// Every active entity in ID order.
    pub fn active_entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values().filter(|e| e.active)
    }

    /// Active, uncarried entities whose footprint cells intersect `area`.
    ///
    /// This is a broad-phase query; callers run their own exact test.
    pub fn query_area(&self, area: &Aabb) -> impl Iterator<Item = &Entity> + use<'_> {
        self.index
            .query(area)
            .into_iter()
            .filter_map(|id| self.entities.get(&id))
            .filter(|e| e.active && !e.is_carried())
    }

    /// Active, uncarried entities near `center` on the horizontal plane.
    pub fn query_radius(
        &self,
        center: Vec3,
        radius: f32,
    ) -> impl Iterator<Item = &Entity> + use<'_> {
        self.query_area(&Aabb::from_center(center, Vec3::new(radius, 0.0, radius)))
    }

    /// Live position of an entity. Carried entities follow their carrier.
    pub fn position_of(&self, id: &str) -> FrResult<Vec3> {
        let entity = self.get(id)?;
        match &entity.carried_by {
            Some(carrier) => Ok(self.pose(carrier.as_str())?.local_to_world(self.carry_offset)),
            None => Ok(entity.position),
        }
    }

    /// Position and heading of a robot.
    pub fn pose(&self, robot: &str) -> FrResult<Pose> {
        let state = self.robot(robot)?;
        let entity = self.get(robot)?;
        Ok(Pose {
            position: entity.position,
            heading: state.heading,
        })
    }

    /// Offset applied to held entities, in the carrier's frame.
    pub fn carry_offset(&self) -> Vec3 {
        self.carry_offset
    }

    // -----------------------------------------------------------------------
    // Mutation
    // -----------------------------------------------------------------------

    /// Mark an entity as logically removed.
    ///
    /// Idempotent; returns `true` if the entity was active. The record stays
    /// resolvable. A carried entity is released from its carrier first.
    pub fn deactivate(&mut self, id: &str) -> FrResult<bool> {
        let entity = self
            .entities
            .get_mut(id)
            .ok_or_else(|| FrError::UnknownId(EntityId::new(id)))?;
        if !entity.active {
            return Ok(false);
        }
        entity.active = false;
        let carrier = entity.carried_by.take();
        let key = entity.id.clone();
        if let Some(carrier) = carrier {
            if let Some(robot) = self.robots.get_mut(&carrier) {
                robot.holding = None;
            }
        }
        self.index.remove(&key);
        tracing::debug!(id = %key, "deactivated entity");
        Ok(true)
    }

    /// Overwrite an entity's position.
    ///
    /// Returns `Ok(false)` without changing anything if the entity is carried:
    /// a carried entity's position is derived from its carrier.
    pub fn move_to(&mut self, id: &str, position: Vec3) -> FrResult<bool> {
        let entity = self
            .entities
            .get_mut(id)
            .ok_or_else(|| FrError::UnknownId(EntityId::new(id)))?;
        if entity.is_carried() {
            return Ok(false);
        }
        entity.position = position;
        if entity.active {
            self.index.insert(entity.id.clone(), entity.footprint());
        }
        Ok(true)
    }

    /// Turn a robot to face `heading` (projected onto the horizontal plane).
    pub fn set_heading(&mut self, robot: &str, heading: Vec3) -> FrResult<()> {
        self.robot_mut(robot)?.heading = normalize_heading(heading);
        Ok(())
    }

    /// Set or clear a robot's movement target.
    pub fn set_target(&mut self, robot: &str, target: Option<Vec3>) -> FrResult<()> {
        self.robot_mut(robot)?.target = target;
        Ok(())
    }

    /// Equip or unequip a robot's extinguisher.
    pub fn set_equipped(&mut self, robot: &str, equipped: bool) -> FrResult<()> {
        self.robot_mut(robot)?.equipped = equipped;
        Ok(())
    }

    /// Make `robot` carry `item`.
    ///
    /// The item leaves the spatial index and its position becomes derived
    /// from the robot's pose until [`World::release`].
    pub fn attach(&mut self, robot: &str, item: &str) -> FrResult<()> {
        let state = self.robot(robot)?;
        if let Some(held) = &state.holding {
            return Err(FrError::HandsFull {
                robot: state.id.clone(),
                held: held.clone(),
            });
        }
        let robot_id = state.id.clone();
        let entity = self.get_active(item)?;
        if let Some(by) = &entity.carried_by {
            return Err(FrError::Carried {
                id: entity.id.clone(),
                by: by.clone(),
            });
        }
        let item_id = entity.id.clone();

        if let Some(entity) = self.entities.get_mut(&item_id) {
            entity.carried_by = Some(robot_id.clone());
        }
        self.index.remove(&item_id);
        self.robot_mut(robot)?.holding = Some(item_id);
        Ok(())
    }

    /// Release whatever `robot` holds and put it down at `at`.
    ///
    /// Returns the released entity, or `None` if the robot held nothing.
    pub fn release(&mut self, robot: &str, at: Vec3) -> FrResult<Option<EntityId>> {
        let Some(item) = self.robot_mut(robot)?.holding.take() else {
            return Ok(None);
        };
        if let Some(entity) = self.entities.get_mut(&item) {
            entity.carried_by = None;
            entity.position = at;
            if entity.active {
                self.index.insert(item.clone(), entity.footprint());
            }
        }
        Ok(Some(item))
    }

    /// Mark an entity as shown without attributing it to a robot.
    pub fn show(&mut self, id: &str) -> FrResult<()> {
        let entity = self
            .entities
            .get_mut(id)
            .ok_or_else(|| FrError::UnknownId(EntityId::new(id)))?;
        entity.shown = true;
        Ok(())
    }

    /// Record that `robot` perceived `id`.
    ///
    /// Reveal is one-way: nothing ever hides an entity again. Returns `true`
    /// if this robot had not revealed the entity before.
    pub fn reveal(&mut self, robot: &str, id: &str) -> FrResult<bool> {
        let entity = self
            .entities
            .get_mut(id)
            .ok_or_else(|| FrError::UnknownId(EntityId::new(id)))?;
        entity.shown = true;
        let key = entity.id.clone();
        Ok(self.robot_mut(robot)?.revealed.insert(key))
    }

    fn robot_mut(&mut self, id: &str) -> FrResult<&mut Robot> {
        let is_entity = self.entities.contains_key(id);
        self.robots.get_mut(id).ok_or_else(|| {
            if is_entity {
                FrError::NotARobot(EntityId::new(id))
            } else {
                FrError::UnknownId(EntityId::new(id))
            }
        })
    }

    // -----------------------------------------------------------------------
    // Statistics
    // -----------------------------------------------------------------------

    /// Number of registered entities, active or not.
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Number of active entities.
    pub fn active_count(&self) -> usize {
        self.active_entities().count()
    }

    /// Count active entities by kind.
    pub fn active_counts_by_kind(&self) -> BTreeMap<EntityKind, usize> {
        let mut counts = BTreeMap::new();
        for entity in self.active_entities() {
            *counts.entry(entity.kind).or_insert(0) += 1;
        }
        counts
    }
}
