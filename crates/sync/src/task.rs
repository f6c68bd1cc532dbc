use std::collections::HashSet;
use std::sync::Arc;
use worldsync_common::{EntityId, Position};
use worldsync_kernel::{BlockKind, Mob, Player, SynchronizationBlock, SynchronizationBlockSet, World};

use crate::config::SyncConfig;
use crate::message::PlayerSynchronizationMessage;
use crate::priority::{Priority, PriorityProvider};
use crate::segment::SynchronizationSegment;
use crate::view::LocalView;

/// Result of synchronizing one observer for one tick.
#[derive(Debug, Clone)]
pub struct SyncOutcome {
    pub message: PlayerSynchronizationMessage,
    pub stats: SyncStats,
}

/// Per-observer counters for instrumentation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncStats {
    pub removed: usize,
    pub added: usize,
    /// View size after this tick.
    pub local_mobs: usize,
    /// The view hit its capacity ceiling while eligible mobs were still waiting.
    pub excessive: bool,
}

/// Computes one tick of view synchronization for a single observing player.
///
/// The task reads the world through a shared reference and mutates nothing but
/// the observer's own [`LocalView`], so tasks for different observers can run
/// in parallel against the same world.
pub struct PlayerSynchronizationTask<'a, P> {
    world: &'a World,
    observer: &'a Mob,
    player: &'a Player,
    config: &'a SyncConfig,
    priority: &'a P,
}

impl<'a, P: PriorityProvider> PlayerSynchronizationTask<'a, P> {
    /// Returns `None` if `observer` is not a registered player.
    pub fn new(
        world: &'a World,
        observer: EntityId,
        config: &'a SyncConfig,
        priority: &'a P,
    ) -> Option<Self> {
        let mob = world.get(observer)?;
        let player = mob.as_player()?;
        Some(Self {
            world,
            observer: mob,
            player,
            config,
            priority,
        })
    }

    pub fn run(&self, view: &mut LocalView) -> SyncOutcome {
        let _span = tracing::info_span!("player_sync", observer = %self.observer.id).entered();

        let position = self.observer.position;
        let distance = self.player.viewing_distance();
        let segment = self.own_segment();

        let local_mobs = view.len();
        let mut segments = Vec::with_capacity(local_mobs);
        let mut evicted = HashSet::new();

        view.retain(|id| match self.world.get(id) {
            Some(other) if !removable(&position, distance, other) => {
                segments.push(SynchronizationSegment::Movement {
                    blocks: Arc::clone(other.block_set()),
                    directions: other.directions,
                });
                true
            }
            _ => {
                segments.push(SynchronizationSegment::RemoveMob);
                evicted.insert(id);
                false
            }
        });

        let capacity = self.config.max_local_mobs.saturating_sub(view.len());
        let mut ranked: Vec<(Priority, &Mob)> = self
            .world
            .active_mobs()
            .filter(|other| self.consider(other, view, &evicted))
            .map(|other| (self.priority.priority(self.player, other), other))
            .collect();
        // Stable: equal priorities keep index order.
        ranked.sort_by_key(|(priority, _)| *priority);
        let overflow = ranked.len() > capacity;
        ranked.truncate(capacity);

        let mut added = 0;
        let mut excessive = false;
        for (_, other) in ranked {
            if view.len() >= self.config.max_local_mobs {
                excessive = true;
                break;
            } else if added >= self.config.new_mobs_per_tick {
                break;
            }

            // The snapshot may have moved on since discovery.
            if self.consider(other, view, &evicted) && view.push(other.id) {
                added += 1;
                segments.push(SynchronizationSegment::AddMob {
                    blocks: blocks_for_new_member(other),
                    id: other.id,
                    position: other.position,
                });
            }
        }
        excessive |= overflow && view.len() >= self.config.max_local_mobs;

        if excessive {
            tracing::debug!(local = view.len(), "local view at capacity, mobs left waiting");
        }

        let stats = SyncStats {
            removed: evicted.len(),
            added,
            local_mobs: view.len(),
            excessive,
        };
        tracing::debug!(
            removed = stats.removed,
            added = stats.added,
            local = stats.local_mobs,
            "player sync complete"
        );

        SyncOutcome {
            message: PlayerSynchronizationMessage {
                last_known_region: self.player.last_known_region,
                position,
                region_changed: self.player.region_changed,
                segment,
                local_mobs,
                segments,
            },
            stats,
        }
    }

    /// The observer's own segment. Its own public chat is not echoed back to it.
    fn own_segment(&self) -> SynchronizationSegment {
        let mut blocks = Arc::clone(self.observer.block_set());
        if blocks.contains(BlockKind::Chat) {
            Arc::make_mut(&mut blocks).remove(BlockKind::Chat);
        }

        if self.observer.teleporting || self.player.region_changed {
            SynchronizationSegment::Teleport {
                blocks,
                destination: self.observer.position,
            }
        } else {
            SynchronizationSegment::Movement {
                blocks,
                directions: self.observer.directions,
            }
        }
    }

    /// Whether `other` may be admitted into the view this tick.
    fn consider(&self, other: &Mob, view: &LocalView, evicted: &HashSet<EntityId>) -> bool {
        other.id != self.observer.id
            && !view.contains(other.id)
            && !evicted.contains(&other.id)
            && other
                .position
                .is_within_distance(&self.observer.position, self.player.viewing_distance())
    }
}

/// Whether a current view member must leave the view.
fn removable(position: &Position, distance: i32, other: &Mob) -> bool {
    if other.teleporting || !other.active {
        return true;
    }
    other.position.longest_delta(position) > distance
        || !other.position.is_within_distance(position, distance)
}

/// A newly visible player must be drawn, so it always carries an appearance.
// TODO: skip the appearance block when the client still has it cached.
fn blocks_for_new_member(other: &Mob) -> Arc<SynchronizationBlockSet> {
    let mut blocks = Arc::clone(other.block_set());
    if let Some(player) = other.as_player() {
        if !blocks.contains(BlockKind::Appearance) {
            Arc::make_mut(&mut blocks).add(SynchronizationBlock::appearance_of(player));
        }
    }
    blocks
}
