use worldsync_kernel::{Mob, MobKind, Player};

/// Admission priority of a candidate. Lower values are admitted first.
pub type Priority = u32;

pub const STAFF_PRIORITY: Priority = 0;
pub const INTERACTING_PRIORITY: Priority = 1;
pub const FRIEND_PRIORITY: Priority = 2;
pub const DEFAULT_PRIORITY: Priority = 10;
pub const IGNORED_PRIORITY: Priority = 20;

/// Ranks candidates for admission into an observer's local view when capacity
/// is scarce. Implementations must be pure: the same pair always yields the
/// same priority within a tick.
pub trait PriorityProvider: Sync {
    fn priority(&self, observer: &Player, candidate: &Mob) -> Priority;
}

/// Staff first, then the mob being interacted with, then friends, then
/// everyone else, with ignored players last. Ignoring only delays admission;
/// it never hides anyone.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultPriorityProvider;

impl PriorityProvider for DefaultPriorityProvider {
    fn priority(&self, observer: &Player, candidate: &Mob) -> Priority {
        let other = match &candidate.kind {
            MobKind::Player(p) => p,
            MobKind::Npc(_) => return DEFAULT_PRIORITY,
        };

        if other.privilege.is_staff() {
            STAFF_PRIORITY
        } else if observer.interacting == Some(candidate.id) {
            INTERACTING_PRIORITY
        } else if observer.is_friend(&other.username) {
            FRIEND_PRIORITY
        } else if observer.is_ignored(&other.username) {
            IGNORED_PRIORITY
        } else {
            DEFAULT_PRIORITY
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use worldsync_common::{Position, PrivilegeLevel};
    use worldsync_kernel::{Npc, World};

    fn setup() -> (World, Player) {
        let mut observer = Player::new("observer");
        observer.friends.insert("friend".into());
        observer.ignores.insert("ignored".into());
        (World::new(), observer)
    }

    fn spawn(world: &mut World, player: Player) -> worldsync_common::EntityId {
        world.spawn_player(player, Position::new(0, 0)).unwrap()
    }

    #[test]
    fn staff_outranks_everything() {
        let (mut world, mut observer) = setup();
        let admin = Player::new("friend").with_privilege(PrivilegeLevel::Administrator);
        let id = spawn(&mut world, admin);
        observer.interacting = Some(id);
        let mob = world.get(id).unwrap();
        assert_eq!(DefaultPriorityProvider.priority(&observer, mob), STAFF_PRIORITY);

        let modr = spawn(&mut world, Player::new("m").with_privilege(PrivilegeLevel::Moderator));
        let mob = world.get(modr).unwrap();
        assert_eq!(DefaultPriorityProvider.priority(&observer, mob), STAFF_PRIORITY);
    }

    #[test]
    fn interaction_outranks_friendship() {
        let (mut world, mut observer) = setup();
        let id = spawn(&mut world, Player::new("friend"));
        observer.interacting = Some(id);
        let mob = world.get(id).unwrap();
        assert_eq!(
            DefaultPriorityProvider.priority(&observer, mob),
            INTERACTING_PRIORITY
        );
    }

    #[test]
    fn social_lists() {
        let (mut world, observer) = setup();
        let friend = spawn(&mut world, Player::new("friend"));
        let ignored = spawn(&mut world, Player::new("ignored"));
        let stranger = spawn(&mut world, Player::new("stranger"));

        let p = |id| DefaultPriorityProvider.priority(&observer, world.get(id).unwrap());
        assert_eq!(p(friend), FRIEND_PRIORITY);
        assert_eq!(p(ignored), IGNORED_PRIORITY);
        assert_eq!(p(stranger), DEFAULT_PRIORITY);
    }

    #[test]
    fn npcs_always_get_default() {
        let (mut world, mut observer) = setup();
        let id = world.spawn_npc(Npc { type_id: 1 }, Position::new(0, 0)).unwrap();
        observer.interacting = Some(id);
        let mob = world.get(id).unwrap();
        assert_eq!(DefaultPriorityProvider.priority(&observer, mob), DEFAULT_PRIORITY);
    }
}
