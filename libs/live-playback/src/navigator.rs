//! Previous/next channel across the favorites list and the group list.
//!
//! With looping enabled the group path wraps inside the current channel's
//! group, without it the path walks the whole flattened list and falls back
//! to its ends. Callers rely on this difference, keep it.

use channel_data::{Channel, ChannelGroupList, ChannelList};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NavigationPolicy {
    pub favorites_visible: bool,
    pub list_loop: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Prev,
    Next,
}

impl Direction {
    /// Neighbour index of `idx`. A missing channel steps to index 0 going
    /// forward and to nothing going backward.
    fn step(self, idx: Option<usize>) -> Option<usize> {
        match self {
            Direction::Next => Some(idx.map_or(0, |i| i + 1)),
            Direction::Prev => idx.and_then(|i| i.checked_sub(1)),
        }
    }

    fn wrap(self, channels: &[Channel]) -> Option<&Channel> {
        match self {
            Direction::Next => channels.first(),
            Direction::Prev => channels.last(),
        }
    }

    fn list_end(self, groups: &ChannelGroupList) -> Option<&Channel> {
        match self {
            Direction::Next => groups.channel_first(),
            Direction::Prev => groups.channel_last(),
        }
    }
}

pub fn prev_channel(
    current: &Channel,
    groups: &ChannelGroupList,
    favorites: Option<&ChannelList>,
    policy: NavigationPolicy,
) -> Channel {
    neighbour(current, groups, favorites, policy, Direction::Prev)
}

pub fn next_channel(
    current: &Channel,
    groups: &ChannelGroupList,
    favorites: Option<&ChannelList>,
    policy: NavigationPolicy,
) -> Channel {
    neighbour(current, groups, favorites, policy, Direction::Next)
}

fn neighbour(
    current: &Channel,
    groups: &ChannelGroupList,
    favorites: Option<&ChannelList>,
    policy: NavigationPolicy,
    direction: Direction,
) -> Channel {
    if let Some(channel) = favorite_neighbour(current, groups, favorites, policy, direction) {
        return channel;
    }

    let channel = if policy.list_loop {
        groups
            .channel_group_idx(current)
            .and_then(|idx| groups.get(idx))
            .or_else(|| groups.first())
            .and_then(|group| {
                let channels = &group.channel_list;
                direction
                    .step(channels.index_of(current))
                    .and_then(|idx| channels.get(idx))
                    .or_else(|| direction.wrap(channels))
            })
            .cloned()
    } else {
        let channels = groups.channel_list();
        direction
            .step(groups.channel_idx(current))
            .and_then(|idx| channels.get(idx))
            .or_else(|| direction.list_end(groups))
            .cloned()
    };

    channel.unwrap_or_default()
}

/// `None` when the favorites path does not apply
fn favorite_neighbour(
    current: &Channel,
    groups: &ChannelGroupList,
    favorites: Option<&ChannelList>,
    policy: NavigationPolicy,
    direction: Direction,
) -> Option<Channel> {
    if !policy.favorites_visible {
        return None;
    }
    let favorites = favorites?;
    let idx = favorites.index_of(current)?;

    direction
        .step(Some(idx))
        .and_then(|idx| favorites.get(idx))
        .or_else(|| {
            if policy.list_loop {
                direction.wrap(favorites)
            } else {
                direction.list_end(groups)
            }
        })
        .cloned()
}
