use std::ops::Deref;

use serde::{Deserialize, Serialize};

use crate::url::{is_ipv6, url_host};

/// How a line is rendered.
///
/// `WebView` lines are played by embedded web content outside the native
/// player, so the native backend is stopped instead of prepared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum HybridType {
    #[default]
    None,
    WebView,
}

/// One stream source of a channel
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ChannelLine {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_user_agent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_referrer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub hybrid_type: HybridType,
}

impl ChannelLine {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.http_user_agent = Some(user_agent.into());
        self
    }

    pub fn with_hybrid_type(mut self, hybrid_type: HybridType) -> Self {
        self.hybrid_type = hybrid_type;
        self
    }

    /// The URL handed to a player backend
    pub fn playable_url(&self) -> &str {
        &self.url
    }

    /// Host of the line URL, empty when the URL has none
    pub fn host(&self) -> String {
        url_host(&self.url)
    }

    pub fn is_ipv6(&self) -> bool {
        is_ipv6(&self.url)
    }
}

/// A logical channel backed by one or more lines.
///
/// Equality is structural: two channels are the same channel when every
/// attribute matches, there is no surrogate key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Channel {
    pub name: String,
    #[serde(default)]
    pub standard_name: String,
    #[serde(default)]
    pub epg_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    #[serde(default = "default_index")]
    pub index: i32,
    #[serde(default)]
    pub line_list: Vec<ChannelLine>,
}

fn default_index() -> i32 {
    -1
}

impl Default for Channel {
    fn default() -> Self {
        Self::new("", Vec::new())
    }
}

impl Channel {
    pub fn new(name: impl Into<String>, line_list: Vec<ChannelLine>) -> Self {
        let name = name.into();
        Self {
            standard_name: name.clone(),
            epg_name: name.clone(),
            name,
            line_list,
            logo: None,
            index: -1,
        }
    }

    /// The empty sentinel used when there is nothing to play
    pub fn is_empty(&self) -> bool {
        self.name.is_empty() && self.line_list.is_empty()
    }
}

/// Ordered channel list, used for favorites and for the channels of a group
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelList(pub Vec<Channel>);

impl ChannelList {
    pub fn new(channels: Vec<Channel>) -> Self {
        Self(channels)
    }

    pub fn index_of(&self, channel: &Channel) -> Option<usize> {
        self.0.iter().position(|it| it == channel)
    }
}

impl Deref for ChannelList {
    type Target = [Channel];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromIterator<Channel> for ChannelList {
    fn from_iter<I: IntoIterator<Item = Channel>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChannelGroup {
    pub name: String,
    #[serde(default)]
    pub channel_list: ChannelList,
}

impl ChannelGroup {
    pub fn new(name: impl Into<String>, channels: Vec<Channel>) -> Self {
        Self {
            name: name.into(),
            channel_list: ChannelList(channels),
        }
    }
}

/// Ordered channel groups of one playlist snapshot
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelGroupList(pub Vec<ChannelGroup>);

impl ChannelGroupList {
    pub fn new(groups: Vec<ChannelGroup>) -> Self {
        Self(groups)
    }

    /// All channels of all groups in group order. Duplicates are kept.
    pub fn channel_list(&self) -> ChannelList {
        self.0
            .iter()
            .flat_map(|group| group.channel_list.iter().cloned())
            .collect()
    }

    /// Index of the first group containing `channel`
    pub fn channel_group_idx(&self, channel: &Channel) -> Option<usize> {
        self.0
            .iter()
            .position(|group| group.channel_list.iter().any(|it| it == channel))
    }

    /// Index of `channel` in the flattened channel list
    pub fn channel_idx(&self, channel: &Channel) -> Option<usize> {
        self.0
            .iter()
            .flat_map(|group| group.channel_list.iter())
            .position(|it| it == channel)
    }

    /// First channel of the flattened list, empty groups are skipped
    pub fn channel_first(&self) -> Option<&Channel> {
        self.0.iter().flat_map(|group| group.channel_list.iter()).next()
    }

    pub fn channel_last(&self) -> Option<&Channel> {
        self.0
            .iter()
            .rev()
            .flat_map(|group| group.channel_list.iter().rev())
            .next()
    }

    /// Copy of the list whose channels carry their flat index
    pub fn with_metadata(&self) -> Self {
        let mut index = 0;
        let groups = self
            .0
            .iter()
            .map(|group| ChannelGroup {
                name: group.name.clone(),
                channel_list: group
                    .channel_list
                    .iter()
                    .map(|channel| {
                        let mut channel = channel.clone();
                        channel.index = index;
                        index += 1;
                        channel
                    })
                    .collect(),
            })
            .collect();
        Self(groups)
    }
}

impl Deref for ChannelGroupList {
    type Target = [ChannelGroup];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
