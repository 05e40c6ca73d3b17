use chrono::{Local, TimeZone};
use serde::{Deserialize, Serialize};

use crate::Channel;

const PLAYSEEK_TIME_FORMAT: &str = "%Y%m%d%H%M%S";

/// A programme of a channel's EPG, times in epoch milliseconds
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct EpgProgramme {
    pub title: String,
    pub start_at: i64,
    pub end_at: i64,
}

impl EpgProgramme {
    pub fn new(title: impl Into<String>, start_at: i64, end_at: i64) -> Self {
        Self {
            title: title.into(),
            start_at,
            end_at,
        }
    }

    /// Seek range query for catch-up sources, e.g.
    /// `playseek=20240101200000-20240101210000`, in local time.
    pub fn playseek_query(&self) -> String {
        format!(
            "playseek={}-{}",
            format_local(self.start_at),
            format_local(self.end_at)
        )
    }
}

fn format_local(ts_millis: i64) -> String {
    Local
        .timestamp_millis_opt(ts_millis)
        .earliest()
        .map(|t| t.format(PLAYSEEK_TIME_FORMAT).to_string())
        .unwrap_or_default()
}

/// A user reservation for an upcoming programme
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct EpgProgrammeReserve {
    pub channel: String,
    pub programme: String,
    pub start_at: i64,
    pub end_at: i64,
}

impl EpgProgrammeReserve {
    pub fn new(channel: &Channel, programme: &EpgProgramme) -> Self {
        Self {
            channel: channel.name.clone(),
            programme: programme.title.clone(),
            start_at: programme.start_at,
            end_at: programme.end_at,
        }
    }

    /// Reservations are keyed by channel name, title and time range
    pub fn matches(&self, channel: &Channel, programme: &EpgProgramme) -> bool {
        self.channel == channel.name
            && self.programme == programme.title
            && self.start_at == programme.start_at
            && self.end_at == programme.end_at
    }
}

pub type EpgProgrammeReserveList = Vec<EpgProgrammeReserve>;
