pub mod channel;
pub mod epg;
pub mod url;

// Re-export main types
pub use channel::{Channel, ChannelGroup, ChannelGroupList, ChannelLine, ChannelList, HybridType};
pub use epg::{EpgProgramme, EpgProgrammeReserve, EpgProgrammeReserveList};
