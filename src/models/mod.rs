//! Data models for podnotes.

mod episode;
mod record;
mod video;
mod warning;

pub use episode::{EpisodeDetail, EpisodeMetadata, MonthYear};
pub use record::{join_list, split_list, OutputRecord, LIST_DELIMITER};
pub use video::{ChannelStats, VideoStats};
pub use warning::ExtractionWarning;
