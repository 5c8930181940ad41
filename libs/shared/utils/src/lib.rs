pub mod test_utils;
pub mod time;

pub use time::{
    compare_iso, from_iso, group_consecutive, interval_to_segments, segment_indices,
    segments_to_interval, to_iso, TimeGridError,
};
