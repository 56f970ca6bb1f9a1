//! sigchain-core: Foundation types for the filter pipeline engine
//!
//! Sample buffers, channels, datasets, time/index windowing and the shared
//! error type.

pub mod dataset;
pub mod error;
pub mod sample_buffer;
pub mod window;

pub use dataset::{Channel, Dataset};
pub use error::{SigError, SigResult};
pub use sample_buffer::{ChannelStats, SampleBuffer};
pub use window::{first_index_at_or_after, time_window, IndexWindow, TimeRange};
