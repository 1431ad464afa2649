mod frame_ring;

pub use frame_ring::{FrameRing, FRAMES_IN_FLIGHT};
