//! Buffer pack allocator
//!
//! Packs every engine semantic into a small set of physical buffers,
//! configured from JSON and resolved once at startup.

mod buffers_format;
mod buffer;
mod buffers_pack;

pub use buffers_format::{
    BuffersFormat, BufferPackFormat, BufferFormat, BuffersFormatConfig,
    BufferPackConfig, BufferConfig, Interleaving, DEFAULT_UNIT, DEFAULT_INCREMENT,
};
pub use buffer::{Buffer, align8};
pub use buffers_pack::BuffersPack;

/// Buffer pack configuration shared by unit tests across the crate
#[cfg(test)]
pub(crate) const EXAMPLE_CONFIG: &str = r#"{
    "unit": 1024,
    "buffer_pack_current": "skinned",
    "buffer_packs": [
        {
            "name": "skinned",
            "buffers": [
                {
                    "size": 150,
                    "interleaved": "local",
                    "semantic": [
                        { "vertex_position": 100 },
                        { "vertex_weight": 25 },
                        { "vertex_bone_id": 25 }
                    ]
                },
                {
                    "size": 200,
                    "interleaved": "global",
                    "semantic": [
                        { "vertex_texture_coord_0": 100 },
                        { "vertex_normal": 50 },
                        { "vertex_tangent": 50 }
                    ]
                },
                {
                    "size": 390
                }
            ]
        }
    ]
}"#;
