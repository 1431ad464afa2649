/// Buffer pack configuration
///
/// The raw serde shape of the JSON file, and the resolved `BuffersFormat`
/// where sizes are absolute and every semantic has a home.

use std::collections::BTreeMap;
use std::path::Path;
use serde::Deserialize;
use crate::error::{Error, Result};
use crate::types::Semantic;

/// Default size multiplier applied to every size and share (1 KiB)
pub const DEFAULT_UNIT: u64 = 1024;

/// Default growth step of an interleaved buffer, in units
pub const DEFAULT_INCREMENT: u64 = 64;

// ============================================================================
// Raw JSON shape
// ============================================================================

/// How semantics share a buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interleaving {
    /// All semantics share one stride (vertex-interleaved)
    Global,
    /// Each semantic owns a contiguous sub-range
    #[default]
    Local,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BufferConfig {
    pub size: u64,
    #[serde(default)]
    pub interleaved: Interleaving,
    /// List of `{ semantic: share }` objects, shares in units
    #[serde(default)]
    pub semantic: Vec<BTreeMap<Semantic, u64>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BufferPackConfig {
    pub name: String,
    pub buffers: Vec<BufferConfig>,
}

/// Buffer pack configuration file as authored
#[derive(Debug, Clone, Deserialize)]
pub struct BuffersFormatConfig {
    #[serde(default = "default_unit")]
    pub unit: u64,
    #[serde(default = "default_increment")]
    pub buffer_increment: u64,
    #[serde(default)]
    pub buffer_pack_current: String,
    pub buffer_packs: Vec<BufferPackConfig>,
}

fn default_unit() -> u64 {
    DEFAULT_UNIT
}

fn default_increment() -> u64 {
    DEFAULT_INCREMENT
}

// ============================================================================
// Resolved format
// ============================================================================

/// One physical buffer: absolute byte size and `(semantic, bytes)` shares
#[derive(Debug, Clone, PartialEq)]
pub struct BufferFormat {
    pub size: u64,
    pub interleaved: bool,
    pub semantics: Vec<(Semantic, u64)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BufferPackFormat {
    pub name: String,
    pub buffers: Vec<BufferFormat>,
}

/// Resolved buffer pack variants
///
/// Every pack assigns every semantic in `Semantic::ALL` to exactly one buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct BuffersFormat {
    pub unit: u64,
    /// Growth step of interleaved buffers, in bytes
    pub increment: u64,
    pub current: usize,
    pub packs: Vec<BufferPackFormat>,
}

impl BuffersFormat {
    /// Parse and resolve a JSON configuration
    pub fn from_json(json: &str) -> Result<Self> {
        let config: BuffersFormatConfig = serde_json::from_str(json)?;
        Self::from_config(config)
    }

    /// Read, parse and resolve a JSON configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            crate::engine_error!("ember::BuffersFormat", "Cannot read '{}': {}", path.display(), e);
            Error::InvalidConfig(format!("cannot read '{}': {}", path.display(), e))
        })?;
        Self::from_json(&json)
    }

    /// Resolve a parsed configuration
    ///
    /// Sizes and shares are scaled by `unit`, then the semantics no buffer
    /// claims are spread evenly over the pack's catch-all buffer (the one
    /// buffer declaring no semantic).
    pub fn from_config(config: BuffersFormatConfig) -> Result<Self> {
        if config.unit == 0 {
            return Err(config_error("unit must be positive".to_string()));
        }
        if config.buffer_packs.is_empty() {
            return Err(config_error("no buffer_packs declared".to_string()));
        }

        let unit = config.unit;
        let mut packs = Vec::with_capacity(config.buffer_packs.len());
        for pack in config.buffer_packs {
            packs.push(resolve_pack(pack, unit)?);
        }

        let current = match packs.iter().position(|p| p.name == config.buffer_pack_current) {
            Some(index) => index,
            None => {
                crate::engine_warn!("ember::BuffersFormat",
                    "buffer_pack_current '{}' not found, using '{}'",
                    config.buffer_pack_current, packs[0].name);
                0
            }
        };

        Ok(Self {
            unit,
            increment: config.buffer_increment.max(1) * unit,
            current,
            packs,
        })
    }

    /// The active buffer pack variant
    pub fn current_pack(&self) -> &BufferPackFormat {
        &self.packs[self.current]
    }
}

fn config_error(message: String) -> Error {
    crate::engine_error!("ember::BuffersFormat", "{}", message);
    Error::InvalidConfig(message)
}

fn resolve_pack(pack: BufferPackConfig, unit: u64) -> Result<BufferPackFormat> {
    let mut assigned = [false; Semantic::ALL.len()];
    let mut buffers = Vec::with_capacity(pack.buffers.len());

    for (index, buffer) in pack.buffers.into_iter().enumerate() {
        let size = buffer.size * unit;
        if size == 0 {
            return Err(config_error(format!("pack '{}' buffer {} has zero size", pack.name, index)));
        }

        let mut semantics = Vec::new();
        for entry in &buffer.semantic {
            for (&semantic, &share) in entry {
                if assigned[semantic.index()] {
                    return Err(config_error(format!(
                        "pack '{}' assigns {:?} more than once", pack.name, semantic)));
                }
                assigned[semantic.index()] = true;
                semantics.push((semantic, share * unit));
            }
        }

        let interleaved = buffer.interleaved == Interleaving::Global;
        let claimed: u64 = semantics.iter().map(|(_, bytes)| bytes).sum();
        if !interleaved && claimed > size {
            return Err(config_error(format!(
                "pack '{}' buffer {} shares {} bytes exceed its {} bytes",
                pack.name, index, claimed, size)));
        }

        buffers.push(BufferFormat { size, interleaved, semantics });
    }

    let catch_all = buffers.iter().position(|b| b.semantics.is_empty());
    let remaining: Vec<Semantic> = Semantic::ALL
        .iter()
        .copied()
        .filter(|s| !assigned[s.index()])
        .collect();

    let Some(catch_all) = catch_all else {
        return Err(config_error(format!(
            "pack '{}' has no catch-all buffer for {} unassigned semantics",
            pack.name, remaining.len())));
    };

    if !remaining.is_empty() {
        let catch_all_buffer = &mut buffers[catch_all];
        let per_semantic = catch_all_buffer.size / remaining.len() as u64;
        catch_all_buffer.semantics = remaining.into_iter().map(|s| (s, per_semantic)).collect();
    }

    Ok(BufferPackFormat { name: pack.name, buffers })
}

#[cfg(test)]
#[path = "buffers_format_tests.rs"]
mod tests;
