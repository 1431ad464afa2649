/// Named frame graphs
///
/// Several rendering configurations can coexist; one of them is current.

use rustc_hash::FxHashMap;
use crate::error::Result;
use crate::engine_bail;
use super::frame_graph::FrameGraph;

#[derive(Debug, Default)]
pub struct FrameGraphManager {
    frame_graphs: FxHashMap<String, FrameGraph>,
    current: Option<String>,
}

impl FrameGraphManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new named frame graph
    ///
    /// The first graph created becomes current.
    ///
    /// # Errors
    ///
    /// Returns an error if a frame graph with the same name already exists.
    pub fn create_frame_graph(&mut self, name: &str) -> Result<&mut FrameGraph> {
        if self.frame_graphs.contains_key(name) {
            engine_bail!("ember::FrameGraphManager",
                "FrameGraph '{}' already exists", name);
        }
        if self.current.is_none() {
            self.current = Some(name.to_string());
        }
        Ok(self.frame_graphs.entry(name.to_string()).or_default())
    }

    pub fn frame_graph(&self, name: &str) -> Option<&FrameGraph> {
        self.frame_graphs.get(name)
    }

    pub fn frame_graph_mut(&mut self, name: &str) -> Option<&mut FrameGraph> {
        self.frame_graphs.get_mut(name)
    }

    /// Remove a frame graph, clearing the selection if it was current
    pub fn remove_frame_graph(&mut self, name: &str) -> Option<FrameGraph> {
        if self.current.as_deref() == Some(name) {
            self.current = None;
        }
        self.frame_graphs.remove(name)
    }

    pub fn frame_graph_count(&self) -> usize {
        self.frame_graphs.len()
    }

    pub fn frame_graph_names(&self) -> Vec<&str> {
        self.frame_graphs.keys().map(|k| k.as_str()).collect()
    }

    /// Select the current frame graph
    ///
    /// # Errors
    ///
    /// Returns an error if no frame graph has this name.
    pub fn set_current(&mut self, name: &str) -> Result<()> {
        if !self.frame_graphs.contains_key(name) {
            engine_bail!("ember::FrameGraphManager",
                "FrameGraph '{}' not found", name);
        }
        self.current = Some(name.to_string());
        Ok(())
    }

    pub fn current_name(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn current(&self) -> Option<&FrameGraph> {
        self.current.as_deref().and_then(|name| self.frame_graphs.get(name))
    }

    pub fn current_mut(&mut self) -> Option<&mut FrameGraph> {
        let name = self.current.as_deref()?;
        self.frame_graphs.get_mut(name)
    }

    pub fn clear(&mut self) {
        self.frame_graphs.clear();
        self.current = None;
    }
}

#[cfg(test)]
#[path = "frame_graph_manager_tests.rs"]
mod tests;
