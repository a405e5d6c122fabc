//! Controller mapping tables
//!
//! A mapping binds raw button slots to semantic names and raw axis slots
//! to a pair of names, one per direction. Controller models differ only
//! in their table, so new models are added as data.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Semantic names for the two directions of one axis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisNames {
    pub negative: String,
    pub positive: String,
}

impl AxisNames {
    pub fn new(negative: impl Into<String>, positive: impl Into<String>) -> Self {
        Self {
            negative: negative.into(),
            positive: positive.into(),
        }
    }
}

/// Immutable slot → semantic name table for one controller model
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ControllerMapping {
    name: String,
    buttons: HashMap<usize, String>,
    axes: Vec<AxisNames>,
}

impl ControllerMapping {
    pub fn new(
        name: impl Into<String>,
        buttons: HashMap<usize, String>,
        axes: Vec<AxisNames>,
    ) -> Self {
        Self {
            name: name.into(),
            buttons,
            axes,
        }
    }

    /// A mapping with no bindings; every slot is unmapped
    pub fn empty() -> Self {
        Self::new("empty", HashMap::new(), Vec::new())
    }

    /// Axis T8311 joystick: four face buttons, two shoulders and three axes
    pub fn axis_t8311() -> Self {
        let buttons = ["J1", "J2", "J3", "J4", "L", "R"]
            .iter()
            .enumerate()
            .map(|(slot, name)| (slot, name.to_string()))
            .collect();

        let axes = vec![
            AxisNames::new("left", "right"),
            AxisNames::new("up", "down"),
            AxisNames::new("zoom-out", "zoom-in"),
        ];

        Self::new("axis-t8311", buttons, axes)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Semantic name bound to a button slot
    pub fn button_name(&self, slot: usize) -> Option<&str> {
        self.buttons
            .get(&slot)
            .map(String::as_str)
            .filter(|n| !n.is_empty())
    }

    /// Semantic name for an axis slot in the direction of `value`.
    /// Exactly zero counts as positive.
    pub fn axis_name(&self, value: f32, slot: usize) -> Option<&str> {
        let names = self.axes.get(slot)?;
        let name = if value < 0.0 { &names.negative } else { &names.positive };
        Some(name.as_str()).filter(|n| !n.is_empty())
    }

    /// Mapped button slots in ascending order
    pub fn button_slots(&self) -> Vec<usize> {
        let mut slots: Vec<usize> = self.buttons.keys().copied().collect();
        slots.sort_unstable();
        slots
    }

    pub fn axis_count(&self) -> usize {
        self.axes.len()
    }
}
