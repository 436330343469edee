//! Control surface.
//!
//! The interactive parameter panel is an external collaborator; the renderer
//! only consumes current values by name, once per frame. [`ControlPanel`] is
//! that value surface: a mapping from parameter name to a numeric slider
//! descriptor, a color, or a toggle.
//!
//! The two preset panels mirror the demo's tuning: `solid` is the glossy
//! showcase subject, `liquid` the transmissive wobbling one.

use glam::{Vec2, Vec3};
use rustc_hash::FxHashMap;

/// One control entry.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlValue {
    /// Numeric slider with its range metadata.
    Number {
        value: f32,
        min: f32,
        max: f32,
        step: f32,
    },
    /// RGB color.
    Color(Vec3),
    /// Boolean toggle.
    Toggle(bool),
}

/// Name → value mapping. The renderer reads; the panel (elsewhere) writes.
#[derive(Debug, Clone, Default)]
pub struct ControlPanel {
    entries: FxHashMap<String, ControlValue>,
}

impl ControlPanel {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn define(&mut self, name: &str, value: ControlValue) -> &mut Self {
        self.entries.insert(name.to_string(), value);
        self
    }

    fn number(&mut self, name: &str, value: f32, min: f32, max: f32, step: f32) -> &mut Self {
        self.define(name, ControlValue::Number { value, min, max, step })
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ControlValue> {
        self.entries.get(name)
    }

    /// Current numeric value, or `default` when absent / not a number.
    #[must_use]
    pub fn value(&self, name: &str, default: f32) -> f32 {
        match self.entries.get(name) {
            Some(ControlValue::Number { value, .. }) => *value,
            _ => default,
        }
    }

    #[must_use]
    pub fn color(&self, name: &str, default: Vec3) -> Vec3 {
        match self.entries.get(name) {
            Some(ControlValue::Color(color)) => *color,
            _ => default,
        }
    }

    #[must_use]
    pub fn toggle(&self, name: &str, default: bool) -> bool {
        match self.entries.get(name) {
            Some(ControlValue::Toggle(on)) => *on,
            _ => default,
        }
    }

    #[must_use]
    pub fn vec2(&self, x_name: &str, y_name: &str, default: Vec2) -> Vec2 {
        Vec2::new(self.value(x_name, default.x), self.value(y_name, default.y))
    }

    /// Writes a slider's current value, clamped to its declared range.
    /// Unknown names are ignored (the panel owns the schema).
    pub fn set_value(&mut self, name: &str, new_value: f32) {
        if let Some(ControlValue::Number { value, min, max, .. }) = self.entries.get_mut(name) {
            *value = new_value.clamp(*min, *max);
        }
    }

    /// Preset for the solid (glossy) material family.
    #[must_use]
    pub fn solid_preset() -> Self {
        let mut panel = Self::new();
        panel
            .number("direct_intensity", 3.0, 0.0, 4.0, 0.01)
            .number("indirect_intensity", 0.8, 0.0, 4.0, 0.01)
            .number("roughness", 0.15, 0.0, 1.0, 0.01)
            .number("metalness", 0.0, 0.0, 1.0, 0.01)
            .number("reflectance", 0.5, 0.0, 1.0, 0.01)
            .define("super_rough", ControlValue::Toggle(true))
            .number("clearcoat", 0.0, 0.0, 1.0, 0.01)
            .number("clearcoat_roughness", 0.0, 0.0, 1.0, 0.01)
            .number("transmission", 1.0, 0.0, 1.0, 0.01)
            .number("thickness", 1.0, 0.0, 1.0, 0.01)
            .number("ior", 1.4, 1.0, 1.5, 0.01)
            .number("sheen", 1.0, 0.0, 1.0, 0.01)
            .number("sheen_roughness", 0.5, 0.0, 1.0, 0.01)
            .define("sheen_color", ControlValue::Color(rgb(0xf6, 0xb6, 0xff)))
            .number("glitter", 0.0, 0.0, 1.0, 0.01)
            .number("glitter_density", 4.0, 0.0, 4.0, 0.01)
            .define("glitter_color", ControlValue::Color(rgb(0x33, 0x00, 0xff)))
            .number("normal_scale", 0.1, 0.0, 1.0, 0.01)
            .number("normal_repeat_x", 5.0, 0.0, 10.0, 0.1)
            .number("normal_repeat_y", 5.0, 0.0, 10.0, 0.1);
        panel
    }

    /// Preset for the liquid (transmissive) material family.
    #[must_use]
    pub fn liquid_preset() -> Self {
        let mut panel = Self::new();
        panel
            .number("direct_intensity", 1.5, 0.0, 4.0, 0.01)
            .number("indirect_intensity", 2.5, 0.0, 4.0, 0.01)
            .number("roughness", 1.0, 0.0, 1.0, 0.01)
            .number("metalness", 0.0, 0.0, 1.0, 0.01)
            .number("reflectance", 0.5, 0.0, 1.0, 0.01)
            .define("super_rough", ControlValue::Toggle(false))
            .number("transmission", 1.0, 0.0, 1.0, 0.01)
            .number("thickness", 1.0, 0.0, 1.0, 0.01)
            .number("ior", 1.2, 1.0, 1.5, 0.01)
            .number("sheen", 1.0, 0.0, 1.0, 0.01)
            .number("sheen_roughness", 1.0, 0.0, 1.0, 0.01)
            .define("sheen_color", ControlValue::Color(rgb(0x5f, 0xff, 0x00)))
            .number("fill_amount", -0.25, -3.0, 3.0, 0.001)
            .number("recovery", 10.0, 0.0, 100.0, 0.001)
            .number("wobble_speed", 2.0, 0.0, 10.0, 0.001)
            .number("max_wobble", 0.2, -std::f32::consts::PI, std::f32::consts::PI, 0.001);
        panel
    }
}

fn rgb(r: u8, g: u8, b: u8) -> Vec3 {
    Vec3::new(f32::from(r), f32::from(g), f32::from(b)) / 255.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_value_clamps_to_declared_range() {
        let mut panel = ControlPanel::solid_preset();
        panel.set_value("roughness", 7.0);
        assert_eq!(panel.value("roughness", 0.0), 1.0);
        panel.set_value("roughness", -7.0);
        assert_eq!(panel.value("roughness", 1.0), 0.0);
    }

    #[test]
    fn missing_entry_falls_back_to_default() {
        let panel = ControlPanel::new();
        assert_eq!(panel.value("nope", 0.42), 0.42);
        assert!(panel.toggle("nope", true));
    }
}
