//! Shader preprocessing.
//!
//! The shading programs are fixed WGSL sources with `#ifdef` feature blocks.
//! [`ShaderDefines`] is the ordered macro set derived from a material's
//! feature flags; [`preprocess`] strips the blocks that are not enabled.
//! Identical define sets always produce identical source (and therefore hit
//! the same pipeline-cache entry).

use std::collections::BTreeSet;

use crate::resources::material::MaterialFeatures;

/// An ordered set of shader macro flags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ShaderDefines {
    defines: BTreeSet<&'static str>,
}

impl ShaderDefines {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: &'static str) -> &mut Self {
        self.defines.insert(name);
        self
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.defines.contains(name)
    }

    /// Maps material feature flags onto the shading program's macros.
    #[must_use]
    pub fn from_features(features: MaterialFeatures) -> Self {
        let mut defines = Self::new();
        if features.contains(MaterialFeatures::ENV_MAP) {
            defines.set("USE_ENV_MAP");
        }
        if features.contains(MaterialFeatures::NORMAL_MAP) {
            defines.set("USE_NORMAL_MAP");
        }
        if features.contains(MaterialFeatures::BASE_MAP) {
            defines.set("USE_BASE_MAP");
        }
        if features.contains(MaterialFeatures::TRANSMISSION) {
            defines.set("USE_TRANSMISSION");
        }
        if features.contains(MaterialFeatures::GLITTER) {
            defines.set("USE_GLITTER");
        }
        if features.contains(MaterialFeatures::LIQUID) {
            defines.set("LIQUID");
        }
        defines
    }
}

/// Resolves `#ifdef NAME` / `#else` / `#endif` blocks in a WGSL source.
///
/// Nested blocks are supported; unknown directives pass through untouched.
#[must_use]
pub fn preprocess(source: &str, defines: &ShaderDefines) -> String {
    let mut output = String::with_capacity(source.len());
    // Stack of (parent_active, this_branch_taken).
    let mut stack: Vec<(bool, bool)> = Vec::new();
    let mut active = true;

    for line in source.lines() {
        let trimmed = line.trim_start();
        if let Some(name) = trimmed.strip_prefix("#ifdef ") {
            let taken = active && defines.contains(name.trim());
            stack.push((active, taken));
            active = taken;
        } else if trimmed.starts_with("#else") {
            if let Some(&(parent, taken)) = stack.last() {
                active = parent && !taken;
            }
        } else if trimmed.starts_with("#endif") {
            if let Some((parent, _)) = stack.pop() {
                active = parent;
            }
        } else if active {
            output.push_str(line);
            output.push('\n');
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = "a\n#ifdef FOO\nfoo\n#else\nbar\n#endif\nz\n";

    #[test]
    fn enabled_branch_is_kept() {
        let mut defines = ShaderDefines::new();
        defines.set("FOO");
        assert_eq!(preprocess(SOURCE, &defines), "a\nfoo\nz\n");
    }

    #[test]
    fn disabled_branch_takes_else() {
        let defines = ShaderDefines::new();
        assert_eq!(preprocess(SOURCE, &defines), "a\nbar\nz\n");
    }

    #[test]
    fn nested_blocks_respect_parents() {
        let source = "#ifdef A\n#ifdef B\nab\n#endif\na\n#endif\n";
        let mut only_b = ShaderDefines::new();
        only_b.set("B");
        assert_eq!(preprocess(source, &only_b), "");

        let mut both = ShaderDefines::new();
        both.set("A");
        both.set("B");
        assert_eq!(preprocess(source, &both), "ab\na\n");
    }

    #[test]
    fn identical_feature_sets_share_defines() {
        let a = ShaderDefines::from_features(
            MaterialFeatures::ENV_MAP | MaterialFeatures::TRANSMISSION,
        );
        let b = ShaderDefines::from_features(
            MaterialFeatures::TRANSMISSION | MaterialFeatures::ENV_MAP,
        );
        assert_eq!(a, b);
    }
}
