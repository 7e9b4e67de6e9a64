use serde::Deserialize;

use crate::color::Color;
use crate::consts::{ DEFAULT_MAX_DEPTH, DEFAULT_BVH_THRESHOLD };

/// Knobs that control a render but are not part of the scene itself.
///
/// Every field has a default, so a scene file may give any subset of them in
/// its `render` section.
#[derive(Copy, Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Reflected and refracted rays stop recursing at this depth.
    pub max_depth: usize,

    /// Color of rays that hit nothing.
    pub background: Color,

    /// Groups with more children than this are split into a BVH before
    /// rendering. `None` leaves the scene graph as built.
    pub bvh_threshold: Option<usize>,

    /// Render columns on the rayon pool rather than one after another.
    pub parallel: bool,

    /// Seeds area light sampling. Without a seed, every render differs.
    pub seed: Option<u64>,
}

impl Default for RenderConfig {
    fn default() -> RenderConfig {
        RenderConfig {
            max_depth: DEFAULT_MAX_DEPTH,
            background: Color::black(),
            bvh_threshold: Some(DEFAULT_BVH_THRESHOLD),
            parallel: true,
            seed: None,
        }
    }
}

#[test]
fn partial_render_section_keeps_defaults() {
    let config: RenderConfig = serde_json::from_str(r#"{
        "max_depth": 2,
        "background": [0.1, 0.2, 0.3]
    }"#).unwrap();

    assert_eq!(config.max_depth, 2);
    assert_eq!(config.background, Color::rgb(0.1, 0.2, 0.3));
    assert_eq!(config.bvh_threshold, Some(DEFAULT_BVH_THRESHOLD));
    assert!(config.parallel);
    assert_eq!(config.seed, None);

    let config: RenderConfig = serde_json::from_str(
        r#"{ "bvh_threshold": null, "parallel": false, "seed": 42 }"#
    ).unwrap();
    assert_eq!(config.bvh_threshold, None);
    assert!(!config.parallel);
    assert_eq!(config.seed, Some(42));
}
