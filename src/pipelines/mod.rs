//! Render pipeline construction, one module per pass.
//!
//! - `scene` draws the normal-mapped game entities into the offscreen target
//! - `skybox` draws the cubemap behind everything already rendered
//! - `blur` copies the offscreen target to the back buffer through a box blur
//! - `overlay` draws the HUD quads on top of the blurred frame
//! - `lights` owns the light uniforms shared by the scene pass

pub mod blur;
pub mod lights;
pub mod overlay;
pub mod scene;
pub mod skybox;
