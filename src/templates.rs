//! Embedded template assets.
//!
//! The generated `.vscode` files start life as verbatim copies of these
//! templates and are rewritten in place from current settings. The
//! Makefile is the companion build script the synthesized tasks invoke.

pub const TASKS_TEMPLATE: &str = include_str!("../assets/tasks_template.json");
pub const PROPERTIES_TEMPLATE: &str = include_str!("../assets/properties_template.json");
pub const LAUNCH_TEMPLATE: &str = include_str!("../assets/launch_template.json");
pub const MAKEFILE: &str = include_str!("../assets/Makefile");
