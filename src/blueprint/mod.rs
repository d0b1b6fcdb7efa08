//! Blueprints
//!
//! A blueprint is the recipe behind a generation run. It can be rendered as
//! human-readable text and saved next to the artefacts it produced, so every
//! run directory documents how it was made.

use std::path::Path;

use crate::error::Result;
use crate::project::ProjectNode;

/// A recipe that can be printed or saved as a text file
pub trait Blueprint {
    /// Human-readable rendering (JSON, YAML, plain text...)
    fn export(&self) -> Result<String>;
}

impl Blueprint for serde_json::Value {
    fn export(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Turns blueprints into artefacts saved under a per-run project
pub trait BlueprintProcessor {
    /// Root project of the current run
    fn project(&self) -> &ProjectNode;

    fn project_mut(&mut self) -> &mut ProjectNode;

    /// Generate and save the artefacts described by `blueprint`
    fn process(&mut self, blueprint: &dyn Blueprint) -> Result<()>;

    /// Store the blueprint itself in the run directory
    fn save_blueprint(&self, blueprint: &dyn Blueprint, file_name: &str) -> Result<String> {
        self.project().save_blueprint(blueprint, file_name)
    }
}

/// Create the run project a processor writes into.
///
/// With `timestamped` the directory is `{name}-{timestamp}` so repeated runs
/// never collide.
pub fn run_project(name: &str, parent_dir: impl AsRef<Path>, timestamped: bool) -> Result<ProjectNode> {
    if timestamped {
        ProjectNode::for_run(name, parent_dir)
    } else {
        ProjectNode::local(name, parent_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_blueprint_export() {
        let blueprint = json!({ "shape": "trapezoid", "frames": 24 });
        let text = blueprint.export().unwrap();

        assert!(text.contains("\"shape\": \"trapezoid\""));
        assert!(text.contains('\n'));
    }

    #[test]
    fn test_run_project_naming() {
        let dir = tempfile::tempdir().unwrap();

        let plain = run_project("figures", dir.path(), false).unwrap();
        assert_eq!(plain.name(), "figures");

        let stamped = run_project("figures", dir.path(), true).unwrap();
        assert!(stamped.name().starts_with("figures-20"));
    }
}
