//! Blueprint Processor Integration Tests

use std::fs;
use std::path::Path;

use serde_json::json;

use project_util::blueprint::run_project;
use project_util::{Artefact, Blueprint, BlueprintProcessor, ProjectNode, Result};

/// Draws one solid frame per colour listed in the blueprint
struct SwatchProcessor {
    project: ProjectNode,
}

impl BlueprintProcessor for SwatchProcessor {
    fn project(&self) -> &ProjectNode {
        &self.project
    }

    fn project_mut(&mut self) -> &mut ProjectNode {
        &mut self.project
    }

    fn process(&mut self, blueprint: &dyn Blueprint) -> Result<()> {
        let recipe: serde_json::Value = serde_json::from_str(&blueprint.export()?)?;
        let frames = self.project_mut().add_child("frames")?;
        let mut artefact = Artefact::with_size("swatch.png", 2, 2)?;

        for (i, level) in recipe["levels"].as_array().into_iter().flatten().enumerate() {
            let level = level.as_u64().unwrap_or(0).min(255) as u8;
            artefact.fill([level, level, level]);
            artefact.save(frames, Some(&format!("{:02}", i)))?;
        }
        Ok(())
    }
}

#[test]
fn test_processor_saves_frames_and_blueprint() {
    let dir = tempfile::tempdir().unwrap();
    let mut processor = SwatchProcessor {
        project: run_project("swatches", dir.path(), true).unwrap(),
    };
    let blueprint = json!({ "levels": [0, 128, 255] });

    processor.process(&blueprint).unwrap();
    let saved = processor.save_blueprint(&blueprint, "blueprint.json").unwrap();

    let frames = processor.project().child("frames").unwrap();
    let mut names = frames.list_images().unwrap();
    names.sort();
    assert_eq!(names, vec!["swatch00.png", "swatch01.png", "swatch02.png"]);

    let text = fs::read_to_string(&saved).unwrap();
    assert!(text.contains("\"levels\""));
    assert_eq!(
        Path::new(&saved).parent().unwrap(),
        Path::new(processor.project().location())
    );
}

#[test]
fn test_processing_twice_conflicts_on_folder() {
    let dir = tempfile::tempdir().unwrap();
    let mut processor = SwatchProcessor {
        project: run_project("swatches", dir.path(), false).unwrap(),
    };
    let blueprint = json!({ "levels": [1] });

    processor.process(&blueprint).unwrap();
    let err = processor.process(&blueprint).unwrap_err();

    assert_eq!(err.error_code(), "NAME_CONFLICT");
}
