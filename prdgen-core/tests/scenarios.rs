use std::collections::BTreeSet;

use prdgen_core::extract::default_requirements;
use prdgen_core::extract::tech::BASE_STACK;
use prdgen_core::{
    audit, extract, GenerateOutcome, GeneratedArtifact, IterationController, ProjectExporter,
    Requirement, RequirementCategory, RequirementPriority, RequirementStatus, RequirementsStore,
    Storage, DEFAULT_APP_NAME,
};
use tempfile::TempDir;

const TASKMASTER: &str = "Title: TaskMaster\nUsers must be able to create tasks. This is critical.\nThe UI should be responsive.";

fn analyzed_store(text: &str) -> RequirementsStore {
    let result = extract(text);
    let mut store = RequirementsStore::new();
    store.set_analysis(result.metadata(), result.requirements);
    store
}

#[test]
fn test_taskmaster_scenario() {
    let result = extract(TASKMASTER);
    assert_eq!(result.name, "TaskMaster");

    assert!(result.requirements.iter().any(|r| {
        r.category == RequirementCategory::Functional
            && r.priority == RequirementPriority::High
            && r.description.starts_with("Users must be able to create tasks")
    }));
    assert!(result
        .requirements
        .iter()
        .any(|r| r.category == RequirementCategory::Ui && r.description.contains("responsive")));
}

#[test]
fn test_empty_document_scenario() {
    let result = extract("");
    assert_eq!(result.name, DEFAULT_APP_NAME);
    assert_eq!(result.requirements, default_requirements());
    assert_eq!(result.technology_set, BASE_STACK.to_vec());
}

#[test]
fn test_two_of_three_covered_scenario() {
    let requirements = default_requirements();
    let artifact = GeneratedArtifact {
        id: "app-component".to_string(),
        path: "App.tsx".to_string(),
        source_code: String::new(),
        test_code: None,
        satisfied_requirement_ids: ["req-1", "req-2"].iter().map(|s| s.to_string()).collect(),
    };

    let report = audit(&requirements, &[artifact]);
    assert_eq!(report.total_requirements, 3);
    assert_eq!(report.covered_requirements, 2);
    assert!((report.coverage_percent - 66.7).abs() < 0.05);
    assert_eq!(report.uncovered_descriptions.len(), 1);
    assert_eq!(report.summary(), "2/3 requirements covered (66.7%)");
}

#[test]
fn test_default_requirements_are_fully_covered_after_one_pass() {
    let mut store = analyzed_store("");
    let controller = IterationController::default();

    let outcome = controller.generate(&mut store);
    assert_eq!(outcome.iteration(), 1);

    let report = audit(&store.requirements, &store.artifacts);
    assert!(report.is_complete(), "{}", report);
    assert!(report.uncovered_descriptions.is_empty());
}

#[test]
fn test_every_claimed_id_exists_and_every_artifact_has_a_test() {
    let mut store = analyzed_store(TASKMASTER);
    IterationController::default().generate(&mut store);

    let ids: BTreeSet<&str> = store.requirements.iter().map(|r| r.id.as_str()).collect();
    assert!(!store.artifacts.is_empty());
    for artifact in &store.artifacts {
        for claimed in &artifact.satisfied_requirement_ids {
            assert!(ids.contains(claimed.as_str()), "{} claims {}", artifact.id, claimed);
        }
        let test = artifact.test_code.as_deref().unwrap_or_default();
        assert!(!test.is_empty(), "{} has no test", artifact.id);
    }
}

#[test]
fn test_three_passes_then_refusal() {
    let mut store = analyzed_store("");
    let controller = IterationController::default();

    for _ in 0..3 {
        assert!(!controller.generate(&mut store).is_refused());
    }
    let before = store.clone();

    let outcome = controller.generate(&mut store);
    assert_eq!(outcome, GenerateOutcome::Refused { iteration: 3, max: 3 });
    assert_eq!(store, before);
}

#[test]
fn test_annotations_accumulate_across_passes() {
    let mut store = analyzed_store("");
    let controller = IterationController::default();
    for _ in 0..3 {
        controller.generate(&mut store);
    }

    let app = store.get_artifact("app-component").unwrap();
    assert!(app.source_code.contains("// Iteration 2 improvements:"));
    assert!(app.source_code.contains("// Iteration 3 improvements:"));
    let second = app.source_code.find("Iteration 2").unwrap();
    let third = app.source_code.find("Iteration 3").unwrap();
    assert!(second < third);

    let css = store.get_artifact("app-css").unwrap();
    assert!(css.source_code.contains("/* Iteration 3 improvements:"));
}

#[test]
fn test_reanalysis_restarts_iteration_counter() {
    let mut store = analyzed_store(TASKMASTER);
    let controller = IterationController::new(1);
    controller.generate(&mut store);
    assert!(!controller.can_generate(&store));

    let result = extract("Title: Notes\n- Users should be able to tag notes");
    store.set_analysis(result.metadata(), result.requirements);
    assert_eq!(store.current_iteration, 0);
    assert!(store.artifacts.is_empty());
    assert!(controller.can_generate(&store));
}

#[test]
fn test_manual_requirement_is_claimed_on_next_pass() {
    let mut store = analyzed_store("");
    let controller = IterationController::default();
    controller.generate(&mut store);

    let id = store
        .add_requirement_at(
            1_700_000_000_000,
            RequirementCategory::Ui,
            "Add a primary button to start a tour",
            RequirementPriority::Low,
        )
        .unwrap()
        .id
        .clone();

    assert!(!audit(&store.requirements, &store.artifacts).is_complete());

    controller.generate(&mut store);
    let button = store.get_artifact("button-component").unwrap();
    assert!(button.satisfies(&id));
    assert!(audit(&store.requirements, &store.artifacts).is_complete());
}

#[test]
fn test_session_round_trip_through_storage() {
    let dir = TempDir::new().unwrap();
    let storage = Storage::new(dir.path().join("session.yaml"));

    storage
        .update_atomically(|store| {
            let result = extract(TASKMASTER);
            store.set_analysis(result.metadata(), result.requirements);
            IterationController::default().generate(store);
            store.mark_implemented()
        })
        .unwrap();

    let loaded = storage.load().unwrap();
    assert_eq!(loaded.metadata.name, "TaskMaster");
    assert_eq!(loaded.current_iteration, 1);
    assert!(loaded
        .requirements
        .iter()
        .filter(|r| loaded.artifacts.iter().any(|a| a.satisfies(&r.id)))
        .all(|r: &Requirement| r.status == RequirementStatus::Implemented));
}

#[test]
fn test_generated_project_writes_sources_and_tests() {
    let dir = TempDir::new().unwrap();
    let mut store = analyzed_store(TASKMASTER);
    IterationController::default().generate(&mut store);

    let written = ProjectExporter::new().write_to(&store, dir.path()).unwrap();
    assert!(!written.is_empty());

    assert!(dir.path().join("package.json").exists());
    assert!(dir.path().join("src/App.tsx").exists());
    assert!(dir.path().join("src/App.test.tsx").exists());

    let readme = std::fs::read_to_string(dir.path().join("README.md")).unwrap();
    assert!(readme.contains("TaskMaster"));
}
