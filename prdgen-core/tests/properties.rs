//! Property tests over extraction, the store, coverage and iteration.

use std::collections::BTreeSet;

use prdgen_core::{
    audit, extract, synthesize, AppMetadata, GeneratedArtifact, IterationController, Requirement,
    RequirementCategory, RequirementPriority, RequirementsStore, DEFAULT_MAX_ITERATIONS,
};
use proptest::prelude::*;

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

fn arb_category() -> impl Strategy<Value = RequirementCategory> {
    prop::sample::select(RequirementCategory::all().to_vec())
}

fn arb_priority() -> impl Strategy<Value = RequirementPriority> {
    prop::sample::select(RequirementPriority::all().to_vec())
}

/// Lines that look like document content: headings, bullets, requirement sentences, noise
fn arb_line() -> impl Strategy<Value = String> {
    prop_oneof![
        "[A-Za-z ]{0,30}",
        "(# |## |- |\\* |1\\. )[A-Za-z ]{0,20}",
        "(Users|The system|The UI) (must|should|shall|can) [a-z ]{3,40}",
        "(Title|Name|Overview): [A-Za-z]{1,15}",
        "  [a-z ]{0,20}",
        Just(String::new()),
    ]
}

fn arb_document() -> impl Strategy<Value = String> {
    prop::collection::vec(arb_line(), 0..20).prop_map(|lines| lines.join("\n"))
}

fn arb_requirements() -> impl Strategy<Value = Vec<Requirement>> {
    prop::collection::vec(
        (arb_category(), arb_priority(), "[a-z ]{1,40}"),
        0..8,
    )
    .prop_map(|specs| {
        specs
            .into_iter()
            .enumerate()
            .map(|(i, (category, priority, text))| {
                let description = format!("requirement {} {}", i + 1, text);
                Requirement::new(format!("req-{}", i + 1), category, &description, priority)
            })
            .collect()
    })
}

fn metadata() -> AppMetadata {
    AppMetadata {
        name: "Prop App".to_string(),
        description: "Generated under test".to_string(),
        technology_set: vec!["React".to_string()],
    }
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    /// Same text in, same analysis out, and never an empty requirement list.
    #[test]
    fn extraction_is_deterministic_and_nonempty(text in arb_document()) {
        let first = extract(&text);
        prop_assert_eq!(&first, &extract(&text));
        prop_assert!(!first.requirements.is_empty());
        prop_assert!(!first.name.is_empty());
        prop_assert!(!first.technology_set.is_empty());
    }

    /// Arbitrary unicode input never panics and still yields requirements.
    #[test]
    fn extraction_total_on_any_text(text in "\\PC{0,200}") {
        let result = extract(&text);
        prop_assert!(!result.requirements.is_empty());
        for req in &result.requirements {
            prop_assert!(req.description.chars().count() <= 100);
        }
    }

    /// Extracted ids are `req-1..req-n` in order.
    #[test]
    fn extracted_ids_are_sequential(text in arb_document()) {
        let result = extract(&text);
        for (index, req) in result.requirements.iter().enumerate() {
            prop_assert_eq!(&req.id, &format!("req-{}", index + 1));
        }
    }

    /// Manual additions at the same instant still get distinct ids.
    #[test]
    fn manual_ids_never_collide(
        millis in 0i64..1_000_000,
        count in 1usize..12,
        category in arb_category(),
        priority in arb_priority(),
    ) {
        let mut store = RequirementsStore::new();
        for i in 0..count {
            let description = format!("Manual requirement {}", i);
            prop_assert!(store.add_requirement_at(millis, category, &description, priority).is_ok());
        }
        let ids: BTreeSet<&str> = store.requirements.iter().map(|r| r.id.as_str()).collect();
        prop_assert_eq!(ids.len(), count);
    }

    /// Coverage stays within bounds and is zero only when nothing is covered.
    #[test]
    fn coverage_is_bounded(
        requirements in arb_requirements(),
        claims in prop::collection::vec(prop::collection::btree_set(1usize..10, 0..5), 0..4),
    ) {
        let artifacts: Vec<GeneratedArtifact> = claims
            .into_iter()
            .enumerate()
            .map(|(i, ids)| GeneratedArtifact {
                id: format!("artifact-{}", i),
                path: format!("components/A{}.tsx", i),
                source_code: String::new(),
                test_code: None,
                satisfied_requirement_ids: ids.into_iter().map(|n| format!("req-{}", n)).collect(),
            })
            .collect();

        let report = audit(&requirements, &artifacts);
        prop_assert!(report.coverage_percent >= 0.0);
        prop_assert!(report.coverage_percent <= 100.0);
        prop_assert!(report.covered_requirements <= report.total_requirements);
        prop_assert_eq!(
            report.covered_requirements + report.uncovered_descriptions.len(),
            report.total_requirements
        );
        prop_assert_eq!(report.coverage_percent == 0.0, report.covered_requirements == 0);
    }

    /// The counter climbs by one per pass and stops at the maximum.
    #[test]
    fn iteration_counter_is_monotonic(requirements in arb_requirements(), passes in 0u32..7) {
        let controller = IterationController::default();
        let mut store = RequirementsStore::new();
        store.requirements = requirements;

        let mut last = 0;
        for _ in 0..passes {
            let outcome = controller.generate(&mut store);
            prop_assert!(store.current_iteration >= last);
            prop_assert!(store.current_iteration <= DEFAULT_MAX_ITERATIONS);
            prop_assert_eq!(outcome.is_refused(), last == DEFAULT_MAX_ITERATIONS);
            last = store.current_iteration;
        }
        prop_assert_eq!(store.current_iteration, passes.min(DEFAULT_MAX_ITERATIONS));
    }

    /// Only artifacts with a same-id predecessor carry the iteration annotation.
    #[test]
    fn annotation_only_on_carried_artifacts(
        first in arb_requirements(),
        second in arb_requirements(),
    ) {
        let meta = metadata();
        let prior = synthesize(&first, &meta, 1, &[]);
        let next = synthesize(&second, &meta, 2, &prior);

        let prior_ids: BTreeSet<&str> = prior.iter().map(|a| a.id.as_str()).collect();
        for artifact in &next {
            let annotated = artifact.source_code.contains("Iteration 2 improvements:");
            prop_assert_eq!(annotated, prior_ids.contains(artifact.id.as_str()), "{}", artifact.id);
        }
    }

    /// Every claimed id names a requirement of the same pass.
    #[test]
    fn claims_reference_known_requirements(requirements in arb_requirements()) {
        let artifacts = synthesize(&requirements, &metadata(), 1, &[]);
        let known: BTreeSet<&str> = requirements.iter().map(|r| r.id.as_str()).collect();
        for artifact in &artifacts {
            prop_assert!(artifact.test_code.is_some());
            for id in &artifact.satisfied_requirement_ids {
                prop_assert!(known.contains(id.as_str()));
            }
        }
    }
}
