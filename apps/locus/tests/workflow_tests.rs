//! Search-localize-guide workflow tests.

#![allow(clippy::unwrap_used, clippy::panic)]

mod common;

use common::{broken_store, grocery_store, query_image, workflow};
use locus::workflow::WorkflowStatus;

#[tokio::test]
async fn missing_coordinator_is_reported_first() {
    let dir = tempfile::tempdir().unwrap();
    let store = grocery_store(dir.path());
    let image = query_image(dir.path(), "query.jpg");

    let result = workflow(&store, None).run("milk", &image, false).await;

    assert!(!result.success);
    assert_eq!(result.workflow_status, WorkflowStatus::ServiceNotInitialized);
    assert_eq!(
        result.error_message.as_deref(),
        Some("Workflow failed at service_not_initialized stage")
    );
    assert!(result.search_results.is_empty());
}

#[tokio::test]
async fn search_stage_runs_off_the_runtime() {
    let dir = tempfile::tempdir().unwrap();
    let store = grocery_store(dir.path());

    let matches = workflow(&store, None).search("2% milk").await.unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].frame_id.value(), 11);
}

#[cfg(unix)]
mod with_engine {
    use super::*;
    use common::{coordinator, fake_engine, leftovers};
    use locus_core::FrameId;
    use std::time::Duration;

    #[tokio::test]
    async fn zero_matches_never_starts_the_engine() {
        let dir = tempfile::tempdir().unwrap();
        let store = grocery_store(dir.path());
        let marker = dir.path().join("engine-ran");
        let engine = fake_engine(
            dir.path(),
            "engine.sh",
            &format!("touch \"{}\"", marker.display()),
        );
        let image = query_image(dir.path(), "query.jpg");
        let c = coordinator(&engine, &store, Duration::from_secs(10), None);

        let result = workflow(&store, Some(c)).run("anchovies", &image, true).await;

        assert!(result.success);
        assert_eq!(result.workflow_status, WorkflowStatus::NoMatches);
        assert_eq!(result.total_matches, 0);
        assert!(result.localization_results.is_none());
        assert!(result.navigation_guidance.is_none());
        assert!(result.error_message.is_none());
        let timing = result.timing.unwrap();
        assert!(timing.localization_ms.abs() < f64::EPSILON);
        assert!(!marker.exists());
    }

    #[tokio::test]
    async fn store_failure_is_search_failed() {
        let dir = tempfile::tempdir().unwrap();
        let store = broken_store(dir.path());
        let engine = fake_engine(dir.path(), "engine.sh", "exit 0");
        let image = query_image(dir.path(), "query.jpg");
        let c = coordinator(&engine, &store, Duration::from_secs(10), None);

        let result = workflow(&store, Some(c)).run("milk", &image, false).await;

        assert!(!result.success);
        assert_eq!(result.workflow_status, WorkflowStatus::SearchFailed);
        assert!(result.timing.is_none());
    }

    #[tokio::test]
    async fn completed_workflow_guides_to_the_nearest_frame() {
        let dir = tempfile::tempdir().unwrap();
        let store = grocery_store(dir.path());
        let engine = fake_engine(
            dir.path(),
            "engine.sh",
            r#"echo "iteration(1) loop(10) hyp(0.35)""#,
        );
        let image = query_image(dir.path(), "query.jpg");
        let c = coordinator(&engine, &store, Duration::from_secs(10), None);

        let result = workflow(&store, Some(c)).run("milk", &image, true).await;

        assert!(result.success, "{:?}", result.error_message);
        assert_eq!(result.workflow_status, WorkflowStatus::Completed);
        assert_eq!(result.total_matches, 2);
        assert!(result.multiple_frames_found);
        assert_eq!(result.nearest_frame_id, Some(FrameId(10)));
        assert_eq!(result.total_distance_to_target, Some(0.0));

        let plan = result.navigation_guidance.as_ref().unwrap();
        assert!(plan.guidance.arrived);
        assert!(plan.multiple_frames_message.is_some());

        // Re-sorted nearest first: frame 10 at 0 m, frame 11 at ~3.16 m.
        assert_eq!(result.search_results[0].frame_id, FrameId(10));
        assert_eq!(result.search_results[0].distance_from_user, Some(0.0));
        let far = result.search_results[1].distance_from_user.unwrap();
        assert!((far - 10f64.sqrt()).abs() < 1e-9);

        let loc = result.localization_results.as_ref().unwrap();
        assert_eq!(loc.frame_id, FrameId(10));
        assert!(result.timing.is_some());
    }

    #[tokio::test]
    async fn no_match_keeps_search_results() {
        let dir = tempfile::tempdir().unwrap();
        let store = grocery_store(dir.path());
        let engine = fake_engine(
            dir.path(),
            "engine.sh",
            r#"echo "iteration(1) loop(42) hyp(0.003)""#,
        );
        let image = query_image(dir.path(), "query.jpg");
        let c = coordinator(&engine, &store, Duration::from_secs(10), None);

        let result = workflow(&store, Some(c)).run("2% milk", &image, false).await;

        assert!(!result.success);
        assert_eq!(result.workflow_status, WorkflowStatus::LocalizationFailed);
        assert_eq!(result.total_matches, 1);
        assert_eq!(result.search_results[0].frame_id, FrameId(11));
        assert!(result.localization_results.is_none());
        assert!(result.navigation_guidance.is_none());
        assert_eq!(
            result.error_message.as_deref(),
            Some("Workflow failed at localization_failed stage")
        );
    }

    #[tokio::test]
    async fn engine_timeout_status() {
        let dir = tempfile::tempdir().unwrap();
        let ws = tempfile::tempdir().unwrap();
        let store = grocery_store(dir.path());
        let engine = fake_engine(dir.path(), "engine.sh", "exec sleep 30");
        let image = query_image(dir.path(), "query.jpg");
        let c = coordinator(
            &engine,
            &store,
            Duration::from_secs(1),
            Some(ws.path().to_path_buf()),
        );

        let result = workflow(&store, Some(c)).run("milk", &image, true).await;

        assert_eq!(result.workflow_status, WorkflowStatus::LocalizationTimeout);
        assert_eq!(result.total_matches, 2);
        assert!(result.timing.unwrap().localization_ms >= 1000.0);
        assert!(leftovers(ws.path()).is_empty());
    }

    #[tokio::test]
    async fn result_serializes_with_snake_case_status() {
        let dir = tempfile::tempdir().unwrap();
        let store = grocery_store(dir.path());
        let engine = fake_engine(
            dir.path(),
            "engine.sh",
            r#"echo "iteration(1) loop(11) hyp(0.35)""#,
        );
        let image = query_image(dir.path(), "query.jpg");
        let c = coordinator(&engine, &store, Duration::from_secs(10), None);

        let result = workflow(&store, Some(c)).run("cereal", &image, false).await;
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["workflow_status"], "completed");
        assert_eq!(json["nearest_frame_id"], 11);
        assert_eq!(json["navigation_guidance"]["target_object"], "cereal");
        assert_eq!(json["localization_results"]["frame_id"], 11);
        assert!(json.get("timing").is_none());
    }
}
