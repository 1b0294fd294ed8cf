//! Moving tasks around, within a day or to another day

use std::time::Duration;

use study_planner::error::Operation;
use study_planner::mock::{MockBehaviour, RemoteCall};
use study_planner::planner::drag::{DragGesture, DragOutcome, DropLocation};
use study_planner::view::{DayView, TaskFilter};
use study_planner::{PlannerError, Priority};

use scenarii::{assert_consistent, day, id_at, loaded_planner, subjects, two_days};

fn at(date: &str, index: usize) -> DropLocation {
    DropLocation::new(day(date), index)
}


#[tokio::test]
async fn move_to_the_end_of_another_day() {
    let (planner, _notices) = loaded_planner(two_days()).await;
    let algebra = id_at(&planner, "2025-01-10", 0);

    let outcome = planner.on_drag_end(DragGesture::new(at("2025-01-10", 0), Some(at("2025-01-11", 2)))).await.unwrap();

    let moved = match outcome {
        DragOutcome::Moved(task) => task,
        DragOutcome::Ignored => panic!("the task should have been moved"),
    };
    assert_eq!(moved.id(), &algebra);
    assert_eq!(moved.date(), &day("2025-01-11"));
    assert_eq!(subjects(&planner, "2025-01-10"), vec!["Biology"]);
    assert_eq!(subjects(&planner, "2025-01-11"), vec!["Chemistry", "Drawing", "Algebra"]);
    // Completion and priority went along
    let tasks = planner.day(&day("2025-01-11"));
    assert_eq!(tasks[2].completed(), true);
    assert_eq!(tasks[2].priority(), Priority::High);

    assert!(planner.remote().calls().contains(&RemoteCall::Move(algebra, day("2025-01-11"))));
    assert_eq!(planner.remote().data()[&day("2025-01-11")].len(), 3);
    assert_consistent(&planner);
}

#[tokio::test]
async fn move_between_two_tasks() {
    let (planner, _notices) = loaded_planner(two_days()).await;

    planner.on_drag_end(DragGesture::new(at("2025-01-10", 0), Some(at("2025-01-11", 1)))).await.unwrap();

    assert_eq!(subjects(&planner, "2025-01-11"), vec!["Chemistry", "Algebra", "Drawing"]);
    assert_consistent(&planner);
}

#[tokio::test]
async fn destination_index_is_clamped() {
    let (planner, _notices) = loaded_planner(two_days()).await;

    planner.on_drag_end(DragGesture::new(at("2025-01-11", 0), Some(at("2025-01-10", 42)))).await.unwrap();

    assert_eq!(subjects(&planner, "2025-01-10"), vec!["Algebra", "Biology", "Chemistry"]);
    assert_eq!(subjects(&planner, "2025-01-11"), vec!["Drawing"]);
}

#[tokio::test]
async fn reorder_within_a_day() {
    let (planner, _notices) = loaded_planner(two_days()).await;

    planner.on_drag_end(DragGesture::new(at("2025-01-10", 0), Some(at("2025-01-10", 1)))).await.unwrap();

    assert_eq!(subjects(&planner, "2025-01-10"), vec!["Biology", "Algebra"]);
    assert_eq!(subjects(&planner, "2025-01-11"), vec!["Chemistry", "Drawing"]);
    assert_consistent(&planner);
}

#[tokio::test]
async fn move_to_an_empty_day() {
    let (planner, _notices) = loaded_planner(two_days()).await;

    planner.on_drag_end(DragGesture::new(at("2025-01-11", 1), Some(at("2025-01-15", 0)))).await.unwrap();

    assert_eq!(subjects(&planner, "2025-01-15"), vec!["Drawing"]);
    assert_eq!(planner.day(&day("2025-01-15"))[0].date(), &day("2025-01-15"));
    assert_consistent(&planner);
}

#[tokio::test]
async fn gestures_without_effect() {
    let (planner, _notices) = loaded_planner(two_days()).await;

    let dropped_outside = planner.on_drag_end(DragGesture::new(at("2025-01-10", 0), None)).await.unwrap();
    let dropped_in_place = planner.on_drag_end(DragGesture::new(at("2025-01-11", 1), Some(at("2025-01-11", 1)))).await.unwrap();

    assert_eq!(dropped_outside, DragOutcome::Ignored);
    assert_eq!(dropped_in_place, DragOutcome::Ignored);
    assert_eq!(planner.snapshot(), two_days());
    assert_eq!(planner.remote().calls(), vec![RemoteCall::ListAll]);
}

#[tokio::test]
async fn failed_moves_restore_both_days() {
    let (planner, notices) = loaded_planner(two_days()).await;
    planner.remote().set_behaviour(MockBehaviour{ move_behaviour: (0, 2), ..MockBehaviour::default() });

    let result = planner.on_drag_end(DragGesture::new(at("2025-01-10", 0), Some(at("2025-01-11", 1)))).await;
    assert!(matches!(result, Err(PlannerError::Persistence{ operation: Operation::Move, .. })));
    assert!(notices.borrow().is_error());
    assert_eq!(planner.snapshot(), two_days());

    // A day that did not exist before the move does not exist after its rollback either
    let result = planner.on_drag_end(DragGesture::new(at("2025-01-10", 1), Some(at("2025-01-20", 0)))).await;
    assert!(result.is_err());
    assert_eq!(planner.snapshot(), two_days());
    assert!(planner.read(|store| store.days().all(|(date, _)| date != &day("2025-01-20"))));
}

#[tokio::test]
async fn failed_moves_keep_concurrent_moves() {
    let (planner, _notices) = loaded_planner(two_days()).await;
    // Algebra's move is answered last, and refused. Biology's move is answered first, and accepted
    planner.remote().set_behaviour(MockBehaviour{ move_behaviour: (1, 1), ..MockBehaviour::default() });
    planner.remote().script_latencies(vec![Duration::from_millis(60), Duration::from_millis(5)]);

    let (algebra_moved, biology_moved) = tokio::join!(
        planner.on_drag_end(DragGesture::new(at("2025-01-10", 0), Some(at("2025-01-11", 2)))),
        // Once Algebra has left, Biology is the first task of its day
        planner.on_drag_end(DragGesture::new(at("2025-01-10", 0), Some(at("2025-01-15", 0)))),
    );

    assert!(algebra_moved.is_err());
    assert!(biology_moved.is_ok());
    assert_eq!(subjects(&planner, "2025-01-10"), vec!["Algebra"]);
    assert_eq!(subjects(&planner, "2025-01-11"), vec!["Chemistry", "Drawing"]);
    assert_eq!(subjects(&planner, "2025-01-15"), vec!["Biology"]);
    assert_consistent(&planner);
    assert_eq!(&planner.remote().data(), planner.snapshot().as_map());
}

#[tokio::test]
async fn failed_moves_keep_concurrent_deletions() {
    let (planner, _notices) = loaded_planner(two_days()).await;
    let biology = id_at(&planner, "2025-01-10", 1);
    let jan_10 = day("2025-01-10");
    planner.remote().set_behaviour(MockBehaviour{ move_behaviour: (0, 1), ..MockBehaviour::default() });
    planner.remote().script_latencies(vec![Duration::from_millis(60), Duration::from_millis(5)]);

    let (moved, deleted) = tokio::join!(
        planner.on_drag_end(DragGesture::new(at("2025-01-10", 0), Some(at("2025-01-11", 0)))),
        planner.delete_task(&jan_10, &biology),
    );

    assert!(moved.is_err());
    assert!(deleted.is_ok());
    // The deleted task does not come back with the rollback of the move
    assert_eq!(subjects(&planner, "2025-01-10"), vec!["Algebra"]);
    assert_eq!(planner.read(|store| store.find(&biology)), None);
    assert_eq!(subjects(&planner, "2025-01-11"), vec!["Chemistry", "Drawing"]);
    assert_consistent(&planner);
    assert_eq!(&planner.remote().data(), planner.snapshot().as_map());
}

#[tokio::test]
async fn invalid_source_positions() {
    let (planner, _notices) = loaded_planner(two_days()).await;

    let past_the_end = planner.on_drag_end(DragGesture::new(at("2025-01-10", 2), Some(at("2025-01-11", 0)))).await;
    let empty_day = planner.on_drag_end(DragGesture::new(at("2025-02-01", 0), Some(at("2025-01-11", 0)))).await;

    assert!(matches!(past_the_end, Err(PlannerError::InvalidPosition{ index: 2, .. })));
    assert!(matches!(empty_day, Err(PlannerError::InvalidPosition{ .. })));
    assert_eq!(planner.snapshot(), two_days());
    assert_eq!(planner.remote().calls(), vec![RemoteCall::ListAll]);
}

#[tokio::test]
async fn filtered_views_map_back_to_buckets() {
    let (planner, _notices) = loaded_planner(two_days()).await;

    // Only "Drawing" is displayed on 2025-01-11, at position 0 of the view
    let source_index = planner.read(|store| {
        let view = DayView::new(store, day("2025-01-11"), &TaskFilter::new(Some(Priority::High), ""));
        assert_eq!(view.entries.len(), 1);
        view.bucket_index(0)
    });
    assert_eq!(source_index, 1);

    planner.on_drag_end(DragGesture::new(at("2025-01-11", source_index), Some(at("2025-01-10", 0)))).await.unwrap();
    assert_eq!(subjects(&planner, "2025-01-10"), vec!["Drawing", "Algebra", "Biology"]);
}

#[tokio::test]
async fn busy_tasks_cannot_be_dragged() {
    let (planner, _notices) = loaded_planner(two_days()).await;
    let biology = id_at(&planner, "2025-01-10", 1);
    let jan_10 = day("2025-01-10");
    planner.remote().set_latency(Some(Duration::from_millis(20)));

    let (toggled, dragged) = tokio::join!(
        planner.toggle_complete(&jan_10, &biology),
        planner.on_drag_end(DragGesture::new(at("2025-01-10", 1), Some(at("2025-01-11", 0)))),
    );

    assert!(toggled.is_ok());
    assert!(matches!(dragged, Err(PlannerError::TaskBusy(_))));
    assert_eq!(subjects(&planner, "2025-01-10"), vec!["Algebra", "Biology"]);
}
