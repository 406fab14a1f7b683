mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use agentos_lib::resource::ResourceSpec;
use agentos_lib::{
    ActionKind, ActionOutcome, AgentOsError, DetailState, ErrorPolicy, FetchOutcome,
    ListController, LoadState, NotificationLevel, NotificationSource, Record, ViewState,
};
use common::{
    controller, rows, spec, typed_rows, wait_for_get_calls, wait_for_list_calls, ScriptedService,
};
use serde_json::json;

fn row_ids(view: &ViewState<agentos_lib::Row>) -> Vec<String> {
    match view {
        ViewState::Rows(result) => result.rows.iter().map(|r| r.id().to_string()).collect(),
        other => panic!("expected rows, got {}", other.label()),
    }
}

// -- Fetch/load cycle --

#[tokio::test]
async fn mount_loads_first_page() {
    let service = Arc::new(ScriptedService::with_rows(typed_rows(60)));
    let ctl = controller(service.clone(), spec(), 25);
    assert_eq!(ctl.view(), ViewState::Idle);

    let outcome = ctl.mount().await;
    assert_eq!(outcome, FetchOutcome::Applied { rows: 25, total: 60 });
    assert_eq!(ctl.load_state(), LoadState::Success);
    assert_eq!(ctl.pagination().page_count(), 3);
    assert_eq!(service.list_calls(), 1);
}

#[tokio::test]
async fn empty_result_renders_empty_state() {
    let service = Arc::new(ScriptedService::with_rows(vec![]));
    let ctl = controller(service, spec(), 25);
    ctl.mount().await;
    assert_eq!(ctl.view(), ViewState::Empty);
    assert_eq!(ctl.load_state(), LoadState::Success);
}

#[tokio::test]
async fn loading_state_is_exclusive() {
    let service = Arc::new(ScriptedService::with_rows(typed_rows(3)));
    let ctl = controller(service.clone(), spec(), 25);

    let release = service.hold_next_list();
    let task = tokio::spawn({
        let ctl = ctl.clone();
        async move { ctl.mount().await }
    });
    wait_for_list_calls(&service, 1).await;
    assert_eq!(ctl.view(), ViewState::Loading { previous: None });

    release.send(()).unwrap();
    task.await.unwrap();
    assert_eq!(ctl.view().label(), "rows");
}

// -- Pagination --

#[tokio::test]
async fn set_page_clamps_to_last_page() {
    let service = Arc::new(ScriptedService::with_rows(typed_rows(60)));
    let ctl = controller(service.clone(), spec(), 25);
    ctl.mount().await;

    assert_eq!(
        ctl.set_page(2).await,
        FetchOutcome::Applied { rows: 10, total: 60 }
    );
    let ids = row_ids(&ctl.view());
    assert_eq!(ids.first().map(String::as_str), Some("row-050"));
    assert_eq!(ids.last().map(String::as_str), Some("row-059"));

    ctl.set_page(3).await;
    assert_eq!(ctl.pagination().page(), 2);
    assert_eq!(service.last_query().unwrap().page, 2);
}

#[tokio::test]
async fn set_page_size_resets_page() {
    let service = Arc::new(ScriptedService::with_rows(typed_rows(60)));
    let ctl = controller(service.clone(), spec(), 25);
    ctl.mount().await;
    ctl.set_page(2).await;

    let outcome = ctl.set_page_size(10).await.unwrap();
    assert_eq!(outcome, FetchOutcome::Applied { rows: 10, total: 60 });
    assert_eq!(ctl.pagination().page(), 0);
    assert_eq!(ctl.pagination().page_count(), 6);
}

#[tokio::test]
async fn invalid_page_size_does_not_fetch() {
    let service = Arc::new(ScriptedService::with_rows(typed_rows(5)));
    let ctl = controller(service.clone(), spec(), 25);
    ctl.mount().await;

    assert!(matches!(
        ctl.set_page_size(0).await,
        Err(AgentOsError::InvalidInput(_))
    ));
    assert_eq!(service.list_calls(), 1);
}

#[tokio::test]
async fn page_stays_valid_when_total_shrinks() {
    let service = Arc::new(ScriptedService::with_rows(typed_rows(30)));
    let ctl = controller(service.clone(), spec(), 10);
    ctl.mount().await;
    ctl.set_page(2).await;

    for i in 20..30 {
        ctl.perform_action(ActionKind::Delete, &format!("row-{:03}", i), None)
            .await
            .unwrap();
    }
    let p = ctl.pagination();
    assert_eq!(p.total(), 20);
    assert!(p.page() < p.page_count());
    assert_eq!(row_ids(&ctl.view()).len(), 10);
}

#[tokio::test]
async fn deleting_last_row_of_last_page_shows_previous_page() {
    let service = Arc::new(ScriptedService::with_rows(typed_rows(21)));
    let ctl = controller(service.clone(), spec(), 10);
    ctl.mount().await;
    ctl.set_page(2).await;
    assert_eq!(row_ids(&ctl.view()), vec!["row-020"]);
    let calls_before = service.list_calls();

    let outcome = ctl
        .perform_action(ActionKind::Delete, "row-020", None)
        .await
        .unwrap();
    match outcome {
        ActionOutcome::Completed { reload, .. } => {
            assert_eq!(reload, FetchOutcome::Applied { rows: 10, total: 20 });
        }
        other => panic!("expected completed action, got {:?}", other),
    }

    let p = ctl.pagination();
    assert_eq!((p.total(), p.page(), p.page_count()), (20, 1, 2));
    let expected: Vec<String> = (10..20).map(|i| format!("row-{:03}", i)).collect();
    assert_eq!(row_ids(&ctl.view()), expected);
    assert_eq!(ctl.query().page, 1);
    assert_eq!(service.last_query().unwrap().page, 1);
    // The out-of-range page, then the clamped one.
    assert_eq!(service.list_calls(), calls_before + 2);
}

// -- Filters --

#[tokio::test]
async fn draft_edits_do_not_fetch() {
    let service = Arc::new(ScriptedService::with_rows(typed_rows(10)));
    let ctl = controller(service.clone(), spec(), 25);
    ctl.mount().await;

    ctl.set_draft("type", "A").unwrap();
    assert_eq!(service.list_calls(), 1);
    let snap = ctl.snapshot();
    assert_eq!(snap.draft_filters.get("type").map(String::as_str), Some("A"));
    assert!(snap.applied_filters.is_empty());
}

#[tokio::test]
async fn apply_filters_resets_page() {
    let service = Arc::new(ScriptedService::with_rows(typed_rows(60)));
    let ctl = controller(service.clone(), spec(), 25);
    ctl.mount().await;
    ctl.set_page(2).await;

    ctl.set_draft("type", "A").unwrap();
    let outcome = ctl.apply_filters().await;
    assert_eq!(outcome, FetchOutcome::Applied { rows: 25, total: 30 });
    assert_eq!(ctl.pagination().page(), 0);

    let sent = service.last_query().unwrap();
    assert_eq!(sent.page, 0);
    assert_eq!(sent.filters.get("type").map(String::as_str), Some("A"));
}

#[tokio::test]
async fn reset_filters_restores_defaults() {
    let service = Arc::new(ScriptedService::with_rows(typed_rows(60)));
    let ctl = controller(service.clone(), spec(), 25);
    ctl.set_draft("type", "B").unwrap();
    ctl.apply_filters().await;
    ctl.set_page(1).await;

    let outcome = ctl.reset_filters().await;
    assert_eq!(outcome, FetchOutcome::Applied { rows: 25, total: 60 });
    assert_eq!(ctl.pagination().page(), 0);
    let snap = ctl.snapshot();
    assert!(snap.draft_filters.is_empty());
    assert!(snap.applied_filters.is_empty());
}

#[tokio::test]
async fn unknown_filter_key_is_rejected() {
    let service = Arc::new(ScriptedService::with_rows(vec![]));
    let ctl = controller(service, spec(), 25);
    let err = ctl.set_draft("colour", "red").unwrap_err();
    assert!(err.to_string().contains("unknown filter 'colour'"));
}

#[tokio::test]
async fn client_side_filtering_uses_filtered_total() {
    let spec = ResourceSpec::builder("events", "/api/events")
        .filter("type", "type")
        .client_filtered(1000)
        .build();
    let service = Arc::new(ScriptedService::with_rows(typed_rows(60)));
    let ctl = controller(service.clone(), spec, 25);

    ctl.set_draft("type", "B").unwrap();
    let outcome = ctl.apply_filters().await;
    assert_eq!(outcome, FetchOutcome::Applied { rows: 25, total: 30 });

    let sent = service.last_query().unwrap();
    assert!(sent.filters.is_empty());
    assert_eq!(sent.page_size, 1000);

    assert_eq!(
        ctl.set_page(1).await,
        FetchOutcome::Applied { rows: 5, total: 30 }
    );
    match ctl.view() {
        ViewState::Rows(result) => {
            assert!(result.rows.iter().all(|r| r.field("type").as_deref() == Some("B")))
        }
        other => panic!("unexpected {:?}", other.label()),
    }
}

// -- Last request wins --

#[tokio::test]
async fn newer_fetch_wins_when_older_resolves_last() {
    let service = Arc::new(ScriptedService::with_rows(typed_rows(10)));
    let ctl = controller(service.clone(), spec(), 25);

    let release_a = service.hold_next_list();
    let release_b = service.hold_next_list();

    ctl.set_draft("type", "A").unwrap();
    let fetch_a = tokio::spawn({
        let ctl = ctl.clone();
        async move { ctl.apply_filters().await }
    });
    wait_for_list_calls(&service, 1).await;

    ctl.set_draft("type", "B").unwrap();
    let fetch_b = tokio::spawn({
        let ctl = ctl.clone();
        async move { ctl.apply_filters().await }
    });
    wait_for_list_calls(&service, 2).await;

    release_b.send(()).unwrap();
    assert!(fetch_b.await.unwrap().is_applied());
    release_a.send(()).unwrap();
    assert_eq!(fetch_a.await.unwrap(), FetchOutcome::Superseded);

    match ctl.view() {
        ViewState::Rows(result) => {
            assert_eq!(result.rows.len(), 5);
            assert!(result.rows.iter().all(|r| r.field("type").as_deref() == Some("B")));
        }
        other => panic!("unexpected {:?}", other.label()),
    }
}

#[tokio::test]
async fn newer_fetch_wins_when_older_resolves_first() {
    let service = Arc::new(ScriptedService::with_rows(typed_rows(10)));
    let ctl = controller(service.clone(), spec(), 25);

    let release_a = service.hold_next_list();
    let release_b = service.hold_next_list();

    ctl.set_draft("type", "A").unwrap();
    let fetch_a = tokio::spawn({
        let ctl = ctl.clone();
        async move { ctl.apply_filters().await }
    });
    wait_for_list_calls(&service, 1).await;
    ctl.set_draft("type", "B").unwrap();
    let fetch_b = tokio::spawn({
        let ctl = ctl.clone();
        async move { ctl.apply_filters().await }
    });
    wait_for_list_calls(&service, 2).await;

    release_a.send(()).unwrap();
    assert_eq!(fetch_a.await.unwrap(), FetchOutcome::Superseded);
    assert!(ctl.load_state().is_loading());

    release_b.send(()).unwrap();
    assert!(fetch_b.await.unwrap().is_applied());
    assert_eq!(
        ctl.query().filters.get("type").map(String::as_str),
        Some("B")
    );
    let ids = row_ids(&ctl.view());
    assert!(ids.iter().all(|id| {
        let n: usize = id.trim_start_matches("row-").parse().unwrap();
        n % 2 == 1
    }));
}

// -- Load errors --

#[tokio::test]
async fn load_error_keeps_stale_rows_out_of_the_table() {
    let service = Arc::new(ScriptedService::with_rows(typed_rows(4)));
    let ctl = controller(service.clone(), spec(), 25);
    let mut notes = ctl.notifier().subscribe();
    ctl.mount().await;

    service.fail_lists.store(true, Ordering::SeqCst);
    let outcome = ctl.refresh().await;
    assert!(matches!(outcome, FetchOutcome::Failed(ref m) if m == "backend returned HTTP 503"));

    match ctl.view() {
        ViewState::Error { message, stale } => {
            assert_eq!(message, "backend returned HTTP 503");
            assert_eq!(stale.unwrap().rows.len(), 4);
        }
        other => panic!("unexpected {:?}", other.label()),
    }

    let note = notes.recv().await.unwrap();
    assert_eq!(note.level, NotificationLevel::Error);
    assert_eq!(note.source, NotificationSource::List);

    service.fail_lists.store(false, Ordering::SeqCst);
    assert!(ctl.refresh().await.is_applied());
    assert_eq!(ctl.view().label(), "rows");
}

#[tokio::test]
async fn load_error_clears_rows_when_configured() {
    let spec = ResourceSpec::builder("reviews", "/api/review-queue")
        .error_policy(ErrorPolicy::Clear)
        .build();
    let service = Arc::new(ScriptedService::with_rows(typed_rows(4)));
    let ctl = controller(service.clone(), spec, 25);
    ctl.mount().await;

    service.fail_lists.store(true, Ordering::SeqCst);
    ctl.refresh().await;
    assert!(matches!(ctl.view(), ViewState::Error { stale: None, .. }));
}

// -- Row interaction --

#[tokio::test]
async fn successful_action_reloads_once_and_closes_drawer() {
    let service = Arc::new(ScriptedService::with_rows(typed_rows(6)));
    let ctl = controller(service.clone(), spec(), 25);
    let mut notes = ctl.notifier().subscribe();
    ctl.mount().await;

    let detail = ctl.open_detail("row-001").await.unwrap();
    assert!(matches!(detail, DetailState::Ready(_)));
    assert_eq!(ctl.selected_row().unwrap().id(), "row-001");

    ctl.request_action(ActionKind::Approve, "row-001").unwrap();
    let calls_before = service.list_calls();
    let outcome = ctl.confirm_action(None).await.unwrap();

    assert!(matches!(
        outcome,
        ActionOutcome::Completed { reload: FetchOutcome::Applied { .. }, .. }
    ));
    assert_eq!(service.list_calls(), calls_before + 1);
    assert_eq!(service.mutate_calls(), 1);
    assert!(ctl.pending_action().is_none());
    assert!(ctl.selection().is_none());

    let note = notes.recv().await.unwrap();
    assert_eq!(note.level, NotificationLevel::Success);
    assert_eq!(note.message, "row-001 approved");

    match ctl.view() {
        ViewState::Rows(result) => {
            let row = result.rows.iter().find(|r| r.id() == "row-001").unwrap();
            assert_eq!(row.field("status").as_deref(), Some("approved"));
        }
        other => panic!("unexpected {:?}", other.label()),
    }
}

#[tokio::test]
async fn failed_action_leaves_list_and_dialog() {
    let service = Arc::new(ScriptedService::with_rows(typed_rows(6)));
    let ctl = controller(service.clone(), spec(), 25);
    ctl.mount().await;
    let before = ctl.view();

    service.fail_mutations.store(true, Ordering::SeqCst);
    ctl.request_action(ActionKind::Delete, "row-002").unwrap();
    let outcome = ctl.confirm_action(None).await.unwrap();

    assert_eq!(
        outcome,
        ActionOutcome::Failed {
            message: "policy lock".to_string()
        }
    );
    assert_eq!(ctl.view(), before);
    assert_eq!(service.list_calls(), 1);

    let pending = ctl.pending_action().unwrap();
    assert!(!pending.submitting);
    assert_eq!(pending.error.as_deref(), Some("policy lock"));

    service.fail_mutations.store(false, Ordering::SeqCst);
    assert!(matches!(
        ctl.confirm_action(None).await.unwrap(),
        ActionOutcome::Completed { .. }
    ));
}

#[tokio::test]
async fn reject_without_reason_never_calls_backend() {
    let service = Arc::new(ScriptedService::with_rows(typed_rows(3)));
    let ctl = controller(service.clone(), spec(), 25);
    let mut notes = ctl.notifier().subscribe();
    ctl.mount().await;

    ctl.request_action(ActionKind::Reject, "row-000").unwrap();
    let err = ctl.confirm_action(Some("   ")).await.unwrap_err();
    assert!(err.is_validation());
    assert_eq!(service.mutate_calls(), 0);

    let pending = ctl.pending_action().unwrap();
    assert!(!pending.submitting);
    assert!(pending.error.is_some());

    let note = notes.recv().await.unwrap();
    assert_eq!(note.source, NotificationSource::Validation);

    let outcome = ctl.confirm_action(Some("exceeds budget")).await.unwrap();
    assert!(matches!(outcome, ActionOutcome::Completed { .. }));
    assert_eq!(service.mutate_calls(), 1);
}

#[tokio::test]
async fn second_action_is_refused_while_one_is_pending() {
    let service = Arc::new(ScriptedService::with_rows(typed_rows(3)));
    let ctl = controller(service.clone(), spec(), 25);

    ctl.request_action(ActionKind::Approve, "row-000").unwrap();
    assert!(matches!(
        ctl.request_action(ActionKind::Approve, "row-000"),
        Err(AgentOsError::ActionInFlight)
    ));
    assert!(ctl.cancel_action());
    assert!(ctl.pending_action().is_none());
    assert!(matches!(
        ctl.confirm_action(None).await,
        Err(AgentOsError::NoPendingAction)
    ));
}

#[tokio::test]
async fn unsupported_action_is_refused() {
    let service = Arc::new(ScriptedService::with_rows(typed_rows(3)));
    let ctl = controller(service, spec(), 25);
    assert!(matches!(
        ctl.request_action(ActionKind::Disable, "row-000"),
        Err(AgentOsError::UnsupportedAction { .. })
    ));
}

#[tokio::test]
async fn delete_reload_uses_backend_total() {
    let service = Arc::new(ScriptedService::with_rows(typed_rows(5)));
    let ctl = controller(service.clone(), spec(), 25);
    ctl.mount().await;

    let outcome = ctl
        .perform_action(ActionKind::Delete, "row-002", None)
        .await
        .unwrap();
    match outcome {
        ActionOutcome::Completed { reload, .. } => {
            assert_eq!(reload, FetchOutcome::Applied { rows: 4, total: 4 })
        }
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(service.row_count(), 4);
}

#[tokio::test]
async fn perform_action_clears_pending_on_failure() {
    let service = Arc::new(ScriptedService::with_rows(typed_rows(3)));
    let ctl = controller(service.clone(), spec(), 25);
    service.fail_mutations.store(true, Ordering::SeqCst);

    let outcome = ctl
        .perform_action(ActionKind::Enable, "row-000", None)
        .await
        .unwrap();
    assert!(matches!(outcome, ActionOutcome::Failed { .. }));
    assert!(ctl.pending_action().is_none());
}

#[tokio::test]
async fn detail_failure_leaves_list_alone() {
    let service = Arc::new(ScriptedService::with_rows(typed_rows(3)));
    let ctl = controller(service.clone(), spec(), 25);
    let mut notes = ctl.notifier().subscribe();
    ctl.mount().await;
    let before = ctl.view();

    service.fail_detail.store(true, Ordering::SeqCst);
    let detail = ctl.open_detail("row-000").await.unwrap();
    assert!(matches!(detail, DetailState::Failed(_)));
    assert_eq!(ctl.view(), before);
    assert_eq!(
        ctl.selection().unwrap().detail,
        DetailState::Failed("Record 'row-000' not found".to_string())
    );
    assert_eq!(notes.recv().await.unwrap().source, NotificationSource::Detail);

    ctl.close_detail();
    assert!(ctl.selection().is_none());
}

#[tokio::test]
async fn newer_detail_wins_when_older_resolves_last() {
    let service = Arc::new(ScriptedService::with_rows(typed_rows(3)));
    let ctl = controller(service.clone(), spec(), 25);
    ctl.mount().await;

    let release_a = service.hold_next_get();
    let open_a = tokio::spawn({
        let ctl = ctl.clone();
        async move { ctl.open_detail("row-000").await }
    });
    wait_for_get_calls(&service, 1).await;

    let detail_b = ctl.open_detail("row-001").await.unwrap();
    assert_eq!(
        detail_b,
        DetailState::Ready(json!({"id": "row-001", "history": ["created", "updated"]}))
    );

    release_a.send(()).unwrap();
    assert_eq!(open_a.await.unwrap(), None);

    let selection = ctl.selection().unwrap();
    assert_eq!(selection.id, "row-001");
    assert_eq!(selection.detail, detail_b);
}

#[tokio::test]
async fn closing_drawer_discards_in_flight_detail() {
    let service = Arc::new(ScriptedService::with_rows(typed_rows(3)));
    let ctl = controller(service.clone(), spec(), 25);
    ctl.mount().await;

    let release = service.hold_next_get();
    let open = tokio::spawn({
        let ctl = ctl.clone();
        async move { ctl.open_detail("row-000").await }
    });
    wait_for_get_calls(&service, 1).await;
    assert_eq!(ctl.selection().unwrap().detail, DetailState::Loading);

    ctl.close_detail();
    release.send(()).unwrap();
    assert_eq!(open.await.unwrap(), None);
    assert!(ctl.selection().is_none());
}

#[tokio::test]
async fn summary_only_resources_skip_detail_fetch() {
    let spec = ResourceSpec::builder("events", "/api/events").build();
    let service = Arc::new(ScriptedService::with_rows(rows(json!([{"id": "e1"}]))));
    let ctl = Arc::new(ListController::new(service.clone(), spec, 25));
    ctl.mount().await;

    assert_eq!(ctl.open_detail("e1").await, Some(DetailState::Summary));
    assert_eq!(service.get_calls.load(Ordering::SeqCst), 0);
    assert_eq!(ctl.selected_row().unwrap().id(), "e1");
}
