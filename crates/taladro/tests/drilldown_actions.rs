//! End-to-end prober scenarios against the mock locator service.

use std::sync::Arc;
use taladro::{
    MockElement, MockLocatorService, PanelDrilldownActions, TaladroError,
    CREATE_DRILLDOWN_DATA_TEST_SUBJ, MULTIPLE_ACTIONS_MENU_DATA_TEST_SUBJ,
};

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
        )
        .with_test_writer()
        .try_init();
}

/// Build an open menu whose items carry the given (subject suffix, label,
/// href) triples, in document order.
fn menu(items: &[(&str, &str, Option<&str>)]) -> PanelDrilldownActions<MockLocatorService> {
    init_logging();
    let service = MockLocatorService::new();
    service.push(MockElement::new("div").test_subj(MULTIPLE_ACTIONS_MENU_DATA_TEST_SUBJ));
    for (suffix, label, href) in items {
        let mut element = MockElement::new("a")
            .test_subj(format!("embeddablePanelAction-{suffix}"))
            .text(*label)
            .within(MULTIPLE_ACTIONS_MENU_DATA_TEST_SUBJ);
        if let Some(href) = href {
            element = element.href(*href);
        }
        service.push(element);
    }
    PanelDrilldownActions::new(Arc::new(service))
}

#[tokio::test]
async fn duplicate_labels_resolve_to_first_document_order_match() {
    let prober = menu(&[
        ("ALERT_0", "Create alert", None),
        ("DETAILS", "View details", None),
        ("ALERT_2", "Create alert", None),
    ]);

    let item = prober.find_action_by_label("Create alert").await.unwrap();
    assert_eq!(
        item.test_subj.as_deref(),
        Some("embeddablePanelAction-ALERT_0")
    );
}

#[tokio::test]
async fn unmatched_label_fails_with_exact_message() {
    let prober = menu(&[("DETAILS", "View details", None)]);

    let err = prober
        .find_action_by_label("nonexistent-label")
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "No action matching text \"nonexistent-label\""
    );
}

#[tokio::test]
async fn href_is_returned_verbatim_or_none() {
    let prober = menu(&[
        ("OPEN_TAB", "Open in new tab", Some("https://example.com/x")),
        ("DETAILS", "View details", None),
    ]);

    assert_eq!(
        prober.action_href_by_label("Open in new tab").await.unwrap(),
        Some("https://example.com/x".to_string())
    );
    assert_eq!(prober.action_href_by_label("View details").await.unwrap(), None);
}

#[tokio::test]
async fn open_href_navigates_without_clicking() {
    let prober = menu(&[("OPEN_TAB", "Open in new tab", Some("https://example.com/x"))]);

    prober.open_action_href_by_label("Open in new tab").await.unwrap();

    let service = prober.service();
    assert_eq!(service.opened_hrefs(), vec!["https://example.com/x"]);
    assert!(!service.was_called("click"));
}

#[tokio::test]
async fn click_action_by_label_clicks_the_resolved_item() {
    let prober = menu(&[("DETAILS", "View details", None)]);

    prober.click_action_by_label("View details").await.unwrap();
    assert!(prober
        .service()
        .was_called("click:[data-test-subj=\"embeddablePanelAction-DETAILS\"]"));
}

#[tokio::test]
async fn every_probe_requeries_the_live_tree() {
    let prober = menu(&[("DETAILS", "View details", None)]);

    prober.expect_multiple_actions_menu_opened().await.unwrap();

    // Dismiss the menu between calls; the next probe must see the change.
    prober
        .service()
        .remove_by_subj(MULTIPLE_ACTIONS_MENU_DATA_TEST_SUBJ);
    let err = prober
        .expect_multiple_actions_menu_opened()
        .await
        .unwrap_err();
    assert!(matches!(err, TaladroError::NotFound { .. }));
}

#[tokio::test]
async fn drilldown_lifecycle_against_one_menu() {
    let prober = menu(&[]);
    let service = prober.service();
    service.push(
        MockElement::new("button")
            .test_subj(CREATE_DRILLDOWN_DATA_TEST_SUBJ)
            .text("Create drilldown")
            .within(MULTIPLE_ACTIONS_MENU_DATA_TEST_SUBJ),
    );

    prober.expect_multiple_actions_menu_opened().await.unwrap();
    prober.expect_exists_create_drilldown_action().await.unwrap();
    prober.expect_missing_manage_drilldowns_action().await.unwrap();
    prober.click_create_drilldown().await.unwrap();
}

mod first_match_property {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Whatever the menu contents, a label lookup lands on the earliest
        /// item whose text equals the label.
        #[test]
        fn label_lookup_is_first_match_deterministic(
            labels in proptest::collection::vec("[a-c]{1,3}", 1..8),
            pick in 0usize..8,
        ) {
            let target = labels[pick % labels.len()].clone();
            let expected = labels.iter().position(|l| *l == target).unwrap();

            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_time()
                .build()
                .unwrap();
            runtime.block_on(async {
                let items: Vec<(String, String)> = labels
                    .iter()
                    .enumerate()
                    .map(|(i, label)| (format!("ITEM_{i}"), label.clone()))
                    .collect();
                let borrowed: Vec<(&str, &str, Option<&str>)> = items
                    .iter()
                    .map(|(suffix, label)| (suffix.as_str(), label.as_str(), None))
                    .collect();
                let prober = menu(&borrowed);

                let found = prober.find_action_by_label(&target).await.unwrap();
                assert_eq!(
                    found.test_subj.as_deref(),
                    Some(format!("embeddablePanelAction-ITEM_{expected}").as_str())
                );
            });
        }
    }
}
