//! Dashboard panel drilldown action prober.
//!
//! Drilldowns are navigation/filter actions attached to a dashboard panel,
//! reachable through the panel's multi-action context menu. This module
//! asserts on and interacts with those action items through an injected
//! [`ElementLocatorService`], emitting a `tracing` debug entry per
//! operation. Each operation is a stateless query/command against the
//! current UI snapshot; nothing is cached between calls.

use crate::driver::{ElementHandle, ElementLocatorService};
use crate::locator::Selector;
use crate::result::{TaladroError, TaladroResult};
use std::sync::Arc;
use tracing::debug;

/// Test subject of the "create drilldown" panel action
pub const CREATE_DRILLDOWN_DATA_TEST_SUBJ: &str =
    "embeddablePanelAction-OPEN_FLYOUT_ADD_DRILLDOWN";

/// Test subject of the "manage drilldowns" panel action
pub const MANAGE_DRILLDOWNS_DATA_TEST_SUBJ: &str =
    "embeddablePanelAction-OPEN_FLYOUT_EDIT_DRILLDOWN";

/// Test subject of the open multi-action context menu container
pub const MULTIPLE_ACTIONS_MENU_DATA_TEST_SUBJ: &str = "multipleActionsContextMenu";

/// Test subject prefix shared by all panel action items
pub const PANEL_ACTION_TEST_SUBJ_PREFIX: &str = "embeddablePanelAction-";

/// Prober for panel drilldown actions.
///
/// Holds the injected locator service; the service and the tracing
/// subscriber are the only collaborators, both externally owned and
/// long-lived. Calls are expected to be awaited sequentially by one test
/// session at a time.
#[derive(Debug)]
pub struct PanelDrilldownActions<S> {
    service: Arc<S>,
}

impl<S> Clone for PanelDrilldownActions<S> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
        }
    }
}

impl<S: ElementLocatorService> PanelDrilldownActions<S> {
    /// Create a prober over the given locator service
    #[must_use]
    pub fn new(service: Arc<S>) -> Self {
        Self { service }
    }

    /// Access the underlying locator service
    #[must_use]
    pub fn service(&self) -> &Arc<S> {
        &self.service
    }

    /// Assert that the action with the given test subject currently exists
    ///
    /// # Errors
    ///
    /// Returns [`TaladroError::NotFound`] when the element is absent.
    pub async fn expect_action_exists(&self, test_subj: &str) -> TaladroResult<()> {
        debug!("expect_action_exists: {test_subj:?}");
        self.service
            .exists_or_fail(&Selector::test_subj(test_subj))
            .await
    }

    /// Assert that the action with the given test subject is absent
    ///
    /// # Errors
    ///
    /// Returns [`TaladroError::StillPresent`] when the element exists.
    pub async fn expect_action_missing(&self, test_subj: &str) -> TaladroResult<()> {
        debug!("expect_action_missing: {test_subj:?}");
        self.service
            .missing_or_fail(&Selector::test_subj(test_subj))
            .await
    }

    /// Assert the action exists, then click it without retrying.
    ///
    /// # Errors
    ///
    /// Returns [`TaladroError::ElementDisabled`] when the element exists but
    /// is disabled at click time; `NotFound` is reserved for true absence.
    pub async fn trigger_action(&self, test_subj: &str) -> TaladroResult<()> {
        debug!("trigger_action: {test_subj:?}");
        self.expect_action_exists(test_subj).await?;
        self.service
            .click_when_enabled_no_retry(&Selector::test_subj(test_subj))
            .await
    }

    /// Assert the create-drilldown action is present
    pub async fn expect_exists_create_drilldown_action(&self) -> TaladroResult<()> {
        debug!("expect_exists_create_drilldown_action");
        self.expect_action_exists(CREATE_DRILLDOWN_DATA_TEST_SUBJ).await
    }

    /// Assert the create-drilldown action is absent.
    ///
    /// The original provider asserted presence of the manage action here (a
    /// copy-paste defect); this checks true absence of the create action.
    pub async fn expect_missing_create_drilldown_action(&self) -> TaladroResult<()> {
        debug!("expect_missing_create_drilldown_action");
        self.expect_action_missing(CREATE_DRILLDOWN_DATA_TEST_SUBJ).await
    }

    /// Click the create-drilldown action
    pub async fn click_create_drilldown(&self) -> TaladroResult<()> {
        debug!("click_create_drilldown");
        self.trigger_action(CREATE_DRILLDOWN_DATA_TEST_SUBJ).await
    }

    /// Assert the manage-drilldowns action is present
    pub async fn expect_exists_manage_drilldowns_action(&self) -> TaladroResult<()> {
        debug!("expect_exists_manage_drilldowns_action");
        self.expect_action_exists(MANAGE_DRILLDOWNS_DATA_TEST_SUBJ).await
    }

    /// Assert the manage-drilldowns action is absent (corrected, see
    /// [`Self::expect_missing_create_drilldown_action`])
    pub async fn expect_missing_manage_drilldowns_action(&self) -> TaladroResult<()> {
        debug!("expect_missing_manage_drilldowns_action");
        self.expect_action_missing(MANAGE_DRILLDOWNS_DATA_TEST_SUBJ).await
    }

    /// Click the manage-drilldowns action
    pub async fn click_manage_drilldowns(&self) -> TaladroResult<()> {
        debug!("click_manage_drilldowns");
        self.trigger_action(MANAGE_DRILLDOWNS_DATA_TEST_SUBJ).await
    }

    /// Assert the multi-action context menu container is open
    pub async fn expect_multiple_actions_menu_opened(&self) -> TaladroResult<()> {
        debug!("expect_multiple_actions_menu_opened");
        self.service
            .exists_or_fail(&Selector::test_subj(MULTIPLE_ACTIONS_MENU_DATA_TEST_SUBJ))
            .await
    }

    /// Find the first action item in the open menu whose visible text equals
    /// `label`.
    ///
    /// Enumerates the menu's descendants carrying the panel action test
    /// subject prefix, in document order; the scan stops at the first match,
    /// so duplicate labels resolve deterministically to the earliest item.
    ///
    /// # Errors
    ///
    /// Returns [`TaladroError::ActionNotFound`] after scanning all
    /// candidates without a match, and `NotFound` when no menu is open.
    pub async fn find_action_by_label(&self, label: &str) -> TaladroResult<ElementHandle> {
        debug!("find_action_by_label: {label:?}");
        let menu = Selector::test_subj(MULTIPLE_ACTIONS_MENU_DATA_TEST_SUBJ);
        let filter = Selector::test_subj_prefix(PANEL_ACTION_TEST_SUBJ_PREFIX);
        let items = self.service.find_all_within(&menu, &filter).await?;
        for item in items {
            if self.service.visible_text(&item).await? == label {
                return Ok(item);
            }
        }
        Err(TaladroError::ActionNotFound {
            label: label.to_string(),
        })
    }

    /// Click the first action item matching `label`
    pub async fn click_action_by_label(&self, label: &str) -> TaladroResult<()> {
        debug!("click_action_by_label: {label:?}");
        let item = self.find_action_by_label(label).await?;
        self.service.click(&item).await
    }

    /// Read the `href` of the first action item matching `label`; `None`
    /// when the item has no href attribute
    pub async fn action_href_by_label(&self, label: &str) -> TaladroResult<Option<String>> {
        debug!("action_href_by_label: {label:?}");
        let item = self.find_action_by_label(label).await?;
        self.service.attribute(&item, "href").await
    }

    /// Navigate directly to the href of the first action item matching
    /// `label`, bypassing its click handler
    pub async fn open_action_href_by_label(&self, label: &str) -> TaladroResult<()> {
        debug!("open_action_href_by_label: {label:?}");
        let item = self.find_action_by_label(label).await?;
        self.service.open_href(&item).await
    }
}
