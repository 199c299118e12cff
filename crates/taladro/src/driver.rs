//! Element locator service abstraction.
//!
//! The prober talks to the UI under test exclusively through
//! [`ElementLocatorService`]: existence checks (which may poll), a no-retry
//! click primitive, and handle operations that always re-query the live
//! element tree. Swapping implementations is the point of the trait: the
//! CDP backend drives a real Chromium, while [`MockLocatorService`] drives
//! a scripted in-memory tree for unit tests.

use crate::locator::Selector;
use crate::result::{TaladroError, TaladroResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Handle to an element observed in the UI under test.
///
/// A handle is a descriptor snapshot plus an address for re-querying; it
/// carries no authority of its own. Every service operation taking a handle
/// resolves it against the live tree again, so a handle can go stale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElementHandle {
    /// Backend-specific address (CSS selector for the browser backend,
    /// opaque id for the mock)
    pub id: String,
    /// Position among siblings matched by `id`, in document order
    #[serde(default)]
    pub index: usize,
    /// Element tag name
    pub tag_name: String,
    /// `data-test-subj` attribute, if any
    pub test_subj: Option<String>,
    /// Visible text at observation time
    pub text: Option<String>,
    /// `href` attribute at observation time, if any
    pub href: Option<String>,
    /// Whether the element was enabled at observation time
    pub enabled: bool,
}

impl ElementHandle {
    /// Create a new handle
    #[must_use]
    pub fn new(id: impl Into<String>, tag_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            index: 0,
            tag_name: tag_name.into(),
            test_subj: None,
            text: None,
            href: None,
            enabled: true,
        }
    }

    /// Human-readable locator for error messages
    #[must_use]
    pub fn describe(&self) -> String {
        self.test_subj.as_ref().map_or_else(
            || format!("{}[{}]", self.id, self.index),
            |subj| format!("[data-test-subj=\"{subj}\"]"),
        )
    }
}

/// Service for locating and interacting with elements in the UI under test.
///
/// Existence checks (`exists_or_fail`, `missing_or_fail`) may poll and retry
/// per the implementation's wait policy. `click_when_enabled_no_retry`
/// deliberately does not: a present-but-disabled element fails immediately
/// with [`TaladroError::ElementDisabled`].
#[async_trait]
pub trait ElementLocatorService: Send + Sync {
    /// Check whether any element matches the selector right now
    async fn exists(&self, selector: &Selector) -> TaladroResult<bool>;

    /// Fail with [`TaladroError::NotFound`] if no element matches
    async fn exists_or_fail(&self, selector: &Selector) -> TaladroResult<()>;

    /// Fail with [`TaladroError::StillPresent`] if any element matches
    async fn missing_or_fail(&self, selector: &Selector) -> TaladroResult<()>;

    /// Find the first element matching the selector
    async fn find(&self, selector: &Selector) -> TaladroResult<ElementHandle>;

    /// Enumerate descendants of the first `scope` match that satisfy
    /// `filter`, in document order
    async fn find_all_within(
        &self,
        scope: &Selector,
        filter: &Selector,
    ) -> TaladroResult<Vec<ElementHandle>>;

    /// Click the element a handle refers to
    async fn click(&self, handle: &ElementHandle) -> TaladroResult<()>;

    /// Find the selector's element and click it, failing fast (no retry)
    /// when it is disabled
    async fn click_when_enabled_no_retry(&self, selector: &Selector) -> TaladroResult<()>;

    /// Read an attribute from the live element; `None` when absent
    async fn attribute(
        &self,
        handle: &ElementHandle,
        name: &str,
    ) -> TaladroResult<Option<String>>;

    /// Read the element's current visible text
    async fn visible_text(&self, handle: &ElementHandle) -> TaladroResult<String>;

    /// Navigate directly to the element's href, bypassing click handlers
    async fn open_href(&self, handle: &ElementHandle) -> TaladroResult<()>;
}

/// A scripted element in the mock tree
#[derive(Debug, Clone)]
pub struct MockElement {
    id: u64,
    /// `data-test-subj` attribute
    pub test_subj: Option<String>,
    /// Tag name
    pub tag_name: String,
    /// Visible text
    pub text: String,
    /// `href` attribute
    pub href: Option<String>,
    /// Enabled state
    pub enabled: bool,
    /// Test subject of the containing element, if nested
    pub parent: Option<String>,
}

impl MockElement {
    /// Create a new enabled element with no attributes
    #[must_use]
    pub fn new(tag_name: impl Into<String>) -> Self {
        Self {
            id: 0,
            test_subj: None,
            tag_name: tag_name.into(),
            text: String::new(),
            href: None,
            enabled: true,
            parent: None,
        }
    }

    /// Set the `data-test-subj` attribute
    #[must_use]
    pub fn test_subj(mut self, subj: impl Into<String>) -> Self {
        self.test_subj = Some(subj.into());
        self
    }

    /// Set the visible text
    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Set the `href` attribute
    #[must_use]
    pub fn href(mut self, href: impl Into<String>) -> Self {
        self.href = Some(href.into());
        self
    }

    /// Mark the element disabled
    #[must_use]
    pub const fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Nest the element inside the element with the given test subject
    #[must_use]
    pub fn within(mut self, parent_subj: impl Into<String>) -> Self {
        self.parent = Some(parent_subj.into());
        self
    }
}

/// Mock locator service over a scripted element tree.
///
/// Elements live in document order; tests can mutate the tree between prober
/// calls to exercise the no-caching contract. Every trait call is recorded
/// in a history for verification, and `open_href` navigations land in a
/// separate log instead of going anywhere.
#[derive(Debug, Default)]
pub struct MockLocatorService {
    elements: Mutex<Vec<MockElement>>,
    history: Mutex<Vec<String>>,
    opened: Mutex<Vec<String>>,
    next_id: AtomicU64,
}

impl MockLocatorService {
    /// Create an empty mock tree
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an element at the end of the document order
    pub fn push(&self, mut element: MockElement) {
        element.id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.elements.lock().expect("mock tree poisoned").push(element);
    }

    /// Remove all elements with the given test subject
    pub fn remove_by_subj(&self, subj: &str) {
        self.elements
            .lock()
            .expect("mock tree poisoned")
            .retain(|e| e.test_subj.as_deref() != Some(subj));
    }

    /// Recorded trait calls, oldest first
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.history.lock().expect("mock history poisoned").clone()
    }

    /// Check whether a call with the given prefix was recorded
    #[must_use]
    pub fn was_called(&self, method: &str) -> bool {
        self.history
            .lock()
            .expect("mock history poisoned")
            .iter()
            .any(|c| c.starts_with(method))
    }

    /// Hrefs "navigated to" via `open_href`, oldest first
    #[must_use]
    pub fn opened_hrefs(&self) -> Vec<String> {
        self.opened.lock().expect("mock nav log poisoned").clone()
    }

    fn record(&self, entry: String) {
        self.history.lock().expect("mock history poisoned").push(entry);
    }

    fn subject_based(selector: &Selector) -> TaladroResult<()> {
        if matches!(selector, Selector::Css(_)) {
            return Err(TaladroError::Page {
                message: "raw CSS selectors are not supported by the mock backend".to_string(),
            });
        }
        Ok(())
    }

    fn first_match(&self, selector: &Selector) -> Option<MockElement> {
        self.elements
            .lock()
            .expect("mock tree poisoned")
            .iter()
            .find(|e| selector.matches_subject(e.test_subj.as_deref()))
            .cloned()
    }

    fn resolve(&self, handle: &ElementHandle) -> TaladroResult<MockElement> {
        let id: u64 = handle
            .id
            .strip_prefix("mock-")
            .and_then(|raw| raw.parse().ok())
            .ok_or_else(|| TaladroError::Page {
                message: format!("foreign element handle {:?}", handle.id),
            })?;
        self.elements
            .lock()
            .expect("mock tree poisoned")
            .iter()
            .find(|e| e.id == id)
            .cloned()
            .ok_or_else(|| TaladroError::NotFound {
                selector: handle.describe(),
            })
    }

    fn to_handle(element: &MockElement) -> ElementHandle {
        ElementHandle {
            id: format!("mock-{}", element.id),
            index: 0,
            tag_name: element.tag_name.clone(),
            test_subj: element.test_subj.clone(),
            text: Some(element.text.clone()),
            href: element.href.clone(),
            enabled: element.enabled,
        }
    }
}

#[async_trait]
impl ElementLocatorService for MockLocatorService {
    async fn exists(&self, selector: &Selector) -> TaladroResult<bool> {
        self.record(format!("exists:{selector}"));
        Self::subject_based(selector)?;
        Ok(self.first_match(selector).is_some())
    }

    async fn exists_or_fail(&self, selector: &Selector) -> TaladroResult<()> {
        // The mock tree changes only between calls, so there is nothing to
        // poll for; the scripted snapshot is checked once.
        self.record(format!("exists_or_fail:{selector}"));
        Self::subject_based(selector)?;
        if self.first_match(selector).is_some() {
            Ok(())
        } else {
            Err(TaladroError::NotFound {
                selector: selector.to_css(),
            })
        }
    }

    async fn missing_or_fail(&self, selector: &Selector) -> TaladroResult<()> {
        self.record(format!("missing_or_fail:{selector}"));
        Self::subject_based(selector)?;
        if self.first_match(selector).is_some() {
            Err(TaladroError::StillPresent {
                selector: selector.to_css(),
            })
        } else {
            Ok(())
        }
    }

    async fn find(&self, selector: &Selector) -> TaladroResult<ElementHandle> {
        self.record(format!("find:{selector}"));
        Self::subject_based(selector)?;
        self.first_match(selector)
            .as_ref()
            .map(Self::to_handle)
            .ok_or_else(|| TaladroError::NotFound {
                selector: selector.to_css(),
            })
    }

    async fn find_all_within(
        &self,
        scope: &Selector,
        filter: &Selector,
    ) -> TaladroResult<Vec<ElementHandle>> {
        self.record(format!("find_all_within:{scope}:{filter}"));
        Self::subject_based(scope)?;
        Self::subject_based(filter)?;
        let container = self
            .first_match(scope)
            .ok_or_else(|| TaladroError::NotFound {
                selector: scope.to_css(),
            })?;
        let container_subj = container.test_subj;
        Ok(self
            .elements
            .lock()
            .expect("mock tree poisoned")
            .iter()
            .filter(|e| e.parent == container_subj)
            .filter(|e| filter.matches_subject(e.test_subj.as_deref()))
            .map(Self::to_handle)
            .collect())
    }

    async fn click(&self, handle: &ElementHandle) -> TaladroResult<()> {
        self.record(format!("click:{}", handle.describe()));
        let element = self.resolve(handle)?;
        if element.enabled {
            Ok(())
        } else {
            Err(TaladroError::ElementDisabled {
                selector: handle.describe(),
            })
        }
    }

    async fn click_when_enabled_no_retry(&self, selector: &Selector) -> TaladroResult<()> {
        self.record(format!("click_no_retry:{selector}"));
        Self::subject_based(selector)?;
        let element = self
            .first_match(selector)
            .ok_or_else(|| TaladroError::NotFound {
                selector: selector.to_css(),
            })?;
        if element.enabled {
            Ok(())
        } else {
            Err(TaladroError::ElementDisabled {
                selector: selector.to_css(),
            })
        }
    }

    async fn attribute(
        &self,
        handle: &ElementHandle,
        name: &str,
    ) -> TaladroResult<Option<String>> {
        self.record(format!("attribute:{}:{name}", handle.describe()));
        let element = self.resolve(handle)?;
        Ok(match name {
            "href" => element.href,
            "data-test-subj" => element.test_subj,
            _ => None,
        })
    }

    async fn visible_text(&self, handle: &ElementHandle) -> TaladroResult<String> {
        self.record(format!("visible_text:{}", handle.describe()));
        Ok(self.resolve(handle)?.text)
    }

    async fn open_href(&self, handle: &ElementHandle) -> TaladroResult<()> {
        self.record(format!("open_href:{}", handle.describe()));
        let element = self.resolve(handle)?;
        let href = element.href.ok_or_else(|| TaladroError::Page {
            message: format!("element {} has no href", handle.describe()),
        })?;
        self.opened.lock().expect("mock nav log poisoned").push(href);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn menu_with_items() -> MockLocatorService {
        let service = MockLocatorService::new();
        service.push(MockElement::new("div").test_subj("multipleActionsContextMenu"));
        service.push(
            MockElement::new("button")
                .test_subj("embeddablePanelAction-ALPHA")
                .text("Alpha")
                .within("multipleActionsContextMenu"),
        );
        service.push(
            MockElement::new("a")
                .test_subj("embeddablePanelAction-BETA")
                .text("Beta")
                .href("https://example.com/beta")
                .within("multipleActionsContextMenu"),
        );
        service
    }

    mod handle_tests {
        use super::*;

        #[test]
        fn test_handle_creation() {
            let handle = ElementHandle::new("mock-1", "button");
            assert_eq!(handle.id, "mock-1");
            assert_eq!(handle.tag_name, "button");
            assert!(handle.enabled);
        }

        #[test]
        fn test_describe_prefers_test_subj() {
            let mut handle = ElementHandle::new("mock-1", "button");
            handle.test_subj = Some("panelAction".to_string());
            assert_eq!(handle.describe(), "[data-test-subj=\"panelAction\"]");
        }

        #[test]
        fn test_describe_falls_back_to_address() {
            let handle = ElementHandle::new("[data-test-subj^=\"x\"]", "a");
            assert_eq!(handle.describe(), "[data-test-subj^=\"x\"][0]");
        }
    }

    mod existence_tests {
        use super::*;

        #[tokio::test]
        async fn test_exists_matches_live_tree() {
            let service = menu_with_items();
            let selector = Selector::test_subj("multipleActionsContextMenu");
            assert!(service.exists(&selector).await.unwrap());

            service.remove_by_subj("multipleActionsContextMenu");
            assert!(!service.exists(&selector).await.unwrap());
        }

        #[tokio::test]
        async fn test_exists_or_fail_reports_not_found() {
            let service = MockLocatorService::new();
            let err = service
                .exists_or_fail(&Selector::test_subj("nope"))
                .await
                .unwrap_err();
            assert!(matches!(err, TaladroError::NotFound { .. }));
        }

        #[tokio::test]
        async fn test_missing_or_fail_reports_still_present() {
            let service = menu_with_items();
            let err = service
                .missing_or_fail(&Selector::test_subj("embeddablePanelAction-ALPHA"))
                .await
                .unwrap_err();
            assert!(matches!(err, TaladroError::StillPresent { .. }));
        }

        #[tokio::test]
        async fn test_css_selector_rejected() {
            let service = menu_with_items();
            let err = service.exists(&Selector::css("button")).await.unwrap_err();
            assert!(matches!(err, TaladroError::Page { .. }));
        }
    }

    mod scoped_lookup_tests {
        use super::*;

        #[tokio::test]
        async fn test_find_all_within_preserves_document_order() {
            let service = menu_with_items();
            let items = service
                .find_all_within(
                    &Selector::test_subj("multipleActionsContextMenu"),
                    &Selector::test_subj_prefix("embeddablePanelAction-"),
                )
                .await
                .unwrap();
            assert_eq!(items.len(), 2);
            assert_eq!(items[0].text.as_deref(), Some("Alpha"));
            assert_eq!(items[1].text.as_deref(), Some("Beta"));
        }

        #[tokio::test]
        async fn test_find_all_within_excludes_outside_scope() {
            let service = menu_with_items();
            // A panel action outside the menu must not appear in the scan.
            service.push(
                MockElement::new("button")
                    .test_subj("embeddablePanelAction-OUTSIDE")
                    .text("Outside"),
            );
            let items = service
                .find_all_within(
                    &Selector::test_subj("multipleActionsContextMenu"),
                    &Selector::test_subj_prefix("embeddablePanelAction-"),
                )
                .await
                .unwrap();
            assert_eq!(items.len(), 2);
        }

        #[tokio::test]
        async fn test_find_all_within_missing_scope() {
            let service = MockLocatorService::new();
            let err = service
                .find_all_within(
                    &Selector::test_subj("multipleActionsContextMenu"),
                    &Selector::test_subj_prefix("embeddablePanelAction-"),
                )
                .await
                .unwrap_err();
            assert!(matches!(err, TaladroError::NotFound { .. }));
        }
    }

    mod interaction_tests {
        use super::*;

        #[tokio::test]
        async fn test_click_no_retry_disabled_fails_fast() {
            let service = MockLocatorService::new();
            service.push(
                MockElement::new("button")
                    .test_subj("embeddablePanelAction-GAMMA")
                    .disabled(),
            );
            let err = service
                .click_when_enabled_no_retry(&Selector::test_subj("embeddablePanelAction-GAMMA"))
                .await
                .unwrap_err();
            assert!(matches!(err, TaladroError::ElementDisabled { .. }));
        }

        #[tokio::test]
        async fn test_stale_handle_reports_not_found() {
            let service = menu_with_items();
            let handle = service
                .find(&Selector::test_subj("embeddablePanelAction-ALPHA"))
                .await
                .unwrap();
            service.remove_by_subj("embeddablePanelAction-ALPHA");
            let err = service.visible_text(&handle).await.unwrap_err();
            assert!(matches!(err, TaladroError::NotFound { .. }));
        }

        #[tokio::test]
        async fn test_attribute_href() {
            let service = menu_with_items();
            let handle = service
                .find(&Selector::test_subj("embeddablePanelAction-BETA"))
                .await
                .unwrap();
            assert_eq!(
                service.attribute(&handle, "href").await.unwrap(),
                Some("https://example.com/beta".to_string())
            );
            assert_eq!(service.attribute(&handle, "rel").await.unwrap(), None);
        }

        #[tokio::test]
        async fn test_open_href_records_navigation() {
            let service = menu_with_items();
            let handle = service
                .find(&Selector::test_subj("embeddablePanelAction-BETA"))
                .await
                .unwrap();
            service.open_href(&handle).await.unwrap();
            assert_eq!(service.opened_hrefs(), vec!["https://example.com/beta"]);
        }

        #[tokio::test]
        async fn test_open_href_without_href_fails() {
            let service = menu_with_items();
            let handle = service
                .find(&Selector::test_subj("embeddablePanelAction-ALPHA"))
                .await
                .unwrap();
            let err = service.open_href(&handle).await.unwrap_err();
            assert!(matches!(err, TaladroError::Page { .. }));
        }
    }

    mod history_tests {
        use super::*;

        #[tokio::test]
        async fn test_history_records_calls() {
            let service = menu_with_items();
            let selector = Selector::test_subj("multipleActionsContextMenu");
            service.exists_or_fail(&selector).await.unwrap();
            assert!(service.was_called("exists_or_fail"));
            assert!(!service.was_called("click_no_retry"));
        }
    }
}
