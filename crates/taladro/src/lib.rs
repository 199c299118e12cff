//! Taladro: Rust-Native Functional Test Helpers for Dashboard Drilldowns
//!
//! Taladro (Spanish: "drill") probes the drilldown actions of a dashboard
//! panel's multi-action context menu: asserting presence or absence,
//! clicking without retry, and resolving action items by their visible
//! label, all through a swappable element-locator service.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                     TALADRO Architecture                         │
//! ├──────────────────────────────────────────────────────────────────┤
//! │   ┌──────────────┐    ┌───────────────────┐    ┌─────────────┐  │
//! │   │ Drilldown    │    │ ElementLocator    │    │ Dashboard   │  │
//! │   │ Prober       │───►│ Service           │───►│ UI (CDP or  │  │
//! │   │ (assertions) │    │ (trait)           │    │ mock tree)  │  │
//! │   └──────────────┘    └───────────────────┘    └─────────────┘  │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The prober owns no timeout or retry policy: existence checks delegate to
//! the locator service (which may poll), while click primitives fail fast on
//! disabled elements. Every operation re-queries the live element tree.

#![warn(missing_docs)]
// Lints are configured in workspace Cargo.toml [workspace.lints.clippy]

#[cfg(feature = "browser")]
mod browser;
mod driver;
mod drilldown;
mod locator;
mod result;
mod wait;

#[cfg(feature = "browser")]
pub use browser::{Browser, BrowserConfig, CdpLocatorService, Page};
pub use driver::{ElementHandle, ElementLocatorService, MockElement, MockLocatorService};
pub use drilldown::{
    PanelDrilldownActions, CREATE_DRILLDOWN_DATA_TEST_SUBJ, MANAGE_DRILLDOWNS_DATA_TEST_SUBJ,
    MULTIPLE_ACTIONS_MENU_DATA_TEST_SUBJ, PANEL_ACTION_TEST_SUBJ_PREFIX,
};
pub use locator::{Selector, DEFAULT_POLL_INTERVAL_MS, DEFAULT_TIMEOUT_MS};
pub use result::{TaladroError, TaladroResult};
pub use wait::{poll_until, WaitOptions};
