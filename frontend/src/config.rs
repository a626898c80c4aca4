use serde::{Deserialize, Serialize};

use crate::dom::Dom;
use crate::error::Result;
use crate::events::ObserverOptions;

/// Id of the optional `<script type="application/json">` block a page can
/// embed to override any of the [`BehaviorConfig`] fields.
pub const CONFIG_ELEMENT_ID: &str = "page-behaviors-config";

pub mod selectors {
    pub const NAV_ANCHORS: &str = ".nav-links a[href^=\"#\"]";
    pub const SECTIONS: &str = "section[id]";
    pub const HAMBURGER: &str = ".hamburger";
    pub const NAV_MENU: &str = ".nav-links";
    pub const NAV_CONTAINER: &str = ".nav-container";
    pub const MENU_LINKS: &str = "a";
    pub const REVEAL_TARGETS: &str = ".glass-card, .hero-title, .section-title";
    pub const BUTTONS: &str = ".btn-primary, .btn-secondary, .btn-download";
    pub const CARDS: &str = ".glass-card";
    pub const AMBIENT_ANIMATIONS: &str = ".gradient-orb";
    pub const HEADINGS: &str = "h1, h2, h3";
    pub const STAT_NUMBERS: &str = ".stat-number";
    pub const LAZY: &str = "[data-lazy]";
}

pub mod classes {
    pub const ACTIVE: &str = "active";
    pub const MENU_OPEN: &str = "mobile-active";
    pub const CONTAINER_OPEN: &str = "mobile-menu-open";
    pub const REVEALED: &str = "animate-in";
    pub const STEP_CARD: &str = "step-card";
    pub const FEATURE_CARD: &str = "feature-card";
    pub const KEYBOARD_NAVIGATION: &str = "keyboard-navigation";
    pub const REDUCED_MOTION: &str = "reduced-motion";
    pub const HIGH_CONTRAST: &str = "high-contrast";
    pub const LOADED: &str = "loaded";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorConfig {
    /// Height of the fixed header that scroll targets must clear.
    pub header_offset_px: f64,
    /// Distance below the viewport top used to pick the active section.
    pub active_line_offset_px: f64,
    /// Viewports wider than this close the mobile menu.
    pub mobile_breakpoint_px: f64,
    pub reveal_threshold: f64,
    pub reveal_root_margin: String,
    pub step_stagger_ms: u32,
    pub feature_stagger_ms: u32,
    pub ripple_duration_ms: u32,
    pub announce_threshold: f64,
    pub announce_duration_ms: u32,
    pub count_up_duration_ms: u32,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            header_offset_px: 100.0,
            active_line_offset_px: 150.0,
            mobile_breakpoint_px: 768.0,
            reveal_threshold: 0.1,
            reveal_root_margin: "0px 0px -50px 0px".to_string(),
            step_stagger_ms: 200,
            feature_stagger_ms: 300,
            ripple_duration_ms: 600,
            announce_threshold: 0.7,
            announce_duration_ms: 1000,
            count_up_duration_ms: 2000,
        }
    }
}

impl BehaviorConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn reveal_options(&self) -> ObserverOptions {
        ObserverOptions {
            threshold: self.reveal_threshold,
            root_margin: Some(self.reveal_root_margin.clone()),
        }
    }

    pub fn announce_options(&self) -> ObserverOptions {
        ObserverOptions {
            threshold: self.announce_threshold,
            root_margin: None,
        }
    }
}

/// Reads the embedded override block, falling back to the defaults when
/// the page has none or it does not parse.
pub fn load(dom: &dyn Dom) -> BehaviorConfig {
    let Some(json) = dom
        .element_by_id(CONFIG_ELEMENT_ID)
        .and_then(|node| dom.text(node))
    else {
        return BehaviorConfig::default();
    };

    match BehaviorConfig::from_json(&json) {
        Ok(config) => {
            log::info!("Loaded behavior overrides from #{}", CONFIG_ELEMENT_ID);
            config
        }
        Err(e) => {
            log::warn!("Ignoring #{}: {}", CONFIG_ELEMENT_ID, e);
            BehaviorConfig::default()
        }
    }
}
