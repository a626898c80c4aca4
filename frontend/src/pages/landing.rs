use crate::behaviors::{
    AccessibilityManager, InteractionEffects, LazyLoader, MobileMenuController, RevealAnimator,
    ScrollNavigator, StatCounterAnimator,
};
use crate::config::{self, BehaviorConfig};
use crate::dom::Dom;
use crate::page::{Dispatch, Page};

/// Keyframes and override rules the behaviors rely on.
pub const STYLESHEET: &str = r#"
    @keyframes ripple {
        to {
            transform: scale(4);
            opacity: 0;
        }
    }

    @keyframes fadeInUp {
        from {
            opacity: 0;
            transform: translateY(30px);
        }
        to {
            opacity: 1;
            transform: translateY(0);
        }
    }

    .animate-in {
        animation: fadeInUp 0.8s ease-out forwards;
    }

    .keyboard-navigation *:focus {
        outline: 2px solid #a855f7 !important;
        outline-offset: 2px !important;
    }

    .reduced-motion * {
        animation-duration: 0.01ms !important;
        animation-iteration-count: 1 !important;
        transition-duration: 0.01ms !important;
    }
"#;

pub fn landing_page(config: &BehaviorConfig) -> Page {
    Page::new()
        .with(ScrollNavigator::new(config))
        .with(RevealAnimator::new(config))
        .with(InteractionEffects::new(config))
        .with(AccessibilityManager::new(config))
        .with(MobileMenuController::new(config))
        .with(StatCounterAnimator::new(config))
        .with(LazyLoader::new())
}

/// Loads the configuration, injects the stylesheet and mounts the page.
/// Returns the page together with the host requests its mount produced.
pub fn bootstrap(dom: &dyn Dom) -> (Page, Dispatch) {
    let config = config::load(dom);
    if let Err(e) = dom.inject_style(STYLESHEET) {
        log::error!("Failed to inject behavior stylesheet: {}", e);
    }
    let mut page = landing_page(&config);
    let dispatch = page.mount(dom);
    log::info!(
        "Landing page ready with {} host requests",
        dispatch.requests.len()
    );
    (page, dispatch)
}
