pub mod accessibility;
pub mod effects;
pub mod lazy_load;
pub mod mobile_menu;
pub mod reveal;
pub mod scroll_nav;
pub mod stat_counter;

pub use accessibility::AccessibilityManager;
pub use effects::InteractionEffects;
pub use lazy_load::LazyLoader;
pub use mobile_menu::MobileMenuController;
pub use reveal::RevealAnimator;
pub use scroll_nav::ScrollNavigator;
pub use stat_counter::StatCounterAnimator;
