pub mod cache_stats;
pub mod chart;
pub mod drift_panel;
pub mod login_form;
pub mod range_selector;
pub mod routing_table;
pub mod status;
pub mod summary;
pub mod validation_panel;

pub use cache_stats::CacheStatsCard;
pub use drift_panel::DriftPanel;
pub use login_form::LoginForm;
pub use range_selector::RangeSelector;
pub use routing_table::RoutingTable;
pub use validation_panel::ValidationPanel;
