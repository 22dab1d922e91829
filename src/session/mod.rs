pub mod loader;
pub mod reconciler;
pub mod runner;
pub mod state;

pub use loader::{load_snapshot, Snapshot, SnapshotError};
pub use reconciler::{compute_metrics, profit_series, DashboardMetrics, ProfitPoint};
pub use runner::{ControlCommand, DashboardSession, SessionConfig, SessionError, SessionHandle};
pub use state::{ChannelStatus, DashboardState, DashboardView, StateLimits};
