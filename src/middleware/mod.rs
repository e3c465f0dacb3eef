pub mod guard;
pub mod response;

pub use guard::{decide, require_master, require_session, CurrentUser, GuardOutcome, GuardState};
pub use response::{ApiResponse, ApiResult};
