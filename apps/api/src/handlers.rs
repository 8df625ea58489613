//! HTTP handlers.

mod audit;
mod invites;
mod leaves;
mod orgs;
mod schedules;

pub use audit::list_audit_log;
pub use invites::{invite_user, redeem_invite};
pub use leaves::{cancel_leave, decide_leave, submit_leave};
pub use orgs::create_org;
pub use schedules::{assign_shift, create_schedule};
