pub mod account;
pub mod church;
pub mod event;
pub mod finance;
pub mod group;
pub mod member;
pub mod profile;
pub mod role;
pub mod session;

pub use account::Account;
pub use church::{Church, ChurchOverview, ChurchStats};
pub use event::Event;
pub use finance::Finance;
pub use group::Group;
pub use member::Member;
pub use profile::Profile;
pub use role::{Role, RoleAssignment};
pub use session::Session;
