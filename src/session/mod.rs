pub mod store;

pub use store::{
    Identity, ProvisionProfiles, SessionChange, SessionState, SessionStore, SessionWatch,
};
