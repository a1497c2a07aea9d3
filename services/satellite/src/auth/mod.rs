//! Token authorization for point queries.

pub mod allow_list;
pub mod gate;

pub use allow_list::AllowList;
pub use gate::{AuthContext, Authorization, AuthorizationGate, TOKEN_METADATA_KEY};
