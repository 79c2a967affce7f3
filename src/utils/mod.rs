pub mod session;

pub use session::{current_user_id, require_user};
