pub mod items;
pub mod profiles;
