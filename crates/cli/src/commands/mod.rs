pub mod identity;
pub mod keyid;
pub mod requests;
