pub mod extract;
pub mod outline;
pub mod status;
