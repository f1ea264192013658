pub mod department;
pub mod history;
pub mod request;
pub mod role;
