pub mod balance_entry;
pub mod department;
pub mod employee;
pub mod leave_type;
pub mod request;
pub mod role;
