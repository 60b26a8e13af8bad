pub mod csv_export;
pub mod password;
pub mod permissions;
pub mod token;
