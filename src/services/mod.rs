pub mod assignments;
pub mod bases;
pub mod equipment_types;
pub mod inventory;
pub mod purchases;
pub mod reports;
pub mod transfers;
