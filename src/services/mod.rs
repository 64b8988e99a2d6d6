pub mod approvals;
pub mod dashboard;
pub mod export;
pub mod filtering;
pub mod grouping;
pub mod orders;
pub mod separations;
