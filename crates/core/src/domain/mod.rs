pub mod company;
pub mod roster;
