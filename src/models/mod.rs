pub mod school;
pub mod untis;
