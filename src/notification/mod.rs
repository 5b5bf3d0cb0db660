pub mod blocks;
pub mod slack;
