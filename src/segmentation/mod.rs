pub mod labels;
pub mod noise;
pub mod unary;
pub mod visualize;
