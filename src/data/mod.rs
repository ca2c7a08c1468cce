pub mod dataset;
pub mod geometry;
pub mod lasso;
pub mod network;
pub mod selection;
