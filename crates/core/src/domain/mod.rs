pub mod behavior;
pub mod interaction;
pub mod product;
pub mod upload;
