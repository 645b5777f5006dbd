pub mod branch;
pub mod customer;
pub mod document;
pub mod document_item;
pub mod product;
pub mod stock_level;
pub mod stock_movement;
pub mod supplier;
pub mod user;
pub mod warehouse;
