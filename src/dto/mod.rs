pub mod account;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod contact;
pub mod orders;
pub mod reviews;
pub mod wishlist;
