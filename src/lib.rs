#[macro_use]
extern crate diesel;

#[macro_use]
extern crate diesel_migrations;

pub mod core;
pub mod auth;
pub mod db;
pub mod http;
pub mod provider;
pub mod util;
