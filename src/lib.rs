pub mod audit;
pub mod checkout;
pub mod clients;
pub mod config;
pub mod db;
pub mod dto;
pub mod entity;
pub mod error;
pub mod media;
pub mod middleware;
pub mod models;
pub mod phone;
pub mod pricing;
pub mod response;
pub mod routes;
pub mod services;
pub mod slug;
pub mod state;
