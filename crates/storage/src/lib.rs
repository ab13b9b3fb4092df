pub mod memory;
pub mod repository;
pub mod rest;
pub mod seed;
pub mod sqlite;
