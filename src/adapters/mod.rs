pub mod memory;
pub mod rest;
