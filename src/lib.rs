pub mod class;
pub mod classdef;
pub mod classmanager;
pub mod config;
pub mod error;
pub mod value;
pub mod vm;
