//! Abstractions over linear physical memory.
#![no_std]

pub mod address;
