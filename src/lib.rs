//! Platform-agnostic core of the Wi-Fi link supervisor.
//!
//! Everything in [`link`] is pure state-machine logic: it consumes abstract
//! driver events and caller commands and produces driver actions plus
//! lifecycle notices. The esp-radio adapter lives in the binary.

#![no_std]

pub mod link;
