//! Operator console transport.
//! `console_endpoint` owns the TCP listener and the length-prefixed framing,
//! `console_messenger` maps console connections onto simulated vehicles,
//! and `aegis_messages` defines the protobuf message schema.

mod aegis_messages;
mod console_endpoint;
mod console_messenger;


pub(crate) use console_messenger::ConsoleMessenger;
