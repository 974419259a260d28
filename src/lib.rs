#[macro_use]
extern crate lazy_static;

#[macro_use]
extern crate num_derive;

pub mod async_result;
pub mod bus;
pub mod message;
pub mod pdu;
pub mod session;
pub mod smpp_connection;
pub mod smsc;

#[cfg(test)]
mod unittest_utils;
