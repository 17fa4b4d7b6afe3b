//! Shared test doubles: a scripted in-memory transport, a recording
//! callback, and an executor that queues callback tasks until told to run.

#![allow(dead_code)]

pub mod executor;
pub mod http_server;
pub mod mock_transport;
pub mod recorder;
