//! # Gust
//!
//! `gust` is a best-effort UDP publish/subscribe broker with a matching
//! client protocol, built for telemetry-style traffic where freshness
//! beats reliability: no ordering, no delivery guarantee, no persistence.
//!
//! Producers tag short binary payloads with a hierarchical topic of up to
//! eight dot-separated tokens over the alphabet `a..h`; consumers
//! subscribe with patterns that may use the `*` (any one token) and `>`
//! (rest of the topic) wildcards. The broker fans each publish out to
//! every live, matching subscriber. Liveness rides on heartbeats over the
//! same socket, and the broker's heartbeat acks double as subscription
//! confirmation.
//!
//! ## Core Modules
//!
//! The library is structured into several modules, each with a distinct responsibility:
//!
//! - `broker`: the session table, topic pattern matching, and publish fan-out.
//! - `client`: the one-shot publisher and the polling subscriber state machine.
//! - `config`: loading and merging of broker configuration.
//! - `transport`: the fixed 10-byte wire header codec and the UDP socket wrapper.
//! - `utils`: shared utilities, such as error handling, logging setup, and hex dumps.

pub mod broker;
pub mod client;
pub mod config;
pub mod transport;
pub mod utils;
