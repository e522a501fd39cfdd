// SPDX-License-Identifier: Apache-2.0
//! Library surface over the supervisor's pieces, so integration tests can
//! drive a follower or the batcher directly against a mock HTTP server
//! without going through the `main` binary.

pub mod batcher;
pub mod config;
pub mod follower;
pub mod supervisor;
pub mod worker;
