//! # hatch-core
//!
//! Read-only probes of the host capabilities that decide how a container
//! can be created:
//! - **SELinux**: whether the mandatory access control subsystem is enabled.
//! - **systemd**: whether cgroup management can be delegated to the init system.
//! - **Intel RDT**: whether the resctrl filesystem offers cache (CAT) or
//!   memory-bandwidth (MBA) allocation.
//! - **Search path**: where the `newuidmap`/`newgidmap` helpers live.
//!
//! The [`host::HostProbe`] trait bundles these queries so callers can be
//! exercised against a fake host in tests.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod host;
pub mod intelrdt;
pub mod mountinfo;
pub mod selinux;
pub mod systemd;
