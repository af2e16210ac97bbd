// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 EvalHub Contributors

//! Provider invocation layer
//!
//! Abstracts over external AI backends behind one `ModelInvoker` trait,
//! resolved per provider tag through a startup registration table.

pub mod http;
pub mod invoker;
pub mod mock;
pub mod retry;

pub use http::HttpInvoker;
pub use invoker::*;
pub use mock::{MockFailure, MockInvoker, MockOutcome};
pub use retry::{with_retry, RetryConfig};
