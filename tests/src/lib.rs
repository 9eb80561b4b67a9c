//! # DOU Test Suite
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── benches/          # Criterion benchmarks (selection, gate, work proof)
//! └── src/integration/
//!     ├── flows.rs        # Gate → ledger → snapshot flows
//!     └── concurrency.rs  # Multi-thread and worker-pool behaviour
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p dou-tests
//! cargo test -p dou-tests integration::concurrency
//! cargo bench -p dou-tests
//! ```

pub mod integration;
