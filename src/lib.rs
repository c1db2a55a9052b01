//! Lane-parallel Monte Carlo accumulation of European call payoffs under GBM.
//!
//! Callers supply standard normal samples and market parameters and get back
//! the undiscounted payoff sum. Dividing by the path count and discounting
//! is left to the caller.

pub mod bs;
pub mod config;
pub mod error;
pub mod kernel;
pub mod market;
pub mod parallel;
pub mod reduce;
pub mod reference;
pub mod sampler;
pub mod simd;

pub use config::{ accumulate, Backend, KernelConfig, DEFAULT_LANES };
pub use error::{ KernelError, Result };
pub use market::{ GbmTerms, MarketParams };
