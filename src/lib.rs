//! LLM-guided perpetual futures trading with a deterministic technical
//! guardrail.
//!
//! One evaluation cycle fetches recent candles, derives a technical signal,
//! fuses it with an externally supplied directional opinion, and maps the
//! fused signal plus the current position side to a position-management
//! action on the exchange.

pub mod config;
pub mod error;
pub mod events;
pub mod indicators;
pub mod logging;
pub mod models;
pub mod services;
pub mod signals;
pub mod trading;
