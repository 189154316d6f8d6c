//! # ipwatch
//!
//! A Dynamic DNS agent: it polls the public IP address and, when it changes,
//! updates a set of DNS records and sends a notification for each one.
//!
//! ## Features
//!
//! - Three DNS backends: Cloudflare, DNS Made Easy, DNS-O-Matic
//! - Persistent IP cache, so restarts do not resend unchanged updates
//! - Notifications via Telegram, Pushover, Pushbullet and Notify Me
//! - Configuration from a TOML file or environment variables
//!
//! ## Usage
//!
//! ```bash
//! # Watch and update until interrupted
//! ipwatch run
//!
//! # Single check
//! ipwatch once
//!
//! # Check configuration and resolve records
//! ipwatch validate
//! ```

pub mod cache;
pub mod config;
pub mod daemon;
pub mod detector;
pub mod error;
pub mod http;
pub mod notify;
pub mod providers;
pub mod resolver;

pub use config::Config;
pub use daemon::{Daemon, TickOutcome};
pub use detector::IpDetector;
pub use error::{DdnsError, Result};
