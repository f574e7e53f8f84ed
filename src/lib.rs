//! gantt-planner - production schedule visualizer core
//!
//! This library turns tabular production-order data into a render-ready
//! timeline:
//! - Decoding CSV and JSON files on a worker thread
//! - Reconciling arbitrary column headers into canonical task fields
//! - Packing overlapping tasks into per-resource lanes
//! - Resource and order filters, route tracing, and the visible time window
//! - Preferences stored in a small SQLite settings database
//!
//! # Example
//!
//! ```no_run
//! use gantt_planner::repo::MemorySettings;
//! use gantt_planner::session::Session;
//!
//! let mut session = Session::new(MemorySettings::new()).unwrap();
//! session.load_demo(chrono::Utc::now());
//! session.set_search("ORD001");
//! assert_eq!(session.view().connections.len(), 1);
//! ```

pub mod cli;
pub mod config;
pub mod db;
pub mod filter;
pub mod import;
pub mod layout;
pub mod models;
pub mod repo;
pub mod session;
pub mod utils;
