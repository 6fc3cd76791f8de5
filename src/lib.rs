//! Logic cores behind the fitplan landing page: the retrying
//! lead dispatcher and the coaching chat conversation store.

pub mod config;
pub mod error;
pub mod lead;
pub mod llm;
pub mod notify;
pub mod services;
pub mod state;
