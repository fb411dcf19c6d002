//! # Kapso Leads
//!
//! The lead-qualification conversation: a five-step linear flow that
//! collects a name, an email and an interest, plus the storage seam the
//! webhook uses to load and persist each lead.
//!
//! ```rust,ignore
//! use kapso_leads::{advance, ConversationState, Step};
//!
//! let t = advance(&ConversationState::default(), "hola");
//! assert_eq!(t.state.step, Step::WaitingForName);
//! ```

pub mod flow;
pub mod state;
pub mod store;

pub use flow::{Reply, Transition, advance, interest_label, is_valid_email};
pub use state::{ConversationState, LeadData, LeadRecord, LeadUpdate, Step};
pub use store::{LeadStore, MemoryLeadStore, StoreError};
